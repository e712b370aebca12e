//! Turns decoded Razorpay webhook envelopes into ledger operations.
//!
//! Only `payment.captured` moves money. A capture that cannot be attributed to a user, or that carries no usable
//! payment id or amount, is acknowledged without touching the ledger: Razorpay would redeliver it forever otherwise,
//! and redelivery would not make it any more usable.
use std::fmt::Display;

use log::*;
use razorpay_tools::{EventKind, PaymentEntity, WebhookEnvelope};
use thiserror::Error;
use topup_common::CURRENCY_CODE;
use topup_engine::{
    db_types::{LedgerRecord, NewCredit, Paise},
    CreditOutcome,
    LedgerApi,
    LedgerApiError,
    LedgerStore,
};

/// Why a captured payment was not credited.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnusableCapture {
    #[error("The event does not contain a payment entity")]
    NoPaymentEntity,
    #[error("The payment has no id")]
    NoPaymentId,
    #[error("Payment {0} has no user_id in its notes")]
    NoUserId(String),
    #[error("Payment {payment_id} has an invalid amount ({amount:?})")]
    InvalidAmount { payment_id: String, amount: Option<i64> },
    #[error("Payment {payment_id} is in {currency}, which is not the account currency")]
    UnsupportedCurrency { payment_id: String, currency: String },
}

/// What handling a webhook delivery amounted to. Every variant is acknowledged with a 200.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    Credited { credit: NewCredit, ledger: LedgerRecord },
    AlreadyApplied { credit: NewCredit, ledger: LedgerRecord },
    Unusable(UnusableCapture),
    /// A payment lifecycle event that is logged but does not change any balance.
    Observed(EventKind),
    Ignored(EventKind),
}

impl Display for WebhookOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Credited { credit, ledger } => {
                write!(f, "Payment {} credited. Balance is now {}.", credit.payment_id, ledger.balance)
            },
            Self::AlreadyApplied { credit, .. } => write!(f, "Payment {} has already been applied.", credit.payment_id),
            Self::Unusable(reason) => write!(f, "Payment not credited. {reason}."),
            Self::Observed(kind) => write!(f, "Event {kind} acknowledged."),
            Self::Ignored(kind) => write!(f, "Event {kind} ignored."),
        }
    }
}

/// Extracts the credit a `payment.captured` event asks for.
pub fn credit_from_capture(envelope: &WebhookEnvelope) -> Result<NewCredit, UnusableCapture> {
    let payment = envelope.payment().ok_or(UnusableCapture::NoPaymentEntity)?;
    let payment_id = payment
        .id
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(UnusableCapture::NoPaymentId)?
        .to_string();
    let user_id = payment.notes.user_id().ok_or_else(|| UnusableCapture::NoUserId(payment_id.clone()))?;
    let amount = match payment.amount {
        Some(a) if a > 0 => Paise::from(a),
        amount => return Err(UnusableCapture::InvalidAmount { payment_id, amount }),
    };
    check_currency(payment, &payment_id)?;
    Ok(NewCredit::new(user_id, payment_id, amount))
}

// An absent currency is taken to be the account currency
fn check_currency(payment: &PaymentEntity, payment_id: &str) -> Result<(), UnusableCapture> {
    match payment.currency.as_deref().map(str::trim) {
        None => Ok(()),
        Some(c) if c.eq_ignore_ascii_case(CURRENCY_CODE) => Ok(()),
        Some(c) => Err(UnusableCapture::UnsupportedCurrency { payment_id: payment_id.into(), currency: c.into() }),
    }
}

/// Routes a verified, decoded webhook to the ledger. Only store failures are errors.
pub async fn dispatch_event<B: LedgerStore>(
    envelope: &WebhookEnvelope,
    api: &LedgerApi<B>,
) -> Result<WebhookOutcome, LedgerApiError> {
    match envelope.kind() {
        EventKind::PaymentCaptured => handle_capture(envelope, api).await,
        EventKind::PaymentAuthorized => {
            let payment_id = envelope.payment().and_then(|p| p.id.as_deref()).unwrap_or("unknown");
            info!("💳️ Payment {payment_id} authorized. Waiting for capture before crediting.");
            Ok(WebhookOutcome::Observed(EventKind::PaymentAuthorized))
        },
        EventKind::PaymentFailed => {
            let payment = envelope.payment();
            let payment_id = payment.and_then(|p| p.id.as_deref()).unwrap_or("unknown");
            let reason = payment.and_then(|p| p.error_description.as_deref()).unwrap_or("no reason given");
            info!("💳️ Payment {payment_id} failed. {reason}");
            Ok(WebhookOutcome::Observed(EventKind::PaymentFailed))
        },
        EventKind::Other(tag) => {
            debug!("💳️ Ignoring {tag} event");
            Ok(WebhookOutcome::Ignored(EventKind::Other(tag)))
        },
    }
}

async fn handle_capture<B: LedgerStore>(
    envelope: &WebhookEnvelope,
    api: &LedgerApi<B>,
) -> Result<WebhookOutcome, LedgerApiError> {
    let credit = match credit_from_capture(envelope) {
        Ok(credit) => credit,
        Err(reason) => {
            warn!("💳️ Captured payment will not be credited. {reason}");
            return Ok(WebhookOutcome::Unusable(reason));
        },
    };
    debug!("💳️ Payment captured: {credit}");
    let outcome = match api.apply_credit(credit.clone()).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("💳️ Could not credit {credit}. {e}");
            return Err(e);
        },
    };
    Ok(match outcome {
        CreditOutcome::Created(ledger) | CreditOutcome::Credited(ledger) => WebhookOutcome::Credited { credit, ledger },
        CreditOutcome::AlreadyApplied(ledger) => WebhookOutcome::AlreadyApplied { credit, ledger },
    })
}
