use std::fmt::Display;

pub const PAYMENT_CAPTURED: &str = "payment.captured";
pub const PAYMENT_AUTHORIZED: &str = "payment.authorized";
pub const PAYMENT_FAILED: &str = "payment.failed";

/// The webhook `event` tag. Razorpay adds new event types from time to time, so unknown tags are kept as
/// [`EventKind::Other`] rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    PaymentCaptured,
    PaymentAuthorized,
    PaymentFailed,
    Other(String),
}

impl EventKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::PaymentCaptured => PAYMENT_CAPTURED,
            Self::PaymentAuthorized => PAYMENT_AUTHORIZED,
            Self::PaymentFailed => PAYMENT_FAILED,
            Self::Other(s) => s.as_str(),
        }
    }
}

impl From<&str> for EventKind {
    fn from(value: &str) -> Self {
        match value {
            PAYMENT_CAPTURED => Self::PaymentCaptured,
            PAYMENT_AUTHORIZED => Self::PaymentAuthorized,
            PAYMENT_FAILED => Self::PaymentFailed,
            other => Self::Other(other.to_string()),
        }
    }
}

impl Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod test {
    use super::EventKind;

    #[test]
    fn classify_tags() {
        assert_eq!(EventKind::from("payment.captured"), EventKind::PaymentCaptured);
        assert_eq!(EventKind::from("payment.authorized"), EventKind::PaymentAuthorized);
        assert_eq!(EventKind::from("payment.failed"), EventKind::PaymentFailed);
        let refund = EventKind::from("refund.processed");
        assert_eq!(refund, EventKind::Other("refund.processed".into()));
        assert_eq!(refund.to_string(), "refund.processed");
        // Tags are case-sensitive
        assert!(matches!(EventKind::from("Payment.Captured"), EventKind::Other(_)));
    }
}
