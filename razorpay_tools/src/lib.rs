//! # Razorpay tools
//!
//! Types for talking to (or rather, being talked to by) Razorpay:
//! * [`WebhookVerifier`] checks the `X-Razorpay-Signature` HMAC over the raw bytes of a webhook delivery.
//! * [`WebhookEnvelope`] is the decoded notification. Everything below the `event` tag is treated as untrusted and
//!   optional.
//! * [`EventKind`] classifies the `event` tag.
//!
//! Nothing in this crate touches the ledger. See `topup_engine` for that.
mod data_objects;
mod error;
mod event;
mod signature;

pub use data_objects::{EntityWrapper, Notes, PaymentEntity, WebhookEnvelope, WebhookPayload};
pub use error::{DecodeError, SignatureError};
pub use event::EventKind;
pub use signature::{calculate_signature, WebhookVerifier, SIGNATURE_HEADER};
