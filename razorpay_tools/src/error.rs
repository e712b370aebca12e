use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("The webhook secret has not been configured")]
    MissingSecret,
    #[error("No signature was provided with the request")]
    MissingSignature,
    #[error("The request body is empty")]
    EmptyBody,
    #[error("The signature is not a valid hex string")]
    MalformedSignature,
    #[error("The signature does not match the request body")]
    Mismatch,
    #[error("The webhook secret cannot be used as an HMAC key. {0}")]
    InvalidKey(String),
}

impl SignatureError {
    /// Configuration faults are the server's problem, not the caller's.
    pub fn is_config_fault(&self) -> bool {
        matches!(self, Self::MissingSecret | Self::InvalidKey(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("The webhook body is not valid JSON. {0}")]
    InvalidJson(String),
    #[error("The webhook body is not a valid event envelope. {0}")]
    InvalidEnvelope(String),
    #[error("The webhook body does not contain an event tag")]
    MissingEvent,
}
