use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use log::error;
use razorpay_tools::{DecodeError, SignatureError};
use thiserror::Error;
use topup_engine::LedgerApiError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Payload deserialization error. {0}")]
    CouldNotDeserializePayload(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::CouldNotDeserializePayload(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(e) => match e {
                AuthError::MissingSignature => StatusCode::BAD_REQUEST,
                AuthError::InvalidSignature(_) => StatusCode::BAD_REQUEST,
                AuthError::ForbiddenPeer => StatusCode::FORBIDDEN,
            },
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("No webhook signature was provided.")]
    MissingSignature,
    #[error("Webhook signature is invalid. {0}")]
    InvalidSignature(String),
    #[error("The remote peer is not allowed to call this endpoint.")]
    ForbiddenPeer,
}

impl From<SignatureError> for ServerError {
    fn from(e: SignatureError) -> Self {
        match e {
            SignatureError::MissingSecret | SignatureError::InvalidKey(_) => {
                error!("🔐️ Webhook signatures cannot be checked. {e}");
                Self::ConfigurationError(e.to_string())
            },
            SignatureError::MissingSignature => Self::AuthenticationError(AuthError::MissingSignature),
            SignatureError::EmptyBody => Self::InvalidRequestBody(e.to_string()),
            SignatureError::MalformedSignature | SignatureError::Mismatch => {
                Self::AuthenticationError(AuthError::InvalidSignature(e.to_string()))
            },
        }
    }
}

impl From<DecodeError> for ServerError {
    fn from(e: DecodeError) -> Self {
        Self::CouldNotDeserializePayload(e.to_string())
    }
}

impl From<LedgerApiError> for ServerError {
    fn from(e: LedgerApiError) -> Self {
        match e {
            LedgerApiError::InvalidAmount(_) => Self::InvalidRequestBody(e.to_string()),
            LedgerApiError::DatabaseError(_)
            | LedgerApiError::Conflict(_)
            | LedgerApiError::RetriesExhausted { .. }
            | LedgerApiError::BalanceOverflow(_) => Self::BackendError(e.to_string()),
        }
    }
}
