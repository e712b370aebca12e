//! Webhook signature verification.
//!
//! Razorpay signs every webhook delivery with HMAC-SHA256, keyed with the webhook secret configured in the Razorpay
//! dashboard, over the body _exactly as it was sent_. The hex digest is sent in the `X-Razorpay-Signature` header.
//!
//! The signature MUST be checked against the raw request bytes. Parsing the JSON and serializing it again changes key
//! order, whitespace and number formatting, and the digest will no longer match.
use hmac::{Hmac, Mac};
use log::trace;
use sha2::Sha256;
use topup_common::Secret;

use crate::SignatureError;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-razorpay-signature";

fn keyed_mac(secret: &str) -> Result<HmacSha256, SignatureError> {
    HmacSha256::new_from_slice(secret.as_bytes()).map_err(|e| SignatureError::InvalidKey(e.to_string()))
}

/// Calculates the lowercase hex HMAC-SHA256 of `data` using `secret` as the key.
pub fn calculate_signature(secret: &str, data: &[u8]) -> Result<String, SignatureError> {
    let mut mac = keyed_mac(secret)?;
    mac.update(data);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

#[derive(Clone, Debug, Default)]
pub struct WebhookVerifier {
    secret: Option<Secret<String>>,
}

impl WebhookVerifier {
    /// A blank secret is treated the same as a missing one.
    pub fn new(secret: Option<Secret<String>>) -> Self {
        let secret = secret.filter(|s| !s.is_blank());
        Self { secret }
    }

    pub fn is_configured(&self) -> bool {
        self.secret.is_some()
    }

    /// Verifies `signature` against the raw `body` bytes.
    ///
    /// A missing secret is reported before anything about the request is looked at, since every request would fail
    /// until it is fixed. The digest comparison is constant-time.
    pub fn verify(&self, body: &[u8], signature: Option<&str>) -> Result<(), SignatureError> {
        let secret = self.secret.as_ref().ok_or(SignatureError::MissingSecret)?;
        let signature = signature.map(str::trim).filter(|s| !s.is_empty()).ok_or(SignatureError::MissingSignature)?;
        if body.is_empty() {
            return Err(SignatureError::EmptyBody);
        }
        let expected = hex::decode(signature).map_err(|_| SignatureError::MalformedSignature)?;
        let mut mac = keyed_mac(secret.reveal())?;
        mac.update(body);
        mac.verify_slice(&expected).map_err(|_| SignatureError::Mismatch)?;
        trace!("🔐️ Signature verified over {} bytes", body.len());
        Ok(())
    }
}
