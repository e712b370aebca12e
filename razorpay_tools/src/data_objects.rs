use std::collections::BTreeMap;

use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use serde_json::{error::Category, Value};

use crate::{DecodeError, EventKind};

/// A decoded webhook delivery.
///
/// ```json
/// {
///   "entity": "event",
///   "account_id": "acc_BFQ7uQEaa7j2z7",
///   "event": "payment.captured",
///   "contains": ["payment"],
///   "payload": { "payment": { "entity": { "id": "pay_DESlfW9H8K9uqM", "amount": 10000, "notes": { "user_id": "u1" } } } },
///   "created_at": 1567674606
/// }
/// ```
///
/// Only `event` is required. Every other field is read leniently: a value of the wrong type is treated as absent, so an
/// off-shape payload on an event we don't act on can never fail the delivery.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookEnvelope {
    pub event: String,
    #[serde(default, deserialize_with = "lenient")]
    pub account_id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub payload: Option<WebhookPayload>,
    #[serde(default, deserialize_with = "lenient")]
    pub created_at: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookPayload {
    #[serde(default, deserialize_with = "lenient")]
    pub payment: Option<EntityWrapper<PaymentEntity>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntityWrapper<T: DeserializeOwned> {
    #[serde(default, deserialize_with = "lenient")]
    pub entity: Option<T>,
}

/// The payment entity. Every field is optional; the shape is untrusted input.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentEntity {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<String>,
    /// In currency subunits
    #[serde(default, deserialize_with = "lenient")]
    pub amount: Option<i64>,
    #[serde(default, deserialize_with = "lenient")]
    pub currency: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub order_id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub method: Option<String>,
    #[serde(default)]
    pub notes: Notes,
    #[serde(default, deserialize_with = "lenient")]
    pub error_code: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub error_description: Option<String>,
}

/// Reads any JSON value, keeping it only if it has the expected shape.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).ok())
}

/// Free-form key/value notes attached to a payment when the order was created.
///
/// Razorpay sends an empty JSON array rather than an empty object when there are no notes. Any non-object value is
/// read as "no notes".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Notes(BTreeMap<String, Value>);

impl<'de> Deserialize<'de> for Notes {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where D: Deserializer<'de> {
        let notes = match Value::deserialize(deserializer)? {
            Value::Object(map) => map.into_iter().collect(),
            _ => BTreeMap::new(),
        };
        Ok(Self(notes))
    }
}

impl Notes {
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str).map(str::trim).filter(|s| !s.is_empty())
    }

    /// The application user the payment was made for, if it was tagged at order creation.
    pub fn user_id(&self) -> Option<&str> {
        self.get_str("user_id")
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Notes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), Value::String(v.into()))).collect())
    }
}

impl WebhookEnvelope {
    /// Decodes a webhook body. Call this only on bytes that have already passed signature verification.
    pub fn from_slice(data: &[u8]) -> Result<Self, DecodeError> {
        let envelope = serde_json::from_slice::<Self>(data).map_err(|e| match e.classify() {
            Category::Data => DecodeError::InvalidEnvelope(e.to_string()),
            Category::Io | Category::Syntax | Category::Eof => DecodeError::InvalidJson(e.to_string()),
        })?;
        if envelope.event.trim().is_empty() {
            return Err(DecodeError::MissingEvent);
        }
        Ok(envelope)
    }

    pub fn kind(&self) -> EventKind {
        EventKind::from(self.event.as_str())
    }

    pub fn payment(&self) -> Option<&PaymentEntity> {
        self.payload.as_ref().and_then(|p| p.payment.as_ref()).and_then(|w| w.entity.as_ref())
    }
}
