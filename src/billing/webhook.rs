use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, Secret};
use sha2::Sha256;
use std::collections::HashMap;
use subtle::ConstantTimeEq;

/// Signatures older or newer than this many seconds are refused.
pub const TOLERANCE_SECS: i64 = 300;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum WebhookError {
    #[error("Malformed signature header: {0}")]
    MalformedHeader(&'static str),
    #[error("Signature timestamp is outside the tolerance window")]
    TimestampOutOfRange,
    #[error("Signature does not match the payload")]
    InvalidSignature,
    #[error("Payload is not a valid event: {0}")]
    InvalidPayload(String),
}

/// `t=<unix seconds>,v1=<hex hmac>[,v1=...]`. Unknown keys are ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    pub timestamp: i64,
    pub signatures: Vec<Vec<u8>>,
}

impl SignatureHeader {
    pub fn parse(header: &str) -> Result<Self, WebhookError> {
        let mut timestamp = None;
        let mut signatures = Vec::new();
        for part in header.split(',') {
            let (key, value) = part
                .trim()
                .split_once('=')
                .ok_or(WebhookError::MalformedHeader("expected key=value pairs"))?;
            match key {
                "t" => {
                    timestamp = Some(
                        value
                            .parse()
                            .map_err(|_| WebhookError::MalformedHeader("invalid timestamp"))?,
                    )
                }
                // a rolled secret yields one v1 entry per active secret; skip entries we cannot decode
                "v1" => {
                    if let Ok(signature) = hex::decode(value) {
                        signatures.push(signature);
                    }
                }
                _ => {}
            }
        }
        let timestamp = timestamp.ok_or(WebhookError::MalformedHeader("missing timestamp"))?;
        if signatures.is_empty() {
            return Err(WebhookError::MalformedHeader("missing v1 signature"));
        }
        Ok(Self {
            timestamp,
            signatures,
        })
    }
}

pub struct WebhookVerifier {
    secret: Secret<String>,
}

impl WebhookVerifier {
    pub fn new(secret: Secret<String>) -> Self {
        Self { secret }
    }

    /// Checks the signature over `"<t>.<payload>"` and decodes the event.
    /// Nothing in the payload is trusted before this returns `Ok`.
    pub fn verify(
        &self,
        payload: &[u8],
        header: &str,
        now: i64,
    ) -> Result<BillingEvent, WebhookError> {
        let header = SignatureHeader::parse(header)?;
        if now.abs_diff(header.timestamp) > TOLERANCE_SECS.unsigned_abs() {
            return Err(WebhookError::TimestampOutOfRange);
        }
        let expected = self.sign(header.timestamp, payload);
        let matches = header
            .signatures
            .iter()
            .any(|candidate| candidate.len() == expected.len() && bool::from(candidate.ct_eq(&expected)));
        if !matches {
            return Err(WebhookError::InvalidSignature);
        }
        BillingEvent::from_json(payload)
    }

    fn sign(&self, timestamp: i64, payload: &[u8]) -> Vec<u8> {
        let mut mac = Hmac::<Sha256>::new_from_slice(self.secret.expose_secret().as_bytes())
            .unwrap_or_else(|_| unreachable!("HMAC accepts keys of any length"));
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        mac.finalize().into_bytes().to_vec()
    }

    /// Builds a header value for `payload`, as the provider would.
    pub fn signature_header(&self, timestamp: i64, payload: &[u8]) -> String {
        format!("t={},v1={}", timestamp, hex::encode(self.sign(timestamp, payload)))
    }
}

/// The subset of billing events the service reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BillingEvent {
    CheckoutCompleted {
        metadata_user_id: Option<String>,
        customer_email: Option<String>,
        customer_id: Option<String>,
        subscription_id: Option<String>,
    },
    SubscriptionChanged {
        customer_id: String,
        subscription_id: String,
        status: String,
        current_period_end: Option<i64>,
    },
    SubscriptionDeleted {
        customer_id: String,
    },
    InvoicePaymentFailed {
        customer_id: Option<String>,
    },
    InvoicePaymentSucceeded {
        customer_id: Option<String>,
    },
    Unhandled(String),
}

#[derive(serde::Deserialize)]
struct RawEvent {
    #[serde(rename = "type")]
    kind: String,
    data: RawEventData,
}

#[derive(serde::Deserialize)]
struct RawEventData {
    object: serde_json::Value,
}

#[derive(serde::Deserialize)]
struct CheckoutSessionObject {
    #[serde(default)]
    metadata: Option<HashMap<String, String>>,
    customer: Option<String>,
    subscription: Option<String>,
    customer_email: Option<String>,
    customer_details: Option<CustomerDetails>,
}

#[derive(serde::Deserialize)]
struct CustomerDetails {
    email: Option<String>,
}

#[derive(serde::Deserialize)]
struct SubscriptionObject {
    id: String,
    customer: String,
    status: String,
    current_period_end: Option<i64>,
}

#[derive(serde::Deserialize)]
struct InvoiceObject {
    customer: Option<String>,
}

fn object<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> Result<T, WebhookError> {
    serde_json::from_value(value).map_err(|e| WebhookError::InvalidPayload(e.to_string()))
}

impl BillingEvent {
    pub fn from_json(payload: &[u8]) -> Result<Self, WebhookError> {
        let raw: RawEvent = serde_json::from_slice(payload)
            .map_err(|e| WebhookError::InvalidPayload(e.to_string()))?;
        let event = match raw.kind.as_str() {
            "checkout.session.completed" => {
                let session: CheckoutSessionObject = object(raw.data.object)?;
                BillingEvent::CheckoutCompleted {
                    metadata_user_id: session.metadata.and_then(|mut m| m.remove("userId")),
                    customer_email: session
                        .customer_details
                        .and_then(|d| d.email)
                        .or(session.customer_email),
                    customer_id: session.customer,
                    subscription_id: session.subscription,
                }
            }
            "customer.subscription.created" | "customer.subscription.updated" => {
                let subscription: SubscriptionObject = object(raw.data.object)?;
                BillingEvent::SubscriptionChanged {
                    customer_id: subscription.customer,
                    subscription_id: subscription.id,
                    status: subscription.status,
                    current_period_end: subscription.current_period_end,
                }
            }
            "customer.subscription.deleted" => {
                let subscription: SubscriptionObject = object(raw.data.object)?;
                BillingEvent::SubscriptionDeleted {
                    customer_id: subscription.customer,
                }
            }
            "invoice.payment_failed" => {
                let invoice: InvoiceObject = object(raw.data.object)?;
                BillingEvent::InvoicePaymentFailed {
                    customer_id: invoice.customer,
                }
            }
            "invoice.payment_succeeded" => {
                let invoice: InvoiceObject = object(raw.data.object)?;
                BillingEvent::InvoicePaymentSucceeded {
                    customer_id: invoice.customer,
                }
            }
            _ => BillingEvent::Unhandled(raw.kind),
        };
        Ok(event)
    }
}
