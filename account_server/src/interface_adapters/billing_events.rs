use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use sha2::Sha256;

use crate::domain::entities::BillingEvent;
use crate::domain::errors::WebhookError;
use crate::interface_adapters::clients::billing::{ObjectRef, decode_price, decode_product};

pub const SIGNATURE_HEADER: &str = "stripe-signature";
pub const SIGNATURE_TOLERANCE_SECONDS: u64 = 300;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Deserialize)]
struct EventEnvelope {
    #[serde(rename = "type")]
    event_type: String,
    data: EventData,
}

#[derive(Debug, Deserialize)]
struct EventData {
    object: Value,
}

#[derive(Debug, Deserialize)]
struct SubscriptionRef {
    id: String,
    customer: ObjectRef,
}

#[derive(Debug, Deserialize)]
struct CheckoutSessionRef {
    #[serde(default)]
    mode: String,
    subscription: Option<ObjectRef>,
    customer: Option<ObjectRef>,
}

#[derive(Debug, Deserialize)]
struct DeletedRef {
    id: String,
}

/// Verifies the signature header against the raw body and decodes the event.
/// Nothing in the body is parsed before the signature checks out.
pub fn construct_event(
    payload: &str,
    signature: Option<&str>,
    secret: Option<&str>,
    now_epoch_seconds: u64,
) -> Result<BillingEvent, WebhookError> {
    let (Some(signature), Some(secret)) = (signature, secret) else {
        return Err(WebhookError::MissingSecret);
    };

    verify_signature(payload, signature, secret, now_epoch_seconds)?;
    decode_event(payload)
}

fn verify_signature(
    payload: &str,
    header: &str,
    secret: &str,
    now_epoch_seconds: u64,
) -> Result<(), WebhookError> {
    let mut timestamp = None;
    let mut candidates = Vec::new();
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = value.parse::<u64>().ok(),
            Some(("v1", value)) => candidates.push(value),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or_else(|| {
        WebhookError::InvalidSignature(
            "Unable to extract timestamp and signatures from header".to_string(),
        )
    })?;
    if candidates.is_empty() {
        return Err(WebhookError::InvalidSignature(
            "No signatures found with expected scheme".to_string(),
        ));
    }

    let signed_payload = format!("{timestamp}.{payload}");
    let matched = candidates.into_iter().any(|candidate| {
        let Ok(expected) = hex::decode(candidate) else {
            return false;
        };
        let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
            return false;
        };
        mac.update(signed_payload.as_bytes());
        mac.verify_slice(&expected).is_ok()
    });
    if !matched {
        return Err(WebhookError::InvalidSignature(
            "No signatures found matching the expected signature for payload".to_string(),
        ));
    }

    if now_epoch_seconds.saturating_sub(timestamp) > SIGNATURE_TOLERANCE_SECONDS {
        return Err(WebhookError::InvalidSignature(
            "Timestamp outside the tolerance zone".to_string(),
        ));
    }

    Ok(())
}

fn decode_event(payload: &str) -> Result<BillingEvent, WebhookError> {
    let envelope: EventEnvelope =
        serde_json::from_str(payload).map_err(|err| invalid_payload(err.to_string()))?;
    let object = envelope.data.object;

    let event = match envelope.event_type.as_str() {
        "product.created" | "product.updated" => {
            BillingEvent::ProductUpserted(decode_product(object).map_err(invalid_payload)?)
        }
        "price.created" | "price.updated" => {
            BillingEvent::PriceUpserted(decode_price(object).map_err(invalid_payload)?)
        }
        "product.deleted" => BillingEvent::ProductDeleted(object_field::<DeletedRef>(object)?.id),
        "price.deleted" => BillingEvent::PriceDeleted(object_field::<DeletedRef>(object)?.id),
        "customer.subscription.created"
        | "customer.subscription.updated"
        | "customer.subscription.deleted" => {
            let subscription = object_field::<SubscriptionRef>(object)?;
            BillingEvent::SubscriptionChanged {
                subscription_id: subscription.id,
                customer_id: subscription.customer.into_id(),
                created: envelope.event_type == "customer.subscription.created",
            }
        }
        "checkout.session.completed" => {
            let session = object_field::<CheckoutSessionRef>(object)?;
            BillingEvent::CheckoutCompleted {
                mode: session.mode,
                subscription_id: session.subscription.map(ObjectRef::into_id),
                customer_id: session.customer.map(ObjectRef::into_id),
            }
        }
        _ => BillingEvent::Unsupported(envelope.event_type),
    };

    Ok(event)
}

fn object_field<T: DeserializeOwned>(object: Value) -> Result<T, WebhookError> {
    serde_json::from_value(object).map_err(|err| invalid_payload(err.to_string()))
}

fn invalid_payload(reason: String) -> WebhookError {
    WebhookError::InvalidPayload(reason)
}

/// Builds a `stripe-signature` header value for `payload`.
#[cfg(test)]
pub(crate) fn sign_payload(payload: &str, secret: &str, timestamp: u64) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("expected hmac to accept any key");
    mac.update(format!("{timestamp}.{payload}").as_bytes());
    format!("t={timestamp},v1={}", hex::encode(mac.finalize().into_bytes()))
}
