use serde::{Deserialize, Serialize};

use crate::models::PaymentStatus;

/// A merchant-registered webhook endpoint.
///
/// Created and deleted by merchant action, otherwise immutable. The secret
/// signs outbound payloads; it is shown to the merchant (it is their own
/// credential for verifying deliveries).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookRegistration {
    pub id: String,
    pub merchant_id: String,
    pub url: String,
    /// Signing secret (`whsec_` prefix), generated at creation.
    pub secret: String,
    pub events: Vec<WebhookEventType>,
    pub created_at: i64,
}

impl WebhookRegistration {
    pub fn is_subscribed_to(&self, event: WebhookEventType) -> bool {
        self.events.contains(&event)
    }
}

/// Transaction-status events a registration can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WebhookEventType {
    #[serde(rename = "payment.success")]
    PaymentSuccess,
    #[serde(rename = "payment.failed")]
    PaymentFailed,
    #[serde(rename = "payment.refunded")]
    PaymentRefunded,
}

impl WebhookEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PaymentSuccess => "payment.success",
            Self::PaymentFailed => "payment.failed",
            Self::PaymentRefunded => "payment.refunded",
        }
    }

    /// The event a status transition fans out as, if any.
    pub fn for_status(status: PaymentStatus) -> Option<Self> {
        match status {
            PaymentStatus::Success => Some(Self::PaymentSuccess),
            PaymentStatus::Failed => Some(Self::PaymentFailed),
            PaymentStatus::Refunded => Some(Self::PaymentRefunded),
            PaymentStatus::Pending => None,
        }
    }
}

impl std::str::FromStr for WebhookEventType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "payment.success" => Ok(Self::PaymentSuccess),
            "payment.failed" => Ok(Self::PaymentFailed),
            "payment.refunded" => Ok(Self::PaymentRefunded),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for WebhookEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Data required to register a webhook endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateWebhook {
    pub url: String,
    pub events: Vec<WebhookEventType>,
}
