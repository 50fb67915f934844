//! Outbound webhook fan-out.
//!
//! Delivery is fire-and-forget with respect to the request path: a status
//! transition resolves the subscribed registrations, snapshots the payload,
//! and pushes jobs onto an unbounded queue. A worker task owns the HTTP
//! client and delivers each job with bounded retry. Delivery outcomes are
//! logged and never reach the caller of the triggering operation.

use std::time::Duration;

use hmac::{Hmac, Mac};
use reqwest::Client;
use rusqlite::Connection;
use serde::Serialize;
use sha2::Sha256;
use tokio::sync::mpsc;

use crate::db::queries;
use crate::error::Result;
use crate::models::{Transaction, WebhookEventType};

type HmacSha256 = Hmac<Sha256>;

/// Signature header attached to every delivery.
pub const SIGNATURE_HEADER: &str = "X-Signature";

/// Retry delays in seconds (exponential backoff: 1s, 4s, 16s)
const RETRY_DELAYS: &[u64] = &[1, 4, 16];

/// Per-attempt delivery timeout.
const DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Transaction snapshot delivered to merchant endpoints.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayloadData {
    pub order_id: String,
    pub amount: i64,
    pub currency: String,
    pub status: String,
    pub method: String,
    pub customer_email: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct WebhookPayload {
    pub event: WebhookEventType,
    pub data: WebhookPayloadData,
}

impl WebhookPayload {
    /// Snapshot the transaction at transition time.
    pub fn for_transaction(event: WebhookEventType, transaction: &Transaction) -> Self {
        Self {
            event,
            data: WebhookPayloadData {
                order_id: transaction.order_id.clone(),
                amount: transaction.amount,
                currency: transaction.currency.clone(),
                status: transaction.status.as_str().to_string(),
                method: transaction.method.as_str().to_string(),
                customer_email: transaction.customer_email.clone(),
                created_at: transaction.created_at,
            },
        }
    }
}

/// A single queued delivery: one registration, one serialized payload.
#[derive(Debug, Clone)]
pub struct WebhookJob {
    pub url: String,
    pub secret: String,
    pub event: WebhookEventType,
    /// Serialized payload body; signed as-is so receivers can verify bytes.
    pub body: String,
}

/// Handle for enqueueing webhook deliveries.
///
/// Cloneable and cheap; the worker task owns the receiving end. Dropping all
/// receivers (tests, shutdown) turns enqueue into a logged no-op, preserving
/// the never-fails contract.
#[derive(Clone)]
pub struct WebhookNotifier {
    tx: mpsc::UnboundedSender<WebhookJob>,
}

impl WebhookNotifier {
    /// Spawn the delivery worker and return the enqueue handle.
    pub fn spawn() -> Self {
        let (notifier, rx) = Self::channel();
        tokio::spawn(deliver_loop(rx, Client::new()));
        notifier
    }

    /// Create a notifier whose jobs land on the returned receiver instead of
    /// the network. Test harnesses use this to observe fan-out.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<WebhookJob>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Queue one delivery. Infallible from the caller's view.
    pub fn enqueue(&self, job: WebhookJob) {
        if self.tx.send(job).is_err() {
            tracing::warn!("Webhook worker is gone; dropping delivery");
        }
    }

    /// Fan a transaction's status transition out to every registration of
    /// its merchant subscribed to the matching event. Returns the number of
    /// deliveries queued. A `pending` transaction fans out to nothing.
    pub fn fan_out(&self, conn: &Connection, transaction: &Transaction) -> Result<usize> {
        let Some(event) = WebhookEventType::for_status(transaction.status) else {
            return Ok(0);
        };

        let hooks = queries::webhooks_for_event(conn, &transaction.merchant_id, event)?;
        if hooks.is_empty() {
            return Ok(0);
        }

        let payload = WebhookPayload::for_transaction(event, transaction);
        let body = serde_json::to_string(&payload)?;

        let count = hooks.len();
        for hook in hooks {
            self.enqueue(WebhookJob {
                url: hook.url,
                secret: hook.secret,
                event,
                body: body.clone(),
            });
        }
        Ok(count)
    }
}

/// HMAC-SHA256 signature (hex) of the payload body under a registration secret.
pub fn sign_payload(secret: &str, body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

async fn deliver_loop(mut rx: mpsc::UnboundedReceiver<WebhookJob>, client: Client) {
    while let Some(job) = rx.recv().await {
        deliver(&client, &job).await;
    }
    tracing::debug!("Webhook delivery worker stopped");
}

/// Deliver one job with bounded retry. Failures are terminal after the last
/// retry; nothing is surfaced beyond the log.
async fn deliver(client: &Client, job: &WebhookJob) {
    let signature = sign_payload(&job.secret, job.body.as_bytes());

    for attempt in 0..=RETRY_DELAYS.len() {
        let result = client
            .post(&job.url)
            .header("Content-Type", "application/json")
            .header(SIGNATURE_HEADER, &signature)
            .body(job.body.clone())
            .timeout(DELIVERY_TIMEOUT)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                tracing::debug!(
                    event = %job.event,
                    url = %job.url,
                    "Webhook delivered"
                );
                return;
            }
            Ok(response) => {
                tracing::warn!(
                    event = %job.event,
                    url = %job.url,
                    status = %response.status(),
                    attempt,
                    "Webhook delivery rejected"
                );
            }
            Err(e) => {
                tracing::warn!(
                    event = %job.event,
                    url = %job.url,
                    attempt,
                    "Webhook delivery failed: {}",
                    e
                );
            }
        }

        if let Some(delay) = RETRY_DELAYS.get(attempt) {
            tokio::time::sleep(Duration::from_secs(*delay)).await;
        }
    }

    tracing::warn!(
        event = %job.event,
        url = %job.url,
        "Giving up on webhook delivery after {} attempts",
        RETRY_DELAYS.len() + 1
    );
}
