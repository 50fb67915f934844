//! Best-effort transactional email.
//!
//! Two modes:
//! 1. Send via the Resend API when an API key is configured
//! 2. Log only (no key configured — the default in development)
//!
//! Every send is spawned and never awaited by the request path; failures
//! are logged and swallowed.

use reqwest::Client;
use serde::Serialize;

use crate::models::{Dispute, Merchant, Transaction};

const RESEND_API_URL: &str = "https://api.resend.com/emails";

#[derive(Serialize)]
struct ResendRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html: &'a str,
}

#[derive(Clone)]
pub struct EmailService {
    client: Client,
    api_key: Option<String>,
    from: String,
}

impl EmailService {
    pub fn new(api_key: Option<String>, from: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            from,
        }
    }

    /// Notify the customer that their payment went through.
    pub fn spawn_payment_success(&self, transaction: &Transaction) {
        let subject = format!("Payment successful - {}", transaction.order_id);
        let html = format!(
            "<p>Your payment of {} {} (order <strong>{}</strong>) was successful.</p>",
            transaction.amount, transaction.currency, transaction.order_id
        );
        self.spawn_send(transaction.customer_email.clone(), subject, html);
    }

    /// Notify the customer that a refund was processed.
    pub fn spawn_refund(&self, transaction: &Transaction) {
        let amount = transaction.refunded_amount.unwrap_or(transaction.amount);
        let reason = transaction
            .refund_reason
            .clone()
            .unwrap_or_else(|| "Refund requested by merchant".to_string());
        let subject = format!("Refund processed - {}", transaction.order_id);
        let html = format!(
            "<p>A refund of {} {} for order <strong>{}</strong> has been processed.</p>\
             <p>Reason: {}</p>",
            amount, transaction.currency, transaction.order_id, reason
        );
        self.spawn_send(transaction.customer_email.clone(), subject, html);
    }

    /// Notify the merchant that a dispute was opened against them.
    pub fn spawn_dispute_opened(&self, merchant: &Merchant, dispute: &Dispute) {
        let subject = format!("New dispute on order {}", dispute.order_id);
        let html = format!(
            "<p>Hi <strong>{}</strong>,</p>\
             <p>A dispute ({}) was opened against order <strong>{}</strong> \
             for {} minor units.</p><p>Customer message: {}</p>\
             <p>Please respond with evidence from your dashboard.</p>",
            merchant.name,
            dispute.reason,
            dispute.order_id,
            dispute.amount,
            dispute.customer_message
        );
        self.spawn_send(merchant.email.clone(), subject, html);
    }

    fn spawn_send(&self, to: String, subject: String, html: String) {
        let service = self.clone();
        tokio::spawn(async move {
            service.send(&to, &subject, &html).await;
        });
    }

    async fn send(&self, to: &str, subject: &str, html: &str) {
        let Some(api_key) = &self.api_key else {
            tracing::info!(to, subject, "Email not configured; logging instead of sending");
            return;
        };

        let request = ResendRequest {
            from: &self.from,
            to,
            subject,
            html,
        };

        match self
            .client
            .post(RESEND_API_URL)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => {
                tracing::debug!(to, subject, "Email sent");
            }
            Ok(response) => {
                tracing::warn!(to, subject, status = %response.status(), "Email send rejected");
            }
            Err(e) => {
                tracing::warn!(to, subject, "Email send failed: {}", e);
            }
        }
    }
}
