mod email;
mod webhook;

pub use email::EmailService;
pub use webhook::{sign_payload, WebhookJob, WebhookNotifier, WebhookPayload, SIGNATURE_HEADER};
