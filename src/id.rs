//! Prefixed ID generation for ZeroPay entities.
//!
//! Internal record IDs use short entity prefixes (`txn_`, `dsp_`, ...).
//! Merchant-facing references keep the formats the dashboard and checkout
//! flow expect: `order_` for order references, `pk_test_`/`sk_test_` for
//! API keys, `whsec_` for webhook signing secrets.
//!
//! Format: `{prefix}_{uuid_simple}` (32 hex chars, no hyphens)

use uuid::Uuid;

/// Entity types that have prefixed record IDs.
#[derive(Debug, Clone, Copy)]
pub enum EntityType {
    Merchant,
    Transaction,
    Dispute,
    Webhook,
    AuditLog,
}

impl EntityType {
    /// Returns the prefix for this entity type.
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Merchant => "mch",
            Self::Transaction => "txn",
            Self::Dispute => "dsp",
            Self::Webhook => "whk",
            Self::AuditLog => "aud",
        }
    }

    /// Generates a new prefixed ID for this entity type.
    pub fn gen_id(&self) -> String {
        format!("{}_{}", self.prefix(), Uuid::new_v4().as_simple())
    }
}

/// Generate a merchant-visible order reference (`order_` + 32 hex chars).
pub fn gen_order_reference() -> String {
    format!("order_{}", Uuid::new_v4().as_simple())
}

/// Generate a merchant public key (`pk_test_` prefix, sandbox-style).
pub fn gen_public_key() -> String {
    format!("pk_test_{}", Uuid::new_v4().as_simple())
}

/// Generate a merchant secret key (`sk_test_` prefix, sandbox-style).
pub fn gen_secret_key() -> String {
    format!("sk_test_{}", Uuid::new_v4().as_simple())
}

/// Generate a webhook signing secret.
pub fn gen_webhook_secret() -> String {
    format!("whsec_{}", Uuid::new_v4().as_simple())
}

/// Validate the shape of an order reference before hitting the database.
pub fn is_valid_order_reference(s: &str) -> bool {
    let Some(hex_part) = s.strip_prefix("order_") else {
        return false;
    };
    hex_part.len() == 32 && hex_part.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_format() {
        let id = EntityType::Transaction.gen_id();
        assert!(id.starts_with("txn_"));
        // txn_ (4 chars) + 32 hex chars = 36 chars total
        assert_eq!(id.len(), 36);
    }

    #[test]
    fn test_ids_are_unique() {
        let id1 = EntityType::Dispute.gen_id();
        let id2 = EntityType::Dispute.gen_id();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_order_reference_valid() {
        assert!(is_valid_order_reference(&gen_order_reference()));

        assert!(!is_valid_order_reference(""));
        assert!(!is_valid_order_reference("order_"));
        assert!(!is_valid_order_reference("order_abc")); // too short
        assert!(!is_valid_order_reference(
            "txn_a1b2c3d4e5f6789012345678901234ab"
        )); // wrong prefix
        assert!(!is_valid_order_reference(
            "order_a1b2c3d4e5f6789012345678901234gg"
        )); // non-hex
    }

    #[test]
    fn test_key_prefixes() {
        assert!(gen_public_key().starts_with("pk_test_"));
        assert!(gen_secret_key().starts_with("sk_test_"));
        assert!(gen_webhook_secret().starts_with("whsec_"));
    }
}
