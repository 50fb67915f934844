use serde::{Deserialize, Serialize};

/// A merchant account. The core treats this as a directory entry: it is
/// looked up by ID or secret key, never mutated except for the sandbox flag.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Merchant {
    pub id: String,
    pub name: String,
    pub email: String,
    pub public_key: String,
    /// Bearer credential for the merchant API. Never serialized.
    #[serde(skip_serializing)]
    pub secret_key: String,
    /// New transactions copy this into their `is_test_mode` flag.
    pub sandbox_mode: bool,
    pub created_at: i64,
}

/// Data required to create a merchant (seed tooling and tests).
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMerchant {
    pub name: String,
    pub email: String,
}
