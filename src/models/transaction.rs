use serde::{Deserialize, Serialize};

/// A payment attempt and its terminal outcome.
///
/// Amounts are integer minor units (paise for INR). The amount is fixed at
/// creation; only the status and refund sub-fields ever change, and status
/// transitions are monotonic: pending -> success|failed, success -> refunded.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    /// Merchant-visible order reference (`order_` + 32 hex chars), globally unique.
    pub order_id: String,
    pub merchant_id: String,
    pub amount: i64,
    pub currency: String,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub customer_email: String,
    pub is_test_mode: bool,
    /// Set when a dispute is opened; at most one dispute per transaction.
    pub has_dispute: bool,
    // Refund sub-fields, populated only when status == refunded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refunded_amount: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refund_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refund_date: Option<i64>,
    pub created_at: i64,
}

/// Lifecycle state of a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Success,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Refunded => "refunded",
        }
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            "refunded" => Ok(Self::Refunded),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Payment instrument used at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Card,
    Upi,
    Wallet,
    Netbanking,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Card => "card",
            Self::Upi => "upi",
            Self::Wallet => "wallet",
            Self::Netbanking => "netbanking",
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "card" => Ok(Self::Card),
            "upi" => Ok(Self::Upi),
            "wallet" => Ok(Self::Wallet),
            "netbanking" => Ok(Self::Netbanking),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Data required to create a payment order.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePayment {
    pub amount: i64,
    pub method: PaymentMethod,
    pub customer_email: String,
    #[serde(default)]
    pub currency: Option<String>,
}

/// Filters for transaction listings.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct TransactionFilters {
    pub status: Option<PaymentStatus>,
    pub method: Option<PaymentMethod>,
}
