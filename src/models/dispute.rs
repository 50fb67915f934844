use serde::{Deserialize, Serialize};

/// A chargeback-like record referencing exactly one transaction.
///
/// Lifecycle: open -> under_review (merchant responded) -> won | lost
/// (admin resolution). A resolved dispute is immutable.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dispute {
    pub id: String,
    pub transaction_id: String,
    pub merchant_id: String,
    /// Denormalized from the transaction for display.
    pub order_id: String,
    /// Denormalized transaction amount; the dispute-triggered refund uses this.
    pub amount: i64,
    pub reason: DisputeReason,
    pub status: DisputeStatus,
    pub customer_email: String,
    pub customer_message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merchant_response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<DisputeEvidence>,
    /// Present iff status is won or lost.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<DisputeResolution>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisputeStatus {
    Open,
    UnderReview,
    Won,
    Lost,
}

impl DisputeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::UnderReview => "under_review",
            Self::Won => "won",
            Self::Lost => "lost",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

impl std::str::FromStr for DisputeStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "under_review" => Ok(Self::UnderReview),
            "won" => Ok(Self::Won),
            "lost" => Ok(Self::Lost),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for DisputeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Customer-supplied reason for the dispute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisputeReason {
    Fraudulent,
    Unrecognized,
    Duplicate,
    ProductNotReceived,
    ProductUnacceptable,
    CreditNotProcessed,
    Other,
}

impl DisputeReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fraudulent => "fraudulent",
            Self::Unrecognized => "unrecognized",
            Self::Duplicate => "duplicate",
            Self::ProductNotReceived => "product_not_received",
            Self::ProductUnacceptable => "product_unacceptable",
            Self::CreditNotProcessed => "credit_not_processed",
            Self::Other => "other",
        }
    }
}

impl std::str::FromStr for DisputeReason {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fraudulent" => Ok(Self::Fraudulent),
            "unrecognized" => Ok(Self::Unrecognized),
            "duplicate" => Ok(Self::Duplicate),
            "product_not_received" => Ok(Self::ProductNotReceived),
            "product_unacceptable" => Ok(Self::ProductUnacceptable),
            "credit_not_processed" => Ok(Self::CreditNotProcessed),
            "other" => Ok(Self::Other),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for DisputeReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Evidence bundle submitted by the merchant alongside a response.
/// Stored as a JSON column.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisputeEvidence {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// URLs to uploaded documents.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub documents: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_tracking: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refund_policy: Option<String>,
}

/// Which party the admin decided for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisputeDecision {
    /// Merchant wins: dispute becomes `won`, transaction untouched.
    Merchant,
    /// Customer wins: dispute becomes `lost`, refund step is triggered.
    Customer,
}

impl DisputeDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Merchant => "merchant",
            Self::Customer => "customer",
        }
    }
}

impl std::str::FromStr for DisputeDecision {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "merchant" => Ok(Self::Merchant),
            "customer" => Ok(Self::Customer),
            _ => Err(()),
        }
    }
}

/// Resolution metadata recorded by the admin decision.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisputeResolution {
    pub decision: DisputeDecision,
    /// Admin identity (email).
    pub resolved_by: String,
    pub resolved_at: i64,
    pub notes: String,
}

/// Data required to open a dispute against a transaction.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenDispute {
    pub transaction_id: String,
    pub reason: DisputeReason,
    pub customer_message: String,
}

/// Merchant evidence submission.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisputeResponse {
    pub merchant_response: String,
    #[serde(default)]
    pub evidence: Option<DisputeEvidence>,
}
