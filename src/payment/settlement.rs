//! Mock settlement policy.
//!
//! There is no payment network behind this gateway; settlement is a policy
//! decision injected into [`AppState`](crate::db::AppState). The default
//! mirrors the checkout simulation: an 80% success Bernoulli draw. Fixed
//! policies exist for tests and sandbox tooling.

use rand::Rng;

use crate::models::PaymentStatus;

#[derive(Debug, Clone, Copy)]
pub enum SettlementPolicy {
    /// Resolve to success with the given probability.
    Bernoulli { success_rate: f64 },
    /// Always resolve to the given outcome. Must be success or failed.
    Fixed(PaymentStatus),
}

impl SettlementPolicy {
    /// The checkout simulation's historical default.
    pub fn mock_default() -> Self {
        Self::Bernoulli { success_rate: 0.8 }
    }

    pub fn always_success() -> Self {
        Self::Fixed(PaymentStatus::Success)
    }

    pub fn always_failed() -> Self {
        Self::Fixed(PaymentStatus::Failed)
    }

    /// Draw the settlement outcome for one transaction.
    pub fn decide(&self) -> PaymentStatus {
        match self {
            Self::Bernoulli { success_rate } => {
                if rand::thread_rng().gen_bool(*success_rate) {
                    PaymentStatus::Success
                } else {
                    PaymentStatus::Failed
                }
            }
            Self::Fixed(outcome) => *outcome,
        }
    }
}

impl Default for SettlementPolicy {
    fn default() -> Self {
        Self::mock_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_policies() {
        assert_eq!(
            SettlementPolicy::always_success().decide(),
            PaymentStatus::Success
        );
        assert_eq!(
            SettlementPolicy::always_failed().decide(),
            PaymentStatus::Failed
        );
    }

    #[test]
    fn test_bernoulli_extremes() {
        let always = SettlementPolicy::Bernoulli { success_rate: 1.0 };
        let never = SettlementPolicy::Bernoulli { success_rate: 0.0 };
        for _ in 0..32 {
            assert_eq!(always.decide(), PaymentStatus::Success);
            assert_eq!(never.decide(), PaymentStatus::Failed);
        }
    }
}
