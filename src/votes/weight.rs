//! Vote weighting policy
//!
//! weight = 1                                   if balance < UNIT
//! weight = 1 + floor(log2(balance / UNIT))     otherwise
//!
//! Holding twice as much adds one unit of weight, so influence grows
//! logarithmically with balance. When the reputation source cannot answer,
//! the vote falls back to weight 1 instead of failing.

use std::fmt;

use crate::oracle::ReputationSource;
use crate::registry::{ActorId, Balance};

/// One whole unit in the source's 18-decimal fixed-point convention.
pub const REPUTATION_UNIT: Balance = 1_000_000_000_000_000_000;

/// Weight given to voters below one unit and to fallback lookups.
pub const BASE_WEIGHT: u64 = 1;

/// Weight for a known balance.
pub fn weight_for_balance(balance: Balance) -> u64 {
    if balance < REPUTATION_UNIT {
        return BASE_WEIGHT;
    }
    BASE_WEIGHT + u64::from((balance / REPUTATION_UNIT).ilog2())
}

/// Why a lookup did not produce a balance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    /// Source answered but has no entry for the voter
    NoBalance,
    /// Source failed; carries the source's error text
    SourceFailed(String),
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackReason::NoBalance => write!(f, "no balance reported"),
            FallbackReason::SourceFailed(reason) => write!(f, "source failed: {}", reason),
        }
    }
}

/// Resolved weight of one vote and how it was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoteWeight {
    FromBalance { balance: Balance, weight: u64 },
    Fallback(FallbackReason),
}

impl VoteWeight {
    pub fn value(&self) -> u64 {
        match self {
            VoteWeight::FromBalance { weight, .. } => *weight,
            VoteWeight::Fallback(_) => BASE_WEIGHT,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, VoteWeight::Fallback(_))
    }
}

/// Looks up `actor` in `source` and applies the weighting policy.
pub fn resolve_weight(source: &dyn ReputationSource, actor: &ActorId) -> VoteWeight {
    match source.balance_of(actor) {
        Ok(Some(balance)) => VoteWeight::FromBalance {
            balance,
            weight: weight_for_balance(balance),
        },
        Ok(None) => VoteWeight::Fallback(FallbackReason::NoBalance),
        Err(e) => VoteWeight::Fallback(FallbackReason::SourceFailed(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::{NoReputation, OracleError, StaticReputation};

    #[test]
    fn test_below_unit_is_base_weight() {
        assert_eq!(weight_for_balance(0), 1);
        assert_eq!(weight_for_balance(REPUTATION_UNIT - 1), 1);
    }

    #[test]
    fn test_powers_of_two_step_weight() {
        assert_eq!(weight_for_balance(REPUTATION_UNIT), 1);
        assert_eq!(weight_for_balance(2 * REPUTATION_UNIT - 1), 1);
        assert_eq!(weight_for_balance(2 * REPUTATION_UNIT), 2);
        assert_eq!(weight_for_balance(3 * REPUTATION_UNIT), 2);
        assert_eq!(weight_for_balance(4 * REPUTATION_UNIT), 3);
        assert_eq!(weight_for_balance(1024 * REPUTATION_UNIT), 11);
    }

    #[test]
    fn test_max_balance_does_not_overflow() {
        // u128::MAX / 10^18 is just under 2^69.
        assert_eq!(weight_for_balance(Balance::MAX), 69);
    }

    #[test]
    fn test_monotonic_above_unit() {
        let mut previous = weight_for_balance(REPUTATION_UNIT);
        let mut balance = REPUTATION_UNIT;
        for _ in 0..200 {
            balance = balance.saturating_add(balance / 3 + 1);
            let weight = weight_for_balance(balance);
            assert!(weight >= previous);
            previous = weight;
        }
    }

    #[test]
    fn test_resolve_from_balance() {
        let source = StaticReputation::new().with_balance("whale", 8 * REPUTATION_UNIT);
        let weight = resolve_weight(&source, &ActorId::new("whale"));
        assert_eq!(weight.value(), 4);
        assert!(!weight.is_fallback());
    }

    #[test]
    fn test_resolve_unknown_actor_falls_back() {
        let weight = resolve_weight(&NoReputation, &ActorId::new("nobody"));
        assert_eq!(weight, VoteWeight::Fallback(FallbackReason::NoBalance));
        assert_eq!(weight.value(), 1);
    }

    #[test]
    fn test_resolve_failing_source_falls_back() {
        let failing = |_: &ActorId| -> Result<Option<Balance>, OracleError> {
            Err(OracleError::Unavailable("timeout".into()))
        };
        let weight = resolve_weight(&failing, &ActorId::new("alice"));
        assert!(weight.is_fallback());
        assert_eq!(weight.value(), 1);
        match weight {
            VoteWeight::Fallback(FallbackReason::SourceFailed(reason)) => {
                assert!(reason.contains("timeout"))
            }
            other => panic!("unexpected weight {:?}", other),
        }
    }
}
