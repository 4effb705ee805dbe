//! Vote ledger and reputation-weighted scoring
//!
//! - One vote per (record, actor) until the actor removes it
//! - Score is the signed sum of vote weights
//! - Weight is damped logarithmically in the voter's balance
//! - An unavailable reputation source degrades to weight 1

mod ledger;
mod weight;

pub use ledger::{VoteDirection, VoteLedger, VoteStats};
pub use weight::{
    resolve_weight, weight_for_balance, FallbackReason, VoteWeight, BASE_WEIGHT, REPUTATION_UNIT,
};
