//! Reputation sources
//!
//! The registry asks a `ReputationSource` for a caller's balance-like
//! quantity when weighting a vote. Lookups are synchronous and fallible; the
//! weighting policy in `votes::weight` decides what a failure means.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::registry::{ActorId, Balance};

/// Failure of a reputation lookup
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OracleError {
    #[error("reputation source unavailable: {0}")]
    Unavailable(String),

    #[error("malformed balance for '{actor}': {reason}")]
    Malformed { actor: String, reason: String },

    #[error("failed to load reputation file '{path}': {reason}")]
    Load { path: String, reason: String },
}

/// Synchronous lookup of an actor's balance.
///
/// `Ok(None)` means the source has no entry for the actor.
pub trait ReputationSource {
    fn balance_of(&self, actor: &ActorId) -> Result<Option<Balance>, OracleError>;
}

impl<F> ReputationSource for F
where
    F: Fn(&ActorId) -> Result<Option<Balance>, OracleError>,
{
    fn balance_of(&self, actor: &ActorId) -> Result<Option<Balance>, OracleError> {
        self(actor)
    }
}

/// Source that knows nobody. Every vote gets the base weight.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoReputation;

impl ReputationSource for NoReputation {
    fn balance_of(&self, _actor: &ActorId) -> Result<Option<Balance>, OracleError> {
        Ok(None)
    }
}

/// Fixed table of balances, loadable from a JSON file.
///
/// File format: `{"alice": "2000000000000000000", ...}` (decimal strings).
#[derive(Debug, Clone, Default)]
pub struct StaticReputation {
    balances: BTreeMap<ActorId, Balance>,
}

impl StaticReputation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_balance(mut self, actor: impl Into<String>, balance: Balance) -> Self {
        self.set(ActorId::new(actor), balance);
        self
    }

    pub fn set(&mut self, actor: ActorId, balance: Balance) {
        self.balances.insert(actor, balance);
    }

    pub fn len(&self) -> usize {
        self.balances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }

    /// Parses the JSON balance map.
    pub fn from_json(json: &str) -> Result<Self, OracleError> {
        let raw: BTreeMap<String, String> =
            serde_json::from_str(json).map_err(|e| OracleError::Load {
                path: "<inline>".into(),
                reason: e.to_string(),
            })?;

        let mut source = Self::new();
        for (actor, value) in raw {
            let balance = value.trim().parse::<Balance>().map_err(|e| OracleError::Malformed {
                actor: actor.clone(),
                reason: e.to_string(),
            })?;
            source.set(ActorId::new(actor), balance);
        }
        Ok(source)
    }

    /// Loads the JSON balance map from `path`.
    pub fn from_file(path: &Path) -> Result<Self, OracleError> {
        let content = fs::read_to_string(path).map_err(|e| OracleError::Load {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_json(&content).map_err(|e| match e {
            OracleError::Load { reason, .. } => OracleError::Load {
                path: path.display().to_string(),
                reason,
            },
            other => other,
        })
    }
}

impl ReputationSource for StaticReputation {
    fn balance_of(&self, actor: &ActorId) -> Result<Option<Balance>, OracleError> {
        Ok(self.balances.get(actor).copied())
    }
}
