//! Registry configuration
//!
//! Loaded from a JSON file. Only `data_dir` and `admin` are required:
//!
//! ```json
//! {
//!   "data_dir": "./snipreg-data",
//!   "admin": "0xadmin",
//!   "max_versions": 10,
//!   "posting_fee": "0",
//!   "supported_languages": ["solidity", "rust"],
//!   "reputation_file": "./balances.json"
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::oracle::{NoReputation, OracleError, ReputationSource, StaticReputation};
use crate::registry::{
    amount, ActorId, Balance, Category, Language, RecordPolicy, RegistrySettings, SupportedSet,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error(transparent)]
    Reputation(#[from] OracleError),
}

impl ConfigError {
    pub fn code(&self) -> &'static str {
        "SNIP_CONFIG_ERROR"
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Directory holding the registry snapshot (required)
    pub data_dir: PathBuf,

    /// Initial admin actor (required)
    pub admin: String,

    /// Upper bound on a record's version chain (default 10)
    #[serde(default = "default_max_versions")]
    pub max_versions: usize,

    /// Initial posting fee, as a decimal string (default "0")
    #[serde(default, with = "amount")]
    pub posting_fee: Balance,

    #[serde(default = "default_languages")]
    pub supported_languages: Vec<Language>,

    #[serde(default = "default_categories")]
    pub supported_categories: Vec<Category>,

    /// JSON map of actor to decimal balance, used to weight votes
    #[serde(default)]
    pub reputation_file: Option<PathBuf>,
}

fn default_max_versions() -> usize {
    10
}

fn default_languages() -> Vec<Language> {
    Language::ALL.to_vec()
}

fn default_categories() -> Vec<Category> {
    Category::ALL.to_vec()
}

impl RegistryConfig {
    /// Minimal valid config with every default applied
    pub fn new(data_dir: impl Into<PathBuf>, admin: impl Into<String>) -> Self {
        Self {
            data_dir: data_dir.into(),
            admin: admin.into(),
            max_versions: default_max_versions(),
            posting_fee: 0,
            supported_languages: default_languages(),
            supported_categories: default_categories(),
            reputation_file: None,
        }
    }

    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> ConfigResult<Self> {
        let config: RegistryConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("data_dir must not be empty".into()));
        }
        if self.admin.trim().is_empty() {
            return Err(ConfigError::Invalid("admin must not be empty".into()));
        }
        if self.max_versions == 0 {
            return Err(ConfigError::Invalid("max_versions must be > 0".into()));
        }
        Ok(())
    }

    pub fn data_path(&self) -> &Path {
        &self.data_dir
    }

    /// Settings for a fresh registry
    pub fn settings(&self) -> RegistrySettings {
        RegistrySettings {
            admin: ActorId::new(self.admin.clone()),
            policy: RecordPolicy {
                max_versions: self.max_versions,
                posting_fee: self.posting_fee,
                languages: SupportedSet::new(self.supported_languages.iter().copied()),
                categories: SupportedSet::new(self.supported_categories.iter().copied()),
            },
        }
    }

    /// Reputation source named by the config, or one that knows nobody.
    pub fn reputation_source(&self) -> ConfigResult<Box<dyn ReputationSource>> {
        match &self.reputation_file {
            Some(path) => Ok(Box::new(StaticReputation::from_file(path)?)),
            None => Ok(Box::new(NoReputation)),
        }
    }
}
