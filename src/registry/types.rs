//! Registry domain types
//!
//! Identifiers are explicit newtypes. Record ids and comment ids are 1-based,
//! strictly increasing and never reused; the value `0` is reserved.

use std::fmt::{self, Write};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Balance-like quantity used for fees and reputation lookups.
///
/// Fixed-point with 18 decimals, so it needs the full `u128` range.
pub type Balance = u128;

/// Identity of a record in the registry.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(u64);

impl RecordId {
    #[inline]
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    #[inline]
    pub fn value(&self) -> u64 {
        self.0
    }

    /// The reserved id. Never assigned to a record.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a comment. Comment ids share one global space across records.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentId(u64);

impl CommentId {
    /// Parent id of a top-level comment.
    pub const TOP_LEVEL: CommentId = CommentId(0);

    #[inline]
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    #[inline]
    pub fn value(&self) -> u64 {
        self.0
    }

    #[inline]
    pub fn is_top_level(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque, pre-authenticated caller identity.
///
/// The registry trusts whatever identity it is handed.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(String);

impl ActorId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ActorId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Content-addressed reference to externally stored code or text.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentRef(String);

impl ContentRef {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Derives a `sha256:<hex>` reference for the given bytes.
    pub fn digest(bytes: &[u8]) -> Self {
        let hash = Sha256::digest(bytes);
        let mut out = String::with_capacity(7 + hash.len() * 2);
        out.push_str("sha256:");
        for byte in hash.iter() {
            // Writing into a String cannot fail.
            let _ = write!(out, "{:02x}", byte);
        }
        Self(out)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for ContentRef {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for ContentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Source language of a snippet.
///
/// Which of these the registry accepts is decided by the admin-controlled
/// `SupportedSet<Language>`, not by this enum.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Solidity,
    Vyper,
    Rust,
    JavaScript,
    TypeScript,
    Python,
    Go,
    Move,
    Cairo,
    Other,
}

impl Language {
    pub const ALL: [Language; 10] = [
        Language::Solidity,
        Language::Vyper,
        Language::Rust,
        Language::JavaScript,
        Language::TypeScript,
        Language::Python,
        Language::Go,
        Language::Move,
        Language::Cairo,
        Language::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Solidity => "solidity",
            Language::Vyper => "vyper",
            Language::Rust => "rust",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Python => "python",
            Language::Go => "go",
            Language::Move => "move",
            Language::Cairo => "cairo",
            Language::Other => "other",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Functional category of a snippet.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Utility,
    DeFi,
    Nft,
    Governance,
    Security,
    Oracle,
    Gaming,
    Infrastructure,
    Other,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::Utility,
        Category::DeFi,
        Category::Nft,
        Category::Governance,
        Category::Security,
        Category::Oracle,
        Category::Gaming,
        Category::Infrastructure,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Utility => "utility",
            Category::DeFi => "defi",
            Category::Nft => "nft",
            Category::Governance => "governance",
            Category::Security => "security",
            Category::Oracle => "oracle",
            Category::Gaming => "gaming",
            Category::Infrastructure => "infrastructure",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Acknowledgment from the external fee gate of what the caller paid.
///
/// The registry only compares it against the posting fee. It never collects
/// anything itself.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct FeeProof {
    #[serde(with = "amount")]
    pub paid: Balance,
}

impl FeeProof {
    pub fn new(paid: Balance) -> Self {
        Self { paid }
    }

    /// A proof of nothing paid.
    pub fn none() -> Self {
        Self { paid: 0 }
    }

    pub fn covers(&self, fee: Balance) -> bool {
        self.paid >= fee
    }
}

/// A snippet record.
///
/// Records are never mutated after commit except for the terminal
/// `active = false` transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub author: ActorId,
    pub content_ref: ContentRef,
    pub title: String,
    pub description: String,
    pub language: Language,
    pub category: Category,
    /// Every entry is strictly smaller than `id`. Order is submission order.
    pub dependencies: Vec<RecordId>,
    /// Records this one supersedes, oldest first.
    pub version_chain: Vec<RecordId>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for registering a brand new record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRecord {
    pub content_ref: ContentRef,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub language: Language,
    pub category: Category,
    #[serde(default)]
    pub dependencies: Vec<RecordId>,
}

/// Input for `update` and `fork`.
///
/// Language and category are inherited from the record being superseded or
/// forked. For a fork, `dependencies` are the additional dependencies only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
    pub content_ref: ContentRef,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub dependencies: Vec<RecordId>,
}

/// Serde helper: balances travel as decimal strings in JSON.
pub mod amount {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    use super::Balance;

    pub fn serialize<S: Serializer>(value: &Balance, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Balance, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.trim()
            .parse::<Balance>()
            .map_err(|e| D::Error::custom(format!("invalid amount '{}': {}", raw, e)))
    }
}
