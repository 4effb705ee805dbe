//! Registry error types
//!
//! Every failure is a synchronous, pre-commit rejection. An operation that
//! returns one of these has written nothing.
//!
//! Error kinds:
//! - VALIDATION: the request itself is malformed or unaffordable
//! - AUTHORIZATION: the caller may not perform the operation
//! - STATE: the registry is not in a state that allows the operation

use std::fmt;

use super::types::{ActorId, Balance, CommentId, ContentRef, RecordId};

/// Coarse classification of registry errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Authorization,
    State,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Validation => write!(f, "VALIDATION"),
            ErrorKind::Authorization => write!(f, "AUTHORIZATION"),
            ErrorKind::State => write!(f, "STATE"),
        }
    }
}

/// Registry error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryErrorCode {
    /// Content reference is empty
    EmptyContentRef,
    /// Title is empty
    EmptyTitle,
    /// Comment body reference is empty
    EmptyComment,
    /// Content reference already registered
    DuplicateContent,
    /// Language not in the supported set
    UnsupportedLanguage,
    /// Category not in the supported set
    UnsupportedCategory,
    /// Fee proof below the posting fee
    InsufficientFee,
    /// Malformed input, including out-of-range dependency ids
    InvalidInput,
    /// Same dependency listed twice
    DuplicateDependency,
    /// Version chain already at the configured bound
    VersionLimitExceeded,
    /// Parent comment id beyond the comment counter
    InvalidParentComment,
    /// Caller is not the record's author
    NotAuthor,
    /// Caller is not the registry admin
    NotAdmin,
    /// Caller is not a registered reviewer
    NotReviewer,
    /// No record with this id
    RecordNotFound,
    /// Record has been deactivated
    RecordInactive,
    /// Caller already voted on this record
    AlreadyVoted,
    /// Caller has no vote to remove
    NotVoted,
    /// No comment with this id
    CommentNotFound,
}

impl RegistryErrorCode {
    /// Returns the stable string code
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyContentRef => "SNIP_EMPTY_CONTENT_REF",
            Self::EmptyTitle => "SNIP_EMPTY_TITLE",
            Self::EmptyComment => "SNIP_EMPTY_COMMENT",
            Self::DuplicateContent => "SNIP_DUPLICATE_CONTENT",
            Self::UnsupportedLanguage => "SNIP_UNSUPPORTED_LANGUAGE",
            Self::UnsupportedCategory => "SNIP_UNSUPPORTED_CATEGORY",
            Self::InsufficientFee => "SNIP_INSUFFICIENT_FEE",
            Self::InvalidInput => "SNIP_INVALID_INPUT",
            Self::DuplicateDependency => "SNIP_DUPLICATE_DEPENDENCY",
            Self::VersionLimitExceeded => "SNIP_VERSION_LIMIT_EXCEEDED",
            Self::InvalidParentComment => "SNIP_INVALID_PARENT_COMMENT",
            Self::NotAuthor => "SNIP_NOT_AUTHOR",
            Self::NotAdmin => "SNIP_NOT_ADMIN",
            Self::NotReviewer => "SNIP_NOT_REVIEWER",
            Self::RecordNotFound => "SNIP_RECORD_NOT_FOUND",
            Self::RecordInactive => "SNIP_RECORD_INACTIVE",
            Self::AlreadyVoted => "SNIP_ALREADY_VOTED",
            Self::NotVoted => "SNIP_NOT_VOTED",
            Self::CommentNotFound => "SNIP_COMMENT_NOT_FOUND",
        }
    }

    /// Returns the kind of failure this code represents
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotAuthor | Self::NotAdmin | Self::NotReviewer => ErrorKind::Authorization,
            Self::RecordNotFound
            | Self::RecordInactive
            | Self::AlreadyVoted
            | Self::NotVoted
            | Self::CommentNotFound => ErrorKind::State,
            _ => ErrorKind::Validation,
        }
    }
}

impl fmt::Display for RegistryErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Registry error with context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryError {
    code: RegistryErrorCode,
    message: String,
    record_id: Option<RecordId>,
}

impl RegistryError {
    fn new(code: RegistryErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            record_id: None,
        }
    }

    fn on_record(mut self, record_id: RecordId) -> Self {
        self.record_id = Some(record_id);
        self
    }

    pub fn empty_content_ref() -> Self {
        Self::new(RegistryErrorCode::EmptyContentRef, "Content reference must not be empty")
    }

    pub fn empty_title() -> Self {
        Self::new(RegistryErrorCode::EmptyTitle, "Title must not be empty")
    }

    pub fn empty_comment() -> Self {
        Self::new(RegistryErrorCode::EmptyComment, "Comment content reference must not be empty")
    }

    pub fn duplicate_content(content_ref: &ContentRef, existing: RecordId) -> Self {
        Self::new(
            RegistryErrorCode::DuplicateContent,
            format!("Content '{}' already registered by record {}", content_ref, existing),
        )
        .on_record(existing)
    }

    pub fn unsupported_language(language: impl fmt::Display) -> Self {
        Self::new(
            RegistryErrorCode::UnsupportedLanguage,
            format!("Language '{}' is not supported", language),
        )
    }

    pub fn unsupported_category(category: impl fmt::Display) -> Self {
        Self::new(
            RegistryErrorCode::UnsupportedCategory,
            format!("Category '{}' is not supported", category),
        )
    }

    pub fn insufficient_fee(required: Balance, paid: Balance) -> Self {
        Self::new(
            RegistryErrorCode::InsufficientFee,
            format!("Posting fee {} required, {} acknowledged", required, paid),
        )
    }

    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::new(RegistryErrorCode::InvalidInput, reason)
    }

    pub fn invalid_dependency(dependency: RecordId, max_id: u64) -> Self {
        Self::new(
            RegistryErrorCode::InvalidInput,
            format!("Dependency {} outside assigned range 1..={}", dependency, max_id),
        )
        .on_record(dependency)
    }

    pub fn inactive_dependency(dependency: RecordId) -> Self {
        Self::new(
            RegistryErrorCode::RecordInactive,
            format!("Dependency {} is inactive", dependency),
        )
        .on_record(dependency)
    }

    pub fn duplicate_dependency(dependency: RecordId) -> Self {
        Self::new(
            RegistryErrorCode::DuplicateDependency,
            format!("Dependency {} listed more than once", dependency),
        )
        .on_record(dependency)
    }

    pub fn version_limit(record_id: RecordId, max_versions: usize) -> Self {
        Self::new(
            RegistryErrorCode::VersionLimitExceeded,
            format!("Record {} already has {} prior versions", record_id, max_versions),
        )
        .on_record(record_id)
    }

    pub fn invalid_parent_comment(parent: CommentId, max_id: u64) -> Self {
        Self::new(
            RegistryErrorCode::InvalidParentComment,
            format!("Parent comment {} outside assigned range 1..={}", parent, max_id),
        )
    }

    pub fn not_author(actor: &ActorId, record_id: RecordId) -> Self {
        Self::new(
            RegistryErrorCode::NotAuthor,
            format!("'{}' is not the author of record {}", actor, record_id),
        )
        .on_record(record_id)
    }

    pub fn not_admin(actor: &ActorId) -> Self {
        Self::new(
            RegistryErrorCode::NotAdmin,
            format!("'{}' is not the registry admin", actor),
        )
    }

    pub fn not_reviewer(actor: &ActorId) -> Self {
        Self::new(
            RegistryErrorCode::NotReviewer,
            format!("'{}' is not a registered reviewer", actor),
        )
    }

    pub fn record_not_found(record_id: RecordId) -> Self {
        Self::new(
            RegistryErrorCode::RecordNotFound,
            format!("Record {} not found", record_id),
        )
        .on_record(record_id)
    }

    pub fn record_inactive(record_id: RecordId) -> Self {
        Self::new(
            RegistryErrorCode::RecordInactive,
            format!("Record {} is inactive", record_id),
        )
        .on_record(record_id)
    }

    pub fn already_voted(actor: &ActorId, record_id: RecordId) -> Self {
        Self::new(
            RegistryErrorCode::AlreadyVoted,
            format!("'{}' already voted on record {}", actor, record_id),
        )
        .on_record(record_id)
    }

    pub fn not_voted(actor: &ActorId, record_id: RecordId) -> Self {
        Self::new(
            RegistryErrorCode::NotVoted,
            format!("'{}' has no vote on record {}", actor, record_id),
        )
        .on_record(record_id)
    }

    pub fn comment_not_found(comment_id: CommentId) -> Self {
        Self::new(
            RegistryErrorCode::CommentNotFound,
            format!("Comment {} not found", comment_id),
        )
    }

    pub fn code(&self) -> RegistryErrorCode {
        self.code
    }

    pub fn kind(&self) -> ErrorKind {
        self.code.kind()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The record the failure is about, if any.
    pub fn record_id(&self) -> Option<RecordId> {
        self.record_id
    }
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.kind(), self.code.code(), self.message)
    }
}

impl std::error::Error for RegistryError {}

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;
