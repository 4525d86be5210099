use thiserror::Error;

/// Broad classification of a [`CanopyError`].
///
/// Callers that only care about what went wrong in general (rather than the
/// exact failure) can branch on this instead of matching every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// An argument had the wrong shape for the operation.
    TypeMismatch,
    /// An argument had the right shape but an unusable value.
    InvalidValue,
    /// A pattern referenced a node type, field, or capture that does not exist.
    UnknownReference,
    /// Pattern text could not be parsed.
    PatternSyntax,
    /// Something failed inside this layer rather than in the caller's input.
    InternalFailure,
}

#[derive(Error, Debug)]
pub enum CanopyError {
    #[error("query was compiled for {expected}, but the node belongs to a {found} tree")]
    LanguageMismatch { expected: String, found: String },

    #[error("invalid language: {name} reports ABI version {version}")]
    InvalidLanguage { name: String, version: usize },

    #[error("incompatible language version {version}, must be between {min} and {max}")]
    IncompatibleLanguage {
        version: usize,
        min: usize,
        max: usize,
    },

    #[error("unknown language: {name}")]
    UnknownLanguage { name: String },

    #[error("parser has no language set")]
    NoLanguage,

    #[error("parsing failed")]
    ParseFailed,

    #[error(
        "invalid edit: start {start_byte}, old end {old_end_byte}, new end {new_end_byte}"
    )]
    InvalidEdit {
        start_byte: usize,
        old_end_byte: usize,
        new_end_byte: usize,
    },

    #[error("invalid node type {name}")]
    UnknownNodeType { name: String },

    #[error("invalid field name {name}")]
    UnknownField { name: String },

    #[error("invalid capture name {name}")]
    UnknownCapture { name: String },

    #[error("invalid syntax at offset {offset} (row {row}, column {column})")]
    PatternSyntax {
        offset: usize,
        row: usize,
        column: usize,
    },

    #[error("source text is unavailable for {start_byte}..{end_byte}")]
    TextUnavailable { start_byte: usize, end_byte: usize },

    #[error("source text is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("failed to materialize {kind} node at byte {start_byte}")]
    Materialize { kind: String, start_byte: usize },

    #[error("match context is already in use on this thread")]
    MatchContextBusy,
}

impl CanopyError {
    /// Map this error onto its [`ErrorKind`].
    pub fn kind(&self) -> ErrorKind {
        match self {
            CanopyError::LanguageMismatch { .. } => ErrorKind::TypeMismatch,
            CanopyError::InvalidLanguage { .. }
            | CanopyError::IncompatibleLanguage { .. }
            | CanopyError::UnknownLanguage { .. }
            | CanopyError::NoLanguage
            | CanopyError::ParseFailed
            | CanopyError::InvalidEdit { .. } => ErrorKind::InvalidValue,
            CanopyError::UnknownNodeType { .. }
            | CanopyError::UnknownField { .. }
            | CanopyError::UnknownCapture { .. } => ErrorKind::UnknownReference,
            CanopyError::PatternSyntax { .. } => ErrorKind::PatternSyntax,
            CanopyError::TextUnavailable { .. }
            | CanopyError::Utf8(_)
            | CanopyError::Materialize { .. }
            | CanopyError::MatchContextBusy => ErrorKind::InternalFailure,
        }
    }
}

pub type Result<T, E = CanopyError> = std::result::Result<T, E>;
