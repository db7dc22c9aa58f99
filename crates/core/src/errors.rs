use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// A single field-addressed validation failure.
///
/// `field` is a dotted/bracketed path such as `tags[2]` or `quotes[4].text`.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[error("Validation failed for field '{field}': {reason}")]
pub struct ValidationError {
    pub field: String,
    pub value: Value,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, value: Value, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value,
            reason: reason.into(),
        }
    }

    /// Re-home the error under an array element, e.g. `text` -> `quotes[3].text`.
    #[must_use]
    pub fn at_index(self, index: usize) -> Self {
        Self {
            field: format!("quotes[{index}].{}", self.field),
            ..self
        }
    }
}

/// Failures surfaced by a byte source.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("io error: {0}")]
    Io(String),
}

impl From<std::io::Error> for SourceError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => SourceError::NotFound(err.to_string()),
            std::io::ErrorKind::PermissionDenied => SourceError::PermissionDenied(err.to_string()),
            _ => SourceError::Io(err.to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum DataAccessError {
    #[error("Quotes data file not found")]
    FileNotFound,
    #[error("Permission denied accessing quotes data file")]
    PermissionDenied,
    #[error("File system error: {0}")]
    FileSystem(String),
    #[error("Invalid JSON format in quotes data file: {0}")]
    InvalidJson(String),
    #[error("Invalid JSON structure: expected {{ quotes: Quote[] }}")]
    InvalidStructure,
    #[error("Invalid quote data: {0}")]
    ValidationFailed(ValidationError),
    #[error("Unexpected error loading quotes: {0}")]
    Unknown(String),
}

impl DataAccessError {
    pub fn code(&self) -> &'static str {
        match self {
            DataAccessError::FileNotFound => "FILE_NOT_FOUND",
            DataAccessError::PermissionDenied => "PERMISSION_DENIED",
            DataAccessError::FileSystem(_) => "FILE_SYSTEM_ERROR",
            DataAccessError::InvalidJson(_) => "INVALID_JSON",
            DataAccessError::InvalidStructure => "INVALID_STRUCTURE",
            DataAccessError::ValidationFailed(_) => "VALIDATION_FAILED",
            DataAccessError::Unknown(_) => "UNKNOWN_ERROR",
        }
    }
}

impl From<SourceError> for DataAccessError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::NotFound(_) => DataAccessError::FileNotFound,
            SourceError::PermissionDenied(_) => DataAccessError::PermissionDenied,
            SourceError::Io(msg) => DataAccessError::FileSystem(msg),
        }
    }
}

impl From<serde_json::Error> for DataAccessError {
    fn from(err: serde_json::Error) -> Self {
        DataAccessError::InvalidJson(err.to_string())
    }
}

impl From<ValidationError> for DataAccessError {
    fn from(err: ValidationError) -> Self {
        DataAccessError::ValidationFailed(err)
    }
}

#[derive(Debug, Error)]
pub enum QuoteServiceError {
    #[error("No quotes available")]
    NoQuotesAvailable,
    #[error("Invalid quote ID: {0}. ID must be a positive integer")]
    InvalidQuoteId(String),
    #[error("Quote with id {0} not found")]
    NotFound(String),
    #[error("Failed to initialize QuoteService: {0}")]
    Initialization(#[from] DataAccessError),
}

impl QuoteServiceError {
    pub fn code(&self) -> &'static str {
        match self {
            QuoteServiceError::NoQuotesAvailable => "NO_QUOTES_AVAILABLE",
            QuoteServiceError::InvalidQuoteId(_) => "INVALID_QUOTE_ID",
            QuoteServiceError::NotFound(_) => "NOT_FOUND",
            QuoteServiceError::Initialization(_) => "INITIALIZATION_FAILED",
        }
    }
}
