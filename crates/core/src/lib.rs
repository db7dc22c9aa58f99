//! Core quote model, validation, and integrity reporting.
//! No async and no IO within this crate.

pub mod errors;
pub mod integrity;
pub mod model;
pub mod traits;
pub mod validate;

pub use crate::errors::{DataAccessError, QuoteServiceError, SourceError, ValidationError};
pub use crate::integrity::{check_data_integrity, quality_score, IntegrityReport};
pub use crate::model::{
    Category, CreateQuoteRequest, Quote, QuoteFilters, QuoteId, QuoteSearchOptions,
    UpdateQuoteRequest,
};
pub use crate::traits::QuoteSource;
pub use crate::validate::{
    check_quote, check_quotes, contains_japanese, is_canonical_timestamp, is_valid_category,
    validate_quote, validate_quotes, ValidationReport,
};
