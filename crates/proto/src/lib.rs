//! Wire envelopes, route table, and request parameters for the quotes API.

pub mod envelope;
pub mod params;
pub mod routes;

pub use crate::envelope::{
    timestamp_now, ApiResponse, ErrorBody, ErrorResponse, Meta, Pagination,
};
pub use crate::params::{parse_flag, QuoteListParams};
pub use crate::routes::*;

use schemars::{schema_for, JsonSchema};

/// JSON Schema for a wire type, as a plain JSON value.
pub fn schema_value<T: JsonSchema>() -> serde_json::Value {
    serde_json::to_value(schema_for!(T)).unwrap_or(serde_json::Value::Null)
}
