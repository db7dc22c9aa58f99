use crate::errors::ValidationError;
use crate::model::{Quote, QuoteId};
use chrono::{DateTime, SecondsFormat, Timelike, Utc};
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::OnceLock;

const ALLOWED_CATEGORIES: &[&str] = &["人生", "成功", "愛", "友情", "勇気"];

pub fn is_valid_category(c: &str) -> bool {
    ALLOWED_CATEGORIES.contains(&c)
}

/// True if `text` holds at least one Hiragana, Katakana or CJK ideograph.
pub fn contains_japanese(text: &str) -> bool {
    static JAPANESE: OnceLock<Regex> = OnceLock::new();
    JAPANESE
        .get_or_init(|| {
            Regex::new(r"[\x{3040}-\x{309F}\x{30A0}-\x{30FF}\x{4E00}-\x{9FAF}\x{3400}-\x{4DBF}]")
                .expect("valid regex")
        })
        .is_match(text)
}

/// Accepts only strings that survive a parse / re-serialise round trip
/// through the canonical `YYYY-MM-DDTHH:MM:SS.sssZ` form. Leap seconds
/// (`:60`) are never canonical.
pub fn is_canonical_timestamp(s: &str) -> bool {
    match DateTime::parse_from_rfc3339(s) {
        // chrono encodes a leap second as nanosecond >= 1e9
        Ok(dt) if dt.nanosecond() >= 1_000_000_000 => false,
        Ok(dt) => dt.with_timezone(&Utc).to_rfc3339_opts(SecondsFormat::Millis, true) == s,
        Err(_) => false,
    }
}

static NULL: Value = Value::Null;

fn field<'a>(obj: &'a Map<String, Value>, name: &str) -> &'a Value {
    obj.get(name).unwrap_or(&NULL)
}

fn validate_id(v: &Value) -> Result<QuoteId, ValidationError> {
    let Value::Number(n) = v else {
        return Err(ValidationError::new("id", v.clone(), "ID must be a number"));
    };
    let positive = || ValidationError::new("id", v.clone(), "ID must be a positive integer");
    if let Some(id) = n.as_u64() {
        return if id > 0 { Ok(id) } else { Err(positive()) };
    }
    if n.is_i64() {
        return Err(positive());
    }
    match n.as_f64() {
        Some(f) if f.is_finite() && f.fract() == 0.0 && f >= 1.0 && f <= u64::MAX as f64 => {
            Ok(f as u64)
        }
        _ => Err(positive()),
    }
}

fn validate_text(v: &Value) -> Result<String, ValidationError> {
    let Value::String(s) = v else {
        return Err(ValidationError::new("text", v.clone(), "Text must be a string"));
    };
    if s.trim().is_empty() {
        return Err(ValidationError::new("text", v.clone(), "Text cannot be empty"));
    }
    if !contains_japanese(s) {
        return Err(ValidationError::new(
            "text",
            v.clone(),
            "Text must contain Japanese characters",
        ));
    }
    Ok(s.clone())
}

fn validate_author(v: &Value) -> Result<String, ValidationError> {
    let Value::String(s) = v else {
        return Err(ValidationError::new("author", v.clone(), "Author must be a string"));
    };
    if s.trim().is_empty() {
        return Err(ValidationError::new("author", v.clone(), "Author cannot be empty"));
    }
    Ok(s.clone())
}

fn validate_category(v: &Value) -> Result<String, ValidationError> {
    let Value::String(s) = v else {
        return Err(ValidationError::new(
            "category",
            v.clone(),
            "Category must be a string",
        ));
    };
    if !is_valid_category(s) {
        return Err(ValidationError::new(
            "category",
            v.clone(),
            format!("Category must be one of: {}", ALLOWED_CATEGORIES.join(", ")),
        ));
    }
    Ok(s.clone())
}

fn validate_created_at(v: &Value) -> Result<String, ValidationError> {
    let Value::String(s) = v else {
        return Err(ValidationError::new(
            "createdAt",
            v.clone(),
            "CreatedAt must be a string",
        ));
    };
    if !is_canonical_timestamp(s) {
        return Err(ValidationError::new(
            "createdAt",
            v.clone(),
            "CreatedAt must be valid ISO 8601 format",
        ));
    }
    Ok(s.clone())
}

fn validate_tags(v: Option<&Value>) -> Result<Option<Vec<String>>, ValidationError> {
    let Some(v) = v else {
        return Ok(None);
    };
    let Value::Array(items) = v else {
        return Err(ValidationError::new(
            "tags",
            v.clone(),
            "Tags must be an array if provided",
        ));
    };
    items
        .iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::String(s) => Ok(s.clone()),
            other => Err(ValidationError::new(
                format!("tags[{i}]"),
                other.clone(),
                "Each tag must be a string",
            )),
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

/// Validate one untyped record.
///
/// Checks run in the order id, text, author, category, createdAt, tags and
/// the first failure is returned. Nothing is coerced: a successful result
/// carries the input's values unchanged.
pub fn validate_quote(data: &Value) -> Result<Quote, ValidationError> {
    let no_fields = Map::new();
    let obj = match data {
        Value::Object(obj) => obj,
        // an array has no named fields and falls through to the id check
        Value::Array(_) => &no_fields,
        Value::Null => {
            return Err(ValidationError::new(
                "quote",
                Value::Null,
                "Quote object cannot be null or undefined",
            ))
        }
        other => {
            return Err(ValidationError::new(
                "quote",
                other.clone(),
                "Quote must be an object",
            ))
        }
    };

    let id = validate_id(field(obj, "id"))?;
    let text = validate_text(field(obj, "text"))?;
    let author = validate_author(field(obj, "author"))?;
    let category = validate_category(field(obj, "category"))?;
    let created_at = validate_created_at(field(obj, "createdAt"))?;
    let tags = validate_tags(obj.get("tags"))?;

    Ok(Quote {
        id,
        text,
        author,
        category,
        tags,
        created_at,
    })
}

/// Validate every element of an array, all or nothing.
///
/// The first failing element's error is returned with its field prefixed
/// by `quotes[<index>].`.
pub fn validate_quotes(data: &Value) -> Result<Vec<Quote>, ValidationError> {
    let Value::Array(items) = data else {
        return Err(ValidationError::new(
            "quotes",
            data.clone(),
            "Data must be an array",
        ));
    };
    items
        .iter()
        .enumerate()
        .map(|(i, item)| validate_quote(item).map_err(|e| e.at_index(i)))
        .collect()
}

/// Result-style view over the validators for call sites that report rather
/// than propagate.
#[derive(Clone, Debug, Serialize)]
pub struct ValidationReport<T> {
    #[serde(rename = "isValid")]
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> From<Result<T, ValidationError>> for ValidationReport<T> {
    fn from(result: Result<T, ValidationError>) -> Self {
        match result {
            Ok(data) => Self {
                is_valid: true,
                errors: Vec::new(),
                data: Some(data),
            },
            Err(err) => Self {
                is_valid: false,
                errors: vec![err],
                data: None,
            },
        }
    }
}

pub fn check_quote(data: &Value) -> ValidationReport<Quote> {
    validate_quote(data).into()
}

pub fn check_quotes(data: &Value) -> ValidationReport<Vec<Quote>> {
    validate_quotes(data).into()
}
