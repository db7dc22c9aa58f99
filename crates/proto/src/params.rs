use meigen_core::{QuoteFilters, QuoteSearchOptions};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Query string accepted by `GET /quotes`.
///
/// Values are kept as raw strings so malformed input can be reported with
/// the API's own error envelope instead of a framework rejection.
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct QuoteListParams {
    #[serde(default)]
    pub limit: Option<String>,
    #[serde(default)]
    pub offset: Option<String>,
    /// 1-based; overrides `offset` when present.
    #[serde(default)]
    pub page: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    /// Comma-separated tag list, matched with OR semantics.
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(rename = "caseSensitive", default)]
    pub case_sensitive: Option<String>,
    #[serde(rename = "exactMatch", default)]
    pub exact_match: Option<String>,
}

/// `true`/`1`/`yes` and `false`/`0`/`no`, case-insensitive; anything else is an error.
pub fn parse_flag(name: &str, raw: Option<&str>) -> Result<bool, String> {
    match raw.map(|s| s.trim().to_ascii_lowercase()) {
        None => Ok(false),
        Some(v) => match v.as_str() {
            "" | "false" | "0" | "no" => Ok(false),
            "true" | "1" | "yes" => Ok(true),
            _ => Err(format!("{name} must be a boolean")),
        },
    }
}

impl QuoteListParams {
    pub fn filters(&self) -> QuoteFilters {
        QuoteFilters {
            category: self.category.clone(),
            author: self.author.clone(),
            tags: self.tags.as_deref().map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_owned)
                    .collect()
            }),
        }
    }

    pub fn options(&self) -> Result<QuoteSearchOptions, String> {
        Ok(QuoteSearchOptions {
            case_sensitive: parse_flag("caseSensitive", self.case_sensitive.as_deref())?,
            exact_match: parse_flag("exactMatch", self.exact_match.as_deref())?,
        })
    }
}
