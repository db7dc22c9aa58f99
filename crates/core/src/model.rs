use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

pub type QuoteId = u64;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Quote {
    pub id: QuoteId,
    pub text: String,
    pub author: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// Canonical UTC timestamp, e.g. `2024-01-01T00:00:00.000Z`.
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

impl Quote {
    /// Tags as a slice; a quote without tags yields an empty slice.
    pub fn tag_list(&self) -> &[String] {
        self.tags.as_deref().unwrap_or(&[])
    }
}

/// The closed set of categories a quote may belong to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "人生")]
    Life,
    #[serde(rename = "成功")]
    Success,
    #[serde(rename = "愛")]
    Love,
    #[serde(rename = "友情")]
    Friendship,
    #[serde(rename = "勇気")]
    Courage,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Life,
        Category::Success,
        Category::Love,
        Category::Friendship,
        Category::Courage,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Life => "人生",
            Category::Success => "成功",
            Category::Love => "愛",
            Category::Friendship => "友情",
            Category::Courage => "勇気",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| s.to_owned())
    }
}

/// Payload for creating a quote; `id` and `createdAt` are assigned by the store.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateQuoteRequest {
    pub text: String,
    pub author: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

/// Partial update; `id` and `createdAt` are immutable.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct UpdateQuoteRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

/// Composite filter: AND across fields, OR across `tags`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct QuoteFilters {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

impl QuoteFilters {
    pub fn is_empty(&self) -> bool {
        let blank = |v: &Option<String>| v.as_deref().map_or(true, str::is_empty);
        blank(&self.category)
            && blank(&self.author)
            && self
                .tags
                .as_ref()
                .map_or(true, |tags| tags.iter().all(|t| t.trim().is_empty()))
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct QuoteSearchOptions {
    #[serde(rename = "caseSensitive", default)]
    pub case_sensitive: bool,
    #[serde(rename = "exactMatch", default)]
    pub exact_match: bool,
}
