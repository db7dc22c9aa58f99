//! Dataset statistics for diagnostics. Never rejects input.

use crate::model::QuoteId;
use crate::validate::validate_quote;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrityReport {
    pub total_quotes: usize,
    pub valid_quotes: usize,
    pub invalid_quotes: usize,
    pub category_distribution: BTreeMap<String, usize>,
    pub author_distribution: BTreeMap<String, usize>,
    /// One entry per repeat occurrence; the first occurrence is not listed.
    pub duplicate_ids: Vec<QuoteId>,
    /// Failing field names, deduplicated, in first-seen order.
    pub missing_fields: Vec<String>,
    pub quality_score: u8,
}

/// Weighted blend of validity (80%) and uniqueness (20%), 0..=100.
pub fn quality_score(total: usize, valid: usize, duplicates: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let valid_ratio = valid as f64 / total as f64;
    let duplicate_ratio = duplicates as f64 / total as f64;
    let score = ((valid_ratio * 0.8 + (1.0 - duplicate_ratio) * 0.2) * 100.0).round();
    score.clamp(0.0, 100.0) as u8
}

pub fn check_data_integrity(records: &[Value]) -> IntegrityReport {
    let mut report = IntegrityReport {
        total_quotes: records.len(),
        ..Default::default()
    };
    let mut seen: HashSet<QuoteId> = HashSet::new();

    for record in records {
        match validate_quote(record) {
            Ok(quote) => {
                report.valid_quotes += 1;
                if !seen.insert(quote.id) {
                    report.duplicate_ids.push(quote.id);
                }
                *report
                    .category_distribution
                    .entry(quote.category)
                    .or_default() += 1;
                *report.author_distribution.entry(quote.author).or_default() += 1;
            }
            Err(err) => {
                report.invalid_quotes += 1;
                if !report.missing_fields.contains(&err.field) {
                    report.missing_fields.push(err.field);
                }
            }
        }
    }

    report.quality_score = quality_score(
        report.total_quotes,
        report.valid_quotes,
        report.duplicate_ids.len(),
    );
    report
}
