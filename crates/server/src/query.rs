//! Read-only queries over the cached dataset.

use std::collections::BTreeSet;
use std::sync::Arc;

use meigen_core::{
    DataAccessError, IntegrityReport, Quote, QuoteFilters, QuoteSearchOptions, QuoteServiceError,
    QuoteSource,
};
use rand::Rng;

use crate::cache::{CacheStatus, DatasetCache};

/// Normalised needle, prepared once per query.
struct Needle {
    text: String,
    options: QuoteSearchOptions,
}

impl Needle {
    fn new(raw: &str, options: QuoteSearchOptions) -> Self {
        Self {
            text: fold(raw, options.case_sensitive),
            options,
        }
    }

    fn matches(&self, haystack: &str) -> bool {
        let haystack = fold(haystack, self.options.case_sensitive);
        if self.options.exact_match {
            haystack == self.text
        } else {
            haystack.contains(&self.text)
        }
    }
}

fn fold(s: &str, case_sensitive: bool) -> String {
    let trimmed = s.trim();
    if case_sensitive {
        trimmed.to_owned()
    } else {
        trimmed.to_lowercase()
    }
}

const BY_CATEGORY: QuoteSearchOptions = QuoteSearchOptions {
    case_sensitive: false,
    exact_match: true,
};

const BY_AUTHOR: QuoteSearchOptions = QuoteSearchOptions {
    case_sensitive: false,
    exact_match: false,
};

/// Pick one record uniformly.
pub fn pick_random<R: Rng>(quotes: &[Quote], rng: &mut R) -> Result<Quote, QuoteServiceError> {
    if quotes.is_empty() {
        return Err(QuoteServiceError::NoQuotesAvailable);
    }
    Ok(quotes[rng.gen_range(0..quotes.len())].clone())
}

/// Composite filter over an already-loaded slice.
pub fn filter_quotes(
    quotes: &[Quote],
    filters: &QuoteFilters,
    options: QuoteSearchOptions,
) -> Vec<Quote> {
    let category = filters
        .category
        .as_deref()
        .filter(|c| !c.is_empty())
        .map(|c| Needle::new(c, options));
    let author = filters
        .author
        .as_deref()
        .filter(|a| !a.is_empty())
        .map(|a| Needle::new(a, options));
    let tags: Vec<Needle> = filters
        .tags
        .iter()
        .flatten()
        .filter(|t| !t.trim().is_empty())
        .map(|t| Needle::new(t, options))
        .collect();

    quotes
        .iter()
        .filter(|q| category.as_ref().map_or(true, |n| n.matches(&q.category)))
        .filter(|q| author.as_ref().map_or(true, |n| n.matches(&q.author)))
        .filter(|q| {
            tags.is_empty()
                || q
                    .tag_list()
                    .iter()
                    .any(|tag| tags.iter().any(|n| n.matches(tag)))
        })
        .cloned()
        .collect()
}

/// Query facade over a shared [`DatasetCache`]. Every loading operation
/// populates the cache on first use.
pub struct QuoteService<S> {
    cache: Arc<DatasetCache<S>>,
}

impl<S> Clone for QuoteService<S> {
    fn clone(&self) -> Self {
        Self {
            cache: Arc::clone(&self.cache),
        }
    }
}

impl<S> QuoteService<S>
where
    S: QuoteSource + Send + Sync + 'static,
{
    pub fn new(source: S) -> Self {
        Self::with_cache(Arc::new(DatasetCache::new(source)))
    }

    pub fn with_cache(cache: Arc<DatasetCache<S>>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &Arc<DatasetCache<S>> {
        &self.cache
    }

    async fn dataset(&self) -> Result<Arc<Vec<Quote>>, QuoteServiceError> {
        Ok(self.cache.load().await?)
    }

    /// Load the dataset if needed and report how many records it holds.
    pub async fn initialize(&self) -> Result<usize, QuoteServiceError> {
        Ok(self.dataset().await?.len())
    }

    pub async fn random_quote(&self) -> Result<Quote, QuoteServiceError> {
        let quotes = self.dataset().await?;
        pick_random(&quotes, &mut rand::thread_rng())
    }

    pub async fn random_quote_with<R: Rng>(
        &self,
        rng: &mut R,
    ) -> Result<Quote, QuoteServiceError> {
        let quotes = self.dataset().await?;
        pick_random(&quotes, rng)
    }

    /// Parse a path segment into an id, rejecting anything that is not a
    /// positive integer. A well-formed id too large to store names no
    /// record and resolves to not-found.
    pub fn parse_id(raw: &str) -> Result<i64, QuoteServiceError> {
        let digits = raw.trim();
        let positive = !digits.is_empty()
            && digits.bytes().all(|b| b.is_ascii_digit())
            && digits.bytes().any(|b| b != b'0');
        if !positive {
            return Err(QuoteServiceError::InvalidQuoteId(raw.to_owned()));
        }
        digits
            .parse::<i64>()
            .map_err(|_| QuoteServiceError::NotFound(digits.to_owned()))
    }

    pub async fn by_id(&self, id: i64) -> Result<Quote, QuoteServiceError> {
        if id <= 0 {
            return Err(QuoteServiceError::InvalidQuoteId(id.to_string()));
        }
        let id = id as u64;
        let quotes = self.dataset().await?;
        quotes
            .iter()
            .find(|q| q.id == id)
            .cloned()
            .ok_or_else(|| QuoteServiceError::NotFound(id.to_string()))
    }

    pub async fn all(&self) -> Result<Vec<Quote>, QuoteServiceError> {
        Ok(self.dataset().await?.as_ref().clone())
    }

    /// Case-insensitive exact category match, whitespace-insensitive.
    pub async fn by_category(&self, category: &str) -> Result<Vec<Quote>, QuoteServiceError> {
        let quotes = self.dataset().await?;
        let needle = Needle::new(category, BY_CATEGORY);
        Ok(quotes
            .iter()
            .filter(|q| needle.matches(&q.category))
            .cloned()
            .collect())
    }

    /// Case-insensitive substring match on author. An empty needle matches everything.
    pub async fn by_author(&self, author: &str) -> Result<Vec<Quote>, QuoteServiceError> {
        let quotes = self.dataset().await?;
        let needle = Needle::new(author, BY_AUTHOR);
        Ok(quotes
            .iter()
            .filter(|q| needle.matches(&q.author))
            .cloned()
            .collect())
    }

    pub async fn with_filters(
        &self,
        filters: &QuoteFilters,
        options: QuoteSearchOptions,
    ) -> Result<Vec<Quote>, QuoteServiceError> {
        let quotes = self.dataset().await?;
        Ok(filter_quotes(&quotes, filters, options))
    }

    pub fn count(&self) -> usize {
        self.cache.status().count
    }

    pub fn available_categories(&self) -> Vec<String> {
        self.distinct(|q| &q.category)
    }

    pub fn available_authors(&self) -> Vec<String> {
        self.distinct(|q| &q.author)
    }

    fn distinct(&self, key: impl Fn(&Quote) -> &String) -> Vec<String> {
        let Some(quotes) = self.cache.snapshot() else {
            return Vec::new();
        };
        quotes
            .iter()
            .map(key)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn invalidate(&self) {
        self.cache.invalidate();
    }

    pub fn status(&self) -> CacheStatus {
        self.cache.status()
    }

    pub async fn integrity_report(&self) -> Result<IntegrityReport, DataAccessError> {
        self.cache.integrity_report().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meigen_storage_ephemeral::EphemeralSource;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use serde_json::{json, Value};
    use std::collections::HashSet;

    fn q(id: u64, author: &str, category: &str, tags: Option<&[&str]>) -> Value {
        let mut v = json!({
            "id": id,
            "text": "為せば成る",
            "author": author,
            "category": category,
            "createdAt": "2024-01-01T00:00:00.000Z"
        });
        if let Some(tags) = tags {
            v["tags"] = json!(tags);
        }
        v
    }

    fn service() -> QuoteService<EphemeralSource> {
        QuoteService::new(EphemeralSource::from_value(&json!([
            q(1, "Steve Jobs", "人生", Some(&["努力", "夢"])),
            q(2, "上杉鷹山", "成功", Some(&["努力家"])),
            q(3, "マザー・テレサ", "愛", None),
            q(4, "steve wozniak", "人生", Some(&[])),
            q(5, "ことわざ", "勇気", Some(&["Courage"])),
        ])))
    }

    fn ids(quotes: &[Quote]) -> Vec<u64> {
        quotes.iter().map(|q| q.id).collect()
    }

    #[tokio::test]
    async fn by_id_distinguishes_invalid_from_missing() {
        let svc = service();
        assert_eq!(svc.by_id(1).await.unwrap().id, 1);
        assert!(matches!(
            svc.by_id(999).await,
            Err(QuoteServiceError::NotFound(ref id)) if id == "999"
        ));
        for bad in [0, -1] {
            let err = svc.by_id(bad).await.unwrap_err();
            assert_eq!(err.code(), "INVALID_QUOTE_ID");
        }
    }

    #[test]
    fn parse_id_rejects_non_positive_and_non_numeric() {
        type Svc = QuoteService<EphemeralSource>;
        assert_eq!(Svc::parse_id("42").unwrap(), 42);
        assert_eq!(Svc::parse_id("007").unwrap(), 7);
        for raw in ["0", "000", "-3", "+3", "1.5", "abc", "", "1e3"] {
            assert!(
                matches!(Svc::parse_id(raw), Err(QuoteServiceError::InvalidQuoteId(ref r)) if r == raw),
                "{raw}"
            );
        }
    }

    #[test]
    fn oversized_id_is_not_found_rather_than_invalid() {
        type Svc = QuoteService<EphemeralSource>;
        let err = Svc::parse_id("99999999999999999999").unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
        assert!(matches!(err, QuoteServiceError::NotFound(ref id) if id == "99999999999999999999"));
    }

    #[tokio::test]
    async fn random_quote_varies() {
        let svc = service();
        let mut seen = HashSet::new();
        for _ in 0..20 {
            seen.insert(svc.random_quote().await.unwrap().id);
        }
        assert!(seen.len() > 1);
    }

    #[tokio::test]
    async fn random_quote_with_seeded_rng_is_reproducible() {
        let svc = service();
        let a = svc
            .random_quote_with(&mut StdRng::seed_from_u64(7))
            .await
            .unwrap();
        let b = svc
            .random_quote_with(&mut StdRng::seed_from_u64(7))
            .await
            .unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn random_quote_on_empty_dataset() {
        let svc = QuoteService::new(EphemeralSource::default());
        assert_eq!(
            svc.random_quote().await.unwrap_err().code(),
            "NO_QUOTES_AVAILABLE"
        );
    }

    #[tokio::test]
    async fn all_returns_an_independent_copy() {
        let svc = service();
        let mut first = svc.all().await.unwrap();
        first.clear();
        assert_eq!(svc.all().await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn by_category_is_exact_and_trimmed() {
        let svc = service();
        let plain = svc.by_category("人生").await.unwrap();
        assert_eq!(ids(&plain), vec![1, 4]);
        assert_eq!(svc.by_category("  人生  ").await.unwrap(), plain);
        assert!(svc.by_category("人").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn by_author_is_substring_and_case_folded() {
        let svc = service();
        assert_eq!(ids(&svc.by_author("STEVE").await.unwrap()), vec![1, 4]);
        assert_eq!(ids(&svc.by_author("  steve  ").await.unwrap()), vec![1, 4]);
        assert_eq!(svc.by_author("").await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn tag_filter_skips_untagged_records() {
        let svc = service();
        let filters = QuoteFilters {
            tags: Some(vec!["努力".into()]),
            ..Default::default()
        };
        let found = svc
            .with_filters(&filters, QuoteSearchOptions::default())
            .await
            .unwrap();
        assert_eq!(ids(&found), vec![1, 2]);
    }

    #[tokio::test]
    async fn exact_match_narrows_substring_match() {
        let svc = service();
        let filters = QuoteFilters {
            tags: Some(vec!["努".into()]),
            ..Default::default()
        };
        let loose = svc
            .with_filters(&filters, QuoteSearchOptions::default())
            .await
            .unwrap();
        let exact = svc
            .with_filters(
                &filters,
                QuoteSearchOptions {
                    exact_match: true,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(exact.iter().all(|q| loose.contains(q)));
        assert!(exact.is_empty());
        assert_eq!(ids(&loose), vec![1, 2]);
    }

    #[tokio::test]
    async fn filters_combine_with_and_across_fields() {
        let svc = service();
        let filters = QuoteFilters {
            category: Some("人生".into()),
            author: Some("steve".into()),
            tags: Some(vec!["夢".into(), "nothing".into()]),
        };
        let found = svc
            .with_filters(&filters, QuoteSearchOptions::default())
            .await
            .unwrap();
        assert_eq!(ids(&found), vec![1]);
    }

    #[tokio::test]
    async fn case_sensitive_option_is_honoured() {
        let svc = service();
        let filters = QuoteFilters {
            tags: Some(vec!["courage".into()]),
            ..Default::default()
        };
        let folded = svc
            .with_filters(&filters, QuoteSearchOptions::default())
            .await
            .unwrap();
        assert_eq!(ids(&folded), vec![5]);
        let strict = svc
            .with_filters(
                &filters,
                QuoteSearchOptions {
                    case_sensitive: true,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(strict.is_empty());
    }

    #[tokio::test]
    async fn empty_filters_return_everything() {
        let svc = service();
        let filters = QuoteFilters {
            category: Some(String::new()),
            author: None,
            tags: Some(vec!["  ".into()]),
        };
        assert_eq!(
            svc.with_filters(&filters, QuoteSearchOptions::default())
                .await
                .unwrap()
                .len(),
            5
        );
    }

    #[tokio::test]
    async fn blank_tag_needles_do_not_widen_the_match() {
        let svc = service();
        let filters = QuoteFilters {
            tags: Some(vec!["努力".into(), String::new(), "   ".into()]),
            ..Default::default()
        };
        let found = svc
            .with_filters(&filters, QuoteSearchOptions::default())
            .await
            .unwrap();
        assert_eq!(ids(&found), vec![1, 2]);
    }

    #[tokio::test]
    async fn listings_never_load() {
        let svc = service();
        assert!(svc.available_categories().is_empty());
        assert_eq!(svc.count(), 0);
        assert_eq!(svc.cache().source().reads(), 0);

        svc.initialize().await.unwrap();
        assert_eq!(svc.count(), 5);
        assert_eq!(
            svc.available_categories(),
            vec!["人生", "勇気", "愛", "成功"]
        );
        assert_eq!(svc.available_authors().len(), 5);
    }

    #[tokio::test]
    async fn load_failures_surface_as_initialization_errors() {
        let svc = QuoteService::new(EphemeralSource::default());
        svc.cache().source().set_missing();
        match svc.all().await.unwrap_err() {
            QuoteServiceError::Initialization(inner) => assert_eq!(inner.code(), "FILE_NOT_FOUND"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
