use meigen_core::{Quote, QuoteFilters, QuoteSearchOptions};
use meigen_server::{filter_quotes, QuoteService};
use meigen_storage_ephemeral::EphemeralSource;
use meigen_storage_local::FileSource;
use serde_json::Value;
use std::path::Path;
use tokio::runtime::Runtime;

pub fn runtime() -> Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("build bench runtime")
}

/// A service whose cache is already warm.
pub struct WarmStack {
    pub runtime: Runtime,
    pub service: QuoteService<EphemeralSource>,
    pub quotes: Vec<Quote>,
}

impl WarmStack {
    pub fn new(records: &[Value]) -> Self {
        let runtime = runtime();
        let service = QuoteService::new(EphemeralSource::from_value(&Value::Array(
            records.to_vec(),
        )));
        let quotes = runtime.block_on(service.all()).expect("warm cache");
        Self {
            runtime,
            service,
            quotes,
        }
    }
}

/// Read, parse, and validate a dataset file through a fresh cache.
pub fn measure_cold_load(runtime: &Runtime, path: &Path) -> usize {
    let service = QuoteService::new(FileSource::new(path));
    runtime
        .block_on(service.initialize())
        .expect("cold load")
}

pub fn measure_filter(quotes: &[Quote], tag: &str, exact: bool) -> usize {
    let filters = QuoteFilters {
        tags: Some(vec![tag.to_string()]),
        ..Default::default()
    };
    let options = QuoteSearchOptions {
        case_sensitive: false,
        exact_match: exact,
    };
    filter_quotes(quotes, &filters, options).len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasets::{generate_quotes, write_json_dataset};

    #[test]
    fn cold_load_counts_every_record() {
        let file = write_json_dataset(&generate_quotes(50, 1));
        assert_eq!(measure_cold_load(&runtime(), file.path()), 50);
    }

    #[test]
    fn exact_tag_filter_is_a_subset() {
        let stack = WarmStack::new(&generate_quotes(300, 5));
        let loose = measure_filter(&stack.quotes, "努", false);
        let exact = measure_filter(&stack.quotes, "努", true);
        assert!(exact <= loose);
        assert_eq!(exact, 0);
        assert!(loose > 0);
    }
}
