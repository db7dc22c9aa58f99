//! Cross-crate integration tests: file-backed source through the cache,
//! query engine, and validator together.

#[cfg(test)]
mod tests {
    use meigen_core::{
        check_data_integrity, validate_quote, validate_quotes, QuoteFilters, QuoteSearchOptions,
        QuoteServiceError,
    };
    use meigen_server::QuoteService;
    use meigen_storage_ephemeral::EphemeralSource;
    use meigen_storage_local::FileSource;
    use serde_json::{json, Value};
    use std::{fs, path::PathBuf, sync::Arc};
    use tempfile::{tempdir, TempDir};

    const TEXTS: [&str; 5] = [
        "石の上にも三年",
        "雨降って地固まる",
        "案ずるより産むが易し",
        "継続は力なり",
        "笑う門には福来る",
    ];
    const CATEGORIES: [&str; 5] = ["人生", "成功", "愛", "友情", "勇気"];

    fn record(id: u64) -> Value {
        let i = (id as usize) % 5;
        let mut v = json!({
            "id": id,
            "text": TEXTS[i],
            "author": format!("著者{}", i),
            "category": CATEGORIES[i],
            "createdAt": "2023-12-31T23:59:59.999Z"
        });
        if id % 2 == 0 {
            v["tags"] = json!(["努力", format!("tag{id}")]);
        }
        v
    }

    fn records(n: u64) -> Vec<Value> {
        (1..=n).map(record).collect()
    }

    fn write(dir: &TempDir, records: &[Value]) -> PathBuf {
        let path = dir.path().join("quotes.json");
        fs::write(&path, json!({ "quotes": records }).to_string()).unwrap();
        path
    }

    #[test]
    fn validation_is_identity_on_valid_records() {
        for v in records(10) {
            let quote = validate_quote(&v).unwrap();
            assert_eq!(serde_json::to_value(&quote).unwrap(), v);
        }
    }

    #[test]
    fn single_bad_element_is_reported_at_its_index() {
        for k in 0..6 {
            let mut items = records(6);
            items[k]["category"] = json!("哲学");
            let err = validate_quotes(&Value::Array(items)).unwrap_err();
            assert_eq!(err.field, format!("quotes[{k}].category"));
        }
    }

    #[test]
    fn integrity_counts_always_balance() {
        let mut items = records(8);
        items.push(record(3));
        items.push(json!(null));
        items.push(json!({"id": -4}));
        let report = check_data_integrity(&items);
        assert_eq!(
            report.valid_quotes + report.invalid_quotes,
            report.total_quotes
        );
        assert_eq!(report.duplicate_ids, vec![3]);
        assert!(report.quality_score < 100);
    }

    #[tokio::test]
    async fn file_backed_service_end_to_end() {
        let tmp = tempdir().unwrap();
        let path = write(&tmp, &records(10));
        let service = QuoteService::new(FileSource::new(&path));

        assert_eq!(service.all().await.unwrap().len(), 10);
        assert_eq!(service.by_category(" 人生 ").await.unwrap().len(), 2);
        assert_eq!(service.by_id(4).await.unwrap().text, TEXTS[4]);

        let tagged = service
            .with_filters(
                &QuoteFilters {
                    tags: Some(vec!["努力".into()]),
                    ..Default::default()
                },
                QuoteSearchOptions::default(),
            )
            .await
            .unwrap();
        assert_eq!(tagged.len(), 5);
        assert!(tagged.iter().all(|q| q.id % 2 == 0));

        // the file changes underneath; only invalidation makes it visible
        write(&tmp, &records(3));
        assert_eq!(service.count(), 10);
        service.invalidate();
        assert_eq!(service.all().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn missing_file_is_retryable() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("quotes.json");
        let service = QuoteService::new(FileSource::new(&path));
        match service.random_quote().await.unwrap_err() {
            QuoteServiceError::Initialization(inner) => assert_eq!(inner.code(), "FILE_NOT_FOUND"),
            other => panic!("unexpected error: {other:?}"),
        }
        write(&tmp, &records(2));
        assert!(service.random_quote().await.is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_first_access_is_idempotent() {
        let source = Arc::new(EphemeralSource::from_value(&Value::Array(records(200))));
        let service = QuoteService::new(Arc::clone(&source));
        let mut handles = Vec::new();
        for i in 0..32 {
            let service = service.clone();
            handles.push(tokio::spawn(async move {
                if i % 2 == 0 {
                    service.all().await.unwrap()
                } else {
                    service.by_author("").await.unwrap()
                }
            }));
        }
        let mut results = Vec::new();
        for h in handles {
            results.push(h.await.unwrap());
        }
        assert!(results.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(source.reads(), 1);
    }

    #[tokio::test]
    async fn callers_cannot_corrupt_the_cache() {
        let service = QuoteService::new(EphemeralSource::from_value(&Value::Array(records(4))));
        let mut copy = service.all().await.unwrap();
        copy[0].text = "改竄".into();
        copy.pop();
        let again = service.all().await.unwrap();
        assert_eq!(again.len(), 4);
        assert_eq!(again[0].text, TEXTS[1]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn unreadable_file_maps_to_permission_denied() {
        use std::os::unix::fs::PermissionsExt;
        let tmp = tempdir().unwrap();
        let path = write(&tmp, &records(1));
        fs::set_permissions(&path, fs::Permissions::from_mode(0o000)).unwrap();
        if fs::read(&path).is_ok() {
            // running as root; permissions are not enforced
            return;
        }
        let service = QuoteService::new(FileSource::new(&path));
        let err = service.all().await.unwrap_err();
        match err {
            QuoteServiceError::Initialization(inner) => {
                assert_eq!(inner.code(), "PERMISSION_DENIED")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
