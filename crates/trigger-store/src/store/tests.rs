use super::*;
use std::collections::BTreeMap;
use std::time::Duration;
use trigger_core::Trigger;

fn trigger(keyword: &str, reply: &str) -> Trigger {
    Trigger::new(keyword, reply).unwrap()
}

async fn sqlite_store() -> SqliteStore {
    SqliteStore::new(":memory:", Duration::from_secs(5))
        .await
        .unwrap()
}

/// Every backend, freshly opened and empty. The tempdir must outlive the stores.
async fn all_stores(dir: &tempfile::TempDir) -> Vec<Box<dyn TriggerStore>> {
    let file_path = dir.path().join("triggers.json");
    vec![
        Box::new(MemoryStore::new()),
        Box::new(FileStore::open(file_path.to_str().unwrap()).await.unwrap()),
        Box::new(sqlite_store().await),
    ]
}

fn as_map(triggers: Vec<Trigger>) -> BTreeMap<String, (String, String)> {
    triggers
        .into_iter()
        .map(|t| (t.key, (t.display, t.reply)))
        .collect()
}

#[tokio::test]
async fn test_upsert_same_key_keeps_one_record_with_last_reply() {
    let dir = tempfile::tempdir().unwrap();
    for store in all_stores(&dir).await {
        store.upsert(&trigger("Hello", "one")).await.unwrap();
        store.upsert(&trigger("hello", "two")).await.unwrap();
        store.upsert(&trigger("  HELLO ", "three")).await.unwrap();

        let all = store.load().await.unwrap();
        assert_eq!(all.len(), 1, "{} kept duplicates", store.name());
        assert_eq!(all[0].key, "hello");
        assert_eq!(all[0].display, "HELLO");
        assert_eq!(all[0].reply, "three");
    }
}

#[tokio::test]
async fn test_remove_twice_returns_true_then_false() {
    let dir = tempfile::tempdir().unwrap();
    for store in all_stores(&dir).await {
        store.upsert(&trigger("bye", "see you")).await.unwrap();
        assert!(store.remove("bye").await.unwrap(), "{}", store.name());
        assert!(!store.remove("bye").await.unwrap(), "{}", store.name());
        assert!(!store.remove("never-added").await.unwrap());
    }
}

#[tokio::test]
async fn test_identical_upsert_is_a_noop() {
    let dir = tempfile::tempdir().unwrap();
    for store in all_stores(&dir).await {
        let t = trigger("Ping", "pong");
        store.upsert(&t).await.unwrap();
        let first = as_map(store.load().await.unwrap());
        store.upsert(&t).await.unwrap();
        let second = as_map(store.load().await.unwrap());
        assert_eq!(first, second, "{}", store.name());
    }
}

#[tokio::test]
async fn test_exists_tracks_upsert_and_remove() {
    let dir = tempfile::tempdir().unwrap();
    for store in all_stores(&dir).await {
        assert!(!store.exists("weather").await.unwrap());
        store.upsert(&trigger("Weather", "sunny")).await.unwrap();
        assert!(store.exists("weather").await.unwrap(), "{}", store.name());
        store.remove("weather").await.unwrap();
        assert!(!store.exists("weather").await.unwrap());
    }
}

#[tokio::test]
async fn test_load_replays_mutation_sequence() {
    let dir = tempfile::tempdir().unwrap();
    for store in all_stores(&dir).await {
        store.upsert(&trigger("a", "1")).await.unwrap();
        store.upsert(&trigger("b", "2")).await.unwrap();
        store.upsert(&trigger("c", "3")).await.unwrap();
        store.remove("b").await.unwrap();
        store.upsert(&trigger("A", "4")).await.unwrap();
        store.upsert(&trigger("d", "")).await.unwrap();

        let mut expected = BTreeMap::new();
        expected.insert("a".to_string(), ("A".to_string(), "4".to_string()));
        expected.insert("c".to_string(), ("c".to_string(), "3".to_string()));
        expected.insert("d".to_string(), ("d".to_string(), String::new()));

        assert_eq!(as_map(store.load().await.unwrap()), expected, "{}", store.name());
        // Reading again changes nothing.
        assert_eq!(as_map(store.load().await.unwrap()), expected);
    }
}

#[tokio::test]
async fn test_concurrent_upserts_same_key_leave_one_writer() {
    let dir = tempfile::tempdir().unwrap();
    for store in all_stores(&dir).await {
        let store: Arc<dyn TriggerStore> = Arc::from(store);
        let mut handles = Vec::new();
        for i in 0..16 {
            let s = store.clone();
            handles.push(tokio::spawn(async move {
                s.upsert(&Trigger::new("race", &format!("reply-{i}")).unwrap())
                    .await
            }));
        }
        for h in handles {
            h.await.unwrap().unwrap();
        }
        let all = store.load().await.unwrap();
        assert_eq!(all.len(), 1, "{}", store.name());
        let reply = &all[0].reply;
        assert!(
            (0..16).any(|i| *reply == format!("reply-{i}")),
            "torn reply {reply:?} in {}",
            store.name()
        );
    }
}

#[tokio::test]
async fn test_file_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested/dir/triggers.json");
    let path = path.to_str().unwrap();

    let store = FileStore::open(path).await.unwrap();
    store.upsert(&trigger("Weather", "It's sunny!")).await.unwrap();
    store.upsert(&trigger("rain", "Take an umbrella")).await.unwrap();
    drop(store);

    let reopened = FileStore::open(path).await.unwrap();
    let all = as_map(reopened.load().await.unwrap());
    assert_eq!(all.len(), 2);
    assert_eq!(
        all["weather"],
        ("Weather".to_string(), "It's sunny!".to_string())
    );
    assert!(!reopened.path().with_file_name(".triggers.json.tmp").exists());
}

#[tokio::test]
async fn test_file_store_reads_legacy_layout() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("triggers.json");
    std::fs::write(
        &path,
        r#"{ "привет": "Здравствуйте!", "hello": "Hi" }"#,
    )
    .unwrap();

    let store = FileStore::open(path.to_str().unwrap()).await.unwrap();
    let all = as_map(store.load().await.unwrap());
    assert_eq!(all.len(), 2);
    assert_eq!(all["привет"].1, "Здравствуйте!");

    // The next write converts to the record layout.
    store.upsert(&trigger("new", "one")).await.unwrap();
    let raw = std::fs::read_to_string(&path).unwrap();
    assert!(raw.trim_start().starts_with('['), "got {raw}");
    assert!(raw.contains("\"keyword\": \"hello\""));
    assert!(raw.contains("Здравствуйте!"), "non-ASCII kept verbatim");
}

#[tokio::test]
async fn test_file_store_skips_blank_legacy_keyword() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("triggers.json");
    std::fs::write(&path, r#"{ "": "oops", "  ": "blank", "hello": "Hi" }"#).unwrap();

    let store = FileStore::open(path.to_str().unwrap()).await.unwrap();
    let all = as_map(store.load().await.unwrap());
    assert_eq!(all.len(), 1);
    assert_eq!(all["hello"].1, "Hi");

    // Rewriting drops the unusable records.
    store.upsert(&trigger("bye", "See you")).await.unwrap();
    let raw = std::fs::read_to_string(&path).unwrap();
    assert!(!raw.contains("oops"), "got {raw}");
    assert_eq!(store.load().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_file_store_skips_blank_record_keyword() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("triggers.json");
    std::fs::write(
        &path,
        r#"[{"keyword": "", "display": "", "response": "x"},
            {"keyword": "weather", "display": "Weather", "response": "sunny"}]"#,
    )
    .unwrap();

    let store = FileStore::open(path.to_str().unwrap()).await.unwrap();
    let all = as_map(store.load().await.unwrap());
    assert_eq!(all.len(), 1);
    assert!(all.contains_key("weather"));
}

#[tokio::test]
async fn test_file_store_rejects_corrupt_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("triggers.json");
    std::fs::write(&path, "{ not json").unwrap();

    let result = FileStore::open(path.to_str().unwrap()).await;
    assert!(matches!(result, Err(TriggerError::StoreUnavailable(_))));
}

#[tokio::test]
async fn test_file_store_treats_empty_file_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("triggers.json");
    std::fs::write(&path, "").unwrap();

    let store = FileStore::open(path.to_str().unwrap()).await.unwrap();
    assert!(store.load().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_sqlite_load_is_insertion_ordered() {
    let store = sqlite_store().await;
    store.upsert(&trigger("zeta", "1")).await.unwrap();
    store.upsert(&trigger("alpha", "2")).await.unwrap();
    store.upsert(&trigger("zeta", "3")).await.unwrap();

    let keys: Vec<String> = store.load().await.unwrap().into_iter().map(|t| t.key).collect();
    assert_eq!(keys, vec!["zeta", "alpha"]);
}

#[tokio::test]
async fn test_sqlite_migrations_are_idempotent() {
    let store = sqlite_store().await;
    SqliteStore::run_migrations(store.pool()).await.unwrap();
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM _migrations")
        .fetch_one(store.pool())
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_sqlite_on_disk_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("data/triggers.db");
    let db = db.to_str().unwrap();

    let store = SqliteStore::new(db, Duration::from_secs(5)).await.unwrap();
    store.upsert(&trigger("Weather", "sunny")).await.unwrap();
    store.pool().close().await;

    let reopened = SqliteStore::new(db, Duration::from_secs(5)).await.unwrap();
    let all = reopened.load().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].display, "Weather");
}

#[tokio::test]
async fn test_open_store_selects_backend() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = StoreConfig {
        backend: StoreBackend::Memory,
        path: dir.path().join("t.json").to_string_lossy().to_string(),
        db_path: ":memory:".to_string(),
        ..Default::default()
    };
    assert_eq!(open_store(&config).await.unwrap().name(), "memory");
    config.backend = StoreBackend::File;
    assert_eq!(open_store(&config).await.unwrap().name(), "file");
    config.backend = StoreBackend::Sqlite;
    assert_eq!(open_store(&config).await.unwrap().name(), "sqlite");
}

#[tokio::test]
async fn test_open_store_fails_on_unreadable_file() {
    let dir = tempfile::tempdir().unwrap();
    // A directory where the file should be cannot be read as JSON.
    let path = dir.path().join("triggers.json");
    std::fs::create_dir_all(&path).unwrap();
    let config = StoreConfig {
        backend: StoreBackend::File,
        path: path.to_string_lossy().to_string(),
        ..Default::default()
    };
    assert!(open_store(&config).await.is_err());
}
