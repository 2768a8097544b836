//! Importing a file twice must be idempotent under the skip policy, and a
//! subsequent health scan must see one reuse class of exactly two.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::path::{Path, PathBuf};

use {
    tokio::sync::mpsc,
    toolbox_health::HealthAnalyzer,
    toolbox_importer::{CsvImportWorker, ImportOptions, ImportReport},
    toolbox_store::{ROOT_GROUP_ID, open_pool},
    zeroize::Zeroizing,
};

const KEY: [u8; 32] = [0x42u8; 32];

async fn run_import(csv_path: &Path, db_path: &Path) -> ImportReport {
    let worker = CsvImportWorker::new(
        PathBuf::from(csv_path),
        PathBuf::from(db_path),
        Zeroizing::new(KEY),
        ROOT_GROUP_ID,
        ImportOptions::default(),
    );
    let (tx, _rx) = mpsc::unbounded_channel();
    worker.run(tx).await.unwrap()
}

#[tokio::test]
async fn import_twice_then_health_scan() {
    let tmp = tempfile::tempdir().unwrap();
    let csv_path = tmp.path().join("import.csv");
    let db_path = tmp.path().join("toolbox.sqlite3");
    std::fs::write(
        &csv_path,
        "title,username,password,url\n\
         GitHub,alice,SamePassword!123,https://github.com\n\
         GitLab,alice,SamePassword!123,https://gitlab.com\n",
    )
    .unwrap();

    // Lay down the schema the way the application would.
    let pool = open_pool(&db_path).await.unwrap();
    pool.close().await;

    let first = run_import(&csv_path, &db_path).await;
    assert_eq!(first.inserted, 2);
    assert_eq!(first.skipped_dup, 0);

    let second = run_import(&csv_path, &db_path).await;
    assert_eq!(second.inserted, 0);
    assert_eq!(second.skipped_dup, 2);

    let analyzer = HealthAnalyzer::new(db_path, Zeroizing::new(KEY), false, false);
    let (tx, _rx) = mpsc::unbounded_channel();
    let items = analyzer.run(tx).await.unwrap();

    assert_eq!(items.len(), 2);
    for item in &items {
        assert!(item.reused, "{} should be in the reuse pair", item.title);
        assert_eq!(item.reuse_count, 2);
        assert!(!item.weak);
        assert!(!item.corrupted);
    }
}
