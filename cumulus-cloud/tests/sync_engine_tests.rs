//! Reconciliation tests for the sync engine against in-memory doubles.
//!
//! Covers the properties that make this an incremental sync tool: a second
//! run with no changes transfers nothing, a one-byte change causes exactly
//! one index update and one upload, and restore only downloads what is
//! missing or changed.

mod support;

use cumulus_cloud::digest::file_md5;
use cumulus_cloud::store::CreateOutcome;
use cumulus_cloud::{EnvelopeKey, SyncEngine};
use pretty_assertions::assert_eq;
use std::path::Path;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use support::{MemoryIndex, MemoryStore};

fn write_tree(root: &Path, files: &[(&str, &[u8])]) {
    for (rel, contents) in files {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, contents).unwrap();
    }
}

fn engine(
    store: &Arc<MemoryStore>,
    index: &Arc<MemoryIndex>,
    envelope_key: Option<EnvelopeKey>,
) -> SyncEngine<Arc<MemoryStore>, Arc<MemoryIndex>> {
    SyncEngine::new(store.clone(), index.clone(), "tester".to_string(), envelope_key)
}

#[tokio::test]
async fn first_push_uploads_everything_and_creates_records() {
    let dir = tempfile::tempdir().unwrap();
    write_tree(
        dir.path(),
        &[
            ("top.txt", b"top-level".as_slice()),
            ("sub/one.txt", b"nested".as_slice()),
            ("sub/deep/two.bin", [0u8; 100].as_slice()),
        ],
    );
    let store = Arc::new(MemoryStore::default());
    let index = Arc::new(MemoryIndex::default());

    let report = engine(&store, &index, None).push(dir.path()).await.unwrap();

    assert_eq!((report.uploaded, report.unchanged, report.failed), (3, 0, 0));
    assert_eq!(store.puts.load(Ordering::SeqCst), 3);
    assert_eq!(index.puts.load(Ordering::SeqCst), 3);
    assert_eq!(store.object_bytes("sub/one.txt").unwrap(), b"nested");

    let records = index.records.lock().unwrap();
    let record = records
        .get(&("tester".to_string(), "sub/deep/two.bin".to_string()))
        .unwrap();
    assert_eq!(record.file_name, "two.bin");
    assert_eq!(record.md5_hash.len(), 32);
    assert_eq!(
        Some(record.md5_hash.clone()),
        store.stored_md5("sub/deep/two.bin")
    );
}

#[tokio::test]
async fn second_push_without_changes_transfers_nothing() {
    let dir = tempfile::tempdir().unwrap();
    write_tree(
        dir.path(),
        &[("a.txt", b"aaa".as_slice()), ("b/b.txt", b"bbb".as_slice())],
    );
    let store = Arc::new(MemoryStore::default());
    let index = Arc::new(MemoryIndex::default());
    let engine = engine(&store, &index, None);

    engine.push(dir.path()).await.unwrap();
    let second = engine.push(dir.path()).await.unwrap();

    assert_eq!((second.uploaded, second.unchanged, second.failed), (0, 2, 0));
    assert_eq!(store.puts.load(Ordering::SeqCst), 2);
    assert_eq!(index.updates.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn changed_byte_causes_exactly_one_update_and_one_upload() {
    let dir = tempfile::tempdir().unwrap();
    write_tree(
        dir.path(),
        &[("a.txt", b"before".as_slice()), ("b.txt", b"stable".as_slice())],
    );
    let store = Arc::new(MemoryStore::default());
    let index = Arc::new(MemoryIndex::default());
    let engine = engine(&store, &index, None);

    engine.push(dir.path()).await.unwrap();
    std::fs::write(dir.path().join("a.txt"), b"Before").unwrap();
    let second = engine.push(dir.path()).await.unwrap();

    assert_eq!((second.uploaded, second.unchanged, second.failed), (1, 1, 0));
    assert_eq!(index.updates.load(Ordering::SeqCst), 1);
    assert_eq!(index.puts.load(Ordering::SeqCst), 2, "no new records on update");
    assert_eq!(store.puts.load(Ordering::SeqCst), 3);
    assert_eq!(store.object_bytes("a.txt").unwrap(), b"Before");
}

#[tokio::test]
async fn per_path_failures_do_not_abort_the_run() {
    let dir = tempfile::tempdir().unwrap();
    write_tree(
        dir.path(),
        &[("bad.txt", b"bad".as_slice()), ("good.txt", b"good".as_slice())],
    );
    let store = Arc::new(MemoryStore::default());
    let index = Arc::new(MemoryIndex::default());
    *index.fail_get_for.lock().unwrap() = Some("bad.txt".to_string());

    let report = engine(&store, &index, None).push(dir.path()).await.unwrap();

    assert_eq!(report.failed, 1);
    assert_eq!(report.uploaded, 1);
    assert_eq!(store.object_bytes("good.txt").unwrap(), b"good");
}

#[tokio::test]
async fn pull_on_empty_store_downloads_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(MemoryStore::default());
    let index = Arc::new(MemoryIndex::default());

    let report = engine(&store, &index, None).pull(dir.path()).await.unwrap();

    assert_eq!((report.downloaded, report.unchanged, report.failed), (0, 0, 0));
}

#[tokio::test]
async fn pull_skips_matching_and_fetches_differing_or_missing() {
    let dir = tempfile::tempdir().unwrap();
    write_tree(
        dir.path(),
        &[("same.txt", b"same".as_slice()), ("stale.txt", b"old".as_slice())],
    );

    let same_md5 = file_md5(&dir.path().join("same.txt")).await.unwrap();
    let store = Arc::new(MemoryStore::default());
    store.insert_object("same.txt", b"same", &same_md5);
    store.insert_object("stale.txt", b"new contents", "6b21c4a111ac178feacf9ec30e4b2874");
    store.insert_object("nested/missing.txt", b"fresh", "970d1bf8465a64b9ca14f097c345e9b8");
    let index = Arc::new(MemoryIndex::default());

    let report = engine(&store, &index, None).pull(dir.path()).await.unwrap();

    assert_eq!((report.downloaded, report.unchanged, report.failed), (2, 1, 0));
    assert_eq!(
        std::fs::read(dir.path().join("same.txt")).unwrap(),
        b"same",
        "matching file must not be rewritten"
    );
    assert_eq!(
        std::fs::read(dir.path().join("stale.txt")).unwrap(),
        b"new contents"
    );
    assert_eq!(
        std::fs::read(dir.path().join("nested/missing.txt")).unwrap(),
        b"fresh",
        "parent directories are created on demand"
    );
}

#[tokio::test]
async fn pull_refuses_keys_that_escape_the_destination() {
    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("restore");
    std::fs::create_dir(&dest).unwrap();

    let store = Arc::new(MemoryStore::default());
    store.insert_object("../evil.txt", b"evil", "0cc175b9c0f1b6a831c399e269772661");
    let index = Arc::new(MemoryIndex::default());

    let report = engine(&store, &index, None).pull(&dest).await.unwrap();

    assert_eq!(report.failed, 1);
    assert!(!dir.path().join("evil.txt").exists());
}

#[tokio::test]
async fn encrypted_push_stores_containers_but_plaintext_digests() {
    let dir = tempfile::tempdir().unwrap();
    write_tree(dir.path(), &[("secret.txt", b"ten bytes!".as_slice())]);
    let store = Arc::new(MemoryStore::default());
    let index = Arc::new(MemoryIndex::default());
    let key = EnvelopeKey::derive("kitty and the kat");

    engine(&store, &index, Some(key)).push(dir.path()).await.unwrap();

    let stored = store.object_bytes("secret.txt").unwrap();
    // 10 plaintext bytes pad to one block: 8 + 16 + 16.
    assert_eq!(stored.len(), 40);
    assert_eq!(u64::from_le_bytes(stored[..8].try_into().unwrap()), 10);
    assert_ne!(&stored[24..], b"ten bytes!".as_slice());

    let plaintext_md5 = file_md5(&dir.path().join("secret.txt")).await.unwrap();
    assert_eq!(store.stored_md5("secret.txt"), Some(plaintext_md5));
}

#[tokio::test]
async fn encrypted_roundtrip_restores_the_exact_plaintext() {
    let src = tempfile::tempdir().unwrap();
    write_tree(
        src.path(),
        &[
            ("docs/report.txt", b"confidential   ".as_slice()),
            ("raw.bin", [7u8; 4096].as_slice()),
        ],
    );
    let store = Arc::new(MemoryStore::default());
    let index = Arc::new(MemoryIndex::default());

    let push_engine = engine(&store, &index, Some(EnvelopeKey::derive("swordfish")));
    push_engine.push(src.path()).await.unwrap();

    let dest = tempfile::tempdir().unwrap();
    let pull_engine = engine(&store, &index, Some(EnvelopeKey::derive("swordfish")));
    let report = pull_engine.pull(dest.path()).await.unwrap();

    assert_eq!(report.downloaded, 2);
    assert_eq!(
        std::fs::read(dest.path().join("docs/report.txt")).unwrap(),
        b"confidential   "
    );
    assert_eq!(std::fs::read(dest.path().join("raw.bin")).unwrap(), vec![7u8; 4096]);

    // A second pull is a no-op: the stored digest matches the plaintext.
    let second = pull_engine.pull(dest.path()).await.unwrap();
    assert_eq!((second.downloaded, second.unchanged), (0, 2));
}

#[tokio::test]
async fn initialise_reports_existing_containers_as_outcomes() {
    let store = Arc::new(MemoryStore::default());
    let index = Arc::new(MemoryIndex::default());
    let engine = engine(&store, &index, None);

    assert_eq!(engine.initialise().await.unwrap(), CreateOutcome::Created);

    *store.create_outcome.lock().unwrap() = CreateOutcome::AlreadyOwned;
    assert_eq!(engine.initialise().await.unwrap(), CreateOutcome::AlreadyOwned);

    *store.create_outcome.lock().unwrap() = CreateOutcome::AlreadyExists;
    assert_eq!(engine.initialise().await.unwrap(), CreateOutcome::AlreadyExists);
}
