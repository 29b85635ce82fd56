//! Integration tests.
#![allow(missing_docs, reason = "test crate")]

mod common;

use std::sync::{Arc, Barrier};
use std::thread;

use common::RecordingHandler;
use confirmkit_core::store::StoreLock;
use confirmkit_core::{ConfirmationStore, FileStore, Outcome, StorePaths};

fn open(root: &std::path::Path) -> Arc<FileStore> {
    Arc::new(FileStore::open(StorePaths::new(root)).expect("open store"))
}

#[test]
fn test_file_store_flow_end_to_end() {
    let dir = common::temp_dir();
    let handler = RecordingHandler::new();

    let path = {
        let engine = common::engine_with_store(open(dir.path()), &handler);
        engine
            .create_process_on_group("user", "activate", "kim", Some(u64::MAX))
            .expect("create")
    };

    let store = open(dir.path());
    let record = store
        .find_by_key(path.key())
        .expect("find")
        .expect("present");
    assert_eq!(record.argument, "kim");
    assert_eq!(record.expires, Some(u64::MAX));

    let engine = common::engine_with_store(store, &handler);
    let first = engine.confirm_path(&path.to_string()).expect("confirm");
    assert_eq!(first.outcome, Outcome::Success);

    let engine = common::engine_with_store(open(dir.path()), &handler);
    let second = engine.confirm_path(&path.to_string()).expect("confirm");
    assert_eq!(second.outcome, Outcome::Again);

    let records = open(dir.path()).records().expect("records");
    assert_eq!(records.len(), 1);
    assert!(records[0].token.is_none());
    assert!(records[0].confirmed.is_some());
}

#[test]
fn test_file_store_holds_lock_only_during_operations() {
    let dir = common::temp_dir();
    let store = open(dir.path());
    assert!(store.records().expect("records").is_empty());

    let lock = StoreLock::open(&store.paths().lock_path()).expect("open lock");
    let guard = lock.try_lock().expect("try lock");
    assert!(guard.is_some());
}

#[test]
fn test_concurrent_confirmations_across_handles_succeed_once() {
    const THREADS: usize = 8;

    let dir = common::temp_dir();
    let handler = RecordingHandler::new();
    let path = common::engine_with_store(open(dir.path()), &handler)
        .create_process_on_group("user", "activate", "max", None)
        .expect("create");
    let rendered = path.to_string();
    let barrier = Arc::new(Barrier::new(THREADS));

    let workers: Vec<_> = (0..THREADS)
        .map(|_| {
            let root = dir.path().to_path_buf();
            let handler = handler.clone();
            let barrier = Arc::clone(&barrier);
            let rendered = rendered.clone();
            thread::spawn(move || {
                let engine = common::engine_with_store(open(&root), &handler);
                barrier.wait();
                engine.confirm_path(&rendered).expect("confirm").outcome
            })
        })
        .collect();

    let outcomes: Vec<Outcome> = workers
        .into_iter()
        .map(|worker| worker.join().expect("join"))
        .collect();
    assert_eq!(
        outcomes.iter().filter(|outcome| outcome.is_success()).count(),
        1
    );
    assert!(outcomes
        .iter()
        .all(|outcome| matches!(outcome, Outcome::Success | Outcome::Again)));

    let records = open(dir.path()).records().expect("records");
    assert_eq!(records.len(), 1);
    assert!(records[0].is_confirmed());
}
