//! Concurrent producers and consumers against one spool directory.

use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use spool_core::layout::{self, COMMITTED_EXTENSION};
use spool_core::{
    DirectoryStore, FailureStats, OverflowQueue, ProcessToken, RetryPolicy, StoreConfig,
    Transmission,
};
use tempfile::TempDir;

fn open(dir: &std::path::Path) -> DirectoryStore {
    DirectoryStore::open(
        StoreConfig::new()
            .with_directory(dir)
            .with_delete_retry(RetryPolicy::immediate(3)),
        ProcessToken::generate(),
        Arc::new(FailureStats::new(Duration::ZERO)),
    )
    .expect("store should open")
}

#[test]
fn test_two_dequeues_one_file_exactly_one_value() {
    for _ in 0..20 {
        let dir = TempDir::new().unwrap();
        let store = open(dir.path());
        assert!(store.enqueue(&Transmission::from_bytes(b"only".to_vec())));

        let barrier = Barrier::new(2);
        let results: Vec<Option<Transmission>> = thread::scope(|s| {
            let handles: Vec<_> = (0..2)
                .map(|_| {
                    s.spawn(|| {
                        barrier.wait();
                        store.dequeue()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(results.iter().filter(|r| r.is_some()).count(), 1);
        assert_eq!(store.size_bytes(), 0);
    }
}

#[test]
fn test_two_stores_sharing_directory_never_duplicate() {
    let dir = TempDir::new().unwrap();
    let producer = open(dir.path());
    for i in 0..50u32 {
        assert!(producer.enqueue(&Transmission::from_bytes(i.to_be_bytes().to_vec())));
    }

    let a = open(dir.path());
    let b = open(dir.path());
    let barrier = Barrier::new(2);

    let (from_a, from_b) = thread::scope(|s| {
        let drain = |store: &DirectoryStore| {
            barrier.wait();
            let mut seen = Vec::new();
            loop {
                match store.dequeue() {
                    Some(t) => seen.push(t.into_content()),
                    // Stale candidates come back as None until the listing is empty.
                    None => {
                        if layout::list_files(dir.path(), COMMITTED_EXTENSION)
                            .unwrap()
                            .is_empty()
                        {
                            break;
                        }
                    }
                }
            }
            seen
        };
        let (a, b) = (&a, &b);
        let ha = s.spawn(move || drain(a));
        let hb = s.spawn(move || drain(b));
        (ha.join().unwrap(), hb.join().unwrap())
    });

    let mut all: Vec<Vec<u8>> = from_a.into_iter().chain(from_b).collect();
    let total = all.len();
    all.sort();
    all.dedup();
    assert_eq!(all.len(), total, "a record was dequeued twice");
    assert_eq!(total, 50);
}

#[test]
fn test_concurrent_enqueues_keep_counter_exact() {
    let dir = TempDir::new().unwrap();
    let store = open(dir.path());

    thread::scope(|s| {
        for t in 0..8u8 {
            let store = &store;
            s.spawn(move || {
                for i in 0..10usize {
                    let len = 100 + i * 37 + t as usize;
                    assert!(store.enqueue(&Transmission::from_bytes(vec![t; len])));
                }
            });
        }
    });

    let files = layout::list_files(dir.path(), COMMITTED_EXTENSION).unwrap();
    let names: HashSet<_> = files.iter().map(|p| p.file_name().unwrap().to_owned()).collect();
    assert_eq!(files.len(), 80);
    assert_eq!(names.len(), 80);
    assert_eq!(
        store.size_bytes(),
        layout::total_size(dir.path(), COMMITTED_EXTENSION).unwrap()
    );
}
