//! Integration tests for concurrent annotation access
//!
//! A decoder thread writes while several reader threads query. Every reader
//! must observe a complete decoder run, never a partially written one.

mod common;

use common::builders::periodic_annotations;
use logicnav::annotation::DecoderFeed;
use logicnav::{Annotation, AnnotationStore, AnnotationValue};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

const RUN_SIZE: usize = 200;

/// A run where every annotation carries the run number as its payload
fn tagged_run(run: u64) -> Vec<Annotation<AnnotationValue>> {
    periodic_annotations(0, RUN_SIZE, 100, 50)
        .into_iter()
        .map(|a| Annotation::new(0, AnnotationValue::Data(run), a.start(), a.end()))
        .collect()
}

#[test]
fn test_readers_see_complete_runs() {
    let store: Arc<AnnotationStore<AnnotationValue>> = Arc::new(AnnotationStore::new(4));
    store.replace_all(tagged_run(0)).unwrap();
    let done = Arc::new(AtomicBool::new(false));

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let store = store.clone();
            let done = done.clone();
            thread::spawn(move || {
                let mut queries = 0usize;
                while !done.load(Ordering::Acquire) {
                    let range = store.annotations_in_range(0, 0, 1_000_000).unwrap();
                    let snapshot = range.to_vec();
                    assert_eq!(snapshot.len(), RUN_SIZE);
                    let first = snapshot[0].payload().clone();
                    assert!(snapshot.iter().all(|a| *a.payload() == first));
                    assert!(snapshot.windows(2).all(|w| w[0] <= w[1]));
                    queries += 1;
                }
                queries
            })
        })
        .collect();

    let writer = {
        let store = store.clone();
        thread::spawn(move || {
            for run in 1..=100u64 {
                store.replace_all(tagged_run(run)).unwrap();
            }
        })
    };

    writer.join().unwrap();
    done.store(true, Ordering::Release);
    for reader in readers {
        reader.join().unwrap();
    }

    let last = store.annotations_in_range(0, 0, 100).unwrap().to_vec();
    assert_eq!(last[0].payload(), &AnnotationValue::Data(100));
}

#[test]
fn test_range_snapshot_outlives_writes() {
    let store: Arc<AnnotationStore<AnnotationValue>> = Arc::new(AnnotationStore::new(1));
    store.replace_all(tagged_run(1)).unwrap();

    let range = store.annotations_in_range(0, 0, 1_000).unwrap();
    let before: Vec<_> = range.iter().cloned().collect();

    store.replace_all(tagged_run(2)).unwrap();
    store.clear_all();

    let after: Vec<_> = range.iter().cloned().collect();
    assert_eq!(before, after);
    assert!(store.is_empty());
}

#[test]
fn test_feed_from_worker_threads() {
    let store: Arc<AnnotationStore<AnnotationValue>> = Arc::new(AnnotationStore::new(2));
    let mut feed = DecoderFeed::new(store.clone());
    let sender = feed.sender();

    let worker = thread::spawn(move || {
        for run in 0..5u64 {
            sender.start();
            for i in 0..50i64 {
                sender.annotate(1, AnnotationValue::Data(run), i * 10, i * 10 + 5);
            }
            sender.finish();
        }
    });

    let deadline = Instant::now() + common::test_timeout();
    let mut committed = 0;
    while committed < 5 && Instant::now() < deadline {
        committed += feed.pump().unwrap();
        // partial runs are never visible
        let len = store.len(1).unwrap();
        assert!(len == 0 || len == 50);
        thread::yield_now();
    }
    worker.join().unwrap();
    committed += feed.pump().unwrap();

    assert_eq!(committed, 5);
    assert!(!feed.is_decoding());
    let last = store.nearest_annotation(1, 0).unwrap().unwrap();
    assert_eq!(last.payload(), &AnnotationValue::Data(4));
}
