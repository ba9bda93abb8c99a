//! Behaviour of the aggregator as seen by callers: totals, aggregate
//! consistency, key classification, pinning and concurrent recording.

use std::sync::{Arc, Barrier};
use std::thread;

use latency_observatory::metrics::{
    classify_secondary_key, Aggregator, EditorContext, LatencyAggregator, Recorded,
};
use proptest::prelude::*;

/// Number of threads racing to create the same key.
const RACERS: usize = 32;

/// Samples each racer records.
const SAMPLES_PER_RACER: usize = 250;

fn ctx(file_type: &str) -> EditorContext {
    EditorContext::new(Some(file_type))
}

#[test]
fn end_to_end_scenario() {
    let agg = LatencyAggregator::new();
    agg.record(&ctx("kt"), classify_secondary_key("x"), 5.0).unwrap();
    agg.record(&ctx("kt"), classify_secondary_key("y"), 15.0).unwrap();
    agg.record(&ctx("kt"), classify_secondary_key("\n"), 2.0).unwrap();

    let snap = agg.snapshot_all();
    let kt = &snap.stores["kt"];

    let letter = &kt.by_secondary_key["Letter"];
    assert_eq!(
        (letter.count, letter.total, letter.max, letter.average),
        (2, 20.0, Some(15.0), Some(10.0))
    );

    let enter = &kt.by_secondary_key["Enter"];
    assert_eq!(
        (enter.count, enter.total, enter.max, enter.average),
        (1, 2.0, Some(2.0), Some(2.0))
    );

    assert_eq!(kt.aggregate.count, 3);
    assert_eq!(kt.aggregate.total, 22.0);
    assert_eq!(kt.aggregate.max, Some(15.0));
    assert_eq!(kt.aggregate.average, Some(22.0 / 3.0));
    assert_eq!(snap.total_samples, 3);
}

#[test]
fn no_key_and_no_pin_leaves_stores_untouched() {
    let agg = LatencyAggregator::new();
    agg.record(&ctx("rs"), "Letter".into(), 1.0).unwrap();

    let out = agg
        .record(&EditorContext::default(), "Letter".into(), 1.0)
        .unwrap();

    assert_eq!(out, Recorded::Skipped);
    assert_eq!(agg.len(), 1);
    assert_eq!(agg.snapshot(&"rs".to_owned()).unwrap().aggregate.count, 1);
}

#[test]
fn pinned_key_takes_precedence() {
    let agg = LatencyAggregator::new();
    agg.set_pinned_primary_key(Some("K".into()));

    let out = agg.record(&ctx("K2"), "Letter".into(), 4.0).unwrap();

    assert_eq!(out, Recorded::Stored("K".to_owned()));
    assert!(agg.snapshot(&"K2".to_owned()).is_none());
}

#[test]
fn option_contexts_work_with_any_key_type() {
    let agg: Aggregator<u32, char> = Aggregator::new();
    agg.record(&Some(7u32), 'a', 1.0).unwrap();
    agg.record(&None::<u32>, 'a', 1.0).unwrap();

    assert_eq!(agg.len(), 1);
    assert_eq!(agg.snapshot(&7).unwrap().by_secondary_key[&'a'].count, 1);
}

#[test]
fn non_finite_samples_are_rejected_and_recording_continues() {
    let agg = LatencyAggregator::new();
    agg.record(&ctx("kt"), "Letter".into(), 1.0).unwrap();

    assert!(agg.record(&ctx("kt"), "Letter".into(), f64::INFINITY).is_err());
    assert!(agg.record(&ctx("rs"), "Letter".into(), f64::NAN).is_err());
    agg.record(&ctx("kt"), "Letter".into(), 2.0).unwrap();

    let snap = agg.snapshot_all();
    assert_eq!(snap.stores.len(), 1);
    assert_eq!(snap.stores["kt"].aggregate.total, 3.0);
    assert_eq!(snap.rejected_samples, 2);
}

#[test]
fn concurrent_first_samples_create_one_store() {
    let agg = Arc::new(LatencyAggregator::new());
    let barrier = Arc::new(Barrier::new(RACERS));

    let handles: Vec<_> = (0..RACERS)
        .map(|_| {
            let agg = agg.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                for _ in 0..SAMPLES_PER_RACER {
                    agg.record(&ctx("fresh"), "Letter".into(), 1.0).unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let expected = (RACERS * SAMPLES_PER_RACER) as u64;
    let snap = agg.snapshot_all();
    assert_eq!(snap.stores.len(), 1);

    let store = &snap.stores["fresh"];
    assert_eq!(store.by_secondary_key.len(), 1);
    assert_eq!(store.by_secondary_key["Letter"].count, expected);
    assert_eq!(store.aggregate.count, expected);
    assert_eq!(store.aggregate.total, expected as f64);
}

#[test]
fn concurrent_pinning_and_recording_lose_nothing() {
    let agg = Arc::new(LatencyAggregator::new());

    thread::scope(|s| {
        for i in 0..4 {
            let agg = &agg;
            s.spawn(move || {
                for j in 0..500 {
                    if i == 0 && j % 10 == 0 {
                        agg.set_pinned_primary_key(Some("pinned".into()));
                        agg.set_pinned_primary_key(None);
                    }
                    agg.record(&ctx("kt"), "Letter".into(), 1.0).unwrap();
                }
            });
        }
    });

    let snap = agg.snapshot_all();
    let counted: u64 = snap.stores.values().map(|s| s.aggregate.count).sum();
    assert_eq!(counted, 2_000);
    assert_eq!(snap.total_samples, 2_000);
}

#[test]
fn snapshot_is_a_copy() {
    let agg = LatencyAggregator::new();
    agg.record(&ctx("kt"), "Letter".into(), 1.0).unwrap();
    let before = agg.snapshot_all();

    agg.record(&ctx("kt"), "Letter".into(), 9.0).unwrap();
    agg.reset();

    assert_eq!(before.stores["kt"].aggregate.count, 1);
    assert_eq!(before.stores["kt"].aggregate.max, Some(1.0));
    assert!(agg.is_empty());
}

proptest! {
    #[test]
    fn count_total_max_match_samples(values in prop::collection::vec(-1.0e6f64..1.0e6, 1..100)) {
        let agg = LatencyAggregator::new();
        for v in &values {
            agg.record(&ctx("kt"), "Letter".into(), *v).unwrap();
        }

        let snap = agg.snapshot(&"kt".to_owned()).unwrap();
        let record = &snap.by_secondary_key["Letter"];
        let expected_total: f64 = values.iter().sum();
        let expected_max = values.iter().copied().fold(f64::MIN, f64::max);

        prop_assert_eq!(record.count, values.len() as u64);
        prop_assert!((record.total - expected_total).abs() <= 1e-6 * expected_total.abs().max(1.0));
        prop_assert_eq!(record.max, Some(expected_max));
    }

    #[test]
    fn aggregate_equals_sum_of_breakdown(
        samples in prop::collection::vec(("[a-e]", 0u32..10_000), 1..200)
    ) {
        let agg = LatencyAggregator::new();
        for (key, v) in &samples {
            agg.record(&ctx("kt"), key.clone(), f64::from(*v)).unwrap();
        }

        let snap = agg.snapshot(&"kt".to_owned()).unwrap();
        let records = snap.by_secondary_key.values();
        let count: u64 = records.clone().map(|r| r.count).sum();
        let total: f64 = records.clone().map(|r| r.total).sum();
        let max = records.filter_map(|r| r.max).fold(f64::MIN, f64::max);

        prop_assert_eq!(snap.aggregate.count, count);
        prop_assert_eq!(snap.aggregate.total, total);
        prop_assert_eq!(snap.aggregate.max, Some(max));
    }

    #[test]
    fn secondary_classification_is_pure(raw in ".{0,3}") {
        let once = classify_secondary_key(&raw);
        prop_assert_eq!(&once, &classify_secondary_key(&raw));
        if raw.chars().count() != 1 {
            prop_assert_eq!(once, raw);
        }
    }
}
