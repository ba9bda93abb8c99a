use std::fmt::{Display, Write};
use std::hash::Hash;

use super::aggregator::AggregatorSnapshot;
use super::record::RecordSnapshot;

/// Plain-text latency report.
///
/// Primary keys are listed in key order; under each one the secondary keys
/// are listed by descending sample count, ties broken by name.
pub fn render_text<P, S>(snapshot: &AggregatorSnapshot<P, S>) -> String
where
    P: Eq + Hash + Ord + Display,
    S: Eq + Hash + Display,
{
    let mut out = String::new();

    // Writing into a String cannot fail.
    let _ = writeln!(
        out,
        "Latency report: {} samples, {} skipped, {} rejected",
        snapshot.total_samples, snapshot.skipped_samples, snapshot.rejected_samples,
    );
    if let Some(pinned) = &snapshot.pinned_primary_key {
        let _ = writeln!(out, "Pinned primary key: {pinned}");
    }
    if snapshot.stores.is_empty() {
        let _ = writeln!(out, "No samples recorded.");
        return out;
    }

    let mut primaries: Vec<_> = snapshot.stores.iter().collect();
    primaries.sort_by(|a, b| a.0.cmp(b.0));

    for (primary, store) in primaries {
        let _ = writeln!(out);
        let _ = writeln!(out, "{primary}: {}", summary(&store.aggregate));

        let mut rows: Vec<(String, &RecordSnapshot)> = store
            .by_secondary_key
            .iter()
            .map(|(k, r)| (k.to_string(), r))
            .collect();
        rows.sort_by(|a, b| b.1.count.cmp(&a.1.count).then_with(|| a.0.cmp(&b.0)));

        for (secondary, record) in rows {
            let _ = writeln!(out, "    {secondary:<12} {}", summary(record));
        }
    }

    out
}

fn summary(record: &RecordSnapshot) -> String {
    let ms = |v: Option<f64>| v.map_or_else(|| "-".to_owned(), |v| format!("{v:.2} ms"));
    format!(
        "{:>6} samples  avg {:>10}  max {:>10}  p95 {:.2} ms",
        record.count,
        ms(record.average),
        ms(record.max),
        record.percentiles.p95,
    )
}
