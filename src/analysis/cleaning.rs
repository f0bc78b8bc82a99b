// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/gripwatch

//! Batch cleaning - timestamp de-duplication, sigma filtering, precision
//! coercion, and reconciliation of spurious state transitions

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::StatisticalSummary;
use crate::config::CleaningConfig;
use crate::sensors::Batch;

/// A reading demoted to integer precision, as persisted in a sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CleanedRecord {
    pub timestamp: i64,
    pub resistance: i64,
}

impl CleanedRecord {
    pub fn new(timestamp: i64, resistance: i64) -> Self {
        Self {
            timestamp,
            resistance,
        }
    }
}

/// Row of a state-labelled training recording
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabeledRow {
    pub timestamp: f64,
    pub resistance: f64,
    pub state: u8,
}

impl LabeledRow {
    pub fn new(timestamp: f64, resistance: f64, state: u8) -> Self {
        Self {
            timestamp,
            resistance,
            state,
        }
    }
}

/// Keep the first row seen for each distinct timestamp, preserving order
pub fn dedup_by_timestamp<T>(rows: Vec<T>, timestamp: impl Fn(&T) -> f64) -> Vec<T> {
    let mut seen = HashSet::with_capacity(rows.len());
    rows.into_iter()
        .filter(|row| seen.insert(timestamp_key(timestamp(row))))
        .collect()
}

// 0.0 and -0.0 compare equal and must share a key
fn timestamp_key(t: f64) -> u64 {
    if t == 0.0 {
        0.0f64.to_bits()
    } else {
        t.to_bits()
    }
}

/// Drop rows further than `sigmas` population standard deviations from
/// the mean. Returns the survivors and the statistics of the input.
pub fn filter_by_sigma<T>(
    rows: Vec<T>,
    value: impl Fn(&T) -> f64,
    sigmas: f64,
) -> (Vec<T>, StatisticalSummary) {
    let values: Vec<f64> = rows.iter().map(&value).collect();
    let stats = StatisticalSummary::of(&values);
    let kept = rows
        .into_iter()
        .filter(|row| stats.within(value(row), sigmas))
        .collect();
    (kept, stats)
}

/// Remove rows on either side of a state change that looks like noise.
///
/// Adjacent pairs are judged on the input order. A pair whose states
/// differ while the resistances are within `tolerance` of each other
/// loses the row further from the mean of `stats`; equal deviations keep
/// both. The last row is always kept.
pub fn reconcile_transitions(
    rows: &[LabeledRow],
    stats: &StatisticalSummary,
    tolerance: f64,
) -> Vec<LabeledRow> {
    let mut keep = vec![true; rows.len()];
    let last = rows.len().saturating_sub(1);

    for (i, pair) in rows.windows(2).enumerate() {
        let (current, next) = (pair[0], pair[1]);
        if current.state == next.state || (current.resistance - next.resistance).abs() > tolerance {
            continue;
        }

        let current_dev = stats.deviation(current.resistance);
        let next_dev = stats.deviation(next.resistance);
        if current_dev > next_dev {
            keep[i] = false;
        } else if next_dev > current_dev && i + 1 != last {
            keep[i + 1] = false;
        }
    }

    rows.iter()
        .zip(keep)
        .filter_map(|(row, kept)| kept.then_some(*row))
        .collect()
}

/// Cleans one channel batch into sink records
#[derive(Debug, Clone)]
pub struct BatchCleaner {
    sigma_limit: f64,
}

impl Default for BatchCleaner {
    fn default() -> Self {
        Self { sigma_limit: 3.0 }
    }
}

impl BatchCleaner {
    pub fn new(config: &CleaningConfig) -> Self {
        Self {
            sigma_limit: config.sigma_limit,
        }
    }

    /// Dedup, then sigma filter on the deduplicated data, then truncate
    /// toward zero. Pure; an empty batch yields no records.
    pub fn clean(&self, batch: Batch) -> Vec<CleanedRecord> {
        let received = batch.len();
        let unique = dedup_by_timestamp(batch.readings, |r| r.timestamp);
        let deduped = unique.len();
        let (kept, stats) = filter_by_sigma(unique, |r| r.resistance, self.sigma_limit);
        let filtered = kept.len();

        let records: Vec<CleanedRecord> = kept
            .into_iter()
            .filter(|r| r.resistance.is_finite() && r.timestamp.is_finite())
            .map(|r| CleanedRecord::new(r.timestamp.trunc() as i64, r.resistance.trunc() as i64))
            .collect();

        debug!(
            "Channel {}: {} received, {} unique, {} within {} sigma (mean {:.2}, std {:.2}), {} written",
            batch.channel,
            received,
            deduped,
            filtered,
            self.sigma_limit,
            stats.mean,
            stats.std_dev,
            records.len()
        );

        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::Reading;

    fn batch(points: &[(f64, f64)]) -> Batch {
        Batch::new(
            1,
            points.iter().map(|&(t, r)| Reading::new(1, t, r)).collect(),
        )
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let rows = vec![(10.0, 100.0), (10.0, 999.0), (11.0, 101.0), (10.0, 5.0), (12.0, 1.0)];
        let unique = dedup_by_timestamp(rows, |r| r.0);
        assert_eq!(unique, vec![(10.0, 100.0), (11.0, 101.0), (12.0, 1.0)]);
    }

    #[test]
    fn test_dedup_is_not_a_sort() {
        let rows = vec![3.0, 1.0, 2.0, 1.0];
        assert_eq!(dedup_by_timestamp(rows, |t| *t), vec![3.0, 1.0, 2.0]);
        assert_eq!(dedup_by_timestamp(vec![0.0, -0.0], |t| *t).len(), 1);
    }

    #[test]
    fn test_clean_duplicate_timestamps() {
        let cleaner = BatchCleaner::default();
        let out = cleaner.clean(batch(&[(10.0, 100.0), (10.0, 999.0), (11.0, 101.0)]));
        assert_eq!(out, vec![CleanedRecord::new(10, 100), CleanedRecord::new(11, 101)]);
    }

    #[test]
    fn test_outlier_rejected_from_large_batch() {
        let mut points: Vec<(f64, f64)> = (0..19)
            .map(|i| (i as f64, 100.0 + (i % 3) as f64))
            .collect();
        points.push((19.0, 1000.0));

        let out = BatchCleaner::default().clean(batch(&points));
        assert_eq!(out.len(), 19);
        assert!(out.iter().all(|r| r.resistance < 1000));
    }

    #[test]
    fn test_retained_records_within_three_sigma() {
        let points: Vec<(f64, f64)> = (0..50)
            .map(|i| (i as f64, 500.0 + ((i * 37) % 11) as f64 * if i % 7 == 0 { 20.0 } else { 1.0 }))
            .collect();
        let stats = StatisticalSummary::of(&points.iter().map(|p| p.1).collect::<Vec<_>>());
        let (kept, _) = filter_by_sigma(points, |p| p.1, 3.0);
        assert!(kept.iter().all(|p| (p.1 - stats.mean).abs() <= 3.0 * stats.std_dev));
    }

    #[test]
    fn test_single_record_always_kept() {
        let out = BatchCleaner::default().clean(batch(&[(5.9, -12.7)]));
        assert_eq!(out, vec![CleanedRecord::new(5, -12)]);
    }

    #[test]
    fn test_empty_batch() {
        assert!(BatchCleaner::default().clean(Batch::default()).is_empty());
    }

    #[test]
    fn test_truncation_not_rounding() {
        let out = BatchCleaner::default().clean(batch(&[(1.99, 100.9), (2.5, 100.5), (-3.7, 100.1)]));
        assert_eq!(
            out,
            vec![
                CleanedRecord::new(1, 100),
                CleanedRecord::new(2, 100),
                CleanedRecord::new(-3, 100)
            ]
        );
    }

    // Holds when the survivors already sit inside the tighter second-pass
    // bound; a single sigma pass is not idempotent in general
    #[test]
    fn test_cleaning_is_idempotent() {
        let cleaner = BatchCleaner::default();
        let first = cleaner.clean(batch(&[
            (1.0, 100.0),
            (2.0, 102.0),
            (2.0, 300.0),
            (3.0, 98.0),
            (4.0, 101.0),
        ]));

        let replay = Batch::new(
            1,
            first
                .iter()
                .map(|r| Reading::new(1, r.timestamp as f64, r.resistance as f64))
                .collect(),
        );
        assert_eq!(cleaner.clean(replay), first);
    }

    #[test]
    fn test_second_pass_can_tighten_after_outlier_removal() {
        let cleaner = BatchCleaner::default();
        let mut points: Vec<(f64, f64)> = (0..100).map(|i| (i as f64, 100.0)).collect();
        points.push((100.0, 110.0));
        points.push((101.0, 10000.0));

        let first = cleaner.clean(batch(&points));
        assert_eq!(first.len(), 101);
        assert!(first.contains(&CleanedRecord::new(100, 110)));

        let replay: Vec<(f64, f64)> = first
            .iter()
            .map(|r| (r.timestamp as f64, r.resistance as f64))
            .collect();
        let second = cleaner.clean(batch(&replay));
        assert_eq!(second.len(), 100);
        assert!(!second.contains(&CleanedRecord::new(100, 110)));
    }

    fn centred_on(mean: f64) -> StatisticalSummary {
        StatisticalSummary {
            count: 0,
            mean,
            std_dev: 0.0,
        }
    }

    #[test]
    fn test_reconcile_drops_outlying_side_of_noisy_transition() {
        let rows = vec![
            LabeledRow::new(0.0, 100.0, 0),
            LabeledRow::new(1.0, 101.0, 0),
            LabeledRow::new(2.0, 103.0, 1),
            LabeledRow::new(3.0, 50.0, 1),
        ];
        // Pair (101, 103) flips state within tolerance; 103 is further from 100
        let out = reconcile_transitions(&rows, &centred_on(100.0), 3.0);
        assert_eq!(out.iter().map(|r| r.timestamp).collect::<Vec<_>>(), vec![0.0, 1.0, 3.0]);
    }

    #[test]
    fn test_reconcile_keeps_genuine_transitions_and_ties() {
        let rows = vec![
            LabeledRow::new(0.0, 100.0, 0),
            LabeledRow::new(1.0, 59.0, 1),
            LabeledRow::new(2.0, 61.0, 0),
            LabeledRow::new(3.0, 80.0, 0),
        ];
        // 100 -> 59 is a real change; 59 and 61 are equidistant from 60
        let out = reconcile_transitions(&rows, &centred_on(60.0), 3.0);
        assert_eq!(out, rows);
    }

    #[test]
    fn test_reconcile_always_keeps_last_row() {
        let rows = vec![LabeledRow::new(0.0, 100.0, 0), LabeledRow::new(1.0, 102.0, 1)];
        let out = reconcile_transitions(&rows, &centred_on(100.0), 3.0);
        assert_eq!(out, vec![rows[0], rows[1]]);

        assert!(reconcile_transitions(&[], &centred_on(0.0), 3.0).is_empty());
        assert_eq!(reconcile_transitions(&rows[..1], &centred_on(0.0), 3.0).len(), 1);
    }
}
