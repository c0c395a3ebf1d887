//! Multi-horizon rolling aggregation.
//!
//! Windows are independent views over the same sample set keyed by
//! timestamp; a block inside the last hour is also inside the last day and
//! the 7-day baseline. Every non-baseline window carries percent-changes
//! against the baseline means.

use crate::config::{BASELINE_SECS, DAY_SECS, HOUR_SECS};
use crate::params::ParamSchedule;
use crate::regime::{Regime, RegimeCounts};
use crate::sample::BlockSample;
use serde::Serialize;

/// A named trailing window `[now - duration, now]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WindowSpec {
    pub name: &'static str,
    pub duration_secs: u64,
}

/// Short horizons compared against the baseline.
pub const DEFAULT_WINDOWS: [WindowSpec; 2] = [
    WindowSpec { name: "1h", duration_secs: HOUR_SECS },
    WindowSpec { name: "24h", duration_secs: DAY_SECS },
];

/// The 7-day reference window.
pub const BASELINE_WINDOW: WindowSpec = WindowSpec {
    name: "7d",
    duration_secs: BASELINE_SECS,
};

/// Aggregates for one window. The averages are `None` when the window held
/// no blocks: an empty hour is not an hour of zero-blob blocks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WindowSummary {
    pub block_count: u64,
    pub avg_blobs_per_block: Option<f64>,
    pub avg_gas_price: Option<f64>,
    pub avg_utilization_pct: Option<f64>,
    pub avg_saturation_pct: Option<f64>,
    pub regime_counts: RegimeCounts,
}

impl WindowSummary {
    fn empty() -> Self {
        Self {
            block_count: 0,
            avg_blobs_per_block: None,
            avg_gas_price: None,
            avg_utilization_pct: None,
            avg_saturation_pct: None,
            regime_counts: RegimeCounts::default(),
        }
    }

    pub fn dominant_regime(&self) -> Option<Regime> {
        self.regime_counts.dominant()
    }
}

/// Percent-change of a window against the baseline. `None` means the
/// comparison is undefined (empty window, empty baseline, or a zero
/// baseline mean) - never an infinity smuggled downstream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct WindowDelta {
    pub blobs_change_pct: Option<f64>,
    pub gas_change_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RollingWindow {
    pub spec: WindowSpec,
    pub summary: WindowSummary,
    pub vs_baseline: WindowDelta,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RollingReport {
    pub windows: Vec<RollingWindow>,
    pub baseline: WindowSummary,
}

/// `((current - baseline) / baseline) * 100`, undefined on a zero baseline.
pub fn percent_change(current: Option<f64>, baseline: Option<f64>) -> Option<f64> {
    match (current, baseline) {
        (Some(cur), Some(base)) if base != 0.0 => Some((cur - base) / base * 100.0),
        _ => None,
    }
}

/// Summarize the samples whose timestamps fall inside `[now - duration, now]`
/// (both edges inclusive).
///
/// Utilization and saturation are the mean of per-block percentages, not the
/// percentage of the mean blob count; the two differ whenever capacity
/// changed mid-window, and the per-block form is the one the regime
/// histogram is built from.
pub fn summarize_window(
    samples: &[BlockSample],
    schedule: &ParamSchedule,
    now: u64,
    duration_secs: u64,
) -> WindowSummary {
    let start = now.saturating_sub(duration_secs);

    let mut block_count = 0u64;
    let mut blob_sum = 0u64;
    let mut gas_sum = 0u128;
    let mut utilization_sum = 0.0f64;
    let mut saturation_sum = 0.0f64;
    let mut regime_counts = RegimeCounts::default();

    for sample in samples {
        if sample.timestamp < start || sample.timestamp > now {
            continue;
        }
        let params = schedule.params_at(sample.timestamp);
        let utilization = params.target_utilization(sample.blob_count);

        block_count += 1;
        blob_sum += sample.blob_count;
        gas_sum += sample.gas_price as u128;
        utilization_sum += utilization;
        saturation_sum += params.saturation_index(sample.blob_count);
        regime_counts.record(Regime::classify(utilization));
    }

    if block_count == 0 {
        return WindowSummary::empty();
    }

    let n = block_count as f64;
    WindowSummary {
        block_count,
        avg_blobs_per_block: Some(blob_sum as f64 / n),
        avg_gas_price: Some(gas_sum as f64 / n),
        avg_utilization_pct: Some(utilization_sum / n),
        avg_saturation_pct: Some(saturation_sum / n),
        regime_counts,
    }
}

/// Build the full report: every requested window summarized and compared
/// against the 7-day baseline.
pub fn rolling_report(
    samples: &[BlockSample],
    schedule: &ParamSchedule,
    now: u64,
    windows: &[WindowSpec],
) -> RollingReport {
    let baseline = summarize_window(samples, schedule, now, BASELINE_WINDOW.duration_secs);

    let windows = windows
        .iter()
        .map(|spec| {
            let summary = summarize_window(samples, schedule, now, spec.duration_secs);
            let vs_baseline = WindowDelta {
                blobs_change_pct: percent_change(
                    summary.avg_blobs_per_block,
                    baseline.avg_blobs_per_block,
                ),
                gas_change_pct: percent_change(summary.avg_gas_price, baseline.avg_gas_price),
            };
            RollingWindow {
                spec: *spec,
                summary,
                vs_baseline,
            }
        })
        .collect();

    RollingReport { windows, baseline }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{BLOB_SIZE_BYTES, ProtocolParams};

    const NOW: u64 = 2_000_000_000;

    fn schedule() -> ParamSchedule {
        ParamSchedule::fixed(ProtocolParams::new(10, 15, BLOB_SIZE_BYTES).unwrap())
    }

    fn sample(age_secs: u64, blob_count: u64, gas_price: u64) -> BlockSample {
        BlockSample {
            block_number: NOW - age_secs,
            timestamp: NOW - age_secs,
            tx_count: 1,
            blob_count,
            gas_price,
            excess_gas: None,
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn window_mean_is_exact_and_counts_sum() {
        let samples = vec![
            sample(10, 4, 100),
            sample(20, 8, 200),
            sample(30, 12, 300),
        ];
        let summary = summarize_window(&samples, &schedule(), NOW, HOUR_SECS);
        assert_eq!(summary.block_count, 3);
        assert!(close(summary.avg_blobs_per_block.unwrap(), 8.0));
        assert!(close(summary.avg_gas_price.unwrap(), 200.0));
        // 40%, 80%, 120% target utilization.
        assert!(close(summary.avg_utilization_pct.unwrap(), 80.0));
        assert_eq!(summary.regime_counts.total(), 3);
        assert_eq!(summary.regime_counts.get(crate::regime::Regime::Abundant), 1);
        assert_eq!(summary.regime_counts.get(crate::regime::Regime::Normal), 1);
        assert_eq!(summary.regime_counts.get(crate::regime::Regime::Pressured), 1);
    }

    #[test]
    fn mean_of_per_block_utilization_not_utilization_of_mean() {
        // Capacity flips from 6/9 to 10/15 mid-window, so the two orders of
        // operation disagree; the per-block mean is the specified one.
        let fork = 1_000_000u64;
        let schedule = ParamSchedule::new(vec![
            (0, ProtocolParams::new(6, 9, BLOB_SIZE_BYTES).unwrap()),
            (fork, ProtocolParams::new(10, 15, BLOB_SIZE_BYTES).unwrap()),
        ])
        .unwrap();
        let samples = vec![
            BlockSample {
                block_number: 1,
                timestamp: fork - 10,
                tx_count: 1,
                blob_count: 6,
                gas_price: 0,
                excess_gas: None,
            },
            BlockSample {
                block_number: 2,
                timestamp: fork + 10,
                tx_count: 1,
                blob_count: 10,
                gas_price: 0,
                excess_gas: None,
            },
        ];
        let summary = summarize_window(&samples, &schedule, fork + 20, BASELINE_SECS);
        // Both blocks sat exactly at their era's target.
        assert!(close(summary.avg_utilization_pct.unwrap(), 100.0));
    }

    #[test]
    fn membership_is_inclusive_on_both_edges() {
        let samples = vec![sample(HOUR_SECS, 5, 1), sample(0, 5, 1), sample(HOUR_SECS + 1, 5, 1)];
        let summary = summarize_window(&samples, &schedule(), NOW, HOUR_SECS);
        assert_eq!(summary.block_count, 2);
    }

    #[test]
    fn empty_window_reports_sentinels_not_zeros() {
        // Blocks exist in the last day but none in the last hour.
        let samples = vec![sample(2 * HOUR_SECS, 5, 100), sample(3 * HOUR_SECS, 7, 100)];
        let report = rolling_report(&samples, &schedule(), NOW, &DEFAULT_WINDOWS);

        let hour = &report.windows[0];
        assert_eq!(hour.spec.name, "1h");
        assert_eq!(hour.summary.block_count, 0);
        assert_eq!(hour.summary.avg_blobs_per_block, None);
        assert_eq!(hour.summary.avg_gas_price, None);
        assert_eq!(hour.summary.avg_utilization_pct, None);
        assert_eq!(hour.summary.avg_saturation_pct, None);
        assert_eq!(hour.vs_baseline.blobs_change_pct, None);

        let day = &report.windows[1];
        assert_eq!(day.summary.block_count, 2);
        assert!(close(day.summary.avg_blobs_per_block.unwrap(), 6.0));
    }

    #[test]
    fn blocks_belong_to_every_enclosing_window() {
        let samples = vec![sample(60, 5, 100)];
        let report = rolling_report(&samples, &schedule(), NOW, &DEFAULT_WINDOWS);
        assert_eq!(report.windows[0].summary.block_count, 1);
        assert_eq!(report.windows[1].summary.block_count, 1);
        assert_eq!(report.baseline.block_count, 1);
    }

    #[test]
    fn percent_change_vs_baseline() {
        // Recent hour runs hot: 12 blobs/block vs a 6 blobs/block baseline.
        let mut samples = Vec::new();
        for i in 0..10 {
            samples.push(sample(60 + i, 12, 2_000));
        }
        for i in 0..100 {
            samples.push(sample(2 * DAY_SECS + i, 6, 1_000));
        }
        let report = rolling_report(&samples, &schedule(), NOW, &DEFAULT_WINDOWS);
        let hour = &report.windows[0];
        // Baseline covers all 110 blocks: (10*12 + 100*6)/110 = 6.5454...
        let base = report.baseline.avg_blobs_per_block.unwrap();
        let expected = (12.0 - base) / base * 100.0;
        assert!(close(hour.vs_baseline.blobs_change_pct.unwrap(), expected));
        assert!(hour.vs_baseline.gas_change_pct.unwrap() > 0.0);
    }

    #[test]
    fn zero_baseline_yields_undefined_comparison() {
        assert_eq!(percent_change(Some(5.0), Some(0.0)), None);
        assert_eq!(percent_change(Some(5.0), None), None);
        assert_eq!(percent_change(None, Some(3.0)), None);
        let change = percent_change(Some(5.0), Some(4.0)).unwrap();
        assert!((change - 25.0).abs() < 1e-9);
    }

    #[test]
    fn zero_blob_baseline_never_produces_infinity() {
        // Every baseline block carried zero blobs: the blob mean is 0.0 and
        // the comparison must come back undefined rather than inf.
        let mut samples = vec![sample(30, 8, 500)];
        for i in 0..50 {
            samples.push(sample(2 * DAY_SECS + i, 0, 500));
        }
        let report = rolling_report(&samples, &schedule(), NOW, &DEFAULT_WINDOWS);
        let hour = &report.windows[0];
        assert_eq!(hour.vs_baseline.blobs_change_pct, None);
        // Gas baseline is nonzero, so that comparison is still defined.
        assert!(hour.vs_baseline.gas_change_pct.is_some());
    }
}
