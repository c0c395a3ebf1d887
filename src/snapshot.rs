//! Immutable per-refresh view of the market.
//!
//! The engine holds no state between refreshes: every cycle the caller hands
//! in the raw history and gets back one `MarketSnapshot` value, replacing
//! the previous one wholesale. A cycle that fails validation leaves the old
//! snapshot on screen.

use crate::chains::{ChainProfile, chain_profiles};
use crate::config::{
    CHAIN_PROFILE_SECS, CHART_BUCKETS, CHART_WINDOW_BLOCKS, LONG_SERIES_THRESHOLD,
    RECENT_BLOCKS_SHOWN,
};
use crate::error::MarketError;
use crate::heatmap::{HeatmapGrid, weekly_heatmap};
use crate::params::{ParamSchedule, ProtocolParams};
use crate::regime::Regime;
use crate::rolling::{DEFAULT_WINDOWS, RollingReport, rolling_report};
use crate::sample::{BlockSample, TxRecord};
use crate::series::{SeriesPoint, bucket_average, stride_sample};
use serde::Serialize;

/// Totals over the whole in-memory history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OverallStats {
    pub total_blocks: u64,
    pub total_blobs: u64,
    pub total_transactions: u64,
    pub avg_blobs_per_block: f64,
    pub latest_block: Option<u64>,
    pub earliest_block: Option<u64>,
    pub latest_gas_price: u64,
}

/// Parallel label-aligned series for the activity chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSeries {
    pub blobs: Vec<SeriesPoint>,
    pub gas_gwei: Vec<SeriesPoint>,
}

/// Derived metrics for the newest observed block.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatestBlockView {
    pub block_number: u64,
    pub timestamp: u64,
    pub blob_count: u64,
    pub blob_bytes: u64,
    pub gas_price: u64,
    pub excess_gas: Option<u64>,
    pub utilization_pct: f64,
    pub saturation_pct: f64,
    pub regime: Regime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketSnapshot {
    pub taken_at: u64,
    /// Capacity in force at `taken_at`
    pub params: ProtocolParams,
    pub stats: OverallStats,
    pub latest: Option<LatestBlockView>,
    /// Newest blocks first, bounded for list display
    pub recent_blocks: Vec<LatestBlockView>,
    /// Recent window, bucket-averaged to the chart width
    pub chart: ChartSeries,
    /// Whole history, stride-sampled
    pub long_chart: ChartSeries,
    pub rolling: RollingReport,
    pub heatmap: HeatmapGrid,
    pub chains: Vec<ChainProfile>,
}

/// Compute one snapshot from the raw history.
///
/// `samples` must be in ascending block order (the collector's natural
/// order). Fails fast on the first malformed sample; the caller is expected
/// to keep its previous snapshot in that case.
pub fn compute_snapshot(
    samples: &[BlockSample],
    txs: &[TxRecord],
    schedule: &ParamSchedule,
    now: u64,
) -> Result<MarketSnapshot, MarketError> {
    for sample in samples {
        sample.validate()?;
    }

    let params = schedule.params_at(now);

    let recent_start = samples.len().saturating_sub(CHART_WINDOW_BLOCKS);
    let chart = reduced_chart(&samples[recent_start..]);
    let long_chart = long_chart(samples);

    Ok(MarketSnapshot {
        taken_at: now,
        params,
        stats: overall_stats(samples),
        latest: samples.last().map(|s| latest_view(s, schedule)),
        recent_blocks: samples
            .iter()
            .rev()
            .take(RECENT_BLOCKS_SHOWN)
            .map(|s| latest_view(s, schedule))
            .collect(),
        chart,
        long_chart,
        rolling: rolling_report(samples, schedule, now, &DEFAULT_WINDOWS),
        heatmap: weekly_heatmap(samples, schedule, now),
        chains: chain_profiles(txs, now, CHAIN_PROFILE_SECS),
    })
}

fn overall_stats(samples: &[BlockSample]) -> OverallStats {
    let total_blocks = samples.len() as u64;
    let total_blobs: u64 = samples.iter().map(|s| s.blob_count).sum();
    let total_transactions: u64 = samples.iter().map(|s| s.tx_count).sum();
    let avg_blobs_per_block = if total_blocks > 0 {
        total_blobs as f64 / total_blocks as f64
    } else {
        0.0
    };

    OverallStats {
        total_blocks,
        total_blobs,
        total_transactions,
        avg_blobs_per_block,
        latest_block: samples.last().map(|s| s.block_number),
        earliest_block: samples.first().map(|s| s.block_number),
        latest_gas_price: samples.last().map(|s| s.gas_price).unwrap_or(0),
    }
}

fn latest_view(sample: &BlockSample, schedule: &ParamSchedule) -> LatestBlockView {
    let params = schedule.params_at(sample.timestamp);
    let utilization_pct = params.target_utilization(sample.blob_count);
    LatestBlockView {
        block_number: sample.block_number,
        timestamp: sample.timestamp,
        blob_count: sample.blob_count,
        blob_bytes: params.blob_bytes(sample.blob_count),
        gas_price: sample.gas_price,
        excess_gas: sample.excess_gas,
        utilization_pct,
        saturation_pct: params.saturation_index(sample.blob_count),
        regime: Regime::classify(utilization_pct),
    }
}

fn reduced_chart(samples: &[BlockSample]) -> ChartSeries {
    let blobs: Vec<SeriesPoint> = samples
        .iter()
        .map(|s| SeriesPoint::new(s.block_number, s.blob_count as f64))
        .collect();
    let gas: Vec<SeriesPoint> = samples
        .iter()
        .map(|s| SeriesPoint::new(s.block_number, s.gas_price_gwei()))
        .collect();
    ChartSeries {
        blobs: bucket_average(&blobs, CHART_BUCKETS),
        gas_gwei: bucket_average(&gas, CHART_BUCKETS),
    }
}

fn long_chart(samples: &[BlockSample]) -> ChartSeries {
    let blobs: Vec<SeriesPoint> = samples
        .iter()
        .map(|s| SeriesPoint::new(s.block_number, s.blob_count as f64))
        .collect();
    let gas: Vec<SeriesPoint> = samples
        .iter()
        .map(|s| SeriesPoint::new(s.block_number, s.gas_price_gwei()))
        .collect();
    let window = samples.len();
    ChartSeries {
        blobs: stride_sample(&blobs, window, LONG_SERIES_THRESHOLD),
        gas_gwei: stride_sample(&gas, window, LONG_SERIES_THRESHOLD),
    }
}
