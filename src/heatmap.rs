//! Weekly congestion heatmap.
//!
//! Blocks from the trailing 7 days are grouped by UTC (day-of-week,
//! hour-of-day) into a 7x24 grid. A cell that saw no blocks stays `None`;
//! downstream rendering must keep "no data" visually distinct from a cell
//! that averaged out to zero.

use crate::config::BASELINE_SECS;
use crate::params::ParamSchedule;
use crate::sample::BlockSample;
use chrono::{DateTime, Datelike, Timelike};
use serde::Serialize;

/// Rows: 0 = Sunday .. 6 = Saturday.
pub const DAYS: usize = 7;
/// Columns: UTC hour of day.
pub const HOURS: usize = 24;

pub const DAY_NAMES: [&str; DAYS] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HeatmapCell {
    pub block_count: u64,
    pub avg_utilization_pct: f64,
    pub avg_saturation_pct: f64,
    pub avg_gas_price: f64,
}

/// Min/average/max of per-cell average utilization across non-empty cells.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UtilizationSpread {
    pub min: f64,
    pub avg: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapGrid {
    /// `cells[day][hour]`; `None` = no blocks observed in that slot.
    pub cells: [[Option<HeatmapCell>; HOURS]; DAYS],
    /// `None` when the whole grid is empty.
    pub utilization_spread: Option<UtilizationSpread>,
}

impl HeatmapGrid {
    pub fn cell(&self, day: usize, hour: usize) -> Option<&HeatmapCell> {
        self.cells.get(day).and_then(|row| row.get(hour)).and_then(|c| c.as_ref())
    }

    pub fn occupied_cells(&self) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|cell| cell.is_some())
            .count()
    }
}

#[derive(Clone, Copy, Default)]
struct CellAccum {
    count: u64,
    utilization: f64,
    saturation: f64,
    gas: f64,
}

/// Aggregate the trailing 7 days of `samples` into the weekly grid.
pub fn weekly_heatmap(
    samples: &[BlockSample],
    schedule: &ParamSchedule,
    now: u64,
) -> HeatmapGrid {
    let start = now.saturating_sub(BASELINE_SECS);
    let mut accum = [[CellAccum::default(); HOURS]; DAYS];

    for sample in samples {
        if sample.timestamp < start || sample.timestamp > now {
            continue;
        }
        let Some(moment) = DateTime::from_timestamp(sample.timestamp as i64, 0) else {
            continue;
        };
        let day = moment.weekday().num_days_from_sunday() as usize;
        let hour = moment.hour() as usize;

        let params = schedule.params_at(sample.timestamp);
        let slot = &mut accum[day][hour];
        slot.count += 1;
        slot.utilization += params.target_utilization(sample.blob_count);
        slot.saturation += params.saturation_index(sample.blob_count);
        slot.gas += sample.gas_price as f64;
    }

    let mut cells = [[None; HOURS]; DAYS];
    let mut spread_min = f64::INFINITY;
    let mut spread_max = f64::NEG_INFINITY;
    let mut spread_sum = 0.0;
    let mut occupied = 0u32;

    for day in 0..DAYS {
        for hour in 0..HOURS {
            let slot = accum[day][hour];
            if slot.count == 0 {
                continue;
            }
            let n = slot.count as f64;
            let cell = HeatmapCell {
                block_count: slot.count,
                avg_utilization_pct: slot.utilization / n,
                avg_saturation_pct: slot.saturation / n,
                avg_gas_price: slot.gas / n,
            };
            spread_min = spread_min.min(cell.avg_utilization_pct);
            spread_max = spread_max.max(cell.avg_utilization_pct);
            spread_sum += cell.avg_utilization_pct;
            occupied += 1;
            cells[day][hour] = Some(cell);
        }
    }

    let utilization_spread = (occupied > 0).then(|| UtilizationSpread {
        min: spread_min,
        avg: spread_sum / occupied as f64,
        max: spread_max,
    });

    HeatmapGrid {
        cells,
        utilization_spread,
    }
}
