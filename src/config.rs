//! Tuning constants for the blobsight dashboard
use std::time::Duration;

pub const STALE_AFTER: Duration = Duration::from_secs(20);

/// Seconds between refresh cycles unless overridden on the CLI
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

/// Number of blocks of history to keep in memory.
/// Sized for the 7-day baseline window at 12s slots.
pub const DEFAULT_MAX_BLOCK_HISTORY: usize = 50_400;

/// Maximum number of missing blocks to backfill per update cycle
pub const MAX_BACKFILL_PER_CYCLE: u64 = 16;

// ========================= CHART CONFIG =========================
/// Blocks feeding the recent-activity chart before reduction
pub const CHART_WINDOW_BLOCKS: usize = 360;
/// Display buckets for the recent-activity chart
pub const CHART_BUCKETS: usize = 60;
/// Point threshold above which the long-horizon series is stride-sampled
pub const LONG_SERIES_THRESHOLD: usize = 500;
/// Rows in the recent-blocks list
pub const RECENT_BLOCKS_SHOWN: usize = 12;

// ========================= WINDOW CONFIG =========================
pub const HOUR_SECS: u64 = 3_600;
pub const DAY_SECS: u64 = 86_400;
/// Baseline horizon every shorter window is compared against
pub const BASELINE_SECS: u64 = 7 * DAY_SECS;
/// Trailing window for chain attribution profiles
pub const CHAIN_PROFILE_SECS: u64 = DAY_SECS;
