//! Protocol capacity model.
//!
//! Target and max blobs-per-block change at protocol upgrade boundaries, so
//! every capacity value flows through a [`ParamSchedule`] rather than a
//! constant scattered across call sites. The schedule is the single source of
//! truth for "what was the capacity when this block landed".

use crate::error::MarketError;
use serde::Serialize;

/// Each blob carries 128KB (131072 bytes) per EIP-4844
pub const BLOB_SIZE_BYTES: u64 = 131_072;

/// BPO2 activation timestamp (January 6, 2026)
pub const BPO2_TIMESTAMP: u64 = 1_767_747_671;

/// Per-block blob capacity in force for some span of time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProtocolParams {
    pub target_blobs_per_block: u64,
    pub max_blobs_per_block: u64,
    pub bytes_per_blob: u64,
}

/// Osaka / BPO1 capacity.
pub const BPO1_PARAMS: ProtocolParams = ProtocolParams {
    target_blobs_per_block: 6,
    max_blobs_per_block: 9,
    bytes_per_blob: BLOB_SIZE_BYTES,
};

/// BPO2 capacity, in force since [`BPO2_TIMESTAMP`].
pub const BPO2_PARAMS: ProtocolParams = ProtocolParams {
    target_blobs_per_block: 10,
    max_blobs_per_block: 15,
    bytes_per_blob: BLOB_SIZE_BYTES,
};

impl ProtocolParams {
    /// Build a validated parameter set. Invariant: `0 < target < max`.
    pub fn new(target: u64, max: u64, bytes_per_blob: u64) -> Result<Self, MarketError> {
        let params = Self {
            target_blobs_per_block: target,
            max_blobs_per_block: max,
            bytes_per_blob,
        };
        params.validate()?;
        Ok(params)
    }

    /// Validation happens once at configuration load, so the per-block math
    /// below never has to guard against a zero divisor.
    pub fn validate(&self) -> Result<(), MarketError> {
        if self.target_blobs_per_block == 0 || self.max_blobs_per_block == 0 {
            return Err(MarketError::InvalidParams(
                "target and max blobs per block must be positive".to_string(),
            ));
        }
        if self.target_blobs_per_block >= self.max_blobs_per_block {
            return Err(MarketError::InvalidParams(format!(
                "target ({}) must be below max ({})",
                self.target_blobs_per_block, self.max_blobs_per_block
            )));
        }
        if self.bytes_per_blob == 0 {
            return Err(MarketError::InvalidParams(
                "bytes per blob must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Blob count as a percentage of target capacity. Deliberately unclamped:
    /// values above 100% are the congestion signal.
    pub fn target_utilization(&self, blob_count: u64) -> f64 {
        (blob_count as f64 / self.target_blobs_per_block as f64) * 100.0
    }

    /// Blob count as a percentage of the hard per-block limit. Callers clamp
    /// for display only.
    pub fn saturation_index(&self, blob_count: u64) -> f64 {
        (blob_count as f64 / self.max_blobs_per_block as f64) * 100.0
    }

    /// Payload bytes represented by `blob_count` blobs.
    pub fn blob_bytes(&self, blob_count: u64) -> u64 {
        blob_count * self.bytes_per_blob
    }
}

/// Ordered list of capacity forks, earliest first.
#[derive(Debug, Clone, Serialize)]
pub struct ParamSchedule {
    forks: Vec<(u64, ProtocolParams)>,
}

impl ParamSchedule {
    /// Build a schedule from `(activation_timestamp, params)` entries.
    /// Entries are sorted by activation time; every entry is validated.
    pub fn new(mut forks: Vec<(u64, ProtocolParams)>) -> Result<Self, MarketError> {
        if forks.is_empty() {
            return Err(MarketError::InvalidParams(
                "schedule needs at least one fork entry".to_string(),
            ));
        }
        for (_, params) in &forks {
            params.validate()?;
        }
        forks.sort_by_key(|(activation, _)| *activation);
        Ok(Self { forks })
    }

    /// Mainnet history: Osaka/BPO1 capacity, then BPO2 at its activation time.
    pub fn mainnet() -> Self {
        Self {
            forks: vec![(0, BPO1_PARAMS), (BPO2_TIMESTAMP, BPO2_PARAMS)],
        }
    }

    /// A single parameter set for the whole timeline (CLI override).
    pub fn fixed(params: ProtocolParams) -> Self {
        Self {
            forks: vec![(0, params)],
        }
    }

    /// Capacity in force at `timestamp`: the latest fork activated at or
    /// before it, or the earliest fork for pre-history timestamps.
    pub fn params_at(&self, timestamp: u64) -> ProtocolParams {
        let mut active = self.forks[0].1;
        for (activation, params) in &self.forks {
            if *activation <= timestamp {
                active = *params;
            }
        }
        active
    }
}
