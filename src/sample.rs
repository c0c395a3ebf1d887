//! Raw observations handed to the engine by the ingestion layer.

use crate::error::MarketError;
use serde::Serialize;

/// One observed block. Produced by the collector, never mutated afterwards;
/// the engine only derives values from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BlockSample {
    pub block_number: u64,
    /// Unix seconds. Non-decreasing with block number in practice, but the
    /// engine never assumes strict monotonicity.
    pub timestamp: u64,
    /// Blob transactions in the block
    pub tx_count: u64,
    /// Blobs across all transactions in the block
    pub blob_count: u64,
    /// Blob gas price in wei
    pub gas_price: u64,
    /// Protocol excess-demand accumulator, when the header carried one
    pub excess_gas: Option<u64>,
}

impl BlockSample {
    /// Reject samples the upstream fetch left incomplete. A zero timestamp
    /// means the header never arrived; averaging it in would smear every
    /// time-windowed statistic toward the epoch.
    pub fn validate(&self) -> Result<(), MarketError> {
        if self.timestamp == 0 {
            return Err(MarketError::MalformedSample {
                block: self.block_number,
                reason: "missing timestamp".to_string(),
            });
        }
        Ok(())
    }

    pub fn gas_price_gwei(&self) -> f64 {
        self.gas_price as f64 / 1e9
    }
}

/// One observed blob transaction, for sender attribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TxRecord {
    /// 0x-prefixed sender address
    pub sender: String,
    pub blob_count: u64,
    /// Timestamp of the containing block, unix seconds
    pub timestamp: u64,
    /// Blob gas price of the containing block, wei
    pub gas_price: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(timestamp: u64) -> BlockSample {
        BlockSample {
            block_number: 100,
            timestamp,
            tx_count: 2,
            blob_count: 5,
            gas_price: 3_000_000_000,
            excess_gas: Some(0),
        }
    }

    #[test]
    fn zero_timestamp_is_malformed() {
        let err = sample(0).validate().unwrap_err();
        assert!(matches!(
            err,
            MarketError::MalformedSample { block: 100, .. }
        ));
    }

    #[test]
    fn complete_sample_passes() {
        assert!(sample(1_700_000_000).validate().is_ok());
    }

    #[test]
    fn gas_price_converts_to_gwei() {
        assert_eq!(sample(1).gas_price_gwei(), 3.0);
    }
}
