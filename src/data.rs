use crate::config::{MAX_BACKFILL_PER_CYCLE, STALE_AFTER};
use crate::params::BPO2_TIMESTAMP;
use crate::sample::{BlockSample, TxRecord};
use alloy::eips::BlockNumberOrTag;
use alloy::eips::eip7840::BlobParams;
use alloy_consensus::{BlockHeader, Transaction};
use alloy_provider::{Provider as ProviderTrait, RootProvider as AlloyProvider};
use eyre::Result;
use std::collections::VecDeque;
use std::time::Instant;
use tracing::{debug, info, warn};
use url::Url;

/// Everything the collector knows about the chain, refreshed each cycle.
/// Samples are stored in ascending block order; the engine consumes them
/// as an immutable slice per refresh.
#[derive(Debug, Clone)]
pub struct ChainMetrics {
    pub chain_id: Option<u64>,
    pub head_number: Option<u64>,
    pub last_updated: Instant,
    pub last_successful: Option<Instant>,
    pub rpc_url: String,
    pub connection_status: ConnectionStatus,
    pub samples: VecDeque<BlockSample>,
    pub tx_records: VecDeque<TxRecord>,
    pub max_block_history: usize,
    pub latest_block_timestamp: Option<u64>, // unix seconds
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionStatus {
    Connected,
    Stale,
    Disconnected,
    Error(String),
}

#[derive(Debug, Clone)]
pub struct CollectorConfig {
    pub rpc_url: String,
    pub max_block_history: usize,
}

impl ChainMetrics {
    pub fn new(config: &CollectorConfig) -> Self {
        Self {
            chain_id: None,
            head_number: None,
            last_updated: Instant::now(),
            last_successful: None,
            rpc_url: config.rpc_url.clone(),
            connection_status: ConnectionStatus::Disconnected,
            samples: VecDeque::with_capacity(config.max_block_history),
            tx_records: VecDeque::new(),
            max_block_history: config.max_block_history,
            latest_block_timestamp: None,
        }
    }

    /// Materialize the history as contiguous slices for the engine,
    /// oldest first.
    pub fn snapshot_inputs(&self) -> (Vec<BlockSample>, Vec<TxRecord>) {
        (
            self.samples.iter().copied().collect(),
            self.tx_records.iter().cloned().collect(),
        )
    }
}

pub struct BlobRpcClient {
    provider: AlloyProvider,
}

impl BlobRpcClient {
    pub fn new(rpc_url: &str) -> Result<Self> {
        let url = Url::parse(rpc_url)?;
        let provider = AlloyProvider::new_http(url);
        Ok(Self { provider })
    }

    pub async fn get_chain_id(&self) -> Result<u64> {
        let id = self.provider.get_chain_id().await?;
        Ok(id)
    }

    pub async fn get_block_number(&self) -> Result<u64> {
        let number = self.provider.get_block_number().await?;
        Ok(number)
    }

    /// Fetch one block with full transactions and distill it into a sample
    /// plus one record per blob transaction.
    pub async fn fetch_block(&self, number: u64) -> Result<(BlockSample, Vec<TxRecord>)> {
        let block = self
            .provider
            .get_block_by_number(BlockNumberOrTag::Number(number))
            .full()
            .await?
            .ok_or_else(|| eyre::eyre!("block {number} not found"))?;

        let timestamp = block.header.timestamp();
        let excess_gas = block.header.excess_blob_gas();
        let gas_price: u64 = excess_gas
            .map(|e| blob_params_at(timestamp).calc_blob_fee(e))
            .unwrap_or(0)
            .try_into()
            .unwrap_or(u64::MAX);

        let mut tx_count = 0u64;
        let mut blob_count = 0u64;
        let mut records = Vec::new();

        for tx in block.transactions.txns() {
            if let Some(hashes) = tx.blob_versioned_hashes() {
                let num_blobs = hashes.len() as u64;
                tx_count += 1;
                blob_count += num_blobs;
                records.push(TxRecord {
                    sender: tx.inner.signer().to_string(),
                    blob_count: num_blobs,
                    timestamp,
                    gas_price,
                });
            }
        }

        let sample = BlockSample {
            block_number: number,
            timestamp,
            tx_count,
            blob_count,
            gas_price,
            excess_gas,
        };
        Ok((sample, records))
    }
}

/// Fee computation needs the fork-correct blob schedule constants.
fn blob_params_at(timestamp: u64) -> BlobParams {
    if timestamp >= BPO2_TIMESTAMP {
        BlobParams::bpo2()
    } else {
        BlobParams::osaka()
    }
}

pub struct Collector {
    client: BlobRpcClient,
    metrics: ChainMetrics,
}

impl Collector {
    pub fn new(config: CollectorConfig) -> Result<Self> {
        let client = BlobRpcClient::new(&config.rpc_url)?;
        Ok(Self {
            metrics: ChainMetrics::new(&config),
            client,
        })
    }

    /// One poll cycle: connectivity, head number, then bounded backfill of
    /// any blocks between the stored tip and the head.
    pub async fn collect(&mut self) -> &ChainMetrics {
        let mut status = match self.client.get_chain_id().await {
            Ok(chain_id) => {
                self.metrics.chain_id = Some(chain_id);
                ConnectionStatus::Connected
            }
            Err(e) => ConnectionStatus::Error(format!("Chain ID: {}", e)),
        };

        if matches!(status, ConnectionStatus::Connected) {
            match self.client.get_block_number().await {
                Ok(head) => self.metrics.head_number = Some(head),
                Err(e) => status = ConnectionStatus::Error(format!("Block number: {}", e)),
            }
        }

        if matches!(status, ConnectionStatus::Connected) {
            if let Some(head) = self.metrics.head_number {
                self.backfill_to(head).await;
            }
        }

        self.metrics.connection_status = status;
        self.metrics.last_updated = Instant::now();
        if matches!(self.metrics.connection_status, ConnectionStatus::Connected) {
            self.metrics.last_successful = Some(self.metrics.last_updated);
        }
        &self.metrics
    }

    /// Fetch missing blocks up to `head`, capped per cycle so a cold start
    /// catches up over several polls instead of stalling one.
    async fn backfill_to(&mut self, head: u64) {
        let last_stored = self.metrics.samples.back().map(|s| s.block_number);
        let fetch_range: Vec<u64> = match last_stored {
            Some(last) if head > last => {
                let start = head.saturating_sub(MAX_BACKFILL_PER_CYCLE - 1).max(last + 1);
                (start..=head).collect()
            }
            Some(_) => Vec::new(),
            // Cold start: seed with the most recent batch instead of a
            // single block so the charts have something to show.
            None => (head.saturating_sub(MAX_BACKFILL_PER_CYCLE - 1)..=head).collect(),
        };

        for number in fetch_range {
            match self.client.fetch_block(number).await {
                Ok((sample, records)) => {
                    debug!(
                        block = sample.block_number,
                        blobs = sample.blob_count,
                        txs = sample.tx_count,
                        "ingested block"
                    );
                    if self
                        .metrics
                        .latest_block_timestamp
                        .map(|cur| sample.timestamp > cur)
                        .unwrap_or(true)
                    {
                        self.metrics.latest_block_timestamp = Some(sample.timestamp);
                    }
                    self.metrics.samples.push_back(sample);
                    self.metrics.tx_records.extend(records);
                    while self.metrics.samples.len() > self.metrics.max_block_history {
                        self.metrics.samples.pop_front();
                    }
                    self.trim_tx_records();
                }
                Err(e) => {
                    warn!(block = number, error = %e, "failed to fetch block");
                }
            }
        }

        if let (Some(first), Some(last)) = (
            self.metrics.samples.front().map(|s| s.block_number),
            self.metrics.samples.back().map(|s| s.block_number),
        ) {
            info!(first, last, count = self.metrics.samples.len(), "history window");
        }
    }

    /// Drop tx records older than the oldest retained block.
    fn trim_tx_records(&mut self) {
        let Some(oldest) = self.metrics.samples.front().map(|s| s.timestamp) else {
            return;
        };
        while self
            .metrics
            .tx_records
            .front()
            .map(|tx| tx.timestamp < oldest)
            .unwrap_or(false)
        {
            self.metrics.tx_records.pop_front();
        }
    }

    pub fn metrics(&self) -> &ChainMetrics {
        &self.metrics
    }

    pub fn check_staleness(&mut self) {
        if matches!(
            self.metrics.connection_status,
            ConnectionStatus::Connected | ConnectionStatus::Stale
        ) {
            if let Some(last_ok) = self.metrics.last_successful {
                if last_ok.elapsed() > STALE_AFTER {
                    self.metrics.connection_status = ConnectionStatus::Stale;
                }
            }
        }
    }
}
