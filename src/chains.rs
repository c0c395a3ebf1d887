//! Rollup attribution and per-chain posting profiles.
//!
//! Blob senders are long-lived batcher addresses, so a static table is
//! enough to attribute almost all mainnet blob traffic. Unknown senders
//! fall through to "Other".

use crate::sample::TxRecord;
use serde::Serialize;
use std::collections::HashMap;

/// Map a batcher address (0x-prefixed, any case) to its rollup.
pub fn rollup_for_sender(address: &str) -> &'static str {
    match address.to_lowercase().as_str() {
        "0x5050f69a9786f081509234f1a7f4684b5e5b76c9" => "Base",
        "0xff00000000000000000000000000000000008453" => "Base",
        "0x6887246668a3b87f54deb3b94ba47a6f63f32985" => "Optimism",
        "0xc1b634853cb333d3ad8663715b08f41a3aec47cc" => "Arbitrum",
        "0xa4b10ac61e79ea1e150df70b8dda53391928fd14" => "Arbitrum",
        "0xa4b1e63cb4901e327597bc35d36fe8a23e4c253f" => "Arbitrum",
        "0xa1e4380a3b1f749673e270229993ee55f35663b4" => "Scroll",
        "0xcf2898225ed05be911d3709d9417e86e0b4cfc8f" => "Scroll",
        "0x4f250b05262240c787a1ee222687c6ec395c628a" => "Scroll",
        "0xb4a04505a487fcf16232d74ebb76429e232b1f21" => "Scroll",
        "0x054a47b9e2a22af6c0ce55020238c8fecd7d334b" => "Scroll",
        "0x415c8893d514f9bc5211d36eeda4183226b84aa7" => "Starknet",
        "0x2c169dfe5fbba12957bdd0ba47d9cedbfe260ca7" => "Starknet",
        "0xa9268341831efa4937537bc3e9eb36dbece83c7e" => "zkSync Era",
        "0x3db52ce065f728011ac6732222270b3f2360d919" => "zkSync Era",
        "0xd19d4b5d358258f05d7b411e21a1460d11b0876f" => "Linea",
        "0xc70ae19b5feaa5c19f576e621d2bad9771864fe2" => "Linea",
        "0x77b064f418b27167bd8c6f263a16455e628b56cb" => "Taiko",
        "0xfc3756dc89ee98b049c1f2b0c8e69f0649e5c3e3" => "Taiko",
        "0xeb18ea5dedee42e7af378991dfeb719d21c17b4c" => "Swell Chain",
        "0xaf1e4f6a47af647f87c0ec814d8032c4a4bff145" => "Zircuit",
        "0x65115c6d23274e0a29a63b69130efe901aa52e7a" => "Hemi",
        "0x4b2d036d2c27192549ad5a2f2d9875e1843833de" => "Abstract",
        "0xdbbe3d8c2d2b22a2611c5a94a9a12c2fcd49eb29" => "World",
        "0x500d7ea63cf2e501dadaa5feec1fc19fe2aa72ac" => "Ink",
        "0x98a986ee08bf67c9cfc4de2aaaff2d7f56c0bc47" => "Blast",
        "0x625726c858dbf78c0125436c943bf4b4be9d9033" => "Zora",
        "0x99199a22125034c808ff20f377d91187e8050f2e" => "Mode",
        "0xd1328c9167e0693b689b5aa5a024379d4e437858" => "Mantle",
        "0xc94c243f8fb37223f3eb77f1e6d55e0f8f9caef4" => "Metal",
        "0xc94c243f8fb37223f3eb2f7961f7072602a51b8b" => "Metal",
        "0x3c11c3025ce387d76c2eddf1493ec55a8cc2a0f7" => "Cyber",
        "0x41b8cd6791de4d8f9e0eda9f185ce1898f0b5b3b" => "Kroma",
        "0xa8cd7f4c94eb0f15a5d8f5e9f9b4eb9b2e3eb60d" => "Redstone",
        "0x7f9d9c1bce1062e1077845ea39a0303429600a06" => "Fraxtal",
        "0xd6c24e78cc77e48c87c246a2e0b7d21ffb7c1c0a" => "Mint",
        "0x6776be80dbada6a02b5f2095cf13734ac303b8d1" => "Soneium",
        "0xfbc0dcd6c3518cb529bc1b585db992a7d40005fa" => "Lighter",
        "0x2f60a5184c63ca94f82a27100643dbabe4f3f7fd" => "UniChain",
        "0x1ffda89c755f6d4af069897d77ccabb580fd412a" => "Katana",
        "0xb5bd290ef8ef3840cb866c7a8b7cc9e45fde3ab9" => "Codex",
        _ => "Other",
    }
}

/// Posting behavior of one rollup over the profile window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainProfile {
    pub chain: String,
    pub total_transactions: u64,
    pub total_blobs: u64,
    /// Share of all blobs posted in the window, 0-100
    pub percentage: f64,
    pub avg_blobs_per_tx: f64,
    /// Mean gap between consecutive posts, seconds; 0 with fewer than 2 posts
    pub avg_posting_interval_secs: f64,
    /// Posts per UTC hour, normalized 0-1 against the busiest hour
    pub hourly_activity: Vec<f64>,
}

/// Group blob transactions from `[now - window_secs, now]` by rollup and
/// profile each one. Sorted by total blobs, busiest first.
pub fn chain_profiles(txs: &[TxRecord], now: u64, window_secs: u64) -> Vec<ChainProfile> {
    let start = now.saturating_sub(window_secs);

    let mut by_chain: HashMap<&'static str, Vec<&TxRecord>> = HashMap::new();
    let mut grand_total_blobs = 0u64;
    for tx in txs {
        if tx.timestamp < start || tx.timestamp > now {
            continue;
        }
        by_chain.entry(rollup_for_sender(&tx.sender)).or_default().push(tx);
        grand_total_blobs += tx.blob_count;
    }

    let mut profiles: Vec<ChainProfile> = by_chain
        .into_iter()
        .map(|(chain, txs)| profile_one(chain, &txs, grand_total_blobs))
        .collect();

    profiles.sort_by(|a, b| b.total_blobs.cmp(&a.total_blobs).then(a.chain.cmp(&b.chain)));
    profiles
}

fn profile_one(chain: &str, txs: &[&TxRecord], grand_total_blobs: u64) -> ChainProfile {
    let total_transactions = txs.len() as u64;
    let total_blobs: u64 = txs.iter().map(|tx| tx.blob_count).sum();

    let avg_blobs_per_tx = if total_transactions > 0 {
        total_blobs as f64 / total_transactions as f64
    } else {
        0.0
    };
    let percentage = if grand_total_blobs > 0 {
        (total_blobs as f64 / grand_total_blobs as f64) * 100.0
    } else {
        0.0
    };

    let mut timestamps: Vec<u64> = txs.iter().map(|tx| tx.timestamp).collect();
    timestamps.sort_unstable();
    let avg_posting_interval_secs = if timestamps.len() > 1 {
        let span: u64 = timestamps
            .windows(2)
            .map(|pair| pair[1] - pair[0])
            .sum();
        span as f64 / (timestamps.len() - 1) as f64
    } else {
        0.0
    };

    let mut hourly_counts = [0u64; 24];
    for ts in &timestamps {
        hourly_counts[((ts % 86_400) / 3_600) as usize] += 1;
    }
    let peak = hourly_counts.iter().copied().max().unwrap_or(0);
    let hourly_activity = hourly_counts
        .iter()
        .map(|&count| {
            if peak > 0 {
                count as f64 / peak as f64
            } else {
                0.0
            }
        })
        .collect();

    ChainProfile {
        chain: chain.to_string(),
        total_transactions,
        total_blobs,
        percentage,
        avg_blobs_per_tx,
        avg_posting_interval_secs,
        hourly_activity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE_BATCHER: &str = "0x5050F69a9786F081509234F1a7F4684b5E5b76C9";
    const OP_BATCHER: &str = "0x6887246668a3b87f54deb3b94ba47a6f63f32985";

    fn tx(sender: &str, blob_count: u64, timestamp: u64) -> TxRecord {
        TxRecord {
            sender: sender.to_string(),
            blob_count,
            timestamp,
            gas_price: 1_000,
        }
    }

    #[test]
    fn attribution_is_case_insensitive() {
        assert_eq!(rollup_for_sender(BASE_BATCHER), "Base");
        assert_eq!(rollup_for_sender(&BASE_BATCHER.to_lowercase()), "Base");
        assert_eq!(rollup_for_sender("0xdeadbeef00000000000000000000000000000000"), "Other");
    }

    #[test]
    fn blob_shares_sum_to_one_hundred() {
        let now = 10_000;
        let txs = vec![
            tx(BASE_BATCHER, 6, now - 100),
            tx(BASE_BATCHER, 6, now - 200),
            tx(OP_BATCHER, 4, now - 300),
        ];
        let profiles = chain_profiles(&txs, now, 3_600);
        assert_eq!(profiles.len(), 2);
        assert_eq!(profiles[0].chain, "Base");
        assert_eq!(profiles[0].total_blobs, 12);
        assert!((profiles[0].percentage - 75.0).abs() < 1e-9);
        assert!((profiles[1].percentage - 25.0).abs() < 1e-9);
        let total: f64 = profiles.iter().map(|p| p.percentage).sum();
        assert!((total - 100.0).abs() < 1e-9);
    }

    #[test]
    fn posting_interval_is_mean_gap() {
        let now = 10_000;
        // Posts at now-900, now-600, now-300: two gaps of 300s.
        let txs = vec![
            tx(OP_BATCHER, 1, now - 300),
            tx(OP_BATCHER, 1, now - 900),
            tx(OP_BATCHER, 1, now - 600),
        ];
        let profiles = chain_profiles(&txs, now, 3_600);
        assert!((profiles[0].avg_posting_interval_secs - 300.0).abs() < 1e-9);
    }

    #[test]
    fn single_post_has_zero_interval() {
        let profiles = chain_profiles(&[tx(OP_BATCHER, 1, 500)], 1_000, 3_600);
        assert_eq!(profiles[0].avg_posting_interval_secs, 0.0);
    }

    #[test]
    fn hourly_activity_normalizes_to_peak() {
        let day = 86_400;
        // Two posts in hour 3, one in hour 7.
        let txs = vec![
            tx(BASE_BATCHER, 1, 10 * day + 3 * 3_600),
            tx(BASE_BATCHER, 1, 10 * day + 3 * 3_600 + 60),
            tx(BASE_BATCHER, 1, 10 * day + 7 * 3_600),
        ];
        let profiles = chain_profiles(&txs, 10 * day + 8 * 3_600, day);
        let activity = &profiles[0].hourly_activity;
        assert_eq!(activity.len(), 24);
        assert_eq!(activity[3], 1.0);
        assert_eq!(activity[7], 0.5);
        assert_eq!(activity[0], 0.0);
    }

    #[test]
    fn window_filter_drops_old_transactions() {
        let now = 100_000;
        let txs = vec![tx(BASE_BATCHER, 5, now - 10), tx(BASE_BATCHER, 5, now - 90_000)];
        let profiles = chain_profiles(&txs, now, 3_600);
        assert_eq!(profiles[0].total_transactions, 1);
    }
}
