//! Canonical chart-series reduction.
//!
//! Two independent reductions, used at different call sites: bucket
//! averaging for the fixed-width recent chart, stride sampling for the
//! long-horizon chart. Both are order-preserving and are no-ops on input
//! already at or below their size target, so re-applying either to its own
//! output changes nothing.

use serde::Serialize;

/// One chart point: `label` is a block number, `value` whatever the series
/// measures (blob count, gas price in gwei, a percentage).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub label: u64,
    pub value: f64,
}

impl SeriesPoint {
    pub fn new(label: u64, value: f64) -> Self {
        Self { label, value }
    }
}

/// Reduce `points` to at most `buckets` consecutive averaged chunks.
///
/// Each output point carries the *last* label of its chunk, keeping the
/// right edge aligned with the most recent block, and the chunk mean
/// rounded to two decimals.
pub fn bucket_average(points: &[SeriesPoint], buckets: usize) -> Vec<SeriesPoint> {
    if buckets == 0 || points.len() <= buckets {
        return points.to_vec();
    }
    let bucket_size = points.len().div_ceil(buckets);
    points
        .chunks(bucket_size)
        .map(|chunk| {
            let mean = chunk.iter().map(|p| p.value).sum::<f64>() / chunk.len() as f64;
            SeriesPoint {
                label: chunk[chunk.len() - 1].label,
                value: round2(mean),
            }
        })
        .collect()
}

/// Decimate `points` by keeping every stride-th element.
///
/// `window` is the size of the originally requested range and `threshold`
/// the point count above which sampling kicks in. The stride targets half
/// the threshold, `ceil(window / (threshold / 2))`; that ratio sets the
/// visual density of the long chart and must not change. Values and labels
/// pass through untouched.
pub fn stride_sample(points: &[SeriesPoint], window: usize, threshold: usize) -> Vec<SeriesPoint> {
    if threshold == 0 || window <= threshold {
        return points.to_vec();
    }
    let stride = ((window as f64) / (threshold as f64 / 2.0)).ceil().max(1.0) as usize;
    points
        .iter()
        .enumerate()
        .filter(|(i, _)| i % stride == 0)
        .map(|(_, p)| *p)
        .collect()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(values: &[f64]) -> Vec<SeriesPoint> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| SeriesPoint::new(i as u64 + 1, *v))
            .collect()
    }

    #[test]
    fn short_input_is_identity() {
        let points = series(&[1.0, 2.0, 3.0]);
        assert_eq!(bucket_average(&points, 3), points);
        assert_eq!(bucket_average(&points, 10), points);
    }

    #[test]
    fn reduces_120_points_to_60_pairwise_buckets() {
        let points: Vec<SeriesPoint> = (1..=120)
            .map(|i| SeriesPoint::new(i, i as f64))
            .collect();
        let reduced = bucket_average(&points, 60);
        assert_eq!(reduced.len(), 60);
        // First bucket covers blocks 1..2: right-edge label, mean value.
        assert_eq!(reduced[0].label, 2);
        assert_eq!(reduced[0].value, 1.5);
        // Last bucket covers blocks 119..120.
        assert_eq!(reduced[59].label, 120);
        assert_eq!(reduced[59].value, 119.5);
    }

    #[test]
    fn never_exceeds_bucket_count() {
        for len in [61, 100, 121, 500, 1000] {
            let points: Vec<SeriesPoint> =
                (0..len).map(|i| SeriesPoint::new(i, i as f64)).collect();
            assert!(bucket_average(&points, 60).len() <= 60, "len {len}");
        }
    }

    #[test]
    fn bucket_average_is_idempotent() {
        let points: Vec<SeriesPoint> = (0..987)
            .map(|i| SeriesPoint::new(i, (i % 13) as f64 * 0.37))
            .collect();
        let once = bucket_average(&points, 60);
        let twice = bucket_average(&once, 60);
        assert_eq!(once, twice);
    }

    #[test]
    fn preserves_final_label() {
        let points: Vec<SeriesPoint> = (100..345)
            .map(|i| SeriesPoint::new(i, 1.0))
            .collect();
        let reduced = bucket_average(&points, 60);
        assert_eq!(reduced[reduced.len() - 1].label, 344);
    }

    #[test]
    fn values_round_to_two_decimals() {
        let points = series(&[1.0, 2.0, 2.0, 1.0, 1.0, 1.0]);
        let reduced = bucket_average(&points, 2);
        // Chunks of 3: means 5/3 and 1.0.
        assert_eq!(reduced[0].value, 1.67);
        assert_eq!(reduced[1].value, 1.0);
    }

    #[test]
    fn stride_below_threshold_is_identity() {
        let points = series(&[5.0, 6.0, 7.0]);
        assert_eq!(stride_sample(&points, 3, 500), points);
    }

    #[test]
    fn stride_keeps_values_unchanged() {
        let points: Vec<SeriesPoint> = (0..2000)
            .map(|i| SeriesPoint::new(i, (i * 7 % 23) as f64))
            .collect();
        let sampled = stride_sample(&points, 2000, 500);
        // ceil(2000 / 250) = 8: every 8th point survives verbatim.
        assert_eq!(sampled.len(), 250);
        for (idx, point) in sampled.iter().enumerate() {
            assert_eq!(*point, points[idx * 8]);
        }
    }

    #[test]
    fn stride_sample_is_idempotent_on_its_output() {
        let points: Vec<SeriesPoint> =
            (0..2000).map(|i| SeriesPoint::new(i, i as f64)).collect();
        let once = stride_sample(&points, 2000, 500);
        // The reduced output is below the threshold, so a second pass with
        // its own length as the window is a no-op.
        let twice = stride_sample(&once, once.len(), 500);
        assert_eq!(once, twice);
    }

    #[test]
    fn stride_preserves_order() {
        let points: Vec<SeriesPoint> =
            (0..1200).map(|i| SeriesPoint::new(i, i as f64)).collect();
        let sampled = stride_sample(&points, 1200, 500);
        assert!(sampled.windows(2).all(|w| w[0].label < w[1].label));
    }
}
