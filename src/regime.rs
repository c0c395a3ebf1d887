//! Congestion regime classification.
//!
//! A regime is a pure function of one utilization value; there is no
//! transition state. Every call site (rolling windows, heatmap shading,
//! the header banner) goes through [`Regime::classify`] so the thresholds
//! cannot drift apart.

use serde::Serialize;

/// Discrete market condition, ordered by ascending congestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Regime {
    Abundant,
    Normal,
    Pressured,
    Congested,
    Saturated,
}

/// All regimes, ascending by congestion.
pub const REGIMES: [Regime; 5] = [
    Regime::Abundant,
    Regime::Normal,
    Regime::Pressured,
    Regime::Congested,
    Regime::Saturated,
];

impl Regime {
    /// Map a target-utilization percentage to its regime.
    ///
    /// Bands are inclusive on their upper edge: exactly 50% is still
    /// `Abundant`, exactly 90% still `Normal`, and so on. The bands
    /// partition `[0, inf)` with no gaps.
    pub fn classify(utilization_pct: f64) -> Self {
        if utilization_pct <= 50.0 {
            Regime::Abundant
        } else if utilization_pct <= 90.0 {
            Regime::Normal
        } else if utilization_pct <= 120.0 {
            Regime::Pressured
        } else if utilization_pct <= 150.0 {
            Regime::Congested
        } else {
            Regime::Saturated
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Regime::Abundant => "Abundant",
            Regime::Normal => "Normal",
            Regime::Pressured => "Pressured",
            Regime::Congested => "Congested",
            Regime::Saturated => "Saturated",
        }
    }

    /// Semantic color token; the UI maps tokens to terminal colors.
    pub fn color_token(&self) -> &'static str {
        match self {
            Regime::Abundant => "blue",
            Regime::Normal => "green",
            Regime::Pressured => "yellow",
            Regime::Congested => "orange",
            Regime::Saturated => "red",
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            Regime::Abundant => "Plenty of spare blob space; fees at the floor",
            Regime::Normal => "Demand tracking target capacity",
            Regime::Pressured => "Demand above target; fees trending up",
            Regime::Congested => "Sustained excess demand; fees climbing fast",
            Regime::Saturated => "Blocks at or near the hard blob limit",
        }
    }
}

impl std::fmt::Display for Regime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Fixed-slot histogram of regime occurrences within a window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RegimeCounts {
    counts: [u64; 5],
}

impl RegimeCounts {
    pub fn record(&mut self, regime: Regime) {
        self.counts[regime as usize] += 1;
    }

    pub fn get(&self, regime: Regime) -> u64 {
        self.counts[regime as usize]
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Iterate `(regime, count)` in ascending-congestion order.
    pub fn iter(&self) -> impl Iterator<Item = (Regime, u64)> + '_ {
        REGIMES.iter().map(|r| (*r, self.counts[*r as usize]))
    }

    /// The regime with the strictly highest count. Ties go to the more
    /// congested regime: a window split evenly between Normal and Pressured
    /// should read as Pressured, not whichever was tallied first.
    pub fn dominant(&self) -> Option<Regime> {
        if self.total() == 0 {
            return None;
        }
        let mut best = REGIMES[0];
        for regime in REGIMES {
            if self.get(regime) >= self.get(best) {
                best = regime;
            }
        }
        Some(best)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bands_are_upper_inclusive() {
        assert_eq!(Regime::classify(50.0), Regime::Abundant);
        assert_eq!(Regime::classify(50.0001), Regime::Normal);
        assert_eq!(Regime::classify(90.0), Regime::Normal);
        assert_eq!(Regime::classify(90.0001), Regime::Pressured);
        assert_eq!(Regime::classify(120.0), Regime::Pressured);
        assert_eq!(Regime::classify(120.0001), Regime::Congested);
        assert_eq!(Regime::classify(150.0), Regime::Congested);
        assert_eq!(Regime::classify(150.0001), Regime::Saturated);
    }

    #[test]
    fn classification_is_total_over_the_domain() {
        // Sweep a dense grid of the domain; each value lands in exactly one
        // regime because classify returns a single variant by construction.
        let mut seen = [false; 5];
        let mut pct = 0.0f64;
        while pct < 400.0 {
            seen[Regime::classify(pct) as usize] = true;
            pct += 0.25;
        }
        assert!(seen.iter().all(|s| *s), "sweep should visit all five regimes");
        assert_eq!(Regime::classify(0.0), Regime::Abundant);
        assert_eq!(Regime::classify(1e12), Regime::Saturated);
    }

    #[test]
    fn regimes_order_by_congestion() {
        assert!(Regime::Abundant < Regime::Normal);
        assert!(Regime::Congested < Regime::Saturated);
    }

    #[test]
    fn counts_sum_and_dominant() {
        let mut counts = RegimeCounts::default();
        for pct in [10.0, 60.0, 60.0, 100.0, 100.0, 100.0] {
            counts.record(Regime::classify(pct));
        }
        assert_eq!(counts.total(), 6);
        assert_eq!(counts.get(Regime::Abundant), 1);
        assert_eq!(counts.get(Regime::Normal), 2);
        assert_eq!(counts.get(Regime::Pressured), 3);
        assert_eq!(counts.dominant(), Some(Regime::Pressured));
    }

    #[test]
    fn dominant_tie_prefers_more_congested() {
        let mut counts = RegimeCounts::default();
        counts.record(Regime::Normal);
        counts.record(Regime::Pressured);
        assert_eq!(counts.dominant(), Some(Regime::Pressured));
    }

    #[test]
    fn dominant_of_empty_window_is_none() {
        assert_eq!(RegimeCounts::default().dominant(), None);
    }
}
