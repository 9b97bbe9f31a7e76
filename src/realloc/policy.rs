use super::stats::{DistrictStats, NetworkAverages};

/// Tuning knobs of the bounded reallocation formula.
///
/// Passed explicitly to every simulation call; there are no implicit
/// call-site defaults.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReallocationPolicy {
    /// Exponent on the usage-per-station ratio.
    pub alpha: f64,
    /// Exponent on the usage-per-population ratio.
    pub beta: f64,
    /// Largest number of stations added or removed per district.
    pub max_change: u32,
}

impl Default for ReallocationPolicy {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            beta: 1.0,
            max_change: 2,
        }
    }
}

/// Intermediate factors of one district's adjustment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scaling {
    /// `(ups / avg_ups)^alpha`.
    pub station: f64,
    /// `(upp / avg_upp)^beta`, or exactly 1.0 with a zero network average.
    pub population: f64,
    /// Unbounded target `old * station * population`.
    pub raw_count: f64,
    /// `raw_count - old` clipped to `[-max_change, +max_change]`.
    pub delta: f64,
}

impl ReallocationPolicy {
    /// Factor breakdown for one district.
    pub fn scaling(&self, stats: &DistrictStats, averages: &NetworkAverages) -> Scaling {
        let old = f64::from(stats.clamped_station_count());
        let station = (stats.usage_per_station() / averages.usage_per_station()).powf(self.alpha);
        let population = if averages.usage_per_population() == 0.0 {
            1.0
        } else {
            (stats.usage_per_population() / averages.usage_per_population()).powf(self.beta)
        };
        let raw_count = old * station * population;
        let limit = f64::from(self.max_change);
        // 0^negative and 0*inf both land here.
        let delta = if (raw_count - old).is_nan() {
            0.0
        } else {
            (raw_count - old).clamp(-limit, limit)
        };
        Scaling {
            station,
            population,
            raw_count,
            delta,
        }
    }

    /// See [`new_station_count`].
    pub fn apply(&self, stats: &DistrictStats, averages: &NetworkAverages) -> u32 {
        new_station_count(stats, averages, self)
    }
}

/// New station count for one district, always >= 1 and within
/// `max_change` of the clamped existing count.
///
/// Exact `.5` ties round to the even neighbour.
pub fn new_station_count(
    stats: &DistrictStats,
    averages: &NetworkAverages,
    policy: &ReallocationPolicy,
) -> u32 {
    let old = f64::from(stats.clamped_station_count());
    let delta = policy.scaling(stats, averages).delta;
    (old + delta).round_ties_even().max(1.0) as u32
}
