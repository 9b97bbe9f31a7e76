use std::fmt;

use rayon::prelude::*;
use tracing::info;

use super::ReallocationError;
use super::policy::{ReallocationPolicy, new_station_count};
use super::stats::{DistrictStats, NetworkAverages};

/// Outcome of the policy for one district.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Adjustment {
    pub district: String,
    /// Station count as observed, possibly 0.
    pub station_count: u32,
    /// Observed count floored to 1.
    pub clamped_count: u32,
    pub new_count: u32,
}

impl Adjustment {
    /// Signed change relative to the clamped count.
    pub fn delta(&self) -> i64 {
        i64::from(self.new_count) - i64::from(self.clamped_count)
    }
}

/// Runs the policy over `stats` with averages recomputed from the same
/// snapshot.
///
/// # Errors
///
/// Fails when the snapshot is empty or its station-usage average is not
/// strictly positive.
pub fn simulate_network(
    stats: &[DistrictStats],
    policy: &ReallocationPolicy,
) -> Result<Vec<Adjustment>, ReallocationError> {
    let averages = NetworkAverages::from_stats(stats)?;
    info!(
        districts = stats.len(),
        avg_usage_per_station = averages.usage_per_station(),
        avg_usage_per_population = averages.usage_per_population(),
        "network averages computed"
    );
    Ok(simulate_with_averages(stats, &averages, policy))
}

/// Maps every district through the policy against fixed averages.
///
/// Output order matches `stats`.
pub fn simulate_with_averages(
    stats: &[DistrictStats],
    averages: &NetworkAverages,
    policy: &ReallocationPolicy,
) -> Vec<Adjustment> {
    stats
        .par_iter()
        .map(|s| Adjustment {
            district: s.district.clone(),
            station_count: s.station_count,
            clamped_count: s.clamped_station_count(),
            new_count: new_station_count(s, averages, policy),
        })
        .collect()
}

/// Network-level view of a batch of adjustments.
#[derive(Debug, Clone, PartialEq)]
pub struct ReallocationSummary {
    pub districts: usize,
    /// Sum of clamped counts before reallocation.
    pub stations_before: u64,
    pub stations_after: u64,
    /// `(after - before) / before`, 0 for an empty batch.
    pub relative_change: f64,
    pub increased: usize,
    pub decreased: usize,
    pub unchanged: usize,
}

impl ReallocationSummary {
    pub fn from_adjustments(adjustments: &[Adjustment]) -> Self {
        let mut before = 0_u64;
        let mut after = 0_u64;
        let (mut increased, mut decreased, mut unchanged) = (0, 0, 0);

        for a in adjustments {
            before += u64::from(a.clamped_count);
            after += u64::from(a.new_count);
            match a.delta() {
                d if d > 0 => increased += 1,
                d if d < 0 => decreased += 1,
                _ => unchanged += 1,
            }
        }

        let relative_change = if before > 0 {
            (after as f64 - before as f64) / before as f64
        } else {
            0.0
        };

        Self {
            districts: adjustments.len(),
            stations_before: before,
            stations_after: after,
            relative_change,
            increased,
            decreased,
            unchanged,
        }
    }
}

impl fmt::Display for ReallocationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Reallocation Summary ---")?;
        writeln!(f, "Districts:        {}", self.districts)?;
        writeln!(
            f,
            "Stations:         {} -> {} ({:+.1}%)",
            self.stations_before,
            self.stations_after,
            100.0 * self.relative_change
        )?;
        writeln!(f, "Increased:        {}", self.increased)?;
        writeln!(f, "Decreased:        {}", self.decreased)?;
        write!(f, "Unchanged:        {}", self.unchanged)
    }
}
