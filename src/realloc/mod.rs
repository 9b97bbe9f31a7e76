//! Station reallocation: per-district bounded adjustment of station counts.

/// Per-district policy formula.
pub mod policy;
/// Batch reallocation across every district of a snapshot.
pub mod simulator;
/// District aggregates and network-wide averages.
pub mod stats;

pub use policy::{ReallocationPolicy, Scaling, new_station_count};
pub use simulator::{Adjustment, ReallocationSummary, simulate_network, simulate_with_averages};
pub use stats::{DistrictStats, NetworkAverages, UsageSource, aggregate_districts};

use thiserror::Error;

use crate::data::DataError;

/// Errors raised while preparing a reallocation snapshot.
#[derive(Debug, Error)]
pub enum ReallocationError {
    /// Network averages need at least one district.
    #[error("no districts in snapshot")]
    EmptySnapshot,
    /// Average usage-per-station must be strictly positive for the efficiency ratio.
    #[error("network average usage per station must be > 0, got {0}")]
    NonPositiveStationAverage(f64),
    /// Average usage-per-population must be finite and non-negative.
    #[error("network average usage per population must be finite and >= 0, got {0}")]
    InvalidPopulationAverage(f64),
    /// Predicted usage does not line up with the dataset rows.
    #[error("expected {expected} predictions (one per record), found {found}")]
    PredictionCount { expected: usize, found: usize },
    /// The station or population column is missing from the dataset.
    #[error(transparent)]
    Data(#[from] DataError),
}
