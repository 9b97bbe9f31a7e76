use std::collections::BTreeMap;

use crate::data::Dataset;

use super::ReallocationError;

/// Aggregate usage and population figures of one district.
#[derive(Debug, Clone, PartialEq)]
pub struct DistrictStats {
    /// District identifier.
    pub district: String,
    /// Existing number of stations (may be 0).
    pub station_count: u32,
    /// Total rentals over the period, observed or predicted.
    pub total_usage: f64,
    /// Total population flow over the period.
    pub total_population: f64,
}

impl DistrictStats {
    pub fn new(
        district: impl Into<String>,
        station_count: u32,
        total_usage: f64,
        total_population: f64,
    ) -> Self {
        Self {
            district: district.into(),
            station_count,
            total_usage,
            total_population,
        }
    }

    /// Station count floored to 1, the baseline for every division.
    pub fn clamped_station_count(&self) -> u32 {
        self.station_count.max(1)
    }

    /// Rentals per station (efficiency signal).
    pub fn usage_per_station(&self) -> f64 {
        self.total_usage / f64::from(self.clamped_station_count())
    }

    /// Rentals per unit of population flow (latent-demand signal), 0 when
    /// the district has no recorded population flow.
    pub fn usage_per_population(&self) -> f64 {
        if self.total_population == 0.0 {
            0.0
        } else {
            self.total_usage / self.total_population
        }
    }
}

/// Network-wide means of the two per-district signals.
///
/// Construction guarantees a strictly positive station-usage average, so the
/// per-district formula never divides by zero. A zero population-usage
/// average is allowed and makes the latent-demand factor neutral.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NetworkAverages {
    usage_per_station: f64,
    usage_per_population: f64,
}

impl NetworkAverages {
    /// # Errors
    ///
    /// Returns [`ReallocationError::NonPositiveStationAverage`] unless
    /// `usage_per_station` is finite and > 0, and
    /// [`ReallocationError::InvalidPopulationAverage`] unless
    /// `usage_per_population` is finite and >= 0.
    pub fn new(usage_per_station: f64, usage_per_population: f64) -> Result<Self, ReallocationError> {
        if !(usage_per_station.is_finite() && usage_per_station > 0.0) {
            return Err(ReallocationError::NonPositiveStationAverage(usage_per_station));
        }
        if !(usage_per_population.is_finite() && usage_per_population >= 0.0) {
            return Err(ReallocationError::InvalidPopulationAverage(usage_per_population));
        }
        Ok(Self {
            usage_per_station,
            usage_per_population,
        })
    }

    /// Means over the given snapshot, recomputed on every call.
    ///
    /// # Errors
    ///
    /// Returns [`ReallocationError::EmptySnapshot`] for an empty slice, or
    /// the validation errors of [`NetworkAverages::new`].
    pub fn from_stats(stats: &[DistrictStats]) -> Result<Self, ReallocationError> {
        if stats.is_empty() {
            return Err(ReallocationError::EmptySnapshot);
        }
        let n = stats.len() as f64;
        let station = stats.iter().map(DistrictStats::usage_per_station).sum::<f64>() / n;
        let population = stats
            .iter()
            .map(DistrictStats::usage_per_population)
            .sum::<f64>()
            / n;
        Self::new(station, population)
    }

    pub fn usage_per_station(&self) -> f64 {
        self.usage_per_station
    }

    pub fn usage_per_population(&self) -> f64 {
        self.usage_per_population
    }
}

/// Where district usage totals come from.
#[derive(Debug, Clone, Copy)]
pub enum UsageSource<'a> {
    /// Observed target column of the dataset.
    Observed,
    /// Model predictions, one per dataset record in row order.
    Predicted(&'a [f64]),
}

#[derive(Default)]
struct Accumulator<'a> {
    usage: f64,
    population: f64,
    latest_date: &'a str,
    stations: f64,
}

/// Groups a district-period table into per-district stats.
///
/// Usage and population are summed over each district's rows; the station
/// count is taken from the district's latest period. Predicted usage below
/// zero is floored at zero. Output is ordered by district id.
///
/// # Errors
///
/// Fails if either column is not a feature of `dataset`, or if the number of
/// predictions does not match the number of records.
pub fn aggregate_districts(
    dataset: &Dataset,
    station_column: &str,
    population_column: &str,
    usage: UsageSource<'_>,
) -> Result<Vec<DistrictStats>, ReallocationError> {
    let stations = dataset.feature_column(station_column)?;
    let population = dataset.feature_column(population_column)?;
    if let UsageSource::Predicted(values) = usage
        && values.len() != dataset.len()
    {
        return Err(ReallocationError::PredictionCount {
            expected: dataset.len(),
            found: values.len(),
        });
    }

    let mut groups: BTreeMap<&str, Accumulator<'_>> = BTreeMap::new();
    for (i, record) in dataset.records().iter().enumerate() {
        let row_usage = match usage {
            UsageSource::Observed => record.total_rentals,
            UsageSource::Predicted(values) => values[i].max(0.0),
        };
        let acc = groups.entry(record.district.as_str()).or_default();
        acc.usage += row_usage;
        acc.population += population[i];
        if record.date.as_str() >= acc.latest_date {
            acc.latest_date = record.date.as_str();
            acc.stations = stations[i];
        }
    }

    Ok(groups
        .into_iter()
        .map(|(district, acc)| {
            DistrictStats::new(
                district,
                acc.stations.round().max(0.0) as u32,
                acc.usage,
                acc.population,
            )
        })
        .collect())
}
