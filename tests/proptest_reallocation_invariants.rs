//! Property-based checks of the per-district reallocation formula.
//!
//! 1. **Bounded delta**: the new count is >= 1 and within `max_change` of the
//!    clamped existing count, for any finite inputs and exponents.
//! 2. **Zero-population guard**: zero population flow gives zero
//!    usage-per-population whatever the usage.
//! 3. **Neutral population factor** when the network average is zero.
//! 4. **Batch equals per-district** evaluation, in input order.

use bikeshare_sim::realloc::{
    DistrictStats, NetworkAverages, ReallocationPolicy, new_station_count, simulate_with_averages,
};
use proptest::prelude::*;

fn district() -> impl Strategy<Value = DistrictStats> {
    (0u32..200, 0.0f64..1e6, prop_oneof![Just(0.0), 0.0f64..1e7])
        .prop_map(|(stations, usage, population)| {
            DistrictStats::new("d", stations, usage, population)
        })
}

fn policy() -> impl Strategy<Value = ReallocationPolicy> {
    (-3.0f64..3.0, -3.0f64..3.0, 0u32..20).prop_map(|(alpha, beta, max_change)| {
        ReallocationPolicy {
            alpha,
            beta,
            max_change,
        }
    })
}

fn averages() -> impl Strategy<Value = NetworkAverages> {
    (1e-3f64..1e5, prop_oneof![Just(0.0), 1e-6f64..10.0]).prop_map(|(ups, upp)| {
        NetworkAverages::new(ups, upp).expect("strategy yields valid averages")
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn new_count_is_bounded(stats in district(), avg in averages(), policy in policy()) {
        let old = i64::from(stats.clamped_station_count());
        let new = new_station_count(&stats, &avg, &policy);
        prop_assert!(new >= 1);
        prop_assert!((i64::from(new) - old).abs() <= i64::from(policy.max_change));
    }

    #[test]
    fn zero_population_gives_zero_usage_per_population(stations in 0u32..100, usage in 0.0f64..1e9) {
        let stats = DistrictStats::new("d", stations, usage, 0.0);
        prop_assert_eq!(stats.usage_per_population(), 0.0);
    }

    #[test]
    fn zero_average_population_is_neutral(stats in district(), ups in 1e-3f64..1e5, policy in policy()) {
        let avg = NetworkAverages::new(ups, 0.0).expect("valid averages");
        prop_assert_eq!(policy.scaling(&stats, &avg).population, 1.0);
    }

    #[test]
    fn batch_matches_single_district(
        stats in prop::collection::vec(district(), 1..40),
        avg in averages(),
        policy in policy(),
    ) {
        let batch = simulate_with_averages(&stats, &avg, &policy);
        prop_assert_eq!(batch.len(), stats.len());
        for (a, s) in batch.iter().zip(&stats) {
            prop_assert_eq!(a.new_count, new_station_count(s, &avg, &policy));
            prop_assert_eq!(a.clamped_count, s.clamped_station_count());
        }
    }
}
