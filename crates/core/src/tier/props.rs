//! Property-based tests for the tier calculator.

use proptest::prelude::*;

use super::{Tier, TierCalculator, TierThresholds};

/// Strategy for valid, strictly increasing thresholds.
fn arb_thresholds() -> impl Strategy<Value = TierThresholds> {
    (1u32..20, 1u32..20, 1u32..20).prop_map(|(a, b, c)| {
        TierThresholds::new(a, a + b, a + b + c).unwrap()
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// More successful events never means a lower tier.
    #[test]
    fn prop_compute_is_monotonic(t in arb_thresholds(), a in 0u32..100, b in 0u32..100) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(TierCalculator::compute(lo, &t) <= TierCalculator::compute(hi, &t));
    }

    /// Recompute never drops below the committed tier.
    #[test]
    fn prop_recompute_never_downgrades(
        t in arb_thresholds(),
        count in 0u32..100,
        current in prop::sample::select(Tier::ALL.to_vec()),
    ) {
        let next = TierCalculator::recompute(current, count, &t);
        prop_assert!(next >= current);
        prop_assert!(next >= TierCalculator::compute(count, &t));
    }

    /// Each threshold is the exact boundary of its tier.
    #[test]
    fn prop_thresholds_are_boundaries(t in arb_thresholds()) {
        prop_assert_eq!(TierCalculator::compute(t.silver() - 1, &t), Tier::Bronze);
        prop_assert_eq!(TierCalculator::compute(t.silver(), &t), Tier::Silver);
        prop_assert_eq!(TierCalculator::compute(t.gold(), &t), Tier::Gold);
        prop_assert_eq!(TierCalculator::compute(t.platinum(), &t), Tier::Platinum);
    }
}
