//! Property-based tests for fixed-point arithmetic.
//!
//! These verify the rounding contracts hold under random inputs, not just
//! the hand-picked vectors in the unit tests.

use keel_core::{Amount, SCALE};
use proptest::prelude::*;

fn amount_strategy() -> impl Strategy<Value = Amount> {
    (1i64..1_000_000_000_000i64).prop_map(Amount::from_scaled)
}

proptest! {
    /// Decimal round trip stays within one scaled unit for values with at
    /// most 8 fractional digits.
    #[test]
    fn decimal_round_trip(scaled in 0i64..1_000_000_000_000i64) {
        let amount = Amount::from_scaled(scaled);
        let back = Amount::from_decimal(amount.to_decimal());
        let drift = (back.scaled() - scaled).abs();
        prop_assert!(drift <= 1, "drift {} for {}", drift, scaled);
    }

    /// Wire-string round trip is exact: formatting and reparsing an amount
    /// never changes it.
    #[test]
    fn wire_string_round_trip(scaled in -1_000_000_000_000i64..1_000_000_000_000i64) {
        let amount = Amount::from_scaled(scaled);
        let back: Amount = amount.to_string().parse().unwrap();
        prop_assert_eq!(back, amount);
    }

    /// Multiply truncates: the result never exceeds the exact product.
    #[test]
    fn multiply_never_overstates(a in amount_strategy(), b in amount_strategy()) {
        let exact = i128::from(a.scaled()) * i128::from(b.scaled());
        let got = i128::from(a.multiply(b).scaled()) * i128::from(SCALE);
        prop_assert!(got <= exact);
        prop_assert!(exact - got < i128::from(SCALE));
    }

    /// Divide rounds to the nearest representable quantity: reconstructing
    /// the notional from the quotient lands within half a divisor of the
    /// original.
    #[test]
    fn divide_rounds_to_nearest(a in amount_strategy(), b in amount_strategy()) {
        let q = a.divide(b).unwrap();
        let reconstructed = i128::from(q.scaled()) * i128::from(b.scaled());
        let exact = i128::from(a.scaled()) * i128::from(SCALE);
        let error = (reconstructed - exact).abs();
        // |q*b - a*SCALE| <= b/2 + rounding slack of one divisor unit
        prop_assert!(error <= i128::from(b.scaled()) / 2 + i128::from(b.scaled()) % 2);
    }

    /// divide(multiply(a, p), p) returns to within one scaled unit of a.
    #[test]
    fn multiply_divide_inverse(a in amount_strategy(), p in amount_strategy()) {
        let notional = a.multiply(p);
        // Skip degenerate cases where the notional truncated to zero.
        prop_assume!(notional.is_positive());
        let back = notional.divide(p).unwrap();
        let drift = i128::from((back - a).scaled()).abs();
        // One truncation plus one rounding step, each bounded by SCALE/p.
        let bound = 2 * (i128::from(SCALE) / i128::from(p.scaled()) + 1);
        prop_assert!(drift <= bound, "drift {} bound {}", drift, bound);
    }
}
