//! Capital allocation across the configured pairs.

use crate::config::PairConfig;
use keel_core::Amount;

/// Divide the capital budget evenly across pairs, in scaled-integer space.
///
/// Any indivisible remainder stays unallocated: better a few units idle
/// than a pair overspending its share. Each engine instance tracks its own
/// commitments from there.
pub fn allocate(capital: Amount, pairs: &[PairConfig]) -> Vec<(PairConfig, Amount)> {
    if pairs.is_empty() {
        return Vec::new();
    }
    let portion = Amount::from_scaled(capital.scaled() / pairs.len() as i64);
    pairs.iter().map(|pair| (pair.clone(), portion)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(base: &str) -> PairConfig {
        PairConfig {
            base_currency: base.to_string(),
            quoted_currency: "BTC".to_string(),
        }
    }

    #[test]
    fn test_even_split() {
        let pairs = vec![pair("ETH"), pair("LTC"), pair("XMR")];
        let allocations = allocate(Amount::from_scaled(900_000), &pairs);
        assert_eq!(allocations.len(), 3);
        for (_, portion) in &allocations {
            assert_eq!(*portion, Amount::from_scaled(300_000));
        }
    }

    #[test]
    fn test_remainder_stays_unallocated() {
        let pairs = vec![pair("ETH"), pair("LTC"), pair("XMR")];
        let allocations = allocate(Amount::from_scaled(1_000_000), &pairs);
        let total: Amount = allocations.iter().map(|(_, p)| *p).sum();
        assert_eq!(total, Amount::from_scaled(999_999));
    }

    #[test]
    fn test_no_pairs_no_allocations() {
        assert!(allocate(Amount::from_scaled(1_000_000), &[]).is_empty());
    }
}
