use rust_decimal::prelude::*;
use rust_decimal::Decimal;

/// The five percentile points the benchmark tables track.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Percentiles {
    pub p10: Decimal,
    pub p25: Decimal,
    pub p50: Decimal,
    pub p75: Decimal,
    pub p90: Decimal,
}

/// Nearest-rank percentile: the value at rank `ceil(p/100 * n)` of the
/// sorted list (1-based).
fn nearest_rank(sorted: &[Decimal], p: u32) -> Decimal {
    let n = sorted.len();
    let rank = (Decimal::from(p) / Decimal::from(100) * Decimal::from(n))
        .ceil()
        .to_usize()
        .unwrap_or(1)
        .clamp(1, n);
    sorted[rank - 1]
}

/// Computes p10/p25/p50/p75/p90 over a value list via nearest rank.
/// Returns `None` for an empty list; callers treat that as insufficient data.
pub fn percentiles(values: &[Decimal]) -> Option<Percentiles> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort();

    Some(Percentiles {
        p10: nearest_rank(&sorted, 10),
        p25: nearest_rank(&sorted, 25),
        p50: nearest_rank(&sorted, 50),
        p75: nearest_rank(&sorted, 75),
        p90: nearest_rank(&sorted, 90),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn empty_list_has_no_percentiles() {
        assert!(percentiles(&[]).is_none());
    }

    #[test]
    fn single_value_is_every_percentile() {
        let p = percentiles(&[dec!(42)]).unwrap();
        assert_eq!(p.p10, dec!(42));
        assert_eq!(p.p50, dec!(42));
        assert_eq!(p.p90, dec!(42));
    }

    #[test]
    fn nearest_rank_over_ten_values() {
        // 10..=100 in steps of 10, shuffled to prove sorting.
        let values = vec![
            dec!(50),
            dec!(10),
            dec!(90),
            dec!(30),
            dec!(70),
            dec!(20),
            dec!(100),
            dec!(40),
            dec!(80),
            dec!(60),
        ];
        let p = percentiles(&values).unwrap();
        // rank = ceil(p/100 * 10): p10 -> rank 1, p25 -> rank 3, p50 -> rank 5.
        assert_eq!(p.p10, dec!(10));
        assert_eq!(p.p25, dec!(30));
        assert_eq!(p.p50, dec!(50));
        assert_eq!(p.p75, dec!(80));
        assert_eq!(p.p90, dec!(90));
    }

    #[test]
    fn three_values_map_to_defined_ranks() {
        let p = percentiles(&[dec!(1), dec!(2), dec!(3)]).unwrap();
        // n = 3: p10 -> rank 1, p50 -> rank 2, p90 -> rank 3.
        assert_eq!(p.p10, dec!(1));
        assert_eq!(p.p50, dec!(2));
        assert_eq!(p.p90, dec!(3));
    }
}
