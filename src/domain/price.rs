//! Dated price and band observations.

use chrono::NaiveDate;

/// One daily close. Series are ascending by date with no duplicates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self { date, close }
    }

    /// Usable as a decision input: finite and strictly positive.
    pub fn is_tradeable(&self) -> bool {
        self.close.is_finite() && self.close > 0.0
    }
}

/// A single dated value of a derived series (a band level, for instance).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub date: NaiveDate,
    pub value: f64,
}

impl Observation {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self { date, value }
    }
}

/// Simple percentage returns: close[t]/close[t-1] - 1, one shorter than the input.
pub fn pct_change(prices: &[PricePoint]) -> Vec<f64> {
    prices
        .windows(2)
        .map(|w| w[1].close / w[0].close - 1.0)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    #[test]
    fn tradeable_requires_positive_finite_close() {
        assert!(PricePoint::new(d(1), 10.0).is_tradeable());
        assert!(!PricePoint::new(d(1), 0.0).is_tradeable());
        assert!(!PricePoint::new(d(1), -1.0).is_tradeable());
        assert!(!PricePoint::new(d(1), f64::NAN).is_tradeable());
        assert!(!PricePoint::new(d(1), f64::INFINITY).is_tradeable());
    }

    #[test]
    fn pct_change_basic() {
        let prices = vec![
            PricePoint::new(d(1), 100.0),
            PricePoint::new(d(2), 110.0),
            PricePoint::new(d(3), 99.0),
        ];
        let r = pct_change(&prices);
        assert_eq!(r.len(), 2);
        assert!((r[0] - 0.1).abs() < 1e-12);
        assert!((r[1] - (-0.1)).abs() < 1e-12);
    }

    #[test]
    fn pct_change_single_point_is_empty() {
        assert!(pct_change(&[PricePoint::new(d(1), 5.0)]).is_empty());
    }

    #[test]
    fn pct_change_zero_close_is_not_rejected() {
        let prices = vec![PricePoint::new(d(1), 0.0), PricePoint::new(d(2), 1.0)];
        let r = pct_change(&prices);
        assert!(r[0].is_infinite());
    }
}
