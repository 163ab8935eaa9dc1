//! Constant-percentage moving-average envelope.
//!
//! BASE[t] = mean(close[t-window+1..=t]); UPPER/LOWER = BASE * (1 ± band_pct);
//! BAND_WIDTH = (UPPER - LOWER) / BASE. Warmup: first (window-1) dates dropped.

use chrono::NaiveDate;

use super::rolling::rolling_mean;
use crate::domain::error::BandtraderError;
use crate::domain::price::PricePoint;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedEnvelopeRecord {
    pub date: NaiveDate,
    pub base: f64,
    pub upper: f64,
    pub lower: f64,
    pub band_width: f64,
}

pub fn compute_fixed(
    prices: &[PricePoint],
    window: usize,
    band_pct: f64,
) -> Result<Vec<FixedEnvelopeRecord>, BandtraderError> {
    if window == 0 {
        return Err(BandtraderError::config_invalid(
            "envelope",
            "base_window",
            "base_window must be positive",
        ));
    }
    if !(band_pct > 0.0 && band_pct < 1.0) {
        return Err(BandtraderError::config_invalid(
            "envelope",
            "fixed_pct",
            "fixed band percentage must lie strictly between 0 and 1",
        ));
    }
    if prices.is_empty() {
        return Err(BandtraderError::EmptySeries {
            what: "close prices".into(),
        });
    }

    let closes: Vec<f64> = prices.iter().map(|p| p.close).collect();
    let records = rolling_mean(&closes, window)
        .into_iter()
        .zip(prices)
        .filter_map(|(base, point)| {
            let base = base.filter(|b| b.is_finite())?;
            let upper = base * (1.0 + band_pct);
            let lower = base * (1.0 - band_pct);
            Some(FixedEnvelopeRecord {
                date: point.date,
                base,
                upper,
                lower,
                band_width: (upper - lower) / base,
            })
        })
        .collect();

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn make_prices(closes: &[f64]) -> Vec<PricePoint> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| {
                PricePoint::new(NaiveDate::from_ymd_opt(2024, 1, (i + 1) as u32).unwrap(), c)
            })
            .collect()
    }

    #[test]
    fn fixed_bands() {
        let prices = make_prices(&[10.0, 20.0, 30.0, 40.0]);
        let records = compute_fixed(&prices, 3, 0.03).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].date, prices[2].date);
        assert_relative_eq!(records[0].base, 20.0);
        assert_relative_eq!(records[0].upper, 20.6, epsilon = 1e-12);
        assert_relative_eq!(records[0].lower, 19.4, epsilon = 1e-12);
        assert_relative_eq!(records[1].base, 30.0);
    }

    #[test]
    fn band_width_is_twice_pct() {
        let prices = make_prices(&[5.0, 6.0, 7.0, 8.0, 9.0]);
        for r in compute_fixed(&prices, 2, 0.02).unwrap() {
            assert_relative_eq!(r.band_width, 0.04, epsilon = 1e-12);
        }
    }

    #[test]
    fn rejects_bad_inputs() {
        let prices = make_prices(&[1.0, 2.0]);
        assert!(compute_fixed(&prices, 0, 0.02).is_err());
        assert!(compute_fixed(&prices, 2, 0.0).is_err());
        assert!(compute_fixed(&prices, 2, 1.0).is_err());
        assert!(matches!(
            compute_fixed(&[], 2, 0.02),
            Err(BandtraderError::EmptySeries { .. })
        ));
    }
}
