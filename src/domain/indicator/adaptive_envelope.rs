//! Volatility-adaptive moving-average envelope.
//!
//! BASE[t]  = mean(close[t-base_window+1..=t])
//! RET[t]   = close[t] / close[t-1] - 1
//! VOL[t]   = sample std of RET over the trailing vol_window returns
//! PCT[t]   = clamp(VOL[t] * scale_factor, clip_min, clip_max)
//! UPPER[t] = BASE[t] * (1 + PCT[t]),  LOWER[t] = BASE[t] * (1 - PCT[t])
//!
//! Dates where any term is undefined are dropped, so the first record sits at
//! index max(base_window - 1, vol_window).

use chrono::NaiveDate;

use super::rolling::{rolling_mean, rolling_sample_std};
use crate::domain::error::BandtraderError;
use crate::domain::price::{pct_change, Observation, PricePoint};

#[derive(Debug, Clone, PartialEq)]
pub struct EnvelopeParams {
    pub base_window: usize,
    pub vol_window: usize,
    pub scale_factor: f64,
    pub clip_min: f64,
    pub clip_max: f64,
}

impl Default for EnvelopeParams {
    fn default() -> Self {
        EnvelopeParams {
            base_window: 20,
            vol_window: 20,
            scale_factor: 2.0,
            clip_min: 0.01,
            clip_max: 0.05,
        }
    }
}

impl EnvelopeParams {
    pub fn validate(&self) -> Result<(), BandtraderError> {
        if self.base_window == 0 {
            return Err(BandtraderError::config_invalid(
                "envelope",
                "base_window",
                "base_window must be positive",
            ));
        }
        if self.vol_window < 2 {
            return Err(BandtraderError::config_invalid(
                "envelope",
                "vol_window",
                "vol_window must be at least 2 (sample deviation needs two returns)",
            ));
        }
        if !(self.scale_factor.is_finite() && self.scale_factor > 0.0) {
            return Err(BandtraderError::config_invalid(
                "envelope",
                "scale_factor",
                "scale_factor must be a positive number",
            ));
        }
        let in_unit = |v: f64| v > 0.0 && v < 1.0;
        if !(in_unit(self.clip_min) && in_unit(self.clip_max)) {
            return Err(BandtraderError::config_invalid(
                "envelope",
                "clip_range",
                "clip bounds must lie strictly between 0 and 1",
            ));
        }
        if self.clip_min >= self.clip_max {
            return Err(BandtraderError::config_invalid(
                "envelope",
                "clip_range",
                "clip_min must be below clip_max",
            ));
        }
        Ok(())
    }

    /// Index of the first date that can carry a record.
    pub fn warmup(&self) -> usize {
        (self.base_window.saturating_sub(1)).max(self.vol_window)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvelopeRecord {
    pub date: NaiveDate,
    pub base: f64,
    pub envelope_pct: f64,
    pub upper: f64,
    pub lower: f64,
}

pub fn compute(
    prices: &[PricePoint],
    params: &EnvelopeParams,
) -> Result<Vec<EnvelopeRecord>, BandtraderError> {
    params.validate()?;
    if prices.is_empty() {
        return Err(BandtraderError::EmptySeries {
            what: "close prices".into(),
        });
    }

    let closes: Vec<f64> = prices.iter().map(|p| p.close).collect();
    let base = rolling_mean(&closes, params.base_window);

    // Returns start at the second date; shift volatility back onto price indices.
    let returns = pct_change(prices);
    let mut volatility = Vec::with_capacity(prices.len());
    volatility.push(None);
    volatility.extend(rolling_sample_std(&returns, params.vol_window));

    let mut records = Vec::with_capacity(prices.len().saturating_sub(params.warmup()));
    for (i, point) in prices.iter().enumerate() {
        let (Some(base), Some(vol)) = (base[i], volatility[i]) else {
            continue;
        };
        let envelope_pct = (vol * params.scale_factor).clamp(params.clip_min, params.clip_max);
        if envelope_pct.is_nan() || !base.is_finite() {
            continue;
        }
        records.push(EnvelopeRecord {
            date: point.date,
            base,
            envelope_pct,
            upper: base * (1.0 + envelope_pct),
            lower: base * (1.0 - envelope_pct),
        });
    }

    Ok(records)
}

pub fn upper_band(records: &[EnvelopeRecord]) -> Vec<Observation> {
    records
        .iter()
        .map(|r| Observation::new(r.date, r.upper))
        .collect()
}

pub fn lower_band(records: &[EnvelopeRecord]) -> Vec<Observation> {
    records
        .iter()
        .map(|r| Observation::new(r.date, r.lower))
        .collect()
}
