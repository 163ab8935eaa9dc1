//! Breakout signal generation.
//!
//! Per date: +1 if close > upper, -1 if close < lower, else 0. Strict
//! inequalities, no lookback memory.

use chrono::NaiveDate;
use std::collections::HashMap;
use std::fmt;

use super::indicator::adaptive_envelope::{self, EnvelopeRecord};
use super::price::{Observation, PricePoint};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    Long,
    Flat,
    Short,
}

impl Signal {
    pub fn classify(close: f64, upper: f64, lower: f64) -> Self {
        if close > upper {
            Signal::Long
        } else if close < lower {
            Signal::Short
        } else {
            Signal::Flat
        }
    }

    pub fn as_i8(self) -> i8 {
        match self {
            Signal::Long => 1,
            Signal::Flat => 0,
            Signal::Short => -1,
        }
    }

    pub fn from_i64(value: i64) -> Option<Self> {
        match value {
            1 => Some(Signal::Long),
            0 => Some(Signal::Flat),
            -1 => Some(Signal::Short),
            _ => None,
        }
    }

    /// Parse a CSV cell such as `1`, `-1`, `0` or `1.0`.
    pub fn parse(cell: &str) -> Option<Self> {
        let trimmed = cell.trim();
        if let Ok(v) = trimmed.parse::<i64>() {
            return Self::from_i64(v);
        }
        let v = trimmed.parse::<f64>().ok()?;
        if v.fract() != 0.0 {
            return None;
        }
        Self::from_i64(v as i64)
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_i8())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalRecord {
    pub date: NaiveDate,
    pub signal: Signal,
}

/// Signals over the dates present in all three series, in price order.
pub fn generate(
    prices: &[PricePoint],
    upper_band: &[Observation],
    lower_band: &[Observation],
) -> Vec<SignalRecord> {
    let upper: HashMap<NaiveDate, f64> = upper_band.iter().map(|o| (o.date, o.value)).collect();
    let lower: HashMap<NaiveDate, f64> = lower_band.iter().map(|o| (o.date, o.value)).collect();

    prices
        .iter()
        .filter_map(|p| {
            let up = upper.get(&p.date)?;
            let lo = lower.get(&p.date)?;
            Some(SignalRecord {
                date: p.date,
                signal: Signal::classify(p.close, *up, *lo),
            })
        })
        .collect()
}

/// Convenience wrapper pairing prices with computed envelope records.
pub fn generate_from_envelope(
    prices: &[PricePoint],
    records: &[EnvelopeRecord],
) -> Vec<SignalRecord> {
    generate(
        prices,
        &adaptive_envelope::upper_band(records),
        &adaptive_envelope::lower_band(records),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, day).unwrap()
    }

    #[test]
    fn classify_strict_inequalities() {
        assert_eq!(Signal::classify(11.0, 10.5, 9.5), Signal::Long);
        assert_eq!(Signal::classify(9.0, 10.5, 9.5), Signal::Short);
        assert_eq!(Signal::classify(10.0, 10.5, 9.5), Signal::Flat);
        assert_eq!(Signal::classify(10.5, 10.5, 9.5), Signal::Flat);
        assert_eq!(Signal::classify(9.5, 10.5, 9.5), Signal::Flat);
    }

    #[test]
    fn numeric_round_trip() {
        for s in [Signal::Long, Signal::Flat, Signal::Short] {
            assert_eq!(Signal::from_i64(s.as_i8() as i64), Some(s));
        }
        assert_eq!(Signal::from_i64(2), None);
    }

    #[test]
    fn parse_cells() {
        assert_eq!(Signal::parse("1"), Some(Signal::Long));
        assert_eq!(Signal::parse(" -1 "), Some(Signal::Short));
        assert_eq!(Signal::parse("0.0"), Some(Signal::Flat));
        assert_eq!(Signal::parse("1.0"), Some(Signal::Long));
        assert_eq!(Signal::parse("0.5"), None);
        assert_eq!(Signal::parse("buy"), None);
        assert_eq!(Signal::parse(""), None);
    }

    #[test]
    fn display_as_number() {
        assert_eq!(Signal::Short.to_string(), "-1");
        assert_eq!(Signal::Long.to_string(), "1");
    }

    #[test]
    fn generate_uses_date_intersection() {
        let prices = vec![
            PricePoint::new(d(1), 12.0),
            PricePoint::new(d(2), 8.0),
            PricePoint::new(d(3), 10.0),
            PricePoint::new(d(4), 10.0),
        ];
        let upper = vec![
            Observation::new(d(1), 11.0),
            Observation::new(d(2), 11.0),
            Observation::new(d(3), 11.0),
        ];
        let lower = vec![
            Observation::new(d(2), 9.0),
            Observation::new(d(3), 9.0),
            Observation::new(d(4), 9.0),
        ];
        let signals = generate(&prices, &upper, &lower);
        assert_eq!(
            signals,
            vec![
                SignalRecord {
                    date: d(2),
                    signal: Signal::Short
                },
                SignalRecord {
                    date: d(3),
                    signal: Signal::Flat
                },
            ]
        );
    }

    #[test]
    fn generate_from_envelope_records() {
        let prices = vec![PricePoint::new(d(1), 10.2), PricePoint::new(d(2), 11.0)];
        let records = vec![
            EnvelopeRecord {
                date: d(1),
                base: 10.0,
                envelope_pct: 0.01,
                upper: 10.1,
                lower: 9.9,
            },
            EnvelopeRecord {
                date: d(2),
                base: 10.2,
                envelope_pct: 0.05,
                upper: 10.71,
                lower: 9.69,
            },
        ];
        let signals = generate_from_envelope(&prices, &records);
        assert_eq!(signals[0].signal, Signal::Long);
        assert_eq!(signals[1].signal, Signal::Long);
    }
}
