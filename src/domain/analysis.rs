//! Signal-series statistics.
//!
//! Summarises a signal frame: how often the signal is active, how often
//! price breaks each band, how wide the envelope runs, and a rough trade
//! count derived from signal changes.

use chrono::NaiveDate;

use super::signal::Signal;

/// Stand-in divisor for a zero upper band when computing band width.
const ZERO_UPPER_SUBSTITUTE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisRow {
    pub date: NaiveDate,
    pub close: Option<f64>,
    pub signal: Option<Signal>,
    pub upper: Option<f64>,
    pub lower: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WidthStats {
    pub mean: f64,
    pub median: f64,
    pub std: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignalMetrics {
    pub total_days: usize,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub active_signals: usize,
    pub signal_ratio: f64,
    pub upper_breakouts: usize,
    pub lower_breakouts: usize,
    pub width_stats: WidthStats,
    pub total_trades: usize,
    pub avg_holding_days: f64,
}

impl SignalMetrics {
    pub fn upper_breakout_ratio(&self) -> f64 {
        ratio(self.upper_breakouts, self.total_days)
    }

    pub fn lower_breakout_ratio(&self) -> f64 {
        ratio(self.lower_breakouts, self.total_days)
    }
}

fn ratio(count: usize, total: usize) -> f64 {
    if total > 0 {
        count as f64 / total as f64
    } else {
        0.0
    }
}

/// (upper - lower) / upper, with a zero upper band replaced by a tiny positive value.
pub fn band_width(upper: f64, lower: f64) -> f64 {
    let base = if upper == 0.0 {
        ZERO_UPPER_SUBSTITUTE
    } else {
        upper
    };
    (upper - lower) / base
}

fn width_stats(mut widths: Vec<f64>) -> WidthStats {
    if widths.is_empty() {
        return WidthStats::default();
    }
    let n = widths.len();
    let mean = widths.iter().sum::<f64>() / n as f64;

    widths.sort_by(|a, b| a.total_cmp(b));
    let median = if n % 2 == 1 {
        widths[n / 2]
    } else {
        (widths[n / 2 - 1] + widths[n / 2]) / 2.0
    };

    let std = if n > 1 {
        let var = widths.iter().map(|w| (w - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
        var.sqrt()
    } else {
        0.0
    };

    WidthStats { mean, median, std }
}

pub fn analyze(rows: &[AnalysisRow]) -> SignalMetrics {
    let total_days = rows.len();
    // missing signals count as flat
    let signals: Vec<Signal> = rows
        .iter()
        .map(|r| r.signal.unwrap_or(Signal::Flat))
        .collect();

    let active_signals = signals.iter().filter(|s| **s != Signal::Flat).count();

    let mut upper_breakouts = 0usize;
    let mut lower_breakouts = 0usize;
    let mut widths = Vec::with_capacity(total_days);

    for row in rows {
        if let (Some(close), Some(upper)) = (row.close, row.upper) {
            if close > upper {
                upper_breakouts += 1;
            }
        }
        if let (Some(close), Some(lower)) = (row.close, row.lower) {
            if close < lower {
                lower_breakouts += 1;
            }
        }
        if let (Some(upper), Some(lower)) = (row.upper, row.lower) {
            let w = band_width(upper, lower);
            if w.is_finite() {
                widths.push(w);
            }
        }
    }

    let signal_changes = signals.windows(2).filter(|w| w[0] != w[1]).count();
    let total_trades = signal_changes / 2;
    let avg_holding_days = if total_trades > 0 {
        total_days as f64 / total_trades as f64
    } else {
        0.0
    };

    SignalMetrics {
        total_days,
        start_date: rows.first().map(|r| r.date),
        end_date: rows.last().map(|r| r.date),
        active_signals,
        signal_ratio: ratio(active_signals, total_days),
        upper_breakouts,
        lower_breakouts,
        width_stats: width_stats(widths),
        total_trades,
        avg_holding_days,
    }
}
