//! Frame-level pipeline stages.
//!
//! Each stage reads typed series out of a [`Frame`], runs the domain
//! computation and writes its results back as string columns, keeping
//! every input column. Rows the computation drops are dropped here too.

use super::analysis::AnalysisRow;
use super::columns::ColumnMap;
use super::error::BandtraderError;
use super::frame::{format_value, Frame};
use super::indicator::adaptive_envelope::{self, EnvelopeParams};
use super::indicator::fixed_envelope::compute_fixed;
use super::price::{Observation, PricePoint};
use super::signal::{self, Signal};
use super::strategy::DecisionInput;

fn rows_for(frame: &Frame, dates: impl Iterator<Item = chrono::NaiveDate>) -> Vec<usize> {
    dates.filter_map(|d| frame.row_of(d)).collect()
}

fn column<T>(name: &str, items: &[T], value: impl Fn(&T) -> f64) -> (String, Vec<String>) {
    (
        name.to_string(),
        items.iter().map(|r| format_value(value(r))).collect(),
    )
}

/// Adaptive envelope: adds base, upper, lower and envelope-percentage columns.
pub fn envelope_frame(
    frame: &Frame,
    columns: &ColumnMap,
    params: &EnvelopeParams,
) -> Result<Frame, BandtraderError> {
    let prices = frame.prices(&columns.close)?;
    let records = adaptive_envelope::compute(&prices, params)?;
    let rows = rows_for(frame, records.iter().map(|r| r.date));
    Ok(frame.select_with(
        &rows,
        vec![
            column(&columns.base, &records, |r| r.base),
            column(&columns.upper, &records, |r| r.upper),
            column(&columns.lower, &records, |r| r.lower),
            column(&columns.envelope_pct, &records, |r| r.envelope_pct),
        ],
    ))
}

/// Fixed-percentage envelope: adds base, upper, lower and band-width columns.
pub fn fixed_envelope_frame(
    frame: &Frame,
    columns: &ColumnMap,
    window: usize,
    band_pct: f64,
) -> Result<Frame, BandtraderError> {
    let prices = frame.prices(&columns.close)?;
    let records = compute_fixed(&prices, window, band_pct)?;
    let rows = rows_for(frame, records.iter().map(|r| r.date));
    Ok(frame.select_with(
        &rows,
        vec![
            column(&columns.base, &records, |r| r.base),
            column(&columns.upper, &records, |r| r.upper),
            column(&columns.lower, &records, |r| r.lower),
            column(&columns.band_width, &records, |r| r.band_width),
        ],
    ))
}

/// Breakout signals from the close and band columns. Rows missing any of
/// the three values are dropped.
pub fn signal_frame(frame: &Frame, columns: &ColumnMap) -> Result<Frame, BandtraderError> {
    frame.require(&[
        columns.close.as_str(),
        columns.upper.as_str(),
        columns.lower.as_str(),
    ])?;
    let closes = frame.optional_numeric(&columns.close)?;
    let uppers = frame.optional_numeric(&columns.upper)?;
    let lowers = frame.optional_numeric(&columns.lower)?;

    let dates = frame.dates();
    let prices: Vec<PricePoint> = dates
        .iter()
        .zip(&closes)
        .filter_map(|(d, c)| c.map(|c| PricePoint::new(*d, c)))
        .collect();
    let observed = |values: &[Option<f64>]| -> Vec<Observation> {
        dates
            .iter()
            .zip(values)
            .filter_map(|(d, v)| v.map(|v| Observation::new(*d, v)))
            .collect()
    };

    let signals = signal::generate(&prices, &observed(&uppers[..]), &observed(&lowers[..]));
    let dropped = frame.len() - signals.len();
    if dropped > 0 {
        tracing::debug!(dropped, "rows without close or bands skipped");
    }

    let rows = rows_for(frame, signals.iter().map(|s| s.date));
    Ok(frame.select_with(
        &rows,
        vec![(
            columns.signal.clone(),
            signals.iter().map(|s| s.signal.to_string()).collect(),
        )],
    ))
}

fn signal_column(frame: &Frame, name: &str) -> Result<Vec<Option<Signal>>, BandtraderError> {
    let idx = frame.require(&[name])?[0];
    (0..frame.len())
        .map(|i| {
            let cell = frame.row(i).map(|r| r[idx].trim()).unwrap_or_default();
            if cell.is_empty() || cell.eq_ignore_ascii_case("nan") {
                return Ok(None);
            }
            Signal::parse(cell)
                .map(Some)
                .ok_or_else(|| BandtraderError::InvalidValue {
                    date: frame.dates()[i],
                    column: name.to_string(),
                    value: cell.to_string(),
                })
        })
        .collect()
}

fn optional_column(frame: &Frame, name: &str) -> Result<Vec<Option<f64>>, BandtraderError> {
    if frame.has_column(name) {
        frame.optional_numeric(name)
    } else {
        Ok(vec![None; frame.len()])
    }
}

/// Per-day inputs for the decision function. Blank cells become `None` so
/// the strategy can classify them as invalid data.
pub fn decision_inputs(
    frame: &Frame,
    columns: &ColumnMap,
) -> Result<Vec<DecisionInput>, BandtraderError> {
    frame.require(&[
        columns.close.as_str(),
        columns.upper.as_str(),
        columns.lower.as_str(),
        columns.signal.as_str(),
    ])?;
    let closes = frame.optional_numeric(&columns.close)?;
    let uppers = frame.optional_numeric(&columns.upper)?;
    let lowers = frame.optional_numeric(&columns.lower)?;
    let signals = signal_column(frame, &columns.signal)?;

    Ok(frame
        .dates()
        .iter()
        .enumerate()
        .map(|(i, date)| DecisionInput {
            date: *date,
            price: closes[i],
            upper: uppers[i],
            lower: lowers[i],
            signal: signals[i],
        })
        .collect())
}

/// Rows for signal analysis. Band columns are optional.
pub fn analysis_rows(
    frame: &Frame,
    columns: &ColumnMap,
) -> Result<Vec<AnalysisRow>, BandtraderError> {
    frame.require(&[columns.close.as_str(), columns.signal.as_str()])?;
    let closes = frame.optional_numeric(&columns.close)?;
    let signals = signal_column(frame, &columns.signal)?;
    let uppers = optional_column(frame, &columns.upper)?;
    let lowers = optional_column(frame, &columns.lower)?;

    Ok(frame
        .dates()
        .iter()
        .enumerate()
        .map(|(i, date)| AnalysisRow {
            date: *date,
            close: closes[i],
            signal: signals[i],
            upper: uppers[i],
            lower: lowers[i],
        })
        .collect())
}
