//! Price data quality checks run before the envelope pipeline.

use super::columns::ColumnMap;
use super::error::BandtraderError;
use super::frame::Frame;

/// Final adjusted closes below this suggest a broken price adjustment.
pub const MIN_FINAL_CLOSE: f64 = 0.1;

pub fn validate_integrity(frame: &Frame, columns: &ColumnMap) -> Result<(), BandtraderError> {
    check_not_empty(frame)?;
    check_closes(frame, columns)?;
    check_high_low(frame, columns)?;
    check_adjustment(frame, columns)?;
    Ok(())
}

fn check_not_empty(frame: &Frame) -> Result<(), BandtraderError> {
    if frame.is_empty() {
        return Err(BandtraderError::EmptySeries {
            what: "price data".into(),
        });
    }
    Ok(())
}

fn check_closes(frame: &Frame, columns: &ColumnMap) -> Result<(), BandtraderError> {
    let prices = frame.prices(&columns.close)?;
    if let Some(bad) = prices.iter().find(|p| !p.is_tradeable()) {
        return Err(BandtraderError::DataQuality {
            reason: format!("non-positive close {} on {}", bad.close, bad.date),
        });
    }
    Ok(())
}

fn check_high_low(frame: &Frame, columns: &ColumnMap) -> Result<(), BandtraderError> {
    if !(frame.has_column(&columns.high) && frame.has_column(&columns.low)) {
        return Ok(());
    }
    let highs = frame.optional_numeric(&columns.high)?;
    let lows = frame.optional_numeric(&columns.low)?;
    for ((date, high), low) in frame.dates().iter().zip(highs).zip(lows) {
        if let (Some(h), Some(l)) = (high, low) {
            if h < l {
                return Err(BandtraderError::DataQuality {
                    reason: format!("high {} below low {} on {}", h, l, date),
                });
            }
        }
    }
    Ok(())
}

fn check_adjustment(frame: &Frame, columns: &ColumnMap) -> Result<(), BandtraderError> {
    let closes = frame.numeric(&columns.close)?;
    if let Some(last) = closes.last() {
        if *last < MIN_FINAL_CLOSE {
            return Err(BandtraderError::DataQuality {
                reason: format!(
                    "final close {} below {}, suspected bad price adjustment",
                    last, MIN_FINAL_CLOSE
                ),
            });
        }
    }
    Ok(())
}
