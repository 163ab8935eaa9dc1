//! Configuration validation and typed reads.
//!
//! Each `read_*` function pulls one section out of a [`ConfigPort`],
//! falling back to the documented defaults for absent keys and rejecting
//! values that are present but malformed.

use std::str::FromStr;

use crate::domain::backtest::BacktestConfig;
use crate::domain::columns::ColumnMap;
use crate::domain::error::BandtraderError;
use crate::domain::indicator::EnvelopeParams;
use crate::domain::strategy::StrategyParams;
use crate::ports::config_port::ConfigPort;

const KNOWN_SECTIONS: [&str; 4] = ["envelope", "strategy", "backtest", "columns"];

/// Check every section a full pipeline run needs. Unknown sections are
/// reported but not fatal.
pub fn validate_config(config: &dyn ConfigPort) -> Result<(), BandtraderError> {
    for section in unknown_sections(config) {
        tracing::warn!(%section, "ignoring unknown config section");
    }
    read_envelope_params(config)?;
    read_strategy_params(config)?;
    read_backtest_config(config)?;
    read_column_map(config)?;
    Ok(())
}

pub fn read_envelope_params(config: &dyn ConfigPort) -> Result<EnvelopeParams, BandtraderError> {
    let defaults = EnvelopeParams::default();
    let (clip_min, clip_max) = match config.get_string("envelope", "clip_range") {
        Some(raw) => parse_clip_range(&raw)?,
        None => (defaults.clip_min, defaults.clip_max),
    };
    let params = EnvelopeParams {
        base_window: read_value(config, "envelope", "base_window", defaults.base_window)?,
        vol_window: read_value(config, "envelope", "vol_window", defaults.vol_window)?,
        scale_factor: read_value(config, "envelope", "scale_factor", defaults.scale_factor)?,
        clip_min,
        clip_max,
    };
    params.validate()?;
    Ok(params)
}

pub fn read_strategy_params(config: &dyn ConfigPort) -> Result<StrategyParams, BandtraderError> {
    let defaults = StrategyParams::default();
    let params = StrategyParams {
        risk_per_trade: read_value(config, "strategy", "risk_per_trade", defaults.risk_per_trade)?,
        max_price_change: read_value(
            config,
            "strategy",
            "max_price_change",
            defaults.max_price_change,
        )?,
        min_position: read_value(config, "strategy", "min_position", defaults.min_position)?,
        slippage: read_value(config, "strategy", "slippage", defaults.slippage)?,
    };
    params.validate()?;
    Ok(params)
}

pub fn read_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, BandtraderError> {
    let defaults = BacktestConfig::default();
    let bt = BacktestConfig {
        initial_equity: read_value(config, "backtest", "initial_equity", defaults.initial_equity)?,
    };
    bt.validate()?;
    Ok(bt)
}

pub fn read_column_map(config: &dyn ConfigPort) -> Result<ColumnMap, BandtraderError> {
    let defaults = ColumnMap::default();
    let map = ColumnMap {
        date: read_name(config, "date", defaults.date)?,
        close: read_name(config, "close", defaults.close)?,
        high: read_name(config, "high", defaults.high)?,
        low: read_name(config, "low", defaults.low)?,
        base: read_name(config, "base", defaults.base)?,
        upper: read_name(config, "upper", defaults.upper)?,
        lower: read_name(config, "lower", defaults.lower)?,
        signal: read_name(config, "signal", defaults.signal)?,
        envelope_pct: read_name(config, "envelope_pct", defaults.envelope_pct)?,
        band_width: read_name(config, "band_width", defaults.band_width)?,
    };

    let names = [
        ("close", &map.close),
        ("high", &map.high),
        ("low", &map.low),
        ("base", &map.base),
        ("upper", &map.upper),
        ("lower", &map.lower),
        ("signal", &map.signal),
        ("envelope_pct", &map.envelope_pct),
        ("band_width", &map.band_width),
    ];
    for (i, (key, name)) in names.iter().enumerate() {
        if **name == map.date {
            return Err(BandtraderError::config_invalid(
                "columns",
                key,
                "column name collides with the date column",
            ));
        }
        if names[..i].iter().any(|(_, other)| other == name) {
            return Err(BandtraderError::config_invalid(
                "columns",
                key,
                format!("column name '{}' is used twice", name),
            ));
        }
    }
    Ok(map)
}

pub fn unknown_sections(config: &dyn ConfigPort) -> Vec<String> {
    config
        .sections()
        .into_iter()
        .filter(|s| !KNOWN_SECTIONS.contains(&s.as_str()))
        .collect()
}

/// Parse `"min, max"` into a clip interval.
pub fn parse_clip_range(raw: &str) -> Result<(f64, f64), BandtraderError> {
    let invalid = || {
        BandtraderError::config_invalid(
            "envelope",
            "clip_range",
            format!("expected 'min, max', got '{}'", raw),
        )
    };
    let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
    if parts.len() != 2 {
        return Err(invalid());
    }
    let lo = parts[0].parse::<f64>().map_err(|_| invalid())?;
    let hi = parts[1].parse::<f64>().map_err(|_| invalid())?;
    Ok((lo, hi))
}

fn read_value<T: FromStr>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: T,
) -> Result<T, BandtraderError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse::<T>().map_err(|_| {
            BandtraderError::config_invalid(section, key, format!("cannot parse '{}'", raw))
        }),
    }
}

fn read_name(
    config: &dyn ConfigPort,
    key: &str,
    default: String,
) -> Result<String, BandtraderError> {
    match config.get_string("columns", key) {
        None => Ok(default),
        Some(raw) if raw.trim().is_empty() => Err(BandtraderError::config_invalid(
            "columns",
            key,
            "column name must not be empty",
        )),
        Some(raw) => Ok(raw.trim().to_string()),
    }
}
