//! Envelope breakout strategy: the per-date decision function.
//!
//! `decide` is called once per date in chronological order. The carried
//! [`StrategyState`] goes in by value and comes back updated inside the
//! [`Evaluation`], so any single step can be replayed in isolation.
//!
//! Two states: Flat and Long. Flat + signal +1 enters long with a risk-sized
//! quantity; Long + signal -1 exits the full position; everything else holds.

use chrono::NaiveDate;
use std::fmt;

use super::error::BandtraderError;
use super::signal::Signal;

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyParams {
    pub risk_per_trade: f64,
    pub max_price_change: f64,
    pub min_position: u64,
    /// Price-offset fraction applied by the execution side, not by `decide`.
    pub slippage: f64,
}

impl Default for StrategyParams {
    fn default() -> Self {
        StrategyParams {
            risk_per_trade: 0.002,
            max_price_change: 0.05,
            min_position: 100,
            slippage: 0.001,
        }
    }
}

impl StrategyParams {
    pub fn validate(&self) -> Result<(), BandtraderError> {
        if !(self.risk_per_trade > 0.0 && self.risk_per_trade < 1.0) {
            return Err(BandtraderError::config_invalid(
                "strategy",
                "risk_per_trade",
                "risk_per_trade must lie strictly between 0 and 1",
            ));
        }
        if !(self.max_price_change.is_finite() && self.max_price_change > 0.0) {
            return Err(BandtraderError::config_invalid(
                "strategy",
                "max_price_change",
                "max_price_change must be positive",
            ));
        }
        if !(self.slippage.is_finite() && self.slippage >= 0.0) {
            return Err(BandtraderError::config_invalid(
                "strategy",
                "slippage",
                "slippage must be non-negative",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Holding {
    Flat,
    Long { entry_price: f64, size: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrategyState {
    pub holding: Holding,
    pub last_price: Option<f64>,
}

impl Default for StrategyState {
    fn default() -> Self {
        StrategyState {
            holding: Holding::Flat,
            last_price: None,
        }
    }
}

impl StrategyState {
    pub fn position_open(&self) -> bool {
        matches!(self.holding, Holding::Long { .. })
    }
}

/// One row of decision input. `None` marks a missing cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecisionInput {
    pub date: NaiveDate,
    pub price: Option<f64>,
    pub upper: Option<f64>,
    pub lower: Option<f64>,
    pub signal: Option<Signal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    EnterLong,
    Exit,
    HoldNone,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::EnterLong => write!(f, "enter_long"),
            Action::Exit => write!(f, "exit"),
            Action::HoldNone => write!(f, "hold_none"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionDecision {
    pub date: NaiveDate,
    pub action: Action,
    pub size: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum SizingError {
    #[error("broker equity {equity} is not positive")]
    InvalidEquity { equity: f64 },

    #[error("risk amount {risk_amount} at price {price} gives no finite quantity")]
    NonFiniteQuantity { risk_amount: f64, price: f64 },

    #[error("risk amount {risk_amount} at price {price} sizes to zero units")]
    ZeroQuantity { risk_amount: f64, price: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFault {
    MissingPrice,
    MissingUpper,
    MissingLower,
    MissingSignal,
    BadPrice,
    BadUpper,
    BadLower,
}

impl fmt::Display for DataFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DataFault::MissingPrice => "missing price",
            DataFault::MissingUpper => "missing upper band",
            DataFault::MissingLower => "missing lower band",
            DataFault::MissingSignal => "missing signal",
            DataFault::BadPrice => "non-positive or non-finite price",
            DataFault::BadUpper => "non-positive or non-finite upper band",
            DataFault::BadLower => "non-positive or non-finite lower band",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HoldReason {
    /// Inputs were valid but no transition fired.
    Idle,
    InvalidData(DataFault),
    PriceSpike { change: f64 },
    SizingFailed(SizingError),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decision {
    EnterLong { size: u64 },
    Exit { size: u64 },
    Hold(HoldReason),
}

impl Decision {
    pub fn action(&self) -> Action {
        match self {
            Decision::EnterLong { .. } => Action::EnterLong,
            Decision::Exit { .. } => Action::Exit,
            Decision::Hold(_) => Action::HoldNone,
        }
    }

    pub fn size(&self) -> u64 {
        match self {
            Decision::EnterLong { size } | Decision::Exit { size } => *size,
            Decision::Hold(_) => 0,
        }
    }

    pub fn to_position(&self, date: NaiveDate) -> PositionDecision {
        PositionDecision {
            date,
            action: self.action(),
            size: self.size(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub state: StrategyState,
    pub decision: Decision,
}

/// Risk-sized quantity: max(floor(equity * risk_per_trade / price), min_position).
///
/// `min_position` is a hard floor and may exceed the risk budget.
pub fn position_size(
    broker_equity: f64,
    price: f64,
    params: &StrategyParams,
) -> Result<u64, SizingError> {
    if !(broker_equity.is_finite() && broker_equity > 0.0) {
        return Err(SizingError::InvalidEquity {
            equity: broker_equity,
        });
    }
    let risk_amount = broker_equity * params.risk_per_trade;
    let raw = (risk_amount / price).floor();
    if !raw.is_finite() || raw < 0.0 {
        return Err(SizingError::NonFiniteQuantity { risk_amount, price });
    }
    let size = (raw as u64).max(params.min_position);
    if size == 0 {
        return Err(SizingError::ZeroQuantity { risk_amount, price });
    }
    Ok(size)
}

fn check_inputs(input: &DecisionInput) -> Result<(f64, Signal), DataFault> {
    fn usable(v: f64) -> bool {
        v.is_finite() && v > 0.0
    }

    let price = input.price.ok_or(DataFault::MissingPrice)?;
    let upper = input.upper.ok_or(DataFault::MissingUpper)?;
    let lower = input.lower.ok_or(DataFault::MissingLower)?;
    if !usable(price) {
        return Err(DataFault::BadPrice);
    }
    if !usable(upper) {
        return Err(DataFault::BadUpper);
    }
    if !usable(lower) {
        return Err(DataFault::BadLower);
    }
    let signal = input.signal.ok_or(DataFault::MissingSignal)?;
    Ok((price, signal))
}

pub fn decide(
    state: StrategyState,
    input: &DecisionInput,
    broker_equity: f64,
    params: &StrategyParams,
) -> Evaluation {
    let (price, signal) = match check_inputs(input) {
        Ok(v) => v,
        Err(fault) => {
            tracing::debug!(date = %input.date, %fault, "skipping day");
            return Evaluation {
                state,
                decision: Decision::Hold(HoldReason::InvalidData(fault)),
            };
        }
    };

    let mut next = state;
    next.last_price = Some(price);

    if let Some(last) = state.last_price {
        let change = (price - last).abs() / last;
        if change > params.max_price_change {
            tracing::debug!(date = %input.date, change, "price change above limit");
            return Evaluation {
                state: next,
                decision: Decision::Hold(HoldReason::PriceSpike { change }),
            };
        }
    }

    let decision = match (state.holding, signal) {
        (Holding::Flat, Signal::Long) => match position_size(broker_equity, price, params) {
            Ok(size) => {
                next.holding = Holding::Long {
                    entry_price: price,
                    size,
                };
                Decision::EnterLong { size }
            }
            Err(e) => {
                tracing::warn!(date = %input.date, error = %e, "position sizing failed");
                Decision::Hold(HoldReason::SizingFailed(e))
            }
        },
        (Holding::Long { size, .. }, Signal::Short) => {
            next.holding = Holding::Flat;
            Decision::Exit { size }
        }
        _ => Decision::Hold(HoldReason::Idle),
    };

    Evaluation {
        state: next,
        decision,
    }
}
