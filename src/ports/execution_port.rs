//! Order execution port trait.
//!
//! The decision function never talks to a broker directly. The backtest
//! loop turns decisions into [`OrderRequest`]s and hands them to whatever
//! implements [`ExecutionPort`].

use chrono::NaiveDate;

use crate::domain::error::BandtraderError;
use crate::domain::strategy::Action;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderRequest {
    pub date: NaiveDate,
    pub action: Action,
    pub size: u64,
    /// Decision price, before any slippage.
    pub price: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fill {
    pub date: NaiveDate,
    pub action: Action,
    pub size: u64,
    pub price: f64,
}

pub trait ExecutionPort {
    /// Equity the sizing rule works from.
    fn equity(&self) -> f64;

    /// Execute an order. `BandtraderError::OrderRejected` means the order
    /// was refused and nothing changed; any other error aborts the run.
    fn submit(&mut self, order: &OrderRequest) -> Result<Fill, BandtraderError>;
}
