//! Paper execution that fills every sane order at a slipped price.

use crate::domain::error::BandtraderError;
use crate::domain::strategy::Action;
use crate::ports::execution_port::{ExecutionPort, Fill, OrderRequest};

/// Fills at `price * (1 + slippage)` on entry and `price * (1 - slippage)` on
/// exit. Equity stays fixed; there is no cash or position bookkeeping.
pub struct RecordingExecution {
    equity: f64,
    slippage: f64,
}

impl RecordingExecution {
    pub fn new(equity: f64, slippage: f64) -> Self {
        Self { equity, slippage }
    }

    fn reject(order: &OrderRequest, reason: impl Into<String>) -> BandtraderError {
        BandtraderError::OrderRejected {
            date: order.date,
            reason: reason.into(),
        }
    }
}

impl ExecutionPort for RecordingExecution {
    fn equity(&self) -> f64 {
        self.equity
    }

    fn submit(&mut self, order: &OrderRequest) -> Result<Fill, BandtraderError> {
        if order.size == 0 {
            return Err(Self::reject(order, "zero quantity"));
        }
        if !(order.price.is_finite() && order.price > 0.0) {
            return Err(Self::reject(
                order,
                format!("unusable price {}", order.price),
            ));
        }
        let price = match order.action {
            Action::EnterLong => order.price * (1.0 + self.slippage),
            Action::Exit => order.price * (1.0 - self.slippage),
            Action::HoldNone => return Err(Self::reject(order, "nothing to execute")),
        };
        Ok(Fill {
            date: order.date,
            action: order.action,
            size: order.size,
            price,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn order(action: Action, size: u64, price: f64) -> OrderRequest {
        OrderRequest {
            date: NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
            action,
            size,
            price,
        }
    }

    #[test]
    fn entry_pays_up_exit_gives_up() {
        let mut exec = RecordingExecution::new(1e7, 0.001);
        let buy = exec.submit(&order(Action::EnterLong, 200, 100.0)).unwrap();
        assert_relative_eq!(buy.price, 100.1);
        let sell = exec.submit(&order(Action::Exit, 200, 100.0)).unwrap();
        assert_relative_eq!(sell.price, 99.9);
        assert_eq!((buy.size, sell.size), (200, 200));
        assert_eq!(exec.equity(), 1e7);
    }

    #[test]
    fn rejects_bad_orders() {
        let mut exec = RecordingExecution::new(1e7, 0.0);
        for bad in [
            order(Action::EnterLong, 0, 100.0),
            order(Action::EnterLong, 10, f64::NAN),
            order(Action::HoldNone, 10, 100.0),
        ] {
            assert!(matches!(
                exec.submit(&bad),
                Err(BandtraderError::OrderRejected { .. })
            ));
        }
    }
}
