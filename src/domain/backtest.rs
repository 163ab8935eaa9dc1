//! Backtest loop over a signal series.
//!
//! Feeds each day through [`decide`](super::strategy::decide), forwards
//! entries and exits to an [`ExecutionPort`] and tallies what happened.

use crate::ports::execution_port::{ExecutionPort, Fill, OrderRequest};

use super::error::BandtraderError;
use super::strategy::{
    decide, Action, Decision, DecisionInput, HoldReason, PositionDecision, StrategyParams,
    StrategyState,
};

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    pub initial_equity: f64,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        BacktestConfig {
            initial_equity: 10_000_000.0,
        }
    }
}

impl BacktestConfig {
    pub fn validate(&self) -> Result<(), BandtraderError> {
        if !(self.initial_equity.is_finite() && self.initial_equity > 0.0) {
            return Err(BandtraderError::config_invalid(
                "backtest",
                "initial_equity",
                "initial_equity must be positive",
            ));
        }
        Ok(())
    }
}

/// Per-run counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    pub evaluated_days: usize,
    pub invalid_data_days: usize,
    pub price_spike_days: usize,
    pub sizing_failures: usize,
    pub entries: usize,
    pub exits: usize,
    pub rejected_orders: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestResult {
    /// One entry per input day. A rejected order is recorded as `hold_none`.
    pub decisions: Vec<PositionDecision>,
    pub fills: Vec<Fill>,
    pub summary: RunSummary,
    pub final_state: StrategyState,
}

pub fn run_backtest(
    days: &[DecisionInput],
    params: &StrategyParams,
    execution: &mut dyn ExecutionPort,
) -> Result<BacktestResult, BandtraderError> {
    params.validate()?;

    let mut state = StrategyState::default();
    let mut summary = RunSummary::default();
    let mut decisions = Vec::with_capacity(days.len());
    let mut fills = Vec::new();

    for day in days {
        summary.evaluated_days += 1;
        let eval = decide(state, day, execution.equity(), params);

        match eval.decision {
            Decision::Hold(HoldReason::InvalidData(_)) => summary.invalid_data_days += 1,
            Decision::Hold(HoldReason::PriceSpike { .. }) => summary.price_spike_days += 1,
            Decision::Hold(HoldReason::SizingFailed(_)) => summary.sizing_failures += 1,
            Decision::Hold(HoldReason::Idle) => {}
            Decision::EnterLong { .. } | Decision::Exit { .. } => {
                // decide only trades on valid rows, so price is present here
                let order = OrderRequest {
                    date: day.date,
                    action: eval.decision.action(),
                    size: eval.decision.size(),
                    price: day.price.unwrap_or(f64::NAN),
                };
                match execution.submit(&order) {
                    Ok(fill) => {
                        tracing::info!(
                            date = %fill.date,
                            action = %fill.action,
                            size = fill.size,
                            price = fill.price,
                            "order filled"
                        );
                        match fill.action {
                            Action::EnterLong => summary.entries += 1,
                            Action::Exit => summary.exits += 1,
                            Action::HoldNone => {}
                        }
                        fills.push(fill);
                    }
                    Err(BandtraderError::OrderRejected { date, reason }) => {
                        tracing::warn!(%date, %reason, "order rejected, position unchanged");
                        summary.rejected_orders += 1;
                        state = StrategyState {
                            holding: state.holding,
                            last_price: eval.state.last_price,
                        };
                        decisions.push(PositionDecision {
                            date: day.date,
                            action: Action::HoldNone,
                            size: 0,
                        });
                        continue;
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        decisions.push(eval.decision.to_position(day.date));
        state = eval.state;
    }

    tracing::debug!(?summary, "backtest finished");

    Ok(BacktestResult {
        decisions,
        fills,
        summary,
        final_state: state,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::signal::Signal;
    use crate::domain::strategy::Holding;
    use chrono::NaiveDate;

    struct StubExecution {
        equity: f64,
        reject: bool,
        submitted: Vec<OrderRequest>,
    }

    impl StubExecution {
        fn new(equity: f64) -> Self {
            Self {
                equity,
                reject: false,
                submitted: Vec::new(),
            }
        }
    }

    impl ExecutionPort for StubExecution {
        fn equity(&self) -> f64 {
            self.equity
        }

        fn submit(&mut self, order: &OrderRequest) -> Result<Fill, BandtraderError> {
            self.submitted.push(*order);
            if self.reject {
                return Err(BandtraderError::OrderRejected {
                    date: order.date,
                    reason: "market closed".into(),
                });
            }
            Ok(Fill {
                date: order.date,
                action: order.action,
                size: order.size,
                price: order.price,
            })
        }
    }

    fn day(d: u32, price: f64, signal: i64) -> DecisionInput {
        DecisionInput {
            date: NaiveDate::from_ymd_opt(2024, 3, d).unwrap(),
            price: Some(price),
            upper: Some(price * 1.02),
            lower: Some(price * 0.98),
            signal: Signal::from_i64(signal),
        }
    }

    #[test]
    fn round_trip_trade() {
        let days = vec![
            day(1, 100.0, 0),
            day(2, 101.0, 1),
            day(3, 102.0, 1),
            day(4, 100.0, -1),
            day(5, 99.0, 0),
        ];
        let mut exec = StubExecution::new(10_000_000.0);
        let result = run_backtest(&days, &StrategyParams::default(), &mut exec).unwrap();

        let actions: Vec<Action> = result.decisions.iter().map(|d| d.action).collect();
        assert_eq!(
            actions,
            vec![
                Action::HoldNone,
                Action::EnterLong,
                Action::HoldNone,
                Action::Exit,
                Action::HoldNone
            ]
        );
        assert_eq!(result.fills.len(), 2);
        assert_eq!(result.fills[0].size, result.fills[1].size);
        assert_eq!(result.summary.entries, 1);
        assert_eq!(result.summary.exits, 1);
        assert_eq!(result.summary.evaluated_days, 5);
        assert_eq!(result.final_state.holding, Holding::Flat);
    }

    #[test]
    fn rejected_entry_keeps_position_flat() {
        let days = vec![day(1, 100.0, 1), day(2, 100.5, -1)];
        let mut exec = StubExecution::new(10_000_000.0);
        exec.reject = true;
        let result = run_backtest(&days, &StrategyParams::default(), &mut exec).unwrap();

        assert_eq!(result.summary.rejected_orders, 1);
        assert_eq!(result.summary.entries, 0);
        // flat again, so the -1 on day 2 submits nothing
        assert_eq!(exec.submitted.len(), 1);
        assert!(result.fills.is_empty());
        assert_eq!(result.decisions[0].action, Action::HoldNone);
        assert_eq!(result.final_state.last_price, Some(100.5));
    }

    #[test]
    fn counts_skipped_days() {
        let mut gap = day(2, 100.0, 1);
        gap.upper = None;
        let days = vec![day(1, 100.0, 0), gap, day(3, 120.0, 1), day(4, 121.0, 1)];
        let mut exec = StubExecution::new(0.0);
        let result = run_backtest(&days, &StrategyParams::default(), &mut exec).unwrap();

        assert_eq!(result.summary.invalid_data_days, 1);
        assert_eq!(result.summary.price_spike_days, 1);
        assert_eq!(result.summary.sizing_failures, 1);
        assert!(exec.submitted.is_empty());
    }

    #[test]
    fn invalid_params_abort() {
        let params = StrategyParams {
            risk_per_trade: 2.0,
            ..StrategyParams::default()
        };
        let mut exec = StubExecution::new(1e6);
        assert!(run_backtest(&[day(1, 100.0, 1)], &params, &mut exec).is_err());
    }

    #[test]
    fn empty_series_is_an_empty_run() {
        let mut exec = StubExecution::new(1e6);
        let result = run_backtest(&[], &StrategyParams::default(), &mut exec).unwrap();
        assert_eq!(result.summary, RunSummary::default());
        assert!(result.decisions.is_empty());
    }

    #[test]
    fn config_validation() {
        assert!(BacktestConfig::default().validate().is_ok());
        let bad = BacktestConfig {
            initial_equity: 0.0,
        };
        assert!(bad.validate().is_err());
    }
}
