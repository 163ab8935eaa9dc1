//! Core domain types and logic.

pub mod error;
pub mod price;
pub mod columns;
pub mod frame;
pub mod indicator;
pub mod signal;
pub mod strategy;
pub mod backtest;
pub mod analysis;
pub mod data_validation;
pub mod config_validation;
pub mod pipeline;
