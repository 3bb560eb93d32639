//! Core domain types and logic.

pub mod ohlcv;
pub mod resample;
pub mod indicator;
pub mod signal;
pub mod strategy;
pub mod position;
pub mod ledger;
pub mod execution;
pub mod simulator;
pub mod metrics;
pub mod backtest;
pub mod orchestrator;
pub mod config_validation;
pub mod error;
