//! Core domain types and logic.

pub mod price;
pub mod signal;
pub mod backtest;
pub mod performance;
pub mod dataset;
pub mod classification;
pub mod config_validation;
pub mod error;
