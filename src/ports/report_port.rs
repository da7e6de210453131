//! Report generation port trait.

use std::path::PathBuf;

use crate::domain::backtest::PortfolioState;
use crate::domain::error::CrosstraderError;
use crate::domain::performance::Performance;
use crate::domain::price::PricePoint;
use crate::domain::signal::SignalSeries;

/// Port for writing run artifacts. Each method returns the path it wrote.
pub trait ReportPort {
    fn write_signal_chart(
        &self,
        symbol: &str,
        prices: &[PricePoint],
        signals: &SignalSeries,
    ) -> Result<PathBuf, CrosstraderError>;

    fn write_equity_curve(
        &self,
        trajectory: &[PortfolioState],
    ) -> Result<PathBuf, CrosstraderError>;

    fn write_performance(&self, performance: &Performance) -> Result<PathBuf, CrosstraderError>;
}
