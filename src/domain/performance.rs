//! Trajectory performance evaluation.

use super::backtest::{PortfolioState, TradeMarker};
use super::price::PricePoint;

/// One completed round trip, paired from a Buy marker and the next Sell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trade {
    pub entry_price: f64,
    pub exit_price: f64,
}

impl Trade {
    pub fn pnl(&self) -> f64 {
        self.exit_price - self.entry_price
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Performance {
    pub total_return_pct: f64,
    /// Count of trade markers; a completed round trip contributes 2.
    pub num_trades: usize,
    /// `None` when no round trip completed, printed as "N/A".
    pub win_rate_pct: Option<f64>,
}

/// Pair Buy/Sell markers into completed trades at their marker-step closes.
/// A trailing open position produces no trade.
pub fn pair_trades(trajectory: &[PortfolioState], prices: &[PricePoint]) -> Vec<Trade> {
    let mut trades = Vec::new();
    let mut entry: Option<f64> = None;

    for (state, price) in trajectory.iter().zip(prices) {
        match state.marker {
            TradeMarker::Buy => {
                if entry.is_none() {
                    entry = Some(price.close);
                }
            }
            TradeMarker::Sell => {
                if let Some(entry_price) = entry.take() {
                    trades.push(Trade {
                        entry_price,
                        exit_price: price.close,
                    });
                }
            }
            TradeMarker::None => {}
        }
    }

    trades
}

/// Summarize a backtest trajectory. An empty trajectory evaluates to a flat
/// zero-return report rather than an error.
pub fn evaluate(
    trajectory: &[PortfolioState],
    prices: &[PricePoint],
    initial_capital: f64,
) -> Performance {
    let Some(last) = trajectory.last() else {
        return Performance {
            total_return_pct: 0.0,
            num_trades: 0,
            win_rate_pct: None,
        };
    };

    let total_return_pct = (last.total - initial_capital) / initial_capital * 100.0;

    let num_trades = trajectory
        .iter()
        .filter(|s| s.marker != TradeMarker::None)
        .count();

    let trades = pair_trades(trajectory, prices);
    let win_rate_pct = if trades.is_empty() {
        None
    } else {
        let wins = trades.iter().filter(|t| t.pnl() > 0.0).count();
        Some(wins as f64 / trades.len() as f64 * 100.0)
    };

    Performance {
        total_return_pct,
        num_trades,
        win_rate_pct,
    }
}
