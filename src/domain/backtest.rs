//! Crossover backtest engine.
//!
//! A sequential fold over the time-ordered price series. Each step's decision
//! depends on the position flag carried from the previous step, so steps must
//! be processed in increasing time order; the engine is a pure function of
//! its inputs otherwise.

use chrono::NaiveDate;

use super::error::CrosstraderError;
use super::price::PricePoint;
use super::signal::SignalSeries;

/// Exit handling applied while a position is open, fixed at engine entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RiskPolicy {
    /// Exit only on a bearish crossover.
    SignalOnly,
    /// Exit early when the close crosses the stop-loss or take-profit
    /// threshold. Checked stop-loss first, then take-profit, then the
    /// signal exit. Fractions are relative to the entry price and used
    /// as given; out-of-range values are not rejected.
    StopLossTakeProfit { stop_loss: f64, take_profit: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeMarker {
    Buy,
    Sell,
    None,
}

impl TradeMarker {
    pub fn value(self) -> i8 {
        match self {
            TradeMarker::Buy => 1,
            TradeMarker::Sell => -1,
            TradeMarker::None => 0,
        }
    }
}

/// Portfolio snapshot for one time step.
///
/// Invariant: `total == cash + holdings` at every step.
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioState {
    pub date: NaiveDate,
    pub cash: f64,
    pub holdings: f64,
    pub total: f64,
    pub marker: TradeMarker,
}

// Engine-internal position flag; discarded when the run completes.
struct OpenPosition {
    entry_price: f64,
}

fn should_exit(policy: RiskPolicy, entry_price: f64, close: f64, transition: i8) -> bool {
    if let RiskPolicy::StopLossTakeProfit {
        stop_loss,
        take_profit,
    } = policy
    {
        // Stop-loss wins when both thresholds hold on the same step.
        if close <= entry_price * (1.0 - stop_loss) {
            return true;
        }
        if close >= entry_price * (1.0 + take_profit) {
            return true;
        }
    }
    transition < 0
}

/// Run the crossover backtest and return one [`PortfolioState`] per step.
///
/// The account is always all-in or all-out: a bullish transition from flat
/// converts the full initial capital to holdings at the entry close, and any
/// exit converts the marked-to-market value back to cash. An open position at
/// the end of the series is left marked to market, not force-closed.
pub fn run_backtest(
    prices: &[PricePoint],
    signals: &SignalSeries,
    initial_capital: f64,
    policy: RiskPolicy,
) -> Result<Vec<PortfolioState>, CrosstraderError> {
    if prices.len() != signals.points.len() {
        return Err(CrosstraderError::LengthMismatch {
            prices: prices.len(),
            signals: signals.points.len(),
        });
    }

    let mut states = Vec::with_capacity(prices.len());
    let mut position: Option<OpenPosition> = None;
    let mut cash = initial_capital;
    let mut holdings = 0.0;

    for (i, price) in prices.iter().enumerate() {
        let transition = signals.points[i].transition;
        let close = price.close;
        let mut marker = TradeMarker::None;

        match position.take() {
            None => {
                if transition > 0 {
                    // Entry: holdings carry the full capital at the buy close.
                    position = Some(OpenPosition { entry_price: close });
                    holdings = initial_capital;
                    cash = 0.0;
                    marker = TradeMarker::Buy;
                }
                // Flat with no buy signal: carry prior cash/holdings forward.
            }
            Some(open) => {
                if open.entry_price == 0.0 {
                    return Err(CrosstraderError::DegenerateState { step: i });
                }
                let quantity = initial_capital / open.entry_price;
                // Mark to market before testing exit thresholds; the same
                // value moves to cash on any exit branch.
                let value = quantity * close;

                if should_exit(policy, open.entry_price, close, transition) {
                    cash = value;
                    holdings = 0.0;
                    marker = TradeMarker::Sell;
                } else {
                    holdings = value;
                    position = Some(open);
                }
            }
        }

        states.push(PortfolioState {
            date: price.date,
            cash,
            holdings,
            total: cash + holdings,
            marker,
        });
    }

    Ok(states)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::signal::{Signal, SignalPoint};
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn date(i: usize) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(i as i64)
    }

    fn make_prices(closes: &[f64]) -> Vec<PricePoint> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PricePoint {
                date: date(i),
                close,
                volume: 1000.0,
            })
            .collect()
    }

    // Signal series with fixed transitions, for driving the engine directly.
    fn make_signals(transitions: &[i8]) -> SignalSeries {
        SignalSeries {
            short_window: 10,
            long_window: 50,
            points: transitions
                .iter()
                .enumerate()
                .map(|(i, &transition)| SignalPoint {
                    date: date(i),
                    short_ma: None,
                    long_ma: None,
                    signal: Signal::Neutral,
                    transition,
                })
                .collect(),
        }
    }

    #[test]
    fn flat_series_stays_at_initial_capital() {
        let prices = make_prices(&[100.0, 110.0, 120.0]);
        let signals = make_signals(&[0, 0, 0]);

        let states = run_backtest(&prices, &signals, 10_000.0, RiskPolicy::SignalOnly).unwrap();

        for state in &states {
            assert_relative_eq!(state.cash, 10_000.0);
            assert_relative_eq!(state.holdings, 0.0);
            assert_relative_eq!(state.total, 10_000.0);
            assert_eq!(state.marker, TradeMarker::None);
        }
    }

    #[test]
    fn buy_moves_capital_into_holdings() {
        let prices = make_prices(&[100.0, 100.0, 120.0]);
        let signals = make_signals(&[0, 1, 0]);

        let states = run_backtest(&prices, &signals, 10_000.0, RiskPolicy::SignalOnly).unwrap();

        assert_eq!(states[1].marker, TradeMarker::Buy);
        assert_relative_eq!(states[1].cash, 0.0);
        assert_relative_eq!(states[1].holdings, 10_000.0);
        // quantity = 10000/100 = 100; held at 120 → 12000
        assert_relative_eq!(states[2].holdings, 12_000.0);
        assert_eq!(states[2].marker, TradeMarker::None);
    }

    #[test]
    fn repeated_buy_signal_while_long_is_ignored() {
        let prices = make_prices(&[100.0, 100.0, 110.0, 120.0]);
        let signals = make_signals(&[0, 1, 1, 0]);

        let states = run_backtest(&prices, &signals, 10_000.0, RiskPolicy::SignalOnly).unwrap();

        assert_eq!(states[1].marker, TradeMarker::Buy);
        assert_eq!(states[2].marker, TradeMarker::None);
        assert_relative_eq!(states[2].holdings, 11_000.0);
    }

    #[test]
    fn sell_signal_while_flat_is_ignored() {
        let prices = make_prices(&[100.0, 90.0]);
        let signals = make_signals(&[0, -1]);

        let states = run_backtest(&prices, &signals, 10_000.0, RiskPolicy::SignalOnly).unwrap();

        assert_eq!(states[1].marker, TradeMarker::None);
        assert_relative_eq!(states[1].cash, 10_000.0);
    }

    #[test]
    fn end_to_end_losing_round_trip() {
        // Buy at 120, price falls to 90, signal sell: -25% total return.
        let prices = make_prices(&[100.0, 100.0, 100.0, 120.0, 120.0, 90.0, 90.0]);
        let signals = make_signals(&[0, 0, 0, 1, 0, 0, -1]);

        let states = run_backtest(&prices, &signals, 10_000.0, RiskPolicy::SignalOnly).unwrap();

        assert_eq!(states[3].marker, TradeMarker::Buy);
        assert_relative_eq!(states[3].holdings, 10_000.0);
        assert_relative_eq!(states[4].holdings, 10_000.0);
        assert_relative_eq!(states[5].holdings, 7_500.0, epsilon = 1e-9);
        assert_eq!(states[6].marker, TradeMarker::Sell);
        assert_relative_eq!(states[6].cash, 7_500.0, epsilon = 1e-9);
        assert_relative_eq!(states[6].holdings, 0.0);
        assert_relative_eq!(states[6].total, 7_500.0, epsilon = 1e-9);
    }

    #[test]
    fn open_position_left_marked_to_market() {
        let prices = make_prices(&[100.0, 100.0, 130.0]);
        let signals = make_signals(&[0, 1, 0]);

        let states = run_backtest(&prices, &signals, 10_000.0, RiskPolicy::SignalOnly).unwrap();

        let last = states.last().unwrap();
        assert_eq!(last.marker, TradeMarker::None);
        assert_relative_eq!(last.holdings, 13_000.0);
        assert_relative_eq!(last.cash, 0.0);
    }

    #[test]
    fn stop_loss_forces_exit() {
        let prices = make_prices(&[100.0, 100.0, 89.0, 95.0]);
        let signals = make_signals(&[0, 1, 0, 0]);
        let policy = RiskPolicy::StopLossTakeProfit {
            stop_loss: 0.1,
            take_profit: 0.2,
        };

        let states = run_backtest(&prices, &signals, 10_000.0, policy).unwrap();

        assert_eq!(states[2].marker, TradeMarker::Sell);
        assert_relative_eq!(states[2].cash, 8_900.0, epsilon = 1e-9);
        assert_relative_eq!(states[2].holdings, 0.0);
        // Flat afterwards, no re-entry without a fresh buy signal.
        assert_eq!(states[3].marker, TradeMarker::None);
        assert_relative_eq!(states[3].cash, 8_900.0, epsilon = 1e-9);
    }

    #[test]
    fn stop_loss_triggers_at_exact_threshold() {
        let prices = make_prices(&[100.0, 100.0, 90.0]);
        let signals = make_signals(&[0, 1, 0]);
        let policy = RiskPolicy::StopLossTakeProfit {
            stop_loss: 0.1,
            take_profit: 0.2,
        };

        let states = run_backtest(&prices, &signals, 10_000.0, policy).unwrap();
        assert_eq!(states[2].marker, TradeMarker::Sell);
    }

    #[test]
    fn take_profit_forces_exit() {
        let prices = make_prices(&[100.0, 100.0, 121.0]);
        let signals = make_signals(&[0, 1, 0]);
        let policy = RiskPolicy::StopLossTakeProfit {
            stop_loss: 0.1,
            take_profit: 0.2,
        };

        let states = run_backtest(&prices, &signals, 10_000.0, policy).unwrap();

        assert_eq!(states[2].marker, TradeMarker::Sell);
        assert_relative_eq!(states[2].cash, 12_100.0, epsilon = 1e-9);
    }

    #[test]
    fn take_profit_fires_when_stop_loss_condition_is_false() {
        // Both fractions 0.1; close 115 is above the take-profit threshold
        // 110 while the stop-loss threshold 90 is untouched.
        let prices = make_prices(&[100.0, 100.0, 115.0]);
        let signals = make_signals(&[0, 1, 0]);
        let policy = RiskPolicy::StopLossTakeProfit {
            stop_loss: 0.1,
            take_profit: 0.1,
        };

        let states = run_backtest(&prices, &signals, 10_000.0, policy).unwrap();

        assert_eq!(states[2].marker, TradeMarker::Sell);
        assert_relative_eq!(states[2].cash, 11_500.0, epsilon = 1e-9);
    }

    #[test]
    fn risk_policy_falls_back_to_signal_sell() {
        let prices = make_prices(&[100.0, 100.0, 95.0, 95.0]);
        let signals = make_signals(&[0, 1, 0, -1]);
        let policy = RiskPolicy::StopLossTakeProfit {
            stop_loss: 0.1,
            take_profit: 0.2,
        };

        let states = run_backtest(&prices, &signals, 10_000.0, policy).unwrap();

        assert_eq!(states[2].marker, TradeMarker::None);
        assert_eq!(states[3].marker, TradeMarker::Sell);
        assert_relative_eq!(states[3].cash, 9_500.0, epsilon = 1e-9);
    }

    #[test]
    fn length_mismatch_is_rejected() {
        let prices = make_prices(&[100.0, 100.0]);
        let signals = make_signals(&[0, 1, 0]);

        let err = run_backtest(&prices, &signals, 10_000.0, RiskPolicy::SignalOnly).unwrap_err();
        assert!(matches!(err, CrosstraderError::LengthMismatch { .. }));
    }

    #[test]
    fn zero_entry_price_is_degenerate() {
        // A buy at close 0 poisons the quantity computation on the next step.
        let prices = make_prices(&[100.0, 0.0, 100.0]);
        let signals = make_signals(&[0, 1, 0]);

        let err = run_backtest(&prices, &signals, 10_000.0, RiskPolicy::SignalOnly).unwrap_err();
        assert!(matches!(err, CrosstraderError::DegenerateState { step: 2 }));
    }

    #[test]
    fn empty_inputs_yield_empty_trajectory() {
        let states = run_backtest(&[], &make_signals(&[]), 10_000.0, RiskPolicy::SignalOnly)
            .unwrap();
        assert!(states.is_empty());
    }

    #[test]
    fn identical_inputs_give_identical_trajectories() {
        let prices = make_prices(&[100.0, 100.0, 120.0, 80.0, 90.0, 100.0]);
        let signals = make_signals(&[0, 1, 0, 0, -1, 1]);
        let policy = RiskPolicy::StopLossTakeProfit {
            stop_loss: 0.15,
            take_profit: 0.15,
        };

        let a = run_backtest(&prices, &signals, 10_000.0, policy).unwrap();
        let b = run_backtest(&prices, &signals, 10_000.0, policy).unwrap();
        assert_eq!(a, b);
    }

    proptest! {
        #[test]
        fn total_equals_cash_plus_holdings(
            closes in proptest::collection::vec(1.0f64..1000.0, 1..60),
            raw_transitions in proptest::collection::vec(-2i8..=2, 1..60),
        ) {
            let n = closes.len().min(raw_transitions.len());
            let prices = make_prices(&closes[..n]);
            let signals = make_signals(&raw_transitions[..n]);

            let states =
                run_backtest(&prices, &signals, 10_000.0, RiskPolicy::SignalOnly).unwrap();

            for state in &states {
                prop_assert!((state.total - (state.cash + state.holdings)).abs() < 1e-9);
                prop_assert!(state.cash >= 0.0);
                prop_assert!(state.holdings >= 0.0);
            }
        }

        #[test]
        fn markers_alternate_starting_with_buy(
            closes in proptest::collection::vec(1.0f64..1000.0, 1..60),
            raw_transitions in proptest::collection::vec(-2i8..=2, 1..60),
            stop_loss in 0.01f64..0.5,
            take_profit in 0.01f64..0.5,
        ) {
            let n = closes.len().min(raw_transitions.len());
            let prices = make_prices(&closes[..n]);
            let signals = make_signals(&raw_transitions[..n]);
            let policy = RiskPolicy::StopLossTakeProfit { stop_loss, take_profit };

            let states = run_backtest(&prices, &signals, 10_000.0, policy).unwrap();

            let mut expect_buy = true;
            for state in &states {
                match state.marker {
                    TradeMarker::Buy => {
                        prop_assert!(expect_buy, "buy without a prior sell");
                        expect_buy = false;
                    }
                    TradeMarker::Sell => {
                        prop_assert!(!expect_buy, "sell without a prior buy");
                        expect_buy = true;
                    }
                    TradeMarker::None => {}
                }
            }
        }
    }
}
