//! Moving-average crossover signal generation.
//!
//! Signal[i] compares the short and long rolling means of the close;
//! Transition[i] = Signal[i] − Signal[i−1], so a nonzero transition marks a
//! crossover. While either mean is still in its warm-up period the signal is
//! Neutral, never an error.

use chrono::NaiveDate;

use super::price::PricePoint;

pub const DEFAULT_SHORT_WINDOW: usize = 10;
pub const DEFAULT_LONG_WINDOW: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Bearish,
    Neutral,
    Bullish,
}

impl Signal {
    pub fn value(self) -> i8 {
        match self {
            Signal::Bearish => -1,
            Signal::Neutral => 0,
            Signal::Bullish => 1,
        }
    }

    fn compare(short_ma: Option<f64>, long_ma: Option<f64>) -> Signal {
        match (short_ma, long_ma) {
            (Some(s), Some(l)) if s > l => Signal::Bullish,
            (Some(s), Some(l)) if s < l => Signal::Bearish,
            _ => Signal::Neutral,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignalPoint {
    pub date: NaiveDate,
    pub short_ma: Option<f64>,
    pub long_ma: Option<f64>,
    pub signal: Signal,
    /// Signal value difference against the previous step; zero on step 0.
    pub transition: i8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SignalSeries {
    pub short_window: usize,
    pub long_window: usize,
    pub points: Vec<SignalPoint>,
}

impl SignalSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Rolling simple mean of the closes. `None` for the first `window - 1`
/// steps (and everywhere if `window` is zero).
pub fn rolling_mean(prices: &[PricePoint], window: usize) -> Vec<Option<f64>> {
    (0..prices.len())
        .map(|i| {
            if window == 0 || i + 1 < window {
                None
            } else {
                let start = i + 1 - window;
                let sum: f64 = prices[start..=i].iter().map(|p| p.close).sum();
                Some(sum / window as f64)
            }
        })
        .collect()
}

/// Compute the full crossover signal series for a price series.
///
/// Pure function of the inputs; an empty price series yields an empty
/// signal series.
pub fn compute_signals(
    prices: &[PricePoint],
    short_window: usize,
    long_window: usize,
) -> SignalSeries {
    let short = rolling_mean(prices, short_window);
    let long = rolling_mean(prices, long_window);

    let mut points = Vec::with_capacity(prices.len());
    let mut prev = Signal::Neutral;

    for (i, price) in prices.iter().enumerate() {
        let signal = Signal::compare(short[i], long[i]);
        let transition = if i == 0 {
            0
        } else {
            signal.value() - prev.value()
        };
        points.push(SignalPoint {
            date: price.date,
            short_ma: short[i],
            long_ma: long[i],
            signal,
            transition,
        });
        prev = signal;
    }

    SignalSeries {
        short_window,
        long_window,
        points,
    }
}
