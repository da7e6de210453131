//! SVG and text report adapter.
//!
//! Renders standalone SVG files by hand rather than pulling in a plotting
//! stack. Charts are scaled to the data's min/max range with a fixed padding
//! border.

use std::fs;
use std::path::PathBuf;

use crate::domain::backtest::{PortfolioState, TradeMarker};
use crate::domain::error::CrosstraderError;
use crate::domain::performance::Performance;
use crate::domain::price::PricePoint;
use crate::domain::signal::SignalSeries;
use crate::ports::report_port::ReportPort;

const WIDTH: f64 = 800.0;
const HEIGHT: f64 = 400.0;
const PADDING: f64 = 40.0;

pub struct SvgReportAdapter {
    output_dir: PathBuf,
}

struct Scale {
    min: f64,
    step_x: f64,
    scale_y: f64,
}

impl Scale {
    fn over(values: impl Iterator<Item = f64> + Clone, len: usize) -> Scale {
        let min = values.clone().fold(f64::INFINITY, f64::min);
        let max = values.fold(f64::NEG_INFINITY, f64::max);
        let range = max - min;
        Scale {
            min,
            step_x: if len > 1 {
                (WIDTH - 2.0 * PADDING) / (len - 1) as f64
            } else {
                0.0
            },
            scale_y: if range > 0.0 {
                (HEIGHT - 2.0 * PADDING) / range
            } else {
                1.0
            },
        }
    }

    fn x(&self, i: usize) -> f64 {
        PADDING + i as f64 * self.step_x
    }

    fn y(&self, value: f64) -> f64 {
        HEIGHT - PADDING - (value - self.min) * self.scale_y
    }
}

fn polyline(points: &[(usize, f64)], scale: &Scale, stroke: &str, dashed: bool) -> String {
    let coords: Vec<String> = points
        .iter()
        .map(|&(i, v)| format!("{:.1},{:.1}", scale.x(i), scale.y(v)))
        .collect();
    let dash = if dashed {
        " stroke-dasharray=\"6,3\""
    } else {
        ""
    };
    format!(
        "  <polyline fill=\"none\" stroke=\"{}\" stroke-width=\"1.5\"{} points=\"{}\"/>\n",
        stroke,
        dash,
        coords.join(" ")
    )
}

fn circle(x: f64, y: f64, fill: &str) -> String {
    format!("  <circle cx=\"{x:.1}\" cy=\"{y:.1}\" r=\"4\" fill=\"{fill}\"/>\n")
}

fn svg_document(body: &str) -> String {
    format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{WIDTH:.0}\" height=\"{HEIGHT:.0}\" \
         viewBox=\"0 0 {WIDTH:.0} {HEIGHT:.0}\">\n\
         <rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n{body}</svg>\n"
    )
}

impl SvgReportAdapter {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    fn write_file(&self, name: &str, content: &str) -> Result<PathBuf, CrosstraderError> {
        fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join(name);
        fs::write(&path, content)?;
        Ok(path)
    }
}

impl ReportPort for SvgReportAdapter {
    fn write_signal_chart(
        &self,
        symbol: &str,
        prices: &[PricePoint],
        signals: &SignalSeries,
    ) -> Result<PathBuf, CrosstraderError> {
        let name = format!("{symbol}_signals.svg");
        if prices.is_empty() {
            return self.write_file(&name, &svg_document(""));
        }

        // One scale across close and both moving averages so they overlay.
        let closes = prices.iter().map(|p| p.close);
        let mas = signals
            .points
            .iter()
            .flat_map(|p| p.short_ma.into_iter().chain(p.long_ma));
        let all: Vec<f64> = closes.chain(mas).collect();
        let scale = Scale::over(all.iter().copied(), prices.len());

        let close_points: Vec<(usize, f64)> =
            prices.iter().enumerate().map(|(i, p)| (i, p.close)).collect();
        let short_points: Vec<(usize, f64)> = signals
            .points
            .iter()
            .enumerate()
            .filter_map(|(i, p)| p.short_ma.map(|m| (i, m)))
            .collect();
        let long_points: Vec<(usize, f64)> = signals
            .points
            .iter()
            .enumerate()
            .filter_map(|(i, p)| p.long_ma.map(|m| (i, m)))
            .collect();

        let mut body = String::new();
        body.push_str(&polyline(&close_points, &scale, "black", false));
        body.push_str(&polyline(&short_points, &scale, "orange", true));
        body.push_str(&polyline(&long_points, &scale, "purple", true));

        for (i, point) in signals.points.iter().enumerate() {
            if point.transition > 0 {
                body.push_str(&circle(scale.x(i), scale.y(prices[i].close), "green"));
            } else if point.transition < 0 {
                body.push_str(&circle(scale.x(i), scale.y(prices[i].close), "red"));
            }
        }

        self.write_file(&name, &svg_document(&body))
    }

    fn write_equity_curve(
        &self,
        trajectory: &[PortfolioState],
    ) -> Result<PathBuf, CrosstraderError> {
        let name = "equity_curve.svg";
        if trajectory.is_empty() {
            return self.write_file(name, &svg_document(""));
        }

        let scale = Scale::over(trajectory.iter().map(|s| s.total), trajectory.len());
        let points: Vec<(usize, f64)> = trajectory
            .iter()
            .enumerate()
            .map(|(i, s)| (i, s.total))
            .collect();

        let mut body = String::new();
        body.push_str(&polyline(&points, &scale, "blue", false));
        for (i, state) in trajectory.iter().enumerate() {
            match state.marker {
                TradeMarker::Buy => {
                    body.push_str(&circle(scale.x(i), scale.y(state.total), "green"));
                }
                TradeMarker::Sell => {
                    body.push_str(&circle(scale.x(i), scale.y(state.total), "red"));
                }
                TradeMarker::None => {}
            }
        }

        self.write_file(name, &svg_document(&body))
    }

    fn write_performance(&self, performance: &Performance) -> Result<PathBuf, CrosstraderError> {
        let win_rate = match performance.win_rate_pct {
            Some(rate) => format!("{rate:.2}"),
            None => "N/A".to_string(),
        };
        let content = format!(
            "Total Return (%): {:.2}\nNumber of Trades: {}\nWin Rate (%): {}\n",
            performance.total_return_pct, performance.num_trades, win_rate
        );
        self.write_file("performance.txt", &content)
    }
}
