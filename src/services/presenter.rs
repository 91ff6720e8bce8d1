// src/services/presenter.rs
use chrono::NaiveDate;
use serde::Serialize;
use std::io::Write;

use crate::error::ForecastError;
use crate::models::{ComponentDecomposition, ForecastPoint, ForecastSeries, PriceObservation, PriceSeries};

/// Rows shown in each tabular preview.
pub const PREVIEW_ROWS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceKind {
    Line,
    Markers,
    /// Boundary of a shaded interval
    Band,
}

#[derive(Debug, Clone, Serialize)]
pub struct Trace {
    pub name: String,
    pub kind: TraceKind,
    pub x: Vec<NaiveDate>,
    pub y: Vec<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartSpec {
    pub title: String,
    pub traces: Vec<Trace>,
    pub range_slider: bool,
}

/// Everything the surfaces need to show one ticker.
#[derive(Debug, Clone, Serialize)]
pub struct TickerReport {
    pub symbol: String,
    pub years: u32,
    pub history_tail: Vec<PriceObservation>,
    pub forecast_tail: Vec<ForecastPoint>,
    pub raw_chart: ChartSpec,
    pub forecast_chart: ChartSpec,
    pub components_title: String,
    pub component_charts: Vec<ChartSpec>,
}

/// Builds the report for one ticker; no I/O.
pub fn render(
    series: &PriceSeries,
    forecast: &ForecastSeries,
    components: &ComponentDecomposition,
    years: u32,
) -> TickerReport {
    let symbol = series.symbol().to_string();
    let dates: Vec<NaiveDate> = series.observations().iter().map(|o| o.date).collect();

    let raw_chart = ChartSpec {
        title: format!("Time Series data for {}", symbol),
        traces: vec![
            Trace {
                name: "stock_open".to_string(),
                kind: TraceKind::Line,
                x: dates.clone(),
                y: series.observations().iter().map(|o| o.open).collect(),
            },
            Trace {
                name: "stock_close".to_string(),
                kind: TraceKind::Line,
                x: dates.clone(),
                y: series.observations().iter().map(|o| o.close).collect(),
            },
        ],
        range_slider: true,
    };

    let forecast_dates = forecast.dates();
    let forecast_trace = |name: &str, kind: TraceKind, f: fn(&ForecastPoint) -> f64| Trace {
        name: name.to_string(),
        kind,
        x: forecast_dates.clone(),
        y: forecast.points.iter().map(f).collect(),
    };
    let forecast_chart = ChartSpec {
        title: format!("Forecast plot for {} years for {}", years, symbol),
        traces: vec![
            Trace {
                name: "Actual".to_string(),
                kind: TraceKind::Markers,
                x: dates,
                y: series.observations().iter().map(|o| o.close).collect(),
            },
            forecast_trace("Forecast", TraceKind::Line, |p| p.estimate),
            forecast_trace("Lower bound", TraceKind::Band, |p| p.lower_bound),
            forecast_trace("Upper bound", TraceKind::Band, |p| p.upper_bound),
        ],
        range_slider: true,
    };

    let component_charts = components
        .components
        .iter()
        .map(|c| ChartSpec {
            title: c.name.clone(),
            traces: vec![Trace {
                name: c.name.clone(),
                kind: TraceKind::Line,
                x: components.dates.clone(),
                y: c.values.clone(),
            }],
            range_slider: false,
        })
        .collect();

    TickerReport {
        history_tail: series.tail(PREVIEW_ROWS).to_vec(),
        forecast_tail: forecast.tail(PREVIEW_ROWS).to_vec(),
        components_title: format!("Forecast components for {}", symbol),
        symbol,
        years,
        raw_chart,
        forecast_chart,
        component_charts,
    }
}

/// A surface that shows per-ticker results as they are produced.
pub trait Presenter {
    fn show_report(&mut self, report: &TickerReport) -> std::io::Result<()>;
    fn show_failure(&mut self, symbol: &str, error: &ForecastError) -> std::io::Result<()>;
}

/// Plain-text tables for the command line.
pub struct TerminalPresenter<W: Write> {
    out: W,
}

impl<W: Write> TerminalPresenter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Presenter for TerminalPresenter<W> {
    fn show_report(&mut self, report: &TickerReport) -> std::io::Result<()> {
        let out = &mut self.out;
        writeln!(out, "== {} Data ==", report.symbol)?;
        writeln!(out, "{:<12} {:>10} {:>10} {:>10} {:>10} {:>12}", "Date", "Open", "High", "Low", "Close", "Volume")?;
        for o in &report.history_tail {
            writeln!(
                out,
                "{:<12} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>12}",
                o.date, o.open, o.high, o.low, o.close, o.volume
            )?;
        }
        writeln!(out)?;

        writeln!(out, "== {} Forecast ==", report.symbol)?;
        writeln!(out, "{}", report.forecast_chart.title)?;
        writeln!(out, "{:<12} {:>10} {:>10} {:>10}", "Date", "Estimate", "Lower", "Upper")?;
        for p in &report.forecast_tail {
            writeln!(
                out,
                "{:<12} {:>10.2} {:>10.2} {:>10.2}",
                p.date, p.estimate, p.lower_bound, p.upper_bound
            )?;
        }
        writeln!(out)?;

        writeln!(out, "{}", report.components_title)?;
        for chart in &report.component_charts {
            let last = chart.traces.first().and_then(|t| t.y.last()).copied().unwrap_or_default();
            writeln!(out, "  {:<8} last value {:>10.4}", chart.title, last)?;
        }
        writeln!(out)
    }

    fn show_failure(&mut self, symbol: &str, error: &ForecastError) -> std::io::Result<()> {
        writeln!(self.out, "== {} ==", symbol)?;
        writeln!(self.out, "Could not forecast {}: {}", symbol, error)?;
        writeln!(self.out)
    }
}
