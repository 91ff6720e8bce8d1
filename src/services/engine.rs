// src/services/engine.rs
//! Forecasting engine contract and the additive trend + seasonality model
//! shipped with the dashboard.
//!
//! The model mirrors the structure popularised by decomposable forecasting
//! libraries: a piecewise-linear trend with automatically placed changepoints
//! plus Fourier-series seasonalities, fitted by maximum a posteriori estimation
//! with Gaussian priors (a ridge regression). Uncertainty intervals are
//! simulated from future trend changes and observation noise.

use chrono::{Datelike, NaiveDate};
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Exp, Normal, Poisson};
use std::f64::consts::PI;

use crate::error::{ForecastError, Result};
use crate::models::{Component, ComponentDecomposition, ForecastPoint, ForecastSeries, Observation};

/// Anything that can learn from dated scalars and extrapolate them.
pub trait ForecastEngine: Send + Sync {
    fn fit(&self, observations: &[Observation]) -> Result<Box<dyn FittedModel>>;
}

/// A model produced by [`ForecastEngine::fit`].
pub trait FittedModel: Send {
    /// Point estimate and two-sided interval for every date, in order.
    fn predict(&self, dates: &[NaiveDate]) -> Result<ForecastSeries>;

    /// Additive components (trend first) on the same dates.
    fn decompose(&self, dates: &[NaiveDate]) -> Result<ComponentDecomposition>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeasonalityMode {
    /// Enabled when the history is long and dense enough
    Auto,
    Enabled,
    Disabled,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    pub n_changepoints: usize,
    /// Share of the history in which changepoints may be placed
    pub changepoint_range: f64,
    pub changepoint_prior_scale: f64,
    pub seasonality_prior_scale: f64,
    pub yearly: SeasonalityMode,
    pub weekly: SeasonalityMode,
    pub yearly_order: usize,
    pub weekly_order: usize,
    pub interval_width: f64,
    /// Zero disables interval simulation (bounds equal the estimate)
    pub uncertainty_samples: usize,
    pub seed: Option<u64>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig {
            n_changepoints: 25,
            changepoint_range: 0.8,
            changepoint_prior_scale: 0.05,
            seasonality_prior_scale: 10.0,
            yearly: SeasonalityMode::Auto,
            weekly: SeasonalityMode::Auto,
            yearly_order: 10,
            weekly_order: 3,
            interval_width: 0.8,
            uncertainty_samples: 1000,
            seed: None,
        }
    }
}

impl ModelConfig {
    fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(ForecastError::ModelFit(format!("invalid model configuration: {}", msg)));
        if !(self.changepoint_range > 0.0 && self.changepoint_range <= 1.0) {
            return invalid("changepoint_range must be in (0, 1]");
        }
        if !(self.interval_width > 0.0 && self.interval_width < 1.0) {
            return invalid("interval_width must be in (0, 1)");
        }
        if !(self.changepoint_prior_scale > 0.0 && self.seasonality_prior_scale > 0.0) {
            return invalid("prior scales must be positive");
        }
        Ok(())
    }
}

const BASE_PRIOR_SCALE: f64 = 5.0;
const NOISE_PRIOR_SCALE: f64 = 0.5;
const MIN_NOISE: f64 = 1e-3;
const YEARLY_PERIOD: f64 = 365.25;
const WEEKLY_PERIOD: f64 = 7.0;

#[derive(Debug, Clone)]
struct Seasonality {
    name: &'static str,
    period: f64,
    order: usize,
}

impl Seasonality {
    fn width(&self) -> usize {
        2 * self.order
    }

    fn features(&self, day: f64, out: &mut Vec<f64>) {
        for k in 1..=self.order {
            let x = 2.0 * PI * k as f64 * day / self.period;
            out.push(x.sin());
            out.push(x.cos());
        }
    }
}

/// Additive model engine; see the module docs.
#[derive(Debug, Clone, Default)]
pub struct AdditiveModel {
    config: ModelConfig,
}

impl AdditiveModel {
    pub fn new(config: ModelConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }
}

#[derive(Debug, Clone)]
pub struct FittedAdditiveModel {
    config: ModelConfig,
    start: NaiveDate,
    span_days: f64,
    y_scale: f64,
    changepoints: Vec<f64>,
    seasonalities: Vec<Seasonality>,
    /// Column layout: intercept, slope, one delta per changepoint, then each
    /// seasonality's Fourier terms in order.
    coefficients: Vec<f64>,
    sigma: f64,
}

/// Days from 0001-01-01 (day 1) to 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

fn days_since_epoch(date: NaiveDate) -> f64 {
    f64::from(date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE)
}

impl ForecastEngine for AdditiveModel {
    fn fit(&self, observations: &[Observation]) -> Result<Box<dyn FittedModel>> {
        self.config.validate()?;

        if let Some(bad) = observations.iter().find(|o| !o.value.is_finite()) {
            return Err(ForecastError::ModelFit(format!("non-finite value on {}", bad.date)));
        }

        let mut data = observations.to_vec();
        data.sort_by_key(|o| o.date);
        let distinct = 1 + data.windows(2).filter(|w| w[1].date != w[0].date).count();
        if data.is_empty() || distinct < 2 {
            return Err(ForecastError::InsufficientData(format!(
                "need at least 2 distinct dates, got {}",
                if data.is_empty() { 0 } else { distinct }
            )));
        }

        let (lo, hi) = data
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), o| (lo.min(o.value), hi.max(o.value)));
        if lo == hi {
            return Err(ForecastError::ModelFit(
                "all observations are identical; nothing to fit".to_string(),
            ));
        }

        let n = data.len();
        let start = data[0].date;
        let span_days = (data[n - 1].date - start).num_days() as f64;
        let y_scale = lo.abs().max(hi.abs());
        let t: Vec<f64> = data.iter().map(|o| (o.date - start).num_days() as f64 / span_days).collect();
        let y: Vec<f64> = data.iter().map(|o| o.value / y_scale).collect();

        let changepoints = place_changepoints(&t, self.config.n_changepoints, self.config.changepoint_range);
        let seasonalities = self.detect_seasonalities(&data, span_days);

        let mut model = FittedAdditiveModel {
            config: self.config.clone(),
            start,
            span_days,
            y_scale,
            changepoints,
            seasonalities,
            coefficients: Vec::new(),
            sigma: NOISE_PRIOR_SCALE,
        };

        let rows: Vec<Vec<f64>> = data
            .iter()
            .zip(&t)
            .map(|(o, &ti)| model.features(ti, days_since_epoch(o.date)))
            .collect();
        let prior_scales = model.prior_scales();

        // The ridge penalties depend on the noise level, so fit twice: once
        // under the prior noise scale, once under the residual estimate.
        for _ in 0..2 {
            let coefficients = solve_map(&rows, &y, &prior_scales, model.sigma)?;
            let sse: f64 = rows
                .iter()
                .zip(&y)
                .map(|(row, &yi)| {
                    let fitted: f64 = row.iter().zip(&coefficients).map(|(x, b)| x * b).sum();
                    (yi - fitted).powi(2)
                })
                .sum();
            model.coefficients = coefficients;
            model.sigma = (sse / n as f64).sqrt().max(MIN_NOISE);
        }

        if model.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(ForecastError::ModelFit("fit produced non-finite coefficients".to_string()));
        }

        debug!(
            "Fitted additive model on {} rows: {} changepoints, seasonalities {:?}, sigma {:.5}",
            n,
            model.changepoints.len(),
            model.seasonalities.iter().map(|s| s.name).collect::<Vec<_>>(),
            model.sigma
        );
        Ok(Box::new(model))
    }
}

impl AdditiveModel {
    fn detect_seasonalities(&self, data: &[Observation], span_days: f64) -> Vec<Seasonality> {
        let min_spacing = data
            .windows(2)
            .map(|w| (w[1].date - w[0].date).num_days())
            .filter(|&d| d > 0)
            .min()
            .unwrap_or(i64::MAX);

        let enabled = |mode: SeasonalityMode, auto: bool| match mode {
            SeasonalityMode::Auto => auto,
            SeasonalityMode::Enabled => true,
            SeasonalityMode::Disabled => false,
        };

        let mut seasonalities = Vec::new();
        if enabled(self.config.weekly, span_days >= 14.0 && min_spacing < 7) && self.config.weekly_order > 0 {
            seasonalities.push(Seasonality {
                name: "weekly",
                period: WEEKLY_PERIOD,
                order: self.config.weekly_order,
            });
        }
        if enabled(self.config.yearly, span_days >= 730.0) && self.config.yearly_order > 0 {
            seasonalities.push(Seasonality {
                name: "yearly",
                period: YEARLY_PERIOD,
                order: self.config.yearly_order,
            });
        }
        seasonalities
    }
}

/// Changepoints sit on evenly spaced rows of the first `range` of history.
fn place_changepoints(t: &[f64], requested: usize, range: f64) -> Vec<f64> {
    let hist_size = (t.len() as f64 * range).floor() as usize;
    let count = requested.min(hist_size.saturating_sub(1));
    if count == 0 {
        return Vec::new();
    }
    let last = (hist_size - 1) as f64;
    (1..=count)
        .map(|i| {
            let idx = (last * i as f64 / count as f64).round() as usize;
            t[idx.min(t.len() - 1)]
        })
        .collect()
}

/// Ridge-regularised least squares: (X'X + sigma^2 / s^2) b = X'y.
fn solve_map(rows: &[Vec<f64>], y: &[f64], prior_scales: &[f64], sigma: f64) -> Result<Vec<f64>> {
    let p = prior_scales.len();
    let mut a = vec![0.0; p * p];
    let mut b = vec![0.0; p];

    for (row, &yi) in rows.iter().zip(y) {
        for i in 0..p {
            b[i] += row[i] * yi;
            for j in 0..=i {
                a[i * p + j] += row[i] * row[j];
            }
        }
    }
    for (i, scale) in prior_scales.iter().enumerate() {
        a[i * p + i] += (sigma / scale).powi(2);
    }

    cholesky_solve(a, &b, p).ok_or_else(|| {
        ForecastError::ModelFit("normal equations are not positive definite".to_string())
    })
}

/// Solves A x = b for symmetric positive definite A (lower triangle used).
fn cholesky_solve(mut a: Vec<f64>, b: &[f64], p: usize) -> Option<Vec<f64>> {
    for j in 0..p {
        let mut d = a[j * p + j];
        for k in 0..j {
            d -= a[j * p + k] * a[j * p + k];
        }
        if !(d.is_finite() && d > 1e-12) {
            return None;
        }
        let ljj = d.sqrt();
        a[j * p + j] = ljj;
        for i in (j + 1)..p {
            let mut s = a[i * p + j];
            for k in 0..j {
                s -= a[i * p + k] * a[j * p + k];
            }
            a[i * p + j] = s / ljj;
        }
    }

    let mut z = vec![0.0; p];
    for i in 0..p {
        let mut s = b[i];
        for k in 0..i {
            s -= a[i * p + k] * z[k];
        }
        z[i] = s / a[i * p + i];
    }

    let mut x = vec![0.0; p];
    for i in (0..p).rev() {
        let mut s = z[i];
        for k in (i + 1)..p {
            s -= a[k * p + i] * x[k];
        }
        x[i] = s / a[i * p + i];
    }
    Some(x)
}

impl FittedAdditiveModel {
    fn scaled_time(&self, date: NaiveDate) -> f64 {
        (date - self.start).num_days() as f64 / self.span_days
    }

    fn n_columns(&self) -> usize {
        2 + self.changepoints.len() + self.seasonalities.iter().map(Seasonality::width).sum::<usize>()
    }

    fn features(&self, t: f64, day: f64) -> Vec<f64> {
        let mut row = Vec::with_capacity(self.n_columns());
        row.push(1.0);
        row.push(t);
        row.extend(self.changepoints.iter().map(|&c| (t - c).max(0.0)));
        for s in &self.seasonalities {
            s.features(day, &mut row);
        }
        row
    }

    fn prior_scales(&self) -> Vec<f64> {
        let mut scales = vec![BASE_PRIOR_SCALE, BASE_PRIOR_SCALE];
        scales.extend(std::iter::repeat(self.config.changepoint_prior_scale).take(self.changepoints.len()));
        for s in &self.seasonalities {
            scales.extend(std::iter::repeat(self.config.seasonality_prior_scale).take(s.width()));
        }
        scales
    }

    fn deltas(&self) -> &[f64] {
        &self.coefficients[2..2 + self.changepoints.len()]
    }

    /// Scaled trend followed by each scaled seasonal contribution.
    fn scaled_components(&self, date: NaiveDate) -> (f64, Vec<f64>) {
        let t = self.scaled_time(date);
        let row = self.features(t, days_since_epoch(date));
        let trend_width = 2 + self.changepoints.len();
        let trend: f64 = row[..trend_width]
            .iter()
            .zip(&self.coefficients[..trend_width])
            .map(|(x, b)| x * b)
            .sum();

        let mut seasonal = Vec::with_capacity(self.seasonalities.len());
        let mut offset = trend_width;
        for s in &self.seasonalities {
            let w = s.width();
            let value: f64 = row[offset..offset + w]
                .iter()
                .zip(&self.coefficients[offset..offset + w])
                .map(|(x, b)| x * b)
                .sum();
            seasonal.push(value);
            offset += w;
        }
        (trend, seasonal)
    }

    fn rng(&self) -> StdRng {
        match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    /// Simulated future trend changes, one time-sorted list of (time, delta)
    /// per sample. Empty when the fitted trend never bends.
    fn sample_trend_changes(&self, rng: &mut StdRng, t_max: f64) -> Result<Vec<Vec<(f64, f64)>>> {
        let samples = self.config.uncertainty_samples;
        let deltas = self.deltas();
        let mean_abs_delta = if deltas.is_empty() {
            0.0
        } else {
            deltas.iter().map(|d| d.abs()).sum::<f64>() / deltas.len() as f64
        };
        if t_max <= 1.0 || mean_abs_delta == 0.0 {
            return Ok(vec![Vec::new(); samples]);
        }

        let rate = deltas.len() as f64 * (t_max - 1.0);
        let count = Poisson::new(rate).map_err(|e| ForecastError::ModelFit(format!("trend simulation: {}", e)))?;
        let magnitude = Exp::new(1.0 / mean_abs_delta)
            .map_err(|e| ForecastError::ModelFit(format!("trend simulation: {}", e)))?;

        let mut paths = Vec::with_capacity(samples);
        for _ in 0..samples {
            let n_changes = count.sample(rng) as usize;
            let mut changes: Vec<(f64, f64)> = (0..n_changes)
                .map(|_| {
                    let at = rng.gen_range(1.0..t_max);
                    let size = magnitude.sample(rng);
                    (at, if rng.gen_bool(0.5) { size } else { -size })
                })
                .collect();
            changes.sort_by(|a, b| a.0.total_cmp(&b.0));
            paths.push(changes);
        }
        Ok(paths)
    }
}

/// Running sum of one simulated path's trend changes up to the current time.
#[derive(Debug, Clone, Copy, Default)]
struct PathCursor {
    next: usize,
    slope: f64,
    offset: f64,
}

impl PathCursor {
    /// Deviation at `t`; calls must come with non-decreasing `t`.
    fn advance(&mut self, changes: &[(f64, f64)], t: f64) -> f64 {
        while let Some(&(at, delta)) = changes.get(self.next) {
            if at >= t {
                break;
            }
            self.slope += delta;
            self.offset += delta * at;
            self.next += 1;
        }
        self.slope * t - self.offset
    }
}

impl FittedModel for FittedAdditiveModel {
    fn predict(&self, dates: &[NaiveDate]) -> Result<ForecastSeries> {
        let estimates: Vec<f64> = dates
            .iter()
            .map(|&d| {
                let (trend, seasonal) = self.scaled_components(d);
                (trend + seasonal.iter().sum::<f64>()) * self.y_scale
            })
            .collect();

        let samples = self.config.uncertainty_samples;
        if samples == 0 {
            let points = dates
                .iter()
                .zip(estimates)
                .map(|(&date, estimate)| ForecastPoint {
                    date,
                    estimate,
                    lower_bound: estimate,
                    upper_bound: estimate,
                })
                .collect();
            return Ok(ForecastSeries { points });
        }

        let mut rng = self.rng();
        let t: Vec<f64> = dates.iter().map(|&d| self.scaled_time(d)).collect();
        let t_max = t.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let paths = self.sample_trend_changes(&mut rng, t_max)?;
        let noise = Normal::new(0.0, self.sigma)
            .map_err(|e| ForecastError::ModelFit(format!("noise simulation: {}", e)))?;

        // Simulated deviations are symmetric around the estimate, so the
        // interval is the quantile of their absolute value.
        let rank = ((self.config.interval_width * samples as f64).ceil() as usize).clamp(1, samples) - 1;
        let mut order: Vec<usize> = (0..dates.len()).collect();
        order.sort_by(|&a, &b| t[a].total_cmp(&t[b]));

        let mut cursors = vec![PathCursor::default(); samples];
        let mut deviations = vec![0.0; samples];
        let mut half_widths = vec![0.0; dates.len()];
        for &i in &order {
            let ti = t[i];
            for ((slot, cursor), path) in deviations.iter_mut().zip(cursors.iter_mut()).zip(&paths) {
                *slot = (cursor.advance(path, ti) + noise.sample(&mut rng)).abs();
            }
            deviations.select_nth_unstable_by(rank, |a, b| a.total_cmp(b));
            half_widths[i] = deviations[rank] * self.y_scale;
        }

        let points = dates
            .iter()
            .zip(estimates)
            .zip(half_widths)
            .map(|((&date, estimate), half_width)| ForecastPoint {
                date,
                estimate,
                lower_bound: estimate - half_width,
                upper_bound: estimate + half_width,
            })
            .collect();
        Ok(ForecastSeries { points })
    }

    fn decompose(&self, dates: &[NaiveDate]) -> Result<ComponentDecomposition> {
        let mut trend = Vec::with_capacity(dates.len());
        let mut seasonal: Vec<Vec<f64>> = vec![Vec::with_capacity(dates.len()); self.seasonalities.len()];
        for &d in dates {
            let (tr, parts) = self.scaled_components(d);
            trend.push(tr * self.y_scale);
            for (series, value) in seasonal.iter_mut().zip(parts) {
                series.push(value * self.y_scale);
            }
        }

        let mut components = vec![Component { name: "trend".to_string(), values: trend }];
        components.extend(
            self.seasonalities
                .iter()
                .zip(seasonal)
                .map(|(s, values)| Component { name: s.name.to_string(), values }),
        );
        Ok(ComponentDecomposition { dates: dates.to_vec(), components })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn daily(n: usize, f: impl Fn(usize) -> f64) -> Vec<Observation> {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        (0..n)
            .map(|i| Observation { date: start + Duration::days(i as i64), value: f(i) })
            .collect()
    }

    fn quiet() -> ModelConfig {
        ModelConfig { uncertainty_samples: 0, ..ModelConfig::default() }
    }

    #[test]
    fn cholesky_solves_a_small_system() {
        // [[4, 2], [2, 3]] x = [2, 5] -> x = [-0.5, 2]
        let x = cholesky_solve(vec![4.0, 0.0, 2.0, 3.0], &[2.0, 5.0], 2).unwrap();
        assert!((x[0] + 0.5).abs() < 1e-12);
        assert!((x[1] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn cholesky_rejects_singular_matrices() {
        assert!(cholesky_solve(vec![1.0, 0.0, 1.0, 1.0], &[1.0, 1.0], 2).is_none());
    }

    #[test]
    fn changepoints_shrink_for_short_histories() {
        let t: Vec<f64> = (0..10).map(|i| i as f64 / 9.0).collect();
        assert_eq!(place_changepoints(&t, 25, 0.8).len(), 7);
        assert!(place_changepoints(&t[..2], 25, 0.8).is_empty());
    }

    #[test]
    fn changepoints_stay_inside_the_range() {
        let t: Vec<f64> = (0..1000).map(|i| i as f64 / 999.0).collect();
        let cps = place_changepoints(&t, 25, 0.8);
        assert_eq!(cps.len(), 25);
        assert!(cps.iter().all(|&c| c > 0.0 && c <= 0.8));
        assert!(cps.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn linear_series_is_recovered() {
        let obs = daily(120, |i| 100.0 + 0.5 * i as f64);
        let model = AdditiveModel::new(ModelConfig {
            weekly: SeasonalityMode::Disabled,
            ..quiet()
        })
        .fit(&obs)
        .unwrap();
        let dates: Vec<NaiveDate> = obs.iter().map(|o| o.date).collect();
        let forecast = model.predict(&dates).unwrap();
        for (point, o) in forecast.points.iter().zip(&obs) {
            assert!((point.estimate - o.value).abs() < 0.5, "{} vs {}", point.estimate, o.value);
        }
    }

    #[test]
    fn weekly_pattern_shows_up_as_a_component() {
        let obs = daily(140, |i| 50.0 + if i % 7 == 0 { 5.0 } else { 0.0 });
        let model = AdditiveModel::new(quiet()).fit(&obs).unwrap();
        let dates: Vec<NaiveDate> = obs.iter().map(|o| o.date).collect();
        let parts = model.decompose(&dates).unwrap();
        assert_eq!(parts.names(), vec!["trend", "weekly"]);
        let weekly = parts.get("weekly").unwrap();
        assert!(weekly[0] > weekly[1] + 1.0);
    }

    #[test]
    fn yearly_seasonality_needs_two_years() {
        let short = daily(400, |i| (i as f64).sin() + 10.0);
        let long = daily(800, |i| (i as f64).sin() + 10.0);
        let engine = AdditiveModel::new(quiet());
        let dates = [NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()];
        assert!(engine.fit(&short).unwrap().decompose(&dates).unwrap().get("yearly").is_none());
        assert!(engine.fit(&long).unwrap().decompose(&dates).unwrap().get("yearly").is_some());
    }

    #[test]
    fn components_add_up_to_the_estimate() {
        let obs = daily(200, |i| 20.0 + 0.1 * i as f64 + (i % 7) as f64 * 0.3);
        let model = AdditiveModel::new(quiet()).fit(&obs).unwrap();
        let dates: Vec<NaiveDate> = obs.iter().map(|o| o.date).collect();
        let forecast = model.predict(&dates).unwrap();
        let parts = model.decompose(&dates).unwrap();
        for (i, point) in forecast.points.iter().enumerate() {
            let total: f64 = parts.components.iter().map(|c| c.values[i]).sum();
            assert!((total - point.estimate).abs() < 1e-9);
        }
    }

    #[test]
    fn intervals_widen_past_the_history() {
        // rising then falling, so the fitted changepoints carry real weight
        let obs = daily(300, |i| {
            let base = if i < 150 { 100.0 + 0.2 * i as f64 } else { 130.0 - 0.3 * (i - 150) as f64 };
            base + ((i * 7919) % 13) as f64 * 0.1
        });
        let model = AdditiveModel::new(ModelConfig { seed: Some(7), ..ModelConfig::default() })
            .fit(&obs)
            .unwrap();
        let last = obs.last().unwrap().date;
        let dates = vec![last, last + Duration::days(300)];
        let forecast = model.predict(&dates).unwrap();
        let width = |p: &ForecastPoint| p.upper_bound - p.lower_bound;
        assert!(width(&forecast.points[1]) > width(&forecast.points[0]));
    }

    #[test]
    fn path_cursor_matches_the_direct_sum() {
        let changes = vec![(1.2, 0.5), (1.5, -0.25), (2.0, 1.0)];
        let mut cursor = PathCursor::default();
        for t in [1.0, 1.3, 1.5, 1.9, 2.5, 4.0] {
            let direct: f64 = changes
                .iter()
                .filter(|(at, _)| *at < t)
                .map(|(at, delta)| delta * (t - at))
                .sum();
            assert!((cursor.advance(&changes, t) - direct).abs() < 1e-12, "t = {}", t);
        }
    }

    #[test]
    fn straight_trend_skips_the_change_simulation() {
        let obs = daily(2, |i| 10.0 + i as f64);
        let model = AdditiveModel::new(ModelConfig { seed: Some(1), ..ModelConfig::default() })
            .fit(&obs)
            .unwrap();
        let last = obs.last().unwrap().date;
        let dates: Vec<NaiveDate> = (1..=1825).map(|d| last + Duration::days(d)).collect();
        let forecast = model.predict(&dates).unwrap();
        assert_eq!(forecast.len(), 1825);
        let end = forecast.points.last().unwrap();
        assert!(end.upper_bound - end.lower_bound < 1.0, "{:?}", end);
    }

    #[test]
    fn non_finite_values_fail_the_fit() {
        let mut obs = daily(10, |i| i as f64);
        obs[3].value = f64::NAN;
        assert!(matches!(
            AdditiveModel::default().fit(&obs),
            Err(ForecastError::ModelFit(_))
        ));
    }

    #[test]
    fn invalid_configuration_is_reported() {
        let engine = AdditiveModel::new(ModelConfig { interval_width: 1.2, ..ModelConfig::default() });
        assert!(matches!(engine.fit(&daily(10, |i| i as f64)), Err(ForecastError::ModelFit(_))));
    }
}
