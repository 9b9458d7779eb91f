//! ARIMA(p, d, q) fitting by conditional sum of squares.
//!
//! The differenced series is standardized, an ARMA(p, q) with constant is fit
//! by Nelder–Mead over the CSS objective, and forecasts are mapped back to the
//! original scale and integrated `d` times.
//!
//! Parameters outside the stationary / invertible region are rejected with a
//! step-down (reflection coefficient) test, so the optimiser never leaves it.

use super::{Forecast, ForecastError, ForecastModel, CONFIDENCE_95, Z_95};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Upper bound on p and q accepted by the fitter.
const MAX_ARMA_LAG: usize = 8;
/// Upper bound on d.
const MAX_DIFF: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArimaOrder {
    pub p: usize,
    pub d: usize,
    pub q: usize,
}

impl ArimaOrder {
    /// Order used by screening runs.
    pub const SCREENING: ArimaOrder = ArimaOrder { p: 2, d: 0, q: 2 };

    pub const fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }

    pub fn validate(&self) -> Result<(), ForecastError> {
        if self.p > MAX_ARMA_LAG || self.q > MAX_ARMA_LAG || self.d > MAX_DIFF {
            return Err(ForecastError::InvalidOrder(*self));
        }
        Ok(())
    }

    /// Number of free parameters including the constant (when d == 0).
    pub fn n_params(&self) -> usize {
        self.p + self.q + usize::from(self.includes_constant())
    }

    pub fn includes_constant(&self) -> bool {
        self.d == 0
    }

    /// Fewest observations the fitter accepts.
    pub fn min_observations(&self) -> usize {
        self.d + 2 * (self.p + self.q) + 3
    }
}

impl fmt::Display for ArimaOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ARIMA({},{},{})", self.p, self.d, self.q)
    }
}

// ── Polynomial helpers ──────────────────────────────────────────────

/// Step-down test: true when 1 - a1 z - ... - ak z^k has all roots outside
/// the unit circle.
pub fn is_stationary(coeffs: &[f64]) -> bool {
    let mut a = coeffs.to_vec();
    for k in (1..=a.len()).rev() {
        let kappa = a[k - 1];
        if !kappa.is_finite() || kappa.abs() >= 1.0 - 1e-8 {
            return false;
        }
        if k > 1 {
            let denom = 1.0 - kappa * kappa;
            let prev = a.clone();
            for j in 1..k {
                a[j - 1] = (prev[j - 1] + kappa * prev[k - j - 1]) / denom;
            }
        }
        a.truncate(k - 1);
    }
    true
}

/// True when 1 + t1 z + ... + tq z^q has all roots outside the unit circle.
pub fn is_invertible(ma: &[f64]) -> bool {
    let negated: Vec<f64> = ma.iter().map(|t| -t).collect();
    is_stationary(&negated)
}

fn autocovariances(x: &[f64], max_lag: usize) -> Vec<f64> {
    let n = x.len() as f64;
    (0..=max_lag)
        .map(|k| {
            x.iter()
                .skip(k)
                .zip(x.iter())
                .map(|(a, b)| a * b)
                .sum::<f64>()
                / n
        })
        .collect()
}

/// Yule–Walker AR coefficients via the Levinson–Durbin recursion.
pub fn levinson_durbin(acov: &[f64], p: usize) -> Vec<f64> {
    let mut phi = vec![0.0; p];
    let mut err = acov.first().copied().unwrap_or(0.0);
    for k in 1..=p.min(acov.len().saturating_sub(1)) {
        if err <= f64::EPSILON {
            break;
        }
        let mut acc = acov[k];
        for j in 1..k {
            acc -= phi[j - 1] * acov[k - j];
        }
        let kappa = acc / err;
        let prev = phi.clone();
        phi[k - 1] = kappa;
        for j in 1..k {
            phi[j - 1] = prev[j - 1] - kappa * prev[k - j - 1];
        }
        err *= 1.0 - kappa * kappa;
    }
    phi
}

/// Multiply two polynomials given by ascending coefficients.
fn poly_mul(a: &[f64], b: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, x) in a.iter().enumerate() {
        for (j, y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    out
}

/// MA(∞) weights ψ_0..ψ_{n-1} of θ(B) / (φ(B)(1-B)^d).
pub fn psi_weights(ar: &[f64], ma: &[f64], d: usize, n: usize) -> Vec<f64> {
    let mut poly: Vec<f64> = std::iter::once(1.0).chain(ar.iter().map(|a| -a)).collect();
    for _ in 0..d {
        poly = poly_mul(&poly, &[1.0, -1.0]);
    }
    // Back to "x_t = Σ a_i x_{t-i}" form
    let full_ar: Vec<f64> = poly.iter().skip(1).map(|c| -c).collect();

    let mut psi = Vec::with_capacity(n);
    for k in 0..n {
        if k == 0 {
            psi.push(1.0);
            continue;
        }
        let mut v = if k <= ma.len() { ma[k - 1] } else { 0.0 };
        for (i, a) in full_ar.iter().enumerate().take(k) {
            v += a * psi[k - i - 1];
        }
        psi.push(v);
    }
    psi
}

// ── Nelder–Mead ────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct NelderMead {
    pub max_iterations: usize,
    /// Relative spread of objective values at convergence.
    pub f_tolerance: f64,
    /// Simplex diameter at convergence.
    pub x_tolerance: f64,
    pub initial_step: f64,
}

impl Default for NelderMead {
    fn default() -> Self {
        Self {
            max_iterations: 8000,
            f_tolerance: 1e-10,
            x_tolerance: 1e-8,
            initial_step: 0.1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Minimum {
    pub x: Vec<f64>,
    pub value: f64,
    pub iterations: usize,
    pub converged: bool,
}

impl NelderMead {
    fn initial_simplex<F: Fn(&[f64]) -> f64>(&self, f: &F, x0: &[f64]) -> Vec<Vec<f64>> {
        let mut simplex = vec![x0.to_vec()];
        let s = self.initial_step;
        for i in 0..x0.len() {
            let mut chosen = None;
            for delta in [s, -s, s / 10.0, -s / 10.0] {
                let mut point = x0.to_vec();
                point[i] += delta;
                if f(&point).is_finite() {
                    chosen = Some(point);
                    break;
                }
            }
            simplex.push(chosen.unwrap_or_else(|| {
                let mut point = x0.to_vec();
                point[i] += s / 100.0;
                point
            }));
        }
        simplex
    }

    pub fn minimize<F: Fn(&[f64]) -> f64>(&self, f: F, x0: &[f64]) -> Minimum {
        let eval = |x: &[f64]| {
            let v = f(x);
            if v.is_nan() {
                f64::INFINITY
            } else {
                v
            }
        };
        let n = x0.len();
        if n == 0 {
            return Minimum {
                x: vec![],
                value: eval(x0),
                iterations: 0,
                converged: true,
            };
        }

        let mut simplex = self.initial_simplex(&eval, x0);
        let mut values: Vec<f64> = simplex.iter().map(|p| eval(p)).collect();

        let (alpha, gamma, rho, sigma) = (1.0, 2.0, 0.5, 0.5);
        let mut iterations = 0;
        let mut converged = false;

        while iterations < self.max_iterations {
            let mut order: Vec<usize> = (0..=n).collect();
            order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
            simplex = order.iter().map(|&i| simplex[i].clone()).collect();
            values = order.iter().map(|&i| values[i]).collect();

            let (best, worst) = (values[0], values[n]);
            let spread = worst - best;
            let diameter = simplex[1..]
                .iter()
                .map(|p| {
                    p.iter()
                        .zip(&simplex[0])
                        .map(|(a, b)| (a - b).abs())
                        .fold(0.0, f64::max)
                })
                .fold(0.0, f64::max);
            if best.is_finite()
                && (spread <= self.f_tolerance * (1.0 + best.abs())
                    || diameter <= self.x_tolerance)
            {
                converged = true;
                break;
            }
            iterations += 1;

            let centroid: Vec<f64> = (0..n)
                .map(|j| simplex[..n].iter().map(|p| p[j]).sum::<f64>() / n as f64)
                .collect();
            let toward = |from: &[f64], coef: f64| -> Vec<f64> {
                centroid
                    .iter()
                    .zip(from)
                    .map(|(c, x)| c + coef * (x - c))
                    .collect()
            };

            let reflected = toward(&simplex[n], -alpha);
            let f_reflected = eval(&reflected);

            if f_reflected < values[0] {
                let expanded = toward(&simplex[n], -alpha * gamma);
                let f_expanded = eval(&expanded);
                if f_expanded < f_reflected {
                    simplex[n] = expanded;
                    values[n] = f_expanded;
                } else {
                    simplex[n] = reflected;
                    values[n] = f_reflected;
                }
                continue;
            }
            if f_reflected < values[n - 1] {
                simplex[n] = reflected;
                values[n] = f_reflected;
                continue;
            }

            let (contracted, f_contracted, accept) = if f_reflected < values[n] {
                let c = toward(&reflected, rho);
                let fc = eval(&c);
                let ok = fc <= f_reflected;
                (c, fc, ok)
            } else {
                let c = toward(&simplex[n], rho);
                let fc = eval(&c);
                let ok = fc < values[n];
                (c, fc, ok)
            };
            if accept {
                simplex[n] = contracted;
                values[n] = f_contracted;
                continue;
            }

            // Shrink toward the best vertex
            let best_point = simplex[0].clone();
            for i in 1..=n {
                simplex[i] = best_point
                    .iter()
                    .zip(&simplex[i])
                    .map(|(b, x)| b + sigma * (x - b))
                    .collect();
                values[i] = eval(&simplex[i]);
            }
        }

        let best = (0..=n)
            .min_by(|&a, &b| values[a].total_cmp(&values[b]))
            .unwrap_or(0);
        Minimum {
            x: simplex[best].clone(),
            value: values[best],
            iterations,
            converged,
        }
    }
}

// ── Model ───────────────────────────────────────────────────────────

/// Parameter vector layout: [constant?, φ1..φp, θ1..θq].
struct Layout {
    constant: bool,
    p: usize,
    q: usize,
}

impl Layout {
    fn split<'a>(&self, params: &'a [f64]) -> (f64, &'a [f64], &'a [f64]) {
        let offset = usize::from(self.constant);
        let c = if self.constant { params[0] } else { 0.0 };
        let ar = &params[offset..offset + self.p];
        let ma = &params[offset + self.p..offset + self.p + self.q];
        (c, ar, ma)
    }
}

/// CSS residuals from t = p, with pre-sample innovations set to zero.
fn css_residuals(x: &[f64], c: f64, ar: &[f64], ma: &[f64]) -> Vec<f64> {
    let p = ar.len();
    let mut resid = vec![0.0; x.len()];
    for t in p..x.len() {
        let mut pred = c;
        for (i, phi) in ar.iter().enumerate() {
            pred += phi * x[t - i - 1];
        }
        for (j, theta) in ma.iter().enumerate() {
            if t > j {
                pred += theta * resid[t - j - 1];
            }
        }
        resid[t] = x[t] - pred;
    }
    resid
}

fn css(x: &[f64], c: f64, ar: &[f64], ma: &[f64]) -> f64 {
    css_residuals(x, c, ar, ma)
        .iter()
        .skip(ar.len())
        .map(|e| e * e)
        .sum()
}

/// A fitted ARIMA model, ready to forecast.
#[derive(Debug, Clone)]
pub struct ArimaFit {
    pub order: ArimaOrder,
    /// Constant of the standardized ARMA part.
    pub constant: f64,
    pub ar: Vec<f64>,
    pub ma: Vec<f64>,
    /// Innovation variance on the original scale.
    pub sigma2: f64,
    pub css: f64,
    pub iterations: usize,
    center: f64,
    scale: f64,
    /// Standardized differenced series.
    x: Vec<f64>,
    resid: Vec<f64>,
    /// Last value of each differencing level 0..d.
    level_lasts: Vec<f64>,
}

fn difference(y: &[f64]) -> Vec<f64> {
    y.windows(2).map(|w| w[1] - w[0]).collect()
}

impl ArimaFit {
    pub fn fit(y: &[f64], order: ArimaOrder) -> Result<Self, ForecastError> {
        Self::fit_with(y, order, &NelderMead::default())
    }

    pub fn fit_with(
        y: &[f64],
        order: ArimaOrder,
        optimizer: &NelderMead,
    ) -> Result<Self, ForecastError> {
        order.validate()?;
        if y.len() < order.min_observations() {
            return Err(ForecastError::InsufficientHistory {
                needed: order.min_observations(),
                got: y.len(),
            });
        }
        if y.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::NumericalInstability(
                "non-finite input".into(),
            ));
        }

        let mut level_lasts = Vec::with_capacity(order.d);
        let mut w = y.to_vec();
        for _ in 0..order.d {
            level_lasts.push(w[w.len() - 1]);
            w = difference(&w);
        }

        // Centering plays the role of the constant, so only when d == 0
        let n = w.len() as f64;
        let center = if order.includes_constant() {
            w.iter().sum::<f64>() / n
        } else {
            0.0
        };
        let scale = (w.iter().map(|v| (v - center).powi(2)).sum::<f64>() / n).sqrt();

        let layout = Layout {
            constant: order.includes_constant(),
            p: order.p,
            q: order.q,
        };

        // Constant input: nothing to estimate
        if scale <= 1e-12 * center.abs().max(1.0) {
            return Ok(Self {
                order,
                constant: 0.0,
                ar: vec![0.0; order.p],
                ma: vec![0.0; order.q],
                sigma2: 0.0,
                css: 0.0,
                iterations: 0,
                center,
                scale: 0.0,
                x: vec![0.0; w.len()],
                resid: vec![0.0; w.len()],
                level_lasts,
            });
        }

        let x: Vec<f64> = w.iter().map(|v| (v - center) / scale).collect();

        let ar0 = levinson_durbin(&autocovariances(&x, order.p), order.p);
        let ar0 = if is_stationary(&ar0) {
            ar0
        } else {
            vec![0.0; order.p]
        };
        let mut start = Vec::with_capacity(order.n_params());
        if layout.constant {
            start.push(0.0);
        }
        start.extend_from_slice(&ar0);
        start.extend(std::iter::repeat(0.0).take(order.q));

        let objective = |params: &[f64]| {
            let (c, ar, ma) = layout.split(params);
            if !is_stationary(ar) || !is_invertible(ma) {
                return f64::INFINITY;
            }
            css(&x, c, ar, ma)
        };

        let first = optimizer.minimize(objective, &start);
        // One restart from the best point escapes a collapsed simplex
        let second = optimizer.minimize(objective, &first.x);
        let iterations = first.iterations + second.iterations;
        let best = if second.value <= first.value {
            second
        } else {
            first
        };

        if !best.value.is_finite() {
            return Err(ForecastError::NumericalInstability(
                "objective is not finite at the optimum".into(),
            ));
        }
        if !best.converged {
            return Err(ForecastError::NotConverged { iterations });
        }

        let (c, ar, ma) = layout.split(&best.x);
        let resid = css_residuals(&x, c, ar, ma);
        let dof = (x.len() - order.p) as f64;
        let sigma2 = best.value / dof * scale * scale;
        if !sigma2.is_finite() {
            return Err(ForecastError::NumericalInstability(
                "innovation variance is not finite".into(),
            ));
        }

        Ok(Self {
            order,
            constant: c,
            ar: ar.to_vec(),
            ma: ma.to_vec(),
            sigma2,
            css: best.value,
            iterations,
            center,
            scale,
            x,
            resid,
            level_lasts,
        })
    }

    /// Point forecasts for steps 1..=steps on the original scale.
    pub fn point_path(&self, steps: usize) -> Vec<f64> {
        let n = self.x.len();
        let mut x = self.x.clone();
        let mut e = self.resid.clone();
        for _ in 0..steps {
            let t = x.len();
            let mut pred = self.constant;
            for (i, phi) in self.ar.iter().enumerate() {
                pred += phi * x[t - i - 1];
            }
            for (j, theta) in self.ma.iter().enumerate() {
                pred += theta * e[t - j - 1];
            }
            x.push(pred);
            e.push(0.0);
        }

        let mut path: Vec<f64> = x[n..]
            .iter()
            .map(|v| self.center + self.scale * v)
            .collect();
        for last in self.level_lasts.iter().rev() {
            let mut acc = *last;
            for v in path.iter_mut() {
                acc += *v;
                *v = acc;
            }
        }
        path
    }

    /// (point, lower, upper) at each step 1..=steps.
    pub fn forecast_path(&self, steps: usize) -> Vec<(f64, f64, f64)> {
        let psi = psi_weights(&self.ar, &self.ma, self.order.d, steps);
        let mut cumulative = 0.0;
        self.point_path(steps)
            .into_iter()
            .zip(psi)
            .map(|(point, weight)| {
                cumulative += weight * weight;
                let half = Z_95 * (self.sigma2 * cumulative).sqrt();
                (point, point - half, point + half)
            })
            .collect()
    }

    /// Forecast at exactly `steps` ahead.
    pub fn forecast(&self, steps: usize) -> Result<Forecast, ForecastError> {
        let steps = steps.max(1);
        let (point, lower, upper) = self
            .forecast_path(steps)
            .last()
            .copied()
            .ok_or_else(|| ForecastError::NumericalInstability("empty forecast".into()))?;
        if !(point.is_finite() && lower.is_finite() && upper.is_finite()) {
            return Err(ForecastError::NumericalInstability(format!(
                "non-finite forecast at step {steps}"
            )));
        }
        Ok(Forecast {
            point,
            lower,
            upper,
            confidence: CONFIDENCE_95,
        })
    }
}

/// ARIMA of a fixed order behind the [`ForecastModel`] seam.
#[derive(Debug, Clone)]
pub struct ArimaModel {
    order: ArimaOrder,
    optimizer: NelderMead,
}

impl ArimaModel {
    pub fn new(order: ArimaOrder) -> Self {
        Self {
            order,
            optimizer: NelderMead::default(),
        }
    }
}

impl Default for ArimaModel {
    fn default() -> Self {
        Self::new(ArimaOrder::SCREENING)
    }
}

impl ForecastModel for ArimaModel {
    fn name(&self) -> String {
        self.order.to_string()
    }

    fn order(&self) -> ArimaOrder {
        self.order
    }

    fn forecast(&self, values: &[f64], steps: usize) -> Result<Forecast, ForecastError> {
        ArimaFit::fit_with(values, self.order, &self.optimizer)?.forecast(steps)
    }
}
