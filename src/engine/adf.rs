//! Augmented Dickey-Fuller Stationarity Test
//!
//! Tests a series for a unit root by regressing
//!
//! dy_t = alpha + gamma * y_{t-1} + sum(phi_i * dy_{t-i}) + e_t
//!
//! and computing the t-statistic of gamma. Lag order is auto-selected by
//! AIC up to the Schwert bound when not fixed by configuration, with all
//! candidate fits sharing a common sample so their AICs are comparable.
//! The p-value uses MacKinnon's (1994) response-surface polynomials for
//! the constant-only regression, mapped through the standard normal CDF.
//!
//! Deterministic for a given input window and lag order - no randomness.

use statrs::function::erf::erf;

use super::StatError;

/// Minimum observations before the test is attempted
pub const MIN_SAMPLES: usize = 20;

// MacKinnon (1994) response-surface constants, constant-only regression
const TAU_STAR: f64 = -1.61;
const TAU_MIN: f64 = -18.83;
const TAU_MAX: f64 = 2.74;
const TAU_SMALLP: [f64; 3] = [2.1659, 1.4412, 0.038269];
const TAU_LARGEP: [f64; 4] = [1.7339, 0.93202, -0.12745, -0.010368];

/// Outcome of an ADF test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdfResult {
    /// Dickey-Fuller t-statistic of the unit-root coefficient
    pub statistic: f64,
    /// MacKinnon approximate p-value
    pub p_value: f64,
    /// Lag order actually used
    pub lag: usize,
    /// Observations entering the final regression
    pub n_obs: usize,
    /// p_value < significance: the series looks mean-reverting
    pub is_stationary: bool,
}

/// Run the ADF test over `series`.
///
/// `lag` fixes the lag order; `None` auto-selects by AIC. `significance`
/// is the level for the `is_stationary` verdict (0.05 in the default
/// configuration).
pub fn adf_test(series: &[f64], lag: Option<usize>, significance: f64) -> Result<AdfResult, StatError> {
    StatError::check_len(series.len(), MIN_SAMPLES)?;

    let n = series.len();
    let diffs: Vec<f64> = series.windows(2).map(|w| w[1] - w[0]).collect();

    if diffs.iter().all(|d| d.abs() < 1e-14) {
        // Perfectly flat series: the regression has nothing to explain
        return Err(StatError::DegenerateWindow { size: n });
    }

    // Schwert rule caps the lag search, and the sample must keep enough
    // degrees of freedom for the largest candidate regression
    let schwert = (12.0 * (n as f64 / 100.0).powf(0.25)).ceil() as usize;
    let hard_cap = (n - 1).saturating_sub(4) / 2;
    let max_lag = match lag {
        Some(fixed) => fixed.min(hard_cap),
        None => schwert.min(hard_cap),
    };

    let best_lag = match lag {
        Some(_) => max_lag,
        None => select_lag_by_aic(series, &diffs, max_lag)?,
    };

    // Final fit uses the full sample available at the chosen lag
    let (tau, n_obs) = fit_adf_regression(series, &diffs, best_lag, best_lag)?;
    let p_value = mackinnon_pvalue(tau);

    Ok(AdfResult {
        statistic: tau,
        p_value,
        lag: best_lag,
        n_obs,
        is_stationary: p_value < significance,
    })
}

/// Fit every candidate lag on the common sample (rows available at
/// `max_lag`) and pick the AIC minimizer.
fn select_lag_by_aic(series: &[f64], diffs: &[f64], max_lag: usize) -> Result<usize, StatError> {
    let mut best = (0usize, f64::INFINITY);

    for p in 0..=max_lag {
        let (ssr, n_obs, k) = adf_ssr(series, diffs, p, max_lag)?;
        if ssr <= 0.0 {
            // A perfect fit at this lag dominates anything else
            return Ok(p);
        }
        let aic = n_obs as f64 * (ssr / n_obs as f64).ln() + 2.0 * k as f64;
        if aic < best.1 {
            best = (p, aic);
        }
    }

    Ok(best.0)
}

/// SSR of the ADF regression at lag `p`, using rows available at `start_lag`
fn adf_ssr(
    series: &[f64],
    diffs: &[f64],
    p: usize,
    start_lag: usize,
) -> Result<(f64, usize, usize), StatError> {
    let (xtx, xty, yy, n_obs, k) = build_normal_equations(series, diffs, p, start_lag)?;
    let inv = invert(&xtx).ok_or(StatError::SingularRegression)?;
    let beta = mat_vec(&inv, &xty);

    // SSR = y'y - beta' X'y
    let explained: f64 = beta.iter().zip(xty.iter()).map(|(b, v)| b * v).sum();
    Ok(((yy - explained).max(0.0), n_obs, k))
}

/// t-statistic of the unit-root coefficient at lag `p`
fn fit_adf_regression(
    series: &[f64],
    diffs: &[f64],
    p: usize,
    start_lag: usize,
) -> Result<(f64, usize), StatError> {
    let (xtx, xty, yy, n_obs, k) = build_normal_equations(series, diffs, p, start_lag)?;
    if n_obs <= k {
        return Err(StatError::InsufficientData { needed: k + 1, have: n_obs });
    }

    let inv = invert(&xtx).ok_or(StatError::SingularRegression)?;
    let beta = mat_vec(&inv, &xty);

    let explained: f64 = beta.iter().zip(xty.iter()).map(|(b, v)| b * v).sum();
    let ssr = (yy - explained).max(0.0);
    let sigma2 = ssr / (n_obs - k) as f64;

    // Column 1 is the lagged level y_{t-1} (column 0 is the constant)
    let se = (sigma2 * inv[1][1]).sqrt();
    if se <= 0.0 || !se.is_finite() {
        return Err(StatError::SingularRegression);
    }

    Ok((beta[1] / se, n_obs))
}

/// Normal equations for the ADF design matrix at lag `p`.
///
/// Row t (for t in start..len(diffs)): target dy_t, regressors
/// [1, y_{t-1 (level index t)}, dy_{t-1}, ..., dy_{t-p}].
#[allow(clippy::type_complexity)]
fn build_normal_equations(
    series: &[f64],
    diffs: &[f64],
    p: usize,
    start_lag: usize,
) -> Result<(Vec<Vec<f64>>, Vec<f64>, f64, usize, usize), StatError> {
    let k = p + 2;
    let start = start_lag.max(p);
    if diffs.len() <= start {
        return Err(StatError::InsufficientData {
            needed: start + 1,
            have: diffs.len(),
        });
    }
    let n_obs = diffs.len() - start;

    let mut xtx = vec![vec![0.0; k]; k];
    let mut xty = vec![0.0; k];
    let mut yy = 0.0;
    let mut row = vec![0.0; k];

    for t in start..diffs.len() {
        row[0] = 1.0;
        row[1] = series[t]; // y_{t-1} relative to dy_t = series[t+1] - series[t]
        for i in 0..p {
            row[2 + i] = diffs[t - 1 - i];
        }
        let y = diffs[t];

        for a in 0..k {
            for b in a..k {
                xtx[a][b] += row[a] * row[b];
            }
            xty[a] += row[a] * y;
        }
        yy += y * y;
    }

    // Mirror the upper triangle
    for a in 0..k {
        for b in 0..a {
            xtx[a][b] = xtx[b][a];
        }
    }

    Ok((xtx, xty, yy, n_obs, k))
}

/// Gauss-Jordan inverse with partial pivoting; None when singular
fn invert(m: &[Vec<f64>]) -> Option<Vec<Vec<f64>>> {
    let n = m.len();
    let mut a: Vec<Vec<f64>> = m.to_vec();
    let mut inv: Vec<Vec<f64>> = (0..n)
        .map(|i| (0..n).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
        .collect();

    for col in 0..n {
        let pivot = (col..n).max_by(|&a_i, &b_i| {
            a[a_i][col]
                .abs()
                .partial_cmp(&a[b_i][col].abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })?;
        if a[pivot][col].abs() < 1e-12 {
            return None;
        }
        a.swap(col, pivot);
        inv.swap(col, pivot);

        let scale = a[col][col];
        for j in 0..n {
            a[col][j] /= scale;
            inv[col][j] /= scale;
        }

        for i in 0..n {
            if i == col {
                continue;
            }
            let factor = a[i][col];
            if factor == 0.0 {
                continue;
            }
            for j in 0..n {
                a[i][j] -= factor * a[col][j];
                inv[i][j] -= factor * inv[col][j];
            }
        }
    }

    Some(inv)
}

fn mat_vec(m: &[Vec<f64>], v: &[f64]) -> Vec<f64> {
    m.iter()
        .map(|row| row.iter().zip(v.iter()).map(|(a, b)| a * b).sum())
        .collect()
}

/// MacKinnon (1994) approximate p-value for the constant-only regression
fn mackinnon_pvalue(tau: f64) -> f64 {
    if tau > TAU_MAX {
        return 1.0;
    }
    if tau < TAU_MIN {
        return 0.0;
    }

    let z = if tau <= TAU_STAR {
        polyval(&TAU_SMALLP, tau)
    } else {
        polyval(&TAU_LARGEP, tau)
    };
    normal_cdf(z)
}

/// Evaluate c0 + c1*x + c2*x^2 + ...
fn polyval(coeffs: &[f64], x: f64) -> f64 {
    coeffs.iter().rev().fold(0.0, |acc, &c| acc * x + c)
}

fn normal_cdf(z: f64) -> f64 {
    0.5 * (1.0 + erf(z / std::f64::consts::SQRT_2))
}
