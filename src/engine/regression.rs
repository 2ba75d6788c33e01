//! Hedge-Ratio Regression
//!
//! Fits priceA ~ beta * priceB + alpha over an aligned window, either by
//! closed-form OLS or by iteratively reweighted least squares with Huber
//! loss. The robust mode downweights outlier prints that would otherwise
//! drag the hedge ratio around.
//!
//! When the IRLS iteration cap is hit without convergence the last estimate
//! is still returned, marked `converged: false`. That is observable metadata,
//! not an error.

use super::params::RegressionMode;
use super::StatError;

/// Variance floor below which the regressor is treated as constant
const MIN_VARIANCE: f64 = 1e-18;

/// Result of a hedge-ratio fit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HedgeRatioFit {
    /// Slope: units of A per unit of B
    pub beta: f64,
    /// Intercept
    pub alpha: f64,
    /// Fraction of variance explained by the fit
    pub r_squared: f64,
    /// False when Huber IRLS hit its iteration cap
    pub converged: bool,
}

/// Fit the hedge ratio in the requested mode.
///
/// `x` is priceB, `y` is priceA, already aligned by timestamp.
pub fn fit_hedge_ratio(
    x: &[f64],
    y: &[f64],
    mode: RegressionMode,
    huber_c: f64,
    max_iter: usize,
    tol: f64,
) -> Result<HedgeRatioFit, StatError> {
    debug_assert_eq!(x.len(), y.len());
    StatError::check_len(x.len(), 2)?;

    match mode {
        RegressionMode::Ols => fit_ols(x, y),
        RegressionMode::Huber => fit_huber(x, y, huber_c, max_iter, tol),
    }
}

/// Closed-form least squares
pub fn fit_ols(x: &[f64], y: &[f64]) -> Result<HedgeRatioFit, StatError> {
    let weights = vec![1.0; x.len()];
    let (beta, alpha) = weighted_ols(x, y, &weights)?;
    Ok(HedgeRatioFit {
        beta,
        alpha,
        r_squared: r_squared(x, y, beta, alpha),
        converged: true,
    })
}

/// Huber IRLS: reweight residuals beyond `c` robust standard deviations,
/// refit, repeat until beta stabilizes or the iteration cap is hit
pub fn fit_huber(
    x: &[f64],
    y: &[f64],
    c: f64,
    max_iter: usize,
    tol: f64,
) -> Result<HedgeRatioFit, StatError> {
    let ols = fit_ols(x, y)?;
    let mut beta = ols.beta;
    let mut alpha = ols.alpha;
    let mut converged = false;

    for _ in 0..max_iter {
        let residuals: Vec<f64> = x
            .iter()
            .zip(y.iter())
            .map(|(&xi, &yi)| yi - (beta * xi + alpha))
            .collect();

        // Robust scale: MAD / 0.6745 makes it consistent with the normal stdev
        let scale = mad(&residuals) / 0.6745;
        if scale < 1e-12 {
            // Residuals already negligible, nothing left to reweight
            converged = true;
            break;
        }

        let weights: Vec<f64> = residuals
            .iter()
            .map(|r| {
                let u = (r / scale).abs();
                if u <= c {
                    1.0
                } else {
                    c / u
                }
            })
            .collect();

        let (new_beta, new_alpha) = weighted_ols(x, y, &weights)?;
        let delta = (new_beta - beta).abs();
        beta = new_beta;
        alpha = new_alpha;

        if delta < tol {
            converged = true;
            break;
        }
    }

    Ok(HedgeRatioFit {
        beta,
        alpha,
        r_squared: r_squared(x, y, beta, alpha),
        converged,
    })
}

/// Weighted least squares for a single regressor plus intercept
fn weighted_ols(x: &[f64], y: &[f64], w: &[f64]) -> Result<(f64, f64), StatError> {
    let sw: f64 = w.iter().sum();
    let mean_x = x.iter().zip(w).map(|(xi, wi)| xi * wi).sum::<f64>() / sw;
    let mean_y = y.iter().zip(w).map(|(yi, wi)| yi * wi).sum::<f64>() / sw;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for ((&xi, &yi), &wi) in x.iter().zip(y.iter()).zip(w.iter()) {
        let dx = xi - mean_x;
        sxx += wi * dx * dx;
        sxy += wi * dx * (yi - mean_y);
    }

    if sxx < MIN_VARIANCE {
        return Err(StatError::SingularRegression);
    }

    let beta = sxy / sxx;
    let alpha = mean_y - beta * mean_x;
    Ok((beta, alpha))
}

fn r_squared(x: &[f64], y: &[f64], beta: f64, alpha: f64) -> f64 {
    let n = y.len() as f64;
    let mean_y = y.iter().sum::<f64>() / n;

    let ss_tot: f64 = y.iter().map(|yi| (yi - mean_y).powi(2)).sum();
    if ss_tot < MIN_VARIANCE {
        // y is constant; a flat fit explains everything
        return 1.0;
    }

    let ss_res: f64 = x
        .iter()
        .zip(y.iter())
        .map(|(&xi, &yi)| (yi - (beta * xi + alpha)).powi(2))
        .sum();

    (1.0 - ss_res / ss_tot).clamp(0.0, 1.0)
}

/// Median absolute deviation from the median
fn mad(values: &[f64]) -> f64 {
    let med = median(values);
    let deviations: Vec<f64> = values.iter().map(|v| (v - med).abs()).collect();
    median(&deviations)
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}
