//! Rolling Statistics
//!
//! Windowed z-score and Pearson rolling correlation. Both use sample
//! statistics (N-1 denominator). A flat window yields a typed
//! `DegenerateWindow` error, never a silent division by zero.

use chrono::{DateTime, Utc};

use super::StatError;

/// Variance floor below which a window is treated as flat
const MIN_VARIANCE: f64 = 1e-18;

/// Z-score of the latest observation against its own window:
/// z = (x_t - mean(window)) / stdev(window)
///
/// Requires at least 2 observations and nonzero standard deviation.
pub fn zscore(window: &[f64]) -> Result<f64, StatError> {
    StatError::check_len(window.len(), 2)?;

    let n = window.len() as f64;
    let mean = window.iter().sum::<f64>() / n;
    let variance = window.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);

    if variance < MIN_VARIANCE {
        return Err(StatError::DegenerateWindow { size: window.len() });
    }

    let last = window[window.len() - 1];
    Ok((last - mean) / variance.sqrt())
}

/// Rolling z-score over a full series: for each index i >= window-1, the
/// z-score of x_i against x[i-window+1..=i]. Earlier indices are not emitted.
pub fn zscore_series(values: &[f64], window: usize) -> Result<Vec<Result<f64, StatError>>, StatError> {
    StatError::check_len(values.len(), window.max(2))?;

    Ok(values
        .windows(window)
        .map(zscore)
        .collect())
}

/// Pearson correlation between two aligned series.
///
/// Series are inner-joined on timestamp first: observations present in only
/// one series are dropped pairwise. Requires at least 2 aligned pairs and
/// nonzero variance in both series.
pub fn rolling_correlation(
    a: &[(DateTime<Utc>, f64)],
    b: &[(DateTime<Utc>, f64)],
    window: usize,
) -> Result<f64, StatError> {
    let aligned = align(a, b);
    StatError::check_len(aligned.len(), window.max(2))?;

    let tail = &aligned[aligned.len() - window.max(2)..];
    pearson(tail)
}

/// Inner join of two timestamped series; both inputs are timestamp-ordered
pub fn align(
    a: &[(DateTime<Utc>, f64)],
    b: &[(DateTime<Utc>, f64)],
) -> Vec<(DateTime<Utc>, f64, f64)> {
    let mut out = Vec::with_capacity(a.len().min(b.len()));
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                out.push((a[i].0, a[i].1, b[j].1));
                i += 1;
                j += 1;
            }
        }
    }
    out
}

fn pearson(pairs: &[(DateTime<Utc>, f64, f64)]) -> Result<f64, StatError> {
    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.2).sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for &(_, x, y) in pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x < MIN_VARIANCE || var_y < MIN_VARIANCE {
        return Err(StatError::DegenerateWindow { size: pairs.len() });
    }

    Ok(cov / (var_x * var_y).sqrt())
}
