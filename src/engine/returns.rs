//! Return Series
//!
//! Derives simple or log returns from bar closes. Requires at least two
//! bars; below that the caller gets a typed insufficiency instead of an
//! empty or NaN-filled series. This is the progressive-enablement contract
//! every statistic above inherits.

use chrono::{DateTime, Utc};

use super::params::ReturnMethod;
use super::StatError;
use crate::domain::Bar;

/// Compute returns from consecutive bar closes.
///
/// Each return is stamped with the timestamp of the later bar's interval
/// start, so return series align with the bars that produced them.
pub fn returns(bars: &[Bar], method: ReturnMethod) -> Result<Vec<(DateTime<Utc>, f64)>, StatError> {
    StatError::check_len(bars.len(), 2)?;

    let mut out = Vec::with_capacity(bars.len() - 1);
    for pair in bars.windows(2) {
        let (prev, curr) = (&pair[0], &pair[1]);
        let value = match method {
            ReturnMethod::Simple => (curr.close - prev.close) / prev.close,
            ReturnMethod::Log => (curr.close / prev.close).ln(),
        };
        out.push((curr.interval_start, value));
    }
    Ok(out)
}

/// Returns over a raw (timestamp, price) series, same contract as `returns`
pub fn price_returns(
    prices: &[(DateTime<Utc>, f64)],
    method: ReturnMethod,
) -> Result<Vec<(DateTime<Utc>, f64)>, StatError> {
    StatError::check_len(prices.len(), 2)?;

    let mut out = Vec::with_capacity(prices.len() - 1);
    for pair in prices.windows(2) {
        let ((_, prev), (ts, curr)) = (pair[0], pair[1]);
        let value = match method {
            ReturnMethod::Simple => (curr - prev) / prev,
            ReturnMethod::Log => (curr / prev).ln(),
        };
        out.push((ts, value));
    }
    Ok(out)
}
