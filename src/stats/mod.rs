//! Statistics used to reduce raw samples to published values
//!
//! The percentile is a nearest-rank rule that averages two neighbours when the
//! rank is fractional, not linear interpolation. See [`percentile_rank`].

use crate::{
    defaults::SCORE_DIVISOR,
    error::{AppError, Result},
};
use std::time::Duration;

/// Which sorted element(s) a percentile reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PercentileRank {
    /// Integer rank: the element at this zero-based index
    Exact(usize),
    /// Fractional rank: the mean of the elements at `lower` and `lower + 1`
    Midpoint { lower: usize },
}

/// Resolve the rank of percentile `p` over `n` sorted samples.
///
/// `r = n * p / 100`. An integer `r` selects index `r`; otherwise the mean of
/// indices `floor(r) - 1` and `floor(r)`. Ranks that would index outside
/// `[0, n)` (for example `p = 100`, or `n = 1` with a fractional rank) are
/// rejected with [`AppError::InvalidInput`].
pub fn percentile_rank(n: usize, p: f64) -> Result<PercentileRank> {
    if n == 0 {
        return Err(AppError::invalid_input("Cannot take a percentile of an empty sample set"));
    }
    if !p.is_finite() || !(0.0..=100.0).contains(&p) {
        return Err(AppError::invalid_input(format!(
            "Percentile must be within [0, 100], got {}",
            p
        )));
    }

    let rank = n as f64 * p / 100.0;

    if rank.fract() == 0.0 {
        let index = rank as usize;
        if index >= n {
            return Err(AppError::invalid_input(format!(
                "Percentile {} selects index {} of {} samples",
                p, index, n
            )));
        }
        Ok(PercentileRank::Exact(index))
    } else {
        let floor = rank.floor() as usize;
        if floor == 0 {
            return Err(AppError::invalid_input(format!(
                "Percentile {} over {} samples has rank {} below the first element",
                p, n, rank
            )));
        }
        // rank < n here, so floor <= n - 1 and the upper neighbour exists
        Ok(PercentileRank::Midpoint { lower: floor - 1 })
    }
}

/// Compute percentile `p` of `samples` using [`percentile_rank`].
pub fn percentile(samples: &[f64], p: f64) -> Result<f64> {
    let rank = percentile_rank(samples.len(), p)?;

    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    Ok(match rank {
        PercentileRank::Exact(index) => sorted[index],
        PercentileRank::Midpoint { lower } => (sorted[lower] + sorted[lower + 1]) / 2.0,
    })
}

/// Standard median; an even count averages the two middle values.
pub fn median(samples: &[f64]) -> Result<f64> {
    if samples.is_empty() {
        return Err(AppError::invalid_input("Cannot take the median of an empty sample set"));
    }

    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Ok((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Ok(sorted[mid])
    }
}

/// Arithmetic mean.
pub fn mean(samples: &[f64]) -> Result<f64> {
    if samples.is_empty() {
        return Err(AppError::invalid_input("Cannot take the mean of an empty sample set"));
    }
    Ok(samples.iter().sum::<f64>() / samples.len() as f64)
}

/// Mean absolute difference between consecutive samples, in collection order.
pub fn jitter(samples: &[f64]) -> Result<f64> {
    if samples.len() < 2 {
        return Err(AppError::insufficient_samples(format!(
            "Jitter needs at least 2 samples, got {}",
            samples.len()
        )));
    }

    let deltas: Vec<f64> = samples.windows(2).map(|pair| (pair[1] - pair[0]).abs()).collect();
    mean(&deltas)
}

/// Throughput score: bytes per second divided by [`SCORE_DIVISOR`].
///
/// This is an internal scale, not bits or bytes per second.
pub fn throughput_score(size_bytes: u64, elapsed: Duration) -> Result<f64> {
    let seconds = elapsed.as_secs_f64();
    if seconds <= 0.0 {
        return Err(AppError::invalid_input(format!(
            "Transfer of {} bytes reported a zero duration",
            size_bytes
        )));
    }
    Ok((size_bytes as f64 / seconds) / SCORE_DIVISOR)
}
