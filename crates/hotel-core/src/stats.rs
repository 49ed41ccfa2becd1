//! Descriptive statistics used by the cleaning rules.

use serde::{Deserialize, Serialize};

// ── Percentile helper ─────────────────────────────────────────────────────────

/// Compute the `p`-th percentile of a **sorted** slice using linear
/// interpolation between the closest ranks.
///
/// Returns `None` for an empty slice.
pub fn percentile(sorted_data: &[f64], p: f64) -> Option<f64> {
    if sorted_data.is_empty() {
        return None;
    }
    let len = sorted_data.len();
    if len == 1 {
        return Some(sorted_data[0]);
    }
    let rank = (p / 100.0) * (len as f64 - 1.0);
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return Some(sorted_data[lo]);
    }
    let frac = rank - lo as f64;
    Some(sorted_data[lo] + frac * (sorted_data[hi] - sorted_data[lo]))
}

/// Median of `values` (unsorted). Even-length input averages the two middle
/// values.
pub fn median(values: &[f64]) -> Option<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| !v.is_nan()).collect();
    sorted.sort_by(|a, b| a.total_cmp(b));
    percentile(&sorted, 50.0)
}

/// Arithmetic mean, `None` for empty input.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (`n - 1` denominator).
///
/// Undefined, and therefore `None`, for fewer than two values.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let avg = mean(values)?;
    let sum_sq: f64 = values.iter().map(|v| (v - avg).powi(2)).sum();
    Some((sum_sq / (values.len() as f64 - 1.0)).sqrt())
}

/// Round to `decimals` places, half away from zero.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10_f64.powi(decimals as i32);
    (value * factor).round() / factor
}

// ── SigmaBounds ───────────────────────────────────────────────────────────────

/// Mean ± k·σ band over a column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SigmaBounds {
    pub mean: f64,
    pub std: f64,
    /// Number of standard deviations.
    pub k: f64,
}

impl SigmaBounds {
    /// Compute the band over `values`; `None` when σ is undefined.
    pub fn from_values(values: &[f64], k: f64) -> Option<Self> {
        Some(Self {
            mean: mean(values)?,
            std: sample_std(values)?,
            k,
        })
    }

    /// `mean + k·σ`.
    pub fn upper(&self) -> f64 {
        self.mean + self.k * self.std
    }

    /// `mean - k·σ`.
    pub fn lower(&self) -> f64 {
        self.mean - self.k * self.std
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
