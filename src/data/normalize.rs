use serde::Serialize;

use super::model::Recording;
use crate::error::{LoaderError, Result};

/// Pooled z-score statistics: one mean and one standard deviation over every
/// scalar of every training recording, regardless of channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ZStats {
    pub mean: f64,
    /// Population standard deviation.
    pub std: f64,
}

impl ZStats {
    /// Fit on training recordings. NaN cells are ignored.
    ///
    /// Fails when there is no finite value or when every value is identical.
    pub fn fit(recordings: &[Recording]) -> Result<Self> {
        let finite = || {
            recordings
                .iter()
                .flat_map(|r| r.values())
                .filter(|v| v.is_finite())
        };

        let (count, sum) = finite().fold((0usize, 0.0f64), |(n, s), v| (n + 1, s + v));
        if count == 0 {
            return Err(LoaderError::DegenerateStatistics(
                "training data has no finite values".to_string(),
            ));
        }
        let mean = sum / count as f64;
        let var = finite().map(|v| (v - mean).powi(2)).sum::<f64>() / count as f64;
        let std = var.sqrt();

        // Constant data leaves only rounding noise in σ.
        let tolerance = f64::EPSILON * mean.abs().max(1.0) * 16.0;
        if std <= tolerance || !std.is_finite() {
            return Err(LoaderError::DegenerateStatistics(format!(
                "training data is constant ({mean}), standard deviation {std:e} is within rounding of zero"
            )));
        }
        Ok(ZStats { mean, std })
    }

    pub fn normalize(&self, value: f64) -> f64 {
        (value - self.mean) / self.std
    }

    pub fn denormalize(&self, value: f64) -> f64 {
        value * self.std + self.mean
    }

    pub fn apply(&self, recording: &mut Recording) {
        recording.map_values(|v| self.normalize(v));
    }
}
