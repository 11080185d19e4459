//! Robust statistics for one repeated noisy measurement.
//!
//! A single objective reading on a live machine is noisy, so each candidate
//! evaluation draws several samples from the same channel, spaced by a
//! configurable delay to avoid correlated noise, and condenses them into a
//! [`Measurement`]. One outlier pass discards samples further than two
//! standard deviations from the mean before the final statistics are
//! computed.

use std::time::Duration;

use crate::{Error, Result};

/// The condensed result of one repeated noisy measurement.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Measurement {
    /// Mean of the accepted samples.
    pub mean: f64,
    /// Population standard deviation of the accepted samples.
    pub std_dev: f64,
    /// Standard error of the mean: `std_dev / sqrt(accepted)`.
    pub std_err: f64,
    /// Number of samples that survived outlier rejection.
    pub accepted: usize,
}

/// Draw `min_samples` readings from `sample`, reject 2σ outliers once, and
/// return the resulting statistics.
///
/// Samples are spaced by `delay`. The outlier pass runs exactly once: every
/// sample whose absolute deviation from the raw mean exceeds twice the raw
/// standard deviation is discarded, and the statistics are recomputed from
/// the retained samples. At least one sample always survives, so no
/// division-by-zero guard is needed for the standard error.
///
/// If all samples are identical the standard deviation and standard error
/// are both zero.
///
/// # Errors
///
/// Returns [`Error::ZeroCount`] if `min_samples` is zero, and propagates the
/// first error returned by `sample`.
pub fn measure<F>(min_samples: usize, delay: Duration, mut sample: F) -> Result<Measurement>
where
    F: FnMut() -> Result<f64>,
{
    if min_samples == 0 {
        return Err(Error::ZeroCount {
            name: "min_sample_count",
        });
    }

    let mut samples = Vec::with_capacity(min_samples);
    for i in 0..min_samples {
        samples.push(sample()?);
        if i + 1 < min_samples && !delay.is_zero() {
            std::thread::sleep(delay);
        }
    }

    let (mean, std_dev) = mean_and_std_dev(&samples);

    // One outlier pass: drop everything further than 2σ from the raw mean.
    let retained: Vec<f64> = samples
        .iter()
        .copied()
        .filter(|&v| (v - mean).abs() <= 2.0 * std_dev)
        .collect();

    let (mean, std_dev, accepted) = if retained.len() < samples.len() {
        let (m, s) = mean_and_std_dev(&retained);
        (m, s, retained.len())
    } else {
        (mean, std_dev, samples.len())
    };

    #[allow(clippy::cast_precision_loss)]
    let std_err = std_dev / (accepted as f64).sqrt();

    Ok(Measurement {
        mean,
        std_dev,
        std_err,
        accepted,
    })
}

/// Mean and population standard deviation of a non-empty sample set.
#[allow(clippy::cast_precision_loss)]
fn mean_and_std_dev(samples: &[f64]) -> (f64, f64) {
    let n = samples.len() as f64;
    let mean = samples.iter().sum::<f64>() / n;
    let variance = samples.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    // Guard against tiny negative values from floating-point cancellation.
    (mean, variance.max(0.0).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(values: &[f64]) -> impl FnMut() -> Result<f64> + '_ {
        let mut iter = values.iter().copied();
        move || iter.next().ok_or(Error::Internal("sample feed exhausted"))
    }

    #[test]
    fn test_outlier_rejected() {
        let values = [10.0, 10.0, 10.0, 10.0, 10.0, 30.0];
        let m = measure(values.len(), Duration::ZERO, feed(&values)).unwrap();
        assert_eq!(m.accepted, 5);
        assert!((m.mean - 10.0).abs() < 1e-12);
        assert!(m.std_dev.abs() < 1e-12);
        assert!(m.std_err.abs() < 1e-12);
    }

    #[test]
    fn test_identical_samples_zero_error() {
        let values = [4.2, 4.2, 4.2];
        let m = measure(3, Duration::ZERO, feed(&values)).unwrap();
        assert_eq!(m.accepted, 3);
        assert!((m.mean - 4.2).abs() < 1e-12);
        assert_eq!(m.std_dev, 0.0);
        assert_eq!(m.std_err, 0.0);
    }

    #[test]
    fn test_no_outliers_keeps_all() {
        let values = [1.0, 2.0, 3.0, 4.0];
        let m = measure(4, Duration::ZERO, feed(&values)).unwrap();
        assert_eq!(m.accepted, 4);
        assert!((m.mean - 2.5).abs() < 1e-12);
        // Population std-dev of 1..4 is sqrt(1.25).
        assert!((m.std_dev - 1.25_f64.sqrt()).abs() < 1e-12);
        assert!((m.std_err - m.std_dev / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_single_sample() {
        let m = measure(1, Duration::ZERO, || Ok(7.0)).unwrap();
        assert_eq!(m.accepted, 1);
        assert!((m.mean - 7.0).abs() < 1e-12);
        assert_eq!(m.std_err, 0.0);
    }

    #[test]
    fn test_zero_count_rejected() {
        let err = measure(0, Duration::ZERO, || Ok(0.0)).unwrap_err();
        assert!(matches!(err, Error::ZeroCount { .. }));
    }

    #[test]
    fn test_sample_error_propagates() {
        let mut calls = 0;
        let err = measure(3, Duration::ZERO, || {
            calls += 1;
            if calls == 2 {
                Err(Error::Measurement("device timeout".into()))
            } else {
                Ok(1.0)
            }
        })
        .unwrap_err();
        assert!(matches!(err, Error::Measurement(_)));
    }
}
