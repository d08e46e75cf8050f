//! Spike removal for a single measurement series.
//!
//! Detection uses a median-neighborhood residual: each sample is compared
//! against the median of up to `window / 2` neighbors on each side of it
//! (the sample itself excluded). The residual is judged in units of robust
//! local scale, 1.4826 × MAD of the neighbors about their median; when the
//! neighborhood spread is degenerate (zero) the global MAD of the series is
//! used instead, so a lone spike in a flat series is still caught.
//!
//! Boundary policy: neighborhoods are clipped at the series edges rather
//! than re-balanced toward the interior, so the reference stays local and
//! deterministic. Flagged samples are reconstructed by linear interpolation
//! over the non-flagged (x, y) pairs only; a flagged first or last sample
//! falls outside the kept x-range and is extrapolated from the nearest two
//! kept samples instead of failing.
//!
//! `smooth` is a pure function: non-flagged positions are copied
//! bit-identically, identical inputs yield identical outputs.

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use super::model::{Dataset, HeatingRate, SmoothingResult};

/// Fewest samples a series may hold: every index then has two neighbors.
pub const MIN_POINTS: usize = 3;

/// Consistency constant relating the MAD to the standard deviation of a
/// normal distribution.
const MAD_SCALE: f64 = 1.4826;

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// Tunable knobs of the spike detector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothParams {
    /// Neighborhood size used to judge each sample. Odd, >= 3.
    pub window: usize,
    /// Residuals beyond `threshold` local scale units flag a spike.
    pub threshold: f64,
}

impl Default for SmoothParams {
    fn default() -> Self {
        Self {
            window: 5,
            threshold: 3.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why a series could not be despiked. All variants are recoverable by the
/// caller (fix the input, or widen the window / lower the threshold).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DespikeError {
    #[error("x has {x_len} samples but y has {y_len}")]
    MismatchedLengths { x_len: usize, y_len: usize },
    #[error("series has {got} samples, need at least {min}")]
    TooFewPoints { got: usize, min: usize },
    #[error("x[{0}] is not finite")]
    NonFiniteX(usize),
    #[error("x must be non-decreasing, x[{0}] drops below its predecessor")]
    UnsortedX(usize),
    #[error("window must be an odd integer >= 3, got {0}")]
    InvalidWindow(usize),
    #[error("threshold must be finite and non-negative, got {0}")]
    InvalidThreshold(f64),
    #[error("all {0} samples were flagged as spikes, no trustworthy points remain")]
    DegenerateSeries(usize),
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Despike one series.
///
/// Returns the cleaned y-values (same length and x-alignment as the input)
/// and the set of indices that were replaced. Positions that were not
/// flagged are copied from the input unchanged.
pub fn smooth(
    x: &[f64],
    y: &[f64],
    params: &SmoothParams,
) -> Result<SmoothingResult, DespikeError> {
    validate(x, y, params)?;

    let spike_indices = detect_spikes(y, params);
    let kept: Vec<usize> = (0..y.len()).filter(|i| !spike_indices.contains(i)).collect();
    if kept.is_empty() {
        return Err(DespikeError::DegenerateSeries(y.len()));
    }

    let mut cleaned_y = y.to_vec();
    for &i in &spike_indices {
        cleaned_y[i] = reconstruct_at(x, y, &kept, x[i]);
    }

    Ok(SmoothingResult {
        cleaned_y,
        spike_indices,
    })
}

/// Despike every series of a dataset independently.
///
/// One degenerate or invalid series does not discard the others; the caller
/// decides what to do with each per-rate outcome.
pub fn smooth_dataset(
    dataset: &Dataset,
    params: &SmoothParams,
) -> BTreeMap<HeatingRate, Result<SmoothingResult, DespikeError>> {
    dataset
        .series
        .iter()
        .map(|(&rate, series)| (rate, smooth(&series.x, &series.y, params)))
        .collect()
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Fail-fast input checks, cheapest first.
fn validate(x: &[f64], y: &[f64], params: &SmoothParams) -> Result<(), DespikeError> {
    if x.len() != y.len() {
        return Err(DespikeError::MismatchedLengths {
            x_len: x.len(),
            y_len: y.len(),
        });
    }
    if x.len() < MIN_POINTS {
        return Err(DespikeError::TooFewPoints {
            got: x.len(),
            min: MIN_POINTS,
        });
    }
    if params.window < 3 || params.window % 2 == 0 {
        return Err(DespikeError::InvalidWindow(params.window));
    }
    if !params.threshold.is_finite() || params.threshold < 0.0 {
        return Err(DespikeError::InvalidThreshold(params.threshold));
    }
    for i in 0..x.len() {
        if !x[i].is_finite() {
            return Err(DespikeError::NonFiniteX(i));
        }
        if i > 0 && x[i] < x[i - 1] {
            return Err(DespikeError::UnsortedX(i));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Detection
// ---------------------------------------------------------------------------

fn detect_spikes(y: &[f64], params: &SmoothParams) -> BTreeSet<usize> {
    let n = y.len();
    let half = params.window / 2;
    let mut spikes = BTreeSet::new();

    // Fallback scale for neighborhoods with zero spread.
    let global_scale = global_mad_scale(y);

    for i in 0..n {
        if !y[i].is_finite() {
            // A non-measurement is always reconstructed.
            spikes.insert(i);
            continue;
        }

        let lo = i.saturating_sub(half);
        let hi = (i + half).min(n - 1);
        let neighbors: Vec<f64> = (lo..=hi)
            .filter(|&j| j != i)
            .map(|j| y[j])
            .filter(|v| v.is_finite())
            .collect();
        if neighbors.is_empty() {
            // Nothing to judge against.
            continue;
        }

        let reference = median(&neighbors);
        let residual = (y[i] - reference).abs();

        let deviations: Vec<f64> = neighbors.iter().map(|v| (v - reference).abs()).collect();
        let mut scale = MAD_SCALE * median(&deviations);
        if scale == 0.0 {
            scale = global_scale;
        }

        if residual > params.threshold * scale {
            spikes.insert(i);
        }
    }

    spikes
}

/// Robust spread of the whole series: 1.4826 × MAD about the global median.
fn global_mad_scale(y: &[f64]) -> f64 {
    let finite: Vec<f64> = y.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return 0.0;
    }
    let center = median(&finite);
    let deviations: Vec<f64> = finite.iter().map(|v| (v - center).abs()).collect();
    MAD_SCALE * median(&deviations)
}

/// Median via quickselect; even lengths average the two middle values.
fn median(values: &[f64]) -> f64 {
    debug_assert!(!values.is_empty());
    let mut vals = values.to_vec();
    let mid = vals.len() / 2;
    if vals.len() % 2 == 0 {
        vals.select_nth_unstable_by(mid, |a, b| a.total_cmp(b));
        let upper = vals[mid];
        let lower = vals[..mid].iter().copied().fold(f64::NEG_INFINITY, f64::max);
        (lower + upper) / 2.0
    } else {
        let (_, m, _) = vals.select_nth_unstable_by(mid, |a, b| a.total_cmp(b));
        *m
    }
}

// ---------------------------------------------------------------------------
// Reconstruction
// ---------------------------------------------------------------------------

/// Rebuild a value at `xq` from the trustworthy samples only.
///
/// Inside the kept x-range this is linear interpolation between the
/// bracketing kept samples. Outside it (a flagged first or last sample) the
/// segment through the two nearest kept samples is extended. A single kept
/// sample pins the whole reconstruction.
fn reconstruct_at(x: &[f64], y: &[f64], kept: &[usize], xq: f64) -> f64 {
    if kept.len() == 1 {
        return y[kept[0]];
    }

    // First kept sample with x >= xq.
    let pos = kept.partition_point(|&k| x[k] < xq);
    let (a, b) = if pos == 0 {
        (kept[0], kept[1])
    } else if pos == kept.len() {
        (kept[kept.len() - 2], kept[kept.len() - 1])
    } else {
        (kept[pos - 1], kept[pos])
    };

    let (x0, y0) = (x[a], y[a]);
    let (x1, y1) = (x[b], y[b]);
    if x1 == x0 {
        // Repeated temperature reading, the segment carries no slope.
        return (y0 + y1) / 2.0;
    }
    y0 + (xq - x0) * (y1 - y0) / (x1 - x0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Series;

    fn ramp(n: usize) -> (Vec<f64>, Vec<f64>) {
        let x: Vec<f64> = (0..n).map(|i| i as f64).collect();
        let y = x.clone();
        (x, y)
    }

    #[test]
    fn lone_spike_is_replaced_by_interpolation() {
        let (x, mut y) = ramp(10);
        y[4] = 100.0;

        let result = smooth(&x, &y, &SmoothParams::default()).unwrap();

        assert_eq!(result.spike_indices, BTreeSet::from([4]));
        assert_eq!(result.cleaned_y[4], 4.0);
        for i in (0..10).filter(|&i| i != 4) {
            assert_eq!(result.cleaned_y[i], y[i]);
        }
    }

    #[test]
    fn clean_data_passes_through_untouched() {
        let (x, y) = ramp(20);
        let result = smooth(&x, &y, &SmoothParams::default()).unwrap();
        assert!(result.spike_indices.is_empty());
        assert_eq!(result.cleaned_y, y);
    }

    #[test]
    fn flat_series_is_never_flagged() {
        let x: Vec<f64> = (0..8).map(|i| i as f64).collect();
        let y = vec![5.0; 8];
        let result = smooth(&x, &y, &SmoothParams::default()).unwrap();
        assert!(result.spike_indices.is_empty());
        assert_eq!(result.cleaned_y, y);
    }

    #[test]
    fn spike_in_flat_series_is_caught_via_global_scale() {
        let x: Vec<f64> = (0..9).map(|i| i as f64).collect();
        let mut y = vec![5.0; 9];
        y[4] = 100.0;

        let result = smooth(&x, &y, &SmoothParams::default()).unwrap();

        assert_eq!(result.spike_indices, BTreeSet::from([4]));
        assert_eq!(result.cleaned_y[4], 5.0);
    }

    #[test]
    fn shape_is_preserved() {
        let (x, mut y) = ramp(31);
        y[7] = -50.0;
        y[20] = 90.0;
        let result = smooth(&x, &y, &SmoothParams::default()).unwrap();
        assert_eq!(result.cleaned_y.len(), y.len());
    }

    #[test]
    fn smoothing_is_deterministic() {
        let (x, mut y) = ramp(15);
        y[3] = 77.0;
        y[11] = -40.0;
        let params = SmoothParams::default();
        let first = smooth(&x, &y, &params).unwrap();
        let second = smooth(&x, &y, &params).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn first_sample_spike_is_extrapolated() {
        let (x, mut y) = ramp(10);
        y[0] = 100.0;

        let result = smooth(&x, &y, &SmoothParams::default()).unwrap();

        assert_eq!(result.spike_indices, BTreeSet::from([0]));
        // Line through (1, 1) and (2, 2) extended back to x = 0.
        assert!((result.cleaned_y[0] - 0.0).abs() < 1e-12);
    }

    #[test]
    fn last_sample_spike_is_extrapolated() {
        let (x, mut y) = ramp(10);
        y[9] = 100.0;

        let result = smooth(&x, &y, &SmoothParams::default()).unwrap();

        assert_eq!(result.spike_indices, BTreeSet::from([9]));
        // Line through (7, 7) and (8, 8) extended forward to x = 9.
        assert!((result.cleaned_y[9] - 9.0).abs() < 1e-12);
    }

    #[test]
    fn nan_measurement_is_flagged_and_rebuilt() {
        let x: Vec<f64> = (0..6).map(|i| i as f64).collect();
        let y = vec![0.0, 1.0, 2.0, f64::NAN, 4.0, 5.0];

        let result = smooth(&x, &y, &SmoothParams::default()).unwrap();

        assert_eq!(result.spike_indices, BTreeSet::from([3]));
        assert!((result.cleaned_y[3] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn fully_alternating_series_is_degenerate() {
        let x = vec![0.0, 1.0, 2.0, 3.0];
        let y = vec![0.0, 100.0, 0.0, 100.0];
        let params = SmoothParams {
            window: 3,
            threshold: 0.5,
        };
        assert_eq!(
            smooth(&x, &y, &params),
            Err(DespikeError::DegenerateSeries(4))
        );
    }

    #[test]
    fn window_larger_than_series_shrinks_at_the_edges() {
        let (x, mut y) = ramp(10);
        y[4] = 100.0;
        let params = SmoothParams {
            window: 21,
            threshold: 3.0,
        };
        let result = smooth(&x, &y, &params).unwrap();
        assert_eq!(result.spike_indices, BTreeSet::from([4]));
    }

    #[test]
    fn rejects_mismatched_lengths() {
        let err = smooth(&[0.0, 1.0, 2.0], &[0.0, 1.0], &SmoothParams::default()).unwrap_err();
        assert_eq!(err, DespikeError::MismatchedLengths { x_len: 3, y_len: 2 });
    }

    #[test]
    fn rejects_too_short_series() {
        let err = smooth(&[0.0, 10.0], &[1.0, 2.0], &SmoothParams::default()).unwrap_err();
        assert_eq!(err, DespikeError::TooFewPoints { got: 2, min: 3 });
    }

    #[test]
    fn rejects_bad_window_and_threshold() {
        let (x, y) = ramp(10);
        let even = SmoothParams { window: 4, threshold: 3.0 };
        assert_eq!(smooth(&x, &y, &even), Err(DespikeError::InvalidWindow(4)));

        let tiny = SmoothParams { window: 1, threshold: 3.0 };
        assert_eq!(smooth(&x, &y, &tiny), Err(DespikeError::InvalidWindow(1)));

        let negative = SmoothParams { window: 5, threshold: -1.0 };
        assert_eq!(
            smooth(&x, &y, &negative),
            Err(DespikeError::InvalidThreshold(-1.0))
        );
    }

    #[test]
    fn rejects_unsorted_or_non_finite_x() {
        let y = vec![0.0, 1.0, 2.0, 3.0];

        let unsorted = vec![0.0, 2.0, 1.0, 3.0];
        assert_eq!(
            smooth(&unsorted, &y, &SmoothParams::default()),
            Err(DespikeError::UnsortedX(2))
        );

        let non_finite = vec![0.0, f64::NAN, 2.0, 3.0];
        assert_eq!(
            smooth(&non_finite, &y, &SmoothParams::default()),
            Err(DespikeError::NonFiniteX(1))
        );
    }

    #[test]
    fn dataset_series_are_smoothed_independently() {
        let mut dataset = Dataset::default();
        let (x, y) = ramp(10);
        dataset.series.insert(HeatingRate::OneK, Series { x: x.clone(), y });

        let mut spiked = x.clone();
        spiked[5] = -200.0;
        dataset
            .series
            .insert(HeatingRate::TenK, Series { x, y: spiked });

        let outcomes = smooth_dataset(&dataset, &SmoothParams::default());

        let clean = outcomes[&HeatingRate::OneK].as_ref().unwrap();
        assert!(clean.spike_indices.is_empty());

        let fixed = outcomes[&HeatingRate::TenK].as_ref().unwrap();
        assert_eq!(fixed.spike_indices, BTreeSet::from([5]));
        assert!((fixed.cleaned_y[5] - 5.0).abs() < 1e-12);
    }

    #[test]
    fn dataset_failure_does_not_discard_other_series() {
        let mut dataset = Dataset::default();
        let (x, y) = ramp(10);
        dataset.series.insert(HeatingRate::OneK, Series { x, y });
        dataset.series.insert(
            HeatingRate::SixK,
            Series { x: vec![0.0, 1.0], y: vec![0.0, 1.0] },
        );

        let outcomes = smooth_dataset(&dataset, &SmoothParams::default());
        assert!(outcomes[&HeatingRate::OneK].is_ok());
        assert_eq!(
            outcomes[&HeatingRate::SixK],
            Err(DespikeError::TooFewPoints { got: 2, min: 3 })
        );
    }

    #[test]
    fn median_handles_even_and_odd_lengths() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
        assert_eq!(median(&[7.0]), 7.0);
    }
}
