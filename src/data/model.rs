use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// ---------------------------------------------------------------------------
// HeatingRate – the fixed set of measurement runs
// ---------------------------------------------------------------------------

/// One of the heating rates (K/min) a dilatometer run was recorded at.
/// The set is fixed; an uploaded file may contain any subset of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HeatingRate {
    OneK,
    ThreeK,
    SixK,
    TenK,
}

impl HeatingRate {
    /// All rates in ascending order.
    pub const ALL: [HeatingRate; 4] = [
        HeatingRate::OneK,
        HeatingRate::ThreeK,
        HeatingRate::SixK,
        HeatingRate::TenK,
    ];

    /// The label used in file headers and the UI.
    pub fn label(self) -> &'static str {
        match self {
            HeatingRate::OneK => "1K/min",
            HeatingRate::ThreeK => "3K/min",
            HeatingRate::SixK => "6K/min",
            HeatingRate::TenK => "10K/min",
        }
    }

    /// Parse a header label back into a rate.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|r| r.label() == label.trim())
    }
}

impl fmt::Display for HeatingRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Series – one heating rate's measurements
// ---------------------------------------------------------------------------

/// The measurement series of a single heating rate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Series {
    /// Temperature axis (x), non-decreasing.
    pub x: Vec<f64>,
    /// CTE axis (y) – same length as `x`.
    pub y: Vec<f64>,
}

impl Series {
    /// Number of samples.
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// Whether the series holds no samples.
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded file
// ---------------------------------------------------------------------------

/// The full parsed dataset: one series per heating rate present in the file.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub series: BTreeMap<HeatingRate, Series>,
}

impl Dataset {
    /// Number of table rows needed to show every series.
    pub fn rows(&self) -> usize {
        self.series.values().map(Series::len).max().unwrap_or(0)
    }

    /// Number of heating rates present.
    pub fn rate_count(&self) -> usize {
        self.series.len()
    }
}

// ---------------------------------------------------------------------------
// SmoothingResult – output of the despiking core for one series
// ---------------------------------------------------------------------------

/// Cleaned values for one series plus the indices that were replaced.
/// Positions not in `spike_indices` are bit-identical to the input.
#[derive(Debug, Clone, PartialEq)]
pub struct SmoothingResult {
    pub cleaned_y: Vec<f64>,
    pub spike_indices: BTreeSet<usize>,
}

impl SmoothingResult {
    /// Number of samples that were replaced.
    pub fn spike_count(&self) -> usize {
        self.spike_indices.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_round_trip() {
        for rate in HeatingRate::ALL {
            assert_eq!(HeatingRate::from_label(rate.label()), Some(rate));
        }
        assert_eq!(HeatingRate::from_label(" 6K/min "), Some(HeatingRate::SixK));
        assert_eq!(HeatingRate::from_label("2K/min"), None);
    }

    #[test]
    fn dataset_rows_spans_longest_series() {
        let mut series = BTreeMap::new();
        series.insert(
            HeatingRate::OneK,
            Series { x: vec![0.0, 1.0], y: vec![0.1, 0.2] },
        );
        series.insert(
            HeatingRate::TenK,
            Series { x: vec![0.0, 1.0, 2.0], y: vec![0.1, 0.2, 0.3] },
        );
        let dataset = Dataset { series };
        assert_eq!(dataset.rows(), 3);
        assert_eq!(dataset.rate_count(), 2);
    }

    #[test]
    fn empty_dataset_has_no_rows() {
        assert_eq!(Dataset::default().rows(), 0);
    }
}
