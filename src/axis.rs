//! Frequency sample points of a single scan window

use std::ops::Index;

use crate::error::InvalidRangeError;

/// Ordered probing frequencies (MHz) from start towards stop
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyAxis {
    points: Vec<f64>,
}

impl FrequencyAxis {
    /// Build the axis for `start..=stop` in increments of `step`. The stop
    /// frequency is only included when the range is an integer number of steps.
    pub fn generate(start: f64, stop: f64, step: f64) -> Result<Self, InvalidRangeError> {
        let n = Self::point_count(start, stop, step)?;
        let (lo, hi) = if start < stop {
            (start, stop)
        } else {
            (stop, start)
        };
        let signed_step = step.copysign(stop - start);
        let points = (0..n)
            .map(|i| (start + i as f64 * signed_step).clamp(lo, hi))
            .collect();
        Ok(Self { points })
    }

    /// Number of points `generate` would produce, without building the axis
    pub fn point_count(start: f64, stop: f64, step: f64) -> Result<usize, InvalidRangeError> {
        if !start.is_finite() || !stop.is_finite() {
            return Err(InvalidRangeError::NotFinite { start, stop });
        }
        // Also catches NaN
        if !(step > 0.0) {
            return Err(InvalidRangeError::NonPositiveStep(step));
        }
        if start == stop {
            return Err(InvalidRangeError::EmptyRange(start));
        }
        Ok(((stop - start).abs() / step).floor() as usize + 1)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Never true for a generated axis, kept for API completeness
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> f64 {
        self.points[0]
    }

    pub fn last(&self) -> f64 {
        self.points[self.points.len() - 1]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.points
    }
}

impl Index<usize> for FrequencyAxis {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.points[index]
    }
}
