use ndarray::Array1;

use crate::constants::SWEEP_STOP_EPS;
use crate::error::ModelError;

/// An ordered, validated frequency sweep (Hz).
///
/// Strictly increasing positive finite values, length >= 1. Immutable once
/// constructed; every model evaluation in a run is aligned to one sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencySweep {
    points: Vec<f64>,
}

impl FrequencySweep {
    /// Validate an explicit list of frequencies.
    pub fn from_points(points: Vec<f64>) -> Result<Self, ModelError> {
        if points.is_empty() {
            return Err(ModelError::EmptySweep);
        }
        let mut previous = 0.0;
        for (index, &value) in points.iter().enumerate() {
            if !(value > 0.0) || !value.is_finite() {
                return Err(ModelError::NonPositiveFrequency { frequency: value });
            }
            if value <= previous {
                return Err(ModelError::NonMonotonicSweep {
                    index,
                    previous,
                    value,
                });
            }
            previous = value;
        }
        Ok(Self { points })
    }

    /// Logarithmic sweep with `per_decade` points per decade, fstart..=fstop.
    pub fn decade(fstart: f64, fstop: f64, per_decade: usize) -> Result<Self, ModelError> {
        if !(fstart > 0.0) || !fstart.is_finite() {
            return Err(ModelError::NonPositiveFrequency { frequency: fstart });
        }
        if fstop <= fstart || per_decade < 1 {
            return Err(ModelError::EmptySweep);
        }
        let ratio = 10f64.powf(1.0 / per_decade as f64);
        let mut points = Vec::new();
        let mut f = fstart;
        while f <= fstop * (1.0 + SWEEP_STOP_EPS) {
            points.push(f);
            f *= ratio;
        }
        Self::from_points(points)
    }

    /// Linear sweep with `n` points, fstart..=fstop.
    pub fn linear(fstart: f64, fstop: f64, n: usize) -> Result<Self, ModelError> {
        if n == 0 {
            return Err(ModelError::EmptySweep);
        }
        if n == 1 {
            return Self::from_points(vec![fstart]);
        }
        let step = (fstop - fstart) / ((n - 1) as f64);
        Self::from_points((0..n).map(|k| fstart + k as f64 * step).collect())
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().copied()
    }

    pub fn points(&self) -> &[f64] {
        &self.points
    }

    pub fn to_array(&self) -> Array1<f64> {
        Array1::from_vec(self.points.clone())
    }
}
