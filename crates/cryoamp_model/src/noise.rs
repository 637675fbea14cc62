//! Noise aggregation engine.
//!
//! Every source is modeled at its physical origin, referred to the
//! amplifier input by the partial gain between that origin and the input,
//! and combined in quadrature. The budget keeps sources by name so one
//! contribution can be swapped for a sensitivity sweep without touching
//! the others.

use ndarray::Array1;
use num_complex::Complex64;
use serde::Deserialize;

use crate::constants::{BOLTZMANN, ELECTRON_CHARGE};
use crate::error::ModelError;
use crate::gain::{ChargeAmplifier, GainSolution};
use crate::stages::GainStage;
use crate::sweep::FrequencySweep;

/// Standard source names used by [`ChargeAmplifier::noise_budget`].
pub const EN_FEEDBACK: &str = "en_fb";
pub const EN_HEMT: &str = "en_hemt";
pub const EN_LOAD: &str = "en_load";
pub const EN_SHOT: &str = "en_shot";
pub const EN_OPAMP: &str = "en_opamp";

/// Free parameters of the standard budget.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct NoiseSettings {
    /// Physical temperature of the feedback network (K).
    pub feedback_temperature_k: f64,
    /// Physical temperature of the HEMT drain load (K).
    pub load_temperature_k: f64,
    /// Collector bias current of the mirror BJT (A).
    pub bjt_bias_current_a: f64,
}

impl Default for NoiseSettings {
    fn default() -> Self {
        Self {
            feedback_temperature_k: 4.0,
            load_temperature_k: 300.0,
            bjt_bias_current_a: 1e-3,
        }
    }
}

/// A set of named, input-referred noise densities aligned to one sweep.
///
/// Invariant: every stored array is input-referred, in V/sqrt(Hz), with
/// one entry per sweep point.
#[derive(Debug, Clone)]
pub struct NoiseBudget {
    points: usize,
    sources: Vec<(String, Array1<f64>)>,
}

impl NoiseBudget {
    pub fn new(points: usize) -> Self {
        Self {
            points,
            sources: Vec::new(),
        }
    }

    fn validate(&self, name: &str, density: &Array1<f64>) -> Result<(), ModelError> {
        if density.len() != self.points {
            return Err(ModelError::SweepLengthMismatch {
                expected: self.points,
                got: density.len(),
            });
        }
        for (index, &value) in density.iter().enumerate() {
            if !value.is_finite() || value < 0.0 {
                return Err(ModelError::InvalidNoiseDensity {
                    name: name.to_string(),
                    index,
                });
            }
        }
        Ok(())
    }

    /// Add a new input-referred source. Duplicate names are configuration
    /// errors.
    pub fn insert(&mut self, name: &str, density: Array1<f64>) -> Result<(), ModelError> {
        if self.sources.iter().any(|(n, _)| n == name) {
            return Err(ModelError::DuplicateNoiseSource {
                name: name.to_string(),
            });
        }
        self.validate(name, &density)?;
        self.sources.push((name.to_string(), density));
        Ok(())
    }

    /// Substitute one source's contribution, leaving the others untouched.
    pub fn replace(&mut self, name: &str, density: Array1<f64>) -> Result<(), ModelError> {
        self.validate(name, &density)?;
        match self.sources.iter_mut().find(|(n, _)| n == name) {
            Some((_, slot)) => {
                *slot = density;
                Ok(())
            }
            None => Err(ModelError::UnknownNoiseSource {
                name: name.to_string(),
            }),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Array1<f64>> {
        self.sources
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, density)| density)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Array1<f64>)> {
        self.sources
            .iter()
            .map(|(name, density)| (name.as_str(), density))
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Total input-referred density: root-sum-of-squares across sources,
    /// valid because each source is modeled as statistically independent.
    pub fn total_input(&self) -> Array1<f64> {
        let mut total = Array1::<f64>::zeros(self.points);
        for (_, density) in &self.sources {
            for (slot, &value) in total.iter_mut().zip(density.iter()) {
                *slot += value * value;
            }
        }
        total.mapv_inplace(f64::sqrt);
        total
    }

    /// Total output-referred density: `|e_total * A_total_closed|`.
    pub fn total_output(
        &self,
        a_total_closed: &Array1<Complex64>,
    ) -> Result<Array1<f64>, ModelError> {
        if a_total_closed.len() != self.points {
            return Err(ModelError::SweepLengthMismatch {
                expected: self.points,
                got: a_total_closed.len(),
            });
        }
        let total = self.total_input();
        Ok(Array1::from_iter(
            total
                .iter()
                .zip(a_total_closed.iter())
                .map(|(&e, a)| (e * a.norm()).abs()),
        ))
    }
}

impl ChargeAmplifier {
    /// Build the standard five-source budget for a solved sweep.
    ///
    /// Referral paths: feedback thermal noise divides by the total closed
    /// loop; load thermal noise and op-amp noise enter downstream of the
    /// HEMT gate and divide by the HEMT open-loop gain; shot noise is a
    /// current converted through the transconductance; HEMT noise is
    /// input-referred by definition.
    pub fn noise_budget(
        &self,
        sweep: &FrequencySweep,
        solution: &GainSolution,
        settings: &NoiseSettings,
    ) -> Result<NoiseBudget, ModelError> {
        if !(settings.bjt_bias_current_a > 0.0) || !settings.bjt_bias_current_a.is_finite() {
            return Err(ModelError::NonPositiveBiasCurrent {
                amps: settings.bjt_bias_current_a,
            });
        }
        for kelvin in [
            settings.feedback_temperature_k,
            settings.load_temperature_k,
        ] {
            if kelvin < 0.0 {
                return Err(ModelError::NegativeTemperature { kelvin });
            }
        }

        let n = sweep.len();
        if solution.a_total_closed.len() != n {
            return Err(ModelError::SweepLengthMismatch {
                expected: n,
                got: solution.a_total_closed.len(),
            });
        }

        let mut budget = NoiseBudget::new(n);

        let mut en_fb = Vec::with_capacity(n);
        let mut en_hemt = Vec::with_capacity(n);
        let mut en_load = Vec::with_capacity(n);
        let mut en_opamp = Vec::with_capacity(n);
        let shot_voltage = (2.0 * ELECTRON_CHARGE * settings.bjt_bias_current_a).sqrt()
            / self.front_end.hemt().transconductance();

        for (i, f) in sweep.iter().enumerate() {
            let thermal_fb = (4.0
                * BOLTZMANN
                * settings.feedback_temperature_k
                * solution.z_feedback[i].re)
                .sqrt();
            en_fb.push(thermal_fb / solution.a_total_closed[i].norm());

            en_hemt.push(self.front_end.input_voltage_noise(f)?);

            let thermal_load =
                (4.0 * BOLTZMANN * settings.load_temperature_k * solution.z_load[i].re).sqrt();
            en_load.push(thermal_load / solution.a_hemt_open[i].norm());

            en_opamp.push(self.opamp.input_voltage_noise(f)? / solution.a_hemt_open[i].norm());
        }

        budget.insert(EN_FEEDBACK, Array1::from_vec(en_fb))?;
        budget.insert(EN_HEMT, Array1::from_vec(en_hemt))?;
        budget.insert(EN_LOAD, Array1::from_vec(en_load))?;
        budget.insert(EN_SHOT, Array1::from_elem(n, shot_voltage))?;
        budget.insert(EN_OPAMP, Array1::from_vec(en_opamp))?;
        Ok(budget)
    }
}
