use std::f64::consts::PI;

use num_complex::Complex64;

use crate::constants::BOLTZMANN;
use crate::error::ModelError;
use crate::impedance::Impedance;

/// An ideal resistor (Ohms).
#[derive(Debug, Clone)]
pub struct Resistor {
    resistance: f64,
    label: String,
}

impl Resistor {
    pub fn new(resistance: f64, label: &str) -> Result<Self, ModelError> {
        if !(resistance > 0.0) || !resistance.is_finite() {
            return Err(ModelError::InvalidComponentValue {
                kind: "resistance",
                label: label.to_string(),
                value: resistance,
            });
        }
        Ok(Self {
            resistance,
            label: label.to_string(),
        })
    }

    pub fn resistance(&self) -> f64 {
        self.resistance
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Johnson noise voltage density (V/sqrt(Hz)) at temperature `kelvin`.
    ///
    /// White at the source, so frequency does not enter. Zero at 0 K.
    pub fn thermal_noise(&self, kelvin: f64) -> Result<f64, ModelError> {
        if kelvin < 0.0 {
            return Err(ModelError::NegativeTemperature { kelvin });
        }
        Ok((4.0 * BOLTZMANN * kelvin * self.resistance).sqrt())
    }
}

impl Impedance for Resistor {
    fn impedance(&self, frequency: f64) -> Result<Complex64, ModelError> {
        if !(frequency > 0.0) || !frequency.is_finite() {
            return Err(ModelError::NonPositiveFrequency { frequency });
        }
        Ok(Complex64::new(self.resistance, 0.0))
    }
}

/// An ideal capacitor (Farads).
#[derive(Debug, Clone)]
pub struct Capacitor {
    capacitance: f64,
    label: String,
}

impl Capacitor {
    pub fn new(capacitance: f64, label: &str) -> Result<Self, ModelError> {
        if !(capacitance > 0.0) || !capacitance.is_finite() {
            return Err(ModelError::InvalidComponentValue {
                kind: "capacitance",
                label: label.to_string(),
                value: capacitance,
            });
        }
        Ok(Self {
            capacitance,
            label: label.to_string(),
        })
    }

    pub fn capacitance(&self) -> f64 {
        self.capacitance
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl Impedance for Capacitor {
    fn impedance(&self, frequency: f64) -> Result<Complex64, ModelError> {
        if !(frequency > 0.0) || !frequency.is_finite() {
            return Err(ModelError::NonPositiveFrequency { frequency });
        }
        Ok(Complex64::new(
            0.0,
            -1.0 / (2.0 * PI * frequency * self.capacitance),
        ))
    }
}
