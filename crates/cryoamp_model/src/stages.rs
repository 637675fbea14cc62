//! Active stages: the cryogenic HEMT front-end and the room-temperature
//! op-amp. The loop solver only sees the [`GainStage`] capability, so
//! calibrations are swappable without touching any call site.

use num_complex::Complex64;
use serde::Deserialize;

use crate::components::{Capacitor, Resistor};
use crate::error::ModelError;
use crate::impedance::{Impedance, parallel};

/// Capability surface of an amplifying stage.
pub trait GainStage {
    /// Complex open-loop gain at `frequency`.
    fn open_loop_gain(&self, frequency: f64) -> Result<Complex64, ModelError>;

    /// Input-referred voltage noise density (V/sqrt(Hz)) at `frequency`.
    fn input_voltage_noise(&self, frequency: f64) -> Result<f64, ModelError>;
}

/// 1/f-plus-flat voltage noise: `flat * (corner/f + 1)`.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct OneOverFNoise {
    /// Frequency below which the 1/f term dominates (Hz).
    pub corner_hz: f64,
    /// White-noise floor (V/sqrt(Hz)).
    pub flat_level: f64,
}

impl Default for OneOverFNoise {
    fn default() -> Self {
        Self {
            corner_hz: 1e3,
            flat_level: 0.25e-9,
        }
    }
}

impl OneOverFNoise {
    pub fn density(&self, frequency: f64) -> Result<f64, ModelError> {
        if !(frequency > 0.0) || !frequency.is_finite() {
            return Err(ModelError::NonPositiveFrequency { frequency });
        }
        Ok(self.flat_level * (self.corner_hz / frequency + 1.0))
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct HemtParams {
    /// Gate leak resistance (Ohms).
    pub gate_resistance: f64,
    /// Gate-source capacitance (Farads).
    pub gate_source_capacitance: f64,
    /// Transconductance in millisiemens.
    pub transconductance_ms: f64,
    pub noise: OneOverFNoise,
}

impl Default for HemtParams {
    fn default() -> Self {
        Self {
            gate_resistance: 1e12,
            gate_source_capacitance: 100e-12,
            transconductance_ms: 35.0,
            noise: OneOverFNoise::default(),
        }
    }
}

/// Cryogenic HEMT transconductance stage.
///
/// The bare device has no voltage gain of its own; it becomes a
/// [`GainStage`] once a drain load is attached (see `gain::HemtStage`).
/// The device exposes its gate impedance, transconductance and noise.
#[derive(Debug, Clone)]
pub struct Hemt {
    gate_resistor: Resistor,
    gate_source: Capacitor,
    transconductance: f64,
    noise: OneOverFNoise,
}

impl Hemt {
    pub fn new(params: &HemtParams) -> Result<Self, ModelError> {
        if !(params.transconductance_ms > 0.0) || !params.transconductance_ms.is_finite() {
            return Err(ModelError::NonPositiveTransconductance {
                millisiemens: params.transconductance_ms,
            });
        }
        Ok(Self {
            gate_resistor: Resistor::new(params.gate_resistance, "Rg")?,
            gate_source: Capacitor::new(params.gate_source_capacitance, "Cgs")?,
            // stored in Siemens
            transconductance: params.transconductance_ms * 1e-3,
            noise: params.noise,
        })
    }

    /// Transconductance in Siemens.
    pub fn transconductance(&self) -> f64 {
        self.transconductance
    }

    /// Impedance looking into the gate: `parallel(Rg, Cgs)`.
    pub fn input_impedance(&self, f: f64) -> Result<Complex64, ModelError> {
        parallel(
            self.gate_resistor.impedance(f)?,
            self.gate_source.impedance(f)?,
            f,
        )
    }

    pub fn input_voltage_noise(&self, frequency: f64) -> Result<f64, ModelError> {
        self.noise.density(frequency)
    }
}

/// Op-amp small-signal calibration. Preset constructors are the strategy
/// switch: pick one, or fill the fields directly for a custom part.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct OpAmpParams {
    /// Flat-band open-loop gain (V/V).
    pub flat_gain: f64,
    /// Dominant pole (Hz).
    pub pole1_hz: f64,
    /// Second pole (Hz).
    pub pole2_hz: f64,
    pub noise: OneOverFNoise,
}

impl Default for OpAmpParams {
    fn default() -> Self {
        Self::lt1677()
    }
}

impl OpAmpParams {
    /// LT1677-like low-noise bipolar calibration.
    pub fn lt1677() -> Self {
        Self {
            flat_gain: 1e6,
            pole1_hz: 15.0,
            pole2_hz: 10e6,
            noise: OneOverFNoise {
                corner_hz: 13.0,
                flat_level: 3.2e-9,
            },
        }
    }

    /// AD745-like JFET calibration, wider bandwidth and higher corner.
    pub fn ad745() -> Self {
        Self {
            flat_gain: 4e6,
            pole1_hz: 5.0,
            pole2_hz: 20e6,
            noise: OneOverFNoise {
                corner_hz: 120.0,
                flat_level: 2.9e-9,
            },
        }
    }
}

/// Two-pole op-amp model: `A(f) = A_flat / ((1 + i f/p1)(1 + i f/p2))`.
#[derive(Debug, Clone)]
pub struct OpAmp {
    params: OpAmpParams,
}

impl OpAmp {
    pub fn new(params: OpAmpParams) -> Result<Self, ModelError> {
        for (kind, value) in [
            ("flat gain", params.flat_gain),
            ("pole frequency", params.pole1_hz),
            ("pole frequency", params.pole2_hz),
        ] {
            if !(value > 0.0) || !value.is_finite() {
                return Err(ModelError::InvalidComponentValue {
                    kind,
                    label: "opamp".to_string(),
                    value,
                });
            }
        }
        Ok(Self { params })
    }

    pub fn params(&self) -> &OpAmpParams {
        &self.params
    }
}

impl GainStage for OpAmp {
    fn open_loop_gain(&self, frequency: f64) -> Result<Complex64, ModelError> {
        if !(frequency > 0.0) || !frequency.is_finite() {
            return Err(ModelError::NonPositiveFrequency { frequency });
        }
        let one = Complex64::new(1.0, 0.0);
        let p1 = one + Complex64::new(0.0, frequency / self.params.pole1_hz);
        let p2 = one + Complex64::new(0.0, frequency / self.params.pole2_hz);
        Ok(Complex64::new(self.params.flat_gain, 0.0) / (p1 * p2))
    }

    fn input_voltage_noise(&self, frequency: f64) -> Result<f64, ModelError> {
        self.params.noise.density(frequency)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn opamp_gain_is_flat_below_the_dominant_pole_and_rolls_off_above() {
        let opamp = OpAmp::new(OpAmpParams::lt1677()).unwrap();
        let low = opamp.open_loop_gain(0.1).unwrap();
        assert!((low.norm() / 1e6 - 1.0).abs() < 1e-3);
        // one decade above the pole: magnitude down ~10x, phase near -90
        let above = opamp.open_loop_gain(150.0).unwrap();
        assert!((above.norm() / 1e5 - 1.0).abs() < 0.01);
        assert!(above.arg() < -1.4);
    }

    #[test]
    fn alternate_calibration_swaps_without_changing_the_call_site() {
        for params in [OpAmpParams::lt1677(), OpAmpParams::ad745()] {
            let stage = OpAmp::new(params).unwrap();
            let gain = stage.open_loop_gain(10.0).unwrap();
            assert!(gain.norm() > 0.0);
            assert!(stage.input_voltage_noise(10.0).unwrap() > 0.0);
        }
    }

    #[rstest]
    #[case(1.0, 1001.0)]
    #[case(1e3, 2.0)]
    #[case(1e6, 1.001)]
    fn one_over_f_noise_follows_corner_plus_flat(#[case] frequency: f64, #[case] factor: f64) {
        let noise = OneOverFNoise {
            corner_hz: 1e3,
            flat_level: 1e-9,
        };
        let density = noise.density(frequency).unwrap();
        assert!((density / (1e-9 * factor) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn hemt_input_impedance_is_the_gate_rc() {
        let hemt = Hemt::new(&HemtParams::default()).unwrap();
        // Cgs dominates everywhere above microhertz: 100 pF at 1 kHz
        let z = hemt.input_impedance(1e3).unwrap();
        assert!((z.norm() / 1.5915e6 - 1.0).abs() < 1e-3);
        assert!(z.im < 0.0);
    }

    #[test]
    fn hemt_stores_transconductance_in_siemens() {
        let hemt = Hemt::new(&HemtParams::default()).unwrap();
        assert!((hemt.transconductance() - 35e-3).abs() < 1e-12);
        assert!(
            Hemt::new(&HemtParams {
                transconductance_ms: 0.0,
                ..Default::default()
            })
            .is_err()
        );
    }
}
