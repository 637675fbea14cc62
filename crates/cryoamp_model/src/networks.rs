//! The fixed catalog of passive sub-networks around the amplifier.
//!
//! Each network owns its components and exposes one pure impedance
//! function through the [`Impedance`] trait. Topologies are hand-derived
//! and fixed; every component value is an overridable parameter with a
//! documented default.

use num_complex::Complex64;
use serde::Deserialize;

use crate::components::{Capacitor, Resistor};
use crate::error::ModelError;
use crate::impedance::{Impedance, parallel, series};

/// Detector bias node on the cold stage.
///
/// `parallel(Rbias, Cdet)` in series with the coax coupling capacitor,
/// the result in parallel with the bleed resistor.
#[derive(Debug, Clone)]
pub struct DetectorBias {
    detector: Capacitor,
    bias: Resistor,
    bleed: Resistor,
    coupling: Capacitor,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct DetectorBiasParams {
    pub detector_capacitance: f64,
    pub bias_resistance: f64,
    pub bleed_resistance: f64,
    pub coupling_capacitance: f64,
}

impl Default for DetectorBiasParams {
    fn default() -> Self {
        Self {
            detector_capacitance: 200e-12,
            bias_resistance: 100e6,
            bleed_resistance: 100e6,
            coupling_capacitance: 10e-9,
        }
    }
}

impl DetectorBias {
    pub fn new(params: &DetectorBiasParams) -> Result<Self, ModelError> {
        Ok(Self {
            detector: Capacitor::new(params.detector_capacitance, "Cdet")?,
            bias: Resistor::new(params.bias_resistance, "Rbias")?,
            bleed: Resistor::new(params.bleed_resistance, "Rbleed")?,
            coupling: Capacitor::new(params.coupling_capacitance, "Cc")?,
        })
    }
}

impl Impedance for DetectorBias {
    fn impedance(&self, f: f64) -> Result<Complex64, ModelError> {
        let biased = parallel(self.bias.impedance(f)?, self.detector.impedance(f)?, f)?;
        let coupled = series(biased, self.coupling.impedance(f)?);
        parallel(coupled, self.bleed.impedance(f)?, f)
    }
}

/// Coupling capacitor from the cold stage into the HEMT gate.
#[derive(Debug, Clone)]
pub struct GateCoupling {
    gate: Capacitor,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct GateCouplingParams {
    pub gate_capacitance: f64,
}

impl Default for GateCouplingParams {
    fn default() -> Self {
        Self {
            gate_capacitance: 10e-12,
        }
    }
}

impl GateCoupling {
    pub fn new(params: &GateCouplingParams) -> Result<Self, ModelError> {
        Ok(Self {
            gate: Capacitor::new(params.gate_capacitance, "Ccg")?,
        })
    }
}

impl Impedance for GateCoupling {
    fn impedance(&self, f: f64) -> Result<Complex64, ModelError> {
        self.gate.impedance(f)
    }
}

/// Charge-integrating feedback network: `parallel(Cfb, Rfb)`.
#[derive(Debug, Clone)]
pub struct FeedbackNetwork {
    feedback_capacitor: Capacitor,
    feedback_resistor: Resistor,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct FeedbackNetworkParams {
    pub feedback_capacitance: f64,
    pub feedback_resistance: f64,
}

impl Default for FeedbackNetworkParams {
    fn default() -> Self {
        Self {
            feedback_capacitance: 0.25e-12,
            feedback_resistance: 400e6,
        }
    }
}

impl FeedbackNetwork {
    pub fn new(params: &FeedbackNetworkParams) -> Result<Self, ModelError> {
        Ok(Self {
            feedback_capacitor: Capacitor::new(params.feedback_capacitance, "Cfb")?,
            feedback_resistor: Resistor::new(params.feedback_resistance, "Rfb")?,
        })
    }
}

impl Impedance for FeedbackNetwork {
    fn impedance(&self, f: f64) -> Result<Complex64, ModelError> {
        parallel(
            self.feedback_capacitor.impedance(f)?,
            self.feedback_resistor.impedance(f)?,
            f,
        )
    }
}

/// Pole-cancellation network in the HEMT drain:
/// `parallel(series(Rseries, Ccomp), Rshunt)`.
#[derive(Debug, Clone)]
pub struct CompensationNetwork {
    series_resistor: Resistor,
    series_capacitor: Capacitor,
    shunt_resistor: Resistor,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct CompensationNetworkParams {
    pub series_resistance: f64,
    pub series_capacitance: f64,
    pub shunt_resistance: f64,
}

impl Default for CompensationNetworkParams {
    fn default() -> Self {
        Self {
            series_resistance: 800.0,
            series_capacitance: 10e-9,
            shunt_resistance: 1.6e3,
        }
    }
}

impl CompensationNetwork {
    pub fn new(params: &CompensationNetworkParams) -> Result<Self, ModelError> {
        Ok(Self {
            series_resistor: Resistor::new(params.series_resistance, "Rseries")?,
            series_capacitor: Capacitor::new(params.series_capacitance, "Ccomp")?,
            shunt_resistor: Resistor::new(params.shunt_resistance, "Rshunt")?,
        })
    }
}

impl Impedance for CompensationNetwork {
    fn impedance(&self, f: f64) -> Result<Complex64, ModelError> {
        let damped = series(
            self.series_resistor.impedance(f)?,
            self.series_capacitor.impedance(f)?,
        );
        parallel(damped, self.shunt_resistor.impedance(f)?, f)
    }
}

/// Load resistance of the current-mirror branch.
#[derive(Debug, Clone)]
pub struct MirrorLoad {
    mirror: Resistor,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct MirrorLoadParams {
    pub mirror_resistance: f64,
}

impl Default for MirrorLoadParams {
    fn default() -> Self {
        Self {
            mirror_resistance: 100.0,
        }
    }
}

impl MirrorLoad {
    pub fn new(params: &MirrorLoadParams) -> Result<Self, ModelError> {
        Ok(Self {
            mirror: Resistor::new(params.mirror_resistance, "Rmirror")?,
        })
    }
}

impl Impedance for MirrorLoad {
    fn impedance(&self, f: f64) -> Result<Complex64, ModelError> {
        self.mirror.impedance(f)
    }
}

/// Gain-setting divider around the room-temperature op-amp.
///
/// Ground leg: `series(Rtap, parallel(parallel(Rdiv1, Rdiv2), Cdiv))`.
/// Feedback leg: `parallel(Rofb, Cofb)`.
#[derive(Debug, Clone)]
pub struct OpAmpDivider {
    tap: Resistor,
    divider_a: Resistor,
    divider_b: Resistor,
    divider_capacitor: Capacitor,
    feedback_resistor: Resistor,
    feedback_capacitor: Capacitor,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct OpAmpDividerParams {
    pub tap_resistance: f64,
    pub divider_resistance_a: f64,
    pub divider_resistance_b: f64,
    pub divider_capacitance: f64,
    pub feedback_resistance: f64,
    pub feedback_capacitance: f64,
}

impl Default for OpAmpDividerParams {
    fn default() -> Self {
        Self {
            tap_resistance: 1e3,
            divider_resistance_a: 3.3e3,
            divider_resistance_b: 3.3e3,
            divider_capacitance: 100e-9,
            feedback_resistance: 1e9,
            feedback_capacitance: 20e-12,
        }
    }
}

impl OpAmpDivider {
    pub fn new(params: &OpAmpDividerParams) -> Result<Self, ModelError> {
        Ok(Self {
            tap: Resistor::new(params.tap_resistance, "Rtap")?,
            divider_a: Resistor::new(params.divider_resistance_a, "Rdiv1")?,
            divider_b: Resistor::new(params.divider_resistance_b, "Rdiv2")?,
            divider_capacitor: Capacitor::new(params.divider_capacitance, "Cdiv")?,
            feedback_resistor: Resistor::new(params.feedback_resistance, "Rofb")?,
            feedback_capacitor: Capacitor::new(params.feedback_capacitance, "Cofb")?,
        })
    }

    /// Ground-leg impedance of the divider.
    pub fn ground_leg(&self, f: f64) -> Result<Complex64, ModelError> {
        let pair = parallel(self.divider_a.impedance(f)?, self.divider_b.impedance(f)?, f)?;
        let shunted = parallel(pair, self.divider_capacitor.impedance(f)?, f)?;
        Ok(series(self.tap.impedance(f)?, shunted))
    }

    /// Feedback-leg impedance of the divider.
    pub fn feedback_leg(&self, f: f64) -> Result<Complex64, ModelError> {
        parallel(
            self.feedback_resistor.impedance(f)?,
            self.feedback_capacitor.impedance(f)?,
            f,
        )
    }
}
