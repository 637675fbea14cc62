//! Loop-gain / closed-loop solver for the cascaded readout chain.
//!
//! The two local loops (op-amp stage, HEMT stage) are solved first, then
//! cascaded and wrapped by the outer inverting feedback loop. This mirrors
//! the physical layering and keeps every gain expression one-pole simple.

use ndarray::Array1;
use num_complex::Complex64;
use serde::Deserialize;

use crate::error::ModelError;
use crate::impedance::{Impedance, parallel, series};
use crate::networks::{
    CompensationNetwork, DetectorBias, FeedbackNetwork, GateCoupling, MirrorLoad, OpAmpDivider,
};
use crate::stages::{GainStage, Hemt, OpAmp};
use crate::sweep::FrequencySweep;

/// Which terms of the outer loop are active.
///
/// The cross-check variants (no input damping, no feedback) come from the
/// same closed-loop formula with the corresponding term forced trivial,
/// never from separate algebra.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct LoopTerms {
    pub input_damping: bool,
    pub feedback: bool,
}

impl Default for LoopTerms {
    fn default() -> Self {
        Self {
            input_damping: true,
            feedback: true,
        }
    }
}

/// Feedback fraction and input-damping factor of the inverting input node.
///
/// `h_fb = Z_in / (Z_in + Z_fb)`, `h_in = -Z_fb / (Z_in + Z_fb)`; the sign
/// of `h_in` encodes the inverting polarity.
pub fn feedback_terms(z_input: Complex64, z_feedback: Complex64) -> (Complex64, Complex64) {
    let denominator = z_input + z_feedback;
    (z_input / denominator, -z_feedback / denominator)
}

/// HEMT transconductance stage with its drain load attached.
///
/// The bare device has no voltage gain of its own; loaded with the
/// compensation network and the mirror branch it becomes a [`GainStage`]
/// the solver can treat like any other.
#[derive(Debug, Clone)]
pub struct HemtStage {
    hemt: Hemt,
    compensation: CompensationNetwork,
    mirror: MirrorLoad,
}

impl HemtStage {
    pub fn new(hemt: Hemt, compensation: CompensationNetwork, mirror: MirrorLoad) -> Self {
        Self {
            hemt,
            compensation,
            mirror,
        }
    }

    pub fn hemt(&self) -> &Hemt {
        &self.hemt
    }

    /// Full drain load: compensation network in series with the mirror.
    pub fn load_impedance(&self, f: f64) -> Result<Complex64, ModelError> {
        Ok(series(
            self.compensation.impedance(f)?,
            self.mirror.impedance(f)?,
        ))
    }
}

impl GainStage for HemtStage {
    /// `gm * Z_load * (Z_useful / Z_load)` — only the compensation branch
    /// voltage is taken downstream, the mirror branch attenuates the rest.
    fn open_loop_gain(&self, f: f64) -> Result<Complex64, ModelError> {
        let z_load = self.load_impedance(f)?;
        let z_useful = self.compensation.impedance(f)?;
        Ok(self.hemt.transconductance() * z_load * (z_useful / z_load))
    }

    fn input_voltage_noise(&self, f: f64) -> Result<f64, ModelError> {
        self.hemt.input_voltage_noise(f)
    }
}

/// One frequency point of the solved chain.
#[derive(Debug, Clone, Copy)]
pub struct GainPoint {
    pub z_input: Complex64,
    pub z_feedback: Complex64,
    pub z_load: Complex64,
    pub a_opamp_closed: Complex64,
    pub a_hemt_open: Complex64,
    pub a_total_open: Complex64,
    pub h_fb: Complex64,
    pub h_in: Complex64,
    pub a_total_closed: Complex64,
}

/// All solved arrays, aligned to one sweep.
#[derive(Debug, Clone)]
pub struct GainSolution {
    pub z_input: Array1<Complex64>,
    pub z_feedback: Array1<Complex64>,
    pub z_load: Array1<Complex64>,
    pub a_opamp_closed: Array1<Complex64>,
    pub a_hemt_open: Array1<Complex64>,
    pub a_total_open: Array1<Complex64>,
    pub a_total_closed: Array1<Complex64>,
}

/// The assembled readout chain: passive catalog plus both active stages.
#[derive(Debug, Clone)]
pub struct ChargeAmplifier {
    pub(crate) detector_bias: Option<DetectorBias>,
    pub(crate) gate_coupling: GateCoupling,
    pub(crate) feedback: FeedbackNetwork,
    pub(crate) divider: OpAmpDivider,
    pub(crate) front_end: HemtStage,
    pub(crate) opamp: OpAmp,
}

impl ChargeAmplifier {
    pub fn new(
        detector_bias: Option<DetectorBias>,
        gate_coupling: GateCoupling,
        feedback: FeedbackNetwork,
        divider: OpAmpDivider,
        front_end: HemtStage,
        opamp: OpAmp,
    ) -> Self {
        Self {
            detector_bias,
            gate_coupling,
            feedback,
            divider,
            front_end,
            opamp,
        }
    }

    pub fn front_end(&self) -> &HemtStage {
        &self.front_end
    }

    pub fn opamp(&self) -> &OpAmp {
        &self.opamp
    }

    /// Feedback fraction of the non-inverting op-amp stage:
    /// `B = Z_a / (Z_a + Z_b)` over the divider legs.
    pub fn opamp_feedback_fraction(&self, f: f64) -> Result<Complex64, ModelError> {
        let ground = self.divider.ground_leg(f)?;
        let feedback = self.divider.feedback_leg(f)?;
        Ok(ground / (ground + feedback))
    }

    /// Local closed loop of the op-amp stage: `A / (1 + A B)`.
    pub fn opamp_closed_loop(&self, f: f64) -> Result<Complex64, ModelError> {
        let a_open = self.opamp.open_loop_gain(f)?;
        let b = self.opamp_feedback_fraction(f)?;
        Ok(a_open / (Complex64::new(1.0, 0.0) + a_open * b))
    }

    /// Cascaded open-loop gain of both stages: local op-amp closed loop
    /// times the loaded HEMT gain.
    pub fn total_open_loop(&self, f: f64) -> Result<Complex64, ModelError> {
        Ok(self.opamp_closed_loop(f)? * self.front_end.open_loop_gain(f)?)
    }

    /// Impedance at the sensing node: HEMT gate in parallel with the
    /// coupling path (detector stage included or not).
    pub fn input_impedance(&self, f: f64) -> Result<Complex64, ModelError> {
        let gate_path = match &self.detector_bias {
            Some(detector) => series(detector.impedance(f)?, self.gate_coupling.impedance(f)?),
            None => self.gate_coupling.impedance(f)?,
        };
        parallel(self.front_end.hemt().input_impedance(f)?, gate_path, f)
    }

    /// Solve the full chain at one frequency.
    pub fn solve_point(&self, f: f64, terms: LoopTerms) -> Result<GainPoint, ModelError> {
        let z_input = self.input_impedance(f)?;
        let z_feedback = self.feedback.impedance(f)?;
        let z_load = self.front_end.load_impedance(f)?;
        let a_opamp_closed = self.opamp_closed_loop(f)?;
        let a_hemt_open = self.front_end.open_loop_gain(f)?;
        let a_total_open = a_opamp_closed * a_hemt_open;

        let (h_fb, h_in) = feedback_terms(z_input, z_feedback);
        let h_in_active = if terms.input_damping {
            h_in
        } else {
            Complex64::new(1.0, 0.0)
        };
        let h_fb_active = if terms.feedback {
            h_fb
        } else {
            Complex64::new(0.0, 0.0)
        };

        let a_total_closed =
            h_in_active * a_total_open / (Complex64::new(1.0, 0.0) + a_total_open * h_fb_active);
        if !a_total_closed.is_finite() {
            return Err(ModelError::SingularLoop { frequency: f });
        }

        Ok(GainPoint {
            z_input,
            z_feedback,
            z_load,
            a_opamp_closed,
            a_hemt_open,
            a_total_open,
            h_fb,
            h_in,
            a_total_closed,
        })
    }

    /// Solve the chain over a whole sweep into aligned arrays.
    pub fn solve(
        &self,
        sweep: &FrequencySweep,
        terms: LoopTerms,
    ) -> Result<GainSolution, ModelError> {
        let n = sweep.len();
        let mut z_input = Vec::with_capacity(n);
        let mut z_feedback = Vec::with_capacity(n);
        let mut z_load = Vec::with_capacity(n);
        let mut a_opamp_closed = Vec::with_capacity(n);
        let mut a_hemt_open = Vec::with_capacity(n);
        let mut a_total_open = Vec::with_capacity(n);
        let mut a_total_closed = Vec::with_capacity(n);

        for f in sweep.iter() {
            let point = self.solve_point(f, terms)?;
            z_input.push(point.z_input);
            z_feedback.push(point.z_feedback);
            z_load.push(point.z_load);
            a_opamp_closed.push(point.a_opamp_closed);
            a_hemt_open.push(point.a_hemt_open);
            a_total_open.push(point.a_total_open);
            a_total_closed.push(point.a_total_closed);
        }

        Ok(GainSolution {
            z_input: Array1::from_vec(z_input),
            z_feedback: Array1::from_vec(z_feedback),
            z_load: Array1::from_vec(z_load),
            a_opamp_closed: Array1::from_vec(a_opamp_closed),
            a_hemt_open: Array1::from_vec(a_hemt_open),
            a_total_open: Array1::from_vec(a_total_open),
            a_total_closed: Array1::from_vec(a_total_closed),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;

    fn default_amplifier() -> ChargeAmplifier {
        ChargeAmplifier::from_config(&AnalysisConfig::default()).unwrap()
    }

    #[test]
    fn vanishing_feedback_impedance_closes_the_divider() {
        let z_input = Complex64::new(1.5e6, -2.0e5);
        for scale in [1e-6, 1e-9, 1e-12] {
            let z_fb = Complex64::new(scale, -scale);
            let (h_fb, h_in) = feedback_terms(z_input, z_fb);
            assert!((h_fb - Complex64::new(1.0, 0.0)).norm() < 1e-9);
            assert!(h_in.norm() < 1e-9);
        }
    }

    #[test]
    fn cross_check_variants_share_the_formula() {
        let amp = default_amplifier();
        let f = 1e4;
        let full = amp.solve_point(f, LoopTerms::default()).unwrap();
        let no_feedback = amp
            .solve_point(
                f,
                LoopTerms {
                    feedback: false,
                    ..Default::default()
                },
            )
            .unwrap();
        let no_damping = amp
            .solve_point(
                f,
                LoopTerms {
                    input_damping: false,
                    ..Default::default()
                },
            )
            .unwrap();

        // without feedback the closed loop degenerates to h_in * A_open
        let expected = no_feedback.h_in * no_feedback.a_total_open;
        assert!((no_feedback.a_total_closed - expected).norm() < 1e-9 * expected.norm());
        // without input damping the drive term is unity
        let expected = no_damping.a_total_open
            / (Complex64::new(1.0, 0.0) + no_damping.a_total_open * no_damping.h_fb);
        assert!((no_damping.a_total_closed - expected).norm() < 1e-9 * expected.norm());
        // the shared sub-terms are identical across variants
        assert_eq!(full.h_fb, no_feedback.h_fb);
        assert_eq!(full.a_total_open, no_damping.a_total_open);
    }

    #[test]
    fn hemt_stage_gain_is_transconductance_times_useful_load() {
        let amp = default_amplifier();
        // at low frequency the compensation capacitor is open and the
        // useful load is the shunt resistor: gm * 1.6k = 56
        let gain = amp.front_end().open_loop_gain(1.0).unwrap();
        assert!((gain.norm() / 56.0 - 1.0).abs() < 1e-3);
    }

    #[test]
    fn detector_stage_can_be_excluded() {
        let amp_with = default_amplifier();
        let amp_without = ChargeAmplifier::from_config(&AnalysisConfig {
            include_detector_stage: false,
            ..Default::default()
        })
        .unwrap();
        let f = 100.0;
        let z_with = amp_with.input_impedance(f).unwrap();
        let z_without = amp_without.input_impedance(f).unwrap();
        assert_ne!(z_with, z_without);
        // without the detector branch the gate path is just Ccg
        let hemt = amp_without.front_end().hemt().input_impedance(f).unwrap();
        let ccg = amp_without.gate_coupling.impedance(f).unwrap();
        let expected = parallel(hemt, ccg, f).unwrap();
        assert_eq!(z_without, expected);
    }

    #[test]
    fn solved_arrays_are_aligned_to_the_sweep() {
        let amp = default_amplifier();
        let sweep = FrequencySweep::decade(1.0, 1e5, 3).unwrap();
        let solution = amp.solve(&sweep, LoopTerms::default()).unwrap();
        assert_eq!(solution.z_input.len(), sweep.len());
        assert_eq!(solution.a_total_closed.len(), sweep.len());
    }
}
