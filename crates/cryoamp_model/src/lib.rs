//! Frequency-domain gain and input-referred noise model of a cryogenic
//! charge-sensitive amplifier chain (detector bias network, HEMT
//! front-end, feedback network, room-temperature op-amp stage).
//!
//! The crate evaluates hand-derived sub-network impedances pointwise over
//! a validated frequency sweep, solves the two local feedback loops and
//! the outer inverting loop, and aggregates independent noise sources at
//! the amplifier input. Everything is pure and deterministic: one sweep
//! in, named aligned arrays out.

pub mod components;
pub mod config;
pub mod constants;
pub mod error;
pub mod gain;
pub mod impedance;
pub mod networks;
pub mod noise;
pub mod raw_writer;
pub mod results;
pub mod stages;
pub mod sweep;

pub use config::{AnalysisConfig, OpAmpVariant};
pub use error::ModelError;
pub use gain::{ChargeAmplifier, GainSolution, LoopTerms};
pub use noise::{NoiseBudget, NoiseSettings};
pub use results::{SweepResult, Trace};
pub use sweep::FrequencySweep;

/// Run one full analysis: solve the chain over `sweep`, build the noise
/// budget, and assemble the named result arrays.
pub fn analyze(config: &AnalysisConfig, sweep: &FrequencySweep) -> Result<SweepResult, ModelError> {
    let amplifier = ChargeAmplifier::from_config(config)?;
    let solution = amplifier.solve(sweep, config.loop_terms)?;
    let budget = amplifier.noise_budget(sweep, &solution, &config.noise)?;
    SweepResult::assemble(sweep, &solution, &budget)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decade_probe_sweep() -> FrequencySweep {
        FrequencySweep::from_points(vec![1.0, 10.0, 100.0, 1e3, 1e4, 1e5]).unwrap()
    }

    #[test]
    fn end_to_end_defaults_behave_like_a_charge_amplifier() {
        let result = analyze(&AnalysisConfig::default(), &decade_probe_sweep()).unwrap();

        // |Z_input| falls monotonically with frequency
        let z_input = result.get_complex("z_input").unwrap();
        for pair in z_input.to_vec().windows(2) {
            assert!(pair[1].norm() < pair[0].norm());
        }

        // output noise is finite and positive everywhere
        let en_out = result.get_real("en_total_output").unwrap();
        for &value in en_out.iter() {
            assert!(value.is_finite() && value > 0.0);
        }

        // gain magnitude grows toward the passband and sits near the
        // capacitance ratio there
        let a_closed = result.get_complex("a_total_closed").unwrap();
        assert!(a_closed[5].norm() > 100.0 * a_closed[0].norm());
    }

    #[test]
    fn passband_gain_is_flat_and_rolls_off_outside() {
        let sweep = FrequencySweep::decade(1e2, 1e6, 20).unwrap();
        let result = analyze(&AnalysisConfig::default(), &sweep).unwrap();
        let a_closed = result.get_complex("a_total_closed").unwrap();

        let in_band: Vec<f64> = sweep
            .iter()
            .zip(a_closed.iter())
            .filter(|(f, _)| (5e3..=1e5).contains(f))
            .map(|(_, a)| a.norm())
            .collect();
        let mean = in_band.iter().sum::<f64>() / in_band.len() as f64;
        for &magnitude in &in_band {
            assert!(
                (magnitude / mean - 1.0).abs() < 0.06,
                "passband deviation too large: {magnitude} vs mean {mean}"
            );
        }

        // a decade below and above the band the gain has fallen away
        let at = |target: f64| -> f64 {
            sweep
                .iter()
                .zip(a_closed.iter())
                .min_by(|(f1, _), (f2, _)| {
                    (f1 - target).abs().partial_cmp(&(f2 - target).abs()).unwrap()
                })
                .map(|(_, a)| a.norm())
                .unwrap()
        };
        assert!(at(1e2) < 0.2 * mean);
        assert!(at(1e6) < 0.5 * mean);
    }

    #[test]
    fn analysis_is_deterministic() {
        let sweep = decade_probe_sweep();
        let config = AnalysisConfig::default();
        let first = analyze(&config, &sweep).unwrap();
        let second = analyze(&config, &sweep).unwrap();
        for (name, trace) in first.iter() {
            assert_eq!(Some(trace), second.get(name), "trace {name} differs");
        }
    }

    #[test]
    fn detector_capacitance_override_moves_only_the_input_side() {
        let sweep = decade_probe_sweep();
        let stock = analyze(&AnalysisConfig::default(), &sweep).unwrap();
        let modified = analyze(
            &AnalysisConfig {
                detector_bias: networks::DetectorBiasParams {
                    detector_capacitance: 100e-12,
                    ..Default::default()
                },
                ..Default::default()
            },
            &sweep,
        )
        .unwrap();
        assert_ne!(
            stock.get_complex("z_input").unwrap(),
            modified.get_complex("z_input").unwrap()
        );
        // the HEMT drain load does not depend on the detector
        assert_eq!(
            stock.get_complex("z_load").unwrap(),
            modified.get_complex("z_load").unwrap()
        );
    }
}
