//! Named-array result container handed to persistence/plotting layers.

use ndarray::Array1;
use num_complex::Complex64;

use crate::error::ModelError;
use crate::gain::GainSolution;
use crate::noise::NoiseBudget;
use crate::sweep::FrequencySweep;

/// One result trace aligned to the sweep.
#[derive(Debug, Clone, PartialEq)]
pub enum Trace {
    Real(Array1<f64>),
    Complex(Array1<Complex64>),
}

impl Trace {
    pub fn len(&self) -> usize {
        match self {
            Trace::Real(a) => a.len(),
            Trace::Complex(a) => a.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// All outputs of one analysis run, retrievable by stable name.
///
/// Insertion order is preserved so downstream writers emit traces in a
/// deterministic layout.
#[derive(Debug, Clone)]
pub struct SweepResult {
    traces: Vec<(String, Trace)>,
}

impl SweepResult {
    /// Assemble the standard result set from a solved sweep and budget.
    pub fn assemble(
        sweep: &FrequencySweep,
        solution: &GainSolution,
        budget: &NoiseBudget,
    ) -> Result<Self, ModelError> {
        let mut traces: Vec<(String, Trace)> = Vec::new();
        traces.push(("f_arr".to_string(), Trace::Real(sweep.to_array())));
        traces.push(("z_input".to_string(), Trace::Complex(solution.z_input.clone())));
        traces.push(("z_fb".to_string(), Trace::Complex(solution.z_feedback.clone())));
        traces.push(("z_load".to_string(), Trace::Complex(solution.z_load.clone())));
        traces.push((
            "a_opamp_closed".to_string(),
            Trace::Complex(solution.a_opamp_closed.clone()),
        ));
        traces.push((
            "a_hemt_open".to_string(),
            Trace::Complex(solution.a_hemt_open.clone()),
        ));
        traces.push((
            "a_total_open".to_string(),
            Trace::Complex(solution.a_total_open.clone()),
        ));
        traces.push((
            "a_total_closed".to_string(),
            Trace::Complex(solution.a_total_closed.clone()),
        ));
        for (name, density) in budget.iter() {
            traces.push((format!("{name}_input"), Trace::Real(density.clone())));
        }
        traces.push((
            "en_total_input".to_string(),
            Trace::Real(budget.total_input()),
        ));
        traces.push((
            "en_total_output".to_string(),
            Trace::Real(budget.total_output(&solution.a_total_closed)?),
        ));

        let expected = sweep.len();
        for (_, trace) in &traces {
            if trace.len() != expected {
                return Err(ModelError::SweepLengthMismatch {
                    expected,
                    got: trace.len(),
                });
            }
        }
        Ok(Self { traces })
    }

    pub fn get(&self, name: &str) -> Option<&Trace> {
        self.traces
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, trace)| trace)
    }

    pub fn get_real(&self, name: &str) -> Option<&Array1<f64>> {
        match self.get(name) {
            Some(Trace::Real(a)) => Some(a),
            _ => None,
        }
    }

    pub fn get_complex(&self, name: &str) -> Option<&Array1<Complex64>> {
        match self.get(name) {
            Some(Trace::Complex(a)) => Some(a),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Trace)> {
        self.traces.iter().map(|(n, t)| (n.as_str(), t))
    }

    pub fn points(&self) -> usize {
        self.traces.first().map(|(_, t)| t.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;
    use crate::gain::{ChargeAmplifier, LoopTerms};
    use crate::noise::NoiseSettings;

    #[test]
    fn standard_keys_are_present_and_aligned() {
        let amp = ChargeAmplifier::from_config(&AnalysisConfig::default()).unwrap();
        let sweep = FrequencySweep::decade(1.0, 1e5, 1).unwrap();
        let solution = amp.solve(&sweep, LoopTerms::default()).unwrap();
        let budget = amp
            .noise_budget(&sweep, &solution, &NoiseSettings::default())
            .unwrap();
        let result = SweepResult::assemble(&sweep, &solution, &budget).unwrap();

        for key in [
            "f_arr",
            "z_input",
            "z_fb",
            "a_total_closed",
            "en_fb_input",
            "en_total_input",
            "en_total_output",
        ] {
            let trace = result.get(key).unwrap_or_else(|| panic!("missing {key}"));
            assert_eq!(trace.len(), sweep.len());
        }
        assert!(result.get_real("f_arr").is_some());
        assert!(result.get_complex("a_total_closed").is_some());
        assert!(result.get("nope").is_none());
    }
}
