use thiserror::Error;

/// Errors reported by the model core.
///
/// Domain errors (non-physical values) and configuration errors are caught
/// before or at construction; numeric edge cases surface during sweep
/// evaluation. A failing point invalidates the whole sweep: evaluation is
/// pure and deterministic, so a partial sweep has no use.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("{kind} `{label}` must be positive and finite, got {value}")]
    InvalidComponentValue {
        kind: &'static str,
        label: String,
        value: f64,
    },

    #[error("frequency must be positive, got {frequency} Hz")]
    NonPositiveFrequency { frequency: f64 },

    #[error("temperature must be >= 0 K, got {kelvin}")]
    NegativeTemperature { kelvin: f64 },

    #[error("transconductance must be positive, got {millisiemens} mS")]
    NonPositiveTransconductance { millisiemens: f64 },

    #[error("bias current must be positive, got {amps} A")]
    NonPositiveBiasCurrent { amps: f64 },

    #[error("frequency sweep must contain at least one point")]
    EmptySweep,

    #[error(
        "frequency sweep must be strictly increasing: point {index} is {value} Hz after {previous} Hz"
    )]
    NonMonotonicSweep {
        index: usize,
        previous: f64,
        value: f64,
    },

    #[error("sweep length mismatch: expected {expected} points, got {got}")]
    SweepLengthMismatch { expected: usize, got: usize },

    #[error("parallel combination cancels to an open circuit at {frequency} Hz")]
    OpenCircuit { frequency: f64 },

    #[error("closed-loop gain is singular at {frequency} Hz (loop gain reaches -1)")]
    SingularLoop { frequency: f64 },

    #[error("duplicate noise source `{name}`")]
    DuplicateNoiseSource { name: String },

    #[error("unknown noise source `{name}`")]
    UnknownNoiseSource { name: String },

    #[error("noise source `{name}` has a negative or non-finite density at point {index}")]
    InvalidNoiseDensity { name: String, index: usize },

    #[error("unknown op-amp variant `{name}` (expected lt1677 or ad745)")]
    UnknownOpAmpVariant { name: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_error_names_the_component() {
        let err = ModelError::InvalidComponentValue {
            kind: "resistance",
            label: "Rfb".to_string(),
            value: -1.0,
        };
        insta::assert_snapshot!(
            err.to_string(),
            @"resistance `Rfb` must be positive and finite, got -1"
        );
    }

    #[test]
    fn open_circuit_reports_frequency() {
        let err = ModelError::OpenCircuit { frequency: 50.0 };
        insta::assert_snapshot!(
            err.to_string(),
            @"parallel combination cancels to an open circuit at 50 Hz"
        );
    }
}
