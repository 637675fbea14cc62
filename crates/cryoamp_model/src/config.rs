//! Analysis configuration: every default in the model, named and
//! overridable from one record (deserializable from a JSON override file).

use std::str::FromStr;

use serde::Deserialize;

use crate::error::ModelError;
use crate::gain::{ChargeAmplifier, HemtStage, LoopTerms};
use crate::networks::{
    CompensationNetwork, CompensationNetworkParams, DetectorBias, DetectorBiasParams,
    FeedbackNetwork, FeedbackNetworkParams, GateCoupling, GateCouplingParams, MirrorLoad,
    MirrorLoadParams, OpAmpDivider, OpAmpDividerParams,
};
use crate::noise::NoiseSettings;
use crate::stages::{Hemt, HemtParams, OpAmp, OpAmpParams};

/// Which op-amp calibration preset to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpAmpVariant {
    #[default]
    Lt1677,
    Ad745,
}

impl OpAmpVariant {
    pub fn params(self) -> OpAmpParams {
        match self {
            OpAmpVariant::Lt1677 => OpAmpParams::lt1677(),
            OpAmpVariant::Ad745 => OpAmpParams::ad745(),
        }
    }
}

impl FromStr for OpAmpVariant {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lt1677" => Ok(OpAmpVariant::Lt1677),
            "ad745" => Ok(OpAmpVariant::Ad745),
            _ => Err(ModelError::UnknownOpAmpVariant {
                name: s.to_string(),
            }),
        }
    }
}

/// Full parameter record for one analysis run.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub detector_bias: DetectorBiasParams,
    pub gate_coupling: GateCouplingParams,
    pub feedback: FeedbackNetworkParams,
    pub compensation: CompensationNetworkParams,
    pub mirror: MirrorLoadParams,
    pub opamp_divider: OpAmpDividerParams,
    pub hemt: HemtParams,
    pub opamp_variant: OpAmpVariant,
    /// Full custom calibration; wins over `opamp_variant` when present.
    pub opamp_override: Option<OpAmpParams>,
    /// Include the detector/bias stage in the gate coupling path.
    pub include_detector_stage: bool,
    pub loop_terms: LoopTerms,
    pub noise: NoiseSettings,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            detector_bias: DetectorBiasParams::default(),
            gate_coupling: GateCouplingParams::default(),
            feedback: FeedbackNetworkParams::default(),
            compensation: CompensationNetworkParams::default(),
            mirror: MirrorLoadParams::default(),
            opamp_divider: OpAmpDividerParams::default(),
            hemt: HemtParams::default(),
            opamp_variant: OpAmpVariant::default(),
            opamp_override: None,
            include_detector_stage: true,
            loop_terms: LoopTerms::default(),
            noise: NoiseSettings::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn opamp_params(&self) -> OpAmpParams {
        self.opamp_override
            .unwrap_or_else(|| self.opamp_variant.params())
    }
}

impl ChargeAmplifier {
    /// Build the whole chain from one configuration record; all
    /// validation happens here, before any numeric evaluation.
    pub fn from_config(config: &AnalysisConfig) -> Result<Self, ModelError> {
        let detector_bias = if config.include_detector_stage {
            Some(DetectorBias::new(&config.detector_bias)?)
        } else {
            None
        };
        let front_end = HemtStage::new(
            Hemt::new(&config.hemt)?,
            CompensationNetwork::new(&config.compensation)?,
            MirrorLoad::new(&config.mirror)?,
        );
        Ok(ChargeAmplifier::new(
            detector_bias,
            GateCoupling::new(&config.gate_coupling)?,
            FeedbackNetwork::new(&config.feedback)?,
            OpAmpDivider::new(&config.opamp_divider)?,
            front_end,
            OpAmp::new(config.opamp_params())?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_overrides_merge_with_defaults() {
        let config: AnalysisConfig = serde_json::from_str(
            r#"{
                "feedback": { "feedback_capacitance": 1e-12 },
                "hemt": { "transconductance_ms": 20.0 },
                "opamp_variant": "ad745",
                "noise": { "feedback_temperature_k": 0.05 }
            }"#,
        )
        .unwrap();
        assert_eq!(config.feedback.feedback_capacitance, 1e-12);
        // untouched sibling field keeps its default
        assert_eq!(config.feedback.feedback_resistance, 400e6);
        assert_eq!(config.hemt.transconductance_ms, 20.0);
        assert_eq!(config.opamp_variant, OpAmpVariant::Ad745);
        assert_eq!(config.noise.feedback_temperature_k, 0.05);
        assert!(config.include_detector_stage);
    }

    #[test]
    fn opamp_override_wins_over_the_variant() {
        let mut config = AnalysisConfig::default();
        config.opamp_variant = OpAmpVariant::Ad745;
        config.opamp_override = Some(OpAmpParams {
            flat_gain: 123.0,
            ..OpAmpParams::lt1677()
        });
        assert_eq!(config.opamp_params().flat_gain, 123.0);
    }

    #[test]
    fn variant_parses_from_cli_strings() {
        assert_eq!(OpAmpVariant::from_str("LT1677").unwrap(), OpAmpVariant::Lt1677);
        assert_eq!(OpAmpVariant::from_str("ad745").unwrap(), OpAmpVariant::Ad745);
        assert!(matches!(
            OpAmpVariant::from_str("ne5534"),
            Err(ModelError::UnknownOpAmpVariant { .. })
        ));
    }
}
