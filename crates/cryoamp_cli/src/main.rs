use std::fs;
use std::str::FromStr;

use anyhow::Context;
use clap::Parser;
use cryoamp_model::{
    AnalysisConfig, FrequencySweep, OpAmpVariant, analyze, raw_writer::write_sweep_raw,
};

#[derive(Parser, Debug)]
#[command(name = "cryoamp_cli", about = "Cryogenic charge-amplifier noise model", version)]
struct Args {
    /// Sweep start frequency (Hz)
    #[arg(long, default_value_t = 1.0)]
    fstart: f64,

    /// Sweep stop frequency (Hz)
    #[arg(long, default_value_t = 1e5)]
    fstop: f64,

    /// Points per decade
    #[arg(long, default_value_t = 10)]
    per_decade: usize,

    /// JSON file with parameter overrides
    #[arg(long)]
    config: Option<String>,

    /// Op-amp calibration preset (lt1677 or ad745)
    #[arg(long)]
    opamp: Option<String>,

    /// Drop the input-damping term (cross-check variant)
    #[arg(long)]
    no_input_damping: bool,

    /// Drop the feedback term (cross-check variant)
    #[arg(long)]
    no_feedback: bool,

    /// Exclude the detector/bias stage from the gate path
    #[arg(long)]
    no_detector: bool,

    /// Write `<OUTPUT>.raw` with every trace of the run
    #[arg(long, value_name = "OUTPUT")]
    output: Option<String>,
}

fn build_config(args: &Args) -> anyhow::Result<AnalysisConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path).with_context(|| format!("reading {path}"))?;
            serde_json::from_str(&text).with_context(|| format!("parsing {path}"))?
        }
        None => AnalysisConfig::default(),
    };
    if let Some(name) = &args.opamp {
        config.opamp_variant = OpAmpVariant::from_str(name)?;
        config.opamp_override = None;
    }
    if args.no_input_damping {
        config.loop_terms.input_damping = false;
    }
    if args.no_feedback {
        config.loop_terms.feedback = false;
    }
    if args.no_detector {
        config.include_detector_stage = false;
    }
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = build_config(&args)?;
    let sweep = FrequencySweep::decade(args.fstart, args.fstop, args.per_decade)?;
    let result = analyze(&config, &sweep)?;

    let a_closed = result
        .get_complex("a_total_closed")
        .context("missing a_total_closed trace")?;
    let en_input = result
        .get_real("en_total_input")
        .context("missing en_total_input trace")?;
    let en_output = result
        .get_real("en_total_output")
        .context("missing en_total_output trace")?;

    println!(
        "{:>12}  {:>12}  {:>9}  {:>13}  {:>13}",
        "f (Hz)", "|A_closed|", "phase", "en_in", "en_out"
    );
    for (i, f) in sweep.iter().enumerate() {
        let gain = a_closed[i];
        println!(
            "{:>12.3}  {:>12.4}  {:>8.2}\u{00b0}  {:>10.4e}  {:>10.4e}",
            f,
            gain.norm(),
            gain.arg().to_degrees(),
            en_input[i],
            en_output[i]
        );
    }

    if let Some(base) = &args.output {
        let path = write_sweep_raw(&result, "cryoamp noise model", base)
            .with_context(|| format!("writing {base}.raw"))?;
        eprintln!("wrote {}", path.display());
    }
    Ok(())
}
