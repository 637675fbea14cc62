//! ngspice-style raw file output for a solved sweep.
//!
//! Frequency is variable 0; complex traces are written as re/im pairs,
//! real traces with a zero imaginary part, so stock raw viewers can plot
//! the model output next to measured AC data.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use chrono::Local;

use crate::results::{SweepResult, Trace};

fn sanitize_filename(input: &str) -> String {
    let mut out = String::new();
    for c in input.chars() {
        match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '_' | '-' | '.' => out.push(c),
            ' ' => out.push('_'),
            _ => {}
        }
    }
    if out.is_empty() {
        "cryoamp".to_string()
    } else {
        out
    }
}

fn trace_kind(name: &str) -> &'static str {
    if name.starts_with("en_") {
        "voltage"
    } else if name.starts_with("z_") {
        "impedance"
    } else {
        "gain"
    }
}

pub(crate) fn write_header(
    mut w: impl Write,
    title: &str,
    nvars: usize,
    npoints: usize,
) -> std::io::Result<()> {
    writeln!(w, "Title: *{}", title.trim())?;
    let now = Local::now();
    writeln!(w, "Date: {}", now.format("%a %b %d %H:%M:%S %Y"))?;
    writeln!(w, "Plotname: Noise Analysis")?;
    writeln!(w, "Flags: complex forward")?;
    writeln!(w, "No. Variables: {}", nvars)?;
    writeln!(w, "No. Points: {}", npoints)?;
    writeln!(w, "Command: cryoamp")?;
    writeln!(w, "Variables:")?;
    Ok(())
}

pub(crate) fn write_variables(mut w: impl Write, result: &SweepResult) -> std::io::Result<()> {
    writeln!(w, "\t0\tfrequency\tfrequency")?;
    let mut index = 1;
    for (name, _) in result.iter() {
        if name == "f_arr" {
            continue;
        }
        writeln!(w, "\t{}\t{}\t{}", index, name, trace_kind(name))?;
        index += 1;
    }
    Ok(())
}

pub(crate) fn write_sweep(
    mut writer: impl Write,
    result: &SweepResult,
    title: &str,
) -> std::io::Result<()> {
    let npoints = result.points();
    // every trace except f_arr, plus the frequency axis
    let nvars = result.iter().count(); // f_arr folds into variable 0

    write_header(&mut writer, title, nvars, npoints)?;
    write_variables(&mut writer, result)?;

    // Binary: per point -> f64 frequency, then for each trace f64 re, f64 im
    writeln!(&mut writer, "Binary:")?;
    let frequencies = match result.get("f_arr") {
        Some(Trace::Real(f)) => f,
        _ => {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "sweep result has no f_arr trace",
            ));
        }
    };
    for point in 0..npoints {
        writer.write_all(&frequencies[point].to_le_bytes())?;
        for (name, trace) in result.iter() {
            if name == "f_arr" {
                continue;
            }
            match trace {
                Trace::Real(a) => {
                    writer.write_all(&a[point].to_le_bytes())?;
                    writer.write_all(&0f64.to_le_bytes())?;
                }
                Trace::Complex(a) => {
                    writer.write_all(&a[point].re.to_le_bytes())?;
                    writer.write_all(&a[point].im.to_le_bytes())?;
                }
            }
        }
    }
    writer.flush()
}

/// Write a sweep result as `<output_base>.raw`; returns the path written.
pub fn write_sweep_raw(
    result: &SweepResult,
    title: &str,
    output_base: &str,
) -> std::io::Result<PathBuf> {
    let filename = format!("{}.raw", sanitize_filename(output_base));
    let path = PathBuf::from(filename);
    let file = File::create(&path)?;
    write_sweep(BufWriter::new(file), result, title)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;
    use crate::gain::{ChargeAmplifier, LoopTerms};
    use crate::noise::NoiseSettings;
    use crate::sweep::FrequencySweep;

    fn small_result() -> SweepResult {
        let amp = ChargeAmplifier::from_config(&AnalysisConfig::default()).unwrap();
        let sweep = FrequencySweep::from_points(vec![10.0, 100.0]).unwrap();
        let solution = amp.solve(&sweep, LoopTerms::default()).unwrap();
        let budget = amp
            .noise_budget(&sweep, &solution, &NoiseSettings::default())
            .unwrap();
        SweepResult::assemble(&sweep, &solution, &budget).unwrap()
    }

    #[test]
    fn sanitize_strips_everything_but_path_safe_characters() {
        assert_eq!(sanitize_filename("noise model/run#1"), "noise_modelrun1");
        assert_eq!(sanitize_filename("~~~"), "cryoamp");
    }

    #[test]
    fn variable_table_is_stable() {
        let result = small_result();
        let mut buf = Vec::new();
        write_variables(&mut buf, &result).unwrap();
        let expected = [
            "\t0\tfrequency\tfrequency",
            "\t1\tz_input\timpedance",
            "\t2\tz_fb\timpedance",
            "\t3\tz_load\timpedance",
            "\t4\ta_opamp_closed\tgain",
            "\t5\ta_hemt_open\tgain",
            "\t6\ta_total_open\tgain",
            "\t7\ta_total_closed\tgain",
            "\t8\ten_fb_input\tvoltage",
            "\t9\ten_hemt_input\tvoltage",
            "\t10\ten_load_input\tvoltage",
            "\t11\ten_shot_input\tvoltage",
            "\t12\ten_opamp_input\tvoltage",
            "\t13\ten_total_input\tvoltage",
            "\t14\ten_total_output\tvoltage",
        ]
        .join("\n");
        assert_eq!(String::from_utf8(buf).unwrap(), format!("{expected}\n"));
    }

    #[test]
    fn binary_payload_has_one_record_per_point() {
        let result = small_result();
        let mut bytes = Vec::new();
        write_sweep(&mut bytes, &result, "test run").unwrap();

        let marker = b"Binary:\n";
        let start = bytes
            .windows(marker.len())
            .position(|w| w == marker)
            .expect("binary marker")
            + marker.len();
        // per point: f64 frequency + 14 traces * 2 * f64
        let record = 8 * (1 + 14 * 2);
        assert_eq!(bytes.len() - start, 2 * record);
    }
}
