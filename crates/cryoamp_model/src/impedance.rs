use ndarray::Array1;
use num_complex::Complex64;

use crate::constants::OPEN_CIRCUIT_TOLERANCE;
use crate::error::ModelError;
use crate::sweep::FrequencySweep;

/// A two-terminal network evaluated in the frequency domain.
///
/// Implementors provide the scalar contract; `impedance_sweep` gives every
/// model the aligned-array form for free, so callers can pass one frequency
/// or a whole sweep without wrapping scalar functions themselves.
pub trait Impedance {
    fn impedance(&self, frequency: f64) -> Result<Complex64, ModelError>;

    fn impedance_sweep(&self, sweep: &FrequencySweep) -> Result<Array1<Complex64>, ModelError> {
        let values = sweep
            .iter()
            .map(|f| self.impedance(f))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Array1::from_vec(values))
    }
}

/// Series combination of two impedances.
pub fn series(z1: Complex64, z2: Complex64) -> Complex64 {
    z1 + z2
}

/// Parallel combination of two impedances.
///
/// A zero operand short-circuits the pair. Equal-and-opposite reactances
/// cancel the reciprocal sum; that is reported as an open circuit rather
/// than letting `inf` propagate. `frequency` is carried for diagnostics
/// only.
pub fn parallel(z1: Complex64, z2: Complex64, frequency: f64) -> Result<Complex64, ModelError> {
    if z1.norm() == 0.0 || z2.norm() == 0.0 {
        return Ok(Complex64::new(0.0, 0.0));
    }
    let y1 = z1.inv();
    let y2 = z2.inv();
    let sum = y1 + y2;
    if sum.norm() <= OPEN_CIRCUIT_TOLERANCE * (y1.norm() + y2.norm()) {
        return Err(ModelError::OpenCircuit { frequency });
    }
    Ok(sum.inv())
}

/// Pointwise series combination over aligned arrays.
pub fn series_sweep(
    z1: &Array1<Complex64>,
    z2: &Array1<Complex64>,
) -> Result<Array1<Complex64>, ModelError> {
    check_aligned(z1.len(), z2.len())?;
    Ok(z1 + z2)
}

/// Pointwise parallel combination over aligned arrays.
pub fn parallel_sweep(
    z1: &Array1<Complex64>,
    z2: &Array1<Complex64>,
    sweep: &FrequencySweep,
) -> Result<Array1<Complex64>, ModelError> {
    check_aligned(z1.len(), z2.len())?;
    check_aligned(z1.len(), sweep.len())?;
    let values = z1
        .iter()
        .zip(z2.iter())
        .zip(sweep.iter())
        .map(|((&a, &b), f)| parallel(a, b, f))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Array1::from_vec(values))
}

fn check_aligned(expected: usize, got: usize) -> Result<(), ModelError> {
    if expected != got {
        return Err(ModelError::SweepLengthMismatch { expected, got });
    }
    Ok(())
}
