//! Physical constants and numerical tolerances.
//!
//! Centralizes the values the model depends on so nothing lives in a
//! mutable module-level global.

/// Boltzmann constant (J/K), 2019 SI exact value.
pub const BOLTZMANN: f64 = 1.380649e-23;

/// Elementary charge (C), 2019 SI exact value.
pub const ELECTRON_CHARGE: f64 = 1.602176634e-19;

/// Relative tolerance below which the reciprocal sum in `parallel` is
/// treated as an open-circuit cancellation instead of a valid result.
pub const OPEN_CIRCUIT_TOLERANCE: f64 = 1e-12;

/// Stop guard for geometric sweep generation; keeps the last point from
/// being dropped to rounding.
pub const SWEEP_STOP_EPS: f64 = 1e-12;
