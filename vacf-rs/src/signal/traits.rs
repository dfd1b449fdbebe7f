//! Trait interfaces for signal-processing capabilities.

use crate::kernel::{ExecInvariantViolation, Read1D, Write1D};
use num_complex::Complex;

#[cfg(feature = "alloc")]
use alloc::vec::Vec;

/// 1D correlation-based power-spectrum estimation capability.
///
/// Implementors map a complex signal and a frequency grid to one real
/// power-spectrum value per grid entry. Whether the grid carries linear or
/// angular frequencies is an implementor contract, documented on each kernel.
pub trait CorrelationPsd1D {
    /// Estimate into a caller-provided output buffer.
    ///
    /// The buffer length must equal the frequency-grid length; a mismatch is
    /// rejected before any computation with
    /// [`ExecInvariantViolation::LengthMismatch`].
    fn run_into<I1, I2, O>(
        &self,
        signal: &I1,
        frequencies: &I2,
        psd: &mut O,
    ) -> Result<(), ExecInvariantViolation>
    where
        I1: Read1D<Complex<f64>> + ?Sized,
        I2: Read1D<f64> + ?Sized,
        O: Write1D<f64> + ?Sized;

    /// Estimate and allocate the output, one value per grid entry.
    #[cfg(feature = "alloc")]
    fn run_alloc<I1, I2>(
        &self,
        signal: &I1,
        frequencies: &I2,
    ) -> Result<Vec<f64>, ExecInvariantViolation>
    where
        I1: Read1D<Complex<f64>> + ?Sized,
        I2: Read1D<f64> + ?Sized;
}
