//! Power-spectrum estimation by direct quadrature of the autocorrelation
//! integral.
//!
//! For each trial frequency the signal is correlated against itself over a
//! coarsened grid of time lags, each lag phase-rotated by the trial
//! frequency, and the lag integral is evaluated with a rectangular or
//! trapezoid rule. The real part of the accumulated sum is the spectrum
//! value at that frequency (the Wiener-Khinchin relation between
//! autocorrelation and spectral density).
//!
//! Two strategies implement [`CorrelationPsd1D`]:
//!
//! - [`AveragedPsdKernel`] takes a linear-frequency grid in Hz, adds an
//!   unconditional correlation term alongside the quadrature term in every
//!   inner iteration, and normalizes by `time_step / (n / step)` with the
//!   division truncating. The extra term looks like a double-count of the
//!   rectangular contribution and probably is one, but results produced with
//!   it are in circulation, so the behavior is kept verbatim.
//! - [`SimplePsdKernel`] takes angular frequencies directly, accumulates the
//!   quadrature term only, normalizes each lag's inner sum by its own sample
//!   count, and scales by `time_step * step`.
//!
//! Evaluation is independent per frequency; each output slot is written
//! exactly once. With the `parallel` feature the slot fill runs on rayon's
//! global pool, which sizes itself to the available hardware concurrency.
//! Per-slot arithmetic is identical on both paths, so sequential and
//! parallel runs produce bit-identical spectra.

use crate::kernel::{ConfigError, ExecInvariantViolation, KernelLifecycle, Read1D, Write1D};
use crate::signal::traits::CorrelationPsd1D;
use core::f64::consts::PI;
use num_complex::Complex;

#[cfg(feature = "alloc")]
use crate::error::Error;

#[cfg(feature = "alloc")]
use alloc::vec::Vec;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Lag increment applied when an integer-coded caller omits `step`.
pub const DEFAULT_STEP: usize = 10;

/// Quadrature rule applied to the lag integral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntegrationMethod {
    /// Two-point rule: average of the correlation term at the current lag
    /// and one `step` ahead, each rotated by its own lag time.
    Trapezoid,
    /// Single-point rule: the correlation term at the current lag only.
    #[default]
    Rectangular,
}

impl IntegrationMethod {
    /// Decode the integer code used by array-marshalling callers.
    ///
    /// `0` selects [`IntegrationMethod::Trapezoid`] and `1` selects
    /// [`IntegrationMethod::Rectangular`]; any other value is rejected with
    /// [`ConfigError::InvalidArgument`].
    pub fn from_code(code: i64) -> Result<Self, ConfigError> {
        match code {
            0 => Ok(Self::Trapezoid),
            1 => Ok(Self::Rectangular),
            _ => Err(ConfigError::InvalidArgument {
                arg: "integration_method",
                reason: "must be 0 (trapezoid) or 1 (rectangular)",
            }),
        }
    }

    /// Integer code of this rule.
    pub const fn code(self) -> i64 {
        match self {
            Self::Trapezoid => 0,
            Self::Rectangular => 1,
        }
    }
}

fn validate_quadrature_config(time_step: f64, step: usize) -> Result<(), ConfigError> {
    if !time_step.is_finite() || time_step <= 0.0 {
        return Err(ConfigError::InvalidArgument {
            arg: "time_step",
            reason: "time_step must be finite and > 0",
        });
    }
    if step == 0 {
        return Err(ConfigError::InvalidArgument {
            arg: "step",
            reason: "step must be >= 1",
        });
    }
    Ok(())
}

fn validate_signal(signal: &[Complex<f64>], step: usize) -> Result<(), ExecInvariantViolation> {
    if signal.len() < step + 1 {
        return Err(ExecInvariantViolation::InvalidState {
            reason: "signal must hold more samples than the lag increment",
        });
    }
    Ok(())
}

/// Averaged-strategy spectrum value at one angular frequency.
fn averaged_at(
    omega: f64,
    signal: &[Complex<f64>],
    time_step: f64,
    step: usize,
    method: IntegrationMethod,
) -> f64 {
    let n = signal.len();
    let mut acc = Complex::new(0.0, 0.0);

    let mut lag = 0;
    while lag + step < n {
        let rot = Complex::cis(omega * (lag as f64 * time_step));
        let rot_ahead = Complex::cis(omega * ((lag + step) as f64 * time_step));
        for j in 0..(n - lag - step) {
            let here = signal[j].conj() * signal[j + lag] * rot;
            // Unconditional contribution, kept alongside the quadrature
            // term to reproduce the established results.
            acc += here;
            acc += match method {
                IntegrationMethod::Trapezoid => {
                    let ahead = signal[j].conj() * signal[j + lag + step] * rot_ahead;
                    (ahead + here) / 2.0
                }
                IntegrationMethod::Rectangular => here,
            };
        }
        lag += step;
    }

    // Truncating division, matching the established normalization.
    acc.re * time_step / ((n / step) as f64)
}

/// Simple-strategy spectrum value at one angular frequency.
fn simple_at(
    omega: f64,
    signal: &[Complex<f64>],
    time_step: f64,
    step: usize,
    method: IntegrationMethod,
) -> f64 {
    let n = signal.len();
    let mut integral = Complex::new(0.0, 0.0);

    let mut lag = 0;
    while lag + step + 1 < n {
        let span = n - lag - step;
        let rot = Complex::cis(omega * (lag as f64 * time_step));
        let rot_ahead = Complex::cis(omega * ((lag + step) as f64 * time_step));
        let mut correl = Complex::new(0.0, 0.0);
        for j in 0..span {
            correl += match method {
                IntegrationMethod::Trapezoid => {
                    (signal[j].conj() * signal[j + lag + step] * rot_ahead
                        + signal[j].conj() * signal[j + lag] * rot)
                        / 2.0
                }
                IntegrationMethod::Rectangular => signal[j].conj() * signal[j + lag] * rot,
            };
        }
        integral += correl / (span as f64);
        lag += step;
    }

    integral.re * time_step * step as f64
}

/// Fill each output slot from an independent per-frequency evaluation.
///
/// One slot per frequency, each written exactly once; iterations share no
/// mutable state. The parallel path splits slots across rayon's global
/// pool and produces output bit-identical to the sequential path.
fn fill_slots<F>(frequencies: &[f64], out: &mut [f64], eval: F)
where
    F: Fn(f64) -> f64 + Sync,
{
    #[cfg(feature = "parallel")]
    {
        out.par_iter_mut()
            .zip(frequencies.par_iter())
            .for_each(|(slot, &f)| *slot = eval(f));
    }
    #[cfg(not(feature = "parallel"))]
    for (slot, &f) in out.iter_mut().zip(frequencies.iter()) {
        *slot = eval(f);
    }
}

/// Constructor config for [`AveragedPsdKernel`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AveragedPsdConfig {
    /// Sampling interval of the signal.
    pub time_step: f64,
    /// Lag increment; coarsens the lag grid, trading accuracy for speed.
    pub step: usize,
    /// Quadrature rule for the lag integral.
    pub method: IntegrationMethod,
}

/// Trait-first averaged-strategy spectrum kernel.
///
/// The frequency grid carries linear frequencies; each is converted to an
/// angular frequency (`omega = 2*pi*f`) before evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AveragedPsdKernel {
    time_step: f64,
    step: usize,
    method: IntegrationMethod,
}

impl KernelLifecycle for AveragedPsdKernel {
    type Config = AveragedPsdConfig;

    fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
        validate_quadrature_config(config.time_step, config.step)?;
        Ok(Self {
            time_step: config.time_step,
            step: config.step,
            method: config.method,
        })
    }
}

impl CorrelationPsd1D for AveragedPsdKernel {
    fn run_into<I1, I2, O>(
        &self,
        signal: &I1,
        frequencies: &I2,
        psd: &mut O,
    ) -> Result<(), ExecInvariantViolation>
    where
        I1: Read1D<Complex<f64>> + ?Sized,
        I2: Read1D<f64> + ?Sized,
        O: Write1D<f64> + ?Sized,
    {
        let signal = signal.read_slice().map_err(ExecInvariantViolation::from)?;
        validate_signal(signal, self.step)?;
        let frequencies = frequencies
            .read_slice()
            .map_err(ExecInvariantViolation::from)?;
        let out = psd.write_slice_mut().map_err(ExecInvariantViolation::from)?;
        if out.len() != frequencies.len() {
            return Err(ExecInvariantViolation::LengthMismatch {
                arg: "psd",
                expected: frequencies.len(),
                got: out.len(),
            });
        }

        fill_slots(frequencies, out, |f| {
            averaged_at(2.0 * PI * f, signal, self.time_step, self.step, self.method)
        });
        Ok(())
    }

    #[cfg(feature = "alloc")]
    fn run_alloc<I1, I2>(
        &self,
        signal: &I1,
        frequencies: &I2,
    ) -> Result<Vec<f64>, ExecInvariantViolation>
    where
        I1: Read1D<Complex<f64>> + ?Sized,
        I2: Read1D<f64> + ?Sized,
    {
        let signal = signal.read_slice().map_err(ExecInvariantViolation::from)?;
        validate_signal(signal, self.step)?;
        let frequencies = frequencies
            .read_slice()
            .map_err(ExecInvariantViolation::from)?;

        let mut out = vec![0.0; frequencies.len()];
        fill_slots(frequencies, &mut out, |f| {
            averaged_at(2.0 * PI * f, signal, self.time_step, self.step, self.method)
        });
        Ok(out)
    }
}

/// Constructor config for [`SimplePsdKernel`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimplePsdConfig {
    /// Sampling interval of the signal.
    pub time_step: f64,
    /// Lag increment; coarsens the lag grid, trading accuracy for speed.
    pub step: usize,
    /// Quadrature rule for the lag integral.
    pub method: IntegrationMethod,
}

/// Trait-first simple-strategy spectrum kernel.
///
/// The frequency grid carries angular frequencies; no `2*pi` conversion is
/// applied. Each lag's inner sum is normalized by its own sample count
/// before the lags are accumulated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimplePsdKernel {
    time_step: f64,
    step: usize,
    method: IntegrationMethod,
}

impl KernelLifecycle for SimplePsdKernel {
    type Config = SimplePsdConfig;

    fn try_new(config: Self::Config) -> Result<Self, ConfigError> {
        validate_quadrature_config(config.time_step, config.step)?;
        Ok(Self {
            time_step: config.time_step,
            step: config.step,
            method: config.method,
        })
    }
}

impl CorrelationPsd1D for SimplePsdKernel {
    fn run_into<I1, I2, O>(
        &self,
        signal: &I1,
        frequencies: &I2,
        psd: &mut O,
    ) -> Result<(), ExecInvariantViolation>
    where
        I1: Read1D<Complex<f64>> + ?Sized,
        I2: Read1D<f64> + ?Sized,
        O: Write1D<f64> + ?Sized,
    {
        let signal = signal.read_slice().map_err(ExecInvariantViolation::from)?;
        validate_signal(signal, self.step)?;
        let frequencies = frequencies
            .read_slice()
            .map_err(ExecInvariantViolation::from)?;
        let out = psd.write_slice_mut().map_err(ExecInvariantViolation::from)?;
        if out.len() != frequencies.len() {
            return Err(ExecInvariantViolation::LengthMismatch {
                arg: "psd",
                expected: frequencies.len(),
                got: out.len(),
            });
        }

        fill_slots(frequencies, out, |w| {
            simple_at(w, signal, self.time_step, self.step, self.method)
        });
        Ok(())
    }

    #[cfg(feature = "alloc")]
    fn run_alloc<I1, I2>(
        &self,
        signal: &I1,
        frequencies: &I2,
    ) -> Result<Vec<f64>, ExecInvariantViolation>
    where
        I1: Read1D<Complex<f64>> + ?Sized,
        I2: Read1D<f64> + ?Sized,
    {
        let signal = signal.read_slice().map_err(ExecInvariantViolation::from)?;
        validate_signal(signal, self.step)?;
        let frequencies = frequencies
            .read_slice()
            .map_err(ExecInvariantViolation::from)?;

        let mut out = vec![0.0; frequencies.len()];
        fill_slots(frequencies, &mut out, |w| {
            simple_at(w, signal, self.time_step, self.step, self.method)
        });
        Ok(out)
    }
}

/// Estimate the power spectrum at linear frequencies with the averaged
/// strategy.
///
/// `frequencies` is in cycles per unit time; each entry is converted to an
/// angular frequency internally. Fails if the configuration is invalid or
/// the signal holds fewer than `step + 1` samples; no output is produced on
/// failure.
#[cfg(feature = "alloc")]
pub fn correlation_psd(
    signal: &[Complex<f64>],
    frequencies: &[f64],
    time_step: f64,
    step: usize,
    method: IntegrationMethod,
) -> Result<Vec<f64>, Error> {
    let kernel = AveragedPsdKernel::try_new(AveragedPsdConfig {
        time_step,
        step,
        method,
    })?;
    Ok(kernel.run_alloc(signal, frequencies)?)
}

/// Estimate the power spectrum at angular frequencies with the simple
/// strategy.
///
/// `angular_frequencies` is in radians per unit time and is used as-is.
#[cfg(feature = "alloc")]
pub fn correlation_psd_angular(
    signal: &[Complex<f64>],
    angular_frequencies: &[f64],
    time_step: f64,
    step: usize,
    method: IntegrationMethod,
) -> Result<Vec<f64>, Error> {
    let kernel = SimplePsdKernel::try_new(SimplePsdConfig {
        time_step,
        step,
        method,
    })?;
    Ok(kernel.run_alloc(signal, angular_frequencies)?)
}
