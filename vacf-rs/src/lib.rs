//! Power spectral density estimation by direct quadrature of the
//! autocorrelation integral of a uniformly sampled complex signal.
//!
//! The crate grew out of analyzing particle-velocity trajectories from
//! molecular-dynamics runs, where the spectrum is wanted at an arbitrary,
//! caller-chosen frequency grid rather than at FFT bins. The estimator
//! correlates the signal against itself at a coarsened grid of time lags,
//! phase-rotates each lag by the trial frequency, and integrates numerically
//! with either a rectangular or a trapezoid rule.
//!
//! Two quadrature/normalization strategies are exposed behind the
//! [`signal::traits::CorrelationPsd1D`] capability trait:
//!
//! - [`signal::correlation::AveragedPsdKernel`] takes a linear-frequency
//!   grid in Hz and applies the averaged normalization;
//! - [`signal::correlation::SimplePsdKernel`] takes angular frequencies
//!   directly and normalizes each lag contribution by its sample count.
//!
//! Kernels validate their configuration at construction via
//! [`kernel::KernelLifecycle::try_new`] and their inputs at run time; both
//! strategies are pure functions of their inputs and hold no state between
//! calls.
//!
//! Evaluation is independent per frequency. With the `parallel` feature the
//! frequency loop runs on rayon's global pool; the sequential and parallel
//! paths produce bit-identical output.

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

#[cfg(feature = "alloc")]
#[macro_use]
extern crate alloc;

pub mod error;
pub mod kernel;
pub mod signal;

pub use error::Error;
