//! Streaming sampling-rate conversion of interleaved stereo 16-bit PCM.
//!
//! The core is [`Resampler`]: create it for a ratio and quality, feed it
//! blocks, and it stitches them seamlessly. [`audio::wav`] and
//! [`audio::pipeline`] move whole WAV files through it; [`cli`] is the
//! `resample` command.

pub mod audio;
pub mod cli;
pub mod common;
pub mod configs;

pub use audio::resample::{FilterTable, Mode, Quality, QualityLevel, Resampler};
pub use common::errors::{ConfigError, PreconditionError, ResampleError};
