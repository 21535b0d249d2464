//! PCM resampling of interleaved stereo `i16` blocks by an arbitrary ratio.
//!
//! | Quality | Mode | Kernel |
//! |---|---|---|
//! | [`Quality::Basic`] | [`Mode::Fast`] | linear interpolation |
//! | Low / Medium / Custom, `factor >= 1` | [`Mode::UpOnly`] | FIR, fixed table step |
//! | Low / Medium / Custom, `factor < 1` | [`Mode::UpDown`] | FIR, table step scaled by `factor` |
//!
//! Blocks are stitched through an overlap buffer holding the filter's reach
//! on both sides of the block boundary, and the time accumulator (whole
//! frames of creep plus the fractional phase) is carried from one call to the
//! next. Any split of a stream into blocks therefore yields exactly the
//! samples a single call over the whole stream would.

pub mod design;
mod fir;
mod kernel;
mod linear;
pub mod quantize;
pub mod table;

pub use table::{FilterTable, Quality, QualityLevel};

use tracing::debug;

use self::fir::{Fir, FixedStep, VariableStep};
use self::kernel::convolve;
use self::linear::LinearKernel;
use crate::audio::constants::{
    CHANNELS, CREEP_ROOM, LP_SCL_HEADROOM, NA, NP, NPC, PMASK, UNIT_STEP,
};
use crate::common::errors::{ConfigError, PreconditionError, ResampleError};

/// Processing mode, derived from quality and ratio at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Fast,
    UpOnly,
    UpDown,
}

/// Kernel chosen once at construction. Dispatch happens once per
/// convolution pass; the per-sample loop is monomorphized per kernel.
enum Strategy {
    Linear(LinearKernel),
    Fixed(FixedStep),
    Variable(VariableStep),
}

impl Strategy {
    fn run(&self, buf: &[i16], time: u64, end: u64, dtb: u64, out: &mut Vec<i16>) -> u64 {
        match self {
            Self::Linear(k) => convolve(k, buf, time, end, dtb, out),
            Self::Fixed(k) => convolve(k, buf, time, end, dtb, out),
            Self::Variable(k) => convolve(k, buf, time, end, dtb, out),
        }
    }

    fn lp_scl(&self) -> Option<u16> {
        match self {
            Self::Linear(_) => None,
            Self::Fixed(k) => Some(k.0.lp_scl()),
            Self::Variable(k) => Some(k.fir.lp_scl()),
        }
    }
}

/// Streaming resampler for one stereo stream.
///
/// Create once per stream, feed successive blocks to [`process`], call
/// [`flush`] to start over on the same allocation, drop when done. Blocks
/// must hold at least [`min_block_frames`] frames.
///
/// [`process`]: Resampler::process
/// [`flush`]: Resampler::flush
/// [`min_block_frames`]: Resampler::min_block_frames
pub struct Resampler {
    /// Output rate / input rate.
    factor: f64,
    mode: Mode,
    strategy: Strategy,
    /// Output period in input frames, `NP`-bit fixed point.
    dtb: u64,
    /// Frames of context needed on each side of a convolution.
    xoff: usize,
    /// Whole frames the previous block's time overshot its safe end.
    creep: usize,
    /// Fractional part of the carried time.
    phase: u64,
    /// `2*xoff - creep` saved frames followed by the head of the new block.
    overlap: Vec<i16>,
}

impl Resampler {
    /// Create a resampler for `factor = output rate / input rate`.
    ///
    /// `interpolate` enables coefficient interpolation between table
    /// entries; it has no effect on [`Quality::Basic`].
    pub fn new(factor: f64, quality: Quality, interpolate: bool) -> Result<Self, ResampleError> {
        if !(factor.is_finite() && factor > 0.0) {
            return Err(ConfigError::InvalidRatio(factor).into());
        }

        let dt = 1.0 / factor;
        let dtb = (dt * f64::from(1u32 << NP) + 0.5) as u64;
        if dtb == 0 {
            return Err(ConfigError::InvalidRatio(factor).into());
        }

        let (mode, strategy, xoff) = match quality.table() {
            None => {
                let xoff = CREEP_ROOM.max(dt.ceil() as usize);
                (Mode::Fast, Strategy::Linear(LinearKernel), xoff)
            }
            Some(table) => {
                // Reach of the filter wing, plus some creeping room.
                let xoff = ((table.half_length() * dt.max(1.0)).ceil() as usize)
                    .checked_add(CREEP_ROOM)
                    .ok_or(ConfigError::InvalidRatio(factor))?;

                // Reduce clipping probability.
                let mut lp_scl = (f32::from(table.lp_scl()) * LP_SCL_HEADROOM) as u16;

                let (mode, dhb) = if factor < 1.0 {
                    lp_scl = (f64::from(lp_scl) * factor + 0.5) as u16;
                    let dh = (NPC as f64 * factor).min(NPC as f64);
                    (Mode::UpDown, (dh * f64::from(1u32 << NA) + 0.5) as u32)
                } else {
                    (Mode::UpOnly, UNIT_STEP)
                };
                if dhb == 0 || lp_scl == 0 {
                    return Err(ConfigError::InvalidRatio(factor).into());
                }

                let reach = table.wing_reach(dhb);
                if reach > xoff {
                    return Err(ConfigError::WingReach { reach, xoff }.into());
                }

                let fir = Fir::new(table, interpolate, lp_scl);
                let strategy = match mode {
                    Mode::UpDown => Strategy::Variable(VariableStep { fir, dhb }),
                    _ => Strategy::Fixed(FixedStep(fir)),
                };
                (mode, strategy, xoff)
            }
        };

        let samples = overlap_samples(xoff).ok_or(ConfigError::InvalidRatio(factor))?;
        let mut overlap = Vec::new();
        overlap
            .try_reserve_exact(samples)
            .map_err(|_| ResampleError::Allocation { samples })?;
        overlap.resize(samples, 0);

        debug!(
            "Resampler created: factor={:.6} quality={} mode={:?} xoff={} lp_scl={:?} interpolate={}",
            factor,
            quality.level(),
            mode,
            xoff,
            strategy.lp_scl(),
            interpolate
        );

        Ok(Self {
            factor,
            mode,
            strategy,
            dtb,
            xoff,
            creep: 0,
            phase: 0,
            overlap,
        })
    }

    /// Resample one block of interleaved stereo `input` and **append** the
    /// produced frames to `output`. Returns the number of frames produced.
    ///
    /// The block must hold at least [`min_block_frames`](Self::min_block_frames)
    /// frames; a rejected block leaves the resampler untouched. No allocation
    /// happens when `output` has room for
    /// [`max_output_frames`](Self::max_output_frames) more frames.
    pub fn process(&mut self, input: &[i16], output: &mut Vec<i16>) -> Result<usize, PreconditionError> {
        if input.len() % CHANNELS != 0 {
            return Err(PreconditionError::PartialFrame {
                samples: input.len(),
            });
        }
        let frames = input.len() / CHANNELS;
        let required = self.min_block_frames();
        if frames < required {
            return Err(PreconditionError::BlockTooShort { frames, required });
        }

        let xoff = self.xoff;
        let saved = 2 * xoff - self.creep;
        let start = output.len();
        output.reserve(self.max_output_frames(frames) * CHANNELS);

        // Stage the head of the new block behind the saved tail so the
        // boundary can be convolved from one contiguous buffer.
        self.overlap[saved * CHANNELS..].copy_from_slice(&input[..required * CHANNELS]);

        let time = ((xoff as u64) << NP) + self.phase;
        let end = (3 * xoff as u64) << NP;
        let time = self.strategy.run(&self.overlap, time, end, self.dtb, output);

        // Same position, now relative to the first frame of `input`.
        let time = time - ((saved as u64) << NP);
        let end = ((frames - xoff) as u64) << NP;
        let time = self.strategy.run(input, time, end, self.dtb, output);

        self.creep = (time >> NP) as usize - (frames - xoff);
        self.phase = time & u64::from(PMASK);
        debug_assert!(self.creep <= xoff);

        // Remember the end of the block for the next call.
        let keep = 2 * xoff - self.creep;
        self.overlap[..keep * CHANNELS].copy_from_slice(&input[(frames - keep) * CHANNELS..]);

        Ok((output.len() - start) / CHANNELS)
    }

    /// Drop all history, as if the stream started over.
    pub fn flush(&mut self) {
        self.creep = 0;
        self.phase = 0;
        self.overlap.fill(0);
        debug!("Resampler flushed: factor={:.6} mode={:?}", self.factor, self.mode);
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Frames of context kept on each side of the current position (`Xoff`).
    pub fn wing_reach(&self) -> usize {
        self.xoff
    }

    /// Input frames by which the output lags the input. The first output
    /// frame sits this many input periods before the first input frame.
    pub fn latency_frames(&self) -> usize {
        self.xoff
    }

    /// Whole frames of time carried into the next block.
    pub fn creep(&self) -> usize {
        self.creep
    }

    /// Smallest block the next [`process`](Self::process) call accepts.
    pub fn min_block_frames(&self) -> usize {
        2 * self.xoff + self.creep
    }

    /// Block length accepted whatever creep is carried.
    pub fn safe_block_frames(&self) -> usize {
        3 * self.xoff
    }

    /// Upper bound on the frames one call over `frames` input frames can
    /// produce.
    pub fn max_output_frames(&self, frames: usize) -> usize {
        ((frames as u64) << NP).div_ceil(self.dtb) as usize + 1
    }

    /// Unity-gain scale in use, `None` in fast mode.
    pub fn lp_scl(&self) -> Option<u16> {
        self.strategy.lp_scl()
    }
}

/// Samples in a `4*xoff` frame overlap buffer, if the time accumulator can
/// address all of it.
fn overlap_samples(xoff: usize) -> Option<usize> {
    let frames = xoff.checked_mul(4)?;
    if frames as u64 > u64::MAX >> NP {
        return None;
    }
    frames.checked_mul(CHANNELS)
}
