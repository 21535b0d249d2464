//! Fast linear-interpolation kernel.
//!
//! Blends the two input frames bracketing each output time, per channel,
//! by the fractional position between them. Cheapest mode and the most
//! aliasing-prone; meant for previews and rough rate changes.

use super::kernel::Kernel;
use super::quantize::word_to_hword;
use crate::audio::constants::{CHANNELS, NP};

pub(crate) struct LinearKernel;

impl Kernel for LinearKernel {
    #[inline]
    fn sample(&self, buf: &[i16], pos: usize, phase: u32) -> i16 {
        let x1 = i64::from(buf[pos]) * i64::from((1u32 << NP) - phase);
        let x2 = i64::from(buf[pos + CHANNELS]) * i64::from(phase);
        word_to_hword(x1 + x2, NP)
    }
}
