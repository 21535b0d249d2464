//! Polyphase FIR kernels.
//!
//! Each output sample is the sum of two wing inner products: the left wing
//! walks the input backwards from the current frame, the right wing walks
//! forwards from the next one. The table position advances by `dhb` entries
//! (`NA` fractional bits) per input frame: one full period when
//! up-converting, `factor` periods when decimating so the cutoff follows the
//! output rate.

use std::iter;

use super::kernel::Kernel;
use super::quantize::word_to_hword;
use super::table::FilterTable;
use crate::audio::constants::{AMASK, CHANNELS, NA, NHG, NHXN, NLPSCL, NP, PMASK, UNIT_STEP};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wing {
    Left,
    Right,
}

/// Round away the low `NHXN` bits of a coefficient × sample product.
#[inline]
fn guard(t: i32) -> i32 {
    const HALF: i32 = 1 << (NHXN - 1);
    let t = if t & HALF != 0 { t + HALF } else { t };
    t >> NHXN
}

pub(crate) struct Fir {
    table: FilterTable,
    interpolate: bool,
    /// Unity-gain scale after headroom and decimation scaling.
    lp_scl: u16,
}

impl Fir {
    pub(crate) fn new(table: FilterTable, interpolate: bool, lp_scl: u16) -> Self {
        Self {
            table,
            interpolate,
            lp_scl,
        }
    }

    pub(crate) fn lp_scl(&self) -> u16 {
        self.lp_scl
    }

    fn wing<'a>(
        &self,
        samples: impl Iterator<Item = &'a i16>,
        ph: u32,
        dhb: u32,
        wing: Wing,
    ) -> i32 {
        let imp = self.table.imp();
        let imp_d = self.table.imp_d();

        let mut end = imp.len();
        let mut ho = (ph * dhb) >> NP;
        if wing == Wing::Right {
            // Drop the extra coefficient so a phase of one half does not
            // take one product too many; at phase zero the first right-wing
            // sample coincides with the left wing's, so skip a period.
            end -= 1;
            if ph == 0 {
                ho += dhb;
            }
        }
        let end = (end as u32) << NA;

        iter::successors(Some(ho), |h| h.checked_add(dhb))
            .take_while(|&h| h < end)
            .zip(samples)
            .map(|(h, &x)| {
                let i = (h >> NA) as usize;
                let mut t = i32::from(imp[i]);
                if self.interpolate {
                    t += (i32::from(imp_d[i]) * (h & AMASK) as i32) >> NA;
                }
                guard(t * i32::from(x))
            })
            .sum()
    }

    #[inline]
    fn filter(&self, buf: &[i16], pos: usize, phase: u32, dhb: u32) -> i16 {
        let left = self.wing(buf[..=pos].iter().rev().step_by(CHANNELS), phase, dhb, Wing::Left);
        let right_phase = ((phase ^ PMASK) + 1) & PMASK;
        let right = self.wing(
            buf[pos + CHANNELS..].iter().step_by(CHANNELS),
            right_phase,
            dhb,
            Wing::Right,
        );
        let v = (left + right) >> NHG;
        word_to_hword(i64::from(v) * i64::from(self.lp_scl), NLPSCL)
    }
}

/// Up-conversion (`factor >= 1`): one table period per input frame.
pub(crate) struct FixedStep(pub(crate) Fir);

impl Kernel for FixedStep {
    #[inline]
    fn sample(&self, buf: &[i16], pos: usize, phase: u32) -> i16 {
        self.0.filter(buf, pos, phase, UNIT_STEP)
    }
}

/// Combined up/down conversion (`factor < 1`): the table step shrinks with
/// the ratio, dilating the impulse response over more input frames.
pub(crate) struct VariableStep {
    pub(crate) fir: Fir,
    pub(crate) dhb: u32,
}

impl Kernel for VariableStep {
    #[inline]
    fn sample(&self, buf: &[i16], pos: usize, phase: u32) -> i16 {
        self.fir.filter(buf, pos, phase, self.dhb)
    }
}
