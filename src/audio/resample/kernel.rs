use crate::audio::constants::{CHANNELS, NP, PMASK};

/// One output sample per call, evaluated at a fixed-point time position.
pub(crate) trait Kernel {
    /// Value for the channel whose sample at the current input frame sits at
    /// `pos` in the interleaved `buf`; `phase` holds the `NP` fractional bits
    /// of the time position.
    fn sample(&self, buf: &[i16], pos: usize, phase: u32) -> i16;
}

/// Walk the time accumulator from `time` up to (excluding) `end`, both in
/// `NP`-bit fixed point relative to frame 0 of `buf`, stepping by `dtb` and
/// appending one interleaved frame per step. Returns the first time not
/// produced.
pub(crate) fn convolve<K: Kernel>(
    kernel: &K,
    buf: &[i16],
    mut time: u64,
    end: u64,
    dtb: u64,
    out: &mut Vec<i16>,
) -> u64 {
    while time < end {
        let pos = (time >> NP) as usize * CHANNELS;
        let phase = (time & u64::from(PMASK)) as u32;
        for ch in 0..CHANNELS {
            out.push(kernel.sample(buf, pos + ch, phase));
        }
        time += dtb;
    }
    time
}
