//! Fixed-point alignment back to 16-bit samples.

use crate::audio::constants::{MAX_HWORD, MIN_HWORD};

/// Round `v` to the nearest multiple of `2^scl`, drop the fraction and
/// saturate into the `i16` range.
///
/// Every output sample of every kernel goes through here exactly once.
/// The accumulator is widened to `i64` so oversized gains clip instead of
/// wrapping.
#[inline]
pub fn word_to_hword(v: i64, scl: u32) -> i16 {
    debug_assert!(scl > 0 && scl < 63);
    let v = (v + (1 << (scl - 1))) >> scl;
    v.clamp(MIN_HWORD, MAX_HWORD) as i16
}
