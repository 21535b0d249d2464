//! Central constants for the resampling engine.
//!
//! The fixed-point widths below are the numerical contract of the filters:
//! they decide accumulator precision, guard bits and coefficient
//! interpolation granularity, and every kernel reads them from here.

// ── Fixed-point layout ───────────────────────────────────────────────────────

/// Log2 of the number of filter-table entries per zero crossing.
pub const NHC: u32 = 8;

/// Bits of table-address fraction used for coefficient interpolation.
pub const NA: u32 = 7;

/// Fractional bits of the time accumulator.
pub const NP: u32 = NHC + NA;

/// Filter-table entries per input sample period.
pub const NPC: usize = 1 << NHC;

pub const AMASK: u32 = (1 << NA) - 1;
pub const PMASK: u32 = (1 << NP) - 1;

/// Bits in a filter coefficient.
pub const NH: u32 = 16;

/// Bits in an input sample.
pub const NB: u32 = 16;

/// Bits dropped from each coefficient × sample product.
pub const NHXN: u32 = 14;

/// Guard bits kept in the wing sums.
pub const NHG: u32 = NH - NHXN;

/// Fractional bits of the unity-gain scale factor.
pub const NLPSCL: u32 = 13;

/// Table step of the up-conversion kernel: one full period per input sample.
pub const UNIT_STEP: u32 = (NPC as u32) << NA;

const _: () = assert!(NP < 16, "Np must stay below 16");
const _: () = assert!(NB + NHG + NLPSCL < 32, "Nb+Nhg+NLpScl must stay below 32");
const _: () = assert!(NH + NB <= 32, "Nh+Nb must fit in 32 bits");

// ── Overlap protocol ─────────────────────────────────────────────────────────

/// Frames of creeping room added on top of the filter reach.
pub const CREEP_ROOM: usize = 10;

/// Interleaved channel count handled by the engine.
pub const CHANNELS: usize = 2;

/// Headroom applied to every FIR unity-gain scale to reduce clipping.
pub const LP_SCL_HEADROOM: f32 = 0.95;

// ── Filter design ────────────────────────────────────────────────────────────

/// Relative convergence bound of the I0 Bessel power series.
pub const IZERO_EPSILON: f64 = 1e-21;

pub const LOW_NMULT: u16 = 13;
pub const LOW_ROLLOFF: f64 = 0.80;
pub const LOW_BETA: f64 = 6.0;

pub const MEDIUM_NMULT: u16 = 21;
pub const MEDIUM_ROLLOFF: f64 = 0.85;
pub const MEDIUM_BETA: f64 = 7.0;

// ── i16 PCM clip boundaries ──────────────────────────────────────────────────

pub const MAX_HWORD: i64 = i16::MAX as i64;
pub const MIN_HWORD: i64 = i16::MIN as i64;

// ── Streaming ────────────────────────────────────────────────────────────────

/// Frames read per block by the file pipeline (8 KB of stereo PCM).
pub const DEFAULT_BLOCK_FRAMES: usize = 2_048;

/// Bytes in one interleaved stereo 16-bit frame.
pub const BYTES_PER_FRAME: usize = CHANNELS * 2;
