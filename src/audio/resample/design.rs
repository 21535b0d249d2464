//! Kaiser-windowed low-pass design for half-impulse-response filter tables.
//!
//! The table holds one wing of a symmetric impulse response sampled `NPC`
//! times per zero crossing, quantized to `NH` bits, together with the
//! unity-gain scale that restores the DC gain after the fixed-point kernels.

use std::f64::consts::PI;

use crate::audio::constants::{IZERO_EPSILON, NH, NLPSCL, NPC};
use crate::common::errors::ConfigError;

/// Quantized output of [`design`].
#[derive(Debug, Clone, PartialEq)]
pub struct DesignedFilter {
    pub imp: Vec<i16>,
    pub imp_d: Vec<i16>,
    pub lp_scl: u16,
}

/// Zeroth-order modified Bessel function of the first kind.
fn izero(x: f64) -> f64 {
    let half = x / 2.0;
    let mut sum = 1.0;
    let mut term = 1.0;
    let mut n = 1.0;
    loop {
        let t = half / n;
        n += 1.0;
        term *= t * t;
        sum += term;
        if term < IZERO_EPSILON * sum {
            return sum;
        }
    }
}

/// Ideal low-pass at `cutoff` (fraction of the sample rate), windowed by a
/// Kaiser window of shape `beta`. The last window value is `1/I0(beta)`, not
/// zero: the window is truncated, not ramped.
fn kaiser_lowpass(len: usize, cutoff: f64, beta: f64) -> Vec<f64> {
    let mut c = Vec::with_capacity(len);
    c.push(2.0 * cutoff);
    for i in 1..len {
        let x = PI * i as f64 / NPC as f64;
        c.push((2.0 * x * cutoff).sin() / x);
    }

    let inv_i0_beta = 1.0 / izero(beta);
    let inv_span = 1.0 / (len - 1) as f64;
    for (i, coeff) in c.iter_mut().enumerate().skip(1) {
        let t = i as f64 * inv_span;
        let arg = (1.0 - t * t).max(0.0);
        *coeff *= izero(beta * arg.sqrt()) * inv_i0_beta;
    }
    c
}

/// Coefficient differences used for sub-tap interpolation. The last
/// coefficient interpolates towards zero. Every step must fit in an `i16`.
pub fn differences(imp: &[i16]) -> Result<Vec<i16>, ConfigError> {
    let step = |i: usize, from: i16, to: i16| {
        i16::try_from(i32::from(to) - i32::from(from)).map_err(|_| {
            ConfigError::InvalidTable(format!(
                "step from coefficient {i} ({from}) to {to} does not fit in 16 bits"
            ))
        })
    };

    let mut imp_d = Vec::with_capacity(imp.len());
    for (i, w) in imp.windows(2).enumerate() {
        imp_d.push(step(i, w[0], w[1])?);
    }
    if let Some(&last) = imp.last() {
        imp_d.push(step(imp.len() - 1, last, 0)?);
    }
    Ok(imp_d)
}

/// Design a table for a filter `nmult` taps long with the given rolloff
/// (fraction of Nyquist) and Kaiser `beta`.
pub fn design(nmult: u16, rolloff: f64, beta: f64) -> Result<DesignedFilter, ConfigError> {
    if nmult < 3 || nmult % 2 == 0 {
        return Err(ConfigError::InvalidTable(format!(
            "filter length must be an odd number of taps >= 3, got {nmult}"
        )));
    }
    if !(rolloff > 0.0 && rolloff <= 1.0) {
        return Err(ConfigError::InvalidTable(format!(
            "rolloff must lie in (0, 1], got {rolloff}"
        )));
    }
    if !(beta.is_finite() && beta >= 0.0) {
        return Err(ConfigError::InvalidTable(format!(
            "kaiser beta must be finite and non-negative, got {beta}"
        )));
    }

    let nwing = NPC * (usize::from(nmult) - 1) / 2;
    if nwing > usize::from(u16::MAX) {
        return Err(ConfigError::InvalidTable(format!(
            "{nmult} taps need {nwing} table entries, more than a table can index"
        )));
    }

    let mut c = kaiser_lowpass(nwing, 0.5 * rolloff, beta);

    let dc_gain = 2.0 * c.iter().step_by(NPC).skip(1).sum::<f64>() + c[0];
    let max_h = c.iter().fold(0.0f64, |m, v| m.max(v.abs()));

    let mut scl = f64::from((1u32 << (NH - 1)) - 1) / max_h;
    let lp_scl = (f64::from(1u32 << (NLPSCL + NH)) / (dc_gain * scl)).abs();
    if !lp_scl.is_finite() || lp_scl >= f64::from(1u32 << 16) {
        return Err(ConfigError::InvalidTable(format!(
            "unity-gain scale {lp_scl:.1} does not fit in 16 bits"
        )));
    }

    if c[0] < 0.0 {
        scl = -scl;
    }
    for v in c.iter_mut() {
        *v *= scl;
    }
    let imp: Vec<i16> = c.iter().map(|v| (v + 0.5) as i16).collect();
    let imp_d = differences(&imp)?;

    Ok(DesignedFilter {
        imp,
        imp_d,
        lp_scl: lp_scl as u16,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn izero_matches_known_values() {
        assert!((izero(0.0) - 1.0).abs() < 1e-15);
        assert!((izero(1.0) - 1.266_065_877_752_008_4).abs() < 1e-12);
        assert!((izero(6.0) - 67.234_406_976_477_97).abs() < 1e-9);
    }

    #[test]
    fn low_table_shape() {
        let f = design(13, 0.80, 6.0).expect("low design");
        assert_eq!(f.imp.len(), 1536);
        assert_eq!(f.imp_d.len(), 1536);
        // Peak coefficient maps to the 16-bit maximum.
        assert_eq!(f.imp[0], 32767);
        assert!(f.imp.iter().all(|&c| c <= f.imp[0]));
        // Close to the classic 13-tap table's scale of 13128.
        assert!((13_000..13_300).contains(&f.lp_scl), "lp_scl = {}", f.lp_scl);
    }

    #[test]
    fn differences_are_consistent() {
        let f = design(21, 0.85, 7.0).expect("medium design");
        for i in 0..f.imp.len() - 1 {
            assert_eq!(
                i32::from(f.imp[i]) + i32::from(f.imp_d[i]),
                i32::from(f.imp[i + 1])
            );
        }
        assert_eq!(f.imp_d[f.imp.len() - 1], -f.imp[f.imp.len() - 1]);
    }

    #[test]
    fn differences_reject_steps_wider_than_16_bits() {
        assert_eq!(differences(&[3, 1]).unwrap(), vec![-2, -1]);
        assert!(matches!(
            differences(&[-20_000, 20_000]),
            Err(ConfigError::InvalidTable(_))
        ));
        // Interpolating the last coefficient towards zero overflows too.
        assert!(matches!(differences(&[i16::MIN]), Err(ConfigError::InvalidTable(_))));
    }

    #[test]
    fn rejects_bad_parameters() {
        assert!(matches!(design(12, 0.8, 6.0), Err(ConfigError::InvalidTable(_))));
        assert!(matches!(design(1, 0.8, 6.0), Err(ConfigError::InvalidTable(_))));
        assert!(matches!(design(13, 0.0, 6.0), Err(ConfigError::InvalidTable(_))));
        assert!(matches!(design(13, 1.5, 6.0), Err(ConfigError::InvalidTable(_))));
        assert!(matches!(design(13, 0.8, f64::NAN), Err(ConfigError::InvalidTable(_))));
    }
}
