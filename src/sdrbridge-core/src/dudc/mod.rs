// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Fractional-ratio joint DDC/DUC engine.
//!
//! One streaming pass over each I/Q sample does: frequency shift down by
//! the RX IF, polyphase decimate to baseband, call out to a per-baseband
//! hook, polyphase interpolate back up, frequency shift up by the TX IF.
//! The hook runs once per baseband tick and must not allocate; everything
//! in this module is pre-sized at construction.

pub mod filter;

use num_complex::Complex32;

/// Errors raised when constructing an [`Fdudc`] with parameters that would
/// produce a degenerate filter. There are no error paths once built; the
/// streaming hot path cannot fail.
#[derive(Debug, thiserror::Error)]
pub enum FdudcError {
    #[error("resampNum and resampDen must both be positive (got {resamp_num}/{resamp_den})")]
    InvalidRatio { resamp_num: u32, resamp_den: u32 },
    #[error("cutoff must be in (0, 1], got {0}")]
    InvalidCutoff(f32),
    #[error("branchlen rounded to zero (resampDen={resamp_den}, approxLength={approx_length}, resampNum={resamp_num})")]
    ZeroBranchLength {
        resamp_den: u32,
        approx_length: u32,
        resamp_num: u32,
    },
}

/// Construction parameters for [`Fdudc::new`].
pub struct FdudcConfig {
    pub resamp_num: u32,
    pub resamp_den: u32,
    pub approx_length: u32,
    pub cutoff: f32,
    pub rx_if_num: i32,
    pub rx_if_den: u32,
    pub tx_if_num: i32,
    pub tx_if_den: u32,
}

/// Joint DDC+DUC engine (C3). See module docs.
pub struct Fdudc {
    resamp_num: u32,
    resamp_den: u32,
    branchlen: usize,
    taps: Vec<f32>,

    ddc_sine: Vec<Complex32>,
    duc_sine: Vec<Complex32>,

    in_buf: Vec<Complex32>,
    out_buf: Vec<Complex32>,

    p: u32,
    i: usize,
    ddc_i: usize,
    duc_i: usize,
}

impl Fdudc {
    pub fn new(cfg: FdudcConfig) -> Result<Self, FdudcError> {
        if cfg.resamp_num == 0 || cfg.resamp_den == 0 {
            return Err(FdudcError::InvalidRatio {
                resamp_num: cfg.resamp_num,
                resamp_den: cfg.resamp_den,
            });
        }
        if !(cfg.cutoff > 0.0 && cfg.cutoff <= 1.0) {
            return Err(FdudcError::InvalidCutoff(cfg.cutoff));
        }
        let branchlen = ((cfg.resamp_den as f64 * cfg.approx_length as f64
            / cfg.resamp_num as f64)
            .round()) as usize;
        if branchlen == 0 {
            return Err(FdudcError::ZeroBranchLength {
                resamp_den: cfg.resamp_den,
                approx_length: cfg.approx_length,
                resamp_num: cfg.resamp_num,
            });
        }
        let total_len = branchlen * cfg.resamp_num as usize;
        let cutoff_norm = cfg.cutoff / cfg.resamp_den as f32;
        let taps = filter::polyphase_taps(total_len, cfg.resamp_num as usize, cutoff_norm);

        let ddc_sine = sine_table(-cfg.rx_if_num, cfg.rx_if_den);
        let duc_sine = sine_table(cfg.tx_if_num, cfg.tx_if_den);

        Ok(Self {
            resamp_num: cfg.resamp_num,
            resamp_den: cfg.resamp_den,
            branchlen,
            taps,
            ddc_sine,
            duc_sine,
            in_buf: vec![Complex32::default(); 2 * branchlen],
            out_buf: vec![Complex32::default(); 2 * branchlen],
            p: 0,
            i: 0,
            ddc_i: 0,
            duc_i: 0,
        })
    }

    pub fn branchlen(&self) -> usize {
        self.branchlen
    }

    /// Group delay of the polyphase prototype filter, in baseband samples.
    pub fn filter_delay(&self) -> usize {
        self.branchlen / 2
    }

    /// Process `buffer` in place. `hook` is called once per baseband tick
    /// with the demodulated RX sample and returns the TX sample to
    /// up-convert back out; it must not allocate.
    pub fn process<F>(&mut self, buffer: &mut [Complex32], mut hook: F)
    where
        F: FnMut(Complex32) -> Complex32,
    {
        let branchlen = self.branchlen;
        let resamp_num = self.resamp_num;
        let resamp_den = self.resamp_den;
        let gain = resamp_den as f32 / resamp_num as f32;

        for sample in buffer.iter_mut() {
            let x = *sample * self.ddc_sine[self.ddc_i];
            self.in_buf[self.i] = x;
            self.in_buf[self.i + branchlen] = x;
            self.ddc_i = (self.ddc_i + 1) % self.ddc_sine.len();

            self.p += resamp_num;
            while self.p >= resamp_den {
                self.p -= resamp_den;
                let p = self.p as usize;

                let window = &self.in_buf[self.i + 1..self.i + 1 + branchlen];
                let mut rx = Complex32::default();
                for (k, s) in window.iter().enumerate() {
                    rx += *s * self.taps[p + k * resamp_num as usize];
                }

                let tx = hook(rx) * gain;
                for k in 0..branchlen {
                    self.out_buf[self.i + 1 + k] += tx * self.taps[p + k * resamp_num as usize];
                }
            }

            let out = (self.out_buf[self.i] + self.out_buf[self.i + branchlen])
                * self.duc_sine[self.duc_i];
            self.out_buf[self.i] = Complex32::default();
            self.out_buf[self.i + branchlen] = Complex32::default();
            self.duc_i = (self.duc_i + 1) % self.duc_sine.len();
            self.i = (self.i + 1) % branchlen;

            *sample = out;
        }
    }
}

fn sine_table(if_num: i32, if_den: u32) -> Vec<Complex32> {
    let den = if_den.max(1);
    (0..den)
        .map(|i| {
            let theta = 2.0 * std::f32::consts::PI * (if_num as f32 / den as f32) * i as f32;
            Complex32::new(theta.cos(), theta.sin())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity_cfg(resamp_num: u32, resamp_den: u32) -> FdudcConfig {
        FdudcConfig {
            resamp_num,
            resamp_den,
            approx_length: 11,
            cutoff: 0.5,
            rx_if_num: 0,
            rx_if_den: 1,
            tx_if_num: 0,
            tx_if_den: 1,
        }
    }

    #[test]
    fn rejects_zero_resamp_num() {
        let cfg = identity_cfg(0, 1);
        assert!(matches!(
            Fdudc::new(cfg),
            Err(FdudcError::InvalidRatio { .. })
        ));
    }

    #[test]
    fn rejects_out_of_range_cutoff() {
        let mut cfg = identity_cfg(1, 1);
        cfg.cutoff = 1.5;
        assert!(matches!(Fdudc::new(cfg), Err(FdudcError::InvalidCutoff(_))));
    }

    #[test]
    fn rejects_degenerate_branchlen() {
        let mut cfg = identity_cfg(1000, 1);
        cfg.approx_length = 1;
        assert!(matches!(
            Fdudc::new(cfg),
            Err(FdudcError::ZeroBranchLength { .. })
        ));
    }

    #[test]
    fn s3_identity_ratio_passes_dc_through() {
        let cfg = identity_cfg(1, 1);
        let mut fdudc = Fdudc::new(cfg).unwrap();
        let warmup = 2 * fdudc.branchlen();
        let mut buf = vec![Complex32::new(1.0, 0.0); warmup + 64];
        fdudc.process(&mut buf, |rx| rx);
        for sample in &buf[warmup..] {
            assert!((sample.re - 1.0).abs() < 1e-3, "{sample:?}");
            assert!(sample.im.abs() < 1e-3, "{sample:?}");
        }
    }

    #[test]
    fn s4_hook_invocation_count_matches_resample_ratio() {
        let cfg = identity_cfg(2, 25);
        let mut fdudc = Fdudc::new(cfg).unwrap();
        let mut calls = 0usize;
        let mut buf = vec![Complex32::new(0.0, 0.0); 2500];
        fdudc.process(&mut buf, |rx| {
            calls += 1;
            rx
        });
        assert_eq!(calls, 2500 * 2 / 25);
    }

    #[test]
    fn filter_delay_is_half_branchlen() {
        let cfg = identity_cfg(2, 25);
        let fdudc = Fdudc::new(cfg).unwrap();
        assert_eq!(fdudc.filter_delay(), fdudc.branchlen() / 2);
    }

    #[test]
    fn hook_returning_zero_still_advances_ddc() {
        let cfg = identity_cfg(1, 1);
        let mut fdudc = Fdudc::new(cfg).unwrap();
        let mut calls = 0usize;
        let mut buf = vec![Complex32::new(1.0, 0.0); 50];
        fdudc.process(&mut buf, |_rx| {
            calls += 1;
            Complex32::default()
        });
        assert_eq!(calls, 50);
    }
}
