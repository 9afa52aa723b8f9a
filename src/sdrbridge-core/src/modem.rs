// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Per-sample FM modulation and phase-discriminator demodulation.
//!
//! This is the hook body invoked once per baseband tick from
//! [`crate::Fdudc::process`]. It owns the TX phase accumulator, the RX
//! single-sample differentiator state, and the control-flag delay line
//! that keeps a transmitted slot marker aligned with the received sample
//! it round-trips to.

use std::f64::consts::PI;

use num_complex::Complex32;

use crate::delay::DelayBuffer;
use crate::ring::RingBuffer;
use crate::sample::{AnnotatedSample, DC_OFFSET};

/// Tuned so DMR deviation hits the correct value at 50% TX amplitude.
const FM_DEVIATION: i64 = 550_000;
const TX_AMPLITUDE: f32 = 0.7;
const TWO_POW_31: f64 = 2_147_483_648.0;

/// Everything one baseband tick produces, including the pre-delay TX
/// annotated sample the observation side-channel needs alongside the
/// post-delay one stamped onto `rx_sample`.
#[derive(Debug, Clone, Copy)]
pub struct ModemTick {
    pub tx_iq: Complex32,
    pub rx_sample: AnnotatedSample,
    pub tx_annotated: AnnotatedSample,
}

/// FM modulator/demodulator pair (C4).
pub struct FmModem {
    phase: i32,
    prev_rx_iq: Complex32,
    delay: DelayBuffer<AnnotatedSample>,
}

impl FmModem {
    /// `latency_fm_samples` is the control-flag delay line length (see
    /// `BlockState::latency_ns` in the I/O driver).
    pub fn new(latency_fm_samples: usize) -> Self {
        Self {
            phase: 0,
            prev_rx_iq: Complex32::default(),
            delay: DelayBuffer::new(latency_fm_samples, AnnotatedSample::fill()),
        }
    }

    /// One baseband tick: modulate the next TX annotated sample (or emit
    /// silence plus a fill marker if the TX ring is empty), demodulate
    /// `rx_iq`, and stamp the demodulated sample with the delayed TX
    /// control bits. The caller is responsible for enqueueing
    /// `tick.rx_sample` onto the RX ring.
    pub fn step(&mut self, rx_iq: Complex32, tx_ring: &mut RingBuffer<AnnotatedSample>) -> ModemTick {
        let mut dequeued = AnnotatedSample::default();
        let have_tx = tx_ring.get(&mut dequeued);

        let tx_iq = if have_tx {
            let delta = (dequeued.sample as i32 - DC_OFFSET as i32) as i64 * FM_DEVIATION;
            self.phase = self.phase.wrapping_add(delta as i32);
            let ph = self.phase as f64 * PI / TWO_POW_31;
            Complex32::from_polar(TX_AMPLITUDE, ph as f32)
        } else {
            Complex32::default()
        };

        let tx_annotated = if have_tx {
            dequeued
        } else {
            AnnotatedSample::fill()
        };
        let delayed = self.delay.process(tx_annotated);

        let diff = rx_iq * self.prev_rx_iq.conj();
        self.prev_rx_iq = rx_iq;
        let d = fast_atan2(diff.im.into(), diff.re.into()) as f32;
        let mapped = d * (DC_OFFSET as f32 / std::f32::consts::PI) + DC_OFFSET as f32;
        let rx_value = mapped.round().clamp(0.0, u16::MAX as f32) as u16;

        let rx_sample = AnnotatedSample::new(rx_value, delayed.control);

        ModemTick {
            tx_iq,
            rx_sample,
            tx_annotated,
        }
    }
}

fn fast_atan(x: f64) -> f64 {
    const N1: f64 = 0.97239411;
    const N2: f64 = -0.19194795;
    (N1 + N2 * x * x) * x
}

/// Branchless rational-approximation `atan2`, matching the accuracy/speed
/// tradeoff of the batch discriminator this modem's RX half is modelled
/// on.
fn fast_atan2(y: f64, x: f64) -> f64 {
    if x != 0.0 {
        if x.abs() > y.abs() {
            let z = y / x;
            if x > 0.0 {
                fast_atan(z)
            } else if y >= 0.0 {
                fast_atan(z) + PI
            } else {
                fast_atan(z) - PI
            }
        } else {
            let z = x / y;
            if y > 0.0 {
                -fast_atan(z) + PI / 2.0
            } else {
                -fast_atan(z) - PI / 2.0
            }
        }
    } else if y > 0.0 {
        PI / 2.0
    } else if y < 0.0 {
        -PI / 2.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::{MARK_NONE, MARK_SLOT1, MARK_SLOT2};

    #[test]
    fn s5_empty_tx_ring_yields_zero_iq_and_fill_control() {
        let mut modem = FmModem::new(0);
        let mut tx_ring: RingBuffer<AnnotatedSample> = RingBuffer::new(4);
        for _ in 0..16 {
            let tick = modem.step(Complex32::new(1.0, 0.0), &mut tx_ring);
            assert_eq!(tick.tx_iq, Complex32::default());
            assert_eq!(tick.rx_sample.control, MARK_NONE);
        }
    }

    #[test]
    fn s6_control_alignment_latency_five() {
        let latency = 5usize;
        let mut modem = FmModem::new(latency);
        let mut tx_ring: RingBuffer<AnnotatedSample> = RingBuffer::new(32);
        let controls: Vec<u8> = (0..16)
            .map(|n| if n % 2 == 0 { MARK_SLOT1 } else { MARK_SLOT2 })
            .collect();
        for &c in &controls {
            tx_ring.put(AnnotatedSample::new(DC_OFFSET, c));
        }

        let mut rx_controls = Vec::new();
        for _ in 0..controls.len() {
            let tick = modem.step(Complex32::new(1.0, 0.0), &mut tx_ring);
            rx_controls.push(tick.rx_sample.control);
        }

        assert_eq!(rx_controls[latency], controls[0]);
        assert_eq!(rx_controls[latency + 1], controls[1]);
    }

    #[test]
    fn rx_discriminator_is_zero_for_constant_input() {
        let mut modem = FmModem::new(0);
        let mut tx_ring: RingBuffer<AnnotatedSample> = RingBuffer::new(1);
        modem.step(Complex32::new(1.0, 0.0), &mut tx_ring);
        let tick = modem.step(Complex32::new(1.0, 0.0), &mut tx_ring);
        assert_eq!(tick.rx_sample.sample, DC_OFFSET);
    }
}
