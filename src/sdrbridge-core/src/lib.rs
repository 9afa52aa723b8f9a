// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Pure data model and DSP for the SDR bridge: ring buffers, a delay line,
//! the fractional digital up/down-converter and the FM modem. Nothing in
//! this crate performs I/O or logging; it is the part of the bridge that
//! runs on the real-time sample path.

pub mod delay;
pub mod dudc;
pub mod modem;
pub mod ring;
pub mod sample;

pub use delay::DelayBuffer;
pub use dudc::{Fdudc, FdudcConfig, FdudcError};
pub use modem::{FmModem, ModemTick};
pub use ring::{RingBuffer, RX_RINGBUFFER_SIZE, TX_RINGBUFFER_SIZE};
pub use sample::{AnnotatedSample, DC_OFFSET, MARK_NONE, MARK_SLOT1, MARK_SLOT2};
