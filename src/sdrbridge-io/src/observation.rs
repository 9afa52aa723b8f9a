// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Observation side-channel (C6): one packed `MonitorFmMsg` per baseband
//! sample, published over a local pub/sub socket with topic `"FM"`.
//!
//! Wire layout and socket/topic choice are taken directly from
//! `original_source/Tools/monitor.cpp`'s `monitorFmMsg` struct and its
//! `ipc:///tmp/MMDVM_Monitor` subscriber.

pub const DEFAULT_ENDPOINT: &str = "ipc:///tmp/MMDVM_Monitor";
const TOPIC: &[u8] = b"FM";

/// One observation record: the demodulated RX sample and its delayed
/// control bits, the RSSI placeholder, the TX sample and its
/// pre-delay control bits, and a snapshot of the TX ring's fill level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonitorFmMsg {
    pub rx_sample: u16,
    pub rx_control: u8,
    pub rx_rssi: u16,
    pub tx_sample: u16,
    pub tx_control: u8,
    pub tx_buf_data: u16,
}

/// Wire size in bytes: `id[2] + rxSample + rxControl + rxRssi + txSample + txControl + txBufData`.
pub const WIRE_LEN: usize = 12;

impl MonitorFmMsg {
    pub fn to_bytes(self) -> [u8; WIRE_LEN] {
        let mut out = [0u8; WIRE_LEN];
        out[0] = b'F';
        out[1] = b'M';
        out[2..4].copy_from_slice(&self.rx_sample.to_le_bytes());
        out[4] = self.rx_control;
        out[5..7].copy_from_slice(&self.rx_rssi.to_le_bytes());
        out[7..9].copy_from_slice(&self.tx_sample.to_le_bytes());
        out[9] = self.tx_control;
        out[10..12].copy_from_slice(&self.tx_buf_data.to_le_bytes());
        out
    }
}

#[cfg(feature = "monitor")]
mod publisher {
    use super::{MonitorFmMsg, DEFAULT_ENDPOINT, TOPIC};
    use tracing::warn;

    /// Non-blocking, fire-and-forget PUB socket. Every block's worth of
    /// records is sent as one multipart message; a full send queue or a
    /// disconnected subscriber drops the message silently, as the
    /// visualiser is purely advisory.
    pub struct ObservationPublisher {
        socket: zmq::Socket,
        scratch: Vec<u8>,
    }

    impl ObservationPublisher {
        pub fn bind(endpoint: &str) -> Result<Self, zmq::Error> {
            let ctx = zmq::Context::new();
            let socket = ctx.socket(zmq::PUB)?;
            socket.bind(endpoint)?;
            Ok(Self {
                socket,
                scratch: Vec::new(),
            })
        }

        pub fn bind_default() -> Result<Self, zmq::Error> {
            Self::bind(DEFAULT_ENDPOINT)
        }

        /// Publish one block's worth of per-sample records as a single
        /// topic-prefixed message.
        pub fn publish_block(&mut self, records: &[MonitorFmMsg]) {
            self.scratch.clear();
            self.scratch.reserve(records.len() * super::WIRE_LEN);
            for record in records {
                self.scratch.extend_from_slice(&record.to_bytes());
            }
            if let Err(err) = self
                .socket
                .send_multipart([TOPIC, self.scratch.as_slice()], zmq::DONTWAIT)
            {
                warn!(%err, "observation publish dropped");
            }
        }
    }
}

#[cfg(feature = "monitor")]
pub use publisher::ObservationPublisher;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_layout_matches_spec_order() {
        let msg = MonitorFmMsg {
            rx_sample: 0x1234,
            rx_control: 0x08,
            rx_rssi: 0,
            tx_sample: 0x5678,
            tx_control: 0x04,
            tx_buf_data: 240,
        };
        let bytes = msg.to_bytes();
        assert_eq!(&bytes[0..2], b"FM");
        assert_eq!(u16::from_le_bytes([bytes[2], bytes[3]]), 0x1234);
        assert_eq!(bytes[4], 0x08);
        assert_eq!(u16::from_le_bytes([bytes[5], bytes[6]]), 0);
        assert_eq!(u16::from_le_bytes([bytes[7], bytes[8]]), 0x5678);
        assert_eq!(bytes[9], 0x04);
        assert_eq!(u16::from_le_bytes([bytes[10], bytes[11]]), 240);
    }
}
