// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! SDR transport abstraction and the per-driver constant table.

pub mod file;
#[cfg(feature = "soapysdr-sys")]
pub mod soapysdr;

use num_complex::Complex32;

use crate::error::BridgeError;

/// Result of a single transport read: either an untimed block, or a block
/// tagged with the hardware RX timestamp in nanoseconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadTiming {
    pub time_ns: Option<u64>,
}

/// A bidirectional block-oriented I/Q transport. Implementations are
/// either the file-sim loopback (`transport::file`) or SoapySDR, timestamped
/// or not (`transport::soapysdr`).
///
/// Reads and writes are block-synchronous: every call either fills/drains
/// exactly `buf.len()` samples or returns an error. A non-positive return
/// from the underlying device in the real-SDR case is surfaced as
/// [`BridgeError::SdrRead`]/[`BridgeError::SdrWrite`] so the driver can
/// enter its recovery path.
pub trait IqTransport {
    /// Bring RX/TX streams up. Idempotent once active.
    fn activate(&mut self) -> Result<(), BridgeError>;

    /// Tear RX/TX streams down. Called on recovery and at `exitInt`.
    fn deactivate(&mut self) -> Result<(), BridgeError>;

    /// Block until `buf` is fully populated with one RX block.
    fn read_block(&mut self, buf: &mut [Complex32]) -> Result<ReadTiming, BridgeError>;

    /// Write one TX block. `time_ns`, if the transport is timestamped,
    /// should be `rx_time_ns + latency_ns` from the matching read.
    fn write_block(&mut self, buf: &[Complex32], time_ns: Option<u64>) -> Result<(), BridgeError>;

    /// Whether reads carry a hardware timestamp.
    fn is_timestamped(&self) -> bool;
}

/// Per-driver constants fixed at `initInt` (see the driver table).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverProfile {
    pub resamp_num: u32,
    pub resamp_den: u32,
    pub block_size: usize,
    pub timestamped: bool,
}

impl DriverProfile {
    pub fn lookup(driver: &str) -> Result<Self, BridgeError> {
        match driver {
            "file" => Ok(Self {
                resamp_num: 1,
                resamp_den: 1,
                block_size: 96,
                timestamped: false,
            }),
            "limesdr" => Ok(Self {
                resamp_num: 2,
                resamp_den: 25,
                block_size: 1024,
                timestamped: true,
            }),
            "sxxcvr" => Ok(Self {
                resamp_num: 4,
                resamp_den: 25,
                block_size: 512,
                timestamped: false,
            }),
            other => Err(BridgeError::UnknownDriver(other.to_string())),
        }
    }

    /// SDR sample rate in Hz for a 24 kHz annotated-sample baseband.
    pub fn sdr_sample_rate(&self) -> f64 {
        24_000.0 * self.resamp_den as f64 / self.resamp_num as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn driver_table_matches_spec() {
        let file = DriverProfile::lookup("file").unwrap();
        assert_eq!((file.resamp_num, file.resamp_den, file.block_size), (1, 1, 96));
        assert!(!file.timestamped);

        let lime = DriverProfile::lookup("limesdr").unwrap();
        assert_eq!((lime.resamp_num, lime.resamp_den, lime.block_size), (2, 25, 1024));
        assert!(lime.timestamped);

        let sxx = DriverProfile::lookup("sxxcvr").unwrap();
        assert_eq!((sxx.resamp_num, sxx.resamp_den, sxx.block_size), (4, 25, 512));
        assert!(!sxx.timestamped);
    }

    #[test]
    fn unknown_driver_is_rejected() {
        assert!(matches!(
            DriverProfile::lookup("bogus"),
            Err(BridgeError::UnknownDriver(_))
        ));
    }

    #[test]
    fn sample_rate_matches_ratio() {
        let lime = DriverProfile::lookup("limesdr").unwrap();
        assert!((lime.sdr_sample_rate() - 300_000.0).abs() < 1e-6);
    }
}
