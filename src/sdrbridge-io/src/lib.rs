// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! I/O side of the SDR bridge: transports, the top-level block loop, the
//! observation side-channel, the virtual serial port, and signal
//! lifecycle. Everything here is allowed to allocate at setup and log
//! through `tracing`; only [`driver::IoDriver::process`]'s inner pipeline
//! call is on the allocation-free hot path (and that call lives in
//! `sdrbridge-core`).

pub mod driver;
pub mod error;
pub mod lifecycle;
pub mod observation;
pub mod serial;
pub mod transport;

pub use driver::{DriverConfig, IoDriver};
pub use error::{BridgeError, SerialPortError};
pub use lifecycle::RunningFlag;
pub use observation::MonitorFmMsg;
pub use serial::VirtualSerialPort;
pub use transport::{DriverProfile, IqTransport, ReadTiming};
