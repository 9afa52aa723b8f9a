// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Error taxonomy for the I/O side of the bridge.

use std::path::PathBuf;

/// Top-level error type for everything outside the allocation-free sample
/// path. Constructing these is always off the hot path: configuration
/// errors at startup, transport errors at block boundaries.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("unknown driver {0:?}, expected one of file, limesdr, sxxcvr")]
    UnknownDriver(String),

    #[error("invalid resample ratio {resamp_num}/{resamp_den}")]
    InvalidResampleRatio { resamp_num: u32, resamp_den: u32 },

    #[error("filter configuration rejected: {0}")]
    FilterConfig(#[from] sdrbridge_core::FdudcError),

    #[error("failed to open SDR device: {0}")]
    SdrOpen(String),

    #[error("failed to set up SDR stream: {0}")]
    SdrStream(String),

    #[error("SDR read failed: {0}")]
    SdrRead(String),

    #[error("SDR write failed: {0}")]
    SdrWrite(String),

    #[error("failed to open file-sim output {path:?}: {source}")]
    FileSimOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("virtual serial port setup failed: {0}")]
    SerialPort(#[from] SerialPortError),
}

/// Errors specific to the virtual-serial-port component (C7). These are
/// logged and tolerated: the host port becomes unavailable, but the modem
/// keeps running (see `spec`'s error-handling design for C7).
#[derive(Debug, thiserror::Error)]
pub enum SerialPortError {
    #[error("failed to open /dev/ptmx: {0}")]
    OpenMaster(std::io::Error),

    #[error("grantpt failed: {0}")]
    GrantPt(std::io::Error),

    #[error("unlockpt failed: {0}")]
    UnlockPt(std::io::Error),

    #[error("ptsname failed: {0}")]
    PtsName(std::io::Error),

    #[error("failed to configure termios: {0}")]
    Termios(std::io::Error),

    #[error("failed to symlink {link:?} -> {target:?}: {source}")]
    Symlink {
        link: PathBuf,
        target: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
