// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! File-simulation transport: RX is always silence, TX is appended as
//! packed little-endian interleaved `float32` I/Q to a raw capture file.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use num_complex::Complex32;

use crate::error::BridgeError;
use crate::transport::{IqTransport, ReadTiming};

pub const DEFAULT_OUTPUT_PATH: &str = "mmdvm_tx_iq_output.raw";

/// Grounded on `trx-backend-soapysdr`'s `MockIqSource` on the RX side
/// (fills zeros, never blocks); the TX side has no teacher analogue and is
/// built from the file-sim contract in the driver design.
pub struct FileTransport {
    out: BufWriter<File>,
}

impl FileTransport {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, BridgeError> {
        let path: PathBuf = path.as_ref().to_path_buf();
        let file = File::create(&path).map_err(|source| BridgeError::FileSimOutput {
            path: path.clone(),
            source,
        })?;
        Ok(Self {
            out: BufWriter::new(file),
        })
    }
}

impl IqTransport for FileTransport {
    fn activate(&mut self) -> Result<(), BridgeError> {
        Ok(())
    }

    fn deactivate(&mut self) -> Result<(), BridgeError> {
        Ok(())
    }

    fn read_block(&mut self, buf: &mut [Complex32]) -> Result<ReadTiming, BridgeError> {
        buf.fill(Complex32::default());
        Ok(ReadTiming { time_ns: None })
    }

    fn write_block(&mut self, buf: &[Complex32], _time_ns: Option<u64>) -> Result<(), BridgeError> {
        for sample in buf {
            self.out
                .write_all(&sample.re.to_le_bytes())
                .and_then(|_| self.out.write_all(&sample.im.to_le_bytes()))
                .map_err(|source| BridgeError::FileSimOutput {
                    path: PathBuf::from(DEFAULT_OUTPUT_PATH),
                    source,
                })?;
        }
        Ok(())
    }

    fn is_timestamped(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_block_fills_silence() {
        let dir = std::env::temp_dir().join("sdrbridge-file-transport-test-silence");
        let mut transport = FileTransport::open(&dir).unwrap();
        let mut buf = vec![Complex32::new(5.0, 5.0); 8];
        transport.read_block(&mut buf).unwrap();
        assert!(buf.iter().all(|s| *s == Complex32::default()));
        let _ = std::fs::remove_file(&dir);
    }

    #[test]
    fn write_block_appends_interleaved_f32() {
        let dir = std::env::temp_dir().join("sdrbridge-file-transport-test-write");
        {
            let mut transport = FileTransport::open(&dir).unwrap();
            let buf = vec![Complex32::new(1.0, -1.0), Complex32::new(0.5, 0.25)];
            transport.write_block(&buf, None).unwrap();
        }
        let bytes = std::fs::read(&dir).unwrap();
        assert_eq!(bytes.len(), 2 * 2 * 4);
        let first_i = f32::from_le_bytes(bytes[0..4].try_into().unwrap());
        assert_eq!(first_i, 1.0);
        let _ = std::fs::remove_file(&dir);
    }
}
