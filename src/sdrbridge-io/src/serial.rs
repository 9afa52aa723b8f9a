// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Virtual serial port (C7): a pseudoterminal standing in for the
//! physical UART the host-protocol parser expects, symlinked at a fixed
//! path. Ported line-for-line from `original_source/SerialLinux.cpp`,
//! which has no `trx-rs` analogue since CAT rig access there goes over a
//! real `tokio-serial` port.

use std::ffi::CStr;
use std::fs::File;
use std::os::unix::io::{AsRawFd, FromRawFd, RawFd};
use std::path::{Path, PathBuf};

use crate::error::SerialPortError;

pub const DEFAULT_SYMLINK: &str = "/tmp/MMDVM_PTS";

/// The allocated PTY master, exposed as a raw byte stream. Only the host
/// port (index 1 in the original firmware's enumeration) is implemented;
/// every other index is a no-op at the call site that owns port selection.
pub struct VirtualSerialPort {
    master: File,
    slave_path: PathBuf,
}

impl VirtualSerialPort {
    pub fn open(symlink_path: impl AsRef<Path>) -> Result<Self, SerialPortError> {
        let master_fd = unsafe { libc::posix_openpt(libc::O_RDWR | libc::O_NOCTTY) };
        if master_fd < 0 {
            return Err(SerialPortError::OpenMaster(std::io::Error::last_os_error()));
        }
        let master = unsafe { File::from_raw_fd(master_fd) };

        if unsafe { libc::grantpt(master_fd) } != 0 {
            return Err(SerialPortError::GrantPt(std::io::Error::last_os_error()));
        }
        if unsafe { libc::unlockpt(master_fd) } != 0 {
            return Err(SerialPortError::UnlockPt(std::io::Error::last_os_error()));
        }

        let slave_path = slave_name(master_fd)?;

        configure_raw_8n1(master_fd)?;

        let link = symlink_path.as_ref();
        let _ = std::fs::remove_file(link);
        std::os::unix::fs::symlink(&slave_path, link).map_err(|source| {
            SerialPortError::Symlink {
                link: link.to_path_buf(),
                target: slave_path.clone(),
                source,
            }
        })?;

        Ok(Self { master, slave_path })
    }

    pub fn slave_path(&self) -> &Path {
        &self.slave_path
    }

    fn fd(&self) -> RawFd {
        self.master.as_raw_fd()
    }

    /// Bytes currently buffered for reading, via `FIONREAD`.
    pub fn available_for_read(&self) -> usize {
        let mut count: libc::c_int = 0;
        let rc = unsafe { libc::ioctl(self.fd(), libc::FIONREAD, &mut count) };
        if rc < 0 {
            0
        } else {
            count.max(0) as usize
        }
    }

    /// Read at most one byte; returns `None` if nothing is buffered.
    pub fn read_byte(&mut self) -> Option<u8> {
        if self.available_for_read() == 0 {
            return None;
        }
        let mut byte = [0u8; 1];
        let n = unsafe { libc::read(self.fd(), byte.as_mut_ptr() as *mut libc::c_void, 1) };
        if n == 1 {
            Some(byte[0])
        } else {
            None
        }
    }

    /// Best-effort write; returns the number of bytes actually written.
    pub fn write(&mut self, data: &[u8]) -> usize {
        let n = unsafe { libc::write(self.fd(), data.as_ptr() as *const libc::c_void, data.len()) };
        n.max(0) as usize
    }
}

fn slave_name(master_fd: RawFd) -> Result<PathBuf, SerialPortError> {
    let ptr = unsafe { libc::ptsname(master_fd) };
    if ptr.is_null() {
        return Err(SerialPortError::PtsName(std::io::Error::last_os_error()));
    }
    let c_str = unsafe { CStr::from_ptr(ptr) };
    Ok(PathBuf::from(c_str.to_string_lossy().into_owned()))
}

fn configure_raw_8n1(fd: RawFd) -> Result<(), SerialPortError> {
    unsafe {
        let mut tio: libc::termios = std::mem::zeroed();
        if libc::tcgetattr(fd, &mut tio) != 0 {
            return Err(SerialPortError::Termios(std::io::Error::last_os_error()));
        }

        libc::cfmakeraw(&mut tio);
        libc::cfsetispeed(&mut tio, libc::B460800);
        libc::cfsetospeed(&mut tio, libc::B460800);

        tio.c_cflag &= !(libc::PARENB | libc::CSTOPB | libc::CSIZE);
        tio.c_cflag |= libc::CS8 | libc::CLOCAL | libc::CREAD;
        tio.c_cc[libc::VMIN] = 1;
        tio.c_cc[libc::VTIME] = 0;

        if libc::tcsetattr(fd, libc::TCSANOW, &tio) != 0 {
            return Err(SerialPortError::Termios(std::io::Error::last_os_error()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_allocates_pty_and_symlinks() {
        let link = std::env::temp_dir().join("sdrbridge-test-pts");
        let port = VirtualSerialPort::open(&link).expect("pty allocation");
        assert!(link.exists() || link.symlink_metadata().is_ok());
        assert!(port.slave_path().to_string_lossy().starts_with("/dev/"));
        let _ = std::fs::remove_file(&link);
    }

    #[test]
    fn read_byte_on_idle_port_is_none() {
        let link = std::env::temp_dir().join("sdrbridge-test-pts-idle");
        let mut port = VirtualSerialPort::open(&link).expect("pty allocation");
        assert_eq!(port.read_byte(), None);
        let _ = std::fs::remove_file(&link);
    }
}
