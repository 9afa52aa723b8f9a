// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Signal / lifecycle (C8): one running-flag, set false by any of
//! `SIGHUP`, `SIGINT`, `SIGQUIT`, `SIGTERM`, `SIGPIPE`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Process-wide running flag. The main loop polls it at iteration
/// boundaries and drives shutdown when it goes false.
#[derive(Clone)]
pub struct RunningFlag(Arc<AtomicBool>);

impl RunningFlag {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn is_running(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub fn stop(&self) {
        self.0.store(false, Ordering::Relaxed)
    }
}

impl Default for RunningFlag {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(unix)]
static SIGNALLED: AtomicBool = AtomicBool::new(false);

#[cfg(unix)]
extern "C" fn handle_termination(_sig: libc::c_int) {
    SIGNALLED.store(true, Ordering::Relaxed);
}

/// Install the termination-signal handler and return a flag that a
/// handler-driven poll thread keeps in sync with it.
///
/// Signal handlers may only call async-signal-safe functions, so the
/// handler itself just flips a static `AtomicBool`; `install` spawns one
/// lightweight watcher thread that mirrors that flag onto the returned
/// `RunningFlag`; this keeps the main loop's polling side a plain atomic
/// load with no signal-safety constraints of its own.
#[cfg(unix)]
pub fn install() -> RunningFlag {
    let flag = RunningFlag::new();

    unsafe {
        let mut action: libc::sigaction = std::mem::zeroed();
        action.sa_sigaction = handle_termination as usize;
        libc::sigemptyset(&mut action.sa_mask);
        action.sa_flags = 0;
        for signum in [
            libc::SIGHUP,
            libc::SIGINT,
            libc::SIGQUIT,
            libc::SIGTERM,
            libc::SIGPIPE,
        ] {
            libc::sigaction(signum, &action, std::ptr::null_mut());
        }
    }

    let watcher = flag.clone();
    std::thread::spawn(move || loop {
        if SIGNALLED.load(Ordering::Relaxed) {
            watcher.stop();
            break;
        }
        std::thread::sleep(std::time::Duration::from_millis(50));
    });

    flag
}

#[cfg(not(unix))]
pub fn install() -> RunningFlag {
    RunningFlag::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn running_flag_starts_true_and_stops() {
        let flag = RunningFlag::new();
        assert!(flag.is_running());
        flag.stop();
        assert!(!flag.is_running());
    }

    #[test]
    fn clones_share_state() {
        let flag = RunningFlag::new();
        let clone = flag.clone();
        clone.stop();
        assert!(!flag.is_running());
    }
}
