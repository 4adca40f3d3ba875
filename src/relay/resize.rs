//! SIGWINCH propagation from the controlling terminal to the target
//!
//! The handler only raises a [`ResizeFlag`]; the relay consumes the flag at
//! the top of each iteration and performs the ioctls there. SIGWINCH stays
//! blocked except while the relay sleeps in `ppoll`, so a resize that lands
//! between iterations is held pending and interrupts the next wait instead
//! of being lost.

use std::os::fd::BorrowedFd;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use nix::sys::signal::{pthread_sigmask, SigSet, SigmaskHow, Signal};
use signal_hook::consts::SIGWINCH;
use signal_hook::SigId;

use crate::error::{Error, Result};
use crate::pty::{get_window_size, set_window_size, WindowSize};

/// Pending-resize indicator shared between the signal handler and the relay.
#[derive(Debug, Clone, Default)]
pub struct ResizeFlag(Arc<AtomicBool>);

impl ResizeFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a resize as pending, as the signal handler would.
    #[cfg(test)]
    pub(crate) fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Clear the flag, returning whether it was set.
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::SeqCst)
    }
}

/// Keeps the target's window size in step with the controlling terminal for
/// one session.
pub struct ResizeWatcher<'fd> {
    source: BorrowedFd<'fd>,
    target: BorrowedFd<'fd>,
    flag: ResizeFlag,
    handler: SigId,
    previous_mask: SigSet,
}

impl<'fd> ResizeWatcher<'fd> {
    /// Block SIGWINCH, route it to a fresh flag, and push the current size
    /// of `source` to `target` once.
    pub fn install(source: BorrowedFd<'fd>, target: BorrowedFd<'fd>) -> Result<Self> {
        let mut winch = SigSet::empty();
        winch.add(Signal::SIGWINCH);

        let mut previous_mask = SigSet::empty();
        pthread_sigmask(SigmaskHow::SIG_BLOCK, Some(&winch), Some(&mut previous_mask))
            .map_err(Error::SignalMask)?;

        let flag = ResizeFlag::new();
        let handler = match signal_hook::flag::register(SIGWINCH, flag.0.clone()) {
            Ok(id) => id,
            Err(e) => {
                let _ = pthread_sigmask(SigmaskHow::SIG_SETMASK, Some(&previous_mask), None);
                return Err(Error::SignalHandler(e));
            },
        };

        let watcher = Self {
            source,
            target,
            flag,
            handler,
            previous_mask,
        };
        watcher.propagate();
        Ok(watcher)
    }

    #[cfg(test)]
    pub(crate) fn flag(&self) -> &ResizeFlag {
        &self.flag
    }

    /// Signal mask to wait under: the caller's own mask, with SIGWINCH let
    /// through.
    pub fn wait_mask(&self) -> SigSet {
        let mut mask = self.previous_mask;
        mask.remove(Signal::SIGWINCH);
        mask
    }

    /// Act on a pending resize, if any. Returns whether one was pending.
    pub fn service(&self) -> bool {
        if self.flag.take() {
            self.propagate();
            true
        } else {
            false
        }
    }

    /// Copy the source's size to the target, or the fallback size when the
    /// source has none. Failure is logged and otherwise ignored.
    pub fn propagate(&self) {
        let size = match get_window_size(self.source) {
            Ok(size) if size.is_usable() => size,
            Ok(_) => WindowSize::FALLBACK,
            Err(e) => {
                tracing::debug!("Unable to read terminal size ({}), using fallback", e);
                WindowSize::FALLBACK
            },
        };

        match set_window_size(self.target, size) {
            Ok(()) => tracing::debug!("Resized target to {}x{}", size.cols, size.rows),
            Err(e) => tracing::warn!("Cannot set terminal size: {}", e),
        }
    }
}

impl Drop for ResizeWatcher<'_> {
    fn drop(&mut self) {
        signal_hook::low_level::unregister(self.handler);
        if let Err(e) = pthread_sigmask(SigmaskHow::SIG_SETMASK, Some(&self.previous_mask), None) {
            tracing::warn!("Unable to restore signal mask: {}", e);
        }
    }
}
