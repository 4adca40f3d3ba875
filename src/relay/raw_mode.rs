//! Raw-mode lifecycle for the controlling terminal

use std::os::fd::BorrowedFd;

use nix::errno::Errno;
use nix::sys::termios::{self, SetArg, Termios};

use crate::error::{Error, Result};

/// Owns the controlling terminal's attributes for the length of a session.
///
/// The snapshot taken by [`RawMode::acquire`] is put back exactly once:
/// by [`RawMode::release`] on the normal path, or by `Drop` if the guard is
/// unwound past.
pub struct RawMode<'fd> {
    fd: BorrowedFd<'fd>,
    saved: Option<Termios>,
}

impl<'fd> RawMode<'fd> {
    /// Snapshot the terminal and switch it to raw mode.
    ///
    /// A descriptor whose attributes cannot be read (not a tty, revoked) is
    /// left alone and the session carries on in cooked mode. Failing to apply
    /// raw mode once the snapshot exists is an error.
    pub fn acquire(fd: BorrowedFd<'fd>) -> Result<Self> {
        let saved = match termios::tcgetattr(fd) {
            Ok(saved) => saved,
            Err(e) => {
                tracing::warn!("Unable to read terminal attributes: {}", e);
                return Ok(Self { fd, saved: None });
            },
        };

        let mut raw = saved.clone();
        termios::cfmakeraw(&mut raw);
        termios::tcsetattr(fd, SetArg::TCSANOW, &raw).map_err(Error::RawMode)?;

        Ok(Self {
            fd,
            saved: Some(saved),
        })
    }

    /// Whether a snapshot is held, i.e. the terminal was switched to raw mode
    pub fn is_raw(&self) -> bool {
        self.saved.is_some()
    }

    /// Put the snapshot back.
    pub fn release(mut self) -> Result<()> {
        match self.saved.take() {
            Some(saved) => restore(self.fd, &saved),
            None => Ok(()),
        }
    }
}

impl Drop for RawMode<'_> {
    fn drop(&mut self) {
        if let Some(saved) = self.saved.take() {
            if let Err(e) = restore(self.fd, &saved) {
                tracing::error!("{}", e);
            }
        }
    }
}

fn restore(fd: BorrowedFd<'_>, saved: &Termios) -> Result<()> {
    loop {
        match termios::tcsetattr(fd, SetArg::TCSANOW, saved) {
            Ok(()) => return Ok(()),
            Err(Errno::EINTR) => continue,
            Err(e) => return Err(Error::RestoreTerminal(e)),
        }
    }
}
