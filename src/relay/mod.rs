//! Byte relay between the controlling terminal and the target pty
//!
//! One thread, one blocking wait. Each wake copies at most one chunk in each
//! direction and flushes it completely before waiting again.

mod io;
mod raw_mode;
mod resize;

use std::os::fd::BorrowedFd;

use nix::errno::Errno;
use nix::poll::{ppoll, PollFd, PollFlags};

pub use io::{read_chunk, write_all, write_all_with};
pub use raw_mode::RawMode;
pub use resize::{ResizeFlag, ResizeWatcher};

use crate::app::SessionConfig;
use crate::error::Result;

/// Largest single read on either side
pub const CHUNK_SIZE: usize = 4096;

/// Why a relay session stopped. None of these change the exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayEnd {
    /// Local input hit EOF or failed
    LocalClosed,
    /// The target pty hit EOF or failed (the target hung up)
    TargetClosed,
    /// The wait itself failed with something other than EINTR
    WaitFailed(Errno),
    /// SIGWINCH could not be routed to the relay, so it never started
    ResizeUnavailable,
}

/// The three descriptors a relay moves bytes between
#[derive(Debug, Clone, Copy)]
pub struct Relay<'fd> {
    input: BorrowedFd<'fd>,
    output: BorrowedFd<'fd>,
    target: BorrowedFd<'fd>,
}

impl<'fd> Relay<'fd> {
    pub fn new(input: BorrowedFd<'fd>, output: BorrowedFd<'fd>, target: BorrowedFd<'fd>) -> Self {
        Self {
            input,
            output,
            target,
        }
    }

    /// Copy bytes both ways until one side closes or the wait fails.
    pub fn run(&self, resize: &ResizeWatcher<'_>) -> RelayEnd {
        let mut buf = [0u8; CHUNK_SIZE];

        loop {
            resize.service();

            let mut fds = [
                PollFd::new(self.input, PollFlags::POLLIN),
                PollFd::new(self.target, PollFlags::POLLIN),
            ];

            match ppoll(&mut fds, None, Some(resize.wait_mask())) {
                Ok(_) => {},
                Err(Errno::EINTR) => continue,
                Err(e) => {
                    tracing::warn!("Wait failed: {}", e);
                    return RelayEnd::WaitFailed(e);
                },
            }

            let input_ready = is_ready(&fds[0]);
            let target_ready = is_ready(&fds[1]);

            if input_ready && !pump(self.input, self.target, &mut buf) {
                return RelayEnd::LocalClosed;
            }
            if target_ready && !pump(self.target, self.output, &mut buf) {
                return RelayEnd::TargetClosed;
            }
        }
    }
}

/// Hangups and errors count as readable so the read that follows sees them.
fn is_ready(fd: &PollFd<'_>) -> bool {
    fd.revents().is_some_and(|revents| {
        revents.intersects(
            PollFlags::POLLIN | PollFlags::POLLHUP | PollFlags::POLLERR | PollFlags::POLLNVAL,
        )
    })
}

/// Move one chunk from `from` to `to`. Returns false when `from` is done:
/// EOF and read errors are treated alike.
fn pump(from: BorrowedFd<'_>, to: BorrowedFd<'_>, buf: &mut [u8]) -> bool {
    let count = match read_chunk(from, buf) {
        Ok(0) => return false,
        Ok(count) => count,
        Err(e) => {
            tracing::debug!("Read failed: {}", e);
            return false;
        },
    };

    if let Err(e) = write_all(to, &buf[..count]) {
        tracing::warn!("Dropped {} bytes: {}", count, e);
    }
    true
}

/// Run a whole relay session against `target`: raw mode on, resize
/// propagation installed, relay to completion, then the terminal restored no
/// matter how the relay ended.
pub fn run_session(config: &SessionConfig<'_>, target: BorrowedFd<'_>) -> Result<RelayEnd> {
    let raw_mode = RawMode::acquire(config.terminal())?;

    tracing::debug!("Terminal in raw mode: {}", raw_mode.is_raw());

    let relay = Relay::new(config.input(), config.output(), target);
    let ended = relay_with(ResizeWatcher::install(config.terminal(), target), &relay);

    raw_mode.release()?;

    tracing::debug!("Relay ended: {:?}", ended);
    Ok(ended)
}

/// Run `relay` under an installed watcher. Failing to install one ends the
/// session like any other relay-level failure.
fn relay_with(resize: Result<ResizeWatcher<'_>>, relay: &Relay<'_>) -> RelayEnd {
    match resize {
        Ok(resize) => relay.run(&resize),
        Err(e) => {
            tracing::error!("{}", e);
            RelayEnd::ResizeUnavailable
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::io;
    use std::os::fd::AsFd;
    use std::os::unix::net::UnixStream;

    #[test]
    fn test_signal_setup_failure_ends_relay_quietly() {
        let (input, _input_peer) = UnixStream::pair().unwrap();
        let (output, _output_peer) = UnixStream::pair().unwrap();
        let (target, _target_peer) = UnixStream::pair().unwrap();
        let relay = Relay::new(input.as_fd(), output.as_fd(), target.as_fd());

        let refused = Err(Error::SignalHandler(io::Error::other("refused")));
        assert_eq!(relay_with(refused, &relay), RelayEnd::ResizeUnavailable);
    }

    #[test]
    fn test_installed_watcher_runs_relay() {
        let (input, input_peer) = UnixStream::pair().unwrap();
        let (output, _output_peer) = UnixStream::pair().unwrap();
        let (target, _target_peer) = UnixStream::pair().unwrap();
        let relay = Relay::new(input.as_fd(), output.as_fd(), target.as_fd());

        drop(input_peer);
        let resize = ResizeWatcher::install(input.as_fd(), target.as_fd());
        assert_eq!(relay_with(resize, &relay), RelayEnd::LocalClosed);
    }
}
