//! Error types for reptyr

use std::io;

use nix::errno::Errno;
use thiserror::Error;

use crate::attach::{PidError, TargetPid};

/// Everything that can stop reptyr before or around a relay session.
///
/// How the relay itself ends is not an error; see [`crate::relay::RelayEnd`].
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed command line
    #[error("{0}")]
    Usage(String),

    /// PID argument that is not a positive decimal integer
    #[error("Invalid pid {input:?}: {reason}")]
    InvalidPid {
        input: String,
        #[source]
        reason: PidError,
    },

    #[error("Unable to allocate a new pseudo-terminal: {0}")]
    OpenMaster(#[source] nix::Error),

    #[error("Unable to unlockpt: {0}")]
    UnlockPty(#[source] nix::Error),

    #[error("Unable to grantpt: {0}")]
    GrantPty(#[source] nix::Error),

    #[error("Unable to get pty slave name: {0}")]
    PtsName(#[source] nix::Error),

    #[error("Unable to mark pty master close-on-exec: {0}")]
    CloseOnExec(#[source] nix::Error),

    /// The backend refused to move the target onto the new pty
    #[error("Unable to attach to pid {pid}: {}", .source.desc())]
    Attach {
        pid: TargetPid,
        #[source]
        source: Errno,
    },

    /// The backend refused to hand over the target's terminal session
    #[error("Unable to steal the terminal session of pid {pid}: {}", .source.desc())]
    Steal {
        pid: TargetPid,
        #[source]
        source: Errno,
    },

    #[error("Unable to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Unable to set terminal attributes: {0}")]
    RawMode(#[source] nix::Error),

    #[error("Unable to restore terminal attributes: {0}")]
    RestoreTerminal(#[source] nix::Error),

    #[error("Unable to block SIGWINCH: {0}")]
    SignalMask(#[source] nix::Error),

    #[error("Unable to install SIGWINCH handler: {0}")]
    SignalHandler(#[source] io::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// Process exit status for this error.
    pub fn exit_code(&self) -> u8 {
        1
    }

    /// Whether the kernel refused the takeover on permission grounds, in
    /// which case the backend's diagnostic is worth showing.
    pub fn is_permission_denied(&self) -> bool {
        matches!(
            self,
            Error::Attach { source: Errno::EPERM, .. } | Error::Steal { source: Errno::EPERM, .. }
        )
    }
}

/// Result type for reptyr operations
pub type Result<T> = std::result::Result<T, Error>;
