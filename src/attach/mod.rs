//! Attach orchestration
//!
//! Sequences pty allocation, the backend call for the chosen mode, the
//! optional child spawn, and the relay session.

mod backend;
mod spawn;
mod target;

use std::ffi::OsString;
use std::io::Write;
use std::os::fd::{AsFd, BorrowedFd};
use std::path::PathBuf;

pub use backend::{
    permission_hint, read_ptrace_scope, AttachBackend, SystemBackend, PTRACE_SCOPE_PATH,
};
pub use spawn::{spawn_detached, PTY_ENV_VAR};
pub use target::{PidError, TargetPid};

use crate::app::SessionConfig;
use crate::error::{Error, Result};
use crate::relay::{self, RelayEnd};

/// What the invocation asks for. Fixed once parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionMode {
    /// Move `pid` onto a new pty and relay to it
    AttachExisting { pid: TargetPid, force_stdio: bool },
    /// Take over the terminal session `pid` already runs in
    StealSession { pid: TargetPid },
    /// Just open a pty, optionally running `command` against it
    CreateDetached {
        redirect: bool,
        command: Vec<OsString>,
    },
}

/// How a successful run finished
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    /// A relay session ran and ended
    Relayed(RelayEnd),
    /// A pty was opened and reported; nothing was spawned
    PtyOpened(PathBuf),
    /// A pty was opened and `child` was started on it
    Spawned { slave: PathBuf, child: u32 },
}

pub struct Orchestrator<'fd, B> {
    backend: B,
    config: SessionConfig<'fd>,
}

impl<'fd, B: AttachBackend> Orchestrator<'fd, B> {
    pub fn new(backend: B, config: SessionConfig<'fd>) -> Self {
        Self { backend, config }
    }

    /// The backend this orchestrator drives, e.g. to inspect a recording
    /// backend after a run
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Drive `mode` to completion. User-facing output (the opened pty's
    /// path) goes to `out`.
    pub fn execute<W: Write>(&self, mode: SessionMode, out: &mut W) -> Result<Completion> {
        match mode {
            SessionMode::AttachExisting { pid, force_stdio } => {
                let pty = self.backend.allocate_pty()?;
                tracing::debug!("Attaching pid {} to {}", pid, pty.slave_path().display());

                self.backend
                    .attach_to_process(pid, pty.slave_path(), force_stdio)
                    .map_err(|source| Error::Attach { pid, source })?;

                let master = pty.into_master();
                self.relay(master.as_fd())
            },
            SessionMode::StealSession { pid } => {
                tracing::debug!("Stealing the terminal session of pid {}", pid);

                let terminal = self
                    .backend
                    .steal_session(pid)
                    .map_err(|source| Error::Steal { pid, source })?;

                self.relay(terminal.as_fd())
            },
            SessionMode::CreateDetached { redirect, command } => {
                let pty = self.backend.allocate_pty()?;
                let slave = pty.slave_path().to_path_buf();

                writeln!(out, "Opened a new pty: {}", slave.display())?;
                out.flush()?;

                if command.is_empty() {
                    return Ok(Completion::PtyOpened(slave));
                }

                let child = spawn_detached(&pty, &command, redirect)?;
                Ok(Completion::Spawned { slave, child })
            },
        }
    }

    /// Log a failed run, adding the backend's diagnostic when the kernel
    /// refused on permission grounds.
    pub fn report_failure(&self, err: &Error) {
        tracing::error!("{}", err);
        if err.is_permission_denied() {
            self.backend.explain_permission_denied();
        }
    }

    fn relay(&self, target: BorrowedFd<'_>) -> Result<Completion> {
        let ended = relay::run_session(&self.config, target)?;
        Ok(Completion::Relayed(ended))
    }
}
