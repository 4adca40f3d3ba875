//! The process-takeover capability the orchestrator delegates to
//!
//! Moving a foreign process's descriptors onto a new terminal (or taking over
//! the terminal it already has) is done from outside this crate. The trait
//! below is the whole contract the orchestrator relies on.

use std::fs;
use std::io;
use std::os::fd::OwnedFd;
use std::path::Path;

use nix::errno::Errno;
use nix::sys::signal::kill;

use super::TargetPid;
use crate::error::Result;
use crate::pty::PtyPair;

/// Yama's ptrace policy knob
pub const PTRACE_SCOPE_PATH: &str = "/proc/sys/kernel/yama/ptrace_scope";

pub trait AttachBackend {
    /// Allocate the pty a target gets moved onto.
    fn allocate_pty(&self) -> Result<PtyPair> {
        PtyPair::allocate()
    }

    /// Rebind `pid`'s terminal descriptors to `slave`. With `force_stdio`,
    /// descriptors 0-2 are rebound even when they are not terminals.
    fn attach_to_process(
        &self,
        pid: TargetPid,
        slave: &Path,
        force_stdio: bool,
    ) -> std::result::Result<(), Errno>;

    /// Take over the whole terminal session `pid` runs in, returning a
    /// descriptor that now fronts that session.
    fn steal_session(&self, pid: TargetPid) -> std::result::Result<OwnedFd, Errno>;

    /// Explain to the operator why the kernel refused. Output only.
    fn explain_permission_denied(&self);
}

/// Backend for the running host.
///
/// It checks that the target exists and may be signalled by us, which is
/// where most permission failures surface, and reports `ENOSYS` for the
/// takeover itself: no injection engine is linked into this build.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemBackend;

impl SystemBackend {
    fn preflight(pid: TargetPid) -> std::result::Result<(), Errno> {
        kill(pid.as_pid(), None)
    }
}

impl AttachBackend for SystemBackend {
    fn attach_to_process(
        &self,
        pid: TargetPid,
        slave: &Path,
        force_stdio: bool,
    ) -> std::result::Result<(), Errno> {
        Self::preflight(pid)?;
        tracing::debug!(
            "Would attach pid {} to {} (force_stdio={})",
            pid,
            slave.display(),
            force_stdio
        );
        Err(Errno::ENOSYS)
    }

    fn steal_session(&self, pid: TargetPid) -> std::result::Result<OwnedFd, Errno> {
        Self::preflight(pid)?;
        Err(Errno::ENOSYS)
    }

    fn explain_permission_denied(&self) {
        let scope = read_ptrace_scope(Path::new(PTRACE_SCOPE_PATH)).ok();
        tracing::error!("{}", permission_hint(scope));
    }
}

/// Read the Yama ptrace policy level from `path`
pub fn read_ptrace_scope(path: &Path) -> io::Result<u8> {
    let contents = fs::read_to_string(path)?;
    contents
        .trim()
        .parse()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Operator-facing explanation for a permission failure, given the Yama
/// policy level if one could be read.
pub fn permission_hint(scope: Option<u8>) -> String {
    match scope {
        None => "The kernel denied permission while attaching. \
                 Make sure you are running as the same user as the target (or as root)."
            .to_string(),
        Some(0) => format!(
            "The kernel denied permission while attaching, but {} is 0, so Yama is not \
             the cause. Make sure you are running as the same user as the target (or as root).",
            PTRACE_SCOPE_PATH
        ),
        Some(1) => format!(
            "The kernel denied permission while attaching. {} is 1, which only allows \
             tracing descendants. As root, write 0 to that file to allow attaching, \
             or run reptyr as root.",
            PTRACE_SCOPE_PATH
        ),
        Some(2) => format!(
            "The kernel denied permission while attaching. {} is 2, which restricts \
             tracing to processes with CAP_SYS_PTRACE. Run reptyr as root.",
            PTRACE_SCOPE_PATH
        ),
        Some(level) => format!(
            "The kernel denied permission while attaching. {} is {}, which disables \
             tracing entirely until reboot.",
            PTRACE_SCOPE_PATH, level
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_ptrace_scope() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "1").unwrap();
        assert_eq!(read_ptrace_scope(file.path()).unwrap(), 1);
    }

    #[test]
    fn test_read_ptrace_scope_garbage() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "lots").unwrap();
        let err = read_ptrace_scope(file.path()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_permission_hint_levels() {
        assert!(permission_hint(None).contains("same user"));
        assert!(permission_hint(Some(0)).contains("not the cause"));
        assert!(permission_hint(Some(1)).contains("descendants"));
        assert!(permission_hint(Some(2)).contains("CAP_SYS_PTRACE"));
        assert!(permission_hint(Some(3)).contains("until reboot"));
    }

    #[test]
    fn test_system_backend_missing_process() {
        // pid_max never reaches i32::MAX
        let pid: TargetPid = i32::MAX.to_string().parse().unwrap();
        let backend = SystemBackend;
        assert_eq!(
            backend.attach_to_process(pid, Path::new("/dev/null"), false),
            Err(Errno::ESRCH)
        );
        assert_eq!(backend.steal_session(pid).unwrap_err(), Errno::ESRCH);
    }

    #[test]
    fn test_system_backend_live_process_is_unsupported() {
        let pid: TargetPid = std::process::id().to_string().parse().unwrap();
        assert_eq!(
            SystemBackend.attach_to_process(pid, Path::new("/dev/null"), true),
            Err(Errno::ENOSYS)
        );
    }
}
