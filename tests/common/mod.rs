//! Shared helpers for integration tests

#![allow(dead_code)]

use std::fs::File;
use std::io::{self, Read};
use std::os::fd::{AsFd, AsRawFd, OwnedFd};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use nix::errno::Errno;
use nix::fcntl::{fcntl, FcntlArg, OFlag};
use nix::sys::termios::{self, Termios};

use reptyr::attach::{AttachBackend, TargetPid};
use reptyr::pty::PtyPair;
use reptyr::Result;

/// A backend call, as recorded by [`MockBackend`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Allocate,
    Attach {
        pid: i32,
        slave: PathBuf,
        force_stdio: bool,
    },
    Steal {
        pid: i32,
    },
    Explain,
}

/// Backend that records calls and answers from canned results.
///
/// Every pty it allocates is real; it keeps a duplicate of the master and
/// an open slave so a test can watch the pty after the orchestrator has let
/// go of it.
#[derive(Default)]
pub struct MockBackend {
    pub calls: Mutex<Vec<Call>>,
    pub attach_result: Mutex<Option<Errno>>,
    pub steal_result: Mutex<Option<std::result::Result<OwnedFd, Errno>>>,
    pub master: Mutex<Option<OwnedFd>>,
    pub slave: Mutex<Option<File>>,
}

impl MockBackend {
    pub fn failing_attach(errno: Errno) -> Self {
        let backend = Self::default();
        *backend.attach_result.lock().unwrap() = Some(errno);
        backend
    }

    pub fn stealing(result: std::result::Result<OwnedFd, Errno>) -> Self {
        let backend = Self::default();
        *backend.steal_result.lock().unwrap() = Some(result);
        backend
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn take_master(&self) -> OwnedFd {
        self.master.lock().unwrap().take().expect("no pty was allocated")
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

impl AttachBackend for MockBackend {
    fn allocate_pty(&self) -> Result<PtyPair> {
        self.record(Call::Allocate);
        let pty = PtyPair::allocate()?;
        *self.master.lock().unwrap() = Some(pty.as_fd().try_clone_to_owned()?);
        *self.slave.lock().unwrap() = Some(pty.open_slave_read()?);
        Ok(pty)
    }

    fn attach_to_process(
        &self,
        pid: TargetPid,
        slave: &Path,
        force_stdio: bool,
    ) -> std::result::Result<(), Errno> {
        self.record(Call::Attach {
            pid: pid.as_raw(),
            slave: slave.to_path_buf(),
            force_stdio,
        });
        match *self.attach_result.lock().unwrap() {
            Some(errno) => Err(errno),
            None => Ok(()),
        }
    }

    fn steal_session(&self, pid: TargetPid) -> std::result::Result<OwnedFd, Errno> {
        self.record(Call::Steal { pid: pid.as_raw() });
        self.steal_result
            .lock()
            .unwrap()
            .take()
            .unwrap_or(Err(Errno::ENOSYS))
    }

    fn explain_permission_denied(&self) {
        self.record(Call::Explain);
    }
}

pub fn pid(raw: i32) -> TargetPid {
    raw.to_string().parse().unwrap()
}

/// Read from `fd` until `done` approves of what has arrived, or `timeout`
/// passes. Returns everything read.
pub fn read_until<F>(fd: OwnedFd, timeout: Duration, done: F) -> Vec<u8>
where
    F: Fn(&[u8]) -> bool,
{
    let flags = OFlag::from_bits_truncate(fcntl(fd.as_raw_fd(), FcntlArg::F_GETFL).unwrap());
    fcntl(fd.as_raw_fd(), FcntlArg::F_SETFL(flags | OFlag::O_NONBLOCK)).unwrap();

    let mut file = File::from(fd);
    let mut output = Vec::new();
    let mut buf = [0u8; 4096];
    let deadline = Instant::now() + timeout;

    while Instant::now() < deadline && !done(&output) {
        match file.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => output.extend_from_slice(&buf[..n]),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                std::thread::sleep(Duration::from_millis(20));
            },
            Err(_) => break,
        }
    }

    output
}

/// Poll `check` until it holds or `timeout` passes
pub fn eventually<F: FnMut() -> bool>(timeout: Duration, mut check: F) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if check() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    check()
}

pub fn same_attributes(a: &Termios, b: &Termios) -> bool {
    a.input_flags == b.input_flags
        && a.output_flags == b.output_flags
        && a.control_flags == b.control_flags
        && a.local_flags == b.local_flags
        && a.control_chars == b.control_chars
}

pub fn attributes(fd: impl AsFd) -> Termios {
    termios::tcgetattr(fd.as_fd()).unwrap()
}
