//! Unix PTY implementation
//!
//! Allocates a fresh master/slave pair using the POSIX ptmx interface.

use std::fs::{File, OpenOptions};
use std::io;
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, FromRawFd, IntoRawFd, OwnedFd};
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use nix::errno::Errno;
use nix::fcntl::{fcntl, FcntlArg, FdFlag, OFlag};
use nix::libc;
use nix::pty::{grantpt, posix_openpt, unlockpt, PtyMaster};

use super::WindowSize;
use crate::error::{Error, Result};

/// A freshly allocated pseudoterminal: the master descriptor and the path of
/// its slave device.
///
/// The slave is not held open here. A target process (or a spawned child)
/// opens it by path; the relay only ever drives the master.
#[derive(Debug)]
pub struct PtyPair {
    /// The PTY master file descriptor
    master: OwnedFd,
    /// Path to the slave PTY, e.g. `/dev/pts/7`
    slave_path: PathBuf,
}

impl PtyPair {
    /// Open a new master, grant and unlock its slave, and resolve the slave's
    /// path.
    pub fn allocate() -> Result<Self> {
        let master = posix_openpt(OFlag::O_RDWR | OFlag::O_NOCTTY).map_err(Error::OpenMaster)?;

        grantpt(&master).map_err(Error::GrantPty)?;
        unlockpt(&master).map_err(Error::UnlockPty)?;

        let slave_path = PathBuf::from(slave_name(&master).map_err(Error::PtsName)?);

        // Children spawned on the slave must never inherit the master
        fcntl(master.as_raw_fd(), FcntlArg::F_SETFD(FdFlag::FD_CLOEXEC))
            .map_err(Error::CloseOnExec)?;

        // SAFETY: into_raw_fd hands over sole ownership of a valid descriptor
        let master = unsafe { OwnedFd::from_raw_fd(master.into_raw_fd()) };

        tracing::debug!("Allocated pty, slave at {}", slave_path.display());

        Ok(Self { master, slave_path })
    }

    /// Path of the slave device
    pub fn slave_path(&self) -> &Path {
        &self.slave_path
    }

    /// Give up the pair, keeping only the master for the relay
    pub fn into_master(self) -> OwnedFd {
        self.master
    }

    /// Open the slave for reading only (a child's stdin)
    pub fn open_slave_read(&self) -> io::Result<File> {
        OpenOptions::new()
            .read(true)
            .custom_flags(libc::O_NOCTTY)
            .open(&self.slave_path)
    }

    /// Open the slave for writing only (a child's stdout/stderr)
    pub fn open_slave_write(&self) -> io::Result<File> {
        OpenOptions::new()
            .write(true)
            .custom_flags(libc::O_NOCTTY)
            .open(&self.slave_path)
    }
}

impl AsFd for PtyPair {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.master.as_fd()
    }
}

#[cfg(any(target_os = "linux", target_os = "android"))]
fn slave_name(master: &PtyMaster) -> nix::Result<String> {
    nix::pty::ptsname_r(master)
}

#[cfg(not(any(target_os = "linux", target_os = "android")))]
fn slave_name(master: &PtyMaster) -> nix::Result<String> {
    // SAFETY: ptsname uses a static buffer; allocation happens once, before
    // any other thread could be calling it
    unsafe { nix::pty::ptsname(master) }
}

/// Set the window size on a terminal file descriptor
pub fn set_window_size(fd: BorrowedFd<'_>, size: WindowSize) -> nix::Result<()> {
    let ws: libc::winsize = size.into();

    // SAFETY: TIOCSWINSZ reads a winsize from the pointer we pass
    let result = unsafe { libc::ioctl(fd.as_raw_fd(), libc::TIOCSWINSZ, &ws) };

    Errno::result(result).map(drop)
}

/// Get the window size from a terminal file descriptor
pub fn get_window_size(fd: BorrowedFd<'_>) -> nix::Result<WindowSize> {
    let mut ws = libc::winsize {
        ws_row: 0,
        ws_col: 0,
        ws_xpixel: 0,
        ws_ypixel: 0,
    };

    // SAFETY: TIOCGWINSZ writes a winsize through the pointer we pass
    let result = unsafe { libc::ioctl(fd.as_raw_fd(), libc::TIOCGWINSZ, &mut ws) };

    Errno::result(result).map(|_| WindowSize::from(ws))
}
