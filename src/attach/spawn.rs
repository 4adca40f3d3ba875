//! Fire-and-forget children for `-l`/`-L`

use std::ffi::OsString;
use std::io;
use std::os::unix::process::CommandExt;
use std::process::Command;

use nix::libc;

use crate::error::{Error, Result};
use crate::pty::PtyPair;

/// Environment variable telling a spawned child where its pty is
pub const PTY_ENV_VAR: &str = "REPTYR_PTY";

/// Start `command` with [`PTY_ENV_VAR`] pointing at the pty's slave and
/// return its pid without waiting for it.
///
/// With `redirect`, the child gets its own session with the slave as its
/// controlling terminal and standard streams; otherwise it shares ours.
pub fn spawn_detached(pty: &PtyPair, command: &[OsString], redirect: bool) -> Result<u32> {
    let (program, args) = command
        .split_first()
        .ok_or_else(|| Error::Usage("No command to run".to_string()))?;
    let spawn_error = |source: io::Error| Error::Spawn {
        program: program.to_string_lossy().into_owned(),
        source,
    };

    let mut cmd = Command::new(program);
    cmd.args(args).env(PTY_ENV_VAR, pty.slave_path());

    if redirect {
        let stdin = pty.open_slave_read().map_err(spawn_error)?;
        let stdout = pty.open_slave_write().map_err(spawn_error)?;
        let stderr = stdout.try_clone().map_err(spawn_error)?;
        cmd.stdin(stdin).stdout(stdout).stderr(stderr);

        // SAFETY: only async-signal-safe calls between fork and exec
        unsafe {
            cmd.pre_exec(|| {
                if libc::setsid() == -1 {
                    return Err(io::Error::last_os_error());
                }
                // Stdin is the slave by now; claiming it can fail harmlessly
                libc::ioctl(libc::STDIN_FILENO, libc::TIOCSCTTY as _, 0);
                Ok(())
            });
        }
    }

    let child = cmd.spawn().map_err(spawn_error)?;
    tracing::debug!("Spawned {:?} as pid {}", program, child.id());
    Ok(child.id())
}
