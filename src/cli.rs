//! Command-line interface

use std::ffi::OsString;

use clap::{Arg, ArgAction, CommandFactory, FromArgMatches, Parser};

use crate::attach::{SessionMode, TargetPid};
use crate::error::{Error, Result};

const USAGE: &str = "reptyr [-s] [-V] PID
       reptyr [-T] [-V] PID
       reptyr -l|-L [COMMAND [ARGS]]";

#[derive(Parser, Debug, Clone)]
#[command(name = "reptyr")]
#[command(version, disable_version_flag = true)]
#[command(about = "Reparent a running program to a new terminal", long_about = None)]
#[command(override_usage = USAGE)]
pub struct Cli {
    /// Create a new pty pair and print the name of the slave. Any arguments
    /// that follow are run as a command with REPTYR_PTY set to the slave
    #[arg(short = 'l', conflicts_with = "steal")]
    pub open_pty: bool,

    /// Like -l, but also redirect the child's stdio to the slave
    #[arg(short = 'L', conflicts_with = "steal")]
    pub redirect: bool,

    /// Attach fds 0-2 on the target, even if it is not attached to a tty
    #[arg(short = 's')]
    pub force_stdio: bool,

    /// Steal the entire terminal session of the target
    #[arg(short = 'T')]
    pub steal: bool,

    /// Print verbose debug output
    #[arg(short = 'V')]
    pub verbose: bool,

    /// PID to attach to, or with -l/-L the command to run
    #[arg(value_name = "PID | COMMAND")]
    pub args: Vec<OsString>,
}

impl Cli {
    /// The full command, with `-v` as the version flag
    pub fn command() -> clap::Command {
        <Self as CommandFactory>::command().arg(
            Arg::new("version")
                .short('v')
                .action(ArgAction::Version)
                .help("Print the version number and exit"),
        )
    }

    /// Parse `itr` (program name first).
    ///
    /// Flags may follow the PID, as with getopt. With `-l`/`-L`, everything
    /// from the first operand on is the command and is passed through as is.
    pub fn parse_args<I, T>(itr: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = Self::command().try_get_matches_from(permute(itr))?;
        Self::from_arg_matches(&matches)
    }

    /// Rendered usage line for usage errors
    pub fn usage() -> String {
        Self::command().render_usage().to_string()
    }

    /// Decide the session mode. Validates the pid; acquires nothing.
    pub fn into_mode(self) -> Result<SessionMode> {
        if self.open_pty || self.redirect {
            return Ok(SessionMode::CreateDetached {
                redirect: self.redirect,
                command: self.args,
            });
        }

        let arg = self
            .args
            .into_iter()
            .next()
            .ok_or_else(|| Error::Usage("No pid specified to attach".to_string()))?;
        let pid = TargetPid::parse_arg(&arg.to_string_lossy())?;

        if self.steal {
            Ok(SessionMode::StealSession { pid })
        } else {
            Ok(SessionMode::AttachExisting {
                pid,
                force_stdio: self.force_stdio,
            })
        }
    }
}

/// Reorder argv to `program flags.. -- operands..`.
///
/// Flags after the first operand are hoisted in front of it unless a `-l` or
/// `-L` came first, in which case the operands form a command line. A `--`
/// ends flag processing.
fn permute<I, T>(itr: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut itr = itr.into_iter().map(Into::into);
    let Some(program) = itr.next() else {
        return Vec::new();
    };

    let mut flags = Vec::new();
    let mut operands = Vec::new();
    let mut opens_command = false;

    while let Some(arg) = itr.next() {
        if arg == "--" {
            operands.extend(itr.by_ref());
            break;
        }
        if is_flag(&arg) {
            if operands.is_empty() && opens_pty(&arg) {
                opens_command = true;
            }
            flags.push(arg);
            continue;
        }
        operands.push(arg);
        if opens_command {
            operands.extend(itr.by_ref());
            break;
        }
    }

    let mut args = Vec::with_capacity(flags.len() + operands.len() + 2);
    args.push(program);
    args.extend(flags);
    args.push(OsString::from("--"));
    args.extend(operands);
    args
}

fn is_flag(arg: &OsString) -> bool {
    arg.to_str().is_some_and(|s| s.len() > 1 && s.starts_with('-'))
}

/// Short flag cluster containing `-l` or `-L`
fn opens_pty(arg: &OsString) -> bool {
    arg.to_str()
        .is_some_and(|s| !s.starts_with("--") && s[1..].contains(['l', 'L']))
}
