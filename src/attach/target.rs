//! Target process identifiers

use std::fmt;
use std::str::FromStr;

use nix::unistd::Pid;
use thiserror::Error;

use crate::error::Error;

/// Why a PID argument was rejected
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PidError {
    #[error("no pid given")]
    Empty,

    #[error("must be integer")]
    NotNumeric,

    #[error("Numerical result out of range")]
    OutOfRange,
}

/// A validated process id: decimal digits only, between 1 and `i32::MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetPid(Pid);

impl TargetPid {
    /// Parse a command-line argument, reporting failure as a usage error.
    pub fn parse_arg(arg: &str) -> Result<Self, Error> {
        arg.parse().map_err(|reason| Error::InvalidPid {
            input: arg.to_string(),
            reason,
        })
    }

    pub fn as_pid(self) -> Pid {
        self.0
    }

    pub fn as_raw(self) -> i32 {
        self.0.as_raw()
    }
}

impl FromStr for TargetPid {
    type Err = PidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(PidError::Empty);
        }
        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PidError::NotNumeric);
        }

        // Only overflow can fail once the input is all digits
        let raw: i32 = s.parse().map_err(|_| PidError::OutOfRange)?;
        if raw < 1 {
            return Err(PidError::OutOfRange);
        }

        Ok(Self(Pid::from_raw(raw)))
    }
}

impl fmt::Display for TargetPid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
