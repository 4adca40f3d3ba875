//! Configuration for a relay session
//!
//! There is no configuration file; everything comes from the command line.

use std::os::fd::BorrowedFd;

use nix::libc::{STDIN_FILENO, STDOUT_FILENO};

/// Per-run settings, threaded through the orchestrator and the relay
#[derive(Debug, Clone, Copy)]
pub struct SessionConfig<'fd> {
    /// Show informational diagnostics
    pub verbose: bool,
    /// Descriptor whose attributes and window size are managed
    terminal: BorrowedFd<'fd>,
    /// Local side the relay reads from
    input: BorrowedFd<'fd>,
    /// Local side the relay writes target output to
    output: BorrowedFd<'fd>,
}

impl SessionConfig<'static> {
    /// Configuration for the process's own standard streams
    pub fn stdio(verbose: bool) -> Self {
        // SAFETY: the standard streams stay open for the life of the process
        let (stdin, stdout) = unsafe {
            (
                BorrowedFd::borrow_raw(STDIN_FILENO),
                BorrowedFd::borrow_raw(STDOUT_FILENO),
            )
        };

        Self {
            verbose,
            terminal: stdin,
            input: stdin,
            output: stdout,
        }
    }
}

impl<'fd> SessionConfig<'fd> {
    /// Configuration driving arbitrary descriptors instead of stdio
    pub fn with_descriptors(
        verbose: bool,
        terminal: BorrowedFd<'fd>,
        input: BorrowedFd<'fd>,
        output: BorrowedFd<'fd>,
    ) -> Self {
        Self {
            verbose,
            terminal,
            input,
            output,
        }
    }

    pub fn terminal(&self) -> BorrowedFd<'fd> {
        self.terminal
    }

    pub fn input(&self) -> BorrowedFd<'fd> {
        self.input
    }

    pub fn output(&self) -> BorrowedFd<'fd> {
        self.output
    }

    /// Default log filter directive when `RUST_LOG` is not set
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "warn"
        }
    }
}
