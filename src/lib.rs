//! reptyr: move a running program onto a new terminal
//!
//! A long-running foreground job can be pulled off the terminal it was
//! started on (and survive that terminal going away) by binding it to a
//! fresh pseudoterminal that this process then relays to.
//!
//! - `pty`: pseudoterminal allocation and window-size ioctls
//! - `relay`: raw mode, SIGWINCH propagation, and the byte relay
//! - `attach`: session modes, the takeover backend contract, orchestration
//! - `cli`: command-line parsing
//! - `app`: session configuration and logging

pub mod app;
pub mod attach;
pub mod cli;
pub mod error;
pub mod pty;
pub mod relay;

pub use error::{Error, Result};
