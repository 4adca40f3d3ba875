//! A failing wait still ends the session with the terminal restored
//!
//! Lowering RLIMIT_NOFILE is process-wide, so this file holds a single test.

mod common;

use std::os::fd::AsFd;
use std::os::unix::net::UnixStream;

use nix::errno::Errno;
use nix::sys::resource::{getrlimit, setrlimit, Resource};

use common::{attributes, same_attributes};
use reptyr::app::SessionConfig;
use reptyr::pty::PtyPair;
use reptyr::relay::{run_session, RelayEnd};

#[test]
fn test_wait_failure_restores_terminal() {
    let terminal = PtyPair::allocate().unwrap();
    let terminal_slave = terminal.open_slave_read().unwrap();
    let before = attributes(&terminal_slave);

    let (_input_peer, input) = UnixStream::pair().unwrap();
    let (_output_peer, output) = UnixStream::pair().unwrap();
    let (_target_peer, target) = UnixStream::pair().unwrap();

    let config = SessionConfig::with_descriptors(
        false,
        terminal_slave.as_fd(),
        input.as_fd(),
        output.as_fd(),
    );

    // ppoll rejects more descriptors than RLIMIT_NOFILE allows with EINVAL
    let (soft, hard) = getrlimit(Resource::RLIMIT_NOFILE).unwrap();
    setrlimit(Resource::RLIMIT_NOFILE, 1, hard).unwrap();
    let ended = run_session(&config, target.as_fd());
    setrlimit(Resource::RLIMIT_NOFILE, soft, hard).unwrap();

    assert_eq!(ended.unwrap(), RelayEnd::WaitFailed(Errno::EINVAL));
    assert!(same_attributes(&before, &attributes(&terminal_slave)));
}
