//! Blocking read/write on raw descriptors

use std::os::fd::{AsRawFd, BorrowedFd};

use nix::errno::Errno;
use nix::libc;

/// Read whatever is available into `buf`, at most `buf.len()` bytes.
pub fn read_chunk(fd: BorrowedFd<'_>, buf: &mut [u8]) -> nix::Result<usize> {
    // SAFETY: buf is valid for writes of buf.len() bytes
    let result = unsafe { libc::read(fd.as_raw_fd(), buf.as_mut_ptr().cast(), buf.len()) };
    Errno::result(result).map(|n| n as usize)
}

/// Write all of `buf` to `fd`.
pub fn write_all(fd: BorrowedFd<'_>, buf: &[u8]) -> nix::Result<()> {
    write_all_with(buf, |chunk| {
        // SAFETY: chunk is valid for reads of chunk.len() bytes
        let result =
            unsafe { libc::write(fd.as_raw_fd(), chunk.as_ptr().cast(), chunk.len()) };
        Errno::result(result).map(|n| n as usize)
    })
}

/// Drive `write` until every byte of `buf` has been accepted.
///
/// Interrupted calls are retried; any other error is returned as-is. A write
/// that accepts nothing for a non-empty buffer is reported as `EIO` so the
/// caller never sees success with bytes left over.
pub fn write_all_with<F>(mut buf: &[u8], mut write: F) -> nix::Result<()>
where
    F: FnMut(&[u8]) -> nix::Result<usize>,
{
    while !buf.is_empty() {
        match write(buf) {
            Ok(0) => return Err(Errno::EIO),
            Ok(n) => buf = &buf[n.min(buf.len())..],
            Err(Errno::EINTR) => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(())
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Step {
        Interrupted,
        Accept(usize),
        Fail,
    }

    fn step() -> impl Strategy<Value = Step> {
        prop_oneof![
            3 => Just(Step::Interrupted),
            6 => (1usize..64).prop_map(Step::Accept),
            1 => Just(Step::Fail),
        ]
    }

    proptest! {
        /// Success means the sink holds exactly the payload; failure means it
        /// holds a strict prefix and the error is not an interrupt.
        #[test]
        fn write_all_never_succeeds_short(
            payload in prop::collection::vec(any::<u8>(), 0..512),
            script in prop::collection::vec(step(), 0..40),
        ) {
            let mut steps = script.into_iter();
            let mut sink = Vec::new();
            let result = write_all_with(&payload, |chunk| match steps.next() {
                Some(Step::Interrupted) => Err(Errno::EINTR),
                Some(Step::Fail) => Err(Errno::EIO),
                Some(Step::Accept(n)) => {
                    let n = n.min(chunk.len());
                    sink.extend_from_slice(&chunk[..n]);
                    Ok(n)
                }
                None => {
                    sink.extend_from_slice(chunk);
                    Ok(chunk.len())
                }
            });

            match result {
                Ok(()) => prop_assert_eq!(&sink, &payload),
                Err(e) => {
                    prop_assert_ne!(e, Errno::EINTR);
                    prop_assert!(sink.len() < payload.len());
                    prop_assert_eq!(&sink[..], &payload[..sink.len()]);
                }
            }
        }
    }
}
