//! The protection capability handed in by the host tunnel layer.

use std::io;
use std::os::fd::RawFd;

/// Excludes a socket from tunnel interception.
///
/// Called with the raw descriptor of every socket the dialer creates,
/// after allocation and before any connect, bind-to-peer or I/O. How the
/// exclusion happens (Android `VpnService.protect`, `SO_MARK`, a routing
/// rule) is up to the implementation. An `Err` aborts that one dial and
/// the socket is closed unconnected.
///
/// Implementations may be called from many tasks at once.
///
/// Any `Fn(RawFd) -> io::Result<()>` closure is a `Protect`:
///
/// ```
/// use protectnet::Dialer;
/// use std::os::fd::RawFd;
///
/// let dialer = Dialer::new(|fd: RawFd| -> std::io::Result<()> {
///     tracing::debug!(fd, "excluding socket from tunnel");
///     Ok(())
/// }, "8.8.8.8");
/// ```
pub trait Protect: Send + Sync {
    fn protect(&self, fd: RawFd) -> io::Result<()>;
}

impl<F> Protect for F
where
    F: Fn(RawFd) -> io::Result<()> + Send + Sync,
{
    fn protect(&self, fd: RawFd) -> io::Result<()> {
        self(fd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Arc;

    struct Recorder {
        last: AtomicI32,
    }

    impl Protect for Recorder {
        fn protect(&self, fd: RawFd) -> io::Result<()> {
            self.last.store(fd, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn test_closure_is_protect() {
        let seen = Arc::new(AtomicI32::new(0));
        let seen_clone = seen.clone();
        let protect: Arc<dyn Protect> = Arc::new(move |fd: RawFd| -> io::Result<()> {
            seen_clone.store(fd, Ordering::SeqCst);
            Ok(())
        });

        protect.protect(42).unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 42);
    }

    #[test]
    fn test_struct_is_protect() {
        let recorder = Recorder {
            last: AtomicI32::new(0),
        };
        recorder.protect(7).unwrap();
        assert_eq!(recorder.last.load(Ordering::SeqCst), 7);
    }

    #[test]
    fn test_failure_propagates() {
        let deny = |_fd: RawFd| -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "vpn not ready"))
        };
        let err = deny.protect(3).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
    }
}
