//! Descriptor Cleanup Tests
//!
//! Dials that time out or are cancelled must close the socket they
//! created. Kept in its own test binary with a single test so no other
//! test opens descriptors while they are being counted.

#![cfg(target_os = "linux")]

use protectnet::{Dialer, NetError};
use std::io;
use std::os::fd::RawFd;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

const UNROUTABLE: &str = "10.255.255.1:80";

fn open_fds() -> usize {
    std::fs::read_dir("/proc/self/fd").unwrap().count()
}

#[tokio::test]
async fn test_timed_out_and_cancelled_dials_close_socket() {
    let protects = Arc::new(AtomicUsize::new(0));
    let protects_clone = protects.clone();
    let dialer = Dialer::new(
        move |_fd: RawFd| -> io::Result<()> {
            protects_clone.fetch_add(1, Ordering::SeqCst);
            Ok(())
        },
        "127.0.0.1",
    );

    let before = open_fds();

    for _ in 0..10 {
        let err = dialer
            .dial_timeout("tcp4", UNROUTABLE, Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, NetError::ConnectionFailed { .. }), "got {err:?}");
    }
    assert_eq!(open_fds(), before, "timed-out dial left a descriptor open");

    for _ in 0..10 {
        // The outer timeout drops the dial future mid-connect.
        let dial = dialer.dial("tcp4", UNROUTABLE);
        let _ = tokio::time::timeout(Duration::from_millis(50), dial).await;
    }
    assert_eq!(open_fds(), before, "cancelled dial left a descriptor open");

    assert_eq!(protects.load(Ordering::SeqCst), 20);
}
