//! Blocking readiness wait on the daemon socket
//!
//! The wait polls the daemon descriptor together with one end of a
//! socket pair. Unlocking sets a flag and writes a byte to the pair,
//! which wakes a poll blocked in another thread.

use log::error;
use std::io::{self, Read, Write};
use std::os::unix::io::{AsRawFd, RawFd};
use std::os::unix::net::UnixStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Poll events that mean a report can be read
pub const POLL_HAS_DATA: libc::c_short = libc::POLLIN | libc::POLLPRI;

/// Resource condition that ended a readiness wait
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum WaitError {
    #[error("poll on GPS socket failed with ENOMEM")]
    OutOfMemory,
    #[error("poll on GPS socket failed with EIO")]
    Io,
    #[error("poll on GPS socket failed with unknown error {0}")]
    Unknown(i32),
    #[error("GPS socket woke without data (revents {0:#06x})")]
    UnexpectedWake(libc::c_short),
}

/// Why a wait returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wake {
    /// The daemon socket has data
    Ready,
    /// The wait was unlocked
    Flushing,
}

/// Map a failed poll's errno; `None` means the wait should be retried
pub fn classify_errno(errno: i32) -> Option<WaitError> {
    match errno {
        libc::EINTR => None,
        libc::ENOMEM => Some(WaitError::OutOfMemory),
        libc::EIO => Some(WaitError::Io),
        other => Some(WaitError::Unknown(other)),
    }
}

/// Check that the daemon descriptor woke because data is available
pub fn classify_wake(revents: libc::c_short) -> Result<(), WaitError> {
    if revents & POLL_HAS_DATA != 0 {
        Ok(())
    } else {
        Err(WaitError::UnexpectedWake(revents))
    }
}

/// Cancellable readiness waiter
#[derive(Debug)]
pub struct Wakeup {
    flushing: AtomicBool,
    rx: UnixStream,
    tx: UnixStream,
}

impl Wakeup {
    pub fn new() -> io::Result<Self> {
        let (rx, tx) = UnixStream::pair()?;
        rx.set_nonblocking(true)?;
        tx.set_nonblocking(true)?;
        Ok(Self {
            flushing: AtomicBool::new(false),
            rx,
            tx,
        })
    }

    pub fn is_flushing(&self) -> bool {
        self.flushing.load(Ordering::SeqCst)
    }

    /// Enter or leave flushing; entering wakes any blocked wait
    pub fn set_flushing(&self, flushing: bool) {
        self.flushing.store(flushing, Ordering::SeqCst);
        if flushing {
            // A full buffer already guarantees a wake
            let _ = (&self.tx).write(&[1]);
        } else {
            self.drain();
        }
    }

    fn drain(&self) {
        let mut buf = [0u8; 64];
        while let Ok(n) = (&self.rx).read(&mut buf) {
            if n == 0 {
                break;
            }
        }
    }

    /// Block until `fd` is readable or the waiter is unlocked.
    ///
    /// There is no timeout. Interrupted polls are retried; any other poll
    /// failure ends the wait.
    pub fn wait(&self, fd: RawFd) -> Result<Wake, WaitError> {
        loop {
            if self.is_flushing() {
                return Ok(Wake::Flushing);
            }

            let mut fds = [
                libc::pollfd {
                    fd,
                    events: POLL_HAS_DATA,
                    revents: 0,
                },
                libc::pollfd {
                    fd: self.rx.as_raw_fd(),
                    events: libc::POLLIN,
                    revents: 0,
                },
            ];

            // SAFETY: `fds` is a valid array of pollfd for the whole call.
            let status = unsafe { libc::poll(fds.as_mut_ptr(), fds.len() as libc::nfds_t, -1) };
            if status == -1 {
                let errno = io::Error::last_os_error().raw_os_error().unwrap_or(0);
                match classify_errno(errno) {
                    None => continue,
                    Some(err) => {
                        error!("{}", err);
                        return Err(err);
                    }
                }
            }

            if fds[1].revents != 0 {
                if self.is_flushing() {
                    return Ok(Wake::Flushing);
                }
                // Leftover byte from an unlock that has since been stopped
                self.drain();
                if fds[0].revents == 0 {
                    continue;
                }
            }

            if let Err(err) = classify_wake(fds[0].revents) {
                error!("{}", err);
                return Err(err);
            }
            return Ok(Wake::Ready);
        }
    }
}

/// Thread-safe handle that cancels a blocked readiness wait
#[derive(Debug, Clone)]
pub struct UnlockHandle {
    wakeup: Arc<Wakeup>,
}

impl UnlockHandle {
    pub(crate) fn new(wakeup: Arc<Wakeup>) -> Self {
        Self { wakeup }
    }

    /// Make current and future waits return without data
    pub fn unlock(&self) {
        self.wakeup.set_flushing(true);
    }

    /// Restore normal blocking waits
    pub fn unlock_stop(&self) {
        self.wakeup.set_flushing(false);
    }

    pub fn is_unlocked(&self) -> bool {
        self.wakeup.is_flushing()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::{Duration, Instant};

    #[test]
    fn test_classify_errno() {
        assert_eq!(classify_errno(libc::EINTR), None);
        assert_eq!(classify_errno(libc::ENOMEM), Some(WaitError::OutOfMemory));
        assert_eq!(classify_errno(libc::EIO), Some(WaitError::Io));
        assert_eq!(classify_errno(libc::EBADF), Some(WaitError::Unknown(libc::EBADF)));
    }

    #[test]
    fn test_classify_wake() {
        assert!(classify_wake(libc::POLLIN).is_ok());
        assert!(classify_wake(libc::POLLPRI).is_ok());
        assert!(classify_wake(libc::POLLIN | libc::POLLHUP).is_ok());
        assert_eq!(
            classify_wake(libc::POLLHUP),
            Err(WaitError::UnexpectedWake(libc::POLLHUP))
        );
        assert_eq!(
            classify_wake(libc::POLLNVAL),
            Err(WaitError::UnexpectedWake(libc::POLLNVAL))
        );
    }

    #[test]
    fn test_wait_ready() {
        let wakeup = Wakeup::new().unwrap();
        let (daemon_side, mut feed) = UnixStream::pair().unwrap();
        feed.write_all(b"x").unwrap();

        assert_eq!(wakeup.wait(daemon_side.as_raw_fd()), Ok(Wake::Ready));
    }

    #[test]
    fn test_unlock_from_another_thread() {
        let wakeup = Arc::new(Wakeup::new().unwrap());
        let handle = UnlockHandle::new(Arc::clone(&wakeup));
        let (daemon_side, mut feed) = UnixStream::pair().unwrap();

        let unlocker = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            handle.unlock();
            handle
        });

        let started = Instant::now();
        assert_eq!(wakeup.wait(daemon_side.as_raw_fd()), Ok(Wake::Flushing));
        assert!(started.elapsed() < Duration::from_secs(5));

        let handle = unlocker.join().unwrap();
        assert!(handle.is_unlocked());
        assert_eq!(wakeup.wait(daemon_side.as_raw_fd()), Ok(Wake::Flushing));

        handle.unlock_stop();
        assert!(!handle.is_unlocked());
        feed.write_all(b"x").unwrap();
        assert_eq!(wakeup.wait(daemon_side.as_raw_fd()), Ok(Wake::Ready));
    }
}
