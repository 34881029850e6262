//! Daemon connection lifecycle

use crate::api::types::{SourceError, SourceResult};
use crate::daemon::{DaemonOpener, DaemonResult, DaemonSession, GpsData};
use log::{error, info, warn};
use std::os::unix::io::RawFd;

/// Exclusive owner of one daemon session.
///
/// The readiness descriptor is only exposed between a successful
/// `enable_streaming` and `close`.
pub struct DaemonConnection {
    session: Option<Box<dyn DaemonSession>>,
    streaming: bool,
}

impl DaemonConnection {
    /// Open a session; `None` host or port selects the daemon default
    pub fn open(opener: &dyn DaemonOpener, host: Option<&str>, port: Option<&str>) -> SourceResult<Self> {
        let session = opener.open(host, port).map_err(|e| {
            error!("failed to open gpsd session: {}", e);
            SourceError::Connect(e)
        })?;
        info!(
            "opened gpsd session at {}:{}",
            host.unwrap_or("default"),
            port.unwrap_or("default")
        );

        Ok(Self {
            session: Some(session),
            streaming: false,
        })
    }

    /// Request continuous delivery. On failure the session is closed
    /// and any close failure is reported alongside the original error.
    pub fn enable_streaming(&mut self) -> SourceResult<()> {
        let session = self.session.as_mut().ok_or(SourceError::NotStarted)?;
        if let Err(e) = session.enable_streaming() {
            error!("failed to enable gpsd streaming: {}", e);
            let close_error = self.close_session().err();
            if let Some(ref close) = close_error {
                error!("failed to close gpsd session: {}", close);
            }
            return Err(SourceError::StreamEnable { error: e, close_error });
        }

        self.streaming = true;
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.session.is_some()
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    pub fn readiness_fd(&self) -> Option<RawFd> {
        if !self.streaming {
            return None;
        }
        self.session.as_ref().map(|s| s.fd())
    }

    /// Whether a report is already buffered by the client
    pub fn has_pending(&self) -> bool {
        self.streaming && self.session.as_ref().map_or(false, |s| s.has_pending())
    }

    pub fn read(&mut self) -> SourceResult<()> {
        let session = self.session.as_mut().ok_or(SourceError::NotStarted)?;
        session.read().map_err(|e| {
            error!("failed to read from gpsd: {}", e);
            SourceError::Read(e)
        })
    }

    /// Report from the last read
    pub fn data(&self) -> Option<&GpsData> {
        self.session.as_ref().map(|s| s.data())
    }

    /// Close the session. Closing a closed connection does nothing.
    pub fn close(&mut self) -> SourceResult<()> {
        self.close_session().map_err(|e| {
            error!("failed to close gpsd session: {}", e);
            SourceError::Close(e)
        })
    }

    fn close_session(&mut self) -> DaemonResult<()> {
        self.streaming = false;
        match self.session.take() {
            Some(mut session) => session.close(),
            None => Ok(()),
        }
    }
}

impl Drop for DaemonConnection {
    fn drop(&mut self) {
        if let Err(e) = self.close_session() {
            warn!("failed to close gpsd session on drop: {}", e);
        }
    }
}
