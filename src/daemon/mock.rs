//! Mock daemon for testing and development
//!
//! Reports are scripted through [`MockDaemon`] and delivered through a
//! real socket pair, so sessions it opens can be polled like a gpsd
//! socket: each queued event makes one byte readable.

use crate::core::FixRecord;
use crate::daemon::{DaemonError, DaemonOpener, DaemonResult, DaemonSession, GpsData, NL_CLOSED};
use std::collections::VecDeque;
use std::io::{Read, Write};
use std::os::unix::io::{AsRawFd, RawFd};
use std::os::unix::net::UnixStream;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone)]
enum MockEvent {
    Report(GpsData),
    ReadError(DaemonError),
}

#[derive(Debug, Default)]
struct MockState {
    events: VecDeque<MockEvent>,
    writer: Option<UnixStream>,
    open_error: Option<DaemonError>,
    stream_error: Option<DaemonError>,
    close_error: Option<DaemonError>,
    open_count: usize,
    close_count: usize,
    read_count: usize,
    last_address: Option<(Option<String>, Option<String>)>,
}

impl MockState {
    fn signal(&mut self, count: usize) {
        if let Some(writer) = self.writer.as_mut() {
            // One byte per event; a full pipe only happens with thousands queued
            let _ = writer.write_all(&vec![1u8; count]);
        }
    }
}

/// Scriptable stand-in for gpsd; clones share the same script
#[derive(Debug, Clone, Default)]
pub struct MockDaemon {
    state: Arc<Mutex<MockState>>,
}

impl MockDaemon {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a report for the current or next session
    pub fn push_report(&self, data: GpsData) {
        let mut state = self.state();
        state.events.push_back(MockEvent::Report(data));
        state.signal(1);
    }

    /// Queue a fix with the default session status
    pub fn push_fix(&self, fix: FixRecord) {
        self.push_report(GpsData::fix(fix));
    }

    /// Queue a failing read
    pub fn push_read_error(&self, error: DaemonError) {
        let mut state = self.state();
        state.events.push_back(MockEvent::ReadError(error));
        state.signal(1);
    }

    pub fn fail_open(&self, error: DaemonError) {
        self.state().open_error = Some(error);
    }

    pub fn fail_streaming(&self, error: DaemonError) {
        self.state().stream_error = Some(error);
    }

    pub fn fail_close(&self, error: DaemonError) {
        self.state().close_error = Some(error);
    }

    pub fn clear_failures(&self) {
        let mut state = self.state();
        state.open_error = None;
        state.stream_error = None;
        state.close_error = None;
    }

    /// Drop the daemon side of the open session
    pub fn hang_up(&self) {
        self.state().writer = None;
    }

    pub fn open_count(&self) -> usize {
        self.state().open_count
    }

    pub fn close_count(&self) -> usize {
        self.state().close_count
    }

    pub fn read_count(&self) -> usize {
        self.state().read_count
    }

    pub fn queued_event_count(&self) -> usize {
        self.state().events.len()
    }

    /// Host and port passed to the last open
    pub fn last_address(&self) -> Option<(Option<String>, Option<String>)> {
        self.state().last_address.clone()
    }
}

impl DaemonOpener for MockDaemon {
    fn open(&self, host: Option<&str>, port: Option<&str>) -> DaemonResult<Box<dyn DaemonSession>> {
        let mut state = self.state();
        state.open_count += 1;
        state.last_address = Some((host.map(str::to_string), port.map(str::to_string)));

        if let Some(error) = state.open_error.clone() {
            return Err(error);
        }

        let (reader, writer) = UnixStream::pair().map_err(|e| DaemonError::io(&e))?;
        state.writer = Some(writer);
        let pending = state.events.len();
        state.signal(pending);

        Ok(Box::new(MockSession {
            reader,
            state: Arc::clone(&self.state),
            data: GpsData::default(),
            closed: false,
        }))
    }
}

/// Session opened by [`MockDaemon`]
pub struct MockSession {
    reader: UnixStream,
    state: Arc<Mutex<MockState>>,
    data: GpsData,
    closed: bool,
}

impl MockSession {
    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DaemonSession for MockSession {
    fn enable_streaming(&mut self) -> DaemonResult<()> {
        match self.state().stream_error.clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn read(&mut self) -> DaemonResult<()> {
        let mut signal = [0u8; 1];
        self.reader
            .read_exact(&mut signal)
            .map_err(|_| DaemonError::from_code(NL_CLOSED))?;

        let event = {
            let mut state = self.state();
            state.read_count += 1;
            state.events.pop_front()
        };

        match event {
            Some(MockEvent::Report(data)) => {
                self.data = data;
                Ok(())
            }
            Some(MockEvent::ReadError(error)) => Err(error),
            None => Err(DaemonError::from_code(NL_CLOSED)),
        }
    }

    fn data(&self) -> &GpsData {
        &self.data
    }

    fn has_pending(&self) -> bool {
        false
    }

    fn fd(&self) -> RawFd {
        self.reader.as_raw_fd()
    }

    fn close(&mut self) -> DaemonResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let mut state = self.state();
        state.close_count += 1;
        state.writer = None;
        match state.close_error.clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}
