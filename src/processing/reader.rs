//! Blocking read of the next usable fix

use crate::api::types::{SourceError, SourceResult};
use crate::core::FixRecord;
use crate::daemon::DaemonConnection;
use crate::processing::wait::{Wake, Wakeup};
use crate::validation::FixValidator;
use log::{debug, info};

/// Reads reports until one carries a fix
#[derive(Debug, Default)]
pub struct FixReader {
    validator: FixValidator,
    filtered: u64,
}

impl FixReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports discarded since creation
    pub fn filtered(&self) -> u64 {
        self.filtered
    }

    /// Block until the connection yields a report with a 2D or 3D fix.
    ///
    /// Reports without a fix are discarded and the wait resumes. The
    /// returned record stays borrowed from the connection until the next
    /// read.
    pub fn next_valid_fix<'c>(
        &mut self,
        connection: &'c mut DaemonConnection,
        wakeup: &Wakeup,
    ) -> SourceResult<&'c FixRecord> {
        loop {
            if wakeup.is_flushing() {
                debug!("fix read unlocked");
                return Err(SourceError::Flushing);
            }

            if !connection.has_pending() {
                let fd = connection.readiness_fd().ok_or(SourceError::NotStarted)?;
                if wakeup.wait(fd)? == Wake::Flushing {
                    debug!("readiness wait unlocked");
                    return Err(SourceError::Flushing);
                }
            }

            connection.read()?;
            let data = connection.data().ok_or(SourceError::NotStarted)?;
            match self.validator.check(data) {
                Ok(()) => break,
                Err(reason) => {
                    self.filtered += 1;
                    info!("no gps fix ({})", reason);
                }
            }
        }

        connection.data().map(|data| &data.fix).ok_or(SourceError::NotStarted)
    }
}
