//! The gpsd source element
//!
//! `GpsdSrc` is driven by a host pipeline: `start` connects to the
//! daemon, each `produce` blocks until one valid fix is available and
//! returns it with a presentation timestamp, and `stop` disconnects.
//! `unlock` may be called from another thread (usually through an
//! [`UnlockHandle`]) to cancel a blocked `produce`.

use crate::api::types::{ElementMetadata, SourceError, SourceResult, SourceStats, METADATA};
use crate::core::ClockTime;
use crate::daemon::{DaemonConnection, DaemonOpener, GpsdSocketOpener};
use crate::processing::clock::{PipelineClock, SystemWallClock, WallClock};
use crate::processing::codec::ENCODED_LEN;
use crate::processing::emitter::{BufferEmitter, OutputUnit};
use crate::processing::reader::FixReader;
use crate::processing::timestamp::compute_timestamp;
use crate::processing::wait::{UnlockHandle, Wakeup};
use crate::utils::config::{SourceConfig, TimestampSource};
use log::{error, info};
use std::sync::Arc;

pub struct GpsdSrc {
    config: SourceConfig,
    opener: Box<dyn DaemonOpener>,
    connection: Option<DaemonConnection>,
    reader: FixReader,
    emitter: BufferEmitter,
    wakeup: Arc<Wakeup>,
    clock: Option<Arc<dyn PipelineClock>>,
    wall_clock: Arc<dyn WallClock>,
    base_time: ClockTime,
    /// Policy captured at start
    session_policy: TimestampSource,
    stats: SourceStats,
}

impl GpsdSrc {
    pub const METADATA: ElementMetadata = METADATA;

    /// Source talking to a real gpsd over TCP
    pub fn new(config: SourceConfig) -> SourceResult<Self> {
        Self::with_opener(config, Box::new(GpsdSocketOpener))
    }

    pub fn with_opener(config: SourceConfig, opener: Box<dyn DaemonOpener>) -> SourceResult<Self> {
        let wakeup = Wakeup::new().map_err(SourceError::Wakeup)?;
        Ok(Self {
            session_policy: config.timestamp_source,
            config,
            opener,
            connection: None,
            reader: FixReader::new(),
            emitter: BufferEmitter::new(),
            wakeup: Arc::new(wakeup),
            clock: None,
            wall_clock: Arc::new(SystemWallClock),
            base_time: ClockTime::ZERO,
            stats: SourceStats::default(),
        })
    }

    pub fn with_wall_clock(mut self, wall_clock: Arc<dyn WallClock>) -> Self {
        self.wall_clock = wall_clock;
        self
    }

    /// Connect to the daemon and enable streaming.
    ///
    /// Any failure leaves the source stopped with no connection.
    pub fn start(&mut self) -> SourceResult<()> {
        if self.connection.is_some() {
            return Err(SourceError::AlreadyStarted);
        }

        self.config.validate().map_err(|e| {
            error!("refusing to start: {}", e);
            SourceError::Config(e)
        })?;

        let mut connection = DaemonConnection::open(self.opener.as_ref(), self.config.host(), self.config.port())?;
        connection.enable_streaming()?;

        self.session_policy = self.config.timestamp_source;
        self.reader = FixReader::new();
        self.emitter.reset();
        self.stats = SourceStats::default();
        self.connection = Some(connection);
        info!("gpsd source started (timestamp source {})", self.session_policy);
        Ok(())
    }

    /// Close the connection. Stopping a stopped source does nothing.
    pub fn stop(&mut self) -> SourceResult<()> {
        match self.connection.take() {
            Some(mut connection) => {
                let result = connection.close();
                info!("gpsd source stopped after {} buffers", self.stats.produced);
                result
            }
            None => Ok(()),
        }
    }

    /// Block until the next valid fix and package it.
    ///
    /// `StaleSample` and `Flushing` end only this call; the source stays
    /// started.
    pub fn produce(&mut self) -> SourceResult<OutputUnit> {
        let connection = self.connection.as_mut().ok_or(SourceError::NotStarted)?;
        let clock = self.clock.as_ref().ok_or_else(|| {
            error!("no pipeline clock");
            SourceError::NoClock
        })?;

        let fix = self.reader.next_valid_fix(connection, &self.wakeup);
        self.stats.filtered = self.reader.filtered();
        let fix = fix?;

        let wall_now = self.wall_clock.now();
        let pipeline_now = clock.time();
        let reconciled = compute_timestamp(fix, wall_now, pipeline_now, self.base_time, self.session_policy)
            .map_err(|e| {
                if let SourceError::StaleSample { .. } = e {
                    self.stats.stale_drops += 1;
                }
                e
            })?;
        if reconciled.clock_anomaly {
            self.stats.clock_anomalies += 1;
        }

        let unit = self.emitter.emit(fix, reconciled.pts);
        self.stats.produced += 1;
        Ok(unit)
    }

    /// Make a blocked or future `produce` return `Flushing`
    pub fn unlock(&self) {
        self.wakeup.set_flushing(true);
    }

    /// Re-arm normal blocking after `unlock`
    pub fn unlock_stop(&self) {
        self.wakeup.set_flushing(false);
    }

    /// Handle for cancelling waits from another thread
    pub fn unlock_handle(&self) -> UnlockHandle {
        UnlockHandle::new(Arc::clone(&self.wakeup))
    }

    pub fn set_clock(&mut self, clock: Option<Arc<dyn PipelineClock>>) {
        self.clock = clock;
    }

    pub fn set_base_time(&mut self, base_time: ClockTime) {
        self.base_time = base_time;
    }

    pub fn base_time(&self) -> ClockTime {
        self.base_time
    }

    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    /// Replace the configuration; it is read on the next `start`
    pub fn set_config(&mut self, config: SourceConfig) -> SourceResult<()> {
        config.validate()?;
        if self.is_started() {
            info!("configuration changed while started; applies on next start");
        }
        self.config = config;
        Ok(())
    }

    pub fn stats(&self) -> SourceStats {
        self.stats
    }

    pub fn is_started(&self) -> bool {
        self.connection.is_some()
    }

    pub fn is_live(&self) -> bool {
        true
    }

    pub fn is_seekable(&self) -> bool {
        false
    }

    /// Size of every output payload
    pub fn size(&self) -> usize {
        ENCODED_LEN
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FixMode, FixRecord, Motion, Position, GPSD_CAPS};
    use crate::daemon::{DaemonError, MockDaemon};
    use crate::processing::clock::ManualClock;
    use crate::processing::timestamp::unix_to_clock_time;
    use std::thread;
    use std::time::Duration;

    const CAPTURE: f64 = 1_493_640_000.0;

    struct Fixture {
        daemon: MockDaemon,
        source: GpsdSrc,
        pipeline: Arc<ManualClock>,
        wall: Arc<ManualClock>,
    }

    fn fixture(config: SourceConfig) -> Fixture {
        let daemon = MockDaemon::new();
        let pipeline = Arc::new(ManualClock::new(ClockTime::from_seconds(10)));
        let wall = Arc::new(ManualClock::new(
            unix_to_clock_time(CAPTURE + 0.5).unwrap(),
        ));
        let mut source = GpsdSrc::with_opener(config, Box::new(daemon.clone()))
            .unwrap()
            .with_wall_clock(wall.clone());
        source.set_clock(Some(pipeline.clone()));
        source.set_base_time(ClockTime::from_seconds(2));
        Fixture {
            daemon,
            source,
            pipeline,
            wall,
        }
    }

    fn fix_2d(time: f64) -> FixRecord {
        FixRecord::fix_2d(time, Position::new(37.0, -122.0), Motion::new(0.0, 0.0))
    }

    #[test]
    fn test_metadata() {
        let f = fixture(SourceConfig::default());
        assert_eq!(GpsdSrc::METADATA.long_name, "Source for gpsd data");
        assert_eq!(GpsdSrc::METADATA.classification, "Source/Sensor/Device");
        assert_eq!(GpsdSrc::METADATA.caps, GPSD_CAPS);
        assert!(f.source.is_live());
        assert!(!f.source.is_seekable());
        assert_eq!(f.source.size(), ENCODED_LEN);
    }

    #[test]
    fn test_end_to_end_skips_until_fix() {
        let mut f = fixture(SourceConfig::default());
        f.daemon.push_fix(FixRecord::not_seen());
        f.daemon.push_fix(FixRecord::no_fix(CAPTURE));
        f.daemon.push_fix(fix_2d(CAPTURE));

        f.source.start().unwrap();
        let unit = f.source.produce().unwrap();

        assert_eq!(unit.fix().mode(), FixMode::Fix2D);
        assert_eq!(unit.fix().position().unwrap().latitude, 37.0);
        assert_eq!(unit.fix().position().unwrap().longitude, -122.0);
        assert!(unit.fix().altitude().is_none());
        // 10s pipeline - 0.5s delay - 2s base
        assert_eq!(unit.pts(), ClockTime::from_mseconds(7_500));
        assert_eq!(unit.duration(), None);
        assert_eq!(unit.offset(), 0);

        let stats = f.source.stats();
        assert_eq!(stats.produced, 1);
        assert_eq!(stats.filtered, 2);
        assert_eq!(f.daemon.read_count(), 3);
    }

    #[test]
    fn test_pipeline_policy() {
        let mut f = fixture(SourceConfig::default().with_timestamp_source(TimestampSource::Pipeline));
        f.daemon.push_fix(fix_2d(0.0));
        f.source.start().unwrap();

        f.pipeline.set(ClockTime::from_seconds(42));
        let unit = f.source.produce().unwrap();
        assert_eq!(unit.pts(), ClockTime::from_seconds(40));
    }

    #[test]
    fn test_policy_is_read_at_start() {
        let mut f = fixture(SourceConfig::default());
        f.daemon.push_fix(fix_2d(0.0));
        f.source.start().unwrap();
        f.source
            .set_config(SourceConfig::default().with_timestamp_source(TimestampSource::Pipeline))
            .unwrap();

        // Still the GPS policy: a zero capture time is decades old
        let err = f.source.produce().unwrap_err();
        assert!(matches!(err, SourceError::StaleSample { .. }));
    }

    #[test]
    fn test_stale_sample_is_dropped_and_source_continues() {
        let mut f = fixture(SourceConfig::default());
        f.daemon.push_fix(fix_2d(CAPTURE - 60.0));
        f.daemon.push_fix(fix_2d(CAPTURE));
        f.source.start().unwrap();

        let err = f.source.produce().unwrap_err();
        assert!(!err.is_fatal());
        assert_eq!(f.source.stats().stale_drops, 1);
        assert!(f.source.is_started());

        let unit = f.source.produce().unwrap();
        assert_eq!(unit.offset(), 0);
        assert_eq!(f.source.stats().produced, 1);
    }

    #[test]
    fn test_clock_anomaly_uses_zero_delay() {
        let mut f = fixture(SourceConfig::default());
        f.daemon.push_fix(fix_2d(CAPTURE + 100.0));
        f.source.start().unwrap();

        let unit = f.source.produce().unwrap();
        assert_eq!(unit.pts(), ClockTime::from_seconds(8));
        assert_eq!(f.source.stats().clock_anomalies, 1);
        assert_eq!(f.wall.get(), unix_to_clock_time(CAPTURE + 0.5).unwrap());
    }

    #[test]
    fn test_lifecycle() {
        let mut f = fixture(SourceConfig::default().with_host("gps.local").with_port("2947"));
        assert!(matches!(f.source.produce(), Err(SourceError::NotStarted)));

        f.source.start().unwrap();
        assert!(f.source.is_started());
        assert!(matches!(f.source.start(), Err(SourceError::AlreadyStarted)));
        assert_eq!(
            f.daemon.last_address(),
            Some((Some("gps.local".to_string()), Some("2947".to_string())))
        );

        f.source.stop().unwrap();
        assert!(!f.source.is_started());
        assert_eq!(f.daemon.close_count(), 1);

        // Idempotent
        f.source.stop().unwrap();
        assert_eq!(f.daemon.close_count(), 1);

        f.source.start().unwrap();
        assert_eq!(f.daemon.open_count(), 2);
        f.source.stop().unwrap();
    }

    #[test]
    fn test_default_address_is_left_to_the_client() {
        let mut f = fixture(SourceConfig::default());
        f.source.start().unwrap();
        assert_eq!(f.daemon.last_address(), Some((None, None)));
    }

    #[test]
    fn test_open_failure_leaves_source_stopped() {
        let mut f = fixture(SourceConfig::default());
        f.daemon.fail_open(DaemonError::new(-6, "can't connect to host"));

        let err = f.source.start().unwrap_err();
        assert_eq!(err.daemon_error().map(|e| e.code), Some(-6));
        assert!(!f.source.is_started());
        f.source.stop().unwrap();

        f.daemon.clear_failures();
        f.source.start().unwrap();
        assert!(f.source.is_started());
    }

    #[test]
    fn test_stream_failure_leaves_source_stopped() {
        let mut f = fixture(SourceConfig::default());
        f.daemon.fail_streaming(DaemonError::new(-1, "watch rejected"));

        assert!(matches!(f.source.start(), Err(SourceError::StreamEnable { .. })));
        assert!(!f.source.is_started());
        assert_eq!(f.daemon.close_count(), 1);
    }

    #[test]
    fn test_invalid_config_is_rejected_before_connecting() {
        let mut f = fixture(SourceConfig::default());
        f.source.config = SourceConfig::default().with_port("gps");
        assert!(matches!(f.source.start(), Err(SourceError::Config(_))));
        assert_eq!(f.daemon.open_count(), 0);

        assert!(f.source.set_config(SourceConfig::default().with_port("0")).is_err());
        assert_eq!(f.source.config().port, "gps");
    }

    #[test]
    fn test_produce_requires_clock() {
        let mut f = fixture(SourceConfig::default());
        f.source.set_clock(None);
        f.daemon.push_fix(fix_2d(CAPTURE));
        f.source.start().unwrap();

        assert!(matches!(f.source.produce(), Err(SourceError::NoClock)));
        assert_eq!(f.daemon.read_count(), 0);
    }

    #[test]
    fn test_unlock_and_resume() {
        let mut f = fixture(SourceConfig::default());
        f.source.start().unwrap();

        let handle = f.source.unlock_handle();
        let unlocker = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            handle.unlock();
        });
        assert!(matches!(f.source.produce(), Err(SourceError::Flushing)));
        unlocker.join().unwrap();
        assert!(f.source.is_started());
        assert_eq!(f.source.stats().produced, 0);

        f.source.unlock_stop();
        f.daemon.push_fix(fix_2d(CAPTURE));
        assert!(f.source.produce().is_ok());
    }
}
