//! Presentation timestamp reconciliation
//!
//! The fix capture time is the most accurate record of when the sample
//! happened, but downstream elements synchronise on the pipeline clock.
//! Under the GPS policy the ingestion delay (wall time minus capture
//! time) is measured and subtracted from the pipeline time, which keeps
//! GPS accuracy while expressing the result on the pipeline clock.

use crate::api::types::{SourceError, SourceResult};
use crate::core::{ClockTime, FixRecord, NSEC_PER_SEC};
use crate::utils::config::TimestampSource;
use log::warn;

/// Outcome of reconciling one fix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reconciled {
    /// Presentation timestamp relative to the stream's base time
    pub pts: ClockTime,
    /// Ingestion delay that was subtracted
    pub delay: ClockTime,
    /// Capture time was not before wall time
    pub clock_anomaly: bool,
}

/// Convert fractional Unix seconds to clock time, keeping the
/// sub-second part to nanosecond resolution
pub fn unix_to_clock_time(timestamp: f64) -> Option<ClockTime> {
    if !timestamp.is_finite() || timestamp < 0.0 {
        return None;
    }

    let secs = timestamp.trunc();
    let nsec = ((timestamp - secs) * NSEC_PER_SEC as f64).round() as u64;
    (secs as u64)
        .checked_mul(NSEC_PER_SEC)
        .and_then(|ns| ns.checked_add(nsec))
        .map(ClockTime::from_nseconds)
}

/// Compute the presentation timestamp for `fix`.
///
/// Fails with [`SourceError::StaleSample`] when the fix predates the
/// stream; the sample must then be dropped.
pub fn compute_timestamp(
    fix: &FixRecord,
    wall_now: ClockTime,
    pipeline_now: ClockTime,
    base_time: ClockTime,
    policy: TimestampSource,
) -> SourceResult<Reconciled> {
    match policy {
        TimestampSource::Pipeline => {
            let pts = pipeline_now.checked_sub(base_time).unwrap_or_else(|| {
                warn!(
                    "pipeline time {} is before base time {}; clamping to zero",
                    pipeline_now, base_time
                );
                ClockTime::ZERO
            });
            Ok(Reconciled {
                pts,
                delay: ClockTime::ZERO,
                clock_anomaly: false,
            })
        }
        TimestampSource::Gps => {
            let (delay, clock_anomaly) = match unix_to_clock_time(fix.time()) {
                Some(capture) if wall_now > capture => (wall_now.saturating_sub(capture), false),
                Some(_) => {
                    warn!("gpsd sample time is greater than current time; one of these clocks is wrong");
                    (ClockTime::ZERO, true)
                }
                None => {
                    warn!("gpsd sample time {} is not a valid time; assuming no delay", fix.time());
                    (ClockTime::ZERO, true)
                }
            };

            if delay > pipeline_now {
                warn!("GPS is sending data older than the pipeline; dropping");
                return Err(SourceError::StaleSample { delay, pipeline_now });
            }

            let pts = pipeline_now
                .saturating_sub(delay)
                .checked_sub(base_time)
                .ok_or_else(|| {
                    warn!("GPS sample predates the stream base time; dropping");
                    SourceError::StaleSample { delay, pipeline_now }
                })?;

            Ok(Reconciled {
                pts,
                delay,
                clock_anomaly,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Motion, Position};

    fn fix_at(time: f64) -> FixRecord {
        FixRecord::fix_2d(time, Position::new(37.0, -122.0), Motion::new(0.0, 0.0))
    }

    #[test]
    fn test_unix_to_clock_time_keeps_fraction() {
        assert_eq!(
            unix_to_clock_time(1_493_640_000.25),
            Some(ClockTime::from_nseconds(1_493_640_000_250_000_000))
        );
        assert_eq!(unix_to_clock_time(1.5), Some(ClockTime::from_mseconds(1500)));
        assert_eq!(unix_to_clock_time(0.0), Some(ClockTime::ZERO));
        assert_eq!(unix_to_clock_time(f64::NAN), None);
        assert_eq!(unix_to_clock_time(-1.0), None);
    }

    #[test]
    fn test_gps_policy_subtracts_delay_and_base() {
        let fix = fix_at(1_000.25);
        let wall = ClockTime::from_seconds(1_001);
        let pipeline = ClockTime::from_seconds(60);
        let base = ClockTime::from_seconds(10);

        let result = compute_timestamp(&fix, wall, pipeline, base, TimestampSource::Gps).unwrap();
        assert_eq!(result.delay, ClockTime::from_mseconds(750));
        assert_eq!(result.pts, ClockTime::from_mseconds(60_000 - 750 - 10_000));
        assert!(!result.clock_anomaly);
    }

    #[test]
    fn test_gps_policy_is_exact_to_the_nanosecond() {
        let fix = fix_at(1_500_000_000.123_456_7);
        let capture = unix_to_clock_time(fix.time()).unwrap();
        let wall = capture.checked_add(ClockTime::from_nseconds(987_654_321)).unwrap();
        let pipeline = ClockTime::from_nseconds(5_000_000_001);
        let base = ClockTime::from_nseconds(1_000_000_000);

        let result = compute_timestamp(&fix, wall, pipeline, base, TimestampSource::Gps).unwrap();
        assert_eq!(result.pts.nseconds(), 5_000_000_001 - 987_654_321 - 1_000_000_000);
    }

    #[test]
    fn test_gps_policy_future_capture_time_means_no_delay() {
        let fix = fix_at(2_000.0);
        let wall = ClockTime::from_seconds(1_000);
        let pipeline = ClockTime::from_seconds(30);

        let result = compute_timestamp(&fix, wall, pipeline, ClockTime::ZERO, TimestampSource::Gps).unwrap();
        assert_eq!(result.delay, ClockTime::ZERO);
        assert_eq!(result.pts, pipeline);
        assert!(result.clock_anomaly);
    }

    #[test]
    fn test_gps_policy_equal_times_means_no_delay() {
        let fix = fix_at(1_000.0);
        let wall = ClockTime::from_seconds(1_000);
        let pipeline = ClockTime::from_seconds(3);

        let result = compute_timestamp(&fix, wall, pipeline, ClockTime::ZERO, TimestampSource::Gps).unwrap();
        assert_eq!(result.pts, pipeline);
        assert!(result.clock_anomaly);
    }

    #[test]
    fn test_gps_policy_drops_data_older_than_pipeline() {
        let fix = fix_at(1_000.0);
        let wall = ClockTime::from_seconds(1_010);
        let pipeline = ClockTime::from_seconds(5);

        let err = compute_timestamp(&fix, wall, pipeline, ClockTime::ZERO, TimestampSource::Gps).unwrap_err();
        match err {
            SourceError::StaleSample { delay, pipeline_now } => {
                assert_eq!(delay, ClockTime::from_seconds(10));
                assert_eq!(pipeline_now, pipeline);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_gps_policy_drops_data_older_than_base_time() {
        let fix = fix_at(1_000.0);
        let wall = ClockTime::from_seconds(1_002);
        let pipeline = ClockTime::from_seconds(5);
        let base = ClockTime::from_seconds(4);

        let err = compute_timestamp(&fix, wall, pipeline, base, TimestampSource::Gps).unwrap_err();
        assert!(matches!(err, SourceError::StaleSample { .. }));
    }

    #[test]
    fn test_pipeline_policy_ignores_capture_time() {
        let pipeline = ClockTime::from_seconds(42);
        let base = ClockTime::from_seconds(2);
        let wall = ClockTime::from_seconds(1_000);

        for time in [0.0, f64::NAN, -5.0, 1e300, 999.0, 5_000.0] {
            let result = compute_timestamp(&fix_at(time), wall, pipeline, base, TimestampSource::Pipeline).unwrap();
            assert_eq!(result.pts, ClockTime::from_seconds(40));
            assert_eq!(result.delay, ClockTime::ZERO);
        }
    }

    #[test]
    fn test_pipeline_policy_clamps_before_base_time() {
        let result = compute_timestamp(
            &fix_at(0.0),
            ClockTime::ZERO,
            ClockTime::from_seconds(1),
            ClockTime::from_seconds(2),
            TimestampSource::Pipeline,
        )
        .unwrap();
        assert_eq!(result.pts, ClockTime::ZERO);
    }
}
