//! Core data types for the gpsd source

use crate::core::constants::NSEC_PER_SEC;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fix quality reported by the daemon, ordered by tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FixMode {
    /// Mode update not seen yet
    NotSeen = 0,
    /// Receiver is talking but has no fix
    NoFix = 1,
    /// Latitude, longitude and motion are valid
    Fix2D = 2,
    /// Altitude and climb are valid as well
    Fix3D = 3,
}

impl FixMode {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(FixMode::NotSeen),
            1 => Some(FixMode::NoFix),
            2 => Some(FixMode::Fix2D),
            3 => Some(FixMode::Fix3D),
            _ => None,
        }
    }

    /// Whether the horizontal fields of a record are meaningful
    pub fn has_position(&self) -> bool {
        *self >= FixMode::Fix2D
    }

    /// Whether the vertical fields of a record are meaningful
    pub fn has_altitude(&self) -> bool {
        *self == FixMode::Fix3D
    }
}

impl fmt::Display for FixMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FixMode::NotSeen => "not seen",
            FixMode::NoFix => "no fix",
            FixMode::Fix2D => "2D",
            FixMode::Fix3D => "3D",
        };
        f.write_str(name)
    }
}

/// Pipeline clock time in nanoseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct ClockTime(u64);

impl ClockTime {
    pub const ZERO: ClockTime = ClockTime(0);
    pub const SECOND: ClockTime = ClockTime(NSEC_PER_SEC);

    pub const fn from_nseconds(nseconds: u64) -> Self {
        ClockTime(nseconds)
    }

    pub const fn from_mseconds(mseconds: u64) -> Self {
        ClockTime(mseconds * 1_000_000)
    }

    pub const fn from_seconds(seconds: u64) -> Self {
        ClockTime(seconds * NSEC_PER_SEC)
    }

    pub const fn nseconds(&self) -> u64 {
        self.0
    }

    pub fn checked_add(self, other: ClockTime) -> Option<ClockTime> {
        self.0.checked_add(other.0).map(ClockTime)
    }

    pub fn checked_sub(self, other: ClockTime) -> Option<ClockTime> {
        self.0.checked_sub(other.0).map(ClockTime)
    }

    pub fn saturating_sub(self, other: ClockTime) -> ClockTime {
        ClockTime(self.0.saturating_sub(other.0))
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.0 / NSEC_PER_SEC;
        write!(
            f,
            "{}:{:02}:{:02}.{:09}",
            secs / 3600,
            (secs / 60) % 60,
            secs % 60,
            self.0 % NSEC_PER_SEC
        )
    }
}

/// Horizontal position with uncertainties
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Latitude in degrees, positive north
    pub latitude: f64,
    /// Latitude uncertainty (meters)
    pub epy: f64,
    /// Longitude in degrees, positive east
    pub longitude: f64,
    /// Longitude uncertainty (meters)
    pub epx: f64,
}

impl Position {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            epy: f64::NAN,
            longitude,
            epx: f64::NAN,
        }
    }

    pub fn with_uncertainty(mut self, epy: f64, epx: f64) -> Self {
        self.epy = epy;
        self.epx = epx;
        self
    }

    pub fn unknown() -> Self {
        Self::new(f64::NAN, f64::NAN)
    }
}

/// Course and speed over ground with uncertainties
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Motion {
    /// Course made good, degrees from true north
    pub track: f64,
    /// Track uncertainty (degrees)
    pub epd: f64,
    /// Speed over ground (m/s)
    pub speed: f64,
    /// Speed uncertainty (m/s)
    pub eps: f64,
}

impl Motion {
    pub fn new(track: f64, speed: f64) -> Self {
        Self {
            track,
            epd: f64::NAN,
            speed,
            eps: f64::NAN,
        }
    }

    pub fn with_uncertainty(mut self, epd: f64, eps: f64) -> Self {
        self.epd = epd;
        self.eps = eps;
        self
    }

    pub fn unknown() -> Self {
        Self::new(f64::NAN, f64::NAN)
    }
}

/// Altitude and climb rate with uncertainties
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Altitude {
    /// Altitude (meters)
    pub altitude: f64,
    /// Vertical position uncertainty (meters)
    pub epv: f64,
    /// Vertical speed (m/s)
    pub climb: f64,
    /// Vertical speed uncertainty (m/s)
    pub epc: f64,
}

impl Altitude {
    pub fn new(altitude: f64, climb: f64) -> Self {
        Self {
            altitude,
            epv: f64::NAN,
            climb,
            epc: f64::NAN,
        }
    }

    pub fn with_uncertainty(mut self, epv: f64, epc: f64) -> Self {
        self.epv = epv;
        self.epc = epc;
        self
    }

    pub fn unknown() -> Self {
        Self::new(f64::NAN, f64::NAN)
    }
}

/// One positioning sample as delivered by the daemon.
///
/// Fields above the record's [`FixMode`] tier are never stored, so the
/// accessors return `None` for them instead of stale or undefined data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixRecord {
    mode: FixMode,
    time: f64,
    ept: f64,
    position: Option<Position>,
    motion: Option<Motion>,
    altitude: Option<Altitude>,
}

impl FixRecord {
    /// Size of the binary encoding in `processing::codec`
    pub const ENCODED_LEN: usize = crate::processing::codec::ENCODED_LEN;

    /// Record for a mode the daemon has not reported yet
    pub fn not_seen() -> Self {
        Self {
            mode: FixMode::NotSeen,
            time: 0.0,
            ept: f64::NAN,
            position: None,
            motion: None,
            altitude: None,
        }
    }

    pub fn no_fix(time: f64) -> Self {
        Self {
            mode: FixMode::NoFix,
            time,
            ..Self::not_seen()
        }
    }

    pub fn fix_2d(time: f64, position: Position, motion: Motion) -> Self {
        Self {
            mode: FixMode::Fix2D,
            time,
            ept: f64::NAN,
            position: Some(position),
            motion: Some(motion),
            altitude: None,
        }
    }

    pub fn fix_3d(time: f64, position: Position, motion: Motion, altitude: Altitude) -> Self {
        Self {
            mode: FixMode::Fix3D,
            altitude: Some(altitude),
            ..Self::fix_2d(time, position, motion)
        }
    }

    /// Build a record from a full set of fields, keeping only those the
    /// mode makes meaningful
    pub fn from_parts(
        mode: FixMode,
        time: f64,
        ept: f64,
        position: Position,
        motion: Motion,
        altitude: Altitude,
    ) -> Self {
        Self {
            mode,
            time,
            ept,
            position: mode.has_position().then_some(position),
            motion: mode.has_position().then_some(motion),
            altitude: mode.has_altitude().then_some(altitude),
        }
    }

    pub fn with_time_uncertainty(mut self, ept: f64) -> Self {
        self.ept = ept;
        self
    }

    pub fn mode(&self) -> FixMode {
        self.mode
    }

    /// Capture time in seconds since the Unix epoch
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Expected time uncertainty (seconds)
    pub fn time_uncertainty(&self) -> f64 {
        self.ept
    }

    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    pub fn motion(&self) -> Option<&Motion> {
        self.motion.as_ref()
    }

    pub fn altitude(&self) -> Option<&Altitude> {
        self.altitude.as_ref()
    }
}

impl Default for FixRecord {
    fn default() -> Self {
        Self::not_seen()
    }
}
