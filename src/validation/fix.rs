use crate::core::FixMode;
use crate::daemon::{GpsData, SessionStatus};
use std::fmt;

/// Reason a report is not emitted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The session reports no fix regardless of the mode
    SessionNoFix,
    /// The receiver has no fix
    NoFix,
    /// No mode has been reported yet
    NotSeen,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::SessionNoFix => write!(f, "session status is no fix"),
            Rejection::NoFix => write!(f, "mode is no fix"),
            Rejection::NotSeen => write!(f, "mode not seen"),
        }
    }
}

/// Decides whether a daemon report carries a usable fix
#[derive(Debug, Clone, Copy, Default)]
pub struct FixValidator;

impl FixValidator {
    pub fn new() -> Self {
        Self
    }

    pub fn check(&self, data: &GpsData) -> Result<(), Rejection> {
        if data.status == SessionStatus::NoFix {
            return Err(Rejection::SessionNoFix);
        }
        match data.fix.mode() {
            FixMode::NotSeen => Err(Rejection::NotSeen),
            FixMode::NoFix => Err(Rejection::NoFix),
            FixMode::Fix2D | FixMode::Fix3D => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Altitude, FixRecord, Motion, Position};

    #[test]
    fn test_rejects_reports_without_fix() {
        let validator = FixValidator::new();
        assert_eq!(
            validator.check(&GpsData::fix(FixRecord::not_seen())),
            Err(Rejection::NotSeen)
        );
        assert_eq!(
            validator.check(&GpsData::fix(FixRecord::no_fix(10.0))),
            Err(Rejection::NoFix)
        );
    }

    #[test]
    fn test_session_status_overrides_mode() {
        let fix = FixRecord::fix_3d(
            10.0,
            Position::new(1.0, 2.0),
            Motion::new(0.0, 0.0),
            Altitude::new(3.0, 0.0),
        );
        let validator = FixValidator::new();
        assert_eq!(
            validator.check(&GpsData::new(SessionStatus::NoFix, fix)),
            Err(Rejection::SessionNoFix)
        );
        assert!(validator.check(&GpsData::new(SessionStatus::DgpsFix, fix)).is_ok());
        assert!(validator.check(&GpsData::fix(fix)).is_ok());
    }
}
