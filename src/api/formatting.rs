//! Human-readable and JSON renderings of fix records

use crate::core::{Altitude, FixMode, FixRecord, Motion, Position};
use chrono::{Local, TimeZone};
use serde::Serialize;
use std::fmt::Write;

/// Render Unix seconds the way ctime(3) does, without the newline
pub fn ctime(timestamp: f64) -> Option<String> {
    if !timestamp.is_finite() {
        return None;
    }
    Local
        .timestamp_opt(timestamp.trunc() as i64, 0)
        .single()
        .map(|t| t.format("%a %b %e %H:%M:%S %Y").to_string())
}

/// Labelled field-per-line dump
#[derive(Debug, Clone, Copy, Default)]
pub struct TextFormatter;

impl TextFormatter {
    pub fn new() -> Self {
        Self
    }

    /// Fields the fix's mode makes meaningful, one per line. Records
    /// whose mode was never seen render as nothing.
    pub fn format_fix(&self, fix: &FixRecord) -> String {
        let mut output = String::new();
        if fix.mode() == FixMode::NotSeen {
            return output;
        }

        match ctime(fix.time()) {
            Some(time) => field_line(&mut output, "time", time),
            None => field_line(&mut output, "time", "invalid"),
        }
        field_line(&mut output, "expected time uncertainty", fix.time_uncertainty());

        if let Some(position) = fix.position() {
            field_line(&mut output, "latitude (degrees)", position.latitude);
            field_line(&mut output, "latitude position uncertainty (meters)", position.epy);
            field_line(&mut output, "longitude (degrees)", position.longitude);
            field_line(&mut output, "longitude position uncertainty (meters)", position.epx);
        }

        if let Some(motion) = fix.motion() {
            field_line(&mut output, "course made good (relative to true north)", motion.track);
            field_line(&mut output, "track uncertainty (degrees)", motion.epd);
            field_line(&mut output, "speed over ground, (m/s)", motion.speed);
            field_line(&mut output, "speed uncertainty, (m/s)", motion.eps);
        }

        if let Some(altitude) = fix.altitude() {
            field_line(&mut output, "altitude (meters)", altitude.altitude);
            field_line(&mut output, "vertical position uncertainty (meters)", altitude.epv);
            field_line(&mut output, "vertical speed, (m/s)", altitude.climb);
            field_line(&mut output, "vertical speed uncertainty", altitude.epc);
        }

        output
    }
}

fn field_line(output: &mut String, label: &str, value: impl std::fmt::Display) {
    // Writing to a String cannot fail
    let _ = writeln!(output, "{}: {}", label, value);
}

/// Serializable view of a fix; absent tiers are omitted and unknown
/// values become null
#[derive(Debug, Serialize)]
pub struct FixReport<'a> {
    pub mode: FixMode,
    pub time: f64,
    pub ept: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<&'a Position>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub motion: Option<&'a Motion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub altitude: Option<&'a Altitude>,
}

impl<'a> From<&'a FixRecord> for FixReport<'a> {
    fn from(fix: &'a FixRecord) -> Self {
        Self {
            mode: fix.mode(),
            time: fix.time(),
            ept: fix.time_uncertainty(),
            position: fix.position(),
            motion: fix.motion(),
            altitude: fix.altitude(),
        }
    }
}

/// JSON formatter for structured output
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormatter {
    /// Pretty print JSON
    pub pretty: bool,
}

impl JsonFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pretty() -> Self {
        Self { pretty: true }
    }

    pub fn format_json(&self, fix: &FixRecord) -> Result<String, serde_json::Error> {
        let report = FixReport::from(fix);
        if self.pretty {
            serde_json::to_string_pretty(&report)
        } else {
            serde_json::to_string(&report)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fix_3d() -> FixRecord {
        FixRecord::fix_3d(
            1_493_640_000.0,
            Position::new(37.0, -122.0).with_uncertainty(4.0, 3.0),
            Motion::new(90.0, 1.5),
            Altitude::new(12.5, 0.0),
        )
        .with_time_uncertainty(0.005)
    }

    #[test]
    fn test_not_seen_renders_nothing() {
        assert_eq!(TextFormatter::new().format_fix(&FixRecord::not_seen()), "");
    }

    #[test]
    fn test_fields_follow_mode() {
        let formatter = TextFormatter::new();

        let no_fix = formatter.format_fix(&FixRecord::no_fix(1_493_640_000.0));
        assert!(no_fix.starts_with("time: "));
        assert!(no_fix.contains("expected time uncertainty: NaN\n"));
        assert!(!no_fix.contains("latitude"));

        let text = formatter.format_fix(&fix_3d());
        assert!(text.contains("expected time uncertainty: 0.005\n"));
        assert!(text.contains("latitude (degrees): 37\n"));
        assert!(text.contains("longitude (degrees): -122\n"));
        assert!(text.contains("speed over ground, (m/s): 1.5\n"));
        assert!(text.contains("altitude (meters): 12.5\n"));
        assert_eq!(text.lines().count(), 14);

        let fix_2d = FixRecord::fix_2d(0.0, Position::new(1.0, 2.0), Motion::new(3.0, 4.0));
        assert_eq!(formatter.format_fix(&fix_2d).lines().count(), 10);
    }

    #[test]
    fn test_ctime_shape() {
        let text = ctime(1_493_640_000.0).unwrap();
        // e.g. "Mon May  1 12:00:00 2017"
        assert_eq!(text.len(), 24);
        assert!(text.ends_with("2017"));
        assert_eq!(ctime(f64::NAN), None);
    }

    #[test]
    fn test_json_omits_missing_tiers() {
        let json = JsonFormatter::new().format_json(&FixRecord::no_fix(5.0)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["mode"], "NoFix");
        assert_eq!(value["time"], 5.0);
        assert!(value["ept"].is_null());
        assert!(value.get("position").is_none());

        let json = JsonFormatter::pretty().format_json(&fix_3d()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["position"]["latitude"], 37.0);
        assert_eq!(value["altitude"]["altitude"], 12.5);
        assert!(value["altitude"]["epv"].is_null());
    }
}
