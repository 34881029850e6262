//! Fixed-size binary encoding of fix records
//!
//! Layout, little-endian:
//!
//! | offset | size | field                       |
//! |--------|------|-----------------------------|
//! | 0      | 4    | mode (u32)                  |
//! | 4      | 4    | reserved, zero              |
//! | 8      | 8    | time                        |
//! | 16     | 8    | ept                         |
//! | 24     | 32   | latitude, epy, longitude, epx |
//! | 56     | 32   | track, epd, speed, eps      |
//! | 88     | 32   | altitude, epv, climb, epc   |
//!
//! Fields the mode does not cover are written as NaN and ignored on decode.

use crate::core::{Altitude, FixMode, FixRecord, Motion, Position};
use std::io::{self, ErrorKind, Read};
use thiserror::Error;

const HEADER_LEN: usize = 8;
const FIELD_COUNT: usize = 14;

/// Size in bytes of one encoded record
pub const ENCODED_LEN: usize = HEADER_LEN + FIELD_COUNT * 8;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("insufficient data: need {required} bytes, got {available}")]
    InsufficientData { required: usize, available: usize },
    #[error("invalid fix mode {0}")]
    InvalidMode(u32),
}

pub fn encode(fix: &FixRecord) -> [u8; ENCODED_LEN] {
    let position = fix.position().copied().unwrap_or_else(Position::unknown);
    let motion = fix.motion().copied().unwrap_or_else(Motion::unknown);
    let altitude = fix.altitude().copied().unwrap_or_else(Altitude::unknown);

    let fields: [f64; FIELD_COUNT] = [
        fix.time(),
        fix.time_uncertainty(),
        position.latitude,
        position.epy,
        position.longitude,
        position.epx,
        motion.track,
        motion.epd,
        motion.speed,
        motion.eps,
        altitude.altitude,
        altitude.epv,
        altitude.climb,
        altitude.epc,
    ];

    let mut out = [0u8; ENCODED_LEN];
    out[0..4].copy_from_slice(&(fix.mode() as u32).to_le_bytes());
    for (i, value) in fields.iter().enumerate() {
        let offset = HEADER_LEN + i * 8;
        out[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
    }
    out
}

pub fn decode(bytes: &[u8]) -> Result<FixRecord, CodecError> {
    if bytes.len() < ENCODED_LEN {
        return Err(CodecError::InsufficientData {
            required: ENCODED_LEN,
            available: bytes.len(),
        });
    }

    let mut raw_mode = [0u8; 4];
    raw_mode.copy_from_slice(&bytes[0..4]);
    let raw_mode = u32::from_le_bytes(raw_mode);
    let mode = u8::try_from(raw_mode)
        .ok()
        .and_then(FixMode::from_u8)
        .ok_or(CodecError::InvalidMode(raw_mode))?;

    let field = |i: usize| {
        let offset = HEADER_LEN + i * 8;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(&bytes[offset..offset + 8]);
        f64::from_le_bytes(raw)
    };

    Ok(FixRecord::from_parts(
        mode,
        field(0),
        field(1),
        Position {
            latitude: field(2),
            epy: field(3),
            longitude: field(4),
            epx: field(5),
        },
        Motion {
            track: field(6),
            epd: field(7),
            speed: field(8),
            eps: field(9),
        },
        Altitude {
            altitude: field(10),
            epv: field(11),
            climb: field(12),
            epc: field(13),
        },
    ))
}

/// Splits a byte stream into encoded records
pub struct RecordReader<R> {
    inner: R,
}

impl<R: Read> RecordReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Next full record, or `None` at a clean end of stream.
    ///
    /// A stream ending inside a record yields `UnexpectedEof`.
    pub fn next_record(&mut self) -> io::Result<Option<[u8; ENCODED_LEN]>> {
        let mut buf = [0u8; ENCODED_LEN];
        let mut filled = 0;
        while filled < ENCODED_LEN {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        match filled {
            0 => Ok(None),
            ENCODED_LEN => Ok(Some(buf)),
            partial => Err(io::Error::new(
                ErrorKind::UnexpectedEof,
                format!("truncated record: {} of {} bytes", partial, ENCODED_LEN),
            )),
        }
    }
}
