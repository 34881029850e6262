use crate::core::{ClockTime, FixRecord};
use crate::processing::codec;
use log::debug;

/// One emitted sample: a copy of the fix plus its stream timing
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutputUnit {
    fix: FixRecord,
    pts: ClockTime,
    offset: u64,
}

impl OutputUnit {
    pub fn fix(&self) -> &FixRecord {
        &self.fix
    }

    pub fn pts(&self) -> ClockTime {
        self.pts
    }

    /// Samples have no duration
    pub fn duration(&self) -> Option<ClockTime> {
        None
    }

    /// Position of the unit in the stream, counting from zero per session
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Payload in the fixed binary layout
    pub fn to_bytes(&self) -> Vec<u8> {
        codec::encode(&self.fix).to_vec()
    }

    pub fn into_fix(self) -> FixRecord {
        self.fix
    }
}

/// Packages reconciled fixes into output units
#[derive(Debug, Default)]
pub struct BufferEmitter {
    next_offset: u64,
}

impl BufferEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.next_offset = 0;
    }

    pub fn emit(&mut self, fix: &FixRecord, pts: ClockTime) -> OutputUnit {
        debug!("creating buffer {} with pts {}", self.next_offset, pts);
        let unit = OutputUnit {
            fix: *fix,
            pts,
            offset: self.next_offset,
        };
        self.next_offset += 1;
        unit
    }
}
