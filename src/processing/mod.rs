//! Fix acquisition and packaging

pub mod clock;
pub mod codec;
pub mod emitter;
pub mod reader;
pub mod timestamp;
pub mod wait;

pub use clock::{ManualClock, MonotonicClock, PipelineClock, SystemWallClock, WallClock};
pub use codec::{CodecError, RecordReader, ENCODED_LEN};
pub use emitter::{BufferEmitter, OutputUnit};
pub use reader::FixReader;
pub use timestamp::{compute_timestamp, unix_to_clock_time, Reconciled};
pub use wait::{UnlockHandle, Wake, WaitError, Wakeup};
