//! Source element API
//!
//! [`GpsdSrc`] is the element a pipeline drives; the formatters render
//! its output for humans and tools.

pub mod formatting;
pub mod source;
pub mod types;

pub use formatting::{ctime, FixReport, JsonFormatter, TextFormatter};
pub use source::GpsdSrc;
pub use types::{ElementMetadata, SourceError, SourceResult, SourceStats, METADATA};
pub use crate::processing::wait::UnlockHandle;
