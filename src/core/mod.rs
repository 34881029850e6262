//! Core types and constants for the gpsd source

pub mod types;
pub mod constants;

pub use types::*;
pub use constants::*;
