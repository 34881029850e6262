//! Fix validation

pub mod fix;

pub use fix::{FixValidator, Rejection};
