//! Feedwatch Format — pure formatting and label mapping.
//!
//! Maps raw record values (amounts, status and type codes, instrument names,
//! timestamps) to the display strings used in notifications. Nothing here
//! performs I/O or holds state.

pub mod date;
pub mod digits;
pub mod labels;
pub mod number;

/// Rendered in place of a missing value.
pub const PLACEHOLDER: &str = "-";
