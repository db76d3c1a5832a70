//! Conversion failures surfaced at the engine call boundary
//!
//! Every variant except `NoStructuralMatch` is raised at the point of
//! detection. `NoStructuralMatch` only appears once the outermost resolver has
//! run out of alternatives; inner resolver stages report "no match" as
//! `Ok(None)` instead.

use std::fmt;
use thiserror::Error;

/// Direction of a conversion across the engine boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Engine value -> native sequence
    Decode,
    /// Native sequence -> engine value
    Encode,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decode => write!(f, "from an engine value"),
            Self::Encode => write!(f, "into an engine value"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    /// The value does not expose the buffer or typed-view accessor required
    #[error("bufbridge<{expected}>::decode expects {expected} object")]
    TypeMismatch { expected: &'static str },

    /// A typed view reported an element width other than the target's
    #[error("bufbridge<{expected}>::decode expects a buffer of size {expected_width}, found {found_width}")]
    WidthMismatch {
        expected: &'static str,
        expected_width: usize,
        found_width: usize,
    },

    /// Untyped decode found no backing memory
    #[error("bufbridge<ArrayBuffer>::decode expects ArrayBuffer object with backing storage")]
    NoBufferPresent,

    /// Aliasing sequences never go back into the engine; owning ones never come out of it
    #[error("cannot convert {type_name} {direction}")]
    UnsupportedDirection {
        type_name: &'static str,
        direction: Direction,
    },

    /// Every alternative of a buffer union was tried and none matched
    #[error("value matches none of: {candidates}")]
    NoStructuralMatch { candidates: String },

    /// Engine memory is not aligned for the element type
    #[error("bufbridge<{type_name}>::decode requires {align}-byte aligned storage")]
    Misaligned { type_name: &'static str, align: usize },
}

impl ConversionError {
    /// Short machine-readable tag, used as a structured logging field
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::TypeMismatch { .. } => "type_mismatch",
            Self::WidthMismatch { .. } => "width_mismatch",
            Self::NoBufferPresent => "no_buffer_present",
            Self::UnsupportedDirection { .. } => "unsupported_direction",
            Self::NoStructuralMatch { .. } => "no_structural_match",
            Self::Misaligned { .. } => "misaligned",
        }
    }
}

pub type ConversionResult<T> = Result<T, ConversionError>;
