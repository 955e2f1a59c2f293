//! Codec error kinds.
//!
//! Every unmarshal path returns one of these instead of panicking. Parse
//! errors never carry partial values: a failed decode leaves the caller with
//! the original bytes and an error describing what went wrong.

use thiserror::Error;

/// Errors produced while encoding or decoding wire structures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    /// Unmarshal hit end-of-buffer before completing a field.
    #[error("truncated input: needed {needed} bytes, {remaining} remaining")]
    Truncated {
        /// Bytes the current field required.
        needed: usize,
        /// Bytes left in the cursor.
        remaining: usize,
    },

    /// A type code, class/field pair, or vendor subtype was not recognized.
    ///
    /// For closed families this is fatal to the containing message; for
    /// extensible families the caller keeps the raw bytes and may skip.
    #[error("unknown {family} discriminant {value:#x}")]
    UnknownDiscriminant {
        /// Which discriminant family failed (e.g. "action type").
        family: &'static str,
        /// The unrecognized wire value.
        value: u32,
    },

    /// A structure was recognized but self-contradictory, e.g. a length
    /// header disagreeing with contained TLVs or a masked field whose
    /// serialized length is not twice the value length.
    #[error("invariant violation: {0}")]
    Invariant(&'static str),

    /// A contained value could not be marshalled.
    #[error("encode failed: {0}")]
    Encode(&'static str),

    /// The version byte names an OpenFlow version this library does not speak.
    #[error("unsupported OpenFlow version {0:#04x}")]
    UnsupportedVersion(u8),

    /// A recursive structure (nested actions, bundled messages) exceeded the
    /// parse depth cap.
    #[error("nested structure exceeds depth limit {0}")]
    DepthExceeded(usize),
}

/// Result alias used throughout the codec.
pub type Result<T> = core::result::Result<T, WireError>;
