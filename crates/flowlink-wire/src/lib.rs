//! Codec primitives and shared wire families for OpenFlow 1.3 and 1.5.
//!
//! The per-version message catalogs (`flowlink-of13`, `flowlink-of15`) sit on
//! top of this crate. It provides:
//!
//! - a bounded big-endian [`Cursor`]/[`Writer`] pair with the pad-to-8
//!   arithmetic OpenFlow structures need,
//! - the fixed 8-byte common [`Header`],
//! - the wire families whose encodings are byte-identical in 1.3.5 and
//!   1.5.1: OXM/NXM match fields ([`oxm`]), actions including the Nicira
//!   experimenter set ([`action`]), instructions ([`instruction`]), and meter
//!   bands ([`meter`]).
//!
//! Everything that crosses the wire implements [`Codec`]: a length that is
//! computable before marshalling, a marshal into a [`Writer`], and a
//! length-bounded unmarshal from a [`Cursor`]. `decode(encode(x)) == x`, and
//! `encode` writes exactly `wire_len()` bytes.

pub mod action;
pub mod cursor;
pub mod error;
pub mod header;
pub mod instruction;
pub mod meter;
pub mod oxm;
pub mod writer;

pub use cursor::Cursor;
pub use error::{Result, WireError};
pub use header::Header;
pub use writer::{Writer, pad8, padded8};

/// Maximum nesting depth for recursive decoders (actions inside NX conntrack,
/// messages inside bundle-add). Exceeding it fails the parse rather than the
/// stack.
pub const DEPTH_LIMIT: usize = 16;

/// OpenFlow versions this library speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Version {
    /// OpenFlow 1.3 (wire value 4).
    OpenFlow13,
    /// OpenFlow 1.5 (wire value 6).
    OpenFlow15,
}

impl Version {
    /// Decode the header version byte.
    pub fn from_wire(byte: u8) -> Result<Self> {
        match byte {
            4 => Ok(Self::OpenFlow13),
            6 => Ok(Self::OpenFlow15),
            other => Err(WireError::UnsupportedVersion(other)),
        }
    }

    /// The header version byte.
    #[must_use]
    pub fn wire(self) -> u8 {
        match self {
            Self::OpenFlow13 => 4,
            Self::OpenFlow15 => 6,
        }
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OpenFlow13 => write!(f, "1.3"),
            Self::OpenFlow15 => write!(f, "1.5"),
        }
    }
}

/// Marshal/unmarshal/length for a wire structure.
///
/// `wire_len` includes headers, nested TLVs, and any pad-to-8 bytes the
/// format requires, so parents can size and write their own length fields
/// before marshalling children.
pub trait Codec: Sized {
    /// Byte length this value occupies on the wire.
    fn wire_len(&self) -> usize;

    /// Serialize into `w`. Writes exactly [`Codec::wire_len`] bytes.
    fn encode(&self, w: &mut Writer) -> Result<()>;

    /// Parse from the cursor, consuming exactly the structure's bytes.
    fn decode(cur: &mut Cursor<'_>) -> Result<Self>;
}

/// Encode a value into a fresh buffer.
pub fn encode_to_vec<T: Codec>(value: &T) -> Result<Vec<u8>> {
    let mut w = Writer::new();
    value.encode(&mut w)?;
    debug_assert_eq!(w.len(), value.wire_len());
    Ok(w.freeze().to_vec())
}

/// Decode a value from a slice, requiring full consumption.
pub fn decode_from_slice<T: Codec>(bytes: &[u8]) -> Result<T> {
    let mut cur = Cursor::new(bytes);
    let value = T::decode(&mut cur)?;
    if !cur.is_empty() {
        return Err(WireError::Invariant("trailing bytes after structure"));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_wire_values() {
        assert_eq!(Version::from_wire(4).unwrap(), Version::OpenFlow13);
        assert_eq!(Version::from_wire(6).unwrap(), Version::OpenFlow15);
        assert_eq!(Version::OpenFlow13.wire(), 4);
        assert_eq!(Version::OpenFlow15.wire(), 6);
    }

    #[test]
    fn version_rejects_others() {
        for byte in [0u8, 1, 2, 3, 5, 7, 0xFF] {
            assert_eq!(Version::from_wire(byte), Err(WireError::UnsupportedVersion(byte)));
        }
    }
}
