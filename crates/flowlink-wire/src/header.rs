//! The 8-byte OpenFlow common header.
//!
//! `version(u8) type(u8) length(u16) xid(u32)`, big-endian. `length` covers
//! the full message including this header and is the authoritative frame
//! boundary: the framing reader trusts it and never the socket's
//! segmentation. The zerocopy layout lets the reader borrow the header
//! straight out of a receive buffer.

use zerocopy::{
    FromBytes, Immutable, IntoBytes, KnownLayout,
    byteorder::big_endian::{U16, U32},
};

use crate::error::{Result, WireError};

/// Fixed 8-byte header preceding every OpenFlow message.
#[repr(C)]
#[derive(Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
pub struct Header {
    version: u8,
    msg_type: u8,
    length: U16,
    xid: U32,
}

impl Header {
    /// Serialized size of the header.
    pub const SIZE: usize = 8;

    /// Build a header. `length` must already include these 8 bytes.
    #[must_use]
    pub fn new(version: u8, msg_type: u8, length: u16, xid: u32) -> Self {
        Self { version, msg_type, length: U16::new(length), xid: U32::new(xid) }
    }

    /// Borrow a header from the front of `bytes` (zero-copy).
    ///
    /// Validates only structure: at least 8 bytes present and a `length`
    /// that covers the header itself. Version checking belongs to the
    /// per-version catalogs.
    pub fn from_bytes(bytes: &[u8]) -> Result<&Self> {
        let header = Self::ref_from_prefix(bytes)
            .map_err(|_| WireError::Truncated { needed: Self::SIZE, remaining: bytes.len() })?
            .0;

        if (header.length.get() as usize) < Self::SIZE {
            return Err(WireError::Invariant("header length shorter than the header itself"));
        }

        Ok(header)
    }

    /// Serialize to an owned array.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut arr = [0u8; Self::SIZE];
        arr.copy_from_slice(self.as_bytes());
        arr
    }

    /// Wire version byte (4 = OpenFlow 1.3, 6 = OpenFlow 1.5).
    #[must_use]
    pub fn version(&self) -> u8 {
        self.version
    }

    /// Message type byte.
    #[must_use]
    pub fn msg_type(&self) -> u8 {
        self.msg_type
    }

    /// Total message length including this header.
    #[must_use]
    pub fn length(&self) -> u16 {
        self.length.get()
    }

    /// Transaction id correlating replies with requests.
    #[must_use]
    pub fn xid(&self) -> u32 {
        self.xid.get()
    }

    /// Replace the transaction id.
    pub fn set_xid(&mut self, xid: u32) {
        self.xid = U32::new(xid);
    }

    /// Replace the total length.
    pub fn set_length(&mut self, length: u16) {
        self.length = U16::new(length);
    }
}

impl std::fmt::Debug for Header {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Header")
            .field("version", &self.version())
            .field("msg_type", &self.msg_type())
            .field("length", &self.length())
            .field("xid", &format_args!("{:#010x}", self.xid()))
            .finish()
    }
}

impl PartialEq for Header {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes()
    }
}

impl Eq for Header {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_size() {
        assert_eq!(std::mem::size_of::<Header>(), Header::SIZE);
    }

    #[test]
    fn header_round_trip() {
        let header = Header::new(4, 10, 42, 0xDEAD_BEEF);
        let bytes = header.to_bytes();
        assert_eq!(bytes, [0x04, 0x0A, 0x00, 0x2A, 0xDE, 0xAD, 0xBE, 0xEF]);

        let parsed = Header::from_bytes(&bytes).unwrap();
        assert_eq!(parsed.version(), 4);
        assert_eq!(parsed.msg_type(), 10);
        assert_eq!(parsed.length(), 42);
        assert_eq!(parsed.xid(), 0xDEAD_BEEF);
    }

    #[test]
    fn reject_short_buffer() {
        let err = Header::from_bytes(&[4, 0, 0]).unwrap_err();
        assert_eq!(err, WireError::Truncated { needed: 8, remaining: 3 });
    }

    #[test]
    fn reject_length_below_header_size() {
        let bytes = [0x04, 0x00, 0x00, 0x07, 0, 0, 0, 0];
        assert!(Header::from_bytes(&bytes).is_err());
    }
}
