//! OXM/NXM extensible match encoding.
//!
//! A match field is a packed 4-byte header followed by a value and, when
//! masked, a mask of equal length:
//!
//! ```no_rust
//! +--------+--------+--------+--------+
//! |      class      | fld  |M| length |
//! +--------+--------+--------+--------+
//! |   value (length or length/2) ...  |
//! |   mask  (length/2 when M) ...     |
//! +--------+--------+--------+--------+
//! ```
//!
//! `fld` is the upper 7 bits of the third byte; `M` (`has_mask`) is its low
//! bit. `length` is the value length when unmasked and twice it when masked.
//! Both rules are enforced on decode and on construction, never silently
//! accepted.

pub mod consts;

mod field;
mod flow_match;

pub use field::MatchField;
pub use flow_match::Match;

use crate::{Codec, Cursor, Result, WireError, Writer};

/// OXM class: legacy Nicira match, bank 0.
pub const CLASS_NXM_0: u16 = 0x0000;
/// OXM class: Nicira extensible match, bank 1 (registers, conntrack, tunnel).
pub const CLASS_NXM_1: u16 = 0x0001;
/// OXM class: fields defined by the OpenFlow specification.
pub const CLASS_OPENFLOW_BASIC: u16 = 0x8000;
/// OXM class: packet registers (OpenFlow 1.5).
pub const CLASS_PACKET_REGS: u16 = 0x8001;
/// OXM class: experimenter-defined fields.
pub const CLASS_EXPERIMENTER: u16 = 0xFFFF;

/// A bodyless OXM header, as used in table-features property lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OxmId {
    /// OXM class.
    pub class: u16,
    /// 7-bit field number within the class.
    pub field: u8,
    /// Whether the id names the masked form of the field.
    pub has_mask: bool,
    /// Declared payload length.
    pub length: u8,
}

impl OxmId {
    /// The packed 4-byte header value.
    #[must_use]
    pub fn header(&self) -> u32 {
        pack_header(self.class, self.field, self.has_mask, self.length)
    }

    /// Unpack a 4-byte header value.
    pub fn from_header(header: u32) -> Result<Self> {
        let (class, field, has_mask, length) = unpack_header(header)?;
        Ok(Self { class, field, has_mask, length })
    }
}

impl Codec for OxmId {
    fn wire_len(&self) -> usize {
        4
    }

    fn encode(&self, w: &mut Writer) -> Result<()> {
        w.put_u32(self.header());
        Ok(())
    }

    fn decode(cur: &mut Cursor<'_>) -> Result<Self> {
        Self::from_header(cur.read_u32()?)
    }
}

pub(crate) fn pack_header(class: u16, field: u8, has_mask: bool, length: u8) -> u32 {
    (u32::from(class) << 16)
        | (u32::from(field & 0x7F) << 9)
        | (u32::from(has_mask) << 8)
        | u32::from(length)
}

pub(crate) fn unpack_header(header: u32) -> Result<(u16, u8, bool, u8)> {
    let class = (header >> 16) as u16;
    let field = ((header >> 9) & 0x7F) as u8;
    let has_mask = header & 0x100 != 0;
    let length = (header & 0xFF) as u8;
    if field > 0x7F {
        return Err(WireError::Invariant("oxm field exceeds 7 bits"));
    }
    Ok((class, field, has_mask, length))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_packing() {
        // OXM_OF_IN_PORT: class 0x8000, field 0, no mask, length 4.
        assert_eq!(pack_header(CLASS_OPENFLOW_BASIC, consts::basic::IN_PORT, false, 4), 0x8000_0004);
        // OXM_OF_ETH_DST masked: class 0x8000, field 3, mask, length 12.
        assert_eq!(
            pack_header(CLASS_OPENFLOW_BASIC, consts::basic::ETH_DST, true, 12),
            0x8000_070C
        );
    }

    #[test]
    fn header_unpacking() {
        let (class, field, has_mask, length) = unpack_header(0x8000_070C).unwrap();
        assert_eq!(class, CLASS_OPENFLOW_BASIC);
        assert_eq!(field, consts::basic::ETH_DST);
        assert!(has_mask);
        assert_eq!(length, 12);
    }

    #[test]
    fn oxm_id_round_trip() {
        let id =
            OxmId { class: CLASS_NXM_1, field: consts::nxm1::CT_STATE, has_mask: true, length: 8 };
        let bytes = crate::encode_to_vec(&id).unwrap();
        assert_eq!(bytes.len(), id.wire_len());
        let back: OxmId = crate::decode_from_slice(&bytes).unwrap();
        assert_eq!(back, id);
    }
}
