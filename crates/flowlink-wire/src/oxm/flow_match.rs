//! The OXM match structure.

use crate::{Codec, Cursor, Result, WireError, Writer, padded8};

use super::MatchField;

/// OXM match type. `STANDARD` (0) is deprecated and rejected.
const OFPMT_OXM: u16 = 1;

/// An ordered list of match fields with the OXM match framing:
/// `type(u16) length(u16)` followed by the field TLVs, zero-padded to 8.
/// `length` covers type, length, and fields, but not the padding.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Match {
    /// Match fields in wire order.
    pub fields: Vec<MatchField>,
}

impl Match {
    /// Empty match (matches everything).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field, keeping wire order.
    pub fn push(&mut self, field: MatchField) {
        self.fields.push(field);
    }

    /// First field with the given class and field number.
    #[must_use]
    pub fn get(&self, class: u16, field: u8) -> Option<&MatchField> {
        self.fields.iter().find(|f| f.class() == class && f.field() == field)
    }

    /// Length of the type/length/fields section, excluding tail padding.
    #[must_use]
    pub fn body_len(&self) -> usize {
        4 + self.fields.iter().map(Codec::wire_len).sum::<usize>()
    }

    /// Canonical bytes for use as a flow-table key.
    ///
    /// Fields are sorted by `(class, field, has_mask)` and serialized with
    /// masks included; two matches that differ only in field order produce
    /// the same key. Not a wire format.
    #[must_use]
    pub fn canonical_key(&self) -> Vec<u8> {
        let mut sorted: Vec<&MatchField> = self.fields.iter().collect();
        sorted.sort_by_key(|f| (f.class(), f.field(), f.has_mask()));

        let mut w = Writer::new();
        for field in sorted {
            // Encoding a validated field cannot fail.
            let _ = field.encode(&mut w);
        }
        w.freeze().to_vec()
    }
}

impl Codec for Match {
    fn wire_len(&self) -> usize {
        padded8(self.body_len())
    }

    fn encode(&self, w: &mut Writer) -> Result<()> {
        let body_len = self.body_len();
        if body_len > usize::from(u16::MAX) {
            return Err(WireError::Encode("match exceeds u16 length"));
        }
        w.put_u16(OFPMT_OXM);
        w.put_u16(body_len as u16);
        for field in &self.fields {
            field.encode(w)?;
        }
        w.align8();
        Ok(())
    }

    fn decode(cur: &mut Cursor<'_>) -> Result<Self> {
        let match_type = cur.read_u16()?;
        if match_type != OFPMT_OXM {
            return Err(WireError::UnknownDiscriminant {
                family: "match type",
                value: u32::from(match_type),
            });
        }

        let length = cur.read_u16()? as usize;
        let mut body = cur.subcursor(length, 4)?;

        let mut fields = Vec::new();
        while !body.is_empty() {
            fields.push(MatchField::decode(&mut body)?);
        }

        // Padding belongs to the match but not to its length field.
        cur.skip_align8()?;

        Ok(Self { fields })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oxm::{CLASS_OPENFLOW_BASIC, consts::basic};
    use crate::{decode_from_slice, encode_to_vec};

    #[test]
    fn empty_match_is_eight_bytes() {
        let m = Match::new();
        let bytes = encode_to_vec(&m).unwrap();
        // type=1, length=4, four bytes of pad.
        assert_eq!(bytes, [0x00, 0x01, 0x00, 0x04, 0, 0, 0, 0]);
        let back: Match = decode_from_slice(&bytes).unwrap();
        assert!(back.fields.is_empty());
    }

    #[test]
    fn match_round_trip_with_padding() {
        let mut m = Match::new();
        m.push(MatchField::in_port(1));
        m.push(MatchField::eth_type(0x0800));
        // body = 4 + 8 + 6 = 18, padded to 24.
        assert_eq!(m.body_len(), 18);
        let bytes = encode_to_vec(&m).unwrap();
        assert_eq!(bytes.len(), 24);
        assert_eq!(m.wire_len(), 24);
        assert_eq!(&bytes[18..], &[0u8; 6]);

        let back: Match = decode_from_slice(&bytes).unwrap();
        assert_eq!(back, m);
    }

    #[test]
    fn rejects_standard_match_type() {
        let bytes = [0x00, 0x00, 0x00, 0x04, 0, 0, 0, 0];
        let err = decode_from_slice::<Match>(&bytes).unwrap_err();
        assert_eq!(err, WireError::UnknownDiscriminant { family: "match type", value: 0 });
    }

    #[test]
    fn length_bounds_field_parsing() {
        // Declared length of 4 but a field TLV follows: the field bytes must
        // not be consumed as part of this match.
        let mut bytes = vec![0x00, 0x01, 0x00, 0x04, 0, 0, 0, 0];
        bytes.extend_from_slice(&[0x80, 0x00, 0x00, 0x04, 0, 0, 0, 1]);
        let mut cur = Cursor::new(&bytes);
        let m = Match::decode(&mut cur).unwrap();
        assert!(m.fields.is_empty());
        assert_eq!(cur.remaining(), 8);
    }

    #[test]
    fn canonical_key_is_order_independent() {
        let mut a = Match::new();
        a.push(MatchField::in_port(1));
        a.push(MatchField::eth_type(0x0806));

        let mut b = Match::new();
        b.push(MatchField::eth_type(0x0806));
        b.push(MatchField::in_port(1));

        assert_eq!(a.canonical_key(), b.canonical_key());
    }

    #[test]
    fn canonical_key_distinguishes_masks() {
        let mut a = Match::new();
        a.push(MatchField::metadata(7, None));
        let mut b = Match::new();
        b.push(MatchField::metadata(7, Some(0xFF)));
        assert_ne!(a.canonical_key(), b.canonical_key());
    }

    #[test]
    fn get_finds_field() {
        let mut m = Match::new();
        m.push(MatchField::in_port(9));
        let f = m.get(CLASS_OPENFLOW_BASIC, basic::IN_PORT).unwrap();
        assert_eq!(f.value_u64(), Some(9));
        assert!(m.get(CLASS_OPENFLOW_BASIC, basic::ETH_TYPE).is_none());
    }
}
