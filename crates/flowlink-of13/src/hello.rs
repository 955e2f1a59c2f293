//! Hello and its version-bitmap elements.

use flowlink_wire::{Codec, Cursor, Result, WireError, Writer, padded8};

const OFPHET_VERSIONBITMAP: u16 = 1;

/// Hello message body: a list of hello elements.
///
/// An empty body is legal and common; the version-bitmap element lets peers
/// agree on the highest shared version instead of the sender's header
/// version.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Hello {
    /// Hello elements in wire order.
    pub elements: Vec<HelloElem>,
}

impl Hello {
    /// Hello advertising exactly the given wire versions via a bitmap.
    #[must_use]
    pub fn with_versions(versions: &[u8]) -> Self {
        let mut bitmaps = vec![0u32];
        for &v in versions {
            let word = usize::from(v / 32);
            if bitmaps.len() <= word {
                bitmaps.resize(word + 1, 0);
            }
            bitmaps[word] |= 1 << (v % 32);
        }
        Self { elements: vec![HelloElem::VersionBitmap(bitmaps)] }
    }

    /// Whether the peer's hello admits the given wire version.
    ///
    /// With no bitmap element the only signal is the header version, which
    /// the caller compares itself; this returns `None` in that case.
    #[must_use]
    pub fn supports_version(&self, version: u8) -> Option<bool> {
        for elem in &self.elements {
            if let HelloElem::VersionBitmap(bitmaps) = elem {
                let word = usize::from(version / 32);
                let bit = version % 32;
                return Some(bitmaps.get(word).is_some_and(|w| w & (1 << bit) != 0));
            }
        }
        None
    }
}

/// One hello element TLV. `length` excludes the tail padding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HelloElem {
    /// Supported-versions bitmap: bit `n` of word `n / 32` set when wire
    /// version `n` is spoken.
    VersionBitmap(Vec<u32>),
    /// Unrecognized element, preserved raw.
    Unknown {
        /// Element type.
        elem_type: u16,
        /// Value bytes (padding excluded).
        data: Vec<u8>,
    },
}

impl Codec for HelloElem {
    fn wire_len(&self) -> usize {
        padded8(4 + match self {
            Self::VersionBitmap(bitmaps) => 4 * bitmaps.len(),
            Self::Unknown { data, .. } => data.len(),
        })
    }

    fn encode(&self, w: &mut Writer) -> Result<()> {
        let (ty, body_len) = match self {
            Self::VersionBitmap(bitmaps) => (OFPHET_VERSIONBITMAP, 4 * bitmaps.len()),
            Self::Unknown { elem_type, data } => (*elem_type, data.len()),
        };
        if 4 + body_len > usize::from(u16::MAX) {
            return Err(WireError::Encode("hello element exceeds u16 length"));
        }
        w.put_u16(ty);
        w.put_u16((4 + body_len) as u16);
        match self {
            Self::VersionBitmap(bitmaps) => {
                for bitmap in bitmaps {
                    w.put_u32(*bitmap);
                }
            },
            Self::Unknown { data, .. } => w.put_slice(data),
        }
        w.align8();
        Ok(())
    }

    fn decode(cur: &mut Cursor<'_>) -> Result<Self> {
        let ty = cur.read_u16()?;
        let len = cur.read_u16()? as usize;
        let mut body = cur.subcursor(len, 4)?;

        let elem = match ty {
            OFPHET_VERSIONBITMAP => {
                if body.remaining() % 4 != 0 {
                    return Err(WireError::Invariant("version bitmap length not a multiple of 4"));
                }
                let mut bitmaps = Vec::with_capacity(body.remaining() / 4);
                while !body.is_empty() {
                    bitmaps.push(body.read_u32()?);
                }
                Self::VersionBitmap(bitmaps)
            },
            other => Self::Unknown { elem_type: other, data: body.rest().to_vec() },
        };

        cur.skip_align8()?;
        Ok(elem)
    }
}

impl Codec for Hello {
    fn wire_len(&self) -> usize {
        self.elements.iter().map(Codec::wire_len).sum()
    }

    fn encode(&self, w: &mut Writer) -> Result<()> {
        for elem in &self.elements {
            elem.encode(w)?;
        }
        Ok(())
    }

    fn decode(cur: &mut Cursor<'_>) -> Result<Self> {
        let mut elements = Vec::new();
        while !cur.is_empty() {
            elements.push(HelloElem::decode(cur)?);
        }
        Ok(Self { elements })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowlink_wire::{decode_from_slice, encode_to_vec};

    #[test]
    fn version_bitmap_layout() {
        let hello = Hello::with_versions(&[4, 6]);
        let bytes = encode_to_vec(&hello).unwrap();
        // type=1 len=8, bitmap with bits 4 and 6.
        assert_eq!(bytes, [0x00, 0x01, 0x00, 0x08, 0x00, 0x00, 0x00, 0x50]);
        assert_eq!(hello.supports_version(4), Some(true));
        assert_eq!(hello.supports_version(5), Some(false));
        assert_eq!(hello.supports_version(6), Some(true));
    }

    #[test]
    fn empty_hello() {
        let hello = Hello::default();
        assert_eq!(hello.wire_len(), 0);
        assert_eq!(hello.supports_version(4), None);
        let back: Hello = decode_from_slice(&[]).unwrap();
        assert_eq!(back, hello);
    }

    #[test]
    fn unknown_element_round_trips() {
        let bytes = [0x00, 0x09, 0x00, 0x07, 0xA, 0xB, 0xC, 0x00];
        let hello: Hello = decode_from_slice(&bytes).unwrap();
        assert!(matches!(&hello.elements[0], HelloElem::Unknown { elem_type: 9, data } if data == &[0xA, 0xB, 0xC]));
        assert_eq!(encode_to_vec(&hello).unwrap(), bytes);
    }
}
