//! Native bundle messages (types 33 and 34).
//!
//! Unlike 1.3, bundles are first-class message types in 1.5. A commit must
//! be preceded by add messages carrying the same `bundle_id`.

use flowlink_wire::{Codec, Cursor, Result, WireError, Writer, pad8};

use crate::Message;

/// Bundle flag: apply atomically.
pub const OFPBF_ATOMIC: u16 = 1 << 0;
/// Bundle flag: preserve message order.
pub const OFPBF_ORDERED: u16 = 1 << 1;
/// Bundle flag: bundle at a scheduled time.
pub const OFPBF_TIME: u16 = 1 << 2;

/// Bundle control operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum BundleCtrlType {
    /// Open a bundle.
    OpenRequest = 0,
    /// Bundle opened.
    OpenReply = 1,
    /// Close a bundle.
    CloseRequest = 2,
    /// Bundle closed.
    CloseReply = 3,
    /// Commit a bundle.
    CommitRequest = 4,
    /// Bundle committed.
    CommitReply = 5,
    /// Discard a bundle.
    DiscardRequest = 6,
    /// Bundle discarded.
    DiscardReply = 7,
}

impl BundleCtrlType {
    /// Decode the wire value. The family is closed: unknown values are
    /// fatal to the message.
    pub fn from_wire(value: u16) -> Result<Self> {
        Ok(match value {
            0 => Self::OpenRequest,
            1 => Self::OpenReply,
            2 => Self::CloseRequest,
            3 => Self::CloseReply,
            4 => Self::CommitRequest,
            5 => Self::CommitReply,
            6 => Self::DiscardRequest,
            7 => Self::DiscardReply,
            other => {
                return Err(WireError::UnknownDiscriminant {
                    family: "bundle control type",
                    value: u32::from(other),
                });
            },
        })
    }
}

/// Bundle-control body: `bundle_id`, operation, flags, properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleControl {
    /// Bundle this operation addresses.
    pub bundle_id: u32,
    /// The operation.
    pub ctrl_type: BundleCtrlType,
    /// `OFPBF_*` bits.
    pub flags: u16,
    /// Raw bundle property TLVs, preserved as received.
    pub properties: Vec<u8>,
}

impl BundleControl {
    /// A property-less control message.
    #[must_use]
    pub fn new(bundle_id: u32, ctrl_type: BundleCtrlType, flags: u16) -> Self {
        Self { bundle_id, ctrl_type, flags, properties: Vec::new() }
    }
}

impl Codec for BundleControl {
    fn wire_len(&self) -> usize {
        8 + self.properties.len()
    }

    fn encode(&self, w: &mut Writer) -> Result<()> {
        w.put_u32(self.bundle_id);
        w.put_u16(self.ctrl_type as u16);
        w.put_u16(self.flags);
        w.put_slice(&self.properties);
        Ok(())
    }

    fn decode(cur: &mut Cursor<'_>) -> Result<Self> {
        let bundle_id = cur.read_u32()?;
        let ctrl_type = BundleCtrlType::from_wire(cur.read_u16()?)?;
        let flags = cur.read_u16()?;
        Ok(Self { bundle_id, ctrl_type, flags, properties: cur.rest().to_vec() })
    }
}

/// Bundle-add body: one complete message staged into a bundle, optionally
/// followed by properties (the inner message is then padded to 8).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleAdd {
    /// Bundle the message is staged into.
    pub bundle_id: u32,
    /// `OFPBF_*` bits.
    pub flags: u16,
    /// The staged message, with its own header.
    pub message: Message,
    /// Raw bundle property TLVs, preserved as received.
    pub properties: Vec<u8>,
}

impl BundleAdd {
    /// Body length after the message header.
    #[must_use]
    pub fn wire_len(&self) -> usize {
        let inner = self.message.wire_len();
        if self.properties.is_empty() {
            8 + inner
        } else {
            8 + inner + pad8(inner) + self.properties.len()
        }
    }

    /// Serialize the body.
    pub fn encode(&self, w: &mut Writer) -> Result<()> {
        w.put_u32(self.bundle_id);
        w.put_zeros(2);
        w.put_u16(self.flags);
        let inner = self.message.encode_to_bytes()?;
        w.put_slice(&inner);
        if !self.properties.is_empty() {
            w.put_zeros(pad8(inner.len()));
            w.put_slice(&self.properties);
        }
        Ok(())
    }

    /// Parse the body; `depth` guards recursive bundling.
    pub fn decode(cur: &mut Cursor<'_>, depth: usize) -> Result<Self> {
        let bundle_id = cur.read_u32()?;
        cur.skip(2)?;
        let flags = cur.read_u16()?;

        // The inner message's own header bounds it; anything beyond (past
        // the pad) is bundle properties.
        let inner_len = usize::from(cur.peek_u16(2)?);
        let inner = cur.read_bytes(inner_len)?;
        let message = Message::decode_with_depth(inner, depth + 1)?;

        let properties = if cur.is_empty() {
            Vec::new()
        } else {
            cur.skip(pad8(inner_len).min(cur.remaining()))?;
            cur.rest().to_vec()
        };

        Ok(Self { bundle_id, flags, message, properties })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Kind, Payload};
    use flowlink_wire::{decode_from_slice, encode_to_vec};

    #[test]
    fn bundle_control_payload_is_eight_bytes() {
        let ctrl = BundleControl::new(100, BundleCtrlType::OpenRequest, OFPBF_ATOMIC);
        let bytes = encode_to_vec(&ctrl).unwrap();
        assert_eq!(bytes, [0x00, 0x00, 0x00, 0x64, 0x00, 0x00, 0x00, 0x01]);
        assert_eq!(decode_from_slice::<BundleControl>(&bytes).unwrap(), ctrl);
    }

    #[test]
    fn full_control_message_is_sixteen_bytes() {
        let msg = Message::new(
            1,
            Payload::BundleControl(BundleControl::new(100, BundleCtrlType::OpenRequest, OFPBF_ATOMIC)),
        );
        let bytes = msg.encode_to_bytes().unwrap();
        assert_eq!(bytes.len(), 16);
        assert_eq!(bytes[1], Kind::BundleControl as u8);
        assert_eq!(Message::decode(&bytes).unwrap(), msg);
    }

    #[test]
    fn bundle_add_round_trip() {
        let inner = Message::new(3, Payload::BarrierRequest);
        let add = BundleAdd {
            bundle_id: 5,
            flags: OFPBF_ORDERED,
            message: inner,
            properties: Vec::new(),
        };
        let msg = Message::new(4, Payload::BundleAddMessage(Box::new(add)));
        let bytes = msg.encode_to_bytes().unwrap();
        assert_eq!(Message::decode(&bytes).unwrap(), msg);
    }

    #[test]
    fn bundle_add_with_properties_round_trip() {
        // An 11-byte inner message (echo with 3 data bytes) forces padding
        // before the property block.
        let inner = Message::new(3, Payload::EchoRequest(vec![1, 2, 3]));
        let add = BundleAdd {
            bundle_id: 5,
            flags: 0,
            message: inner,
            properties: vec![0xFF, 0xFF, 0x00, 0x0C, 0, 0, 0xBE, 0xEF, 1, 2, 3, 4],
        };
        let msg = Message::new(4, Payload::BundleAddMessage(Box::new(add)));
        let bytes = msg.encode_to_bytes().unwrap();
        assert_eq!(Message::decode(&bytes).unwrap(), msg);
    }
}
