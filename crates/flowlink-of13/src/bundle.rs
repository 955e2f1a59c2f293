//! Bundles, carried as ONF experimenter messages in 1.3.
//!
//! OpenFlow 1.3 predates native bundle messages, so the ONF extension rides
//! the experimenter type: `experimenter = 0x4F4E4600` with `exp_type` 2300
//! (bundle control) or 2301 (bundle add). A commit must be preceded by add
//! messages carrying the same `bundle_id`.

use flowlink_wire::{Codec, Cursor, Result, WireError, Writer};

use crate::Message;

/// The ONF experimenter id.
pub const ONF_EXPERIMENTER_ID: u32 = 0x4F4E_4600;

/// `exp_type` of a bundle-control message.
pub const ONF_ET_BUNDLE_CONTROL: u32 = 2300;
/// `exp_type` of a bundle-add message.
pub const ONF_ET_BUNDLE_ADD_MESSAGE: u32 = 2301;

/// Bundle flag: apply atomically.
pub const OFPBF_ATOMIC: u16 = 1 << 0;
/// Bundle flag: preserve message order.
pub const OFPBF_ORDERED: u16 = 1 << 1;

/// Bundle control operations. Requests come from the controller; replies
/// from the switch.
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

/// Bundle-control body (after the experimenter header).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BundleControl {
    /// Bundle this operation addresses.
    pub bundle_id: u32,
    /// The operation.
    pub ctrl_type: BundleCtrlType,
    /// `OFPBF_*` bits.
    pub flags: u16,
}

impl Codec for BundleControl {
    fn wire_len(&self) -> usize {
        8
    }

    fn encode(&self, w: &mut Writer) -> Result<()> {
        w.put_u32(self.bundle_id);
        w.put_u16(self.ctrl_type as u16);
        w.put_u16(self.flags);
        Ok(())
    }

    fn decode(cur: &mut Cursor<'_>) -> Result<Self> {
        let bundle_id = cur.read_u32()?;
        let ctrl_type = BundleCtrlType::from_wire(cur.read_u16()?)?;
        let flags = cur.read_u16()?;
        Ok(Self { bundle_id, ctrl_type, flags })
    }
}

/// Bundle-add body: one complete message staged into a bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleAdd {
    /// Bundle the message is staged into.
    pub bundle_id: u32,
    /// `OFPBF_*` bits.
    pub flags: u16,
    /// The staged message, with its own header.
    pub message: Message,
}

impl BundleAdd {
    /// Body length after the experimenter header.
    #[must_use]
    pub fn wire_len(&self) -> usize {
        8 + self.message.wire_len()
    }

    /// Serialize the body (after the experimenter header).
    pub fn encode(&self, w: &mut Writer) -> Result<()> {
        w.put_u32(self.bundle_id);
        w.put_zeros(2);
        w.put_u16(self.flags);
        let inner = self.message.encode_to_bytes()?;
        w.put_slice(&inner);
        Ok(())
    }

    /// Parse the body; `depth` guards recursive bundling.
    pub fn decode(cur: &mut Cursor<'_>, depth: usize) -> Result<Self> {
        let bundle_id = cur.read_u32()?;
        cur.skip(2)?;
        let flags = cur.read_u16()?;
        let message = Message::decode_with_depth(cur.rest(), depth + 1)?;
        Ok(Self { bundle_id, flags, message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Payload;
    use flowlink_wire::{decode_from_slice, encode_to_vec};

    #[test]
    fn bundle_control_round_trip() {
        let ctrl = BundleControl {
            bundle_id: 100,
            ctrl_type: BundleCtrlType::OpenRequest,
            flags: OFPBF_ATOMIC,
        };
        let bytes = encode_to_vec(&ctrl).unwrap();
        assert_eq!(bytes, [0x00, 0x00, 0x00, 0x64, 0x00, 0x00, 0x00, 0x01]);
        assert_eq!(decode_from_slice::<BundleControl>(&bytes).unwrap(), ctrl);
    }

    #[test]
    fn unknown_control_type_is_fatal() {
        let bytes = [0, 0, 0, 1, 0x00, 0x09, 0, 0];
        assert!(matches!(
            decode_from_slice::<BundleControl>(&bytes),
            Err(WireError::UnknownDiscriminant { family: "bundle control type", .. }),
        ));
    }

    #[test]
    fn full_control_message_is_twenty_four_bytes() {
        let msg = Message::new(
            1,
            Payload::Experimenter(crate::ExperimenterPayload::Onf(crate::OnfMessage::BundleControl(
                BundleControl {
                    bundle_id: 100,
                    ctrl_type: BundleCtrlType::OpenRequest,
                    flags: OFPBF_ATOMIC,
                },
            ))),
        );
        let bytes = msg.encode_to_bytes().unwrap();
        assert_eq!(bytes.len(), 24);
        let back = Message::decode(&bytes).unwrap();
        assert_eq!(back, msg);
    }

    #[test]
    fn bundle_add_wraps_inner_message() {
        let inner = Message::new(7, Payload::BarrierRequest);
        let add = BundleAdd { bundle_id: 9, flags: OFPBF_ORDERED, message: inner };
        let msg = Message::new(
            8,
            Payload::Experimenter(crate::ExperimenterPayload::Onf(crate::OnfMessage::BundleAdd(
                Box::new(add),
            ))),
        );
        let bytes = msg.encode_to_bytes().unwrap();
        let back = Message::decode(&bytes).unwrap();
        assert_eq!(back, msg);
    }
}
