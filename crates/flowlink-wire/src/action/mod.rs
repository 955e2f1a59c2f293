//! OpenFlow actions, including the Nicira experimenter set.
//!
//! Every action is a TLV `type(u16) len(u16) body`, where `len` counts the
//! header and the trailing zero pad, so action lengths are always multiples
//! of 8. Standard actions are identical in 1.3.5 and 1.5.1; `CopyField` and
//! `Meter` exist only in 1.5 and are simply never produced by 1.3 code
//! paths.
//!
//! Experimenter actions dispatch a second time on the experimenter id;
//! Nicira's (`0x2320`) carry a subtype at offset 8 and live in [`nx`].

pub mod nx;

pub use nx::{ConnTrack, Controller2Prop, LearnAction, LearnSpec, LearnSrc, LearnDst, Nat, NxAction};

use crate::oxm::{MatchField, OxmId};
use crate::{Codec, Cursor, DEPTH_LIMIT, Result, WireError, Writer, padded8};

/// Reserved output port numbers.
pub mod ports {
    /// Maximum number of a physical port.
    pub const MAX: u32 = 0xFFFF_FF00;
    /// Send back out the ingress port.
    pub const IN_PORT: u32 = 0xFFFF_FFF8;
    /// Submit to the first flow table.
    pub const TABLE: u32 = 0xFFFF_FFF9;
    /// Forward per the traditional non-OpenFlow pipeline.
    pub const NORMAL: u32 = 0xFFFF_FFFA;
    /// Flood per the spanning tree.
    pub const FLOOD: u32 = 0xFFFF_FFFB;
    /// All physical ports except ingress.
    pub const ALL: u32 = 0xFFFF_FFFC;
    /// Send to the controller.
    pub const CONTROLLER: u32 = 0xFFFF_FFFD;
    /// Local openflow "port".
    pub const LOCAL: u32 = 0xFFFF_FFFE;
    /// Wildcard port, valid only in requests.
    pub const ANY: u32 = 0xFFFF_FFFF;
}

/// `max_len` value requesting the full packet with no buffering.
pub const CONTROLLER_MAX_LEN_NO_BUFFER: u16 = 0xFFFF;

/// The Nicira experimenter id.
pub const NICIRA_EXPERIMENTER_ID: u32 = 0x0000_2320;

const OFPAT_OUTPUT: u16 = 0;
const OFPAT_COPY_TTL_OUT: u16 = 11;
const OFPAT_COPY_TTL_IN: u16 = 12;
const OFPAT_SET_MPLS_TTL: u16 = 15;
const OFPAT_DEC_MPLS_TTL: u16 = 16;
const OFPAT_PUSH_VLAN: u16 = 17;
const OFPAT_POP_VLAN: u16 = 18;
const OFPAT_PUSH_MPLS: u16 = 19;
const OFPAT_POP_MPLS: u16 = 20;
const OFPAT_SET_QUEUE: u16 = 21;
const OFPAT_GROUP: u16 = 22;
const OFPAT_SET_NW_TTL: u16 = 23;
const OFPAT_DEC_NW_TTL: u16 = 24;
const OFPAT_SET_FIELD: u16 = 25;
const OFPAT_PUSH_PBB: u16 = 26;
const OFPAT_POP_PBB: u16 = 27;
const OFPAT_COPY_FIELD: u16 = 28;
const OFPAT_METER: u16 = 29;
const OFPAT_EXPERIMENTER: u16 = 0xFFFF;

/// A single action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Forward out a port, sending at most `max_len` bytes to the controller.
    Output {
        /// Output port, possibly one of [`ports`].
        port: u32,
        /// Bytes to send when the port is [`ports::CONTROLLER`].
        max_len: u16,
    },
    /// Copy TTL outwards (to the next-outermost header).
    CopyTtlOut,
    /// Copy TTL inwards.
    CopyTtlIn,
    /// Set the MPLS TTL.
    SetMplsTtl(u8),
    /// Decrement the MPLS TTL.
    DecMplsTtl,
    /// Push a VLAN tag with the given ethertype.
    PushVlan(u16),
    /// Pop the outermost VLAN tag.
    PopVlan,
    /// Push an MPLS shim with the given ethertype.
    PushMpls(u16),
    /// Pop the outermost MPLS shim, revealing the given ethertype.
    PopMpls(u16),
    /// Set the output queue.
    SetQueue(u32),
    /// Process through a group.
    Group(u32),
    /// Set the IP TTL.
    SetNwTtl(u8),
    /// Decrement the IP TTL.
    DecNwTtl,
    /// Set a header field from an OXM TLV.
    SetField(MatchField),
    /// Push a PBB service tag.
    PushPbb(u16),
    /// Pop the outermost PBB service tag.
    PopPbb,
    /// Copy bits between header fields (1.5).
    CopyField {
        /// Number of bits to copy.
        n_bits: u16,
        /// Starting bit offset in the source.
        src_offset: u16,
        /// Starting bit offset in the destination.
        dst_offset: u16,
        /// Source field id.
        src: OxmId,
        /// Destination field id.
        dst: OxmId,
    },
    /// Apply a meter (1.5).
    Meter(u32),
    /// Nicira experimenter action.
    Nicira(NxAction),
    /// Experimenter action this library does not interpret; raw bytes
    /// preserved for bit-exact re-marshal.
    UnknownExperimenter {
        /// Experimenter id.
        experimenter: u32,
        /// Body bytes after the experimenter id, padding included.
        data: Vec<u8>,
    },
}

impl Action {
    fn type_code(&self) -> u16 {
        match self {
            Self::Output { .. } => OFPAT_OUTPUT,
            Self::CopyTtlOut => OFPAT_COPY_TTL_OUT,
            Self::CopyTtlIn => OFPAT_COPY_TTL_IN,
            Self::SetMplsTtl(_) => OFPAT_SET_MPLS_TTL,
            Self::DecMplsTtl => OFPAT_DEC_MPLS_TTL,
            Self::PushVlan(_) => OFPAT_PUSH_VLAN,
            Self::PopVlan => OFPAT_POP_VLAN,
            Self::PushMpls(_) => OFPAT_PUSH_MPLS,
            Self::PopMpls(_) => OFPAT_POP_MPLS,
            Self::SetQueue(_) => OFPAT_SET_QUEUE,
            Self::Group(_) => OFPAT_GROUP,
            Self::SetNwTtl(_) => OFPAT_SET_NW_TTL,
            Self::DecNwTtl => OFPAT_DEC_NW_TTL,
            Self::SetField(_) => OFPAT_SET_FIELD,
            Self::PushPbb(_) => OFPAT_PUSH_PBB,
            Self::PopPbb => OFPAT_POP_PBB,
            Self::CopyField { .. } => OFPAT_COPY_FIELD,
            Self::Meter(_) => OFPAT_METER,
            Self::Nicira(_) | Self::UnknownExperimenter { .. } => OFPAT_EXPERIMENTER,
        }
    }

    pub(crate) fn decode_with_depth(cur: &mut Cursor<'_>, depth: usize) -> Result<Self> {
        if depth > DEPTH_LIMIT {
            return Err(WireError::DepthExceeded(DEPTH_LIMIT));
        }

        let ty = cur.read_u16()?;
        let len = cur.read_u16()? as usize;
        if len < 8 || len % 8 != 0 {
            return Err(WireError::Invariant("action length not a positive multiple of 8"));
        }
        let mut body = cur.subcursor(len, 4)?;

        let action = match ty {
            OFPAT_OUTPUT => {
                let port = body.read_u32()?;
                let max_len = body.read_u16()?;
                body.skip(6)?;
                Self::Output { port, max_len }
            },
            OFPAT_COPY_TTL_OUT => {
                body.skip(4)?;
                Self::CopyTtlOut
            },
            OFPAT_COPY_TTL_IN => {
                body.skip(4)?;
                Self::CopyTtlIn
            },
            OFPAT_SET_MPLS_TTL => {
                let ttl = body.read_u8()?;
                body.skip(3)?;
                Self::SetMplsTtl(ttl)
            },
            OFPAT_DEC_MPLS_TTL => {
                body.skip(4)?;
                Self::DecMplsTtl
            },
            OFPAT_PUSH_VLAN => {
                let ethertype = body.read_u16()?;
                body.skip(2)?;
                Self::PushVlan(ethertype)
            },
            OFPAT_POP_VLAN => {
                body.skip(4)?;
                Self::PopVlan
            },
            OFPAT_PUSH_MPLS => {
                let ethertype = body.read_u16()?;
                body.skip(2)?;
                Self::PushMpls(ethertype)
            },
            OFPAT_POP_MPLS => {
                let ethertype = body.read_u16()?;
                body.skip(2)?;
                Self::PopMpls(ethertype)
            },
            OFPAT_SET_QUEUE => Self::SetQueue(body.read_u32()?),
            OFPAT_GROUP => Self::Group(body.read_u32()?),
            OFPAT_SET_NW_TTL => {
                let ttl = body.read_u8()?;
                body.skip(3)?;
                Self::SetNwTtl(ttl)
            },
            OFPAT_DEC_NW_TTL => {
                body.skip(4)?;
                Self::DecNwTtl
            },
            OFPAT_SET_FIELD => {
                let field = MatchField::decode(&mut body)?;
                body.skip_align8()?;
                Self::SetField(field)
            },
            OFPAT_PUSH_PBB => {
                let ethertype = body.read_u16()?;
                body.skip(2)?;
                Self::PushPbb(ethertype)
            },
            OFPAT_POP_PBB => {
                body.skip(4)?;
                Self::PopPbb
            },
            OFPAT_COPY_FIELD => {
                let n_bits = body.read_u16()?;
                let src_offset = body.read_u16()?;
                let dst_offset = body.read_u16()?;
                body.skip(2)?;
                let src = OxmId::decode(&mut body)?;
                let dst = OxmId::decode(&mut body)?;
                body.skip_align8()?;
                Self::CopyField { n_bits, src_offset, dst_offset, src, dst }
            },
            OFPAT_METER => Self::Meter(body.read_u32()?),
            OFPAT_EXPERIMENTER => {
                let experimenter = body.read_u32()?;
                if experimenter == NICIRA_EXPERIMENTER_ID {
                    Self::Nicira(NxAction::decode_body(&mut body, depth)?)
                } else {
                    Self::UnknownExperimenter { experimenter, data: body.rest().to_vec() }
                }
            },
            other => {
                return Err(WireError::UnknownDiscriminant {
                    family: "action type",
                    value: u32::from(other),
                });
            },
        };

        if !body.is_empty() {
            return Err(WireError::Invariant("action length disagrees with its body"));
        }
        Ok(action)
    }
}

impl Codec for Action {
    fn wire_len(&self) -> usize {
        match self {
            Self::Output { .. } => 16,
            Self::SetField(field) => padded8(4 + field.wire_len()),
            Self::CopyField { .. } => 24,
            Self::Nicira(nx) => nx.wire_len(),
            Self::UnknownExperimenter { data, .. } => padded8(8 + data.len()),
            _ => 8,
        }
    }

    fn encode(&self, w: &mut Writer) -> Result<()> {
        let len = self.wire_len();
        if len > usize::from(u16::MAX) {
            return Err(WireError::Encode("action exceeds u16 length"));
        }

        if let Self::Nicira(nx) = self {
            return nx.encode(w);
        }

        w.put_u16(self.type_code());
        w.put_u16(len as u16);
        match self {
            Self::Output { port, max_len } => {
                w.put_u32(*port);
                w.put_u16(*max_len);
                w.put_zeros(6);
            },
            Self::CopyTtlOut
            | Self::CopyTtlIn
            | Self::DecMplsTtl
            | Self::PopVlan
            | Self::DecNwTtl
            | Self::PopPbb => w.put_zeros(4),
            Self::SetMplsTtl(ttl) | Self::SetNwTtl(ttl) => {
                w.put_u8(*ttl);
                w.put_zeros(3);
            },
            Self::PushVlan(ethertype)
            | Self::PushMpls(ethertype)
            | Self::PopMpls(ethertype)
            | Self::PushPbb(ethertype) => {
                w.put_u16(*ethertype);
                w.put_zeros(2);
            },
            Self::SetQueue(id) | Self::Group(id) | Self::Meter(id) => w.put_u32(*id),
            Self::SetField(field) => {
                field.encode(w)?;
                w.put_zeros(len - 4 - field.wire_len());
            },
            Self::CopyField { n_bits, src_offset, dst_offset, src, dst } => {
                w.put_u16(*n_bits);
                w.put_u16(*src_offset);
                w.put_u16(*dst_offset);
                w.put_zeros(2);
                src.encode(w)?;
                dst.encode(w)?;
                w.put_zeros(4);
            },
            Self::UnknownExperimenter { experimenter, data } => {
                w.put_u32(*experimenter);
                w.put_slice(data);
                w.put_zeros(len - 8 - data.len());
            },
            Self::Nicira(_) => unreachable!("handled above"),
        }
        Ok(())
    }

    fn decode(cur: &mut Cursor<'_>) -> Result<Self> {
        Self::decode_with_depth(cur, 0)
    }
}

/// Total wire length of an action list.
#[must_use]
pub fn list_len(actions: &[Action]) -> usize {
    actions.iter().map(Codec::wire_len).sum()
}

/// Encode a list of actions back to back.
pub fn encode_list(actions: &[Action], w: &mut Writer) -> Result<()> {
    for action in actions {
        action.encode(w)?;
    }
    Ok(())
}

/// Decode actions until the cursor is exhausted.
pub fn decode_list(cur: &mut Cursor<'_>) -> Result<Vec<Action>> {
    decode_list_with_depth(cur, 0)
}

pub(crate) fn decode_list_with_depth(cur: &mut Cursor<'_>, depth: usize) -> Result<Vec<Action>> {
    let mut actions = Vec::new();
    while !cur.is_empty() {
        actions.push(Action::decode_with_depth(cur, depth)?);
    }
    Ok(actions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{decode_from_slice, encode_to_vec};

    #[test]
    fn output_action_layout() {
        let action = Action::Output { port: ports::CONTROLLER, max_len: CONTROLLER_MAX_LEN_NO_BUFFER };
        let bytes = encode_to_vec(&action).unwrap();
        assert_eq!(bytes, [
            0x00, 0x00, 0x00, 0x10, // type=0 len=16
            0xFF, 0xFF, 0xFF, 0xFD, // port=CONTROLLER
            0xFF, 0xFF, // max_len
            0, 0, 0, 0, 0, 0, // pad
        ]);
        let back: Action = decode_from_slice(&bytes).unwrap();
        assert_eq!(back, action);
    }

    #[test]
    fn fixed_eight_byte_actions_round_trip() {
        for action in [
            Action::CopyTtlOut,
            Action::CopyTtlIn,
            Action::SetMplsTtl(63),
            Action::DecMplsTtl,
            Action::PushVlan(0x8100),
            Action::PopVlan,
            Action::PushMpls(0x8847),
            Action::PopMpls(0x0800),
            Action::SetQueue(5),
            Action::Group(12),
            Action::SetNwTtl(64),
            Action::DecNwTtl,
            Action::PushPbb(0x88E7),
            Action::PopPbb,
            Action::Meter(3),
        ] {
            let bytes = encode_to_vec(&action).unwrap();
            assert_eq!(bytes.len(), 8, "{action:?}");
            let back: Action = decode_from_slice(&bytes).unwrap();
            assert_eq!(back, action);
        }
    }

    #[test]
    fn set_field_pads_to_eight() {
        let action = Action::SetField(MatchField::eth_type(0x0806));
        // 4 header + 6 TLV = 10, padded to 16.
        assert_eq!(action.wire_len(), 16);
        let bytes = encode_to_vec(&action).unwrap();
        assert_eq!(bytes.len(), 16);
        assert_eq!(&bytes[10..], &[0u8; 6]);
        let back: Action = decode_from_slice(&bytes).unwrap();
        assert_eq!(back, action);
    }

    #[test]
    fn copy_field_round_trip() {
        let action = Action::CopyField {
            n_bits: 32,
            src_offset: 0,
            dst_offset: 0,
            src: OxmId {
                class: crate::oxm::CLASS_OPENFLOW_BASIC,
                field: crate::oxm::consts::basic::IPV4_SRC,
                has_mask: false,
                length: 4,
            },
            dst: OxmId { class: crate::oxm::CLASS_PACKET_REGS, field: 0, has_mask: false, length: 8 },
        };
        let bytes = encode_to_vec(&action).unwrap();
        assert_eq!(bytes.len(), 24);
        let back: Action = decode_from_slice(&bytes).unwrap();
        assert_eq!(back, action);
    }

    #[test]
    fn unknown_experimenter_preserved() {
        let bytes = [
            0xFF, 0xFF, 0x00, 0x10, // type=experimenter len=16
            0x00, 0x00, 0xBE, 0xEF, // some vendor
            1, 2, 3, 4, 5, 6, 7, 8, // opaque body
        ];
        let action: Action = decode_from_slice(&bytes).unwrap();
        assert!(matches!(action, Action::UnknownExperimenter { experimenter: 0xBEEF, .. }));
        assert_eq!(encode_to_vec(&action).unwrap(), bytes);
    }

    #[test]
    fn unknown_standard_type_is_fatal() {
        let bytes = [0x00, 0x63, 0x00, 0x08, 0, 0, 0, 0];
        let err = decode_from_slice::<Action>(&bytes).unwrap_err();
        assert_eq!(err, WireError::UnknownDiscriminant { family: "action type", value: 0x63 });
    }

    #[test]
    fn ragged_length_rejected() {
        let bytes = [0x00, 0x00, 0x00, 0x0C, 0, 0, 0, 0, 0, 0, 0, 0];
        assert!(matches!(decode_from_slice::<Action>(&bytes), Err(WireError::Invariant(_))));
    }

    #[test]
    fn list_round_trip() {
        let actions = vec![
            Action::PushVlan(0x8100),
            Action::SetField(MatchField::vlan_vid(0x1064, None)),
            Action::Output { port: 2, max_len: 0 },
        ];
        let mut w = Writer::new();
        encode_list(&actions, &mut w).unwrap();
        let bytes = w.freeze();
        assert_eq!(bytes.len(), list_len(&actions));
        let mut cur = Cursor::new(&bytes);
        assert_eq!(decode_list(&mut cur).unwrap(), actions);
    }
}
