//! Nicira experimenter actions.
//!
//! On the wire these are generic experimenter actions (`type = 0xffff`,
//! experimenter id `0x2320`) with a Nicira subtype at offset 8. Conntrack
//! nests a full action list in its tail; `learn` carries its own flow-mod
//! spec micro-encoding. Unknown subtypes are preserved raw so a message that
//! merely passes through survives bit-exactly.

use crate::oxm::MatchField;
use crate::{Codec, Cursor, Result, WireError, Writer, padded8};

use super::{Action, NICIRA_EXPERIMENTER_ID, decode_list_with_depth, encode_list, list_len};

const NXAST_RESUBMIT: u16 = 1;
const NXAST_REG_MOVE: u16 = 6;
const NXAST_REG_LOAD: u16 = 7;
const NXAST_NOTE: u16 = 8;
const NXAST_RESUBMIT_TABLE: u16 = 14;
const NXAST_OUTPUT_REG: u16 = 15;
const NXAST_LEARN: u16 = 16;
const NXAST_DEC_TTL: u16 = 18;
const NXAST_CONTROLLER: u16 = 20;
const NXAST_DEC_TTL_CNT_IDS: u16 = 21;
const NXAST_OUTPUT_REG2: u16 = 32;
const NXAST_REG_LOAD2: u16 = 33;
const NXAST_CONJUNCTION: u16 = 34;
const NXAST_CT: u16 = 35;
const NXAST_NAT: u16 = 36;
const NXAST_CONTROLLER2: u16 = 37;

/// Recirculation table value meaning "do not recirculate".
pub const CT_RECIRC_NONE: u8 = 0xFF;

/// Conntrack flag: commit the connection.
pub const CT_FLAG_COMMIT: u16 = 0x0001;
/// Conntrack flag: force a new conntrack entry.
pub const CT_FLAG_FORCE: u16 = 0x0002;

/// NAT flag: translate the source address.
pub const NAT_FLAG_SRC: u16 = 0x0001;
/// NAT flag: translate the destination address.
pub const NAT_FLAG_DST: u16 = 0x0002;
/// NAT flag: persistent mapping across reboots.
pub const NAT_FLAG_PERSISTENT: u16 = 0x0004;
/// NAT flag: derive the port from a hash.
pub const NAT_FLAG_PROTO_HASH: u16 = 0x0008;
/// NAT flag: pick the port at random.
pub const NAT_FLAG_PROTO_RANDOM: u16 = 0x0010;

/// A Nicira action, dispatched on the subtype at offset 8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NxAction {
    /// Re-search the current table with a substituted ingress port.
    Resubmit {
        /// Substituted ingress port, or `OFPP_IN_PORT` semantics via 0xfff8.
        in_port: u16,
    },
    /// Re-search an explicit table.
    ResubmitTable {
        /// Substituted ingress port.
        in_port: u16,
        /// Table to search; 255 means the current table.
        table: u8,
    },
    /// Copy a bit range between register-addressable fields.
    RegMove {
        /// Number of bits to copy.
        n_bits: u16,
        /// Source starting bit.
        src_offset: u16,
        /// Destination starting bit.
        dst_offset: u16,
        /// Source field header.
        src: u32,
        /// Destination field header.
        dst: u32,
    },
    /// Load an immediate into a bit range of a field.
    RegLoad {
        /// Packed `(offset << 6) | (n_bits - 1)`.
        ofs_nbits: u16,
        /// Destination field header.
        dst: u32,
        /// Immediate value.
        value: u64,
    },
    /// Free-form annotation carried in the flow.
    Note(
        /// Note bytes, tail padding included.
        Vec<u8>,
    ),
    /// Output to the port number held in a field bit range.
    OutputReg {
        /// Packed `(offset << 6) | (n_bits - 1)`.
        ofs_nbits: u16,
        /// Source field header.
        src: u32,
        /// Bytes to send when the port resolves to the controller.
        max_len: u16,
    },
    /// Install a learned flow derived from the current packet.
    Learn(LearnAction),
    /// Decrement the IP TTL, sending to the controller on expiry.
    DecTtl,
    /// Send to a specific controller connection.
    Controller {
        /// Bytes of packet to include.
        max_len: u16,
        /// Target controller id.
        controller_id: u16,
        /// Reason byte to report.
        reason: u8,
    },
    /// Decrement TTL, reporting expiry to an explicit controller list.
    DecTtlCntIds {
        /// Controllers to notify.
        controller_ids: Vec<u16>,
    },
    /// `OutputReg` with the source named by an OXM header.
    OutputReg2 {
        /// Packed `(offset << 6) | (n_bits - 1)`.
        ofs_nbits: u16,
        /// Bytes to send when the port resolves to the controller.
        max_len: u16,
        /// Source field header.
        src: u32,
    },
    /// Load an OXM TLV (value, optionally masked) into a field.
    RegLoad2(MatchField),
    /// Member of a conjunctive match.
    Conjunction {
        /// This clause's index (0-based).
        clause: u8,
        /// Total clauses in the conjunction.
        n_clauses: u8,
        /// Conjunction id.
        id: u32,
    },
    /// Connection tracking, wrapping a nested action list.
    ConnTrack(ConnTrack),
    /// Network address translation, valid inside conntrack.
    Nat(Nat),
    /// `Controller` with extensible properties.
    Controller2 {
        /// Properties in wire order.
        props: Vec<Controller2Prop>,
    },
    /// Unrecognized subtype; body preserved raw.
    Unknown {
        /// Nicira subtype.
        subtype: u16,
        /// Body bytes after the subtype, padding included.
        data: Vec<u8>,
    },
}

/// The `ct` action body.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConnTrack {
    /// `CT_FLAG_*` bits.
    pub flags: u16,
    /// Source field header for the zone, 0 for an immediate zone.
    pub zone_src: u32,
    /// Immediate zone, or `ofs_nbits` into `zone_src`.
    pub zone: u16,
    /// Table to recirculate to, [`CT_RECIRC_NONE`] for none.
    pub recirc_table: u8,
    /// Application layer gateway (an IP protocol/port pair), 0 for none.
    pub alg: u16,
    /// Actions applied within the conntrack context (e.g. `nat`).
    pub actions: Vec<Action>,
}

impl ConnTrack {
    fn body_decode(body: &mut Cursor<'_>, depth: usize) -> Result<Self> {
        let flags = body.read_u16()?;
        let zone_src = body.read_u32()?;
        let zone = body.read_u16()?;
        let recirc_table = body.read_u8()?;
        body.skip(3)?;
        let alg = body.read_u16()?;
        let actions = decode_list_with_depth(body, depth + 1)?;
        Ok(Self { flags, zone_src, zone, recirc_table, alg, actions })
    }
}

/// The `nat` action body. Range fields are present on the wire only when the
/// corresponding `Option` is set.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Nat {
    /// `NAT_FLAG_*` bits.
    pub flags: u16,
    /// Lowest translated IPv4 address.
    pub ipv4_min: Option<std::net::Ipv4Addr>,
    /// Highest translated IPv4 address.
    pub ipv4_max: Option<std::net::Ipv4Addr>,
    /// Lowest translated IPv6 address.
    pub ipv6_min: Option<std::net::Ipv6Addr>,
    /// Highest translated IPv6 address.
    pub ipv6_max: Option<std::net::Ipv6Addr>,
    /// Lowest translated transport port.
    pub proto_min: Option<u16>,
    /// Highest translated transport port.
    pub proto_max: Option<u16>,
}

const NAT_RANGE_IPV4_MIN: u16 = 0x01;
const NAT_RANGE_IPV4_MAX: u16 = 0x02;
const NAT_RANGE_IPV6_MIN: u16 = 0x04;
const NAT_RANGE_IPV6_MAX: u16 = 0x08;
const NAT_RANGE_PROTO_MIN: u16 = 0x10;
const NAT_RANGE_PROTO_MAX: u16 = 0x20;

impl Nat {
    fn range_present(&self) -> u16 {
        let mut bits = 0;
        if self.ipv4_min.is_some() {
            bits |= NAT_RANGE_IPV4_MIN;
        }
        if self.ipv4_max.is_some() {
            bits |= NAT_RANGE_IPV4_MAX;
        }
        if self.ipv6_min.is_some() {
            bits |= NAT_RANGE_IPV6_MIN;
        }
        if self.ipv6_max.is_some() {
            bits |= NAT_RANGE_IPV6_MAX;
        }
        if self.proto_min.is_some() {
            bits |= NAT_RANGE_PROTO_MIN;
        }
        if self.proto_max.is_some() {
            bits |= NAT_RANGE_PROTO_MAX;
        }
        bits
    }

    fn ranges_len(&self) -> usize {
        self.ipv4_min.map_or(0, |_| 4)
            + self.ipv4_max.map_or(0, |_| 4)
            + self.ipv6_min.map_or(0, |_| 16)
            + self.ipv6_max.map_or(0, |_| 16)
            + self.proto_min.map_or(0, |_| 2)
            + self.proto_max.map_or(0, |_| 2)
    }

    fn body_decode(body: &mut Cursor<'_>) -> Result<Self> {
        body.skip(2)?;
        let flags = body.read_u16()?;
        let present = body.read_u16()?;

        let mut nat = Self { flags, ..Self::default() };
        if present & NAT_RANGE_IPV4_MIN != 0 {
            nat.ipv4_min = Some(std::net::Ipv4Addr::from(body.read_array::<4>()?));
        }
        if present & NAT_RANGE_IPV4_MAX != 0 {
            nat.ipv4_max = Some(std::net::Ipv4Addr::from(body.read_array::<4>()?));
        }
        if present & NAT_RANGE_IPV6_MIN != 0 {
            nat.ipv6_min = Some(std::net::Ipv6Addr::from(body.read_array::<16>()?));
        }
        if present & NAT_RANGE_IPV6_MAX != 0 {
            nat.ipv6_max = Some(std::net::Ipv6Addr::from(body.read_array::<16>()?));
        }
        if present & NAT_RANGE_PROTO_MIN != 0 {
            nat.proto_min = Some(body.read_u16()?);
        }
        if present & NAT_RANGE_PROTO_MAX != 0 {
            nat.proto_max = Some(body.read_u16()?);
        }
        body.skip_align8()?;
        Ok(nat)
    }

    fn body_encode(&self, w: &mut Writer) {
        w.put_zeros(2);
        w.put_u16(self.flags);
        w.put_u16(self.range_present());
        if let Some(v) = self.ipv4_min {
            w.put_slice(&v.octets());
        }
        if let Some(v) = self.ipv4_max {
            w.put_slice(&v.octets());
        }
        if let Some(v) = self.ipv6_min {
            w.put_slice(&v.octets());
        }
        if let Some(v) = self.ipv6_max {
            w.put_slice(&v.octets());
        }
        if let Some(v) = self.proto_min {
            w.put_u16(v);
        }
        if let Some(v) = self.proto_max {
            w.put_u16(v);
        }
        w.align8();
    }
}

/// Properties of the `controller2` action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Controller2Prop {
    /// Bytes of packet to include.
    MaxLen(u16),
    /// Target controller id.
    ControllerId(u16),
    /// Reason byte to report.
    Reason(u8),
    /// Opaque data copied into the packet-in.
    Userdata(Vec<u8>),
    /// Pause the pipeline pending a continuation.
    Pause,
    /// Unrecognized property; value preserved raw.
    Unknown {
        /// Property type code.
        prop_type: u16,
        /// Value bytes (padding excluded).
        data: Vec<u8>,
    },
}

const NXAC2PT_MAX_LEN: u16 = 0;
const NXAC2PT_CONTROLLER_ID: u16 = 1;
const NXAC2PT_REASON: u16 = 2;
const NXAC2PT_USERDATA: u16 = 3;
const NXAC2PT_PAUSE: u16 = 4;

impl Controller2Prop {
    fn value_len(&self) -> usize {
        match self {
            Self::MaxLen(_) | Self::ControllerId(_) => 2,
            Self::Reason(_) => 1,
            Self::Userdata(data) => data.len(),
            Self::Pause => 0,
            Self::Unknown { data, .. } => data.len(),
        }
    }

    fn wire_len(&self) -> usize {
        padded8(4 + self.value_len())
    }

    fn encode(&self, w: &mut Writer) -> Result<()> {
        let body_len = 4 + self.value_len();
        if body_len > usize::from(u16::MAX) {
            return Err(WireError::Encode("controller2 property exceeds u16 length"));
        }
        let ty = match self {
            Self::MaxLen(_) => NXAC2PT_MAX_LEN,
            Self::ControllerId(_) => NXAC2PT_CONTROLLER_ID,
            Self::Reason(_) => NXAC2PT_REASON,
            Self::Userdata(_) => NXAC2PT_USERDATA,
            Self::Pause => NXAC2PT_PAUSE,
            Self::Unknown { prop_type, .. } => *prop_type,
        };
        w.put_u16(ty);
        w.put_u16(body_len as u16);
        match self {
            Self::MaxLen(v) | Self::ControllerId(v) => w.put_u16(*v),
            Self::Reason(v) => w.put_u8(*v),
            Self::Userdata(data) | Self::Unknown { data, .. } => w.put_slice(data),
            Self::Pause => {},
        }
        w.align8();
        Ok(())
    }

    fn decode(cur: &mut Cursor<'_>) -> Result<Self> {
        let ty = cur.read_u16()?;
        let len = cur.read_u16()? as usize;
        let mut body = cur.subcursor(len, 4)?;
        let prop = match ty {
            NXAC2PT_MAX_LEN => Self::MaxLen(body.read_u16()?),
            NXAC2PT_CONTROLLER_ID => Self::ControllerId(body.read_u16()?),
            NXAC2PT_REASON => Self::Reason(body.read_u8()?),
            NXAC2PT_USERDATA => Self::Userdata(body.rest().to_vec()),
            NXAC2PT_PAUSE => Self::Pause,
            other => Self::Unknown { prop_type: other, data: body.rest().to_vec() },
        };
        if !body.is_empty() {
            return Err(WireError::Invariant("controller2 property length disagrees with body"));
        }
        cur.skip_align8()?;
        Ok(prop)
    }
}

/// The `learn` action: a template for flows the switch installs itself.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LearnAction {
    /// Idle timeout of learned flows.
    pub idle_timeout: u16,
    /// Hard timeout of learned flows.
    pub hard_timeout: u16,
    /// Priority of learned flows.
    pub priority: u16,
    /// Cookie stamped onto learned flows.
    pub cookie: u64,
    /// Learn flags (`NX_LEARN_F_*`).
    pub flags: u16,
    /// Table learned flows are installed into.
    pub table_id: u8,
    /// Idle timeout after a TCP FIN, 0 for none.
    pub fin_idle_timeout: u16,
    /// Hard timeout after a TCP FIN, 0 for none.
    pub fin_hard_timeout: u16,
    /// Flow-mod specs describing the learned match and actions.
    pub specs: Vec<LearnSpec>,
}

/// One flow-mod spec inside a `learn` action.
///
/// The 16-bit spec header packs `src(1) dst(2) n_bits(11)`; a header of zero
/// terminates the list (and doubles as padding).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LearnSpec {
    /// Number of bits matched or copied.
    pub n_bits: u16,
    /// Where the bits come from.
    pub src: LearnSrc,
    /// Where the bits go.
    pub dst: LearnDst,
}

/// Source half of a learn spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LearnSrc {
    /// Bits taken from a field of the packet being learned from.
    Field {
        /// Source field header.
        id: u32,
        /// Starting bit offset.
        offset: u16,
    },
    /// Immediate bits stored in the spec itself, length
    /// `2 * ceil(n_bits / 16)`.
    Immediate(Vec<u8>),
}

/// Destination half of a learn spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LearnDst {
    /// Add a match criterion on this field.
    Match {
        /// Destination field header.
        id: u32,
        /// Starting bit offset.
        offset: u16,
    },
    /// Add a `reg_load` of this field to the learned flow's actions.
    Load {
        /// Destination field header.
        id: u32,
        /// Starting bit offset.
        offset: u16,
    },
    /// Add an `output` to the port named by the source bits.
    Output,
}

const LEARN_SRC_IMMEDIATE: u16 = 1 << 13;
const LEARN_DST_SHIFT: u16 = 11;
const LEARN_DST_MASK: u16 = 0x3 << LEARN_DST_SHIFT;
const LEARN_DST_MATCH: u16 = 0;
const LEARN_DST_LOAD: u16 = 1;
const LEARN_DST_OUTPUT: u16 = 2;
const LEARN_N_BITS_MASK: u16 = 0x7FF;

impl LearnSpec {
    fn immediate_len(n_bits: u16) -> usize {
        2 * ((usize::from(n_bits) + 15) / 16)
    }

    fn wire_len(&self) -> usize {
        let src_len = match &self.src {
            LearnSrc::Field { .. } => 6,
            LearnSrc::Immediate(bytes) => bytes.len(),
        };
        let dst_len = match &self.dst {
            LearnDst::Match { .. } | LearnDst::Load { .. } => 6,
            LearnDst::Output => 0,
        };
        2 + src_len + dst_len
    }

    fn encode(&self, w: &mut Writer) -> Result<()> {
        let mut header = self.n_bits & LEARN_N_BITS_MASK;
        if let LearnSrc::Immediate(bytes) = &self.src {
            if bytes.len() != Self::immediate_len(self.n_bits) {
                return Err(WireError::Encode("learn immediate length disagrees with n_bits"));
            }
            header |= LEARN_SRC_IMMEDIATE;
        }
        header |= match self.dst {
            LearnDst::Match { .. } => LEARN_DST_MATCH,
            LearnDst::Load { .. } => LEARN_DST_LOAD,
            LearnDst::Output => LEARN_DST_OUTPUT,
        } << LEARN_DST_SHIFT;

        w.put_u16(header);
        match &self.src {
            LearnSrc::Field { id, offset } => {
                w.put_u32(*id);
                w.put_u16(*offset);
            },
            LearnSrc::Immediate(bytes) => w.put_slice(bytes),
        }
        match &self.dst {
            LearnDst::Match { id, offset } | LearnDst::Load { id, offset } => {
                w.put_u32(*id);
                w.put_u16(*offset);
            },
            LearnDst::Output => {},
        }
        Ok(())
    }

    fn decode(cur: &mut Cursor<'_>, header: u16) -> Result<Self> {
        let n_bits = header & LEARN_N_BITS_MASK;
        if n_bits == 0 {
            return Err(WireError::Invariant("learn spec with zero width"));
        }

        let src = if header & LEARN_SRC_IMMEDIATE != 0 {
            LearnSrc::Immediate(cur.read_bytes(Self::immediate_len(n_bits))?.to_vec())
        } else {
            LearnSrc::Field { id: cur.read_u32()?, offset: cur.read_u16()? }
        };

        let dst = match (header & LEARN_DST_MASK) >> LEARN_DST_SHIFT {
            LEARN_DST_MATCH => LearnDst::Match { id: cur.read_u32()?, offset: cur.read_u16()? },
            LEARN_DST_LOAD => LearnDst::Load { id: cur.read_u32()?, offset: cur.read_u16()? },
            LEARN_DST_OUTPUT => LearnDst::Output,
            other => {
                return Err(WireError::UnknownDiscriminant {
                    family: "learn spec dst",
                    value: u32::from(other),
                });
            },
        };

        Ok(Self { n_bits, src, dst })
    }
}

impl LearnAction {
    fn specs_len(&self) -> usize {
        self.specs.iter().map(LearnSpec::wire_len).sum()
    }

    fn body_decode(body: &mut Cursor<'_>) -> Result<Self> {
        let idle_timeout = body.read_u16()?;
        let hard_timeout = body.read_u16()?;
        let priority = body.read_u16()?;
        let cookie = body.read_u64()?;
        let flags = body.read_u16()?;
        let table_id = body.read_u8()?;
        body.skip(1)?;
        let fin_idle_timeout = body.read_u16()?;
        let fin_hard_timeout = body.read_u16()?;

        let mut specs = Vec::new();
        while body.remaining() >= 2 {
            let header = body.read_u16()?;
            if header == 0 {
                break;
            }
            specs.push(LearnSpec::decode(body, header)?);
        }
        // Remaining zero bytes are padding.
        let _ = body.rest();

        Ok(Self {
            idle_timeout,
            hard_timeout,
            priority,
            cookie,
            flags,
            table_id,
            fin_idle_timeout,
            fin_hard_timeout,
            specs,
        })
    }
}

impl NxAction {
    /// The Nicira subtype code.
    #[must_use]
    pub fn subtype(&self) -> u16 {
        match self {
            Self::Resubmit { .. } => NXAST_RESUBMIT,
            Self::ResubmitTable { .. } => NXAST_RESUBMIT_TABLE,
            Self::RegMove { .. } => NXAST_REG_MOVE,
            Self::RegLoad { .. } => NXAST_REG_LOAD,
            Self::Note(_) => NXAST_NOTE,
            Self::OutputReg { .. } => NXAST_OUTPUT_REG,
            Self::Learn(_) => NXAST_LEARN,
            Self::DecTtl => NXAST_DEC_TTL,
            Self::Controller { .. } => NXAST_CONTROLLER,
            Self::DecTtlCntIds { .. } => NXAST_DEC_TTL_CNT_IDS,
            Self::OutputReg2 { .. } => NXAST_OUTPUT_REG2,
            Self::RegLoad2(_) => NXAST_REG_LOAD2,
            Self::Conjunction { .. } => NXAST_CONJUNCTION,
            Self::ConnTrack(_) => NXAST_CT,
            Self::Nat(_) => NXAST_NAT,
            Self::Controller2 { .. } => NXAST_CONTROLLER2,
            Self::Unknown { subtype, .. } => *subtype,
        }
    }

    /// Total action length on the wire, header and padding included.
    #[must_use]
    pub fn wire_len(&self) -> usize {
        match self {
            Self::Resubmit { .. }
            | Self::ResubmitTable { .. }
            | Self::DecTtl
            | Self::Controller { .. }
            | Self::Conjunction { .. } => 16,
            Self::RegMove { .. } | Self::RegLoad { .. } | Self::OutputReg { .. }
            | Self::OutputReg2 { .. } => 24,
            Self::Note(data) | Self::Unknown { data, .. } => padded8(10 + data.len()),
            Self::Learn(learn) => padded8(32 + learn.specs_len()),
            Self::DecTtlCntIds { controller_ids } => padded8(16 + 2 * controller_ids.len()),
            Self::RegLoad2(field) => padded8(10 + field.wire_len()),
            Self::ConnTrack(ct) => 24 + list_len(&ct.actions),
            Self::Nat(nat) => padded8(16 + nat.ranges_len()),
            Self::Controller2 { props } => {
                16 + props.iter().map(Controller2Prop::wire_len).sum::<usize>()
            },
        }
    }

    /// Serialize the full experimenter action.
    pub fn encode(&self, w: &mut Writer) -> Result<()> {
        let len = self.wire_len();
        if len > usize::from(u16::MAX) {
            return Err(WireError::Encode("nicira action exceeds u16 length"));
        }
        w.put_u16(super::OFPAT_EXPERIMENTER);
        w.put_u16(len as u16);
        w.put_u32(NICIRA_EXPERIMENTER_ID);
        w.put_u16(self.subtype());

        match self {
            Self::Resubmit { in_port } => {
                w.put_u16(*in_port);
                w.put_zeros(4);
            },
            Self::ResubmitTable { in_port, table } => {
                w.put_u16(*in_port);
                w.put_u8(*table);
                w.put_zeros(3);
            },
            Self::RegMove { n_bits, src_offset, dst_offset, src, dst } => {
                w.put_u16(*n_bits);
                w.put_u16(*src_offset);
                w.put_u16(*dst_offset);
                w.put_u32(*src);
                w.put_u32(*dst);
            },
            Self::RegLoad { ofs_nbits, dst, value } => {
                w.put_u16(*ofs_nbits);
                w.put_u32(*dst);
                w.put_u64(*value);
            },
            Self::Note(data) | Self::Unknown { data, .. } => {
                w.put_slice(data);
                w.put_zeros(len - 10 - data.len());
            },
            Self::OutputReg { ofs_nbits, src, max_len } => {
                w.put_u16(*ofs_nbits);
                w.put_u32(*src);
                w.put_u16(*max_len);
                w.put_zeros(6);
            },
            Self::Learn(learn) => {
                w.put_u16(learn.idle_timeout);
                w.put_u16(learn.hard_timeout);
                w.put_u16(learn.priority);
                w.put_u64(learn.cookie);
                w.put_u16(learn.flags);
                w.put_u8(learn.table_id);
                w.put_zeros(1);
                w.put_u16(learn.fin_idle_timeout);
                w.put_u16(learn.fin_hard_timeout);
                for spec in &learn.specs {
                    spec.encode(w)?;
                }
                w.align8();
            },
            Self::DecTtl => w.put_zeros(6),
            Self::Controller { max_len, controller_id, reason } => {
                w.put_u16(*max_len);
                w.put_u16(*controller_id);
                w.put_u8(*reason);
                w.put_zeros(1);
            },
            Self::DecTtlCntIds { controller_ids } => {
                let n = controller_ids.len();
                if n > usize::from(u16::MAX) {
                    return Err(WireError::Encode("too many controller ids"));
                }
                w.put_u16(n as u16);
                w.put_zeros(4);
                for id in controller_ids {
                    w.put_u16(*id);
                }
                w.align8();
            },
            Self::OutputReg2 { ofs_nbits, max_len, src } => {
                w.put_u16(*ofs_nbits);
                w.put_u16(*max_len);
                w.put_u32(*src);
                w.put_zeros(6);
            },
            Self::RegLoad2(field) => {
                field.encode(w)?;
                w.align8();
            },
            Self::Conjunction { clause, n_clauses, id } => {
                w.put_u8(*clause);
                w.put_u8(*n_clauses);
                w.put_u32(*id);
            },
            Self::ConnTrack(ct) => {
                w.put_u16(ct.flags);
                w.put_u32(ct.zone_src);
                w.put_u16(ct.zone);
                w.put_u8(ct.recirc_table);
                w.put_zeros(3);
                w.put_u16(ct.alg);
                encode_list(&ct.actions, w)?;
            },
            Self::Nat(nat) => nat.body_encode(w),
            Self::Controller2 { props } => {
                w.put_zeros(6);
                for prop in props {
                    prop.encode(w)?;
                }
            },
        }
        Ok(())
    }

    /// Decode from a cursor positioned at the subtype (offset 8 of the
    /// action). The cursor is already bounded by the action's declared
    /// length, so tail parses cannot leak into a neighbor.
    pub(crate) fn decode_body(body: &mut Cursor<'_>, depth: usize) -> Result<Self> {
        let subtype = body.read_u16()?;

        let action = match subtype {
            NXAST_RESUBMIT => {
                let in_port = body.read_u16()?;
                body.skip(4)?;
                Self::Resubmit { in_port }
            },
            NXAST_RESUBMIT_TABLE => {
                let in_port = body.read_u16()?;
                let table = body.read_u8()?;
                body.skip(3)?;
                Self::ResubmitTable { in_port, table }
            },
            NXAST_REG_MOVE => {
                let n_bits = body.read_u16()?;
                let src_offset = body.read_u16()?;
                let dst_offset = body.read_u16()?;
                let src = body.read_u32()?;
                let dst = body.read_u32()?;
                Self::RegMove { n_bits, src_offset, dst_offset, src, dst }
            },
            NXAST_REG_LOAD => {
                let ofs_nbits = body.read_u16()?;
                let dst = body.read_u32()?;
                let value = body.read_u64()?;
                Self::RegLoad { ofs_nbits, dst, value }
            },
            NXAST_NOTE => Self::Note(body.rest().to_vec()),
            NXAST_OUTPUT_REG => {
                let ofs_nbits = body.read_u16()?;
                let src = body.read_u32()?;
                let max_len = body.read_u16()?;
                body.skip(6)?;
                Self::OutputReg { ofs_nbits, src, max_len }
            },
            NXAST_LEARN => Self::Learn(LearnAction::body_decode(body)?),
            NXAST_DEC_TTL => {
                body.skip(6)?;
                Self::DecTtl
            },
            NXAST_CONTROLLER => {
                let max_len = body.read_u16()?;
                let controller_id = body.read_u16()?;
                let reason = body.read_u8()?;
                body.skip(1)?;
                Self::Controller { max_len, controller_id, reason }
            },
            NXAST_DEC_TTL_CNT_IDS => {
                let n = body.read_u16()? as usize;
                body.skip(4)?;
                let mut controller_ids = Vec::with_capacity(n.min(64));
                for _ in 0..n {
                    controller_ids.push(body.read_u16()?);
                }
                body.skip_align8()?;
                Self::DecTtlCntIds { controller_ids }
            },
            NXAST_OUTPUT_REG2 => {
                let ofs_nbits = body.read_u16()?;
                let max_len = body.read_u16()?;
                let src = body.read_u32()?;
                body.skip(6)?;
                Self::OutputReg2 { ofs_nbits, max_len, src }
            },
            NXAST_REG_LOAD2 => {
                let field = MatchField::decode(body)?;
                body.skip_align8()?;
                Self::RegLoad2(field)
            },
            NXAST_CONJUNCTION => {
                let clause = body.read_u8()?;
                let n_clauses = body.read_u8()?;
                let id = body.read_u32()?;
                Self::Conjunction { clause, n_clauses, id }
            },
            NXAST_CT => Self::ConnTrack(ConnTrack::body_decode(body, depth)?),
            NXAST_NAT => Self::Nat(Nat::body_decode(body)?),
            NXAST_CONTROLLER2 => {
                body.skip(6)?;
                let mut props = Vec::new();
                while !body.is_empty() {
                    props.push(Controller2Prop::decode(body)?);
                }
                Self::Controller2 { props }
            },
            other => Self::Unknown { subtype: other, data: body.rest().to_vec() },
        };

        Ok(action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{decode_from_slice, encode_to_vec};

    fn round_trip(action: NxAction) {
        let wrapped = Action::Nicira(action);
        let bytes = encode_to_vec(&wrapped).unwrap();
        assert_eq!(bytes.len(), wrapped.wire_len());
        assert_eq!(bytes.len() % 8, 0, "nx action not padded: {wrapped:?}");
        let back: Action = decode_from_slice(&bytes).unwrap();
        assert_eq!(back, wrapped);
    }

    #[test]
    fn resubmit_layout() {
        let bytes = encode_to_vec(&Action::Nicira(NxAction::Resubmit { in_port: 3 })).unwrap();
        assert_eq!(bytes, [
            0xFF, 0xFF, 0x00, 0x10, // experimenter, len 16
            0x00, 0x00, 0x23, 0x20, // nicira
            0x00, 0x01, // subtype resubmit
            0x00, 0x03, // in_port
            0, 0, 0, 0, // pad
        ]);
    }

    #[test]
    fn simple_subtypes_round_trip() {
        round_trip(NxAction::Resubmit { in_port: 1 });
        round_trip(NxAction::ResubmitTable { in_port: 0xFFF8, table: 42 });
        round_trip(NxAction::RegMove {
            n_bits: 32,
            src_offset: 0,
            dst_offset: 0,
            src: 0x0000_0004,
            dst: 0x0001_0204,
        });
        round_trip(NxAction::RegLoad { ofs_nbits: (5 << 6) | 15, dst: 0x0001_0004, value: 99 });
        round_trip(NxAction::OutputReg { ofs_nbits: 31, src: 0x0001_0004, max_len: 0xFFFF });
        round_trip(NxAction::OutputReg2 { ofs_nbits: 31, max_len: 128, src: 0x0001_0204 });
        round_trip(NxAction::DecTtl);
        round_trip(NxAction::Controller { max_len: 128, controller_id: 0, reason: 1 });
        round_trip(NxAction::DecTtlCntIds { controller_ids: vec![1, 2, 3] });
        round_trip(NxAction::Conjunction { clause: 1, n_clauses: 2, id: 77 });
        round_trip(NxAction::RegLoad2(MatchField::ct_mark(0xAB)));
    }

    #[test]
    fn note_round_trip_with_padding() {
        // 10 + 6 = 16: already aligned.
        round_trip(NxAction::Note(vec![1, 2, 3, 4, 5, 6]));
        let n = NxAction::Note(vec![0xAA]);
        assert_eq!(n.wire_len(), 16);
        round_trip(n);
    }

    #[test]
    fn conntrack_nests_actions() {
        let ct = NxAction::ConnTrack(ConnTrack {
            flags: CT_FLAG_COMMIT,
            zone_src: 0,
            zone: 7,
            recirc_table: CT_RECIRC_NONE,
            alg: 0,
            actions: vec![Action::Nicira(NxAction::Nat(Nat {
                flags: NAT_FLAG_SRC,
                ipv4_min: Some(std::net::Ipv4Addr::new(10, 0, 0, 1)),
                ipv4_max: Some(std::net::Ipv4Addr::new(10, 0, 0, 9)),
                ..Nat::default()
            }))],
        });
        round_trip(ct);
    }

    #[test]
    fn conntrack_depth_is_capped() {
        let mut action = Action::Nicira(NxAction::ConnTrack(ConnTrack::default()));
        for _ in 0..crate::DEPTH_LIMIT + 2 {
            action = Action::Nicira(NxAction::ConnTrack(ConnTrack {
                actions: vec![action],
                ..ConnTrack::default()
            }));
        }
        let bytes = encode_to_vec(&action).unwrap();
        assert_eq!(
            decode_from_slice::<Action>(&bytes).unwrap_err(),
            WireError::DepthExceeded(crate::DEPTH_LIMIT),
        );
    }

    #[test]
    fn nat_ranges_round_trip() {
        let nat = NxAction::Nat(Nat {
            flags: NAT_FLAG_SRC | NAT_FLAG_PROTO_RANDOM,
            ipv4_min: Some(std::net::Ipv4Addr::new(10, 0, 0, 200)),
            ipv4_max: Some(std::net::Ipv4Addr::new(10, 0, 0, 240)),
            proto_min: Some(2048),
            proto_max: Some(10240),
            ..Nat::default()
        });
        // 16 fixed + 4 + 4 + 2 + 2 = 28, padded to 32.
        assert_eq!(nat.wire_len(), 32);
        round_trip(nat);
    }

    #[test]
    fn controller2_props_round_trip() {
        round_trip(NxAction::Controller2 {
            props: vec![
                Controller2Prop::MaxLen(0xFFFF),
                Controller2Prop::Reason(2),
                Controller2Prop::Userdata(vec![1, 2, 3, 4, 5]),
                Controller2Prop::Pause,
            ],
        });
    }

    #[test]
    fn learn_specs_round_trip() {
        let eth_src = 0x8000_0806; // OXM_OF_ETH_SRC header
        let eth_dst = 0x8000_0606;
        round_trip(NxAction::Learn(LearnAction {
            idle_timeout: 10,
            hard_timeout: 30,
            priority: 100,
            cookie: 0xDEAD,
            flags: 0,
            table_id: 1,
            fin_idle_timeout: 0,
            fin_hard_timeout: 0,
            specs: vec![
                // Match learned eth_dst against this packet's eth_src.
                LearnSpec {
                    n_bits: 48,
                    src: LearnSrc::Field { id: eth_src, offset: 0 },
                    dst: LearnDst::Match { id: eth_dst, offset: 0 },
                },
                // Immediate VLAN load.
                LearnSpec {
                    n_bits: 12,
                    src: LearnSrc::Immediate(vec![0x00, 0x64]),
                    dst: LearnDst::Load { id: 0x8000_0C02, offset: 0 },
                },
                // Output to the learned port.
                LearnSpec {
                    n_bits: 16,
                    src: LearnSrc::Field { id: 0x8000_0004, offset: 0 },
                    dst: LearnDst::Output,
                },
            ],
        }));
    }

    #[test]
    fn unknown_subtype_preserved() {
        let bytes = [
            0xFF, 0xFF, 0x00, 0x18, // len 24
            0x00, 0x00, 0x23, 0x20, // nicira
            0x01, 0x2C, // subtype 300
            0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13,
        ];
        let action: Action = decode_from_slice(&bytes).unwrap();
        assert!(matches!(action, Action::Nicira(NxAction::Unknown { subtype: 300, .. })));
        assert_eq!(encode_to_vec(&action).unwrap(), bytes);
    }
}
