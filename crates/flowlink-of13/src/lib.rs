//! OpenFlow 1.3 message catalog.
//!
//! A [`Message`] is the `(version, type)` tagged sum for wire version 4: an
//! xid plus a [`Payload`] variant per message type. Decoding dispatches on
//! the type byte of the common header; experimenter messages dispatch a
//! second time on `(experimenter_id, exp_type)`, which is where the ONF
//! bundle extension lives in 1.3.
//!
//! Every body implements [`flowlink_wire::Codec`], so
//! `Message::decode(m.encode_to_bytes()?) == m` and a decoded frame
//! re-encodes bit-exactly.

pub mod bundle;
pub mod error_msg;
pub mod features;
pub mod flow;
pub mod group;
pub mod hello;
pub mod meter_mod;
pub mod multipart;
pub mod packet;
pub mod port;
pub mod role;
pub mod table_features;

pub use bundle::{BundleAdd, BundleControl, BundleCtrlType};
pub use error_msg::ErrorMsg;
pub use features::{SwitchConfig, SwitchFeatures};
pub use flow::{FlowMod, FlowModCommand, FlowRemoved, TableMod};
pub use group::{Bucket, GroupMod};
pub use hello::{Hello, HelloElem};
pub use meter_mod::MeterMod;
pub use multipart::{MultipartReply, MultipartReplyBody, MultipartRequest, MultipartRequestBody};
pub use packet::{PacketIn, PacketOut};
pub use port::{Port, PortMod, PortStatus};
pub use role::{AsyncConfig, Role};
pub use table_features::{TableFeatureProp, TableFeatures};

use bytes::Bytes;
use flowlink_wire::{Codec, Cursor, DEPTH_LIMIT, Header, Result, WireError, Writer};

/// The wire version byte for OpenFlow 1.3.
pub const WIRE_VERSION: u8 = 4;

/// Message type bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Kind {
    /// Version negotiation.
    Hello = 0,
    /// Error report.
    Error = 1,
    /// Liveness probe.
    EchoRequest = 2,
    /// Liveness answer.
    EchoReply = 3,
    /// Vendor extension.
    Experimenter = 4,
    /// Ask for switch features.
    FeaturesRequest = 5,
    /// Switch features.
    FeaturesReply = 6,
    /// Ask for switch config.
    GetConfigRequest = 7,
    /// Switch config.
    GetConfigReply = 8,
    /// Set switch config.
    SetConfig = 9,
    /// Packet delivered to the controller.
    PacketIn = 10,
    /// Flow expired or was deleted.
    FlowRemoved = 11,
    /// Port came, went, or changed.
    PortStatus = 12,
    /// Packet injected by the controller.
    PacketOut = 13,
    /// Flow table modification.
    FlowMod = 14,
    /// Group table modification.
    GroupMod = 15,
    /// Port modification.
    PortMod = 16,
    /// Table modification.
    TableMod = 17,
    /// Statistics request.
    MultipartRequest = 18,
    /// Statistics reply.
    MultipartReply = 19,
    /// Barrier request.
    BarrierRequest = 20,
    /// Barrier reply.
    BarrierReply = 21,
    /// Controller role request.
    RoleRequest = 24,
    /// Controller role reply.
    RoleReply = 25,
    /// Ask for async-message config.
    GetAsyncRequest = 26,
    /// Async-message config.
    GetAsyncReply = 27,
    /// Set async-message config.
    SetAsync = 28,
    /// Meter modification.
    MeterMod = 29,
}

impl Kind {
    /// Decode the header type byte.
    pub fn from_wire(byte: u8) -> Result<Self> {
        Ok(match byte {
            0 => Self::Hello,
            1 => Self::Error,
            2 => Self::EchoRequest,
            3 => Self::EchoReply,
            4 => Self::Experimenter,
            5 => Self::FeaturesRequest,
            6 => Self::FeaturesReply,
            7 => Self::GetConfigRequest,
            8 => Self::GetConfigReply,
            9 => Self::SetConfig,
            10 => Self::PacketIn,
            11 => Self::FlowRemoved,
            12 => Self::PortStatus,
            13 => Self::PacketOut,
            14 => Self::FlowMod,
            15 => Self::GroupMod,
            16 => Self::PortMod,
            17 => Self::TableMod,
            18 => Self::MultipartRequest,
            19 => Self::MultipartReply,
            20 => Self::BarrierRequest,
            21 => Self::BarrierReply,
            24 => Self::RoleRequest,
            25 => Self::RoleReply,
            26 => Self::GetAsyncRequest,
            27 => Self::GetAsyncReply,
            28 => Self::SetAsync,
            29 => Self::MeterMod,
            other => {
                return Err(WireError::UnknownDiscriminant {
                    family: "message type",
                    value: u32::from(other),
                });
            },
        })
    }
}

/// Second-level dispatch for experimenter messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExperimenterPayload {
    /// ONF extension messages (bundles).
    Onf(OnfMessage),
    /// Any other experimenter, body preserved raw.
    Unknown {
        /// Experimenter id.
        experimenter: u32,
        /// Experimenter-defined subtype.
        exp_type: u32,
        /// Raw body after the subtype.
        data: Vec<u8>,
    },
}

/// ONF experimenter messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OnfMessage {
    /// Bundle open/close/commit/discard.
    BundleControl(BundleControl),
    /// Stage a message into a bundle.
    BundleAdd(Box<BundleAdd>),
}

/// Message bodies, one variant per [`Kind`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Version negotiation.
    Hello(Hello),
    /// Error report.
    Error(ErrorMsg),
    /// Liveness probe with opaque data.
    EchoRequest(Vec<u8>),
    /// Liveness answer echoing the probe data.
    EchoReply(Vec<u8>),
    /// Vendor extension.
    Experimenter(ExperimenterPayload),
    /// Ask for switch features.
    FeaturesRequest,
    /// Switch features.
    FeaturesReply(SwitchFeatures),
    /// Ask for switch config.
    GetConfigRequest,
    /// Switch config.
    GetConfigReply(SwitchConfig),
    /// Set switch config.
    SetConfig(SwitchConfig),
    /// Packet delivered to the controller.
    PacketIn(PacketIn),
    /// Flow expired or was deleted.
    FlowRemoved(FlowRemoved),
    /// Port came, went, or changed.
    PortStatus(PortStatus),
    /// Packet injected by the controller.
    PacketOut(PacketOut),
    /// Flow table modification.
    FlowMod(Box<FlowMod>),
    /// Group table modification.
    GroupMod(GroupMod),
    /// Port modification.
    PortMod(PortMod),
    /// Table modification.
    TableMod(TableMod),
    /// Statistics request.
    MultipartRequest(MultipartRequest),
    /// Statistics reply.
    MultipartReply(MultipartReply),
    /// Barrier request.
    BarrierRequest,
    /// Barrier reply.
    BarrierReply,
    /// Controller role request.
    RoleRequest(Role),
    /// Controller role reply.
    RoleReply(Role),
    /// Ask for async-message config.
    GetAsyncRequest,
    /// Async-message config.
    GetAsyncReply(AsyncConfig),
    /// Set async-message config.
    SetAsync(AsyncConfig),
    /// Meter modification.
    MeterMod(MeterMod),
}

impl Payload {
    /// The message type this payload rides under.
    #[must_use]
    pub fn kind(&self) -> Kind {
        match self {
            Self::Hello(_) => Kind::Hello,
            Self::Error(_) => Kind::Error,
            Self::EchoRequest(_) => Kind::EchoRequest,
            Self::EchoReply(_) => Kind::EchoReply,
            Self::Experimenter(_) => Kind::Experimenter,
            Self::FeaturesRequest => Kind::FeaturesRequest,
            Self::FeaturesReply(_) => Kind::FeaturesReply,
            Self::GetConfigRequest => Kind::GetConfigRequest,
            Self::GetConfigReply(_) => Kind::GetConfigReply,
            Self::SetConfig(_) => Kind::SetConfig,
            Self::PacketIn(_) => Kind::PacketIn,
            Self::FlowRemoved(_) => Kind::FlowRemoved,
            Self::PortStatus(_) => Kind::PortStatus,
            Self::PacketOut(_) => Kind::PacketOut,
            Self::FlowMod(_) => Kind::FlowMod,
            Self::GroupMod(_) => Kind::GroupMod,
            Self::PortMod(_) => Kind::PortMod,
            Self::TableMod(_) => Kind::TableMod,
            Self::MultipartRequest(_) => Kind::MultipartRequest,
            Self::MultipartReply(_) => Kind::MultipartReply,
            Self::BarrierRequest => Kind::BarrierRequest,
            Self::BarrierReply => Kind::BarrierReply,
            Self::RoleRequest(_) => Kind::RoleRequest,
            Self::RoleReply(_) => Kind::RoleReply,
            Self::GetAsyncRequest => Kind::GetAsyncRequest,
            Self::GetAsyncReply(_) => Kind::GetAsyncReply,
            Self::SetAsync(_) => Kind::SetAsync,
            Self::MeterMod(_) => Kind::MeterMod,
        }
    }

    fn body_len(&self) -> usize {
        match self {
            Self::Hello(hello) => hello.wire_len(),
            Self::Error(err) => err.wire_len(),
            Self::EchoRequest(data) | Self::EchoReply(data) => data.len(),
            Self::Experimenter(exp) => match exp {
                ExperimenterPayload::Onf(OnfMessage::BundleControl(ctrl)) => 8 + ctrl.wire_len(),
                ExperimenterPayload::Onf(OnfMessage::BundleAdd(add)) => 8 + add.wire_len(),
                ExperimenterPayload::Unknown { data, .. } => 8 + data.len(),
            },
            Self::FeaturesRequest
            | Self::GetConfigRequest
            | Self::BarrierRequest
            | Self::BarrierReply
            | Self::GetAsyncRequest => 0,
            Self::FeaturesReply(features) => features.wire_len(),
            Self::GetConfigReply(config) | Self::SetConfig(config) => config.wire_len(),
            Self::PacketIn(pi) => pi.wire_len(),
            Self::FlowRemoved(fr) => fr.wire_len(),
            Self::PortStatus(ps) => ps.wire_len(),
            Self::PacketOut(po) => po.wire_len(),
            Self::FlowMod(fm) => fm.wire_len(),
            Self::GroupMod(gm) => gm.wire_len(),
            Self::PortMod(pm) => pm.wire_len(),
            Self::TableMod(tm) => tm.wire_len(),
            Self::MultipartRequest(req) => req.wire_len(),
            Self::MultipartReply(reply) => reply.wire_len(),
            Self::RoleRequest(role) | Self::RoleReply(role) => role.wire_len(),
            Self::GetAsyncReply(config) | Self::SetAsync(config) => config.wire_len(),
            Self::MeterMod(mm) => mm.wire_len(),
        }
    }

    fn encode_body(&self, w: &mut Writer) -> Result<()> {
        match self {
            Self::Hello(hello) => hello.encode(w),
            Self::Error(err) => err.encode(w),
            Self::EchoRequest(data) | Self::EchoReply(data) => {
                w.put_slice(data);
                Ok(())
            },
            Self::Experimenter(exp) => match exp {
                ExperimenterPayload::Onf(OnfMessage::BundleControl(ctrl)) => {
                    w.put_u32(bundle::ONF_EXPERIMENTER_ID);
                    w.put_u32(bundle::ONF_ET_BUNDLE_CONTROL);
                    ctrl.encode(w)
                },
                ExperimenterPayload::Onf(OnfMessage::BundleAdd(add)) => {
                    w.put_u32(bundle::ONF_EXPERIMENTER_ID);
                    w.put_u32(bundle::ONF_ET_BUNDLE_ADD_MESSAGE);
                    add.encode(w)
                },
                ExperimenterPayload::Unknown { experimenter, exp_type, data } => {
                    w.put_u32(*experimenter);
                    w.put_u32(*exp_type);
                    w.put_slice(data);
                    Ok(())
                },
            },
            Self::FeaturesRequest
            | Self::GetConfigRequest
            | Self::BarrierRequest
            | Self::BarrierReply
            | Self::GetAsyncRequest => Ok(()),
            Self::FeaturesReply(features) => features.encode(w),
            Self::GetConfigReply(config) | Self::SetConfig(config) => config.encode(w),
            Self::PacketIn(pi) => pi.encode(w),
            Self::FlowRemoved(fr) => fr.encode(w),
            Self::PortStatus(ps) => ps.encode(w),
            Self::PacketOut(po) => po.encode(w),
            Self::FlowMod(fm) => fm.encode(w),
            Self::GroupMod(gm) => gm.encode(w),
            Self::PortMod(pm) => pm.encode(w),
            Self::TableMod(tm) => tm.encode(w),
            Self::MultipartRequest(req) => req.encode(w),
            Self::MultipartReply(reply) => reply.encode(w),
            Self::RoleRequest(role) | Self::RoleReply(role) => role.encode(w),
            Self::GetAsyncReply(config) | Self::SetAsync(config) => config.encode(w),
            Self::MeterMod(mm) => mm.encode(w),
        }
    }

    fn decode_body(kind: Kind, cur: &mut Cursor<'_>, depth: usize) -> Result<Self> {
        Ok(match kind {
            Kind::Hello => Self::Hello(Hello::decode(cur)?),
            Kind::Error => Self::Error(ErrorMsg::decode(cur)?),
            Kind::EchoRequest => Self::EchoRequest(cur.rest().to_vec()),
            Kind::EchoReply => Self::EchoReply(cur.rest().to_vec()),
            Kind::Experimenter => {
                let experimenter = cur.read_u32()?;
                let exp_type = cur.read_u32()?;
                let payload = match (experimenter, exp_type) {
                    (bundle::ONF_EXPERIMENTER_ID, bundle::ONF_ET_BUNDLE_CONTROL) => {
                        ExperimenterPayload::Onf(OnfMessage::BundleControl(BundleControl::decode(
                            cur,
                        )?))
                    },
                    (bundle::ONF_EXPERIMENTER_ID, bundle::ONF_ET_BUNDLE_ADD_MESSAGE) => {
                        ExperimenterPayload::Onf(OnfMessage::BundleAdd(Box::new(
                            BundleAdd::decode(cur, depth)?,
                        )))
                    },
                    _ => ExperimenterPayload::Unknown {
                        experimenter,
                        exp_type,
                        data: cur.rest().to_vec(),
                    },
                };
                Self::Experimenter(payload)
            },
            Kind::FeaturesRequest => Self::FeaturesRequest,
            Kind::FeaturesReply => Self::FeaturesReply(SwitchFeatures::decode(cur)?),
            Kind::GetConfigRequest => Self::GetConfigRequest,
            Kind::GetConfigReply => Self::GetConfigReply(SwitchConfig::decode(cur)?),
            Kind::SetConfig => Self::SetConfig(SwitchConfig::decode(cur)?),
            Kind::PacketIn => Self::PacketIn(PacketIn::decode(cur)?),
            Kind::FlowRemoved => Self::FlowRemoved(FlowRemoved::decode(cur)?),
            Kind::PortStatus => Self::PortStatus(PortStatus::decode(cur)?),
            Kind::PacketOut => Self::PacketOut(PacketOut::decode(cur)?),
            Kind::FlowMod => Self::FlowMod(Box::new(FlowMod::decode(cur)?)),
            Kind::GroupMod => Self::GroupMod(GroupMod::decode(cur)?),
            Kind::PortMod => Self::PortMod(PortMod::decode(cur)?),
            Kind::TableMod => Self::TableMod(TableMod::decode(cur)?),
            Kind::MultipartRequest => Self::MultipartRequest(MultipartRequest::decode(cur)?),
            Kind::MultipartReply => Self::MultipartReply(MultipartReply::decode(cur)?),
            Kind::BarrierRequest => Self::BarrierRequest,
            Kind::BarrierReply => Self::BarrierReply,
            Kind::RoleRequest => Self::RoleRequest(Role::decode(cur)?),
            Kind::RoleReply => Self::RoleReply(Role::decode(cur)?),
            Kind::GetAsyncRequest => Self::GetAsyncRequest,
            Kind::GetAsyncReply => Self::GetAsyncReply(AsyncConfig::decode(cur)?),
            Kind::SetAsync => Self::SetAsync(AsyncConfig::decode(cur)?),
            Kind::MeterMod => Self::MeterMod(MeterMod::decode(cur)?),
        })
    }
}

/// A complete OpenFlow 1.3 message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Transaction id correlating replies with requests.
    pub xid: u32,
    /// The typed body.
    pub payload: Payload,
}

impl Message {
    /// Build a message.
    #[must_use]
    pub fn new(xid: u32, payload: Payload) -> Self {
        Self { xid, payload }
    }

    /// The message type.
    #[must_use]
    pub fn kind(&self) -> Kind {
        self.payload.kind()
    }

    /// Total length on the wire, header included.
    #[must_use]
    pub fn wire_len(&self) -> usize {
        Header::SIZE + self.payload.body_len()
    }

    /// Serialize header and body into a fresh buffer.
    pub fn encode_to_bytes(&self) -> Result<Bytes> {
        let total = self.wire_len();
        if total > usize::from(u16::MAX) {
            return Err(WireError::Encode("message exceeds u16 length"));
        }
        let mut w = Writer::new();
        w.put_u8(WIRE_VERSION);
        w.put_u8(self.kind() as u8);
        w.put_u16(total as u16);
        w.put_u32(self.xid);
        self.payload.encode_body(&mut w)?;
        debug_assert_eq!(w.len(), total);
        Ok(w.freeze())
    }

    /// Parse one complete frame. The slice must hold exactly the message
    /// the header's length field declares.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Self::decode_with_depth(bytes, 0)
    }

    pub(crate) fn decode_with_depth(bytes: &[u8], depth: usize) -> Result<Self> {
        if depth > DEPTH_LIMIT {
            return Err(WireError::DepthExceeded(DEPTH_LIMIT));
        }

        let header = Header::from_bytes(bytes)?;
        if header.version() != WIRE_VERSION {
            return Err(WireError::UnsupportedVersion(header.version()));
        }
        if usize::from(header.length()) != bytes.len() {
            return Err(WireError::Invariant("frame length disagrees with header"));
        }

        let kind = Kind::from_wire(header.msg_type())?;
        let mut cur = Cursor::with_base(&bytes[Header::SIZE..], Header::SIZE);
        let payload = Payload::decode_body(kind, &mut cur, depth)?;
        if !cur.is_empty() {
            return Err(WireError::Invariant("message body longer than its structures"));
        }

        Ok(Self { xid: header.xid(), payload })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hello_round_trip() {
        let msg = Message::new(0x10, Payload::Hello(Hello::with_versions(&[WIRE_VERSION])));
        let bytes = msg.encode_to_bytes().unwrap();
        assert_eq!(bytes[0], WIRE_VERSION);
        assert_eq!(bytes[1], Kind::Hello as u8);
        assert_eq!(Message::decode(&bytes).unwrap(), msg);
    }

    #[test]
    fn echo_round_trip() {
        let msg = Message::new(5, Payload::EchoRequest(vec![1, 2, 3]));
        let bytes = msg.encode_to_bytes().unwrap();
        assert_eq!(bytes.len(), 11);
        assert_eq!(Message::decode(&bytes).unwrap(), msg);
    }

    #[test]
    fn unit_payloads_are_header_only() {
        for payload in [
            Payload::FeaturesRequest,
            Payload::GetConfigRequest,
            Payload::BarrierRequest,
            Payload::BarrierReply,
            Payload::GetAsyncRequest,
        ] {
            let msg = Message::new(1, payload);
            assert_eq!(msg.encode_to_bytes().unwrap().len(), 8);
        }
    }

    #[test]
    fn version_is_checked() {
        let msg = Message::new(1, Payload::BarrierRequest);
        let mut bytes = msg.encode_to_bytes().unwrap().to_vec();
        bytes[0] = 6;
        assert_eq!(Message::decode(&bytes).unwrap_err(), WireError::UnsupportedVersion(6));
    }

    #[test]
    fn length_is_authoritative() {
        let msg = Message::new(1, Payload::EchoRequest(vec![7; 4]));
        let mut bytes = msg.encode_to_bytes().unwrap().to_vec();
        bytes.push(0); // trailing garbage the header does not cover
        assert!(Message::decode(&bytes).is_err());
    }

    #[test]
    fn unknown_kind_is_fatal() {
        let bytes = [WIRE_VERSION, 23, 0, 8, 0, 0, 0, 1];
        assert!(matches!(
            Message::decode(&bytes),
            Err(WireError::UnknownDiscriminant { family: "message type", .. }),
        ));
    }

    #[test]
    fn unknown_experimenter_round_trips() {
        let msg = Message::new(
            2,
            Payload::Experimenter(ExperimenterPayload::Unknown {
                experimenter: 0x00AA_BBCC,
                exp_type: 9,
                data: vec![1, 2, 3, 4],
            }),
        );
        let bytes = msg.encode_to_bytes().unwrap();
        assert_eq!(Message::decode(&bytes).unwrap(), msg);
    }
}
