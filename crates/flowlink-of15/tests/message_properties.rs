//! Round-trip properties over whole 1.5 messages.

use proptest::prelude::*;

use flowlink_wire::Codec;

use flowlink_of15::{
    AsyncConfig, AsyncProp, BundleAdd, BundleControl, BundleCtrlType, FlowMod, FlowModCommand,
    Hello, Message, MultipartReply, MultipartReplyBody, MultipartRequest, MultipartRequestBody,
    PacketIn, Payload, Port, PortProp, RequestForward, Role, RoleStatus, TableFeatures, bundle,
    multipart, role,
};
use flowlink_wire::instruction::Instruction;
use flowlink_wire::oxm::{Match, MatchField};

fn arb_match() -> impl Strategy<Value = Match> {
    prop::collection::vec(
        prop_oneof![
            any::<u32>().prop_map(MatchField::in_port),
            any::<u16>().prop_map(MatchField::eth_type),
            (any::<u32>(), any::<u32>()).prop_map(|(v, m)| MatchField::ct_state(v, m)),
            any::<u16>().prop_map(MatchField::udp_dst),
        ],
        0..4,
    )
    .prop_map(|fields| Match { fields })
}

fn arb_flow_mod() -> impl Strategy<Value = FlowMod> {
    (
        any::<u64>(),
        any::<u8>(),
        prop_oneof![
            Just(FlowModCommand::Add),
            Just(FlowModCommand::ModifyStrict),
            Just(FlowModCommand::Delete),
        ],
        any::<u16>(),
        any::<u16>(),
        arb_match(),
    )
        .prop_map(|(cookie, table_id, command, priority, importance, match_)| FlowMod {
            cookie,
            table_id,
            command,
            priority,
            importance,
            match_,
            instructions: vec![Instruction::ClearActions],
            ..FlowMod::default()
        })
}

fn arb_payload() -> impl Strategy<Value = Payload> {
    prop_oneof![
        Just(Payload::Hello(Hello::with_versions(&[6]))),
        prop::collection::vec(any::<u8>(), 0..32).prop_map(Payload::EchoRequest),
        Just(Payload::FeaturesRequest),
        (arb_match(), prop::collection::vec(any::<u8>(), 0..64)).prop_map(|(match_, data)| {
            Payload::PacketIn(PacketIn { match_, data, ..PacketIn::default() })
        }),
        arb_flow_mod().prop_map(|fm| Payload::FlowMod(Box::new(fm))),
        (any::<u32>(), any::<u64>()).prop_map(|(r, generation_id)| {
            Payload::RoleRequest(Role { role: r % 4, generation_id })
        }),
        (any::<u32>(), any::<u32>()).prop_map(|(a, b)| {
            Payload::SetAsync(AsyncConfig {
                properties: vec![
                    AsyncProp::Mask { prop_type: role::OFPACPT_PACKET_IN_MASTER, mask: a },
                    AsyncProp::Mask { prop_type: role::OFPACPT_PORT_STATUS_SLAVE, mask: b },
                ],
            })
        }),
        (any::<u32>(), any::<u8>(), any::<u64>()).prop_map(|(r, reason, generation_id)| {
            Payload::RoleStatus(RoleStatus {
                role: r % 4,
                reason: reason % 3,
                generation_id,
                properties: Vec::new(),
            })
        }),
        (any::<u32>(), any::<u16>()).prop_map(|(bundle_id, flags)| {
            Payload::BundleControl(BundleControl::new(
                bundle_id,
                BundleCtrlType::CommitRequest,
                flags & 0x3,
            ))
        }),
        Just(Payload::BarrierReply),
    ]
}

proptest! {
    #[test]
    fn message_round_trip(xid in any::<u32>(), payload in arb_payload()) {
        let message = Message::new(xid, payload);
        let bytes = message.encode_to_bytes().unwrap();

        prop_assert_eq!(bytes.len(), message.wire_len());
        prop_assert_eq!(
            usize::from(u16::from_be_bytes([bytes[2], bytes[3]])),
            bytes.len(),
        );

        let back = Message::decode(&bytes).unwrap();
        prop_assert_eq!(back, message);
    }

    #[test]
    fn flow_mod_delete_omission(mut fm in arb_flow_mod()) {
        fm.command = FlowModCommand::DeleteStrict;
        prop_assert_eq!(fm.wire_len(), 40 + fm.match_.wire_len());
        fm.command = FlowModCommand::Add;
        prop_assert!(fm.wire_len() > 40 + fm.match_.wire_len());
    }
}

#[test]
fn native_bundle_control_is_sixteen_bytes() {
    let message = Message::new(
        0x42,
        Payload::BundleControl(BundleControl::new(
            100,
            BundleCtrlType::OpenRequest,
            bundle::OFPBF_ATOMIC,
        )),
    );
    let bytes = message.encode_to_bytes().unwrap();
    assert_eq!(bytes.len(), 16);
    assert_eq!(Message::decode(&bytes).unwrap(), message);
}

#[test]
fn bundle_add_round_trips_inner_message() {
    let inner = Message::new(9, Payload::FeaturesRequest);
    let message = Message::new(
        10,
        Payload::BundleAddMessage(Box::new(BundleAdd {
            bundle_id: 100,
            flags: bundle::OFPBF_ORDERED,
            message: inner,
            properties: Vec::new(),
        })),
    );
    let bytes = message.encode_to_bytes().unwrap();
    assert_eq!(Message::decode(&bytes).unwrap(), message);
}

#[test]
fn request_forward_round_trips() {
    let forwarded = Message::new(3, Payload::BarrierRequest);
    let message = Message::new(
        4,
        Payload::RequestForward(Box::new(RequestForward { request: forwarded })),
    );
    let bytes = message.encode_to_bytes().unwrap();
    assert_eq!(Message::decode(&bytes).unwrap(), message);
}

#[test]
fn port_desc_reply_round_trips() {
    let reply = Message::new(
        5,
        Payload::MultipartReply(MultipartReply {
            flags: multipart::OFPMPF_MORE,
            body: MultipartReplyBody::PortDesc(vec![Port {
                port_no: 1,
                hw_addr: [2; 6],
                name: "sw0-eth1".to_string(),
                properties: vec![PortProp::Ethernet {
                    curr: 0x840,
                    advertised: 0,
                    supported: 0,
                    peer: 0,
                    curr_speed: 1_000_000,
                    max_speed: 10_000_000,
                }],
                ..Port::default()
            }]),
        }),
    );
    let bytes = reply.encode_to_bytes().unwrap();
    assert_eq!(Message::decode(&bytes).unwrap(), reply);
}

#[test]
fn table_features_multipart_round_trip() {
    let request = Message::new(
        10,
        Payload::MultipartRequest(MultipartRequest::new(MultipartRequestBody::TableFeatures(
            vec![TableFeatures {
                table_id: 10,
                name: "table-10".to_string(),
                max_entries: 100_000,
                ..TableFeatures::default()
            }],
        ))),
    );
    let bytes = request.encode_to_bytes().unwrap();
    assert_eq!(Message::decode(&bytes).unwrap(), request);
}
