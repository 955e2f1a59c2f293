//! Round-trip properties over whole 1.3 messages.
//!
//! `Message::decode(m.encode_to_bytes()) == m`, the header length equals the
//! computed wire length, and frames that carry pad-to-8 structures stay
//! 8-aligned.

use proptest::prelude::*;

use flowlink_wire::Codec;

use flowlink_of13::{
    BundleAdd, BundleControl, BundleCtrlType, ErrorMsg, ExperimenterPayload, FlowMod,
    FlowModCommand, Hello, Message, MeterMod, MultipartReply, MultipartReplyBody,
    MultipartRequest, MultipartRequestBody, OnfMessage, PacketIn, Payload, SwitchConfig,
    SwitchFeatures, TableFeatures, bundle, meter_mod,
};
use flowlink_wire::instruction::Instruction;
use flowlink_wire::meter::MeterBand;
use flowlink_wire::oxm::{Match, MatchField};

fn arb_match() -> impl Strategy<Value = Match> {
    prop::collection::vec(
        prop_oneof![
            any::<u32>().prop_map(MatchField::in_port),
            any::<u16>().prop_map(MatchField::eth_type),
            (any::<[u8; 6]>(), any::<Option<[u8; 6]>>())
                .prop_map(|(a, m)| MatchField::eth_dst(a, m)),
            any::<u8>().prop_map(MatchField::ip_proto),
        ],
        0..4,
    )
    .prop_map(|fields| Match { fields })
}

fn arb_instructions() -> impl Strategy<Value = Vec<Instruction>> {
    prop::collection::vec(
        prop_oneof![
            (0u8..=254).prop_map(|t| Instruction::goto_table(t).expect("bounded")),
            (any::<u64>(), any::<u64>())
                .prop_map(|(metadata, mask)| Instruction::WriteMetadata { metadata, mask }),
            Just(Instruction::ClearActions),
            any::<u32>().prop_map(Instruction::Meter),
        ],
        0..3,
    )
}

fn arb_flow_mod() -> impl Strategy<Value = FlowMod> {
    (
        any::<u64>(),
        any::<u8>(),
        prop_oneof![
            Just(FlowModCommand::Add),
            Just(FlowModCommand::Modify),
            Just(FlowModCommand::Delete),
            Just(FlowModCommand::DeleteStrict),
        ],
        any::<u16>(),
        arb_match(),
        arb_instructions(),
    )
        .prop_map(|(cookie, table_id, command, priority, match_, instructions)| FlowMod {
            cookie,
            table_id,
            command,
            priority,
            match_,
            instructions,
            ..FlowMod::default()
        })
}

fn arb_payload() -> impl Strategy<Value = Payload> {
    prop_oneof![
        Just(Payload::Hello(Hello::with_versions(&[4, 6]))),
        prop::collection::vec(any::<u8>(), 0..32).prop_map(Payload::EchoRequest),
        prop::collection::vec(any::<u8>(), 0..32).prop_map(Payload::EchoReply),
        (any::<u16>(), any::<u16>(), prop::collection::vec(any::<u8>(), 0..16)).prop_map(
            |(err_type, code, data)| {
                Payload::Error(ErrorMsg::Standard { err_type: err_type % 14, code, data })
            }
        ),
        Just(Payload::FeaturesRequest),
        (any::<u64>(), any::<u32>(), any::<u8>()).prop_map(|(datapath_id, n_buffers, n_tables)| {
            Payload::FeaturesReply(SwitchFeatures {
                datapath_id,
                n_buffers,
                n_tables,
                ..SwitchFeatures::default()
            })
        }),
        (any::<u16>(), any::<u16>()).prop_map(|(flags, miss_send_len)| {
            Payload::SetConfig(SwitchConfig { flags, miss_send_len })
        }),
        (arb_match(), prop::collection::vec(any::<u8>(), 0..64)).prop_map(|(match_, data)| {
            Payload::PacketIn(PacketIn { match_, data, ..PacketIn::default() })
        }),
        arb_flow_mod().prop_map(|fm| Payload::FlowMod(Box::new(fm))),
        Just(Payload::BarrierRequest),
        (any::<u32>(), any::<u32>(), any::<u32>()).prop_map(|(rate, burst, meter_id)| {
            Payload::MeterMod(MeterMod {
                command: meter_mod::OFPMC_ADD,
                flags: meter_mod::OFPMF_KBPS,
                meter_id,
                bands: vec![MeterBand::Drop { rate, burst_size: burst }],
            })
        }),
    ]
}

proptest! {
    #[test]
    fn message_round_trip(xid in any::<u32>(), payload in arb_payload()) {
        let message = Message::new(xid, payload);
        let bytes = message.encode_to_bytes().unwrap();

        // Length law: the header's length field is the frame length.
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
        fm.command = FlowModCommand::Delete;
        let without = 40 + fm.match_.wire_len();
        prop_assert_eq!(fm.wire_len(), without);

        fm.command = FlowModCommand::Add;
        let with = fm.wire_len();
        prop_assert_eq!(with, without + flowlink_wire::instruction::list_len(&fm.instructions));
    }

    #[test]
    fn truncated_frames_error_cleanly(payload in arb_payload(), cut in 1usize..16) {
        let message = Message::new(1, payload);
        let bytes = message.encode_to_bytes().unwrap();
        if bytes.len() > cut {
            // A shortened slice disagrees with the header length.
            prop_assert!(Message::decode(&bytes[..bytes.len() - cut]).is_err());
        }
    }
}

#[test]
fn bundle_control_is_twenty_four_bytes() {
    let message = Message::new(
        0x42,
        Payload::Experimenter(ExperimenterPayload::Onf(OnfMessage::BundleControl(
            BundleControl {
                bundle_id: 100,
                ctrl_type: BundleCtrlType::OpenRequest,
                flags: bundle::OFPBF_ATOMIC,
            },
        ))),
    );
    let bytes = message.encode_to_bytes().unwrap();
    assert_eq!(bytes.len(), 24);
    assert_eq!(Message::decode(&bytes).unwrap(), message);
}

#[test]
fn bundle_add_round_trips_inner_flow_mod() {
    let mut match_ = Match::new();
    match_.push(MatchField::eth_type(0x0800));
    let inner = Message::new(
        7,
        Payload::FlowMod(Box::new(FlowMod { priority: 1, match_, ..FlowMod::default() })),
    );
    let message = Message::new(
        8,
        Payload::Experimenter(ExperimenterPayload::Onf(OnfMessage::BundleAdd(Box::new(
            BundleAdd { bundle_id: 100, flags: bundle::OFPBF_ATOMIC, message: inner },
        )))),
    );
    let bytes = message.encode_to_bytes().unwrap();
    assert_eq!(Message::decode(&bytes).unwrap(), message);
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

    let reply = Message::new(
        10,
        Payload::MultipartReply(MultipartReply {
            flags: 0,
            body: MultipartReplyBody::TableFeatures(vec![TableFeatures {
                table_id: 10,
                name: "table-10".to_string(),
                max_entries: 100_000,
                ..TableFeatures::default()
            }]),
        }),
    );
    let bytes = reply.encode_to_bytes().unwrap();
    assert_eq!(Message::decode(&bytes).unwrap(), reply);
}
