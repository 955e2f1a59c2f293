//! Property tests for the shared wire families.
//!
//! The laws under test: `decode(encode(x)) == x`, `encode` produces exactly
//! `wire_len()` bytes, pad-to-8 structures emit lengths divisible by 8, and
//! the OXM mask law (serialized length doubles when masked).

use proptest::prelude::*;

use flowlink_wire::action::{Action, ConnTrack, Nat, NxAction, ports};
use flowlink_wire::instruction::Instruction;
use flowlink_wire::meter::MeterBand;
use flowlink_wire::oxm::{Match, MatchField};
use flowlink_wire::{Codec, decode_from_slice, encode_to_vec};

fn arb_match_field() -> impl Strategy<Value = MatchField> {
    prop_oneof![
        any::<u32>().prop_map(MatchField::in_port),
        any::<u16>().prop_map(MatchField::eth_type),
        (any::<[u8; 6]>(), any::<Option<[u8; 6]>>())
            .prop_map(|(addr, mask)| MatchField::eth_dst(addr, mask)),
        (any::<u64>(), any::<Option<u64>>()).prop_map(|(v, m)| MatchField::metadata(v, m)),
        (any::<u32>(), any::<u32>()).prop_map(|(v, m)| MatchField::ct_state(v, m)),
        any::<u128>().prop_map(MatchField::ct_label),
        (any::<[u8; 4]>(), any::<Option<[u8; 4]>>()).prop_map(|(a, m)| {
            MatchField::ipv4_src(a.into(), m.map(Into::into))
        }),
        any::<u16>().prop_map(MatchField::tcp_dst),
    ]
}

fn arb_match() -> impl Strategy<Value = Match> {
    prop::collection::vec(arb_match_field(), 0..6).prop_map(|fields| Match { fields })
}

fn arb_action() -> impl Strategy<Value = Action> {
    prop_oneof![
        (any::<u32>(), any::<u16>()).prop_map(|(port, max_len)| Action::Output { port, max_len }),
        Just(Action::CopyTtlOut),
        any::<u8>().prop_map(Action::SetMplsTtl),
        any::<u16>().prop_map(Action::PushVlan),
        Just(Action::PopVlan),
        any::<u32>().prop_map(Action::Group),
        Just(Action::DecNwTtl),
        arb_match_field().prop_map(Action::SetField),
        (any::<u16>(), any::<u16>(), any::<u8>()).prop_map(|(max_len, controller_id, reason)| {
            Action::Nicira(NxAction::Controller { max_len, controller_id, reason })
        }),
        (any::<u16>(), any::<u8>()).prop_map(|(in_port, table)| {
            Action::Nicira(NxAction::ResubmitTable { in_port, table })
        }),
        prop::collection::vec(any::<u8>(), 0..24).prop_map(|data| {
            Action::Nicira(NxAction::Note(data))
        }),
    ]
}

fn arb_nat() -> impl Strategy<Value = Nat> {
    (
        any::<u16>(),
        any::<Option<[u8; 4]>>(),
        any::<Option<[u8; 4]>>(),
        any::<Option<u16>>(),
        any::<Option<u16>>(),
    )
        .prop_map(|(flags, v4min, v4max, pmin, pmax)| Nat {
            flags,
            ipv4_min: v4min.map(Into::into),
            ipv4_max: v4max.map(Into::into),
            ipv6_min: None,
            ipv6_max: None,
            proto_min: pmin,
            proto_max: pmax,
        })
}

proptest! {
    #[test]
    fn match_field_round_trip(field in arb_match_field()) {
        let bytes = encode_to_vec(&field).unwrap();
        prop_assert_eq!(bytes.len(), field.wire_len());
        let back: MatchField = decode_from_slice(&bytes).unwrap();
        prop_assert_eq!(back, field);
    }

    #[test]
    fn match_field_mask_law(field in arb_match_field()) {
        let expected = field.value().len() * if field.has_mask() { 2 } else { 1 };
        prop_assert_eq!(field.payload_len(), expected);
        let bytes = encode_to_vec(&field).unwrap();
        prop_assert_eq!(usize::from(bytes[3]), expected);
    }

    #[test]
    fn match_round_trip_and_padding(m in arb_match()) {
        let bytes = encode_to_vec(&m).unwrap();
        prop_assert_eq!(bytes.len(), m.wire_len());
        prop_assert_eq!(bytes.len() % 8, 0);
        let back: Match = decode_from_slice(&bytes).unwrap();
        prop_assert_eq!(back, m);
    }

    #[test]
    fn action_round_trip_and_padding(action in arb_action()) {
        let bytes = encode_to_vec(&action).unwrap();
        prop_assert_eq!(bytes.len(), action.wire_len());
        prop_assert_eq!(bytes.len() % 8, 0);
        let back: Action = decode_from_slice(&bytes).unwrap();
        prop_assert_eq!(back, action);
    }

    #[test]
    fn conntrack_round_trip(
        flags in any::<u16>(),
        zone in any::<u16>(),
        recirc in any::<u8>(),
        nat in arb_nat(),
        inner in prop::collection::vec(arb_action(), 0..3),
    ) {
        let mut actions: Vec<Action> = inner;
        actions.push(Action::Nicira(NxAction::Nat(nat)));
        let ct = Action::Nicira(NxAction::ConnTrack(ConnTrack {
            flags,
            zone_src: 0,
            zone,
            recirc_table: recirc,
            alg: 0,
            actions,
        }));
        let bytes = encode_to_vec(&ct).unwrap();
        prop_assert_eq!(bytes.len() % 8, 0);
        let back: Action = decode_from_slice(&bytes).unwrap();
        prop_assert_eq!(back, ct);
    }

    #[test]
    fn instruction_round_trip(
        table in 0u8..=254,
        metadata in any::<u64>(),
        mask in any::<u64>(),
        actions in prop::collection::vec(arb_action(), 0..4),
        meter in any::<u32>(),
    ) {
        for instruction in [
            Instruction::goto_table(table).unwrap(),
            Instruction::WriteMetadata { metadata, mask },
            Instruction::ApplyActions(actions.clone()),
            Instruction::WriteActions(actions),
            Instruction::ClearActions,
            Instruction::Meter(meter),
        ] {
            let bytes = encode_to_vec(&instruction).unwrap();
            prop_assert_eq!(bytes.len(), instruction.wire_len());
            prop_assert_eq!(bytes.len() % 8, 0);
            let back: Instruction = decode_from_slice(&bytes).unwrap();
            prop_assert_eq!(back, instruction);
        }
    }

    #[test]
    fn meter_band_round_trip(rate in any::<u32>(), burst in any::<u32>(), prec in any::<u8>()) {
        for band in [
            MeterBand::Drop { rate, burst_size: burst },
            MeterBand::DscpRemark { rate, burst_size: burst, prec_level: prec },
        ] {
            let bytes = encode_to_vec(&band).unwrap();
            prop_assert_eq!(bytes.len(), band.wire_len());
            let back: MeterBand = decode_from_slice(&bytes).unwrap();
            prop_assert_eq!(back, band);
        }
    }

    #[test]
    fn truncation_never_panics(action in arb_action(), cut in 0usize..8) {
        let bytes = encode_to_vec(&action).unwrap();
        let cut = bytes.len().saturating_sub(cut + 1);
        // Every truncation either fails cleanly or (for a prefix that is
        // itself well-formed) parses; it must never panic.
        let _ = decode_from_slice::<Action>(&bytes[..cut]);
    }
}

#[test]
fn output_to_controller_is_sixteen_bytes() {
    let action = Action::Output { port: ports::CONTROLLER, max_len: 0xFFFF };
    assert_eq!(encode_to_vec(&action).unwrap().len(), 16);
}
