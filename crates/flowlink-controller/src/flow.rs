//! Flow descriptors: what a consumer installs and deletes through a session.

use flowlink_wire::Version;
use flowlink_wire::instruction::Instruction;
use flowlink_wire::oxm::Match;

use crate::message::OwnedMessage;

/// A version-neutral flow description.
///
/// The switch session turns one of these into the catalog-correct flow-mod,
/// building a fresh instruction container on every call, and keys its local
/// flow table by [`Match::canonical_key`] so two descriptors with the same
/// fields in a different order address the same entry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Flow {
    /// Match criteria.
    pub match_: Match,
    /// Matching precedence.
    pub priority: u16,
    /// Target table.
    pub table_id: u8,
    /// Opaque controller cookie.
    pub cookie: u64,
    /// Idle timeout in seconds, 0 for none.
    pub idle_timeout: u16,
    /// Hard timeout in seconds, 0 for none.
    pub hard_timeout: u16,
    /// Flow-mod flags.
    pub flags: u16,
    /// Instructions applied to matching packets.
    pub instructions: Vec<Instruction>,
}

impl Flow {
    /// Canonical flow-table key for this flow's match.
    #[must_use]
    pub fn key(&self) -> Vec<u8> {
        self.match_.canonical_key()
    }

    /// Build the add flow-mod for `version`.
    #[must_use]
    pub fn to_add(&self, version: Version, xid: u32) -> OwnedMessage {
        self.to_flow_mod(version, xid, false)
    }

    /// Build the strict-delete flow-mod for `version`.
    #[must_use]
    pub fn to_delete(&self, version: Version, xid: u32) -> OwnedMessage {
        self.to_flow_mod(version, xid, true)
    }

    fn to_flow_mod(&self, version: Version, xid: u32, delete: bool) -> OwnedMessage {
        match version {
            Version::OpenFlow13 => {
                let command = if delete {
                    flowlink_of13::FlowModCommand::DeleteStrict
                } else {
                    flowlink_of13::FlowModCommand::Add
                };
                OwnedMessage::V13(flowlink_of13::Message::new(
                    xid,
                    flowlink_of13::Payload::FlowMod(Box::new(flowlink_of13::FlowMod {
                        cookie: self.cookie,
                        table_id: self.table_id,
                        command,
                        idle_timeout: self.idle_timeout,
                        hard_timeout: self.hard_timeout,
                        priority: self.priority,
                        flags: self.flags,
                        match_: self.match_.clone(),
                        // A fresh container per call; nothing shared.
                        instructions: if delete { Vec::new() } else { self.instructions.clone() },
                        ..flowlink_of13::FlowMod::default()
                    })),
                ))
            },
            Version::OpenFlow15 => {
                let command = if delete {
                    flowlink_of15::FlowModCommand::DeleteStrict
                } else {
                    flowlink_of15::FlowModCommand::Add
                };
                OwnedMessage::V15(flowlink_of15::Message::new(
                    xid,
                    flowlink_of15::Payload::FlowMod(Box::new(flowlink_of15::FlowMod {
                        cookie: self.cookie,
                        table_id: self.table_id,
                        command,
                        idle_timeout: self.idle_timeout,
                        hard_timeout: self.hard_timeout,
                        priority: self.priority,
                        flags: self.flags,
                        match_: self.match_.clone(),
                        instructions: if delete { Vec::new() } else { self.instructions.clone() },
                        ..flowlink_of15::FlowMod::default()
                    })),
                ))
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowlink_wire::action::Action;
    use flowlink_wire::oxm::MatchField;

    fn sample_flow() -> Flow {
        let mut match_ = Match::new();
        match_.push(MatchField::in_port(1));
        match_.push(MatchField::eth_type(0x0800));
        Flow {
            match_,
            priority: 100,
            table_id: 0,
            instructions: vec![Instruction::ApplyActions(vec![Action::Output {
                port: 2,
                max_len: 0,
            }])],
            ..Flow::default()
        }
    }

    #[test]
    fn key_ignores_field_order() {
        let a = sample_flow();
        let mut b = sample_flow();
        b.match_.fields.reverse();
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn add_carries_instructions_delete_does_not() {
        let flow = sample_flow();
        match flow.to_add(Version::OpenFlow13, 1) {
            OwnedMessage::V13(msg) => match msg.payload {
                flowlink_of13::Payload::FlowMod(fm) => {
                    assert_eq!(fm.command, flowlink_of13::FlowModCommand::Add);
                    assert_eq!(fm.instructions.len(), 1);
                },
                other => panic!("unexpected payload {other:?}"),
            },
            OwnedMessage::V15(_) => panic!("wrong version"),
        }
        match flow.to_delete(Version::OpenFlow15, 2) {
            OwnedMessage::V15(msg) => match msg.payload {
                flowlink_of15::Payload::FlowMod(fm) => {
                    assert_eq!(fm.command, flowlink_of15::FlowModCommand::DeleteStrict);
                    assert!(fm.instructions.is_empty());
                },
                other => panic!("unexpected payload {other:?}"),
            },
            OwnedMessage::V13(_) => panic!("wrong version"),
        }
    }

    #[test]
    fn fresh_instruction_container_per_call() {
        let flow = sample_flow();
        let first = flow.to_add(Version::OpenFlow13, 1);
        let second = flow.to_add(Version::OpenFlow13, 1);
        assert_eq!(first, second);
    }
}
