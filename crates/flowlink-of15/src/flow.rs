//! Flow-mod, flow-removed, and table-mod in their 1.5 shapes.

use flowlink_wire::instruction::{self, Instruction};
use flowlink_wire::oxm::Match;
use flowlink_wire::{Codec, Cursor, Result, WireError, Writer};

pub use crate::packet::NO_BUFFER;

/// Flow-mod flag: send a flow-removed on expiry.
pub const OFPFF_SEND_FLOW_REM: u16 = 1 << 0;
/// Flow-mod flag: check for overlapping entries.
pub const OFPFF_CHECK_OVERLAP: u16 = 1 << 1;
/// Flow-mod flag: reset packet/byte counts.
pub const OFPFF_RESET_COUNTS: u16 = 1 << 2;
/// Flow-mod flag: do not keep packet counts.
pub const OFPFF_NO_PKT_COUNTS: u16 = 1 << 3;
/// Flow-mod flag: do not keep byte counts.
pub const OFPFF_NO_BYT_COUNTS: u16 = 1 << 4;

/// Flow-mod commands. The delete commands omit the instruction section on
/// the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FlowModCommand {
    /// Add a new flow.
    Add = 0,
    /// Modify all matching flows.
    Modify = 1,
    /// Modify flows strictly matching wildcards and priority.
    ModifyStrict = 2,
    /// Delete all matching flows.
    Delete = 3,
    /// Delete flows strictly matching wildcards and priority.
    DeleteStrict = 4,
}

impl FlowModCommand {
    /// Decode the wire byte.
    pub fn from_wire(byte: u8) -> Result<Self> {
        Ok(match byte {
            0 => Self::Add,
            1 => Self::Modify,
            2 => Self::ModifyStrict,
            3 => Self::Delete,
            4 => Self::DeleteStrict,
            other => {
                return Err(WireError::UnknownDiscriminant {
                    family: "flow-mod command",
                    value: u32::from(other),
                });
            },
        })
    }

    /// Whether this command deletes flows.
    #[must_use]
    pub fn is_delete(self) -> bool {
        matches!(self, Self::Delete | Self::DeleteStrict)
    }
}

/// Flow-mod body. 1.5 adds `importance`, the eviction precedence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowMod {
    /// Opaque controller cookie.
    pub cookie: u64,
    /// Cookie bits that must match for modify/delete.
    pub cookie_mask: u64,
    /// Target table.
    pub table_id: u8,
    /// What to do.
    pub command: FlowModCommand,
    /// Idle timeout in seconds, 0 for none.
    pub idle_timeout: u16,
    /// Hard timeout in seconds, 0 for none.
    pub hard_timeout: u16,
    /// Matching precedence.
    pub priority: u16,
    /// Buffered packet to apply the flow to, or [`NO_BUFFER`].
    pub buffer_id: u32,
    /// Output-port filter for delete commands.
    pub out_port: u32,
    /// Output-group filter for delete commands.
    pub out_group: u32,
    /// `OFPFF_*` bits.
    pub flags: u16,
    /// Eviction precedence; higher survives longer.
    pub importance: u16,
    /// Match criteria.
    pub match_: Match,
    /// Instructions; ignored (and omitted from the wire) for deletes.
    pub instructions: Vec<Instruction>,
}

impl Default for FlowMod {
    fn default() -> Self {
        Self {
            cookie: 0,
            cookie_mask: 0,
            table_id: 0,
            command: FlowModCommand::Add,
            idle_timeout: 0,
            hard_timeout: 0,
            priority: 0,
            buffer_id: NO_BUFFER,
            out_port: flowlink_wire::action::ports::ANY,
            out_group: crate::group::OFPG_ANY,
            flags: 0,
            importance: 0,
            match_: Match::new(),
            instructions: Vec::new(),
        }
    }
}

impl Codec for FlowMod {
    fn wire_len(&self) -> usize {
        let fixed = 40 + self.match_.wire_len();
        if self.command.is_delete() {
            fixed
        } else {
            fixed + instruction::list_len(&self.instructions)
        }
    }

    fn encode(&self, w: &mut Writer) -> Result<()> {
        w.put_u64(self.cookie);
        w.put_u64(self.cookie_mask);
        w.put_u8(self.table_id);
        w.put_u8(self.command as u8);
        w.put_u16(self.idle_timeout);
        w.put_u16(self.hard_timeout);
        w.put_u16(self.priority);
        w.put_u32(self.buffer_id);
        w.put_u32(self.out_port);
        w.put_u32(self.out_group);
        w.put_u16(self.flags);
        w.put_u16(self.importance);
        self.match_.encode(w)?;
        if !self.command.is_delete() {
            instruction::encode_list(&self.instructions, w)?;
        }
        Ok(())
    }

    fn decode(cur: &mut Cursor<'_>) -> Result<Self> {
        let cookie = cur.read_u64()?;
        let cookie_mask = cur.read_u64()?;
        let table_id = cur.read_u8()?;
        let command = FlowModCommand::from_wire(cur.read_u8()?)?;
        let idle_timeout = cur.read_u16()?;
        let hard_timeout = cur.read_u16()?;
        let priority = cur.read_u16()?;
        let buffer_id = cur.read_u32()?;
        let out_port = cur.read_u32()?;
        let out_group = cur.read_u32()?;
        let flags = cur.read_u16()?;
        let importance = cur.read_u16()?;
        let match_ = Match::decode(cur)?;
        let instructions = instruction::decode_list(cur)?;
        Ok(Self {
            cookie,
            cookie_mask,
            table_id,
            command,
            idle_timeout,
            hard_timeout,
            priority,
            buffer_id,
            out_port,
            out_group,
            flags,
            importance,
            match_,
            instructions,
        })
    }
}

/// Flow-removed reason: idle timeout.
pub const OFPRR_IDLE_TIMEOUT: u8 = 0;
/// Flow-removed reason: hard timeout.
pub const OFPRR_HARD_TIMEOUT: u8 = 1;
/// Flow-removed reason: evicted by a delete.
pub const OFPRR_DELETE: u8 = 2;
/// Flow-removed reason: group deleted.
pub const OFPRR_GROUP_DELETE: u8 = 3;
/// Flow-removed reason: meter deleted.
pub const OFPRR_METER_DELETE: u8 = 4;
/// Flow-removed reason: eviction.
pub const OFPRR_EVICTION: u8 = 5;

/// Flow-removed body. 1.5 replaces the fixed counters with an OXS
/// statistics TLV block, carried here raw.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FlowRemoved {
    /// Table the flow lived in.
    pub table_id: u8,
    /// `OFPRR_*` reason.
    pub reason: u8,
    /// Priority of the removed flow.
    pub priority: u16,
    /// Idle timeout from the original flow-mod.
    pub idle_timeout: u16,
    /// Hard timeout from the original flow-mod.
    pub hard_timeout: u16,
    /// Cookie of the removed flow.
    pub cookie: u64,
    /// The removed flow's match.
    pub match_: Match,
    /// Raw OXS statistics TLVs, preserved as received.
    pub stats: Vec<u8>,
}

impl Codec for FlowRemoved {
    fn wire_len(&self) -> usize {
        16 + self.match_.wire_len() + self.stats.len()
    }

    fn encode(&self, w: &mut Writer) -> Result<()> {
        w.put_u8(self.table_id);
        w.put_u8(self.reason);
        w.put_u16(self.priority);
        w.put_u16(self.idle_timeout);
        w.put_u16(self.hard_timeout);
        w.put_u64(self.cookie);
        self.match_.encode(w)?;
        w.put_slice(&self.stats);
        Ok(())
    }

    fn decode(cur: &mut Cursor<'_>) -> Result<Self> {
        let table_id = cur.read_u8()?;
        let reason = cur.read_u8()?;
        let priority = cur.read_u16()?;
        let idle_timeout = cur.read_u16()?;
        let hard_timeout = cur.read_u16()?;
        let cookie = cur.read_u64()?;
        let match_ = Match::decode(cur)?;
        Ok(Self {
            table_id,
            reason,
            priority,
            idle_timeout,
            hard_timeout,
            cookie,
            match_,
            stats: cur.rest().to_vec(),
        })
    }
}

/// Table-mod body: a config plus a property list (eviction and vacancy
/// thresholds), carried raw.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableMod {
    /// Table to configure, or 0xFF for all.
    pub table_id: u8,
    /// `OFPTC_*` config bits.
    pub config: u32,
    /// Raw property TLVs, preserved as received.
    pub properties: Vec<u8>,
}

impl Codec for TableMod {
    fn wire_len(&self) -> usize {
        8 + self.properties.len()
    }

    fn encode(&self, w: &mut Writer) -> Result<()> {
        w.put_u8(self.table_id);
        w.put_zeros(3);
        w.put_u32(self.config);
        w.put_slice(&self.properties);
        Ok(())
    }

    fn decode(cur: &mut Cursor<'_>) -> Result<Self> {
        let table_id = cur.read_u8()?;
        cur.skip(3)?;
        let config = cur.read_u32()?;
        Ok(Self { table_id, config, properties: cur.rest().to_vec() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowlink_wire::action::Action;
    use flowlink_wire::oxm::MatchField;
    use flowlink_wire::{decode_from_slice, encode_to_vec};

    fn sample_match() -> Match {
        let mut m = Match::new();
        m.push(MatchField::eth_type(0x86DD));
        m
    }

    #[test]
    fn flow_mod_round_trip_with_importance() {
        let fm = FlowMod {
            command: FlowModCommand::Add,
            priority: 5,
            importance: 42,
            match_: sample_match(),
            instructions: vec![Instruction::ApplyActions(vec![Action::DecNwTtl])],
            ..FlowMod::default()
        };
        let bytes = encode_to_vec(&fm).unwrap();
        assert_eq!(bytes.len(), fm.wire_len());
        let back: FlowMod = decode_from_slice(&bytes).unwrap();
        assert_eq!(back.importance, 42);
        assert_eq!(back, fm);
    }

    #[test]
    fn delete_omits_instructions() {
        let fm = FlowMod {
            command: FlowModCommand::DeleteStrict,
            match_: sample_match(),
            instructions: vec![Instruction::ClearActions],
            ..FlowMod::default()
        };
        let bytes = encode_to_vec(&fm).unwrap();
        assert_eq!(bytes.len(), 40 + fm.match_.wire_len());
        let back: FlowMod = decode_from_slice(&bytes).unwrap();
        assert!(back.instructions.is_empty());
    }

    #[test]
    fn flow_removed_round_trip() {
        let fr = FlowRemoved {
            table_id: 1,
            reason: OFPRR_EVICTION,
            priority: 9,
            idle_timeout: 10,
            hard_timeout: 20,
            cookie: 0xAB,
            match_: sample_match(),
            stats: vec![0; 8],
        };
        let bytes = encode_to_vec(&fr).unwrap();
        assert_eq!(decode_from_slice::<FlowRemoved>(&bytes).unwrap(), fr);
    }

    #[test]
    fn table_mod_round_trip() {
        let tm = TableMod { table_id: 2, config: 0x8, properties: vec![0, 2, 0, 8, 0, 0, 0, 3] };
        let bytes = encode_to_vec(&tm).unwrap();
        assert_eq!(decode_from_slice::<TableMod>(&bytes).unwrap(), tm);
    }
}
