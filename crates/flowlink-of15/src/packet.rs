//! Packet-in and packet-out (1.5 packet-out names its ingress via a match).

use flowlink_wire::action::{self, Action};
use flowlink_wire::oxm::{Match, MatchField};
use flowlink_wire::{Codec, Cursor, Result, WireError, Writer};

/// Buffer id meaning "packet carried in full, nothing buffered".
pub const NO_BUFFER: u32 = 0xFFFF_FFFF;

/// Packet-in reason: no matching flow.
pub const OFPR_TABLE_MISS: u8 = 0;
/// Packet-in reason: an output-to-controller action.
pub const OFPR_ACTION: u8 = 1;
/// Packet-in reason: invalid TTL.
pub const OFPR_INVALID_TTL: u8 = 2;

/// Packet-in body.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PacketIn {
    /// Switch buffer holding the rest, or [`NO_BUFFER`].
    pub buffer_id: u32,
    /// Full length of the original packet.
    pub total_len: u16,
    /// `OFPR_*` reason.
    pub reason: u8,
    /// Table the lookup stopped in.
    pub table_id: u8,
    /// Cookie of the flow that fired, or all-ones on no-match.
    pub cookie: u64,
    /// Pipeline fields describing the packet (at least `in_port`).
    pub match_: Match,
    /// The packet bytes.
    pub data: Vec<u8>,
}

impl Codec for PacketIn {
    fn wire_len(&self) -> usize {
        16 + self.match_.wire_len() + 2 + self.data.len()
    }

    fn encode(&self, w: &mut Writer) -> Result<()> {
        w.put_u32(self.buffer_id);
        w.put_u16(self.total_len);
        w.put_u8(self.reason);
        w.put_u8(self.table_id);
        w.put_u64(self.cookie);
        self.match_.encode(w)?;
        w.put_zeros(2);
        w.put_slice(&self.data);
        Ok(())
    }

    fn decode(cur: &mut Cursor<'_>) -> Result<Self> {
        let buffer_id = cur.read_u32()?;
        let total_len = cur.read_u16()?;
        let reason = cur.read_u8()?;
        let table_id = cur.read_u8()?;
        let cookie = cur.read_u64()?;
        let match_ = Match::decode(cur)?;
        cur.skip(2)?;
        Ok(Self { buffer_id, total_len, reason, table_id, cookie, match_, data: cur.rest().to_vec() })
    }
}

/// Packet-out body. Unlike 1.3, the ingress context is a full match whose
/// `in_port` field stands in for the old fixed field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketOut {
    /// Buffer to release, or [`NO_BUFFER`] when `data` carries the packet.
    pub buffer_id: u32,
    /// Pipeline context; must contain `in_port`.
    pub match_: Match,
    /// Actions applied to the packet.
    pub actions: Vec<Action>,
    /// Packet bytes; must be empty unless `buffer_id` is [`NO_BUFFER`].
    pub data: Vec<u8>,
}

impl Default for PacketOut {
    fn default() -> Self {
        let mut match_ = Match::new();
        match_.push(MatchField::in_port(action::ports::CONTROLLER));
        Self { buffer_id: NO_BUFFER, match_, actions: Vec::new(), data: Vec::new() }
    }
}

impl Codec for PacketOut {
    fn wire_len(&self) -> usize {
        8 + self.match_.wire_len() + action::list_len(&self.actions) + self.data.len()
    }

    fn encode(&self, w: &mut Writer) -> Result<()> {
        let actions_len = action::list_len(&self.actions);
        if actions_len > usize::from(u16::MAX) {
            return Err(WireError::Encode("packet-out action list exceeds u16 length"));
        }
        w.put_u32(self.buffer_id);
        w.put_u16(actions_len as u16);
        w.put_zeros(2);
        self.match_.encode(w)?;
        action::encode_list(&self.actions, w)?;
        w.put_slice(&self.data);
        Ok(())
    }

    fn decode(cur: &mut Cursor<'_>) -> Result<Self> {
        let buffer_id = cur.read_u32()?;
        let actions_len = cur.read_u16()? as usize;
        cur.skip(2)?;
        let match_ = Match::decode(cur)?;
        let mut actions_cur = cur.subcursor(actions_len, 0)?;
        let actions = action::decode_list(&mut actions_cur)?;
        Ok(Self { buffer_id, match_, actions, data: cur.rest().to_vec() })
    }
}
