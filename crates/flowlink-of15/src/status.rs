//! Switch-initiated status notifications new in 1.4/1.5: role status,
//! table status, and request forwarding.

use flowlink_wire::{Codec, Cursor, Result, WireError, Writer};

use crate::Message;

/// Role-status reason: another controller asked for master.
pub const OFPCRR_MASTER_REQUEST: u8 = 0;
/// Role-status reason: configuration changed the role.
pub const OFPCRR_CONFIG: u8 = 1;
/// Role-status reason: experimenter-defined.
pub const OFPCRR_EXPERIMENTER: u8 = 2;

/// Role-status body: the switch reports a role change.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RoleStatus {
    /// The controller's new role.
    pub role: u32,
    /// `OFPCRR_*` reason.
    pub reason: u8,
    /// Master-election generation.
    pub generation_id: u64,
    /// Raw property TLVs, preserved as received.
    pub properties: Vec<u8>,
}

impl Codec for RoleStatus {
    fn wire_len(&self) -> usize {
        16 + self.properties.len()
    }

    fn encode(&self, w: &mut Writer) -> Result<()> {
        w.put_u32(self.role);
        w.put_u8(self.reason);
        w.put_zeros(3);
        w.put_u64(self.generation_id);
        w.put_slice(&self.properties);
        Ok(())
    }

    fn decode(cur: &mut Cursor<'_>) -> Result<Self> {
        let role = cur.read_u32()?;
        let reason = cur.read_u8()?;
        cur.skip(3)?;
        let generation_id = cur.read_u64()?;
        Ok(Self { role, reason, generation_id, properties: cur.rest().to_vec() })
    }
}

/// One table's description: config plus properties.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableDesc {
    /// Table id.
    pub table_id: u8,
    /// `OFPTC_*` config bits.
    pub config: u32,
    /// Raw property TLVs (eviction, vacancy), preserved as received.
    pub properties: Vec<u8>,
}

impl Codec for TableDesc {
    fn wire_len(&self) -> usize {
        8 + self.properties.len()
    }

    fn encode(&self, w: &mut Writer) -> Result<()> {
        let len = self.wire_len();
        if len > usize::from(u16::MAX) {
            return Err(WireError::Encode("table desc exceeds u16 length"));
        }
        w.put_u16(len as u16);
        w.put_u8(self.table_id);
        w.put_u8(0);
        w.put_u32(self.config);
        w.put_slice(&self.properties);
        Ok(())
    }

    fn decode(cur: &mut Cursor<'_>) -> Result<Self> {
        let len = cur.read_u16()? as usize;
        let mut body = cur.subcursor(len, 2)?;
        let table_id = body.read_u8()?;
        body.skip(1)?;
        let config = body.read_u32()?;
        Ok(Self { table_id, config, properties: body.rest().to_vec() })
    }
}

/// Table-status reason: vacancy fell below the down threshold.
pub const OFPTR_VACANCY_DOWN: u8 = 3;
/// Table-status reason: vacancy rose above the up threshold.
pub const OFPTR_VACANCY_UP: u8 = 4;

/// Table-status body: the switch reports a table state change.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableStatus {
    /// `OFPTR_*` reason.
    pub reason: u8,
    /// The table as it now stands.
    pub table: TableDesc,
}

impl Codec for TableStatus {
    fn wire_len(&self) -> usize {
        8 + self.table.wire_len()
    }

    fn encode(&self, w: &mut Writer) -> Result<()> {
        w.put_u8(self.reason);
        w.put_zeros(7);
        self.table.encode(w)
    }

    fn decode(cur: &mut Cursor<'_>) -> Result<Self> {
        let reason = cur.read_u8()?;
        cur.skip(7)?;
        Ok(Self { reason, table: TableDesc::decode(cur)? })
    }
}

/// Request-forward body: a request another controller made, forwarded to
/// this one (group/meter mods under the default async config).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestForward {
    /// The forwarded request, with its own header.
    pub request: Message,
}

impl RequestForward {
    /// Body length (the inner message).
    #[must_use]
    pub fn wire_len(&self) -> usize {
        self.request.wire_len()
    }

    /// Serialize the inner message.
    pub fn encode(&self, w: &mut Writer) -> Result<()> {
        let inner = self.request.encode_to_bytes()?;
        w.put_slice(&inner);
        Ok(())
    }

    /// Parse the inner message; `depth` guards recursive forwarding.
    pub fn decode(cur: &mut Cursor<'_>, depth: usize) -> Result<Self> {
        Ok(Self { request: Message::decode_with_depth(cur.rest(), depth + 1)? })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowlink_wire::{decode_from_slice, encode_to_vec};

    #[test]
    fn role_status_round_trip() {
        let rs = RoleStatus {
            role: crate::role::OFPCR_ROLE_SLAVE,
            reason: OFPCRR_MASTER_REQUEST,
            generation_id: 3,
            properties: Vec::new(),
        };
        let bytes = encode_to_vec(&rs).unwrap();
        assert_eq!(bytes.len(), 16);
        assert_eq!(decode_from_slice::<RoleStatus>(&bytes).unwrap(), rs);
    }

    #[test]
    fn table_status_round_trip() {
        let ts = TableStatus {
            reason: OFPTR_VACANCY_DOWN,
            table: TableDesc { table_id: 4, config: 0xC, properties: vec![0, 3, 0, 8, 20, 80, 25, 0] },
        };
        let bytes = encode_to_vec(&ts).unwrap();
        assert_eq!(decode_from_slice::<TableStatus>(&bytes).unwrap(), ts);
    }
}
