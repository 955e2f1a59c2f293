//! Controller role and the property-based async-message configuration.

use flowlink_wire::{Codec, Cursor, Result, WireError, Writer, padded8};

/// Role: do not change, just report.
pub const OFPCR_ROLE_NOCHANGE: u32 = 0;
/// Role: full access, default.
pub const OFPCR_ROLE_EQUAL: u32 = 1;
/// Role: exclusive write access.
pub const OFPCR_ROLE_MASTER: u32 = 2;
/// Role: read-only.
pub const OFPCR_ROLE_SLAVE: u32 = 3;

/// Role-request/reply body. 1.5 reuses the 1.3 layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Role {
    /// `OFPCR_ROLE_*` value.
    pub role: u32,
    /// Master-election generation; ignored for EQUAL/NOCHANGE.
    pub generation_id: u64,
}

impl Codec for Role {
    fn wire_len(&self) -> usize {
        16
    }

    fn encode(&self, w: &mut Writer) -> Result<()> {
        w.put_u32(self.role);
        w.put_zeros(4);
        w.put_u64(self.generation_id);
        Ok(())
    }

    fn decode(cur: &mut Cursor<'_>) -> Result<Self> {
        let role = cur.read_u32()?;
        cur.skip(4)?;
        Ok(Self { role, generation_id: cur.read_u64()? })
    }
}

/// Async-config property: packet-in mask for the slave role.
pub const OFPACPT_PACKET_IN_SLAVE: u16 = 0;
/// Async-config property: packet-in mask for master/equal.
pub const OFPACPT_PACKET_IN_MASTER: u16 = 1;
/// Async-config property: port-status mask for slave.
pub const OFPACPT_PORT_STATUS_SLAVE: u16 = 2;
/// Async-config property: port-status mask for master/equal.
pub const OFPACPT_PORT_STATUS_MASTER: u16 = 3;
/// Async-config property: flow-removed mask for slave.
pub const OFPACPT_FLOW_REMOVED_SLAVE: u16 = 4;
/// Async-config property: flow-removed mask for master/equal.
pub const OFPACPT_FLOW_REMOVED_MASTER: u16 = 5;
/// Async-config property: role-status mask for slave.
pub const OFPACPT_ROLE_STATUS_SLAVE: u16 = 6;
/// Async-config property: role-status mask for master/equal.
pub const OFPACPT_ROLE_STATUS_MASTER: u16 = 7;
/// Async-config property: table-status mask for slave.
pub const OFPACPT_TABLE_STATUS_SLAVE: u16 = 8;
/// Async-config property: table-status mask for master/equal.
pub const OFPACPT_TABLE_STATUS_MASTER: u16 = 9;
/// Async-config property: request-forward mask for slave.
pub const OFPACPT_REQUESTFORWARD_SLAVE: u16 = 10;
/// Async-config property: request-forward mask for master/equal.
pub const OFPACPT_REQUESTFORWARD_MASTER: u16 = 11;

/// One async-config property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AsyncProp {
    /// A standard reason-mask property (`OFPACPT_*` below experimenter).
    Mask {
        /// Which mask this is.
        prop_type: u16,
        /// Reason bitmask.
        mask: u32,
    },
    /// Unrecognized or experimenter property, preserved raw.
    Unknown {
        /// Property type code.
        prop_type: u16,
        /// Value bytes (padding excluded).
        data: Vec<u8>,
    },
}

impl Codec for AsyncProp {
    fn wire_len(&self) -> usize {
        match self {
            Self::Mask { .. } => 8,
            Self::Unknown { data, .. } => padded8(4 + data.len()),
        }
    }

    fn encode(&self, w: &mut Writer) -> Result<()> {
        match self {
            Self::Mask { prop_type, mask } => {
                w.put_u16(*prop_type);
                w.put_u16(8);
                w.put_u32(*mask);
            },
            Self::Unknown { prop_type, data } => {
                let body_len = 4 + data.len();
                if body_len > usize::from(u16::MAX) {
                    return Err(WireError::Encode("async property exceeds u16 length"));
                }
                w.put_u16(*prop_type);
                w.put_u16(body_len as u16);
                w.put_slice(data);
                w.align8();
            },
        }
        Ok(())
    }

    fn decode(cur: &mut Cursor<'_>) -> Result<Self> {
        let prop_type = cur.read_u16()?;
        let len = cur.read_u16()? as usize;
        let mut body = cur.subcursor(len, 4)?;
        let prop = if prop_type <= OFPACPT_REQUESTFORWARD_MASTER {
            let mask = body.read_u32()?;
            Self::Mask { prop_type, mask }
        } else {
            Self::Unknown { prop_type, data: body.rest().to_vec() }
        };
        if !body.is_empty() {
            return Err(WireError::Invariant("async property length disagrees with body"));
        }
        cur.skip_align8()?;
        Ok(prop)
    }
}

/// Async-config body: a property list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AsyncConfig {
    /// Properties in wire order.
    pub properties: Vec<AsyncProp>,
}

impl Codec for AsyncConfig {
    fn wire_len(&self) -> usize {
        self.properties.iter().map(Codec::wire_len).sum()
    }

    fn encode(&self, w: &mut Writer) -> Result<()> {
        for prop in &self.properties {
            prop.encode(w)?;
        }
        Ok(())
    }

    fn decode(cur: &mut Cursor<'_>) -> Result<Self> {
        let mut properties = Vec::new();
        while !cur.is_empty() {
            properties.push(AsyncProp::decode(cur)?);
        }
        Ok(Self { properties })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowlink_wire::{decode_from_slice, encode_to_vec};

    #[test]
    fn role_round_trip() {
        let role = Role { role: OFPCR_ROLE_SLAVE, generation_id: 77 };
        let bytes = encode_to_vec(&role).unwrap();
        assert_eq!(bytes.len(), 16);
        assert_eq!(decode_from_slice::<Role>(&bytes).unwrap(), role);
    }

    #[test]
    fn async_config_round_trip() {
        let config = AsyncConfig {
            properties: vec![
                AsyncProp::Mask { prop_type: OFPACPT_PACKET_IN_MASTER, mask: 0b111 },
                AsyncProp::Mask { prop_type: OFPACPT_PORT_STATUS_SLAVE, mask: 0b11 },
                AsyncProp::Unknown { prop_type: 0xFFFE, data: vec![0, 0, 0, 9, 1, 2, 3, 4] },
            ],
        };
        let bytes = encode_to_vec(&config).unwrap();
        assert_eq!(bytes.len(), config.wire_len());
        assert_eq!(decode_from_slice::<AsyncConfig>(&bytes).unwrap(), config);
    }
}
