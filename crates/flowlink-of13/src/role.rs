//! Controller role and asynchronous-message configuration.

use flowlink_wire::{Codec, Cursor, Result, Writer};

/// Role: do not change, just report.
pub const OFPCR_ROLE_NOCHANGE: u32 = 0;
/// Role: full access, default.
pub const OFPCR_ROLE_EQUAL: u32 = 1;
/// Role: exclusive write access.
pub const OFPCR_ROLE_MASTER: u32 = 2;
/// Role: read-only.
pub const OFPCR_ROLE_SLAVE: u32 = 3;

/// Role-request/reply body.
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

/// Async-config body: per-role bitmasks selecting which async messages the
/// switch sends. Index 0 applies to the master/equal role, index 1 to slave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AsyncConfig {
    /// Packet-in reason masks.
    pub packet_in_mask: [u32; 2],
    /// Port-status reason masks.
    pub port_status_mask: [u32; 2],
    /// Flow-removed reason masks.
    pub flow_removed_mask: [u32; 2],
}

impl Codec for AsyncConfig {
    fn wire_len(&self) -> usize {
        24
    }

    fn encode(&self, w: &mut Writer) -> Result<()> {
        for mask in [self.packet_in_mask, self.port_status_mask, self.flow_removed_mask] {
            w.put_u32(mask[0]);
            w.put_u32(mask[1]);
        }
        Ok(())
    }

    fn decode(cur: &mut Cursor<'_>) -> Result<Self> {
        let mut config = Self::default();
        for mask in
            [&mut config.packet_in_mask, &mut config.port_status_mask, &mut config.flow_removed_mask]
        {
            mask[0] = cur.read_u32()?;
            mask[1] = cur.read_u32()?;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowlink_wire::{decode_from_slice, encode_to_vec};

    #[test]
    fn role_round_trip() {
        let role = Role { role: OFPCR_ROLE_MASTER, generation_id: 9 };
        let bytes = encode_to_vec(&role).unwrap();
        assert_eq!(bytes.len(), 16);
        assert_eq!(decode_from_slice::<Role>(&bytes).unwrap(), role);
    }

    #[test]
    fn async_config_round_trip() {
        let config = AsyncConfig {
            packet_in_mask: [0b111, 0b001],
            port_status_mask: [0b111, 0b111],
            flow_removed_mask: [0b1111, 0],
        };
        let bytes = encode_to_vec(&config).unwrap();
        assert_eq!(bytes.len(), 24);
        assert_eq!(decode_from_slice::<AsyncConfig>(&bytes).unwrap(), config);
    }
}
