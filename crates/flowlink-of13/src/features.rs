//! Switch features and switch configuration.

use flowlink_wire::{Codec, Cursor, Result, Writer};

/// Capability bit: flow statistics.
pub const OFPC_FLOW_STATS: u32 = 1 << 0;
/// Capability bit: table statistics.
pub const OFPC_TABLE_STATS: u32 = 1 << 1;
/// Capability bit: port statistics.
pub const OFPC_PORT_STATS: u32 = 1 << 2;
/// Capability bit: group statistics.
pub const OFPC_GROUP_STATS: u32 = 1 << 3;
/// Capability bit: can reassemble IP fragments.
pub const OFPC_IP_REASM: u32 = 1 << 5;
/// Capability bit: queue statistics.
pub const OFPC_QUEUE_STATS: u32 = 1 << 6;
/// Capability bit: block looping ports.
pub const OFPC_PORT_BLOCKED: u32 = 1 << 8;

/// Features-reply body: the switch's identity and table/buffer inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SwitchFeatures {
    /// Datapath unique id; the low 48 bits are typically a MAC address.
    pub datapath_id: u64,
    /// Packets the switch can buffer for `packet-in`.
    pub n_buffers: u32,
    /// Number of flow tables.
    pub n_tables: u8,
    /// Auxiliary connection id; 0 for the main connection.
    pub auxiliary_id: u8,
    /// `OFPC_*` capability bits.
    pub capabilities: u32,
    /// Reserved field, zero on the wire.
    pub reserved: u32,
}

impl Codec for SwitchFeatures {
    fn wire_len(&self) -> usize {
        24
    }

    fn encode(&self, w: &mut Writer) -> Result<()> {
        w.put_u64(self.datapath_id);
        w.put_u32(self.n_buffers);
        w.put_u8(self.n_tables);
        w.put_u8(self.auxiliary_id);
        w.put_zeros(2);
        w.put_u32(self.capabilities);
        w.put_u32(self.reserved);
        Ok(())
    }

    fn decode(cur: &mut Cursor<'_>) -> Result<Self> {
        let datapath_id = cur.read_u64()?;
        let n_buffers = cur.read_u32()?;
        let n_tables = cur.read_u8()?;
        let auxiliary_id = cur.read_u8()?;
        cur.skip(2)?;
        let capabilities = cur.read_u32()?;
        let reserved = cur.read_u32()?;
        Ok(Self { datapath_id, n_buffers, n_tables, auxiliary_id, capabilities, reserved })
    }
}

/// Fragment handling: pass fragments up normally.
pub const OFPC_FRAG_NORMAL: u16 = 0;
/// Fragment handling: drop fragments.
pub const OFPC_FRAG_DROP: u16 = 1;
/// Fragment handling: reassemble.
pub const OFPC_FRAG_REASM: u16 = 2;

/// Switch configuration, shared by get-config-reply and set-config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwitchConfig {
    /// `OFPC_FRAG_*` flags.
    pub flags: u16,
    /// Bytes of each packet sent to the controller on table miss.
    pub miss_send_len: u16,
}

impl Default for SwitchConfig {
    fn default() -> Self {
        Self { flags: OFPC_FRAG_NORMAL, miss_send_len: 128 }
    }
}

impl Codec for SwitchConfig {
    fn wire_len(&self) -> usize {
        4
    }

    fn encode(&self, w: &mut Writer) -> Result<()> {
        w.put_u16(self.flags);
        w.put_u16(self.miss_send_len);
        Ok(())
    }

    fn decode(cur: &mut Cursor<'_>) -> Result<Self> {
        Ok(Self { flags: cur.read_u16()?, miss_send_len: cur.read_u16()? })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowlink_wire::{decode_from_slice, encode_to_vec};

    #[test]
    fn features_round_trip() {
        let features = SwitchFeatures {
            datapath_id: 0x0011_2233_4455_6677,
            n_buffers: 256,
            n_tables: 254,
            auxiliary_id: 0,
            capabilities: OFPC_FLOW_STATS | OFPC_TABLE_STATS,
            reserved: 0,
        };
        let bytes = encode_to_vec(&features).unwrap();
        assert_eq!(bytes.len(), 24);
        assert_eq!(&bytes[..8], &[0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77]);
        assert_eq!(decode_from_slice::<SwitchFeatures>(&bytes).unwrap(), features);
    }

    #[test]
    fn config_round_trip() {
        let config = SwitchConfig { flags: OFPC_FRAG_DROP, miss_send_len: 0xFFFF };
        let bytes = encode_to_vec(&config).unwrap();
        assert_eq!(bytes, [0x00, 0x01, 0xFF, 0xFF]);
        assert_eq!(decode_from_slice::<SwitchConfig>(&bytes).unwrap(), config);
    }
}
