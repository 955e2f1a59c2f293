//! Physical ports: description, status notifications, and modification.

use flowlink_wire::{Codec, Cursor, Result, Writer};

/// Port config bit: administratively down.
pub const OFPPC_PORT_DOWN: u32 = 1 << 0;
/// Port config bit: drop received packets.
pub const OFPPC_NO_RECV: u32 = 1 << 2;
/// Port config bit: drop forwarded packets.
pub const OFPPC_NO_FWD: u32 = 1 << 5;
/// Port config bit: do not send packet-ins.
pub const OFPPC_NO_PACKET_IN: u32 = 1 << 6;

/// Port state bit: no physical link.
pub const OFPPS_LINK_DOWN: u32 = 1 << 0;
/// Port state bit: blocked by a non-OpenFlow protocol.
pub const OFPPS_BLOCKED: u32 = 1 << 1;
/// Port state bit: live for fast-failover groups.
pub const OFPPS_LIVE: u32 = 1 << 2;

/// The fixed 64-byte port description.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Port {
    /// Port number.
    pub port_no: u32,
    /// MAC address.
    pub hw_addr: [u8; 6],
    /// Human-readable name, at most 15 bytes on the wire.
    pub name: String,
    /// `OFPPC_*` bits.
    pub config: u32,
    /// `OFPPS_*` bits.
    pub state: u32,
    /// Current features.
    pub curr: u32,
    /// Features being advertised.
    pub advertised: u32,
    /// Features supported.
    pub supported: u32,
    /// Features advertised by the peer.
    pub peer: u32,
    /// Current speed in kbps.
    pub curr_speed: u32,
    /// Maximum speed in kbps.
    pub max_speed: u32,
}

pub(crate) fn put_fixed_name(w: &mut Writer, name: &str, width: usize) {
    let bytes = name.as_bytes();
    let take = bytes.len().min(width - 1);
    w.put_slice(&bytes[..take]);
    w.put_zeros(width - take);
}

pub(crate) fn read_fixed_name(cur: &mut Cursor<'_>, width: usize) -> Result<String> {
    let raw = cur.read_bytes(width)?;
    let end = raw.iter().position(|&b| b == 0).unwrap_or(width);
    Ok(String::from_utf8_lossy(&raw[..end]).into_owned())
}

impl Codec for Port {
    fn wire_len(&self) -> usize {
        64
    }

    fn encode(&self, w: &mut Writer) -> Result<()> {
        w.put_u32(self.port_no);
        w.put_zeros(4);
        w.put_slice(&self.hw_addr);
        w.put_zeros(2);
        put_fixed_name(w, &self.name, 16);
        w.put_u32(self.config);
        w.put_u32(self.state);
        w.put_u32(self.curr);
        w.put_u32(self.advertised);
        w.put_u32(self.supported);
        w.put_u32(self.peer);
        w.put_u32(self.curr_speed);
        w.put_u32(self.max_speed);
        Ok(())
    }

    fn decode(cur: &mut Cursor<'_>) -> Result<Self> {
        let port_no = cur.read_u32()?;
        cur.skip(4)?;
        let hw_addr = cur.read_array::<6>()?;
        cur.skip(2)?;
        let name = read_fixed_name(cur, 16)?;
        Ok(Self {
            port_no,
            hw_addr,
            name,
            config: cur.read_u32()?,
            state: cur.read_u32()?,
            curr: cur.read_u32()?,
            advertised: cur.read_u32()?,
            supported: cur.read_u32()?,
            peer: cur.read_u32()?,
            curr_speed: cur.read_u32()?,
            max_speed: cur.read_u32()?,
        })
    }
}

/// Port-status reason: port added.
pub const OFPPR_ADD: u8 = 0;
/// Port-status reason: port removed.
pub const OFPPR_DELETE: u8 = 1;
/// Port-status reason: attribute changed.
pub const OFPPR_MODIFY: u8 = 2;

/// Port-status notification body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortStatus {
    /// `OFPPR_*` reason.
    pub reason: u8,
    /// The port as it now stands.
    pub desc: Port,
}

impl Codec for PortStatus {
    fn wire_len(&self) -> usize {
        8 + self.desc.wire_len()
    }

    fn encode(&self, w: &mut Writer) -> Result<()> {
        w.put_u8(self.reason);
        w.put_zeros(7);
        self.desc.encode(w)
    }

    fn decode(cur: &mut Cursor<'_>) -> Result<Self> {
        let reason = cur.read_u8()?;
        cur.skip(7)?;
        Ok(Self { reason, desc: Port::decode(cur)? })
    }
}

/// Port-mod body: change a port's administrative config.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PortMod {
    /// Port to modify.
    pub port_no: u32,
    /// MAC address, sanity-checked by the switch.
    pub hw_addr: [u8; 6],
    /// New `OFPPC_*` bits.
    pub config: u32,
    /// Which config bits to change.
    pub mask: u32,
    /// Features to advertise; 0 leaves them alone.
    pub advertise: u32,
}

impl Codec for PortMod {
    fn wire_len(&self) -> usize {
        32
    }

    fn encode(&self, w: &mut Writer) -> Result<()> {
        w.put_u32(self.port_no);
        w.put_zeros(4);
        w.put_slice(&self.hw_addr);
        w.put_zeros(2);
        w.put_u32(self.config);
        w.put_u32(self.mask);
        w.put_u32(self.advertise);
        w.put_zeros(4);
        Ok(())
    }

    fn decode(cur: &mut Cursor<'_>) -> Result<Self> {
        let port_no = cur.read_u32()?;
        cur.skip(4)?;
        let hw_addr = cur.read_array::<6>()?;
        cur.skip(2)?;
        let config = cur.read_u32()?;
        let mask = cur.read_u32()?;
        let advertise = cur.read_u32()?;
        cur.skip(4)?;
        Ok(Self { port_no, hw_addr, config, mask, advertise })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowlink_wire::{decode_from_slice, encode_to_vec};

    #[test]
    fn port_is_sixty_four_bytes() {
        let port = Port {
            port_no: 1,
            hw_addr: [0, 1, 2, 3, 4, 5],
            name: "eth0".to_string(),
            config: 0,
            state: OFPPS_LIVE,
            curr: 0x840,
            advertised: 0,
            supported: 0,
            peer: 0,
            curr_speed: 10_000_000,
            max_speed: 10_000_000,
        };
        let bytes = encode_to_vec(&port).unwrap();
        assert_eq!(bytes.len(), 64);
        assert_eq!(decode_from_slice::<Port>(&bytes).unwrap(), port);
    }

    #[test]
    fn port_status_round_trip() {
        let status = PortStatus { reason: OFPPR_MODIFY, desc: Port::default() };
        let bytes = encode_to_vec(&status).unwrap();
        assert_eq!(bytes.len(), 72);
        assert_eq!(decode_from_slice::<PortStatus>(&bytes).unwrap(), status);
    }

    #[test]
    fn port_mod_round_trip() {
        let pm = PortMod {
            port_no: 7,
            hw_addr: [0xAA; 6],
            config: OFPPC_PORT_DOWN,
            mask: OFPPC_PORT_DOWN,
            advertise: 0,
        };
        let bytes = encode_to_vec(&pm).unwrap();
        assert_eq!(bytes.len(), 32);
        assert_eq!(decode_from_slice::<PortMod>(&bytes).unwrap(), pm);
    }

    #[test]
    fn long_names_truncate_on_encode() {
        let port =
            Port { name: "a-very-long-interface-name".to_string(), ..Port::default() };
        let bytes = encode_to_vec(&port).unwrap();
        let back: Port = decode_from_slice(&bytes).unwrap();
        assert_eq!(back.name.len(), 15);
    }
}
