//! Ports in the 1.4+ shape: a fixed prefix plus a property list.

use flowlink_wire::{Codec, Cursor, Result, WireError, Writer, padded8};

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

const OFPPDPT_ETHERNET: u16 = 0;
const OFPPDPT_OPTICAL: u16 = 1;
const OFPPDPT_EXPERIMENTER: u16 = 0xFFFF;

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

/// One port-description property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortProp {
    /// Ethernet link speeds and features.
    Ethernet {
        /// Current features.
        curr: u32,
        /// Features being advertised.
        advertised: u32,
        /// Features supported.
        supported: u32,
        /// Features advertised by the peer.
        peer: u32,
        /// Current speed in kbps.
        curr_speed: u32,
        /// Maximum speed in kbps.
        max_speed: u32,
    },
    /// Optical transport parameters.
    Optical {
        /// `OFPOPF_*` capability bits.
        supported: u32,
        /// Minimum TX frequency/wavelength.
        tx_min_freq_lmda: u32,
        /// Maximum TX frequency/wavelength.
        tx_max_freq_lmda: u32,
        /// TX grid spacing.
        tx_grid_freq_lmda: u32,
        /// Minimum RX frequency/wavelength.
        rx_min_freq_lmda: u32,
        /// Maximum RX frequency/wavelength.
        rx_max_freq_lmda: u32,
        /// RX grid spacing.
        rx_grid_freq_lmda: u32,
        /// Minimum TX power.
        tx_pwr_min: u16,
        /// Maximum TX power.
        tx_pwr_max: u16,
    },
    /// Experimenter property, body preserved raw.
    Experimenter {
        /// Experimenter id.
        experimenter: u32,
        /// Experimenter-defined subtype.
        exp_type: u32,
        /// Raw body.
        data: Vec<u8>,
    },
    /// Unrecognized property, preserved raw.
    Unknown {
        /// Property type code.
        prop_type: u16,
        /// Value bytes (padding excluded).
        data: Vec<u8>,
    },
}

impl Codec for PortProp {
    fn wire_len(&self) -> usize {
        match self {
            Self::Ethernet { .. } => 32,
            Self::Optical { .. } => 40,
            Self::Experimenter { data, .. } => padded8(12 + data.len()),
            Self::Unknown { data, .. } => padded8(4 + data.len()),
        }
    }

    fn encode(&self, w: &mut Writer) -> Result<()> {
        match self {
            Self::Ethernet { curr, advertised, supported, peer, curr_speed, max_speed } => {
                w.put_u16(OFPPDPT_ETHERNET);
                w.put_u16(32);
                w.put_zeros(4);
                w.put_u32(*curr);
                w.put_u32(*advertised);
                w.put_u32(*supported);
                w.put_u32(*peer);
                w.put_u32(*curr_speed);
                w.put_u32(*max_speed);
            },
            Self::Optical {
                supported,
                tx_min_freq_lmda,
                tx_max_freq_lmda,
                tx_grid_freq_lmda,
                rx_min_freq_lmda,
                rx_max_freq_lmda,
                rx_grid_freq_lmda,
                tx_pwr_min,
                tx_pwr_max,
            } => {
                w.put_u16(OFPPDPT_OPTICAL);
                w.put_u16(40);
                w.put_zeros(4);
                w.put_u32(*supported);
                w.put_u32(*tx_min_freq_lmda);
                w.put_u32(*tx_max_freq_lmda);
                w.put_u32(*tx_grid_freq_lmda);
                w.put_u32(*rx_min_freq_lmda);
                w.put_u32(*rx_max_freq_lmda);
                w.put_u32(*rx_grid_freq_lmda);
                w.put_u16(*tx_pwr_min);
                w.put_u16(*tx_pwr_max);
            },
            Self::Experimenter { experimenter, exp_type, data } => {
                let body_len = 12 + data.len();
                if body_len > usize::from(u16::MAX) {
                    return Err(WireError::Encode("port property exceeds u16 length"));
                }
                w.put_u16(OFPPDPT_EXPERIMENTER);
                w.put_u16(body_len as u16);
                w.put_u32(*experimenter);
                w.put_u32(*exp_type);
                w.put_slice(data);
                w.align8();
            },
            Self::Unknown { prop_type, data } => {
                let body_len = 4 + data.len();
                if body_len > usize::from(u16::MAX) {
                    return Err(WireError::Encode("port property exceeds u16 length"));
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

        let prop = match prop_type {
            OFPPDPT_ETHERNET => {
                body.skip(4)?;
                Self::Ethernet {
                    curr: body.read_u32()?,
                    advertised: body.read_u32()?,
                    supported: body.read_u32()?,
                    peer: body.read_u32()?,
                    curr_speed: body.read_u32()?,
                    max_speed: body.read_u32()?,
                }
            },
            OFPPDPT_OPTICAL => {
                body.skip(4)?;
                Self::Optical {
                    supported: body.read_u32()?,
                    tx_min_freq_lmda: body.read_u32()?,
                    tx_max_freq_lmda: body.read_u32()?,
                    tx_grid_freq_lmda: body.read_u32()?,
                    rx_min_freq_lmda: body.read_u32()?,
                    rx_max_freq_lmda: body.read_u32()?,
                    rx_grid_freq_lmda: body.read_u32()?,
                    tx_pwr_min: body.read_u16()?,
                    tx_pwr_max: body.read_u16()?,
                }
            },
            OFPPDPT_EXPERIMENTER => Self::Experimenter {
                experimenter: body.read_u32()?,
                exp_type: body.read_u32()?,
                data: body.rest().to_vec(),
            },
            other => Self::Unknown { prop_type: other, data: body.rest().to_vec() },
        };

        if !body.is_empty() {
            return Err(WireError::Invariant("port property length disagrees with body"));
        }
        cur.skip_align8()?;
        Ok(prop)
    }
}

/// A port description: fixed prefix plus properties.
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
    /// Properties in wire order.
    pub properties: Vec<PortProp>,
}

impl Codec for Port {
    fn wire_len(&self) -> usize {
        40 + self.properties.iter().map(Codec::wire_len).sum::<usize>()
    }

    fn encode(&self, w: &mut Writer) -> Result<()> {
        let len = self.wire_len();
        if len > usize::from(u16::MAX) {
            return Err(WireError::Encode("port exceeds u16 length"));
        }
        w.put_u32(self.port_no);
        w.put_u16(len as u16);
        w.put_zeros(2);
        w.put_slice(&self.hw_addr);
        w.put_zeros(2);
        put_fixed_name(w, &self.name, 16);
        w.put_u32(self.config);
        w.put_u32(self.state);
        for prop in &self.properties {
            prop.encode(w)?;
        }
        Ok(())
    }

    fn decode(cur: &mut Cursor<'_>) -> Result<Self> {
        let port_no = cur.read_u32()?;
        let len = cur.read_u16()? as usize;
        let mut body = cur.subcursor(len, 6)?;
        body.skip(2)?;
        let hw_addr = body.read_array::<6>()?;
        body.skip(2)?;
        let name = read_fixed_name(&mut body, 16)?;
        let config = body.read_u32()?;
        let state = body.read_u32()?;
        let mut properties = Vec::new();
        while !body.is_empty() {
            properties.push(PortProp::decode(&mut body)?);
        }
        Ok(Self { port_no, hw_addr, name, config, state, properties })
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

/// One port-mod property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortModProp {
    /// Ethernet features to advertise.
    Ethernet(
        /// Advertise bits; 0 leaves them alone.
        u32,
    ),
    /// Unrecognized property, preserved raw.
    Unknown {
        /// Property type code.
        prop_type: u16,
        /// Value bytes (padding excluded).
        data: Vec<u8>,
    },
}

impl Codec for PortModProp {
    fn wire_len(&self) -> usize {
        match self {
            Self::Ethernet(_) => 8,
            Self::Unknown { data, .. } => padded8(4 + data.len()),
        }
    }

    fn encode(&self, w: &mut Writer) -> Result<()> {
        match self {
            Self::Ethernet(advertise) => {
                w.put_u16(OFPPDPT_ETHERNET);
                w.put_u16(8);
                w.put_u32(*advertise);
            },
            Self::Unknown { prop_type, data } => {
                let body_len = 4 + data.len();
                if body_len > usize::from(u16::MAX) {
                    return Err(WireError::Encode("port-mod property exceeds u16 length"));
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
        let prop = match prop_type {
            OFPPDPT_ETHERNET => Self::Ethernet(body.read_u32()?),
            other => Self::Unknown { prop_type: other, data: body.rest().to_vec() },
        };
        if !body.is_empty() {
            return Err(WireError::Invariant("port-mod property length disagrees with body"));
        }
        cur.skip_align8()?;
        Ok(prop)
    }
}

/// Port-mod body.
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
    /// Properties in wire order.
    pub properties: Vec<PortModProp>,
}

impl Codec for PortMod {
    fn wire_len(&self) -> usize {
        24 + self.properties.iter().map(Codec::wire_len).sum::<usize>()
    }

    fn encode(&self, w: &mut Writer) -> Result<()> {
        w.put_u32(self.port_no);
        w.put_zeros(4);
        w.put_slice(&self.hw_addr);
        w.put_zeros(2);
        w.put_u32(self.config);
        w.put_u32(self.mask);
        for prop in &self.properties {
            prop.encode(w)?;
        }
        Ok(())
    }

    fn decode(cur: &mut Cursor<'_>) -> Result<Self> {
        let port_no = cur.read_u32()?;
        cur.skip(4)?;
        let hw_addr = cur.read_array::<6>()?;
        cur.skip(2)?;
        let config = cur.read_u32()?;
        let mask = cur.read_u32()?;
        let mut properties = Vec::new();
        while !cur.is_empty() {
            properties.push(PortModProp::decode(cur)?);
        }
        Ok(Self { port_no, hw_addr, config, mask, properties })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowlink_wire::{decode_from_slice, encode_to_vec};

    #[test]
    fn port_with_ethernet_prop_round_trip() {
        let port = Port {
            port_no: 1,
            hw_addr: [0, 1, 2, 3, 4, 5],
            name: "eth0".to_string(),
            config: 0,
            state: OFPPS_LIVE,
            properties: vec![PortProp::Ethernet {
                curr: 0x840,
                advertised: 0,
                supported: 0,
                peer: 0,
                curr_speed: 10_000_000,
                max_speed: 10_000_000,
            }],
        };
        let bytes = encode_to_vec(&port).unwrap();
        assert_eq!(bytes.len(), 72);
        assert_eq!(decode_from_slice::<Port>(&bytes).unwrap(), port);
    }

    #[test]
    fn optical_prop_round_trip() {
        let port = Port {
            properties: vec![PortProp::Optical {
                supported: 1,
                tx_min_freq_lmda: 2,
                tx_max_freq_lmda: 3,
                tx_grid_freq_lmda: 4,
                rx_min_freq_lmda: 5,
                rx_max_freq_lmda: 6,
                rx_grid_freq_lmda: 7,
                tx_pwr_min: 8,
                tx_pwr_max: 9,
            }],
            ..Port::default()
        };
        let bytes = encode_to_vec(&port).unwrap();
        assert_eq!(decode_from_slice::<Port>(&bytes).unwrap(), port);
    }

    #[test]
    fn unknown_prop_preserved() {
        let port = Port {
            properties: vec![PortProp::Unknown { prop_type: 0x00F0, data: vec![1, 2, 3] }],
            ..Port::default()
        };
        let bytes = encode_to_vec(&port).unwrap();
        assert_eq!(decode_from_slice::<Port>(&bytes).unwrap(), port);
    }

    #[test]
    fn port_mod_round_trip() {
        let pm = PortMod {
            port_no: 2,
            hw_addr: [0xAA; 6],
            config: OFPPC_PORT_DOWN,
            mask: OFPPC_PORT_DOWN,
            properties: vec![PortModProp::Ethernet(0)],
        };
        let bytes = encode_to_vec(&pm).unwrap();
        assert_eq!(decode_from_slice::<PortMod>(&bytes).unwrap(), pm);
    }
}
