//! A single OXM/NXM TLV.

use crate::{Codec, Cursor, Result, WireError, Writer};

use super::consts::{self, basic, nxm1};
use super::{CLASS_NXM_1, CLASS_OPENFLOW_BASIC, pack_header, unpack_header};

/// One match field: packed header, value, optional mask.
///
/// Value and mask are stored as raw big-endian bytes validated against the
/// field's canonical width on construction and decode, so a `MatchField`
/// always re-marshals bit-exactly. Unknown `(class, field)` pairs are kept
/// as long as their declared length is internally consistent, which is what
/// lets a match containing fields this library has never heard of survive a
/// round trip.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MatchField {
    class: u16,
    field: u8,
    value: Vec<u8>,
    mask: Option<Vec<u8>>,
}

impl MatchField {
    /// Unmasked field. Fails if the value length contradicts the field's
    /// canonical width.
    pub fn new(class: u16, field: u8, value: Vec<u8>) -> Result<Self> {
        Self::build(class, field, value, None)
    }

    /// Masked field. The mask must be exactly as long as the value.
    pub fn masked(class: u16, field: u8, value: Vec<u8>, mask: Vec<u8>) -> Result<Self> {
        Self::build(class, field, value, Some(mask))
    }

    fn build(class: u16, field: u8, value: Vec<u8>, mask: Option<Vec<u8>>) -> Result<Self> {
        if field > 0x7F {
            return Err(WireError::Invariant("oxm field exceeds 7 bits"));
        }
        if value.is_empty() || value.len() > 0x7F {
            return Err(WireError::Invariant("oxm value length out of range"));
        }
        if let Some(expected) = consts::payload_width(class, field) {
            if value.len() != expected {
                return Err(WireError::Invariant("oxm value length contradicts field width"));
            }
        }
        if let Some(mask) = &mask {
            if mask.len() != value.len() {
                return Err(WireError::Invariant("oxm mask length differs from value length"));
            }
        }
        Ok(Self { class, field, value, mask })
    }

    /// OXM class.
    #[must_use]
    pub fn class(&self) -> u16 {
        self.class
    }

    /// 7-bit field number.
    #[must_use]
    pub fn field(&self) -> u8 {
        self.field
    }

    /// Raw big-endian value bytes.
    #[must_use]
    pub fn value(&self) -> &[u8] {
        &self.value
    }

    /// Raw mask bytes, when masked.
    #[must_use]
    pub fn mask(&self) -> Option<&[u8]> {
        self.mask.as_deref()
    }

    /// Whether the field carries a mask.
    #[must_use]
    pub fn has_mask(&self) -> bool {
        self.mask.is_some()
    }

    /// Serialized payload length: value length, doubled when masked.
    #[must_use]
    pub fn payload_len(&self) -> usize {
        self.value.len() * if self.mask.is_some() { 2 } else { 1 }
    }

    /// The packed 4-byte header.
    #[must_use]
    pub fn header(&self) -> u32 {
        pack_header(self.class, self.field, self.has_mask(), self.payload_len() as u8)
    }

    /// Value as `u64` for fields up to 8 bytes wide. `None` for wider fields.
    #[must_use]
    pub fn value_u64(&self) -> Option<u64> {
        if self.value.len() > 8 {
            return None;
        }
        let mut v = 0u64;
        for &b in &self.value {
            v = v << 8 | u64::from(b);
        }
        Some(v)
    }
}

impl Codec for MatchField {
    fn wire_len(&self) -> usize {
        4 + self.payload_len()
    }

    fn encode(&self, w: &mut Writer) -> Result<()> {
        w.put_u32(self.header());
        w.put_slice(&self.value);
        if let Some(mask) = &self.mask {
            w.put_slice(mask);
        }
        Ok(())
    }

    fn decode(cur: &mut Cursor<'_>) -> Result<Self> {
        let (class, field, has_mask, length) = unpack_header(cur.read_u32()?)?;
        let length = length as usize;
        if length == 0 {
            return Err(WireError::Invariant("oxm payload length is zero"));
        }

        let value_len = if has_mask {
            if length % 2 != 0 {
                return Err(WireError::Invariant("masked oxm length is odd"));
            }
            length / 2
        } else {
            length
        };

        if let Some(expected) = consts::payload_width(class, field) {
            if value_len != expected {
                return Err(WireError::Invariant("oxm value length contradicts field width"));
            }
        }

        let value = cur.read_bytes(value_len)?.to_vec();
        let mask = if has_mask { Some(cur.read_bytes(value_len)?.to_vec()) } else { None };

        Ok(Self { class, field, value, mask })
    }
}

// Typed constructors for the fields the controller surface works with. Each
// one is a thin wrapper over `new`/`masked` with the canonical width baked
// in, so they cannot fail.
impl MatchField {
    fn basic(field: u8, value: Vec<u8>) -> Self {
        Self { class: CLASS_OPENFLOW_BASIC, field, value, mask: None }
    }

    fn basic_masked(field: u8, value: Vec<u8>, mask: Vec<u8>) -> Self {
        Self { class: CLASS_OPENFLOW_BASIC, field, value, mask: Some(mask) }
    }

    fn nxm(field: u8, value: Vec<u8>) -> Self {
        Self { class: CLASS_NXM_1, field, value, mask: None }
    }

    /// Switch input port.
    #[must_use]
    pub fn in_port(port: u32) -> Self {
        Self::basic(basic::IN_PORT, port.to_be_bytes().to_vec())
    }

    /// Switch physical input port.
    #[must_use]
    pub fn in_phy_port(port: u32) -> Self {
        Self::basic(basic::IN_PHY_PORT, port.to_be_bytes().to_vec())
    }

    /// Table metadata, optionally masked.
    #[must_use]
    pub fn metadata(value: u64, mask: Option<u64>) -> Self {
        match mask {
            Some(m) => Self::basic_masked(
                basic::METADATA,
                value.to_be_bytes().to_vec(),
                m.to_be_bytes().to_vec(),
            ),
            None => Self::basic(basic::METADATA, value.to_be_bytes().to_vec()),
        }
    }

    /// Ethernet destination, optionally masked.
    #[must_use]
    pub fn eth_dst(addr: [u8; 6], mask: Option<[u8; 6]>) -> Self {
        match mask {
            Some(m) => Self::basic_masked(basic::ETH_DST, addr.to_vec(), m.to_vec()),
            None => Self::basic(basic::ETH_DST, addr.to_vec()),
        }
    }

    /// Ethernet source, optionally masked.
    #[must_use]
    pub fn eth_src(addr: [u8; 6], mask: Option<[u8; 6]>) -> Self {
        match mask {
            Some(m) => Self::basic_masked(basic::ETH_SRC, addr.to_vec(), m.to_vec()),
            None => Self::basic(basic::ETH_SRC, addr.to_vec()),
        }
    }

    /// Ethernet frame type.
    #[must_use]
    pub fn eth_type(ethertype: u16) -> Self {
        Self::basic(basic::ETH_TYPE, ethertype.to_be_bytes().to_vec())
    }

    /// VLAN id. The caller provides the CFI-tagged value (`vid | 0x1000` for
    /// a present tag).
    #[must_use]
    pub fn vlan_vid(vid: u16, mask: Option<u16>) -> Self {
        match mask {
            Some(m) => Self::basic_masked(
                basic::VLAN_VID,
                vid.to_be_bytes().to_vec(),
                m.to_be_bytes().to_vec(),
            ),
            None => Self::basic(basic::VLAN_VID, vid.to_be_bytes().to_vec()),
        }
    }

    /// VLAN priority.
    #[must_use]
    pub fn vlan_pcp(pcp: u8) -> Self {
        Self::basic(basic::VLAN_PCP, vec![pcp])
    }

    /// IP DSCP.
    #[must_use]
    pub fn ip_dscp(dscp: u8) -> Self {
        Self::basic(basic::IP_DSCP, vec![dscp])
    }

    /// IP ECN.
    #[must_use]
    pub fn ip_ecn(ecn: u8) -> Self {
        Self::basic(basic::IP_ECN, vec![ecn])
    }

    /// IP protocol number.
    #[must_use]
    pub fn ip_proto(proto: u8) -> Self {
        Self::basic(basic::IP_PROTO, vec![proto])
    }

    /// IPv4 source, optionally masked.
    #[must_use]
    pub fn ipv4_src(addr: std::net::Ipv4Addr, mask: Option<std::net::Ipv4Addr>) -> Self {
        match mask {
            Some(m) => {
                Self::basic_masked(basic::IPV4_SRC, addr.octets().to_vec(), m.octets().to_vec())
            },
            None => Self::basic(basic::IPV4_SRC, addr.octets().to_vec()),
        }
    }

    /// IPv4 destination, optionally masked.
    #[must_use]
    pub fn ipv4_dst(addr: std::net::Ipv4Addr, mask: Option<std::net::Ipv4Addr>) -> Self {
        match mask {
            Some(m) => {
                Self::basic_masked(basic::IPV4_DST, addr.octets().to_vec(), m.octets().to_vec())
            },
            None => Self::basic(basic::IPV4_DST, addr.octets().to_vec()),
        }
    }

    /// TCP source port.
    #[must_use]
    pub fn tcp_src(port: u16) -> Self {
        Self::basic(basic::TCP_SRC, port.to_be_bytes().to_vec())
    }

    /// TCP destination port.
    #[must_use]
    pub fn tcp_dst(port: u16) -> Self {
        Self::basic(basic::TCP_DST, port.to_be_bytes().to_vec())
    }

    /// UDP source port.
    #[must_use]
    pub fn udp_src(port: u16) -> Self {
        Self::basic(basic::UDP_SRC, port.to_be_bytes().to_vec())
    }

    /// UDP destination port.
    #[must_use]
    pub fn udp_dst(port: u16) -> Self {
        Self::basic(basic::UDP_DST, port.to_be_bytes().to_vec())
    }

    /// SCTP source port.
    #[must_use]
    pub fn sctp_src(port: u16) -> Self {
        Self::basic(basic::SCTP_SRC, port.to_be_bytes().to_vec())
    }

    /// SCTP destination port.
    #[must_use]
    pub fn sctp_dst(port: u16) -> Self {
        Self::basic(basic::SCTP_DST, port.to_be_bytes().to_vec())
    }

    /// ICMPv4 type.
    #[must_use]
    pub fn icmpv4_type(ty: u8) -> Self {
        Self::basic(basic::ICMPV4_TYPE, vec![ty])
    }

    /// ICMPv4 code.
    #[must_use]
    pub fn icmpv4_code(code: u8) -> Self {
        Self::basic(basic::ICMPV4_CODE, vec![code])
    }

    /// ARP opcode.
    #[must_use]
    pub fn arp_op(op: u16) -> Self {
        Self::basic(basic::ARP_OP, op.to_be_bytes().to_vec())
    }

    /// ARP source protocol address.
    #[must_use]
    pub fn arp_spa(addr: std::net::Ipv4Addr) -> Self {
        Self::basic(basic::ARP_SPA, addr.octets().to_vec())
    }

    /// ARP target protocol address.
    #[must_use]
    pub fn arp_tpa(addr: std::net::Ipv4Addr) -> Self {
        Self::basic(basic::ARP_TPA, addr.octets().to_vec())
    }

    /// ARP source hardware address.
    #[must_use]
    pub fn arp_sha(addr: [u8; 6]) -> Self {
        Self::basic(basic::ARP_SHA, addr.to_vec())
    }

    /// ARP target hardware address.
    #[must_use]
    pub fn arp_tha(addr: [u8; 6]) -> Self {
        Self::basic(basic::ARP_THA, addr.to_vec())
    }

    /// IPv6 source, optionally masked.
    #[must_use]
    pub fn ipv6_src(addr: std::net::Ipv6Addr, mask: Option<std::net::Ipv6Addr>) -> Self {
        match mask {
            Some(m) => {
                Self::basic_masked(basic::IPV6_SRC, addr.octets().to_vec(), m.octets().to_vec())
            },
            None => Self::basic(basic::IPV6_SRC, addr.octets().to_vec()),
        }
    }

    /// IPv6 destination, optionally masked.
    #[must_use]
    pub fn ipv6_dst(addr: std::net::Ipv6Addr, mask: Option<std::net::Ipv6Addr>) -> Self {
        match mask {
            Some(m) => {
                Self::basic_masked(basic::IPV6_DST, addr.octets().to_vec(), m.octets().to_vec())
            },
            None => Self::basic(basic::IPV6_DST, addr.octets().to_vec()),
        }
    }

    /// IPv6 flow label.
    #[must_use]
    pub fn ipv6_flabel(label: u32) -> Self {
        Self::basic(basic::IPV6_FLABEL, label.to_be_bytes().to_vec())
    }

    /// ICMPv6 type.
    #[must_use]
    pub fn icmpv6_type(ty: u8) -> Self {
        Self::basic(basic::ICMPV6_TYPE, vec![ty])
    }

    /// ICMPv6 code.
    #[must_use]
    pub fn icmpv6_code(code: u8) -> Self {
        Self::basic(basic::ICMPV6_CODE, vec![code])
    }

    /// IPv6 neighbor-discovery target.
    #[must_use]
    pub fn ipv6_nd_target(addr: std::net::Ipv6Addr) -> Self {
        Self::basic(basic::IPV6_ND_TARGET, addr.octets().to_vec())
    }

    /// Source link-layer address for IPv6 ND.
    #[must_use]
    pub fn ipv6_nd_sll(addr: [u8; 6]) -> Self {
        Self::basic(basic::IPV6_ND_SLL, addr.to_vec())
    }

    /// Target link-layer address for IPv6 ND.
    #[must_use]
    pub fn ipv6_nd_tll(addr: [u8; 6]) -> Self {
        Self::basic(basic::IPV6_ND_TLL, addr.to_vec())
    }

    /// MPLS label.
    #[must_use]
    pub fn mpls_label(label: u32) -> Self {
        Self::basic(basic::MPLS_LABEL, label.to_be_bytes().to_vec())
    }

    /// MPLS traffic class.
    #[must_use]
    pub fn mpls_tc(tc: u8) -> Self {
        Self::basic(basic::MPLS_TC, vec![tc])
    }

    /// MPLS bottom-of-stack bit.
    #[must_use]
    pub fn mpls_bos(bos: u8) -> Self {
        Self::basic(basic::MPLS_BOS, vec![bos])
    }

    /// PBB I-SID (24 bits).
    #[must_use]
    pub fn pbb_isid(isid: u32) -> Self {
        Self::basic(basic::PBB_ISID, isid.to_be_bytes()[1..].to_vec())
    }

    /// Tunnel id, optionally masked.
    #[must_use]
    pub fn tunnel_id(id: u64, mask: Option<u64>) -> Self {
        match mask {
            Some(m) => Self::basic_masked(
                basic::TUNNEL_ID,
                id.to_be_bytes().to_vec(),
                m.to_be_bytes().to_vec(),
            ),
            None => Self::basic(basic::TUNNEL_ID, id.to_be_bytes().to_vec()),
        }
    }

    /// IPv6 extension header pseudo-field.
    #[must_use]
    pub fn ipv6_exthdr(flags: u16) -> Self {
        Self::basic(basic::IPV6_EXTHDR, flags.to_be_bytes().to_vec())
    }

    /// TCP flags.
    #[must_use]
    pub fn tcp_flags(flags: u16) -> Self {
        Self::basic(basic::TCP_FLAGS, flags.to_be_bytes().to_vec())
    }

    /// Packet register `n` (OpenFlow 1.5).
    pub fn pkt_reg(n: u8, value: u64) -> Result<Self> {
        if n > 7 {
            return Err(WireError::Invariant("packet register index out of range"));
        }
        Ok(Self {
            class: super::CLASS_PACKET_REGS,
            field: n,
            value: value.to_be_bytes().to_vec(),
            mask: None,
        })
    }

    /// Nicira general-purpose register `n`.
    pub fn nxm_reg(n: u8, value: u32) -> Result<Self> {
        if n > 15 {
            return Err(WireError::Invariant("nicira register index out of range"));
        }
        Ok(Self::nxm(nxm1::REG0 + n, value.to_be_bytes().to_vec()))
    }

    /// Conntrack state bits, masked.
    #[must_use]
    pub fn ct_state(state: u32, mask: u32) -> Self {
        Self {
            class: CLASS_NXM_1,
            field: nxm1::CT_STATE,
            value: state.to_be_bytes().to_vec(),
            mask: Some(mask.to_be_bytes().to_vec()),
        }
    }

    /// Conntrack zone.
    #[must_use]
    pub fn ct_zone(zone: u16) -> Self {
        Self::nxm(nxm1::CT_ZONE, zone.to_be_bytes().to_vec())
    }

    /// Conntrack mark.
    #[must_use]
    pub fn ct_mark(mark: u32) -> Self {
        Self::nxm(nxm1::CT_MARK, mark.to_be_bytes().to_vec())
    }

    /// Conntrack label (128 bits).
    #[must_use]
    pub fn ct_label(label: u128) -> Self {
        Self::nxm(nxm1::CT_LABEL, label.to_be_bytes().to_vec())
    }

    /// Tunnel outer IPv4 source.
    #[must_use]
    pub fn tun_ipv4_src(addr: std::net::Ipv4Addr) -> Self {
        Self::nxm(nxm1::TUN_IPV4_SRC, addr.octets().to_vec())
    }

    /// Tunnel outer IPv4 destination.
    #[must_use]
    pub fn tun_ipv4_dst(addr: std::net::Ipv4Addr) -> Self {
        Self::nxm(nxm1::TUN_IPV4_DST, addr.octets().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{decode_from_slice, encode_to_vec};

    #[test]
    fn unmasked_field_layout() {
        let field = MatchField::in_port(7);
        let bytes = encode_to_vec(&field).unwrap();
        assert_eq!(bytes, [0x80, 0x00, 0x00, 0x04, 0x00, 0x00, 0x00, 0x07]);
    }

    #[test]
    fn masked_field_doubles_length() {
        let field = MatchField::eth_dst([1, 2, 3, 4, 5, 6], Some([0xFF; 6]));
        assert_eq!(field.payload_len(), 12);
        let bytes = encode_to_vec(&field).unwrap();
        assert_eq!(bytes.len(), 16);
        assert_eq!(bytes[3], 12);
        let back: MatchField = decode_from_slice(&bytes).unwrap();
        assert_eq!(back, field);
    }

    #[test]
    fn decode_rejects_odd_masked_length() {
        // has_mask with length 5.
        let bytes = [0x80, 0x00, 0x01, 0x05, 0, 0, 0, 0, 0];
        let mut cur = Cursor::new(&bytes);
        assert!(matches!(MatchField::decode(&mut cur), Err(WireError::Invariant(_))));
    }

    #[test]
    fn decode_rejects_wrong_width() {
        // IN_PORT declared with 2 bytes instead of 4.
        let bytes = [0x80, 0x00, 0x00, 0x02, 0x00, 0x07];
        let mut cur = Cursor::new(&bytes);
        assert!(matches!(MatchField::decode(&mut cur), Err(WireError::Invariant(_))));
    }

    #[test]
    fn unknown_field_round_trips() {
        // Field 0x55 in the experimenter class, arbitrary 5-byte payload.
        let bytes = [0xFF, 0xFF, 0xAA, 0x05, 1, 2, 3, 4, 5];
        let field: MatchField = decode_from_slice(&bytes).unwrap();
        assert_eq!(encode_to_vec(&field).unwrap(), bytes);
    }

    #[test]
    fn constructor_rejects_bad_mask() {
        let err = MatchField::masked(CLASS_OPENFLOW_BASIC, basic::IPV4_SRC, vec![10, 0, 0, 1], vec![
            0xFF, 0xFF,
        ]);
        assert!(err.is_err());
    }
}
