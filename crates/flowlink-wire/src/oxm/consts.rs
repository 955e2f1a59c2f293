//! Field numbers and canonical payload widths per OXM class.

/// Fields in [`super::CLASS_OPENFLOW_BASIC`].
pub mod basic {
    /// Switch input port.
    pub const IN_PORT: u8 = 0;
    /// Switch physical input port.
    pub const IN_PHY_PORT: u8 = 1;
    /// Metadata passed between tables.
    pub const METADATA: u8 = 2;
    /// Ethernet destination address.
    pub const ETH_DST: u8 = 3;
    /// Ethernet source address.
    pub const ETH_SRC: u8 = 4;
    /// Ethernet frame type.
    pub const ETH_TYPE: u8 = 5;
    /// VLAN id with CFI presence bit.
    pub const VLAN_VID: u8 = 6;
    /// VLAN priority.
    pub const VLAN_PCP: u8 = 7;
    /// IP DSCP (6 bits of the TOS field).
    pub const IP_DSCP: u8 = 8;
    /// IP ECN (2 bits of the TOS field).
    pub const IP_ECN: u8 = 9;
    /// IP protocol.
    pub const IP_PROTO: u8 = 10;
    /// IPv4 source address.
    pub const IPV4_SRC: u8 = 11;
    /// IPv4 destination address.
    pub const IPV4_DST: u8 = 12;
    /// TCP source port.
    pub const TCP_SRC: u8 = 13;
    /// TCP destination port.
    pub const TCP_DST: u8 = 14;
    /// UDP source port.
    pub const UDP_SRC: u8 = 15;
    /// UDP destination port.
    pub const UDP_DST: u8 = 16;
    /// SCTP source port.
    pub const SCTP_SRC: u8 = 17;
    /// SCTP destination port.
    pub const SCTP_DST: u8 = 18;
    /// ICMPv4 type.
    pub const ICMPV4_TYPE: u8 = 19;
    /// ICMPv4 code.
    pub const ICMPV4_CODE: u8 = 20;
    /// ARP opcode.
    pub const ARP_OP: u8 = 21;
    /// ARP source protocol address.
    pub const ARP_SPA: u8 = 22;
    /// ARP target protocol address.
    pub const ARP_TPA: u8 = 23;
    /// ARP source hardware address.
    pub const ARP_SHA: u8 = 24;
    /// ARP target hardware address.
    pub const ARP_THA: u8 = 25;
    /// IPv6 source address.
    pub const IPV6_SRC: u8 = 26;
    /// IPv6 destination address.
    pub const IPV6_DST: u8 = 27;
    /// IPv6 flow label.
    pub const IPV6_FLABEL: u8 = 28;
    /// ICMPv6 type.
    pub const ICMPV6_TYPE: u8 = 29;
    /// ICMPv6 code.
    pub const ICMPV6_CODE: u8 = 30;
    /// Target address for IPv6 neighbor discovery.
    pub const IPV6_ND_TARGET: u8 = 31;
    /// Source link-layer address for IPv6 ND.
    pub const IPV6_ND_SLL: u8 = 32;
    /// Target link-layer address for IPv6 ND.
    pub const IPV6_ND_TLL: u8 = 33;
    /// MPLS label.
    pub const MPLS_LABEL: u8 = 34;
    /// MPLS traffic class.
    pub const MPLS_TC: u8 = 35;
    /// MPLS bottom-of-stack bit.
    pub const MPLS_BOS: u8 = 36;
    /// PBB I-SID.
    pub const PBB_ISID: u8 = 37;
    /// Logical-port metadata (tunnel id).
    pub const TUNNEL_ID: u8 = 38;
    /// IPv6 extension header pseudo-field.
    pub const IPV6_EXTHDR: u8 = 39;
    /// PBB UCA header field.
    pub const PBB_UCA: u8 = 41;
    /// TCP flags.
    pub const TCP_FLAGS: u8 = 42;
}

/// Fields in [`super::CLASS_NXM_1`].
pub mod nxm1 {
    /// First general-purpose register; `REG0 + n` addresses register `n`.
    pub const REG0: u8 = 0;
    /// Last general-purpose register.
    pub const REG15: u8 = 15;
    /// Tunnel id.
    pub const TUN_ID: u8 = 16;
    /// Tunnel outer IPv4 source.
    pub const TUN_IPV4_SRC: u8 = 31;
    /// Tunnel outer IPv4 destination.
    pub const TUN_IPV4_DST: u8 = 32;
    /// Connection-tracking state bits.
    pub const CT_STATE: u8 = 105;
    /// Connection-tracking zone.
    pub const CT_ZONE: u8 = 106;
    /// Connection-tracking mark.
    pub const CT_MARK: u8 = 107;
    /// Connection-tracking label (128 bits).
    pub const CT_LABEL: u8 = 108;
}

/// Canonical payload width in bytes for `(class, field)`, if the field is
/// known to this library. Unknown fields return `None` and are accepted with
/// whatever internally-consistent length they declare.
#[must_use]
pub fn payload_width(class: u16, field: u8) -> Option<usize> {
    match class {
        super::CLASS_OPENFLOW_BASIC => basic_width(field),
        super::CLASS_PACKET_REGS => Some(8),
        super::CLASS_NXM_1 => nxm1_width(field),
        _ => None,
    }
}

fn basic_width(field: u8) -> Option<usize> {
    use basic::*;
    Some(match field {
        IN_PORT | IN_PHY_PORT | IPV4_SRC | IPV4_DST | ARP_SPA | ARP_TPA | IPV6_FLABEL
        | MPLS_LABEL => 4,
        METADATA | TUNNEL_ID => 8,
        ETH_DST | ETH_SRC | ARP_SHA | ARP_THA | IPV6_ND_SLL | IPV6_ND_TLL => 6,
        ETH_TYPE | VLAN_VID | TCP_SRC | TCP_DST | UDP_SRC | UDP_DST | SCTP_SRC | SCTP_DST
        | ARP_OP | IPV6_EXTHDR | TCP_FLAGS => 2,
        VLAN_PCP | IP_DSCP | IP_ECN | IP_PROTO | ICMPV4_TYPE | ICMPV4_CODE | ICMPV6_TYPE
        | ICMPV6_CODE | MPLS_TC | MPLS_BOS | PBB_UCA => 1,
        IPV6_SRC | IPV6_DST | IPV6_ND_TARGET => 16,
        PBB_ISID => 3,
        _ => return None,
    })
}

fn nxm1_width(field: u8) -> Option<usize> {
    use nxm1::*;
    Some(match field {
        REG0..=REG15 | TUN_IPV4_SRC | TUN_IPV4_DST | CT_STATE | CT_MARK => 4,
        TUN_ID => 8,
        CT_ZONE => 2,
        CT_LABEL => 16,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_widths() {
        assert_eq!(payload_width(super::super::CLASS_OPENFLOW_BASIC, basic::IN_PORT), Some(4));
        assert_eq!(payload_width(super::super::CLASS_OPENFLOW_BASIC, basic::ETH_DST), Some(6));
        assert_eq!(payload_width(super::super::CLASS_NXM_1, nxm1::CT_LABEL), Some(16));
        assert_eq!(payload_width(super::super::CLASS_PACKET_REGS, 3), Some(8));
    }

    #[test]
    fn unknown_fields_have_no_width() {
        assert_eq!(payload_width(super::super::CLASS_OPENFLOW_BASIC, 0x50), None);
        assert_eq!(payload_width(super::super::CLASS_EXPERIMENTER, 1), None);
    }
}
