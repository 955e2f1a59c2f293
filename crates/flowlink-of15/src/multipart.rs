//! Multipart request/reply and the 1.5 statistics bodies.
//!
//! The 1.5 set renumbers the flow bodies (flow-desc replaces 1.3's flow
//! stats at type 1; OXS-based flow stats move to type 17) and adds
//! table-desc, queue-desc, flow-monitor, controller-status, and
//! bundle-features. Flag bit 0 still means "more frames follow".

use flowlink_wire::instruction::{self, Instruction};
use flowlink_wire::meter::{self, MeterBand};
use flowlink_wire::oxm::Match;
use flowlink_wire::{Codec, Cursor, Result, WireError, Writer, padded8};

use crate::controller_status::ControllerStatus;
use crate::group::Bucket;
use crate::port::{Port, put_fixed_name, read_fixed_name};
use crate::status::TableDesc;
use crate::table_features::TableFeatures;

/// Flag bit 0: more frames follow in this exchange.
pub const OFPMPF_MORE: u16 = 1 << 0;

const OFPMP_DESC: u16 = 0;
const OFPMP_FLOW_DESC: u16 = 1;
const OFPMP_AGGREGATE_STATS: u16 = 2;
const OFPMP_TABLE_STATS: u16 = 3;
const OFPMP_PORT_STATS: u16 = 4;
const OFPMP_QUEUE_STATS: u16 = 5;
const OFPMP_GROUP_STATS: u16 = 6;
const OFPMP_GROUP_DESC: u16 = 7;
const OFPMP_GROUP_FEATURES: u16 = 8;
const OFPMP_METER_STATS: u16 = 9;
const OFPMP_METER_DESC: u16 = 10;
const OFPMP_METER_FEATURES: u16 = 11;
const OFPMP_TABLE_FEATURES: u16 = 12;
const OFPMP_PORT_DESC: u16 = 13;
const OFPMP_TABLE_DESC: u16 = 14;
const OFPMP_QUEUE_DESC: u16 = 15;
const OFPMP_FLOW_MONITOR: u16 = 16;
const OFPMP_FLOW_STATS: u16 = 17;
const OFPMP_CONTROLLER_STATUS: u16 = 18;
const OFPMP_BUNDLE_FEATURES: u16 = 19;
const OFPMP_EXPERIMENTER: u16 = 0xFFFF;

/// Filter common to flow-desc, flow-stats, and aggregate requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowFilter {
    /// Table to read, or 0xFF for all.
    pub table_id: u8,
    /// Restrict to flows forwarding to this port.
    pub out_port: u32,
    /// Restrict to flows forwarding to this group.
    pub out_group: u32,
    /// Cookie filter.
    pub cookie: u64,
    /// Bits of `cookie` that must match.
    pub cookie_mask: u64,
    /// Match filter.
    pub match_: Match,
}

impl Default for FlowFilter {
    fn default() -> Self {
        Self {
            table_id: 0xFF,
            out_port: flowlink_wire::action::ports::ANY,
            out_group: crate::group::OFPG_ANY,
            cookie: 0,
            cookie_mask: 0,
            match_: Match::new(),
        }
    }
}

impl Codec for FlowFilter {
    fn wire_len(&self) -> usize {
        32 + self.match_.wire_len()
    }

    fn encode(&self, w: &mut Writer) -> Result<()> {
        w.put_u8(self.table_id);
        w.put_zeros(3);
        w.put_u32(self.out_port);
        w.put_u32(self.out_group);
        w.put_zeros(4);
        w.put_u64(self.cookie);
        w.put_u64(self.cookie_mask);
        self.match_.encode(w)
    }

    fn decode(cur: &mut Cursor<'_>) -> Result<Self> {
        let table_id = cur.read_u8()?;
        cur.skip(3)?;
        let out_port = cur.read_u32()?;
        let out_group = cur.read_u32()?;
        cur.skip(4)?;
        let cookie = cur.read_u64()?;
        let cookie_mask = cur.read_u64()?;
        Ok(Self { table_id, out_port, out_group, cookie, cookie_mask, match_: Match::decode(cur)? })
    }
}

/// One flow in a flow-desc reply.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FlowDesc {
    /// Table the flow lives in.
    pub table_id: u8,
    /// Matching precedence.
    pub priority: u16,
    /// Idle timeout.
    pub idle_timeout: u16,
    /// Hard timeout.
    pub hard_timeout: u16,
    /// Flow-mod flags the flow was installed with.
    pub flags: u16,
    /// Eviction precedence.
    pub importance: u16,
    /// Cookie.
    pub cookie: u64,
    /// The flow's match.
    pub match_: Match,
    /// The flow's instructions.
    pub instructions: Vec<Instruction>,
}

impl Codec for FlowDesc {
    fn wire_len(&self) -> usize {
        24 + self.match_.wire_len() + instruction::list_len(&self.instructions)
    }

    fn encode(&self, w: &mut Writer) -> Result<()> {
        let len = self.wire_len();
        if len > usize::from(u16::MAX) {
            return Err(WireError::Encode("flow desc entry exceeds u16 length"));
        }
        w.put_u16(len as u16);
        w.put_zeros(2);
        w.put_u8(self.table_id);
        w.put_u8(0);
        w.put_u16(self.priority);
        w.put_u16(self.idle_timeout);
        w.put_u16(self.hard_timeout);
        w.put_u16(self.flags);
        w.put_u16(self.importance);
        w.put_u64(self.cookie);
        self.match_.encode(w)?;
        instruction::encode_list(&self.instructions, w)
    }

    fn decode(cur: &mut Cursor<'_>) -> Result<Self> {
        let len = cur.read_u16()? as usize;
        let mut body = cur.subcursor(len, 2)?;
        body.skip(2)?;
        let table_id = body.read_u8()?;
        body.skip(1)?;
        let priority = body.read_u16()?;
        let idle_timeout = body.read_u16()?;
        let hard_timeout = body.read_u16()?;
        let flags = body.read_u16()?;
        let importance = body.read_u16()?;
        let cookie = body.read_u64()?;
        let match_ = Match::decode(&mut body)?;
        let instructions = instruction::decode_list(&mut body)?;
        Ok(Self {
            table_id,
            priority,
            idle_timeout,
            hard_timeout,
            flags,
            importance,
            cookie,
            match_,
            instructions,
        })
    }
}

/// One flow in an OXS flow-stats reply (type 17). Statistics are carried
/// as raw OXS TLVs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FlowStatsEntry {
    /// Table the flow lives in.
    pub table_id: u8,
    /// Reason code accompanying an unsolicited stats push.
    pub reason: u8,
    /// Matching precedence.
    pub priority: u16,
    /// The flow's match.
    pub match_: Match,
    /// Raw OXS statistics TLVs, preserved as received.
    pub stats: Vec<u8>,
}

impl Codec for FlowStatsEntry {
    fn wire_len(&self) -> usize {
        8 + self.match_.wire_len() + self.stats.len()
    }

    fn encode(&self, w: &mut Writer) -> Result<()> {
        let len = self.wire_len();
        if len > usize::from(u16::MAX) {
            return Err(WireError::Encode("flow stats entry exceeds u16 length"));
        }
        w.put_u16(len as u16);
        w.put_zeros(2);
        w.put_u8(self.table_id);
        w.put_u8(self.reason);
        w.put_u16(self.priority);
        self.match_.encode(w)?;
        w.put_slice(&self.stats);
        Ok(())
    }

    fn decode(cur: &mut Cursor<'_>) -> Result<Self> {
        let len = cur.read_u16()? as usize;
        let mut body = cur.subcursor(len, 2)?;
        body.skip(2)?;
        let table_id = body.read_u8()?;
        let reason = body.read_u8()?;
        let priority = body.read_u16()?;
        let match_ = Match::decode(&mut body)?;
        Ok(Self { table_id, reason, priority, match_, stats: body.rest().to_vec() })
    }
}

/// Switch description strings.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DescStats {
    /// Manufacturer.
    pub mfr_desc: String,
    /// Hardware revision.
    pub hw_desc: String,
    /// Software revision.
    pub sw_desc: String,
    /// Serial number.
    pub serial_num: String,
    /// Human-readable datapath description.
    pub dp_desc: String,
}

impl Codec for DescStats {
    fn wire_len(&self) -> usize {
        1056
    }

    fn encode(&self, w: &mut Writer) -> Result<()> {
        put_fixed_name(w, &self.mfr_desc, 256);
        put_fixed_name(w, &self.hw_desc, 256);
        put_fixed_name(w, &self.sw_desc, 256);
        put_fixed_name(w, &self.serial_num, 32);
        put_fixed_name(w, &self.dp_desc, 256);
        Ok(())
    }

    fn decode(cur: &mut Cursor<'_>) -> Result<Self> {
        Ok(Self {
            mfr_desc: read_fixed_name(cur, 256)?,
            hw_desc: read_fixed_name(cur, 256)?,
            sw_desc: read_fixed_name(cur, 256)?,
            serial_num: read_fixed_name(cur, 32)?,
            dp_desc: read_fixed_name(cur, 256)?,
        })
    }
}

/// Per-table counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TableStats {
    /// Table id.
    pub table_id: u8,
    /// Active entries.
    pub active_count: u32,
    /// Lookups.
    pub lookup_count: u64,
    /// Lookups that matched.
    pub matched_count: u64,
}

impl Codec for TableStats {
    fn wire_len(&self) -> usize {
        24
    }

    fn encode(&self, w: &mut Writer) -> Result<()> {
        w.put_u8(self.table_id);
        w.put_zeros(3);
        w.put_u32(self.active_count);
        w.put_u64(self.lookup_count);
        w.put_u64(self.matched_count);
        Ok(())
    }

    fn decode(cur: &mut Cursor<'_>) -> Result<Self> {
        let table_id = cur.read_u8()?;
        cur.skip(3)?;
        Ok(Self {
            table_id,
            active_count: cur.read_u32()?,
            lookup_count: cur.read_u64()?,
            matched_count: cur.read_u64()?,
        })
    }
}

/// One port-stats property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortStatsProp {
    /// Ethernet error counters.
    Ethernet {
        /// Frame alignment errors.
        rx_frame_err: u64,
        /// Overrun errors.
        rx_over_err: u64,
        /// CRC errors.
        rx_crc_err: u64,
        /// Collisions.
        collisions: u64,
    },
    /// Unrecognized property (optical, experimenter), preserved raw.
    Unknown {
        /// Property type code.
        prop_type: u16,
        /// Value bytes (padding excluded).
        data: Vec<u8>,
    },
}

const OFPPSPT_ETHERNET: u16 = 0;

impl Codec for PortStatsProp {
    fn wire_len(&self) -> usize {
        match self {
            Self::Ethernet { .. } => 40,
            Self::Unknown { data, .. } => padded8(4 + data.len()),
        }
    }

    fn encode(&self, w: &mut Writer) -> Result<()> {
        match self {
            Self::Ethernet { rx_frame_err, rx_over_err, rx_crc_err, collisions } => {
                w.put_u16(OFPPSPT_ETHERNET);
                w.put_u16(40);
                w.put_zeros(4);
                w.put_u64(*rx_frame_err);
                w.put_u64(*rx_over_err);
                w.put_u64(*rx_crc_err);
                w.put_u64(*collisions);
            },
            Self::Unknown { prop_type, data } => {
                let body_len = 4 + data.len();
                if body_len > usize::from(u16::MAX) {
                    return Err(WireError::Encode("port stats property exceeds u16 length"));
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
            OFPPSPT_ETHERNET => {
                body.skip(4)?;
                Self::Ethernet {
                    rx_frame_err: body.read_u64()?,
                    rx_over_err: body.read_u64()?,
                    rx_crc_err: body.read_u64()?,
                    collisions: body.read_u64()?,
                }
            },
            other => Self::Unknown { prop_type: other, data: body.rest().to_vec() },
        };
        if !body.is_empty() {
            return Err(WireError::Invariant("port stats property length disagrees with body"));
        }
        cur.skip_align8()?;
        Ok(prop)
    }
}

/// Per-port counters plus properties.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PortStats {
    /// Port number.
    pub port_no: u32,
    /// Seconds the port has been up.
    pub duration_sec: u32,
    /// Nanoseconds beyond `duration_sec`.
    pub duration_nsec: u32,
    /// Received packets.
    pub rx_packets: u64,
    /// Transmitted packets.
    pub tx_packets: u64,
    /// Received bytes.
    pub rx_bytes: u64,
    /// Transmitted bytes.
    pub tx_bytes: u64,
    /// Packets dropped on receive.
    pub rx_dropped: u64,
    /// Packets dropped on transmit.
    pub tx_dropped: u64,
    /// Receive errors.
    pub rx_errors: u64,
    /// Transmit errors.
    pub tx_errors: u64,
    /// Properties in wire order.
    pub properties: Vec<PortStatsProp>,
}

impl Codec for PortStats {
    fn wire_len(&self) -> usize {
        80 + self.properties.iter().map(Codec::wire_len).sum::<usize>()
    }

    fn encode(&self, w: &mut Writer) -> Result<()> {
        let len = self.wire_len();
        if len > usize::from(u16::MAX) {
            return Err(WireError::Encode("port stats entry exceeds u16 length"));
        }
        w.put_u16(len as u16);
        w.put_zeros(2);
        w.put_u32(self.port_no);
        w.put_u32(self.duration_sec);
        w.put_u32(self.duration_nsec);
        w.put_u64(self.rx_packets);
        w.put_u64(self.tx_packets);
        w.put_u64(self.rx_bytes);
        w.put_u64(self.tx_bytes);
        w.put_u64(self.rx_dropped);
        w.put_u64(self.tx_dropped);
        w.put_u64(self.rx_errors);
        w.put_u64(self.tx_errors);
        for prop in &self.properties {
            prop.encode(w)?;
        }
        Ok(())
    }

    fn decode(cur: &mut Cursor<'_>) -> Result<Self> {
        let len = cur.read_u16()? as usize;
        let mut body = cur.subcursor(len, 2)?;
        body.skip(2)?;
        let port_no = body.read_u32()?;
        let duration_sec = body.read_u32()?;
        let duration_nsec = body.read_u32()?;
        let rx_packets = body.read_u64()?;
        let tx_packets = body.read_u64()?;
        let rx_bytes = body.read_u64()?;
        let tx_bytes = body.read_u64()?;
        let rx_dropped = body.read_u64()?;
        let tx_dropped = body.read_u64()?;
        let rx_errors = body.read_u64()?;
        let tx_errors = body.read_u64()?;
        let mut properties = Vec::new();
        while !body.is_empty() {
            properties.push(PortStatsProp::decode(&mut body)?);
        }
        Ok(Self {
            port_no,
            duration_sec,
            duration_nsec,
            rx_packets,
            tx_packets,
            rx_bytes,
            tx_bytes,
            rx_dropped,
            tx_dropped,
            rx_errors,
            tx_errors,
            properties,
        })
    }
}

/// Per-queue counters plus raw properties.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueueStats {
    /// Port the queue hangs off.
    pub port_no: u32,
    /// Queue id.
    pub queue_id: u32,
    /// Transmitted bytes.
    pub tx_bytes: u64,
    /// Transmitted packets.
    pub tx_packets: u64,
    /// Packets dropped due to overrun.
    pub tx_errors: u64,
    /// Seconds the queue has existed.
    pub duration_sec: u32,
    /// Nanoseconds beyond `duration_sec`.
    pub duration_nsec: u32,
    /// Raw property TLVs, preserved as received.
    pub properties: Vec<u8>,
}

impl Codec for QueueStats {
    fn wire_len(&self) -> usize {
        48 + self.properties.len()
    }

    fn encode(&self, w: &mut Writer) -> Result<()> {
        let len = self.wire_len();
        if len > usize::from(u16::MAX) {
            return Err(WireError::Encode("queue stats entry exceeds u16 length"));
        }
        w.put_u16(len as u16);
        w.put_zeros(6);
        w.put_u32(self.port_no);
        w.put_u32(self.queue_id);
        w.put_u64(self.tx_bytes);
        w.put_u64(self.tx_packets);
        w.put_u64(self.tx_errors);
        w.put_u32(self.duration_sec);
        w.put_u32(self.duration_nsec);
        w.put_slice(&self.properties);
        Ok(())
    }

    fn decode(cur: &mut Cursor<'_>) -> Result<Self> {
        let len = cur.read_u16()? as usize;
        let mut body = cur.subcursor(len, 2)?;
        body.skip(6)?;
        Ok(Self {
            port_no: body.read_u32()?,
            queue_id: body.read_u32()?,
            tx_bytes: body.read_u64()?,
            tx_packets: body.read_u64()?,
            tx_errors: body.read_u64()?,
            duration_sec: body.read_u32()?,
            duration_nsec: body.read_u32()?,
            properties: body.rest().to_vec(),
        })
    }
}

/// Per-bucket counters inside a group-stats entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BucketCounter {
    /// Packets processed by the bucket.
    pub packet_count: u64,
    /// Bytes processed by the bucket.
    pub byte_count: u64,
}

/// Per-group counters.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GroupStats {
    /// Group id.
    pub group_id: u32,
    /// Flows and groups referencing this group.
    pub ref_count: u32,
    /// Packets processed.
    pub packet_count: u64,
    /// Bytes processed.
    pub byte_count: u64,
    /// Seconds the group has existed.
    pub duration_sec: u32,
    /// Nanoseconds beyond `duration_sec`.
    pub duration_nsec: u32,
    /// One counter pair per bucket.
    pub bucket_stats: Vec<BucketCounter>,
}

impl Codec for GroupStats {
    fn wire_len(&self) -> usize {
        40 + 16 * self.bucket_stats.len()
    }

    fn encode(&self, w: &mut Writer) -> Result<()> {
        let len = self.wire_len();
        if len > usize::from(u16::MAX) {
            return Err(WireError::Encode("group stats entry exceeds u16 length"));
        }
        w.put_u16(len as u16);
        w.put_zeros(2);
        w.put_u32(self.group_id);
        w.put_u32(self.ref_count);
        w.put_zeros(4);
        w.put_u64(self.packet_count);
        w.put_u64(self.byte_count);
        w.put_u32(self.duration_sec);
        w.put_u32(self.duration_nsec);
        for counter in &self.bucket_stats {
            w.put_u64(counter.packet_count);
            w.put_u64(counter.byte_count);
        }
        Ok(())
    }

    fn decode(cur: &mut Cursor<'_>) -> Result<Self> {
        let len = cur.read_u16()? as usize;
        let mut body = cur.subcursor(len, 2)?;
        body.skip(2)?;
        let group_id = body.read_u32()?;
        let ref_count = body.read_u32()?;
        body.skip(4)?;
        let packet_count = body.read_u64()?;
        let byte_count = body.read_u64()?;
        let duration_sec = body.read_u32()?;
        let duration_nsec = body.read_u32()?;
        let mut bucket_stats = Vec::new();
        while !body.is_empty() {
            bucket_stats
                .push(BucketCounter { packet_count: body.read_u64()?, byte_count: body.read_u64()? });
        }
        Ok(Self {
            group_id,
            ref_count,
            packet_count,
            byte_count,
            duration_sec,
            duration_nsec,
            bucket_stats,
        })
    }
}

/// One group in a group-desc reply.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GroupDescStats {
    /// `OFPGT_*` group type.
    pub group_type: u8,
    /// Group id.
    pub group_id: u32,
    /// The group's buckets.
    pub buckets: Vec<Bucket>,
    /// Raw group property TLVs, preserved as received.
    pub properties: Vec<u8>,
}

impl Codec for GroupDescStats {
    fn wire_len(&self) -> usize {
        16 + self.buckets.iter().map(Codec::wire_len).sum::<usize>() + self.properties.len()
    }

    fn encode(&self, w: &mut Writer) -> Result<()> {
        let len = self.wire_len();
        let buckets_len = self.buckets.iter().map(Codec::wire_len).sum::<usize>();
        if len > usize::from(u16::MAX) {
            return Err(WireError::Encode("group desc entry exceeds u16 length"));
        }
        w.put_u16(len as u16);
        w.put_u8(self.group_type);
        w.put_u8(0);
        w.put_u32(self.group_id);
        w.put_u16(buckets_len as u16);
        w.put_zeros(6);
        for bucket in &self.buckets {
            bucket.encode(w)?;
        }
        w.put_slice(&self.properties);
        Ok(())
    }

    fn decode(cur: &mut Cursor<'_>) -> Result<Self> {
        let len = cur.read_u16()? as usize;
        let mut body = cur.subcursor(len, 2)?;
        let group_type = body.read_u8()?;
        body.skip(1)?;
        let group_id = body.read_u32()?;
        let buckets_len = body.read_u16()? as usize;
        body.skip(6)?;
        let mut buckets_cur = body.subcursor(buckets_len, 0)?;
        let mut buckets = Vec::new();
        while !buckets_cur.is_empty() {
            buckets.push(Bucket::decode(&mut buckets_cur)?);
        }
        Ok(Self { group_type, group_id, buckets, properties: body.rest().to_vec() })
    }
}

/// Group capability inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GroupFeatures {
    /// Supported group types, one bit per `OFPGT_*`.
    pub types: u32,
    /// `OFPGFC_*` capability bits.
    pub capabilities: u32,
    /// Maximum groups per type.
    pub max_groups: [u32; 4],
    /// Supported actions per type, one bit per action type.
    pub actions: [u32; 4],
}

impl Codec for GroupFeatures {
    fn wire_len(&self) -> usize {
        40
    }

    fn encode(&self, w: &mut Writer) -> Result<()> {
        w.put_u32(self.types);
        w.put_u32(self.capabilities);
        for max in self.max_groups {
            w.put_u32(max);
        }
        for actions in self.actions {
            w.put_u32(actions);
        }
        Ok(())
    }

    fn decode(cur: &mut Cursor<'_>) -> Result<Self> {
        let types = cur.read_u32()?;
        let capabilities = cur.read_u32()?;
        let mut max_groups = [0u32; 4];
        for max in &mut max_groups {
            *max = cur.read_u32()?;
        }
        let mut actions = [0u32; 4];
        for a in &mut actions {
            *a = cur.read_u32()?;
        }
        Ok(Self { types, capabilities, max_groups, actions })
    }
}

/// Per-band counters inside a meter-stats entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BandStats {
    /// Packets that hit the band.
    pub packet_band_count: u64,
    /// Bytes that hit the band.
    pub byte_band_count: u64,
}

/// Per-meter counters.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MeterStats {
    /// Meter id.
    pub meter_id: u32,
    /// Flows bound to the meter.
    pub flow_count: u32,
    /// Packets in.
    pub packet_in_count: u64,
    /// Bytes in.
    pub byte_in_count: u64,
    /// Seconds the meter has existed.
    pub duration_sec: u32,
    /// Nanoseconds beyond `duration_sec`.
    pub duration_nsec: u32,
    /// One counter pair per band.
    pub band_stats: Vec<BandStats>,
}

impl Codec for MeterStats {
    fn wire_len(&self) -> usize {
        40 + 16 * self.band_stats.len()
    }

    fn encode(&self, w: &mut Writer) -> Result<()> {
        let len = self.wire_len();
        if len > usize::from(u16::MAX) {
            return Err(WireError::Encode("meter stats entry exceeds u16 length"));
        }
        w.put_u32(self.meter_id);
        w.put_u16(len as u16);
        w.put_zeros(6);
        w.put_u32(self.flow_count);
        w.put_u64(self.packet_in_count);
        w.put_u64(self.byte_in_count);
        w.put_u32(self.duration_sec);
        w.put_u32(self.duration_nsec);
        for band in &self.band_stats {
            w.put_u64(band.packet_band_count);
            w.put_u64(band.byte_band_count);
        }
        Ok(())
    }

    fn decode(cur: &mut Cursor<'_>) -> Result<Self> {
        let meter_id = cur.read_u32()?;
        let len = cur.read_u16()? as usize;
        let mut body = cur.subcursor(len, 6)?;
        body.skip(6)?;
        let flow_count = body.read_u32()?;
        let packet_in_count = body.read_u64()?;
        let byte_in_count = body.read_u64()?;
        let duration_sec = body.read_u32()?;
        let duration_nsec = body.read_u32()?;
        let mut band_stats = Vec::new();
        while !body.is_empty() {
            band_stats.push(BandStats {
                packet_band_count: body.read_u64()?,
                byte_band_count: body.read_u64()?,
            });
        }
        Ok(Self {
            meter_id,
            flow_count,
            packet_in_count,
            byte_in_count,
            duration_sec,
            duration_nsec,
            band_stats,
        })
    }
}

/// One meter in a meter-desc reply.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MeterDesc {
    /// `OFPMF_*` bits.
    pub flags: u16,
    /// Meter id.
    pub meter_id: u32,
    /// The meter's bands.
    pub bands: Vec<MeterBand>,
}

impl Codec for MeterDesc {
    fn wire_len(&self) -> usize {
        8 + meter::list_len(&self.bands)
    }

    fn encode(&self, w: &mut Writer) -> Result<()> {
        let len = self.wire_len();
        if len > usize::from(u16::MAX) {
            return Err(WireError::Encode("meter desc entry exceeds u16 length"));
        }
        w.put_u16(len as u16);
        w.put_u16(self.flags);
        w.put_u32(self.meter_id);
        meter::encode_list(&self.bands, w)
    }

    fn decode(cur: &mut Cursor<'_>) -> Result<Self> {
        let len = cur.read_u16()? as usize;
        let mut body = cur.subcursor(len, 2)?;
        let flags = body.read_u16()?;
        let meter_id = body.read_u32()?;
        let bands = meter::decode_list(&mut body)?;
        Ok(Self { flags, meter_id, bands })
    }
}

/// Meter capability inventory (1.5 adds a feature bitmap).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MeterFeatures {
    /// Maximum meters.
    pub max_meter: u32,
    /// Supported band types, one bit per `OFPMBT_*`.
    pub band_types: u32,
    /// `OFPMF_*` capability bits.
    pub capabilities: u32,
    /// Maximum bands per meter.
    pub max_bands: u8,
    /// Maximum color value.
    pub max_color: u8,
    /// `OFPMFF_*` feature bits.
    pub features: u32,
}

impl Codec for MeterFeatures {
    fn wire_len(&self) -> usize {
        24
    }

    fn encode(&self, w: &mut Writer) -> Result<()> {
        w.put_u32(self.max_meter);
        w.put_u32(self.band_types);
        w.put_u32(self.capabilities);
        w.put_u8(self.max_bands);
        w.put_u8(self.max_color);
        w.put_zeros(2);
        w.put_u32(self.features);
        w.put_zeros(4);
        Ok(())
    }

    fn decode(cur: &mut Cursor<'_>) -> Result<Self> {
        let max_meter = cur.read_u32()?;
        let band_types = cur.read_u32()?;
        let capabilities = cur.read_u32()?;
        let max_bands = cur.read_u8()?;
        let max_color = cur.read_u8()?;
        cur.skip(2)?;
        let features = cur.read_u32()?;
        cur.skip(4)?;
        Ok(Self { max_meter, band_types, capabilities, max_bands, max_color, features })
    }
}

/// One queue-desc property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueDescProp {
    /// Minimum rate in 1/10ths of a percent.
    MinRate(u16),
    /// Maximum rate in 1/10ths of a percent.
    MaxRate(u16),
    /// Unrecognized property, preserved raw.
    Unknown {
        /// Property type code.
        prop_type: u16,
        /// Value bytes (padding excluded).
        data: Vec<u8>,
    },
}

const OFPQDPT_MIN_RATE: u16 = 1;
const OFPQDPT_MAX_RATE: u16 = 2;

impl Codec for QueueDescProp {
    fn wire_len(&self) -> usize {
        match self {
            Self::MinRate(_) | Self::MaxRate(_) => 8,
            Self::Unknown { data, .. } => padded8(4 + data.len()),
        }
    }

    fn encode(&self, w: &mut Writer) -> Result<()> {
        match self {
            Self::MinRate(rate) => {
                w.put_u16(OFPQDPT_MIN_RATE);
                w.put_u16(8);
                w.put_u16(*rate);
                w.put_zeros(2);
            },
            Self::MaxRate(rate) => {
                w.put_u16(OFPQDPT_MAX_RATE);
                w.put_u16(8);
                w.put_u16(*rate);
                w.put_zeros(2);
            },
            Self::Unknown { prop_type, data } => {
                let body_len = 4 + data.len();
                if body_len > usize::from(u16::MAX) {
                    return Err(WireError::Encode("queue desc property exceeds u16 length"));
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
            OFPQDPT_MIN_RATE => {
                let rate = body.read_u16()?;
                body.skip(2)?;
                Self::MinRate(rate)
            },
            OFPQDPT_MAX_RATE => {
                let rate = body.read_u16()?;
                body.skip(2)?;
                Self::MaxRate(rate)
            },
            other => Self::Unknown { prop_type: other, data: body.rest().to_vec() },
        };
        if !body.is_empty() {
            return Err(WireError::Invariant("queue desc property length disagrees with body"));
        }
        cur.skip_align8()?;
        Ok(prop)
    }
}

/// One queue in a queue-desc reply.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QueueDesc {
    /// Port the queue hangs off.
    pub port_no: u32,
    /// Queue id.
    pub queue_id: u32,
    /// Properties in wire order.
    pub properties: Vec<QueueDescProp>,
}

impl Codec for QueueDesc {
    fn wire_len(&self) -> usize {
        16 + self.properties.iter().map(Codec::wire_len).sum::<usize>()
    }

    fn encode(&self, w: &mut Writer) -> Result<()> {
        let len = self.wire_len();
        if len > usize::from(u16::MAX) {
            return Err(WireError::Encode("queue desc entry exceeds u16 length"));
        }
        w.put_u32(self.port_no);
        w.put_u32(self.queue_id);
        w.put_u16(len as u16);
        w.put_zeros(6);
        for prop in &self.properties {
            prop.encode(w)?;
        }
        Ok(())
    }

    fn decode(cur: &mut Cursor<'_>) -> Result<Self> {
        let port_no = cur.read_u32()?;
        let queue_id = cur.read_u32()?;
        let len = cur.read_u16()? as usize;
        let mut body = cur.subcursor(len, 10)?;
        body.skip(6)?;
        let mut properties = Vec::new();
        while !body.is_empty() {
            properties.push(QueueDescProp::decode(&mut body)?);
        }
        Ok(Self { port_no, queue_id, properties })
    }
}

/// Flow-monitor command: add a monitor.
pub const OFPFMC_ADD: u8 = 0;
/// Flow-monitor command: modify a monitor.
pub const OFPFMC_MODIFY: u8 = 1;
/// Flow-monitor command: delete a monitor.
pub const OFPFMC_DELETE: u8 = 2;

/// Flow-monitor flag: report the initial flow set.
pub const OFPFMF_INITIAL: u16 = 1 << 0;
/// Flow-monitor flag: report added flows.
pub const OFPFMF_ADD: u16 = 1 << 1;
/// Flow-monitor flag: report removed flows.
pub const OFPFMF_REMOVED: u16 = 1 << 2;
/// Flow-monitor flag: report modified flows.
pub const OFPFMF_MODIFY: u16 = 1 << 3;
/// Flow-monitor flag: include instructions in updates.
pub const OFPFMF_INSTRUCTIONS: u16 = 1 << 4;
/// Flow-monitor flag: never abbreviate own changes.
pub const OFPFMF_NO_ABBREV: u16 = 1 << 5;
/// Flow-monitor flag: report only own changes.
pub const OFPFMF_ONLY_OWN: u16 = 1 << 6;

/// Flow-monitor request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowMonitorRequest {
    /// Controller-assigned monitor id.
    pub monitor_id: u32,
    /// Restrict to flows forwarding to this port.
    pub out_port: u32,
    /// Restrict to flows forwarding to this group.
    pub out_group: u32,
    /// `OFPFMF_*` bits.
    pub flags: u16,
    /// Table to monitor, or 0xFF for all.
    pub table_id: u8,
    /// `OFPFMC_*` command.
    pub command: u8,
    /// Match filter.
    pub match_: Match,
}

impl Default for FlowMonitorRequest {
    fn default() -> Self {
        Self {
            monitor_id: 0,
            out_port: flowlink_wire::action::ports::ANY,
            out_group: crate::group::OFPG_ANY,
            flags: OFPFMF_INITIAL | OFPFMF_ADD | OFPFMF_REMOVED | OFPFMF_MODIFY,
            table_id: 0xFF,
            command: OFPFMC_ADD,
            match_: Match::new(),
        }
    }
}

impl Codec for FlowMonitorRequest {
    fn wire_len(&self) -> usize {
        16 + self.match_.wire_len()
    }

    fn encode(&self, w: &mut Writer) -> Result<()> {
        w.put_u32(self.monitor_id);
        w.put_u32(self.out_port);
        w.put_u32(self.out_group);
        w.put_u16(self.flags);
        w.put_u8(self.table_id);
        w.put_u8(self.command);
        self.match_.encode(w)
    }

    fn decode(cur: &mut Cursor<'_>) -> Result<Self> {
        Ok(Self {
            monitor_id: cur.read_u32()?,
            out_port: cur.read_u32()?,
            out_group: cur.read_u32()?,
            flags: cur.read_u16()?,
            table_id: cur.read_u8()?,
            command: cur.read_u8()?,
            match_: Match::decode(cur)?,
        })
    }
}

const OFPFME_INITIAL: u16 = 0;
const OFPFME_ADDED: u16 = 1;
const OFPFME_REMOVED: u16 = 2;
const OFPFME_MODIFIED: u16 = 3;
const OFPFME_ABBREV: u16 = 4;
const OFPFME_PAUSED: u16 = 5;
const OFPFME_RESUMED: u16 = 6;

/// One event in a flow-monitor reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowUpdate {
    /// A full flow event (initial/added/removed/modified).
    Full {
        /// `OFPFME_INITIAL..=OFPFME_MODIFIED`.
        event: u16,
        /// Table the flow lives in.
        table_id: u8,
        /// Removal reason, meaningful for removed events.
        reason: u8,
        /// Idle timeout.
        idle_timeout: u16,
        /// Hard timeout.
        hard_timeout: u16,
        /// Matching precedence.
        priority: u16,
        /// Cookie.
        cookie: u64,
        /// The flow's match.
        match_: Match,
    },
    /// An abbreviated event: the change came from this controller's own
    /// request, identified by its xid.
    Abbrev(
        /// The request's transaction id.
        u32,
    ),
    /// Updates were dropped due to buffer pressure.
    Paused,
    /// The update stream caught back up.
    Resumed,
}

impl Codec for FlowUpdate {
    fn wire_len(&self) -> usize {
        match self {
            Self::Full { match_, .. } => 24 + match_.wire_len(),
            Self::Abbrev(_) | Self::Paused | Self::Resumed => 8,
        }
    }

    fn encode(&self, w: &mut Writer) -> Result<()> {
        let len = self.wire_len();
        if len > usize::from(u16::MAX) {
            return Err(WireError::Encode("flow update exceeds u16 length"));
        }
        match self {
            Self::Full {
                event,
                table_id,
                reason,
                idle_timeout,
                hard_timeout,
                priority,
                cookie,
                match_,
            } => {
                w.put_u16(len as u16);
                w.put_u16(*event);
                w.put_u8(*table_id);
                w.put_u8(*reason);
                w.put_u16(*idle_timeout);
                w.put_u16(*hard_timeout);
                w.put_u16(*priority);
                w.put_zeros(4);
                w.put_u64(*cookie);
                match_.encode(w)?;
            },
            Self::Abbrev(xid) => {
                w.put_u16(8);
                w.put_u16(OFPFME_ABBREV);
                w.put_u32(*xid);
            },
            Self::Paused => {
                w.put_u16(8);
                w.put_u16(OFPFME_PAUSED);
                w.put_zeros(4);
            },
            Self::Resumed => {
                w.put_u16(8);
                w.put_u16(OFPFME_RESUMED);
                w.put_zeros(4);
            },
        }
        Ok(())
    }

    fn decode(cur: &mut Cursor<'_>) -> Result<Self> {
        let len = cur.read_u16()? as usize;
        let mut body = cur.subcursor(len, 2)?;
        let event = body.read_u16()?;
        let update = match event {
            OFPFME_INITIAL | OFPFME_ADDED | OFPFME_REMOVED | OFPFME_MODIFIED => {
                let table_id = body.read_u8()?;
                let reason = body.read_u8()?;
                let idle_timeout = body.read_u16()?;
                let hard_timeout = body.read_u16()?;
                let priority = body.read_u16()?;
                body.skip(4)?;
                let cookie = body.read_u64()?;
                let match_ = Match::decode(&mut body)?;
                Self::Full {
                    event,
                    table_id,
                    reason,
                    idle_timeout,
                    hard_timeout,
                    priority,
                    cookie,
                    match_,
                }
            },
            OFPFME_ABBREV => Self::Abbrev(body.read_u32()?),
            OFPFME_PAUSED => {
                body.skip(4)?;
                Self::Paused
            },
            OFPFME_RESUMED => {
                body.skip(4)?;
                Self::Resumed
            },
            other => {
                return Err(WireError::UnknownDiscriminant {
                    family: "flow update event",
                    value: u32::from(other),
                });
            },
        };
        if !body.is_empty() {
            return Err(WireError::Invariant("flow update length disagrees with body"));
        }
        Ok(update)
    }
}

/// Bundle-features request body.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BundleFeaturesRequest {
    /// `OFPBF_*` feature flags being asked about.
    pub feature_request_flags: u32,
    /// Raw property TLVs, preserved as received.
    pub properties: Vec<u8>,
}

impl Codec for BundleFeaturesRequest {
    fn wire_len(&self) -> usize {
        8 + self.properties.len()
    }

    fn encode(&self, w: &mut Writer) -> Result<()> {
        w.put_u32(self.feature_request_flags);
        w.put_zeros(4);
        w.put_slice(&self.properties);
        Ok(())
    }

    fn decode(cur: &mut Cursor<'_>) -> Result<Self> {
        let feature_request_flags = cur.read_u32()?;
        cur.skip(4)?;
        Ok(Self { feature_request_flags, properties: cur.rest().to_vec() })
    }
}

/// Bundle-features reply body.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BundleFeatures {
    /// Supported `OFPBF_*` capability bits.
    pub capabilities: u16,
    /// Raw property TLVs, preserved as received.
    pub properties: Vec<u8>,
}

impl Codec for BundleFeatures {
    fn wire_len(&self) -> usize {
        8 + self.properties.len()
    }

    fn encode(&self, w: &mut Writer) -> Result<()> {
        w.put_u16(self.capabilities);
        w.put_zeros(6);
        w.put_slice(&self.properties);
        Ok(())
    }

    fn decode(cur: &mut Cursor<'_>) -> Result<Self> {
        let capabilities = cur.read_u16()?;
        cur.skip(6)?;
        Ok(Self { capabilities, properties: cur.rest().to_vec() })
    }
}

fn decode_vec<T: Codec>(cur: &mut Cursor<'_>) -> Result<Vec<T>> {
    let mut items = Vec::new();
    while !cur.is_empty() {
        items.push(T::decode(cur)?);
    }
    Ok(items)
}

fn encode_all<T: Codec>(items: &[T], w: &mut Writer) -> Result<()> {
    for item in items {
        item.encode(w)?;
    }
    Ok(())
}

fn vec_len<T: Codec>(items: &[T]) -> usize {
    items.iter().map(Codec::wire_len).sum()
}

/// Request bodies, one per multipart type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MultipartRequestBody {
    /// Switch description.
    Desc,
    /// Full flow descriptions.
    FlowDesc(FlowFilter),
    /// OXS flow statistics.
    FlowStats(FlowFilter),
    /// Aggregate flow statistics.
    Aggregate(FlowFilter),
    /// Table statistics.
    Table,
    /// Port statistics.
    PortStats {
        /// Port filter, `OFPP_ANY` for all.
        port_no: u32,
    },
    /// Queue statistics.
    QueueStats {
        /// Port filter.
        port_no: u32,
        /// Queue filter, 0xFFFFFFFF for all.
        queue_id: u32,
    },
    /// Group statistics.
    Group {
        /// Group filter, [`crate::group::OFPG_ALL`] for all.
        group_id: u32,
    },
    /// Group descriptions.
    GroupDesc {
        /// Group filter.
        group_id: u32,
    },
    /// Group capability inventory.
    GroupFeatures,
    /// Meter statistics.
    Meter {
        /// Meter filter, `OFPM_ALL` for all.
        meter_id: u32,
    },
    /// Meter descriptions.
    MeterDesc {
        /// Meter filter.
        meter_id: u32,
    },
    /// Meter capability inventory.
    MeterFeatures,
    /// Table features; non-empty to configure tables.
    TableFeatures(Vec<TableFeatures>),
    /// Port descriptions.
    PortDesc {
        /// Port filter, `OFPP_ANY` for all.
        port_no: u32,
    },
    /// Table descriptions.
    TableDesc,
    /// Queue descriptions.
    QueueDesc {
        /// Port filter.
        port_no: u32,
        /// Queue filter.
        queue_id: u32,
    },
    /// Flow monitors.
    FlowMonitor(FlowMonitorRequest),
    /// Controller connection statuses.
    ControllerStatus,
    /// Bundle capability inventory.
    BundleFeatures(BundleFeaturesRequest),
    /// Experimenter-defined body.
    Experimenter {
        /// Experimenter id.
        experimenter: u32,
        /// Experimenter-defined subtype.
        exp_type: u32,
        /// Raw body.
        data: Vec<u8>,
    },
}

impl MultipartRequestBody {
    fn mp_type(&self) -> u16 {
        match self {
            Self::Desc => OFPMP_DESC,
            Self::FlowDesc(_) => OFPMP_FLOW_DESC,
            Self::FlowStats(_) => OFPMP_FLOW_STATS,
            Self::Aggregate(_) => OFPMP_AGGREGATE_STATS,
            Self::Table => OFPMP_TABLE_STATS,
            Self::PortStats { .. } => OFPMP_PORT_STATS,
            Self::QueueStats { .. } => OFPMP_QUEUE_STATS,
            Self::Group { .. } => OFPMP_GROUP_STATS,
            Self::GroupDesc { .. } => OFPMP_GROUP_DESC,
            Self::GroupFeatures => OFPMP_GROUP_FEATURES,
            Self::Meter { .. } => OFPMP_METER_STATS,
            Self::MeterDesc { .. } => OFPMP_METER_DESC,
            Self::MeterFeatures => OFPMP_METER_FEATURES,
            Self::TableFeatures(_) => OFPMP_TABLE_FEATURES,
            Self::PortDesc { .. } => OFPMP_PORT_DESC,
            Self::TableDesc => OFPMP_TABLE_DESC,
            Self::QueueDesc { .. } => OFPMP_QUEUE_DESC,
            Self::FlowMonitor(_) => OFPMP_FLOW_MONITOR,
            Self::ControllerStatus => OFPMP_CONTROLLER_STATUS,
            Self::BundleFeatures(_) => OFPMP_BUNDLE_FEATURES,
            Self::Experimenter { .. } => OFPMP_EXPERIMENTER,
        }
    }
}

/// Reply bodies, one per multipart type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MultipartReplyBody {
    /// Switch description.
    Desc(DescStats),
    /// Full flow descriptions.
    FlowDesc(Vec<FlowDesc>),
    /// OXS flow statistics.
    FlowStats(Vec<FlowStatsEntry>),
    /// Aggregate statistics as raw OXS TLVs.
    Aggregate(Vec<u8>),
    /// Table statistics.
    Table(Vec<TableStats>),
    /// Port statistics.
    PortStats(Vec<PortStats>),
    /// Queue statistics.
    QueueStats(Vec<QueueStats>),
    /// Group statistics.
    Group(Vec<GroupStats>),
    /// Group descriptions.
    GroupDesc(Vec<GroupDescStats>),
    /// Group capability inventory.
    GroupFeatures(GroupFeatures),
    /// Meter statistics.
    Meter(Vec<MeterStats>),
    /// Meter descriptions.
    MeterDesc(Vec<MeterDesc>),
    /// Meter capability inventory.
    MeterFeatures(MeterFeatures),
    /// Table features.
    TableFeatures(Vec<TableFeatures>),
    /// Port descriptions.
    PortDesc(Vec<Port>),
    /// Table descriptions.
    TableDesc(Vec<TableDesc>),
    /// Queue descriptions.
    QueueDesc(Vec<QueueDesc>),
    /// Flow-monitor events.
    FlowMonitor(Vec<FlowUpdate>),
    /// Controller connection statuses.
    ControllerStatus(Vec<ControllerStatus>),
    /// Bundle capability inventory.
    BundleFeatures(BundleFeatures),
    /// Experimenter-defined body.
    Experimenter {
        /// Experimenter id.
        experimenter: u32,
        /// Experimenter-defined subtype.
        exp_type: u32,
        /// Raw body.
        data: Vec<u8>,
    },
}

impl MultipartReplyBody {
    fn mp_type(&self) -> u16 {
        match self {
            Self::Desc(_) => OFPMP_DESC,
            Self::FlowDesc(_) => OFPMP_FLOW_DESC,
            Self::FlowStats(_) => OFPMP_FLOW_STATS,
            Self::Aggregate(_) => OFPMP_AGGREGATE_STATS,
            Self::Table(_) => OFPMP_TABLE_STATS,
            Self::PortStats(_) => OFPMP_PORT_STATS,
            Self::QueueStats(_) => OFPMP_QUEUE_STATS,
            Self::Group(_) => OFPMP_GROUP_STATS,
            Self::GroupDesc(_) => OFPMP_GROUP_DESC,
            Self::GroupFeatures(_) => OFPMP_GROUP_FEATURES,
            Self::Meter(_) => OFPMP_METER_STATS,
            Self::MeterDesc(_) => OFPMP_METER_DESC,
            Self::MeterFeatures(_) => OFPMP_METER_FEATURES,
            Self::TableFeatures(_) => OFPMP_TABLE_FEATURES,
            Self::PortDesc(_) => OFPMP_PORT_DESC,
            Self::TableDesc(_) => OFPMP_TABLE_DESC,
            Self::QueueDesc(_) => OFPMP_QUEUE_DESC,
            Self::FlowMonitor(_) => OFPMP_FLOW_MONITOR,
            Self::ControllerStatus(_) => OFPMP_CONTROLLER_STATUS,
            Self::BundleFeatures(_) => OFPMP_BUNDLE_FEATURES,
            Self::Experimenter { .. } => OFPMP_EXPERIMENTER,
        }
    }
}

/// Multipart request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartRequest {
    /// Flag bits; bit 0 marks a continued request set.
    pub flags: u16,
    /// The typed body.
    pub body: MultipartRequestBody,
}

impl MultipartRequest {
    /// Request with no flags set.
    #[must_use]
    pub fn new(body: MultipartRequestBody) -> Self {
        Self { flags: 0, body }
    }

    /// Whether more frames follow in this request set.
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.flags & OFPMPF_MORE != 0
    }
}

impl Codec for MultipartRequest {
    fn wire_len(&self) -> usize {
        8 + match &self.body {
            MultipartRequestBody::Desc
            | MultipartRequestBody::Table
            | MultipartRequestBody::GroupFeatures
            | MultipartRequestBody::MeterFeatures
            | MultipartRequestBody::TableDesc
            | MultipartRequestBody::ControllerStatus => 0,
            MultipartRequestBody::FlowDesc(filter)
            | MultipartRequestBody::FlowStats(filter)
            | MultipartRequestBody::Aggregate(filter) => filter.wire_len(),
            MultipartRequestBody::PortStats { .. }
            | MultipartRequestBody::PortDesc { .. }
            | MultipartRequestBody::Group { .. }
            | MultipartRequestBody::GroupDesc { .. }
            | MultipartRequestBody::Meter { .. }
            | MultipartRequestBody::MeterDesc { .. }
            | MultipartRequestBody::QueueStats { .. }
            | MultipartRequestBody::QueueDesc { .. } => 8,
            MultipartRequestBody::TableFeatures(features) => vec_len(features),
            MultipartRequestBody::FlowMonitor(req) => req.wire_len(),
            MultipartRequestBody::BundleFeatures(req) => req.wire_len(),
            MultipartRequestBody::Experimenter { data, .. } => 8 + data.len(),
        }
    }

    fn encode(&self, w: &mut Writer) -> Result<()> {
        w.put_u16(self.body.mp_type());
        w.put_u16(self.flags);
        w.put_zeros(4);
        match &self.body {
            MultipartRequestBody::Desc
            | MultipartRequestBody::Table
            | MultipartRequestBody::GroupFeatures
            | MultipartRequestBody::MeterFeatures
            | MultipartRequestBody::TableDesc
            | MultipartRequestBody::ControllerStatus => {},
            MultipartRequestBody::FlowDesc(filter)
            | MultipartRequestBody::FlowStats(filter)
            | MultipartRequestBody::Aggregate(filter) => filter.encode(w)?,
            MultipartRequestBody::PortStats { port_no }
            | MultipartRequestBody::PortDesc { port_no } => {
                w.put_u32(*port_no);
                w.put_zeros(4);
            },
            MultipartRequestBody::QueueStats { port_no, queue_id }
            | MultipartRequestBody::QueueDesc { port_no, queue_id } => {
                w.put_u32(*port_no);
                w.put_u32(*queue_id);
            },
            MultipartRequestBody::Group { group_id }
            | MultipartRequestBody::GroupDesc { group_id } => {
                w.put_u32(*group_id);
                w.put_zeros(4);
            },
            MultipartRequestBody::Meter { meter_id }
            | MultipartRequestBody::MeterDesc { meter_id } => {
                w.put_u32(*meter_id);
                w.put_zeros(4);
            },
            MultipartRequestBody::TableFeatures(features) => encode_all(features, w)?,
            MultipartRequestBody::FlowMonitor(req) => req.encode(w)?,
            MultipartRequestBody::BundleFeatures(req) => req.encode(w)?,
            MultipartRequestBody::Experimenter { experimenter, exp_type, data } => {
                w.put_u32(*experimenter);
                w.put_u32(*exp_type);
                w.put_slice(data);
            },
        }
        Ok(())
    }

    fn decode(cur: &mut Cursor<'_>) -> Result<Self> {
        let mp_type = cur.read_u16()?;
        let flags = cur.read_u16()?;
        cur.skip(4)?;

        let body = match mp_type {
            OFPMP_DESC => MultipartRequestBody::Desc,
            OFPMP_FLOW_DESC => MultipartRequestBody::FlowDesc(FlowFilter::decode(cur)?),
            OFPMP_FLOW_STATS => MultipartRequestBody::FlowStats(FlowFilter::decode(cur)?),
            OFPMP_AGGREGATE_STATS => MultipartRequestBody::Aggregate(FlowFilter::decode(cur)?),
            OFPMP_TABLE_STATS => MultipartRequestBody::Table,
            OFPMP_PORT_STATS => {
                let port_no = cur.read_u32()?;
                cur.skip(4)?;
                MultipartRequestBody::PortStats { port_no }
            },
            OFPMP_QUEUE_STATS => MultipartRequestBody::QueueStats {
                port_no: cur.read_u32()?,
                queue_id: cur.read_u32()?,
            },
            OFPMP_GROUP_STATS => {
                let group_id = cur.read_u32()?;
                cur.skip(4)?;
                MultipartRequestBody::Group { group_id }
            },
            OFPMP_GROUP_DESC => {
                let group_id = cur.read_u32()?;
                cur.skip(4)?;
                MultipartRequestBody::GroupDesc { group_id }
            },
            OFPMP_GROUP_FEATURES => MultipartRequestBody::GroupFeatures,
            OFPMP_METER_STATS => {
                let meter_id = cur.read_u32()?;
                cur.skip(4)?;
                MultipartRequestBody::Meter { meter_id }
            },
            OFPMP_METER_DESC => {
                let meter_id = cur.read_u32()?;
                cur.skip(4)?;
                MultipartRequestBody::MeterDesc { meter_id }
            },
            OFPMP_METER_FEATURES => MultipartRequestBody::MeterFeatures,
            OFPMP_TABLE_FEATURES => MultipartRequestBody::TableFeatures(decode_vec(cur)?),
            OFPMP_PORT_DESC => {
                let port_no = cur.read_u32()?;
                cur.skip(4)?;
                MultipartRequestBody::PortDesc { port_no }
            },
            OFPMP_TABLE_DESC => MultipartRequestBody::TableDesc,
            OFPMP_QUEUE_DESC => MultipartRequestBody::QueueDesc {
                port_no: cur.read_u32()?,
                queue_id: cur.read_u32()?,
            },
            OFPMP_FLOW_MONITOR => {
                MultipartRequestBody::FlowMonitor(FlowMonitorRequest::decode(cur)?)
            },
            OFPMP_CONTROLLER_STATUS => MultipartRequestBody::ControllerStatus,
            OFPMP_BUNDLE_FEATURES => {
                MultipartRequestBody::BundleFeatures(BundleFeaturesRequest::decode(cur)?)
            },
            OFPMP_EXPERIMENTER => MultipartRequestBody::Experimenter {
                experimenter: cur.read_u32()?,
                exp_type: cur.read_u32()?,
                data: cur.rest().to_vec(),
            },
            other => {
                return Err(WireError::UnknownDiscriminant {
                    family: "multipart type",
                    value: u32::from(other),
                });
            },
        };

        Ok(Self { flags, body })
    }
}

/// Multipart reply body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartReply {
    /// Flag bits; bit 0 ([`OFPMPF_MORE`]) marks a continued reply set.
    pub flags: u16,
    /// The typed body.
    pub body: MultipartReplyBody,
}

impl MultipartReply {
    /// Whether more frames follow in this reply set.
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.flags & OFPMPF_MORE != 0
    }
}

impl Codec for MultipartReply {
    fn wire_len(&self) -> usize {
        8 + match &self.body {
            MultipartReplyBody::Desc(desc) => desc.wire_len(),
            MultipartReplyBody::FlowDesc(items) => vec_len(items),
            MultipartReplyBody::FlowStats(items) => vec_len(items),
            MultipartReplyBody::Aggregate(stats) => stats.len(),
            MultipartReplyBody::Table(items) => vec_len(items),
            MultipartReplyBody::PortStats(items) => vec_len(items),
            MultipartReplyBody::QueueStats(items) => vec_len(items),
            MultipartReplyBody::Group(items) => vec_len(items),
            MultipartReplyBody::GroupDesc(items) => vec_len(items),
            MultipartReplyBody::GroupFeatures(features) => features.wire_len(),
            MultipartReplyBody::Meter(items) => vec_len(items),
            MultipartReplyBody::MeterDesc(items) => vec_len(items),
            MultipartReplyBody::MeterFeatures(features) => features.wire_len(),
            MultipartReplyBody::TableFeatures(items) => vec_len(items),
            MultipartReplyBody::PortDesc(items) => vec_len(items),
            MultipartReplyBody::TableDesc(items) => vec_len(items),
            MultipartReplyBody::QueueDesc(items) => vec_len(items),
            MultipartReplyBody::FlowMonitor(items) => vec_len(items),
            MultipartReplyBody::ControllerStatus(items) => vec_len(items),
            MultipartReplyBody::BundleFeatures(features) => features.wire_len(),
            MultipartReplyBody::Experimenter { data, .. } => 8 + data.len(),
        }
    }

    fn encode(&self, w: &mut Writer) -> Result<()> {
        w.put_u16(self.body.mp_type());
        w.put_u16(self.flags);
        w.put_zeros(4);
        match &self.body {
            MultipartReplyBody::Desc(desc) => desc.encode(w)?,
            MultipartReplyBody::FlowDesc(items) => encode_all(items, w)?,
            MultipartReplyBody::FlowStats(items) => encode_all(items, w)?,
            MultipartReplyBody::Aggregate(stats) => w.put_slice(stats),
            MultipartReplyBody::Table(items) => encode_all(items, w)?,
            MultipartReplyBody::PortStats(items) => encode_all(items, w)?,
            MultipartReplyBody::QueueStats(items) => encode_all(items, w)?,
            MultipartReplyBody::Group(items) => encode_all(items, w)?,
            MultipartReplyBody::GroupDesc(items) => encode_all(items, w)?,
            MultipartReplyBody::GroupFeatures(features) => features.encode(w)?,
            MultipartReplyBody::Meter(items) => encode_all(items, w)?,
            MultipartReplyBody::MeterDesc(items) => encode_all(items, w)?,
            MultipartReplyBody::MeterFeatures(features) => features.encode(w)?,
            MultipartReplyBody::TableFeatures(items) => encode_all(items, w)?,
            MultipartReplyBody::PortDesc(items) => encode_all(items, w)?,
            MultipartReplyBody::TableDesc(items) => encode_all(items, w)?,
            MultipartReplyBody::QueueDesc(items) => encode_all(items, w)?,
            MultipartReplyBody::FlowMonitor(items) => encode_all(items, w)?,
            MultipartReplyBody::ControllerStatus(items) => encode_all(items, w)?,
            MultipartReplyBody::BundleFeatures(features) => features.encode(w)?,
            MultipartReplyBody::Experimenter { experimenter, exp_type, data } => {
                w.put_u32(*experimenter);
                w.put_u32(*exp_type);
                w.put_slice(data);
            },
        }
        Ok(())
    }

    fn decode(cur: &mut Cursor<'_>) -> Result<Self> {
        let mp_type = cur.read_u16()?;
        let flags = cur.read_u16()?;
        cur.skip(4)?;

        let body = match mp_type {
            OFPMP_DESC => MultipartReplyBody::Desc(DescStats::decode(cur)?),
            OFPMP_FLOW_DESC => MultipartReplyBody::FlowDesc(decode_vec(cur)?),
            OFPMP_FLOW_STATS => MultipartReplyBody::FlowStats(decode_vec(cur)?),
            OFPMP_AGGREGATE_STATS => MultipartReplyBody::Aggregate(cur.rest().to_vec()),
            OFPMP_TABLE_STATS => MultipartReplyBody::Table(decode_vec(cur)?),
            OFPMP_PORT_STATS => MultipartReplyBody::PortStats(decode_vec(cur)?),
            OFPMP_QUEUE_STATS => MultipartReplyBody::QueueStats(decode_vec(cur)?),
            OFPMP_GROUP_STATS => MultipartReplyBody::Group(decode_vec(cur)?),
            OFPMP_GROUP_DESC => MultipartReplyBody::GroupDesc(decode_vec(cur)?),
            OFPMP_GROUP_FEATURES => {
                MultipartReplyBody::GroupFeatures(GroupFeatures::decode(cur)?)
            },
            OFPMP_METER_STATS => MultipartReplyBody::Meter(decode_vec(cur)?),
            OFPMP_METER_DESC => MultipartReplyBody::MeterDesc(decode_vec(cur)?),
            OFPMP_METER_FEATURES => {
                MultipartReplyBody::MeterFeatures(MeterFeatures::decode(cur)?)
            },
            OFPMP_TABLE_FEATURES => MultipartReplyBody::TableFeatures(decode_vec(cur)?),
            OFPMP_PORT_DESC => MultipartReplyBody::PortDesc(decode_vec(cur)?),
            OFPMP_TABLE_DESC => MultipartReplyBody::TableDesc(decode_vec(cur)?),
            OFPMP_QUEUE_DESC => MultipartReplyBody::QueueDesc(decode_vec(cur)?),
            OFPMP_FLOW_MONITOR => MultipartReplyBody::FlowMonitor(decode_vec(cur)?),
            OFPMP_CONTROLLER_STATUS => MultipartReplyBody::ControllerStatus(decode_vec(cur)?),
            OFPMP_BUNDLE_FEATURES => {
                MultipartReplyBody::BundleFeatures(BundleFeatures::decode(cur)?)
            },
            OFPMP_EXPERIMENTER => MultipartReplyBody::Experimenter {
                experimenter: cur.read_u32()?,
                exp_type: cur.read_u32()?,
                data: cur.rest().to_vec(),
            },
            other => {
                return Err(WireError::UnknownDiscriminant {
                    family: "multipart type",
                    value: u32::from(other),
                });
            },
        };

        Ok(Self { flags, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowlink_wire::oxm::MatchField;
    use flowlink_wire::{decode_from_slice, encode_to_vec};

    #[test]
    fn table_features_request_round_trip() {
        let req = MultipartRequest::new(MultipartRequestBody::TableFeatures(vec![TableFeatures {
            table_id: 10,
            name: "table-10".to_string(),
            max_entries: 100_000,
            ..TableFeatures::default()
        }]));
        let bytes = encode_to_vec(&req).unwrap();
        assert_eq!(bytes.len(), req.wire_len());
        assert_eq!(decode_from_slice::<MultipartRequest>(&bytes).unwrap(), req);
    }

    #[test]
    fn flow_desc_reply_round_trip() {
        let mut match_ = Match::new();
        match_.push(MatchField::in_port(4));
        let reply = MultipartReply {
            flags: 0,
            body: MultipartReplyBody::FlowDesc(vec![FlowDesc {
                table_id: 2,
                priority: 10,
                importance: 1,
                cookie: 5,
                match_,
                instructions: vec![],
                ..FlowDesc::default()
            }]),
        };
        let bytes = encode_to_vec(&reply).unwrap();
        assert_eq!(decode_from_slice::<MultipartReply>(&bytes).unwrap(), reply);
    }

    #[test]
    fn flow_monitor_round_trip() {
        let req = MultipartRequest::new(MultipartRequestBody::FlowMonitor(FlowMonitorRequest {
            monitor_id: 11,
            ..FlowMonitorRequest::default()
        }));
        let bytes = encode_to_vec(&req).unwrap();
        assert_eq!(decode_from_slice::<MultipartRequest>(&bytes).unwrap(), req);

        let reply = MultipartReply {
            flags: 0,
            body: MultipartReplyBody::FlowMonitor(vec![
                FlowUpdate::Abbrev(0x1234),
                FlowUpdate::Paused,
                FlowUpdate::Full {
                    event: 1,
                    table_id: 0,
                    reason: 0,
                    idle_timeout: 5,
                    hard_timeout: 0,
                    priority: 100,
                    cookie: 9,
                    match_: Match::new(),
                },
            ]),
        };
        let bytes = encode_to_vec(&reply).unwrap();
        assert_eq!(decode_from_slice::<MultipartReply>(&bytes).unwrap(), reply);
    }

    #[test]
    fn queue_desc_round_trip() {
        let reply = MultipartReply {
            flags: 0,
            body: MultipartReplyBody::QueueDesc(vec![QueueDesc {
                port_no: 1,
                queue_id: 0,
                properties: vec![QueueDescProp::MinRate(100), QueueDescProp::MaxRate(500)],
            }]),
        };
        let bytes = encode_to_vec(&reply).unwrap();
        assert_eq!(decode_from_slice::<MultipartReply>(&bytes).unwrap(), reply);
    }

    #[test]
    fn port_stats_with_properties_round_trip() {
        let reply = MultipartReply {
            flags: OFPMPF_MORE,
            body: MultipartReplyBody::PortStats(vec![PortStats {
                port_no: 3,
                rx_packets: 100,
                tx_packets: 50,
                properties: vec![PortStatsProp::Ethernet {
                    rx_frame_err: 1,
                    rx_over_err: 2,
                    rx_crc_err: 3,
                    collisions: 4,
                }],
                ..PortStats::default()
            }]),
        };
        assert!(reply.has_more());
        let bytes = encode_to_vec(&reply).unwrap();
        assert_eq!(decode_from_slice::<MultipartReply>(&bytes).unwrap(), reply);
    }

    #[test]
    fn bundle_features_round_trip() {
        let reply = MultipartReply {
            flags: 0,
            body: MultipartReplyBody::BundleFeatures(BundleFeatures {
                capabilities: 0x7,
                properties: Vec::new(),
            }),
        };
        let bytes = encode_to_vec(&reply).unwrap();
        assert_eq!(decode_from_slice::<MultipartReply>(&bytes).unwrap(), reply);
    }
}
