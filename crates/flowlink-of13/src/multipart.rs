//! Multipart request/reply and their statistics bodies.
//!
//! A multipart exchange carries `type(u16) flags(u16) pad[4]` after the
//! message header, then a type-specific body. Flag bit 0 ("more") marks a
//! reply that will be followed by further frames of the same exchange; a
//! logical reply set ends with a frame whose bit 0 is clear.

use flowlink_wire::instruction::{self, Instruction};
use flowlink_wire::meter::{self, MeterBand};
use flowlink_wire::oxm::Match;
use flowlink_wire::{Codec, Cursor, Result, WireError, Writer};

use crate::port::{Port, read_fixed_name, put_fixed_name};
use crate::group::Bucket;
use crate::table_features::TableFeatures;

/// Flag bit 0: more frames follow in this exchange.
pub const OFPMPF_MORE: u16 = 1 << 0;

const OFPMP_DESC: u16 = 0;
const OFPMP_FLOW: u16 = 1;
const OFPMP_AGGREGATE: u16 = 2;
const OFPMP_TABLE: u16 = 3;
const OFPMP_PORT_STATS: u16 = 4;
const OFPMP_QUEUE: u16 = 5;
const OFPMP_GROUP: u16 = 6;
const OFPMP_GROUP_DESC: u16 = 7;
const OFPMP_GROUP_FEATURES: u16 = 8;
const OFPMP_METER: u16 = 9;
const OFPMP_METER_CONFIG: u16 = 10;
const OFPMP_METER_FEATURES: u16 = 11;
const OFPMP_TABLE_FEATURES: u16 = 12;
const OFPMP_PORT_DESC: u16 = 13;
const OFPMP_EXPERIMENTER: u16 = 0xFFFF;

/// Filter common to flow and aggregate requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowStatsRequest {
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

impl Default for FlowStatsRequest {
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

impl Codec for FlowStatsRequest {
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

/// One flow entry in a flow-stats reply.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FlowStats {
    /// Table the flow lives in.
    pub table_id: u8,
    /// Seconds installed.
    pub duration_sec: u32,
    /// Nanoseconds beyond `duration_sec`.
    pub duration_nsec: u32,
    /// Matching precedence.
    pub priority: u16,
    /// Idle timeout.
    pub idle_timeout: u16,
    /// Hard timeout.
    pub hard_timeout: u16,
    /// Flow-mod flags the flow was installed with.
    pub flags: u16,
    /// Cookie.
    pub cookie: u64,
    /// Packets matched.
    pub packet_count: u64,
    /// Bytes matched.
    pub byte_count: u64,
    /// The flow's match.
    pub match_: Match,
    /// The flow's instructions.
    pub instructions: Vec<Instruction>,
}

impl Codec for FlowStats {
    fn wire_len(&self) -> usize {
        48 + self.match_.wire_len() + instruction::list_len(&self.instructions)
    }

    fn encode(&self, w: &mut Writer) -> Result<()> {
        let len = self.wire_len();
        if len > usize::from(u16::MAX) {
            return Err(WireError::Encode("flow stats entry exceeds u16 length"));
        }
        w.put_u16(len as u16);
        w.put_u8(self.table_id);
        w.put_u8(0);
        w.put_u32(self.duration_sec);
        w.put_u32(self.duration_nsec);
        w.put_u16(self.priority);
        w.put_u16(self.idle_timeout);
        w.put_u16(self.hard_timeout);
        w.put_u16(self.flags);
        w.put_zeros(4);
        w.put_u64(self.cookie);
        w.put_u64(self.packet_count);
        w.put_u64(self.byte_count);
        self.match_.encode(w)?;
        instruction::encode_list(&self.instructions, w)
    }

    fn decode(cur: &mut Cursor<'_>) -> Result<Self> {
        let len = cur.read_u16()? as usize;
        let mut body = cur.subcursor(len, 2)?;
        let table_id = body.read_u8()?;
        body.skip(1)?;
        let duration_sec = body.read_u32()?;
        let duration_nsec = body.read_u32()?;
        let priority = body.read_u16()?;
        let idle_timeout = body.read_u16()?;
        let hard_timeout = body.read_u16()?;
        let flags = body.read_u16()?;
        body.skip(4)?;
        let cookie = body.read_u64()?;
        let packet_count = body.read_u64()?;
        let byte_count = body.read_u64()?;
        let match_ = Match::decode(&mut body)?;
        let instructions = instruction::decode_list(&mut body)?;
        Ok(Self {
            table_id,
            duration_sec,
            duration_nsec,
            priority,
            idle_timeout,
            hard_timeout,
            flags,
            cookie,
            packet_count,
            byte_count,
            match_,
            instructions,
        })
    }
}

/// Aggregate-stats reply body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AggregateStats {
    /// Packets matched across all selected flows.
    pub packet_count: u64,
    /// Bytes matched.
    pub byte_count: u64,
    /// Number of flows selected.
    pub flow_count: u32,
}

impl Codec for AggregateStats {
    fn wire_len(&self) -> usize {
        24
    }

    fn encode(&self, w: &mut Writer) -> Result<()> {
        w.put_u64(self.packet_count);
        w.put_u64(self.byte_count);
        w.put_u32(self.flow_count);
        w.put_zeros(4);
        Ok(())
    }

    fn decode(cur: &mut Cursor<'_>) -> Result<Self> {
        let packet_count = cur.read_u64()?;
        let byte_count = cur.read_u64()?;
        let flow_count = cur.read_u32()?;
        cur.skip(4)?;
        Ok(Self { packet_count, byte_count, flow_count })
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

/// Per-port counters (the fixed 112-byte 1.3 layout).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PortStats {
    /// Port number.
    pub port_no: u32,
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
    /// Frame alignment errors.
    pub rx_frame_err: u64,
    /// Overrun errors.
    pub rx_over_err: u64,
    /// CRC errors.
    pub rx_crc_err: u64,
    /// Collisions.
    pub collisions: u64,
    /// Seconds the port has been up.
    pub duration_sec: u32,
    /// Nanoseconds beyond `duration_sec`.
    pub duration_nsec: u32,
}

impl Codec for PortStats {
    fn wire_len(&self) -> usize {
        112
    }

    fn encode(&self, w: &mut Writer) -> Result<()> {
        w.put_u32(self.port_no);
        w.put_zeros(4);
        for counter in [
            self.rx_packets,
            self.tx_packets,
            self.rx_bytes,
            self.tx_bytes,
            self.rx_dropped,
            self.tx_dropped,
            self.rx_errors,
            self.tx_errors,
            self.rx_frame_err,
            self.rx_over_err,
            self.rx_crc_err,
            self.collisions,
        ] {
            w.put_u64(counter);
        }
        w.put_u32(self.duration_sec);
        w.put_u32(self.duration_nsec);
        Ok(())
    }

    fn decode(cur: &mut Cursor<'_>) -> Result<Self> {
        let port_no = cur.read_u32()?;
        cur.skip(4)?;
        let mut counters = [0u64; 12];
        for counter in &mut counters {
            *counter = cur.read_u64()?;
        }
        Ok(Self {
            port_no,
            rx_packets: counters[0],
            tx_packets: counters[1],
            rx_bytes: counters[2],
            tx_bytes: counters[3],
            rx_dropped: counters[4],
            tx_dropped: counters[5],
            rx_errors: counters[6],
            tx_errors: counters[7],
            rx_frame_err: counters[8],
            rx_over_err: counters[9],
            rx_crc_err: counters[10],
            collisions: counters[11],
            duration_sec: cur.read_u32()?,
            duration_nsec: cur.read_u32()?,
        })
    }
}

/// Per-queue counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
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
}

impl Codec for QueueStats {
    fn wire_len(&self) -> usize {
        40
    }

    fn encode(&self, w: &mut Writer) -> Result<()> {
        w.put_u32(self.port_no);
        w.put_u32(self.queue_id);
        w.put_u64(self.tx_bytes);
        w.put_u64(self.tx_packets);
        w.put_u64(self.tx_errors);
        w.put_u32(self.duration_sec);
        w.put_u32(self.duration_nsec);
        Ok(())
    }

    fn decode(cur: &mut Cursor<'_>) -> Result<Self> {
        Ok(Self {
            port_no: cur.read_u32()?,
            queue_id: cur.read_u32()?,
            tx_bytes: cur.read_u64()?,
            tx_packets: cur.read_u64()?,
            tx_errors: cur.read_u64()?,
            duration_sec: cur.read_u32()?,
            duration_nsec: cur.read_u32()?,
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
}

impl Codec for GroupDescStats {
    fn wire_len(&self) -> usize {
        8 + self.buckets.iter().map(Codec::wire_len).sum::<usize>()
    }

    fn encode(&self, w: &mut Writer) -> Result<()> {
        let len = self.wire_len();
        if len > usize::from(u16::MAX) {
            return Err(WireError::Encode("group desc entry exceeds u16 length"));
        }
        w.put_u16(len as u16);
        w.put_u8(self.group_type);
        w.put_u8(0);
        w.put_u32(self.group_id);
        for bucket in &self.buckets {
            bucket.encode(w)?;
        }
        Ok(())
    }

    fn decode(cur: &mut Cursor<'_>) -> Result<Self> {
        let len = cur.read_u16()? as usize;
        let mut body = cur.subcursor(len, 2)?;
        let group_type = body.read_u8()?;
        body.skip(1)?;
        let group_id = body.read_u32()?;
        let mut buckets = Vec::new();
        while !body.is_empty() {
            buckets.push(Bucket::decode(&mut body)?);
        }
        Ok(Self { group_type, group_id, buckets })
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

/// One meter in a meter-config reply.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MeterConfig {
    /// `OFPMF_*` bits.
    pub flags: u16,
    /// Meter id.
    pub meter_id: u32,
    /// The meter's bands.
    pub bands: Vec<MeterBand>,
}

impl Codec for MeterConfig {
    fn wire_len(&self) -> usize {
        8 + meter::list_len(&self.bands)
    }

    fn encode(&self, w: &mut Writer) -> Result<()> {
        let len = self.wire_len();
        if len > usize::from(u16::MAX) {
            return Err(WireError::Encode("meter config entry exceeds u16 length"));
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

/// Meter capability inventory.
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
}

impl Codec for MeterFeatures {
    fn wire_len(&self) -> usize {
        16
    }

    fn encode(&self, w: &mut Writer) -> Result<()> {
        w.put_u32(self.max_meter);
        w.put_u32(self.band_types);
        w.put_u32(self.capabilities);
        w.put_u8(self.max_bands);
        w.put_u8(self.max_color);
        w.put_zeros(2);
        Ok(())
    }

    fn decode(cur: &mut Cursor<'_>) -> Result<Self> {
        let max_meter = cur.read_u32()?;
        let band_types = cur.read_u32()?;
        let capabilities = cur.read_u32()?;
        let max_bands = cur.read_u8()?;
        let max_color = cur.read_u8()?;
        cur.skip(2)?;
        Ok(Self { max_meter, band_types, capabilities, max_bands, max_color })
    }
}

/// Request bodies, one per multipart type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MultipartRequestBody {
    /// Switch description.
    Desc,
    /// Individual flow statistics.
    Flow(FlowStatsRequest),
    /// Aggregate flow statistics.
    Aggregate(FlowStatsRequest),
    /// Table statistics.
    Table,
    /// Port statistics for one port or all.
    PortStats {
        /// Port filter, `OFPP_ANY` for all.
        port_no: u32,
    },
    /// Queue statistics.
    Queue {
        /// Port filter.
        port_no: u32,
        /// Queue filter, `OFPQ_ALL` (0xffffffff) for all.
        queue_id: u32,
    },
    /// Group statistics.
    Group {
        /// Group filter, [`crate::group::OFPG_ALL`] for all.
        group_id: u32,
    },
    /// Group descriptions.
    GroupDesc,
    /// Group capability inventory.
    GroupFeatures,
    /// Meter statistics.
    Meter {
        /// Meter filter, `OFPM_ALL` for all.
        meter_id: u32,
    },
    /// Meter configurations.
    MeterConfig {
        /// Meter filter.
        meter_id: u32,
    },
    /// Meter capability inventory.
    MeterFeatures,
    /// Table features; non-empty to configure tables.
    TableFeatures(Vec<TableFeatures>),
    /// Port descriptions.
    PortDesc,
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
            Self::Flow(_) => OFPMP_FLOW,
            Self::Aggregate(_) => OFPMP_AGGREGATE,
            Self::Table => OFPMP_TABLE,
            Self::PortStats { .. } => OFPMP_PORT_STATS,
            Self::Queue { .. } => OFPMP_QUEUE,
            Self::Group { .. } => OFPMP_GROUP,
            Self::GroupDesc => OFPMP_GROUP_DESC,
            Self::GroupFeatures => OFPMP_GROUP_FEATURES,
            Self::Meter { .. } => OFPMP_METER,
            Self::MeterConfig { .. } => OFPMP_METER_CONFIG,
            Self::MeterFeatures => OFPMP_METER_FEATURES,
            Self::TableFeatures(_) => OFPMP_TABLE_FEATURES,
            Self::PortDesc => OFPMP_PORT_DESC,
            Self::Experimenter { .. } => OFPMP_EXPERIMENTER,
        }
    }
}

/// Reply bodies, one per multipart type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MultipartReplyBody {
    /// Switch description.
    Desc(DescStats),
    /// Individual flow statistics.
    Flow(Vec<FlowStats>),
    /// Aggregate flow statistics.
    Aggregate(AggregateStats),
    /// Table statistics.
    Table(Vec<TableStats>),
    /// Port statistics.
    PortStats(Vec<PortStats>),
    /// Queue statistics.
    Queue(Vec<QueueStats>),
    /// Group statistics.
    Group(Vec<GroupStats>),
    /// Group descriptions.
    GroupDesc(Vec<GroupDescStats>),
    /// Group capability inventory.
    GroupFeatures(GroupFeatures),
    /// Meter statistics.
    Meter(Vec<MeterStats>),
    /// Meter configurations.
    MeterConfig(Vec<MeterConfig>),
    /// Meter capability inventory.
    MeterFeatures(MeterFeatures),
    /// Table features.
    TableFeatures(Vec<TableFeatures>),
    /// Port descriptions.
    PortDesc(Vec<Port>),
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
            Self::Flow(_) => OFPMP_FLOW,
            Self::Aggregate(_) => OFPMP_AGGREGATE,
            Self::Table(_) => OFPMP_TABLE,
            Self::PortStats(_) => OFPMP_PORT_STATS,
            Self::Queue(_) => OFPMP_QUEUE,
            Self::Group(_) => OFPMP_GROUP,
            Self::GroupDesc(_) => OFPMP_GROUP_DESC,
            Self::GroupFeatures(_) => OFPMP_GROUP_FEATURES,
            Self::Meter(_) => OFPMP_METER,
            Self::MeterConfig(_) => OFPMP_METER_CONFIG,
            Self::MeterFeatures(_) => OFPMP_METER_FEATURES,
            Self::TableFeatures(_) => OFPMP_TABLE_FEATURES,
            Self::PortDesc(_) => OFPMP_PORT_DESC,
            Self::Experimenter { .. } => OFPMP_EXPERIMENTER,
        }
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
            | MultipartRequestBody::GroupDesc
            | MultipartRequestBody::GroupFeatures
            | MultipartRequestBody::MeterFeatures
            | MultipartRequestBody::PortDesc => 0,
            MultipartRequestBody::Flow(req) | MultipartRequestBody::Aggregate(req) => {
                req.wire_len()
            },
            MultipartRequestBody::PortStats { .. }
            | MultipartRequestBody::Group { .. }
            | MultipartRequestBody::Meter { .. }
            | MultipartRequestBody::MeterConfig { .. }
            | MultipartRequestBody::Queue { .. } => 8,
            MultipartRequestBody::TableFeatures(features) => vec_len(features),
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
            | MultipartRequestBody::GroupDesc
            | MultipartRequestBody::GroupFeatures
            | MultipartRequestBody::MeterFeatures
            | MultipartRequestBody::PortDesc => {},
            MultipartRequestBody::Flow(req) | MultipartRequestBody::Aggregate(req) => {
                req.encode(w)?;
            },
            MultipartRequestBody::PortStats { port_no } => {
                w.put_u32(*port_no);
                w.put_zeros(4);
            },
            MultipartRequestBody::Queue { port_no, queue_id } => {
                w.put_u32(*port_no);
                w.put_u32(*queue_id);
            },
            MultipartRequestBody::Group { group_id } => {
                w.put_u32(*group_id);
                w.put_zeros(4);
            },
            MultipartRequestBody::Meter { meter_id }
            | MultipartRequestBody::MeterConfig { meter_id } => {
                w.put_u32(*meter_id);
                w.put_zeros(4);
            },
            MultipartRequestBody::TableFeatures(features) => encode_all(features, w)?,
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
            OFPMP_FLOW => MultipartRequestBody::Flow(FlowStatsRequest::decode(cur)?),
            OFPMP_AGGREGATE => MultipartRequestBody::Aggregate(FlowStatsRequest::decode(cur)?),
            OFPMP_TABLE => MultipartRequestBody::Table,
            OFPMP_PORT_STATS => {
                let port_no = cur.read_u32()?;
                cur.skip(4)?;
                MultipartRequestBody::PortStats { port_no }
            },
            OFPMP_QUEUE => MultipartRequestBody::Queue {
                port_no: cur.read_u32()?,
                queue_id: cur.read_u32()?,
            },
            OFPMP_GROUP => {
                let group_id = cur.read_u32()?;
                cur.skip(4)?;
                MultipartRequestBody::Group { group_id }
            },
            OFPMP_GROUP_DESC => MultipartRequestBody::GroupDesc,
            OFPMP_GROUP_FEATURES => MultipartRequestBody::GroupFeatures,
            OFPMP_METER => {
                let meter_id = cur.read_u32()?;
                cur.skip(4)?;
                MultipartRequestBody::Meter { meter_id }
            },
            OFPMP_METER_CONFIG => {
                let meter_id = cur.read_u32()?;
                cur.skip(4)?;
                MultipartRequestBody::MeterConfig { meter_id }
            },
            OFPMP_METER_FEATURES => MultipartRequestBody::MeterFeatures,
            OFPMP_TABLE_FEATURES => MultipartRequestBody::TableFeatures(decode_vec(cur)?),
            OFPMP_PORT_DESC => MultipartRequestBody::PortDesc,
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
            MultipartReplyBody::Flow(items) => vec_len(items),
            MultipartReplyBody::Aggregate(agg) => agg.wire_len(),
            MultipartReplyBody::Table(items) => vec_len(items),
            MultipartReplyBody::PortStats(items) => vec_len(items),
            MultipartReplyBody::Queue(items) => vec_len(items),
            MultipartReplyBody::Group(items) => vec_len(items),
            MultipartReplyBody::GroupDesc(items) => vec_len(items),
            MultipartReplyBody::GroupFeatures(features) => features.wire_len(),
            MultipartReplyBody::Meter(items) => vec_len(items),
            MultipartReplyBody::MeterConfig(items) => vec_len(items),
            MultipartReplyBody::MeterFeatures(features) => features.wire_len(),
            MultipartReplyBody::TableFeatures(items) => vec_len(items),
            MultipartReplyBody::PortDesc(items) => vec_len(items),
            MultipartReplyBody::Experimenter { data, .. } => 8 + data.len(),
        }
    }

    fn encode(&self, w: &mut Writer) -> Result<()> {
        w.put_u16(self.body.mp_type());
        w.put_u16(self.flags);
        w.put_zeros(4);
        match &self.body {
            MultipartReplyBody::Desc(desc) => desc.encode(w)?,
            MultipartReplyBody::Flow(items) => encode_all(items, w)?,
            MultipartReplyBody::Aggregate(agg) => agg.encode(w)?,
            MultipartReplyBody::Table(items) => encode_all(items, w)?,
            MultipartReplyBody::PortStats(items) => encode_all(items, w)?,
            MultipartReplyBody::Queue(items) => encode_all(items, w)?,
            MultipartReplyBody::Group(items) => encode_all(items, w)?,
            MultipartReplyBody::GroupDesc(items) => encode_all(items, w)?,
            MultipartReplyBody::GroupFeatures(features) => features.encode(w)?,
            MultipartReplyBody::Meter(items) => encode_all(items, w)?,
            MultipartReplyBody::MeterConfig(items) => encode_all(items, w)?,
            MultipartReplyBody::MeterFeatures(features) => features.encode(w)?,
            MultipartReplyBody::TableFeatures(items) => encode_all(items, w)?,
            MultipartReplyBody::PortDesc(items) => encode_all(items, w)?,
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
            OFPMP_FLOW => MultipartReplyBody::Flow(decode_vec(cur)?),
            OFPMP_AGGREGATE => MultipartReplyBody::Aggregate(AggregateStats::decode(cur)?),
            OFPMP_TABLE => MultipartReplyBody::Table(decode_vec(cur)?),
            OFPMP_PORT_STATS => MultipartReplyBody::PortStats(decode_vec(cur)?),
            OFPMP_QUEUE => MultipartReplyBody::Queue(decode_vec(cur)?),
            OFPMP_GROUP => MultipartReplyBody::Group(decode_vec(cur)?),
            OFPMP_GROUP_DESC => MultipartReplyBody::GroupDesc(decode_vec(cur)?),
            OFPMP_GROUP_FEATURES => MultipartReplyBody::GroupFeatures(GroupFeatures::decode(cur)?),
            OFPMP_METER => MultipartReplyBody::Meter(decode_vec(cur)?),
            OFPMP_METER_CONFIG => MultipartReplyBody::MeterConfig(decode_vec(cur)?),
            OFPMP_METER_FEATURES => MultipartReplyBody::MeterFeatures(MeterFeatures::decode(cur)?),
            OFPMP_TABLE_FEATURES => MultipartReplyBody::TableFeatures(decode_vec(cur)?),
            OFPMP_PORT_DESC => MultipartReplyBody::PortDesc(decode_vec(cur)?),
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
    fn desc_request_is_header_only() {
        let req = MultipartRequest::new(MultipartRequestBody::Desc);
        let bytes = encode_to_vec(&req).unwrap();
        assert_eq!(bytes, [0, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(decode_from_slice::<MultipartRequest>(&bytes).unwrap(), req);
    }

    #[test]
    fn flow_stats_round_trip() {
        let mut match_ = Match::new();
        match_.push(MatchField::eth_type(0x0800));
        let reply = MultipartReply {
            flags: OFPMPF_MORE,
            body: MultipartReplyBody::Flow(vec![FlowStats {
                table_id: 0,
                duration_sec: 10,
                duration_nsec: 0,
                priority: 1,
                idle_timeout: 0,
                hard_timeout: 0,
                flags: 0,
                cookie: 7,
                packet_count: 5,
                byte_count: 320,
                match_,
                instructions: vec![Instruction::ApplyActions(vec![])],
            }]),
        };
        assert!(reply.has_more());
        let bytes = encode_to_vec(&reply).unwrap();
        assert_eq!(bytes.len(), reply.wire_len());
        assert_eq!(decode_from_slice::<MultipartReply>(&bytes).unwrap(), reply);
    }

    #[test]
    fn desc_reply_round_trip() {
        let reply = MultipartReply {
            flags: 0,
            body: MultipartReplyBody::Desc(DescStats {
                mfr_desc: "flowlink".to_string(),
                hw_desc: "software".to_string(),
                sw_desc: "0.1.0".to_string(),
                serial_num: "none".to_string(),
                dp_desc: "test datapath".to_string(),
            }),
        };
        let bytes = encode_to_vec(&reply).unwrap();
        assert_eq!(bytes.len(), 8 + 1056);
        assert_eq!(decode_from_slice::<MultipartReply>(&bytes).unwrap(), reply);
    }

    #[test]
    fn group_and_meter_stats_round_trip() {
        let reply = MultipartReply {
            flags: 0,
            body: MultipartReplyBody::Group(vec![GroupStats {
                group_id: 1,
                ref_count: 2,
                packet_count: 3,
                byte_count: 4,
                duration_sec: 5,
                duration_nsec: 6,
                bucket_stats: vec![BucketCounter { packet_count: 1, byte_count: 64 }],
            }]),
        };
        let bytes = encode_to_vec(&reply).unwrap();
        assert_eq!(decode_from_slice::<MultipartReply>(&bytes).unwrap(), reply);

        let reply = MultipartReply {
            flags: 0,
            body: MultipartReplyBody::Meter(vec![MeterStats {
                meter_id: 9,
                flow_count: 1,
                packet_in_count: 100,
                byte_in_count: 6400,
                duration_sec: 60,
                duration_nsec: 0,
                band_stats: vec![BandStats { packet_band_count: 7, byte_band_count: 448 }],
            }]),
        };
        let bytes = encode_to_vec(&reply).unwrap();
        assert_eq!(decode_from_slice::<MultipartReply>(&bytes).unwrap(), reply);
    }

    #[test]
    fn unknown_multipart_type_is_fatal() {
        let bytes = [0x00, 0x63, 0, 0, 0, 0, 0, 0];
        assert!(matches!(
            decode_from_slice::<MultipartRequest>(&bytes),
            Err(WireError::UnknownDiscriminant { family: "multipart type", .. }),
        ));
    }
}
