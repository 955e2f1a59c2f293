//! Group-mod in the 1.5 shape: buckets with ids and properties.

use flowlink_wire::action::{self, Action};
use flowlink_wire::{Codec, Cursor, Result, WireError, Writer, padded8};

/// Wildcard group, valid in requests and delete commands.
pub const OFPG_ALL: u32 = 0xFFFF_FFFC;
/// Any group, used as a no-filter value.
pub const OFPG_ANY: u32 = 0xFFFF_FFFF;

/// Group command: add.
pub const OFPGC_ADD: u16 = 0;
/// Group command: modify.
pub const OFPGC_MODIFY: u16 = 1;
/// Group command: delete.
pub const OFPGC_DELETE: u16 = 2;
/// Group command: insert buckets.
pub const OFPGC_INSERT_BUCKET: u16 = 3;
/// Group command: remove buckets.
pub const OFPGC_REMOVE_BUCKET: u16 = 5;

/// Group type: execute all buckets.
pub const OFPGT_ALL: u8 = 0;
/// Group type: select one bucket.
pub const OFPGT_SELECT: u8 = 1;
/// Group type: indirect single bucket.
pub const OFPGT_INDIRECT: u8 = 2;
/// Group type: first live bucket.
pub const OFPGT_FF: u8 = 3;

/// `command_bucket_id` value addressing the first bucket.
pub const OFPG_BUCKET_FIRST: u32 = 0xFFFF_FFFD;
/// `command_bucket_id` value addressing the last bucket.
pub const OFPG_BUCKET_LAST: u32 = 0xFFFF_FFFE;
/// `command_bucket_id` value for commands that take none.
pub const OFPG_BUCKET_ALL: u32 = 0xFFFF_FFFF;

const OFPGBPT_WEIGHT: u16 = 0;
const OFPGBPT_WATCH_PORT: u16 = 1;
const OFPGBPT_WATCH_GROUP: u16 = 2;

/// One bucket property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BucketProp {
    /// Relative weight for select groups.
    Weight(u16),
    /// Port whose liveness gates this bucket.
    WatchPort(u32),
    /// Group whose liveness gates this bucket.
    WatchGroup(u32),
    /// Unrecognized property, preserved raw.
    Unknown {
        /// Property type code.
        prop_type: u16,
        /// Value bytes (padding excluded).
        data: Vec<u8>,
    },
}

impl Codec for BucketProp {
    fn wire_len(&self) -> usize {
        match self {
            Self::Weight(_) | Self::WatchPort(_) | Self::WatchGroup(_) => 8,
            Self::Unknown { data, .. } => padded8(4 + data.len()),
        }
    }

    fn encode(&self, w: &mut Writer) -> Result<()> {
        match self {
            Self::Weight(weight) => {
                w.put_u16(OFPGBPT_WEIGHT);
                w.put_u16(8);
                w.put_u16(*weight);
                w.put_zeros(2);
            },
            Self::WatchPort(port) => {
                w.put_u16(OFPGBPT_WATCH_PORT);
                w.put_u16(8);
                w.put_u32(*port);
            },
            Self::WatchGroup(group) => {
                w.put_u16(OFPGBPT_WATCH_GROUP);
                w.put_u16(8);
                w.put_u32(*group);
            },
            Self::Unknown { prop_type, data } => {
                let body_len = 4 + data.len();
                if body_len > usize::from(u16::MAX) {
                    return Err(WireError::Encode("bucket property exceeds u16 length"));
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
            OFPGBPT_WEIGHT => {
                let weight = body.read_u16()?;
                body.skip(2)?;
                Self::Weight(weight)
            },
            OFPGBPT_WATCH_PORT => Self::WatchPort(body.read_u32()?),
            OFPGBPT_WATCH_GROUP => Self::WatchGroup(body.read_u32()?),
            other => Self::Unknown { prop_type: other, data: body.rest().to_vec() },
        };
        if !body.is_empty() {
            return Err(WireError::Invariant("bucket property length disagrees with body"));
        }
        cur.skip_align8()?;
        Ok(prop)
    }
}

/// One group bucket: id, actions, properties.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Bucket {
    /// Bucket id, unique within the group, ascending in wire order.
    pub bucket_id: u32,
    /// Actions applied to packets taking this bucket.
    pub actions: Vec<Action>,
    /// Properties in wire order.
    pub properties: Vec<BucketProp>,
}

impl Codec for Bucket {
    fn wire_len(&self) -> usize {
        8 + action::list_len(&self.actions)
            + self.properties.iter().map(Codec::wire_len).sum::<usize>()
    }

    fn encode(&self, w: &mut Writer) -> Result<()> {
        let len = self.wire_len();
        let actions_len = action::list_len(&self.actions);
        if len > usize::from(u16::MAX) {
            return Err(WireError::Encode("bucket exceeds u16 length"));
        }
        w.put_u16(len as u16);
        w.put_u16(actions_len as u16);
        w.put_u32(self.bucket_id);
        action::encode_list(&self.actions, w)?;
        for prop in &self.properties {
            prop.encode(w)?;
        }
        Ok(())
    }

    fn decode(cur: &mut Cursor<'_>) -> Result<Self> {
        let len = cur.read_u16()? as usize;
        if len < 8 || len % 8 != 0 {
            return Err(WireError::Invariant("bucket length not a multiple of 8 of at least 8"));
        }
        let mut body = cur.subcursor(len, 2)?;
        let actions_len = body.read_u16()? as usize;
        let bucket_id = body.read_u32()?;
        let mut actions_cur = body.subcursor(actions_len, 0)?;
        let actions = action::decode_list(&mut actions_cur)?;
        let mut properties = Vec::new();
        while !body.is_empty() {
            properties.push(BucketProp::decode(&mut body)?);
        }
        Ok(Self { bucket_id, actions, properties })
    }
}

/// Group-mod body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupMod {
    /// `OFPGC_*` command.
    pub command: u16,
    /// `OFPGT_*` group type.
    pub group_type: u8,
    /// Group id.
    pub group_id: u32,
    /// Bucket addressed by insert/remove commands.
    pub command_bucket_id: u32,
    /// Buckets; must be empty for delete.
    pub buckets: Vec<Bucket>,
    /// Raw group property TLVs, preserved as received.
    pub properties: Vec<u8>,
}

impl Default for GroupMod {
    fn default() -> Self {
        Self {
            command: OFPGC_ADD,
            group_type: OFPGT_ALL,
            group_id: 0,
            command_bucket_id: OFPG_BUCKET_ALL,
            buckets: Vec::new(),
            properties: Vec::new(),
        }
    }
}

impl Codec for GroupMod {
    fn wire_len(&self) -> usize {
        16 + self.buckets.iter().map(Codec::wire_len).sum::<usize>() + self.properties.len()
    }

    fn encode(&self, w: &mut Writer) -> Result<()> {
        let buckets_len = self.buckets.iter().map(Codec::wire_len).sum::<usize>();
        if buckets_len > usize::from(u16::MAX) {
            return Err(WireError::Encode("bucket array exceeds u16 length"));
        }
        w.put_u16(self.command);
        w.put_u8(self.group_type);
        w.put_u8(0);
        w.put_u32(self.group_id);
        w.put_u16(buckets_len as u16);
        w.put_zeros(2);
        w.put_u32(self.command_bucket_id);
        for bucket in &self.buckets {
            bucket.encode(w)?;
        }
        w.put_slice(&self.properties);
        Ok(())
    }

    fn decode(cur: &mut Cursor<'_>) -> Result<Self> {
        let command = cur.read_u16()?;
        let group_type = cur.read_u8()?;
        cur.skip(1)?;
        let group_id = cur.read_u32()?;
        let buckets_len = cur.read_u16()? as usize;
        cur.skip(2)?;
        let command_bucket_id = cur.read_u32()?;
        let mut buckets_cur = cur.subcursor(buckets_len, 0)?;
        let mut buckets = Vec::new();
        while !buckets_cur.is_empty() {
            buckets.push(Bucket::decode(&mut buckets_cur)?);
        }
        Ok(Self {
            command,
            group_type,
            group_id,
            command_bucket_id,
            buckets,
            properties: cur.rest().to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowlink_wire::{decode_from_slice, encode_to_vec};

    #[test]
    fn group_mod_round_trip() {
        let gm = GroupMod {
            command: OFPGC_ADD,
            group_type: OFPGT_SELECT,
            group_id: 3,
            buckets: vec![Bucket {
                bucket_id: 1,
                actions: vec![Action::Output { port: 2, max_len: 0 }],
                properties: vec![BucketProp::Weight(50), BucketProp::WatchPort(2)],
            }],
            ..GroupMod::default()
        };
        let bytes = encode_to_vec(&gm).unwrap();
        assert_eq!(bytes.len(), gm.wire_len());
        assert_eq!(decode_from_slice::<GroupMod>(&bytes).unwrap(), gm);
    }

    #[test]
    fn bucket_separates_actions_from_properties() {
        let bucket = Bucket {
            bucket_id: 9,
            actions: vec![Action::Group(4)],
            properties: vec![BucketProp::WatchGroup(4)],
        };
        let bytes = encode_to_vec(&bucket).unwrap();
        let back: Bucket = decode_from_slice(&bytes).unwrap();
        assert_eq!(back, bucket);
    }
}
