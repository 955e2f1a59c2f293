//! Group-mod and its buckets.

use flowlink_wire::action::{self, Action};
use flowlink_wire::{Codec, Cursor, Result, WireError, Writer};

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

/// Group type: execute all buckets.
pub const OFPGT_ALL: u8 = 0;
/// Group type: select one bucket.
pub const OFPGT_SELECT: u8 = 1;
/// Group type: indirect single bucket.
pub const OFPGT_INDIRECT: u8 = 2;
/// Group type: first live bucket.
pub const OFPGT_FF: u8 = 3;

/// One group bucket: weight, liveness watches, and an action list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    /// Relative weight for select groups.
    pub weight: u16,
    /// Port whose liveness gates this bucket, or [`OFPG_ANY`]-style ANY.
    pub watch_port: u32,
    /// Group whose liveness gates this bucket.
    pub watch_group: u32,
    /// Actions applied to packets taking this bucket.
    pub actions: Vec<Action>,
}

impl Default for Bucket {
    fn default() -> Self {
        Self {
            weight: 0,
            watch_port: flowlink_wire::action::ports::ANY,
            watch_group: OFPG_ANY,
            actions: Vec::new(),
        }
    }
}

impl Codec for Bucket {
    fn wire_len(&self) -> usize {
        16 + action::list_len(&self.actions)
    }

    fn encode(&self, w: &mut Writer) -> Result<()> {
        let len = self.wire_len();
        if len > usize::from(u16::MAX) {
            return Err(WireError::Encode("bucket exceeds u16 length"));
        }
        w.put_u16(len as u16);
        w.put_u16(self.weight);
        w.put_u32(self.watch_port);
        w.put_u32(self.watch_group);
        w.put_zeros(4);
        action::encode_list(&self.actions, w)
    }

    fn decode(cur: &mut Cursor<'_>) -> Result<Self> {
        let len = cur.read_u16()? as usize;
        if len < 16 || len % 8 != 0 {
            return Err(WireError::Invariant("bucket length not a multiple of 8 of at least 16"));
        }
        let mut body = cur.subcursor(len, 2)?;
        let weight = body.read_u16()?;
        let watch_port = body.read_u32()?;
        let watch_group = body.read_u32()?;
        body.skip(4)?;
        let actions = action::decode_list(&mut body)?;
        Ok(Self { weight, watch_port, watch_group, actions })
    }
}

/// Group-mod body.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GroupMod {
    /// `OFPGC_*` command.
    pub command: u16,
    /// `OFPGT_*` group type.
    pub group_type: u8,
    /// Group id.
    pub group_id: u32,
    /// Buckets; must be empty for delete.
    pub buckets: Vec<Bucket>,
}

impl Codec for GroupMod {
    fn wire_len(&self) -> usize {
        8 + self.buckets.iter().map(Codec::wire_len).sum::<usize>()
    }

    fn encode(&self, w: &mut Writer) -> Result<()> {
        w.put_u16(self.command);
        w.put_u8(self.group_type);
        w.put_u8(0);
        w.put_u32(self.group_id);
        for bucket in &self.buckets {
            bucket.encode(w)?;
        }
        Ok(())
    }

    fn decode(cur: &mut Cursor<'_>) -> Result<Self> {
        let command = cur.read_u16()?;
        let group_type = cur.read_u8()?;
        cur.skip(1)?;
        let group_id = cur.read_u32()?;
        let mut buckets = Vec::new();
        while !cur.is_empty() {
            buckets.push(Bucket::decode(cur)?);
        }
        Ok(Self { command, group_type, group_id, buckets })
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
            group_id: 7,
            buckets: vec![
                Bucket {
                    weight: 10,
                    actions: vec![Action::Output { port: 1, max_len: 0 }],
                    ..Bucket::default()
                },
                Bucket {
                    weight: 20,
                    actions: vec![Action::Output { port: 2, max_len: 0 }],
                    ..Bucket::default()
                },
            ],
        };
        let bytes = encode_to_vec(&gm).unwrap();
        assert_eq!(bytes.len(), gm.wire_len());
        assert_eq!(decode_from_slice::<GroupMod>(&bytes).unwrap(), gm);
    }

    #[test]
    fn delete_has_no_buckets() {
        let gm = GroupMod {
            command: OFPGC_DELETE,
            group_type: OFPGT_ALL,
            group_id: OFPG_ALL,
            buckets: Vec::new(),
        };
        assert_eq!(encode_to_vec(&gm).unwrap().len(), 8);
    }

    #[test]
    fn ragged_bucket_length_rejected() {
        // Bucket claiming 17 bytes.
        let bytes = [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x07, 0x00, 0x11];
        assert!(decode_from_slice::<GroupMod>(&bytes).is_err());
    }
}
