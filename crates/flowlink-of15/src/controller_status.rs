//! Controller connection status, reported by the switch.

use flowlink_wire::{Codec, Cursor, Result, WireError, Writer, padded8};

/// Status reason: a request was made.
pub const OFPCSR_REQUEST: u8 = 0;
/// Status reason: a channel connected or disconnected.
pub const OFPCSR_CHANNEL_STATUS: u8 = 1;
/// Status reason: the controller's role changed.
pub const OFPCSR_ROLE: u8 = 2;
/// Status reason: the controller id changed.
pub const OFPCSR_CONTROLLER_ADDED: u8 = 3;
/// Status reason: a controller was removed.
pub const OFPCSR_CONTROLLER_REMOVED: u8 = 4;
/// Status reason: the short id changed.
pub const OFPCSR_SHORT_ID: u8 = 5;
/// Status reason: experimenter-defined.
pub const OFPCSR_EXPERIMENTER: u8 = 6;

/// Channel is up.
pub const OFPCT_STATUS_UP: u8 = 0;
/// Channel is down.
pub const OFPCT_STATUS_DOWN: u8 = 1;

const OFPCSPT_URI: u16 = 0;

/// One controller-status property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerStatusProp {
    /// The controller's connection URI.
    Uri(
        /// URI bytes (commonly ASCII, not guaranteed).
        Vec<u8>,
    ),
    /// Unrecognized property, preserved raw.
    Unknown {
        /// Property type code.
        prop_type: u16,
        /// Value bytes (padding excluded).
        data: Vec<u8>,
    },
}

impl Codec for ControllerStatusProp {
    fn wire_len(&self) -> usize {
        padded8(4 + match self {
            Self::Uri(uri) => uri.len(),
            Self::Unknown { data, .. } => data.len(),
        })
    }

    fn encode(&self, w: &mut Writer) -> Result<()> {
        let (ty, data): (u16, &[u8]) = match self {
            Self::Uri(uri) => (OFPCSPT_URI, uri),
            Self::Unknown { prop_type, data } => (*prop_type, data),
        };
        let body_len = 4 + data.len();
        if body_len > usize::from(u16::MAX) {
            return Err(WireError::Encode("controller status property exceeds u16 length"));
        }
        w.put_u16(ty);
        w.put_u16(body_len as u16);
        w.put_slice(data);
        w.align8();
        Ok(())
    }

    fn decode(cur: &mut Cursor<'_>) -> Result<Self> {
        let prop_type = cur.read_u16()?;
        let len = cur.read_u16()? as usize;
        let mut body = cur.subcursor(len, 4)?;
        let prop = match prop_type {
            OFPCSPT_URI => Self::Uri(body.rest().to_vec()),
            other => Self::Unknown { prop_type: other, data: body.rest().to_vec() },
        };
        cur.skip_align8()?;
        Ok(prop)
    }
}

/// One controller's connection status. Used both as the controller-status
/// message body and as multipart reply entries.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ControllerStatus {
    /// Switch-assigned short id of the controller.
    pub short_id: u16,
    /// The controller's role.
    pub role: u32,
    /// `OFPCSR_*` reason this status was generated.
    pub reason: u8,
    /// `OFPCT_STATUS_*` channel state.
    pub channel_status: u8,
    /// Properties in wire order.
    pub properties: Vec<ControllerStatusProp>,
}

impl Codec for ControllerStatus {
    fn wire_len(&self) -> usize {
        16 + self.properties.iter().map(Codec::wire_len).sum::<usize>()
    }

    fn encode(&self, w: &mut Writer) -> Result<()> {
        let len = self.wire_len();
        if len > usize::from(u16::MAX) {
            return Err(WireError::Encode("controller status exceeds u16 length"));
        }
        w.put_u16(len as u16);
        w.put_u16(self.short_id);
        w.put_u32(self.role);
        w.put_u8(self.reason);
        w.put_u8(self.channel_status);
        w.put_zeros(6);
        for prop in &self.properties {
            prop.encode(w)?;
        }
        Ok(())
    }

    fn decode(cur: &mut Cursor<'_>) -> Result<Self> {
        let len = cur.read_u16()? as usize;
        let mut body = cur.subcursor(len, 2)?;
        let short_id = body.read_u16()?;
        let role = body.read_u32()?;
        let reason = body.read_u8()?;
        let channel_status = body.read_u8()?;
        body.skip(6)?;
        let mut properties = Vec::new();
        while !body.is_empty() {
            properties.push(ControllerStatusProp::decode(&mut body)?);
        }
        Ok(Self { short_id, role, reason, channel_status, properties })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowlink_wire::{decode_from_slice, encode_to_vec};

    #[test]
    fn controller_status_round_trip() {
        let status = ControllerStatus {
            short_id: 2,
            role: crate::role::OFPCR_ROLE_MASTER,
            reason: OFPCSR_CHANNEL_STATUS,
            channel_status: OFPCT_STATUS_DOWN,
            properties: vec![ControllerStatusProp::Uri(b"tcp:192.168.1.1:6653".to_vec())],
        };
        let bytes = encode_to_vec(&status).unwrap();
        assert_eq!(bytes.len(), status.wire_len());
        assert_eq!(decode_from_slice::<ControllerStatus>(&bytes).unwrap(), status);
    }
}
