//! The error message, including experimenter (vendor) errors.

use flowlink_wire::{Codec, Cursor, Result, Writer};

/// `type` value marking an experimenter error.
pub const OFPET_EXPERIMENTER: u16 = 0xFFFF;

/// Error type: hello failed.
pub const OFPET_HELLO_FAILED: u16 = 0;
/// Error type: request not understood.
pub const OFPET_BAD_REQUEST: u16 = 1;
/// Error type: action not understood.
pub const OFPET_BAD_ACTION: u16 = 2;
/// Error type: instruction not understood.
pub const OFPET_BAD_INSTRUCTION: u16 = 3;
/// Error type: match not understood.
pub const OFPET_BAD_MATCH: u16 = 4;
/// Error type: flow-mod failed.
pub const OFPET_FLOW_MOD_FAILED: u16 = 5;
/// Error type: group-mod failed.
pub const OFPET_GROUP_MOD_FAILED: u16 = 6;
/// Error type: port-mod failed.
pub const OFPET_PORT_MOD_FAILED: u16 = 7;
/// Error type: table-mod failed.
pub const OFPET_TABLE_MOD_FAILED: u16 = 8;
/// Error type: queue operation failed.
pub const OFPET_QUEUE_OP_FAILED: u16 = 9;
/// Error type: switch-config failed.
pub const OFPET_SWITCH_CONFIG_FAILED: u16 = 10;
/// Error type: role request failed.
pub const OFPET_ROLE_REQUEST_FAILED: u16 = 11;
/// Error type: meter-mod failed.
pub const OFPET_METER_MOD_FAILED: u16 = 12;
/// Error type: table-features request failed.
pub const OFPET_TABLE_FEATURES_FAILED: u16 = 13;

/// An error reported by the peer.
///
/// A `type` of [`OFPET_EXPERIMENTER`] switches the layout: the code field
/// becomes a vendor-defined subtype and an experimenter id follows, so
/// vendor errors get their own variant wrapping the generic shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorMsg {
    /// A standard error: `type(u16) code(u16)` plus at least 64 bytes of the
    /// offending request.
    Standard {
        /// Error type.
        err_type: u16,
        /// Type-specific code.
        code: u16,
        /// Prefix of the request that failed.
        data: Vec<u8>,
    },
    /// An experimenter error.
    Vendor {
        /// Vendor-defined subtype (occupies the code field).
        exp_type: u16,
        /// Experimenter id.
        experimenter: u32,
        /// Vendor-defined payload.
        data: Vec<u8>,
    },
}

impl Codec for ErrorMsg {
    fn wire_len(&self) -> usize {
        match self {
            Self::Standard { data, .. } => 4 + data.len(),
            Self::Vendor { data, .. } => 8 + data.len(),
        }
    }

    fn encode(&self, w: &mut Writer) -> Result<()> {
        match self {
            Self::Standard { err_type, code, data } => {
                w.put_u16(*err_type);
                w.put_u16(*code);
                w.put_slice(data);
            },
            Self::Vendor { exp_type, experimenter, data } => {
                w.put_u16(OFPET_EXPERIMENTER);
                w.put_u16(*exp_type);
                w.put_u32(*experimenter);
                w.put_slice(data);
            },
        }
        Ok(())
    }

    fn decode(cur: &mut Cursor<'_>) -> Result<Self> {
        let err_type = cur.read_u16()?;
        if err_type == OFPET_EXPERIMENTER {
            let exp_type = cur.read_u16()?;
            let experimenter = cur.read_u32()?;
            Ok(Self::Vendor { exp_type, experimenter, data: cur.rest().to_vec() })
        } else {
            let code = cur.read_u16()?;
            Ok(Self::Standard { err_type, code, data: cur.rest().to_vec() })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowlink_wire::{decode_from_slice, encode_to_vec};

    #[test]
    fn standard_error_round_trip() {
        let msg = ErrorMsg::Standard {
            err_type: OFPET_BAD_REQUEST,
            code: 2,
            data: vec![4, 14, 0, 8, 0, 0, 0, 1],
        };
        let bytes = encode_to_vec(&msg).unwrap();
        assert_eq!(&bytes[..4], &[0x00, 0x01, 0x00, 0x02]);
        assert_eq!(decode_from_slice::<ErrorMsg>(&bytes).unwrap(), msg);
    }

    #[test]
    fn vendor_error_round_trip() {
        let msg = ErrorMsg::Vendor { exp_type: 12, experimenter: 0x4F4E_4600, data: vec![1, 2] };
        let bytes = encode_to_vec(&msg).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xFF]);
        assert_eq!(decode_from_slice::<ErrorMsg>(&bytes).unwrap(), msg);
    }
}
