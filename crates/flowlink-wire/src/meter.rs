//! Meter bands, shared by meter-mod and the meter multipart bodies.

use crate::{Codec, Cursor, Result, WireError, Writer, padded8};

const OFPMBT_DROP: u16 = 1;
const OFPMBT_DSCP_REMARK: u16 = 2;
const OFPMBT_EXPERIMENTER: u16 = 0xFFFF;

/// Meter id range reserved for virtual meters.
pub const METER_MAX: u32 = 0xFFFF_0000;
/// Virtual meter for the controller connection.
pub const METER_CONTROLLER: u32 = 0xFFFF_FFFD;
/// Wildcard meter, valid in requests.
pub const METER_ALL: u32 = 0xFFFF_FFFF;

/// One meter band: `type(u16) len(u16) rate(u32) burst_size(u32)` plus a
/// per-type tail. Standard bands are 16 bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MeterBand {
    /// Drop packets past the rate.
    Drop {
        /// Rate in kb/s, or packets/s under `OFPMF_PKTPS`.
        rate: u32,
        /// Burst tolerance.
        burst_size: u32,
    },
    /// Increase the DSCP drop precedence past the rate.
    DscpRemark {
        /// Rate in kb/s, or packets/s under `OFPMF_PKTPS`.
        rate: u32,
        /// Burst tolerance.
        burst_size: u32,
        /// Precedence levels to add.
        prec_level: u8,
    },
    /// Experimenter band, tail preserved raw.
    Experimenter {
        /// Rate in kb/s.
        rate: u32,
        /// Burst tolerance.
        burst_size: u32,
        /// Experimenter id.
        experimenter: u32,
        /// Experimenter tail bytes.
        data: Vec<u8>,
    },
}

impl Codec for MeterBand {
    fn wire_len(&self) -> usize {
        match self {
            Self::Drop { .. } | Self::DscpRemark { .. } => 16,
            Self::Experimenter { data, .. } => padded8(16 + data.len()),
        }
    }

    fn encode(&self, w: &mut Writer) -> Result<()> {
        let len = self.wire_len();
        if len > usize::from(u16::MAX) {
            return Err(WireError::Encode("meter band exceeds u16 length"));
        }
        match self {
            Self::Drop { rate, burst_size } => {
                w.put_u16(OFPMBT_DROP);
                w.put_u16(len as u16);
                w.put_u32(*rate);
                w.put_u32(*burst_size);
                w.put_zeros(4);
            },
            Self::DscpRemark { rate, burst_size, prec_level } => {
                w.put_u16(OFPMBT_DSCP_REMARK);
                w.put_u16(len as u16);
                w.put_u32(*rate);
                w.put_u32(*burst_size);
                w.put_u8(*prec_level);
                w.put_zeros(3);
            },
            Self::Experimenter { rate, burst_size, experimenter, data } => {
                w.put_u16(OFPMBT_EXPERIMENTER);
                w.put_u16(len as u16);
                w.put_u32(*rate);
                w.put_u32(*burst_size);
                w.put_u32(*experimenter);
                w.put_slice(data);
                w.put_zeros(len - 16 - data.len());
            },
        }
        Ok(())
    }

    fn decode(cur: &mut Cursor<'_>) -> Result<Self> {
        let ty = cur.read_u16()?;
        let len = cur.read_u16()? as usize;
        if len < 16 || len % 8 != 0 {
            return Err(WireError::Invariant("meter band length not a multiple of 8 of at least 16"));
        }
        let mut body = cur.subcursor(len, 4)?;
        let rate = body.read_u32()?;
        let burst_size = body.read_u32()?;

        let band = match ty {
            OFPMBT_DROP => {
                body.skip(4)?;
                Self::Drop { rate, burst_size }
            },
            OFPMBT_DSCP_REMARK => {
                let prec_level = body.read_u8()?;
                body.skip(3)?;
                Self::DscpRemark { rate, burst_size, prec_level }
            },
            OFPMBT_EXPERIMENTER => {
                let experimenter = body.read_u32()?;
                Self::Experimenter { rate, burst_size, experimenter, data: body.rest().to_vec() }
            },
            other => {
                return Err(WireError::UnknownDiscriminant {
                    family: "meter band type",
                    value: u32::from(other),
                });
            },
        };

        if !body.is_empty() {
            return Err(WireError::Invariant("meter band length disagrees with its body"));
        }
        Ok(band)
    }
}

/// Total wire length of a band list.
#[must_use]
pub fn list_len(bands: &[MeterBand]) -> usize {
    bands.iter().map(Codec::wire_len).sum()
}

/// Encode bands back to back.
pub fn encode_list(bands: &[MeterBand], w: &mut Writer) -> Result<()> {
    for band in bands {
        band.encode(w)?;
    }
    Ok(())
}

/// Decode bands until the cursor is exhausted.
pub fn decode_list(cur: &mut Cursor<'_>) -> Result<Vec<MeterBand>> {
    let mut bands = Vec::new();
    while !cur.is_empty() {
        bands.push(MeterBand::decode(cur)?);
    }
    Ok(bands)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{decode_from_slice, encode_to_vec};

    #[test]
    fn drop_band_layout() {
        let band = MeterBand::Drop { rate: 1000, burst_size: 64 };
        let bytes = encode_to_vec(&band).unwrap();
        assert_eq!(bytes, [
            0x00, 0x01, 0x00, 0x10, // type=1 len=16
            0x00, 0x00, 0x03, 0xE8, // rate
            0x00, 0x00, 0x00, 0x40, // burst
            0, 0, 0, 0,
        ]);
        assert_eq!(decode_from_slice::<MeterBand>(&bytes).unwrap(), band);
    }

    #[test]
    fn dscp_remark_round_trip() {
        let band = MeterBand::DscpRemark { rate: 5000, burst_size: 128, prec_level: 2 };
        let bytes = encode_to_vec(&band).unwrap();
        assert_eq!(bytes.len(), 16);
        assert_eq!(decode_from_slice::<MeterBand>(&bytes).unwrap(), band);
    }

    #[test]
    fn experimenter_band_round_trip() {
        let band = MeterBand::Experimenter {
            rate: 1,
            burst_size: 2,
            experimenter: 0xCAFE,
            data: vec![9, 9, 9],
        };
        let bytes = encode_to_vec(&band).unwrap();
        assert_eq!(bytes.len() % 8, 0);
        assert_eq!(decode_from_slice::<MeterBand>(&bytes).unwrap(), band);
    }

    #[test]
    fn unknown_band_type_is_fatal() {
        let bytes = [0x00, 0x07, 0x00, 0x10, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        assert!(matches!(
            decode_from_slice::<MeterBand>(&bytes),
            Err(WireError::UnknownDiscriminant { family: "meter band type", .. }),
        ));
    }
}
