//! Meter-mod.

use flowlink_wire::meter::{self, MeterBand};
use flowlink_wire::{Codec, Cursor, Result, WireError, Writer};

/// Meter command: add.
pub const OFPMC_ADD: u16 = 0;
/// Meter command: modify.
pub const OFPMC_MODIFY: u16 = 1;
/// Meter command: delete.
pub const OFPMC_DELETE: u16 = 2;

/// Meter flag: rate in kb/s.
pub const OFPMF_KBPS: u16 = 1 << 0;
/// Meter flag: rate in packets/s.
pub const OFPMF_PKTPS: u16 = 1 << 1;
/// Meter flag: do burst sizing.
pub const OFPMF_BURST: u16 = 1 << 2;
/// Meter flag: collect statistics.
pub const OFPMF_STATS: u16 = 1 << 3;

/// Meter-mod body. A delete omits the band section on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MeterMod {
    /// `OFPMC_*` command.
    pub command: u16,
    /// `OFPMF_*` bits.
    pub flags: u16,
    /// Meter id, or one of the virtual meters.
    pub meter_id: u32,
    /// Rate bands; ignored (and absent from the wire) for deletes.
    pub bands: Vec<MeterBand>,
}

impl MeterMod {
    /// Whether this command deletes the meter.
    #[must_use]
    pub fn is_delete(&self) -> bool {
        self.command == OFPMC_DELETE
    }
}

impl Codec for MeterMod {
    fn wire_len(&self) -> usize {
        if self.is_delete() { 8 } else { 8 + meter::list_len(&self.bands) }
    }

    fn encode(&self, w: &mut Writer) -> Result<()> {
        if self.command > OFPMC_DELETE {
            return Err(WireError::Encode("unknown meter-mod command"));
        }
        w.put_u16(self.command);
        w.put_u16(self.flags);
        w.put_u32(self.meter_id);
        if !self.is_delete() {
            meter::encode_list(&self.bands, w)?;
        }
        Ok(())
    }

    fn decode(cur: &mut Cursor<'_>) -> Result<Self> {
        let command = cur.read_u16()?;
        if command > OFPMC_DELETE {
            return Err(WireError::UnknownDiscriminant {
                family: "meter-mod command",
                value: u32::from(command),
            });
        }
        let flags = cur.read_u16()?;
        let meter_id = cur.read_u32()?;
        let bands = meter::decode_list(cur)?;
        Ok(Self { command, flags, meter_id, bands })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowlink_wire::{decode_from_slice, encode_to_vec};

    #[test]
    fn add_carries_bands() {
        let mm = MeterMod {
            command: OFPMC_ADD,
            flags: OFPMF_KBPS,
            meter_id: 1,
            bands: vec![MeterBand::Drop { rate: 1000, burst_size: 10 }],
        };
        let bytes = encode_to_vec(&mm).unwrap();
        assert_eq!(bytes.len(), 24);
        assert_eq!(decode_from_slice::<MeterMod>(&bytes).unwrap(), mm);
    }

    #[test]
    fn delete_omits_bands() {
        let mm = MeterMod {
            command: OFPMC_DELETE,
            flags: 0,
            meter_id: meter::METER_ALL,
            bands: vec![MeterBand::Drop { rate: 1, burst_size: 1 }],
        };
        assert_eq!(mm.wire_len(), 8);
        let bytes = encode_to_vec(&mm).unwrap();
        assert_eq!(bytes.len(), 8);
        let back: MeterMod = decode_from_slice(&bytes).unwrap();
        assert!(back.bands.is_empty());
    }

    #[test]
    fn unknown_command_rejected() {
        let bytes = [0x00, 0x09, 0, 0, 0, 0, 0, 1];
        assert!(matches!(
            decode_from_slice::<MeterMod>(&bytes),
            Err(WireError::UnknownDiscriminant { family: "meter-mod command", .. }),
        ));
    }
}
