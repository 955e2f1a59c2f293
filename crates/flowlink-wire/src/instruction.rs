//! Flow instructions.
//!
//! TLVs of `type(u16) len(u16)` where `len` includes the header and padding;
//! instruction lengths are multiples of 8. `StatTrigger` exists only in 1.5
//! and carries its OXS threshold TLVs raw.

use crate::action::{self, Action};
use crate::{Codec, Cursor, Result, WireError, Writer, padded8};

const OFPIT_GOTO_TABLE: u16 = 1;
const OFPIT_WRITE_METADATA: u16 = 2;
const OFPIT_WRITE_ACTIONS: u16 = 3;
const OFPIT_APPLY_ACTIONS: u16 = 4;
const OFPIT_CLEAR_ACTIONS: u16 = 5;
const OFPIT_METER: u16 = 6;
const OFPIT_STAT_TRIGGER: u16 = 7;
const OFPIT_EXPERIMENTER: u16 = 0xFFFF;

/// Highest table id a `GotoTable` may name; 255 is reserved for "all tables".
pub const MAX_TABLE_ID: u8 = 254;

/// One flow instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// Continue the pipeline at a later table.
    GotoTable(u8),
    /// Update the metadata register through a mask.
    WriteMetadata {
        /// Metadata value.
        metadata: u64,
        /// Bits of `metadata` to apply.
        mask: u64,
    },
    /// Merge actions into the action set.
    WriteActions(Vec<Action>),
    /// Apply actions immediately.
    ApplyActions(Vec<Action>),
    /// Empty the action set.
    ClearActions,
    /// Send through a meter first.
    Meter(u32),
    /// Trigger statistics reports past thresholds (1.5).
    StatTrigger {
        /// `OFPSTF_*` flag bits.
        flags: u32,
        /// Raw OXS threshold TLVs, preserved as received.
        thresholds: Vec<u8>,
    },
    /// Experimenter instruction, body preserved raw.
    Experimenter {
        /// Experimenter id.
        experimenter: u32,
        /// Body bytes after the experimenter id.
        data: Vec<u8>,
    },
}

impl Instruction {
    /// Build a `GotoTable`, rejecting reserved table ids.
    pub fn goto_table(table_id: u8) -> Result<Self> {
        if table_id > MAX_TABLE_ID {
            return Err(WireError::Invariant("goto-table names a reserved table id"));
        }
        Ok(Self::GotoTable(table_id))
    }

    fn type_code(&self) -> u16 {
        match self {
            Self::GotoTable(_) => OFPIT_GOTO_TABLE,
            Self::WriteMetadata { .. } => OFPIT_WRITE_METADATA,
            Self::WriteActions(_) => OFPIT_WRITE_ACTIONS,
            Self::ApplyActions(_) => OFPIT_APPLY_ACTIONS,
            Self::ClearActions => OFPIT_CLEAR_ACTIONS,
            Self::Meter(_) => OFPIT_METER,
            Self::StatTrigger { .. } => OFPIT_STAT_TRIGGER,
            Self::Experimenter { .. } => OFPIT_EXPERIMENTER,
        }
    }
}

impl Codec for Instruction {
    fn wire_len(&self) -> usize {
        match self {
            Self::GotoTable(_) | Self::ClearActions | Self::Meter(_) => 8,
            Self::WriteMetadata { .. } => 24,
            Self::WriteActions(actions) | Self::ApplyActions(actions) => {
                8 + action::list_len(actions)
            },
            Self::StatTrigger { thresholds, .. } => padded8(8 + thresholds.len()),
            Self::Experimenter { data, .. } => padded8(8 + data.len()),
        }
    }

    fn encode(&self, w: &mut Writer) -> Result<()> {
        let len = self.wire_len();
        if len > usize::from(u16::MAX) {
            return Err(WireError::Encode("instruction exceeds u16 length"));
        }
        w.put_u16(self.type_code());
        w.put_u16(len as u16);
        match self {
            Self::GotoTable(table_id) => {
                w.put_u8(*table_id);
                w.put_zeros(3);
            },
            Self::WriteMetadata { metadata, mask } => {
                w.put_zeros(4);
                w.put_u64(*metadata);
                w.put_u64(*mask);
            },
            Self::WriteActions(actions) | Self::ApplyActions(actions) => {
                w.put_zeros(4);
                action::encode_list(actions, w)?;
            },
            Self::ClearActions => w.put_zeros(4),
            Self::Meter(meter_id) => w.put_u32(*meter_id),
            Self::StatTrigger { flags, thresholds } => {
                w.put_u32(*flags);
                w.put_slice(thresholds);
                w.put_zeros(len - 8 - thresholds.len());
            },
            Self::Experimenter { experimenter, data } => {
                w.put_u32(*experimenter);
                w.put_slice(data);
                w.put_zeros(len - 8 - data.len());
            },
        }
        Ok(())
    }

    fn decode(cur: &mut Cursor<'_>) -> Result<Self> {
        let ty = cur.read_u16()?;
        let len = cur.read_u16()? as usize;
        if len < 8 || len % 8 != 0 {
            return Err(WireError::Invariant("instruction length not a positive multiple of 8"));
        }
        let mut body = cur.subcursor(len, 4)?;

        let instruction = match ty {
            OFPIT_GOTO_TABLE => {
                let table_id = body.read_u8()?;
                body.skip(3)?;
                Self::goto_table(table_id)?
            },
            OFPIT_WRITE_METADATA => {
                body.skip(4)?;
                let metadata = body.read_u64()?;
                let mask = body.read_u64()?;
                Self::WriteMetadata { metadata, mask }
            },
            OFPIT_WRITE_ACTIONS => {
                body.skip(4)?;
                Self::WriteActions(action::decode_list(&mut body)?)
            },
            OFPIT_APPLY_ACTIONS => {
                body.skip(4)?;
                Self::ApplyActions(action::decode_list(&mut body)?)
            },
            OFPIT_CLEAR_ACTIONS => {
                body.skip(4)?;
                Self::ClearActions
            },
            OFPIT_METER => Self::Meter(body.read_u32()?),
            OFPIT_STAT_TRIGGER => {
                let flags = body.read_u32()?;
                Self::StatTrigger { flags, thresholds: body.rest().to_vec() }
            },
            OFPIT_EXPERIMENTER => {
                let experimenter = body.read_u32()?;
                Self::Experimenter { experimenter, data: body.rest().to_vec() }
            },
            other => {
                return Err(WireError::UnknownDiscriminant {
                    family: "instruction type",
                    value: u32::from(other),
                });
            },
        };

        if !body.is_empty() {
            return Err(WireError::Invariant("instruction length disagrees with its body"));
        }
        Ok(instruction)
    }
}

/// Total wire length of an instruction list.
#[must_use]
pub fn list_len(instructions: &[Instruction]) -> usize {
    instructions.iter().map(Codec::wire_len).sum()
}

/// Encode an instruction list back to back.
pub fn encode_list(instructions: &[Instruction], w: &mut Writer) -> Result<()> {
    for instruction in instructions {
        instruction.encode(w)?;
    }
    Ok(())
}

/// Decode instructions until the cursor is exhausted.
pub fn decode_list(cur: &mut Cursor<'_>) -> Result<Vec<Instruction>> {
    let mut instructions = Vec::new();
    while !cur.is_empty() {
        instructions.push(Instruction::decode(cur)?);
    }
    Ok(instructions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oxm::MatchField;
    use crate::{decode_from_slice, encode_to_vec};

    #[test]
    fn goto_table_layout() {
        let instruction = Instruction::goto_table(5).unwrap();
        let bytes = encode_to_vec(&instruction).unwrap();
        assert_eq!(bytes, [0x00, 0x01, 0x00, 0x08, 0x05, 0, 0, 0]);
    }

    #[test]
    fn goto_table_rejects_reserved_ids() {
        assert!(Instruction::goto_table(255).is_err());
        // The same check applies on decode.
        let bytes = [0x00, 0x01, 0x00, 0x08, 0xFF, 0, 0, 0];
        assert!(matches!(decode_from_slice::<Instruction>(&bytes), Err(WireError::Invariant(_))));
    }

    #[test]
    fn write_metadata_round_trip() {
        let instruction = Instruction::WriteMetadata { metadata: 0xAABB, mask: 0xFFFF };
        let bytes = encode_to_vec(&instruction).unwrap();
        assert_eq!(bytes.len(), 24);
        assert_eq!(decode_from_slice::<Instruction>(&bytes).unwrap(), instruction);
    }

    #[test]
    fn apply_actions_round_trip() {
        let instruction = Instruction::ApplyActions(vec![
            Action::SetField(MatchField::eth_type(0x0800)),
            Action::Output { port: 1, max_len: 0 },
        ]);
        let bytes = encode_to_vec(&instruction).unwrap();
        assert_eq!(bytes.len(), instruction.wire_len());
        assert_eq!(decode_from_slice::<Instruction>(&bytes).unwrap(), instruction);
    }

    #[test]
    fn unknown_type_is_fatal() {
        let bytes = [0x00, 0x09, 0x00, 0x08, 0, 0, 0, 0];
        assert_eq!(
            decode_from_slice::<Instruction>(&bytes).unwrap_err(),
            WireError::UnknownDiscriminant { family: "instruction type", value: 9 },
        );
    }

    #[test]
    fn list_round_trip() {
        let instructions = vec![
            Instruction::Meter(4),
            Instruction::ApplyActions(vec![Action::DecNwTtl]),
            Instruction::goto_table(2).unwrap(),
        ];
        let mut w = Writer::new();
        encode_list(&instructions, &mut w).unwrap();
        let bytes = w.freeze();
        assert_eq!(bytes.len(), list_len(&instructions));
        let mut cur = Cursor::new(&bytes);
        assert_eq!(decode_list(&mut cur).unwrap(), instructions);
    }
}
