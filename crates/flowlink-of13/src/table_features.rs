//! Table features and their property family.
//!
//! The property family is extensible: unknown property types are preserved
//! with their raw bytes so a features blob can be read, carried, and
//! re-marshalled bit-exactly even when the switch speaks a newer dialect.

use flowlink_wire::oxm::OxmId;
use flowlink_wire::{Codec, Cursor, Result, WireError, Writer, padded8};

use crate::port::{put_fixed_name, read_fixed_name};

const OFPTFPT_INSTRUCTIONS: u16 = 0;
const OFPTFPT_INSTRUCTIONS_MISS: u16 = 1;
const OFPTFPT_NEXT_TABLES: u16 = 2;
const OFPTFPT_NEXT_TABLES_MISS: u16 = 3;
const OFPTFPT_WRITE_ACTIONS: u16 = 4;
const OFPTFPT_WRITE_ACTIONS_MISS: u16 = 5;
const OFPTFPT_APPLY_ACTIONS: u16 = 6;
const OFPTFPT_APPLY_ACTIONS_MISS: u16 = 7;
const OFPTFPT_MATCH: u16 = 8;
const OFPTFPT_WILDCARDS: u16 = 10;
const OFPTFPT_WRITE_SETFIELD: u16 = 12;
const OFPTFPT_WRITE_SETFIELD_MISS: u16 = 13;
const OFPTFPT_APPLY_SETFIELD: u16 = 14;
const OFPTFPT_APPLY_SETFIELD_MISS: u16 = 15;

/// Which pipeline stage a capability property describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// The regular entry path.
    Regular,
    /// The table-miss entry path.
    Miss,
}

/// One table-features property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableFeatureProp {
    /// Supported instruction type codes.
    Instructions {
        /// Regular or miss path.
        stage: Stage,
        /// Instruction type codes (header-only TLVs on the wire).
        types: Vec<u16>,
    },
    /// Tables reachable via goto-table.
    NextTables {
        /// Regular or miss path.
        stage: Stage,
        /// Reachable table ids.
        tables: Vec<u8>,
    },
    /// Action types valid in write-actions.
    WriteActions {
        /// Regular or miss path.
        stage: Stage,
        /// Action type codes.
        types: Vec<u16>,
    },
    /// Action types valid in apply-actions.
    ApplyActions {
        /// Regular or miss path.
        stage: Stage,
        /// Action type codes.
        types: Vec<u16>,
    },
    /// Fields the table can match on.
    Match(
        /// Field ids.
        Vec<OxmId>,
    ),
    /// Fields the table can wildcard.
    Wildcards(
        /// Field ids.
        Vec<OxmId>,
    ),
    /// Fields settable in write-actions.
    WriteSetField {
        /// Regular or miss path.
        stage: Stage,
        /// Field ids.
        fields: Vec<OxmId>,
    },
    /// Fields settable in apply-actions.
    ApplySetField {
        /// Regular or miss path.
        stage: Stage,
        /// Field ids.
        fields: Vec<OxmId>,
    },
    /// Unrecognized property, preserved raw.
    Unknown {
        /// Property type code.
        prop_type: u16,
        /// Value bytes (padding excluded).
        data: Vec<u8>,
    },
}

impl TableFeatureProp {
    fn prop_type(&self) -> u16 {
        match self {
            Self::Instructions { stage: Stage::Regular, .. } => OFPTFPT_INSTRUCTIONS,
            Self::Instructions { stage: Stage::Miss, .. } => OFPTFPT_INSTRUCTIONS_MISS,
            Self::NextTables { stage: Stage::Regular, .. } => OFPTFPT_NEXT_TABLES,
            Self::NextTables { stage: Stage::Miss, .. } => OFPTFPT_NEXT_TABLES_MISS,
            Self::WriteActions { stage: Stage::Regular, .. } => OFPTFPT_WRITE_ACTIONS,
            Self::WriteActions { stage: Stage::Miss, .. } => OFPTFPT_WRITE_ACTIONS_MISS,
            Self::ApplyActions { stage: Stage::Regular, .. } => OFPTFPT_APPLY_ACTIONS,
            Self::ApplyActions { stage: Stage::Miss, .. } => OFPTFPT_APPLY_ACTIONS_MISS,
            Self::Match(_) => OFPTFPT_MATCH,
            Self::Wildcards(_) => OFPTFPT_WILDCARDS,
            Self::WriteSetField { stage: Stage::Regular, .. } => OFPTFPT_WRITE_SETFIELD,
            Self::WriteSetField { stage: Stage::Miss, .. } => OFPTFPT_WRITE_SETFIELD_MISS,
            Self::ApplySetField { stage: Stage::Regular, .. } => OFPTFPT_APPLY_SETFIELD,
            Self::ApplySetField { stage: Stage::Miss, .. } => OFPTFPT_APPLY_SETFIELD_MISS,
            Self::Unknown { prop_type, .. } => *prop_type,
        }
    }

    fn value_len(&self) -> usize {
        match self {
            Self::Instructions { types, .. }
            | Self::WriteActions { types, .. }
            | Self::ApplyActions { types, .. } => 4 * types.len(),
            Self::NextTables { tables, .. } => tables.len(),
            Self::Match(fields) | Self::Wildcards(fields) => 4 * fields.len(),
            Self::WriteSetField { fields, .. } | Self::ApplySetField { fields, .. } => {
                4 * fields.len()
            },
            Self::Unknown { data, .. } => data.len(),
        }
    }
}

fn put_id_list(w: &mut Writer, types: &[u16]) {
    // Header-only instruction/action id TLVs: type + length of 4.
    for ty in types {
        w.put_u16(*ty);
        w.put_u16(4);
    }
}

fn read_id_list(cur: &mut Cursor<'_>) -> Result<Vec<u16>> {
    let mut types = Vec::new();
    while !cur.is_empty() {
        let ty = cur.read_u16()?;
        let len = cur.read_u16()?;
        if len != 4 {
            return Err(WireError::Invariant("capability id TLV with a body"));
        }
        types.push(ty);
    }
    Ok(types)
}

fn read_oxm_ids(cur: &mut Cursor<'_>) -> Result<Vec<OxmId>> {
    let mut ids = Vec::new();
    while !cur.is_empty() {
        ids.push(OxmId::decode(cur)?);
    }
    Ok(ids)
}

impl Codec for TableFeatureProp {
    fn wire_len(&self) -> usize {
        padded8(4 + self.value_len())
    }

    fn encode(&self, w: &mut Writer) -> Result<()> {
        let body_len = 4 + self.value_len();
        if body_len > usize::from(u16::MAX) {
            return Err(WireError::Encode("table feature property exceeds u16 length"));
        }
        w.put_u16(self.prop_type());
        w.put_u16(body_len as u16);
        match self {
            Self::Instructions { types, .. }
            | Self::WriteActions { types, .. }
            | Self::ApplyActions { types, .. } => put_id_list(w, types),
            Self::NextTables { tables, .. } => w.put_slice(tables),
            Self::Match(fields) | Self::Wildcards(fields) => {
                for id in fields {
                    id.encode(w)?;
                }
            },
            Self::WriteSetField { fields, .. } | Self::ApplySetField { fields, .. } => {
                for id in fields {
                    id.encode(w)?;
                }
            },
            Self::Unknown { data, .. } => w.put_slice(data),
        }
        w.align8();
        Ok(())
    }

    fn decode(cur: &mut Cursor<'_>) -> Result<Self> {
        let prop_type = cur.read_u16()?;
        let len = cur.read_u16()? as usize;
        let mut body = cur.subcursor(len, 4)?;

        let prop = match prop_type {
            OFPTFPT_INSTRUCTIONS | OFPTFPT_INSTRUCTIONS_MISS => Self::Instructions {
                stage: if prop_type == OFPTFPT_INSTRUCTIONS { Stage::Regular } else { Stage::Miss },
                types: read_id_list(&mut body)?,
            },
            OFPTFPT_NEXT_TABLES | OFPTFPT_NEXT_TABLES_MISS => Self::NextTables {
                stage: if prop_type == OFPTFPT_NEXT_TABLES { Stage::Regular } else { Stage::Miss },
                tables: body.rest().to_vec(),
            },
            OFPTFPT_WRITE_ACTIONS | OFPTFPT_WRITE_ACTIONS_MISS => Self::WriteActions {
                stage: if prop_type == OFPTFPT_WRITE_ACTIONS { Stage::Regular } else { Stage::Miss },
                types: read_id_list(&mut body)?,
            },
            OFPTFPT_APPLY_ACTIONS | OFPTFPT_APPLY_ACTIONS_MISS => Self::ApplyActions {
                stage: if prop_type == OFPTFPT_APPLY_ACTIONS { Stage::Regular } else { Stage::Miss },
                types: read_id_list(&mut body)?,
            },
            OFPTFPT_MATCH => Self::Match(read_oxm_ids(&mut body)?),
            OFPTFPT_WILDCARDS => Self::Wildcards(read_oxm_ids(&mut body)?),
            OFPTFPT_WRITE_SETFIELD | OFPTFPT_WRITE_SETFIELD_MISS => Self::WriteSetField {
                stage: if prop_type == OFPTFPT_WRITE_SETFIELD {
                    Stage::Regular
                } else {
                    Stage::Miss
                },
                fields: read_oxm_ids(&mut body)?,
            },
            OFPTFPT_APPLY_SETFIELD | OFPTFPT_APPLY_SETFIELD_MISS => Self::ApplySetField {
                stage: if prop_type == OFPTFPT_APPLY_SETFIELD {
                    Stage::Regular
                } else {
                    Stage::Miss
                },
                fields: read_oxm_ids(&mut body)?,
            },
            other => Self::Unknown { prop_type: other, data: body.rest().to_vec() },
        };

        cur.skip_align8()?;
        Ok(prop)
    }
}

/// One table's feature block.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableFeatures {
    /// Table id.
    pub table_id: u8,
    /// Human-readable table name, at most 31 bytes on the wire.
    pub name: String,
    /// Fields whose values the table can match as metadata.
    pub metadata_match: u64,
    /// Metadata bits the table can write.
    pub metadata_write: u64,
    /// Reserved config bits.
    pub config: u32,
    /// Maximum entries.
    pub max_entries: u32,
    /// Capability properties.
    pub properties: Vec<TableFeatureProp>,
}

impl Codec for TableFeatures {
    fn wire_len(&self) -> usize {
        64 + self.properties.iter().map(Codec::wire_len).sum::<usize>()
    }

    fn encode(&self, w: &mut Writer) -> Result<()> {
        let len = self.wire_len();
        if len > usize::from(u16::MAX) {
            return Err(WireError::Encode("table features entry exceeds u16 length"));
        }
        w.put_u16(len as u16);
        w.put_u8(self.table_id);
        w.put_zeros(5);
        put_fixed_name(w, &self.name, 32);
        w.put_u64(self.metadata_match);
        w.put_u64(self.metadata_write);
        w.put_u32(self.config);
        w.put_u32(self.max_entries);
        for prop in &self.properties {
            prop.encode(w)?;
        }
        Ok(())
    }

    fn decode(cur: &mut Cursor<'_>) -> Result<Self> {
        let len = cur.read_u16()? as usize;
        let mut body = cur.subcursor(len, 2)?;
        let table_id = body.read_u8()?;
        body.skip(5)?;
        let name = read_fixed_name(&mut body, 32)?;
        let metadata_match = body.read_u64()?;
        let metadata_write = body.read_u64()?;
        let config = body.read_u32()?;
        let max_entries = body.read_u32()?;
        let mut properties = Vec::new();
        while !body.is_empty() {
            properties.push(TableFeatureProp::decode(&mut body)?);
        }
        Ok(Self { table_id, name, metadata_match, metadata_write, config, max_entries, properties })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowlink_wire::oxm::{CLASS_OPENFLOW_BASIC, consts::basic};
    use flowlink_wire::{decode_from_slice, encode_to_vec};

    #[test]
    fn bare_table_features_is_sixty_four_bytes() {
        let tf = TableFeatures {
            table_id: 10,
            name: "table-10".to_string(),
            max_entries: 100_000,
            ..TableFeatures::default()
        };
        let bytes = encode_to_vec(&tf).unwrap();
        assert_eq!(bytes.len(), 64);
        assert_eq!(decode_from_slice::<TableFeatures>(&bytes).unwrap(), tf);
    }

    #[test]
    fn properties_round_trip() {
        let tf = TableFeatures {
            table_id: 0,
            name: "acl".to_string(),
            properties: vec![
                TableFeatureProp::Instructions { stage: Stage::Regular, types: vec![1, 3, 4] },
                TableFeatureProp::NextTables { stage: Stage::Regular, tables: vec![1, 2, 3] },
                TableFeatureProp::Match(vec![OxmId {
                    class: CLASS_OPENFLOW_BASIC,
                    field: basic::IN_PORT,
                    has_mask: false,
                    length: 4,
                }]),
            ],
            ..TableFeatures::default()
        };
        let bytes = encode_to_vec(&tf).unwrap();
        assert_eq!(bytes.len(), tf.wire_len());
        assert_eq!(bytes.len() % 8, 0);
        assert_eq!(decode_from_slice::<TableFeatures>(&bytes).unwrap(), tf);
    }

    #[test]
    fn unknown_property_preserved() {
        let tf = TableFeatures {
            properties: vec![TableFeatureProp::Unknown { prop_type: 0xFFF0, data: vec![1, 2, 3] }],
            ..TableFeatures::default()
        };
        let bytes = encode_to_vec(&tf).unwrap();
        let back: TableFeatures = decode_from_slice(&bytes).unwrap();
        assert_eq!(back, tf);
    }
}
