use byteorder::{LE, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

use crate::codec::{Codec, count_u16, count_u32};
use crate::error::Result;
use crate::version::uses_var_counts;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct StateProp {
    pub property_id: u32,
    pub value: f32,
}

/// HIRC state (type 1): property overrides applied while a state is active.
///
/// From version 123 the table is `u16 count`, the `u16` IDs, then the values;
/// before that, `u32 count` of interleaved `u32 id, f32 value` pairs.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct State {
    pub id: u32,
    pub props: Vec<StateProp>,
}

impl Codec for State {
    fn read<R: Read>(reader: &mut R, version: u32) -> Result<Self> {
        let id = reader.read_u32::<LE>()?;
        let mut props = Vec::new();
        if uses_var_counts(version) {
            let count = reader.read_u16::<LE>()? as usize;
            props.reserve(count);
            for _ in 0..count {
                props.push(StateProp {
                    property_id: reader.read_u16::<LE>()? as u32,
                    value: 0.0,
                });
            }
            for prop in props.iter_mut() {
                prop.value = reader.read_f32::<LE>()?;
            }
        } else {
            let count = reader.read_u32::<LE>()? as usize;
            props.reserve(count.min(256));
            for _ in 0..count {
                props.push(StateProp {
                    property_id: reader.read_u32::<LE>()?,
                    value: reader.read_f32::<LE>()?,
                });
            }
        }
        Ok(State { id, props })
    }

    fn write<W: Write>(&self, writer: &mut W, version: u32) -> Result<()> {
        writer.write_u32::<LE>(self.id)?;
        if uses_var_counts(version) {
            writer.write_u16::<LE>(count_u16(self.props.len(), "state properties")?)?;
            for prop in &self.props {
                let pid = count_u16(prop.property_id as usize, "state property id")?;
                writer.write_u16::<LE>(pid)?;
            }
            for prop in &self.props {
                writer.write_f32::<LE>(prop.value)?;
            }
        } else {
            writer.write_u32::<LE>(count_u32(self.props.len(), "state properties")?)?;
            for prop in &self.props {
                writer.write_u32::<LE>(prop.property_id)?;
                writer.write_f32::<LE>(prop.value)?;
            }
        }
        Ok(())
    }
}
