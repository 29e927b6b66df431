use byteorder::{LE, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use utils::{BinReadExt, BinWriteExt};

use super::base::{InitialRtpc, StateChunk};
use crate::codec::{Codec, count_u8, count_u16};
use crate::error::Result;
use crate::plugin::PluginParam;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FxMediaRef {
    pub index: u8,
    pub source_id: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct FxPropertyValue {
    pub property_id: u32,
    pub accum_type: u8,
    pub value: f32,
}

/// HIRC effect share set (type 16) and custom effect (type 17).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct FxBase {
    pub id: u32,
    pub plugin_id: u32,
    pub params: PluginParam,
    pub media: Vec<FxMediaRef>,
    pub rtpcs: InitialRtpc,
    /// Version 126 onwards.
    pub states: Option<StateChunk>,
    /// Version 128 onwards.
    pub property_values: Option<Vec<FxPropertyValue>>,
}

impl Codec for FxBase {
    fn read<R: Read>(reader: &mut R, version: u32) -> Result<Self> {
        let id = reader.read_u32::<LE>()?;
        let plugin_id = reader.read_u32::<LE>()?;
        let size = reader.read_u32::<LE>()?;
        let params = PluginParam::read(reader, plugin_id, size)?;

        let media_count = reader.read_u8()? as usize;
        let mut media = Vec::with_capacity(media_count);
        for _ in 0..media_count {
            media.push(FxMediaRef {
                index: reader.read_u8()?,
                source_id: reader.read_u32::<LE>()?,
            });
        }
        let rtpcs = InitialRtpc::read(reader, version)?;
        let states = if version >= 126 {
            Some(StateChunk::read(reader, version)?)
        } else {
            None
        };
        let property_values = if version >= 128 {
            let count = reader.read_u16::<LE>()? as usize;
            let mut values = Vec::with_capacity(count.min(256));
            for _ in 0..count {
                values.push(FxPropertyValue {
                    property_id: reader.read_var_u32()?,
                    accum_type: reader.read_u8()?,
                    value: reader.read_f32::<LE>()?,
                });
            }
            Some(values)
        } else {
            None
        };

        Ok(FxBase {
            id,
            plugin_id,
            params,
            media,
            rtpcs,
            states,
            property_values,
        })
    }

    fn write<W: Write>(&self, writer: &mut W, version: u32) -> Result<()> {
        writer.write_u32::<LE>(self.id)?;
        writer.write_u32::<LE>(self.plugin_id)?;
        self.params.write_sized(writer)?;
        writer.write_u8(count_u8(self.media.len(), "FX media")?)?;
        for media in &self.media {
            writer.write_u8(media.index)?;
            writer.write_u32::<LE>(media.source_id)?;
        }
        self.rtpcs.write(writer, version)?;
        if version >= 126 {
            match &self.states {
                Some(states) => states.write(writer, version)?,
                None => StateChunk::default().write(writer, version)?,
            }
        }
        if version >= 128 {
            let values = self.property_values.as_deref().unwrap_or_default();
            writer.write_u16::<LE>(count_u16(values.len(), "FX property values")?)?;
            for value in values {
                writer.write_var_u32(value.property_id)?;
                writer.write_u8(value.accum_type)?;
                writer.write_f32::<LE>(value.value)?;
            }
        }
        Ok(())
    }
}
