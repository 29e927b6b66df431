use byteorder::{LE, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

use super::base::BaseParameter;
use crate::codec::Codec;
use crate::error::Result;
use crate::plugin::{PLUGIN_TYPE_SOURCE, PluginParam, plugin_type};

/// Where a sound's media lives and which codec or source plugin plays it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct BankSourceData {
    pub plugin_id: u32,
    /// 0 = embedded in DATA, 1 = prefetch + stream, 2 = stream.
    pub stream_type: u8,
    pub source_id: u32,
    pub in_memory_media_size: u32,
    pub source_bits: u8,
    /// Parameters of a source plugin (tone generator, silence, ...).
    pub plugin_param: Option<PluginParam>,
}

impl BankSourceData {
    pub fn is_embedded(&self) -> bool {
        self.stream_type == 0
    }

    fn has_plugin_param(plugin_id: u32) -> bool {
        plugin_type(plugin_id) == PLUGIN_TYPE_SOURCE
    }
}

impl Codec for BankSourceData {
    fn read<R: Read>(reader: &mut R, _version: u32) -> Result<Self> {
        let plugin_id = reader.read_u32::<LE>()?;
        let stream_type = reader.read_u8()?;
        let source_id = reader.read_u32::<LE>()?;
        let in_memory_media_size = reader.read_u32::<LE>()?;
        let source_bits = reader.read_u8()?;
        let plugin_param = if Self::has_plugin_param(plugin_id) {
            let size = reader.read_u32::<LE>()?;
            Some(PluginParam::read(reader, plugin_id, size)?)
        } else {
            None
        };
        Ok(BankSourceData {
            plugin_id,
            stream_type,
            source_id,
            in_memory_media_size,
            source_bits,
            plugin_param,
        })
    }

    fn write<W: Write>(&self, writer: &mut W, _version: u32) -> Result<()> {
        writer.write_u32::<LE>(self.plugin_id)?;
        writer.write_u8(self.stream_type)?;
        writer.write_u32::<LE>(self.source_id)?;
        writer.write_u32::<LE>(self.in_memory_media_size)?;
        writer.write_u8(self.source_bits)?;
        if Self::has_plugin_param(self.plugin_id) {
            match &self.plugin_param {
                Some(param) => param.write_sized(writer)?,
                None => PluginParam::default().write_sized(writer)?,
            }
        }
        Ok(())
    }
}

/// HIRC sound object (type 2).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Sound {
    pub id: u32,
    pub source: BankSourceData,
    pub base: BaseParameter,
}

impl Codec for Sound {
    fn read<R: Read>(reader: &mut R, version: u32) -> Result<Self> {
        Ok(Sound {
            id: reader.read_u32::<LE>()?,
            source: BankSourceData::read(reader, version)?,
            base: BaseParameter::read(reader, version)?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W, version: u32) -> Result<()> {
        writer.write_u32::<LE>(self.id)?;
        self.source.write(writer, version)?;
        self.base.write(writer, version)
    }
}
