use byteorder::{LE, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

use super::base::{
    AuxParams, FxList, FxMetadata, InitialRtpc, Positioning, StateChunk, read_fx_metadata,
    write_fx_metadata,
};
use crate::codec::{Codec, count_u32, read_gated_u8, read_list, write_gated_u8, write_list};
use crate::error::Result;
use crate::props::PropBundle;
use crate::version::has_attachment_override;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct DuckInfo {
    pub bus_id: u32,
    pub duck_volume: f32,
    pub fade_out_time: i32,
    pub fade_in_time: i32,
    pub fade_curve: u8,
    pub target_prop: u8,
}

impl Codec for DuckInfo {
    fn read<R: Read>(reader: &mut R, _version: u32) -> Result<Self> {
        Ok(DuckInfo {
            bus_id: reader.read_u32::<LE>()?,
            duck_volume: reader.read_f32::<LE>()?,
            fade_out_time: reader.read_i32::<LE>()?,
            fade_in_time: reader.read_i32::<LE>()?,
            fade_curve: reader.read_u8()?,
            target_prop: reader.read_u8()?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W, _version: u32) -> Result<()> {
        writer.write_u32::<LE>(self.bus_id)?;
        writer.write_f32::<LE>(self.duck_volume)?;
        writer.write_i32::<LE>(self.fade_out_time)?;
        writer.write_i32::<LE>(self.fade_in_time)?;
        writer.write_u8(self.fade_curve)?;
        writer.write_u8(self.target_prop)?;
        Ok(())
    }
}

/// HIRC bus (type 8) and aux bus (type 18); both share this layout.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Bus {
    pub id: u32,
    pub override_bus_id: u32,
    /// Audio device share set of a top-level bus, version 126 onwards.
    pub device_shareset_id: Option<u32>,
    pub props: PropBundle,
    pub positioning: Positioning,
    pub aux: AuxParams,
    pub bits: u8,
    pub max_num_instance: u16,
    pub channel_config: u32,
    pub bits_hdr: u8,
    pub recovery_time: i32,
    pub max_duck_volume: f32,
    pub ducks: Vec<DuckInfo>,
    pub fx: FxList,
    pub mixer_fx_id: u32,
    pub mixer_is_share_set: u8,
    pub fx_metadata: Option<FxMetadata>,
    pub override_attachment_params: Option<u8>,
    pub rtpcs: InitialRtpc,
    pub states: StateChunk,
}

impl Bus {
    fn has_device_shareset(override_bus_id: u32, version: u32) -> bool {
        override_bus_id == 0 && version >= 126
    }
}

impl Codec for Bus {
    fn read<R: Read>(reader: &mut R, version: u32) -> Result<Self> {
        let id = reader.read_u32::<LE>()?;
        let override_bus_id = reader.read_u32::<LE>()?;
        let device_shareset_id = if Self::has_device_shareset(override_bus_id, version) {
            Some(reader.read_u32::<LE>()?)
        } else {
            None
        };
        let props = PropBundle::read(reader, version)?;
        let positioning = Positioning::read(reader, version)?;
        let aux = AuxParams::read(reader, version)?;
        let bits = reader.read_u8()?;
        let max_num_instance = reader.read_u16::<LE>()?;
        let channel_config = reader.read_u32::<LE>()?;
        let bits_hdr = reader.read_u8()?;
        let recovery_time = reader.read_i32::<LE>()?;
        let max_duck_volume = reader.read_f32::<LE>()?;
        let duck_count = reader.read_u32::<LE>()? as usize;
        let ducks = read_list(reader, duck_count, version)?;
        let fx = FxList::read(reader, version)?;
        let mixer_fx_id = reader.read_u32::<LE>()?;
        let mixer_is_share_set = reader.read_u8()?;
        let fx_metadata = read_fx_metadata(reader, version)?;
        let override_attachment_params = read_gated_u8(reader, has_attachment_override(version))?;
        let rtpcs = InitialRtpc::read(reader, version)?;
        let states = StateChunk::read(reader, version)?;

        Ok(Bus {
            id,
            override_bus_id,
            device_shareset_id,
            props,
            positioning,
            aux,
            bits,
            max_num_instance,
            channel_config,
            bits_hdr,
            recovery_time,
            max_duck_volume,
            ducks,
            fx,
            mixer_fx_id,
            mixer_is_share_set,
            fx_metadata,
            override_attachment_params,
            rtpcs,
            states,
        })
    }

    fn write<W: Write>(&self, writer: &mut W, version: u32) -> Result<()> {
        writer.write_u32::<LE>(self.id)?;
        writer.write_u32::<LE>(self.override_bus_id)?;
        if Self::has_device_shareset(self.override_bus_id, version) {
            writer.write_u32::<LE>(self.device_shareset_id.unwrap_or_default())?;
        }
        self.props.write(writer, version)?;
        self.positioning.write(writer, version)?;
        self.aux.write(writer, version)?;
        writer.write_u8(self.bits)?;
        writer.write_u16::<LE>(self.max_num_instance)?;
        writer.write_u32::<LE>(self.channel_config)?;
        writer.write_u8(self.bits_hdr)?;
        writer.write_i32::<LE>(self.recovery_time)?;
        writer.write_f32::<LE>(self.max_duck_volume)?;
        writer.write_u32::<LE>(count_u32(self.ducks.len(), "ducks")?)?;
        write_list(writer, &self.ducks, version)?;
        self.fx.write(writer, version)?;
        writer.write_u32::<LE>(self.mixer_fx_id)?;
        writer.write_u8(self.mixer_is_share_set)?;
        write_fx_metadata(writer, &self.fx_metadata, version)?;
        write_gated_u8(
            writer,
            has_attachment_override(version),
            self.override_attachment_params,
        )?;
        self.rtpcs.write(writer, version)?;
        self.states.write(writer, version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_device_shareset_only_on_top_level_bus() {
        let master = Bus {
            id: 1,
            override_bus_id: 0,
            device_shareset_id: Some(0xDEAD),
            ..Default::default()
        };
        let child = Bus {
            id: 2,
            override_bus_id: 1,
            ..Default::default()
        };

        let mut master_bytes = Vec::new();
        master.write(&mut master_bytes, 141).unwrap();
        let mut child_bytes = Vec::new();
        child.write(&mut child_bytes, 141).unwrap();
        assert_eq!(master_bytes.len(), child_bytes.len() + 4);

        let decoded = Bus::read(&mut Cursor::new(&master_bytes), 141).unwrap();
        assert_eq!(decoded.device_shareset_id, Some(0xDEAD));

        let mut old = Vec::new();
        master.write(&mut old, 125).unwrap();
        let decoded = Bus::read(&mut Cursor::new(&old), 125).unwrap();
        assert_eq!(decoded.device_shareset_id, None);
    }
}
