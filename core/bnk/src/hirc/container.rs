//! Actor-mixer hierarchy containers.

use byteorder::{LE, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

use super::base::{BaseParameter, Children, InitialRtpc};
use crate::codec::{
    Codec, GraphPoint, count_u16, count_u32, read_ids, read_list, write_ids, write_list,
};
use crate::error::Result;

/// HIRC actor-mixer (type 7).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct ActorMixer {
    pub id: u32,
    pub base: BaseParameter,
    pub children: Children,
}

impl Codec for ActorMixer {
    fn read<R: Read>(reader: &mut R, version: u32) -> Result<Self> {
        Ok(ActorMixer {
            id: reader.read_u32::<LE>()?,
            base: BaseParameter::read(reader, version)?,
            children: Children::read(reader, version)?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W, version: u32) -> Result<()> {
        writer.write_u32::<LE>(self.id)?;
        self.base.write(writer, version)?;
        self.children.write(writer, version)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct PlayListSetting {
    pub loop_count: u16,
    pub loop_mod_min: u16,
    pub loop_mod_max: u16,
    pub transition_time: f32,
    pub transition_time_mod_min: f32,
    pub transition_time_mod_max: f32,
    pub avoid_repeat_count: u16,
    pub transition_mode: u8,
    pub random_mode: u8,
    pub mode: u8,
    pub bits: u8,
}

impl Codec for PlayListSetting {
    fn read<R: Read>(reader: &mut R, _version: u32) -> Result<Self> {
        Ok(PlayListSetting {
            loop_count: reader.read_u16::<LE>()?,
            loop_mod_min: reader.read_u16::<LE>()?,
            loop_mod_max: reader.read_u16::<LE>()?,
            transition_time: reader.read_f32::<LE>()?,
            transition_time_mod_min: reader.read_f32::<LE>()?,
            transition_time_mod_max: reader.read_f32::<LE>()?,
            avoid_repeat_count: reader.read_u16::<LE>()?,
            transition_mode: reader.read_u8()?,
            random_mode: reader.read_u8()?,
            mode: reader.read_u8()?,
            bits: reader.read_u8()?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W, _version: u32) -> Result<()> {
        writer.write_u16::<LE>(self.loop_count)?;
        writer.write_u16::<LE>(self.loop_mod_min)?;
        writer.write_u16::<LE>(self.loop_mod_max)?;
        writer.write_f32::<LE>(self.transition_time)?;
        writer.write_f32::<LE>(self.transition_time_mod_min)?;
        writer.write_f32::<LE>(self.transition_time_mod_max)?;
        writer.write_u16::<LE>(self.avoid_repeat_count)?;
        writer.write_u8(self.transition_mode)?;
        writer.write_u8(self.random_mode)?;
        writer.write_u8(self.mode)?;
        writer.write_u8(self.bits)?;
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlaylistItem {
    pub play_id: u32,
    pub weight: i32,
}

impl Codec for PlaylistItem {
    fn read<R: Read>(reader: &mut R, _version: u32) -> Result<Self> {
        Ok(PlaylistItem {
            play_id: reader.read_u32::<LE>()?,
            weight: reader.read_i32::<LE>()?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W, _version: u32) -> Result<()> {
        writer.write_u32::<LE>(self.play_id)?;
        writer.write_i32::<LE>(self.weight)?;
        Ok(())
    }
}

/// HIRC random/sequence container (type 5).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct RanSeqCntr {
    pub id: u32,
    pub base: BaseParameter,
    pub settings: PlayListSetting,
    pub children: Children,
    pub playlist: Vec<PlaylistItem>,
}

impl Codec for RanSeqCntr {
    fn read<R: Read>(reader: &mut R, version: u32) -> Result<Self> {
        let id = reader.read_u32::<LE>()?;
        let base = BaseParameter::read(reader, version)?;
        let settings = PlayListSetting::read(reader, version)?;
        let children = Children::read(reader, version)?;
        let count = reader.read_u16::<LE>()? as usize;
        Ok(RanSeqCntr {
            id,
            base,
            settings,
            children,
            playlist: read_list(reader, count, version)?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W, version: u32) -> Result<()> {
        writer.write_u32::<LE>(self.id)?;
        self.base.write(writer, version)?;
        self.settings.write(writer, version)?;
        self.children.write(writer, version)?;
        writer.write_u16::<LE>(count_u16(self.playlist.len(), "playlist")?)?;
        write_list(writer, &self.playlist, version)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct SwitchGroup {
    pub switch_id: u32,
    pub node_ids: Vec<u32>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SwitchNodeParams {
    pub node_id: u32,
    pub bits: u8,
    pub bits_mode: u8,
    pub fade_out_time: i32,
    pub fade_in_time: i32,
}

impl Codec for SwitchNodeParams {
    fn read<R: Read>(reader: &mut R, _version: u32) -> Result<Self> {
        Ok(SwitchNodeParams {
            node_id: reader.read_u32::<LE>()?,
            bits: reader.read_u8()?,
            bits_mode: reader.read_u8()?,
            fade_out_time: reader.read_i32::<LE>()?,
            fade_in_time: reader.read_i32::<LE>()?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W, _version: u32) -> Result<()> {
        writer.write_u32::<LE>(self.node_id)?;
        writer.write_u8(self.bits)?;
        writer.write_u8(self.bits_mode)?;
        writer.write_i32::<LE>(self.fade_out_time)?;
        writer.write_i32::<LE>(self.fade_in_time)?;
        Ok(())
    }
}

/// HIRC switch container (type 6).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct SwitchCntr {
    pub id: u32,
    pub base: BaseParameter,
    pub group_type: u8,
    pub group_id: u32,
    pub default_switch: u32,
    pub is_continuous_validation: u8,
    pub children: Children,
    pub switch_groups: Vec<SwitchGroup>,
    pub switch_params: Vec<SwitchNodeParams>,
}

impl Codec for SwitchCntr {
    fn read<R: Read>(reader: &mut R, version: u32) -> Result<Self> {
        let id = reader.read_u32::<LE>()?;
        let base = BaseParameter::read(reader, version)?;
        let group_type = reader.read_u8()?;
        let group_id = reader.read_u32::<LE>()?;
        let default_switch = reader.read_u32::<LE>()?;
        let is_continuous_validation = reader.read_u8()?;
        let children = Children::read(reader, version)?;

        let group_count = reader.read_u32::<LE>()? as usize;
        let mut switch_groups = Vec::with_capacity(group_count.min(256));
        for _ in 0..group_count {
            let switch_id = reader.read_u32::<LE>()?;
            let count = reader.read_u32::<LE>()? as usize;
            switch_groups.push(SwitchGroup {
                switch_id,
                node_ids: read_ids(reader, count)?,
            });
        }
        let param_count = reader.read_u32::<LE>()? as usize;
        Ok(SwitchCntr {
            id,
            base,
            group_type,
            group_id,
            default_switch,
            is_continuous_validation,
            children,
            switch_groups,
            switch_params: read_list(reader, param_count, version)?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W, version: u32) -> Result<()> {
        writer.write_u32::<LE>(self.id)?;
        self.base.write(writer, version)?;
        writer.write_u8(self.group_type)?;
        writer.write_u32::<LE>(self.group_id)?;
        writer.write_u32::<LE>(self.default_switch)?;
        writer.write_u8(self.is_continuous_validation)?;
        self.children.write(writer, version)?;

        writer.write_u32::<LE>(count_u32(self.switch_groups.len(), "switch groups")?)?;
        for group in &self.switch_groups {
            writer.write_u32::<LE>(group.switch_id)?;
            writer.write_u32::<LE>(count_u32(group.node_ids.len(), "switch group nodes")?)?;
            write_ids(writer, &group.node_ids)?;
        }
        writer.write_u32::<LE>(count_u32(self.switch_params.len(), "switch params")?)?;
        write_list(writer, &self.switch_params, version)
    }
}

/// Crossfade curve of one child over the layer's game parameter.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct LayerAssociation {
    pub child_id: u32,
    pub curve: Vec<GraphPoint>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Layer {
    pub layer_id: u32,
    pub rtpcs: InitialRtpc,
    pub rtpc_id: u32,
    pub rtpc_type: u8,
    pub associations: Vec<LayerAssociation>,
}

impl Codec for Layer {
    fn read<R: Read>(reader: &mut R, version: u32) -> Result<Self> {
        let layer_id = reader.read_u32::<LE>()?;
        let rtpcs = InitialRtpc::read(reader, version)?;
        let rtpc_id = reader.read_u32::<LE>()?;
        let rtpc_type = reader.read_u8()?;
        let count = reader.read_u32::<LE>()? as usize;
        let mut associations = Vec::with_capacity(count.min(256));
        for _ in 0..count {
            let child_id = reader.read_u32::<LE>()?;
            let points = reader.read_u32::<LE>()? as usize;
            associations.push(LayerAssociation {
                child_id,
                curve: read_list(reader, points, version)?,
            });
        }
        Ok(Layer {
            layer_id,
            rtpcs,
            rtpc_id,
            rtpc_type,
            associations,
        })
    }

    fn write<W: Write>(&self, writer: &mut W, version: u32) -> Result<()> {
        writer.write_u32::<LE>(self.layer_id)?;
        self.rtpcs.write(writer, version)?;
        writer.write_u32::<LE>(self.rtpc_id)?;
        writer.write_u8(self.rtpc_type)?;
        writer.write_u32::<LE>(count_u32(self.associations.len(), "layer associations")?)?;
        for assoc in &self.associations {
            writer.write_u32::<LE>(assoc.child_id)?;
            writer.write_u32::<LE>(count_u32(assoc.curve.len(), "crossfade points")?)?;
            write_list(writer, &assoc.curve, version)?;
        }
        Ok(())
    }
}

/// HIRC blend (layer) container (type 9).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct LayerCntr {
    pub id: u32,
    pub base: BaseParameter,
    pub children: Children,
    pub layers: Vec<Layer>,
    pub is_continuous_validation: u8,
}

impl Codec for LayerCntr {
    fn read<R: Read>(reader: &mut R, version: u32) -> Result<Self> {
        let id = reader.read_u32::<LE>()?;
        let base = BaseParameter::read(reader, version)?;
        let children = Children::read(reader, version)?;
        let count = reader.read_u32::<LE>()? as usize;
        Ok(LayerCntr {
            id,
            base,
            children,
            layers: read_list(reader, count, version)?,
            is_continuous_validation: reader.read_u8()?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W, version: u32) -> Result<()> {
        writer.write_u32::<LE>(self.id)?;
        self.base.write(writer, version)?;
        self.children.write(writer, version)?;
        writer.write_u32::<LE>(count_u32(self.layers.len(), "layers")?)?;
        write_list(writer, &self.layers, version)?;
        writer.write_u8(self.is_continuous_validation)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_switch_container_round_trip() {
        let cntr = SwitchCntr {
            id: 10,
            group_type: 1,
            group_id: 20,
            default_switch: 21,
            children: Children(vec![100, 101]),
            switch_groups: vec![SwitchGroup {
                switch_id: 21,
                node_ids: vec![100],
            }],
            switch_params: vec![SwitchNodeParams {
                node_id: 100,
                fade_in_time: 250,
                ..Default::default()
            }],
            ..Default::default()
        };
        let mut out = Vec::new();
        cntr.write(&mut out, 150).unwrap();
        let mut cursor = Cursor::new(&out);
        let decoded = SwitchCntr::read(&mut cursor, 150).unwrap();
        assert_eq!(cursor.position() as usize, out.len());
        assert_eq!(decoded.switch_groups, cntr.switch_groups);
        assert_eq!(decoded.switch_params, cntr.switch_params);
        assert_eq!(decoded.children, cntr.children);
    }

    #[test]
    fn test_layer_container_round_trip() {
        let cntr = LayerCntr {
            id: 11,
            children: Children(vec![5]),
            layers: vec![Layer {
                layer_id: 3,
                rtpc_id: 77,
                associations: vec![LayerAssociation {
                    child_id: 5,
                    curve: vec![
                        GraphPoint {
                            from: 0.0,
                            to: 0.0,
                            interp: 4,
                        },
                        GraphPoint {
                            from: 100.0,
                            to: 1.0,
                            interp: 4,
                        },
                    ],
                }],
                ..Default::default()
            }],
            is_continuous_validation: 1,
            ..Default::default()
        };
        let mut out = Vec::new();
        cntr.write(&mut out, 135).unwrap();
        let decoded = LayerCntr::read(&mut Cursor::new(&out), 135).unwrap();
        assert_eq!(decoded.layers[0].associations[0].curve.len(), 2);
        let mut again = Vec::new();
        decoded.write(&mut again, 135).unwrap();
        assert_eq!(again, out);
    }
}
