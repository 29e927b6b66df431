//! Sub-structures shared by most hierarchy objects.

use byteorder::{LE, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use utils::{BinReadExt, BinWriteExt};

use crate::codec::{
    Codec, GraphPoint, count_u8, count_u16, count_u32, read_gated_u8, read_gated_u32, read_id_list,
    read_list, read_var_count, write_gated_u8, write_gated_u32, write_id_list, write_list,
    write_var_count,
};
use crate::error::Result;
use crate::props::{PropBundle, RangePropBundle};
use crate::version::{
    has_attachment_override, has_fx_metadata, has_reflections_aux, uses_var_counts,
};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FxChunkItem {
    pub fx_index: u8,
    pub fx_id: u32,
    pub is_share_set: u8,
    pub is_rendered: u8,
}

impl Codec for FxChunkItem {
    fn read<R: Read>(reader: &mut R, _version: u32) -> Result<Self> {
        Ok(FxChunkItem {
            fx_index: reader.read_u8()?,
            fx_id: reader.read_u32::<LE>()?,
            is_share_set: reader.read_u8()?,
            is_rendered: reader.read_u8()?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W, _version: u32) -> Result<()> {
        writer.write_u8(self.fx_index)?;
        writer.write_u32::<LE>(self.fx_id)?;
        writer.write_u8(self.is_share_set)?;
        writer.write_u8(self.is_rendered)?;
        Ok(())
    }
}

/// Effect slots: `u8 count`, a bypass bit field when `count > 0`, then the slots.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct FxList {
    pub bypass_bits: u8,
    pub items: Vec<FxChunkItem>,
}

impl Codec for FxList {
    fn read<R: Read>(reader: &mut R, version: u32) -> Result<Self> {
        let count = reader.read_u8()? as usize;
        let bypass_bits = if count > 0 { reader.read_u8()? } else { 0 };
        Ok(FxList {
            bypass_bits,
            items: read_list(reader, count, version)?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W, version: u32) -> Result<()> {
        writer.write_u8(count_u8(self.items.len(), "FX slots")?)?;
        if !self.items.is_empty() {
            writer.write_u8(self.bypass_bits)?;
        }
        write_list(writer, &self.items, version)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct FxChunk {
    pub is_override_parent_fx: u8,
    pub fx: FxList,
}

impl Codec for FxChunk {
    fn read<R: Read>(reader: &mut R, version: u32) -> Result<Self> {
        Ok(FxChunk {
            is_override_parent_fx: reader.read_u8()?,
            fx: FxList::read(reader, version)?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W, version: u32) -> Result<()> {
        writer.write_u8(self.is_override_parent_fx)?;
        self.fx.write(writer, version)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FxMetadataItem {
    pub fx_index: u8,
    pub fx_id: u32,
    pub is_share_set: u8,
}

impl Codec for FxMetadataItem {
    fn read<R: Read>(reader: &mut R, _version: u32) -> Result<Self> {
        Ok(FxMetadataItem {
            fx_index: reader.read_u8()?,
            fx_id: reader.read_u32::<LE>()?,
            is_share_set: reader.read_u8()?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W, _version: u32) -> Result<()> {
        writer.write_u8(self.fx_index)?;
        writer.write_u32::<LE>(self.fx_id)?;
        writer.write_u8(self.is_share_set)?;
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct FxMetadata {
    pub is_override_parent_metadata: u8,
    pub items: Vec<FxMetadataItem>,
}

impl Codec for FxMetadata {
    fn read<R: Read>(reader: &mut R, version: u32) -> Result<Self> {
        let is_override_parent_metadata = reader.read_u8()?;
        let count = reader.read_u8()? as usize;
        Ok(FxMetadata {
            is_override_parent_metadata,
            items: read_list(reader, count, version)?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W, version: u32) -> Result<()> {
        writer.write_u8(self.is_override_parent_metadata)?;
        writer.write_u8(count_u8(self.items.len(), "FX metadata")?)?;
        write_list(writer, &self.items, version)
    }
}

pub(crate) fn read_fx_metadata<R: Read>(
    reader: &mut R,
    version: u32,
) -> Result<Option<FxMetadata>> {
    if has_fx_metadata(version) {
        Ok(Some(FxMetadata::read(reader, version)?))
    } else {
        Ok(None)
    }
}

pub(crate) fn write_fx_metadata<W: Write>(
    writer: &mut W,
    metadata: &Option<FxMetadata>,
    version: u32,
) -> Result<()> {
    if has_fx_metadata(version) {
        match metadata {
            Some(metadata) => metadata.write(writer, version)?,
            None => FxMetadata::default().write(writer, version)?,
        }
    }
    Ok(())
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct PathVertex {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub duration: i32,
}

impl Codec for PathVertex {
    fn read<R: Read>(reader: &mut R, _version: u32) -> Result<Self> {
        Ok(PathVertex {
            x: reader.read_f32::<LE>()?,
            y: reader.read_f32::<LE>()?,
            z: reader.read_f32::<LE>()?,
            duration: reader.read_i32::<LE>()?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W, _version: u32) -> Result<()> {
        writer.write_f32::<LE>(self.x)?;
        writer.write_f32::<LE>(self.y)?;
        writer.write_f32::<LE>(self.z)?;
        writer.write_i32::<LE>(self.duration)?;
        Ok(())
    }
}

/// One path of a 3D automation: a run of vertices plus its random range.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct PathItem {
    pub vertices_offset: u32,
    pub num_vertices: u32,
    pub range_x: f32,
    pub range_y: f32,
    pub range_z: f32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct PathAutomation {
    pub path_mode: u8,
    pub transition_time: i32,
    pub vertices: Vec<PathVertex>,
    pub items: Vec<PathItem>,
}

impl Codec for PathAutomation {
    fn read<R: Read>(reader: &mut R, version: u32) -> Result<Self> {
        let path_mode = reader.read_u8()?;
        let transition_time = reader.read_i32::<LE>()?;
        let num_vertices = reader.read_u32::<LE>()? as usize;
        let vertices = read_list(reader, num_vertices, version)?;
        let num_items = reader.read_u32::<LE>()? as usize;
        let mut items = Vec::with_capacity(num_items.min(256));
        for _ in 0..num_items {
            items.push(PathItem {
                vertices_offset: reader.read_u32::<LE>()?,
                num_vertices: reader.read_u32::<LE>()?,
                ..Default::default()
            });
        }
        // Ranges are stored as a second array after all items.
        for item in items.iter_mut() {
            item.range_x = reader.read_f32::<LE>()?;
            item.range_y = reader.read_f32::<LE>()?;
            item.range_z = reader.read_f32::<LE>()?;
        }
        Ok(PathAutomation {
            path_mode,
            transition_time,
            vertices,
            items,
        })
    }

    fn write<W: Write>(&self, writer: &mut W, version: u32) -> Result<()> {
        writer.write_u8(self.path_mode)?;
        writer.write_i32::<LE>(self.transition_time)?;
        writer.write_u32::<LE>(count_u32(self.vertices.len(), "path vertices")?)?;
        write_list(writer, &self.vertices, version)?;
        writer.write_u32::<LE>(count_u32(self.items.len(), "path items")?)?;
        for item in &self.items {
            writer.write_u32::<LE>(item.vertices_offset)?;
            writer.write_u32::<LE>(item.num_vertices)?;
        }
        for item in &self.items {
            writer.write_f32::<LE>(item.range_x)?;
            writer.write_f32::<LE>(item.range_y)?;
            writer.write_f32::<LE>(item.range_z)?;
        }
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Positioning {
    pub bits: u8,
    /// Present when bit 1 of `bits` is set.
    pub bits_3d: Option<u8>,
    /// Present when the 3D position type in `bits` is not "emitter".
    pub automation: Option<PathAutomation>,
}

impl Positioning {
    pub fn has_listener_relative_routing(bits: u8) -> bool {
        bits & 0x02 != 0
    }

    pub fn has_automation(bits: u8) -> bool {
        (bits >> 5) & 0x03 != 0
    }
}

impl Codec for Positioning {
    fn read<R: Read>(reader: &mut R, version: u32) -> Result<Self> {
        let bits = reader.read_u8()?;
        let bits_3d = read_gated_u8(reader, Self::has_listener_relative_routing(bits))?;
        let automation = if Self::has_automation(bits) {
            Some(PathAutomation::read(reader, version)?)
        } else {
            None
        };
        Ok(Positioning {
            bits,
            bits_3d,
            automation,
        })
    }

    fn write<W: Write>(&self, writer: &mut W, version: u32) -> Result<()> {
        writer.write_u8(self.bits)?;
        write_gated_u8(
            writer,
            Self::has_listener_relative_routing(self.bits),
            self.bits_3d,
        )?;
        if Self::has_automation(self.bits) {
            match &self.automation {
                Some(automation) => automation.write(writer, version)?,
                None => PathAutomation::default().write(writer, version)?,
            }
        }
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct AuxParams {
    pub bits: u8,
    /// Four user aux sends, present when bit 3 of `bits` is set.
    pub aux_ids: Option<[u32; 4]>,
    /// Version 135 onwards.
    pub reflections_aux_bus: Option<u32>,
}

impl AuxParams {
    pub fn has_aux(bits: u8) -> bool {
        bits & 0x08 != 0
    }
}

impl Codec for AuxParams {
    fn read<R: Read>(reader: &mut R, version: u32) -> Result<Self> {
        let bits = reader.read_u8()?;
        let aux_ids = if Self::has_aux(bits) {
            let mut ids = [0u32; 4];
            for id in ids.iter_mut() {
                *id = reader.read_u32::<LE>()?;
            }
            Some(ids)
        } else {
            None
        };
        Ok(AuxParams {
            bits,
            aux_ids,
            reflections_aux_bus: read_gated_u32(reader, has_reflections_aux(version))?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W, version: u32) -> Result<()> {
        writer.write_u8(self.bits)?;
        if Self::has_aux(self.bits) {
            for id in self.aux_ids.unwrap_or_default() {
                writer.write_u32::<LE>(id)?;
            }
        }
        write_gated_u32(writer, has_reflections_aux(version), self.reflections_aux_bus)
    }
}

/// Playback instance limits and virtual voice behavior.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AdvSettings {
    pub bits: u8,
    pub virtual_queue_behavior: u8,
    pub max_num_instance: u16,
    pub below_threshold_behavior: u8,
    pub bits_hdr: u8,
}

impl Codec for AdvSettings {
    fn read<R: Read>(reader: &mut R, _version: u32) -> Result<Self> {
        Ok(AdvSettings {
            bits: reader.read_u8()?,
            virtual_queue_behavior: reader.read_u8()?,
            max_num_instance: reader.read_u16::<LE>()?,
            below_threshold_behavior: reader.read_u8()?,
            bits_hdr: reader.read_u8()?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W, _version: u32) -> Result<()> {
        writer.write_u8(self.bits)?;
        writer.write_u8(self.virtual_queue_behavior)?;
        writer.write_u16::<LE>(self.max_num_instance)?;
        writer.write_u8(self.below_threshold_behavior)?;
        writer.write_u8(self.bits_hdr)?;
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatePropInfo {
    pub property_id: u32,
    pub accum_type: u8,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StateRef {
    pub state_id: u32,
    pub state_instance_id: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct StateGroup {
    pub group_id: u32,
    pub sync_type: u8,
    pub states: Vec<StateRef>,
}

/// State group assignments. Counts are varints from version 123, and the
/// state property table only exists from then on.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct StateChunk {
    pub props: Vec<StatePropInfo>,
    pub groups: Vec<StateGroup>,
}

impl Codec for StateChunk {
    fn read<R: Read>(reader: &mut R, version: u32) -> Result<Self> {
        let var = uses_var_counts(version);
        let mut props = Vec::new();
        if var {
            let count = reader.read_var_u32()? as usize;
            props.reserve(count.min(256));
            for _ in 0..count {
                props.push(StatePropInfo {
                    property_id: reader.read_var_u32()?,
                    accum_type: reader.read_u8()?,
                });
            }
        }

        let group_count = read_var_count(reader, version)?;
        let mut groups = Vec::with_capacity(group_count.min(256));
        for _ in 0..group_count {
            let group_id = reader.read_u32::<LE>()?;
            let sync_type = reader.read_u8()?;
            let state_count = if var {
                reader.read_var_u32()? as usize
            } else {
                reader.read_u16::<LE>()? as usize
            };
            let mut states = Vec::with_capacity(state_count.min(256));
            for _ in 0..state_count {
                states.push(StateRef {
                    state_id: reader.read_u32::<LE>()?,
                    state_instance_id: reader.read_u32::<LE>()?,
                });
            }
            groups.push(StateGroup {
                group_id,
                sync_type,
                states,
            });
        }
        Ok(StateChunk { props, groups })
    }

    fn write<W: Write>(&self, writer: &mut W, version: u32) -> Result<()> {
        let var = uses_var_counts(version);
        if var {
            write_var_count(writer, self.props.len(), version, "state properties")?;
            for prop in &self.props {
                writer.write_var_u32(prop.property_id)?;
                writer.write_u8(prop.accum_type)?;
            }
        }
        write_var_count(writer, self.groups.len(), version, "state groups")?;
        for group in &self.groups {
            writer.write_u32::<LE>(group.group_id)?;
            writer.write_u8(group.sync_type)?;
            if var {
                write_var_count(writer, group.states.len(), version, "states")?;
            } else {
                writer.write_u16::<LE>(count_u16(group.states.len(), "states")?)?;
            }
            for state in &group.states {
                writer.write_u32::<LE>(state.state_id)?;
                writer.write_u32::<LE>(state.state_instance_id)?;
            }
        }
        Ok(())
    }
}

/// A game parameter curve driving one property of the object.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Rtpc {
    pub rtpc_id: u32,
    pub rtpc_type: u8,
    pub accum_type: u8,
    pub param_id: u32,
    pub curve_id: u32,
    pub scaling: u8,
    pub points: Vec<GraphPoint>,
}

impl Codec for Rtpc {
    fn read<R: Read>(reader: &mut R, version: u32) -> Result<Self> {
        let rtpc_id = reader.read_u32::<LE>()?;
        let rtpc_type = reader.read_u8()?;
        let accum_type = reader.read_u8()?;
        let param_id = if uses_var_counts(version) {
            reader.read_var_u32()?
        } else {
            reader.read_u32::<LE>()?
        };
        let curve_id = reader.read_u32::<LE>()?;
        let scaling = reader.read_u8()?;
        let count = reader.read_u16::<LE>()? as usize;
        Ok(Rtpc {
            rtpc_id,
            rtpc_type,
            accum_type,
            param_id,
            curve_id,
            scaling,
            points: read_list(reader, count, version)?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W, version: u32) -> Result<()> {
        writer.write_u32::<LE>(self.rtpc_id)?;
        writer.write_u8(self.rtpc_type)?;
        writer.write_u8(self.accum_type)?;
        if uses_var_counts(version) {
            writer.write_var_u32(self.param_id)?;
        } else {
            writer.write_u32::<LE>(self.param_id)?;
        }
        writer.write_u32::<LE>(self.curve_id)?;
        writer.write_u8(self.scaling)?;
        writer.write_u16::<LE>(count_u16(self.points.len(), "RTPC points")?)?;
        write_list(writer, &self.points, version)
    }
}

/// `u16` count followed by RTPC curves.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(transparent)]
pub struct InitialRtpc(pub Vec<Rtpc>);

impl Codec for InitialRtpc {
    fn read<R: Read>(reader: &mut R, version: u32) -> Result<Self> {
        let count = reader.read_u16::<LE>()? as usize;
        Ok(InitialRtpc(read_list(reader, count, version)?))
    }

    fn write<W: Write>(&self, writer: &mut W, version: u32) -> Result<()> {
        writer.write_u16::<LE>(count_u16(self.0.len(), "RTPC list")?)?;
        write_list(writer, &self.0, version)
    }
}

/// Direct children of a container.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(transparent)]
pub struct Children(pub Vec<u32>);

impl Codec for Children {
    fn read<R: Read>(reader: &mut R, _version: u32) -> Result<Self> {
        Ok(Children(read_id_list(reader)?))
    }

    fn write<W: Write>(&self, writer: &mut W, _version: u32) -> Result<()> {
        write_id_list(writer, &self.0)
    }
}

/// Parameters every actor-mixer and music node carries.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct BaseParameter {
    pub fx_chunk: FxChunk,
    /// Version 136 onwards.
    pub fx_metadata: Option<FxMetadata>,
    /// Versions 128 to 145.
    pub override_attachment_params: Option<u8>,
    pub override_bus_id: u32,
    pub direct_parent_id: u32,
    pub bits: u8,
    pub props: PropBundle,
    pub ranged_props: RangePropBundle,
    pub positioning: Positioning,
    pub aux: AuxParams,
    pub adv_settings: AdvSettings,
    pub states: StateChunk,
    pub rtpcs: InitialRtpc,
}

impl Codec for BaseParameter {
    fn read<R: Read>(reader: &mut R, version: u32) -> Result<Self> {
        Ok(BaseParameter {
            fx_chunk: FxChunk::read(reader, version)?,
            fx_metadata: read_fx_metadata(reader, version)?,
            override_attachment_params: read_gated_u8(reader, has_attachment_override(version))?,
            override_bus_id: reader.read_u32::<LE>()?,
            direct_parent_id: reader.read_u32::<LE>()?,
            bits: reader.read_u8()?,
            props: PropBundle::read(reader, version)?,
            ranged_props: RangePropBundle::read(reader, version)?,
            positioning: Positioning::read(reader, version)?,
            aux: AuxParams::read(reader, version)?,
            adv_settings: AdvSettings::read(reader, version)?,
            states: StateChunk::read(reader, version)?,
            rtpcs: InitialRtpc::read(reader, version)?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W, version: u32) -> Result<()> {
        self.fx_chunk.write(writer, version)?;
        write_fx_metadata(writer, &self.fx_metadata, version)?;
        write_gated_u8(
            writer,
            has_attachment_override(version),
            self.override_attachment_params,
        )?;
        writer.write_u32::<LE>(self.override_bus_id)?;
        writer.write_u32::<LE>(self.direct_parent_id)?;
        writer.write_u8(self.bits)?;
        self.props.write(writer, version)?;
        self.ranged_props.write(writer, version)?;
        self.positioning.write(writer, version)?;
        self.aux.write(writer, version)?;
        self.adv_settings.write(writer, version)?;
        self.states.write(writer, version)?;
        self.rtpcs.write(writer, version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Smallest possible base parameter block for a version, in bytes.
    fn empty_len(version: u32) -> usize {
        let mut len = 2; // fx override + count
        if has_fx_metadata(version) {
            len += 2;
        }
        if has_attachment_override(version) {
            len += 1;
        }
        len += 4 + 4 + 1; // override bus, parent, bits
        len += 2; // empty bundles
        len += 1 + 1; // positioning bits, aux bits
        if has_reflections_aux(version) {
            len += 4;
        }
        len += 6; // adv settings
        len += if uses_var_counts(version) { 2 } else { 4 };
        len += 2; // rtpc count
        len
    }

    #[test]
    fn test_empty_base_length_per_version() {
        for version in [113, 120, 128, 135, 136, 141, 150] {
            let mut out = Vec::new();
            BaseParameter::default().write(&mut out, version).unwrap();
            assert_eq!(out.len(), empty_len(version), "v{version}");
            let decoded = BaseParameter::read(&mut Cursor::new(&out), version).unwrap();
            let mut again = Vec::new();
            decoded.write(&mut again, version).unwrap();
            assert_eq!(again, out);
        }
    }

    #[test]
    fn test_positioning_automation_layout() {
        let positioning = Positioning {
            bits: 0x03 | (1 << 5),
            bits_3d: Some(0x10),
            automation: Some(PathAutomation {
                path_mode: 2,
                transition_time: 100,
                vertices: vec![PathVertex {
                    x: 1.0,
                    y: 2.0,
                    z: 3.0,
                    duration: 500,
                }],
                items: vec![PathItem {
                    vertices_offset: 0,
                    num_vertices: 1,
                    range_x: 0.5,
                    range_y: 0.5,
                    range_z: 0.0,
                }],
            }),
        };
        let mut out = Vec::new();
        positioning.write(&mut out, 141).unwrap();
        // bits, bits_3d, mode, time, n_vertices, vertex, n_items, item, range
        assert_eq!(out.len(), 1 + 1 + 1 + 4 + 4 + 16 + 4 + 8 + 12);
        let decoded = Positioning::read(&mut Cursor::new(&out), 141).unwrap();
        assert_eq!(decoded, positioning);
    }

    #[test]
    fn test_state_chunk_legacy_widths() {
        let chunk = StateChunk {
            props: vec![],
            groups: vec![StateGroup {
                group_id: 5,
                sync_type: 1,
                states: vec![StateRef {
                    state_id: 6,
                    state_instance_id: 7,
                }],
            }],
        };
        let mut old = Vec::new();
        chunk.write(&mut old, 120).unwrap();
        assert_eq!(old.len(), 4 + 4 + 1 + 2 + 8);

        let mut new = Vec::new();
        chunk.write(&mut new, 141).unwrap();
        assert_eq!(new.len(), 1 + 1 + 4 + 1 + 1 + 8);
        assert_eq!(StateChunk::read(&mut Cursor::new(&new), 141).unwrap(), chunk);
    }

    #[test]
    fn test_rtpc_param_id_width() {
        let rtpc = Rtpc {
            rtpc_id: 1,
            param_id: 0x80,
            points: vec![GraphPoint {
                from: 0.0,
                to: 1.0,
                interp: 4,
            }],
            ..Default::default()
        };
        let mut new = Vec::new();
        rtpc.write(&mut new, 141).unwrap();
        let mut old = Vec::new();
        rtpc.write(&mut old, 120).unwrap();
        assert_eq!(old.len(), new.len() + 2);
        assert_eq!(Rtpc::read(&mut Cursor::new(&new), 141).unwrap(), rtpc);
    }
}
