//! Interactive music hierarchy: segments, tracks and the two music containers.

use byteorder::{LE, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use utils::{BinReadExt, BinWriteExt};

use super::base::{BaseParameter, Children};
use super::sound::BankSourceData;
use crate::codec::{
    Codec, GraphPoint, count_u32, read_ids, read_list, write_ids, write_list,
};
use crate::error::{BnkError, Result};
use crate::serde_util::hex_bytes;
use crate::version::uses_var_counts;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct MeterInfo {
    pub grid_period: f64,
    pub grid_offset: f64,
    pub tempo: f32,
    pub time_sig_num_beats_bar: u8,
    pub time_sig_beat_value: u8,
}

impl Codec for MeterInfo {
    fn read<R: Read>(reader: &mut R, _version: u32) -> Result<Self> {
        Ok(MeterInfo {
            grid_period: reader.read_f64::<LE>()?,
            grid_offset: reader.read_f64::<LE>()?,
            tempo: reader.read_f32::<LE>()?,
            time_sig_num_beats_bar: reader.read_u8()?,
            time_sig_beat_value: reader.read_u8()?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W, _version: u32) -> Result<()> {
        writer.write_f64::<LE>(self.grid_period)?;
        writer.write_f64::<LE>(self.grid_offset)?;
        writer.write_f32::<LE>(self.tempo)?;
        writer.write_u8(self.time_sig_num_beats_bar)?;
        writer.write_u8(self.time_sig_beat_value)?;
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stinger {
    pub trigger_id: u32,
    pub segment_id: u32,
    pub sync_play_at: u32,
    pub cue_filter_hash: u32,
    pub dont_repeat_time: i32,
    pub num_segment_look_ahead: u32,
}

impl Codec for Stinger {
    fn read<R: Read>(reader: &mut R, _version: u32) -> Result<Self> {
        Ok(Stinger {
            trigger_id: reader.read_u32::<LE>()?,
            segment_id: reader.read_u32::<LE>()?,
            sync_play_at: reader.read_u32::<LE>()?,
            cue_filter_hash: reader.read_u32::<LE>()?,
            dont_repeat_time: reader.read_i32::<LE>()?,
            num_segment_look_ahead: reader.read_u32::<LE>()?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W, _version: u32) -> Result<()> {
        writer.write_u32::<LE>(self.trigger_id)?;
        writer.write_u32::<LE>(self.segment_id)?;
        writer.write_u32::<LE>(self.sync_play_at)?;
        writer.write_u32::<LE>(self.cue_filter_hash)?;
        writer.write_i32::<LE>(self.dont_repeat_time)?;
        writer.write_u32::<LE>(self.num_segment_look_ahead)?;
        Ok(())
    }
}

/// Node parameters shared by segments and music containers.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct MusicNodeParams {
    pub flags: u8,
    pub base: BaseParameter,
    pub children: Children,
    pub meter: MeterInfo,
    pub meter_info_flag: u8,
    pub stingers: Vec<Stinger>,
}

impl Codec for MusicNodeParams {
    fn read<R: Read>(reader: &mut R, version: u32) -> Result<Self> {
        let flags = reader.read_u8()?;
        let base = BaseParameter::read(reader, version)?;
        let children = Children::read(reader, version)?;
        let meter = MeterInfo::read(reader, version)?;
        let meter_info_flag = reader.read_u8()?;
        let count = reader.read_u32::<LE>()? as usize;
        Ok(MusicNodeParams {
            flags,
            base,
            children,
            meter,
            meter_info_flag,
            stingers: read_list(reader, count, version)?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W, version: u32) -> Result<()> {
        writer.write_u8(self.flags)?;
        self.base.write(writer, version)?;
        self.children.write(writer, version)?;
        self.meter.write(writer, version)?;
        writer.write_u8(self.meter_info_flag)?;
        writer.write_u32::<LE>(count_u32(self.stingers.len(), "stingers")?)?;
        write_list(writer, &self.stingers, version)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct MusicMarker {
    pub id: u32,
    pub position: f64,
    /// Raw marker name bytes, without terminator or length prefix.
    #[serde(with = "hex_bytes")]
    pub name: Vec<u8>,
}

impl Codec for MusicMarker {
    fn read<R: Read>(reader: &mut R, version: u32) -> Result<Self> {
        let id = reader.read_u32::<LE>()?;
        let position = reader.read_f64::<LE>()?;
        let name = if uses_var_counts(version) {
            reader.read_null_term_bytes()?
        } else {
            let len = reader.read_u32::<LE>()? as usize;
            reader.read_bytes(len)?
        };
        Ok(MusicMarker { id, position, name })
    }

    fn write<W: Write>(&self, writer: &mut W, version: u32) -> Result<()> {
        writer.write_u32::<LE>(self.id)?;
        writer.write_f64::<LE>(self.position)?;
        if uses_var_counts(version) {
            if self.name.contains(&0) {
                return Err(BnkError::InvalidGraph(format!(
                    "marker {} name contains a NUL byte",
                    self.id
                )));
            }
            writer.write_null_term_bytes(&self.name)?;
        } else {
            writer.write_u32::<LE>(count_u32(self.name.len(), "marker name")?)?;
            writer.write_all(&self.name)?;
        }
        Ok(())
    }
}

/// HIRC music segment (type 10).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct MusicSegment {
    pub id: u32,
    pub node: MusicNodeParams,
    pub duration: f64,
    pub markers: Vec<MusicMarker>,
}

impl Codec for MusicSegment {
    fn read<R: Read>(reader: &mut R, version: u32) -> Result<Self> {
        let id = reader.read_u32::<LE>()?;
        let node = MusicNodeParams::read(reader, version)?;
        let duration = reader.read_f64::<LE>()?;
        let count = reader.read_u32::<LE>()? as usize;
        Ok(MusicSegment {
            id,
            node,
            duration,
            markers: read_list(reader, count, version)?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W, version: u32) -> Result<()> {
        writer.write_u32::<LE>(self.id)?;
        self.node.write(writer, version)?;
        writer.write_f64::<LE>(self.duration)?;
        writer.write_u32::<LE>(count_u32(self.markers.len(), "markers")?)?;
        write_list(writer, &self.markers, version)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct TrackPlaylistItem {
    pub track_id: u32,
    pub source_id: u32,
    /// Version 132 onwards.
    pub cache_id: Option<u32>,
    pub event_id: u32,
    pub play_at: f64,
    pub begin_trim_offset: f64,
    pub end_trim_offset: f64,
    pub src_duration: f64,
}

impl Codec for TrackPlaylistItem {
    fn read<R: Read>(reader: &mut R, version: u32) -> Result<Self> {
        Ok(TrackPlaylistItem {
            track_id: reader.read_u32::<LE>()?,
            source_id: reader.read_u32::<LE>()?,
            cache_id: if version >= 132 {
                Some(reader.read_u32::<LE>()?)
            } else {
                None
            },
            event_id: reader.read_u32::<LE>()?,
            play_at: reader.read_f64::<LE>()?,
            begin_trim_offset: reader.read_f64::<LE>()?,
            end_trim_offset: reader.read_f64::<LE>()?,
            src_duration: reader.read_f64::<LE>()?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W, version: u32) -> Result<()> {
        writer.write_u32::<LE>(self.track_id)?;
        writer.write_u32::<LE>(self.source_id)?;
        if version >= 132 {
            writer.write_u32::<LE>(self.cache_id.unwrap_or_default())?;
        }
        writer.write_u32::<LE>(self.event_id)?;
        writer.write_f64::<LE>(self.play_at)?;
        writer.write_f64::<LE>(self.begin_trim_offset)?;
        writer.write_f64::<LE>(self.end_trim_offset)?;
        writer.write_f64::<LE>(self.src_duration)?;
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct ClipAutomation {
    pub clip_index: u32,
    pub auto_type: u32,
    pub points: Vec<GraphPoint>,
}

impl Codec for ClipAutomation {
    fn read<R: Read>(reader: &mut R, version: u32) -> Result<Self> {
        let clip_index = reader.read_u32::<LE>()?;
        let auto_type = reader.read_u32::<LE>()?;
        let count = reader.read_u32::<LE>()? as usize;
        Ok(ClipAutomation {
            clip_index,
            auto_type,
            points: read_list(reader, count, version)?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W, version: u32) -> Result<()> {
        writer.write_u32::<LE>(self.clip_index)?;
        writer.write_u32::<LE>(self.auto_type)?;
        writer.write_u32::<LE>(count_u32(self.points.len(), "clip automation points")?)?;
        write_list(writer, &self.points, version)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FadeParams {
    pub transition_time: i32,
    pub fade_curve: u32,
    pub fade_offset: i32,
}

impl Codec for FadeParams {
    fn read<R: Read>(reader: &mut R, _version: u32) -> Result<Self> {
        Ok(FadeParams {
            transition_time: reader.read_i32::<LE>()?,
            fade_curve: reader.read_u32::<LE>()?,
            fade_offset: reader.read_i32::<LE>()?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W, _version: u32) -> Result<()> {
        writer.write_i32::<LE>(self.transition_time)?;
        writer.write_u32::<LE>(self.fade_curve)?;
        writer.write_i32::<LE>(self.fade_offset)?;
        Ok(())
    }
}

/// Switch parameters of a track of type `TRACK_TYPE_SWITCH`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct TrackSwitchParams {
    pub group_type: u8,
    pub group_id: u32,
    pub default_switch: u32,
    pub switch_associations: Vec<u32>,
    pub src_fade: FadeParams,
    pub sync_type: u32,
    pub cue_filter_hash: u32,
    pub dest_fade: FadeParams,
}

impl Codec for TrackSwitchParams {
    fn read<R: Read>(reader: &mut R, version: u32) -> Result<Self> {
        let group_type = reader.read_u8()?;
        let group_id = reader.read_u32::<LE>()?;
        let default_switch = reader.read_u32::<LE>()?;
        let count = reader.read_u32::<LE>()? as usize;
        Ok(TrackSwitchParams {
            group_type,
            group_id,
            default_switch,
            switch_associations: read_ids(reader, count)?,
            src_fade: FadeParams::read(reader, version)?,
            sync_type: reader.read_u32::<LE>()?,
            cue_filter_hash: reader.read_u32::<LE>()?,
            dest_fade: FadeParams::read(reader, version)?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W, version: u32) -> Result<()> {
        writer.write_u8(self.group_type)?;
        writer.write_u32::<LE>(self.group_id)?;
        writer.write_u32::<LE>(self.default_switch)?;
        writer.write_u32::<LE>(count_u32(
            self.switch_associations.len(),
            "track switch associations",
        )?)?;
        write_ids(writer, &self.switch_associations)?;
        self.src_fade.write(writer, version)?;
        writer.write_u32::<LE>(self.sync_type)?;
        writer.write_u32::<LE>(self.cue_filter_hash)?;
        self.dest_fade.write(writer, version)
    }
}

pub const TRACK_TYPE_SWITCH: u8 = 3;

/// HIRC music track (type 11).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct MusicTrack {
    pub id: u32,
    pub flags: u8,
    pub sources: Vec<BankSourceData>,
    pub playlist: Vec<TrackPlaylistItem>,
    /// Written only when the playlist is not empty.
    pub num_sub_track: u32,
    pub clip_automations: Vec<ClipAutomation>,
    pub base: BaseParameter,
    pub track_type: u8,
    pub switch_params: Option<TrackSwitchParams>,
    pub look_ahead_time: i32,
}

impl Codec for MusicTrack {
    fn read<R: Read>(reader: &mut R, version: u32) -> Result<Self> {
        let id = reader.read_u32::<LE>()?;
        let flags = reader.read_u8()?;
        let source_count = reader.read_u32::<LE>()? as usize;
        let sources = read_list(reader, source_count, version)?;
        let playlist_count = reader.read_u32::<LE>()? as usize;
        let playlist = read_list(reader, playlist_count, version)?;
        let num_sub_track = if playlist_count > 0 {
            reader.read_u32::<LE>()?
        } else {
            0
        };
        let clip_count = reader.read_u32::<LE>()? as usize;
        let clip_automations = read_list(reader, clip_count, version)?;
        let base = BaseParameter::read(reader, version)?;
        let track_type = reader.read_u8()?;
        let switch_params = if track_type == TRACK_TYPE_SWITCH {
            Some(TrackSwitchParams::read(reader, version)?)
        } else {
            None
        };
        Ok(MusicTrack {
            id,
            flags,
            sources,
            playlist,
            num_sub_track,
            clip_automations,
            base,
            track_type,
            switch_params,
            look_ahead_time: reader.read_i32::<LE>()?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W, version: u32) -> Result<()> {
        writer.write_u32::<LE>(self.id)?;
        writer.write_u8(self.flags)?;
        writer.write_u32::<LE>(count_u32(self.sources.len(), "track sources")?)?;
        write_list(writer, &self.sources, version)?;
        writer.write_u32::<LE>(count_u32(self.playlist.len(), "track playlist")?)?;
        write_list(writer, &self.playlist, version)?;
        if !self.playlist.is_empty() {
            writer.write_u32::<LE>(self.num_sub_track)?;
        }
        writer.write_u32::<LE>(count_u32(self.clip_automations.len(), "clip automations")?)?;
        write_list(writer, &self.clip_automations, version)?;
        self.base.write(writer, version)?;
        writer.write_u8(self.track_type)?;
        if self.track_type == TRACK_TYPE_SWITCH {
            match &self.switch_params {
                Some(params) => params.write(writer, version)?,
                None => TrackSwitchParams::default().write(writer, version)?,
            }
        }
        writer.write_i32::<LE>(self.look_ahead_time)?;
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TransitionObject {
    pub segment_id: u32,
    pub fade_in: FadeParams,
    pub fade_out: FadeParams,
    pub play_pre_entry: u8,
    pub play_post_exit: u8,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct TransitionRule {
    pub src_ids: Vec<u32>,
    pub dst_ids: Vec<u32>,
    pub src_fade: FadeParams,
    pub src_sync_type: u32,
    pub src_cue_filter_hash: u32,
    pub src_play_post_exit: u8,
    pub dst_fade: FadeParams,
    pub dst_cue_filter_hash: u32,
    pub dst_jump_to_id: u32,
    pub dst_jump_to_type: u16,
    pub dst_entry_type: u16,
    pub dst_play_pre_entry: u8,
    pub dst_match_source_cue_name: u8,
    pub transition_object: Option<TransitionObject>,
}

impl Codec for TransitionRule {
    fn read<R: Read>(reader: &mut R, version: u32) -> Result<Self> {
        let src_count = reader.read_u32::<LE>()? as usize;
        let src_ids = read_ids(reader, src_count)?;
        let dst_count = reader.read_u32::<LE>()? as usize;
        let dst_ids = read_ids(reader, dst_count)?;
        let src_fade = FadeParams::read(reader, version)?;
        let src_sync_type = reader.read_u32::<LE>()?;
        let src_cue_filter_hash = reader.read_u32::<LE>()?;
        let src_play_post_exit = reader.read_u8()?;
        let dst_fade = FadeParams::read(reader, version)?;
        let dst_cue_filter_hash = reader.read_u32::<LE>()?;
        let dst_jump_to_id = reader.read_u32::<LE>()?;
        let dst_jump_to_type = reader.read_u16::<LE>()?;
        let dst_entry_type = reader.read_u16::<LE>()?;
        let dst_play_pre_entry = reader.read_u8()?;
        let dst_match_source_cue_name = reader.read_u8()?;
        let transition_object = if reader.read_u8()? != 0 {
            Some(TransitionObject {
                segment_id: reader.read_u32::<LE>()?,
                fade_in: FadeParams::read(reader, version)?,
                fade_out: FadeParams::read(reader, version)?,
                play_pre_entry: reader.read_u8()?,
                play_post_exit: reader.read_u8()?,
            })
        } else {
            None
        };
        Ok(TransitionRule {
            src_ids,
            dst_ids,
            src_fade,
            src_sync_type,
            src_cue_filter_hash,
            src_play_post_exit,
            dst_fade,
            dst_cue_filter_hash,
            dst_jump_to_id,
            dst_jump_to_type,
            dst_entry_type,
            dst_play_pre_entry,
            dst_match_source_cue_name,
            transition_object,
        })
    }

    fn write<W: Write>(&self, writer: &mut W, version: u32) -> Result<()> {
        writer.write_u32::<LE>(count_u32(self.src_ids.len(), "transition sources")?)?;
        write_ids(writer, &self.src_ids)?;
        writer.write_u32::<LE>(count_u32(self.dst_ids.len(), "transition destinations")?)?;
        write_ids(writer, &self.dst_ids)?;
        self.src_fade.write(writer, version)?;
        writer.write_u32::<LE>(self.src_sync_type)?;
        writer.write_u32::<LE>(self.src_cue_filter_hash)?;
        writer.write_u8(self.src_play_post_exit)?;
        self.dst_fade.write(writer, version)?;
        writer.write_u32::<LE>(self.dst_cue_filter_hash)?;
        writer.write_u32::<LE>(self.dst_jump_to_id)?;
        writer.write_u16::<LE>(self.dst_jump_to_type)?;
        writer.write_u16::<LE>(self.dst_entry_type)?;
        writer.write_u8(self.dst_play_pre_entry)?;
        writer.write_u8(self.dst_match_source_cue_name)?;
        match &self.transition_object {
            Some(object) => {
                writer.write_u8(1)?;
                writer.write_u32::<LE>(object.segment_id)?;
                object.fade_in.write(writer, version)?;
                object.fade_out.write(writer, version)?;
                writer.write_u8(object.play_pre_entry)?;
                writer.write_u8(object.play_post_exit)?;
            }
            None => writer.write_u8(0)?,
        }
        Ok(())
    }
}

/// Node parameters plus transition rules, shared by both music containers.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct MusicTransNode {
    pub node: MusicNodeParams,
    pub rules: Vec<TransitionRule>,
}

impl Codec for MusicTransNode {
    fn read<R: Read>(reader: &mut R, version: u32) -> Result<Self> {
        let node = MusicNodeParams::read(reader, version)?;
        let count = reader.read_u32::<LE>()? as usize;
        Ok(MusicTransNode {
            node,
            rules: read_list(reader, count, version)?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W, version: u32) -> Result<()> {
        self.node.write(writer, version)?;
        writer.write_u32::<LE>(count_u32(self.rules.len(), "transition rules")?)?;
        write_list(writer, &self.rules, version)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecisionTreeNode {
    pub key: u32,
    /// Audio node ID for a leaf, `children_index | children_count << 16` otherwise.
    pub payload: u32,
    pub weight: u16,
    pub probability: u16,
}

impl DecisionTreeNode {
    pub const SIZE: usize = 12;

    pub fn children_range(&self) -> std::ops::Range<usize> {
        let start = (self.payload & 0xFFFF) as usize;
        let count = (self.payload >> 16) as usize;
        start..start + count
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TreeArgument {
    pub group_id: u32,
    pub group_type: u8,
}

/// Flattened switch decision tree, root first.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct DecisionTree {
    pub arguments: Vec<TreeArgument>,
    pub mode: u8,
    pub nodes: Vec<DecisionTreeNode>,
}

impl DecisionTree {
    /// Audio node selected for a path of switch values, one per argument.
    pub fn resolve(&self, keys: &[u32]) -> Option<u32> {
        let mut node = self.nodes.first()?;
        for (depth, key) in keys.iter().enumerate() {
            if depth >= self.arguments.len() {
                break;
            }
            let children = self.nodes.get(node.children_range())?;
            node = children
                .iter()
                .find(|child| child.key == *key)
                .or_else(|| children.iter().find(|child| child.key == 0))?;
        }
        Some(node.payload)
    }
}

impl Codec for DecisionTree {
    fn read<R: Read>(reader: &mut R, _version: u32) -> Result<Self> {
        let depth = reader.read_u32::<LE>()? as usize;
        let group_ids = read_ids(reader, depth)?;
        let mut arguments = Vec::with_capacity(group_ids.len());
        for group_id in group_ids {
            arguments.push(TreeArgument {
                group_id,
                group_type: 0,
            });
        }
        for argument in arguments.iter_mut() {
            argument.group_type = reader.read_u8()?;
        }

        let tree_size = reader.read_u32::<LE>()? as usize;
        let mode = reader.read_u8()?;
        if tree_size % DecisionTreeNode::SIZE != 0 {
            return Err(BnkError::SizeMismatch {
                context: "music switch decision tree".to_string(),
                declared: tree_size as u64,
                consumed: (tree_size - tree_size % DecisionTreeNode::SIZE) as u64,
            });
        }
        let count = tree_size / DecisionTreeNode::SIZE;
        let mut nodes = Vec::with_capacity(count.min(4096));
        for _ in 0..count {
            nodes.push(DecisionTreeNode {
                key: reader.read_u32::<LE>()?,
                payload: reader.read_u32::<LE>()?,
                weight: reader.read_u16::<LE>()?,
                probability: reader.read_u16::<LE>()?,
            });
        }
        Ok(DecisionTree {
            arguments,
            mode,
            nodes,
        })
    }

    fn write<W: Write>(&self, writer: &mut W, _version: u32) -> Result<()> {
        writer.write_u32::<LE>(count_u32(self.arguments.len(), "tree depth")?)?;
        for argument in &self.arguments {
            writer.write_u32::<LE>(argument.group_id)?;
        }
        for argument in &self.arguments {
            writer.write_u8(argument.group_type)?;
        }
        writer.write_u32::<LE>(count_u32(
            self.nodes.len() * DecisionTreeNode::SIZE,
            "decision tree size",
        )?)?;
        writer.write_u8(self.mode)?;
        for node in &self.nodes {
            writer.write_u32::<LE>(node.key)?;
            writer.write_u32::<LE>(node.payload)?;
            writer.write_u16::<LE>(node.weight)?;
            writer.write_u16::<LE>(node.probability)?;
        }
        Ok(())
    }
}

/// HIRC music switch container (type 12).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct MusicSwitchCntr {
    pub id: u32,
    pub trans: MusicTransNode,
    pub is_continue_playback: u8,
    pub tree: DecisionTree,
}

impl Codec for MusicSwitchCntr {
    fn read<R: Read>(reader: &mut R, version: u32) -> Result<Self> {
        Ok(MusicSwitchCntr {
            id: reader.read_u32::<LE>()?,
            trans: MusicTransNode::read(reader, version)?,
            is_continue_playback: reader.read_u8()?,
            tree: DecisionTree::read(reader, version)?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W, version: u32) -> Result<()> {
        writer.write_u32::<LE>(self.id)?;
        self.trans.write(writer, version)?;
        writer.write_u8(self.is_continue_playback)?;
        self.tree.write(writer, version)
    }
}

/// One node of a music playlist; `num_children` following nodes are its children.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MusicPlaylistItem {
    pub segment_id: u32,
    pub playlist_item_id: u32,
    pub num_children: u32,
    pub rs_type: u32,
    pub loop_count: i16,
    pub loop_min: i16,
    pub loop_max: i16,
    pub weight: u32,
    pub avoid_repeat_count: u16,
    pub is_using_weight: u8,
    pub is_shuffle: u8,
}

impl Codec for MusicPlaylistItem {
    fn read<R: Read>(reader: &mut R, _version: u32) -> Result<Self> {
        Ok(MusicPlaylistItem {
            segment_id: reader.read_u32::<LE>()?,
            playlist_item_id: reader.read_u32::<LE>()?,
            num_children: reader.read_u32::<LE>()?,
            rs_type: reader.read_u32::<LE>()?,
            loop_count: reader.read_i16::<LE>()?,
            loop_min: reader.read_i16::<LE>()?,
            loop_max: reader.read_i16::<LE>()?,
            weight: reader.read_u32::<LE>()?,
            avoid_repeat_count: reader.read_u16::<LE>()?,
            is_using_weight: reader.read_u8()?,
            is_shuffle: reader.read_u8()?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W, _version: u32) -> Result<()> {
        writer.write_u32::<LE>(self.segment_id)?;
        writer.write_u32::<LE>(self.playlist_item_id)?;
        writer.write_u32::<LE>(self.num_children)?;
        writer.write_u32::<LE>(self.rs_type)?;
        writer.write_i16::<LE>(self.loop_count)?;
        writer.write_i16::<LE>(self.loop_min)?;
        writer.write_i16::<LE>(self.loop_max)?;
        writer.write_u32::<LE>(self.weight)?;
        writer.write_u16::<LE>(self.avoid_repeat_count)?;
        writer.write_u8(self.is_using_weight)?;
        writer.write_u8(self.is_shuffle)?;
        Ok(())
    }
}

/// HIRC music random/sequence container (type 13).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct MusicRanSeqCntr {
    pub id: u32,
    pub trans: MusicTransNode,
    /// Playlist tree in pre-order.
    pub playlist: Vec<MusicPlaylistItem>,
}

impl Codec for MusicRanSeqCntr {
    fn read<R: Read>(reader: &mut R, version: u32) -> Result<Self> {
        let id = reader.read_u32::<LE>()?;
        let trans = MusicTransNode::read(reader, version)?;
        let count = reader.read_u32::<LE>()? as usize;
        Ok(MusicRanSeqCntr {
            id,
            trans,
            playlist: read_list(reader, count, version)?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W, version: u32) -> Result<()> {
        writer.write_u32::<LE>(self.id)?;
        self.trans.write(writer, version)?;
        writer.write_u32::<LE>(count_u32(self.playlist.len(), "music playlist")?)?;
        write_list(writer, &self.playlist, version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn reencode<T: Codec>(value: &T, version: u32) -> (Vec<u8>, T) {
        let mut out = Vec::new();
        value.write(&mut out, version).unwrap();
        let mut cursor = Cursor::new(&out);
        let decoded = T::read(&mut cursor, version).unwrap();
        assert_eq!(cursor.position() as usize, out.len());
        (out, decoded)
    }

    #[test]
    fn test_marker_name_encoding_by_version() {
        let marker = MusicMarker {
            id: 1,
            position: 1000.0,
            name: b"Entry Cue".to_vec(),
        };
        let (new, decoded) = reencode(&marker, 141);
        assert_eq!(new.len(), 4 + 8 + 9 + 1);
        assert_eq!(decoded, marker);

        let (old, decoded) = reencode(&marker, 120);
        assert_eq!(old.len(), 4 + 8 + 4 + 9);
        assert_eq!(decoded, marker);
    }

    #[test]
    fn test_track_cache_id_gate() {
        let track = MusicTrack {
            id: 3,
            playlist: vec![TrackPlaylistItem {
                track_id: 0,
                source_id: 55,
                cache_id: Some(0),
                src_duration: 1234.5,
                ..Default::default()
            }],
            num_sub_track: 1,
            track_type: TRACK_TYPE_SWITCH,
            switch_params: Some(TrackSwitchParams {
                group_id: 9,
                switch_associations: vec![1, 2],
                ..Default::default()
            }),
            ..Default::default()
        };
        let (new, decoded) = reencode(&track, 132);
        assert_eq!(decoded.playlist, track.playlist);
        assert_eq!(decoded.switch_params, track.switch_params);
        let (old, _) = reencode(&track, 129);
        assert_eq!(new.len(), old.len() + 4);
    }

    #[test]
    fn test_decision_tree_resolve() {
        let tree = DecisionTree {
            arguments: vec![TreeArgument {
                group_id: 100,
                group_type: 0,
            }],
            mode: 0,
            nodes: vec![
                DecisionTreeNode {
                    key: 0,
                    payload: 1 | (2 << 16),
                    weight: 50,
                    probability: 100,
                },
                DecisionTreeNode {
                    key: 0,
                    payload: 700,
                    ..Default::default()
                },
                DecisionTreeNode {
                    key: 42,
                    payload: 701,
                    ..Default::default()
                },
            ],
        };
        assert_eq!(tree.resolve(&[42]), Some(701));
        assert_eq!(tree.resolve(&[43]), Some(700));

        let (bytes, decoded) = reencode(&tree, 141);
        assert_eq!(decoded, tree);
        assert_eq!(bytes.len(), 4 + 4 + 1 + 4 + 1 + 36);
    }

    #[test]
    fn test_decision_tree_size_must_be_whole_nodes() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&0u32.to_le_bytes());
        bytes.extend_from_slice(&13u32.to_le_bytes());
        bytes.push(0);
        bytes.extend_from_slice(&[0u8; 13]);
        assert!(matches!(
            DecisionTree::read(&mut Cursor::new(&bytes), 141),
            Err(BnkError::SizeMismatch { declared: 13, .. })
        ));
    }
}
