//! Action objects and their two-level parameter dispatch.
//!
//! The high byte of an action type selects a row of a mux table, the row
//! selects an entry of `ACTION_DISPATCH`, and the entry names the generic and
//! specific parameter layouts that follow the common action header. Version
//! 150 renumbered some codes, so there is one mux table per side of that
//! boundary.

use byteorder::{LE, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

use crate::codec::{Codec, read_list, read_var_count, write_list, write_var_count};
use crate::error::{BnkError, Result};
use crate::props::{PropBundle, RangePropBundle};
use crate::version::uses_renumbered_actions;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenericParamKind {
    /// Nothing besides the specific parameters.
    Empty,
    /// Fade curve before, exception list after the specific parameters.
    Active,
    /// Fade curve and bank reference.
    Play,
    /// Exception list after the specific parameters.
    Except,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecificParamKind {
    None,
    Stop,
    Pause,
    Resume,
    Prop,
    GameParameter,
    ResetGameParameter,
    State,
    Switch,
    BypassFx,
    Seek,
    SetFx,
    ResetPlaylist,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionDispatch {
    pub name: &'static str,
    pub generic: GenericParamKind,
    pub specific: SpecificParamKind,
}

const fn entry(
    name: &'static str,
    generic: GenericParamKind,
    specific: SpecificParamKind,
) -> ActionDispatch {
    ActionDispatch {
        name,
        generic,
        specific,
    }
}

use GenericParamKind as G;
use SpecificParamKind as S;

/// Entry 0 is the sentinel for codes with no meaning in a mux table.
pub static ACTION_DISPATCH: [ActionDispatch; 35] = [
    entry("Invalid", G::Empty, S::None),
    entry("Stop", G::Active, S::Stop),
    entry("Pause", G::Active, S::Pause),
    entry("Resume", G::Active, S::Resume),
    entry("Play", G::Play, S::None),
    entry("PlayAndContinue", G::Play, S::None),
    entry("Mute", G::Active, S::None),
    entry("UnMute", G::Active, S::None),
    entry("SetPitch", G::Active, S::Prop),
    entry("ResetPitch", G::Active, S::Prop),
    entry("SetVolume", G::Active, S::Prop),
    entry("ResetVolume", G::Active, S::Prop),
    entry("SetBusVolume", G::Active, S::Prop),
    entry("ResetBusVolume", G::Active, S::Prop),
    entry("SetLPF", G::Active, S::Prop),
    entry("ResetLPF", G::Active, S::Prop),
    entry("UseState", G::Empty, S::None),
    entry("UnuseState", G::Empty, S::None),
    entry("SetState", G::Empty, S::State),
    entry("SetGameParameter", G::Active, S::GameParameter),
    entry("ResetGameParameter", G::Active, S::ResetGameParameter),
    entry("SetSwitch", G::Empty, S::Switch),
    entry("BypassFX", G::Except, S::BypassFx),
    entry("ResetBypassFX", G::Except, S::BypassFx),
    entry("Break", G::Empty, S::None),
    entry("Trigger", G::Empty, S::None),
    entry("Seek", G::Except, S::Seek),
    entry("Release", G::Active, S::None),
    entry("SetHPF", G::Active, S::Prop),
    entry("PlayEvent", G::Empty, S::None),
    entry("ResetPlaylist", G::Active, S::ResetPlaylist),
    entry("ResetHPF", G::Active, S::Prop),
    entry("SetFX", G::Except, S::SetFx),
    entry("ResetSetFX", G::Except, S::SetFx),
    entry("NoOp", G::Empty, S::None),
];

pub const MUX_TABLE_SIZE: usize = 0x38;

/// Action type high byte to dispatch index, before version 150.
pub static MUX_LEGACY: [u8; MUX_TABLE_SIZE] = [
    0, 1, 2, 3, 4, 5, 6, 7, // 0x00
    8, 9, 10, 11, 12, 13, 14, 15, // 0x08
    16, 17, 18, 19, 20, 0, 0, 0, // 0x10
    0, 21, 22, 23, 24, 25, 26, 27, // 0x18
    28, 29, 30, 0, 0, 0, 0, 0, // 0x20
    0, 0, 0, 0, 0, 0, 0, 0, // 0x28
    31, 32, 33, 0, 0, 0, 0, 0, // 0x30
];

/// Version 150 onwards: break/trigger moved ahead of the bypass pair, no-op added.
pub static MUX_150: [u8; MUX_TABLE_SIZE] = [
    0, 1, 2, 3, 4, 5, 6, 7, // 0x00
    8, 9, 10, 11, 12, 13, 14, 15, // 0x08
    16, 17, 18, 19, 20, 0, 0, 0, // 0x10
    0, 21, 24, 25, 22, 23, 26, 27, // 0x18
    28, 29, 30, 0, 0, 0, 0, 0, // 0x20
    0, 0, 0, 0, 0, 0, 0, 0, // 0x28
    31, 32, 33, 0, 34, 0, 0, 0, // 0x30
];

pub fn mux_table(version: u32) -> &'static [u8; MUX_TABLE_SIZE] {
    if uses_renumbered_actions(version) {
        &MUX_150
    } else {
        &MUX_LEGACY
    }
}

/// Dispatch index for an action type; the sentinel is reported as an error.
pub fn dispatch_index(action_type: u16, version: u32) -> Result<usize> {
    let code = ((action_type >> 8) & 0xFF) as usize;
    match mux_table(version).get(code) {
        Some(&index) if index != 0 => Ok(index as usize),
        _ => Err(BnkError::InvalidActionType {
            action_type,
            version,
        }),
    }
}

pub fn dispatch(action_type: u16, version: u32) -> Result<&'static ActionDispatch> {
    Ok(&ACTION_DISPATCH[dispatch_index(action_type, version)?])
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExceptEntry {
    pub id: u32,
    pub is_bus: u8,
}

impl Codec for ExceptEntry {
    fn read<R: Read>(reader: &mut R, _version: u32) -> Result<Self> {
        Ok(ExceptEntry {
            id: reader.read_u32::<LE>()?,
            is_bus: reader.read_u8()?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W, _version: u32) -> Result<()> {
        writer.write_u32::<LE>(self.id)?;
        writer.write_u8(self.is_bus)?;
        Ok(())
    }
}

/// Parameters shared by a family of action types.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum ActionParam {
    Empty,
    Active {
        fade_curve: u8,
        except: Vec<ExceptEntry>,
    },
    Play {
        fade_curve: u8,
        bank_id: u32,
        /// Present from version 144.
        bank_type: Option<u32>,
    },
    Except {
        except: Vec<ExceptEntry>,
    },
}

impl ActionParam {
    pub fn kind(&self) -> GenericParamKind {
        match self {
            ActionParam::Empty => G::Empty,
            ActionParam::Active { .. } => G::Active,
            ActionParam::Play { .. } => G::Play,
            ActionParam::Except { .. } => G::Except,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub enum ActionSpecificParam {
    None,
    Stop {
        bits: u8,
    },
    Pause {
        bits: u8,
    },
    Resume {
        bits: u8,
    },
    Prop {
        value_meaning: u8,
        base: f32,
        min: f32,
        max: f32,
    },
    GameParameter {
        bypass_transition: u8,
        value_meaning: u8,
        base: f32,
        min: f32,
        max: f32,
    },
    ResetGameParameter {
        bypass_transition: u8,
    },
    State {
        group_id: u32,
        target_state_id: u32,
    },
    Switch {
        group_id: u32,
        state_id: u32,
    },
    BypassFx {
        is_bypass: u8,
        target_mask: u8,
    },
    Seek {
        relative_to_duration: u8,
        base: f32,
        min: f32,
        max: f32,
        snap_to_nearest_marker: u8,
    },
    SetFx {
        is_audio_device: u8,
        slot_index: u8,
        fx_id: u32,
        is_shared: u8,
    },
    ResetPlaylist {
        bits: u8,
    },
}

impl ActionSpecificParam {
    pub fn kind(&self) -> SpecificParamKind {
        match self {
            ActionSpecificParam::None => S::None,
            ActionSpecificParam::Stop { .. } => S::Stop,
            ActionSpecificParam::Pause { .. } => S::Pause,
            ActionSpecificParam::Resume { .. } => S::Resume,
            ActionSpecificParam::Prop { .. } => S::Prop,
            ActionSpecificParam::GameParameter { .. } => S::GameParameter,
            ActionSpecificParam::ResetGameParameter { .. } => S::ResetGameParameter,
            ActionSpecificParam::State { .. } => S::State,
            ActionSpecificParam::Switch { .. } => S::Switch,
            ActionSpecificParam::BypassFx { .. } => S::BypassFx,
            ActionSpecificParam::Seek { .. } => S::Seek,
            ActionSpecificParam::SetFx { .. } => S::SetFx,
            ActionSpecificParam::ResetPlaylist { .. } => S::ResetPlaylist,
        }
    }

    fn read<R: Read>(reader: &mut R, kind: SpecificParamKind) -> Result<Self> {
        Ok(match kind {
            S::None => ActionSpecificParam::None,
            S::Stop => ActionSpecificParam::Stop {
                bits: reader.read_u8()?,
            },
            S::Pause => ActionSpecificParam::Pause {
                bits: reader.read_u8()?,
            },
            S::Resume => ActionSpecificParam::Resume {
                bits: reader.read_u8()?,
            },
            S::Prop => ActionSpecificParam::Prop {
                value_meaning: reader.read_u8()?,
                base: reader.read_f32::<LE>()?,
                min: reader.read_f32::<LE>()?,
                max: reader.read_f32::<LE>()?,
            },
            S::GameParameter => ActionSpecificParam::GameParameter {
                bypass_transition: reader.read_u8()?,
                value_meaning: reader.read_u8()?,
                base: reader.read_f32::<LE>()?,
                min: reader.read_f32::<LE>()?,
                max: reader.read_f32::<LE>()?,
            },
            S::ResetGameParameter => ActionSpecificParam::ResetGameParameter {
                bypass_transition: reader.read_u8()?,
            },
            S::State => ActionSpecificParam::State {
                group_id: reader.read_u32::<LE>()?,
                target_state_id: reader.read_u32::<LE>()?,
            },
            S::Switch => ActionSpecificParam::Switch {
                group_id: reader.read_u32::<LE>()?,
                state_id: reader.read_u32::<LE>()?,
            },
            S::BypassFx => ActionSpecificParam::BypassFx {
                is_bypass: reader.read_u8()?,
                target_mask: reader.read_u8()?,
            },
            S::Seek => ActionSpecificParam::Seek {
                relative_to_duration: reader.read_u8()?,
                base: reader.read_f32::<LE>()?,
                min: reader.read_f32::<LE>()?,
                max: reader.read_f32::<LE>()?,
                snap_to_nearest_marker: reader.read_u8()?,
            },
            S::SetFx => ActionSpecificParam::SetFx {
                is_audio_device: reader.read_u8()?,
                slot_index: reader.read_u8()?,
                fx_id: reader.read_u32::<LE>()?,
                is_shared: reader.read_u8()?,
            },
            S::ResetPlaylist => ActionSpecificParam::ResetPlaylist {
                bits: reader.read_u8()?,
            },
        })
    }

    fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        match *self {
            ActionSpecificParam::None => {}
            ActionSpecificParam::Stop { bits }
            | ActionSpecificParam::Pause { bits }
            | ActionSpecificParam::Resume { bits }
            | ActionSpecificParam::ResetPlaylist { bits } => writer.write_u8(bits)?,
            ActionSpecificParam::Prop {
                value_meaning,
                base,
                min,
                max,
            } => {
                writer.write_u8(value_meaning)?;
                writer.write_f32::<LE>(base)?;
                writer.write_f32::<LE>(min)?;
                writer.write_f32::<LE>(max)?;
            }
            ActionSpecificParam::GameParameter {
                bypass_transition,
                value_meaning,
                base,
                min,
                max,
            } => {
                writer.write_u8(bypass_transition)?;
                writer.write_u8(value_meaning)?;
                writer.write_f32::<LE>(base)?;
                writer.write_f32::<LE>(min)?;
                writer.write_f32::<LE>(max)?;
            }
            ActionSpecificParam::ResetGameParameter { bypass_transition } => {
                writer.write_u8(bypass_transition)?
            }
            ActionSpecificParam::State {
                group_id,
                target_state_id,
            } => {
                writer.write_u32::<LE>(group_id)?;
                writer.write_u32::<LE>(target_state_id)?;
            }
            ActionSpecificParam::Switch { group_id, state_id } => {
                writer.write_u32::<LE>(group_id)?;
                writer.write_u32::<LE>(state_id)?;
            }
            ActionSpecificParam::BypassFx {
                is_bypass,
                target_mask,
            } => {
                writer.write_u8(is_bypass)?;
                writer.write_u8(target_mask)?;
            }
            ActionSpecificParam::Seek {
                relative_to_duration,
                base,
                min,
                max,
                snap_to_nearest_marker,
            } => {
                writer.write_u8(relative_to_duration)?;
                writer.write_f32::<LE>(base)?;
                writer.write_f32::<LE>(min)?;
                writer.write_f32::<LE>(max)?;
                writer.write_u8(snap_to_nearest_marker)?;
            }
            ActionSpecificParam::SetFx {
                is_audio_device,
                slot_index,
                fx_id,
                is_shared,
            } => {
                writer.write_u8(is_audio_device)?;
                writer.write_u8(slot_index)?;
                writer.write_u32::<LE>(fx_id)?;
                writer.write_u8(is_shared)?;
            }
        }
        Ok(())
    }
}

/// HIRC action object (type 3).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Action {
    pub id: u32,
    pub action_type: u16,
    pub target_id: u32,
    pub target_is_bus: u8,
    pub props: PropBundle,
    pub ranged_props: RangePropBundle,
    pub param: ActionParam,
    pub specific: ActionSpecificParam,
}

impl Action {
    pub fn dispatch(&self, version: u32) -> Result<&'static ActionDispatch> {
        dispatch(self.action_type, version)
    }
}

fn read_except<R: Read>(reader: &mut R, version: u32) -> Result<Vec<ExceptEntry>> {
    let count = read_var_count(reader, version)?;
    read_list(reader, count, version)
}

fn write_except<W: Write>(writer: &mut W, except: &[ExceptEntry], version: u32) -> Result<()> {
    write_var_count(writer, except.len(), version, "action exception list")?;
    write_list(writer, except, version)
}

impl Codec for Action {
    fn read<R: Read>(reader: &mut R, version: u32) -> Result<Self> {
        let id = reader.read_u32::<LE>()?;
        let action_type = reader.read_u16::<LE>()?;
        let target_id = reader.read_u32::<LE>()?;
        let target_is_bus = reader.read_u8()?;
        let props = PropBundle::read(reader, version)?;
        let ranged_props = RangePropBundle::read(reader, version)?;

        let route = dispatch(action_type, version)?;
        let fade_curve = match route.generic {
            G::Active | G::Play => reader.read_u8()?,
            G::Empty | G::Except => 0,
        };
        let param = match route.generic {
            G::Play => ActionParam::Play {
                fade_curve,
                bank_id: reader.read_u32::<LE>()?,
                bank_type: if version >= 144 {
                    Some(reader.read_u32::<LE>()?)
                } else {
                    None
                },
            },
            _ => ActionParam::Empty,
        };
        let specific = ActionSpecificParam::read(reader, route.specific)?;
        let param = match route.generic {
            G::Active => ActionParam::Active {
                fade_curve,
                except: read_except(reader, version)?,
            },
            G::Except => ActionParam::Except {
                except: read_except(reader, version)?,
            },
            G::Empty | G::Play => param,
        };

        Ok(Action {
            id,
            action_type,
            target_id,
            target_is_bus,
            props,
            ranged_props,
            param,
            specific,
        })
    }

    fn write<W: Write>(&self, writer: &mut W, version: u32) -> Result<()> {
        let route = self.dispatch(version)?;
        if self.param.kind() != route.generic {
            return Err(BnkError::ActionParamMismatch {
                action_type: self.action_type,
                expected: generic_name(route.generic),
                found: generic_name(self.param.kind()),
            });
        }
        if self.specific.kind() != route.specific {
            return Err(BnkError::ActionParamMismatch {
                action_type: self.action_type,
                expected: specific_name(route.specific),
                found: specific_name(self.specific.kind()),
            });
        }

        writer.write_u32::<LE>(self.id)?;
        writer.write_u16::<LE>(self.action_type)?;
        writer.write_u32::<LE>(self.target_id)?;
        writer.write_u8(self.target_is_bus)?;
        self.props.write(writer, version)?;
        self.ranged_props.write(writer, version)?;

        match &self.param {
            ActionParam::Active { fade_curve, .. } => writer.write_u8(*fade_curve)?,
            ActionParam::Play {
                fade_curve,
                bank_id,
                bank_type,
            } => {
                writer.write_u8(*fade_curve)?;
                writer.write_u32::<LE>(*bank_id)?;
                if version >= 144 {
                    writer.write_u32::<LE>(bank_type.unwrap_or_default())?;
                }
            }
            ActionParam::Empty | ActionParam::Except { .. } => {}
        }
        self.specific.write(writer)?;
        match &self.param {
            ActionParam::Active { except, .. } | ActionParam::Except { except } => {
                write_except(writer, except, version)?
            }
            ActionParam::Empty | ActionParam::Play { .. } => {}
        }
        Ok(())
    }
}

fn generic_name(kind: GenericParamKind) -> &'static str {
    match kind {
        G::Empty => "empty",
        G::Active => "active",
        G::Play => "play",
        G::Except => "except",
    }
}

fn specific_name(kind: SpecificParamKind) -> &'static str {
    match kind {
        S::None => "no specific",
        S::Stop => "stop",
        S::Pause => "pause",
        S::Resume => "resume",
        S::Prop => "property",
        S::GameParameter => "game parameter",
        S::ResetGameParameter => "reset game parameter",
        S::State => "state",
        S::Switch => "switch",
        S::BypassFx => "bypass FX",
        S::Seek => "seek",
        S::SetFx => "set FX",
        S::ResetPlaylist => "reset playlist",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn name_at(code: u16, version: u32) -> Option<&'static str> {
        dispatch(code << 8, version).ok().map(|d| d.name)
    }

    #[test]
    fn test_every_code_is_table_defined() {
        let documented_141: &[(u16, &str)] = &[
            (0x01, "Stop"),
            (0x04, "Play"),
            (0x12, "SetState"),
            (0x19, "SetSwitch"),
            (0x1A, "BypassFX"),
            (0x1B, "ResetBypassFX"),
            (0x1C, "Break"),
            (0x1D, "Trigger"),
            (0x1E, "Seek"),
            (0x22, "ResetPlaylist"),
            (0x30, "ResetHPF"),
            (0x31, "SetFX"),
            (0x32, "ResetSetFX"),
        ];
        for (code, name) in documented_141 {
            assert_eq!(name_at(*code, 141), Some(*name), "v141 code {code:#04x}");
        }

        let documented_150: &[(u16, &str)] = &[
            (0x1A, "Break"),
            (0x1B, "Trigger"),
            (0x1C, "BypassFX"),
            (0x1D, "ResetBypassFX"),
            (0x34, "NoOp"),
        ];
        for (code, name) in documented_150 {
            assert_eq!(name_at(*code, 150), Some(*name), "v150 code {code:#04x}");
        }

        for code in 0u16..MUX_TABLE_SIZE as u16 {
            for version in [141, 150] {
                let index = mux_table(version)[code as usize] as usize;
                let result = dispatch(code << 8 | 0x03, version);
                if index == 0 {
                    assert!(matches!(
                        result,
                        Err(BnkError::InvalidActionType { .. })
                    ));
                } else {
                    assert_eq!(result.unwrap(), &ACTION_DISPATCH[index]);
                }
            }
        }
    }

    #[test]
    fn test_invalid_codes() {
        for code in [0x00u16, 0x15, 0x18, 0x23, 0x2F, 0x33, 0x37, 0x38, 0xFF] {
            assert!(name_at(code, 141).is_none(), "{code:#04x}");
            assert!(name_at(code, 150).is_none(), "{code:#04x}");
        }
        assert!(name_at(0x34, 141).is_none());
    }

    #[test]
    fn test_tables_reach_every_entry() {
        let mut seen = vec![false; ACTION_DISPATCH.len()];
        for &index in MUX_LEGACY.iter().chain(MUX_150.iter()) {
            seen[index as usize] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }

    fn stop_action() -> Action {
        Action {
            id: 0x1234,
            action_type: 0x0103,
            target_id: 99,
            target_is_bus: 0,
            props: PropBundle::default(),
            ranged_props: RangePropBundle::default(),
            param: ActionParam::Active {
                fade_curve: 4,
                except: vec![ExceptEntry { id: 7, is_bus: 1 }],
            },
            specific: ActionSpecificParam::Stop { bits: 6 },
        }
    }

    #[test]
    fn test_stop_layout() {
        let action = stop_action();
        let mut out = Vec::new();
        action.write(&mut out, 141).unwrap();

        let mut expected = Vec::new();
        expected.extend_from_slice(&0x1234u32.to_le_bytes());
        expected.extend_from_slice(&0x0103u16.to_le_bytes());
        expected.extend_from_slice(&99u32.to_le_bytes());
        expected.extend_from_slice(&[0, 0, 0]);
        expected.extend_from_slice(&[4, 6, 1]);
        expected.extend_from_slice(&7u32.to_le_bytes());
        expected.push(1);
        assert_eq!(out, expected);

        let decoded = Action::read(&mut Cursor::new(&out), 141).unwrap();
        assert_eq!(decoded, action);
    }

    #[test]
    fn test_play_bank_type_gate() {
        let mut action = stop_action();
        action.action_type = 0x0403;
        action.param = ActionParam::Play {
            fade_curve: 4,
            bank_id: 0xABCD,
            bank_type: Some(0),
        };
        action.specific = ActionSpecificParam::None;

        let mut new = Vec::new();
        action.write(&mut new, 144).unwrap();
        let mut old = Vec::new();
        action.write(&mut old, 141).unwrap();
        assert_eq!(new.len(), old.len() + 4);
    }

    #[test]
    fn test_encode_rejects_mismatched_params() {
        let mut action = stop_action();
        action.specific = ActionSpecificParam::None;
        assert!(matches!(
            action.write(&mut Vec::new(), 141),
            Err(BnkError::ActionParamMismatch {
                action_type: 0x0103,
                ..
            })
        ));
    }

    #[test]
    fn test_bypass_code_moves_at_150() {
        let mut action = stop_action();
        action.action_type = 0x1A01;
        action.param = ActionParam::Except { except: vec![] };
        action.specific = ActionSpecificParam::BypassFx {
            is_bypass: 1,
            target_mask: 0xFF,
        };
        assert!(action.write(&mut Vec::new(), 141).is_ok());
        assert!(matches!(
            action.write(&mut Vec::new(), 150),
            Err(BnkError::ActionParamMismatch { .. })
        ));
    }
}
