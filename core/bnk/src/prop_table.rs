//! Property ID tables.
//!
//! Property bundles store raw 4-byte cells. What a cell means (float or
//! integer) depends on the property ID, and the ID numbering moved between
//! bank versions, so every lookup takes the bank version.

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropKind {
    Float,
    Int,
    Uint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropInfo {
    pub id: u8,
    pub name: &'static str,
    pub kind: PropKind,
}

const fn prop(id: u8, name: &'static str, kind: PropKind) -> PropInfo {
    PropInfo { id, name, kind }
}

use PropKind::{Float, Int, Uint};

/// IDs shared by every supported version.
const COMMON: &[PropInfo] = &[
    prop(0x00, "Volume", Float),
    prop(0x01, "LFE", Float),
    prop(0x02, "Pitch", Float),
    prop(0x03, "LPF", Float),
    prop(0x04, "HPF", Float),
    prop(0x05, "BusVolume", Float),
    prop(0x06, "MakeUpGain", Float),
    prop(0x07, "Priority", Float),
    prop(0x08, "PriorityDistanceOffset", Float),
    prop(0x0B, "MuteRatio", Float),
    prop(0x0C, "PAN_LR", Float),
    prop(0x0D, "PAN_FR", Float),
    prop(0x0E, "CenterPCT", Float),
    prop(0x0F, "DelayTime", Int),
    prop(0x10, "TransitionTime", Int),
    prop(0x11, "Probability", Float),
    prop(0x12, "DialogueMode", Uint),
    prop(0x13, "UserAuxSendVolume0", Float),
    prop(0x14, "UserAuxSendVolume1", Float),
    prop(0x15, "UserAuxSendVolume2", Float),
    prop(0x16, "UserAuxSendVolume3", Float),
    prop(0x17, "GameAuxSendVolume", Float),
    prop(0x18, "OutputBusVolume", Float),
    prop(0x19, "OutputBusHPF", Float),
    prop(0x1A, "OutputBusLPF", Float),
    prop(0x1B, "HDRBusThreshold", Float),
    prop(0x1C, "HDRBusRatio", Float),
    prop(0x1D, "HDRBusReleaseTime", Float),
    prop(0x1E, "HDRBusGameParam", Uint),
    prop(0x1F, "HDRBusGameParamMin", Float),
    prop(0x20, "HDRBusGameParamMax", Float),
    prop(0x21, "HDRActiveRange", Float),
    prop(0x22, "LoopStart", Float),
    prop(0x23, "LoopEnd", Float),
    prop(0x24, "TrimInTime", Float),
    prop(0x25, "TrimOutTime", Float),
    prop(0x26, "FadeInTime", Float),
    prop(0x27, "FadeOutTime", Float),
    prop(0x28, "FadeInCurve", Uint),
    prop(0x29, "FadeOutCurve", Uint),
    prop(0x2A, "LoopCrossfadeDuration", Float),
    prop(0x2B, "CrossfadeUpCurve", Uint),
    prop(0x2C, "CrossfadeDownCurve", Uint),
    prop(0x2D, "MidiTrackingRootNote", Int),
    prop(0x2E, "MidiPlayOnNoteType", Int),
    prop(0x2F, "MidiTransposition", Int),
    prop(0x30, "MidiVelocityOffset", Int),
    prop(0x31, "MidiKeyRangeMin", Int),
    prop(0x32, "MidiKeyRangeMax", Int),
    prop(0x33, "MidiVelocityRangeMin", Int),
    prop(0x34, "MidiVelocityRangeMax", Int),
    prop(0x35, "MidiChannelMask", Int),
    prop(0x36, "PlaybackSpeed", Float),
    prop(0x37, "MidiTempoSource", Int),
    prop(0x38, "MidiTargetNode", Uint),
    prop(0x39, "AttachedPluginFXID", Uint),
    prop(0x3A, "Loop", Int),
    prop(0x3B, "InitialDelay", Float),
    prop(0x3C, "UserAuxSendLPF0", Float),
    prop(0x3D, "UserAuxSendLPF1", Float),
    prop(0x3E, "UserAuxSendLPF2", Float),
    prop(0x3F, "UserAuxSendLPF3", Float),
    prop(0x40, "UserAuxSendHPF0", Float),
    prop(0x41, "UserAuxSendHPF1", Float),
    prop(0x42, "UserAuxSendHPF2", Float),
    prop(0x43, "UserAuxSendHPF3", Float),
    prop(0x44, "GameAuxSendLPF", Float),
    prop(0x45, "GameAuxSendHPF", Float),
    prop(0x46, "AttenuationID", Uint),
];

/// Feedback (motion) properties, removed in 2019.
const LEGACY: &[PropInfo] = &[
    prop(0x09, "FeedbackVolume", Float),
    prop(0x0A, "FeedbackLPF", Float),
];

const SINCE_128: &[PropInfo] = &[
    prop(0x47, "PositioningTypeBlend", Float),
    prop(0x48, "ReflectionBusVolume", Float),
];

const SINCE_150: &[PropInfo] = &[prop(0x49, "PAN_UD", Float)];

/// Table buckets that apply to `version`, most specific first.
fn buckets(version: u32) -> &'static [&'static [PropInfo]] {
    match version {
        0..=126 => &[LEGACY, COMMON],
        127..=149 => &[SINCE_128, COMMON],
        _ => &[SINCE_150, SINCE_128, COMMON],
    }
}

/// Look up a property ID for a bank version.
pub fn prop_info(pid: u8, version: u32) -> Option<&'static PropInfo> {
    buckets(version)
        .iter()
        .find_map(|bucket| bucket.iter().find(|info| info.id == pid))
}

pub fn prop_name(pid: u8, version: u32) -> Option<&'static str> {
    prop_info(pid, version).map(|info| info.name)
}

pub fn prop_kind(pid: u8, version: u32) -> Option<PropKind> {
    prop_info(pid, version).map(|info| info.kind)
}

/// Reverse lookup by name, for editing tools that address properties by name.
pub fn prop_id(name: &str, version: u32) -> Option<u8> {
    buckets(version)
        .iter()
        .find_map(|bucket| bucket.iter().find(|info| info.name == name))
        .map(|info| info.id)
}
