//! The HIRC chunk: every playable and structural object of a bank.
//!
//! Layout: `u32 count`, then per object `u8 type, u32 size, size bytes`.
//! Object bodies are independent once their spans are known, so they can be
//! decoded on a thread pool; results are collected in file order.

pub mod attenuation;
pub mod base;
pub mod bus;
pub mod container;
pub mod event;
pub mod fx;
pub mod modulator;
pub mod music;
pub mod sound;
pub mod state;

use byteorder::{LE, ReadBytesExt, WriteBytesExt};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::io::{Cursor, Read, Write};
use tracing::{debug, warn};
use utils::BinReadExt;

use crate::action::Action;
use crate::codec::{Codec, count_u32};
use crate::error::{BnkError, Result, ResultExt};
use crate::options::CancelToken;
use crate::serde_util::hex_bytes;

pub use attenuation::Attenuation;
pub use base::{BaseParameter, Children};
pub use bus::Bus;
pub use container::{ActorMixer, LayerCntr, RanSeqCntr, SwitchCntr};
pub use event::Event;
pub use fx::FxBase;
pub use modulator::Modulator;
pub use music::{MusicRanSeqCntr, MusicSegment, MusicSwitchCntr, MusicTrack};
pub use sound::{BankSourceData, Sound};
pub use state::State;

/// An object whose type this codec keeps as raw bytes.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UnknownObj {
    pub type_code: u8,
    pub id: u32,
    #[serde(with = "hex_bytes")]
    pub data: Vec<u8>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum HircObj {
    State(State),
    Sound(Sound),
    Action(Action),
    Event(Event),
    RanSeqCntr(RanSeqCntr),
    SwitchCntr(SwitchCntr),
    ActorMixer(ActorMixer),
    Bus(Bus),
    LayerCntr(LayerCntr),
    MusicSegment(MusicSegment),
    MusicTrack(MusicTrack),
    MusicSwitchCntr(MusicSwitchCntr),
    MusicRanSeqCntr(MusicRanSeqCntr),
    Attenuation(Attenuation),
    FxShareSet(FxBase),
    FxCustom(FxBase),
    AuxBus(Bus),
    LfoModulator(Modulator),
    EnvelopeModulator(Modulator),
    TimeModulator(Modulator),
    Unknown(UnknownObj),
}

/// Namespaces in which hierarchy IDs must be unique.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HircCategory {
    ActorMixer,
    Music,
    Bus,
    Event,
    Action,
    State,
    Attenuation,
    Effect,
    Modulator,
}

impl HircCategory {
    pub fn name(self) -> &'static str {
        match self {
            HircCategory::ActorMixer => "actor-mixer",
            HircCategory::Music => "music",
            HircCategory::Bus => "bus",
            HircCategory::Event => "event",
            HircCategory::Action => "action",
            HircCategory::State => "state",
            HircCategory::Attenuation => "attenuation",
            HircCategory::Effect => "effect",
            HircCategory::Modulator => "modulator",
        }
    }
}

pub fn type_name(type_code: u8) -> &'static str {
    match type_code {
        1 => "State",
        2 => "Sound",
        3 => "Action",
        4 => "Event",
        5 => "RanSeqCntr",
        6 => "SwitchCntr",
        7 => "ActorMixer",
        8 => "Bus",
        9 => "LayerCntr",
        10 => "MusicSegment",
        11 => "MusicTrack",
        12 => "MusicSwitchCntr",
        13 => "MusicRanSeqCntr",
        14 => "Attenuation",
        15 => "DialogueEvent",
        16 => "FxShareSet",
        17 => "FxCustom",
        18 => "AuxBus",
        19 => "LfoModulator",
        20 => "EnvelopeModulator",
        21 => "AudioDevice",
        22 => "TimeModulator",
        _ => "Unknown",
    }
}

impl HircObj {
    pub fn id(&self) -> u32 {
        match self {
            HircObj::State(o) => o.id,
            HircObj::Sound(o) => o.id,
            HircObj::Action(o) => o.id,
            HircObj::Event(o) => o.id,
            HircObj::RanSeqCntr(o) => o.id,
            HircObj::SwitchCntr(o) => o.id,
            HircObj::ActorMixer(o) => o.id,
            HircObj::Bus(o) | HircObj::AuxBus(o) => o.id,
            HircObj::LayerCntr(o) => o.id,
            HircObj::MusicSegment(o) => o.id,
            HircObj::MusicTrack(o) => o.id,
            HircObj::MusicSwitchCntr(o) => o.id,
            HircObj::MusicRanSeqCntr(o) => o.id,
            HircObj::Attenuation(o) => o.id,
            HircObj::FxShareSet(o) | HircObj::FxCustom(o) => o.id,
            HircObj::LfoModulator(o)
            | HircObj::EnvelopeModulator(o)
            | HircObj::TimeModulator(o) => o.id,
            HircObj::Unknown(o) => o.id,
        }
    }

    pub fn type_code(&self) -> u8 {
        match self {
            HircObj::State(_) => 1,
            HircObj::Sound(_) => 2,
            HircObj::Action(_) => 3,
            HircObj::Event(_) => 4,
            HircObj::RanSeqCntr(_) => 5,
            HircObj::SwitchCntr(_) => 6,
            HircObj::ActorMixer(_) => 7,
            HircObj::Bus(_) => 8,
            HircObj::LayerCntr(_) => 9,
            HircObj::MusicSegment(_) => 10,
            HircObj::MusicTrack(_) => 11,
            HircObj::MusicSwitchCntr(_) => 12,
            HircObj::MusicRanSeqCntr(_) => 13,
            HircObj::Attenuation(_) => 14,
            HircObj::FxShareSet(_) => 16,
            HircObj::FxCustom(_) => 17,
            HircObj::AuxBus(_) => 18,
            HircObj::LfoModulator(_) => 19,
            HircObj::EnvelopeModulator(_) => 20,
            HircObj::TimeModulator(_) => 22,
            HircObj::Unknown(o) => o.type_code,
        }
    }

    pub fn type_name(&self) -> &'static str {
        type_name(self.type_code())
    }

    /// Uniqueness namespace; opaque objects are not indexed.
    pub fn category(&self) -> Option<HircCategory> {
        Some(match self {
            HircObj::Sound(_)
            | HircObj::RanSeqCntr(_)
            | HircObj::SwitchCntr(_)
            | HircObj::ActorMixer(_)
            | HircObj::LayerCntr(_) => HircCategory::ActorMixer,
            HircObj::MusicSegment(_)
            | HircObj::MusicTrack(_)
            | HircObj::MusicSwitchCntr(_)
            | HircObj::MusicRanSeqCntr(_) => HircCategory::Music,
            HircObj::Bus(_) | HircObj::AuxBus(_) => HircCategory::Bus,
            HircObj::Event(_) => HircCategory::Event,
            HircObj::Action(_) => HircCategory::Action,
            HircObj::State(_) => HircCategory::State,
            HircObj::Attenuation(_) => HircCategory::Attenuation,
            HircObj::FxShareSet(_) | HircObj::FxCustom(_) => HircCategory::Effect,
            HircObj::LfoModulator(_)
            | HircObj::EnvelopeModulator(_)
            | HircObj::TimeModulator(_) => HircCategory::Modulator,
            HircObj::Unknown(_) => return None,
        })
    }

    pub fn base(&self) -> Option<&BaseParameter> {
        match self {
            HircObj::Sound(o) => Some(&o.base),
            HircObj::RanSeqCntr(o) => Some(&o.base),
            HircObj::SwitchCntr(o) => Some(&o.base),
            HircObj::ActorMixer(o) => Some(&o.base),
            HircObj::LayerCntr(o) => Some(&o.base),
            HircObj::MusicSegment(o) => Some(&o.node.base),
            HircObj::MusicTrack(o) => Some(&o.base),
            HircObj::MusicSwitchCntr(o) => Some(&o.trans.node.base),
            HircObj::MusicRanSeqCntr(o) => Some(&o.trans.node.base),
            _ => None,
        }
    }

    pub fn base_mut(&mut self) -> Option<&mut BaseParameter> {
        match self {
            HircObj::Sound(o) => Some(&mut o.base),
            HircObj::RanSeqCntr(o) => Some(&mut o.base),
            HircObj::SwitchCntr(o) => Some(&mut o.base),
            HircObj::ActorMixer(o) => Some(&mut o.base),
            HircObj::LayerCntr(o) => Some(&mut o.base),
            HircObj::MusicSegment(o) => Some(&mut o.node.base),
            HircObj::MusicTrack(o) => Some(&mut o.base),
            HircObj::MusicSwitchCntr(o) => Some(&mut o.trans.node.base),
            HircObj::MusicRanSeqCntr(o) => Some(&mut o.trans.node.base),
            _ => None,
        }
    }

    fn read_body<R: Read>(
        type_code: u8,
        reader: &mut R,
        size: usize,
        version: u32,
    ) -> Result<Self> {
        Ok(match type_code {
            1 => HircObj::State(State::read(reader, version)?),
            2 => HircObj::Sound(Sound::read(reader, version)?),
            3 => HircObj::Action(Action::read(reader, version)?),
            4 => HircObj::Event(Event::read(reader, version)?),
            5 => HircObj::RanSeqCntr(RanSeqCntr::read(reader, version)?),
            6 => HircObj::SwitchCntr(SwitchCntr::read(reader, version)?),
            7 => HircObj::ActorMixer(ActorMixer::read(reader, version)?),
            8 => HircObj::Bus(Bus::read(reader, version)?),
            9 => HircObj::LayerCntr(LayerCntr::read(reader, version)?),
            10 => HircObj::MusicSegment(MusicSegment::read(reader, version)?),
            11 => HircObj::MusicTrack(MusicTrack::read(reader, version)?),
            12 => HircObj::MusicSwitchCntr(MusicSwitchCntr::read(reader, version)?),
            13 => HircObj::MusicRanSeqCntr(MusicRanSeqCntr::read(reader, version)?),
            14 => HircObj::Attenuation(Attenuation::read(reader, version)?),
            16 => HircObj::FxShareSet(FxBase::read(reader, version)?),
            17 => HircObj::FxCustom(FxBase::read(reader, version)?),
            18 => HircObj::AuxBus(Bus::read(reader, version)?),
            19 => HircObj::LfoModulator(Modulator::read(reader, version)?),
            20 => HircObj::EnvelopeModulator(Modulator::read(reader, version)?),
            22 => HircObj::TimeModulator(Modulator::read(reader, version)?),
            _ => {
                let id = reader.read_u32::<LE>()?;
                warn!(type_code, id, "keeping HIRC object of unhandled type as raw bytes");
                HircObj::Unknown(UnknownObj {
                    type_code,
                    id,
                    data: reader.read_bytes(size.saturating_sub(4))?,
                })
            }
        })
    }

    fn write_body<W: Write>(&self, writer: &mut W, version: u32) -> Result<()> {
        match self {
            HircObj::State(o) => o.write(writer, version),
            HircObj::Sound(o) => o.write(writer, version),
            HircObj::Action(o) => o.write(writer, version),
            HircObj::Event(o) => o.write(writer, version),
            HircObj::RanSeqCntr(o) => o.write(writer, version),
            HircObj::SwitchCntr(o) => o.write(writer, version),
            HircObj::ActorMixer(o) => o.write(writer, version),
            HircObj::Bus(o) | HircObj::AuxBus(o) => o.write(writer, version),
            HircObj::LayerCntr(o) => o.write(writer, version),
            HircObj::MusicSegment(o) => o.write(writer, version),
            HircObj::MusicTrack(o) => o.write(writer, version),
            HircObj::MusicSwitchCntr(o) => o.write(writer, version),
            HircObj::MusicRanSeqCntr(o) => o.write(writer, version),
            HircObj::Attenuation(o) => o.write(writer, version),
            HircObj::FxShareSet(o) | HircObj::FxCustom(o) => o.write(writer, version),
            HircObj::LfoModulator(o)
            | HircObj::EnvelopeModulator(o)
            | HircObj::TimeModulator(o) => o.write(writer, version),
            HircObj::Unknown(o) => {
                writer.write_u32::<LE>(o.id)?;
                writer.write_all(&o.data)?;
                Ok(())
            }
        }
    }

    /// Serialized body, as stored after the `u8 type, u32 size` header.
    pub fn encode_body(&self, version: u32) -> Result<Vec<u8>> {
        let mut body = Vec::new();
        self.write_body(&mut body, version)?;
        Ok(body)
    }
}

/// Span of one object inside the HIRC body.
struct ObjectSpan {
    index: usize,
    type_code: u8,
    start: usize,
    size: usize,
}

impl ObjectSpan {
    fn context(&self, body: &[u8]) -> String {
        let id = body
            .get(self.start..self.start + 4)
            .and_then(|b| <[u8; 4]>::try_from(b).ok())
            .map(u32::from_le_bytes);
        match id {
            Some(id) => format!(
                "HIRC object #{} ({}, id {})",
                self.index,
                type_name(self.type_code),
                id
            ),
            None => format!("HIRC object #{} ({})", self.index, type_name(self.type_code)),
        }
    }

    /// Decode the object and check it consumed exactly its declared size.
    ///
    /// The reader sees the rest of the HIRC body, not just the declared span,
    /// so a decoder that runs long is reported as a size mismatch, including
    /// one that runs past the end of the chunk.
    fn decode(&self, body: &[u8], version: u32) -> Result<HircObj> {
        // Every object starts with its u32 id.
        if self.size == 0 {
            return Err(BnkError::NothingConsumed {
                context: self.context(body),
            });
        }
        let rest = &body[self.start..];
        let mut cursor = Cursor::new(rest);
        let object = match HircObj::read_body(self.type_code, &mut cursor, self.size, version) {
            Ok(object) => object,
            Err(e) if e.is_eof() => {
                return Err(BnkError::SizeMismatch {
                    context: self.context(body),
                    declared: self.size as u64,
                    consumed: rest.len() as u64 + 1,
                });
            }
            Err(e) => return Err(e.context(self.context(body))),
        };
        let consumed = cursor.position();
        if consumed == 0 {
            return Err(BnkError::NothingConsumed {
                context: self.context(body),
            });
        }
        if consumed != self.size as u64 {
            return Err(BnkError::SizeMismatch {
                context: self.context(body),
                declared: self.size as u64,
                consumed,
            });
        }
        Ok(object)
    }
}

/// Ordered hierarchy objects plus a per-category ID index.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(try_from = "Vec<HircObj>", into = "Vec<HircObj>")]
pub struct Hirc {
    objects: Vec<HircObj>,
    index: HashMap<(HircCategory, u32), usize>,
}

impl TryFrom<Vec<HircObj>> for Hirc {
    type Error = BnkError;

    fn try_from(objects: Vec<HircObj>) -> Result<Self> {
        let mut hirc = Hirc {
            objects,
            index: HashMap::new(),
        };
        hirc.reindex()?;
        Ok(hirc)
    }
}

impl From<Hirc> for Vec<HircObj> {
    fn from(hirc: Hirc) -> Self {
        hirc.objects
    }
}

impl Hirc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn objects(&self) -> &[HircObj] {
        &self.objects
    }

    /// Objects in file order. Call `reindex` after changing any object ID.
    pub fn objects_mut(&mut self) -> &mut [HircObj] {
        &mut self.objects
    }

    pub fn get(&self, category: HircCategory, id: u32) -> Option<&HircObj> {
        self.index.get(&(category, id)).map(|&i| &self.objects[i])
    }

    pub fn get_mut(&mut self, category: HircCategory, id: u32) -> Option<&mut HircObj> {
        match self.index.get(&(category, id)) {
            Some(&i) => self.objects.get_mut(i),
            None => None,
        }
    }

    /// First object with `id` in any category, in file order.
    pub fn find(&self, id: u32) -> Option<&HircObj> {
        self.objects.iter().find(|obj| obj.id() == id)
    }

    /// IDs of a category in file order.
    pub fn category_ids(&self, category: HircCategory) -> Vec<u32> {
        self.objects
            .iter()
            .filter(|obj| obj.category() == Some(category))
            .map(HircObj::id)
            .collect()
    }

    /// Append an object; its ID must be new within its category.
    pub fn push(&mut self, object: HircObj) -> Result<usize> {
        let position = self.objects.len();
        if let Some(category) = object.category() {
            let key = (category, object.id());
            if self.index.contains_key(&key) {
                return Err(BnkError::DuplicateHircId {
                    category: category.name(),
                    id: key.1,
                });
            }
            self.index.insert(key, position);
        }
        self.objects.push(object);
        Ok(position)
    }

    pub fn remove(&mut self, category: HircCategory, id: u32) -> Result<Option<HircObj>> {
        let Some(position) = self.index.get(&(category, id)).copied() else {
            return Ok(None);
        };
        let object = self.objects.remove(position);
        self.reindex()?;
        Ok(Some(object))
    }

    /// Rebuild the ID index, failing on duplicates within a category.
    pub fn reindex(&mut self) -> Result<()> {
        self.index.clear();
        self.index.reserve(self.objects.len());
        for (position, object) in self.objects.iter().enumerate() {
            let Some(category) = object.category() else {
                continue;
            };
            if self.index.insert((category, object.id()), position).is_some() {
                return Err(BnkError::DuplicateHircId {
                    category: category.name(),
                    id: object.id(),
                });
            }
        }
        Ok(())
    }

    pub fn events(&self) -> impl Iterator<Item = &Event> {
        self.objects.iter().filter_map(|obj| match obj {
            HircObj::Event(event) => Some(event),
            _ => None,
        })
    }

    pub fn actions(&self) -> impl Iterator<Item = &Action> {
        self.objects.iter().filter_map(|obj| match obj {
            HircObj::Action(action) => Some(action),
            _ => None,
        })
    }

    pub fn sounds(&self) -> impl Iterator<Item = &Sound> {
        self.objects.iter().filter_map(|obj| match obj {
            HircObj::Sound(sound) => Some(sound),
            _ => None,
        })
    }

    /// Object count per type name.
    pub fn type_counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for object in &self.objects {
            *counts.entry(object.type_name()).or_insert(0) += 1;
        }
        counts
    }

    pub(crate) fn decode(
        body: &[u8],
        version: u32,
        parallel: bool,
        cancel: &CancelToken,
    ) -> Result<Self> {
        let spans = split_objects(body)?;
        let decode_one = |span: &ObjectSpan| -> Result<HircObj> {
            cancel.check()?;
            span.decode(body, version)
        };
        let objects = if parallel {
            spans.par_iter().map(decode_one).collect::<Result<Vec<_>>>()?
        } else {
            spans.iter().map(decode_one).collect::<Result<Vec<_>>>()?
        };
        debug!(objects = objects.len(), parallel, "decoded HIRC");
        Hirc::try_from(objects)
    }

    pub(crate) fn encode<W: Write>(&self, writer: &mut W, version: u32) -> Result<()> {
        writer.write_u32::<LE>(count_u32(self.objects.len(), "HIRC objects")?)?;
        for (index, object) in self.objects.iter().enumerate() {
            let body = object.encode_body(version).context_with(|| {
                format!(
                    "HIRC object #{} ({}, id {})",
                    index,
                    object.type_name(),
                    object.id()
                )
            })?;
            writer.write_u8(object.type_code())?;
            writer.write_u32::<LE>(count_u32(body.len(), "HIRC object size")?)?;
            writer.write_all(&body)?;
        }
        Ok(())
    }
}

fn read_header(cursor: &mut Cursor<&[u8]>) -> Result<(u8, usize)> {
    let type_code = cursor.read_u8()?;
    let size = cursor.read_u32::<LE>()? as usize;
    Ok((type_code, size))
}

/// Walk the object headers and return each object's span.
fn split_objects(body: &[u8]) -> Result<Vec<ObjectSpan>> {
    let mut cursor = Cursor::new(body);
    let count = cursor.read_u32::<LE>()? as usize;
    let mut spans = Vec::with_capacity(count.min(body.len() / 9 + 1));
    for index in 0..count {
        let (type_code, size) =
            read_header(&mut cursor).context_with(|| format!("HIRC object #{index} header"))?;
        let start = cursor.position() as usize;
        let available = body.len() - start;
        if size > available {
            return Err(BnkError::Truncated {
                context: "HIRC object body",
                needed: size as u64,
                available: available as u64,
            }
            .context(format!("HIRC object #{} ({})", index, type_name(type_code))));
        }
        spans.push(ObjectSpan {
            index,
            type_code,
            start,
            size,
        });
        cursor.set_position((start + size) as u64);
    }
    let consumed = cursor.position();
    if consumed != body.len() as u64 {
        return Err(BnkError::SizeMismatch {
            context: "HIRC chunk".to_string(),
            declared: body.len() as u64,
            consumed,
        });
    }
    Ok(spans)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object_bytes(type_code: u8, body: &[u8]) -> Vec<u8> {
        let mut out = vec![type_code];
        out.extend_from_slice(&(body.len() as u32).to_le_bytes());
        out.extend_from_slice(body);
        out
    }

    fn hirc_bytes(objects: &[Vec<u8>]) -> Vec<u8> {
        let mut out = (objects.len() as u32).to_le_bytes().to_vec();
        for object in objects {
            out.extend_from_slice(object);
        }
        out
    }

    fn event(id: u32, actions: Vec<u32>) -> HircObj {
        HircObj::Event(Event { id, actions })
    }

    #[test]
    fn test_duplicate_id_within_category_is_fatal() {
        let mut hirc = Hirc::new();
        hirc.push(event(1, vec![])).unwrap();
        assert!(matches!(
            hirc.push(event(1, vec![2])),
            Err(BnkError::DuplicateHircId {
                category: "event",
                id: 1
            })
        ));
        hirc.push(HircObj::State(State { id: 1, props: vec![] })).unwrap();
        assert_eq!(hirc.len(), 2);
    }

    #[test]
    fn test_decode_keeps_file_order() {
        let version = 141;
        let objects: Vec<Vec<u8>> = (0..200u32)
            .map(|id| {
                let body = event(1000 - id, vec![id]).encode_body(version).unwrap();
                object_bytes(4, &body)
            })
            .collect();
        let body = hirc_bytes(&objects);
        let hirc = Hirc::decode(&body, version, true, &CancelToken::new()).unwrap();
        let ids: Vec<u32> = hirc.objects().iter().map(HircObj::id).collect();
        let expected: Vec<u32> = (0..200u32).map(|id| 1000 - id).collect();
        assert_eq!(ids, expected);

        let mut encoded = Vec::new();
        hirc.encode(&mut encoded, version).unwrap();
        assert_eq!(encoded, body);
    }

    #[test]
    fn test_unknown_type_is_kept() {
        let body = hirc_bytes(&[object_bytes(21, &[1, 0, 0, 0, 0xAA, 0xBB])]);
        let hirc = Hirc::decode(&body, 141, false, &CancelToken::new()).unwrap();
        assert_eq!(
            hirc.objects()[0],
            HircObj::Unknown(UnknownObj {
                type_code: 21,
                id: 1,
                data: vec![0xAA, 0xBB],
            })
        );
        let mut encoded = Vec::new();
        hirc.encode(&mut encoded, 141).unwrap();
        assert_eq!(encoded, body);
    }

    #[test]
    fn test_object_longer_than_decoder_reads() {
        let mut body = event(5, vec![]).encode_body(141).unwrap();
        body.push(0);
        let bytes = hirc_bytes(&[object_bytes(4, &body)]);
        let err = Hirc::decode(&bytes, 141, false, &CancelToken::new()).unwrap_err();
        assert!(matches!(
            err,
            BnkError::SizeMismatch {
                declared: 6,
                consumed: 5,
                ..
            }
        ));
    }

    #[test]
    fn test_last_object_shorter_than_decoder_reads() {
        let mut body = event(5, vec![]).encode_body(141).unwrap();
        body.pop();
        let bytes = hirc_bytes(&[object_bytes(4, &body)]);
        let err = Hirc::decode(&bytes, 141, false, &CancelToken::new()).unwrap_err();
        assert!(
            matches!(
                err,
                BnkError::SizeMismatch {
                    declared: 4,
                    consumed: 5,
                    ..
                }
            ),
            "{err}"
        );
    }

    #[test]
    fn test_empty_object_body() {
        let bytes = hirc_bytes(&[object_bytes(4, &[])]);
        assert!(matches!(
            Hirc::decode(&bytes, 141, false, &CancelToken::new()),
            Err(BnkError::NothingConsumed { .. })
        ));
    }

    #[test]
    fn test_trailing_bytes_after_objects() {
        let mut bytes = hirc_bytes(&[]);
        bytes.push(0);
        assert!(matches!(
            Hirc::decode(&bytes, 141, false, &CancelToken::new()),
            Err(BnkError::SizeMismatch { .. })
        ));
    }

    #[test]
    fn test_cancelled_decode() {
        let body = hirc_bytes(&[object_bytes(
            4,
            &event(1, vec![]).encode_body(141).unwrap(),
        )]);
        let token = CancelToken::new();
        token.cancel();
        assert!(matches!(
            Hirc::decode(&body, 141, true, &token),
            Err(BnkError::Cancelled)
        ));
    }

    #[test]
    fn test_json_round_trip_rebuilds_index() {
        let mut hirc = Hirc::new();
        hirc.push(event(7, vec![8])).unwrap();
        let json = serde_json::to_string(&hirc).unwrap();
        let back: Hirc = serde_json::from_str(&json).unwrap();
        assert!(back.get(HircCategory::Event, 7).is_some());

        let duplicate = format!("[{0},{0}]", serde_json::to_string(&event(7, vec![])).unwrap());
        assert!(serde_json::from_str::<Hirc>(&duplicate).is_err());
    }
}
