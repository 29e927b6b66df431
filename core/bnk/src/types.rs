use byteorder::{LE, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::ops::Range;
use utils::BinReadExt;

use crate::error::{BnkError, IntegrityError, Result};
use crate::hirc::Hirc;
use crate::serde_util::{fourcc, hex_bytes};
use crate::version::check_version;

pub const BKHD: [u8; 4] = *b"BKHD";
pub const DIDX: [u8; 4] = *b"DIDX";
pub const DATA: [u8; 4] = *b"DATA";
pub const HIRC: [u8; 4] = *b"HIRC";
pub const ENVS: [u8; 4] = *b"ENVS";
pub const FXPR: [u8; 4] = *b"FXPR";
pub const INIT: [u8; 4] = *b"INIT";
pub const PLAT: [u8; 4] = *b"PLAT";
pub const STID: [u8; 4] = *b"STID";
pub const STMG: [u8; 4] = *b"STMG";
pub const META: [u8; 4] = *b"META";

/// Every top-level tag the format defines.
pub const KNOWN_TAGS: [[u8; 4]; 11] = [
    BKHD, DIDX, DATA, HIRC, ENVS, FXPR, INIT, PLAT, STID, STMG, META,
];

const BKHD_FIXED_LEN: usize = 20;
const MEDIA_ENTRY_LEN: usize = 12;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct BankHeader {
    pub version: u32,
    pub bank_id: u32,
    pub language_id: u32,
    pub alignment: u16,
    pub device_allocated: u16,
    pub project_id: u32,
    /// Bytes after the fixed fields, kept verbatim.
    #[serde(with = "hex_bytes")]
    pub tail: Vec<u8>,
}

impl BankHeader {
    /// Decode a BKHD body and validate its version.
    pub fn decode(body: &[u8]) -> Result<Self> {
        if body.len() < BKHD_FIXED_LEN {
            return Err(BnkError::Truncated {
                context: "BKHD",
                needed: BKHD_FIXED_LEN as u64,
                available: body.len() as u64,
            });
        }
        let mut reader = Cursor::new(body);
        let version = check_version(reader.read_u32::<LE>()?)?;
        let bank_id = reader.read_u32::<LE>()?;
        let language_id = reader.read_u32::<LE>()?;
        let alignment = reader.read_u16::<LE>()?;
        let device_allocated = reader.read_u16::<LE>()?;
        let project_id = reader.read_u32::<LE>()?;
        Ok(BankHeader {
            version,
            bank_id,
            language_id,
            alignment,
            device_allocated,
            project_id,
            tail: body[BKHD_FIXED_LEN..].to_vec(),
        })
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u32::<LE>(self.version)?;
        writer.write_u32::<LE>(self.bank_id)?;
        writer.write_u32::<LE>(self.language_id)?;
        writer.write_u16::<LE>(self.alignment)?;
        writer.write_u16::<LE>(self.device_allocated)?;
        writer.write_u32::<LE>(self.project_id)?;
        writer.write_all(&self.tail)?;
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MediaIndexEntry {
    pub source_id: u32,
    pub offset: u32,
    pub size: u32,
}

/// DIDX: where each embedded media lives inside DATA.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
#[serde(try_from = "Vec<MediaIndexEntry>", into = "Vec<MediaIndexEntry>")]
pub struct MediaIndex {
    entries: Vec<MediaIndexEntry>,
    by_source: HashMap<u32, usize>,
}

impl TryFrom<Vec<MediaIndexEntry>> for MediaIndex {
    type Error = BnkError;

    fn try_from(entries: Vec<MediaIndexEntry>) -> Result<Self> {
        let mut index = MediaIndex::default();
        for entry in entries {
            index.push(entry)?;
        }
        Ok(index)
    }
}

impl From<MediaIndex> for Vec<MediaIndexEntry> {
    fn from(index: MediaIndex) -> Self {
        index.entries
    }
}

impl MediaIndex {
    pub fn decode(body: &[u8]) -> Result<Self> {
        if body.len() % MEDIA_ENTRY_LEN != 0 {
            return Err(BnkError::SizeMismatch {
                context: "DIDX chunk".to_string(),
                declared: body.len() as u64,
                consumed: (body.len() - body.len() % MEDIA_ENTRY_LEN) as u64,
            });
        }
        let mut reader = Cursor::new(body);
        let mut index = MediaIndex::default();
        for _ in 0..body.len() / MEDIA_ENTRY_LEN {
            index.push(MediaIndexEntry {
                source_id: reader.read_u32::<LE>()?,
                offset: reader.read_u32::<LE>()?,
                size: reader.read_u32::<LE>()?,
            })?;
        }
        Ok(index)
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        for entry in &self.entries {
            writer.write_u32::<LE>(entry.source_id)?;
            writer.write_u32::<LE>(entry.offset)?;
            writer.write_u32::<LE>(entry.size)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[MediaIndexEntry] {
        &self.entries
    }

    pub fn get(&self, source_id: u32) -> Option<&MediaIndexEntry> {
        self.by_source.get(&source_id).map(|&i| &self.entries[i])
    }

    pub fn push(&mut self, entry: MediaIndexEntry) -> Result<()> {
        if self.by_source.contains_key(&entry.source_id) {
            return Err(BnkError::DuplicateMediaEntry(entry.source_id));
        }
        self.by_source.insert(entry.source_id, self.entries.len());
        self.entries.push(entry);
        Ok(())
    }

    pub fn set_size(&mut self, source_id: u32, size: u32) -> Result<()> {
        let i = *self
            .by_source
            .get(&source_id)
            .ok_or(BnkError::MissingAudio(source_id))?;
        self.entries[i].size = size;
        Ok(())
    }

    pub fn remove(&mut self, source_id: u32) -> Option<MediaIndexEntry> {
        let i = self.by_source.remove(&source_id)?;
        let entry = self.entries.remove(i);
        for position in self.by_source.values_mut() {
            if *position > i {
                *position -= 1;
            }
        }
        Some(entry)
    }

    fn entries_mut(&mut self) -> impl Iterator<Item = &mut MediaIndexEntry> {
        self.entries.iter_mut()
    }
}

/// DATA: the embedded media payloads, addressed by source ID.
///
/// The buffer is not serialized; media travel next to the JSON as files.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct DataChunk {
    #[serde(skip)]
    bytes: Vec<u8>,
    #[serde(skip)]
    ranges: HashMap<u32, Range<usize>>,
}

impl DataChunk {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        DataChunk {
            bytes,
            ranges: HashMap::new(),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn range(&self, source_id: u32) -> Option<Range<usize>> {
        self.ranges.get(&source_id).cloned()
    }

    pub fn audio(&self, source_id: u32) -> Option<&[u8]> {
        self.ranges.get(&source_id).map(|r| &self.bytes[r.clone()])
    }

    /// Source IDs with a byte range, sorted by offset.
    pub fn source_ids(&self) -> Vec<u32> {
        let mut ids: Vec<_> = self.ranges.iter().map(|(id, r)| (r.start, *id)).collect();
        ids.sort_unstable();
        ids.into_iter().map(|(_, id)| id).collect()
    }

    /// Map DIDX entries to byte ranges; entries pointing outside the buffer are skipped.
    pub(crate) fn link(&mut self, index: &MediaIndex) {
        self.ranges.clear();
        for entry in index.entries() {
            let start = entry.offset as usize;
            let end = start.saturating_add(entry.size as usize);
            if end <= self.bytes.len() {
                self.ranges.insert(entry.source_id, start..end);
            }
        }
    }

    pub fn append_audio(&mut self, source_id: u32, audio: &[u8]) -> Result<()> {
        if self.ranges.contains_key(&source_id) {
            return Err(BnkError::DuplicateAudio(source_id));
        }
        let start = self.bytes.len();
        self.bytes.extend_from_slice(audio);
        self.ranges.insert(source_id, start..self.bytes.len());
        Ok(())
    }

    /// Swap a payload in place, shifting every range behind it.
    pub fn replace_audio(&mut self, source_id: u32, audio: &[u8]) -> Result<()> {
        let old = self
            .range(source_id)
            .ok_or(BnkError::MissingAudio(source_id))?;
        let _ = self.bytes.splice(old.clone(), audio.iter().copied());
        let new_end = old.start + audio.len();
        self.shift_after(old.end, new_end as isize - old.end as isize);
        self.ranges.insert(source_id, old.start..new_end);
        Ok(())
    }

    pub fn remove_audio(&mut self, source_id: u32) -> Result<Vec<u8>> {
        let old = self
            .ranges
            .remove(&source_id)
            .ok_or(BnkError::MissingAudio(source_id))?;
        let removed: Vec<u8> = self.bytes.drain(old.clone()).collect();
        self.shift_after(old.end, -(removed.len() as isize));
        Ok(removed)
    }

    fn shift_after(&mut self, boundary: usize, delta: isize) {
        if delta == 0 {
            return;
        }
        for range in self.ranges.values_mut() {
            if range.start >= boundary {
                range.start = range.start.saturating_add_signed(delta);
                range.end = range.end.saturating_add_signed(delta);
            }
        }
    }

    /// Rebuild the buffer with payloads in `order`, then anything left over.
    fn repack(&mut self, order: &[u32]) {
        let mut bytes = Vec::with_capacity(self.bytes.len());
        let mut ranges = HashMap::with_capacity(self.ranges.len());
        let mut place = |source_id: u32, ranges: &mut HashMap<u32, Range<usize>>| {
            if let Some(old) = self.ranges.get(&source_id) {
                let start = bytes.len();
                bytes.extend_from_slice(&self.bytes[old.clone()]);
                ranges.insert(source_id, start..bytes.len());
            }
        };
        for source_id in order {
            place(*source_id, &mut ranges);
        }
        for source_id in self.source_ids() {
            if !ranges.contains_key(&source_id) {
                place(source_id, &mut ranges);
            }
        }
        self.bytes = bytes;
        self.ranges = ranges;
    }
}

/// A chunk this codec stores without interpreting.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RawChunk {
    #[serde(with = "fourcc")]
    pub tag: [u8; 4],
    #[serde(with = "hex_bytes")]
    pub data: Vec<u8>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BankName {
    pub id: u32,
    pub name: String,
}

impl RawChunk {
    /// STID body: `u32 string type, u32 count, count × (u32 id, u8 len, name)`.
    pub fn parse_bank_names(&self) -> Result<Vec<BankName>> {
        let mut reader = Cursor::new(&self.data);
        let _string_type = reader.read_u32::<LE>()?;
        let count = reader.read_u32::<LE>()? as usize;
        let mut names = Vec::with_capacity(count.min(256));
        for _ in 0..count {
            let id = reader.read_u32::<LE>()?;
            let len = reader.read_u8()? as usize;
            let name = reader.read_bytes(len)?;
            names.push(BankName {
                id,
                name: String::from_utf8_lossy(&name).into_owned(),
            });
        }
        Ok(names)
    }

    /// PLAT body: a null-terminated platform name.
    pub fn parse_platform(&self) -> Result<String> {
        Ok(Cursor::new(&self.data).read_null_term_string()?)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum Chunk {
    Didx(MediaIndex),
    Data(DataChunk),
    Hirc(Hirc),
    Envs(RawChunk),
    Fxpr(RawChunk),
    Init(RawChunk),
    Plat(RawChunk),
    Stid(RawChunk),
    Stmg(RawChunk),
    Meta(RawChunk),
    Unknown(RawChunk),
}

impl Chunk {
    /// Wrap an uninterpreted body in the variant matching its tag.
    pub fn raw(tag: [u8; 4], data: Vec<u8>) -> Self {
        let raw = RawChunk { tag, data };
        match &tag {
            b"ENVS" => Chunk::Envs(raw),
            b"FXPR" => Chunk::Fxpr(raw),
            b"INIT" => Chunk::Init(raw),
            b"PLAT" => Chunk::Plat(raw),
            b"STID" => Chunk::Stid(raw),
            b"STMG" => Chunk::Stmg(raw),
            b"META" => Chunk::Meta(raw),
            _ => Chunk::Unknown(raw),
        }
    }

    pub fn tag(&self) -> [u8; 4] {
        match self {
            Chunk::Didx(_) => DIDX,
            Chunk::Data(_) => DATA,
            Chunk::Hirc(_) => HIRC,
            Chunk::Envs(raw)
            | Chunk::Fxpr(raw)
            | Chunk::Init(raw)
            | Chunk::Plat(raw)
            | Chunk::Stid(raw)
            | Chunk::Stmg(raw)
            | Chunk::Meta(raw)
            | Chunk::Unknown(raw) => raw.tag,
        }
    }

    pub fn as_raw(&self) -> Option<&RawChunk> {
        match self {
            Chunk::Didx(_) | Chunk::Data(_) | Chunk::Hirc(_) => None,
            Chunk::Envs(raw)
            | Chunk::Fxpr(raw)
            | Chunk::Init(raw)
            | Chunk::Plat(raw)
            | Chunk::Stid(raw)
            | Chunk::Stmg(raw)
            | Chunk::Meta(raw)
            | Chunk::Unknown(raw) => Some(raw),
        }
    }
}

/// One sound bank. BKHD is held apart from the other chunks since it is
/// always first and always present; `chunks` keeps the rest in file order.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(try_from = "BankParts")]
pub struct Bank {
    header: BankHeader,
    chunks: Vec<Chunk>,
}

#[derive(Deserialize)]
struct BankParts {
    header: BankHeader,
    chunks: Vec<Chunk>,
}

impl TryFrom<BankParts> for Bank {
    type Error = BnkError;

    fn try_from(parts: BankParts) -> Result<Self> {
        check_version(parts.header.version)?;
        Bank::from_parts(parts.header, parts.chunks)
    }
}

impl Bank {
    /// Assemble a bank, requiring a HIRC chunk.
    pub fn from_parts(header: BankHeader, chunks: Vec<Chunk>) -> Result<Self> {
        if !chunks.iter().any(|c| matches!(c, Chunk::Hirc(_))) {
            return Err(BnkError::MissingChunk("HIRC"));
        }
        let mut bank = Bank { header, chunks };
        bank.link_media();
        Ok(bank)
    }

    pub fn header(&self) -> &BankHeader {
        &self.header
    }

    pub fn header_mut(&mut self) -> &mut BankHeader {
        &mut self.header
    }

    pub fn version(&self) -> u32 {
        self.header.version
    }

    /// Chunks after BKHD, in file order.
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn chunk(&self, tag: [u8; 4]) -> Option<&Chunk> {
        self.chunks.iter().find(|c| c.tag() == tag)
    }

    pub fn media_index(&self) -> Option<&MediaIndex> {
        self.chunks.iter().find_map(|c| match c {
            Chunk::Didx(index) => Some(index),
            _ => None,
        })
    }

    pub fn media_index_mut(&mut self) -> Option<&mut MediaIndex> {
        self.chunks.iter_mut().find_map(|c| match c {
            Chunk::Didx(index) => Some(index),
            _ => None,
        })
    }

    pub fn data(&self) -> Option<&DataChunk> {
        self.chunks.iter().find_map(|c| match c {
            Chunk::Data(data) => Some(data),
            _ => None,
        })
    }

    pub fn data_mut(&mut self) -> Option<&mut DataChunk> {
        self.chunks.iter_mut().find_map(|c| match c {
            Chunk::Data(data) => Some(data),
            _ => None,
        })
    }

    pub fn hierarchy(&self) -> Option<&Hirc> {
        self.chunks.iter().find_map(|c| match c {
            Chunk::Hirc(hirc) => Some(hirc),
            _ => None,
        })
    }

    pub fn hierarchy_mut(&mut self) -> Option<&mut Hirc> {
        self.chunks.iter_mut().find_map(|c| match c {
            Chunk::Hirc(hirc) => Some(hirc),
            _ => None,
        })
    }

    /// Referenced bank names from STID, if present.
    pub fn bank_names(&self) -> Result<Option<Vec<BankName>>> {
        match self.chunk(STID).and_then(Chunk::as_raw) {
            Some(raw) => raw.parse_bank_names().map(Some),
            None => Ok(None),
        }
    }

    /// Platform name from PLAT, if present.
    pub fn platform(&self) -> Result<Option<String>> {
        match self.chunk(PLAT).and_then(Chunk::as_raw) {
            Some(raw) => raw.parse_platform().map(Some),
            None => Ok(None),
        }
    }

    /// Replace the whole DATA buffer and map it through DIDX. A missing DATA
    /// chunk is created right after DIDX (or BKHD).
    pub fn set_data(&mut self, bytes: Vec<u8>) {
        let data = Chunk::Data(DataChunk::from_bytes(bytes));
        match self.chunks.iter().position(|c| matches!(c, Chunk::Data(_))) {
            Some(position) => self.chunks[position] = data,
            None => {
                let at = self
                    .chunks
                    .iter()
                    .position(|c| matches!(c, Chunk::Didx(_)))
                    .map_or(0, |i| i + 1);
                self.chunks.insert(at, data);
            }
        }
        self.link_media();
    }

    pub fn media(&self, source_id: u32) -> Option<&[u8]> {
        self.data()?.audio(source_id)
    }

    /// Add a payload to DATA. DIDX is not touched; reconcile with
    /// `compute_didx_offset` and `check_didx_data`.
    pub fn append_audio(&mut self, source_id: u32, audio: &[u8]) -> Result<()> {
        if self.data().is_none() {
            self.set_data(Vec::new());
        }
        self.data_mut()
            .ok_or(BnkError::MissingChunk("DATA"))?
            .append_audio(source_id, audio)
    }

    pub fn replace_audio(&mut self, source_id: u32, audio: &[u8]) -> Result<()> {
        self.data_mut()
            .ok_or(BnkError::MissingAudio(source_id))?
            .replace_audio(source_id, audio)
    }

    pub fn remove_audio(&mut self, source_id: u32) -> Result<Vec<u8>> {
        self.data_mut()
            .ok_or(BnkError::MissingAudio(source_id))?
            .remove_audio(source_id)
    }

    /// Lay DATA out in DIDX order and set each offset to the sum of the
    /// sizes before it. Alignment padding between payloads is dropped.
    pub fn compute_didx_offset(&mut self) -> Result<()> {
        let Some(index) = self.media_index() else {
            return Ok(());
        };
        let order: Vec<u32> = index.entries().iter().map(|e| e.source_id).collect();
        if let Some(data) = self.data_mut() {
            data.repack(&order);
        }
        let Some(index) = self.media_index_mut() else {
            return Ok(());
        };
        let mut offset: u32 = 0;
        for entry in index.entries_mut() {
            entry.offset = offset;
            offset = offset
                .checked_add(entry.size)
                .ok_or(BnkError::CountOverflow {
                    context: "DATA size",
                    count: offset as usize + entry.size as usize,
                })?;
        }
        Ok(())
    }

    /// Every DIDX entry must match a DATA range of the same size and offset,
    /// every DATA payload must be indexed, and DATA bytes outside those ranges
    /// may only be alignment padding, shorter than the BKHD alignment.
    pub fn check_didx_data(&self) -> std::result::Result<(), IntegrityError> {
        let (index, data) = match (self.media_index(), self.data()) {
            (None, None) => return Ok(()),
            (Some(index), None) if index.is_empty() => return Ok(()),
            (Some(_), None) => return Err(IntegrityError::MissingDataChunk),
            (None, Some(data)) if data.is_empty() => return Ok(()),
            (None, Some(_)) => return Err(IntegrityError::MissingMediaIndex),
            (Some(index), Some(data)) => (index, data),
        };

        for entry in index.entries() {
            let source_id = entry.source_id;
            let range = data
                .range(source_id)
                .ok_or(IntegrityError::MissingData { source_id })?;
            if range.len() != entry.size as usize {
                return Err(IntegrityError::SizeMismatch {
                    source_id,
                    index_size: entry.size,
                    data_size: range.len() as u32,
                });
            }
            if range.start != entry.offset as usize {
                return Err(IntegrityError::OffsetMismatch {
                    source_id,
                    index_offset: entry.offset,
                    data_offset: range.start as u32,
                });
            }
        }
        for source_id in data.source_ids() {
            if index.get(source_id).is_none() {
                return Err(IntegrityError::OrphanData { source_id });
            }
        }

        let padding = usize::from(self.header.alignment).max(1);
        let gap = |start: usize, end: usize| {
            if end - start >= padding {
                Err(IntegrityError::OrphanBytes {
                    offset: start as u32,
                    len: (end - start) as u32,
                })
            } else {
                Ok(())
            }
        };
        let mut covered = 0;
        for range in data.source_ids().into_iter().filter_map(|id| data.range(id)) {
            if range.start > covered {
                gap(covered, range.start)?;
            }
            covered = covered.max(range.end);
        }
        if data.len() > covered {
            gap(covered, data.len())?;
        }
        Ok(())
    }

    fn link_media(&mut self) {
        let Some(index) = self.media_index().cloned() else {
            return;
        };
        if let Some(data) = self.data_mut() {
            data.link(&index);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bank_with(chunks: Vec<Chunk>) -> Bank {
        let mut all = chunks;
        all.push(Chunk::Hirc(Hirc::new()));
        Bank::from_parts(
            BankHeader {
                version: 141,
                ..Default::default()
            },
            all,
        )
        .unwrap()
    }

    fn entry(source_id: u32, offset: u32, size: u32) -> MediaIndexEntry {
        MediaIndexEntry {
            source_id,
            offset,
            size,
        }
    }

    #[test]
    fn test_missing_data_then_append_and_reconcile() {
        let mut index = MediaIndex::default();
        index.push(entry(7, 0, 100)).unwrap();
        let mut bank = bank_with(vec![Chunk::Didx(index)]);

        assert_eq!(
            bank.check_didx_data(),
            Err(IntegrityError::MissingDataChunk)
        );
        bank.append_audio(7, &[0x11; 100]).unwrap();
        bank.compute_didx_offset().unwrap();
        assert_eq!(bank.check_didx_data(), Ok(()));
        assert!(matches!(bank.chunks()[1], Chunk::Data(_)));
    }

    #[test]
    fn test_indexed_source_without_range() {
        let mut index = MediaIndex::default();
        index.push(entry(1, 0, 4)).unwrap();
        index.push(entry(2, 4, 100)).unwrap();
        let data = DataChunk::from_bytes(vec![1, 2, 3, 4]);
        let bank = bank_with(vec![Chunk::Didx(index), Chunk::Data(data)]);
        assert_eq!(
            bank.check_didx_data(),
            Err(IntegrityError::MissingData { source_id: 2 })
        );
    }

    #[test]
    fn test_replace_shifts_following_ranges() {
        let mut index = MediaIndex::default();
        index.push(entry(1, 0, 3)).unwrap();
        index.push(entry(2, 3, 2)).unwrap();
        let data = DataChunk::from_bytes(vec![1, 1, 1, 2, 2]);
        let mut bank = bank_with(vec![Chunk::Didx(index), Chunk::Data(data)]);
        assert_eq!(bank.check_didx_data(), Ok(()));

        bank.replace_audio(1, &[9; 6]).unwrap();
        assert_eq!(bank.media(2), Some(&[2u8, 2][..]));
        assert_eq!(
            bank.check_didx_data(),
            Err(IntegrityError::SizeMismatch {
                source_id: 1,
                index_size: 3,
                data_size: 6
            })
        );

        bank.media_index_mut().unwrap().set_size(1, 6).unwrap();
        bank.compute_didx_offset().unwrap();
        assert_eq!(bank.check_didx_data(), Ok(()));
        assert_eq!(bank.media_index().unwrap().get(2).unwrap().offset, 6);
    }

    #[test]
    fn test_orphan_payload() {
        let mut bank = bank_with(vec![Chunk::Didx(MediaIndex::default())]);
        bank.append_audio(5, &[1, 2, 3]).unwrap();
        assert_eq!(
            bank.check_didx_data(),
            Err(IntegrityError::OrphanData { source_id: 5 })
        );
        bank.remove_audio(5).unwrap();
        assert_eq!(bank.check_didx_data(), Ok(()));
    }

    #[test]
    fn test_unindexed_data_bytes() {
        let mut index = MediaIndex::default();
        index.push(entry(1, 0, 2)).unwrap();
        index.push(entry(2, 8, 2)).unwrap();
        let mut bytes = vec![0xAA; 2];
        bytes.resize(8, 0);
        bytes.extend_from_slice(&[0xBB; 2]);
        let mut bank = bank_with(vec![
            Chunk::Didx(index),
            Chunk::Data(DataChunk::from_bytes(bytes.clone())),
        ]);
        assert_eq!(
            bank.check_didx_data(),
            Err(IntegrityError::OrphanBytes { offset: 2, len: 6 })
        );

        bank.header_mut().alignment = 8;
        assert_eq!(bank.check_didx_data(), Ok(()));

        bytes.extend_from_slice(&[0xEE; 500]);
        bank.set_data(bytes);
        assert_eq!(
            bank.check_didx_data(),
            Err(IntegrityError::OrphanBytes {
                offset: 10,
                len: 500
            })
        );
    }

    #[test]
    fn test_compute_offsets_drops_padding() {
        let mut index = MediaIndex::default();
        index.push(entry(1, 0, 2)).unwrap();
        index.push(entry(2, 16, 2)).unwrap();
        let mut bytes = vec![0xAA, 0xAA];
        bytes.resize(16, 0);
        bytes.extend_from_slice(&[0xBB, 0xBB]);
        let mut bank = bank_with(vec![
            Chunk::Didx(index),
            Chunk::Data(DataChunk::from_bytes(bytes)),
        ]);
        bank.header_mut().alignment = 16;
        assert_eq!(bank.check_didx_data(), Ok(()));

        bank.compute_didx_offset().unwrap();
        assert_eq!(bank.data().unwrap().bytes(), &[0xAA, 0xAA, 0xBB, 0xBB]);
        assert_eq!(bank.media_index().unwrap().get(2).unwrap().offset, 2);
        assert_eq!(bank.check_didx_data(), Ok(()));
    }

    #[test]
    fn test_duplicate_media_entry() {
        let mut index = MediaIndex::default();
        index.push(entry(1, 0, 1)).unwrap();
        assert!(matches!(
            index.push(entry(1, 1, 1)),
            Err(BnkError::DuplicateMediaEntry(1))
        ));
        index.remove(1).unwrap();
        assert!(index.is_empty());
    }

    #[test]
    fn test_header_tail_is_kept() {
        let mut body = Vec::new();
        body.extend_from_slice(&141u32.to_le_bytes());
        body.extend_from_slice(&[1, 0, 0, 0, 2, 0, 0, 0, 0x10, 0, 1, 0, 3, 0, 0, 0]);
        body.extend_from_slice(&[0xEE; 8]);
        let header = BankHeader::decode(&body).unwrap();
        assert_eq!(header.alignment, 0x10);
        assert_eq!(header.device_allocated, 1);
        assert_eq!(header.tail, vec![0xEE; 8]);
        let mut out = Vec::new();
        header.write(&mut out).unwrap();
        assert_eq!(out, body);

        assert!(matches!(
            BankHeader::decode(&body[..12]),
            Err(BnkError::Truncated { .. })
        ));
    }

    #[test]
    fn test_stid_and_plat_views() {
        let mut stid = Vec::new();
        stid.extend_from_slice(&1u32.to_le_bytes());
        stid.extend_from_slice(&1u32.to_le_bytes());
        stid.extend_from_slice(&0x1234u32.to_le_bytes());
        stid.push(4);
        stid.extend_from_slice(b"Init");
        let bank = bank_with(vec![
            Chunk::raw(STID, stid),
            Chunk::raw(PLAT, b"Windows\0".to_vec()),
        ]);
        assert_eq!(
            bank.bank_names().unwrap(),
            Some(vec![BankName {
                id: 0x1234,
                name: "Init".to_string()
            }])
        );
        assert_eq!(bank.platform().unwrap().as_deref(), Some("Windows"));
    }
}
