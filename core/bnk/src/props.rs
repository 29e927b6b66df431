//! Sparse property bundles embedded in most hierarchy objects.
//!
//! Layout: `u8 count`, `count` property IDs (`u8`), then `count` cells.
//! A plain bundle stores one 4-byte cell per ID, a range bundle a (min, max)
//! pair. Cells are kept as raw bytes; `prop_table` says how to read them.

use byteorder::{ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

use crate::codec::{Codec, count_u8};
use crate::error::{BnkError, Result};
use crate::prop_table::{PropKind, prop_info};

/// Storage cell of a bundle entry.
pub trait PropCell: Copy + std::fmt::Debug {
    fn read_cell<R: Read>(reader: &mut R) -> Result<Self>;
    fn write_cell<W: Write>(&self, writer: &mut W) -> Result<()>;
}

pub type RawValue = [u8; 4];

impl PropCell for RawValue {
    fn read_cell<R: Read>(reader: &mut R) -> Result<Self> {
        let mut cell = [0u8; 4];
        reader.read_exact(&mut cell)?;
        Ok(cell)
    }

    fn write_cell<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(self)?;
        Ok(())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RangeValue {
    pub min: RawValue,
    pub max: RawValue,
}

impl RangeValue {
    pub fn from_f32(min: f32, max: f32) -> Self {
        RangeValue {
            min: min.to_le_bytes(),
            max: max.to_le_bytes(),
        }
    }

    pub fn min_f32(&self) -> f32 {
        f32::from_le_bytes(self.min)
    }

    pub fn max_f32(&self) -> f32 {
        f32::from_le_bytes(self.max)
    }
}

impl PropCell for RangeValue {
    fn read_cell<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(RangeValue {
            min: RawValue::read_cell(reader)?,
            max: RawValue::read_cell(reader)?,
        })
    }

    fn write_cell<W: Write>(&self, writer: &mut W) -> Result<()> {
        self.min.write_cell(writer)?;
        self.max.write_cell(writer)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropEntry<C> {
    pub pid: u8,
    pub value: C,
}

/// Ordered, duplicate-free set of property cells.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(try_from = "Vec<PropEntry<C>>", into = "Vec<PropEntry<C>>")]
#[serde(bound(
    serialize = "C: Serialize + Clone",
    deserialize = "C: Deserialize<'de> + PropCell"
))]
pub struct Bundle<C> {
    entries: Vec<PropEntry<C>>,
}

pub type PropBundle = Bundle<RawValue>;
pub type RangePropBundle = Bundle<RangeValue>;

impl<C> Default for Bundle<C> {
    fn default() -> Self {
        Bundle {
            entries: Vec::new(),
        }
    }
}

impl<C: PropCell> TryFrom<Vec<PropEntry<C>>> for Bundle<C> {
    type Error = BnkError;

    fn try_from(entries: Vec<PropEntry<C>>) -> Result<Self> {
        let mut bundle = Bundle::default();
        for entry in entries {
            bundle.push_unchecked(entry.pid, entry.value)?;
        }
        Ok(bundle)
    }
}

impl<C> From<Bundle<C>> for Vec<PropEntry<C>> {
    fn from(bundle: Bundle<C>) -> Self {
        bundle.entries
    }
}

impl<C: PropCell> Bundle<C> {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[PropEntry<C>] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &PropEntry<C>> {
        self.entries.iter()
    }

    /// Position of `pid` in the bundle, or the position it would be appended at.
    ///
    /// Fails when `pid` is not a property of this bank version.
    pub fn has_pid(&self, pid: u8, version: u32) -> Result<(usize, bool)> {
        check_pid(pid, version)?;
        Ok(match self.position(pid) {
            Some(idx) => (idx, true),
            None => (self.entries.len(), false),
        })
    }

    pub fn get(&self, pid: u8) -> Option<&C> {
        self.position(pid).map(|idx| &self.entries[idx].value)
    }

    /// Append a new property. The ID must be known for `version` and absent.
    pub fn add_with_val(&mut self, pid: u8, value: C, version: u32) -> Result<usize> {
        check_pid(pid, version)?;
        self.push_unchecked(pid, value)
    }

    /// Delete `pid`, keeping the order of the remaining entries.
    pub fn remove(&mut self, pid: u8, version: u32) -> Result<C> {
        check_pid(pid, version)?;
        let idx = self
            .position(pid)
            .ok_or(BnkError::MissingPropertyId(pid))?;
        Ok(self.entries.remove(idx).value)
    }

    /// Overwrite the cell at `index` without touching its ID.
    pub fn set_by_idx(&mut self, index: usize, value: C) -> Result<()> {
        let len = self.entries.len();
        let entry = self
            .entries
            .get_mut(index)
            .ok_or(BnkError::PropertyIndexOutOfRange { index, len })?;
        entry.value = value;
        Ok(())
    }

    fn position(&self, pid: u8) -> Option<usize> {
        self.entries.iter().position(|e| e.pid == pid)
    }

    fn push_unchecked(&mut self, pid: u8, value: C) -> Result<usize> {
        if self.position(pid).is_some() {
            return Err(BnkError::DuplicatePropertyId(pid));
        }
        count_u8(self.entries.len() + 1, "property bundle")?;
        self.entries.push(PropEntry { pid, value });
        Ok(self.entries.len() - 1)
    }
}

impl PropBundle {
    pub fn get_f32(&self, pid: u8) -> Option<f32> {
        self.get(pid).map(|v| f32::from_le_bytes(*v))
    }

    pub fn get_i32(&self, pid: u8) -> Option<i32> {
        self.get(pid).map(|v| i32::from_le_bytes(*v))
    }

    pub fn get_u32(&self, pid: u8) -> Option<u32> {
        self.get(pid).map(|v| u32::from_le_bytes(*v))
    }

    pub fn set_prop_by_idx_f32(&mut self, index: usize, value: f32) -> Result<()> {
        self.set_by_idx(index, value.to_le_bytes())
    }

    pub fn set_prop_by_idx_i32(&mut self, index: usize, value: i32) -> Result<()> {
        self.set_by_idx(index, value.to_le_bytes())
    }

    /// Read a cell through the version's property table.
    pub fn typed(&self, pid: u8, version: u32) -> Option<TypedValue> {
        let raw = *self.get(pid)?;
        let kind = prop_info(pid, version).map_or(PropKind::Uint, |info| info.kind);
        Some(TypedValue::from_raw(raw, kind))
    }
}

impl RangePropBundle {
    pub fn set_range_by_idx_f32(&mut self, index: usize, min: f32, max: f32) -> Result<()> {
        self.set_by_idx(index, RangeValue::from_f32(min, max))
    }
}

/// Cell value interpreted with its property type.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub enum TypedValue {
    Float(f32),
    Int(i32),
    Uint(u32),
}

impl TypedValue {
    pub fn from_raw(raw: RawValue, kind: PropKind) -> Self {
        match kind {
            PropKind::Float => TypedValue::Float(f32::from_le_bytes(raw)),
            PropKind::Int => TypedValue::Int(i32::from_le_bytes(raw)),
            PropKind::Uint => TypedValue::Uint(u32::from_le_bytes(raw)),
        }
    }

    pub fn to_raw(self) -> RawValue {
        match self {
            TypedValue::Float(v) => v.to_le_bytes(),
            TypedValue::Int(v) => v.to_le_bytes(),
            TypedValue::Uint(v) => v.to_le_bytes(),
        }
    }
}

fn check_pid(pid: u8, version: u32) -> Result<()> {
    match prop_info(pid, version) {
        Some(_) => Ok(()),
        None => Err(BnkError::UnknownPropertyId { pid, version }),
    }
}

impl<C: PropCell> Codec for Bundle<C> {
    /// Unknown IDs are accepted here so that banks from tools with newer
    /// property tables still pass through unchanged.
    fn read<R: Read>(reader: &mut R, _version: u32) -> Result<Self> {
        let count = reader.read_u8()? as usize;
        let mut pids = vec![0u8; count];
        reader.read_exact(&mut pids)?;
        let mut bundle = Bundle {
            entries: Vec::with_capacity(count),
        };
        for pid in pids {
            let value = C::read_cell(reader)?;
            bundle.push_unchecked(pid, value)?;
        }
        Ok(bundle)
    }

    fn write<W: Write>(&self, writer: &mut W, _version: u32) -> Result<()> {
        writer.write_u8(count_u8(self.entries.len(), "property bundle")?)?;
        for entry in &self.entries {
            writer.write_u8(entry.pid)?;
        }
        for entry in &self.entries {
            entry.value.write_cell(writer)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const V: u32 = 141;

    #[test]
    fn test_add_then_has_pid() {
        let mut bundle = PropBundle::default();
        let idx = bundle.add_with_val(0x00, (-6.0f32).to_le_bytes(), V).unwrap();
        assert_eq!(idx, 0);
        bundle.add_with_val(0x07, 50.0f32.to_le_bytes(), V).unwrap();

        let (idx, found) = bundle.has_pid(0x07, V).unwrap();
        assert!(found);
        assert_eq!(bundle.entries()[idx].value, 50.0f32.to_le_bytes());

        let (idx, found) = bundle.has_pid(0x02, V).unwrap();
        assert!(!found);
        assert_eq!(idx, 2);
    }

    #[test]
    fn test_duplicate_and_unknown_ids_rejected() {
        let mut bundle = PropBundle::default();
        bundle.add_with_val(0x00, [0; 4], V).unwrap();
        assert!(matches!(
            bundle.add_with_val(0x00, [1; 4], V),
            Err(BnkError::DuplicatePropertyId(0x00))
        ));
        assert!(matches!(
            bundle.add_with_val(0xEE, [1; 4], V),
            Err(BnkError::UnknownPropertyId { pid: 0xEE, .. })
        ));
        assert!(matches!(
            bundle.add_with_val(0x09, [1; 4], V),
            Err(BnkError::UnknownPropertyId { pid: 0x09, .. })
        ));
        assert_eq!(bundle.len(), 1);
    }

    #[test]
    fn test_add_remove_cycles_keep_order_and_uniqueness() {
        let mut bundle = PropBundle::default();
        for pid in [0x00, 0x02, 0x03, 0x07] {
            bundle.add_with_val(pid, [pid; 4], V).unwrap();
        }
        for _ in 0..3 {
            bundle.remove(0x02, V).unwrap();
            bundle.add_with_val(0x02, [0x22; 4], V).unwrap();
        }
        let pids: Vec<u8> = bundle.iter().map(|e| e.pid).collect();
        assert_eq!(pids, vec![0x00, 0x03, 0x07, 0x02]);
        assert!(matches!(
            bundle.remove(0x04, V),
            Err(BnkError::MissingPropertyId(0x04))
        ));
    }

    #[test]
    fn test_set_by_idx_f32() {
        let mut bundle = PropBundle::default();
        bundle.add_with_val(0x00, [0; 4], V).unwrap();
        bundle.set_prop_by_idx_f32(0, -3.5).unwrap();
        assert_eq!(bundle.get_f32(0x00), Some(-3.5));
        assert_eq!(bundle.typed(0x00, V), Some(TypedValue::Float(-3.5)));
        assert!(matches!(
            bundle.set_prop_by_idx_f32(4, 1.0),
            Err(BnkError::PropertyIndexOutOfRange { index: 4, len: 1 })
        ));
    }

    #[test]
    fn test_range_bundle_layout() {
        let mut bundle = RangePropBundle::default();
        bundle
            .add_with_val(0x02, RangeValue::from_f32(-100.0, 100.0), V)
            .unwrap();
        bundle.set_range_by_idx_f32(0, -50.0, 50.0).unwrap();

        let mut out = Vec::new();
        bundle.write(&mut out, V).unwrap();
        assert_eq!(out.len(), 1 + 1 + 8);
        assert_eq!(&out[..2], &[1, 0x02]);
        assert_eq!(&out[2..6], &(-50.0f32).to_le_bytes());

        let back = RangePropBundle::read(&mut Cursor::new(&out), V).unwrap();
        assert_eq!(back, bundle);
    }

    #[test]
    fn test_decode_keeps_unknown_ids_but_rejects_duplicates() {
        let bytes = [2u8, 0xF0, 0x00, 1, 0, 0, 0, 2, 0, 0, 0];
        let bundle = PropBundle::read(&mut Cursor::new(&bytes[..]), V).unwrap();
        assert_eq!(bundle.get_u32(0xF0), Some(1));

        let dup = [2u8, 0x00, 0x00, 1, 0, 0, 0, 2, 0, 0, 0];
        assert!(matches!(
            PropBundle::read(&mut Cursor::new(&dup[..]), V),
            Err(BnkError::DuplicatePropertyId(0x00))
        ));
    }
}
