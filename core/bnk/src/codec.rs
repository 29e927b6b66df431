use byteorder::{LE, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};
use utils::{BinReadExt, BinWriteExt};

use crate::error::{BnkError, Result};
use crate::version::uses_var_counts;

/// Upper bound for speculative allocations driven by counts read from a file.
const MAX_PREALLOC: usize = 1024;

/// A structure with a version dependent binary layout.
pub(crate) trait Codec: Sized {
    fn read<R: Read>(reader: &mut R, version: u32) -> Result<Self>;
    fn write<W: Write>(&self, writer: &mut W, version: u32) -> Result<()>;
}

pub(crate) fn read_list<T: Codec, R: Read>(
    reader: &mut R,
    count: usize,
    version: u32,
) -> Result<Vec<T>> {
    let mut items = Vec::with_capacity(count.min(MAX_PREALLOC));
    for _ in 0..count {
        items.push(T::read(reader, version)?);
    }
    Ok(items)
}

pub(crate) fn write_list<T: Codec, W: Write>(
    writer: &mut W,
    items: &[T],
    version: u32,
) -> Result<()> {
    for item in items {
        item.write(writer, version)?;
    }
    Ok(())
}

pub(crate) fn read_ids<R: Read>(reader: &mut R, count: usize) -> Result<Vec<u32>> {
    let mut ids = Vec::with_capacity(count.min(MAX_PREALLOC));
    for _ in 0..count {
        ids.push(reader.read_u32::<LE>()?);
    }
    Ok(ids)
}

pub(crate) fn write_ids<W: Write>(writer: &mut W, ids: &[u32]) -> Result<()> {
    for id in ids {
        writer.write_u32::<LE>(*id)?;
    }
    Ok(())
}

/// `u32` count followed by that many `u32` IDs.
pub(crate) fn read_id_list<R: Read>(reader: &mut R) -> Result<Vec<u32>> {
    let count = reader.read_u32::<LE>()? as usize;
    read_ids(reader, count)
}

pub(crate) fn write_id_list<W: Write>(writer: &mut W, ids: &[u32]) -> Result<()> {
    writer.write_u32::<LE>(count_u32(ids.len(), "ID list")?)?;
    write_ids(writer, ids)
}

/// Count field that is a varint on newer banks and a `u32` on older ones.
pub(crate) fn read_var_count<R: Read>(reader: &mut R, version: u32) -> Result<usize> {
    let count = if uses_var_counts(version) {
        reader.read_var_u32()?
    } else {
        reader.read_u32::<LE>()?
    };
    Ok(count as usize)
}

pub(crate) fn write_var_count<W: Write>(
    writer: &mut W,
    count: usize,
    version: u32,
    context: &'static str,
) -> Result<()> {
    let count = count_u32(count, context)?;
    if uses_var_counts(version) {
        writer.write_var_u32(count)?;
    } else {
        writer.write_u32::<LE>(count)?;
    }
    Ok(())
}

pub(crate) fn count_u8(count: usize, context: &'static str) -> Result<u8> {
    u8::try_from(count).map_err(|_| BnkError::CountOverflow { context, count })
}

pub(crate) fn count_u16(count: usize, context: &'static str) -> Result<u16> {
    u16::try_from(count).map_err(|_| BnkError::CountOverflow { context, count })
}

pub(crate) fn count_u32(count: usize, context: &'static str) -> Result<u32> {
    u32::try_from(count).map_err(|_| BnkError::CountOverflow { context, count })
}

/// Write an optional field whose presence is decided by the version, not by the value.
pub(crate) fn write_gated_u8<W: Write>(
    writer: &mut W,
    present: bool,
    value: Option<u8>,
) -> Result<()> {
    if present {
        writer.write_u8(value.unwrap_or_default())?;
    }
    Ok(())
}

pub(crate) fn write_gated_u32<W: Write>(
    writer: &mut W,
    present: bool,
    value: Option<u32>,
) -> Result<()> {
    if present {
        writer.write_u32::<LE>(value.unwrap_or_default())?;
    }
    Ok(())
}

pub(crate) fn read_gated_u8<R: Read>(reader: &mut R, present: bool) -> Result<Option<u8>> {
    Ok(if present { Some(reader.read_u8()?) } else { None })
}

pub(crate) fn read_gated_u32<R: Read>(reader: &mut R, present: bool) -> Result<Option<u32>> {
    Ok(if present { Some(reader.read_u32::<LE>()?) } else { None })
}

/// One point of an RTPC, attenuation or automation curve.
#[derive(serde::Serialize, serde::Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct GraphPoint {
    pub from: f32,
    pub to: f32,
    pub interp: u32,
}

impl Codec for GraphPoint {
    fn read<R: Read>(reader: &mut R, _version: u32) -> Result<Self> {
        Ok(GraphPoint {
            from: reader.read_f32::<LE>()?,
            to: reader.read_f32::<LE>()?,
            interp: reader.read_u32::<LE>()?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W, _version: u32) -> Result<()> {
        writer.write_f32::<LE>(self.from)?;
        writer.write_f32::<LE>(self.to)?;
        writer.write_u32::<LE>(self.interp)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_var_count_switches_width() {
        let mut old = Vec::new();
        write_var_count(&mut old, 3, 120, "test").unwrap();
        assert_eq!(old, [3, 0, 0, 0]);

        let mut new = Vec::new();
        write_var_count(&mut new, 3, 141, "test").unwrap();
        assert_eq!(new, [3]);

        assert_eq!(read_var_count(&mut Cursor::new(&old), 120).unwrap(), 3);
        assert_eq!(read_var_count(&mut Cursor::new(&new), 141).unwrap(), 3);
    }

    #[test]
    fn test_count_overflow() {
        assert!(matches!(
            count_u8(256, "props"),
            Err(BnkError::CountOverflow { count: 256, .. })
        ));
        assert_eq!(count_u16(65535, "points").unwrap(), 65535);
    }
}
