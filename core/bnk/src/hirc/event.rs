use byteorder::{LE, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

use crate::codec::{Codec, read_ids, read_var_count, write_ids, write_var_count};
use crate::error::Result;

/// HIRC event (type 4): an ordered list of action IDs.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct Event {
    pub id: u32,
    pub actions: Vec<u32>,
}

impl Codec for Event {
    fn read<R: Read>(reader: &mut R, version: u32) -> Result<Self> {
        let id = reader.read_u32::<LE>()?;
        let count = read_var_count(reader, version)?;
        Ok(Event {
            id,
            actions: read_ids(reader, count)?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W, version: u32) -> Result<()> {
        writer.write_u32::<LE>(self.id)?;
        write_var_count(writer, self.actions.len(), version, "event actions")?;
        write_ids(writer, &self.actions)
    }
}
