use byteorder::{LE, WriteBytesExt};
use std::io::Write;

use crate::codec::count_u32;
use crate::error::{Result, ResultExt};
use crate::serde_util::fourcc::tag_to_string;
use crate::types::*;

impl Bank {
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.write(&mut out)?;
        Ok(out)
    }

    /// Write every chunk in stored order. Sizes come from the freshly
    /// encoded bodies.
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        let mut bkhd = Vec::new();
        self.header().write(&mut bkhd)?;
        write_frame(writer, BKHD, &bkhd)?;

        let version = self.version();
        for (index, chunk) in self.chunks().iter().enumerate() {
            let body = encode_chunk(chunk, version)
                .context_with(|| format!("{} chunk #{}", tag_to_string(&chunk.tag()), index))?;
            write_frame(writer, chunk.tag(), &body)?;
        }
        Ok(())
    }
}

pub(crate) fn encode_chunk(chunk: &Chunk, version: u32) -> Result<Vec<u8>> {
    let mut body = Vec::new();
    match chunk {
        Chunk::Didx(index) => index.write(&mut body)?,
        Chunk::Data(data) => body.extend_from_slice(data.bytes()),
        Chunk::Hirc(hirc) => hirc.encode(&mut body, version)?,
        other => {
            if let Some(raw) = other.as_raw() {
                body.extend_from_slice(&raw.data);
            }
        }
    }
    Ok(body)
}

fn write_frame<W: Write>(writer: &mut W, tag: [u8; 4], body: &[u8]) -> Result<()> {
    writer.write_all(&tag)?;
    writer.write_u32::<LE>(count_u32(body.len(), "chunk size")?)?;
    writer.write_all(body)?;
    Ok(())
}
