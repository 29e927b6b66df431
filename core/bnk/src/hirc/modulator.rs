use byteorder::{LE, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

use super::base::InitialRtpc;
use crate::codec::Codec;
use crate::error::Result;
use crate::props::{PropBundle, RangePropBundle};

/// LFO (type 19), envelope (type 20) and time (type 22) modulators.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Modulator {
    pub id: u32,
    pub props: PropBundle,
    pub ranged_props: RangePropBundle,
    pub rtpcs: InitialRtpc,
}

impl Codec for Modulator {
    fn read<R: Read>(reader: &mut R, version: u32) -> Result<Self> {
        Ok(Modulator {
            id: reader.read_u32::<LE>()?,
            props: PropBundle::read(reader, version)?,
            ranged_props: RangePropBundle::read(reader, version)?,
            rtpcs: InitialRtpc::read(reader, version)?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W, version: u32) -> Result<()> {
        writer.write_u32::<LE>(self.id)?;
        self.props.write(writer, version)?;
        self.ranged_props.write(writer, version)?;
        self.rtpcs.write(writer, version)
    }
}
