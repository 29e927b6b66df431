use byteorder::{LE, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

use super::base::InitialRtpc;
use crate::codec::{
    Codec, GraphPoint, count_u8, count_u16, read_gated_u8, read_list, write_gated_u8, write_list,
};
use crate::error::Result;

/// Curve slots: volume dry, volume wet (game), volume wet (user), LPF, HPF,
/// spread, focus. `-1` marks an unused slot.
pub const CURVE_SLOTS: usize = 7;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct ConeParams {
    pub inside_degrees: f32,
    pub outside_degrees: f32,
    pub outside_volume: f32,
    pub lo_pass: f32,
    pub hi_pass: f32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct AttenuationCurve {
    pub scaling: u8,
    pub points: Vec<GraphPoint>,
}

/// HIRC attenuation share set (type 14).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Attenuation {
    pub id: u32,
    /// Version 136 onwards.
    pub is_height_spread_enabled: Option<u8>,
    pub is_cone_enabled: u8,
    pub cone: Option<ConeParams>,
    pub curves_to_use: [i8; CURVE_SLOTS],
    pub curves: Vec<AttenuationCurve>,
    pub rtpcs: InitialRtpc,
}

impl Codec for Attenuation {
    fn read<R: Read>(reader: &mut R, version: u32) -> Result<Self> {
        let id = reader.read_u32::<LE>()?;
        let is_height_spread_enabled = read_gated_u8(reader, version >= 136)?;
        let is_cone_enabled = reader.read_u8()?;
        let cone = if is_cone_enabled & 1 != 0 {
            Some(ConeParams {
                inside_degrees: reader.read_f32::<LE>()?,
                outside_degrees: reader.read_f32::<LE>()?,
                outside_volume: reader.read_f32::<LE>()?,
                lo_pass: reader.read_f32::<LE>()?,
                hi_pass: reader.read_f32::<LE>()?,
            })
        } else {
            None
        };
        let mut curves_to_use = [0i8; CURVE_SLOTS];
        for slot in curves_to_use.iter_mut() {
            *slot = reader.read_i8()?;
        }
        let count = reader.read_u8()? as usize;
        let mut curves = Vec::with_capacity(count);
        for _ in 0..count {
            let scaling = reader.read_u8()?;
            let points = reader.read_u16::<LE>()? as usize;
            curves.push(AttenuationCurve {
                scaling,
                points: read_list(reader, points, version)?,
            });
        }
        Ok(Attenuation {
            id,
            is_height_spread_enabled,
            is_cone_enabled,
            cone,
            curves_to_use,
            curves,
            rtpcs: InitialRtpc::read(reader, version)?,
        })
    }

    fn write<W: Write>(&self, writer: &mut W, version: u32) -> Result<()> {
        writer.write_u32::<LE>(self.id)?;
        write_gated_u8(writer, version >= 136, self.is_height_spread_enabled)?;
        writer.write_u8(self.is_cone_enabled)?;
        if self.is_cone_enabled & 1 != 0 {
            let cone = self.cone.unwrap_or_default();
            writer.write_f32::<LE>(cone.inside_degrees)?;
            writer.write_f32::<LE>(cone.outside_degrees)?;
            writer.write_f32::<LE>(cone.outside_volume)?;
            writer.write_f32::<LE>(cone.lo_pass)?;
            writer.write_f32::<LE>(cone.hi_pass)?;
        }
        for slot in self.curves_to_use {
            writer.write_i8(slot)?;
        }
        writer.write_u8(count_u8(self.curves.len(), "attenuation curves")?)?;
        for curve in &self.curves {
            writer.write_u8(curve.scaling)?;
            writer.write_u16::<LE>(count_u16(curve.points.len(), "curve points")?)?;
            write_list(writer, &curve.points, version)?;
        }
        self.rtpcs.write(writer, version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_cone_and_height_gates() {
        let attenuation = Attenuation {
            id: 9,
            is_height_spread_enabled: Some(1),
            is_cone_enabled: 1,
            cone: Some(ConeParams {
                inside_degrees: 90.0,
                outside_degrees: 180.0,
                outside_volume: -6.0,
                lo_pass: 10.0,
                hi_pass: 0.0,
            }),
            curves_to_use: [0, -1, -1, 1, -1, -1, -1],
            curves: vec![
                AttenuationCurve {
                    scaling: 2,
                    points: vec![GraphPoint::default(); 3],
                },
                AttenuationCurve {
                    scaling: 0,
                    points: vec![GraphPoint::default(); 2],
                },
            ],
            rtpcs: InitialRtpc::default(),
        };

        let mut new = Vec::new();
        attenuation.write(&mut new, 140).unwrap();
        assert_eq!(Attenuation::read(&mut Cursor::new(&new), 140).unwrap(), attenuation);

        let mut old = Vec::new();
        attenuation.write(&mut old, 135).unwrap();
        assert_eq!(new.len(), old.len() + 1);
        let decoded = Attenuation::read(&mut Cursor::new(&old), 135).unwrap();
        assert_eq!(decoded.is_height_spread_enabled, None);
        assert_eq!(decoded.cone, attenuation.cone);
    }
}
