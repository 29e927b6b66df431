//! Effect plugin parameter blocks.
//!
//! A plugin ID selects a fixed layout for the built-in effects this codec
//! understands. Bytes past the fixed fields but inside the declared length are
//! kept in `tail`. Every other plugin is carried as an opaque blob of exactly
//! the declared length.

use byteorder::{LE, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use utils::BinReadExt;

use crate::codec::count_u32;
use crate::error::{BnkError, Result};
use crate::serde_util::hex_bytes;

pub const PARAMETRIC_EQ_ID: u32 = 0x0069_0003;
pub const COMPRESSOR_ID: u32 = 0x006C_0003;
pub const EXPANDER_ID: u32 = 0x006D_0003;
pub const PEAK_LIMITER_ID: u32 = 0x006E_0003;
pub const METER_ID: u32 = 0x0081_0003;
pub const GAIN_ID: u32 = 0x008B_0003;

/// Plugin type nibble for source plugins (tone generator, silence, ...).
pub const PLUGIN_TYPE_SOURCE: u32 = 2;

pub fn plugin_type(plugin_id: u32) -> u32 {
    plugin_id & 0x0F
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct EqBand {
    pub filter_type: u32,
    pub gain: f32,
    pub frequency: f32,
    pub q_factor: f32,
    pub on_off: u8,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct ParametricEqParams {
    pub bands: [EqBand; 3],
    pub output_level: f32,
    pub process_lfe: u8,
    #[serde(with = "hex_bytes")]
    pub tail: Vec<u8>,
}

/// Shared by the compressor and the expander.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct DynamicsParams {
    pub threshold: f32,
    pub ratio: f32,
    pub attack: f32,
    pub release: f32,
    pub gain: f32,
    pub process_lfe: u8,
    pub channel_link: u8,
    #[serde(with = "hex_bytes")]
    pub tail: Vec<u8>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct PeakLimiterParams {
    pub threshold: f32,
    pub ratio: f32,
    pub look_ahead: f32,
    pub release: f32,
    pub gain: f32,
    pub process_lfe: u8,
    pub channel_link: u8,
    #[serde(with = "hex_bytes")]
    pub tail: Vec<u8>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct MeterParams {
    pub attack: f32,
    pub release: f32,
    pub min: f32,
    pub max: f32,
    pub hold: f32,
    pub mode: u8,
    pub scope: u8,
    pub apply_downstream_volume: u8,
    pub game_param_id: u32,
    #[serde(with = "hex_bytes")]
    pub tail: Vec<u8>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct GainParams {
    pub fullband_gain: f32,
    pub lfe_gain: f32,
    #[serde(with = "hex_bytes")]
    pub tail: Vec<u8>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum PluginParam {
    ParametricEq(ParametricEqParams),
    Compressor(DynamicsParams),
    Expander(DynamicsParams),
    PeakLimiter(PeakLimiterParams),
    Meter(MeterParams),
    Gain(GainParams),
    /// Parameters of a plugin without a known layout.
    Placeholder(#[serde(with = "hex_bytes")] Vec<u8>),
}

impl Default for PluginParam {
    fn default() -> Self {
        PluginParam::Placeholder(Vec::new())
    }
}

const EQ_BAND_SIZE: u32 = 17;
const PARAMETRIC_EQ_SIZE: u32 = EQ_BAND_SIZE * 3 + 5;
const DYNAMICS_SIZE: u32 = 22;
const METER_SIZE: u32 = 27;
const GAIN_SIZE: u32 = 8;

impl PluginParam {
    /// Decode a parameter block of exactly `size` bytes.
    pub fn read<R: Read>(reader: &mut R, plugin_id: u32, size: u32) -> Result<Self> {
        if size == 0 {
            return Ok(PluginParam::Placeholder(Vec::new()));
        }
        let tail_after = |fixed: u32| -> Result<usize> {
            if size < fixed {
                return Err(BnkError::PluginParamOverrun {
                    plugin_id,
                    declared: size,
                    required: fixed,
                });
            }
            Ok((size - fixed) as usize)
        };

        let param = match plugin_id {
            PARAMETRIC_EQ_ID => {
                let tail_len = tail_after(PARAMETRIC_EQ_SIZE)?;
                let mut bands = [EqBand::default(); 3];
                for band in bands.iter_mut() {
                    *band = EqBand {
                        filter_type: reader.read_u32::<LE>()?,
                        gain: reader.read_f32::<LE>()?,
                        frequency: reader.read_f32::<LE>()?,
                        q_factor: reader.read_f32::<LE>()?,
                        on_off: reader.read_u8()?,
                    };
                }
                PluginParam::ParametricEq(ParametricEqParams {
                    bands,
                    output_level: reader.read_f32::<LE>()?,
                    process_lfe: reader.read_u8()?,
                    tail: reader.read_bytes(tail_len)?,
                })
            }
            COMPRESSOR_ID => {
                PluginParam::Compressor(read_dynamics(reader, tail_after(DYNAMICS_SIZE)?)?)
            }
            EXPANDER_ID => {
                PluginParam::Expander(read_dynamics(reader, tail_after(DYNAMICS_SIZE)?)?)
            }
            PEAK_LIMITER_ID => {
                let tail_len = tail_after(DYNAMICS_SIZE)?;
                PluginParam::PeakLimiter(PeakLimiterParams {
                    threshold: reader.read_f32::<LE>()?,
                    ratio: reader.read_f32::<LE>()?,
                    look_ahead: reader.read_f32::<LE>()?,
                    release: reader.read_f32::<LE>()?,
                    gain: reader.read_f32::<LE>()?,
                    process_lfe: reader.read_u8()?,
                    channel_link: reader.read_u8()?,
                    tail: reader.read_bytes(tail_len)?,
                })
            }
            METER_ID => {
                let tail_len = tail_after(METER_SIZE)?;
                PluginParam::Meter(MeterParams {
                    attack: reader.read_f32::<LE>()?,
                    release: reader.read_f32::<LE>()?,
                    min: reader.read_f32::<LE>()?,
                    max: reader.read_f32::<LE>()?,
                    hold: reader.read_f32::<LE>()?,
                    mode: reader.read_u8()?,
                    scope: reader.read_u8()?,
                    apply_downstream_volume: reader.read_u8()?,
                    game_param_id: reader.read_u32::<LE>()?,
                    tail: reader.read_bytes(tail_len)?,
                })
            }
            GAIN_ID => {
                let tail_len = tail_after(GAIN_SIZE)?;
                PluginParam::Gain(GainParams {
                    fullband_gain: reader.read_f32::<LE>()?,
                    lfe_gain: reader.read_f32::<LE>()?,
                    tail: reader.read_bytes(tail_len)?,
                })
            }
            _ => PluginParam::Placeholder(reader.read_bytes(size as usize)?),
        };
        debug_assert_eq!(param.encoded_len(), size as usize);
        Ok(param)
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        match self {
            PluginParam::ParametricEq(p) => {
                for band in &p.bands {
                    writer.write_u32::<LE>(band.filter_type)?;
                    writer.write_f32::<LE>(band.gain)?;
                    writer.write_f32::<LE>(band.frequency)?;
                    writer.write_f32::<LE>(band.q_factor)?;
                    writer.write_u8(band.on_off)?;
                }
                writer.write_f32::<LE>(p.output_level)?;
                writer.write_u8(p.process_lfe)?;
                writer.write_all(&p.tail)?;
            }
            PluginParam::Compressor(p) | PluginParam::Expander(p) => write_dynamics(writer, p)?,
            PluginParam::PeakLimiter(p) => {
                writer.write_f32::<LE>(p.threshold)?;
                writer.write_f32::<LE>(p.ratio)?;
                writer.write_f32::<LE>(p.look_ahead)?;
                writer.write_f32::<LE>(p.release)?;
                writer.write_f32::<LE>(p.gain)?;
                writer.write_u8(p.process_lfe)?;
                writer.write_u8(p.channel_link)?;
                writer.write_all(&p.tail)?;
            }
            PluginParam::Meter(p) => {
                writer.write_f32::<LE>(p.attack)?;
                writer.write_f32::<LE>(p.release)?;
                writer.write_f32::<LE>(p.min)?;
                writer.write_f32::<LE>(p.max)?;
                writer.write_f32::<LE>(p.hold)?;
                writer.write_u8(p.mode)?;
                writer.write_u8(p.scope)?;
                writer.write_u8(p.apply_downstream_volume)?;
                writer.write_u32::<LE>(p.game_param_id)?;
                writer.write_all(&p.tail)?;
            }
            PluginParam::Gain(p) => {
                writer.write_f32::<LE>(p.fullband_gain)?;
                writer.write_f32::<LE>(p.lfe_gain)?;
                writer.write_all(&p.tail)?;
            }
            PluginParam::Placeholder(bytes) => writer.write_all(bytes)?,
        }
        Ok(())
    }

    /// Number of bytes `write` produces; this is the declared parameter size.
    pub fn encoded_len(&self) -> usize {
        let (fixed, tail) = match self {
            PluginParam::ParametricEq(p) => (PARAMETRIC_EQ_SIZE, &p.tail),
            PluginParam::Compressor(p) | PluginParam::Expander(p) => (DYNAMICS_SIZE, &p.tail),
            PluginParam::PeakLimiter(p) => (DYNAMICS_SIZE, &p.tail),
            PluginParam::Meter(p) => (METER_SIZE, &p.tail),
            PluginParam::Gain(p) => (GAIN_SIZE, &p.tail),
            PluginParam::Placeholder(bytes) => (0, bytes),
        };
        fixed as usize + tail.len()
    }

    /// `u32` declared size followed by the block.
    pub(crate) fn write_sized<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u32::<LE>(count_u32(self.encoded_len(), "plugin parameters")?)?;
        self.write(writer)
    }
}

fn read_dynamics<R: Read>(reader: &mut R, tail_len: usize) -> Result<DynamicsParams> {
    Ok(DynamicsParams {
        threshold: reader.read_f32::<LE>()?,
        ratio: reader.read_f32::<LE>()?,
        attack: reader.read_f32::<LE>()?,
        release: reader.read_f32::<LE>()?,
        gain: reader.read_f32::<LE>()?,
        process_lfe: reader.read_u8()?,
        channel_link: reader.read_u8()?,
        tail: reader.read_bytes(tail_len)?,
    })
}

fn write_dynamics<W: Write>(writer: &mut W, p: &DynamicsParams) -> Result<()> {
    writer.write_f32::<LE>(p.threshold)?;
    writer.write_f32::<LE>(p.ratio)?;
    writer.write_f32::<LE>(p.attack)?;
    writer.write_f32::<LE>(p.release)?;
    writer.write_f32::<LE>(p.gain)?;
    writer.write_u8(p.process_lfe)?;
    writer.write_u8(p.channel_link)?;
    writer.write_all(&p.tail)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn decode(plugin_id: u32, bytes: &[u8]) -> Result<PluginParam> {
        let mut cursor = Cursor::new(bytes);
        let param = PluginParam::read(&mut cursor, plugin_id, bytes.len() as u32)?;
        assert_eq!(cursor.position() as usize, bytes.len());
        Ok(param)
    }

    #[test]
    fn test_unknown_plugin_is_opaque() {
        let bytes: Vec<u8> = (0..37).collect();
        let param = decode(0x00A0_0003, &bytes).unwrap();
        assert_eq!(param, PluginParam::Placeholder(bytes.clone()));
        assert_eq!(param.encoded_len(), 37);

        let mut out = Vec::new();
        param.write(&mut out).unwrap();
        assert_eq!(out, bytes);
    }

    #[test]
    fn test_gain_with_trailing_residue() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&(-3.0f32).to_le_bytes());
        bytes.extend_from_slice(&(1.5f32).to_le_bytes());
        bytes.extend_from_slice(&[0xAA, 0xBB]);

        let param = decode(GAIN_ID, &bytes).unwrap();
        match &param {
            PluginParam::Gain(p) => {
                assert_eq!(p.fullband_gain, -3.0);
                assert_eq!(p.lfe_gain, 1.5);
                assert_eq!(p.tail, vec![0xAA, 0xBB]);
            }
            other => panic!("expected gain params, got {other:?}"),
        }
        let mut out = Vec::new();
        param.write(&mut out).unwrap();
        assert_eq!(out, bytes);
    }

    #[test]
    fn test_known_plugin_shorter_than_layout() {
        let err = decode(COMPRESSOR_ID, &[0u8; 10]).unwrap_err();
        assert!(matches!(
            err,
            BnkError::PluginParamOverrun {
                declared: 10,
                required: 22,
                ..
            }
        ));
    }

    #[test]
    fn test_fixed_sizes_match_writers() {
        let cases = [
            (PARAMETRIC_EQ_ID, 56usize),
            (COMPRESSOR_ID, 22),
            (EXPANDER_ID, 22),
            (PEAK_LIMITER_ID, 22),
            (METER_ID, 27),
            (GAIN_ID, 8),
        ];
        for (id, size) in cases {
            let bytes = vec![0u8; size];
            let param = decode(id, &bytes).unwrap();
            assert!(!matches!(param, PluginParam::Placeholder(_)), "{id:#x}");
            let mut out = Vec::new();
            param.write(&mut out).unwrap();
            assert_eq!(out.len(), size, "{id:#x}");
        }
    }

    #[test]
    fn test_declared_size_past_end_of_input() {
        let mut cursor = Cursor::new(&[0u8; 8][..]);
        let err = PluginParam::read(&mut cursor, 0x00A0_0003, 0xFFFF_FFF0).unwrap_err();
        assert!(err.is_eof(), "{err}");
    }

    #[test]
    fn test_empty_block_is_placeholder() {
        let param = decode(METER_ID, &[]).unwrap();
        assert_eq!(param, PluginParam::Placeholder(Vec::new()));
    }
}
