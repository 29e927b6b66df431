use anyhow::{Context, Result, bail};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::options::{CancelToken, DecodeOptions};
use crate::serde_util::fourcc::tag_to_string;
use crate::types::{Bank, BankName, MediaIndexEntry};
use crate::writer::encode_chunk;

pub const BANK_JSON: &str = "bank.json";
pub const MEDIA_DIR: &str = "media";
pub const MEDIA_EXT: &str = "wem";

#[derive(Serialize, Debug, Clone)]
pub struct ChunkSummary {
    pub tag: String,
    pub size: usize,
}

#[derive(Serialize, Debug, Clone)]
pub struct BankInfo {
    pub version: u32,
    pub bank_id: u32,
    pub language_id: u32,
    pub chunks: Vec<ChunkSummary>,
    pub objects: BTreeMap<&'static str, usize>,
    pub media: usize,
    pub platform: Option<String>,
    pub bank_names: Option<Vec<BankName>>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub enum VerifyOutcome {
    Identical,
    Mismatch {
        first_difference: usize,
        original_len: usize,
        encoded_len: usize,
    },
    Failed(String),
}

#[derive(Serialize, Debug, Clone)]
pub struct VerifyReport {
    pub files: Vec<(PathBuf, VerifyOutcome)>,
}

impl VerifyReport {
    pub fn identical(&self) -> usize {
        self.count(|o| matches!(o, VerifyOutcome::Identical))
    }

    pub fn mismatched(&self) -> usize {
        self.count(|o| matches!(o, VerifyOutcome::Mismatch { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, VerifyOutcome::Failed(_)))
    }

    pub fn is_clean(&self) -> bool {
        self.identical() == self.files.len()
    }

    fn count(&self, pred: impl Fn(&VerifyOutcome) -> bool) -> usize {
        self.files.iter().filter(|(_, o)| pred(o)).count()
    }
}

pub fn load_bank(input: &Path, options: &DecodeOptions) -> Result<Bank> {
    let file = fs::File::open(input).with_context(|| format!("Failed to open {:?}", input))?;
    Bank::decode_with(BufReader::new(file), options, &CancelToken::new())
        .with_context(|| format!("Failed to decode {:?}", input))
}

pub fn bank_info(input: &Path, options: &DecodeOptions) -> Result<BankInfo> {
    let bank = load_bank(input, options)?;
    let header = bank.header();

    let mut chunks = vec![ChunkSummary {
        tag: "BKHD".to_string(),
        size: 20 + header.tail.len(),
    }];
    for chunk in bank.chunks() {
        let size = match chunk.as_raw() {
            Some(raw) => raw.data.len(),
            // Structured chunks are measured by re-encoding.
            None => encode_chunk(chunk, bank.version())?.len(),
        };
        chunks.push(ChunkSummary {
            tag: tag_to_string(&chunk.tag()),
            size,
        });
    }

    Ok(BankInfo {
        version: header.version,
        bank_id: header.bank_id,
        language_id: header.language_id,
        chunks,
        objects: bank
            .hierarchy()
            .map(|h| h.type_counts())
            .unwrap_or_default(),
        media: bank.media_index().map_or(0, |index| index.len()),
        platform: bank.platform()?,
        bank_names: bank.bank_names()?,
    })
}

/// Bank -> `bank.json` plus one `.wem` per embedded media.
pub fn unpack_bank(
    input: &Path,
    output: &Option<PathBuf>,
    no_extract: bool,
    options: &DecodeOptions,
) -> Result<()> {
    let bank = load_bank(input, options)?;

    let out_dir = match output {
        Some(p) => p.clone(),
        None => input.with_extension(""),
    };
    fs::create_dir_all(&out_dir).context("Failed to create output directory")?;

    let json = serde_json::to_string_pretty(&bank).context("Failed to serialize bank")?;
    fs::write(out_dir.join(BANK_JSON), json).context("Failed to write bank JSON")?;

    if !no_extract {
        let media_dir = out_dir.join(MEDIA_DIR);
        fs::create_dir_all(&media_dir).context("Failed to create media directory")?;
        let mut extracted = 0;
        if let Some(index) = bank.media_index() {
            for entry in index.entries() {
                let Some(audio) = bank.media(entry.source_id) else {
                    bail!("Media {} is indexed but not present in DATA", entry.source_id);
                };
                fs::write(media_path(&media_dir, entry.source_id), audio)
                    .with_context(|| format!("Failed to write media {}", entry.source_id))?;
                extracted += 1;
            }
        }
        println!("Extracted {} media files to {:?}", extracted, media_dir);
    }
    println!("Unpacked bank to {:?}", out_dir);
    Ok(())
}

/// `bank.json` plus media directory -> bank.
///
/// Media keep their recorded offsets when every file still fits its slot;
/// otherwise DATA is repacked and offsets recomputed.
pub fn pack_bank(json: &Path, media_dir: &Path, output: &Path) -> Result<()> {
    let content = fs::read_to_string(json).context("Failed to read bank JSON")?;
    let mut bank: Bank = serde_json::from_str(&content).context("Failed to parse bank JSON")?;

    let entries: Vec<MediaIndexEntry> = bank
        .media_index()
        .map(|index| index.entries().to_vec())
        .unwrap_or_default();

    let mut payloads = Vec::with_capacity(entries.len());
    for entry in &entries {
        let path = media_path(media_dir, entry.source_id);
        let audio = fs::read(&path).with_context(|| format!("Failed to read media {:?}", path))?;
        payloads.push(audio);
    }

    if fits_recorded_layout(&entries, &payloads) {
        let end = entries
            .iter()
            .map(|e| e.offset as usize + e.size as usize)
            .max()
            .unwrap_or(0);
        let mut data = vec![0u8; end];
        for (entry, audio) in entries.iter().zip(&payloads) {
            let start = entry.offset as usize;
            data[start..start + audio.len()].copy_from_slice(audio);
        }
        if !entries.is_empty() || bank.data().is_some() {
            bank.set_data(data);
        }
    } else {
        if let Some(index) = bank.media_index_mut() {
            for (entry, audio) in entries.iter().zip(&payloads) {
                index.set_size(entry.source_id, audio.len() as u32)?;
            }
        }
        bank.set_data(Vec::new());
        for (entry, audio) in entries.iter().zip(&payloads) {
            bank.append_audio(entry.source_id, audio)?;
        }
        bank.compute_didx_offset()?;
        println!("Media sizes changed, recomputed {} offsets", entries.len());
    }

    bank.check_didx_data()
        .context("Media index does not match DATA")?;
    write_bank(&bank, output)?;
    println!("Packed bank to {:?}", output);
    Ok(())
}

/// Swap one embedded media and reconcile DIDX.
pub fn replace_media(
    input: &Path,
    source_id: u32,
    media: &Path,
    output: &Option<PathBuf>,
    options: &DecodeOptions,
) -> Result<()> {
    let mut bank = load_bank(input, options)?;
    let audio = fs::read(media).with_context(|| format!("Failed to read media {:?}", media))?;

    let Some(index) = bank.media_index_mut() else {
        bail!("Bank has no media index");
    };
    index
        .set_size(source_id, audio.len() as u32)
        .with_context(|| format!("Media {} is not indexed", source_id))?;
    bank.replace_audio(source_id, &audio)?;
    bank.compute_didx_offset()?;
    bank.check_didx_data()
        .context("Media index does not match DATA")?;

    let out_path = output.clone().unwrap_or_else(|| input.to_path_buf());
    write_bank(&bank, &out_path)?;
    println!("Replaced media {} in {:?}", source_id, out_path);
    Ok(())
}

/// Decode then encode every bank under `path` and compare bytes.
pub fn verify(path: &Path, options: &DecodeOptions) -> Result<VerifyReport> {
    let files: Vec<PathBuf> = if path.is_dir() {
        WalkDir::new(path)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| {
                e.path()
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("bnk"))
            })
            .map(|e| e.into_path())
            .collect()
    } else {
        vec![path.to_path_buf()]
    };

    let mut report = VerifyReport { files: Vec::new() };
    for file in files {
        let outcome = match verify_file(&file, options) {
            Ok(outcome) => outcome,
            Err(e) => VerifyOutcome::Failed(format!("{:#}", e)),
        };
        report.files.push((file, outcome));
    }
    Ok(report)
}

fn verify_file(path: &Path, options: &DecodeOptions) -> Result<VerifyOutcome> {
    let original = fs::read(path).with_context(|| format!("Failed to read {:?}", path))?;
    let bank = Bank::decode_with(&original[..], options, &CancelToken::new())?;
    let encoded = bank.encode()?;
    if encoded == original {
        return Ok(VerifyOutcome::Identical);
    }
    let first_difference = original
        .iter()
        .zip(&encoded)
        .position(|(a, b)| a != b)
        .unwrap_or(original.len().min(encoded.len()));
    Ok(VerifyOutcome::Mismatch {
        first_difference,
        original_len: original.len(),
        encoded_len: encoded.len(),
    })
}

fn write_bank(bank: &Bank, output: &Path) -> Result<()> {
    let bytes = bank.encode().context("Failed to encode bank")?;
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(output, bytes).with_context(|| format!("Failed to write {:?}", output))?;
    Ok(())
}

fn media_path(dir: &Path, source_id: u32) -> PathBuf {
    dir.join(format!("{}.{}", source_id, MEDIA_EXT))
}

/// Ascending, non-overlapping slots that each payload fills exactly.
fn fits_recorded_layout(entries: &[MediaIndexEntry], payloads: &[Vec<u8>]) -> bool {
    let mut cursor = 0usize;
    for (entry, audio) in entries.iter().zip(payloads) {
        let start = entry.offset as usize;
        if audio.len() != entry.size as usize || start < cursor {
            return false;
        }
        cursor = start + audio.len();
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(source_id: u32, offset: u32, size: u32) -> MediaIndexEntry {
        MediaIndexEntry {
            source_id,
            offset,
            size,
        }
    }

    #[test]
    fn test_recorded_layout_detection() {
        let payloads = vec![vec![0; 4], vec![0; 2]];
        assert!(fits_recorded_layout(
            &[entry(1, 0, 4), entry(2, 16, 2)],
            &payloads
        ));
        assert!(!fits_recorded_layout(
            &[entry(1, 0, 4), entry(2, 2, 2)],
            &payloads
        ));
        assert!(!fits_recorded_layout(
            &[entry(1, 0, 5), entry(2, 16, 2)],
            &payloads
        ));
    }
}
