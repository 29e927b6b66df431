use byteorder::{LE, ReadBytesExt};
use std::io::{self, Read};
use std::sync::{Mutex, MutexGuard};
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::error::{BnkError, Result, ResultExt};
use crate::hirc::Hirc;
use crate::options::{CancelToken, DecodeOptions};
use crate::serde_util::fourcc::tag_to_string;
use crate::types::*;

type Slots = Mutex<Vec<Option<Result<Chunk>>>>;

impl Bank {
    /// Decode a bank with default options.
    pub fn new<R: Read>(reader: R) -> Result<Self> {
        Self::decode_with(reader, &DecodeOptions::default(), &CancelToken::new())
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        Self::new(bytes)
    }

    /// Frame the stream sequentially, decode structured chunks on a bounded
    /// pool and join them back in file order.
    pub fn decode_with<R: Read>(
        mut reader: R,
        options: &DecodeOptions,
        cancel: &CancelToken,
    ) -> Result<Self> {
        let started = Instant::now();
        let header = read_bank_header(&mut reader)?;
        let version = header.version;
        let pool = options.build_pool()?;

        let slots: Slots = Mutex::new(Vec::new());
        let framed = pool.in_place_scope(|scope| -> Result<()> {
            let mut offset = 8 + header_len(&header);
            let mut index = 0;
            while let Some((tag, body)) = read_frame(&mut reader)
                .context_with(|| format!("chunk #{index} at offset {offset}"))?
            {
                cancel.check()?;
                let context = format!(
                    "{} chunk #{} at offset {}",
                    tag_to_string(&tag),
                    index,
                    offset
                );
                offset += 8 + body.len() as u64;
                lock(&slots).push(None);

                match tag {
                    BKHD => return Err(BnkError::BkhdNotFirst { found: tag }.context(context)),
                    DIDX | DATA | HIRC => {
                        let slots = &slots;
                        scope.spawn(move |_| {
                            let result = decode_chunk(tag, body, version, options, cancel)
                                .context_with(|| context);
                            lock(slots)[index] = Some(result);
                        });
                    }
                    _ => {
                        if !KNOWN_TAGS.contains(&tag) {
                            warn!(tag = %tag_to_string(&tag), index, "unknown chunk kept opaque");
                        }
                        lock(&slots)[index] = Some(Ok(Chunk::raw(tag, body)));
                    }
                }
                index += 1;
            }
            Ok(())
        });
        cancel.check()?;
        framed?;

        let slots = slots.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut chunks = Vec::with_capacity(slots.len());
        for (index, slot) in slots.into_iter().enumerate() {
            let chunk = slot.ok_or_else(|| {
                BnkError::InvalidGraph(format!("decode task for chunk #{index} never reported"))
            })??;
            chunks.push(chunk);
        }

        if !chunks.iter().any(|c| matches!(c, Chunk::Didx(_))) {
            if options.require_media_index {
                return Err(BnkError::MissingChunk("DIDX"));
            }
            warn!(bank_id = header.bank_id, "bank has no DIDX chunk");
        }

        let bank = Bank::from_parts(header, chunks)?;
        info!(
            version,
            bank_id = bank.header().bank_id,
            chunks = bank.chunks().len() + 1,
            objects = bank.hierarchy().map_or(0, Hirc::len),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "decoded bank"
        );
        Ok(bank)
    }
}

fn lock(slots: &Slots) -> MutexGuard<'_, Vec<Option<Result<Chunk>>>> {
    slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn header_len(header: &BankHeader) -> u64 {
    20 + header.tail.len() as u64
}

fn decode_chunk(
    tag: [u8; 4],
    body: Vec<u8>,
    version: u32,
    options: &DecodeOptions,
    cancel: &CancelToken,
) -> Result<Chunk> {
    cancel.check()?;
    let started = Instant::now();
    let size = body.len();
    let chunk = match tag {
        DIDX => Chunk::Didx(MediaIndex::decode(&body)?),
        DATA => Chunk::Data(DataChunk::from_bytes(body)),
        HIRC => Chunk::Hirc(Hirc::decode(&body, version, options.parallel_hirc, cancel)?),
        _ => Chunk::raw(tag, body),
    };
    debug!(
        tag = %tag_to_string(&tag),
        size,
        elapsed_us = started.elapsed().as_micros() as u64,
        "decoded chunk"
    );
    Ok(chunk)
}

/// Read as many bytes as are available, up to `buf.len()`.
fn read_up_to<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// The first chunk must be BKHD.
fn read_bank_header<R: Read>(reader: &mut R) -> Result<BankHeader> {
    let mut tag = [0u8; 4];
    read_up_to(reader, &mut tag)?;
    if tag != BKHD {
        return Err(if KNOWN_TAGS.contains(&tag) {
            BnkError::BkhdNotFirst { found: tag }
        } else {
            BnkError::NotSoundBank { found: tag }
        });
    }
    let size = reader.read_u32::<LE>()?;
    let body = read_body(reader, size)?;
    BankHeader::decode(&body)
}

/// One `tag, u32 size, body` frame, or `None` at a clean end of stream.
fn read_frame<R: Read>(reader: &mut R) -> Result<Option<([u8; 4], Vec<u8>)>> {
    let mut tag = [0u8; 4];
    match read_up_to(reader, &mut tag)? {
        0 => return Ok(None),
        4 => {}
        n => {
            return Err(BnkError::Truncated {
                context: "chunk tag",
                needed: 4,
                available: n as u64,
            });
        }
    }
    let mut size = [0u8; 4];
    let n = read_up_to(reader, &mut size)?;
    if n < 4 {
        return Err(BnkError::Truncated {
            context: "chunk size",
            needed: 4,
            available: n as u64,
        });
    }
    let body = read_body(reader, u32::from_le_bytes(size))?;
    Ok(Some((tag, body)))
}

fn read_body<R: Read>(reader: &mut R, size: u32) -> Result<Vec<u8>> {
    let mut body = Vec::new();
    reader.take(u64::from(size)).read_to_end(&mut body)?;
    if body.len() < size as usize {
        return Err(BnkError::Truncated {
            context: "chunk body",
            needed: u64::from(size),
            available: body.len() as u64,
        });
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(tag: &[u8; 4], body: &[u8]) -> Vec<u8> {
        let mut out = tag.to_vec();
        out.extend_from_slice(&(body.len() as u32).to_le_bytes());
        out.extend_from_slice(body);
        out
    }

    fn bkhd(version: u32) -> Vec<u8> {
        let mut body = version.to_le_bytes().to_vec();
        body.extend_from_slice(&[0; 16]);
        frame(b"BKHD", &body)
    }

    fn empty_hirc() -> Vec<u8> {
        frame(b"HIRC", &0u32.to_le_bytes())
    }

    #[test]
    fn test_truncated_body() {
        let mut bytes = bkhd(141);
        bytes.extend_from_slice(b"HIRC");
        bytes.extend_from_slice(&100u32.to_le_bytes());
        bytes.extend_from_slice(&[0; 10]);
        let err = Bank::decode(&bytes).unwrap_err();
        assert!(matches!(
            err.root(),
            BnkError::Truncated {
                needed: 100,
                available: 10,
                ..
            }
        ));
    }

    #[test]
    fn test_second_bkhd_rejected() {
        let mut bytes = bkhd(141);
        bytes.extend(bkhd(141));
        bytes.extend(empty_hirc());
        let err = Bank::decode(&bytes).unwrap_err();
        assert!(matches!(err.root(), BnkError::BkhdNotFirst { .. }));
    }

    #[test]
    fn test_known_tag_first() {
        let err = Bank::decode(&empty_hirc()).unwrap_err();
        assert!(matches!(err, BnkError::BkhdNotFirst { found } if &found == b"HIRC"));
    }

    #[test]
    fn test_missing_hirc() {
        let err = Bank::decode(&bkhd(141)).unwrap_err();
        assert!(matches!(err, BnkError::MissingChunk("HIRC")));
    }

    #[test]
    fn test_strict_media_index() {
        let mut bytes = bkhd(141);
        bytes.extend(empty_hirc());
        assert!(Bank::decode(&bytes).is_ok());

        let options = DecodeOptions {
            require_media_index: true,
            ..Default::default()
        };
        let err = Bank::decode_with(&bytes[..], &options, &CancelToken::new()).unwrap_err();
        assert!(matches!(err, BnkError::MissingChunk("DIDX")));
    }

    #[test]
    fn test_unknown_chunk_kept_in_place() {
        let mut bytes = bkhd(141);
        bytes.extend(frame(b"ABCD", &[1, 2, 3]));
        bytes.extend(empty_hirc());
        bytes.extend(frame(b"PLAT", b"Linux\0"));
        let bank = Bank::decode(&bytes).unwrap();
        let tags: Vec<_> = bank.chunks().iter().map(Chunk::tag).collect();
        assert_eq!(tags, vec![*b"ABCD", HIRC, PLAT]);
        assert!(matches!(&bank.chunks()[0], Chunk::Unknown(raw) if raw.data == [1, 2, 3]));
        assert_eq!(bank.encode().unwrap(), bytes);
    }
}
