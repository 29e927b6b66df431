use std::io::{self, Read, Write};

/// Longest encoding a 32-bit variable-length integer can take.
const MAX_VAR_BYTES: usize = 5;

/// Extension trait for reading the primitives shared by the sound-bank codecs.
pub trait BinReadExt: Read {
    /// Read a null-terminated string (reads until 0x00)
    fn read_null_term_string(&mut self) -> io::Result<String> {
        let bytes = self.read_null_term_bytes()?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Read raw bytes up to (and consuming) a 0x00 terminator.
    /// The terminator is not part of the returned buffer.
    fn read_null_term_bytes(&mut self) -> io::Result<Vec<u8>> {
        let mut bytes = Vec::new();
        loop {
            let mut buf = [0u8; 1];
            self.read_exact(&mut buf)?;
            if buf[0] == 0 {
                break;
            }
            bytes.push(buf[0]);
        }
        Ok(bytes)
    }

    /// Read exactly `len` bytes into a fresh buffer.
    ///
    /// The buffer grows with the data actually read, so a corrupt length
    /// fails with `UnexpectedEof` instead of allocating it up front.
    fn read_bytes(&mut self, len: usize) -> io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        Read::take(&mut *self, len as u64).read_to_end(&mut buf)?;
        if buf.len() < len {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("needed {} bytes, {} available", len, buf.len()),
            ));
        }
        Ok(buf)
    }

    /// Read a 7-bit variable-length integer.
    ///
    /// Groups are stored most significant first; every byte except the last
    /// has its high bit set.
    fn read_var_u32(&mut self) -> io::Result<u32> {
        let mut value: u64 = 0;
        for _ in 0..MAX_VAR_BYTES {
            let mut buf = [0u8; 1];
            self.read_exact(&mut buf)?;
            value = (value << 7) | u64::from(buf[0] & 0x7F);
            if buf[0] & 0x80 == 0 {
                return u32::try_from(value).map_err(|_| {
                    io::Error::new(io::ErrorKind::InvalidData, "variable integer overflows u32")
                });
            }
        }
        Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "variable integer longer than 5 bytes",
        ))
    }
}

/// Extension trait for writing the primitives shared by the sound-bank codecs.
pub trait BinWriteExt: Write {
    /// Write a string followed by a null terminator
    fn write_null_term_string(&mut self, s: &str) -> io::Result<()> {
        self.write_null_term_bytes(s.as_bytes())
    }

    /// Write raw bytes followed by a null terminator
    fn write_null_term_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.write_all(bytes)?;
        self.write_all(&[0u8])?;
        Ok(())
    }

    /// Write a 7-bit variable-length integer in its shortest form.
    fn write_var_u32(&mut self, value: u32) -> io::Result<()> {
        let mut groups = [0u8; MAX_VAR_BYTES];
        let mut len = 0;
        let mut rest = value;
        loop {
            let continuation = if len == 0 { 0 } else { 0x80 };
            groups[MAX_VAR_BYTES - 1 - len] = (rest & 0x7F) as u8 | continuation;
            len += 1;
            rest >>= 7;
            if rest == 0 {
                break;
            }
        }
        self.write_all(&groups[MAX_VAR_BYTES - len..])
    }
}

// Implement for all types that implement Read/Write
impl<R: Read + ?Sized> BinReadExt for R {}
impl<W: Write + ?Sized> BinWriteExt for W {}

/// Number of bytes `write_var_u32` emits for `value`.
pub fn var_u32_len(value: u32) -> usize {
    match value {
        0..=0x7F => 1,
        0x80..=0x3FFF => 2,
        0x4000..=0x1F_FFFF => 3,
        0x20_0000..=0xFFF_FFFF => 4,
        _ => 5,
    }
}
