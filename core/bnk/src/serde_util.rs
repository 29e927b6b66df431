//! Serde adapters used when the object graph is dumped to JSON.

/// Opaque byte runs as space separated upper-case hex ("0A 1B 2C").
pub mod hex_bytes {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&bytes_to_hex_space(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        hex_space_to_bytes(&s).map_err(D::Error::custom)
    }

    pub fn bytes_to_hex_space(bytes: &[u8]) -> String {
        let hex_string = hex::encode_upper(bytes);
        // Insert space every 2 chars
        let mut result = String::with_capacity(hex_string.len() + hex_string.len() / 2);
        for (i, c) in hex_string.char_indices() {
            if i > 0 && i % 2 == 0 {
                result.push(' ');
            }
            result.push(c);
        }
        result
    }

    pub fn hex_space_to_bytes(hex_string: &str) -> Result<Vec<u8>, hex::FromHexError> {
        let clean_string = hex_string.replace(' ', "");
        hex::decode(clean_string)
    }
}

/// Four-character chunk tags. Printable tags stay readable, anything else
/// is written as `#` followed by eight hex digits.
pub mod fourcc {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(tag: &[u8; 4], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&tag_to_string(tag))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<[u8; 4], D::Error> {
        let s = String::deserialize(deserializer)?;
        let bytes = match s.strip_prefix('#') {
            Some(hex_part) => hex::decode(hex_part).map_err(D::Error::custom)?,
            None => s.into_bytes(),
        };
        bytes
            .try_into()
            .map_err(|_| D::Error::custom("chunk tag must be exactly 4 bytes"))
    }

    pub fn tag_to_string(tag: &[u8; 4]) -> String {
        if tag.iter().all(|b| b.is_ascii_graphic()) {
            tag.iter().map(|&b| b as char).collect()
        } else {
            format!("#{}", hex::encode_upper(tag))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_space_format() {
        assert_eq!(hex_bytes::bytes_to_hex_space(&[0x0A, 0xFF, 0x00]), "0A FF 00");
        assert_eq!(
            hex_bytes::hex_space_to_bytes("0A FF 00").unwrap(),
            vec![0x0A, 0xFF, 0x00]
        );
        assert_eq!(hex_bytes::bytes_to_hex_space(&[]), "");
    }

    #[test]
    fn test_fourcc_display() {
        assert_eq!(fourcc::tag_to_string(b"HIRC"), "HIRC");
        assert_eq!(fourcc::tag_to_string(&[0, 1, b'A', b'B']), "#00014142");
    }
}
