//! Binary framing of an export blob
//!
//! ```text
//! +-------+-----------------+------------------+-------------+
//! | magic | unexported (u16)| crc32 (u32)      | tail bytes  |
//! | "L0"  | big endian      | of the full log  | ...         |
//! +-------+-----------------+------------------+-------------+
//! ```
//!
//! With magic `Lz` everything after the magic is gzip compressed. The final
//! bytes are base64 encoded.

use base64::{engine::general_purpose::STANDARD, Engine};
use flate2::{read::GzDecoder, write::GzEncoder, Compression};
use std::io::{Read, Write};

use crate::error::{LedgerError, LedgerResult, MergeError};

/// Size of the uncompressed header, magic included
pub const HEADER_LEN: usize = 8;

/// Largest payload we are willing to inflate from an `Lz` blob
pub const MAX_DECOMPRESSED_SIZE: usize = 16 * 1024 * 1024;

/// How the bytes after the magic are stored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    /// `L0`: raw header and tail
    Plain,
    /// `Lz`: gzip of header fields and tail
    Gzip,
}

impl Framing {
    pub fn magic(&self) -> [u8; 2] {
        match self {
            Self::Plain => *b"L0",
            Self::Gzip => *b"Lz",
        }
    }

    pub fn from_magic(magic: &[u8]) -> Option<Self> {
        match magic {
            b"L0" => Some(Self::Plain),
            b"Lz" => Some(Self::Gzip),
            _ => None,
        }
    }
}

/// Fixed part of an export payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportHeader {
    /// Leading history lines the sender left out, assumed shared
    pub unexported: u16,
    /// CRC32 of the sender's complete history document
    pub crc: u32,
}

impl ExportHeader {
    /// Encode with the plain `L0` magic
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut bytes = [0u8; HEADER_LEN];
        bytes[..2].copy_from_slice(&Framing::Plain.magic());
        bytes[2..4].copy_from_slice(&self.unexported.to_be_bytes());
        bytes[4..8].copy_from_slice(&self.crc.to_be_bytes());
        bytes
    }

    /// Split an `L0` payload into header and tail
    pub fn parse(payload: &[u8]) -> Result<(Self, &[u8]), MergeError> {
        if payload.len() < HEADER_LEN {
            return Err(MergeError::InvalidFormat(format!(
                "payload is {} bytes, header needs {}",
                payload.len(),
                HEADER_LEN
            )));
        }
        if Framing::from_magic(&payload[..2]) != Some(Framing::Plain) {
            return Err(MergeError::InvalidFormat(String::new()));
        }
        let header = Self {
            unexported: u16::from_be_bytes([payload[2], payload[3]]),
            crc: u32::from_be_bytes([payload[4], payload[5], payload[6], payload[7]]),
        };
        Ok((header, &payload[HEADER_LEN..]))
    }
}

/// Build the base64 blob for `header` and `tail`
///
/// With `compress` the gzip framing is used whenever it is strictly smaller.
pub fn encode_blob(header: &ExportHeader, tail: &[u8], compress: bool) -> LedgerResult<String> {
    let mut plain = Vec::with_capacity(HEADER_LEN + tail.len());
    plain.extend_from_slice(&header.to_bytes());
    plain.extend_from_slice(tail);

    let mut bytes = plain;
    if compress {
        let zipped = gzip_framed(&bytes[2..])?;
        if zipped.len() < bytes.len() {
            bytes = zipped;
        }
    }
    Ok(STANDARD.encode(bytes))
}

/// Decode a blob back to its header, tail and the framing it used
///
/// Whitespace inside the blob is ignored so that line-wrapped base64
/// survives copy and paste.
pub fn decode_blob(blob: &str) -> Result<(ExportHeader, Vec<u8>, Framing), MergeError> {
    let compact: String = blob.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| MergeError::InvalidFormat(e.to_string()))?;

    let framing = bytes
        .get(..2)
        .and_then(Framing::from_magic)
        .ok_or_else(|| MergeError::InvalidFormat(String::new()))?;

    let payload = match framing {
        Framing::Plain => bytes,
        Framing::Gzip => {
            let mut payload = Framing::Plain.magic().to_vec();
            payload.extend(gunzip_bounded(&bytes[2..])?);
            payload
        }
    };

    let (header, tail) = ExportHeader::parse(&payload)?;
    Ok((header, tail.to_vec(), framing))
}

fn gzip_framed(data: &[u8]) -> LedgerResult<Vec<u8>> {
    let mut encoder = GzEncoder::new(Framing::Gzip.magic().to_vec(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| LedgerError::Encoding(format!("gzip failed: {}", e)))?;
    encoder
        .finish()
        .map_err(|e| LedgerError::Encoding(format!("gzip failed: {}", e)))
}

fn gunzip_bounded(data: &[u8]) -> Result<Vec<u8>, MergeError> {
    let mut decoder = GzDecoder::new(data);
    let mut inflated = Vec::new();
    let mut buffer = [0u8; 8192];

    loop {
        let read = decoder
            .read(&mut buffer)
            .map_err(|e| MergeError::InvalidFormat(e.to_string()))?;
        if read == 0 {
            break;
        }
        if inflated.len() + read > MAX_DECOMPRESSED_SIZE {
            return Err(MergeError::InvalidFormat(format!(
                "payload inflates beyond {} bytes",
                MAX_DECOMPRESSED_SIZE
            )));
        }
        inflated.extend_from_slice(&buffer[..read]);
    }

    Ok(inflated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_layout() {
        let header = ExportHeader {
            unexported: 0x0102,
            crc: 0xDEADBEEF,
        };
        assert_eq!(
            header.to_bytes(),
            [b'L', b'0', 0x01, 0x02, 0xDE, 0xAD, 0xBE, 0xEF]
        );

        let mut payload = header.to_bytes().to_vec();
        payload.extend_from_slice(b"tail");
        let (parsed, tail) = ExportHeader::parse(&payload).unwrap();
        assert_eq!(parsed, header);
        assert_eq!(tail, b"tail");
    }

    #[test]
    fn test_short_header_rejected() {
        assert!(matches!(
            ExportHeader::parse(b"L0\x00"),
            Err(MergeError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_small_payload_stays_plain() {
        let header = ExportHeader {
            unexported: 3,
            crc: 7,
        };
        let blob = encode_blob(&header, b"1\tadd\tA\ta\n", true).unwrap();
        let raw = STANDARD.decode(&blob).unwrap();
        assert_eq!(&raw[..2], b"L0");

        let (decoded, tail, framing) = decode_blob(&blob).unwrap();
        assert_eq!(decoded, header);
        assert_eq!(tail, b"1\tadd\tA\ta\n");
        assert_eq!(framing, Framing::Plain);
    }

    #[test]
    fn test_repetitive_payload_is_gzipped() {
        let header = ExportHeader {
            unexported: 0,
            crc: 42,
        };
        let tail = "1000\tlunch\tA\t900\tnothing\tA\tB\tC\n".repeat(40);
        let blob = encode_blob(&header, tail.as_bytes(), true).unwrap();
        let raw = STANDARD.decode(&blob).unwrap();
        assert_eq!(&raw[..2], b"Lz");
        assert!(raw.len() < HEADER_LEN + tail.len());

        let (decoded, decoded_tail, framing) = decode_blob(&blob).unwrap();
        assert_eq!(decoded, header);
        assert_eq!(decoded_tail, tail.as_bytes());
        assert_eq!(framing, Framing::Gzip);

        let uncompressed = encode_blob(&header, tail.as_bytes(), false).unwrap();
        assert_eq!(&STANDARD.decode(&uncompressed).unwrap()[..2], b"L0");
    }

    #[test]
    fn test_wrapped_base64_is_accepted() {
        let header = ExportHeader {
            unexported: 1,
            crc: 99,
        };
        let blob = encode_blob(&header, b"some tail bytes for wrapping", false).unwrap();
        let wrapped: String = blob
            .as_bytes()
            .chunks(10)
            .map(|c| format!("{}\n", std::str::from_utf8(c).unwrap()))
            .collect();
        let (decoded, _, _) = decode_blob(&wrapped).unwrap();
        assert_eq!(decoded, header);
    }

    #[test]
    fn test_bad_blobs() {
        assert!(matches!(
            decode_blob("not base64 !!!"),
            Err(MergeError::InvalidFormat(_))
        ));
        let wrong_magic = STANDARD.encode(b"XY\x00\x00\x00\x00\x00\x00tail");
        assert!(matches!(
            decode_blob(&wrong_magic),
            Err(MergeError::InvalidFormat(_))
        ));
        let broken_gzip = STANDARD.encode(b"Lzdefinitely not gzip");
        assert!(matches!(
            decode_blob(&broken_gzip),
            Err(MergeError::InvalidFormat(_))
        ));
        assert!(decode_blob("").is_err());
    }
}
