//! Zlib helpers for chunk payloads.

use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::error::ProtocolError;

/// Deflate a buffer with zlib at the default level.
pub fn deflate_zlib(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::with_capacity(data.len() / 4 + 64), Compression::default());
    // Writing to a Vec cannot fail.
    encoder.write_all(data).expect("write to vec");
    encoder.finish().expect("finish to vec")
}

/// Inflate a zlib buffer, refusing output larger than `max_len`.
pub fn inflate_zlib(data: &[u8], max_len: usize) -> Result<Vec<u8>, ProtocolError> {
    let mut decoder = ZlibDecoder::new(data).take(max_len as u64 + 1);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| ProtocolError::Zlib(e.to_string()))?;
    if out.len() > max_len {
        return Err(ProtocolError::Zlib(format!(
            "decompressed size exceeds {max_len} bytes"
        )));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let data: Vec<u8> = (0..4096u32).map(|i| (i % 251) as u8).collect();
        let packed = deflate_zlib(&data);
        assert!(packed.len() < data.len());
        let unpacked = inflate_zlib(&packed, 1 << 20).unwrap();
        assert_eq!(unpacked, data);
    }

    #[test]
    fn empty() {
        let packed = deflate_zlib(&[]);
        assert_eq!(inflate_zlib(&packed, 16).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn bounded_inflate_rejects_bombs() {
        let data = vec![0u8; 1 << 16];
        let packed = deflate_zlib(&data);
        assert!(inflate_zlib(&packed, 1024).is_err());
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(inflate_zlib(&[0xDE, 0xAD, 0xBE, 0xEF], 1024).is_err());
    }
}
