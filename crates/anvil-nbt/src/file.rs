//! Gzip-compressed NBT documents on disk (`level.dat`, player `.dat`).

use std::io::{Read, Write};
use std::path::Path;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::error::NbtError;
use crate::tag::NbtRoot;

/// Parse a gzip-compressed NBT document from raw bytes.
pub fn from_gzip_bytes(data: &[u8]) -> Result<NbtRoot, NbtError> {
    let mut decoder = GzDecoder::new(data);
    let mut raw = Vec::new();
    decoder.read_to_end(&mut raw)?;
    crate::read_nbt(&mut raw.as_slice())
}

/// Serialize a document as gzip-compressed NBT bytes.
pub fn to_gzip_bytes(root: &NbtRoot) -> Vec<u8> {
    let mut raw = Vec::new();
    crate::write_nbt(&mut raw, root);
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&raw).expect("write to vec");
    encoder.finish().expect("finish to vec")
}

/// Load a gzip NBT file.
pub fn read_gzip_file(path: &Path) -> Result<NbtRoot, NbtError> {
    let data = std::fs::read(path)?;
    from_gzip_bytes(&data)
}

/// Write a gzip NBT file atomically (temp file + rename).
pub fn write_gzip_file(path: &Path, root: &NbtRoot) -> Result<(), NbtError> {
    let bytes = to_gzip_bytes(root);
    let tmp = path.with_extension("dat_tmp");
    std::fs::write(&tmp, &bytes)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::{NbtCompound, NbtTag};

    #[test]
    fn gzip_roundtrip() {
        let mut c = NbtCompound::new();
        c.insert("Health".into(), NbtTag::Short(20));
        c.insert("OnGround".into(), NbtTag::Byte(1));
        let root = NbtRoot::new("", c);

        let bytes = to_gzip_bytes(&root);
        // Gzip magic.
        assert_eq!(&bytes[..2], &[0x1F, 0x8B]);
        let decoded = from_gzip_bytes(&bytes).unwrap();
        assert_eq!(decoded, root);
    }

    #[test]
    fn file_roundtrip() {
        let dir = std::env::temp_dir().join(format!("anvil_nbt_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("player.dat");

        let mut c = NbtCompound::new();
        c.insert("XpLevel".into(), NbtTag::Int(30));
        let root = NbtRoot::new("", c);

        write_gzip_file(&path, &root).unwrap();
        let loaded = read_gzip_file(&path).unwrap();
        assert_eq!(loaded, root);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn corrupt_file_is_an_error() {
        assert!(from_gzip_bytes(&[0x00, 0x01, 0x02]).is_err());
    }
}
