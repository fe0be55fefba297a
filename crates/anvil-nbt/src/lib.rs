//! NBT (Named Binary Tag) for Minecraft 1.7.10.
//!
//! The single Java wire format: big-endian numerics, `u16`-prefixed strings
//! in Java modified UTF-8, compounds terminated by TAG_End, and a nesting
//! depth limit of 512. Gzip containers for the on-disk documents live in
//! [`file`].

pub mod error;
pub mod file;
mod io;
pub mod mutf8;
pub mod tag;

pub use error::NbtError;
pub use tag::{NbtCompound, NbtRoot, NbtTag};

use bytes::{Buf, BufMut};

/// Read a big-endian NBT document from a buffer.
pub fn read_nbt(buf: &mut impl Buf) -> Result<NbtRoot, NbtError> {
    io::read_nbt(buf)
}

/// Write a big-endian NBT document to a buffer.
pub fn write_nbt(buf: &mut impl BufMut, root: &NbtRoot) {
    io::write_nbt(buf, root)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(root: &NbtRoot) {
        let mut buf = Vec::new();
        write_nbt(&mut buf, root);
        let decoded = read_nbt(&mut buf.as_slice()).unwrap();
        assert_eq!(decoded, *root);
    }

    #[test]
    fn empty_compound() {
        roundtrip(&NbtRoot::new("", NbtCompound::new()));
    }

    #[test]
    fn named_root() {
        roundtrip(&NbtRoot::new("hello world", NbtCompound::new()));
    }

    #[test]
    fn numeric_tags() {
        let mut c = NbtCompound::new();
        c.insert("b".into(), NbtTag::Byte(-5));
        c.insert("s".into(), NbtTag::Short(-1234));
        c.insert("i".into(), NbtTag::Int(100_000));
        c.insert("l".into(), NbtTag::Long(i64::MIN));
        c.insert("f".into(), NbtTag::Float(3.125));
        c.insert("d".into(), NbtTag::Double(std::f64::consts::PI));
        roundtrip(&NbtRoot::new("", c));
    }

    #[test]
    fn byte_array_keeps_sign() {
        let mut c = NbtCompound::new();
        c.insert("arr".into(), NbtTag::ByteArray(vec![1, -2, 127, -128]));
        roundtrip(&NbtRoot::new("", c));
    }

    #[test]
    fn int_array() {
        let mut c = NbtCompound::new();
        c.insert("HeightMap".into(), NbtTag::IntArray(vec![64; 256]));
        roundtrip(&NbtRoot::new("", c));
    }

    #[test]
    fn string_with_nul_and_unicode() {
        let mut c = NbtCompound::new();
        c.insert("s".into(), NbtTag::String("a\0日本語".into()));
        roundtrip(&NbtRoot::new("", c));
    }

    #[test]
    fn list_of_compounds() {
        let mut item = NbtCompound::new();
        item.insert("id".into(), NbtTag::Short(1));
        item.insert("Count".into(), NbtTag::Byte(64));

        let mut c = NbtCompound::new();
        c.insert(
            "Inventory".into(),
            NbtTag::List(vec![
                NbtTag::Compound(item.clone()),
                NbtTag::Compound(item),
            ]),
        );
        roundtrip(&NbtRoot::new("", c));
    }

    #[test]
    fn empty_list_has_end_element_type() {
        let mut c = NbtCompound::new();
        c.insert("e".into(), NbtTag::List(vec![]));
        let root = NbtRoot::new("", c);

        let mut buf = Vec::new();
        write_nbt(&mut buf, &root);
        // 0A 0000 | 09 0001 'e' | elem type 00 | count 00000000 | 00
        assert_eq!(buf[3], 9);
        assert_eq!(buf[7], 0);
        roundtrip(&root);
    }

    #[test]
    fn big_endian_int_layout() {
        let mut c = NbtCompound::new();
        c.insert("v".into(), NbtTag::Int(1));
        let mut buf = Vec::new();
        write_nbt(&mut buf, &NbtRoot::new("", c));
        // TAG_Compound, name len 0, TAG_Int, name "v", then 00 00 00 01.
        assert_eq!(&buf[buf.len() - 5..], &[0x00, 0x00, 0x00, 0x01, 0x00]);
    }

    #[test]
    fn deep_nesting_within_limit() {
        let mut tag = NbtTag::Compound(NbtCompound::new());
        for _ in 0..300 {
            let mut outer = NbtCompound::new();
            outer.insert("in".into(), tag);
            tag = NbtTag::Compound(outer);
        }
        let mut c = NbtCompound::new();
        c.insert("deep".into(), tag);
        roundtrip(&NbtRoot::new("", c));
    }

    #[test]
    fn nesting_beyond_limit_is_rejected() {
        // Hand-build 600 nested unnamed-child compounds.
        let mut buf = Vec::new();
        buf.push(10); // root type
        buf.extend_from_slice(&[0, 0]); // root name
        for _ in 0..600 {
            buf.push(10); // child compound
            buf.extend_from_slice(&[0, 1, b'x']); // name "x"
        }
        for _ in 0..601 {
            buf.push(0); // TAG_End
        }
        assert!(matches!(
            read_nbt(&mut buf.as_slice()),
            Err(NbtError::NestingTooDeep { .. })
        ));
    }

    #[test]
    fn unknown_tag_type() {
        let buf = [10u8, 0, 0, 13, 0, 1, b'x'];
        assert!(matches!(
            read_nbt(&mut buf.as_ref()),
            Err(NbtError::UnknownTagType(13))
        ));
    }

    #[test]
    fn wrong_root_type() {
        let buf = [1u8, 0, 0];
        assert!(matches!(
            read_nbt(&mut buf.as_ref()),
            Err(NbtError::ExpectedCompound { got: 1 })
        ));
    }

    #[test]
    fn truncated_document() {
        let mut c = NbtCompound::new();
        c.insert("v".into(), NbtTag::Long(7));
        let mut buf = Vec::new();
        write_nbt(&mut buf, &NbtRoot::new("", c));
        buf.truncate(buf.len() - 4);
        assert!(matches!(
            read_nbt(&mut buf.as_slice()),
            Err(NbtError::UnexpectedEof)
        ));
    }
}
