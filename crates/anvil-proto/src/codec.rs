//! Encoding/decoding traits and shared field helpers.
//!
//! Matches Java's `DataOutputStream`/`DataInputStream` conventions: all
//! multi-byte integers are big-endian two's-complement, floats are IEEE-754
//! big-endian bit patterns.

use bytes::{Buf, BufMut};

use crate::error::ProtocolError;
use crate::types::VarInt;

/// Encode a value onto a buffer.
pub trait ProtoEncode {
    fn proto_encode(&self, buf: &mut impl BufMut);
}

/// Decode a value from a buffer.
pub trait ProtoDecode: Sized {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtocolError>;
}

/// Fail unless at least `needed` bytes remain.
pub fn ensure(buf: &impl Buf, needed: usize) -> Result<(), ProtocolError> {
    if buf.remaining() < needed {
        return Err(ProtocolError::BufferTooShort {
            needed,
            remaining: buf.remaining(),
        });
    }
    Ok(())
}

/// Write a protocol string: VarInt byte length + UTF-8 bytes.
pub fn write_string(buf: &mut impl BufMut, s: &str) {
    VarInt(s.len() as i32).proto_encode(buf);
    buf.put_slice(s.as_bytes());
}

/// Read a protocol string with a codepoint cap.
///
/// The length prefix counts UTF-8 bytes, so the byte cap is four times the
/// character cap; the decoded string is then re-checked against the
/// character cap itself.
pub fn read_string(buf: &mut impl Buf, max_chars: usize) -> Result<String, ProtocolError> {
    let len = VarInt::proto_decode(buf)?.0;
    if len < 0 {
        return Err(ProtocolError::malformed("negative string length"));
    }
    let len = len as usize;
    let max_bytes = max_chars.saturating_mul(4);
    if len > max_bytes {
        return Err(ProtocolError::StringTooLong {
            len,
            max: max_bytes,
        });
    }
    ensure(buf, len)?;
    let data = buf.copy_to_bytes(len);
    let s = String::from_utf8(data.to_vec()).map_err(|_| ProtocolError::InvalidUtf8)?;
    if s.chars().count() > max_chars {
        return Err(ProtocolError::StringTooLong { len, max: max_bytes });
    }
    Ok(s)
}

/// Read a boolean byte.
pub fn read_bool(buf: &mut impl Buf) -> Result<bool, ProtocolError> {
    ensure(buf, 1)?;
    Ok(buf.get_u8() != 0)
}

/// Entity positions travel as 32.32 fixed-point with 5 fractional bits:
/// `floor(v * 32)` as a big-endian i32.
pub fn to_fixed_point(v: f64) -> i32 {
    (v * 32.0).floor() as i32
}

/// Inverse of [`to_fixed_point`], for tests and interpolation.
pub fn from_fixed_point(v: i32) -> f64 {
    v as f64 / 32.0
}

/// Rotations travel as 256ths of a full turn in a single byte.
pub fn to_angle(degrees: f32) -> u8 {
    ((degrees * 256.0 / 360.0) as i32 & 0xFF) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn string_roundtrip() {
        let mut buf = BytesMut::new();
        write_string(&mut buf, "Hello, world!");
        let result = read_string(&mut buf.freeze(), 32).unwrap();
        assert_eq!(result, "Hello, world!");
    }

    #[test]
    fn string_empty() {
        let mut buf = BytesMut::new();
        write_string(&mut buf, "");
        assert_eq!(read_string(&mut buf.freeze(), 16).unwrap(), "");
    }

    #[test]
    fn string_length_counts_bytes_not_chars() {
        // Three CJK characters are nine UTF-8 bytes; the prefix must say 9.
        let mut buf = BytesMut::new();
        write_string(&mut buf, "日本語");
        assert_eq!(buf[0], 9);
        let result = read_string(&mut buf.freeze(), 16).unwrap();
        assert_eq!(result, "日本語");
    }

    #[test]
    fn string_codepoint_cap() {
        // 17 ASCII characters fit the 16*4 byte cap but fail the char cap.
        let mut buf = BytesMut::new();
        write_string(&mut buf, "abcdefghijklmnopq");
        assert!(matches!(
            read_string(&mut buf.freeze(), 16),
            Err(ProtocolError::StringTooLong { .. })
        ));
    }

    #[test]
    fn string_byte_cap() {
        let long = "x".repeat(200);
        let mut buf = BytesMut::new();
        write_string(&mut buf, &long);
        assert!(matches!(
            read_string(&mut buf.freeze(), 16),
            Err(ProtocolError::StringTooLong { .. })
        ));
    }

    #[test]
    fn string_truncated() {
        let mut buf = BytesMut::new();
        write_string(&mut buf, "Hello");
        let truncated = buf.freeze().slice(..3);
        assert!(read_string(&mut truncated.clone(), 16).is_err());
    }

    #[test]
    fn fixed_point_floors() {
        assert_eq!(to_fixed_point(1.0), 32);
        assert_eq!(to_fixed_point(0.5), 16);
        assert_eq!(to_fixed_point(-0.5), -16);
        assert_eq!(to_fixed_point(-0.01), -1);
        assert_eq!(from_fixed_point(48), 1.5);
    }

    #[test]
    fn angle_wraps() {
        assert_eq!(to_angle(0.0), 0);
        assert_eq!(to_angle(90.0), 64);
        assert_eq!(to_angle(180.0), 128);
        assert_eq!(to_angle(360.0), 0);
        assert_eq!(to_angle(450.0), 64);
    }
}
