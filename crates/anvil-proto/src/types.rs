//! Variable-length integers.
//!
//! 7-bit LEB128 with a continuation high bit. Signed values are transmitted
//! as their unsigned two's-complement interpretation (no ZigZag).

use std::fmt;

use bytes::{Buf, BufMut};

use crate::codec::{ProtoDecode, ProtoEncode};
use crate::error::ProtocolError;

// ---------------------------------------------------------------------------
// VarInt (i32)
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct VarInt(pub i32);

impl VarInt {
    /// Maximum bytes a VarInt can occupy.
    pub const MAX_BYTES: usize = 5;

    /// Encode into a plain vector and return the number of bytes written.
    pub fn encode(&self, buf: &mut Vec<u8>) -> usize {
        let mut value = self.0 as u32;
        let mut written = 0;
        loop {
            if value & !0x7F == 0 {
                buf.push(value as u8);
                written += 1;
                return written;
            }
            buf.push((value & 0x7F | 0x80) as u8);
            value >>= 7;
            written += 1;
        }
    }

    /// Number of bytes the encoding of `v` occupies.
    pub fn encoded_len(v: i32) -> usize {
        let mut value = v as u32;
        let mut len = 1;
        while value & !0x7F != 0 {
            value >>= 7;
            len += 1;
        }
        len
    }

    /// Try to decode from the front of a slice without consuming it.
    ///
    /// Returns `Ok(None)` when the slice ends mid-VarInt (caller should wait
    /// for more bytes), `Ok(Some((value, consumed)))` on success, and an
    /// error when the encoding exceeds five bytes.
    pub fn decode_partial(buf: &[u8]) -> Result<Option<(VarInt, usize)>, ProtocolError> {
        let mut result: u32 = 0;
        let mut shift: u32 = 0;
        for (i, &byte) in buf.iter().enumerate() {
            if i >= Self::MAX_BYTES {
                return Err(ProtocolError::VarIntTooLong {
                    max_bytes: Self::MAX_BYTES,
                });
            }
            result |= ((byte & 0x7F) as u32) << shift;
            if byte & 0x80 == 0 {
                return Ok(Some((VarInt(result as i32), i + 1)));
            }
            shift += 7;
        }
        if buf.len() >= Self::MAX_BYTES {
            return Err(ProtocolError::VarIntTooLong {
                max_bytes: Self::MAX_BYTES,
            });
        }
        Ok(None)
    }
}

impl ProtoEncode for VarInt {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        let mut value = self.0 as u32;
        loop {
            if value & !0x7F == 0 {
                buf.put_u8(value as u8);
                return;
            }
            buf.put_u8((value & 0x7F | 0x80) as u8);
            value >>= 7;
        }
    }
}

impl ProtoDecode for VarInt {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtocolError> {
        let mut result: u32 = 0;
        let mut shift: u32 = 0;
        for i in 0..Self::MAX_BYTES {
            if !buf.has_remaining() {
                return Err(ProtocolError::BufferTooShort {
                    needed: 1,
                    remaining: 0,
                });
            }
            let byte = buf.get_u8();
            result |= ((byte & 0x7F) as u32) << shift;
            if byte & 0x80 == 0 {
                return Ok(VarInt(result as i32));
            }
            shift += 7;
            if i == Self::MAX_BYTES - 1 {
                return Err(ProtocolError::VarIntTooLong {
                    max_bytes: Self::MAX_BYTES,
                });
            }
        }
        unreachable!("loop always returns")
    }
}

impl From<i32> for VarInt {
    fn from(v: i32) -> Self {
        VarInt(v)
    }
}

impl From<VarInt> for i32 {
    fn from(v: VarInt) -> Self {
        v.0
    }
}

impl fmt::Debug for VarInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VarInt({})", self.0)
    }
}

impl fmt::Display for VarInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// VarLong (i64)
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct VarLong(pub i64);

impl VarLong {
    /// Maximum bytes a VarLong can occupy.
    pub const MAX_BYTES: usize = 10;
}

impl ProtoEncode for VarLong {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        let mut value = self.0 as u64;
        loop {
            if value & !0x7F == 0 {
                buf.put_u8(value as u8);
                return;
            }
            buf.put_u8((value & 0x7F | 0x80) as u8);
            value >>= 7;
        }
    }
}

impl ProtoDecode for VarLong {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtocolError> {
        let mut result: u64 = 0;
        let mut shift: u32 = 0;
        for i in 0..Self::MAX_BYTES {
            if !buf.has_remaining() {
                return Err(ProtocolError::BufferTooShort {
                    needed: 1,
                    remaining: 0,
                });
            }
            let byte = buf.get_u8();
            result |= ((byte & 0x7F) as u64) << shift;
            if byte & 0x80 == 0 {
                return Ok(VarLong(result as i64));
            }
            shift += 7;
            if i == Self::MAX_BYTES - 1 {
                return Err(ProtocolError::VarIntTooLong {
                    max_bytes: Self::MAX_BYTES,
                });
            }
        }
        unreachable!("loop always returns")
    }
}

impl From<i64> for VarLong {
    fn from(v: i64) -> Self {
        VarLong(v)
    }
}

impl From<VarLong> for i64 {
    fn from(v: VarLong) -> Self {
        v.0
    }
}

impl fmt::Debug for VarLong {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VarLong({})", self.0)
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    fn roundtrip_varint(value: i32) {
        let mut buf = BytesMut::new();
        VarInt(value).proto_encode(&mut buf);
        assert!(buf.len() <= VarInt::MAX_BYTES);
        assert_eq!(buf.len(), VarInt::encoded_len(value));
        let decoded = VarInt::proto_decode(&mut buf.freeze()).unwrap();
        assert_eq!(decoded.0, value, "VarInt roundtrip failed for {value}");
    }

    #[test]
    fn varint_zero() {
        roundtrip_varint(0);
    }

    #[test]
    fn varint_positive() {
        roundtrip_varint(1);
        roundtrip_varint(127);
        roundtrip_varint(128);
        roundtrip_varint(255);
        roundtrip_varint(25565);
        roundtrip_varint(2_097_151);
    }

    #[test]
    fn varint_negative() {
        roundtrip_varint(-1);
        roundtrip_varint(-128);
        roundtrip_varint(-100_000);
    }

    #[test]
    fn varint_extremes() {
        roundtrip_varint(i32::MAX);
        roundtrip_varint(i32::MIN);
    }

    #[test]
    fn varint_no_zigzag() {
        // Two's-complement transmission: 1 is a single 0x01 byte, and -1 is
        // five bytes of 0xFF 0xFF 0xFF 0xFF 0x0F.
        let mut buf = BytesMut::new();
        VarInt(1).proto_encode(&mut buf);
        assert_eq!(&buf[..], &[0x01]);

        let mut buf = BytesMut::new();
        VarInt(-1).proto_encode(&mut buf);
        assert_eq!(&buf[..], &[0xFF, 0xFF, 0xFF, 0xFF, 0x0F]);
    }

    #[test]
    fn varint_known_encodings() {
        let mut buf = BytesMut::new();
        VarInt(300).proto_encode(&mut buf);
        assert_eq!(&buf[..], &[0xAC, 0x02]);
    }

    #[test]
    fn varint_too_long() {
        // Six continuation bytes can never be a valid VarInt.
        let data = bytes::Bytes::from_static(&[0x80, 0x80, 0x80, 0x80, 0x80, 0x01]);
        assert!(matches!(
            VarInt::proto_decode(&mut data.clone()),
            Err(ProtocolError::VarIntTooLong { .. })
        ));
    }

    #[test]
    fn varint_truncated() {
        let data = bytes::Bytes::from_static(&[0x80]);
        assert!(matches!(
            VarInt::proto_decode(&mut data.clone()),
            Err(ProtocolError::BufferTooShort { .. })
        ));
    }

    #[test]
    fn varint_partial() {
        assert!(VarInt::decode_partial(&[]).unwrap().is_none());
        assert!(VarInt::decode_partial(&[0x80]).unwrap().is_none());
        assert_eq!(
            VarInt::decode_partial(&[0xAC, 0x02, 0x55]).unwrap(),
            Some((VarInt(300), 2))
        );
        assert!(VarInt::decode_partial(&[0x80, 0x80, 0x80, 0x80, 0x80]).is_err());
    }

    fn roundtrip_varlong(value: i64) {
        let mut buf = BytesMut::new();
        VarLong(value).proto_encode(&mut buf);
        assert!(buf.len() <= VarLong::MAX_BYTES);
        let decoded = VarLong::proto_decode(&mut buf.freeze()).unwrap();
        assert_eq!(decoded.0, value, "VarLong roundtrip failed for {value}");
    }

    #[test]
    fn varlong_roundtrip() {
        roundtrip_varlong(0);
        roundtrip_varlong(1);
        roundtrip_varlong(-1);
        roundtrip_varlong(1_000_000_000_000);
        roundtrip_varlong(i64::MAX);
        roundtrip_varlong(i64::MIN);
    }

    #[test]
    fn varlong_minus_one_is_ten_bytes() {
        let mut buf = BytesMut::new();
        VarLong(-1).proto_encode(&mut buf);
        assert_eq!(buf.len(), 10);
    }
}
