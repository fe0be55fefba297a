//! VarInt length-prefixed frame extraction.

use bytes::{Buf, Bytes, BytesMut};

use anvil_proto::error::ProtocolError;
use anvil_proto::types::VarInt;
use anvil_proto::MAX_FRAME_LEN;

/// Try to split one complete frame payload off the front of `buf`.
///
/// `Ok(None)` means the buffer holds an incomplete frame and more bytes are
/// needed; errors are fatal for the connection.
pub fn extract_frame(buf: &mut BytesMut) -> Result<Option<Bytes>, ProtocolError> {
    let Some((VarInt(len), prefix_len)) = VarInt::decode_partial(&buf[..])? else {
        return Ok(None);
    };
    if len < 0 {
        return Err(ProtocolError::malformed("negative frame length"));
    }
    let len = len as usize;
    if len > MAX_FRAME_LEN {
        return Err(ProtocolError::FrameTooLarge { len });
    }
    if buf.len() < prefix_len + len {
        return Ok(None);
    }
    buf.advance(prefix_len);
    Ok(Some(buf.split_to(len).freeze()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anvil_proto::codec::ProtoEncode;
    use bytes::BufMut;

    fn frame(payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        VarInt(payload.len() as i32).encode(&mut out);
        out.extend_from_slice(payload);
        out
    }

    #[test]
    fn whole_frame() {
        let mut buf = BytesMut::from(&frame(&[1, 2, 3])[..]);
        let payload = extract_frame(&mut buf).unwrap().unwrap();
        assert_eq!(&payload[..], &[1, 2, 3]);
        assert!(buf.is_empty());
    }

    #[test]
    fn empty_frame() {
        let mut buf = BytesMut::from(&frame(&[])[..]);
        let payload = extract_frame(&mut buf).unwrap().unwrap();
        assert!(payload.is_empty());
    }

    #[test]
    fn incomplete_length_prefix_waits() {
        let mut buf = BytesMut::new();
        assert!(extract_frame(&mut buf).unwrap().is_none());
        buf.put_u8(0x80); // continuation byte of an unfinished VarInt
        assert!(extract_frame(&mut buf).unwrap().is_none());
    }

    #[test]
    fn incomplete_body_waits() {
        let whole = frame(&[9; 10]);
        let mut buf = BytesMut::from(&whole[..5]);
        assert!(extract_frame(&mut buf).unwrap().is_none());
        assert_eq!(buf.len(), 5); // nothing consumed while waiting
    }

    #[test]
    fn oversize_frame_is_fatal() {
        let mut buf = BytesMut::new();
        VarInt((MAX_FRAME_LEN + 1) as i32).proto_encode(&mut buf);
        assert!(matches!(
            extract_frame(&mut buf),
            Err(ProtocolError::FrameTooLarge { .. })
        ));
    }

    #[test]
    fn negative_frame_length_is_fatal() {
        let mut buf = BytesMut::new();
        VarInt(-1).proto_encode(&mut buf);
        assert!(extract_frame(&mut buf).is_err());
    }

    // Concatenating frames and feeding the bytes in arbitrary slices yields
    // the same sequence of payloads.
    #[test]
    fn incremental_feed_preserves_sequence() {
        let payloads: Vec<Vec<u8>> = vec![
            vec![],
            vec![0x42],
            (0..200u8).collect(),
            vec![7; 1000],
            vec![0x00, 0x01],
        ];
        let mut stream = Vec::new();
        for p in &payloads {
            stream.extend_from_slice(&frame(p));
        }

        for chunk_size in [1usize, 2, 3, 7, 64, stream.len()] {
            let mut buf = BytesMut::new();
            let mut got: Vec<Vec<u8>> = Vec::new();
            for chunk in stream.chunks(chunk_size) {
                buf.extend_from_slice(chunk);
                while let Some(payload) = extract_frame(&mut buf).unwrap() {
                    got.push(payload.to_vec());
                }
            }
            assert_eq!(got, payloads, "chunk size {chunk_size}");
            assert!(buf.is_empty());
        }
    }
}
