//! Chat packets.

use bytes::{Buf, BufMut};

use crate::codec::{read_string, write_string, ProtoDecode, ProtoEncode};
use crate::error::ProtocolError;

/// Clientbound chat (0x02): a JSON chat component.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessageCb {
    pub json: String,
}

impl ProtoEncode for ChatMessageCb {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        write_string(buf, &self.json);
    }
}

impl ProtoDecode for ChatMessageCb {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtocolError> {
        Ok(Self {
            json: read_string(buf, 32767)?,
        })
    }
}

/// Serverbound chat (0x01): raw text, at most 100 codepoints.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessageSb {
    pub message: String,
}

impl ProtoEncode for ChatMessageSb {
    fn proto_encode(&self, buf: &mut impl BufMut) {
        write_string(buf, &self.message);
    }
}

impl ProtoDecode for ChatMessageSb {
    fn proto_decode(buf: &mut impl Buf) -> Result<Self, ProtocolError> {
        Ok(Self {
            message: read_string(buf, 100)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn serverbound_cap() {
        let ok = ChatMessageSb {
            message: "a".repeat(100),
        };
        let mut buf = BytesMut::new();
        ok.proto_encode(&mut buf);
        assert!(ChatMessageSb::proto_decode(&mut buf.freeze()).is_ok());

        let too_long = ChatMessageSb {
            message: "a".repeat(101),
        };
        let mut buf = BytesMut::new();
        too_long.proto_encode(&mut buf);
        assert!(matches!(
            ChatMessageSb::proto_decode(&mut buf.freeze()),
            Err(ProtocolError::StringTooLong { .. })
        ));
    }

    #[test]
    fn multibyte_chat_counts_codepoints() {
        // 100 three-byte characters: 300 bytes, still 100 codepoints.
        let msg = "愛".repeat(100);
        let mut buf = BytesMut::new();
        ChatMessageSb { message: msg.clone() }.proto_encode(&mut buf);
        let decoded = ChatMessageSb::proto_decode(&mut buf.freeze()).unwrap();
        assert_eq!(decoded.message, msg);
    }
}
