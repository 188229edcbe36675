use bytes::{Buf, BytesMut};
use std::io::Cursor;
use tokio_util::codec::{Decoder, Encoder};
use tracing::trace;

use crate::charset::TextPolicy;
use crate::command::Command;
use crate::config::{Config, MAX_FRAME_SIZE};
use crate::frame::{self, Frame};
use crate::Error;

/// Frames commands on the way out and replies on the way in.
///
/// Replies leave the decoder with their payloads still raw. Text decoding happens once the frame
/// is out of the buffer (see [`Connection::read_frame`]), so a payload the charset rejects fails
/// only its own call.
///
/// [`Connection::read_frame`]: crate::connection::Connection::read_frame
pub struct RespCodec {
    policy: TextPolicy,
    max_frame_size: usize,
}

impl RespCodec {
    pub fn new(policy: TextPolicy, max_frame_size: usize) -> RespCodec {
        RespCodec {
            policy,
            max_frame_size,
        }
    }

    pub fn from_config(config: &Config) -> RespCodec {
        RespCodec::new(config.text_policy(), config.max_frame_size)
    }

    pub fn policy(&self) -> &TextPolicy {
        &self.policy
    }
}

impl Default for RespCodec {
    fn default() -> Self {
        RespCodec::new(TextPolicy::default(), MAX_FRAME_SIZE)
    }
}

impl Decoder for RespCodec {
    type Item = Frame;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        // A reply that keeps growing without ever completing is cut off here.
        if src.len() > self.max_frame_size {
            return Err(Error::Protocol(format!(
                "frame size exceeds limit of {} bytes",
                self.max_frame_size
            )));
        }

        let mut cursor = Cursor::new(&src[..]);
        let frame = match Frame::parse(&mut cursor) {
            Ok(frame) => frame,
            Err(frame::Error::Incomplete) => return Ok(None), // Not enough data to parse a frame.
            Err(err) => return Err(err.into()),
        };

        let position = cursor.position() as usize;

        // Remove the parsed frame from the buffer.
        src.advance(position);
        trace!(bytes = position, "decoded frame");

        Ok(Some(frame))
    }
}

impl Encoder<Command> for RespCodec {
    type Error = Error;

    fn encode(&mut self, cmd: Command, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let frame = cmd.into_frame(&self.policy)?;
        dst.extend_from_slice(&frame.serialize());
        Ok(())
    }
}

/// Lets a codec write replies too, which is all a server side of the protocol needs.
impl Encoder<Frame> for RespCodec {
    type Error = Error;

    fn encode(&mut self, frame: Frame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.extend_from_slice(&frame.serialize());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    use crate::charset::Charset;
    use crate::frame::Data;

    #[test]
    fn decode_waits_for_a_full_frame() {
        let mut codec = RespCodec::default();
        let mut buf = BytesMut::from(&b"*2\r\n$3\r\nfoo\r\n$3\r\nba"[..]);

        assert!(codec.decode(&mut buf).unwrap().is_none());
        // Nothing is consumed until the frame is complete.
        assert_eq!(buf.len(), 19);

        buf.extend_from_slice(b"r\r\n:1\r\n");

        let frame = codec.decode(&mut buf).unwrap();
        assert_eq!(
            frame,
            Some(Frame::Array(Some(vec![Frame::bulk("foo"), Frame::bulk("bar")])))
        );
        assert_eq!(&buf[..], b":1\r\n");

        assert_eq!(codec.decode(&mut buf).unwrap(), Some(Frame::Integer(1)));
        assert!(buf.is_empty());
    }

    #[test]
    fn decode_rejects_oversized_frames() {
        let mut codec = RespCodec::new(TextPolicy::default(), 8);
        let mut buf = BytesMut::from(&b"$100\r\nabcdef"[..]);

        let err = codec.decode(&mut buf).unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
    }

    #[test]
    fn decode_rejects_malformed_frames() {
        let mut codec = RespCodec::default();
        let mut buf = BytesMut::from(&b"?what\r\n"[..]);

        let err = codec.decode(&mut buf).unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
    }

    #[test]
    fn decode_leaves_payloads_raw() {
        let policy = TextPolicy {
            charset: Charset::Utf8,
            decode_responses: true,
            ..TextPolicy::default()
        };
        let mut codec = RespCodec::new(policy, MAX_FRAME_SIZE);
        let mut buf = BytesMut::from(&b"$2\r\n\xff\xfe\r\n+OK\r\n$5\r\nh\xc3\xa9llo\r\n"[..]);

        // Not UTF-8, but framing does not care.
        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some(Frame::Bulk(Some(Data::Raw(Bytes::from_static(b"\xff\xfe")))))
        );
        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some(Frame::Simple(Data::Raw(Bytes::from_static(b"OK"))))
        );
        // "héllo" is six bytes, the prefix says five: the CRLF check catches it.
        assert!(codec.decode(&mut buf).is_err());
    }

    #[test]
    fn encode_command() {
        let mut codec = RespCodec::default();
        let mut buf = BytesMut::new();

        codec
            .encode(Command::new("SET").arg("foo").arg(1), &mut buf)
            .unwrap();

        assert_eq!(&buf[..], b"*3\r\n$3\r\nSET\r\n$3\r\nfoo\r\n$1\r\n1\r\n");
    }

    #[test]
    fn encode_reply() {
        let mut codec = RespCodec::default();
        let mut buf = BytesMut::new();

        codec.encode(Frame::Array(None), &mut buf).unwrap();
        codec.encode(Frame::simple("OK"), &mut buf).unwrap();

        assert_eq!(&buf[..], b"*-1\r\n+OK\r\n");
    }
}
