// https://redis.io/docs/reference/protocol-spec

use std::borrow::Cow;
use std::fmt;

use bytes::Buf;
use bytes::Bytes;
use std::io::Cursor;
use thiserror::Error as ThisError;

use crate::charset::TextPolicy;

static CRLF: &[u8; 2] = b"\r\n";

#[derive(Debug, ThisError, PartialEq)]
pub enum Error {
    #[error("not enough data is available to parse an entire frame")]
    Incomplete,
    #[error("invalid frame data type: {0:#04x}")]
    InvalidDataType(u8),
    /// Array elements may only be simple strings, integers or bulk strings.
    #[error("unsupported array element data type: {0:#04x}")]
    UnsupportedElement(u8),
    #[error("invalid frame format; {0}")]
    Other(String),
}

/// The payload of a simple or bulk string reply: raw bytes, or text when the connection decodes
/// responses.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Data {
    Raw(Bytes),
    Text(String),
}

impl Data {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Data::Raw(bytes) => bytes,
            Data::Text(text) => text.as_bytes(),
        }
    }

    pub fn into_bytes(self) -> Bytes {
        match self {
            Data::Raw(bytes) => bytes,
            Data::Text(text) => Bytes::from(text),
        }
    }

    /// The payload as text, if it is text or happens to be valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Data::Raw(bytes) => std::str::from_utf8(bytes).ok(),
            Data::Text(text) => Some(text),
        }
    }

    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        match self {
            Data::Raw(bytes) => String::from_utf8_lossy(bytes),
            Data::Text(text) => Cow::Borrowed(text),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }
}

impl PartialEq<str> for Data {
    fn eq(&self, other: &str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl PartialEq<&str> for Data {
    fn eq(&self, other: &&str) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl PartialEq<[u8]> for Data {
    fn eq(&self, other: &[u8]) -> bool {
        self.as_bytes() == other
    }
}

impl fmt::Display for Data {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_string_lossy())
    }
}

/// A RESP2 reply.
///
/// Nil is carried inside the bulk and array variants, so a nil bulk string (`$-1`) and a nil
/// array (`*-1`) stay distinguishable from each other and from their empty counterparts.
#[derive(Clone, Debug, PartialEq)]
pub enum Frame {
    Simple(Data),
    Error(String),
    Integer(i64),
    Bulk(Option<Data>),
    Array(Option<Vec<Frame>>),
}

// Protocol specification: https://redis.io/docs/reference/protocol-spec/
impl Frame {
    pub fn simple(data: impl Into<Bytes>) -> Frame {
        Frame::Simple(Data::Raw(data.into()))
    }

    pub fn bulk(data: impl Into<Bytes>) -> Frame {
        Frame::Bulk(Some(Data::Raw(data.into())))
    }

    pub fn parse(src: &mut Cursor<&[u8]>) -> Result<Self, Error> {
        // The first byte in an RESP-serialized payload always identifies its type.
        // Subsequent bytes constitute the type's contents.
        let first_byte = get_byte(src)?;
        let data_type = DataType::try_from(first_byte)?;

        match data_type {
            // *<number-of-elements>\r\n<element-1>...<element-n>
            DataType::Array => {
                let length = get_length(src)?;
                if length == -1 {
                    return Ok(Frame::Array(None));
                }

                // Every element takes at least three bytes, do not trust the length prefix any
                // further than that.
                let capacity = (length as usize).min(src.remaining() / 3);
                let mut frames = Vec::with_capacity(capacity);
                for _ in 0..length {
                    frames.push(parse_element(src)?);
                }

                Ok(Frame::Array(Some(frames)))
            }
            data_type => parse_scalar(data_type, src),
        }
    }

    /// Turns every raw string payload into text, when the policy asks for it.
    pub fn decode_text(self, policy: &TextPolicy) -> crate::Result<Frame> {
        if !policy.decode_responses {
            return Ok(self);
        }

        let frame = match self {
            Frame::Simple(Data::Raw(bytes)) => Frame::Simple(policy.data(bytes)?),
            Frame::Bulk(Some(Data::Raw(bytes))) => Frame::Bulk(Some(policy.data(bytes)?)),
            Frame::Array(Some(frames)) => Frame::Array(Some(
                frames
                    .into_iter()
                    .map(|frame| frame.decode_text(policy))
                    .collect::<crate::Result<Vec<_>>>()?,
            )),
            frame => frame,
        };

        Ok(frame)
    }

    pub fn serialize(&self) -> Vec<u8> {
        match self {
            Frame::Simple(data) => {
                let data = data.as_bytes();
                let mut bytes = Vec::with_capacity(1 + data.len() + CRLF.len());
                bytes.push(u8::from(DataType::SimpleString));
                bytes.extend_from_slice(data);
                bytes.extend_from_slice(CRLF);
                bytes
            }
            Frame::Error(s) => {
                let mut bytes = Vec::with_capacity(1 + s.len() + CRLF.len());
                bytes.push(u8::from(DataType::SimpleError));
                bytes.extend_from_slice(s.as_bytes());
                bytes.extend_from_slice(CRLF);
                bytes
            }
            Frame::Integer(i) => {
                let i = i.to_string();
                let mut bytes = Vec::with_capacity(1 + i.len() + CRLF.len());
                bytes.push(u8::from(DataType::Integer));
                bytes.extend_from_slice(i.as_bytes());
                bytes.extend_from_slice(CRLF);
                bytes
            }
            Frame::Bulk(None) => b"$-1\r\n".to_vec(),
            Frame::Bulk(Some(data)) => {
                let data = data.as_bytes();
                let length_str = data.len().to_string();
                let mut result = Vec::with_capacity(
                    1 + length_str.len() + CRLF.len() + data.len() + CRLF.len(),
                );
                result.push(u8::from(DataType::BulkString));
                result.extend_from_slice(length_str.as_bytes());
                result.extend_from_slice(CRLF);
                result.extend_from_slice(data);
                result.extend_from_slice(CRLF);
                result
            }
            Frame::Array(None) => b"*-1\r\n".to_vec(),
            Frame::Array(Some(arr)) => {
                let length_str = arr.len().to_string();
                let mut bytes = Vec::with_capacity(1 + length_str.len() + CRLF.len());
                bytes.push(u8::from(DataType::Array));
                bytes.extend_from_slice(length_str.as_bytes());
                bytes.extend_from_slice(CRLF);
                for frame in arr {
                    bytes.extend(frame.serialize());
                }
                bytes
            }
        }
    }
}

impl From<Frame> for Vec<u8> {
    fn from(frame: Frame) -> Self {
        frame.serialize()
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frame::Simple(s) => write!(f, "+{}", s),
            Frame::Error(s) => write!(f, "-{}", s),
            Frame::Integer(i) => write!(f, ":{}", i),
            Frame::Bulk(Some(data)) => write!(f, "${}", data),
            Frame::Bulk(None) => write!(f, "$-1"),
            Frame::Array(Some(arr)) => {
                write!(f, "*{}", arr.len())?;
                for frame in arr {
                    write!(f, " {}", frame)?;
                }
                Ok(())
            }
            Frame::Array(None) => write!(f, "*-1"),
        }
    }
}

fn parse_element(src: &mut Cursor<&[u8]>) -> Result<Frame, Error> {
    let first_byte = get_byte(src)?;
    match DataType::try_from(first_byte)? {
        // Nested arrays (and errors inside arrays) are not part of what this client reads.
        DataType::Array | DataType::SimpleError => Err(Error::UnsupportedElement(first_byte)),
        data_type => parse_scalar(data_type, src),
    }
}

fn parse_scalar(data_type: DataType, src: &mut Cursor<&[u8]>) -> Result<Frame, Error> {
    match data_type {
        DataType::SimpleString => {
            let bytes = get_line(src)?;
            Ok(Frame::Simple(Data::Raw(Bytes::copy_from_slice(bytes))))
        }
        DataType::SimpleError => {
            let bytes = get_line(src)?;
            Ok(Frame::Error(String::from_utf8_lossy(bytes).into_owned()))
        }
        DataType::Integer => {
            let integer = parse_integer(get_line(src)?)?;
            Ok(Frame::Integer(integer))
        }
        // $<length>\r\n<data>\r\n
        DataType::BulkString => {
            let length = get_length(src)?;
            if length == -1 {
                return Ok(Frame::Bulk(None));
            }

            let data = get_exact(src, length as usize)?;
            Ok(Frame::Bulk(Some(Data::Raw(Bytes::copy_from_slice(data)))))
        }
        DataType::Array => Err(Error::UnsupportedElement(u8::from(DataType::Array))),
    }
}

fn parse_integer(line: &[u8]) -> Result<i64, Error> {
    std::str::from_utf8(line)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| {
            Error::Other(format!(
                "invalid integer {:?}",
                String::from_utf8_lossy(line)
            ))
        })
}

/// Reads a `$` or `*` length prefix. Only `-1` is accepted as a negative length.
fn get_length(src: &mut Cursor<&[u8]>) -> Result<i64, Error> {
    let length = parse_integer(get_line(src)?)?;
    if length < -1 {
        return Err(Error::Other(format!("invalid length {}", length)));
    }
    Ok(length)
}

fn get_line<'a>(src: &mut Cursor<&'a [u8]>) -> Result<&'a [u8], Error> {
    let start = src.position() as usize;
    let end = src.get_ref().len();

    let line_end_position = src.get_ref()[start..end]
        .windows(2)
        .position(|window| window == CRLF)
        .ok_or(Error::Incomplete)
        .map(|index| start + index)?;

    src.set_position((line_end_position + CRLF.len()) as u64);

    Ok(&src.get_ref()[start..line_end_position])
}

/// Reads exactly `length` bytes followed by a CRLF. The payload itself is never scanned, so it
/// may contain CRLF sequences of its own.
fn get_exact<'a>(src: &mut Cursor<&'a [u8]>, length: usize) -> Result<&'a [u8], Error> {
    let start = src.position() as usize;
    let end = start + length;

    if src.get_ref().len() < end + CRLF.len() {
        return Err(Error::Incomplete);
    }
    if &src.get_ref()[end..end + CRLF.len()] != CRLF {
        return Err(Error::Other(String::from(
            "bulk string is not terminated by CRLF",
        )));
    }

    src.set_position((end + CRLF.len()) as u64);

    Ok(&src.get_ref()[start..end])
}

fn get_byte(src: &mut Cursor<&[u8]>) -> Result<u8, Error> {
    if !src.has_remaining() {
        return Err(Error::Incomplete);
    }
    Ok(src.get_u8())
}

#[derive(Debug)]
enum DataType {
    SimpleString, // '+'
    SimpleError,  // '-'
    Integer,      // ':'
    BulkString,   // '$'
    Array,        // '*'
}

impl TryFrom<u8> for DataType {
    type Error = Error;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            b'+' => Ok(Self::SimpleString),
            b'-' => Ok(Self::SimpleError),
            b':' => Ok(Self::Integer),
            b'$' => Ok(Self::BulkString),
            b'*' => Ok(Self::Array),
            _ => Err(Error::InvalidDataType(byte)),
        }
    }
}

impl From<DataType> for u8 {
    fn from(value: DataType) -> Self {
        match value {
            DataType::SimpleString => b'+',
            DataType::SimpleError => b'-',
            DataType::Integer => b':',
            DataType::BulkString => b'$',
            DataType::Array => b'*',
        }
    }
}
