//! Conversions between text and the bytes that travel on the wire.
//!
//! Redis only ever sees bytes. Text arguments are encoded with the configured [`Charset`] before
//! they are framed, and, when responses are requested as text, bulk and simple string replies are
//! decoded with the same charset. The [`ErrorMode`] decides what happens to characters (or bytes)
//! the charset can not represent.

use bytes::Bytes;
use strum_macros::{Display, EnumString};

use crate::frame::Data;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum Charset {
    #[default]
    #[strum(to_string = "utf-8", serialize = "utf8")]
    Utf8,
    #[strum(
        to_string = "latin-1",
        serialize = "latin1",
        serialize = "iso-8859-1",
        serialize = "iso8859-1"
    )]
    Latin1,
    #[strum(to_string = "ascii", serialize = "us-ascii")]
    Ascii,
}

/// What to do with input the charset can not represent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ErrorMode {
    /// Fail the conversion.
    #[default]
    Strict,
    /// Substitute a replacement (`?` when encoding, U+FFFD when decoding).
    Replace,
    /// Drop the offending input.
    Ignore,
}

impl Charset {
    pub fn encode(self, text: &str, errors: ErrorMode) -> Result<Bytes> {
        let limit = match self {
            Charset::Utf8 => return Ok(Bytes::copy_from_slice(text.as_bytes())),
            Charset::Latin1 => 0xFF,
            Charset::Ascii => 0x7F,
        };

        let mut bytes = Vec::with_capacity(text.len());
        for (position, c) in text.chars().enumerate() {
            let code = c as u32;
            if code <= limit {
                bytes.push(code as u8);
                continue;
            }
            match errors {
                ErrorMode::Strict => {
                    return Err(Error::Encoding(format!(
                        "{} can not encode {:?} in position {}",
                        self, c, position
                    )))
                }
                ErrorMode::Replace => bytes.push(b'?'),
                ErrorMode::Ignore => {}
            }
        }

        Ok(Bytes::from(bytes))
    }

    pub fn decode(self, bytes: &[u8], errors: ErrorMode) -> Result<String> {
        match self {
            Charset::Utf8 => match errors {
                ErrorMode::Strict => String::from_utf8(bytes.to_vec()).map_err(|e| {
                    Error::Encoding(format!("{} can not decode reply; {}", self, e.utf8_error()))
                }),
                ErrorMode::Replace => Ok(String::from_utf8_lossy(bytes).into_owned()),
                ErrorMode::Ignore => Ok(bytes.utf8_chunks().map(|chunk| chunk.valid()).collect()),
            },
            // Every byte is a valid latin-1 code point.
            Charset::Latin1 => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
            Charset::Ascii => {
                let mut text = String::with_capacity(bytes.len());
                for (position, &b) in bytes.iter().enumerate() {
                    if b.is_ascii() {
                        text.push(char::from(b));
                        continue;
                    }
                    match errors {
                        ErrorMode::Strict => {
                            return Err(Error::Encoding(format!(
                                "{} can not decode byte {:#04x} in position {}",
                                self, b, position
                            )))
                        }
                        ErrorMode::Replace => text.push(char::REPLACEMENT_CHARACTER),
                        ErrorMode::Ignore => {}
                    }
                }
                Ok(text)
            }
        }
    }
}

/// The text handling of one connection: how arguments are encoded, and whether replies are handed
/// back as raw bytes or as decoded text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextPolicy {
    pub charset: Charset,
    pub errors: ErrorMode,
    pub decode_responses: bool,
}

impl TextPolicy {
    /// The same charset settings, with replies left as raw bytes.
    pub fn raw(self) -> TextPolicy {
        TextPolicy {
            decode_responses: false,
            ..self
        }
    }

    pub fn encode(&self, text: &str) -> Result<Bytes> {
        self.charset.encode(text, self.errors)
    }

    pub fn data(&self, bytes: Bytes) -> Result<Data> {
        if !self.decode_responses {
            return Ok(Data::Raw(bytes));
        }
        self.charset.decode(&bytes, self.errors).map(Data::Text)
    }
}
