use std::borrow::Cow;
use std::fmt;

use bytes::Bytes;
use itertools::Itertools;

use crate::charset::TextPolicy;
use crate::frame::{Data, Frame};
use crate::Result;

/// A single command argument before it is turned into bytes.
///
/// Bytes go on the wire untouched, numbers are rendered as decimal text and text is encoded with
/// the connection's charset. Anything else can be sent through its `Display` implementation with
/// [`Arg::display`].
#[derive(Clone, Debug, PartialEq)]
pub enum Arg {
    Bytes(Bytes),
    Int(i128),
    Float(f64),
    Text(String),
}

impl Arg {
    pub fn display(value: impl fmt::Display) -> Arg {
        Arg::Text(value.to_string())
    }

    pub fn to_bytes(&self, policy: &TextPolicy) -> Result<Bytes> {
        match self {
            Arg::Bytes(bytes) => Ok(bytes.clone()),
            Arg::Int(i) => Ok(Bytes::from(i.to_string())),
            // `Display` for floats yields the shortest text that parses back to the same value.
            Arg::Float(f) => Ok(Bytes::from(f.to_string())),
            Arg::Text(text) => policy.encode(text),
        }
    }

    /// Byte rendering used only to give multi-field commands a stable argument order.
    fn sort_key(&self) -> Cow<'_, [u8]> {
        match self {
            Arg::Bytes(bytes) => Cow::Borrowed(&bytes[..]),
            Arg::Text(text) => Cow::Borrowed(text.as_bytes()),
            Arg::Int(i) => Cow::Owned(i.to_string().into_bytes()),
            Arg::Float(f) => Cow::Owned(f.to_string().into_bytes()),
        }
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Bytes(bytes) => write!(f, "{}", String::from_utf8_lossy(bytes)),
            Arg::Int(i) => write!(f, "{}", i),
            Arg::Float(x) => write!(f, "{}", x),
            Arg::Text(text) => write!(f, "{}", text),
        }
    }
}

impl From<Bytes> for Arg {
    fn from(bytes: Bytes) -> Self {
        Arg::Bytes(bytes)
    }
}

impl From<&Bytes> for Arg {
    fn from(bytes: &Bytes) -> Self {
        Arg::Bytes(bytes.clone())
    }
}

impl From<Vec<u8>> for Arg {
    fn from(bytes: Vec<u8>) -> Self {
        Arg::Bytes(Bytes::from(bytes))
    }
}

impl From<&[u8]> for Arg {
    fn from(bytes: &[u8]) -> Self {
        Arg::Bytes(Bytes::copy_from_slice(bytes))
    }
}

impl<const N: usize> From<&[u8; N]> for Arg {
    fn from(bytes: &[u8; N]) -> Self {
        Arg::Bytes(Bytes::copy_from_slice(bytes))
    }
}

impl From<Data> for Arg {
    fn from(data: Data) -> Self {
        Arg::Bytes(data.into_bytes())
    }
}

impl From<&Data> for Arg {
    fn from(data: &Data) -> Self {
        Arg::Bytes(Bytes::copy_from_slice(data.as_bytes()))
    }
}

impl From<String> for Arg {
    fn from(text: String) -> Self {
        Arg::Text(text)
    }
}

impl From<&String> for Arg {
    fn from(text: &String) -> Self {
        Arg::Text(text.clone())
    }
}

impl From<&str> for Arg {
    fn from(text: &str) -> Self {
        Arg::Text(text.to_string())
    }
}

impl From<f64> for Arg {
    fn from(f: f64) -> Self {
        Arg::Float(f)
    }
}

impl From<f32> for Arg {
    fn from(f: f32) -> Self {
        Arg::Float(f64::from(f))
    }
}

impl From<&Arg> for Arg {
    fn from(arg: &Arg) -> Self {
        arg.clone()
    }
}

macro_rules! int_arg {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Arg {
                fn from(i: $t) -> Self {
                    Arg::Int(i as i128)
                }
            }
        )*
    };
}

int_arg!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

/// A command name followed by its arguments, as it will be sent to the server.
#[derive(Clone, Debug, PartialEq)]
pub struct Command {
    parts: Vec<Arg>,
}

impl Command {
    pub fn new(name: impl Into<Arg>) -> Command {
        Command {
            parts: vec![name.into()],
        }
    }

    pub fn arg(mut self, arg: impl Into<Arg>) -> Command {
        self.parts.push(arg.into());
        self
    }

    pub fn args<A: Into<Arg>>(mut self, args: impl IntoIterator<Item = A>) -> Command {
        self.parts.extend(args.into_iter().map(Into::into));
        self
    }

    /// Appends field/value pairs, ordered by field so the encoded command does not depend on the
    /// iteration order of the collection they came from. Pairs with equal fields keep their
    /// relative order.
    pub fn pairs<K, V>(mut self, pairs: impl IntoIterator<Item = (K, V)>) -> Command
    where
        K: Into<Arg>,
        V: Into<Arg>,
    {
        let pairs = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .sorted_by(|(a, _), (b, _)| a.sort_key().cmp(&b.sort_key()));

        for (k, v) in pairs {
            self.parts.push(k);
            self.parts.push(v);
        }
        self
    }

    pub fn name(&self) -> String {
        self.parts[0].to_string().to_uppercase()
    }

    pub fn parts(&self) -> &[Arg] {
        &self.parts
    }

    /// Number of elements on the wire, the name included.
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// The command as a RESP array of bulk strings.
    pub fn into_frame(self, policy: &TextPolicy) -> Result<Frame> {
        let frames = self
            .parts
            .iter()
            .map(|arg| arg.to_bytes(policy).map(|bytes| Frame::Bulk(Some(Data::Raw(bytes)))))
            .collect::<Result<Vec<_>>>()?;

        Ok(Frame::Array(Some(frames)))
    }

    pub fn to_bytes(&self, policy: &TextPolicy) -> Result<Vec<u8>> {
        Ok(self.clone().into_frame(policy)?.serialize())
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.parts.iter().join(" "))
    }
}
