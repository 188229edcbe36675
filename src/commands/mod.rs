//! The command catalog: one builder per Redis command, returning the `Command` to send, plus a
//! [`Client`] method that sends it and projects the reply into a Rust type.
//!
//! Builders are public so the same commands can be queued inside a transaction.
//!
//! [`Client`]: crate::Client

pub mod hashes;
pub mod keys;
pub mod lists;
pub mod pubsub;
pub mod server;
pub mod sets;
pub mod sort;
pub mod sorted_sets;
pub mod strings;
pub mod transaction;

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use crate::frame::{Data, Frame};
use crate::{Error, Result};

/// Expiry arguments are whole seconds. Any fraction rounds up so a key never expires early.
pub(crate) fn whole_seconds(duration: Duration) -> u64 {
    duration.as_secs() + u64::from(duration.subsec_nanos() > 0)
}

fn unexpected<T>(expected: &'static str, actual: Frame) -> Result<T> {
    Err(Error::UnexpectedReply { expected, actual })
}

/// `+OK`.
pub fn into_ok(frame: Frame) -> Result<()> {
    match frame {
        Frame::Simple(ref s) if s == "OK" => Ok(()),
        frame => unexpected("OK", frame),
    }
}

pub fn into_integer(frame: Frame) -> Result<i64> {
    match frame {
        Frame::Integer(i) => Ok(i),
        frame => unexpected("integer", frame),
    }
}

/// Integer replies used as flags, `1` being true.
pub fn into_bool(frame: Frame) -> Result<bool> {
    into_integer(frame).map(|i| i == 1)
}

/// A string reply, nil mapping to `None`.
pub fn into_data(frame: Frame) -> Result<Option<Data>> {
    match frame {
        Frame::Bulk(data) => Ok(data),
        Frame::Simple(data) => Ok(Some(data)),
        frame => unexpected("string", frame),
    }
}

/// A string reply that can not be nil.
pub fn into_string(frame: Frame) -> Result<Data> {
    match into_data(frame)? {
        Some(data) => Ok(data),
        None => unexpected("non-nil string", Frame::Bulk(None)),
    }
}

/// Integer reply where nil means "no such member", as ZRANK answers.
pub fn into_optional_integer(frame: Frame) -> Result<Option<i64>> {
    match frame {
        Frame::Integer(i) => Ok(Some(i)),
        Frame::Bulk(None) => Ok(None),
        frame => unexpected("integer or nil", frame),
    }
}

/// Scores travel as bulk strings.
pub fn into_float(frame: Frame) -> Result<Option<f64>> {
    match into_data(frame)? {
        Some(data) => parse_float(&data).map(Some),
        None => Ok(None),
    }
}

fn parse_float(data: &Data) -> Result<f64> {
    data.as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| Error::UnexpectedReply {
            expected: "float",
            actual: Frame::Bulk(Some(data.clone())),
        })
}

/// Every element of an array reply, nil elements included.
pub fn into_optional_list(frame: Frame) -> Result<Vec<Option<Data>>> {
    match frame {
        Frame::Array(Some(frames)) => frames.into_iter().map(into_data).collect(),
        Frame::Array(None) => Ok(Vec::new()),
        frame => unexpected("array", frame),
    }
}

pub fn into_list(frame: Frame) -> Result<Vec<Data>> {
    match frame {
        Frame::Array(Some(frames)) => frames.into_iter().map(into_string).collect(),
        Frame::Array(None) => Ok(Vec::new()),
        frame => unexpected("array", frame),
    }
}

pub fn into_set(frame: Frame) -> Result<HashSet<Data>> {
    into_list(frame).map(|list| list.into_iter().collect())
}

/// A flat `[field, value, field, value, ...]` array.
pub fn into_pairs(frame: Frame) -> Result<Vec<(Data, Data)>> {
    let list = into_list(frame)?;
    if list.len() % 2 != 0 {
        return unexpected(
            "array of pairs",
            Frame::Array(Some(list.into_iter().map(|d| Frame::Bulk(Some(d))).collect())),
        );
    }

    let mut pairs = Vec::with_capacity(list.len() / 2);
    let mut items = list.into_iter();
    while let (Some(field), Some(value)) = (items.next(), items.next()) {
        pairs.push((field, value));
    }
    Ok(pairs)
}

pub fn into_map(frame: Frame) -> Result<HashMap<Data, Data>> {
    into_pairs(frame).map(|pairs| pairs.into_iter().collect())
}

/// Members paired with their scores, as `WITHSCORES` replies them.
pub fn into_scored(frame: Frame) -> Result<Vec<(Data, f64)>> {
    into_pairs(frame)?
        .into_iter()
        .map(|(member, score)| parse_float(&score).map(|score| (member, score)))
        .collect()
}
