use std::time::Duration;

use crate::command::{Arg, Command};
use crate::commands::{
    into_data, into_integer, into_list, into_ok, into_optional_list, unexpected,
};
use crate::frame::{Data, Frame};
use crate::{Client, Result};

/// Ref: <https://redis.io/docs/latest/commands/rpush>
pub fn rpush(key: impl Into<Arg>, value: impl Into<Arg>) -> Command {
    Command::new("RPUSH").arg(key).arg(value)
}

/// Ref: <https://redis.io/docs/latest/commands/lpush>
pub fn lpush(key: impl Into<Arg>, value: impl Into<Arg>) -> Command {
    Command::new("LPUSH").arg(key).arg(value)
}

/// Ref: <https://redis.io/docs/latest/commands/llen>
pub fn llen(key: impl Into<Arg>) -> Command {
    Command::new("LLEN").arg(key)
}

/// Ref: <https://redis.io/docs/latest/commands/lrange>
pub fn lrange(key: impl Into<Arg>, start: i64, stop: i64) -> Command {
    Command::new("LRANGE").arg(key).arg(start).arg(stop)
}

/// Ref: <https://redis.io/docs/latest/commands/ltrim>
pub fn ltrim(key: impl Into<Arg>, start: i64, stop: i64) -> Command {
    Command::new("LTRIM").arg(key).arg(start).arg(stop)
}

/// Ref: <https://redis.io/docs/latest/commands/lindex>
pub fn lindex(key: impl Into<Arg>, index: i64) -> Command {
    Command::new("LINDEX").arg(key).arg(index)
}

/// Ref: <https://redis.io/docs/latest/commands/lset>
pub fn lset(key: impl Into<Arg>, index: i64, value: impl Into<Arg>) -> Command {
    Command::new("LSET").arg(key).arg(index).arg(value)
}

/// Ref: <https://redis.io/docs/latest/commands/lrem>
pub fn lrem(key: impl Into<Arg>, count: i64, value: impl Into<Arg>) -> Command {
    Command::new("LREM").arg(key).arg(count).arg(value)
}

/// Ref: <https://redis.io/docs/latest/commands/lpop>
pub fn lpop(key: impl Into<Arg>) -> Command {
    Command::new("LPOP").arg(key)
}

/// Ref: <https://redis.io/docs/latest/commands/rpop>
pub fn rpop(key: impl Into<Arg>) -> Command {
    Command::new("RPOP").arg(key)
}

/// Ref: <https://redis.io/docs/latest/commands/blpop>
///
/// The timeout is sent as fractional seconds. Only a zero timeout blocks forever.
pub fn blpop<K: Into<Arg>>(keys: impl IntoIterator<Item = K>, timeout: Duration) -> Command {
    Command::new("BLPOP").args(keys).arg(timeout.as_secs_f64())
}

/// Ref: <https://redis.io/docs/latest/commands/brpop>
pub fn brpop<K: Into<Arg>>(keys: impl IntoIterator<Item = K>, timeout: Duration) -> Command {
    Command::new("BRPOP").args(keys).arg(timeout.as_secs_f64())
}

/// Ref: <https://redis.io/docs/latest/commands/rpoplpush>
pub fn rpoplpush(source: impl Into<Arg>, destination: impl Into<Arg>) -> Command {
    Command::new("RPOPLPUSH").arg(source).arg(destination)
}

/// A blocking pop answers `[key, value]`, or a nil array once the timeout runs out.
fn into_popped(frame: Frame) -> Result<Option<(Data, Data)>> {
    if frame == Frame::Array(None) {
        return Ok(None);
    }

    let list = into_optional_list(frame)?;
    match <[Option<Data>; 2]>::try_from(list) {
        Ok([Some(key), Some(value)]) => Ok(Some((key, value))),
        Ok(pair) => unexpected(
            "key and value",
            Frame::Array(Some(pair.into_iter().map(Frame::Bulk).collect())),
        ),
        Err(list) => unexpected(
            "key and value",
            Frame::Array(Some(list.into_iter().map(Frame::Bulk).collect())),
        ),
    }
}

impl Client {
    /// Returns the length of the list after the push.
    pub async fn rpush(&mut self, key: impl Into<Arg>, value: impl Into<Arg>) -> Result<i64> {
        into_integer(self.call(rpush(key, value)).await?)
    }

    pub async fn lpush(&mut self, key: impl Into<Arg>, value: impl Into<Arg>) -> Result<i64> {
        into_integer(self.call(lpush(key, value)).await?)
    }

    pub async fn llen(&mut self, key: impl Into<Arg>) -> Result<i64> {
        into_integer(self.call(llen(key)).await?)
    }

    pub async fn lrange(
        &mut self,
        key: impl Into<Arg>,
        start: i64,
        stop: i64,
    ) -> Result<Vec<Data>> {
        into_list(self.call(lrange(key, start, stop)).await?)
    }

    pub async fn ltrim(&mut self, key: impl Into<Arg>, start: i64, stop: i64) -> Result<()> {
        into_ok(self.call(ltrim(key, start, stop)).await?)
    }

    pub async fn lindex(&mut self, key: impl Into<Arg>, index: i64) -> Result<Option<Data>> {
        into_data(self.call(lindex(key, index)).await?)
    }

    pub async fn lset(
        &mut self,
        key: impl Into<Arg>,
        index: i64,
        value: impl Into<Arg>,
    ) -> Result<()> {
        into_ok(self.call(lset(key, index, value)).await?)
    }

    /// Removes up to `count` occurrences of `value` (all of them for `0`, from the tail for a
    /// negative count).
    pub async fn lrem(
        &mut self,
        key: impl Into<Arg>,
        count: i64,
        value: impl Into<Arg>,
    ) -> Result<i64> {
        into_integer(self.call(lrem(key, count, value)).await?)
    }

    pub async fn lpop(&mut self, key: impl Into<Arg>) -> Result<Option<Data>> {
        into_data(self.call(lpop(key)).await?)
    }

    pub async fn rpop(&mut self, key: impl Into<Arg>) -> Result<Option<Data>> {
        into_data(self.call(rpop(key)).await?)
    }

    /// Pops from the first non-empty list, waiting up to `timeout` (forever for zero).
    pub async fn blpop<K: Into<Arg>>(
        &mut self,
        keys: impl IntoIterator<Item = K>,
        timeout: Duration,
    ) -> Result<Option<(Data, Data)>> {
        into_popped(self.call(blpop(keys, timeout)).await?)
    }

    pub async fn brpop<K: Into<Arg>>(
        &mut self,
        keys: impl IntoIterator<Item = K>,
        timeout: Duration,
    ) -> Result<Option<(Data, Data)>> {
        into_popped(self.call(brpop(keys, timeout)).await?)
    }

    pub async fn rpoplpush(
        &mut self,
        source: impl Into<Arg>,
        destination: impl Into<Arg>,
    ) -> Result<Option<Data>> {
        into_data(self.call(rpoplpush(source, destination)).await?)
    }
}
