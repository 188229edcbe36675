use std::time::Duration;

use crate::command::{Arg, Command};
use crate::commands::{
    into_bool, into_data, into_integer, into_ok, into_optional_list, into_string, whole_seconds,
};
use crate::frame::Data;
use crate::{Client, Result};

/// Ref: <https://redis.io/docs/latest/commands/get>
pub fn get(key: impl Into<Arg>) -> Command {
    Command::new("GET").arg(key)
}

/// Ref: <https://redis.io/docs/latest/commands/set>
pub fn set(key: impl Into<Arg>, value: impl Into<Arg>) -> Command {
    Command::new("SET").arg(key).arg(value)
}

/// Ref: <https://redis.io/docs/latest/commands/getset>
pub fn getset(key: impl Into<Arg>, value: impl Into<Arg>) -> Command {
    Command::new("GETSET").arg(key).arg(value)
}

/// Ref: <https://redis.io/docs/latest/commands/mget>
pub fn mget<K: Into<Arg>>(keys: impl IntoIterator<Item = K>) -> Command {
    Command::new("MGET").args(keys)
}

/// Ref: <https://redis.io/docs/latest/commands/setnx>
pub fn setnx(key: impl Into<Arg>, value: impl Into<Arg>) -> Command {
    Command::new("SETNX").arg(key).arg(value)
}

/// Ref: <https://redis.io/docs/latest/commands/setex>
///
/// A fractional `ttl` is rounded up to the next whole second.
pub fn setex(key: impl Into<Arg>, ttl: Duration, value: impl Into<Arg>) -> Command {
    Command::new("SETEX").arg(key).arg(whole_seconds(ttl)).arg(value)
}

/// Ref: <https://redis.io/docs/latest/commands/mset>
pub fn mset<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Command
where
    K: Into<Arg>,
    V: Into<Arg>,
{
    Command::new("MSET").pairs(pairs)
}

/// Ref: <https://redis.io/docs/latest/commands/msetnx>
pub fn msetnx<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Command
where
    K: Into<Arg>,
    V: Into<Arg>,
{
    Command::new("MSETNX").pairs(pairs)
}

/// Ref: <https://redis.io/docs/latest/commands/incr>
pub fn incr(key: impl Into<Arg>) -> Command {
    Command::new("INCR").arg(key)
}

/// Ref: <https://redis.io/docs/latest/commands/incrby>
pub fn incrby(key: impl Into<Arg>, increment: i64) -> Command {
    Command::new("INCRBY").arg(key).arg(increment)
}

/// Ref: <https://redis.io/docs/latest/commands/decr>
pub fn decr(key: impl Into<Arg>) -> Command {
    Command::new("DECR").arg(key)
}

/// Ref: <https://redis.io/docs/latest/commands/decrby>
pub fn decrby(key: impl Into<Arg>, decrement: i64) -> Command {
    Command::new("DECRBY").arg(key).arg(decrement)
}

/// Ref: <https://redis.io/docs/latest/commands/append>
pub fn append(key: impl Into<Arg>, value: impl Into<Arg>) -> Command {
    Command::new("APPEND").arg(key).arg(value)
}

/// Ref: <https://redis.io/docs/latest/commands/getrange>
pub fn getrange(key: impl Into<Arg>, start: i64, end: i64) -> Command {
    Command::new("GETRANGE").arg(key).arg(start).arg(end)
}

/// Ref: <https://redis.io/docs/latest/commands/getbit>
pub fn getbit(key: impl Into<Arg>, offset: u64) -> Command {
    Command::new("GETBIT").arg(key).arg(offset)
}

/// Ref: <https://redis.io/docs/latest/commands/setbit>
pub fn setbit(key: impl Into<Arg>, offset: u64, value: bool) -> Command {
    Command::new("SETBIT").arg(key).arg(offset).arg(u8::from(value))
}

/// Ref: <https://redis.io/docs/latest/commands/strlen>
pub fn strlen(key: impl Into<Arg>) -> Command {
    Command::new("STRLEN").arg(key)
}

impl Client {
    pub async fn get(&mut self, key: impl Into<Arg>) -> Result<Option<Data>> {
        into_data(self.call(get(key)).await?)
    }

    pub async fn set(&mut self, key: impl Into<Arg>, value: impl Into<Arg>) -> Result<()> {
        into_ok(self.call(set(key, value)).await?)
    }

    pub async fn getset(
        &mut self,
        key: impl Into<Arg>,
        value: impl Into<Arg>,
    ) -> Result<Option<Data>> {
        into_data(self.call(getset(key, value)).await?)
    }

    /// One entry per key, `None` for missing keys.
    pub async fn mget<K: Into<Arg>>(
        &mut self,
        keys: impl IntoIterator<Item = K>,
    ) -> Result<Vec<Option<Data>>> {
        into_optional_list(self.call(mget(keys)).await?)
    }

    pub async fn setnx(&mut self, key: impl Into<Arg>, value: impl Into<Arg>) -> Result<bool> {
        into_bool(self.call(setnx(key, value)).await?)
    }

    pub async fn setex(
        &mut self,
        key: impl Into<Arg>,
        ttl: Duration,
        value: impl Into<Arg>,
    ) -> Result<()> {
        into_ok(self.call(setex(key, ttl, value)).await?)
    }

    pub async fn mset<K, V>(&mut self, pairs: impl IntoIterator<Item = (K, V)>) -> Result<()>
    where
        K: Into<Arg>,
        V: Into<Arg>,
    {
        into_ok(self.call(mset(pairs)).await?)
    }

    /// Sets every pair, or none of them if any key already exists.
    pub async fn msetnx<K, V>(&mut self, pairs: impl IntoIterator<Item = (K, V)>) -> Result<bool>
    where
        K: Into<Arg>,
        V: Into<Arg>,
    {
        into_bool(self.call(msetnx(pairs)).await?)
    }

    pub async fn incr(&mut self, key: impl Into<Arg>) -> Result<i64> {
        into_integer(self.call(incr(key)).await?)
    }

    pub async fn incrby(&mut self, key: impl Into<Arg>, increment: i64) -> Result<i64> {
        into_integer(self.call(incrby(key, increment)).await?)
    }

    pub async fn decr(&mut self, key: impl Into<Arg>) -> Result<i64> {
        into_integer(self.call(decr(key)).await?)
    }

    pub async fn decrby(&mut self, key: impl Into<Arg>, decrement: i64) -> Result<i64> {
        into_integer(self.call(decrby(key, decrement)).await?)
    }

    /// Returns the length of the string after the append.
    pub async fn append(&mut self, key: impl Into<Arg>, value: impl Into<Arg>) -> Result<i64> {
        into_integer(self.call(append(key, value)).await?)
    }

    pub async fn getrange(&mut self, key: impl Into<Arg>, start: i64, end: i64) -> Result<Data> {
        into_string(self.call(getrange(key, start, end)).await?)
    }

    pub async fn getbit(&mut self, key: impl Into<Arg>, offset: u64) -> Result<bool> {
        into_bool(self.call(getbit(key, offset)).await?)
    }

    /// Returns the previous value of the bit.
    pub async fn setbit(&mut self, key: impl Into<Arg>, offset: u64, value: bool) -> Result<bool> {
        into_bool(self.call(setbit(key, offset, value)).await?)
    }

    pub async fn strlen(&mut self, key: impl Into<Arg>) -> Result<i64> {
        into_integer(self.call(strlen(key)).await?)
    }
}
