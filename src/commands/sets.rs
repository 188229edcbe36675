use std::collections::HashSet;

use crate::command::{Arg, Command};
use crate::commands::{into_bool, into_data, into_integer, into_set};
use crate::frame::Data;
use crate::{Client, Result};

/// Ref: <https://redis.io/docs/latest/commands/sadd>
pub fn sadd(key: impl Into<Arg>, member: impl Into<Arg>) -> Command {
    Command::new("SADD").arg(key).arg(member)
}

/// Ref: <https://redis.io/docs/latest/commands/srem>
pub fn srem(key: impl Into<Arg>, member: impl Into<Arg>) -> Command {
    Command::new("SREM").arg(key).arg(member)
}

/// Ref: <https://redis.io/docs/latest/commands/spop>
pub fn spop(key: impl Into<Arg>) -> Command {
    Command::new("SPOP").arg(key)
}

/// Ref: <https://redis.io/docs/latest/commands/smove>
pub fn smove(
    source: impl Into<Arg>,
    destination: impl Into<Arg>,
    member: impl Into<Arg>,
) -> Command {
    Command::new("SMOVE").arg(source).arg(destination).arg(member)
}

/// Ref: <https://redis.io/docs/latest/commands/scard>
pub fn scard(key: impl Into<Arg>) -> Command {
    Command::new("SCARD").arg(key)
}

/// Ref: <https://redis.io/docs/latest/commands/sismember>
pub fn sismember(key: impl Into<Arg>, member: impl Into<Arg>) -> Command {
    Command::new("SISMEMBER").arg(key).arg(member)
}

/// Ref: <https://redis.io/docs/latest/commands/sinter>
pub fn sinter<K: Into<Arg>>(keys: impl IntoIterator<Item = K>) -> Command {
    Command::new("SINTER").args(keys)
}

/// Ref: <https://redis.io/docs/latest/commands/sinterstore>
pub fn sinterstore<K: Into<Arg>>(
    destination: impl Into<Arg>,
    keys: impl IntoIterator<Item = K>,
) -> Command {
    Command::new("SINTERSTORE").arg(destination).args(keys)
}

/// Ref: <https://redis.io/docs/latest/commands/sunion>
pub fn sunion<K: Into<Arg>>(keys: impl IntoIterator<Item = K>) -> Command {
    Command::new("SUNION").args(keys)
}

/// Ref: <https://redis.io/docs/latest/commands/sunionstore>
pub fn sunionstore<K: Into<Arg>>(
    destination: impl Into<Arg>,
    keys: impl IntoIterator<Item = K>,
) -> Command {
    Command::new("SUNIONSTORE").arg(destination).args(keys)
}

/// Ref: <https://redis.io/docs/latest/commands/sdiff>
pub fn sdiff<K: Into<Arg>>(keys: impl IntoIterator<Item = K>) -> Command {
    Command::new("SDIFF").args(keys)
}

/// Ref: <https://redis.io/docs/latest/commands/sdiffstore>
pub fn sdiffstore<K: Into<Arg>>(
    destination: impl Into<Arg>,
    keys: impl IntoIterator<Item = K>,
) -> Command {
    Command::new("SDIFFSTORE").arg(destination).args(keys)
}

/// Ref: <https://redis.io/docs/latest/commands/smembers>
pub fn smembers(key: impl Into<Arg>) -> Command {
    Command::new("SMEMBERS").arg(key)
}

/// Ref: <https://redis.io/docs/latest/commands/srandmember>
pub fn srandmember(key: impl Into<Arg>) -> Command {
    Command::new("SRANDMEMBER").arg(key)
}

impl Client {
    /// Returns `false` when the member was already present.
    pub async fn sadd(&mut self, key: impl Into<Arg>, member: impl Into<Arg>) -> Result<bool> {
        into_bool(self.call(sadd(key, member)).await?)
    }

    pub async fn srem(&mut self, key: impl Into<Arg>, member: impl Into<Arg>) -> Result<bool> {
        into_bool(self.call(srem(key, member)).await?)
    }

    pub async fn spop(&mut self, key: impl Into<Arg>) -> Result<Option<Data>> {
        into_data(self.call(spop(key)).await?)
    }

    pub async fn smove(
        &mut self,
        source: impl Into<Arg>,
        destination: impl Into<Arg>,
        member: impl Into<Arg>,
    ) -> Result<bool> {
        into_bool(self.call(smove(source, destination, member)).await?)
    }

    pub async fn scard(&mut self, key: impl Into<Arg>) -> Result<i64> {
        into_integer(self.call(scard(key)).await?)
    }

    pub async fn sismember(
        &mut self,
        key: impl Into<Arg>,
        member: impl Into<Arg>,
    ) -> Result<bool> {
        into_bool(self.call(sismember(key, member)).await?)
    }

    pub async fn sinter<K: Into<Arg>>(
        &mut self,
        keys: impl IntoIterator<Item = K>,
    ) -> Result<HashSet<Data>> {
        into_set(self.call(sinter(keys)).await?)
    }

    /// Stores the intersection in `destination` and returns its size.
    pub async fn sinterstore<K: Into<Arg>>(
        &mut self,
        destination: impl Into<Arg>,
        keys: impl IntoIterator<Item = K>,
    ) -> Result<i64> {
        into_integer(self.call(sinterstore(destination, keys)).await?)
    }

    pub async fn sunion<K: Into<Arg>>(
        &mut self,
        keys: impl IntoIterator<Item = K>,
    ) -> Result<HashSet<Data>> {
        into_set(self.call(sunion(keys)).await?)
    }

    pub async fn sunionstore<K: Into<Arg>>(
        &mut self,
        destination: impl Into<Arg>,
        keys: impl IntoIterator<Item = K>,
    ) -> Result<i64> {
        into_integer(self.call(sunionstore(destination, keys)).await?)
    }

    pub async fn sdiff<K: Into<Arg>>(
        &mut self,
        keys: impl IntoIterator<Item = K>,
    ) -> Result<HashSet<Data>> {
        into_set(self.call(sdiff(keys)).await?)
    }

    pub async fn sdiffstore<K: Into<Arg>>(
        &mut self,
        destination: impl Into<Arg>,
        keys: impl IntoIterator<Item = K>,
    ) -> Result<i64> {
        into_integer(self.call(sdiffstore(destination, keys)).await?)
    }

    pub async fn smembers(&mut self, key: impl Into<Arg>) -> Result<HashSet<Data>> {
        into_set(self.call(smembers(key)).await?)
    }

    pub async fn srandmember(&mut self, key: impl Into<Arg>) -> Result<Option<Data>> {
        into_data(self.call(srandmember(key)).await?)
    }
}
