use std::collections::HashSet;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::command::{Arg, Command};
use crate::commands::{
    into_bool, into_data, into_integer, into_ok, into_set, into_string, whole_seconds,
};
use crate::frame::Data;
use crate::{Client, Error, Result};

/// Ref: <https://redis.io/docs/latest/commands/exists>
pub fn exists(key: impl Into<Arg>) -> Command {
    Command::new("EXISTS").arg(key)
}

/// Ref: <https://redis.io/docs/latest/commands/del>
pub fn del<K: Into<Arg>>(keys: impl IntoIterator<Item = K>) -> Command {
    Command::new("DEL").args(keys)
}

/// Ref: <https://redis.io/docs/latest/commands/type>
pub fn type_(key: impl Into<Arg>) -> Command {
    Command::new("TYPE").arg(key)
}

/// Ref: <https://redis.io/docs/latest/commands/keys>
pub fn keys(pattern: impl Into<Arg>) -> Command {
    Command::new("KEYS").arg(pattern)
}

/// Ref: <https://redis.io/docs/latest/commands/randomkey>
pub fn randomkey() -> Command {
    Command::new("RANDOMKEY")
}

/// Ref: <https://redis.io/docs/latest/commands/rename>
pub fn rename(key: impl Into<Arg>, new_key: impl Into<Arg>) -> Command {
    Command::new("RENAME").arg(key).arg(new_key)
}

/// Ref: <https://redis.io/docs/latest/commands/renamenx>
pub fn renamenx(key: impl Into<Arg>, new_key: impl Into<Arg>) -> Command {
    Command::new("RENAMENX").arg(key).arg(new_key)
}

/// Ref: <https://redis.io/docs/latest/commands/expire>
pub fn expire(key: impl Into<Arg>, ttl: Duration) -> Command {
    Command::new("EXPIRE").arg(key).arg(whole_seconds(ttl))
}

/// Ref: <https://redis.io/docs/latest/commands/expireat>
pub fn expireat(key: impl Into<Arg>, unix_time: u64) -> Command {
    Command::new("EXPIREAT").arg(key).arg(unix_time)
}

/// Ref: <https://redis.io/docs/latest/commands/ttl>
pub fn ttl(key: impl Into<Arg>) -> Command {
    Command::new("TTL").arg(key)
}

impl Client {
    pub async fn exists(&mut self, key: impl Into<Arg>) -> Result<bool> {
        into_bool(self.call(exists(key)).await?)
    }

    /// Deletes the given keys and returns how many existed.
    pub async fn del<K: Into<Arg>>(&mut self, keys: impl IntoIterator<Item = K>) -> Result<i64> {
        into_integer(self.call(del(keys)).await?)
    }

    /// The type stored at `key`, `none` when the key does not exist.
    pub async fn type_(&mut self, key: impl Into<Arg>) -> Result<Data> {
        into_string(self.call(type_(key)).await?)
    }

    pub async fn keys(&mut self, pattern: impl Into<Arg>) -> Result<HashSet<Data>> {
        into_set(self.call(keys(pattern)).await?)
    }

    pub async fn randomkey(&mut self) -> Result<Option<Data>> {
        into_data(self.call(randomkey()).await?)
    }

    pub async fn rename(&mut self, key: impl Into<Arg>, new_key: impl Into<Arg>) -> Result<()> {
        into_ok(self.call(rename(key, new_key)).await?)
    }

    pub async fn renamenx(
        &mut self,
        key: impl Into<Arg>,
        new_key: impl Into<Arg>,
    ) -> Result<bool> {
        into_bool(self.call(renamenx(key, new_key)).await?)
    }

    /// Returns `false` when the key does not exist. The TTL is sent in whole seconds, rounded up.
    pub async fn expire(&mut self, key: impl Into<Arg>, ttl: Duration) -> Result<bool> {
        into_bool(self.call(expire(key, ttl)).await?)
    }

    pub async fn expireat(&mut self, key: impl Into<Arg>, when: SystemTime) -> Result<bool> {
        let unix_time = when
            .duration_since(UNIX_EPOCH)
            .map_err(|e| Error::InvalidArgument(e.to_string()))?
            .as_secs();

        into_bool(self.call(expireat(key, unix_time)).await?)
    }

    /// Seconds left before `key` expires. `None` when the key has no expiry; a missing key
    /// answers `-2`, which is passed through.
    pub async fn ttl(&mut self, key: impl Into<Arg>) -> Result<Option<i64>> {
        match into_integer(self.call(ttl(key)).await?)? {
            -1 => Ok(None),
            ttl => Ok(Some(ttl)),
        }
    }
}
