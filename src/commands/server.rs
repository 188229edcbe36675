use crate::command::{Arg, Command};
use crate::commands::{into_integer, into_ok, into_string};
use crate::frame::Data;
use crate::{Client, Result};

/// Ref: <https://redis.io/docs/latest/commands/ping>
pub fn ping() -> Command {
    Command::new("PING")
}

/// Ref: <https://redis.io/docs/latest/commands/auth>
pub fn auth(password: impl Into<Arg>) -> Command {
    Command::new("AUTH").arg(password)
}

/// Ref: <https://redis.io/docs/latest/commands/select>
pub fn select(index: u32) -> Command {
    Command::new("SELECT").arg(index)
}

/// Ref: <https://redis.io/docs/latest/commands/flushdb>
pub fn flushdb() -> Command {
    Command::new("FLUSHDB")
}

/// Ref: <https://redis.io/docs/latest/commands/flushall>
pub fn flushall() -> Command {
    Command::new("FLUSHALL")
}

/// Ref: <https://redis.io/docs/latest/commands/dbsize>
pub fn dbsize() -> Command {
    Command::new("DBSIZE")
}

impl Client {
    /// Returns the server's answer, `PONG`.
    pub async fn ping(&mut self) -> Result<Data> {
        into_string(self.call(ping()).await?)
    }

    pub async fn auth(&mut self, password: impl Into<Arg>) -> Result<()> {
        into_ok(self.call(auth(password)).await?)
    }

    pub async fn select(&mut self, index: u32) -> Result<()> {
        into_ok(self.call(select(index)).await?)
    }

    pub async fn flushdb(&mut self) -> Result<()> {
        into_ok(self.call(flushdb()).await?)
    }

    pub async fn flushall(&mut self) -> Result<()> {
        into_ok(self.call(flushall()).await?)
    }

    /// Number of keys in the selected database.
    pub async fn dbsize(&mut self) -> Result<i64> {
        into_integer(self.call(dbsize()).await?)
    }
}
