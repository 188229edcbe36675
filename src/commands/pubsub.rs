use crate::command::{Arg, Command};
use crate::commands::into_integer;
use crate::{Client, Result};

/// Ref: <https://redis.io/docs/latest/commands/publish>
pub fn publish(channel: impl Into<Arg>, message: impl Into<Arg>) -> Command {
    Command::new("PUBLISH").arg(channel).arg(message)
}

/// Ref: <https://redis.io/docs/latest/commands/subscribe>
pub fn subscribe<C: Into<Arg>>(channels: impl IntoIterator<Item = C>) -> Command {
    Command::new("SUBSCRIBE").args(channels)
}

/// Ref: <https://redis.io/docs/latest/commands/psubscribe>
pub fn psubscribe<P: Into<Arg>>(patterns: impl IntoIterator<Item = P>) -> Command {
    Command::new("PSUBSCRIBE").args(patterns)
}

/// Ref: <https://redis.io/docs/latest/commands/unsubscribe>
pub fn unsubscribe<C: Into<Arg>>(channels: impl IntoIterator<Item = C>) -> Command {
    Command::new("UNSUBSCRIBE").args(channels)
}

/// Ref: <https://redis.io/docs/latest/commands/punsubscribe>
pub fn punsubscribe<P: Into<Arg>>(patterns: impl IntoIterator<Item = P>) -> Command {
    Command::new("PUNSUBSCRIBE").args(patterns)
}

impl Client {
    /// Returns the number of subscribers that received the message. Subscribing is done through
    /// a [`Hub`](crate::Hub), never on a command channel.
    pub async fn publish(
        &mut self,
        channel: impl Into<Arg>,
        message: impl Into<Arg>,
    ) -> Result<i64> {
        into_integer(self.call(publish(channel, message)).await?)
    }
}
