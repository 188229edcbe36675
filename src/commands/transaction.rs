use crate::command::{Arg, Command};

/// Ref: <https://redis.io/docs/latest/commands/watch>
pub fn watch<K: Into<Arg>>(keys: impl IntoIterator<Item = K>) -> Command {
    Command::new("WATCH").args(keys)
}

/// Ref: <https://redis.io/docs/latest/commands/unwatch>
pub fn unwatch() -> Command {
    Command::new("UNWATCH")
}

/// Ref: <https://redis.io/docs/latest/commands/multi>
pub fn multi() -> Command {
    Command::new("MULTI")
}

/// Ref: <https://redis.io/docs/latest/commands/exec>
pub fn exec() -> Command {
    Command::new("EXEC")
}

/// Ref: <https://redis.io/docs/latest/commands/discard>
pub fn discard() -> Command {
    Command::new("DISCARD")
}
