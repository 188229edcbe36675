use crate::command::{Arg, Command};
use crate::commands::{
    into_bool, into_float, into_integer, into_list, into_optional_integer, into_scored, unexpected,
};
use crate::frame::{Data, Frame};
use crate::{Client, Result};

/// Ref: <https://redis.io/docs/latest/commands/zadd>
pub fn zadd(key: impl Into<Arg>, score: f64, member: impl Into<Arg>) -> Command {
    Command::new("ZADD").arg(key).arg(score).arg(member)
}

/// Ref: <https://redis.io/docs/latest/commands/zrem>
pub fn zrem(key: impl Into<Arg>, member: impl Into<Arg>) -> Command {
    Command::new("ZREM").arg(key).arg(member)
}

/// Ref: <https://redis.io/docs/latest/commands/zrange>
pub fn zrange(key: impl Into<Arg>, start: i64, stop: i64, with_scores: bool) -> Command {
    with_scores_flag(Command::new("ZRANGE").arg(key).arg(start).arg(stop), with_scores)
}

/// Ref: <https://redis.io/docs/latest/commands/zrevrange>
pub fn zrevrange(key: impl Into<Arg>, start: i64, stop: i64, with_scores: bool) -> Command {
    with_scores_flag(Command::new("ZREVRANGE").arg(key).arg(start).arg(stop), with_scores)
}

/// Ref: <https://redis.io/docs/latest/commands/zcard>
pub fn zcard(key: impl Into<Arg>) -> Command {
    Command::new("ZCARD").arg(key)
}

/// Ref: <https://redis.io/docs/latest/commands/zscore>
pub fn zscore(key: impl Into<Arg>, member: impl Into<Arg>) -> Command {
    Command::new("ZSCORE").arg(key).arg(member)
}

/// Ref: <https://redis.io/docs/latest/commands/zincrby>
pub fn zincrby(key: impl Into<Arg>, increment: f64, member: impl Into<Arg>) -> Command {
    Command::new("ZINCRBY").arg(key).arg(increment).arg(member)
}

/// Ref: <https://redis.io/docs/latest/commands/zrank>
pub fn zrank(key: impl Into<Arg>, member: impl Into<Arg>) -> Command {
    Command::new("ZRANK").arg(key).arg(member)
}

/// Ref: <https://redis.io/docs/latest/commands/zrevrank>
pub fn zrevrank(key: impl Into<Arg>, member: impl Into<Arg>) -> Command {
    Command::new("ZREVRANK").arg(key).arg(member)
}

/// Ref: <https://redis.io/docs/latest/commands/zrangebyscore>
///
/// `min` and `max` accept anything Redis does: numbers, `-inf`/`+inf`, or `(`-prefixed
/// exclusive bounds. `limit` is an `(offset, count)` pair.
pub fn zrangebyscore(
    key: impl Into<Arg>,
    min: impl Into<Arg>,
    max: impl Into<Arg>,
    limit: Option<(i64, i64)>,
    with_scores: bool,
) -> Command {
    let mut cmd = Command::new("ZRANGEBYSCORE").arg(key).arg(min).arg(max);
    if let Some((offset, count)) = limit {
        cmd = cmd.arg("LIMIT").arg(offset).arg(count);
    }
    with_scores_flag(cmd, with_scores)
}

/// Ref: <https://redis.io/docs/latest/commands/zcount>
pub fn zcount(key: impl Into<Arg>, min: impl Into<Arg>, max: impl Into<Arg>) -> Command {
    Command::new("ZCOUNT").arg(key).arg(min).arg(max)
}

/// Ref: <https://redis.io/docs/latest/commands/zremrangebyrank>
pub fn zremrangebyrank(key: impl Into<Arg>, start: i64, stop: i64) -> Command {
    Command::new("ZREMRANGEBYRANK").arg(key).arg(start).arg(stop)
}

/// Ref: <https://redis.io/docs/latest/commands/zremrangebyscore>
pub fn zremrangebyscore(
    key: impl Into<Arg>,
    min: impl Into<Arg>,
    max: impl Into<Arg>,
) -> Command {
    Command::new("ZREMRANGEBYSCORE").arg(key).arg(min).arg(max)
}

fn with_scores_flag(cmd: Command, with_scores: bool) -> Command {
    if with_scores {
        cmd.arg("WITHSCORES")
    } else {
        cmd
    }
}

impl Client {
    /// Returns `true` when the member is new to the set.
    pub async fn zadd(
        &mut self,
        key: impl Into<Arg>,
        score: f64,
        member: impl Into<Arg>,
    ) -> Result<bool> {
        into_bool(self.call(zadd(key, score, member)).await?)
    }

    pub async fn zrem(&mut self, key: impl Into<Arg>, member: impl Into<Arg>) -> Result<bool> {
        into_bool(self.call(zrem(key, member)).await?)
    }

    pub async fn zrange(
        &mut self,
        key: impl Into<Arg>,
        start: i64,
        stop: i64,
    ) -> Result<Vec<Data>> {
        into_list(self.call(zrange(key, start, stop, false)).await?)
    }

    pub async fn zrange_with_scores(
        &mut self,
        key: impl Into<Arg>,
        start: i64,
        stop: i64,
    ) -> Result<Vec<(Data, f64)>> {
        into_scored(self.call(zrange(key, start, stop, true)).await?)
    }

    pub async fn zrevrange(
        &mut self,
        key: impl Into<Arg>,
        start: i64,
        stop: i64,
    ) -> Result<Vec<Data>> {
        into_list(self.call(zrevrange(key, start, stop, false)).await?)
    }

    pub async fn zrevrange_with_scores(
        &mut self,
        key: impl Into<Arg>,
        start: i64,
        stop: i64,
    ) -> Result<Vec<(Data, f64)>> {
        into_scored(self.call(zrevrange(key, start, stop, true)).await?)
    }

    pub async fn zcard(&mut self, key: impl Into<Arg>) -> Result<i64> {
        into_integer(self.call(zcard(key)).await?)
    }

    pub async fn zscore(
        &mut self,
        key: impl Into<Arg>,
        member: impl Into<Arg>,
    ) -> Result<Option<f64>> {
        into_float(self.call(zscore(key, member)).await?)
    }

    /// Returns the new score.
    pub async fn zincrby(
        &mut self,
        key: impl Into<Arg>,
        increment: f64,
        member: impl Into<Arg>,
    ) -> Result<f64> {
        match into_float(self.call(zincrby(key, increment, member)).await?)? {
            Some(score) => Ok(score),
            None => unexpected("score", Frame::Bulk(None)),
        }
    }

    pub async fn zrank(
        &mut self,
        key: impl Into<Arg>,
        member: impl Into<Arg>,
    ) -> Result<Option<i64>> {
        into_optional_integer(self.call(zrank(key, member)).await?)
    }

    pub async fn zrevrank(
        &mut self,
        key: impl Into<Arg>,
        member: impl Into<Arg>,
    ) -> Result<Option<i64>> {
        into_optional_integer(self.call(zrevrank(key, member)).await?)
    }

    pub async fn zrangebyscore(
        &mut self,
        key: impl Into<Arg>,
        min: impl Into<Arg>,
        max: impl Into<Arg>,
        limit: Option<(i64, i64)>,
    ) -> Result<Vec<Data>> {
        into_list(self.call(zrangebyscore(key, min, max, limit, false)).await?)
    }

    pub async fn zrangebyscore_with_scores(
        &mut self,
        key: impl Into<Arg>,
        min: impl Into<Arg>,
        max: impl Into<Arg>,
        limit: Option<(i64, i64)>,
    ) -> Result<Vec<(Data, f64)>> {
        into_scored(self.call(zrangebyscore(key, min, max, limit, true)).await?)
    }

    pub async fn zcount(
        &mut self,
        key: impl Into<Arg>,
        min: impl Into<Arg>,
        max: impl Into<Arg>,
    ) -> Result<i64> {
        into_integer(self.call(zcount(key, min, max)).await?)
    }

    pub async fn zremrangebyrank(
        &mut self,
        key: impl Into<Arg>,
        start: i64,
        stop: i64,
    ) -> Result<i64> {
        into_integer(self.call(zremrangebyrank(key, start, stop)).await?)
    }

    pub async fn zremrangebyscore(
        &mut self,
        key: impl Into<Arg>,
        min: impl Into<Arg>,
        max: impl Into<Arg>,
    ) -> Result<i64> {
        into_integer(self.call(zremrangebyscore(key, min, max)).await?)
    }
}
