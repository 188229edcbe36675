use std::collections::{HashMap, HashSet};

use crate::command::{Arg, Command};
use crate::commands::{
    into_bool, into_data, into_integer, into_list, into_map, into_ok, into_optional_list, into_set,
};
use crate::frame::Data;
use crate::{Client, Result};

/// Ref: <https://redis.io/docs/latest/commands/hset>
pub fn hset(key: impl Into<Arg>, field: impl Into<Arg>, value: impl Into<Arg>) -> Command {
    Command::new("HSET").arg(key).arg(field).arg(value)
}

/// Ref: <https://redis.io/docs/latest/commands/hget>
pub fn hget(key: impl Into<Arg>, field: impl Into<Arg>) -> Command {
    Command::new("HGET").arg(key).arg(field)
}

/// Ref: <https://redis.io/docs/latest/commands/hmset>
pub fn hmset<F, V>(key: impl Into<Arg>, pairs: impl IntoIterator<Item = (F, V)>) -> Command
where
    F: Into<Arg>,
    V: Into<Arg>,
{
    Command::new("HMSET").arg(key).pairs(pairs)
}

/// Ref: <https://redis.io/docs/latest/commands/hmget>
pub fn hmget<F: Into<Arg>>(key: impl Into<Arg>, fields: impl IntoIterator<Item = F>) -> Command {
    Command::new("HMGET").arg(key).args(fields)
}

/// Ref: <https://redis.io/docs/latest/commands/hincrby>
pub fn hincrby(key: impl Into<Arg>, field: impl Into<Arg>, increment: i64) -> Command {
    Command::new("HINCRBY").arg(key).arg(field).arg(increment)
}

/// Ref: <https://redis.io/docs/latest/commands/hexists>
pub fn hexists(key: impl Into<Arg>, field: impl Into<Arg>) -> Command {
    Command::new("HEXISTS").arg(key).arg(field)
}

/// Ref: <https://redis.io/docs/latest/commands/hdel>
pub fn hdel(key: impl Into<Arg>, field: impl Into<Arg>) -> Command {
    Command::new("HDEL").arg(key).arg(field)
}

/// Ref: <https://redis.io/docs/latest/commands/hlen>
pub fn hlen(key: impl Into<Arg>) -> Command {
    Command::new("HLEN").arg(key)
}

/// Ref: <https://redis.io/docs/latest/commands/hkeys>
pub fn hkeys(key: impl Into<Arg>) -> Command {
    Command::new("HKEYS").arg(key)
}

/// Ref: <https://redis.io/docs/latest/commands/hvals>
pub fn hvals(key: impl Into<Arg>) -> Command {
    Command::new("HVALS").arg(key)
}

/// Ref: <https://redis.io/docs/latest/commands/hgetall>
pub fn hgetall(key: impl Into<Arg>) -> Command {
    Command::new("HGETALL").arg(key)
}

/// Ref: <https://redis.io/docs/latest/commands/hsetnx>
pub fn hsetnx(key: impl Into<Arg>, field: impl Into<Arg>, value: impl Into<Arg>) -> Command {
    Command::new("HSETNX").arg(key).arg(field).arg(value)
}

impl Client {
    /// Returns `true` when the field is new.
    pub async fn hset(
        &mut self,
        key: impl Into<Arg>,
        field: impl Into<Arg>,
        value: impl Into<Arg>,
    ) -> Result<bool> {
        into_bool(self.call(hset(key, field, value)).await?)
    }

    pub async fn hget(
        &mut self,
        key: impl Into<Arg>,
        field: impl Into<Arg>,
    ) -> Result<Option<Data>> {
        into_data(self.call(hget(key, field)).await?)
    }

    /// Sets several fields at once. Nothing is sent when there are no pairs.
    pub async fn hmset<F, V>(
        &mut self,
        key: impl Into<Arg>,
        pairs: impl IntoIterator<Item = (F, V)>,
    ) -> Result<()>
    where
        F: Into<Arg>,
        V: Into<Arg>,
    {
        let cmd = hmset(key, pairs);
        // Name and key only.
        if cmd.len() == 2 {
            return Ok(());
        }
        into_ok(self.call(cmd).await?)
    }

    /// Maps every requested field to its value, `None` for missing fields. Nothing is sent when
    /// there are no fields.
    pub async fn hmget<F: Into<Arg>>(
        &mut self,
        key: impl Into<Arg>,
        fields: impl IntoIterator<Item = F>,
    ) -> Result<HashMap<Data, Option<Data>>> {
        let fields: Vec<Arg> = fields.into_iter().map(Into::into).collect();
        if fields.is_empty() {
            return Ok(HashMap::new());
        }

        let policy = self.config().text_policy();
        let names = fields
            .iter()
            .map(|field| field.to_bytes(&policy).and_then(|bytes| policy.data(bytes)))
            .collect::<Result<Vec<_>>>()?;

        let values = into_optional_list(self.call(hmget(key, fields)).await?)?;

        Ok(names.into_iter().zip(values).collect())
    }

    pub async fn hincrby(
        &mut self,
        key: impl Into<Arg>,
        field: impl Into<Arg>,
        increment: i64,
    ) -> Result<i64> {
        into_integer(self.call(hincrby(key, field, increment)).await?)
    }

    pub async fn hexists(&mut self, key: impl Into<Arg>, field: impl Into<Arg>) -> Result<bool> {
        into_bool(self.call(hexists(key, field)).await?)
    }

    pub async fn hdel(&mut self, key: impl Into<Arg>, field: impl Into<Arg>) -> Result<bool> {
        into_bool(self.call(hdel(key, field)).await?)
    }

    pub async fn hlen(&mut self, key: impl Into<Arg>) -> Result<i64> {
        into_integer(self.call(hlen(key)).await?)
    }

    pub async fn hkeys(&mut self, key: impl Into<Arg>) -> Result<HashSet<Data>> {
        into_set(self.call(hkeys(key)).await?)
    }

    pub async fn hvals(&mut self, key: impl Into<Arg>) -> Result<Vec<Data>> {
        into_list(self.call(hvals(key)).await?)
    }

    pub async fn hgetall(&mut self, key: impl Into<Arg>) -> Result<HashMap<Data, Data>> {
        into_map(self.call(hgetall(key)).await?)
    }

    pub async fn hsetnx(
        &mut self,
        key: impl Into<Arg>,
        field: impl Into<Arg>,
        value: impl Into<Arg>,
    ) -> Result<bool> {
        into_bool(self.call(hsetnx(key, field, value)).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hmset_orders_fields() {
        let mut fields = HashMap::new();
        fields.insert("z", "1");
        fields.insert("m", "2");

        assert_eq!(hmset("h", fields).to_string(), "HMSET h m 2 z 1");
    }

    #[test]
    fn hmset_without_pairs_is_name_and_key() {
        let cmd = hmset("h", Vec::<(&str, &str)>::new());

        assert_eq!(cmd.len(), 2);
    }
}
