use crate::command::{Arg, Command};
use crate::commands::{into_integer, into_optional_list};
use crate::frame::Data;
use crate::{Client, Result};

/// How `SORT` orders and projects the elements of a list, set or sorted set.
///
/// The default compares elements as numbers, ascending, and returns the elements themselves.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sort {
    by: Option<Arg>,
    limit: Option<(i64, i64)>,
    get: Vec<Arg>,
    descending: bool,
    alpha: bool,
}

impl Sort {
    pub fn new() -> Sort {
        Sort::default()
    }

    /// Sorts by the values of external keys, `*` standing for the element. A pattern without `*`
    /// skips sorting altogether.
    pub fn by(mut self, pattern: impl Into<Arg>) -> Sort {
        self.by = Some(pattern.into());
        self
    }

    pub fn limit(mut self, offset: i64, count: i64) -> Sort {
        self.limit = Some((offset, count));
        self
    }

    /// Returns the value of an external key instead of the element; `#` is the element itself.
    /// Each call adds one value per element to the reply.
    pub fn get(mut self, pattern: impl Into<Arg>) -> Sort {
        self.get.push(pattern.into());
        self
    }

    pub fn desc(mut self) -> Sort {
        self.descending = true;
        self
    }

    /// Compares elements as strings instead of numbers.
    pub fn alpha(mut self) -> Sort {
        self.alpha = true;
        self
    }

    fn command(&self, key: impl Into<Arg>) -> Command {
        let mut cmd = Command::new("SORT").arg(key);
        if let Some(pattern) = &self.by {
            cmd = cmd.arg("BY").arg(pattern);
        }
        if let Some((offset, count)) = self.limit {
            cmd = cmd.arg("LIMIT").arg(offset).arg(count);
        }
        for pattern in &self.get {
            cmd = cmd.arg("GET").arg(pattern);
        }
        if self.descending {
            cmd = cmd.arg("DESC");
        }
        if self.alpha {
            cmd = cmd.arg("ALPHA");
        }
        cmd
    }
}

/// Ref: <https://redis.io/docs/latest/commands/sort>
pub fn sort(key: impl Into<Arg>, options: &Sort) -> Command {
    options.command(key)
}

/// `SORT ... STORE destination`.
pub fn sort_store(key: impl Into<Arg>, options: &Sort, destination: impl Into<Arg>) -> Command {
    options.command(key).arg("STORE").arg(destination)
}

impl Client {
    /// The sorted elements, or the values picked with [`Sort::get`], `None` where such a key is
    /// missing.
    pub async fn sort(
        &mut self,
        key: impl Into<Arg>,
        options: &Sort,
    ) -> Result<Vec<Option<Data>>> {
        into_optional_list(self.call(sort(key, options)).await?)
    }

    /// Stores the result as a list at `destination` and returns its length.
    pub async fn sort_store(
        &mut self,
        key: impl Into<Arg>,
        options: &Sort,
        destination: impl Into<Arg>,
    ) -> Result<i64> {
        into_integer(self.call(sort_store(key, options, destination)).await?)
    }
}
