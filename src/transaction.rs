use futures::future::BoxFuture;
use tracing::{debug, warn};

use crate::client::Reset;
use crate::command::{Arg, Command};
use crate::commands::{into_ok, transaction};
use crate::frame::Frame;
use crate::{Client, Error, Result};

/// Where a [`Transaction`] stands. Phases only move forward:
/// `Watching -> Queuing -> Committed | Aborted`, and `Watching -> Aborted` on discard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// WATCH was sent (or there was nothing to watch); commands run immediately.
    Watching,
    /// MULTI was sent; commands are queued until EXEC.
    Queuing,
    Committed,
    Aborted,
}

/// An optimistic transaction, holding its client for as long as it lives.
///
/// A guard dropped while still watching or queuing leaves the connection in a state the next
/// command must not inherit, so the client sends UNWATCH or DISCARD ahead of its next call.
pub struct Transaction<'a> {
    client: &'a mut Client,
    phase: Phase,
}

impl Client {
    /// Starts a transaction by watching `keys`. No WATCH is sent when there are no keys.
    pub async fn watch<K: Into<Arg>>(
        &mut self,
        keys: impl IntoIterator<Item = K>,
    ) -> Result<Transaction<'_>> {
        let cmd = transaction::watch(keys);
        if cmd.len() > 1 {
            into_ok(self.call(cmd).await?)?;
        }

        Ok(Transaction {
            client: self,
            phase: Phase::Watching,
        })
    }

    /// Watches `keys` and sends MULTI right away.
    pub async fn multi<K: Into<Arg>>(
        &mut self,
        keys: impl IntoIterator<Item = K>,
    ) -> Result<Transaction<'_>> {
        let mut tx = self.watch(keys).await?;
        tx.begin().await?;
        Ok(tx)
    }

    /// Runs `body` inside MULTI/EXEC, watching `keys`.
    ///
    /// When the body succeeds the transaction is executed and its replies returned, in the order
    /// the commands were queued. When it fails the transaction is discarded and the body's error
    /// is returned as is.
    ///
    /// ```no_run
    /// # async fn run(client: &mut rustdis_client::Client) -> rustdis_client::Result<()> {
    /// use rustdis_client::commands::strings;
    ///
    /// let replies = client
    ///     .transaction(["counter"], |tx| {
    ///         Box::pin(async move {
    ///             tx.queue(strings::incr("counter")).await?;
    ///             tx.queue(strings::get("counter")).await
    ///         })
    ///     })
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn transaction<K, F>(
        &mut self,
        keys: impl IntoIterator<Item = K>,
        body: F,
    ) -> Result<Vec<Frame>>
    where
        K: Into<Arg>,
        F: for<'t> FnOnce(&'t mut Transaction<'_>) -> BoxFuture<'t, Result<()>>,
    {
        let mut tx = self.multi(keys).await?;

        match body(&mut tx).await {
            Ok(()) => tx.exec().await,
            Err(err) => {
                if let Err(discard_err) = tx.discard().await {
                    warn!(error = %discard_err, "failed to discard transaction");
                }
                Err(err)
            }
        }
    }
}

impl<'a> Transaction<'a> {
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Runs a command right away. Only allowed before [`begin`](Transaction::begin), typically
    /// to read the watched keys.
    pub async fn call(&mut self, cmd: Command) -> Result<Frame> {
        self.expect_phase(Phase::Watching, &cmd)?;
        self.client.call(cmd).await
    }

    /// Sends MULTI. Every command after this is queued.
    pub async fn begin(&mut self) -> Result<()> {
        let cmd = transaction::multi();
        self.expect_phase(Phase::Watching, &cmd)?;

        into_ok(self.client.call(cmd).await?)?;
        self.phase = Phase::Queuing;
        Ok(())
    }

    /// Queues `cmd`. Its reply is part of what [`exec`](Transaction::exec) returns.
    pub async fn queue(&mut self, cmd: Command) -> Result<()> {
        self.expect_phase(Phase::Queuing, &cmd)?;

        match self.client.call(cmd).await? {
            Frame::Simple(ref s) if s == "QUEUED" => Ok(()),
            frame => Err(Error::UnexpectedReply {
                expected: "QUEUED",
                actual: frame,
            }),
        }
    }

    /// Sends EXEC. A nil reply means a watched key changed and nothing was applied, which is
    /// reported as [`Error::TransactionAborted`].
    ///
    /// Replies are read one level deep only. If a queued command fails at run time, its `-ERR`
    /// element inside the EXEC array is rejected as [`Error::Protocol`]. The transaction was still
    /// committed, its other commands applied, and the connection is unusable afterwards: drop the
    /// client and connect again.
    pub async fn exec(mut self) -> Result<Vec<Frame>> {
        let cmd = transaction::exec();
        self.expect_phase(Phase::Queuing, &cmd)?;

        // Whatever happens next, the server no longer holds a queue for us.
        self.phase = Phase::Aborted;

        match self.client.call(cmd).await? {
            Frame::Array(Some(replies)) => {
                self.phase = Phase::Committed;
                Ok(replies)
            }
            Frame::Array(None) => {
                debug!("transaction aborted by a watched key");
                Err(Error::TransactionAborted)
            }
            frame => Err(Error::UnexpectedReply {
                expected: "array",
                actual: frame,
            }),
        }
    }

    /// Gives up the transaction: DISCARD when queuing, UNWATCH when only watching.
    pub async fn discard(mut self) -> Result<()> {
        let cmd = match self.phase {
            Phase::Watching => transaction::unwatch(),
            Phase::Queuing => transaction::discard(),
            Phase::Committed | Phase::Aborted => return Ok(()),
        };

        self.phase = Phase::Aborted;
        into_ok(self.client.call(cmd).await?)
    }

    fn expect_phase(&self, expected: Phase, cmd: &Command) -> Result<()> {
        if self.phase != expected {
            return Err(Error::InvalidArgument(format!(
                "{} is not allowed while the transaction is {:?}",
                cmd.name(),
                self.phase
            )));
        }
        Ok(())
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        let reset = match self.phase {
            Phase::Watching => Reset::Unwatch,
            Phase::Queuing => Reset::Discard,
            Phase::Committed | Phase::Aborted => return,
        };

        debug!(?reset, "transaction dropped before it finished");
        self.client.schedule_reset(reset);
    }
}
