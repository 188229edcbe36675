use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::future::BoxFuture;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::command::Arg;
use crate::commands::{into_data, into_integer, keys, strings};
use crate::config::Config;
use crate::{Client, Error, Result};

/// Leases shorter than this leave no room for the acquiring transaction and one renewal.
pub const MIN_LEASE: Duration = Duration::from_secs(2);

/// A lease on a key, held until [`release`](Lock::release).
///
/// While held, a background task on its own connection extends the key's expiry back to the full
/// lease every half lease. The lock dereferences to the client that acquired it, so the critical
/// section can keep issuing commands.
///
/// Dropping a lock without releasing it stops the renewal but leaves the key in place until the
/// lease runs out.
#[derive(Debug)]
pub struct Lock<'a> {
    client: &'a mut Client,
    key: Bytes,
    token: Bytes,
    lease: Duration,
    renewal: Option<Renewal>,
}

#[derive(Debug)]
struct Renewal {
    stop: CancellationToken,
    handle: JoinHandle<()>,
}

impl Client {
    /// Acquires the lock on `key`, failing fast with [`Error::LockNotAcquired`] when someone else
    /// holds it or wins the race for it.
    #[instrument(name = "lock", skip(self, key), fields(key))]
    pub async fn lock(&mut self, key: impl Into<Arg>, lease: Duration) -> Result<Lock<'_>> {
        if lease < MIN_LEASE {
            return Err(Error::InvalidArgument(format!(
                "lock lease must be at least {:?}, got {:?}",
                MIN_LEASE, lease
            )));
        }

        let key = key.into().to_bytes(&self.config().text_policy())?;
        let token = Bytes::from(Uuid::new_v4().to_string());
        tracing::Span::current().record("key", &*String::from_utf8_lossy(&key));

        // Watch first, so a holder that appears between the check and the write aborts EXEC.
        let mut tx = self.watch([&key]).await?;
        if into_data(tx.call(strings::get(&key)).await?)?.is_some() {
            tx.discard().await?;
            debug!("lock is held by someone else");
            return Err(Error::LockNotAcquired);
        }

        tx.begin().await?;
        tx.queue(strings::setex(&key, lease, &token)).await?;
        match tx.exec().await {
            Ok(_) => {}
            Err(Error::TransactionAborted) => {
                debug!("lost the race for the lock");
                return Err(Error::LockNotAcquired);
            }
            Err(err) => return Err(err),
        }

        info!(token = %String::from_utf8_lossy(&token), "lock acquired");
        let renewal = Renewal::spawn(self.shared_config(), key.clone(), lease);

        Ok(Lock {
            client: self,
            key,
            token,
            lease,
            renewal: Some(renewal),
        })
    }

    /// Runs `body` while holding the lock on `key`, releasing it afterwards whatever the body
    /// returned. A failed release wins over the body's result.
    pub async fn with_lock<T, F>(
        &mut self,
        key: impl Into<Arg>,
        lease: Duration,
        body: F,
    ) -> Result<T>
    where
        F: for<'l> FnOnce(&'l mut Client) -> BoxFuture<'l, Result<T>>,
    {
        let mut lock = self.lock(key, lease).await?;
        let result = body(&mut *lock).await;
        lock.release().await?;
        result
    }
}

impl<'a> Lock<'a> {
    pub fn key(&self) -> &Bytes {
        &self.key
    }

    /// The value stored under the key while this lock holds it.
    pub fn token(&self) -> &Bytes {
        &self.token
    }

    pub fn lease(&self) -> Duration {
        self.lease
    }

    /// Stops the renewal and deletes the key.
    ///
    /// Fails with [`Error::ConsistencyViolation`] when the key no longer holds this lock's token,
    /// meaning the lease ran out and mutual exclusion was lost. The key is left alone then.
    pub async fn release(mut self) -> Result<()> {
        if let Some(renewal) = self.renewal.take() {
            renewal.stop().await;
        }

        let found = into_data(self.client.call(strings::get(&self.key)).await?)?;
        if found.as_ref().map(|data| data.as_bytes()) != Some(&self.token[..]) {
            let key = String::from_utf8_lossy(&self.key).into_owned();
            let expected = String::from_utf8_lossy(&self.token).into_owned();
            let found = found.map(|data| data.to_string());
            error!(%key, %expected, ?found, "someone else took the lock");
            return Err(Error::ConsistencyViolation {
                key,
                expected,
                found,
            });
        }

        into_integer(self.client.call(keys::del([&self.key])).await?)?;
        info!(key = %String::from_utf8_lossy(&self.key), "lock released");
        Ok(())
    }
}

impl Deref for Lock<'_> {
    type Target = Client;

    fn deref(&self) -> &Client {
        self.client
    }
}

impl DerefMut for Lock<'_> {
    fn deref_mut(&mut self) -> &mut Client {
        self.client
    }
}

impl Drop for Lock<'_> {
    fn drop(&mut self) {
        if let Some(renewal) = self.renewal.take() {
            warn!(
                key = %String::from_utf8_lossy(&self.key),
                "lock dropped without release, it is held until the lease expires"
            );
            renewal.stop.cancel();
        }
    }
}

impl Renewal {
    fn spawn(config: Arc<Config>, key: Bytes, lease: Duration) -> Renewal {
        let stop = CancellationToken::new();
        let handle = tokio::spawn(renew(config, key, lease, stop.clone()));
        Renewal { stop, handle }
    }

    async fn stop(self) {
        self.stop.cancel();
        if let Err(err) = self.handle.await {
            warn!(error = %err, "lock renewal task failed");
        }
    }
}

/// Extends the lease right away and then every half lease, on a connection of its own so the
/// holder's channel stays free for the critical section.
#[instrument(name = "lock_renewal", skip_all, fields(key = %String::from_utf8_lossy(&key)))]
async fn renew(config: Arc<Config>, key: Bytes, lease: Duration, stop: CancellationToken) {
    let mut client = tokio::select! {
        _ = stop.cancelled() => return,
        client = Client::connect_shared(config) => match client {
            Ok(client) => client,
            Err(err) => {
                error!(error = %err, "lock renewal could not connect");
                return;
            }
        },
    };

    loop {
        let renewed = tokio::select! {
            _ = stop.cancelled() => break,
            renewed = client.expire(&key, lease) => renewed,
        };

        match renewed {
            Ok(true) => debug!("lease extended"),
            Ok(false) => {
                warn!("lock key is gone, stopping renewal");
                break;
            }
            Err(err) => {
                error!(error = %err, "lease renewal failed");
                break;
            }
        }

        tokio::select! {
            _ = stop.cancelled() => break,
            _ = tokio::time::sleep(lease / 2) => {}
        }
    }

    debug!("lock renewal stopped");
}
