//! One subscriber connection shared by any number of independent subscriptions.
//!
//! The channel mapping is owned by a single background task. Subscriptions never touch it: they
//! push additions and removals into two pending buffers and wake the task, which drains both
//! buffers before it goes back to waiting for messages.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use std::time::Duration;

use bytes::Bytes;
use futures::future::join_all;
use futures::Stream;
use itertools::Itertools;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::{oneshot, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument, trace, warn};

use crate::charset::TextPolicy;
use crate::codec::RespCodec;
use crate::command::Arg;
use crate::commands::{into_ok, pubsub, server};
use crate::config::Config;
use crate::connection::Connection;
use crate::frame::{Data, Frame};
use crate::{Error, Result};

/// A published message, as delivered to a [`Subscription`].
#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    /// The channel the message was published to.
    pub channel: Data,
    /// The pattern that matched, for pattern subscriptions.
    pub pattern: Option<Data>,
    pub payload: Data,
}

#[derive(Debug)]
pub struct Hub {
    shared: Arc<Shared>,
    task: JoinHandle<()>,
}

#[derive(Debug)]
struct Shared {
    pending: Mutex<Pending>,
    waker: Notify,
    next_id: AtomicU64,
    policy: TextPolicy,
}

#[derive(Debug, Default)]
struct Pending {
    adds: Vec<Add>,
    removals: Vec<(Bytes, u64)>,
    /// Set once the hub task has stopped; nothing will drain the buffers anymore.
    closed: bool,
}

#[derive(Debug)]
struct Add {
    key: Bytes,
    id: u64,
    queue: UnboundedSender<Message>,
    ack: oneshot::Sender<()>,
}

/// Receives every message published to the channels and patterns it was created for, in the
/// order the server sent them. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    shared: Arc<Shared>,
    id: u64,
    keys: Vec<Bytes>,
    rx: UnboundedReceiver<Message>,
}

impl Hub {
    /// Opens the subscriber connection and starts the hub task.
    ///
    /// Channel names are always matched as raw bytes; the text policy of `config` applies only
    /// to the messages handed to subscriptions.
    pub async fn connect(config: Config) -> Result<Hub> {
        let policy = config.text_policy();
        let codec = RespCodec::new(policy.raw(), config.max_frame_size);
        let mut conn = Connection::connect(&config, codec).await?;

        if let Some(password) = &config.password {
            match conn.request(server::auth(password)).await? {
                Frame::Error(msg) => return Err(Error::Server(msg)),
                frame => into_ok(frame)?,
            }
        }

        let shared = Arc::new(Shared {
            pending: Mutex::new(Pending::default()),
            waker: Notify::new(),
            next_id: AtomicU64::new(0),
            policy,
        });

        let task = tokio::spawn({
            let shared = shared.clone();
            async move { run(conn, shared).await }
        });

        Ok(Hub { shared, task })
    }

    /// Subscribes to `channels`. Names containing `*`, `?` or a `[...]` class are subscribed as
    /// patterns.
    ///
    /// Resolves once the server has confirmed every subscription, so anything published after
    /// this returns is delivered.
    pub async fn subscribe<C: Into<Arg>>(
        &self,
        channels: impl IntoIterator<Item = C>,
    ) -> Result<Subscription> {
        let keys = channels
            .into_iter()
            .map(|channel| channel.into().to_bytes(&self.shared.policy))
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .unique()
            .collect::<Vec<_>>();

        if keys.is_empty() {
            return Err(Error::InvalidArgument(String::from(
                "subscribe needs at least one channel",
            )));
        }

        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        let mut acks = Vec::with_capacity(keys.len());

        {
            let mut pending = self.shared.lock();
            if pending.closed {
                return Err(Error::ConnectionClosed);
            }

            for key in &keys {
                let (ack, acked) = oneshot::channel();
                pending.adds.push(Add {
                    key: key.clone(),
                    id,
                    queue: tx.clone(),
                    ack,
                });
                acks.push(acked);
            }
        }
        self.shared.waker.notify_one();

        // From here on, an early return unsubscribes through `Drop`.
        let subscription = Subscription {
            shared: self.shared.clone(),
            id,
            keys,
            rx,
        };

        for acked in join_all(acks).await {
            acked.map_err(|_| Error::ConnectionClosed)?;
        }

        Ok(subscription)
    }

    /// Whether the hub task has stopped, because the connection failed or was closed.
    pub fn is_closed(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for Hub {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Pending> {
        // The buffers stay consistent even if a holder panicked.
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn take_pending(&self) -> (Vec<Add>, Vec<(Bytes, u64)>) {
        let mut pending = self.lock();
        (
            std::mem::take(&mut pending.adds),
            std::mem::take(&mut pending.removals),
        )
    }

    fn close(&self) {
        let mut pending = self.lock();
        pending.closed = true;
        pending.adds.clear();
        pending.removals.clear();
    }
}

impl Subscription {
    /// Waits for the next message. `None` once the hub has stopped.
    pub async fn recv(&mut self) -> Option<Message> {
        self.rx.recv().await
    }

    /// Like [`recv`](Subscription::recv), giving up with `None` after `timeout`.
    pub async fn fetch(&mut self, timeout: Duration) -> Option<Message> {
        tokio::time::timeout(timeout, self.rx.recv())
            .await
            .ok()
            .flatten()
    }

    /// The channels and patterns this subscription listens to, as sent to the server.
    pub fn channels(&self) -> &[Bytes] {
        &self.keys
    }
}

impl Stream for Subscription {
    type Item = Message;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Message>> {
        self.rx.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        {
            let mut pending = self.shared.lock();
            if pending.closed {
                return;
            }
            for key in self.keys.drain(..) {
                pending.removals.push((key, self.id));
            }
        }
        self.shared.waker.notify_one();
    }
}

/// Whether `key` is subscribed with PSUBSCRIBE rather than SUBSCRIBE.
fn is_pattern(key: &[u8]) -> bool {
    key.contains(&b'*') || key.contains(&b'?') || (key.contains(&b'[') && key.contains(&b']'))
}

#[instrument(name = "hub", skip_all, fields(connection_id = %conn.id))]
async fn run(mut conn: Connection, shared: Arc<Shared>) {
    let mut state = State::default();

    loop {
        let (adds, removals) = shared.take_pending();
        let idle = adds.is_empty() && removals.is_empty();

        let (channels, patterns) = state.add(adds);
        let (gone_channels, gone_patterns) = state.remove(removals);

        if let Err(err) = apply(&mut conn, channels, patterns, gone_channels, gone_patterns).await {
            error!(error = %err, "failed to update subscriptions");
            break;
        }

        if !idle {
            continue;
        }

        let frame = tokio::select! {
            _ = shared.waker.notified() => continue,
            frame = conn.read_frame() => frame,
        };

        match frame {
            Ok(Some(frame)) => state.route(frame, &shared.policy),
            Ok(None) => {
                error!("subscriber connection closed by the server");
                break;
            }
            Err(err) => {
                error!(error = %err, "subscriber connection failed");
                break;
            }
        }
    }

    shared.close();
}

async fn apply(
    conn: &mut Connection,
    channels: Vec<Bytes>,
    patterns: Vec<Bytes>,
    gone_channels: Vec<Bytes>,
    gone_patterns: Vec<Bytes>,
) -> Result<()> {
    // Confirmations arrive later, interleaved with messages, and are picked up by `route`.
    if !channels.is_empty() {
        debug!(count = channels.len(), "subscribing");
        conn.write_command(pubsub::subscribe(channels)).await?;
    }
    if !patterns.is_empty() {
        debug!(count = patterns.len(), "subscribing to patterns");
        conn.write_command(pubsub::psubscribe(patterns)).await?;
    }
    if !gone_channels.is_empty() {
        debug!(count = gone_channels.len(), "unsubscribing");
        conn.write_command(pubsub::unsubscribe(gone_channels)).await?;
    }
    if !gone_patterns.is_empty() {
        debug!(count = gone_patterns.len(), "unsubscribing from patterns");
        conn.write_command(pubsub::punsubscribe(gone_patterns)).await?;
    }
    Ok(())
}

/// The mapping from channel or pattern to the queues listening on it. Only the hub task holds
/// one.
#[derive(Default)]
struct State {
    subscribers: HashMap<Bytes, HashMap<u64, UnboundedSender<Message>>>,
    /// Subscriptions waiting for the server to confirm a key.
    awaiting: HashMap<Bytes, Vec<oneshot::Sender<()>>>,
}

impl State {
    /// Registers the additions, returning the channels and patterns that are new to the server.
    fn add(&mut self, adds: Vec<Add>) -> (Vec<Bytes>, Vec<Bytes>) {
        let mut channels = Vec::new();
        let mut patterns = Vec::new();

        for add in adds {
            let queues = self.subscribers.entry(add.key.clone()).or_default();
            let new = queues.is_empty();
            queues.insert(add.id, add.queue);

            if new {
                if is_pattern(&add.key) {
                    patterns.push(add.key.clone());
                } else {
                    channels.push(add.key.clone());
                }
            }

            if let Some(waiting) = self.awaiting.get_mut(&add.key) {
                waiting.push(add.ack);
            } else if new {
                self.awaiting.insert(add.key, vec![add.ack]);
            } else {
                // Already confirmed by the server.
                let _ = add.ack.send(());
            }
        }

        (channels, patterns)
    }

    /// Drops the removed queues, returning the channels and patterns nobody listens to anymore.
    fn remove(&mut self, removals: Vec<(Bytes, u64)>) -> (Vec<Bytes>, Vec<Bytes>) {
        let mut channels = Vec::new();
        let mut patterns = Vec::new();

        for (key, id) in removals {
            let Some(queues) = self.subscribers.get_mut(&key) else {
                continue;
            };
            queues.remove(&id);
            if !queues.is_empty() {
                continue;
            }

            self.subscribers.remove(&key);
            if is_pattern(&key) {
                patterns.push(key);
            } else {
                channels.push(key);
            }
        }

        (channels, patterns)
    }

    fn route(&mut self, frame: Frame, policy: &TextPolicy) {
        let Frame::Array(Some(items)) = frame else {
            warn!(%frame, "unexpected frame on the subscriber connection");
            return;
        };

        match items.as_slice() {
            [Frame::Bulk(Some(kind)), Frame::Bulk(Some(channel)), Frame::Bulk(Some(payload))]
                if kind == "message" =>
            {
                self.deliver(channel, channel, None, payload, policy);
            }
            [
                Frame::Bulk(Some(kind)),
                Frame::Bulk(Some(pattern)),
                Frame::Bulk(Some(channel)),
                Frame::Bulk(Some(payload)),
            ] if kind == "pmessage" => {
                self.deliver(pattern, channel, Some(pattern), payload, policy);
            }
            [Frame::Bulk(Some(kind)), Frame::Bulk(Some(key)), Frame::Integer(_)]
                if kind == "subscribe" || kind == "psubscribe" =>
            {
                if let Some(waiting) = self.awaiting.remove(key.as_bytes()) {
                    for ack in waiting {
                        let _ = ack.send(());
                    }
                }
            }
            [Frame::Bulk(Some(kind)), _, Frame::Integer(count)]
                if kind == "unsubscribe" || kind == "punsubscribe" =>
            {
                trace!(remaining = count, "unsubscribed");
            }
            _ => warn!(?items, "malformed message on the subscriber connection"),
        }
    }

    fn deliver(
        &self,
        key: &Data,
        channel: &Data,
        pattern: Option<&Data>,
        payload: &Data,
        policy: &TextPolicy,
    ) {
        let Some(queues) = self.subscribers.get(key.as_bytes()) else {
            debug!(channel = %channel, "message for a channel nobody listens to");
            return;
        };

        let message = match decode(channel, pattern, payload, policy) {
            Ok(message) => message,
            Err(err) => {
                warn!(error = %err, channel = %channel, "dropping undecodable message");
                return;
            }
        };

        for queue in queues.values() {
            // A closed queue belongs to a subscription whose removal is already pending.
            let _ = queue.send(message.clone());
        }
    }
}

fn decode(
    channel: &Data,
    pattern: Option<&Data>,
    payload: &Data,
    policy: &TextPolicy,
) -> Result<Message> {
    Ok(Message {
        channel: policy.data(channel.clone().into_bytes())?,
        pattern: pattern
            .map(|pattern| policy.data(pattern.clone().into_bytes()))
            .transpose()?,
        payload: policy.data(payload.clone().into_bytes())?,
    })
}
