//! A small in-process stand-in for a Redis server, good enough for the commands the client
//! tests exercise: strings with expiry, hashes, lists, SORT, WATCH/MULTI/EXEC and pub/sub.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use bytes::Bytes;
use futures::StreamExt;
use glob_match::glob_match;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio_util::codec::FramedRead;
use tokio_util::sync::CancellationToken;

use rustdis_client::codec::RespCodec;
use rustdis_client::{Config, Data, Frame};

pub struct FakeRedis {
    addr: SocketAddr,
    state: Arc<Mutex<State>>,
    shutdown: CancellationToken,
}

#[derive(Default)]
struct State {
    password: Option<String>,
    entries: HashMap<Bytes, Entry>,
    hashes: HashMap<Bytes, HashMap<Bytes, Bytes>>,
    lists: HashMap<Bytes, Vec<Bytes>>,
    /// Bumped on every write, so EXEC can tell whether a watched key changed.
    versions: HashMap<Bytes, u64>,
    clock: u64,
    subscribers: HashMap<u64, Subscriber>,
    next_session: u64,
    log: Vec<String>,
}

struct Entry {
    value: Bytes,
    expires_at: Option<Instant>,
}

struct Subscriber {
    tx: UnboundedSender<Frame>,
    channels: HashSet<Bytes>,
    patterns: HashSet<Bytes>,
}

struct Session {
    id: u64,
    tx: UnboundedSender<Frame>,
    authenticated: bool,
    watched: Vec<(Bytes, u64)>,
    queued: Option<Vec<Vec<Bytes>>>,
}

impl FakeRedis {
    pub async fn start() -> FakeRedis {
        FakeRedis::start_with(None).await
    }

    pub async fn start_with_password(password: &str) -> FakeRedis {
        FakeRedis::start_with(Some(password.to_string())).await
    }

    async fn start_with(password: Option<String>) -> FakeRedis {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(Mutex::new(State {
            password,
            ..State::default()
        }));
        let shutdown = CancellationToken::new();

        tokio::spawn(accept(listener, state.clone(), shutdown.clone()));

        FakeRedis {
            addr,
            state,
            shutdown,
        }
    }

    pub fn config(&self) -> Config {
        Config::new(self.addr.ip().to_string(), self.addr.port())
    }

    pub fn get(&self, key: &str) -> Option<Bytes> {
        self.state.lock().unwrap().value(key.as_bytes())
    }

    pub fn set(&self, key: &str, value: &str) {
        let mut state = self.state.lock().unwrap();
        state.write(Bytes::from(key.to_string()), Bytes::from(value.to_string()), None);
    }

    /// Remaining time to live, `None` when the key is missing or does not expire.
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let mut state = self.state.lock().unwrap();
        state.value(key.as_bytes())?;
        let expires_at = state.entries.get(key.as_bytes())?.expires_at?;
        Some(expires_at.saturating_duration_since(Instant::now()))
    }

    /// Every command received so far, arguments separated by spaces.
    pub fn commands(&self) -> Vec<String> {
        self.state.lock().unwrap().log.clone()
    }

    /// Closes the listener and every open connection.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

impl Drop for FakeRedis {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn accept(listener: TcpListener, state: Arc<Mutex<State>>, shutdown: CancellationToken) {
    loop {
        let socket = tokio::select! {
            _ = shutdown.cancelled() => return,
            accepted = listener.accept() => match accepted {
                Ok((socket, _)) => socket,
                Err(_) => return,
            },
        };

        tokio::spawn(serve(socket, state.clone(), shutdown.clone()));
    }
}

async fn serve(socket: TcpStream, state: Arc<Mutex<State>>, shutdown: CancellationToken) {
    let (read, mut write) = socket.into_split();
    let mut frames = FramedRead::new(read, RespCodec::default());
    let (tx, mut rx) = mpsc::unbounded_channel::<Frame>();

    let writer_shutdown = shutdown.clone();
    tokio::spawn(async move {
        loop {
            let frame = tokio::select! {
                _ = writer_shutdown.cancelled() => return,
                frame = rx.recv() => match frame {
                    Some(frame) => frame,
                    None => return,
                },
            };
            if write.write_all(&frame.serialize()).await.is_err() {
                return;
            }
        }
    });

    let mut session = {
        let mut state = state.lock().unwrap();
        state.next_session += 1;
        Session {
            id: state.next_session,
            tx: tx.clone(),
            authenticated: state.password.is_none(),
            watched: Vec::new(),
            queued: None,
        }
    };

    loop {
        let frame = tokio::select! {
            _ = shutdown.cancelled() => break,
            frame = frames.next() => match frame {
                Some(Ok(frame)) => frame,
                _ => break,
            },
        };

        let Frame::Array(Some(items)) = frame else {
            break;
        };
        let args = items
            .into_iter()
            .filter_map(|item| match item {
                Frame::Bulk(Some(data)) => Some(data.into_bytes()),
                _ => None,
            })
            .collect::<Vec<_>>();

        // Replies are sent while holding the lock so they never interleave with a message
        // published by another session.
        let mut state = state.lock().unwrap();
        for reply in session.handle(&mut state, args) {
            let _ = tx.send(reply);
        }
    }

    state.lock().unwrap().subscribers.remove(&session.id);
}

fn ok() -> Frame {
    Frame::simple("OK")
}

fn err(msg: impl Into<String>) -> Frame {
    Frame::Error(msg.into())
}

fn bulk(bytes: Bytes) -> Frame {
    Frame::Bulk(Some(Data::Raw(bytes)))
}

fn int(bytes: &[u8]) -> Option<i64> {
    std::str::from_utf8(bytes).ok()?.parse().ok()
}

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

impl Session {
    fn handle(&mut self, state: &mut State, args: Vec<Bytes>) -> Vec<Frame> {
        let Some(name) = args.first() else {
            return vec![err("ERR empty command")];
        };
        let name = lossy(name).to_uppercase();
        state
            .log
            .push(args.iter().map(|arg| lossy(arg)).collect::<Vec<_>>().join(" "));

        if name == "AUTH" {
            let reply = match (&state.password, &args[1..]) {
                (Some(password), [given]) if password.as_bytes() == &given[..] => {
                    self.authenticated = true;
                    ok()
                }
                (Some(_), [_]) => err("WRONGPASS invalid username-password pair"),
                (None, _) => err("ERR AUTH called without any password configured"),
                _ => err("ERR wrong number of arguments for 'auth' command"),
            };
            return vec![reply];
        }

        if !self.authenticated {
            return vec![err("NOAUTH Authentication required.")];
        }

        let reply = match name.as_str() {
            "SUBSCRIBE" | "PSUBSCRIBE" | "UNSUBSCRIBE" | "PUNSUBSCRIBE" => {
                return self.subscription(state, &name, &args[1..]);
            }
            "MULTI" if self.queued.is_some() => err("ERR MULTI calls can not be nested"),
            "MULTI" => {
                self.queued = Some(Vec::new());
                ok()
            }
            "EXEC" => match self.queued.take() {
                None => err("ERR EXEC without MULTI"),
                Some(queued) => {
                    let watched = std::mem::take(&mut self.watched);
                    if watched.iter().any(|(key, version)| state.version(key) != *version) {
                        Frame::Array(None)
                    } else {
                        Frame::Array(Some(
                            queued.into_iter().map(|cmd| state.execute(cmd)).collect(),
                        ))
                    }
                }
            },
            "DISCARD" => match self.queued.take() {
                None => err("ERR DISCARD without MULTI"),
                Some(_) => {
                    self.watched.clear();
                    ok()
                }
            },
            "WATCH" if self.queued.is_some() => err("ERR WATCH inside MULTI is not allowed"),
            "WATCH" => {
                for key in &args[1..] {
                    let version = state.version(key);
                    self.watched.push((key.clone(), version));
                }
                ok()
            }
            "UNWATCH" => {
                self.watched.clear();
                ok()
            }
            _ => match self.queued.as_mut() {
                Some(queued) => {
                    queued.push(args);
                    Frame::simple("QUEUED")
                }
                None => state.execute(args),
            },
        };

        vec![reply]
    }

    fn subscription(&mut self, state: &mut State, name: &str, keys: &[Bytes]) -> Vec<Frame> {
        let subscriber = state
            .subscribers
            .entry(self.id)
            .or_insert_with(|| Subscriber {
                tx: self.tx.clone(),
                channels: HashSet::new(),
                patterns: HashSet::new(),
            });
        let kind = name.to_lowercase();

        keys.iter()
            .map(|key| {
                match name {
                    "SUBSCRIBE" => subscriber.channels.insert(key.clone()),
                    "PSUBSCRIBE" => subscriber.patterns.insert(key.clone()),
                    "UNSUBSCRIBE" => subscriber.channels.remove(key),
                    _ => subscriber.patterns.remove(key),
                };
                let count = subscriber.channels.len() + subscriber.patterns.len();

                Frame::Array(Some(vec![
                    Frame::bulk(kind.clone()),
                    bulk(key.clone()),
                    Frame::Integer(count as i64),
                ]))
            })
            .collect()
    }
}

impl State {
    fn version(&self, key: &[u8]) -> u64 {
        self.versions.get(key).copied().unwrap_or(0)
    }

    fn touch(&mut self, key: &Bytes) {
        self.clock += 1;
        self.versions.insert(key.clone(), self.clock);
    }

    /// Looks a key up, expiring it first when its time is up.
    fn value(&mut self, key: &[u8]) -> Option<Bytes> {
        let expired = self
            .entries
            .get(key)
            .and_then(|entry| entry.expires_at)
            .is_some_and(|at| at <= Instant::now());
        if expired {
            self.entries.remove(key);
        }
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    fn write(&mut self, key: Bytes, value: Bytes, ttl: Option<Duration>) {
        self.touch(&key);
        self.entries.insert(
            key,
            Entry {
                value,
                expires_at: ttl.map(|ttl| Instant::now() + ttl),
            },
        );
    }

    fn delete(&mut self, key: &Bytes) -> bool {
        let existed = self.value(key).is_some();
        if existed {
            self.entries.remove(key);
            self.touch(key);
        }
        existed
    }

    fn execute(&mut self, args: Vec<Bytes>) -> Frame {
        let name = lossy(&args[0]).to_uppercase();

        match (name.as_str(), &args[1..]) {
            ("PING", []) => Frame::simple("PONG"),
            ("PING", [message]) => bulk(message.clone()),
            ("SELECT", [_]) => ok(),
            ("FLUSHDB", []) => {
                let keys = self.entries.keys().cloned().collect::<Vec<_>>();
                for key in keys {
                    self.delete(&key);
                }
                ok()
            }
            ("GET", [key]) => Frame::Bulk(self.value(key).map(Data::Raw)),
            ("SET", [key, value]) => {
                self.write(key.clone(), value.clone(), None);
                ok()
            }
            ("SETEX", [key, seconds, value]) => match int(seconds) {
                Some(seconds) if seconds > 0 => {
                    let ttl = Duration::from_secs(seconds as u64);
                    self.write(key.clone(), value.clone(), Some(ttl));
                    ok()
                }
                _ => err("ERR invalid expire time in 'setex' command"),
            },
            ("SETNX", [key, value]) => {
                if self.value(key).is_some() {
                    Frame::Integer(0)
                } else {
                    self.write(key.clone(), value.clone(), None);
                    Frame::Integer(1)
                }
            }
            ("DEL", keys) if !keys.is_empty() => {
                let deleted = keys.iter().filter(|key| self.delete(key)).count();
                Frame::Integer(deleted as i64)
            }
            ("EXISTS", keys) if !keys.is_empty() => {
                let found = keys.iter().filter(|key| self.value(key).is_some()).count();
                Frame::Integer(found as i64)
            }
            ("EXPIRE", [key, seconds]) => match (int(seconds), self.value(key)) {
                (None, _) => err("ERR value is not an integer or out of range"),
                (Some(_), None) => Frame::Integer(0),
                (Some(seconds), Some(_)) => {
                    self.touch(key);
                    if let Some(entry) = self.entries.get_mut(key) {
                        entry.expires_at =
                            Some(Instant::now() + Duration::from_secs(seconds.max(0) as u64));
                    }
                    Frame::Integer(1)
                }
            },
            ("TTL", [key]) => {
                if self.value(key).is_none() {
                    return Frame::Integer(-2);
                }
                match self.entries.get(key).and_then(|entry| entry.expires_at) {
                    None => Frame::Integer(-1),
                    Some(at) => {
                        let millis = at.saturating_duration_since(Instant::now()).as_millis();
                        Frame::Integer(((millis + 500) / 1000) as i64)
                    }
                }
            }
            ("INCR", [key]) => {
                let current = match self.value(key) {
                    None => Some(0),
                    Some(value) => int(&value),
                };
                match current {
                    Some(current) => {
                        let next = current + 1;
                        self.write(key.clone(), Bytes::from(next.to_string()), None);
                        Frame::Integer(next)
                    }
                    None => err("ERR value is not an integer or out of range"),
                }
            }
            ("MGET", keys) if !keys.is_empty() => Frame::Array(Some(
                keys.iter()
                    .map(|key| Frame::Bulk(self.value(key).map(Data::Raw)))
                    .collect(),
            )),
            ("MSET", pairs) if !pairs.is_empty() && pairs.len() % 2 == 0 => {
                for pair in pairs.chunks(2) {
                    self.write(pair[0].clone(), pair[1].clone(), None);
                }
                ok()
            }
            ("HSET", [key, field, value]) => {
                self.touch(key);
                let hash = self.hashes.entry(key.clone()).or_default();
                let new = hash.insert(field.clone(), value.clone()).is_none();
                Frame::Integer(new as i64)
            }
            ("HMSET", [key, pairs @ ..]) if !pairs.is_empty() && pairs.len() % 2 == 0 => {
                self.touch(key);
                let hash = self.hashes.entry(key.clone()).or_default();
                for pair in pairs.chunks(2) {
                    hash.insert(pair[0].clone(), pair[1].clone());
                }
                ok()
            }
            ("HGET", [key, field]) => Frame::Bulk(
                self.hashes
                    .get(key)
                    .and_then(|hash| hash.get(field))
                    .cloned()
                    .map(Data::Raw),
            ),
            ("HMGET", [key, fields @ ..]) if !fields.is_empty() => {
                let hash = self.hashes.get(key);
                Frame::Array(Some(
                    fields
                        .iter()
                        .map(|field| {
                            Frame::Bulk(hash.and_then(|hash| hash.get(field)).cloned().map(Data::Raw))
                        })
                        .collect(),
                ))
            }
            ("HGETALL", [key]) => Frame::Array(Some(
                self.hashes
                    .get(key)
                    .into_iter()
                    .flatten()
                    .flat_map(|(field, value)| [bulk(field.clone()), bulk(value.clone())])
                    .collect(),
            )),
            ("RPUSH", [key, values @ ..]) if !values.is_empty() => {
                self.touch(key);
                let list = self.lists.entry(key.clone()).or_default();
                list.extend(values.iter().cloned());
                Frame::Integer(list.len() as i64)
            }
            ("LRANGE", [key, start, stop]) => match (int(start), int(stop)) {
                (Some(start), Some(stop)) => {
                    let list = self.lists.get(key).cloned().unwrap_or_default();
                    let len = list.len() as i64;
                    let start = if start < 0 { (len + start).max(0) } else { start };
                    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };
                    Frame::Array(Some(
                        (start..=stop)
                            .filter_map(|i| list.get(i as usize).cloned())
                            .map(bulk)
                            .collect(),
                    ))
                }
                _ => err("ERR value is not an integer or out of range"),
            },
            ("SORT", [key, options @ ..]) => self.sort(key, options),
            ("PUBLISH", [channel, message]) => Frame::Integer(self.publish(channel, message)),
            _ => err(format!("ERR unknown command '{}'", name.to_lowercase())),
        }
    }

    /// The string stored under `pattern` with its first `*` replaced by `element`.
    fn lookup(&mut self, pattern: &[u8], element: &[u8]) -> Option<Bytes> {
        let star = pattern.iter().position(|b| *b == b'*')?;
        let mut key = pattern[..star].to_vec();
        key.extend_from_slice(element);
        key.extend_from_slice(&pattern[star + 1..]);
        self.value(&key)
    }

    fn sort(&mut self, key: &Bytes, options: &[Bytes]) -> Frame {
        let mut by = None;
        let mut limit = None;
        let mut gets = Vec::new();
        let mut descending = false;
        let mut alpha = false;
        let mut store = None;

        let mut options = options.iter();
        while let Some(option) = options.next() {
            match lossy(option).to_uppercase().as_str() {
                "BY" => by = options.next().cloned(),
                "LIMIT" => {
                    let offset = options.next().and_then(|offset| int(offset));
                    let count = options.next().and_then(|count| int(count));
                    match (offset, count) {
                        (Some(offset), Some(count)) => limit = Some((offset, count)),
                        _ => return err("ERR value is not an integer or out of range"),
                    }
                }
                "GET" => gets.extend(options.next().cloned()),
                "ASC" => descending = false,
                "DESC" => descending = true,
                "ALPHA" => alpha = true,
                "STORE" => store = options.next().cloned(),
                _ => return err("ERR syntax error"),
            }
        }

        let elements = self.lists.get(key).cloned().unwrap_or_default();
        let skip_sort = by.as_ref().is_some_and(|pattern| !pattern.contains(&b'*'));

        let mut weighted = Vec::with_capacity(elements.len());
        for element in elements {
            let weight = match &by {
                Some(pattern) => self.lookup(pattern, &element).unwrap_or_default(),
                None => element.clone(),
            };
            weighted.push((weight, element));
        }

        if !skip_sort {
            if alpha {
                weighted.sort_by(|a, b| a.0.cmp(&b.0));
            } else {
                let mut scored = Vec::with_capacity(weighted.len());
                for (weight, element) in weighted {
                    let score = if weight.is_empty() {
                        Some(0.0)
                    } else {
                        std::str::from_utf8(&weight).ok().and_then(|s| s.parse::<f64>().ok())
                    };
                    match score {
                        Some(score) => scored.push((score, weight, element)),
                        None => {
                            return err("ERR One or more scores can't be converted into double")
                        }
                    }
                }
                scored.sort_by(|a, b| a.0.total_cmp(&b.0));
                weighted = scored
                    .into_iter()
                    .map(|(_, weight, element)| (weight, element))
                    .collect();
            }
            if descending {
                weighted.reverse();
            }
        }

        let selected = match limit {
            Some((offset, count)) => {
                let count = if count < 0 { usize::MAX } else { count as usize };
                weighted
                    .into_iter()
                    .skip(offset.max(0) as usize)
                    .take(count)
                    .collect::<Vec<_>>()
            }
            None => weighted,
        };

        let mut reply = Vec::new();
        for (_, element) in selected {
            if gets.is_empty() {
                reply.push(Some(element));
                continue;
            }
            for pattern in &gets {
                if &pattern[..] == b"#" {
                    reply.push(Some(element.clone()));
                } else {
                    reply.push(self.lookup(pattern, &element));
                }
            }
        }

        match store {
            Some(destination) => {
                self.touch(&destination);
                let list = reply.into_iter().map(Option::unwrap_or_default).collect::<Vec<_>>();
                let len = list.len() as i64;
                self.lists.insert(destination, list);
                Frame::Integer(len)
            }
            None => Frame::Array(Some(
                reply.into_iter().map(|value| Frame::Bulk(value.map(Data::Raw))).collect(),
            )),
        }
    }

    fn publish(&self, channel: &Bytes, message: &Bytes) -> i64 {
        let name = lossy(channel);
        let mut receivers = 0;

        for subscriber in self.subscribers.values() {
            if subscriber.channels.contains(channel) {
                let _ = subscriber.tx.send(Frame::Array(Some(vec![
                    Frame::bulk("message"),
                    bulk(channel.clone()),
                    bulk(message.clone()),
                ])));
                receivers += 1;
            }

            for pattern in &subscriber.patterns {
                if glob_match(&lossy(pattern), &name) {
                    let _ = subscriber.tx.send(Frame::Array(Some(vec![
                        Frame::bulk("pmessage"),
                        bulk(pattern.clone()),
                        bulk(channel.clone()),
                        bulk(message.clone()),
                    ])));
                    receivers += 1;
                }
            }
        }

        receivers
    }
}
