use std::sync::Arc;

use tokio::net::TcpStream;
use tracing::{debug, instrument, warn};

use crate::codec::RespCodec;
use crate::command::{Arg, Command};
use crate::commands::transaction;
use crate::config::Config;
use crate::connection::Connection;
use crate::frame::Frame;
use crate::{Error, Result};

/// Cleanup left behind by a transaction guard that was dropped before it finished. It is sent
/// ahead of the next command so the server side state never leaks into unrelated calls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Reset {
    Unwatch,
    Discard,
}

/// A command channel: one connection, one command in flight at a time.
///
/// Every reply is read before the next command is written, so replies always pair up with the
/// command that caused them. A `-` reply comes back as [`Error::Server`] carrying the server's
/// message unchanged.
///
/// Dropping a call future after its command was written but before its reply was read leaves
/// that reply on the wire, and the connection should be discarded.
pub struct Client {
    conn: Connection,
    config: Arc<Config>,
    reset: Option<Reset>,
}

impl Client {
    /// Connects to the configured server, authenticating when a password is set.
    pub async fn connect(config: Config) -> Result<Client> {
        Client::connect_shared(Arc::new(config)).await
    }

    #[instrument(name = "client", skip(config), fields(connection_id))]
    pub(crate) async fn connect_shared(config: Arc<Config>) -> Result<Client> {
        let conn = Connection::connect(&config, RespCodec::from_config(&config)).await?;
        tracing::Span::current().record("connection_id", conn.id.to_string());

        let mut client = Client {
            conn,
            config,
            reset: None,
        };

        if let Some(password) = client.config.password.clone() {
            debug!("authenticating");
            client.auth(password).await?;
        }

        Ok(client)
    }

    /// Wraps an already connected stream. No AUTH is sent.
    pub fn new(stream: TcpStream, config: Config) -> Client {
        let codec = RespCodec::from_config(&config);
        Client {
            conn: Connection::new(stream, codec),
            config: Arc::new(config),
            reset: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub(crate) fn shared_config(&self) -> Arc<Config> {
        self.config.clone()
    }

    /// Sends `cmd` and returns its reply.
    pub async fn call(&mut self, cmd: Command) -> Result<Frame> {
        self.flush_reset().await?;
        self.send(cmd).await
    }

    /// Sends an arbitrary command given as a name followed by its arguments.
    pub async fn raw<A: Into<Arg>>(&mut self, args: impl IntoIterator<Item = A>) -> Result<Frame> {
        let mut args = args.into_iter();
        let name = args
            .next()
            .ok_or_else(|| Error::InvalidArgument(String::from("a command needs a name")))?;

        self.call(Command::new(name).args(args)).await
    }

    pub(crate) fn schedule_reset(&mut self, reset: Reset) {
        // A pending DISCARD already drops the watches too.
        if self.reset != Some(Reset::Discard) {
            self.reset = Some(reset);
        }
    }

    async fn send(&mut self, cmd: Command) -> Result<Frame> {
        debug!(connection_id = %self.conn.id, command = %cmd.name(), "sending command");

        match self.conn.request(cmd).await? {
            Frame::Error(msg) => Err(Error::Server(msg)),
            frame => Ok(frame),
        }
    }

    async fn flush_reset(&mut self) -> Result<()> {
        let Some(reset) = self.reset.take() else {
            return Ok(());
        };

        let cmd = match reset {
            Reset::Unwatch => transaction::unwatch(),
            Reset::Discard => transaction::discard(),
        };

        match self.send(cmd).await {
            Ok(_) => Ok(()),
            // The server already forgot about the transaction, nothing left to undo.
            Err(Error::Server(msg)) => {
                warn!(?reset, error = %msg, "deferred transaction reset was refused");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("connection_id", &self.conn.id)
            .field("host", &self.config.host)
            .field("port", &self.config.port)
            .finish()
    }
}
