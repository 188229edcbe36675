use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_util::codec::Framed;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::codec::RespCodec;
use crate::command::Command;
use crate::config::Config;
use crate::frame::Frame;
use crate::{Error, Result};

/// One TCP connection to the server. Replies are read into the framed buffer and removed from it
/// as frames get parsed, so a read that is interrupted halfway loses nothing.
pub struct Connection {
    pub id: Uuid,
    framed: Framed<TcpStream, RespCodec>,
}

impl Connection {
    pub fn new(stream: TcpStream, codec: RespCodec) -> Connection {
        Connection {
            id: Uuid::new_v4(),
            framed: Framed::new(stream, codec),
        }
    }

    #[instrument(
        name = "connect",
        skip(config, codec),
        fields(host = %config.host, port = config.port)
    )]
    pub async fn connect(config: &Config, codec: RespCodec) -> Result<Connection> {
        let stream = TcpStream::connect(config.addr()).await?;
        stream.set_nodelay(true)?;

        let conn = Connection::new(stream, codec);
        debug!(connection_id = %conn.id, "connected");

        Ok(conn)
    }

    pub async fn write_command(&mut self, cmd: Command) -> Result<()> {
        self.framed.send(cmd).await
    }

    /// Waits for the next reply. `None` means the server closed the connection cleanly.
    ///
    /// Payloads are decoded as text after the frame has left the buffer, so an undecodable reply
    /// is an error for this read alone and the next read starts at the next reply.
    pub async fn read_frame(&mut self) -> Result<Option<Frame>> {
        match self.framed.next().await {
            Some(frame) => frame?.decode_text(self.framed.codec().policy()).map(Some),
            None => Ok(None),
        }
    }

    /// Writes `cmd` and reads its reply.
    pub async fn request(&mut self, cmd: Command) -> Result<Frame> {
        self.write_command(cmd).await?;
        self.read_frame().await?.ok_or(Error::ConnectionClosed)
    }
}
