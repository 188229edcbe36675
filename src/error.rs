use thiserror::Error as ThisError;

use crate::frame::{self, Frame};

#[derive(Debug, ThisError)]
pub enum Error {
    /// The server sent something that is not valid RESP2. The connection can not be trusted
    /// afterwards.
    #[error("protocol error; {0}")]
    Protocol(String),
    /// A `-` reply. The message is the server's, verbatim.
    #[error("{0}")]
    Server(String),
    #[error("protocol error; unexpected reply, expected {expected}, got {actual}")]
    UnexpectedReply {
        expected: &'static str,
        actual: Frame,
    },
    #[error("lock not acquired")]
    LockNotAcquired,
    #[error("transaction aborted; a watched key changed before the transaction completed")]
    TransactionAborted,
    /// The lock key holds a value other than our token: the lease expired and somebody else
    /// took it, or something deleted it.
    #[error("someone else took the lock on {key}; expected {expected}, found {found:?}")]
    ConsistencyViolation {
        key: String,
        expected: String,
        found: Option<String>,
    },
    #[error("encoding error; {0}")]
    Encoding(String),
    #[error("invalid argument; {0}")]
    InvalidArgument(String),
    #[error("invalid configuration; {0}")]
    Config(String),
    #[error("connection closed")]
    ConnectionClosed,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<frame::Error> for Error {
    fn from(err: frame::Error) -> Error {
        Error::Protocol(err.to_string())
    }
}
