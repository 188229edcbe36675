pub mod charset;
pub mod client;
pub mod codec;
pub mod command;
pub mod commands;
pub mod config;
pub mod connection;
pub mod error;
pub mod frame;
pub mod hub;
pub mod lock;
pub mod transaction;

pub use charset::{Charset, ErrorMode, TextPolicy};
pub use client::Client;
pub use command::{Arg, Command};
pub use config::Config;
pub use error::Error;
pub use frame::{Data, Frame};
pub use hub::{Hub, Message, Subscription};
pub use lock::Lock;
pub use transaction::{Phase, Transaction};

pub type Result<T> = std::result::Result<T, Error>;
