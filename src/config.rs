use clap::Parser;

use crate::charset::{Charset, ErrorMode, TextPolicy};
use crate::{Error, Result};

pub const PORT: u16 = 6379;
pub const MAX_FRAME_SIZE: usize = 512 * 1024 * 1024;

/// Where the server lives and how text crosses the wire.
///
/// Every field can be given on the command line or through the environment, see
/// [`Config::from_env`].
#[derive(clap::Args, Debug, Clone, PartialEq)]
pub struct Config {
    /// The host of the Redis server
    #[arg(long, env = "REDIS_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// The port of the Redis server
    #[arg(short, long, env = "REDIS_PORT", default_value_t = PORT)]
    pub port: u16,

    /// Sent with AUTH right after connecting
    #[arg(long, env = "REDIS_PASSWORD")]
    pub password: Option<String>,

    /// Charset used to encode text arguments and, if requested, decode replies
    #[arg(long, env = "REDIS_ENCODING", default_value_t = Charset::Utf8)]
    pub encoding: Charset,

    /// What to do with text the charset can not represent: strict, replace or ignore
    #[arg(long, env = "REDIS_ENCODING_ERRORS", default_value_t = ErrorMode::Strict)]
    pub encoding_errors: ErrorMode,

    /// Return string replies as decoded text instead of raw bytes
    #[arg(
        long,
        env = "REDIS_DECODE_RESPONSES",
        default_value_t = false,
        action = clap::ArgAction::Set
    )]
    pub decode_responses: bool,

    /// Largest amount of buffered, unparsed reply data accepted from the server
    #[arg(long, env = "MAX_FRAME_SIZE", default_value_t = MAX_FRAME_SIZE)]
    pub max_frame_size: usize,
}

#[derive(Parser)]
struct FromEnv {
    #[command(flatten)]
    config: Config,
}

impl Config {
    pub fn new(host: impl Into<String>, port: u16) -> Config {
        Config {
            host: host.into(),
            port,
            ..Config::default()
        }
    }

    /// Builds the configuration from `REDIS_*` environment variables, falling back to defaults.
    pub fn from_env() -> Result<Config> {
        FromEnv::try_parse_from(["rustdis"])
            .map(|args| args.config)
            .map_err(|e| Error::Config(e.to_string()))
    }

    pub fn text_policy(&self) -> TextPolicy {
        TextPolicy {
            charset: self.encoding,
            errors: self.encoding_errors,
            decode_responses: self.decode_responses,
        }
    }

    pub fn addr(&self) -> (&str, u16) {
        (self.host.as_str(), self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: String::from("127.0.0.1"),
            port: PORT,
            password: None,
            encoding: Charset::default(),
            encoding_errors: ErrorMode::default(),
            decode_responses: false,
            max_frame_size: MAX_FRAME_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Parser)]
    struct Args {
        #[command(flatten)]
        config: Config,
    }

    #[test]
    fn parse_arguments() {
        let args = Args::try_parse_from([
            "rustdis",
            "--host",
            "redis.local",
            "-p",
            "6380",
            "--encoding",
            "latin-1",
            "--encoding-errors",
            "replace",
            "--decode-responses",
            "true",
        ])
        .unwrap();

        assert_eq!(
            args.config,
            Config {
                host: String::from("redis.local"),
                port: 6380,
                password: None,
                encoding: Charset::Latin1,
                encoding_errors: ErrorMode::Replace,
                decode_responses: true,
                max_frame_size: MAX_FRAME_SIZE,
            }
        );
    }

    #[test]
    fn reject_unknown_charset() {
        let args = Args::try_parse_from(["rustdis", "--encoding", "klingon"]);

        assert!(args.is_err());
    }

    #[test]
    fn text_policy() {
        let config = Config {
            encoding: Charset::Ascii,
            decode_responses: true,
            ..Config::new("localhost", 7000)
        };

        assert_eq!(
            config.text_policy(),
            TextPolicy {
                charset: Charset::Ascii,
                errors: ErrorMode::Strict,
                decode_responses: true,
            }
        );
        assert_eq!(config.addr(), ("localhost", 7000));
    }
}
