use std::time::Duration;

use clap::{Parser, Subcommand};
use futures::StreamExt;
use rustdis_client::{Client, Config, Error, Frame, Hub};
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "rustdis-cli", version, about = "Talk to a Redis server")]
struct Args {
    #[command(flatten)]
    config: Config,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send a command and print its reply, e.g. `call SET greeting hello`
    Call {
        #[arg(required = true)]
        args: Vec<String>,
    },
    /// Publish a message to a channel
    Publish { channel: String, message: String },
    /// Print messages published to the given channels or patterns until interrupted
    Subscribe {
        #[arg(required = true)]
        channels: Vec<String>,
    },
    /// Take a lock, hold it for a while and release it
    Lock {
        key: String,

        /// Lease in seconds, renewed while the lock is held
        #[arg(long, default_value_t = 30)]
        lease: u64,

        /// Seconds to hold the lock for
        #[arg(long, default_value_t = 5)]
        hold: u64,
    },
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| debug!("Failed to initialize global tracing: {}", e));

    let args = Args::parse();

    match args.command {
        Command::Call { args: cmd } => {
            let mut client = Client::connect(args.config).await?;
            let reply = client.raw(cmd).await?;
            print_reply(&reply, 0);
        }
        Command::Publish { channel, message } => {
            let mut client = Client::connect(args.config).await?;
            let receivers = client.publish(channel, message).await?;
            println!("(integer) {}", receivers);
        }
        Command::Subscribe { channels } => {
            let hub = Hub::connect(args.config).await?;
            let mut subscription = hub.subscribe(channels).await?;
            info!(channels = ?subscription.channels(), "subscribed");

            loop {
                tokio::select! {
                    message = subscription.next() => match message {
                        Some(message) => println!("{}: {}", message.channel, message.payload),
                        None => return Err(Error::ConnectionClosed),
                    },
                    _ = tokio::signal::ctrl_c() => break,
                }
            }
        }
        Command::Lock { key, lease, hold } => {
            let mut client = Client::connect(args.config).await?;
            let lock = client.lock(&key, Duration::from_secs(lease)).await?;
            println!("locked {} with token {}", key, String::from_utf8_lossy(lock.token()));

            tokio::time::sleep(Duration::from_secs(hold)).await;

            lock.release().await?;
            println!("released {}", key);
        }
    }

    Ok(())
}

fn print_reply(frame: &Frame, depth: usize) {
    match frame {
        Frame::Simple(data) => println!("{}", data),
        Frame::Error(msg) => println!("(error) {}", msg),
        Frame::Integer(i) => println!("(integer) {}", i),
        Frame::Bulk(Some(data)) => println!("{:?}", data.to_string_lossy()),
        Frame::Bulk(None) | Frame::Array(None) => println!("(nil)"),
        Frame::Array(Some(items)) if items.is_empty() => println!("(empty array)"),
        Frame::Array(Some(items)) => {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    print!("{:width$}", "", width = depth * 3);
                }
                print!("{}) ", i + 1);
                print_reply(item, depth + 1);
            }
        }
    }
}
