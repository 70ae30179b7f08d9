//! bucketkv CLI
//!
//! Command-line interface for poking at a bucket.

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use bucketkv::{Client, ClientConfig};

/// bucketkv CLI
#[derive(Parser, Debug)]
#[command(name = "bucketkv-cli")]
#[command(about = "CLI for memcached-binary-protocol buckets")]
#[command(version)]
struct Args {
    /// Server URL (host:port or memcached://host:port)
    #[arg(short, long, default_value = "127.0.0.1:11211")]
    server: String,

    /// Bucket name
    #[arg(short, long, default_value = "default")]
    bucket: String,

    /// Bucket credential (empty for no-auth buckets)
    #[arg(short, long, default_value = "")]
    credential: String,

    /// Verbose per-operation logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Set {
        /// The key to set
        key: String,

        /// The value to set
        value: String,

        /// Expiry in seconds (0 = never)
        #[arg(short, long, default_value = "0")]
        expiry: u32,
    },

    /// Add a key-value pair (fails if the key exists)
    Add {
        /// The key to add
        key: String,

        /// The value to add
        value: String,
    },

    /// Delete a key
    Del {
        /// The key to delete
        key: String,
    },

    /// Increment a counter
    Incr {
        /// The counter key
        key: String,

        /// Amount to add
        #[arg(default_value = "1")]
        delta: u64,
    },

    /// Decrement a counter
    Decr {
        /// The counter key
        key: String,

        /// Amount to subtract
        #[arg(default_value = "1")]
        delta: u64,
    },

    /// Delete every item in the bucket
    Flush,

    /// Ping the server
    Noop,
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,bucketkv=debug"));

    fmt().with_env_filter(filter).with_target(true).init();

    let args = Args::parse();

    let config = ClientConfig::builder()
        .url(&args.server)
        .bucket(&args.bucket)
        .credential(&args.credential)
        .verbose(args.verbose)
        .build();

    let client = match Client::new(config) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Failed to connect to {}: {}", args.server, e);
            std::process::exit(1);
        }
    };

    let outcome = run_command(&client, args.command);
    client.done();

    if let Err(e) = outcome {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

/// Execute one subcommand and print its result
fn run_command(client: &Client, command: Commands) -> bucketkv::Result<()> {
    match command {
        Commands::Get { key } => {
            let item = client.get(&key)?;
            println!("{}", String::from_utf8_lossy(&item.value));
            println!("flags: {}  cas: {}", item.flags, item.cas);
        }
        Commands::Set { key, value, expiry } => {
            let cas = client.set(&key, 0, expiry, value.as_bytes())?;
            println!("stored (cas {})", cas);
        }
        Commands::Add { key, value } => {
            let cas = client.add(&key, 0, 0, value.as_bytes())?;
            println!("added (cas {})", cas);
        }
        Commands::Del { key } => {
            client.delete(&key)?;
            println!("deleted");
        }
        Commands::Incr { key, delta } => {
            let counter = client.incr(&key, delta)?;
            println!("{}", counter.value);
        }
        Commands::Decr { key, delta } => {
            let counter = client.decr(&key, delta)?;
            println!("{}", counter.value);
        }
        Commands::Flush => {
            client.flush()?;
            println!("flushed");
        }
        Commands::Noop => {
            client.noop()?;
            println!("pong");
        }
    }
    Ok(())
}
