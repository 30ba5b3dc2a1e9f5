use std::net::SocketAddr;
use std::sync::atomic::AtomicBool;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use server::{Config, GameServer};

#[derive(Debug, Parser)]
#[command(name = "lodestone", version, about = "A protocol-498 game server")]
struct Args {
    /// Address to listen on.
    #[arg(long, default_value = "127.0.0.1:25565")]
    addr: SocketAddr,

    /// Maximum concurrent connections.
    #[arg(long, default_value_t = 4096)]
    max_sessions: usize,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    let config = Config {
        addr: args.addr,
        max_sessions: args.max_sessions,
        ..Config::default()
    };

    let shutdown = AtomicBool::new(false);
    GameServer::new(config)?.run(&shutdown)
}
