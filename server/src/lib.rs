//! The lodestone game server: a single-threaded, readiness-driven server
//! speaking protocol 498 (Minecraft 1.14.4).
//!
//! All connection buffers live in two segment pools; the event loop never
//! sleeps, interleaving socket readiness with a fixed 50 ms world tick.
//!
//! # Design Principles
//!
//! - **One thread, no locks** - Sessions, pools, and world state are owned
//!   by the loop; broadcasts reuse a single encoded chain.
//! - **Violations are terminal** - Any malformed frame or illegal packet
//!   tears the offending session down; nothing resynchronizes a stream.
//! - **Dense session slots** - Sessions occupy a swap-removed vector, with
//!   poll tokens re-pointed on removal.

pub mod config;
pub mod net;
pub mod server;
pub mod session;
pub mod status;
pub mod terrain;

mod game;

pub use config::Config;
pub use server::GameServer;
