//! The readiness-multiplexed connection loop.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use anyhow::Context;
use chain::{ChainReader, SegmentPool};
use mio::net::TcpListener;
use mio::{Events, Interest, Poll, Token};
use proto::{inbound, outbound, PlayerInfo, ProtocolState};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};
use wire::read_frame;

use crate::config::Config;
use crate::net::{self, Received};
use crate::session::Session;
use crate::terrain::Terrain;

const LISTENER: Token = Token(0);

/// The whole server: listener, sessions, pools, and world state.
///
/// Everything runs on one thread. Sessions live in a dense array; session
/// `n` registers with the poll as `Token(n + 1)`, re-pointed whenever a
/// teardown swap-removes into slot `n`.
pub struct GameServer {
    pub(crate) config: Config,
    listener: TcpListener,
    poll: Poll,
    pub(crate) sessions: Vec<Session>,

    read_pool: SegmentPool,
    pub(crate) write_pool: SegmentPool,

    pub(crate) world_age: u64,
    pub(crate) world_time: u64,
    pub(crate) next_entity_id: i32,
    pub(crate) rng: StdRng,

    pub(crate) section_payload: Vec<u8>,
    pub(crate) heightmap: Vec<u8>,
}

impl GameServer {
    /// Binds the listener and prepares pools and terrain.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let mut listener = TcpListener::bind(config.addr)
            .with_context(|| format!("binding {}", config.addr))?;
        let poll = Poll::new().context("creating poll")?;
        poll.registry()
            .register(&mut listener, LISTENER, Interest::READABLE)?;

        let mut rng = StdRng::from_entropy();
        let terrain = Terrain::generate(&mut rng);

        Ok(Self {
            read_pool: SegmentPool::new(config.read_arena, config.read_segment),
            write_pool: SegmentPool::new(config.write_arena, config.write_segment),
            sessions: Vec::new(),
            world_age: 0,
            world_time: 0,
            next_entity_id: 1,
            rng,
            section_payload: terrain.section_payload(),
            heightmap: crate::terrain::heightmap_nbt(),
            config,
            listener,
            poll,
        })
    }

    /// Address the listener actually bound, for ephemeral-port configs.
    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Runs the accept/read/tick loop until `shutdown` is set.
    ///
    /// The poll never sleeps; the 50 ms world tick rides the same loop the
    /// way the readiness events do.
    pub fn run(&mut self, shutdown: &AtomicBool) -> anyhow::Result<()> {
        let mut events = Events::with_capacity(1024);
        let mut ready = Vec::new();
        let mut last_tick = Instant::now();

        info!(addr = %self.local_addr()?, "listening for connections");

        while !shutdown.load(Ordering::Relaxed) {
            self.poll.poll(&mut events, Some(Duration::ZERO))?;

            ready.clear();
            ready.extend(events.iter().map(mio::event::Event::token));

            for &token in &ready {
                if token == LISTENER {
                    self.accept_ready()?;
                    continue;
                }

                let index = token.0 - 1;
                // A teardown earlier in this batch may have invalidated the
                // token; a stale read on a swapped session is harmless.
                if index >= self.sessions.len() {
                    continue;
                }
                if !self.read_session(index)? {
                    self.teardown(index)?;
                }
            }

            if last_tick.elapsed() >= self.config.tick_interval {
                self.tick()?;
                last_tick = Instant::now();
            }
        }

        info!("shutting down");
        Ok(())
    }

    fn accept_ready(&mut self) -> anyhow::Result<()> {
        loop {
            match self.listener.accept() {
                Ok((mut stream, addr)) => {
                    if self.sessions.len() >= self.config.max_sessions {
                        warn!(%addr, "session limit reached, refusing connection");
                        continue;
                    }
                    let token = Token(self.sessions.len() + 1);
                    self.poll
                        .registry()
                        .register(&mut stream, token, Interest::READABLE)?;
                    debug!(%addr, token = token.0, "accepted connection");
                    self.sessions.push(Session::new(stream));
                }
                Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => return Ok(()),
                Err(err) if err.kind() == std::io::ErrorKind::Interrupted => {}
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// One bounded receive, then a drain of every complete packet.
    ///
    /// Returns `false` when the session must be torn down: orderly close,
    /// socket error, or protocol violation.
    fn read_session(&mut self, index: usize) -> anyhow::Result<bool> {
        // Registrations are edge-triggered, so drain the socket until it
        // would block.
        let mut received_any = false;
        loop {
            let node = self.read_pool.acquire()?;
            let received = {
                let buf = self.read_pool.segment_mut(node);
                let session = &mut self.sessions[index];
                net::receive(&mut session.stream, buf)
            };

            match received {
                Ok(Received::Count(count)) => {
                    self.read_pool.set_len(node, count);
                    self.sessions[index].append_inbound(&mut self.read_pool, node);
                    received_any = true;
                }
                Ok(Received::WouldBlock) => {
                    self.read_pool.release(node, true);
                    break;
                }
                Ok(Received::Closed) => {
                    self.read_pool.release(node, true);
                    debug!(index, "peer closed connection");
                    return Ok(false);
                }
                Err(err) => {
                    self.read_pool.release(node, true);
                    debug!(index, %err, "socket error");
                    return Ok(false);
                }
            }
        }
        if !received_any {
            return Ok(true);
        }

        loop {
            let session = &self.sessions[index];
            let mut reader =
                ChainReader::new(&self.read_pool, session.inbound_head, session.read_pos);

            let frame = match read_frame(&mut reader, &self.config.limits) {
                Ok(frame) => frame,
                Err(err) if err.is_incomplete() => break,
                Err(err) => {
                    info!(index, %err, "bad frame, terminating session");
                    return Ok(false);
                }
            };

            // read_frame only succeeds once the declared body is buffered,
            // so every decode failure here is a violation.
            let packet = match inbound::decode(session.state, frame, &mut reader) {
                Ok(packet) => packet,
                Err(err) => {
                    info!(index, %err, "protocol violation, terminating session");
                    return Ok(false);
                }
            };
            let consumed_to = reader.position();

            self.sessions[index].read_pos = consumed_to;
            self.sessions[index].trim_consumed(&mut self.read_pool);

            if !self.handle_packet(index, packet)? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    /// Removes session `index`, announcing the departure to play sessions
    /// first and re-pointing the registration the swap moves.
    fn teardown(&mut self, index: usize) -> anyhow::Result<()> {
        if self.sessions[index].state == ProtocolState::Play {
            let uuid = self.sessions[index].uuid;
            let entity_id = self.sessions[index].entity_id;

            let head =
                outbound::play::player_info(&mut self.write_pool, PlayerInfo::Remove(&[uuid]))?;
            self.broadcast_play(head, Some(index));
            let head = outbound::play::destroy_entities(&mut self.write_pool, &[entity_id])?;
            self.broadcast_play(head, Some(index));
        }

        let mut session = self.sessions.swap_remove(index);
        session.release_inbound(&mut self.read_pool);
        let _ = self.poll.registry().deregister(&mut session.stream);
        debug!(index, username = %session.username, "session removed");
        drop(session);

        if index < self.sessions.len() {
            let stream = &mut self.sessions[index].stream;
            self.poll
                .registry()
                .reregister(stream, Token(index + 1), Interest::READABLE)?;
        }
        Ok(())
    }

    /// Sends a finished chain to one session, then recycles it.
    pub(crate) fn send_to(&mut self, index: usize, head: chain::NodeIndex) {
        let session = &mut self.sessions[index];
        if let Err(err) = net::send_chain(&mut session.stream, &self.write_pool, head) {
            // The read path will observe the dead socket and tear down.
            debug!(index, %err, "send failed");
        }
        self.write_pool.release(head, true);
    }

    /// Sends a finished chain to every play session except `except`, then
    /// recycles it.
    pub(crate) fn broadcast_play(&mut self, head: chain::NodeIndex, except: Option<usize>) {
        for (i, session) in self.sessions.iter_mut().enumerate() {
            if Some(i) == except || session.state != ProtocolState::Play {
                continue;
            }
            if let Err(err) = net::send_chain(&mut session.stream, &self.write_pool, head) {
                debug!(index = i, %err, "broadcast send failed");
            }
        }
        self.write_pool.release(head, true);
    }
}
