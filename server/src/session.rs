//! Per-connection state.

use std::time::Instant;

use chain::{NodeIndex, SegmentPool};
use mio::net::TcpStream;
use proto::ProtocolState;
use uuid::Uuid;

/// One connection and everything the server knows about it.
///
/// The inbound chain accumulates received segments until complete packets
/// are drained off its front; `read_pos` is the decode offset into that
/// chain. Player fields only carry meaning once the session reaches play.
#[derive(Debug)]
pub struct Session {
    pub stream: TcpStream,
    pub state: ProtocolState,

    pub inbound_head: Option<NodeIndex>,
    pub inbound_tail: Option<NodeIndex>,
    pub read_pos: usize,

    pub entity_id: i32,
    pub username: String,
    pub uuid: Uuid,
    pub gamemode: u8,

    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub yaw: f32,
    pub pitch: f32,
    pub on_ground: bool,
    pub previous_x: f64,
    pub previous_y: f64,
    pub previous_z: f64,

    pub health: f32,
    pub health_regen: f32,
    pub last_damage: Option<Instant>,
    pub next_keep_alive: Instant,
    pub next_movement_broadcast: Instant,
}

impl Session {
    /// Wraps a freshly accepted connection, starting in handshaking.
    #[must_use]
    pub fn new(stream: TcpStream) -> Self {
        let now = Instant::now();
        Self {
            stream,
            state: ProtocolState::Handshaking,
            inbound_head: None,
            inbound_tail: None,
            read_pos: 0,
            entity_id: 0,
            username: String::new(),
            uuid: Uuid::nil(),
            gamemode: 0,
            x: 0.0,
            y: 0.0,
            z: 0.0,
            yaw: 0.0,
            pitch: 0.0,
            on_ground: false,
            previous_x: 0.0,
            previous_y: 0.0,
            previous_z: 0.0,
            health: 20.0,
            health_regen: 0.5,
            last_damage: None,
            next_keep_alive: now,
            next_movement_broadcast: now,
        }
    }

    /// Links a filled segment onto the end of the inbound chain.
    pub fn append_inbound(&mut self, pool: &mut SegmentPool, node: NodeIndex) {
        match self.inbound_tail {
            Some(tail) => pool.link(tail, Some(node)),
            None => self.inbound_head = Some(node),
        }
        self.inbound_tail = Some(node);
    }

    /// Returns fully decoded leading segments to the pool, renormalizing
    /// `read_pos` so it stays relative to the new head.
    pub fn trim_consumed(&mut self, pool: &mut SegmentPool) {
        while let Some(head) = self.inbound_head {
            let len = pool.len(head);
            if self.read_pos < len {
                return;
            }
            self.inbound_head = pool.release(head, false);
            self.read_pos -= len;
        }
        self.inbound_tail = None;
        self.read_pos = 0;
    }

    /// Returns the whole inbound chain to the pool.
    pub fn release_inbound(&mut self, pool: &mut SegmentPool) {
        if let Some(head) = self.inbound_head.take() {
            pool.release(head, true);
        }
        self.inbound_tail = None;
        self.read_pos = 0;
    }
}
