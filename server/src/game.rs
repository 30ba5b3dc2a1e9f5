//! Gameplay: the join sequence, chat, combat, movement, and the world tick.

use std::time::{Duration, Instant};

use proto::{outbound, Animation, Inbound, PlayerInfo, PlayerInfoEntry, ProtocolState, UseEntityAction};
use rand::Rng;
use tracing::debug;
use uuid::Uuid;

use crate::server::GameServer;
use crate::status;

const SPAWN_RADIUS: i32 = 30;
const DAMAGE_COOLDOWN: Duration = Duration::from_millis(500);
const ATTACK_DAMAGE: f32 = 6.0;
const MAX_HEALTH: f32 = 20.0;
const TERRAIN_RADIUS: i32 = 5;
const TERRAIN_SOLID_RADIUS_SQ: f32 = 3.5 * 3.5;
const GAMEMODE_REASON: u8 = 3;
const STATUS_MAX_PLAYERS: usize = 420;

impl GameServer {
    /// Applies one decoded packet. Returns `false` to tear the session down.
    pub(crate) fn handle_packet(&mut self, index: usize, packet: Inbound) -> anyhow::Result<bool> {
        match packet {
            Inbound::Handshake {
                protocol_version,
                next_state,
                ..
            } => {
                debug!(index, protocol_version, %next_state, "handshake");
                self.sessions[index].state = next_state;
            }
            Inbound::StatusRequest => {
                let online = self.play_count();
                let json = status::status_json(online, STATUS_MAX_PLAYERS, "lodestone server");
                let head = outbound::status::response(&mut self.write_pool, &json)?;
                self.send_to(index, head);
            }
            Inbound::StatusPing { payload } => {
                let head = outbound::status::pong(&mut self.write_pool, payload)?;
                self.send_to(index, head);
            }
            Inbound::LoginStart { username } => self.join(index, &username)?,
            Inbound::Chat { message } => self.handle_chat(index, &message)?,
            Inbound::ClientStatus { action } => {
                if action == 0 {
                    self.respawn(index)?;
                }
            }
            Inbound::UseEntity { target, action } => {
                if action == UseEntityAction::Attack {
                    self.attack(target)?;
                }
            }
            Inbound::PlayerPosition { x, y, z, on_ground } => {
                let session = &mut self.sessions[index];
                session.x = x;
                session.y = y;
                session.z = z;
                session.on_ground = on_ground;
            }
            Inbound::PlayerPositionAndLook {
                x,
                y,
                z,
                yaw,
                pitch,
                on_ground,
            } => {
                let session = &mut self.sessions[index];
                session.x = x;
                session.y = y;
                session.z = z;
                session.yaw = yaw;
                session.pitch = pitch;
                session.on_ground = on_ground;
            }
            Inbound::PlayerLook {
                yaw,
                pitch,
                on_ground,
            } => {
                let session = &mut self.sessions[index];
                session.yaw = yaw;
                session.pitch = pitch;
                session.on_ground = on_ground;
            }
            Inbound::Animation { hand } => {
                let animation = if hand == 0 {
                    Animation::SwingMainArm
                } else {
                    Animation::SwingOffhand
                };
                let entity_id = self.sessions[index].entity_id;
                let head = outbound::play::animation(&mut self.write_pool, entity_id, animation)?;
                self.broadcast_play(head, Some(index));
            }
            Inbound::PluginMessage { channel, data } => {
                debug!(index, %channel, len = data.len(), "plugin message");
            }
            Inbound::Unknown { id } => {
                debug!(index, id, "skipped unhandled play packet");
            }
            Inbound::TeleportConfirm { .. }
            | Inbound::ClientSettings { .. }
            | Inbound::KeepAlive { .. } => {}
        }
        Ok(true)
    }

    /// Login start: identity, login success, and the full join sequence
    /// into the play state.
    fn join(&mut self, index: usize, username: &str) -> anyhow::Result<()> {
        let uuid = Uuid::new_v4();
        let entity_id = self.next_entity_id;
        self.next_entity_id += 1;

        let x = f64::from(self.rng.gen_range(-SPAWN_RADIUS..SPAWN_RADIUS));
        let z = f64::from(self.rng.gen_range(-SPAWN_RADIUS..SPAWN_RADIUS));
        let yaw = self.rng.gen_range(0.0..360.0);
        let pitch = self.rng.gen_range(-30.0..0.0);

        {
            let session = &mut self.sessions[index];
            session.username = username.to_owned();
            session.uuid = uuid;
            session.entity_id = entity_id;
            session.x = x;
            session.y = 68.0;
            session.z = z;
            session.previous_x = x;
            session.previous_y = 68.0;
            session.previous_z = z;
            session.yaw = yaw;
            session.pitch = pitch;
        }

        let head = outbound::login::success(&mut self.write_pool, uuid, username)?;
        self.send_to(index, head);

        let head = outbound::play::join_game(
            &mut self.write_pool,
            entity_id,
            self.sessions[index].gamemode,
            0,
            "default",
            16,
            false,
        )?;
        self.send_to(index, head);

        self.sessions[index].state = ProtocolState::Play;

        let head = outbound::play::plugin_message(
            &mut self.write_pool,
            "minecraft:brand",
            status::SERVER_BRAND.as_bytes(),
        )?;
        self.send_to(index, head);

        let json = status::chat_json(&format!("{username} joined the server."), "dark_aqua");
        let head = outbound::play::chat(&mut self.write_pool, &json, 0)?;
        self.broadcast_play(head, None);

        let head = outbound::play::player_abilities(&mut self.write_pool, 0x04, 0.05, 0.1)?;
        self.send_to(index, head);

        let teleport_id = self.next_teleport_id();
        let head = outbound::play::position_and_look(
            &mut self.write_pool,
            x,
            68.0,
            z,
            yaw,
            pitch,
            0,
            teleport_id,
        )?;
        self.send_to(index, head);

        // Tab list: everyone to the newcomer, the newcomer to everyone else.
        let entries: Vec<PlayerInfoEntry> = self
            .sessions
            .iter()
            .filter(|s| s.state == ProtocolState::Play)
            .map(|s| PlayerInfoEntry {
                uuid: s.uuid,
                username: s.username.clone(),
                gamemode: s.gamemode,
                ping: 0,
            })
            .collect();
        let head = outbound::play::player_info(&mut self.write_pool, PlayerInfo::Add(&entries))?;
        self.send_to(index, head);

        let newcomer = [PlayerInfoEntry {
            uuid,
            username: username.to_owned(),
            gamemode: self.sessions[index].gamemode,
            ping: 0,
        }];
        let head = outbound::play::player_info(&mut self.write_pool, PlayerInfo::Add(&newcomer))?;
        self.broadcast_play(head, Some(index));

        let head = outbound::play::spawn_player(
            &mut self.write_pool,
            entity_id,
            uuid,
            x,
            68.0,
            z,
            0.0,
            0.0,
        )?;
        self.broadcast_play(head, Some(index));

        let existing: Vec<(i32, Uuid, f64, f64, f64)> = self
            .sessions
            .iter()
            .enumerate()
            .filter(|(i, s)| *i != index && s.state == ProtocolState::Play)
            .map(|(_, s)| (s.entity_id, s.uuid, s.x, s.y, s.z))
            .collect();
        for (other_id, other_uuid, ox, oy, oz) in existing {
            let head = outbound::play::spawn_player(
                &mut self.write_pool,
                other_id,
                other_uuid,
                ox,
                oy,
                oz,
                0.0,
                0.0,
            )?;
            self.send_to(index, head);
        }

        self.send_terrain(index)?;

        debug!(index, username, entity_id, "joined");
        Ok(())
    }

    /// Chunk columns in a square around the origin; distant ones are blank.
    fn send_terrain(&mut self, index: usize) -> anyhow::Result<()> {
        for chunk_z in -TERRAIN_RADIUS..=TERRAIN_RADIUS {
            for chunk_x in -TERRAIN_RADIUS..=TERRAIN_RADIUS {
                #[allow(clippy::cast_precision_loss)]
                let distance_sq = (chunk_x * chunk_x + chunk_z * chunk_z) as f32;
                let blank = distance_sq > TERRAIN_SOLID_RADIUS_SQ;

                let heightmap = std::mem::take(&mut self.heightmap);
                let sections = std::mem::take(&mut self.section_payload);
                let result = outbound::play::chunk_data(
                    &mut self.write_pool,
                    chunk_x,
                    chunk_z,
                    i32::from(!blank),
                    &heightmap,
                    if blank { &[] } else { &sections },
                );
                self.heightmap = heightmap;
                self.section_payload = sections;

                let head = result?;
                self.send_to(index, head);
            }
        }
        Ok(())
    }

    fn handle_chat(&mut self, index: usize, message: &str) -> anyhow::Result<()> {
        if let Some(command) = message.strip_prefix('/') {
            return self.handle_command(index, command);
        }

        let username = self.sessions[index].username.clone();
        let json = status::chat_json(&format!("{username}> {message}"), "white");
        let head = outbound::play::chat(&mut self.write_pool, &json, 0)?;
        self.broadcast_play(head, None);
        Ok(())
    }

    fn handle_command(&mut self, index: usize, command: &str) -> anyhow::Result<()> {
        if command == "spawn" {
            let teleport_id = self.next_teleport_id();
            let head = outbound::play::position_and_look(
                &mut self.write_pool,
                5.0,
                68.0,
                5.0,
                0.0,
                0.0,
                0,
                teleport_id,
            )?;
            self.send_to(index, head);
        } else if let Some(value) = command.strip_prefix("time ") {
            if let Ok(time) = value.trim().parse::<u64>() {
                self.world_time = time % 24000;
                // Force an immediate time update for everyone.
                let now = Instant::now();
                for session in &mut self.sessions {
                    session.next_keep_alive = now;
                }
            }
        } else if let Some(value) = command.strip_prefix("gm ") {
            if let Ok(gamemode) = value.trim().parse::<u8>() {
                if gamemode <= 3 {
                    self.sessions[index].gamemode = gamemode;
                    let head = outbound::play::change_game_state(
                        &mut self.write_pool,
                        GAMEMODE_REASON,
                        f32::from(gamemode),
                    )?;
                    self.send_to(index, head);
                }
            }
        } else {
            debug!(index, command, "unknown chat command");
        }
        Ok(())
    }

    /// Attack path of use-entity: cooldown-gated damage with a hurt
    /// animation, a health update, and a death status at zero.
    fn attack(&mut self, target: i32) -> anyhow::Result<()> {
        let Some(target_index) = self
            .sessions
            .iter()
            .position(|s| s.state == ProtocolState::Play && s.entity_id == target)
        else {
            return Ok(());
        };

        let now = Instant::now();
        {
            let victim = &self.sessions[target_index];
            let on_cooldown = victim
                .last_damage
                .is_some_and(|at| now.duration_since(at) < DAMAGE_COOLDOWN);
            if victim.health <= 0.0 || on_cooldown {
                return Ok(());
            }
        }

        let entity_id = self.sessions[target_index].entity_id;
        let head =
            outbound::play::animation(&mut self.write_pool, entity_id, Animation::TakeDamage)?;
        self.broadcast_play(head, None);

        let victim = &mut self.sessions[target_index];
        victim.health -= ATTACK_DAMAGE;
        victim.last_damage = Some(now);
        let health = victim.health;

        self.send_health(target_index)?;

        if health < 0.0 {
            let head = outbound::play::entity_status(&mut self.write_pool, entity_id, 3)?;
            self.broadcast_play(head, None);
        }
        Ok(())
    }

    /// Client-status respawn: restore health if dead, reset to the spawn
    /// point, and re-announce the entity to everyone else.
    fn respawn(&mut self, index: usize) -> anyhow::Result<()> {
        if self.sessions[index].health <= 0.0 {
            self.sessions[index].health = MAX_HEALTH;
            let gamemode = self.sessions[index].gamemode;
            let head = outbound::play::respawn(&mut self.write_pool, 0, gamemode, "default")?;
            self.send_to(index, head);
        }

        {
            let session = &mut self.sessions[index];
            session.x = 0.0;
            session.y = 66.0;
            session.z = 0.0;
        }
        let (x, y, z, yaw, pitch, entity_id, uuid) = {
            let s = &self.sessions[index];
            (s.x, s.y, s.z, s.yaw, s.pitch, s.entity_id, s.uuid)
        };

        let teleport_id = self.next_teleport_id();
        let head = outbound::play::position_and_look(
            &mut self.write_pool,
            x,
            y,
            z,
            yaw,
            pitch,
            0,
            teleport_id,
        )?;
        self.send_to(index, head);

        let head = outbound::play::spawn_player(
            &mut self.write_pool,
            entity_id,
            uuid,
            x,
            y,
            z,
            yaw,
            pitch,
        )?;
        self.broadcast_play(head, Some(index));
        Ok(())
    }

    fn send_health(&mut self, index: usize) -> anyhow::Result<()> {
        let health = self.sessions[index].health;
        let head = outbound::play::update_health(&mut self.write_pool, health, 20, 5.0)?;
        self.send_to(index, head);
        Ok(())
    }

    /// One fixed world tick: time, health regen, keepalives, and movement
    /// broadcasts.
    pub(crate) fn tick(&mut self) -> anyhow::Result<()> {
        let now = Instant::now();
        self.world_age += 1;
        self.world_time = (self.world_time + 1) % 24000;

        let dt = self.config.tick_interval.as_secs_f32();

        for index in 0..self.sessions.len() {
            if self.sessions[index].state != ProtocolState::Play {
                continue;
            }

            {
                let session = &mut self.sessions[index];
                if session.health > 0.0 {
                    #[allow(clippy::cast_possible_truncation)]
                    let previous_discrete = session.health as i32;
                    session.health = (session.health + session.health_regen * dt).min(MAX_HEALTH);
                    #[allow(clippy::cast_possible_truncation)]
                    let regenerated = (session.health as i32) > previous_discrete;
                    if regenerated {
                        self.send_health(index)?;
                    }
                }
            }

            if now >= self.sessions[index].next_keep_alive {
                let head = outbound::play::keep_alive(&mut self.write_pool, self.world_age)?;
                self.send_to(index, head);
                let head = outbound::play::time_update(
                    &mut self.write_pool,
                    self.world_age,
                    self.world_time,
                )?;
                self.send_to(index, head);
                self.sessions[index].next_keep_alive = now + self.config.keep_alive_interval;
            }

            if now >= self.sessions[index].next_movement_broadcast {
                self.broadcast_movement(index)?;
                let session = &mut self.sessions[index];
                session.previous_x = session.x;
                session.previous_y = session.y;
                session.previous_z = session.z;
                session.next_movement_broadcast = now + self.config.movement_interval;
            }
        }
        Ok(())
    }

    /// Relative move for small deltas, teleport for large ones, plus the
    /// head-look packet.
    fn broadcast_movement(&mut self, index: usize) -> anyhow::Result<()> {
        let (entity_id, dx, dy, dz, x, y, z, yaw, pitch, on_ground) = {
            let s = &self.sessions[index];
            (
                s.entity_id,
                s.x - s.previous_x,
                s.y - s.previous_y,
                s.z - s.previous_z,
                s.x,
                s.y,
                s.z,
                s.yaw,
                s.pitch,
                s.on_ground,
            )
        };

        let head = if dx.abs() < 8.0 && dy.abs() < 8.0 && dz.abs() < 8.0 {
            outbound::play::entity_look_and_relative_move(
                &mut self.write_pool,
                entity_id,
                dx,
                dy,
                dz,
                yaw,
                pitch,
                on_ground,
            )?
        } else {
            outbound::play::entity_teleport(
                &mut self.write_pool,
                entity_id,
                x,
                y,
                z,
                yaw,
                pitch,
                on_ground,
            )?
        };
        self.broadcast_play(head, Some(index));

        let head = outbound::play::entity_head_look(&mut self.write_pool, entity_id, yaw)?;
        self.broadcast_play(head, Some(index));
        Ok(())
    }

    fn play_count(&self) -> usize {
        self.sessions
            .iter()
            .filter(|s| s.state == ProtocolState::Play)
            .count()
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    fn next_teleport_id(&self) -> i32 {
        // Monotonic enough; the client only echoes it back.
        self.world_age as i32 + 1
    }
}
