//! Clientbound packet serializers.
//!
//! Each serializer builds a complete framed chain in the write pool and
//! returns its head, ready to hand to the socket.

use chain::{ChainWriter, NodeIndex, SegmentPool};
use uuid::Uuid;

use crate::error::ProtoResult;
use crate::ids::outbound as id;

/// Entity animation kinds for the play animation packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Animation {
    SwingMainArm = 0,
    TakeDamage = 1,
    LeaveBed = 2,
    SwingOffhand = 3,
    CriticalEffect = 4,
    MagicCriticalEffect = 5,
}

/// One entry of a player-info add batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerInfoEntry {
    pub uuid: Uuid,
    pub username: String,
    pub gamemode: u8,
    pub ping: i32,
}

/// Tab-list updates carried by the player-info packet.
#[derive(Debug, Clone, Copy)]
pub enum PlayerInfo<'a> {
    Add(&'a [PlayerInfoEntry]),
    Remove(&'a [Uuid]),
}

fn write_uuid(writer: &mut ChainWriter<'_>, uuid: Uuid) -> chain::ChainResult<()> {
    let (most, least) = uuid.as_u64_pair();
    writer.write_u64(most)?;
    writer.write_u64(least)
}

/// Degrees to the protocol's 1/256th-turn angle byte.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn angle(degrees: f32) -> u8 {
    (degrees / 360.0 * 256.0).rem_euclid(256.0) as u8
}

pub mod status {
    use super::{id, NodeIndex, ProtoResult, SegmentPool};

    /// Status response carrying the server-list JSON.
    pub fn response(pool: &mut SegmentPool, json: &str) -> ProtoResult<NodeIndex> {
        Ok(wire::encode_packet(pool, id::status::RESPONSE, |w| {
            w.write_str(json)
        })?)
    }

    /// Pong echoing the ping payload.
    pub fn pong(pool: &mut SegmentPool, payload: u64) -> ProtoResult<NodeIndex> {
        Ok(wire::encode_packet(pool, id::status::PONG, |w| {
            w.write_u64(payload)
        })?)
    }
}

pub mod login {
    use super::{id, NodeIndex, ProtoResult, SegmentPool, Uuid};

    /// Login success: hyphenated uuid string, then the username.
    pub fn success(pool: &mut SegmentPool, uuid: Uuid, username: &str) -> ProtoResult<NodeIndex> {
        let uuid_text = uuid.hyphenated().to_string();
        Ok(wire::encode_packet(pool, id::login::SUCCESS, |w| {
            w.write_str(&uuid_text)?;
            w.write_str(username)
        })?)
    }

    /// Login disconnect with a chat-JSON reason.
    pub fn disconnect(pool: &mut SegmentPool, reason_json: &str) -> ProtoResult<NodeIndex> {
        Ok(wire::encode_packet(pool, id::login::DISCONNECT, |w| {
            w.write_str(reason_json)
        })?)
    }
}

pub mod play {
    use super::{
        angle, id, write_uuid, Animation, NodeIndex, PlayerInfo, ProtoResult, SegmentPool, Uuid,
    };

    /// Chat message with a chat-JSON body. Position 0 is the chat box.
    pub fn chat(pool: &mut SegmentPool, json: &str, position: u8) -> ProtoResult<NodeIndex> {
        Ok(wire::encode_packet(pool, id::play::CHAT, |w| {
            w.write_str(json)?;
            w.write_u8(position)
        })?)
    }

    /// Spawns a player entity for other clients.
    pub fn spawn_player(
        pool: &mut SegmentPool,
        entity_id: i32,
        uuid: Uuid,
        x: f64,
        y: f64,
        z: f64,
        yaw: f32,
        pitch: f32,
    ) -> ProtoResult<NodeIndex> {
        Ok(wire::encode_packet(pool, id::play::SPAWN_PLAYER, |w| {
            w.write_varint(entity_id)?;
            write_uuid(w, uuid)?;
            w.write_f64(x)?;
            w.write_f64(y)?;
            w.write_f64(z)?;
            w.write_u8(angle(yaw))?;
            w.write_u8(angle(pitch))?;
            // Empty entity metadata.
            w.write_u8(0xFF)
        })?)
    }

    pub fn animation(
        pool: &mut SegmentPool,
        entity_id: i32,
        animation: Animation,
    ) -> ProtoResult<NodeIndex> {
        Ok(wire::encode_packet(pool, id::play::ANIMATION, |w| {
            w.write_varint(entity_id)?;
            w.write_u8(animation as u8)
        })?)
    }

    pub fn plugin_message(
        pool: &mut SegmentPool,
        channel: &str,
        data: &[u8],
    ) -> ProtoResult<NodeIndex> {
        Ok(wire::encode_packet(pool, id::play::PLUGIN_MESSAGE, |w| {
            w.write_str(channel)?;
            w.write_raw(data)
        })?)
    }

    /// Play-state disconnect with a chat-JSON reason.
    pub fn disconnect(pool: &mut SegmentPool, reason_json: &str) -> ProtoResult<NodeIndex> {
        Ok(wire::encode_packet(pool, id::play::DISCONNECT, |w| {
            w.write_str(reason_json)
        })?)
    }

    /// Entity status event. Status 3 is the death animation.
    pub fn entity_status(
        pool: &mut SegmentPool,
        entity_id: i32,
        status: u8,
    ) -> ProtoResult<NodeIndex> {
        Ok(wire::encode_packet(pool, id::play::ENTITY_STATUS, |w| {
            #[allow(clippy::cast_sign_loss)]
            w.write_u32(entity_id as u32)?;
            w.write_u8(status)
        })?)
    }

    /// Game state change. Reason 3 carries the new gamemode in `value`.
    pub fn change_game_state(
        pool: &mut SegmentPool,
        reason: u8,
        value: f32,
    ) -> ProtoResult<NodeIndex> {
        Ok(wire::encode_packet(pool, id::play::CHANGE_GAME_STATE, |w| {
            w.write_u8(reason)?;
            w.write_f32(value)
        })?)
    }

    pub fn keep_alive(pool: &mut SegmentPool, keep_alive_id: u64) -> ProtoResult<NodeIndex> {
        Ok(wire::encode_packet(pool, id::play::KEEP_ALIVE, |w| {
            w.write_u64(keep_alive_id)
        })?)
    }

    /// Full chunk column. `heightmap` is raw NBT and `sections` the packed
    /// section payload for every section set in `primary_bitmask`; the 256
    /// biome ints are appended here.
    pub fn chunk_data(
        pool: &mut SegmentPool,
        chunk_x: i32,
        chunk_z: i32,
        primary_bitmask: i32,
        heightmap: &[u8],
        sections: &[u8],
    ) -> ProtoResult<NodeIndex> {
        const BIOME_COUNT: usize = 256;
        let data_len = sections.len() + BIOME_COUNT * 4;

        Ok(wire::encode_packet(pool, id::play::CHUNK_DATA, |w| {
            #[allow(clippy::cast_sign_loss)]
            w.write_u32(chunk_x as u32)?;
            #[allow(clippy::cast_sign_loss)]
            w.write_u32(chunk_z as u32)?;
            // Full chunk flag.
            w.write_u8(1)?;
            w.write_varint(primary_bitmask)?;
            w.write_raw(heightmap)?;
            #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
            w.write_varint(data_len as i32)?;
            w.write_raw(sections)?;
            for _ in 0..BIOME_COUNT {
                w.write_u32(0)?;
            }
            // Block entity count.
            w.write_varint(0)
        })?)
    }

    pub fn join_game(
        pool: &mut SegmentPool,
        entity_id: i32,
        gamemode: u8,
        dimension: i32,
        level_type: &str,
        view_distance: i32,
        reduced_debug: bool,
    ) -> ProtoResult<NodeIndex> {
        Ok(wire::encode_packet(pool, id::play::JOIN_GAME, |w| {
            #[allow(clippy::cast_sign_loss)]
            w.write_u32(entity_id as u32)?;
            w.write_u8(gamemode)?;
            #[allow(clippy::cast_sign_loss)]
            w.write_u32(dimension as u32)?;
            // Max players, unused by modern clients.
            w.write_u8(0xFF)?;
            w.write_str(level_type)?;
            w.write_varint(view_distance)?;
            w.write_u8(u8::from(reduced_debug))
        })?)
    }

    /// Small-delta movement. Deltas are in blocks and must stay within
    /// eight; larger moves use [`entity_teleport`].
    pub fn entity_look_and_relative_move(
        pool: &mut SegmentPool,
        entity_id: i32,
        delta_x: f64,
        delta_y: f64,
        delta_z: f64,
        yaw: f32,
        pitch: f32,
        on_ground: bool,
    ) -> ProtoResult<NodeIndex> {
        #[allow(clippy::cast_possible_truncation)]
        fn fixed_point(delta: f64) -> u16 {
            (delta * 4096.0) as i16 as u16
        }

        Ok(wire::encode_packet(
            pool,
            id::play::ENTITY_LOOK_AND_RELATIVE_MOVE,
            |w| {
                w.write_varint(entity_id)?;
                w.write_u16(fixed_point(delta_x))?;
                w.write_u16(fixed_point(delta_y))?;
                w.write_u16(fixed_point(delta_z))?;
                w.write_u8(angle(yaw))?;
                w.write_u8(angle(pitch))?;
                w.write_u8(u8::from(on_ground))
            },
        )?)
    }

    pub fn player_abilities(
        pool: &mut SegmentPool,
        flags: u8,
        fly_speed: f32,
        fov_modifier: f32,
    ) -> ProtoResult<NodeIndex> {
        Ok(wire::encode_packet(pool, id::play::PLAYER_ABILITIES, |w| {
            w.write_u8(flags)?;
            w.write_f32(fly_speed)?;
            w.write_f32(fov_modifier)
        })?)
    }

    /// Tab-list add/remove batch.
    pub fn player_info(pool: &mut SegmentPool, info: PlayerInfo<'_>) -> ProtoResult<NodeIndex> {
        Ok(wire::encode_packet(pool, id::play::PLAYER_INFO, |w| {
            match info {
                PlayerInfo::Add(entries) => {
                    w.write_varint(0)?;
                    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
                    w.write_varint(entries.len() as i32)?;
                    for entry in entries {
                        write_uuid(w, entry.uuid)?;
                        w.write_str(&entry.username)?;
                        // No skin properties.
                        w.write_varint(0)?;
                        w.write_varint(i32::from(entry.gamemode))?;
                        w.write_varint(entry.ping)?;
                        // No display name.
                        w.write_u8(0)?;
                    }
                }
                PlayerInfo::Remove(uuids) => {
                    w.write_varint(4)?;
                    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
                    w.write_varint(uuids.len() as i32)?;
                    for &uuid in uuids {
                        write_uuid(w, uuid)?;
                    }
                }
            }
            Ok(())
        })?)
    }

    /// Absolute teleport of the client's own player.
    pub fn position_and_look(
        pool: &mut SegmentPool,
        x: f64,
        y: f64,
        z: f64,
        yaw: f32,
        pitch: f32,
        flags: u8,
        teleport_id: i32,
    ) -> ProtoResult<NodeIndex> {
        Ok(wire::encode_packet(
            pool,
            id::play::PLAYER_POSITION_AND_LOOK,
            |w| {
                w.write_f64(x)?;
                w.write_f64(y)?;
                w.write_f64(z)?;
                w.write_f32(yaw)?;
                w.write_f32(pitch)?;
                w.write_u8(flags)?;
                w.write_varint(teleport_id)
            },
        )?)
    }

    pub fn destroy_entities(pool: &mut SegmentPool, entity_ids: &[i32]) -> ProtoResult<NodeIndex> {
        Ok(wire::encode_packet(pool, id::play::DESTROY_ENTITIES, |w| {
            #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
            w.write_varint(entity_ids.len() as i32)?;
            for &entity_id in entity_ids {
                w.write_varint(entity_id)?;
            }
            Ok(())
        })?)
    }

    pub fn respawn(
        pool: &mut SegmentPool,
        dimension: i32,
        gamemode: u8,
        level_type: &str,
    ) -> ProtoResult<NodeIndex> {
        Ok(wire::encode_packet(pool, id::play::RESPAWN, |w| {
            #[allow(clippy::cast_sign_loss)]
            w.write_u32(dimension as u32)?;
            w.write_u8(gamemode)?;
            w.write_str(level_type)
        })?)
    }

    pub fn entity_head_look(
        pool: &mut SegmentPool,
        entity_id: i32,
        yaw: f32,
    ) -> ProtoResult<NodeIndex> {
        Ok(wire::encode_packet(pool, id::play::ENTITY_HEAD_LOOK, |w| {
            w.write_varint(entity_id)?;
            w.write_u8(angle(yaw))
        })?)
    }

    pub fn update_health(
        pool: &mut SegmentPool,
        health: f32,
        food: i32,
        saturation: f32,
    ) -> ProtoResult<NodeIndex> {
        Ok(wire::encode_packet(pool, id::play::UPDATE_HEALTH, |w| {
            w.write_f32(health)?;
            w.write_varint(food)?;
            w.write_f32(saturation)
        })?)
    }

    pub fn time_update(
        pool: &mut SegmentPool,
        world_age: u64,
        time_of_day: u64,
    ) -> ProtoResult<NodeIndex> {
        Ok(wire::encode_packet(pool, id::play::TIME_UPDATE, |w| {
            w.write_u64(world_age)?;
            w.write_u64(time_of_day)
        })?)
    }

    /// Absolute entity move, used when a delta overflows the relative-move
    /// packet's range.
    pub fn entity_teleport(
        pool: &mut SegmentPool,
        entity_id: i32,
        x: f64,
        y: f64,
        z: f64,
        yaw: f32,
        pitch: f32,
        on_ground: bool,
    ) -> ProtoResult<NodeIndex> {
        Ok(wire::encode_packet(pool, id::play::ENTITY_TELEPORT, |w| {
            w.write_varint(entity_id)?;
            w.write_f64(x)?;
            w.write_f64(y)?;
            w.write_f64(z)?;
            w.write_u8(angle(yaw))?;
            w.write_u8(angle(pitch))?;
            w.write_u8(u8::from(on_ground))
        })?)
    }
}
