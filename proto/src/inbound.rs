//! Serverbound packet decoding.

use chain::ChainReader;
use wire::Frame;

use crate::error::{ProtoError, ProtoResult};
use crate::ids::inbound as id;
use crate::state::ProtocolState;

/// What a use-entity packet did to its target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UseEntityAction {
    Interact { hand: i32 },
    Attack,
    InteractAt { x: f32, y: f32, z: f32, hand: i32 },
}

/// A decoded serverbound packet.
///
/// Decoding produces owned values so the session layer can drop its reader
/// (and the borrow of the read pool) before dispatching.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Handshake {
        protocol_version: i32,
        address: String,
        port: u16,
        next_state: ProtocolState,
    },
    StatusRequest,
    StatusPing {
        payload: u64,
    },
    LoginStart {
        username: String,
    },
    TeleportConfirm {
        teleport_id: i32,
    },
    Chat {
        message: String,
    },
    ClientStatus {
        action: i32,
    },
    ClientSettings {
        locale: String,
        view_distance: u8,
        chat_mode: i32,
        chat_colors: bool,
        skin_parts: u8,
        main_hand: i32,
    },
    PluginMessage {
        channel: String,
        data: Vec<u8>,
    },
    UseEntity {
        target: i32,
        action: UseEntityAction,
    },
    KeepAlive {
        id: u64,
    },
    PlayerPosition {
        x: f64,
        y: f64,
        z: f64,
        on_ground: bool,
    },
    PlayerPositionAndLook {
        x: f64,
        y: f64,
        z: f64,
        yaw: f32,
        pitch: f32,
        on_ground: bool,
    },
    PlayerLook {
        yaw: f32,
        pitch: f32,
        on_ground: bool,
    },
    Animation {
        hand: i32,
    },
    /// A well-framed play packet outside the catalogue. Its body has been
    /// skipped; it is not a violation.
    Unknown {
        id: i32,
    },
}

/// Decodes one packet body for `state`.
///
/// The reader must be positioned just past the packet id, with the whole
/// declared body buffered. A known packet that consumes a different number
/// of bytes than the frame declared is a violation; so is a field read that
/// runs off the chain, since the declared body is already buffered.
pub fn decode(state: ProtocolState, frame: Frame, reader: &mut ChainReader<'_>) -> ProtoResult<Inbound> {
    let start = reader.position();
    let packet = match decode_body(state, frame, reader, start) {
        Ok(packet) => packet,
        Err(err) if err.is_incomplete() => {
            return Err(ProtoError::BodyLengthMismatch {
                id: frame.id,
                declared: frame.body_len,
                consumed: reader.position() - start,
            });
        }
        Err(err) => return Err(err),
    };

    let consumed = reader.position() - start;
    if consumed != frame.body_len {
        return Err(ProtoError::BodyLengthMismatch {
            id: frame.id,
            declared: frame.body_len,
            consumed,
        });
    }
    Ok(packet)
}

fn decode_body(
    state: ProtocolState,
    frame: Frame,
    reader: &mut ChainReader<'_>,
    body_start: usize,
) -> ProtoResult<Inbound> {
    match state {
        ProtocolState::Handshaking => decode_handshaking(frame, reader),
        ProtocolState::Status => decode_status(frame, reader),
        ProtocolState::Login => decode_login(frame, reader),
        ProtocolState::Play => decode_play(frame, reader, body_start),
    }
}

fn decode_handshaking(frame: Frame, reader: &mut ChainReader<'_>) -> ProtoResult<Inbound> {
    match frame.id {
        id::handshaking::HANDSHAKE => {
            let protocol_version = reader.read_varint()?;
            let address = reader.read_string()?;
            let port = reader.read_u16()?;
            let next_state = ProtocolState::from_next_state(reader.read_varint()?)?;
            Ok(Inbound::Handshake {
                protocol_version,
                address,
                port,
                next_state,
            })
        }
        other => Err(ProtoError::IllegalPacket {
            state: ProtocolState::Handshaking,
            id: other,
        }),
    }
}

fn decode_status(frame: Frame, reader: &mut ChainReader<'_>) -> ProtoResult<Inbound> {
    match frame.id {
        id::status::REQUEST => Ok(Inbound::StatusRequest),
        id::status::PING => Ok(Inbound::StatusPing {
            payload: reader.read_u64()?,
        }),
        other => Err(ProtoError::IllegalPacket {
            state: ProtocolState::Status,
            id: other,
        }),
    }
}

fn decode_login(frame: Frame, reader: &mut ChainReader<'_>) -> ProtoResult<Inbound> {
    match frame.id {
        id::login::START => {
            let len = reader.string_len()?;
            if len > 16 {
                return Err(ProtoError::UsernameTooLong { len });
            }
            let username = reader.read_string()?;
            Ok(Inbound::LoginStart { username })
        }
        other => Err(ProtoError::IllegalPacket {
            state: ProtocolState::Login,
            id: other,
        }),
    }
}

fn decode_play(
    frame: Frame,
    reader: &mut ChainReader<'_>,
    body_start: usize,
) -> ProtoResult<Inbound> {
    match frame.id {
        id::play::TELEPORT_CONFIRM => Ok(Inbound::TeleportConfirm {
            teleport_id: reader.read_varint()?,
        }),
        id::play::CHAT => Ok(Inbound::Chat {
            message: reader.read_string()?,
        }),
        id::play::CLIENT_STATUS => Ok(Inbound::ClientStatus {
            action: reader.read_varint()?,
        }),
        id::play::CLIENT_SETTINGS => Ok(Inbound::ClientSettings {
            locale: reader.read_string()?,
            view_distance: reader.read_u8()?,
            chat_mode: reader.read_varint()?,
            chat_colors: reader.read_u8()? != 0,
            skin_parts: reader.read_u8()?,
            main_hand: reader.read_varint()?,
        }),
        id::play::PLUGIN_MESSAGE => {
            let channel = reader.read_string()?;
            let consumed = reader.position() - body_start;
            // The channel string may have overrun the declared body into
            // pipelined bytes.
            let Some(rest) = frame.body_len.checked_sub(consumed) else {
                return Err(ProtoError::BodyLengthMismatch {
                    id: frame.id,
                    declared: frame.body_len,
                    consumed,
                });
            };
            let data = reader.read_exact_vec(rest)?;
            Ok(Inbound::PluginMessage { channel, data })
        }
        id::play::USE_ENTITY => {
            let target = reader.read_varint()?;
            let kind = reader.read_varint()?;
            let action = match kind {
                1 => UseEntityAction::Attack,
                2 => {
                    let x = reader.read_f32()?;
                    let y = reader.read_f32()?;
                    let z = reader.read_f32()?;
                    let hand = reader.read_varint()?;
                    UseEntityAction::InteractAt { x, y, z, hand }
                }
                _ => UseEntityAction::Interact {
                    hand: reader.read_varint()?,
                },
            };
            Ok(Inbound::UseEntity { target, action })
        }
        id::play::KEEP_ALIVE => Ok(Inbound::KeepAlive {
            id: reader.read_u64()?,
        }),
        id::play::PLAYER_POSITION => Ok(Inbound::PlayerPosition {
            x: reader.read_f64()?,
            y: reader.read_f64()?,
            z: reader.read_f64()?,
            on_ground: reader.read_u8()? != 0,
        }),
        id::play::PLAYER_POSITION_AND_LOOK => Ok(Inbound::PlayerPositionAndLook {
            x: reader.read_f64()?,
            y: reader.read_f64()?,
            z: reader.read_f64()?,
            yaw: reader.read_f32()?,
            pitch: reader.read_f32()?,
            on_ground: reader.read_u8()? != 0,
        }),
        id::play::PLAYER_LOOK => Ok(Inbound::PlayerLook {
            yaw: reader.read_f32()?,
            pitch: reader.read_f32()?,
            on_ground: reader.read_u8()? != 0,
        }),
        id::play::ANIMATION => Ok(Inbound::Animation {
            hand: reader.read_varint()?,
        }),
        other => {
            reader.skip(frame.body_len)?;
            Ok(Inbound::Unknown { id: other })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chain::{ChainResult, ChainWriter, SegmentPool};
    use wire::{read_frame, Limits};

    fn decode_one<F>(
        state: ProtocolState,
        packet_id: i32,
        build: F,
    ) -> (ProtoResult<Inbound>, usize)
    where
        F: FnOnce(&mut ChainWriter<'_>) -> ChainResult<()>,
    {
        let mut pool = SegmentPool::new(8192, 8);
        let head = wire::encode_packet(&mut pool, packet_id, build).unwrap();

        let mut reader = ChainReader::new(&pool, Some(head), 0);
        let frame = read_frame(&mut reader, &Limits::default()).unwrap();
        let result = decode(state, frame, &mut reader);
        let leftover = reader.remaining();
        (result, leftover)
    }

    #[test]
    fn handshake_decodes() {
        let (result, leftover) = decode_one(ProtocolState::Handshaking, 0x00, |w| {
            w.write_varint(498)?;
            w.write_str("localhost")?;
            w.write_u16(25565)?;
            w.write_varint(2)
        });
        assert_eq!(
            result.unwrap(),
            Inbound::Handshake {
                protocol_version: 498,
                address: "localhost".into(),
                port: 25565,
                next_state: ProtocolState::Login,
            }
        );
        assert_eq!(leftover, 0);
    }

    #[test]
    fn handshake_illegal_next_state() {
        let (result, _) = decode_one(ProtocolState::Handshaking, 0x00, |w| {
            w.write_varint(498)?;
            w.write_str("localhost")?;
            w.write_u16(25565)?;
            w.write_varint(3)
        });
        assert_eq!(
            result.unwrap_err(),
            ProtoError::IllegalNextState { requested: 3 }
        );
    }

    #[test]
    fn status_request_is_empty() {
        let (result, _) = decode_one(ProtocolState::Status, 0x00, |_| Ok(()));
        assert_eq!(result.unwrap(), Inbound::StatusRequest);
    }

    #[test]
    fn status_rejects_login_start() {
        let (result, _) = decode_one(ProtocolState::Status, 0x02, |_| Ok(()));
        assert_eq!(
            result.unwrap_err(),
            ProtoError::IllegalPacket {
                state: ProtocolState::Status,
                id: 0x02,
            }
        );
    }

    #[test]
    fn login_start_decodes() {
        let (result, _) = decode_one(ProtocolState::Login, 0x00, |w| w.write_str("plushmonkey"));
        assert_eq!(
            result.unwrap(),
            Inbound::LoginStart {
                username: "plushmonkey".into(),
            }
        );
    }

    #[test]
    fn login_username_over_sixteen_bytes_rejected() {
        let (result, _) =
            decode_one(ProtocolState::Login, 0x00, |w| w.write_str("seventeen_letters"));
        assert_eq!(result.unwrap_err(), ProtoError::UsernameTooLong { len: 17 });
    }

    #[test]
    fn use_entity_attack() {
        let (result, _) = decode_one(ProtocolState::Play, 0x0E, |w| {
            w.write_varint(42)?;
            w.write_varint(1)
        });
        assert_eq!(
            result.unwrap(),
            Inbound::UseEntity {
                target: 42,
                action: UseEntityAction::Attack,
            }
        );
    }

    #[test]
    fn use_entity_interact_at_reads_coordinates() {
        let (result, _) = decode_one(ProtocolState::Play, 0x0E, |w| {
            w.write_varint(7)?;
            w.write_varint(2)?;
            w.write_f32(0.5)?;
            w.write_f32(1.0)?;
            w.write_f32(-0.25)?;
            w.write_varint(0)
        });
        assert_eq!(
            result.unwrap(),
            Inbound::UseEntity {
                target: 7,
                action: UseEntityAction::InteractAt {
                    x: 0.5,
                    y: 1.0,
                    z: -0.25,
                    hand: 0,
                },
            }
        );
    }

    #[test]
    fn plugin_message_takes_rest_of_body() {
        let (result, leftover) = decode_one(ProtocolState::Play, 0x0B, |w| {
            w.write_str("minecraft:brand")?;
            w.write_raw(b"vanilla")
        });
        assert_eq!(
            result.unwrap(),
            Inbound::PluginMessage {
                channel: "minecraft:brand".into(),
                data: b"vanilla".to_vec(),
            }
        );
        assert_eq!(leftover, 0);
    }

    #[test]
    fn unknown_play_packet_skips_body() {
        let (result, leftover) = decode_one(ProtocolState::Play, 0x19, |w| {
            w.write_raw(&[0xAB; 11])
        });
        assert_eq!(result.unwrap(), Inbound::Unknown { id: 0x19 });
        assert_eq!(leftover, 0, "unknown body must be consumed");
    }

    #[test]
    fn plugin_message_channel_overrunning_body_is_a_violation() {
        // A one-byte declared body holding only a string length prefix that
        // claims sixteen; pipelined bytes after the frame must not be
        // consumed as the channel name, and nothing may panic.
        let mut pool = SegmentPool::new(8192, 8);
        let mut writer = ChainWriter::new(&mut pool).unwrap();
        writer.write_varint(2).unwrap(); // id plus one body byte
        writer.write_varint(0x0B).unwrap();
        writer.write_u8(0x10).unwrap();
        writer.write_raw(&[b'x'; 20]).unwrap();
        let head = writer.finish();

        let mut reader = ChainReader::new(&pool, Some(head), 0);
        let frame = read_frame(&mut reader, &Limits::default()).unwrap();
        let err = decode(ProtocolState::Play, frame, &mut reader).unwrap_err();
        assert_eq!(
            err,
            ProtoError::BodyLengthMismatch {
                id: 0x0B,
                declared: 1,
                consumed: 17,
            }
        );
    }

    #[test]
    fn truncated_string_in_buffered_body_is_a_violation() {
        // The whole three-byte body is buffered, but the chat string's
        // length prefix claims five. That is terminal, never a reason to
        // wait for more bytes.
        let mut pool = SegmentPool::new(8192, 8);
        let mut writer = ChainWriter::new(&mut pool).unwrap();
        writer.write_varint(4).unwrap();
        writer.write_varint(0x03).unwrap();
        writer.write_u8(0x05).unwrap();
        writer.write_raw(b"ab").unwrap();
        let head = writer.finish();

        let mut reader = ChainReader::new(&pool, Some(head), 0);
        let frame = read_frame(&mut reader, &Limits::default()).unwrap();
        let err = decode(ProtocolState::Play, frame, &mut reader).unwrap_err();
        assert!(!err.is_incomplete(), "buffered-body failure must be terminal");
        assert_eq!(
            err,
            ProtoError::BodyLengthMismatch {
                id: 0x03,
                declared: 3,
                consumed: 0,
            }
        );
    }

    #[test]
    fn short_body_is_a_mismatch_violation() {
        // KeepAlive declares a body one byte longer than its u64 payload.
        let mut pool = SegmentPool::new(8192, 8);
        let head = wire::encode_packet(&mut pool, 0x0F, |w| {
            w.write_u64(9)?;
            w.write_u8(0)
        })
        .unwrap();

        let mut reader = ChainReader::new(&pool, Some(head), 0);
        let frame = read_frame(&mut reader, &Limits::default()).unwrap();
        let err = decode(ProtocolState::Play, frame, &mut reader).unwrap_err();
        assert_eq!(
            err,
            ProtoError::BodyLengthMismatch {
                id: 0x0F,
                declared: 9,
                consumed: 8,
            }
        );
    }

    #[test]
    fn position_and_look_decodes() {
        let (result, _) = decode_one(ProtocolState::Play, 0x12, |w| {
            w.write_f64(1.5)?;
            w.write_f64(68.0)?;
            w.write_f64(-3.0)?;
            w.write_f32(90.0)?;
            w.write_f32(-10.0)?;
            w.write_u8(1)
        });
        assert_eq!(
            result.unwrap(),
            Inbound::PlayerPositionAndLook {
                x: 1.5,
                y: 68.0,
                z: -3.0,
                yaw: 90.0,
                pitch: -10.0,
                on_ground: true,
            }
        );
    }
}
