//! Packet id catalogue for protocol 498 (1.14.4).

/// Serverbound packet ids.
pub mod inbound {
    pub mod handshaking {
        pub const HANDSHAKE: i32 = 0x00;
    }

    pub mod status {
        pub const REQUEST: i32 = 0x00;
        pub const PING: i32 = 0x01;
    }

    pub mod login {
        pub const START: i32 = 0x00;
    }

    pub mod play {
        pub const TELEPORT_CONFIRM: i32 = 0x00;
        pub const CHAT: i32 = 0x03;
        pub const CLIENT_STATUS: i32 = 0x04;
        pub const CLIENT_SETTINGS: i32 = 0x05;
        pub const PLUGIN_MESSAGE: i32 = 0x0B;
        pub const USE_ENTITY: i32 = 0x0E;
        pub const KEEP_ALIVE: i32 = 0x0F;
        pub const PLAYER_POSITION: i32 = 0x11;
        pub const PLAYER_POSITION_AND_LOOK: i32 = 0x12;
        pub const PLAYER_LOOK: i32 = 0x13;
        pub const ANIMATION: i32 = 0x2A;
    }
}

/// Clientbound packet ids.
pub mod outbound {
    pub mod status {
        pub const RESPONSE: i32 = 0x00;
        pub const PONG: i32 = 0x01;
    }

    pub mod login {
        pub const DISCONNECT: i32 = 0x00;
        pub const SUCCESS: i32 = 0x02;
    }

    pub mod play {
        pub const SPAWN_PLAYER: i32 = 0x05;
        pub const ANIMATION: i32 = 0x06;
        pub const CHAT: i32 = 0x0E;
        pub const PLUGIN_MESSAGE: i32 = 0x18;
        pub const DISCONNECT: i32 = 0x1A;
        pub const ENTITY_STATUS: i32 = 0x1B;
        pub const CHANGE_GAME_STATE: i32 = 0x1E;
        pub const KEEP_ALIVE: i32 = 0x20;
        pub const CHUNK_DATA: i32 = 0x21;
        pub const JOIN_GAME: i32 = 0x25;
        pub const ENTITY_LOOK_AND_RELATIVE_MOVE: i32 = 0x29;
        pub const PLAYER_ABILITIES: i32 = 0x31;
        pub const PLAYER_INFO: i32 = 0x33;
        pub const PLAYER_POSITION_AND_LOOK: i32 = 0x35;
        pub const DESTROY_ENTITIES: i32 = 0x37;
        pub const RESPAWN: i32 = 0x3A;
        pub const ENTITY_HEAD_LOOK: i32 = 0x3B;
        pub const UPDATE_HEALTH: i32 = 0x48;
        pub const TIME_UPDATE: i32 = 0x4E;
        pub const ENTITY_TELEPORT: i32 = 0x56;
    }
}
