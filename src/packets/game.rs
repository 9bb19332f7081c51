//! Game-family packets.
//!
//! The game opcode is the byte right after the flags header; the zero
//! value is reserved for the control-family marker and never appears
//! here. Opcodes listed without a packet struct are catalogued for
//! dispatch diagnostics but have no codec yet, so frames carrying them
//! fail with an unknown-opcode error just like unlisted values.

use num_derive::FromPrimitive;

use crate::bits::BitWriter;
use crate::error::CodecError;
use crate::registry::ProtocolRegistry;
use crate::{Decode, Encode};

pub mod chat;
pub mod keep_alive;
pub mod login;
pub mod object_create;
pub mod world;

pub use chat::{ChatMessageType, ChatMsg};
pub use keep_alive::KeepAliveMessage;
pub use login::{
    ConnectToWorldMessage, LoginCredentials, LoginError, LoginMessage, LoginRespMessage,
    StationError, StationSubscriptionStatus,
};
pub use object_create::{
    object_class, ConstructorData, DetailedAceData, DetailedBoomerTriggerData, DetailedRekData,
    ObjectCreateDetailedMessage, ObjectCreateParent,
};
pub use world::{ServerType, VnlWorldStatusMessage, WorldInfo, WorldStatus};

/// Game-family opcodes.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, FromPrimitive)]
pub enum GameOpcode {
    LoginMessage = 0x01,
    LoginRespMessage = 0x02,
    ConnectToWorldRequestMessage = 0x03,
    ConnectToWorldMessage = 0x04,
    PlayerStateMessage = 0x08,
    VnlWorldStatusMessage = 0x0d,
    ChatMsg = 0x12,
    CharacterInfoMessage = 0x17,
    ObjectCreateDetailedMessage = 0x18,
    KeepAliveMessage = 0xba,
}

/// A decoded game-family packet.
#[derive(Clone, PartialEq, Debug)]
pub enum GamePacket {
    Login(LoginMessage),
    LoginResp(LoginRespMessage),
    ConnectToWorld(ConnectToWorldMessage),
    WorldStatus(VnlWorldStatusMessage),
    Chat(ChatMsg),
    KeepAlive(KeepAliveMessage),
    ObjectCreateDetailed(ObjectCreateDetailedMessage),
}

impl GamePacket {
    pub fn opcode(&self) -> GameOpcode {
        match self {
            GamePacket::Login(_) => GameOpcode::LoginMessage,
            GamePacket::LoginResp(_) => GameOpcode::LoginRespMessage,
            GamePacket::ConnectToWorld(_) => GameOpcode::ConnectToWorldMessage,
            GamePacket::WorldStatus(_) => GameOpcode::VnlWorldStatusMessage,
            GamePacket::Chat(_) => GameOpcode::ChatMsg,
            GamePacket::KeepAlive(_) => GameOpcode::KeepAliveMessage,
            GamePacket::ObjectCreateDetailed(_) => GameOpcode::ObjectCreateDetailedMessage,
        }
    }
}

impl Encode for GamePacket {
    /// Writes the opcode byte followed by the packet body.
    fn encode(&self, w: &mut BitWriter) -> Result<(), CodecError> {
        w.write_u8(self.opcode() as u8);
        match self {
            GamePacket::Login(p) => p.encode(w),
            GamePacket::LoginResp(p) => p.encode(w),
            GamePacket::ConnectToWorld(p) => p.encode(w),
            GamePacket::WorldStatus(p) => p.encode(w),
            GamePacket::Chat(p) => p.encode(w),
            GamePacket::KeepAlive(p) => p.encode(w),
            GamePacket::ObjectCreateDetailed(p) => p.encode(w),
        }
    }
}

macro_rules! into_game_packet {
    ($($body:ty => $variant:ident,)*) => {
        $(impl From<$body> for GamePacket {
            fn from(body: $body) -> Self {
                GamePacket::$variant(body)
            }
        })*
    };
}

into_game_packet! {
    LoginMessage => Login,
    LoginRespMessage => LoginResp,
    ConnectToWorldMessage => ConnectToWorld,
    VnlWorldStatusMessage => WorldStatus,
    ChatMsg => Chat,
    KeepAliveMessage => KeepAlive,
    ObjectCreateDetailedMessage => ObjectCreateDetailed,
}

pub(crate) fn register_standard(registry: &mut ProtocolRegistry) {
    registry.register_game_opcode(GameOpcode::LoginMessage, |r| {
        LoginMessage::decode(r).map(GamePacket::Login)
    });
    registry.register_game_opcode(GameOpcode::LoginRespMessage, |r| {
        LoginRespMessage::decode(r).map(GamePacket::LoginResp)
    });
    registry.register_game_opcode(GameOpcode::ConnectToWorldMessage, |r| {
        ConnectToWorldMessage::decode(r).map(GamePacket::ConnectToWorld)
    });
    registry.register_game_opcode(GameOpcode::VnlWorldStatusMessage, |r| {
        VnlWorldStatusMessage::decode(r).map(GamePacket::WorldStatus)
    });
    registry.register_game_opcode(GameOpcode::ChatMsg, |r| {
        ChatMsg::decode(r).map(GamePacket::Chat)
    });
    registry.register_game_opcode(GameOpcode::KeepAliveMessage, |r| {
        KeepAliveMessage::decode(r).map(GamePacket::KeepAlive)
    });
    registry.register_game_opcode(GameOpcode::ObjectCreateDetailedMessage, |r| {
        ObjectCreateDetailedMessage::decode(r).map(GamePacket::ObjectCreateDetailed)
    });
}
