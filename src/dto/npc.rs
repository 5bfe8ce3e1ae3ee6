//! DTO definitions for the NPC dialogue endpoint.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::state::game::NpcRole;

/// Beach characters the players can talk to.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NpcRoleDto {
    Lifeguard,
    Surfer,
    IceCreamVendor,
    OldSalt,
}

impl From<NpcRoleDto> for NpcRole {
    fn from(value: NpcRoleDto) -> Self {
        match value {
            NpcRoleDto::Lifeguard => NpcRole::Lifeguard,
            NpcRoleDto::Surfer => NpcRole::Surfer,
            NpcRoleDto::IceCreamVendor => NpcRole::IceCreamVendor,
            NpcRoleDto::OldSalt => NpcRole::OldSalt,
        }
    }
}

impl From<NpcRole> for NpcRoleDto {
    fn from(value: NpcRole) -> Self {
        match value {
            NpcRole::Lifeguard => NpcRoleDto::Lifeguard,
            NpcRole::Surfer => NpcRoleDto::Surfer,
            NpcRole::IceCreamVendor => NpcRoleDto::IceCreamVendor,
            NpcRole::OldSalt => NpcRoleDto::OldSalt,
        }
    }
}

/// Who said a line in a chat transcript.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChatSpeakerDto {
    Player,
    Npc,
}

/// One line of an earlier exchange, replayed for context.
#[derive(Debug, Serialize, Deserialize, ToSchema, Validate)]
pub struct ChatTurnInput {
    pub speaker: ChatSpeakerDto,
    #[validate(length(min = 1, max = 500))]
    pub text: String,
}

/// Payload asking a beach character to reply to a message.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct NpcChatRequest {
    pub npc: NpcRoleDto,
    #[validate(length(min = 1, max = 500))]
    pub message: String,
    /// Game whose situation should colour the reply, when any.
    #[serde(default)]
    pub game_id: Option<Uuid>,
    /// Recent lines of the conversation, oldest first.
    #[serde(default)]
    #[validate(nested, length(max = 12))]
    pub history: Vec<ChatTurnInput>,
}

/// Query form of the chat request for GET callers. History cannot be
/// expressed in a flat query string and is treated as empty.
#[derive(Debug, Deserialize, ToSchema)]
pub struct NpcChatQuery {
    pub npc: NpcRoleDto,
    pub message: String,
    #[serde(default)]
    pub game_id: Option<Uuid>,
}

impl From<NpcChatQuery> for NpcChatRequest {
    fn from(query: NpcChatQuery) -> Self {
        Self {
            npc: query.npc,
            message: query.message,
            game_id: query.game_id,
            history: Vec::new(),
        }
    }
}

/// Terminal payload of an NPC chat stream, carrying the full reply.
#[derive(Debug, Serialize, ToSchema)]
pub struct NpcChatDone {
    pub npc: NpcRoleDto,
    pub npc_name: String,
    pub text: String,
    /// Whether the reply came from the live model or a canned line.
    pub mode: String,
}
