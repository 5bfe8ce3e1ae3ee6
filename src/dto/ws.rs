use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dto::game::PlayerActionDto;

#[derive(Debug, Deserialize, Serialize, ToSchema)]
/// Messages accepted from swimmer WebSocket clients.
#[serde(tag = "type")]
pub enum SwimmerInboundMessage {
    #[serde(rename = "identify")]
    Identify { game_id: Uuid, player_id: Uuid },
    #[serde(rename = "position")]
    Position { x: f32, y: f32 },
    #[serde(rename = "action")]
    Action {
        action: PlayerActionDto,
        #[serde(default)]
        target_player: Option<Uuid>,
    },
    #[serde(other)]
    Unknown,
}

impl SwimmerInboundMessage {
    /// Parse a raw text frame into an inbound message.
    pub fn from_json_str(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }

    pub fn identity(&self) -> Option<(Uuid, Uuid)> {
        match self {
            Self::Identify { game_id, player_id } => Some((*game_id, *player_id)),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Positive acknowledgement sent to a swimmer after successful identification.
pub struct SwimmerAck {
    pub game_id: Uuid,
    pub player_id: Uuid,
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
/// Error frame sent to a swimmer when an inbound message is rejected.
pub struct SwimmerErrorMessage {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inbound_message_parsing() {
        let game_id = Uuid::new_v4();
        let player_id = Uuid::new_v4();
        let raw =
            format!(r#"{{"type":"identify","game_id":"{game_id}","player_id":"{player_id}"}}"#);

        let parsed: SwimmerInboundMessage = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed.identity(), Some((game_id, player_id)));

        let parsed: SwimmerInboundMessage =
            serde_json::from_str(r#"{"type":"action","action":"splash"}"#).unwrap();
        match parsed {
            SwimmerInboundMessage::Action {
                action,
                target_player,
            } => {
                assert_eq!(action, PlayerActionDto::Splash);
                assert_eq!(target_player, None);
            }
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_message_types_are_tolerated() {
        let parsed: SwimmerInboundMessage =
            serde_json::from_str(r#"{"type":"wave_hello","payload":1}"#).unwrap();
        assert!(matches!(parsed, SwimmerInboundMessage::Unknown));
        assert_eq!(parsed.identity(), None);
    }
}
