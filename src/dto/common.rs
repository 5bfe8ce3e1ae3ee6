use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::{
    dto::{
        phase::{VisibleFinishReason, VisibleGamePhase},
        validation::validate_finite,
    },
    state::{
        game::Vec2,
        state_machine::{ActivePhase, GamePhase},
    },
};

/// A point in arena coordinates, shared by requests and projections.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Copy, PartialEq)]
pub struct PositionDto {
    pub x: f32,
    pub y: f32,
}

impl Validate for PositionDto {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        // JSON cannot encode non-finite floats, but query strings and socket
        // frames can smuggle them in.
        if let Err(e) = validate_finite(self.x) {
            errors.add("x", e);
        }
        if let Err(e) = validate_finite(self.y) {
            errors.add("y", e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl From<Vec2> for PositionDto {
    fn from(value: Vec2) -> Self {
        Self {
            x: value.x,
            y: value.y,
        }
    }
}

impl From<PositionDto> for Vec2 {
    fn from(value: PositionDto) -> Self {
        Self {
            x: value.x,
            y: value.y,
        }
    }
}

/// Shared snapshot describing the current phase of one game.
#[derive(Debug, Serialize, ToSchema, Clone)]
pub struct GamePhaseSnapshot {
    pub phase: VisibleGamePhase,
    pub game_id: Uuid,
    /// Present during the alert phase to expose the hunted swimmer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hunted_player: Option<Uuid>,
    /// Present once the round has ended to explain why.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<VisibleFinishReason>,
}

impl GamePhaseSnapshot {
    /// Project an in-memory phase into its public shape.
    pub fn from_phase(game_id: Uuid, phase: &GamePhase) -> Self {
        let hunted_player = match phase {
            GamePhase::Active(ActivePhase::Alert { target }) => Some(*target),
            _ => None,
        };
        let finish_reason = match phase {
            GamePhase::Ended(reason) => Some(reason.into()),
            _ => None,
        };

        Self {
            phase: phase.into(),
            game_id,
            hunted_player,
            finish_reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::state_machine::FinishReason;

    #[test]
    fn test_snapshot_carries_hunt_target_only_while_alert() {
        let game_id = Uuid::new_v4();
        let target = Uuid::new_v4();

        let alert = GamePhaseSnapshot::from_phase(game_id, &GamePhase::Active(ActivePhase::Alert { target }));
        assert_eq!(alert.phase, VisibleGamePhase::Alert);
        assert_eq!(alert.hunted_player, Some(target));
        assert_eq!(alert.finish_reason, None);

        let calm = GamePhaseSnapshot::from_phase(game_id, &GamePhase::Active(ActivePhase::Calm));
        assert_eq!(calm.phase, VisibleGamePhase::Calm);
        assert_eq!(calm.hunted_player, None);
    }

    #[test]
    fn test_snapshot_exposes_finish_reason_once_ended() {
        let snapshot = GamePhaseSnapshot::from_phase(
            Uuid::new_v4(),
            &GamePhase::Ended(FinishReason::ObjectivesComplete),
        );
        assert_eq!(snapshot.phase, VisibleGamePhase::Ended);
        assert_eq!(
            snapshot.finish_reason,
            Some(VisibleFinishReason::ObjectivesComplete)
        );
    }

    #[test]
    fn test_position_validation_rejects_non_finite() {
        assert!(PositionDto { x: 10.0, y: 20.0 }.validate().is_ok());
        assert!(PositionDto { x: f32::NAN, y: 0.0 }.validate().is_err());
        assert!(
            PositionDto {
                x: 0.0,
                y: f32::NEG_INFINITY
            }
            .validate()
            .is_err()
        );
    }
}
