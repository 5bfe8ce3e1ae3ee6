//! DTO definitions for the live commentary endpoint.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::state::game::CommentaryStyle;

fn default_commentary_intensity() -> u8 {
    3
}

/// Voice used when narrating a moment.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CommentaryStyleDto {
    #[default]
    Documentary,
    Sports,
    Horror,
}

impl From<CommentaryStyleDto> for CommentaryStyle {
    fn from(value: CommentaryStyleDto) -> Self {
        match value {
            CommentaryStyleDto::Documentary => CommentaryStyle::Documentary,
            CommentaryStyleDto::Sports => CommentaryStyle::Sports,
            CommentaryStyleDto::Horror => CommentaryStyle::Horror,
        }
    }
}

impl From<CommentaryStyle> for CommentaryStyleDto {
    fn from(value: CommentaryStyle) -> Self {
        match value {
            CommentaryStyle::Documentary => CommentaryStyleDto::Documentary,
            CommentaryStyle::Sports => CommentaryStyleDto::Sports,
            CommentaryStyle::Horror => CommentaryStyleDto::Horror,
        }
    }
}

/// Payload asking for narration of a game moment.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct CommentaryRequest {
    /// Short description of what just happened.
    #[validate(length(min = 1, max = 240))]
    pub event: String,
    /// How dramatic the moment was, `1..=5`.
    #[serde(default = "default_commentary_intensity")]
    #[validate(range(min = 1, max = 5))]
    pub intensity: u8,
    #[serde(default)]
    pub style: CommentaryStyleDto,
    /// Game to log the line into, when any.
    #[serde(default)]
    pub game_id: Option<Uuid>,
}

/// Query form of the commentary request for GET callers.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CommentaryQuery {
    pub event: String,
    #[serde(default)]
    pub intensity: Option<u8>,
    #[serde(default)]
    pub style: Option<CommentaryStyleDto>,
    #[serde(default)]
    pub game_id: Option<Uuid>,
}

impl From<CommentaryQuery> for CommentaryRequest {
    fn from(query: CommentaryQuery) -> Self {
        Self {
            event: query.event,
            intensity: query.intensity.unwrap_or_else(default_commentary_intensity),
            style: query.style.unwrap_or_default(),
            game_id: query.game_id,
        }
    }
}

/// Terminal payload of a commentary stream, carrying the full line.
#[derive(Debug, Serialize, ToSchema)]
pub struct CommentaryDone {
    pub style: CommentaryStyleDto,
    pub intensity: u8,
    pub text: String,
    /// Whether the line came from the live model or a canned template.
    pub mode: String,
}
