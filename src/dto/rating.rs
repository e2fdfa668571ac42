use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    dto::format_timestamp,
    scoring::normalizer::RatingDraft,
    state::competition::{Participant, Rating, RecordId},
};

/// Rating submitted by the caller. Missing scores are reported, not defaulted.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct RatingRequest {
    /// Food quality, 1 to 10.
    #[serde(default)]
    pub food_score: Option<i64>,
    /// Service, 1 to 10.
    #[serde(default)]
    pub service_score: Option<i64>,
    /// Ambiance, 1 to 10.
    #[serde(default)]
    pub ambiance_score: Option<i64>,
    /// Value for money, 1 to 10.
    #[serde(default)]
    pub value_score: Option<i64>,
    /// Optional free text, at most 1000 characters.
    #[serde(default)]
    pub comment: Option<String>,
}

impl From<RatingRequest> for RatingDraft {
    fn from(value: RatingRequest) -> Self {
        Self {
            food: value.food_score,
            service: value.service_score,
            ambiance: value.ambiance_score,
            value: value.value_score,
            comment: value.comment,
        }
    }
}

/// Rating as exposed to clients.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RatingDto {
    pub id: RecordId,
    pub restaurant: RecordId,
    pub rater: Participant,
    pub food_score: u8,
    pub service_score: u8,
    pub ambiance_score: u8,
    pub value_score: u8,
    pub overall_score: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
    /// `true` while the backend has not acknowledged the rating.
    pub pending: bool,
}

impl From<Rating> for RatingDto {
    fn from(value: Rating) -> Self {
        Self {
            pending: value.id.is_temporary(),
            id: value.id,
            restaurant: value.restaurant,
            rater: value.rater,
            food_score: value.scores.food,
            service_score: value.scores.service,
            ambiance_score: value.scores.ambiance,
            value_score: value.scores.value,
            overall_score: value.overall,
            comment: value.comment,
            created_at: format_timestamp(value.created_at),
        }
    }
}
