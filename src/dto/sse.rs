use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::competition::RankingEntryDto,
    state::{competition::RecordId, reconciler::MutationPhase},
};

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    pub event: Option<String>,
    pub data: String,
}

impl ServerEvent {
    /// Build an event from an already rendered data field.
    pub fn new<E>(event: E, data: String) -> Self
    where
        E: Into<Option<String>>,
    {
        Self {
            event: event.into(),
            data,
        }
    }

    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self::new(event, serde_json::to_string(payload)?))
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast whenever the leaderboard of a competition was recomputed.
pub struct RankingsUpdatedEvent {
    pub competition_id: i64,
    pub rankings: Vec<RankingEntryDto>,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a mutation was confirmed or rolled back.
pub struct MutationEvent {
    pub competition_id: i64,
    pub mutation_id: Uuid,
    pub key: String,
    pub phase: MutationPhase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<RecordId>,
}
