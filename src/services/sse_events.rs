use serde::Serialize;
use tracing::warn;

use crate::{
    dto::{
        competition::rankings_to_dto,
        sse::{MutationEvent, RankingsUpdatedEvent, ServerEvent},
    },
    state::{
        SharedState,
        reconciler::{MutationId, MutationKey, MutationPhase, Resolved},
        view::ViewHandle,
    },
};

const EVENT_RANKINGS_UPDATED: &str = "rankings.updated";
const EVENT_MUTATION_CONFIRMED: &str = "mutation.confirmed";
const EVENT_MUTATION_ROLLED_BACK: &str = "mutation.rolled_back";

/// Broadcast the freshly recomputed leaderboard of a competition.
pub async fn broadcast_rankings(state: &SharedState, handle: &ViewHandle) {
    let rankings = handle.read(|view| view.rankings()).await;
    let payload = RankingsUpdatedEvent {
        competition_id: handle.competition_id(),
        rankings: rankings_to_dto(rankings),
    };
    send_public_event(state, EVENT_RANKINGS_UPDATED, &payload);
}

/// Broadcast the confirmation of a mutation.
pub fn broadcast_confirmed(state: &SharedState, competition_id: i64, resolved: &Resolved) {
    let payload = MutationEvent {
        competition_id,
        mutation_id: resolved.id,
        key: resolved.key.to_string(),
        phase: resolved.phase,
        record: resolved.record.clone(),
    };
    send_public_event(state, EVENT_MUTATION_CONFIRMED, &payload);
}

/// Broadcast that a mutation was reverted.
pub fn broadcast_rolled_back(
    state: &SharedState,
    competition_id: i64,
    mutation_id: MutationId,
    key: &MutationKey,
) {
    let payload = MutationEvent {
        competition_id,
        mutation_id,
        key: key.to_string(),
        phase: MutationPhase::RolledBack,
        record: None,
    };
    send_public_event(state, EVENT_MUTATION_ROLLED_BACK, &payload);
}

fn send_public_event(state: &SharedState, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => state.public_sse().broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize public SSE payload"),
    }
}
