use std::{collections::HashMap, fmt};

use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::state::{
    competition::{CompetitionStatus, Participant, Rating, RecordId, Restaurant, UserId},
    view::CompetitionView,
};

/// Unique identifier of a predicted mutation.
pub type MutationId = Uuid;

/// Identity of the entry a mutation touches. At most one mutation per key is pending.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MutationKey {
    /// Rating of `rater` for `restaurant`.
    Rating {
        /// Rated restaurant.
        restaurant: RecordId,
        /// Author of the rating.
        rater: UserId,
    },
    /// Restaurant under creation, keyed by its temporary identity.
    Restaurant(RecordId),
    /// Membership of a user in the competition.
    Membership(UserId),
    /// Competition status.
    Status,
}

impl fmt::Display for MutationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MutationKey::Rating { restaurant, rater } => {
                write!(f, "rating:{restaurant}:{rater}")
            }
            MutationKey::Restaurant(id) => write!(f, "restaurant:{id}"),
            MutationKey::Membership(user) => write!(f, "membership:{user}"),
            MutationKey::Status => f.write_str("status"),
        }
    }
}

/// Locally predicted change, merged into the view before the backend answers.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// New or replacing rating.
    SubmitRating(Rating),
    /// New restaurant carrying a temporary identity.
    CreateRestaurant(Restaurant),
    /// Participant joining.
    Join(Participant),
    /// Forward status change.
    ChangeStatus(CompetitionStatus),
}

impl Mutation {
    /// Key of the entry this mutation touches.
    pub fn key(&self) -> MutationKey {
        match self {
            Mutation::SubmitRating(rating) => MutationKey::Rating {
                restaurant: rating.restaurant.clone(),
                rater: rating.rater.id,
            },
            Mutation::CreateRestaurant(restaurant) => MutationKey::Restaurant(restaurant.id.clone()),
            Mutation::Join(participant) => MutationKey::Membership(participant.id),
            Mutation::ChangeStatus(_) => MutationKey::Status,
        }
    }
}

/// Authoritative outcome returned by the backend for a mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum Confirmation {
    /// Persisted rating.
    Rating(Rating),
    /// Persisted restaurant.
    Restaurant(Restaurant),
    /// Membership acknowledged.
    Joined,
    /// Persisted status.
    Status(CompetitionStatus),
}

/// Lifecycle tag of a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MutationPhase {
    /// Applied locally, awaiting the backend.
    Predicted,
    /// Replaced by the authoritative record.
    Confirmed,
    /// Reverted after a failure or a discard.
    RolledBack,
}

/// Handle returned for a freshly predicted mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prediction {
    /// Identifier to quote when resolving.
    pub id: MutationId,
    /// Key of the touched entry.
    pub key: MutationKey,
}

/// Final state of a resolved mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    /// Mutation identifier.
    pub id: MutationId,
    /// Key of the touched entry.
    pub key: MutationKey,
    /// Either [`MutationPhase::Confirmed`] or [`MutationPhase::RolledBack`].
    pub phase: MutationPhase,
    /// Persisted identity of the confirmed record, when one was created.
    pub record: Option<RecordId>,
}

/// Errors raised while predicting a mutation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PredictError {
    /// A mutation for the same key has not been resolved yet.
    #[error("a mutation for {0} is already pending")]
    AlreadyPending(MutationKey),
    /// The status change would not move forward.
    #[error("competition cannot move from {from:?} to {to:?}")]
    InvalidTransition {
        /// Current status.
        from: CompetitionStatus,
        /// Requested status.
        to: CompetitionStatus,
    },
    /// The rated restaurant is not part of the view.
    #[error("restaurant {0} is not part of this competition")]
    UnknownRestaurant(RecordId),
}

/// Errors raised while confirming or rolling back a mutation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// Nothing is pending for the key.
    #[error("no mutation pending for {0}")]
    NoPending(MutationKey),
    /// The pending mutation for the key has another identifier.
    #[error("pending mutation is {expected}, got {got}")]
    IdMismatch {
        /// Identifier of the pending mutation.
        expected: MutationId,
        /// Identifier provided by the caller.
        got: MutationId,
    },
    /// The confirmation does not match the kind of the pending mutation.
    #[error("confirmation does not match pending mutation for {0}")]
    KindMismatch(MutationKey),
}

#[derive(Debug, Clone)]
enum Prior {
    Rating(Option<Rating>),
    Restaurant,
    Membership { added: bool },
    Status(CompetitionStatus),
}

#[derive(Debug, Clone)]
struct PendingMutation {
    id: MutationId,
    applied: Mutation,
    prior: Prior,
}

/// Tracks predicted mutations and applies their confirmation or rollback to a view.
#[derive(Debug, Default)]
pub struct Reconciler {
    pending: HashMap<MutationKey, PendingMutation>,
}

impl Reconciler {
    /// Create a reconciler with nothing pending.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a mutation for `key` awaits resolution.
    pub fn is_pending(&self, key: &MutationKey) -> bool {
        self.pending.contains_key(key)
    }

    /// Number of unresolved mutations.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Merge `mutation` into `view` and remember how to undo it.
    pub fn predict(
        &mut self,
        view: &mut CompetitionView,
        mutation: Mutation,
    ) -> Result<Prediction, PredictError> {
        let key = mutation.key();
        if self.pending.contains_key(&key) {
            return Err(PredictError::AlreadyPending(key));
        }

        let prior = match &mutation {
            Mutation::SubmitRating(rating) => {
                if view.restaurant(&rating.restaurant).is_none() {
                    return Err(PredictError::UnknownRestaurant(rating.restaurant.clone()));
                }
                Prior::Rating(view.ratings.upsert(rating.clone()))
            }
            Mutation::CreateRestaurant(restaurant) => {
                view.competition.restaurants.push(restaurant.clone());
                Prior::Restaurant
            }
            Mutation::Join(participant) => {
                let added = !view.competition.has_participant(participant.id);
                if added {
                    view.competition.participants.push(participant.clone());
                }
                Prior::Membership { added }
            }
            Mutation::ChangeStatus(next) => {
                let from = view.competition.status;
                if !from.can_advance_to(*next) {
                    return Err(PredictError::InvalidTransition { from, to: *next });
                }
                view.competition.status = *next;
                Prior::Status(from)
            }
        };

        let id = Uuid::new_v4();
        self.pending.insert(
            key.clone(),
            PendingMutation {
                id,
                applied: mutation,
                prior,
            },
        );

        Ok(Prediction { id, key })
    }

    /// Overwrite the predicted entry with the authoritative record.
    pub fn confirm(
        &mut self,
        view: &mut CompetitionView,
        key: &MutationKey,
        id: MutationId,
        confirmation: Confirmation,
    ) -> Result<Resolved, ResolveError> {
        let pending = self.take(key, id)?;

        let record = match (pending.applied, confirmation) {
            (Mutation::SubmitRating(_), Confirmation::Rating(rating)) => {
                let record = rating.id.clone();
                view.ratings.upsert(rating);
                Some(record)
            }
            (Mutation::CreateRestaurant(predicted), Confirmation::Restaurant(restaurant)) => {
                let record = restaurant.id.clone();
                view.ratings.rekey(&predicted.id, record.clone());
                match view
                    .competition
                    .restaurants
                    .iter_mut()
                    .find(|existing| existing.id == predicted.id)
                {
                    Some(existing) => *existing = restaurant,
                    None => view.competition.restaurants.push(restaurant),
                }
                Some(record)
            }
            (Mutation::Join(_), Confirmation::Joined) => None,
            (Mutation::ChangeStatus(_), Confirmation::Status(status)) => {
                view.competition.status = status;
                None
            }
            (applied, _) => {
                // put it back so the caller can still roll it back
                self.pending.insert(
                    key.clone(),
                    PendingMutation {
                        id: pending.id,
                        applied,
                        prior: pending.prior,
                    },
                );
                return Err(ResolveError::KindMismatch(key.clone()));
            }
        };

        Ok(Resolved {
            id,
            key: key.clone(),
            phase: MutationPhase::Confirmed,
            record,
        })
    }

    /// Revert a predicted mutation, touching only the entry it changed.
    pub fn roll_back(
        &mut self,
        view: &mut CompetitionView,
        key: &MutationKey,
        id: MutationId,
    ) -> Result<Resolved, ResolveError> {
        let pending = self.take(key, id)?;

        match (pending.applied, pending.prior) {
            (Mutation::SubmitRating(applied), Prior::Rating(previous)) => {
                view.ratings.revert(&applied, previous);
            }
            (Mutation::CreateRestaurant(applied), Prior::Restaurant) => {
                view.competition
                    .restaurants
                    .retain(|restaurant| restaurant.id != applied.id);
                view.ratings.forget(&applied.id);
            }
            (Mutation::Join(participant), Prior::Membership { added: true }) => {
                if let Some(position) = view
                    .competition
                    .participants
                    .iter()
                    .rposition(|existing| existing.id == participant.id)
                {
                    view.competition.participants.remove(position);
                }
            }
            (Mutation::ChangeStatus(applied), Prior::Status(from)) => {
                if view.competition.status == applied {
                    view.competition.status = from;
                }
            }
            _ => {}
        }

        Ok(Resolved {
            id,
            key: key.clone(),
            phase: MutationPhase::RolledBack,
            record: None,
        })
    }

    /// Merge the pending ratings of `restaurant` back over a freshly fetched list.
    ///
    /// The fetched entry each one replaces becomes its new prior, so a later rollback
    /// lands on the server state. Returns how many ratings were re-applied.
    pub fn reapply_ratings(&mut self, view: &mut CompetitionView, restaurant: &RecordId) -> usize {
        let mut reapplied = 0;
        for pending in self.pending.values_mut() {
            if let (Mutation::SubmitRating(rating), Prior::Rating(prior)) =
                (&pending.applied, &mut pending.prior)
            {
                if &rating.restaurant == restaurant {
                    *prior = view.ratings.overlay(rating.clone());
                    reapplied += 1;
                }
            }
        }
        reapplied
    }

    fn take(&mut self, key: &MutationKey, id: MutationId) -> Result<PendingMutation, ResolveError> {
        let pending = self
            .pending
            .remove(key)
            .ok_or_else(|| ResolveError::NoPending(key.clone()))?;

        if pending.id != id {
            let expected = pending.id;
            self.pending.insert(key.clone(), pending);
            return Err(ResolveError::IdMismatch { expected, got: id });
        }

        Ok(pending)
    }
}
