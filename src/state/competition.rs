use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::{Date, OffsetDateTime};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dao::models::{CompetitionEntity, RatingEntity, RestaurantEntity, UserEntity},
    scoring::normalizer::{NormalizedRating, Scores},
};

/// Canonical user identifier, resolved once from the `id`/`pk` pair of the wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identity of a restaurant or rating.
///
/// Records created locally before the backend acknowledged them carry a temporary
/// identity until confirmation replaces it with the persisted key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum RecordId {
    /// Key assigned by the backing service.
    Persisted(i64),
    /// Placeholder assigned while the creation is pending.
    Temporary(Uuid),
}

impl RecordId {
    /// Allocate a fresh temporary identity.
    pub fn temporary() -> Self {
        RecordId::Temporary(Uuid::new_v4())
    }

    /// Persisted key, if the record has been confirmed.
    pub fn persisted(&self) -> Option<i64> {
        match self {
            RecordId::Persisted(id) => Some(*id),
            RecordId::Temporary(_) => None,
        }
    }

    /// Whether the record is still awaiting confirmation.
    pub fn is_temporary(&self) -> bool {
        matches!(self, RecordId::Temporary(_))
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Persisted(id) => id.fmt(f),
            RecordId::Temporary(id) => id.fmt(f),
        }
    }
}

impl FromStr for RecordId {
    type Err = uuid::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if let Ok(id) = value.parse::<i64>() {
            return Ok(RecordId::Persisted(id));
        }
        Uuid::parse_str(value).map(RecordId::Temporary)
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        RecordId::Persisted(value)
    }
}

/// Lifecycle status of a competition. Transitions only move forward.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum CompetitionStatus {
    /// Restaurants are being suggested.
    Planning,
    /// Visits and ratings are under way.
    Active,
    /// Results are frozen.
    Completed,
}

impl CompetitionStatus {
    /// Whether moving from `self` to `next` respects the forward-only ordering.
    pub fn can_advance_to(self, next: CompetitionStatus) -> bool {
        next > self
    }
}

/// A user taking part in a competition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Participant {
    /// Canonical identifier.
    pub id: UserId,
    /// Display name.
    pub username: String,
}

/// Restaurant suggested inside a competition.
#[derive(Debug, Clone, PartialEq)]
pub struct Restaurant {
    /// Identity (temporary until the backend confirms the suggestion).
    pub id: RecordId,
    /// Restaurant name.
    pub name: String,
    /// Postal address.
    pub address: String,
    /// Kind of cuisine served.
    pub cuisine_type: String,
    /// Participant who suggested it, if known.
    pub proposer: Option<Participant>,
    /// Planned visit date.
    pub visit_date: Date,
    /// Optional picture URL.
    pub image: Option<String>,
    /// Creation timestamp.
    pub created_at: OffsetDateTime,
}

/// Rating left by a participant for a restaurant.
#[derive(Debug, Clone, PartialEq)]
pub struct Rating {
    /// Identity (temporary until the backend confirms the submission).
    pub id: RecordId,
    /// Rated restaurant.
    pub restaurant: RecordId,
    /// Author of the rating.
    pub rater: Participant,
    /// The four sub-scores.
    pub scores: Scores,
    /// Rounded mean of the sub-scores.
    pub overall: u8,
    /// Optional free text.
    pub comment: Option<String>,
    /// Creation timestamp.
    pub created_at: OffsetDateTime,
}

impl Rating {
    /// Synthesize the locally predicted rating for a submission.
    ///
    /// A resubmission keeps the identity and creation time of the rating it replaces.
    pub fn predicted(
        restaurant: RecordId,
        rater: Participant,
        normalized: NormalizedRating,
        existing: Option<&Rating>,
        now: OffsetDateTime,
    ) -> Self {
        let (id, created_at) = match existing {
            Some(rating) => (rating.id.clone(), rating.created_at),
            None => (RecordId::temporary(), now),
        };

        Self {
            id,
            restaurant,
            rater,
            scores: normalized.scores,
            overall: normalized.overall,
            comment: normalized.comment,
            created_at,
        }
    }
}

/// In-memory competition aggregate backing a view.
#[derive(Debug, Clone, PartialEq)]
pub struct Competition {
    /// Primary key.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Free text description.
    pub description: String,
    /// User who created the competition.
    pub creator: Participant,
    /// Lifecycle status.
    pub status: CompetitionStatus,
    /// First day of the competition.
    pub start_date: Date,
    /// Last day of the competition.
    pub end_date: Date,
    /// Users who joined, in join order.
    pub participants: Vec<Participant>,
    /// Suggested restaurants, in suggestion order.
    pub restaurants: Vec<Restaurant>,
}

impl Competition {
    /// Whether `user` appears in the participant list.
    pub fn has_participant(&self, user: UserId) -> bool {
        self.participants.iter().any(|participant| participant.id == user)
    }
}

/// Failures raised while normalizing records received from the backing service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IngestError {
    /// Neither the primary identifier nor its alias was present.
    #[error("user `{username}` carries neither `id` nor `pk`")]
    MissingUserId { username: String },
    /// A persisted rating carries a sub-score outside the accepted range.
    #[error("rating {rating_id} has out-of-range scores")]
    InvalidScores { rating_id: i64 },
}

impl TryFrom<UserEntity> for Participant {
    type Error = IngestError;

    fn try_from(value: UserEntity) -> Result<Self, Self::Error> {
        let id = value
            .id
            .or(value.pk)
            .ok_or_else(|| IngestError::MissingUserId {
                username: value.username.clone(),
            })?;

        Ok(Self {
            id: UserId(id),
            username: value.username,
        })
    }
}

impl TryFrom<RatingEntity> for Rating {
    type Error = IngestError;

    fn try_from(value: RatingEntity) -> Result<Self, Self::Error> {
        let scores = Scores::new(
            value.food_score,
            value.service_score,
            value.ambiance_score,
            value.value_score,
        )
        .map_err(|_| IngestError::InvalidScores {
            rating_id: value.id,
        })?;

        Ok(Self {
            id: RecordId::Persisted(value.id),
            restaurant: RecordId::Persisted(value.restaurant),
            rater: value.user.try_into()?,
            scores,
            overall: value.overall_score,
            comment: value.comment,
            created_at: value.created_at,
        })
    }
}

impl TryFrom<RestaurantEntity> for Restaurant {
    type Error = IngestError;

    fn try_from(value: RestaurantEntity) -> Result<Self, Self::Error> {
        Ok(Self {
            id: RecordId::Persisted(value.id),
            name: value.name,
            address: value.address,
            cuisine_type: value.cuisine_type,
            proposer: value.suggested_by.map(Participant::try_from).transpose()?,
            visit_date: value.visit_date,
            image: value.image,
            created_at: value.created_at,
        })
    }
}

impl TryFrom<CompetitionEntity> for Competition {
    type Error = IngestError;

    fn try_from(value: CompetitionEntity) -> Result<Self, Self::Error> {
        Ok(Self {
            id: value.id,
            name: value.name,
            description: value.description,
            creator: value.creator.try_into()?,
            status: value.status,
            start_date: value.start_date,
            end_date: value.end_date,
            participants: value
                .participants
                .into_iter()
                .map(Participant::try_from)
                .collect::<Result<_, _>>()?,
            restaurants: value
                .restaurants
                .into_iter()
                .map(Restaurant::try_from)
                .collect::<Result<_, _>>()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: Option<i64>, pk: Option<i64>) -> UserEntity {
        UserEntity {
            id,
            pk,
            username: "sam".into(),
            email: None,
        }
    }

    #[test]
    fn participant_prefers_primary_id_then_alias() {
        let both: Participant = user(Some(4), Some(9)).try_into().unwrap();
        assert_eq!(both.id, UserId(4));

        let alias_only: Participant = user(None, Some(9)).try_into().unwrap();
        assert_eq!(alias_only.id, UserId(9));
    }

    #[test]
    fn participant_without_identifier_is_rejected() {
        let err = Participant::try_from(user(None, None)).unwrap_err();
        assert_eq!(
            err,
            IngestError::MissingUserId {
                username: "sam".into()
            }
        );
    }

    #[test]
    fn status_only_moves_forward() {
        use CompetitionStatus::*;

        assert!(Planning.can_advance_to(Active));
        assert!(Active.can_advance_to(Completed));
        assert!(Planning.can_advance_to(Completed));
        assert!(!Completed.can_advance_to(Active));
        assert!(!Active.can_advance_to(Planning));
        assert!(!Active.can_advance_to(Active));
    }

    #[test]
    fn record_id_parses_persisted_and_temporary_forms() {
        assert_eq!("42".parse::<RecordId>().unwrap(), RecordId::Persisted(42));

        let temporary = RecordId::temporary();
        let parsed: RecordId = temporary.to_string().parse().unwrap();
        assert_eq!(parsed, temporary);
        assert!(parsed.is_temporary());
        assert!("not-an-id".parse::<RecordId>().is_err());
    }
}
