//! DTO definitions for the competition endpoints and their documentation.

use serde::{Deserialize, Serialize};
use time::Date;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        format_date, format_timestamp,
        rating::RatingDto,
        validation::{validate_calendar_date, validate_not_blank},
    },
    scoring::{lifecycle::Lifecycle, ranking::RankingEntry},
    state::{
        competition::{CompetitionStatus, Participant, RecordId},
        reconciler::{MutationPhase, Resolved},
        view::{CompetitionView, Progress, RestaurantSort, RestaurantSummary},
    },
};

/// Query string accepted by the competition overview.
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListingQuery {
    /// Hide restaurants that were already visited and rated.
    #[serde(default)]
    pub upcoming_only: bool,
    /// `default`, `date-asc` or `date-desc`.
    #[serde(default)]
    #[param(inline)]
    pub sort: RestaurantSort,
}

/// Full projection of a competition for the current viewer.
#[derive(Debug, Serialize, ToSchema)]
pub struct CompetitionViewDto {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub creator: Participant,
    pub status: CompetitionStatus,
    pub start_date: String,
    pub end_date: String,
    pub participants: Vec<Participant>,
    pub is_participant: bool,
    pub is_creator: bool,
    pub restaurants: Vec<RestaurantDto>,
    pub progress: ProgressDto,
    pub rankings: Vec<RankingEntryDto>,
    /// Mutations still waiting for the backend.
    pub pending_mutations: usize,
}

impl CompetitionViewDto {
    /// Project `view` as seen on `today`.
    pub fn project(
        view: &CompetitionView,
        today: Date,
        query: ListingQuery,
        pending_mutations: usize,
    ) -> Self {
        let competition = &view.competition;
        Self {
            id: competition.id,
            name: competition.name.clone(),
            description: competition.description.clone(),
            creator: competition.creator.clone(),
            status: competition.status,
            start_date: format_date(competition.start_date),
            end_date: format_date(competition.end_date),
            participants: competition.participants.clone(),
            is_participant: view.viewer_is_participant(),
            is_creator: view.viewer_is_creator(),
            restaurants: view
                .restaurants(today, query.upcoming_only, query.sort)
                .into_iter()
                .map(RestaurantDto::from)
                .collect(),
            progress: view.progress(today).into(),
            rankings: rankings_to_dto(view.rankings()),
            pending_mutations,
        }
    }
}

/// Restaurant annotated with its lifecycle and scores.
#[derive(Debug, Serialize, ToSchema)]
pub struct RestaurantDto {
    pub id: RecordId,
    pub name: String,
    pub address: String,
    pub cuisine_type: String,
    pub proposer: Option<Participant>,
    pub visit_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub created_at: String,
    pub lifecycle: Lifecycle,
    /// Average overall score, `null` while unrated.
    pub average: Option<f64>,
    pub rating_count: usize,
    pub own_rating: Option<RatingDto>,
    pub can_rate: bool,
    /// `true` until the backend acknowledged the suggestion.
    pub pending: bool,
}

impl From<RestaurantSummary> for RestaurantDto {
    fn from(value: RestaurantSummary) -> Self {
        let restaurant = value.restaurant;
        Self {
            pending: restaurant.id.is_temporary(),
            id: restaurant.id,
            name: restaurant.name,
            address: restaurant.address,
            cuisine_type: restaurant.cuisine_type,
            proposer: restaurant.proposer,
            visit_date: format_date(restaurant.visit_date),
            image: restaurant.image,
            created_at: format_timestamp(restaurant.created_at),
            lifecycle: value.lifecycle,
            average: value.average,
            rating_count: value.rating_count,
            own_rating: value.own_rating.map(RatingDto::from),
            can_rate: value.can_rate,
        }
    }
}

/// Visit progress of a competition.
#[derive(Debug, Serialize, ToSchema)]
pub struct ProgressDto {
    pub visited: usize,
    pub total: usize,
    pub percent: u8,
}

impl From<Progress> for ProgressDto {
    fn from(value: Progress) -> Self {
        Self {
            visited: value.visited,
            total: value.total,
            percent: value.percent,
        }
    }
}

/// Leaderboard line.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RankingEntryDto {
    /// 1-based position in the leaderboard.
    pub position: usize,
    pub participant: Participant,
    /// Mean of the averages of the participant's rated restaurants, one decimal.
    pub score: f64,
    pub rated_restaurants: usize,
    pub not_yet_rated: bool,
}

/// Number leaderboard entries in their computed order.
pub fn rankings_to_dto(entries: Vec<RankingEntry>) -> Vec<RankingEntryDto> {
    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| RankingEntryDto {
            position: index + 1,
            not_yet_rated: entry.not_yet_rated(),
            participant: entry.participant,
            score: entry.score,
            rated_restaurants: entry.rated_restaurants,
        })
        .collect()
}

/// Payload used to suggest a restaurant.
#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct CreateRestaurantRequest {
    #[validate(length(min = 3, max = 100))]
    pub name: String,
    #[validate(length(min = 5))]
    pub address: String,
    #[validate(custom(function = "validate_not_blank"))]
    pub cuisine_type: String,
    /// `YYYY-MM-DD`.
    #[validate(custom(function = "validate_calendar_date"))]
    pub visit_date: String,
}

impl CreateRestaurantRequest {
    /// Copy of the request with surrounding whitespace removed from every field.
    pub fn trimmed(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            address: self.address.trim().to_string(),
            cuisine_type: self.cuisine_type.trim().to_string(),
            visit_date: self.visit_date.trim().to_string(),
        }
    }
}

/// Outcome of a mutation once the backend answered.
#[derive(Debug, Serialize, ToSchema)]
pub struct MutationResponse {
    pub mutation_id: Uuid,
    /// Entry touched by the mutation, e.g. `rating:12:3`.
    pub key: String,
    pub phase: MutationPhase,
    /// Persisted identity of the created or replaced record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<RecordId>,
}

impl From<Resolved> for MutationResponse {
    fn from(value: Resolved) -> Self {
        Self {
            mutation_id: value.id,
            key: value.key.to_string(),
            phase: value.phase,
            record: value.record,
        }
    }
}
