//! Operations on a loaded competition: initial load, projections and optimistic mutations.
//!
//! Every mutation is predicted on the view first, then sent to the backend from a
//! spawned task so that a cancelled request still reconciles its prediction.

use std::{future::Future, sync::Arc};

use futures::future::join_all;
use tracing::{debug, info, warn};
use validator::Validate;

use crate::{
    dao::{
        competition_store::CompetitionStore,
        models::{NewRestaurantEntity, RatingSubmissionEntity, calendar_date},
    },
    dto::{
        competition::{
            CompetitionViewDto, CreateRestaurantRequest, ListingQuery, MutationResponse,
            RankingEntryDto, RestaurantDto, rankings_to_dto,
        },
        rating::RatingRequest,
    },
    error::ServiceError,
    scoring::{lifecycle, normalizer},
    services::sse_events,
    state::{
        SharedState,
        competition::{
            Competition, CompetitionStatus, Participant, Rating, RecordId, Restaurant,
        },
        reconciler::{Confirmation, Mutation, MutationKey, Resolved},
        view::{CompetitionView, PendingMutation, ViewHandle},
    },
};

async fn require_store(state: &SharedState) -> Result<Arc<dyn CompetitionStore>, ServiceError> {
    state.store().await.ok_or(ServiceError::Degraded)
}

fn require_view(state: &SharedState, competition_id: i64) -> Result<ViewHandle, ServiceError> {
    state
        .view(competition_id)
        .ok_or_else(|| ServiceError::NotFound(format!("competition {competition_id} is not loaded")))
}

/// Fetch a competition with its restaurants and every rating list, then install its view.
///
/// Restaurants are fetched separately when the competition payload omits them.
pub async fn load_competition(
    state: &SharedState,
    competition_id: i64,
) -> Result<CompetitionViewDto, ServiceError> {
    let store = require_store(state).await?;

    let (user, competition) = tokio::try_join!(
        store.current_user(),
        store.find_competition(competition_id)
    )?;
    let mut entity = competition
        .ok_or_else(|| ServiceError::NotFound(format!("competition {competition_id}")))?;
    if entity.restaurants.is_empty() {
        entity.restaurants = store.list_restaurants(competition_id).await?;
    }

    let viewer = Participant::try_from(user)?;
    let competition = Competition::try_from(entity)?;

    let fetches = competition
        .restaurants
        .iter()
        .filter_map(|restaurant| restaurant.id.persisted())
        .map(|restaurant_id| {
            let store = store.clone();
            async move {
                let entities = store.list_ratings(restaurant_id).await?;
                let ratings = entities
                    .into_iter()
                    .map(Rating::try_from)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok::<_, ServiceError>((RecordId::Persisted(restaurant_id), ratings))
            }
        });
    let rating_lists = join_all(fetches)
        .await
        .into_iter()
        .collect::<Result<Vec<_>, _>>()?;

    let mut view = CompetitionView::new(competition, viewer);
    for (restaurant, ratings) in rating_lists {
        let ticket = view.ratings.begin_fetch(&restaurant);
        if let Err(stale) = view.ratings.complete_fetch(ticket, ratings) {
            debug!(competition_id, %stale, "discarding stale rating list");
        }
    }

    let restaurants = view.competition.restaurants.len();
    let handle = state.install_view(view);
    info!(competition_id, restaurants, "competition loaded");

    sse_events::broadcast_rankings(state, &handle).await;
    Ok(project(&handle, ListingQuery::default()).await)
}

/// Projection of a loaded competition for the current viewer.
pub async fn overview(
    state: &SharedState,
    competition_id: i64,
    query: ListingQuery,
) -> Result<CompetitionViewDto, ServiceError> {
    let handle = require_view(state, competition_id)?;
    Ok(project(&handle, query).await)
}

/// Current leaderboard of a loaded competition.
pub async fn rankings(
    state: &SharedState,
    competition_id: i64,
) -> Result<Vec<RankingEntryDto>, ServiceError> {
    let handle = require_view(state, competition_id)?;
    let entries = handle.read(|view| view.rankings()).await;
    Ok(rankings_to_dto(entries))
}

/// Submit or replace the viewer's rating of a restaurant.
///
/// The rating is validated before anything else; it then appears in the view
/// right away and is confirmed or reverted once the backend answered. A confirmed
/// rating triggers a refresh of the restaurant's rating list.
pub async fn submit_rating(
    state: &SharedState,
    competition_id: i64,
    restaurant_id: i64,
    request: RatingRequest,
) -> Result<MutationResponse, ServiceError> {
    let normalized = normalizer::normalize(request.into())?;
    let handle = require_view(state, competition_id)?;
    let store = require_store(state).await?;

    let restaurant = RecordId::Persisted(restaurant_id);
    let rater = handle.read(|view| view.viewer.id).await;
    let key = MutationKey::Rating {
        restaurant: restaurant.clone(),
        rater,
    };

    let pending = handle
        .begin(key, |view, clock| -> Result<_, ServiceError> {
            let target = view
                .restaurant(&restaurant)
                .ok_or_else(|| ServiceError::NotFound(format!("restaurant {restaurant_id}")))?;
            lifecycle::ensure_ratable(view.competition.status, target.visit_date, clock.today())?;

            let existing = view.ratings.own_rating(&restaurant, rater);
            let submission = RatingSubmissionEntity {
                restaurant: restaurant_id,
                food_score: normalized.scores.food,
                service_score: normalized.scores.service,
                ambiance_score: normalized.scores.ambiance,
                value_score: normalized.scores.value,
                comment: normalized.comment.clone(),
                replaces: existing.and_then(|rating| rating.id.persisted()),
            };
            let predicted = Rating::predicted(
                restaurant.clone(),
                view.viewer.clone(),
                normalized,
                existing,
                clock.now(),
            );
            Ok((Mutation::SubmitRating(predicted), submission))
        })
        .await?;

    let work_store = store.clone();
    let resolved = resolve(state, &handle, pending, move |submission| async move {
        let entity = work_store.submit_rating(submission).await?;
        Ok::<_, ServiceError>(Confirmation::Rating(Rating::try_from(entity)?))
    })
    .await?;

    if let Err(err) = fetch_ratings(state, &handle, store.as_ref(), restaurant_id).await {
        warn!(
            competition_id,
            restaurant_id,
            error = %err,
            "failed to refresh ratings after confirmation"
        );
    }

    Ok(resolved.into())
}

/// Re-fetch the rating list of a restaurant through the sequenced fetch path.
pub async fn refresh_ratings(
    state: &SharedState,
    competition_id: i64,
    restaurant_id: i64,
) -> Result<RestaurantDto, ServiceError> {
    let handle = require_view(state, competition_id)?;
    let store = require_store(state).await?;
    let restaurant = RecordId::Persisted(restaurant_id);

    if handle.read(|view| view.restaurant(&restaurant).is_none()).await {
        return Err(ServiceError::NotFound(format!("restaurant {restaurant_id}")));
    }

    fetch_ratings(state, &handle, store.as_ref(), restaurant_id).await?;

    let today = handle.today();
    handle
        .read(|view| {
            view.restaurant(&restaurant)
                .map(|target| RestaurantDto::from(view.summarize(target, today)))
        })
        .await
        .ok_or_else(|| ServiceError::NotFound(format!("restaurant {restaurant_id}")))
}

/// Join the competition as the current viewer. Joining twice is harmless.
pub async fn join(
    state: &SharedState,
    competition_id: i64,
) -> Result<MutationResponse, ServiceError> {
    let handle = require_view(state, competition_id)?;
    let store = require_store(state).await?;
    let viewer = handle.read(|view| view.viewer.clone()).await;

    let pending = handle
        .begin(MutationKey::Membership(viewer.id), |_, _| {
            Ok::<_, ServiceError>((Mutation::Join(viewer), ()))
        })
        .await?;

    let resolved = resolve(state, &handle, pending, move |()| async move {
        store.join_competition(competition_id).await?;
        Ok::<_, ServiceError>(Confirmation::Joined)
    })
    .await?;

    Ok(resolved.into())
}

/// Close the competition. Only its creator may do so.
pub async fn finish(
    state: &SharedState,
    competition_id: i64,
) -> Result<MutationResponse, ServiceError> {
    let handle = require_view(state, competition_id)?;
    let store = require_store(state).await?;

    let pending = handle
        .begin(MutationKey::Status, |view, _| -> Result<_, ServiceError> {
            if !view.viewer_is_creator() {
                return Err(ServiceError::Forbidden(
                    "only the creator can finish the competition".into(),
                ));
            }
            Ok((Mutation::ChangeStatus(CompetitionStatus::Completed), ()))
        })
        .await?;

    let resolved = resolve(state, &handle, pending, move |()| async move {
        let entity = store
            .set_competition_status(competition_id, CompetitionStatus::Completed)
            .await?;
        Ok::<_, ServiceError>(Confirmation::Status(entity.status))
    })
    .await?;

    info!(competition_id, "competition finished");
    Ok(resolved.into())
}

/// Suggest a restaurant. It is listed under a temporary identity until the backend
/// assigns its key.
pub async fn create_restaurant(
    state: &SharedState,
    competition_id: i64,
    request: CreateRestaurantRequest,
) -> Result<MutationResponse, ServiceError> {
    let request = request.trimmed();
    request.validate()?;
    let visit_date = calendar_date::parse(&request.visit_date)
        .map_err(|err| ServiceError::InvalidInput(format!("visit_date: {err}")))?;
    let handle = require_view(state, competition_id)?;
    let store = require_store(state).await?;

    let id = RecordId::temporary();
    let pending = handle
        .begin(MutationKey::Restaurant(id.clone()), |view, clock| -> Result<_, ServiceError> {
            if !view.viewer_is_participant() {
                return Err(ServiceError::Forbidden(
                    "only participants can suggest restaurants".into(),
                ));
            }
            if view.competition.status == CompetitionStatus::Completed {
                return Err(ServiceError::InvalidState(
                    "competition is completed".into(),
                ));
            }

            let CreateRestaurantRequest {
                name,
                address,
                cuisine_type,
                ..
            } = request;
            let entity = NewRestaurantEntity {
                competition: competition_id,
                name: name.clone(),
                address: address.clone(),
                cuisine_type: cuisine_type.clone(),
                visit_date,
            };
            let predicted = Restaurant {
                id,
                name,
                address,
                cuisine_type,
                proposer: Some(view.viewer.clone()),
                visit_date,
                image: None,
                created_at: clock.now(),
            };
            Ok((Mutation::CreateRestaurant(predicted), entity))
        })
        .await?;

    let resolved = resolve(state, &handle, pending, move |entity| async move {
        let created = store.create_restaurant(entity).await?;
        Ok::<_, ServiceError>(Confirmation::Restaurant(Restaurant::try_from(created)?))
    })
    .await?;

    Ok(resolved.into())
}

async fn project(handle: &ViewHandle, query: ListingQuery) -> CompetitionViewDto {
    let pending = handle.pending_mutations().await;
    let today = handle.today();
    handle
        .read(|view| CompetitionViewDto::project(view, today, query, pending))
        .await
}

/// Submit `pending` from a detached task and announce its outcome.
async fn resolve<R, F, Fut>(
    state: &SharedState,
    handle: &ViewHandle,
    pending: PendingMutation<R>,
    work: F,
) -> Result<Resolved, ServiceError>
where
    R: Send + 'static,
    F: FnOnce(R) -> Fut + Send + 'static,
    Fut: Future<Output = Result<Confirmation, ServiceError>> + Send + 'static,
{
    let state = state.clone();
    let handle = handle.clone();
    let competition_id = handle.competition_id();
    let mutation_id = pending.id();
    let key = pending.key().clone();

    let task = tokio::spawn(async move {
        let result = pending.submit(work).await;
        match &result {
            Ok(resolved) => sse_events::broadcast_confirmed(&state, competition_id, resolved),
            Err(_) => sse_events::broadcast_rolled_back(&state, competition_id, mutation_id, &key),
        }
        sse_events::broadcast_rankings(&state, &handle).await;
        result
    });

    task.await
        .map_err(|err| ServiceError::Transport(format!("mutation task failed: {err}")))?
}

/// Fetch the rating list of a restaurant, discarding it when a newer list was applied meanwhile.
async fn fetch_ratings(
    state: &SharedState,
    handle: &ViewHandle,
    store: &dyn CompetitionStore,
    restaurant_id: i64,
) -> Result<(), ServiceError> {
    let restaurant = RecordId::Persisted(restaurant_id);
    let ticket = handle.begin_fetch(&restaurant).await;
    let entities = store.list_ratings(restaurant_id).await?;
    let ratings = entities
        .into_iter()
        .map(Rating::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    match handle.complete_fetch(ticket, ratings).await {
        Ok(()) => sse_events::broadcast_rankings(state, handle).await,
        Err(stale) => debug!(
            competition_id = handle.competition_id(),
            %stale,
            "discarding stale rating list"
        ),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use time::{
        Date, OffsetDateTime,
        macros::{date, datetime},
    };

    use super::*;
    use crate::{
        dao::{
            competition_store::memory::{MemoryCompetitionStore, Operation},
            models::{CompetitionEntity, RatingEntity, RestaurantEntity, UserEntity},
        },
        state::{AppState, clock::FixedClock, competition::UserId, reconciler::MutationPhase},
    };

    const TODAY: Date = date!(2025 - 03 - 10);
    const CREATED: OffsetDateTime = datetime!(2025 - 01 - 05 12:00 UTC);

    fn user(id: i64, name: &str) -> UserEntity {
        UserEntity {
            id: Some(id),
            pk: None,
            username: name.into(),
            email: None,
        }
    }

    fn restaurant(id: i64, proposer: i64, visit_date: Date) -> RestaurantEntity {
        RestaurantEntity {
            id,
            name: format!("Restaurant {id}"),
            address: "1 Main Street".into(),
            cuisine_type: "bistro".into(),
            suggested_by: Some(user(proposer, if proposer == 1 { "ana" } else { "ben" })),
            visit_date,
            image: None,
            average_rating: 0.0,
            created_at: CREATED,
        }
    }

    fn rating(id: i64, restaurant: i64, rater: UserEntity, score: u8) -> RatingEntity {
        RatingEntity {
            id,
            restaurant,
            user: rater,
            food_score: score,
            service_score: score,
            ambiance_score: score,
            value_score: score,
            comment: None,
            overall_score: score,
            created_at: CREATED,
        }
    }

    // Competition 7, created by ana (1), joined by ana and ben (2).
    // Restaurant 10 (ana) was visited, restaurant 11 (ben) is upcoming.
    // Requests are made on behalf of ben.
    fn seeded_store() -> MemoryCompetitionStore {
        let store = MemoryCompetitionStore::new(user(2, "ben"));
        store.insert_competition(CompetitionEntity {
            id: 7,
            name: "Spring tour".into(),
            description: String::new(),
            creator: user(1, "ana"),
            status: CompetitionStatus::Active,
            start_date: date!(2025 - 03 - 01),
            end_date: date!(2025 - 04 - 30),
            participants: vec![user(1, "ana"), user(2, "ben")],
            restaurants: vec![
                restaurant(10, 1, date!(2025 - 03 - 01)),
                restaurant(11, 2, date!(2025 - 03 - 20)),
            ],
        });
        store.insert_rating(rating(20, 10, user(1, "ana"), 8));
        store
    }

    async fn loaded(store: &MemoryCompetitionStore) -> SharedState {
        let state = AppState::with_settings(
            Arc::new(FixedClock::on(TODAY)),
            Some(Duration::from_secs(2)),
            16,
        );
        state.install_store(Arc::new(store.clone())).await;
        load_competition(&state, 7).await.unwrap();
        state
    }

    fn scores(value: i64) -> RatingRequest {
        RatingRequest {
            food_score: Some(value),
            service_score: Some(value),
            ambiance_score: Some(value),
            value_score: Some(value),
            comment: None,
        }
    }

    #[tokio::test]
    async fn load_builds_projection_from_backend() {
        let store = seeded_store();
        let state = loaded(&store).await;

        let view = overview(&state, 7, ListingQuery::default()).await.unwrap();
        assert!(view.is_participant);
        assert!(!view.is_creator);
        assert_eq!(view.restaurants.len(), 2);
        assert_eq!(view.restaurants[0].average, Some(8.0));
        assert_eq!(view.progress.visited, 1);
        assert_eq!(view.progress.percent, 50);
        assert_eq!(view.rankings[0].participant.id, UserId(1));
        assert!(view.rankings[1].not_yet_rated);
    }

    #[tokio::test]
    async fn load_fails_in_degraded_mode() {
        let state = AppState::with_settings(Arc::new(FixedClock::on(TODAY)), None, 16);
        let err = load_competition(&state, 7).await.unwrap_err();
        assert!(matches!(err, ServiceError::Degraded));
    }

    #[tokio::test]
    async fn confirmed_rating_updates_average_and_rankings() {
        let store = seeded_store();
        let state = loaded(&store).await;
        let mut events = state.public_sse().subscribe();

        let response = submit_rating(&state, 7, 10, scores(6)).await.unwrap();
        assert_eq!(response.phase, MutationPhase::Confirmed);
        assert!(matches!(response.record, Some(RecordId::Persisted(_))));

        let ranking = rankings(&state, 7).await.unwrap();
        assert_eq!(ranking[0].participant.id, UserId(1));
        assert_eq!(ranking[0].score, 7.0);
        assert_eq!(store.persisted_ratings(10).len(), 2);

        let first = events.recv().await.unwrap();
        assert_eq!(first.event.as_deref(), Some("mutation.confirmed"));
    }

    #[tokio::test]
    async fn resubmission_replaces_previous_rating() {
        let store = seeded_store();
        let state = loaded(&store).await;

        submit_rating(&state, 7, 10, scores(6)).await.unwrap();
        submit_rating(&state, 7, 10, scores(10)).await.unwrap();

        let view = overview(&state, 7, ListingQuery::default()).await.unwrap();
        assert_eq!(view.restaurants[0].rating_count, 2);
        assert_eq!(view.restaurants[0].average, Some(9.0));
        assert_eq!(
            view.restaurants[0].own_rating.as_ref().unwrap().overall_score,
            10
        );
        assert_eq!(store.persisted_ratings(10).len(), 2);
    }

    #[tokio::test]
    async fn failed_rating_is_rolled_back() {
        let store = seeded_store();
        let state = loaded(&store).await;
        let before = overview(&state, 7, ListingQuery::default()).await.unwrap();

        store.fail(Operation::SubmitRating);
        let err = submit_rating(&state, 7, 10, scores(2)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Unavailable(_)));

        let after = overview(&state, 7, ListingQuery::default()).await.unwrap();
        assert_eq!(after.restaurants[0].average, before.restaurants[0].average);
        assert!(after.restaurants[0].own_rating.is_none());
        assert_eq!(after.pending_mutations, 0);
    }

    #[tokio::test]
    async fn invalid_or_premature_ratings_never_reach_the_backend() {
        let store = seeded_store();
        let state = loaded(&store).await;

        let mut missing = scores(7);
        missing.value_score = None;
        let err = submit_rating(&state, 7, 10, missing).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));

        let err = submit_rating(&state, 7, 11, scores(7)).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotRatable(_)));

        let err = submit_rating(&state, 7, 99, scores(7)).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        assert!(store.persisted_ratings(11).is_empty());
        assert_eq!(store.persisted_ratings(10).len(), 1);
    }

    #[tokio::test]
    async fn refresh_picks_up_ratings_left_elsewhere() {
        let store = seeded_store();
        let state = loaded(&store).await;
        store.insert_rating(rating(21, 10, user(3, "cleo"), 4));

        let summary = refresh_ratings(&state, 7, 10).await.unwrap();
        assert_eq!(summary.rating_count, 2);
        assert_eq!(summary.average, Some(6.0));
    }

    #[tokio::test]
    async fn restaurant_creation_is_rekeyed_on_confirmation() {
        let store = seeded_store();
        let state = loaded(&store).await;

        let request = CreateRestaurantRequest {
            name: "  Le Comptoir ".into(),
            address: "3 quai Ouest".into(),
            cuisine_type: "french".into(),
            visit_date: "2025-04-02".into(),
        };
        let response = create_restaurant(&state, 7, request).await.unwrap();
        let Some(RecordId::Persisted(id)) = response.record else {
            panic!("expected a persisted id, got {:?}", response.record);
        };

        let view = overview(&state, 7, ListingQuery::default()).await.unwrap();
        let created = view.restaurants.last().unwrap();
        assert_eq!(created.id, RecordId::Persisted(id));
        assert_eq!(created.name, "Le Comptoir");
        assert!(!created.pending);
        assert_eq!(created.proposer.as_ref().unwrap().id, UserId(2));
    }

    #[tokio::test]
    async fn failed_restaurant_creation_disappears() {
        let store = seeded_store();
        let state = loaded(&store).await;
        store.fail(Operation::CreateRestaurant);

        let request = CreateRestaurantRequest {
            name: "Le Comptoir".into(),
            address: "3 quai Ouest".into(),
            cuisine_type: "french".into(),
            visit_date: "2025-04-02".into(),
        };
        assert!(create_restaurant(&state, 7, request).await.is_err());

        let view = overview(&state, 7, ListingQuery::default()).await.unwrap();
        assert_eq!(view.restaurants.len(), 2);
    }

    #[tokio::test]
    async fn padded_short_name_is_rejected() {
        let store = seeded_store();
        let state = loaded(&store).await;

        let request = CreateRestaurantRequest {
            name: "  ab  ".into(),
            address: "3 quai Ouest".into(),
            cuisine_type: "french".into(),
            visit_date: "2025-04-02".into(),
        };
        let err = create_restaurant(&state, 7, request).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));

        let view = overview(&state, 7, ListingQuery::default()).await.unwrap();
        assert_eq!(view.restaurants.len(), 2);
    }

    #[tokio::test]
    async fn join_is_rolled_back_on_failure_and_idempotent_on_success() {
        let store = seeded_store();
        store.switch_user(user(3, "cleo"));
        let state = loaded(&store).await;

        store.fail(Operation::JoinCompetition);
        assert!(join(&state, 7).await.is_err());
        let view = overview(&state, 7, ListingQuery::default()).await.unwrap();
        assert!(!view.is_participant);
        assert_eq!(view.participants.len(), 2);

        store.recover(Operation::JoinCompetition);
        join(&state, 7).await.unwrap();
        join(&state, 7).await.unwrap();
        let view = overview(&state, 7, ListingQuery::default()).await.unwrap();
        assert!(view.is_participant);
        assert_eq!(view.participants.len(), 3);
    }

    #[tokio::test]
    async fn only_the_creator_can_finish() {
        let store = seeded_store();
        let state = loaded(&store).await;

        let err = finish(&state, 7).await.unwrap_err();
        assert!(matches!(err, ServiceError::Forbidden(_)));

        store.switch_user(user(1, "ana"));
        let state = loaded(&store).await;
        finish(&state, 7).await.unwrap();
        let view = overview(&state, 7, ListingQuery::default()).await.unwrap();
        assert_eq!(view.status, CompetitionStatus::Completed);
        assert!(view.restaurants.iter().all(|restaurant| !restaurant.can_rate));

        let err = finish(&state, 7).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[tokio::test]
    async fn failed_finish_restores_status() {
        let store = seeded_store();
        store.switch_user(user(1, "ana"));
        let state = loaded(&store).await;
        store.fail(Operation::SetCompetitionStatus);

        assert!(finish(&state, 7).await.is_err());
        let view = overview(&state, 7, ListingQuery::default()).await.unwrap();
        assert_eq!(view.status, CompetitionStatus::Active);
    }

    #[tokio::test]
    async fn cancelled_request_still_reconciles() {
        let store = seeded_store();
        let state = loaded(&store).await;
        store.set_latency(Some(Duration::from_millis(50)));

        let request = tokio::spawn({
            let state = state.clone();
            async move { submit_rating(&state, 7, 10, scores(6)).await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        request.abort();

        tokio::time::sleep(Duration::from_millis(150)).await;
        let handle = state.view(7).unwrap();
        assert_eq!(handle.pending_mutations().await, 0);
        assert_eq!(
            handle
                .read(|view| view.ratings.average(&RecordId::Persisted(10)))
                .await,
            Some(7.0)
        );
    }
}
