use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};

use crate::{
    dto::{
        competition::{
            CompetitionViewDto, CreateRestaurantRequest, ListingQuery, MutationResponse,
            RankingEntryDto, RestaurantDto,
        },
        rating::RatingRequest,
    },
    error::AppError,
    services::competition_service,
    state::SharedState,
};

/// Competition endpoints: loading, projections and optimistic mutations.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/competitions/{id}", get(get_competition))
        .route("/competitions/{id}/load", post(load_competition))
        .route("/competitions/{id}/rankings", get(get_rankings))
        .route("/competitions/{id}/join", post(join_competition))
        .route("/competitions/{id}/finish", post(finish_competition))
        .route("/competitions/{id}/restaurants", post(create_restaurant))
        .route(
            "/competitions/{id}/restaurants/{restaurant_id}/ratings",
            post(submit_rating),
        )
        .route(
            "/competitions/{id}/restaurants/{restaurant_id}/refresh",
            post(refresh_ratings),
        )
}

/// Fetch a competition from the backend and (re)build its view.
#[utoipa::path(
    post,
    path = "/competitions/{id}/load",
    tag = "competitions",
    params(("id" = i64, Path, description = "Identifier of the competition to load")),
    responses(
        (status = 200, description = "Competition loaded", body = CompetitionViewDto),
        (status = 404, description = "Unknown competition"),
        (status = 503, description = "No storage backend available")
    )
)]
pub async fn load_competition(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<CompetitionViewDto>, AppError> {
    Ok(Json(competition_service::load_competition(&state, id).await?))
}

/// Project a loaded competition for the current viewer.
#[utoipa::path(
    get,
    path = "/competitions/{id}",
    tag = "competitions",
    params(("id" = i64, Path, description = "Identifier of a loaded competition"), ListingQuery),
    responses(
        (status = 200, description = "Competition view", body = CompetitionViewDto),
        (status = 404, description = "Competition not loaded")
    )
)]
pub async fn get_competition(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Query(query): Query<ListingQuery>,
) -> Result<Json<CompetitionViewDto>, AppError> {
    Ok(Json(competition_service::overview(&state, id, query).await?))
}

/// Current leaderboard.
#[utoipa::path(
    get,
    path = "/competitions/{id}/rankings",
    tag = "competitions",
    params(("id" = i64, Path, description = "Identifier of a loaded competition")),
    responses((status = 200, description = "Leaderboard", body = [RankingEntryDto]))
)]
pub async fn get_rankings(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<RankingEntryDto>>, AppError> {
    Ok(Json(competition_service::rankings(&state, id).await?))
}

/// Join the competition as the current user.
#[utoipa::path(
    post,
    path = "/competitions/{id}/join",
    tag = "competitions",
    params(("id" = i64, Path, description = "Identifier of a loaded competition")),
    responses(
        (status = 200, description = "Membership confirmed", body = MutationResponse),
        (status = 502, description = "Backend failure, membership rolled back")
    )
)]
pub async fn join_competition(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<MutationResponse>, AppError> {
    Ok(Json(competition_service::join(&state, id).await?))
}

/// Close the competition (creator only).
#[utoipa::path(
    post,
    path = "/competitions/{id}/finish",
    tag = "competitions",
    params(("id" = i64, Path, description = "Identifier of a loaded competition")),
    responses(
        (status = 200, description = "Competition completed", body = MutationResponse),
        (status = 403, description = "Caller is not the creator"),
        (status = 409, description = "Competition already completed")
    )
)]
pub async fn finish_competition(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> Result<Json<MutationResponse>, AppError> {
    Ok(Json(competition_service::finish(&state, id).await?))
}

/// Suggest a new restaurant.
#[utoipa::path(
    post,
    path = "/competitions/{id}/restaurants",
    tag = "competitions",
    params(("id" = i64, Path, description = "Identifier of a loaded competition")),
    request_body = CreateRestaurantRequest,
    responses(
        (status = 200, description = "Restaurant created", body = MutationResponse),
        (status = 400, description = "Invalid restaurant")
    )
)]
pub async fn create_restaurant(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
    Json(payload): Json<CreateRestaurantRequest>,
) -> Result<Json<MutationResponse>, AppError> {
    Ok(Json(
        competition_service::create_restaurant(&state, id, payload).await?,
    ))
}

/// Submit or replace the current user's rating of a restaurant.
#[utoipa::path(
    post,
    path = "/competitions/{id}/restaurants/{restaurant_id}/ratings",
    tag = "ratings",
    params(
        ("id" = i64, Path, description = "Identifier of a loaded competition"),
        ("restaurant_id" = i64, Path, description = "Identifier of the rated restaurant")
    ),
    request_body = RatingRequest,
    responses(
        (status = 200, description = "Rating confirmed", body = MutationResponse),
        (status = 400, description = "Invalid scores or comment"),
        (status = 422, description = "Restaurant cannot be rated yet or anymore"),
        (status = 502, description = "Backend failure, rating rolled back")
    )
)]
pub async fn submit_rating(
    State(state): State<SharedState>,
    Path((id, restaurant_id)): Path<(i64, i64)>,
    Json(payload): Json<RatingRequest>,
) -> Result<Json<MutationResponse>, AppError> {
    let response = competition_service::submit_rating(&state, id, restaurant_id, payload).await?;
    Ok(Json(response))
}

/// Re-fetch the ratings of a restaurant.
#[utoipa::path(
    post,
    path = "/competitions/{id}/restaurants/{restaurant_id}/refresh",
    tag = "ratings",
    params(
        ("id" = i64, Path, description = "Identifier of a loaded competition"),
        ("restaurant_id" = i64, Path, description = "Identifier of the restaurant")
    ),
    responses((status = 200, description = "Refreshed restaurant", body = RestaurantDto))
)]
pub async fn refresh_ratings(
    State(state): State<SharedState>,
    Path((id, restaurant_id)): Path<(i64, i64)>,
) -> Result<Json<RestaurantDto>, AppError> {
    Ok(Json(
        competition_service::refresh_ratings(&state, id, restaurant_id).await?,
    ))
}
