use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Restaurant Contest Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::public_stream,
        crate::routes::competition::load_competition,
        crate::routes::competition::get_competition,
        crate::routes::competition::get_rankings,
        crate::routes::competition::join_competition,
        crate::routes::competition::finish_competition,
        crate::routes::competition::create_restaurant,
        crate::routes::competition::submit_rating,
        crate::routes::competition::refresh_ratings,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::competition::CompetitionViewDto,
            crate::dto::competition::RestaurantDto,
            crate::dto::competition::ProgressDto,
            crate::dto::competition::RankingEntryDto,
            crate::dto::competition::CreateRestaurantRequest,
            crate::dto::competition::MutationResponse,
            crate::dto::rating::RatingRequest,
            crate::dto::rating::RatingDto,
            crate::dto::sse::RankingsUpdatedEvent,
            crate::dto::sse::MutationEvent,
            crate::state::competition::CompetitionStatus,
            crate::state::competition::Participant,
            crate::state::competition::RecordId,
            crate::state::reconciler::MutationPhase,
            crate::scoring::lifecycle::Lifecycle,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "competitions", description = "Competition views and membership"),
        (name = "ratings", description = "Rating submission and refresh"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&str> = doc.paths.paths.keys().map(String::as_str).collect();

        for expected in [
            "/healthcheck",
            "/sse/public",
            "/competitions/{id}",
            "/competitions/{id}/load",
            "/competitions/{id}/rankings",
            "/competitions/{id}/join",
            "/competitions/{id}/finish",
            "/competitions/{id}/restaurants",
            "/competitions/{id}/restaurants/{restaurant_id}/ratings",
            "/competitions/{id}/restaurants/{restaurant_id}/refresh",
        ] {
            assert!(paths.contains(&expected), "missing {expected}");
        }
    }
}
