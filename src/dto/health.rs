use serde::Serialize;
use utoipa::ToSchema;

/// Simple health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
    /// Number of competitions currently loaded.
    pub loaded_competitions: usize,
}

impl HealthResponse {
    /// Create a health response indicating the system is operational.
    pub fn ok(loaded_competitions: usize) -> Self {
        Self {
            status: "ok".to_string(),
            loaded_competitions,
        }
    }

    /// Create a health response indicating the system is in degraded mode.
    pub fn degraded(loaded_competitions: usize) -> Self {
        Self {
            status: "degraded".to_string(),
            loaded_competitions,
        }
    }
}
