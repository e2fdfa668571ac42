/// Competition loading, projections and optimistic mutations.
pub mod competition_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Server-Sent Events message generation.
pub mod sse_events;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
/// Storage backend supervision and degraded mode.
pub mod storage_supervisor;
