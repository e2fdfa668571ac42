//! Pure scoring rules: submission normalization, visit lifecycle, rating aggregation
//! and participant ranking.

/// Per-restaurant rating lists, averages and fetch sequencing.
pub mod aggregator;
/// Restaurant visit lifecycle and rating window.
pub mod lifecycle;
/// Validation of raw rating submissions.
pub mod normalizer;
/// Participant leaderboard.
pub mod ranking;
