use serde::Serialize;
use thiserror::Error;
use time::Date;
use utoipa::ToSchema;

use crate::state::competition::CompetitionStatus;

/// Visit lifecycle of a suggested restaurant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    /// The visit is today or later.
    Upcoming,
    /// The visit is over but nobody rated it yet.
    AwaitingRating,
    /// The visit is over and at least one rating exists.
    Visited,
}

/// Why a restaurant cannot be rated right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NotRatableReason {
    /// The competition is closed.
    CompetitionCompleted,
    /// The visit has not happened yet.
    VisitInFuture,
}

/// Rating attempt refused by the lifecycle rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("restaurant cannot be rated: {reason:?}")]
pub struct NotRatable {
    /// Rule that refused the rating.
    pub reason: NotRatableReason,
}

/// Classify a restaurant from its visit date and rating presence.
///
/// `today` must be computed by the caller for every call.
pub fn classify(visit_date: Date, has_ratings: bool, today: Date) -> Lifecycle {
    if visit_date >= today {
        Lifecycle::Upcoming
    } else if has_ratings {
        Lifecycle::Visited
    } else {
        Lifecycle::AwaitingRating
    }
}

/// Check whether a restaurant visited on `visit_date` accepts ratings today.
pub fn ensure_ratable(
    status: CompetitionStatus,
    visit_date: Date,
    today: Date,
) -> Result<(), NotRatable> {
    if status == CompetitionStatus::Completed {
        return Err(NotRatable {
            reason: NotRatableReason::CompetitionCompleted,
        });
    }
    if visit_date > today {
        return Err(NotRatable {
            reason: NotRatableReason::VisitInFuture,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::{Duration, macros::date};

    const TODAY: Date = date!(2025 - 03 - 10);

    #[test]
    fn yesterday_without_ratings_awaits_rating() {
        let yesterday = TODAY - Duration::days(1);
        assert_eq!(classify(yesterday, false, TODAY), Lifecycle::AwaitingRating);
        assert_eq!(classify(yesterday, true, TODAY), Lifecycle::Visited);
    }

    #[test]
    fn today_and_tomorrow_are_upcoming_regardless_of_ratings() {
        let tomorrow = TODAY + Duration::days(1);
        assert_eq!(classify(tomorrow, false, TODAY), Lifecycle::Upcoming);
        assert_eq!(classify(tomorrow, true, TODAY), Lifecycle::Upcoming);
        assert_eq!(classify(TODAY, true, TODAY), Lifecycle::Upcoming);
    }

    #[test]
    fn rating_window_opens_on_visit_day() {
        use CompetitionStatus::*;

        assert!(ensure_ratable(Active, TODAY, TODAY).is_ok());
        assert!(ensure_ratable(Planning, TODAY - Duration::days(3), TODAY).is_ok());
        assert_eq!(
            ensure_ratable(Active, TODAY + Duration::days(1), TODAY).unwrap_err(),
            NotRatable {
                reason: NotRatableReason::VisitInFuture
            }
        );
        assert_eq!(
            ensure_ratable(Completed, TODAY - Duration::days(1), TODAY).unwrap_err(),
            NotRatable {
                reason: NotRatableReason::CompetitionCompleted
            }
        );
    }
}
