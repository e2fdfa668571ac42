use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::state::competition::CompetitionStatus;

/// Serde adapter for `YYYY-MM-DD` calendar dates used by the backing service.
pub mod calendar_date {
    use serde::{Deserialize, Deserializer, Serializer, de::Error as _, ser::Error as _};
    use time::{Date, macros::format_description};

    /// Render a date as `YYYY-MM-DD`.
    pub fn format(date: Date) -> Result<String, time::error::Format> {
        date.format(format_description!("[year]-[month]-[day]"))
    }

    /// Parse a `YYYY-MM-DD` date.
    pub fn parse(text: &str) -> Result<Date, time::error::Parse> {
        Date::parse(text, format_description!("[year]-[month]-[day]"))
    }

    pub fn serialize<S: Serializer>(date: &Date, serializer: S) -> Result<S::Ok, S::Error> {
        let text = format(*date).map_err(S::Error::custom)?;
        serializer.serialize_str(&text)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Date, D::Error> {
        let text = String::deserialize(deserializer)?;
        parse(&text).map_err(D::Error::custom)
    }
}

/// User record as returned by the backing service.
///
/// Depending on the endpoint the identifier is exposed as `id`, as the legacy `pk`
/// alias, or both. Normalization into a single identifier happens when the record
/// is converted into a [`crate::state::competition::Participant`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserEntity {
    /// Primary identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Legacy alias of the identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pk: Option<i64>,
    /// Display name.
    pub username: String,
    /// Contact email, when exposed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Rating record exchanged with the backing service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RatingEntity {
    /// Primary key of the rating.
    pub id: i64,
    /// Identifier of the rated restaurant.
    pub restaurant: i64,
    /// Author of the rating.
    pub user: UserEntity,
    /// Food quality score (1-10).
    pub food_score: u8,
    /// Service score (1-10).
    pub service_score: u8,
    /// Ambiance score (1-10).
    pub ambiance_score: u8,
    /// Value-for-money score (1-10).
    pub value_score: u8,
    /// Free text left by the rater.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Rounded mean of the four sub-scores.
    pub overall_score: u8,
    /// Creation timestamp.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Restaurant suggestion exchanged with the backing service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RestaurantEntity {
    /// Primary key of the restaurant.
    pub id: i64,
    /// Restaurant name.
    pub name: String,
    /// Postal address.
    #[serde(default)]
    pub address: String,
    /// Kind of cuisine served.
    #[serde(default)]
    pub cuisine_type: String,
    /// Participant who suggested the restaurant.
    #[serde(default)]
    pub suggested_by: Option<UserEntity>,
    /// Planned visit date.
    #[serde(with = "calendar_date")]
    pub visit_date: Date,
    /// Optional picture URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Average computed by the backend; informational only.
    #[serde(default)]
    pub average_rating: f64,
    /// Creation timestamp.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Competition aggregate exchanged with the backing service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompetitionEntity {
    /// Primary key of the competition.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Free text description.
    #[serde(default)]
    pub description: String,
    /// User who created the competition.
    pub creator: UserEntity,
    /// Lifecycle status.
    pub status: CompetitionStatus,
    /// First day of the competition.
    #[serde(with = "calendar_date")]
    pub start_date: Date,
    /// Last day of the competition.
    #[serde(with = "calendar_date")]
    pub end_date: Date,
    /// Users who joined the competition.
    #[serde(default)]
    pub participants: Vec<UserEntity>,
    /// Suggested restaurants, possibly omitted by list endpoints.
    #[serde(default)]
    pub restaurants: Vec<RestaurantEntity>,
}

/// Payload used to create or replace the caller's rating for a restaurant.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RatingSubmissionEntity {
    /// Identifier of the rated restaurant.
    pub restaurant: i64,
    /// Food quality score (1-10).
    pub food_score: u8,
    /// Service score (1-10).
    pub service_score: u8,
    /// Ambiance score (1-10).
    pub ambiance_score: u8,
    /// Value-for-money score (1-10).
    pub value_score: u8,
    /// Optional free text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Identifier of the caller's existing rating, when the submission replaces one.
    #[serde(skip)]
    pub replaces: Option<i64>,
}

/// Payload used to suggest a new restaurant.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NewRestaurantEntity {
    /// Competition receiving the suggestion.
    pub competition: i64,
    /// Restaurant name.
    pub name: String,
    /// Postal address.
    pub address: String,
    /// Kind of cuisine served.
    pub cuisine_type: String,
    /// Planned visit date.
    #[serde(with = "calendar_date")]
    pub visit_date: Date,
}

/// Partial update sent when changing a competition status.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StatusUpdateEntity {
    /// Requested status.
    pub status: CompetitionStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn rating_accepts_legacy_user_alias() {
        let payload = r#"{
            "id": 7,
            "restaurant": 3,
            "user": {"pk": 12, "username": "maya"},
            "food_score": 8,
            "service_score": 7,
            "ambiance_score": 6,
            "value_score": 9,
            "overall_score": 8,
            "created_at": "2025-03-01T19:30:00Z"
        }"#;

        let rating: RatingEntity = serde_json::from_str(payload).unwrap();
        assert_eq!(rating.user.id, None);
        assert_eq!(rating.user.pk, Some(12));
        assert_eq!(rating.comment, None);
    }

    #[test]
    fn restaurant_parses_calendar_visit_date() {
        let payload = r#"{
            "id": 3,
            "name": "Chez Lou",
            "visit_date": "2025-02-14",
            "created_at": "2025-01-10T08:00:00+01:00"
        }"#;

        let restaurant: RestaurantEntity = serde_json::from_str(payload).unwrap();
        assert_eq!(restaurant.visit_date, date!(2025 - 02 - 14));
        assert!(restaurant.suggested_by.is_none());
        assert_eq!(restaurant.cuisine_type, "");
    }

    #[test]
    fn submission_never_serializes_replaced_id() {
        let submission = RatingSubmissionEntity {
            restaurant: 3,
            food_score: 8,
            service_score: 7,
            ambiance_score: 6,
            value_score: 9,
            comment: None,
            replaces: Some(41),
        };

        let value = serde_json::to_value(&submission).unwrap();
        assert!(value.get("replaces").is_none());
        assert!(value.get("comment").is_none());
        assert_eq!(value["restaurant"], 3);
    }
}
