use std::fmt;

use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

/// Lowest accepted sub-score.
pub const MIN_SCORE: u8 = 1;
/// Highest accepted sub-score.
pub const MAX_SCORE: u8 = 10;
/// Maximum number of characters accepted in a rating comment.
pub const MAX_COMMENT_CHARS: usize = 1000;

/// The four rated criteria.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    /// Food quality.
    Food,
    /// Service.
    Service,
    /// Ambiance.
    Ambiance,
    /// Value for money.
    Value,
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Criterion::Food => "food",
            Criterion::Service => "service",
            Criterion::Ambiance => "ambiance",
            Criterion::Value => "value",
        };
        f.write_str(name)
    }
}

/// Reasons a rating submission is refused before reaching the backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required sub-score was not provided.
    #[error("{criterion} score is required")]
    MissingScore { criterion: Criterion },
    /// A sub-score falls outside of `MIN_SCORE..=MAX_SCORE`.
    #[error("{criterion} score must be between 1 and 10, got {value}")]
    OutOfRange { criterion: Criterion, value: i64 },
    /// The comment exceeds `MAX_COMMENT_CHARS`.
    #[error("comment is limited to 1000 characters, got {length}")]
    CommentTooLong { length: usize },
}

/// Validated sub-scores, each within `MIN_SCORE..=MAX_SCORE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct Scores {
    /// Food quality.
    pub food: u8,
    /// Service.
    pub service: u8,
    /// Ambiance.
    pub ambiance: u8,
    /// Value for money.
    pub value: u8,
}

impl Scores {
    /// Build a score set, rejecting any value outside the accepted range.
    pub fn new(food: u8, service: u8, ambiance: u8, value: u8) -> Result<Self, ValidationError> {
        let check = |criterion, score: u8| {
            if (MIN_SCORE..=MAX_SCORE).contains(&score) {
                Ok(score)
            } else {
                Err(ValidationError::OutOfRange {
                    criterion,
                    value: i64::from(score),
                })
            }
        };

        Ok(Self {
            food: check(Criterion::Food, food)?,
            service: check(Criterion::Service, service)?,
            ambiance: check(Criterion::Ambiance, ambiance)?,
            value: check(Criterion::Value, value)?,
        })
    }

    /// Arithmetic mean of the four scores, rounded half up.
    pub fn overall(&self) -> u8 {
        let sum = u16::from(self.food)
            + u16::from(self.service)
            + u16::from(self.ambiance)
            + u16::from(self.value);
        // mean = sum / 4, so floor(mean + 0.5) == floor((sum + 2) / 4)
        ((sum + 2) / 4) as u8
    }
}

/// Raw submission as received from a caller, before any validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RatingDraft {
    /// Food quality.
    pub food: Option<i64>,
    /// Service.
    pub service: Option<i64>,
    /// Ambiance.
    pub ambiance: Option<i64>,
    /// Value for money.
    pub value: Option<i64>,
    /// Optional free text.
    pub comment: Option<String>,
}

/// Canonical rating content produced by [`normalize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRating {
    /// Validated sub-scores.
    pub scores: Scores,
    /// Rounded mean of the sub-scores.
    pub overall: u8,
    /// Trimmed comment, `None` when blank.
    pub comment: Option<String>,
}

/// Validate a raw submission and derive its overall score.
pub fn normalize(draft: RatingDraft) -> Result<NormalizedRating, ValidationError> {
    let scores = Scores {
        food: score(Criterion::Food, draft.food)?,
        service: score(Criterion::Service, draft.service)?,
        ambiance: score(Criterion::Ambiance, draft.ambiance)?,
        value: score(Criterion::Value, draft.value)?,
    };

    let comment = match draft.comment {
        Some(text) => {
            let length = text.chars().count();
            if length > MAX_COMMENT_CHARS {
                return Err(ValidationError::CommentTooLong { length });
            }
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_owned())
        }
        None => None,
    };

    Ok(NormalizedRating {
        overall: scores.overall(),
        scores,
        comment,
    })
}

fn score(criterion: Criterion, raw: Option<i64>) -> Result<u8, ValidationError> {
    let value = raw.ok_or(ValidationError::MissingScore { criterion })?;
    match u8::try_from(value) {
        Ok(score) if (MIN_SCORE..=MAX_SCORE).contains(&score) => Ok(score),
        _ => Err(ValidationError::OutOfRange { criterion, value }),
    }
}
