use time::{Date, OffsetDateTime, format_description::well_known::Rfc3339};

use crate::dao::models::calendar_date;

pub mod competition;
pub mod health;
pub mod rating;
pub mod sse;
pub mod validation;

fn format_timestamp(time: OffsetDateTime) -> String {
    time.format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}

fn format_date(date: Date) -> String {
    calendar_date::format(date).unwrap_or_else(|_| "invalid-date".into())
}
