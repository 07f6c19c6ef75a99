use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Day buckets used to browse tips by creation date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DayFilter {
    Yesterday,
    #[default]
    Today,
    Tomorrow,
    All,
}

/// Half-open `[start, end)`; `None` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl DayRange {
    pub fn unbounded() -> Self {
        Self {
            start: None,
            end: None,
        }
    }

    pub fn for_date(date: NaiveDate) -> Self {
        let start = start_of_day(date);
        Self {
            start: Some(start),
            end: Some(start + Duration::days(1)),
        }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start.is_none_or(|s| at >= s) && self.end.is_none_or(|e| at < e)
    }
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(0, 0, 0)
        .unwrap_or_default()
        .and_utc()
}

/// An explicit date wins over the bucket.
pub fn resolve_range(day: DayFilter, date: Option<NaiveDate>, now: DateTime<Utc>) -> DayRange {
    if let Some(date) = date {
        return DayRange::for_date(date);
    }

    let today = now.date_naive();
    match day {
        DayFilter::Today => DayRange::for_date(today),
        DayFilter::Yesterday => DayRange::for_date(today - Duration::days(1)),
        DayFilter::Tomorrow => DayRange::for_date(today + Duration::days(1)),
        DayFilter::All => DayRange::unbounded(),
    }
}
