//! Time windows shared by the time-bucketed regions.

use crate::error::ConsoleError;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use std::fmt;

/// Time window applied to order lists and product GMV aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PeriodFilter {
    /// Since midnight (UTC)
    Today,
    /// The previous calendar day
    Yesterday,
    /// Rolling seven days
    Last7Days,
    /// Rolling thirty days
    #[default]
    Last30Days,
    /// No bound
    All,
    /// Explicit inclusive range
    Custom {
        /// Range start
        start: DateTime<Utc>,
        /// Range end
        end: DateTime<Utc>,
    },
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::default()))
}

impl PeriodFilter {
    /// Build a custom range, rejecting an inverted one.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::Validation`] when `start > end`.
    pub fn custom(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, ConsoleError> {
        if start > end {
            return Err(ConsoleError::validation(
                "The period must start before it ends",
            ));
        }
        Ok(Self::Custom { start, end })
    }

    /// Concrete bounds relative to `now`; `None` for [`PeriodFilter::All`]
    #[must_use]
    pub fn date_range(&self, now: DateTime<Utc>) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let today = midnight(now.date_naive());
        match *self {
            Self::Today => Some((today, now)),
            Self::Yesterday => Some((today - Duration::days(1), today)),
            Self::Last7Days => Some((now - Duration::days(7), now)),
            Self::Last30Days => Some((now - Duration::days(30), now)),
            Self::All => None,
            Self::Custom { start, end } => Some((start, end)),
        }
    }

    /// Whether `at` falls inside the window
    #[must_use]
    pub fn contains(&self, at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        self.date_range(now)
            .is_none_or(|(start, end)| at >= start && at <= end)
    }

    /// Name understood by the remote data service
    #[must_use]
    pub const fn as_wire(&self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Yesterday => "yesterday",
            Self::Last7Days => "7days",
            Self::Last30Days => "30days",
            Self::All => "all",
            Self::Custom { .. } => "custom",
        }
    }
}

impl fmt::Display for PeriodFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Custom { start, end } => {
                write!(f, "{} to {}", start.date_naive(), end.date_naive())
            },
            other => f.write_str(other.as_wire()),
        }
    }
}

/// Coarse age of a record, computed once when the record is fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PeriodBucket {
    /// Same calendar day as now
    Today,
    /// Previous calendar day
    Yesterday,
    /// Within the last seven days
    ThisWeek,
    /// Within the last thirty days
    ThisMonth,
    /// Anything earlier
    Older,
}

impl PeriodBucket {
    /// Classify `at` relative to `now`
    #[must_use]
    pub fn classify(at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let today = now.date_naive();
        let day = at.date_naive();

        if day >= today {
            Self::Today
        } else if today.pred_opt() == Some(day) {
            Self::Yesterday
        } else if now - at <= Duration::days(7) {
            Self::ThisWeek
        } else if now - at <= Duration::days(30) {
            Self::ThisMonth
        } else {
            Self::Older
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use admin_console_testing::test_time;

    #[test]
    fn test_today_starts_at_midnight() {
        let now = test_time();
        let (start, end) = PeriodFilter::Today.date_range(now).unwrap_or((now, now));
        assert_eq!(start.to_rfc3339(), "2025-01-15T00:00:00+00:00");
        assert_eq!(end, now);
    }

    #[test]
    fn test_yesterday_is_a_full_day() {
        let now = test_time();
        let range = PeriodFilter::Yesterday.date_range(now);
        assert_eq!(
            range.map(|(s, e)| (s.to_rfc3339(), e.to_rfc3339())),
            Some((
                "2025-01-14T00:00:00+00:00".to_string(),
                "2025-01-15T00:00:00+00:00".to_string()
            ))
        );
    }

    #[test]
    fn test_all_is_unbounded() {
        let now = test_time();
        assert_eq!(PeriodFilter::All.date_range(now), None);
        assert!(PeriodFilter::All.contains(now - Duration::days(3650), now));
    }

    #[test]
    fn test_custom_rejects_inverted_range() {
        let now = test_time();
        assert!(PeriodFilter::custom(now, now - Duration::days(1)).is_err());
        assert!(PeriodFilter::custom(now - Duration::days(1), now).is_ok());
    }

    #[test]
    fn test_bucket_classification() {
        let now = test_time();
        assert_eq!(PeriodBucket::classify(now - Duration::hours(2), now), PeriodBucket::Today);
        assert_eq!(PeriodBucket::classify(now - Duration::hours(20), now), PeriodBucket::Yesterday);
        assert_eq!(PeriodBucket::classify(now - Duration::days(4), now), PeriodBucket::ThisWeek);
        assert_eq!(PeriodBucket::classify(now - Duration::days(20), now), PeriodBucket::ThisMonth);
        assert_eq!(PeriodBucket::classify(now - Duration::days(90), now), PeriodBucket::Older);
    }
}
