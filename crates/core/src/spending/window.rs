//! Calendar periods for DAILY / MONTHLY / ANNUAL aggregation.
//!
//! Periods are half-open `[start, next start)` intervals computed in a
//! configured IANA timezone.

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

use crate::spending::error::SpendingError;
use crate::spending::types::LimitType;

/// A half-open time interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    /// Inclusive start.
    pub start: DateTime<Utc>,
    /// Exclusive end.
    pub end: DateTime<Utc>,
}

impl Period {
    /// Whether `at` falls inside the period.
    #[must_use]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at < self.end
    }
}

/// Calendar used to bucket spending into periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregationCalendar {
    tz: Tz,
}

impl AggregationCalendar {
    /// Creates a calendar in the given timezone.
    #[must_use]
    pub const fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// Creates a calendar from an IANA timezone name.
    ///
    /// # Errors
    ///
    /// Returns `SpendingError::UnknownTimezone` for unknown names.
    pub fn from_name(name: &str) -> Result<Self, SpendingError> {
        name.trim()
            .parse::<Tz>()
            .map(Self::new)
            .map_err(|_| SpendingError::UnknownTimezone(name.to_string()))
    }

    /// The calendar's timezone.
    #[must_use]
    pub const fn timezone(&self) -> Tz {
        self.tz
    }

    /// The period of `limit_type` containing `at`.
    ///
    /// Returns `Ok(None)` for `PER_TRANSACTION`, which has no period.
    pub fn period(
        &self,
        limit_type: LimitType,
        at: DateTime<Utc>,
    ) -> Result<Option<Period>, SpendingError> {
        let today = at.with_timezone(&self.tz).date_naive();
        let bounds = match limit_type {
            LimitType::PerTransaction => return Ok(None),
            LimitType::Daily => (Some(today), today.succ_opt()),
            LimitType::Monthly => {
                let first = today.with_day(1);
                let next = if today.month() == 12 {
                    NaiveDate::from_ymd_opt(today.year() + 1, 1, 1)
                } else {
                    NaiveDate::from_ymd_opt(today.year(), today.month() + 1, 1)
                };
                (first, next)
            }
            LimitType::Annual => (
                NaiveDate::from_ymd_opt(today.year(), 1, 1),
                NaiveDate::from_ymd_opt(today.year() + 1, 1, 1),
            ),
        };

        let unavailable = || SpendingError::PeriodUnavailable(at.to_rfc3339());
        let (Some(start_date), Some(end_date)) = bounds else {
            return Err(unavailable());
        };
        let start = self.start_of_day(start_date).ok_or_else(unavailable)?;
        let end = self.start_of_day(end_date).ok_or_else(unavailable)?;
        Ok(Some(Period { start, end }))
    }

    /// First instant of a local date.
    ///
    /// Zones that skip midnight for DST start the day at the first valid hour.
    fn start_of_day(&self, date: NaiveDate) -> Option<DateTime<Utc>> {
        (0..3).find_map(|hour| {
            let local = date.and_hms_opt(hour, 0, 0)?;
            self.tz
                .from_local_datetime(&local)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc))
        })
    }
}

impl Default for AggregationCalendar {
    fn default() -> Self {
        Self::new(chrono_tz::Asia::Jakarta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_per_transaction_has_no_period() {
        let cal = AggregationCalendar::default();
        assert_eq!(
            cal.period(LimitType::PerTransaction, utc("2026-03-10T05:00:00Z"))
                .unwrap(),
            None
        );
    }

    #[test]
    fn test_daily_period_in_jakarta() {
        // 2026-03-10 20:00 UTC is 2026-03-11 03:00 in Jakarta (UTC+7)
        let cal = AggregationCalendar::default();
        let period = cal
            .period(LimitType::Daily, utc("2026-03-10T20:00:00Z"))
            .unwrap()
            .unwrap();
        assert_eq!(period.start, utc("2026-03-10T17:00:00Z"));
        assert_eq!(period.end, utc("2026-03-11T17:00:00Z"));
    }

    #[test]
    fn test_daily_period_in_utc() {
        let cal = AggregationCalendar::from_name("UTC").unwrap();
        let period = cal
            .period(LimitType::Daily, utc("2026-03-10T20:00:00Z"))
            .unwrap()
            .unwrap();
        assert_eq!(period.start, utc("2026-03-10T00:00:00Z"));
        assert_eq!(period.end, utc("2026-03-11T00:00:00Z"));
    }

    #[test]
    fn test_monthly_period_rolls_over_year() {
        let cal = AggregationCalendar::from_name("UTC").unwrap();
        let period = cal
            .period(LimitType::Monthly, utc("2026-12-31T23:59:59Z"))
            .unwrap()
            .unwrap();
        assert_eq!(period.start, utc("2026-12-01T00:00:00Z"));
        assert_eq!(period.end, utc("2027-01-01T00:00:00Z"));
    }

    #[test]
    fn test_annual_period() {
        let cal = AggregationCalendar::default();
        let period = cal
            .period(LimitType::Annual, utc("2026-06-15T00:00:00Z"))
            .unwrap()
            .unwrap();
        assert_eq!(period.start, utc("2025-12-31T17:00:00Z"));
        assert_eq!(period.end, utc("2026-12-31T17:00:00Z"));
    }

    #[test]
    fn test_period_is_half_open() {
        let cal = AggregationCalendar::from_name("UTC").unwrap();
        let period = cal
            .period(LimitType::Daily, utc("2026-03-10T12:00:00Z"))
            .unwrap()
            .unwrap();
        assert!(period.contains(utc("2026-03-10T00:00:00Z")));
        assert!(!period.contains(utc("2026-03-11T00:00:00Z")));
    }

    #[test]
    fn test_unknown_timezone() {
        assert!(matches!(
            AggregationCalendar::from_name("Mars/Olympus"),
            Err(SpendingError::UnknownTimezone(_))
        ));
    }
}
