//! Calendar navigation for the daycare tracker.
//!
//! Week and date keys are the only persisted values derived from calendar
//! math; their formatting lives in `shared` next to the wire model. This
//! module adds the date arithmetic the services need: current keys, week
//! stepping, and day intervals for income summaries.

use chrono::{Datelike, Duration, Local, NaiveDate};
use shared::{date_key, week_key};

/// Today's date in local time
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Week key for the current local week
pub fn current_week_key() -> String {
    week_key(today())
}

/// Date key for the current local day
pub fn current_date_key() -> String {
    date_key(today())
}

/// Current local clock time as "HH:MM"
pub fn clock_time() -> String {
    Local::now().format("%H:%M").to_string()
}

/// Week key of the week before the one containing `date`
pub fn previous_week_key(date: NaiveDate) -> String {
    week_key(date - Duration::weeks(1))
}

/// Week key of the week after the one containing `date`
pub fn next_week_key(date: NaiveDate) -> String {
    week_key(date + Duration::weeks(1))
}

/// All seven dates of the week containing `date`, Monday first
pub fn week_days(date: NaiveDate) -> Vec<NaiveDate> {
    let monday = date - Duration::days(i64::from(date.weekday().num_days_from_monday()));
    (0..7).map(|offset| monday + Duration::days(offset)).collect()
}

/// All dates of the month containing `date`, in order
pub fn month_days(date: NaiveDate) -> Vec<NaiveDate> {
    let mut day = match date.with_day(1) {
        Some(first) => first,
        None => return Vec::new(),
    };

    let mut days = Vec::new();
    while day.month() == date.month() {
        days.push(day);
        day = match day.succ_opt() {
            Some(next) => next,
            None => break,
        };
    }
    days
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_week_days_starts_on_monday() {
        // 2024-02-28 is a Wednesday
        let wednesday = NaiveDate::from_ymd_opt(2024, 2, 28).unwrap();
        let days = week_days(wednesday);

        assert_eq!(days.len(), 7);
        assert_eq!(days[0], NaiveDate::from_ymd_opt(2024, 2, 26).unwrap());
        assert_eq!(days[6], NaiveDate::from_ymd_opt(2024, 3, 3).unwrap());
    }

    #[test]
    fn test_month_days_handles_leap_february() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 15).unwrap();
        let days = month_days(date);

        assert_eq!(days.len(), 29);
        assert_eq!(days[0], NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(days[28], NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }

    #[test]
    fn test_week_stepping_across_year_boundary() {
        // 2025-01-02 is in 2025-W01; the previous week is 2024-W52
        let date = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        assert_eq!(previous_week_key(date), "2024-W52");
        assert_eq!(next_week_key(date), "2025-W02");
    }
}
