//! Income derivation from schedules and attendance.
//!
//! Expected income counts every scheduled dog-day in an interval at the
//! dog's daily price; actual income counts checked-in dog-days. Weekends
//! never contribute, the daycare only operates Monday through Friday.

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;

use super::calendar;
use shared::{date_key, week_key, AppDocument, Weekday};

/// Expected and actual income over one date interval
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct IncomeSummary {
    pub expected: f64,
    pub actual: f64,
}

/// Sum income over the inclusive interval `start..=end`
pub fn income_between(document: &AppDocument, start: NaiveDate, end: NaiveDate) -> IncomeSummary {
    let mut summary = IncomeSummary::default();

    let mut day = start;
    while day <= end {
        if let Some(weekday) = Weekday::from_date(day) {
            let week_plan = document.schedules.get(&week_key(day));
            let day_attendance = document.attendance.get(&date_key(day));

            for dog in &document.dogs {
                let price = dog.daily_price.max(0.0);

                if let Some(plan) = week_plan.and_then(|p| p.get(&dog.id)) {
                    if plan.has_day(weekday) {
                        summary.expected += price;
                    }
                }
                if let Some(record) = day_attendance.and_then(|a| a.get(&dog.id)) {
                    if record.checked_in {
                        summary.actual += price;
                    }
                }
            }
        }

        day = match day.succ_opt() {
            Some(next) => next,
            None => break,
        };
    }

    summary
}

/// Income for the week containing `date`
pub fn week_income(document: &AppDocument, date: NaiveDate) -> IncomeSummary {
    let days = calendar::week_days(date);
    income_between(document, days[0], days[6])
}

/// Income for the month containing `date`
pub fn month_income(document: &AppDocument, date: NaiveDate) -> IncomeSummary {
    let days = calendar::month_days(date);
    match (days.first(), days.last()) {
        (Some(first), Some(last)) => income_between(document, *first, *last),
        _ => IncomeSummary::default(),
    }
}

/// Render the month's attendance as CSV: one row per checked-in dog-day
pub fn month_attendance_csv(document: &AppDocument, date: NaiveDate) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(["Datum", "Hund", "Pris", "Status"])
        .context("Failed to write CSV header")?;

    for day in calendar::month_days(date) {
        if Weekday::from_date(day).is_none() {
            continue;
        }
        let key = date_key(day);
        let Some(day_attendance) = document.attendance.get(&key) else {
            continue;
        };

        for dog in &document.dogs {
            let attended = day_attendance.get(&dog.id).is_some_and(|r| r.checked_in);
            if attended {
                let price = dog.daily_price.to_string();
                writer
                    .write_record([key.as_str(), dog.name.as_str(), price.as_str(), "Närvarande"])
                    .context("Failed to write CSV row")?;
            }
        }
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow!("Failed to flush CSV export: {}", e))?;
    String::from_utf8(bytes).context("CSV export produced invalid UTF-8")
}
