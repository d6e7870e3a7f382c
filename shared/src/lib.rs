use chrono::{Datelike, NaiveDate, Weekday as ChronoWeekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// A customer record. Customers own dogs via `Dog::customer_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub address: String,
    /// RFC 3339 timestamp
    #[serde(default)]
    pub created_at: String,
}

impl Customer {
    /// Generate a globally unique customer ID
    pub fn generate_id() -> String {
        Uuid::new_v4().to_string()
    }
}

/// A dog record.
///
/// `owner_name`/`owner_phone` are the legacy embedded owner fields that
/// predate the customer registry. They are mutually exclusive with
/// `customer_id` and are removed by the one-time owner migration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dog {
    pub id: String,
    pub name: String,
    /// Price charged per attended day, non-negative
    #[serde(default)]
    pub daily_price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    #[serde(default)]
    pub vet_phone: String,
    /// ISO 8601 date (YYYY-MM-DD), empty when unknown
    #[serde(default)]
    pub birthday: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_phone: Option<String>,
    /// RFC 3339 timestamp
    #[serde(default)]
    pub created_at: String,
}

impl Dog {
    /// Generate a globally unique dog ID
    pub fn generate_id() -> String {
        Uuid::new_v4().to_string()
    }

    /// Whether this record still carries a legacy embedded owner field.
    /// Empty strings count as absent, matching how the legacy data was written.
    pub fn has_legacy_owner(&self) -> bool {
        self.owner_name.as_deref().is_some_and(|s| !s.is_empty())
            || self.owner_phone.as_deref().is_some_and(|s| !s.is_empty())
    }
}

/// The five weekdays the daycare operates on.
///
/// The serialized names form the fixed vocabulary stored in schedule day
/// sets and must stay byte-identical across releases for data compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Weekday {
    #[serde(rename = "Måndag")]
    Monday,
    #[serde(rename = "Tisdag")]
    Tuesday,
    #[serde(rename = "Onsdag")]
    Wednesday,
    #[serde(rename = "Torsdag")]
    Thursday,
    #[serde(rename = "Fredag")]
    Friday,
}

impl Weekday {
    /// All operating days in week order
    pub const ALL: [Weekday; 5] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
    ];

    /// The stored name of this weekday
    pub fn label(&self) -> &'static str {
        match self {
            Weekday::Monday => "Måndag",
            Weekday::Tuesday => "Tisdag",
            Weekday::Wednesday => "Onsdag",
            Weekday::Thursday => "Torsdag",
            Weekday::Friday => "Fredag",
        }
    }

    /// Map a calendar date to an operating day, `None` on weekends
    pub fn from_date(date: NaiveDate) -> Option<Weekday> {
        match date.weekday() {
            ChronoWeekday::Mon => Some(Weekday::Monday),
            ChronoWeekday::Tue => Some(Weekday::Tuesday),
            ChronoWeekday::Wed => Some(Weekday::Wednesday),
            ChronoWeekday::Thu => Some(Weekday::Thursday),
            ChronoWeekday::Fri => Some(Weekday::Friday),
            ChronoWeekday::Sat | ChronoWeekday::Sun => None,
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One dog's plan for a week: which days it attends plus optional
/// drop-off/pick-up times ("HH:MM", empty when unset).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DogSchedule {
    #[serde(default)]
    pub days: Vec<Weekday>,
    #[serde(default)]
    pub drop_off_time: String,
    #[serde(default)]
    pub pick_up_time: String,
}

impl DogSchedule {
    pub fn has_day(&self, day: Weekday) -> bool {
        self.days.contains(&day)
    }
}

/// A week's plan, keyed by dog ID
pub type WeekPlan = BTreeMap<String, DogSchedule>;

/// One dog's attendance state for a single day.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    #[serde(default)]
    pub checked_in: bool,
    /// "HH:MM", empty when not checked in
    #[serde(default)]
    pub check_in_time: String,
    #[serde(default)]
    pub checked_out: bool,
    /// "HH:MM", empty when not checked out
    #[serde(default)]
    pub check_out_time: String,
}

/// A day's attendance, keyed by dog ID
pub type DayAttendance = BTreeMap<String, AttendanceRecord>;

/// The whole per-account document: all four collections in one aggregate.
///
/// This is the exact shape persisted remotely (one JSON object per account)
/// and mirrored locally as four named slots. `revision` increases by one on
/// every committed write and gives future conflict detection a hook;
/// documents written before it existed load as revision 0.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AppDocument {
    #[serde(default)]
    pub customers: Vec<Customer>,
    #[serde(default)]
    pub dogs: Vec<Dog>,
    /// weekKey ("2024-W09") -> plan
    #[serde(default)]
    pub schedules: BTreeMap<String, WeekPlan>,
    /// dateKey ("2024-02-26") -> day attendance
    #[serde(default)]
    pub attendance: BTreeMap<String, DayAttendance>,
    #[serde(default)]
    pub revision: u64,
}

impl AppDocument {
    pub fn customer(&self, id: &str) -> Option<&Customer> {
        self.customers.iter().find(|c| c.id == id)
    }

    pub fn dog(&self, id: &str) -> Option<&Dog> {
        self.dogs.iter().find(|d| d.id == id)
    }

    /// True when neither customers nor dogs exist yet
    pub fn is_registry_empty(&self) -> bool {
        self.customers.is_empty() && self.dogs.is_empty()
    }
}

/// Error parsing a persisted week key
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WeekKeyError {
    #[error("Week key must be in <year>-W<week> format")]
    InvalidFormat,
    #[error("Invalid ISO week number: {0}")]
    InvalidWeek(u32),
}

/// Format the canonical week key for a date: ISO year + zero-padded ISO week,
/// e.g. "2024-W09". This is a persisted key format and must never change.
pub fn week_key(date: NaiveDate) -> String {
    let iso = date.iso_week();
    format!("{:04}-W{:02}", iso.year(), iso.week())
}

/// Format the canonical date key for a date, e.g. "2024-02-26"
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parse a week key back into (ISO year, ISO week)
pub fn parse_week_key(key: &str) -> Result<(i32, u32), WeekKeyError> {
    let (year, week) = key.split_once("-W").ok_or(WeekKeyError::InvalidFormat)?;
    let year: i32 = year.parse().map_err(|_| WeekKeyError::InvalidFormat)?;
    let week: u32 = week.parse().map_err(|_| WeekKeyError::InvalidFormat)?;
    if !(1..=53).contains(&week) {
        return Err(WeekKeyError::InvalidWeek(week));
    }
    Ok((year, week))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_generate_ids_are_unique() {
        let a = Customer::generate_id();
        let b = Customer::generate_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), 36);
    }

    #[test]
    fn test_customer_wire_shape() {
        let customer = Customer {
            id: "c1".to_string(),
            name: "Anna".to_string(),
            phone: "070-1".to_string(),
            email: String::new(),
            address: String::new(),
            created_at: "2024-02-26T08:00:00Z".to_string(),
        };

        let value = serde_json::to_value(&customer).expect("Failed to serialize customer");
        assert_eq!(value["createdAt"], "2024-02-26T08:00:00Z");
        assert_eq!(value["name"], "Anna");
    }

    #[test]
    fn test_dog_legacy_fields_roundtrip() {
        // Shape written by the pre-migration implementation
        let raw = json!({
            "id": "d1",
            "name": "Buddy",
            "dailyPrice": 450.0,
            "ownerName": "Anna",
            "ownerPhone": "070-1"
        });

        let dog: Dog = serde_json::from_value(raw).expect("Failed to parse legacy dog");
        assert!(dog.has_legacy_owner());
        assert_eq!(dog.owner_name.as_deref(), Some("Anna"));
        assert_eq!(dog.customer_id, None);

        // Post-migration shape must not serialize the legacy keys at all
        let migrated = Dog {
            owner_name: None,
            owner_phone: None,
            customer_id: Some("c1".to_string()),
            ..dog
        };
        let value = serde_json::to_value(&migrated).expect("Failed to serialize dog");
        assert!(value.get("ownerName").is_none());
        assert!(value.get("ownerPhone").is_none());
        assert_eq!(value["customerId"], "c1");
    }

    #[test]
    fn test_has_legacy_owner_treats_empty_as_absent() {
        let dog = Dog {
            id: "d1".to_string(),
            name: "Buddy".to_string(),
            daily_price: 0.0,
            customer_id: None,
            vet_phone: String::new(),
            birthday: String::new(),
            notes: String::new(),
            photo_url: None,
            owner_name: Some(String::new()),
            owner_phone: Some(String::new()),
            created_at: String::new(),
        };
        assert!(!dog.has_legacy_owner());
    }

    #[test]
    fn test_weekday_serializes_to_fixed_vocabulary() {
        let labels: Vec<String> = Weekday::ALL
            .iter()
            .map(|d| serde_json::to_value(d).unwrap().as_str().unwrap().to_string())
            .collect();
        assert_eq!(labels, ["Måndag", "Tisdag", "Onsdag", "Torsdag", "Fredag"]);
    }

    #[test]
    fn test_weekday_from_date() {
        // 2024-02-26 is a Monday
        let monday = NaiveDate::from_ymd_opt(2024, 2, 26).unwrap();
        assert_eq!(Weekday::from_date(monday), Some(Weekday::Monday));

        // 2024-03-02 is a Saturday
        let saturday = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        assert_eq!(Weekday::from_date(saturday), None);
    }

    #[test]
    fn test_week_key_format() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 26).unwrap();
        assert_eq!(week_key(date), "2024-W09");
        assert_eq!(date_key(date), "2024-02-26");
    }

    #[test]
    fn test_week_key_iso_year_boundary() {
        // 2024-12-30 falls in ISO week 1 of 2025
        let date = NaiveDate::from_ymd_opt(2024, 12, 30).unwrap();
        assert_eq!(week_key(date), "2025-W01");

        // 2021-01-01 falls in ISO week 53 of 2020
        let date = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        assert_eq!(week_key(date), "2020-W53");
    }

    #[test]
    fn test_parse_week_key() {
        assert_eq!(parse_week_key("2024-W09").unwrap(), (2024, 9));
        assert_eq!(parse_week_key("2020-W53").unwrap(), (2020, 53));
        assert!(parse_week_key("2024-09").is_err());
        assert!(parse_week_key("2024-W99").is_err());
        assert!(parse_week_key("garbage").is_err());
    }

    #[test]
    fn test_document_roundtrip_preserves_nested_maps() {
        let mut plan = WeekPlan::new();
        plan.insert(
            "d1".to_string(),
            DogSchedule {
                days: vec![Weekday::Monday, Weekday::Wednesday],
                drop_off_time: "08:00".to_string(),
                pick_up_time: "16:30".to_string(),
            },
        );

        let mut day = DayAttendance::new();
        day.insert(
            "d1".to_string(),
            AttendanceRecord {
                checked_in: true,
                check_in_time: "08:05".to_string(),
                checked_out: false,
                check_out_time: String::new(),
            },
        );

        let mut document = AppDocument::default();
        document.schedules.insert("2024-W09".to_string(), plan);
        document.attendance.insert("2024-02-26".to_string(), day);
        document.revision = 7;

        let serialized = serde_json::to_string(&document).expect("Failed to serialize document");
        let restored: AppDocument =
            serde_json::from_str(&serialized).expect("Failed to parse document");
        assert_eq!(restored, document);
    }

    #[test]
    fn test_document_without_revision_loads_as_zero() {
        // Documents written before the revision counter existed
        let raw = json!({
            "customers": [],
            "dogs": [],
            "schedules": {},
            "attendance": {}
        });
        let document: AppDocument = serde_json::from_value(raw).expect("Failed to parse document");
        assert_eq!(document.revision, 0);
    }
}
