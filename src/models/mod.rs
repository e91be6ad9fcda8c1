use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Council {
    pub id: i64,
    pub name: String,
    pub contact: String,
    pub contact_email: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Project {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub image: String,
    pub main_image: String,
    pub category_id: Option<i64>,
    pub budget: i64,
    pub project_manager: String,
    pub location: String,
    pub council_id: i64,
    pub end_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A project together with the names of its council and category, as shown on
/// list and detail pages.
#[derive(Debug, Serialize, Clone)]
pub struct ProjectListing {
    pub project: Project,
    pub council_name: String,
    pub category_name: Option<String>,
}

/// Validated values for inserting or rebinding a project.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProject {
    pub title: String,
    pub description: String,
    pub image: String,
    pub main_image: String,
    pub category_id: Option<i64>,
    pub budget: i64,
    pub project_manager: String,
    pub location: String,
    pub council_id: i64,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Supplier {
    pub id: i64,
    pub name: String,
    pub contact_person: String,
    pub contact_email: String,
    pub phone: String,
    pub address: String,
    pub specialty: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewSupplier {
    pub name: String,
    pub contact_person: String,
    pub contact_email: String,
    pub phone: String,
    pub address: String,
    pub specialty: String,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ProjectSupplier {
    pub id: i64,
    pub project_id: i64,
    pub supplier_id: i64,
    pub contract_value: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

/// Association row loaded with its supplier (project detail page).
#[derive(Debug, Serialize, Clone)]
pub struct ProjectSupplierWithSupplier {
    pub link: ProjectSupplier,
    pub supplier: Supplier,
}

/// Association row seen from the supplier side (supplier detail page).
#[derive(Debug, Serialize, Clone)]
pub struct SupplierContract {
    pub link: ProjectSupplier,
    pub project_title: String,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ContractorRequirement {
    pub id: i64,
    pub project_id: i64,
    pub name: String,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct CouncilMeeting {
    pub id: i64,
    pub council_id: Option<i64>,
    pub council_name: Option<String>,
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub location: String,
    pub agenda: String,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewMeeting {
    pub council_id: Option<i64>,
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub location: String,
    pub agenda: String,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub location: String,
    pub image: String,
    pub image_file: Option<String>,
    pub council_id: Option<i64>,
    pub council_name: Option<String>,
    pub project_id: Option<i64>,
    pub project_title: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Event {
    /// The uploaded file wins over the image URL when both are set.
    pub fn display_image(&self) -> Option<&str> {
        self.image_file
            .as_deref()
            .or_else(|| Some(self.image.as_str()).filter(|url| !url.is_empty()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    pub title: String,
    pub description: String,
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub location: String,
    pub image: String,
    pub image_file: Option<String>,
    pub council_id: Option<i64>,
    pub project_id: Option<i64>,
}

/// Anything shown on the calendar. Entries are ordered by date, then time,
/// with an entry lacking a time placed before timed entries on the same day.
pub trait CalendarEntry {
    fn date(&self) -> NaiveDate;
    fn time(&self) -> Option<NaiveTime>;
}

pub fn calendar_order<T: CalendarEntry>(a: &T, b: &T) -> Ordering {
    (a.date(), a.time()).cmp(&(b.date(), b.time()))
}

impl CalendarEntry for Event {
    fn date(&self) -> NaiveDate { self.date }
    fn time(&self) -> Option<NaiveTime> { self.time }
}

impl CalendarEntry for CouncilMeeting {
    fn date(&self) -> NaiveDate { self.date }
    fn time(&self) -> Option<NaiveTime> { self.time }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct News {
    pub id: i64,
    pub title: String,
    pub summary: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Community {
    pub id: i64,
    pub title: String,
    pub link: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Notification {
    pub message: String,
    pub r#type: String, // 'success' or 'error'
}

pub mod db_operations;
pub mod form_models;
pub mod project_filter;

#[cfg(test)]
mod tests {
    use super::*;

    fn meeting(date: &str, time: Option<&str>) -> CouncilMeeting {
        CouncilMeeting {
            id: 0,
            council_id: None,
            council_name: None,
            date: date.parse().unwrap(),
            time: time.map(|t| NaiveTime::parse_from_str(t, "%H:%M").unwrap()),
            location: String::new(),
            agenda: String::new(),
            archived: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn calendar_order_sorts_by_date_then_time() {
        let mut meetings = vec![
            meeting("2026-03-02", Some("09:00")),
            meeting("2026-03-01", Some("18:30")),
            meeting("2026-03-01", None),
            meeting("2026-03-01", Some("10:00")),
        ];
        meetings.sort_by(calendar_order);

        let keys: Vec<_> = meetings.iter().map(|m| (m.date.to_string(), m.time.map(|t| t.format("%H:%M").to_string()))).collect();
        assert_eq!(keys, vec![
            ("2026-03-01".to_string(), None),
            ("2026-03-01".to_string(), Some("10:00".to_string())),
            ("2026-03-01".to_string(), Some("18:30".to_string())),
            ("2026-03-02".to_string(), Some("09:00".to_string())),
        ]);
    }

    #[test]
    fn event_prefers_uploaded_image() {
        let mut event = Event {
            id: 1,
            title: "Opening".into(),
            description: String::new(),
            date: "2026-05-01".parse().unwrap(),
            time: None,
            location: String::new(),
            image: "https://example.org/a.jpg".into(),
            image_file: None,
            council_id: None,
            council_name: None,
            project_id: None,
            project_title: None,
            created_at: Utc::now(),
        };
        assert_eq!(event.display_image(), Some("https://example.org/a.jpg"));

        event.image_file = Some("/media/events/x.png".into());
        assert_eq!(event.display_image(), Some("/media/events/x.png"));

        event.image_file = None;
        event.image.clear();
        assert_eq!(event.display_image(), None);
    }
}
