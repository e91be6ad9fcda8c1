use chrono::NaiveDate;
use serde::Serialize;

use crate::helper::{get_conn, HelperError};
use crate::models::db_operations::{calendar_db_operations, content_db_operations, projects_db_operations};
use crate::models::{calendar_order, Community, CouncilMeeting, Event, News, ProjectListing};
use crate::DbPool;

pub const HOME_PROJECT_COUNT: u32 = 4;
pub const HOME_MEETING_COUNT: u32 = 4;
pub const HOME_NEWS_COUNT: u32 = 3;

#[derive(Debug, Serialize)]
pub struct HomePage {
    pub projects: Vec<ProjectListing>,
    pub meetings: Vec<CouncilMeeting>,
    pub news: Vec<News>,
    pub community: Vec<Community>,
}

#[derive(Debug, Serialize)]
pub struct CalendarPage {
    pub events: Vec<Event>,
    pub meetings: Vec<CouncilMeeting>,
}

pub fn fetch_home_page(pool: &DbPool, today: NaiveDate) -> Result<HomePage, HelperError> {
    let conn = get_conn(pool)?;
    Ok(HomePage {
        projects: projects_db_operations::read_latest_projects(&conn, HOME_PROJECT_COUNT)?,
        meetings: calendar_db_operations::read_upcoming_meetings(&conn, today, Some(HOME_MEETING_COUNT))?,
        news: content_db_operations::read_latest_news(&conn, HOME_NEWS_COUNT)?,
        community: content_db_operations::read_all_community_links(&conn)?,
    })
}

/// Events and non-archived meetings dated `today` or later, each list in
/// calendar order.
pub fn fetch_calendar(pool: &DbPool, today: NaiveDate) -> Result<CalendarPage, HelperError> {
    let conn = get_conn(pool)?;
    let mut events = calendar_db_operations::read_upcoming_events(&conn, today)?;
    let mut meetings = calendar_db_operations::read_upcoming_meetings(&conn, today, None)?;
    events.sort_by(calendar_order);
    meetings.sort_by(calendar_order);
    Ok(CalendarPage { events, meetings })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewEvent, NewMeeting};
    use crate::setup::db_setup::memory_pool;
    use chrono::NaiveTime;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn event(title: &str, on: &str, at: Option<(u32, u32)>) -> NewEvent {
        NewEvent {
            title: title.into(),
            description: String::new(),
            date: date(on),
            time: at.and_then(|(h, m)| NaiveTime::from_hms_opt(h, m, 0)),
            location: String::new(),
            image: String::new(),
            image_file: None,
            council_id: None,
            project_id: None,
        }
    }

    fn meeting(on: &str, agenda: &str) -> NewMeeting {
        NewMeeting { council_id: None, date: date(on), time: None, location: String::new(), agenda: agenda.into() }
    }

    #[test]
    fn calendar_hides_past_and_archived_entries() {
        let pool = memory_pool().unwrap();
        {
            let conn = pool.get().unwrap();
            calendar_db_operations::create_event(&conn, &event("Past", "2026-01-09", None)).unwrap();
            calendar_db_operations::create_event(&conn, &event("Evening", "2026-01-10", Some((19, 0)))).unwrap();
            calendar_db_operations::create_event(&conn, &event("Morning", "2026-01-10", Some((9, 0)))).unwrap();
            calendar_db_operations::create_event(&conn, &event("Later", "2026-02-01", None)).unwrap();
            calendar_db_operations::create_meeting(&conn, &meeting("2026-01-20", "Budget")).unwrap();
            let archived = calendar_db_operations::create_meeting(&conn, &meeting("2026-01-21", "Old")).unwrap();
            calendar_db_operations::set_meeting_archived(&conn, archived, true).unwrap();
        }

        let page = fetch_calendar(&pool, date("2026-01-10")).unwrap();
        let titles: Vec<_> = page.events.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, ["Morning", "Evening", "Later"]);
        let agendas: Vec<_> = page.meetings.iter().map(|m| m.agenda.as_str()).collect();
        assert_eq!(agendas, ["Budget"]);
    }

    #[test]
    fn home_page_caps_meetings() {
        let pool = memory_pool().unwrap();
        {
            let conn = pool.get().unwrap();
            for day in 1..=6 {
                calendar_db_operations::create_meeting(&conn, &meeting(&format!("2026-03-0{}", day), "Full council")).unwrap();
            }
            content_db_operations::create_community_link(&conn, "Friends of the Park", "https://example.org/park").unwrap();
        }

        let home = fetch_home_page(&pool, date("2026-03-02")).unwrap();
        assert_eq!(home.meetings.len(), 4);
        assert_eq!(home.meetings[0].date, date("2026-03-02"));
        assert!(home.projects.is_empty());
        assert_eq!(home.community.len(), 1);
    }
}
