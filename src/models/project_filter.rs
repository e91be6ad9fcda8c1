//! Turns the query string of the project listing into a filter.
//!
//! Malformed numbers and dates are dropped under [`FilterPolicy::Permissive`]
//! (the default), so `?min_budget=abc` lists the same projects as no
//! `min_budget` at all. [`FilterPolicy::Strict`] reports them instead.

use std::str::FromStr;

use chrono::NaiveDate;
use rusqlite::types::Value;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const PAGE_SIZE: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterPolicy {
    #[default]
    Permissive,
    Strict,
}

impl FilterPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterPolicy::Permissive => "permissive",
            FilterPolicy::Strict => "strict",
        }
    }
}

impl FromStr for FilterPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "permissive" => Ok(FilterPolicy::Permissive),
            "strict" => Ok(FilterPolicy::Strict),
            other => Err(format!("unknown filter policy '{}'", other)),
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum FilterError {
    #[error("'{value}' is not a valid value for '{param}'")]
    Invalid { param: &'static str, value: String },
}

/// Raw query parameters, exactly as received.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ProjectListQuery {
    pub q: Option<String>,
    pub min_budget: Option<String>,
    pub max_budget: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub page: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectFilter {
    pub text: Option<String>,
    pub min_budget: Option<i64>,
    pub max_budget: Option<i64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub page: u32,
}

impl Default for ProjectFilter {
    fn default() -> Self {
        ProjectFilter { text: None, min_budget: None, max_budget: None, start_date: None, end_date: None, page: 1 }
    }
}

fn present(raw: &Option<String>) -> Option<&str> {
    raw.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn parse_param<T: FromStr>(
    param: &'static str,
    raw: &Option<String>,
    policy: FilterPolicy,
) -> Result<Option<T>, FilterError> {
    let Some(value) = present(raw) else { return Ok(None) };
    match value.parse::<T>() {
        Ok(parsed) => Ok(Some(parsed)),
        Err(_) if policy == FilterPolicy::Permissive => {
            log::debug!("Ignoring malformed '{}' filter value '{}'", param, value);
            Ok(None)
        }
        Err(_) => Err(FilterError::Invalid { param, value: value.to_string() }),
    }
}

impl ProjectFilter {
    pub fn from_query(query: &ProjectListQuery, policy: FilterPolicy) -> Result<Self, FilterError> {
        let page = match parse_param::<u32>("page", &query.page, policy)? {
            Some(0) if policy == FilterPolicy::Strict => {
                return Err(FilterError::Invalid { param: "page", value: "0".to_string() })
            }
            Some(p) => p.max(1),
            None => 1,
        };

        Ok(ProjectFilter {
            // Matched exactly as typed, spaces included; only an empty string is absent.
            text: query.q.clone().filter(|q| !q.is_empty()),
            min_budget: parse_param("min_budget", &query.min_budget, policy)?,
            max_budget: parse_param("max_budget", &query.max_budget, policy)?,
            start_date: parse_param("start_date", &query.start_date, policy)?,
            end_date: parse_param("end_date", &query.end_date, policy)?,
            page,
        })
    }

    pub fn offset(&self) -> u32 {
        (self.page - 1).saturating_mul(PAGE_SIZE)
    }

    /// SQL conditions over `projects p LEFT JOIN categories c`, joined with AND,
    /// and their positional parameters. Returns `"1"` when nothing filters.
    pub fn where_clause(&self) -> (String, Vec<Value>) {
        let mut conditions: Vec<String> = Vec::new();
        let mut params: Vec<Value> = Vec::new();

        if let Some(text) = &self.text {
            let pattern = format!("%{}%", escape_like(text));
            let n = params.len() + 1;
            conditions.push(format!(
                "(p.title LIKE ?{n} ESCAPE '\\' OR p.description LIKE ?{n} ESCAPE '\\' \
                 OR p.location LIKE ?{n} ESCAPE '\\' OR c.name LIKE ?{n} ESCAPE '\\')"
            ));
            params.push(Value::Text(pattern));
        }
        if let Some(min) = self.min_budget {
            params.push(Value::Integer(min));
            conditions.push(format!("p.budget >= ?{}", params.len()));
        }
        if let Some(max) = self.max_budget {
            params.push(Value::Integer(max));
            conditions.push(format!("p.budget <= ?{}", params.len()));
        }
        if let Some(start) = self.start_date {
            params.push(Value::Text(start.format("%Y-%m-%d").to_string()));
            conditions.push(format!("date(p.created_at) >= ?{}", params.len()));
        }
        if let Some(end) = self.end_date {
            params.push(Value::Text(end.format("%Y-%m-%d").to_string()));
            conditions.push(format!("date(p.created_at) <= ?{}", params.len()));
        }

        if conditions.is_empty() {
            ("1".to_string(), params)
        } else {
            (conditions.join(" AND "), params)
        }
    }
}

fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Page window handed to the listing template.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct PageInfo {
    pub number: u32,
    pub total_pages: u32,
    pub total_items: i64,
    pub has_previous: bool,
    pub has_next: bool,
}

impl PageInfo {
    pub fn new(number: u32, total_items: i64) -> Self {
        let total_pages = ((total_items.max(0) as u64 + PAGE_SIZE as u64 - 1) / PAGE_SIZE as u64).max(1) as u32;
        PageInfo {
            number,
            total_pages,
            total_items,
            has_previous: number > 1,
            has_next: number < total_pages,
        }
    }
}
