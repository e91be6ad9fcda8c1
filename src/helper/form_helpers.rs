use actix_web::{web, HttpResponse};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use url::form_urlencoded;
use validator::{ValidateEmail, ValidateUrl};

pub type FormFields = HashMap<String, String>;

/// Parses URL-encoded form data from bytes, handling potential UTF-8 errors gracefully.
pub fn parse_form(form_bytes: &web::Bytes) -> Result<FormFields, HttpResponse> {
    let body = match String::from_utf8(form_bytes.to_vec()) {
        Ok(s) => s,
        Err(_) => return Err(HttpResponse::BadRequest().body("Invalid UTF-8 in request body.")),
    };
    Ok(form_urlencoded::parse(body.as_bytes()).into_owned().collect())
}

/// Field name to the messages shown next to that field.
#[derive(Debug, Default, Clone, Serialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    pub fn new() -> Self {
        FormErrors::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn messages(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// `Ok(value)` when nothing was recorded, otherwise the collected errors.
    pub fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, FormErrors> {
        if self.is_empty() {
            Ok(value())
        } else {
            Err(self)
        }
    }
}

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_CHOICE: &str = "Select a valid choice. That choice is not one of the available choices.";

/// Trimmed value of a field, empty when the field was not submitted.
pub fn field(fields: &FormFields, name: &str) -> String {
    fields.get(name).map(|s| s.trim().to_string()).unwrap_or_default()
}

pub fn check_required(errors: &mut FormErrors, name: &str, value: &str) {
    if value.is_empty() {
        errors.add(name, REQUIRED);
    }
}

/// Length limits count characters, not bytes.
pub fn check_max_len(errors: &mut FormErrors, name: &str, value: &str, max: usize) {
    let len = value.chars().count();
    if len > max {
        errors.add(name, format!("Ensure this value has at most {} characters (it has {}).", max, len));
    }
}

pub fn check_email(errors: &mut FormErrors, name: &str, value: &str) {
    if !value.is_empty() && !value.validate_email() {
        errors.add(name, "Enter a valid email address.");
    }
}

pub fn check_url(errors: &mut FormErrors, name: &str, value: &str) {
    if !value.is_empty() && !value.validate_url() {
        errors.add(name, "Enter a valid URL.");
    }
}

/// Parses an optional choice field holding a primary key. Blank means no choice.
pub fn parse_choice(errors: &mut FormErrors, name: &str, value: &str) -> Option<i64> {
    if value.is_empty() {
        return None;
    }
    match value.parse::<i64>() {
        Ok(id) => Some(id),
        Err(_) => {
            errors.add(name, INVALID_CHOICE);
            None
        }
    }
}
