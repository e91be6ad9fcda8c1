//! Submitted form values and their field-level cleaning.
//!
//! Every form keeps the raw strings it was bound with, so a rejected
//! submission can be rendered back exactly as typed. `clean` records problems
//! in a [`FormErrors`] and returns the typed value; callers only persist it
//! when no error was recorded (including their own database-backed checks).

use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::helper::form_helpers::{
    check_email, check_max_len, check_required, check_url, field, parse_choice, FormErrors, FormFields, REQUIRED,
};
use crate::helper::sanitization_helpers::normalize_newlines;
use crate::models::{NewEvent, NewProject, NewSupplier, Project, Supplier};

fn parse_date(errors: &mut FormErrors, name: &str, value: &str) -> Option<NaiveDate> {
    if value.is_empty() {
        return None;
    }
    match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            errors.add(name, "Enter a valid date.");
            None
        }
    }
}

fn parse_time(errors: &mut FormErrors, name: &str, value: &str) -> Option<NaiveTime> {
    if value.is_empty() {
        return None;
    }
    let parsed = NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"));
    match parsed {
        Ok(time) => Some(time),
        Err(_) => {
            errors.add(name, "Enter a valid time.");
            None
        }
    }
}

fn id_string(id: Option<i64>) -> String {
    id.map(|id| id.to_string()).unwrap_or_default()
}

// --- Project ---

#[derive(Debug, Default, Clone, Serialize, PartialEq, Eq)]
pub struct ProjectForm {
    pub title: String,
    pub description: String,
    pub image: String,
    pub main_image: String,
    pub category: String,
    pub budget: String,
    pub project_manager: String,
    pub location: String,
    pub council: String,
}

impl ProjectForm {
    pub fn from_fields(fields: &FormFields) -> Self {
        ProjectForm {
            title: field(fields, "title"),
            description: normalize_newlines(&field(fields, "description")),
            image: field(fields, "image"),
            main_image: field(fields, "main_image"),
            category: field(fields, "category"),
            budget: field(fields, "budget"),
            project_manager: field(fields, "project_manager"),
            location: field(fields, "location"),
            council: field(fields, "council"),
        }
    }

    pub fn from_project(project: &Project) -> Self {
        ProjectForm {
            title: project.title.clone(),
            description: project.description.clone(),
            image: project.image.clone(),
            main_image: project.main_image.clone(),
            category: id_string(project.category_id),
            budget: project.budget.to_string(),
            project_manager: project.project_manager.clone(),
            location: project.location.clone(),
            council: project.council_id.to_string(),
        }
    }

    /// Whether the council and category exist is left to the caller.
    pub fn clean(&self, errors: &mut FormErrors) -> NewProject {
        check_required(errors, "title", &self.title);
        check_max_len(errors, "title", &self.title, 100);
        check_required(errors, "description", &self.description);
        check_url(errors, "image", &self.image);
        check_max_len(errors, "image", &self.image, 500);
        check_url(errors, "main_image", &self.main_image);
        check_max_len(errors, "main_image", &self.main_image, 500);
        check_max_len(errors, "project_manager", &self.project_manager, 120);
        check_max_len(errors, "location", &self.location, 150);

        let budget = if self.budget.is_empty() {
            errors.add("budget", REQUIRED);
            0
        } else {
            self.budget.parse::<i64>().unwrap_or_else(|_| {
                errors.add("budget", "Enter a whole number.");
                0
            })
        };

        let category_id = parse_choice(errors, "category", &self.category);
        let council_id = match parse_choice(errors, "council", &self.council) {
            Some(id) => id,
            None => {
                if self.council.is_empty() {
                    errors.add("council", REQUIRED);
                }
                0
            }
        };

        NewProject {
            title: self.title.clone(),
            description: self.description.clone(),
            image: self.image.clone(),
            main_image: self.main_image.clone(),
            category_id,
            budget,
            project_manager: self.project_manager.clone(),
            location: self.location.clone(),
            council_id,
        }
    }
}

// --- Supplier ---

#[derive(Debug, Default, Clone, Serialize, PartialEq, Eq)]
pub struct SupplierForm {
    pub name: String,
    pub contact_person: String,
    pub contact_email: String,
    pub phone: String,
    pub address: String,
    pub specialty: String,
}

impl SupplierForm {
    pub fn from_fields(fields: &FormFields) -> Self {
        SupplierForm {
            name: field(fields, "name"),
            contact_person: field(fields, "contact_person"),
            contact_email: field(fields, "contact_email"),
            phone: field(fields, "phone"),
            address: normalize_newlines(&field(fields, "address")),
            specialty: field(fields, "specialty"),
        }
    }

    pub fn from_supplier(supplier: &Supplier) -> Self {
        SupplierForm {
            name: supplier.name.clone(),
            contact_person: supplier.contact_person.clone(),
            contact_email: supplier.contact_email.clone(),
            phone: supplier.phone.clone(),
            address: supplier.address.clone(),
            specialty: supplier.specialty.clone(),
        }
    }

    /// Name uniqueness is left to the caller.
    pub fn clean(&self, errors: &mut FormErrors) -> NewSupplier {
        check_required(errors, "name", &self.name);
        check_max_len(errors, "name", &self.name, 150);
        check_max_len(errors, "contact_person", &self.contact_person, 120);
        check_email(errors, "contact_email", &self.contact_email);
        check_max_len(errors, "phone", &self.phone, 40);
        check_max_len(errors, "specialty", &self.specialty, 120);

        NewSupplier {
            name: self.name.clone(),
            contact_person: self.contact_person.clone(),
            contact_email: self.contact_email.clone(),
            phone: self.phone.clone(),
            address: self.address.clone(),
            specialty: self.specialty.clone(),
        }
    }
}

// --- Contract (project/supplier association) ---

#[derive(Debug, Default, Clone, Serialize, PartialEq, Eq)]
pub struct ContractForm {
    pub supplier: String,
    pub contract_value: String,
}

/// Twelve digits in total, two of them after the decimal point.
const MAX_CONTRACT_VALUE: i64 = 9_999_999_999;

impl ContractForm {
    pub fn from_fields(fields: &FormFields) -> Self {
        ContractForm {
            supplier: field(fields, "supplier"),
            contract_value: field(fields, "contract_value").replace(',', ""),
        }
    }

    pub fn clean(&self, errors: &mut FormErrors) -> (i64, Option<Decimal>) {
        let supplier_id = match parse_choice(errors, "supplier", &self.supplier) {
            Some(id) => id,
            None => {
                if self.supplier.is_empty() {
                    errors.add("supplier", REQUIRED);
                }
                0
            }
        };

        let value = if self.contract_value.is_empty() {
            None
        } else {
            match Decimal::from_str(self.contract_value.trim_start_matches('£')) {
                Ok(v) if v.is_sign_negative() => {
                    errors.add("contract_value", "Contract value cannot be negative.");
                    None
                }
                Ok(v) if v >= Decimal::from(MAX_CONTRACT_VALUE + 1) => {
                    errors.add("contract_value", "Ensure that there are no more than 10 digits before the decimal point.");
                    None
                }
                Ok(v) => Some(v.round_dp_with_strategy(2, rust_decimal::RoundingStrategy::MidpointAwayFromZero)),
                Err(_) => {
                    errors.add("contract_value", "Enter a number.");
                    None
                }
            }
        };

        (supplier_id, value)
    }
}

// --- Event ---

#[derive(Debug, Default, Clone, Serialize, PartialEq, Eq)]
pub struct EventForm {
    pub title: String,
    pub description: String,
    pub date: String,
    pub time: String,
    pub location: String,
    pub council: String,
    pub project: String,
    pub image: String,
}

impl EventForm {
    pub fn from_fields(fields: &FormFields) -> Self {
        EventForm {
            title: field(fields, "title"),
            description: normalize_newlines(&field(fields, "description")),
            date: field(fields, "date"),
            time: field(fields, "time"),
            location: field(fields, "location"),
            council: field(fields, "council"),
            project: field(fields, "project"),
            image: field(fields, "image"),
        }
    }

    /// Returns `None` only when the date is missing or malformed (it is
    /// recorded in `errors`). Referenced council/project existence and the
    /// uploaded file are checked by the caller.
    pub fn clean(&self, errors: &mut FormErrors) -> Option<NewEvent> {
        check_required(errors, "title", &self.title);
        check_max_len(errors, "title", &self.title, 200);
        check_required(errors, "date", &self.date);
        check_max_len(errors, "location", &self.location, 250);
        check_url(errors, "image", &self.image);
        check_max_len(errors, "image", &self.image, 500);

        let date = parse_date(errors, "date", &self.date);
        let time = parse_time(errors, "time", &self.time);
        let council_id = parse_choice(errors, "council", &self.council);
        let project_id = parse_choice(errors, "project", &self.project);

        date.map(|date| NewEvent {
            title: self.title.clone(),
            description: self.description.clone(),
            date,
            time,
            location: self.location.clone(),
            image: self.image.clone(),
            image_file: None,
            council_id,
            project_id,
        })
    }
}

// --- Contact ---

pub const MIN_MESSAGE_CHARS: usize = 5;

#[derive(Debug, Default, Clone, Serialize, PartialEq, Eq)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub message: String,
}

impl ContactForm {
    pub fn from_fields(fields: &FormFields) -> Self {
        ContactForm {
            name: field(fields, "name"),
            email: field(fields, "email"),
            message: normalize_newlines(&field(fields, "message")),
        }
    }

    /// Blank form whose message is seeded for an enquiry about `service`.
    pub fn for_service(service: &str) -> Self {
        ContactForm { message: format!("Enquiry about service: {}\n\n", service), ..ContactForm::default() }
    }

    pub fn validate(&self) -> Result<ContactMessage, FormErrors> {
        let mut errors = FormErrors::new();
        check_required(&mut errors, "name", &self.name);
        check_max_len(&mut errors, "name", &self.name, 100);
        if self.email.is_empty() {
            errors.add("email", REQUIRED);
        } else {
            check_email(&mut errors, "email", &self.email);
        }
        let message = self.message.trim();
        if message.is_empty() {
            errors.add("message", REQUIRED);
        } else if message.chars().count() < MIN_MESSAGE_CHARS {
            errors.add("message", "Message is too short.");
        }

        errors.into_result(|| ContactMessage {
            name: self.name.clone(),
            email: self.email.clone(),
            message: message.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> FormFields {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn contact_message_needs_five_characters() {
        let short = ContactForm::from_fields(&fields(&[("name", "Ann"), ("email", "ann@example.org"), ("message", "hi")]));
        let errors = short.validate().unwrap_err();
        assert_eq!(errors.messages("message"), ["Message is too short.".to_string()]);

        let padded = ContactForm::from_fields(&fields(&[("name", "Ann"), ("email", "ann@example.org"), ("message", "   hey   ")]));
        assert!(padded.validate().unwrap_err().has("message"));

        let ok = ContactForm::from_fields(&fields(&[("name", "Ann"), ("email", "ann@example.org"), ("message", "Hello there")]));
        assert_eq!(ok.validate().unwrap().message, "Hello there");
    }

    #[test]
    fn contact_requires_a_valid_email_and_short_name() {
        let long_name = "x".repeat(101);
        let form = ContactForm::from_fields(&fields(&[("name", &long_name), ("email", "nobody"), ("message", "Hello there")]));
        let errors = form.validate().unwrap_err();
        assert!(errors.has("name"));
        assert!(errors.has("email"));
        assert!(!errors.has("message"));
    }

    #[test]
    fn service_prefill_mentions_the_service() {
        assert_eq!(ContactForm::for_service("waste").message, "Enquiry about service: waste\n\n");
    }

    #[test]
    fn project_form_reports_every_bad_field() {
        let form = ProjectForm::from_fields(&fields(&[("budget", "lots"), ("image", "not a url"), ("category", "x")]));
        let mut errors = FormErrors::new();
        form.clean(&mut errors);
        for name in ["title", "description", "budget", "image", "category", "council"] {
            assert!(errors.has(name), "expected an error on {}", name);
        }
    }

    #[test]
    fn project_form_cleans_valid_input() {
        let form = ProjectForm::from_fields(&fields(&[
            ("title", " Bridge repair "),
            ("description", "Line one\r\nLine two"),
            ("budget", "250000"),
            ("council", "3"),
            ("category", ""),
        ]));
        let mut errors = FormErrors::new();
        let new = form.clean(&mut errors);
        assert!(errors.is_empty(), "{:?}", errors);
        assert_eq!(new.title, "Bridge repair");
        assert_eq!(new.description, "Line one\nLine two");
        assert_eq!(new.budget, 250_000);
        assert_eq!(new.council_id, 3);
        assert_eq!(new.category_id, None);
    }

    #[test]
    fn contract_values_are_rounded_and_bounded() {
        let mut errors = FormErrors::new();
        let (supplier, value) = ContractForm::from_fields(&fields(&[("supplier", "4"), ("contract_value", "£12,500.505")])).clean(&mut errors);
        assert!(errors.is_empty());
        assert_eq!(supplier, 4);
        assert_eq!(value, Some(Decimal::new(1_250_051, 2)));

        let mut errors = FormErrors::new();
        ContractForm::from_fields(&fields(&[("supplier", "4"), ("contract_value", "-1")])).clean(&mut errors);
        assert!(errors.has("contract_value"));

        let mut errors = FormErrors::new();
        let (_, value) = ContractForm::from_fields(&fields(&[("supplier", "4")])).clean(&mut errors);
        assert!(errors.is_empty());
        assert_eq!(value, None);
    }

    #[test]
    fn event_form_parses_date_and_time() {
        let form = EventForm::from_fields(&fields(&[("title", "Ribbon cutting"), ("date", "2025-12-25"), ("time", "14:30"), ("project", "9")]));
        let mut errors = FormErrors::new();
        let new = form.clean(&mut errors).expect("valid event");
        assert!(errors.is_empty());
        assert_eq!(new.date, NaiveDate::from_ymd_opt(2025, 12, 25).unwrap());
        assert_eq!(new.time, NaiveTime::from_hms_opt(14, 30, 0));
        assert_eq!(new.project_id, Some(9));

        let bad = EventForm::from_fields(&fields(&[("title", "x"), ("date", "25/12/2025"), ("time", "late")]));
        let mut errors = FormErrors::new();
        assert!(bad.clean(&mut errors).is_none());
        assert!(errors.has("date") && errors.has("time"));
    }
}
