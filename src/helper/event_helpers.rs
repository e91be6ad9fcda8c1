use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use actix_multipart::Multipart;
use actix_web::web;
use chrono::NaiveDate;
use futures_util::StreamExt;
use rusqlite::Connection;
use serde::Serialize;
use uuid::Uuid;

use crate::helper::form_helpers::{FormErrors, FormFields, INVALID_CHOICE};
use crate::helper::{ensure_valid, get_conn, HelperError};
use crate::models::db_operations::{calendar_db_operations, councils_db_operations, projects_db_operations};
use crate::models::form_models::EventForm;
use crate::models::{Council, CouncilMeeting, Event, NewEvent};
use crate::DbPool;

/// Public URL prefix of uploaded event images; files live in `<MEDIA_PATH>/events`.
pub const EVENT_IMAGE_URL_PREFIX: &str = "/media/events";

/// Image types accepted for event uploads, with the extension they are saved under.
fn image_extension(mime_type: &str) -> Option<&'static str> {
    let map: BTreeMap<&str, &str> = [
        ("image/gif", "gif"),
        ("image/jpeg", "jpg"),
        ("image/png", "png"),
        ("image/webp", "webp"),
    ]
    .iter()
    .cloned()
    .collect();

    map.get(mime_type).cloned()
}

const INVALID_IMAGE: &str = "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";

/// Extension matching the image format the bytes start with, if any.
fn sniff_image_extension(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("png")
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("jpg")
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some("gif")
    } else if bytes.len() >= 12 && bytes.starts_with(b"RIFF") && &bytes[8..12] == b"WEBP" {
        Some("webp")
    } else {
        None
    }
}

#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub extension: &'static str,
    pub bytes: Vec<u8>,
}

/// A decoded event form post: the text fields, the image if one was attached,
/// and any problem with the upload itself.
#[derive(Debug, Default)]
pub struct EventSubmission {
    pub form: EventForm,
    pub image: Option<ImageUpload>,
    pub upload_errors: FormErrors,
}

#[derive(Debug, Serialize)]
pub struct EventFormChoices {
    pub councils: Vec<Council>,
    pub projects: Vec<(i64, String)>,
}

/// Reads a `multipart/form-data` event post. The image is buffered in memory
/// up to `max_upload_bytes`; nothing is written to disk here.
pub async fn read_event_submission(mut payload: Multipart, max_upload_bytes: u64) -> Result<EventSubmission, HelperError> {
    let mut fields = FormFields::new();
    let mut image = None;
    let mut upload_errors = FormErrors::new();

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| HelperError::Upload(e.to_string()))?;
        let field_name = field.content_disposition().get_name().unwrap_or_default().to_string();

        if field_name == "image_file" {
            let has_filename = field.content_disposition().get_filename().map_or(false, |f| !f.is_empty());
            let content_type = field.content_type().map(|m| m.essence_str().to_string()).unwrap_or_default();

            let mut data = Vec::new();
            let mut too_large = false;
            while let Some(chunk) = field.next().await {
                let chunk = chunk.map_err(|e| HelperError::Upload(e.to_string()))?;
                if too_large {
                    continue;
                }
                if (data.len() + chunk.len()) as u64 > max_upload_bytes {
                    too_large = true;
                    data.clear();
                    continue;
                }
                data.extend_from_slice(&chunk);
            }

            // Browsers send an empty part when no file was chosen.
            if !has_filename && data.is_empty() && !too_large {
                continue;
            }
            if too_large {
                upload_errors.add(
                    "image_file",
                    format!("File is too large. Maximum size is {}MB.", max_upload_bytes / (1024 * 1024)),
                );
                continue;
            }
            if data.is_empty() {
                upload_errors.add("image_file", "The submitted file is empty.");
                continue;
            }
            // The declared type has to be an image type and the bytes have to be one too.
            match (image_extension(&content_type), sniff_image_extension(&data)) {
                (Some(_), Some(extension)) => image = Some(ImageUpload { extension, bytes: data }),
                _ => upload_errors.add("image_file", INVALID_IMAGE),
            }
        } else {
            let mut data = web::BytesMut::new();
            while let Some(chunk) = field.next().await {
                data.extend_from_slice(&chunk.map_err(|e| HelperError::Upload(e.to_string()))?);
            }
            let value = String::from_utf8(data.to_vec())
                .map_err(|_| HelperError::Upload("Invalid UTF-8 in form field.".to_string()))?;
            fields.insert(field_name, value);
        }
    }

    Ok(EventSubmission { form: EventForm::from_fields(&fields), image, upload_errors })
}

/// Records an event date as the project's milestone by setting the project's
/// `end_date` to `date`, replacing any earlier value. Event creation runs this
/// in the same transaction as the insert whenever the event names a project.
pub fn schedule_project_milestone(conn: &Connection, project_id: i64, date: NaiveDate) -> Result<(), HelperError> {
    projects_db_operations::set_project_end_date(conn, project_id, date)?;
    log::info!("Project {} milestone set to {}", project_id, date);
    Ok(())
}

async fn save_event_image(events_dir: PathBuf, upload: ImageUpload) -> Result<(PathBuf, String), HelperError> {
    let file_name = format!("{}.{}", Uuid::new_v4(), upload.extension);
    let path = events_dir.join(&file_name);

    web::block({
        let path = path.clone();
        move || {
            fs::create_dir_all(&events_dir)?;
            fs::write(&path, &upload.bytes)
        }
    })
    .await??;

    Ok((path, format!("{}/{}", EVENT_IMAGE_URL_PREFIX, file_name)))
}

fn insert_event(conn: &mut Connection, new: &NewEvent) -> Result<i64, HelperError> {
    let tx = conn.transaction()?;
    let id = calendar_db_operations::create_event(&tx, new)?;
    if let Some(project_id) = new.project_id {
        schedule_project_milestone(&tx, project_id, new.date)?;
    }
    tx.commit()?;
    Ok(id)
}

async fn remove_event_image(path: PathBuf) {
    let shown = path.display().to_string();
    match web::block(move || fs::remove_file(path)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => log::warn!("Could not remove orphaned event image {}: {}", shown, e),
        Err(e) => log::warn!("Could not remove orphaned event image {}: {}", shown, e),
    }
}

/// Validates and stores an event, returning its id. Any uploaded image is
/// written under `<media_root>/events` only once the form is valid, and no
/// pooled connection is held while the file is written.
pub async fn create_event(pool: &DbPool, media_root: &Path, submission: EventSubmission) -> Result<i64, HelperError> {
    let mut errors = submission.upload_errors;
    let new = submission.form.clean(&mut errors);

    if let Some(new) = &new {
        let conn = get_conn(pool)?;
        if let Some(council_id) = new.council_id {
            if !councils_db_operations::council_exists(&conn, council_id)? {
                errors.add("council", INVALID_CHOICE);
            }
        }
        if let Some(project_id) = new.project_id {
            if !projects_db_operations::project_exists(&conn, project_id)? {
                errors.add("project", INVALID_CHOICE);
            }
        }
    }
    ensure_valid(errors)?;
    let mut new = new.ok_or(HelperError::NotFound)?;

    let saved = match submission.image {
        Some(upload) => Some(save_event_image(media_root.join("events"), upload).await?),
        None => None,
    };
    new.image_file = saved.as_ref().map(|(_, url)| url.clone());

    let stored = get_conn(pool).and_then(|mut conn| insert_event(&mut conn, &new));
    if stored.is_err() {
        if let Some((path, _)) = saved {
            remove_event_image(path).await;
        }
    }
    let id = stored?;
    log::info!("Created event {} '{}' on {}", id, new.title, new.date);
    Ok(id)
}

pub fn fetch_form_choices(pool: &DbPool) -> Result<EventFormChoices, HelperError> {
    let conn = get_conn(pool)?;
    Ok(EventFormChoices {
        councils: councils_db_operations::read_all_councils(&conn)?,
        projects: projects_db_operations::read_project_titles(&conn)?,
    })
}

pub fn fetch_event(pool: &DbPool, id: i64) -> Result<Event, HelperError> {
    let conn = get_conn(pool)?;
    calendar_db_operations::read_event(&conn, id)?.ok_or(HelperError::NotFound)
}

pub fn fetch_meeting(pool: &DbPool, id: i64) -> Result<CouncilMeeting, HelperError> {
    let conn = get_conn(pool)?;
    calendar_db_operations::read_meeting(&conn, id)?.ok_or(HelperError::NotFound)
}
