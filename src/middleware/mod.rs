use actix_session::{Session, SessionExt};
use actix_web::{dev, FromRequest, HttpRequest};
use std::future::{ready, Ready};

use crate::models::Notification;

const NOTIFICATION_KEY: &str = "notification";

/// Queues a one-shot message for the next page the visitor sees.
pub fn set_notification(session: &Session, message: &str, r#type: &str) {
    let notification = Notification { message: message.to_string(), r#type: r#type.to_string() };
    if let Err(e) = session.insert(NOTIFICATION_KEY, &notification) {
        log::error!("Failed to store notification in session: {}", e);
    }
}

/// The pending notification, if any. Extracting it removes it from the
/// session, so it is shown exactly once.
pub struct Flash(pub Option<Notification>);

impl FromRequest for Flash {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut dev::Payload) -> Self::Future {
        let session = req.get_session();
        let notification = match session.remove_as::<Notification>(NOTIFICATION_KEY) {
            Some(Ok(n)) => Some(n),
            Some(Err(raw)) => {
                log::warn!("Discarding unreadable notification from session: {}", raw);
                None
            }
            None => None,
        };
        ready(Ok(Flash(notification)))
    }
}
