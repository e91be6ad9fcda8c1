use crate::models::form_models::ContactMessage;

/// Plain-text body of a service enquiry.
pub fn compose_service_request(service: &str, message: &ContactMessage) -> String {
    format!(
        "Service: {}\nFrom: {} <{}>\n\n{}",
        service, message.name, message.email, message.message
    )
}

/// Enquiries are not stored or mailed; they are written to the log.
pub fn submit_service_request(service: &str, message: &ContactMessage) {
    let body = compose_service_request(service, message);
    log::info!("Service request received:\n{}", body);
}

pub fn submit_contact_message(message: &ContactMessage) {
    log::info!("Contact message received from {} <{}>", message.name, message.email);
}
