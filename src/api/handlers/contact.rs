use super::valid_email;
use crate::{
    email::{self, EmailMessage, EmailSender},
    settings::Settings,
};
use axum::{
    extract::Extension,
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Deserialize, Debug, Default)]
pub struct ContactForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub message: String,
}

impl ContactForm {
    fn field(&self, name: &str) -> &str {
        match name {
            "name" => &self.name,
            "email" => &self.email,
            "subject" => &self.subject,
            "message" => &self.message,
            _ => "",
        }
    }
}

fn submission_body(form: &ContactForm) -> String {
    format!(
        "<h3>New Contact Form Submission</h3>\
         <p><strong>Name:</strong> {}</p>\
         <p><strong>Email:</strong> {}</p>\
         <p><strong>Subject:</strong> {}</p>\
         <p><strong>Message:</strong></p>\
         <p>{}</p>\
         <hr>\
         <p><em>Sent from your portfolio website at {}</em></p>",
        form.name,
        form.email,
        form.subject,
        form.message.replace('\n', "<br>"),
        Utc::now().format("%Y-%m-%d %H:%M:%S"),
    )
}

/// Relay a contact form submission to the site owner.
pub async fn submit(
    settings: Extension<Arc<Settings>>,
    sender: Extension<Arc<dyn EmailSender>>,
    Json(form): Json<ContactForm>,
) -> (StatusCode, Json<serde_json::Value>) {
    let contact = settings.0.contact();

    for field in &contact.required_fields {
        if form.field(field).trim().is_empty() {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "success": false,
                    "message": "Please fill in all required fields.",
                })),
            );
        }
    }

    if !valid_email(form.email.trim()) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "success": false,
                "message": "Please provide a valid email address.",
            })),
        );
    }

    if form.message.len() > contact.max_message_length {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "success": false,
                "message": format!(
                    "Message too long. Maximum {} characters allowed.",
                    contact.max_message_length
                ),
            })),
        );
    }

    let message = EmailMessage {
        to: settings.0.admin_email().to_string(),
        subject: format!("Portfolio Contact: {}", form.subject.trim()),
        html_body: submission_body(&form),
    };

    match email::deliver(sender.0.clone(), message).await {
        Ok(()) => {
            info!("Contact form submitted by {}", form.email.trim());

            (
                StatusCode::OK,
                Json(json!({
                    "success": true,
                    "message": contact.success_message,
                })),
            )
        }
        Err(error) => {
            error!("Error sending contact email: {error}");

            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "success": false,
                    "message": contact.error_message,
                })),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::email::testing::RecordingSender;
    use std::path::PathBuf;

    fn settings() -> Arc<Settings> {
        Arc::new(
            Settings::new(PathBuf::from("data"), PathBuf::from("static"))
                .with_admin_email("owner@example.com".to_string()),
        )
    }

    fn form() -> ContactForm {
        ContactForm {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            subject: "Hello".to_string(),
            message: "Nice site".to_string(),
        }
    }

    #[tokio::test]
    async fn submit_relays_to_admin_email() {
        let recorder = Arc::new(RecordingSender::ok());
        let sender: Arc<dyn EmailSender> = recorder.clone();

        let (status, _) = submit(Extension(settings()), Extension(sender), Json(form())).await;
        assert_eq!(status, StatusCode::OK);

        let sent = recorder.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "owner@example.com");
        assert_eq!(sent[0].subject, "Portfolio Contact: Hello");
        assert!(sent[0].html_body.contains("Ada"));
    }

    #[tokio::test]
    async fn submit_rejects_missing_required_fields() {
        let recorder = Arc::new(RecordingSender::ok());
        let sender: Arc<dyn EmailSender> = recorder.clone();

        let mut incomplete = form();
        incomplete.message = "   ".to_string();

        let (status, _) = submit(Extension(settings()), Extension(sender), Json(incomplete)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(recorder.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn submit_rejects_bad_email_and_long_message() {
        let recorder = Arc::new(RecordingSender::ok());
        let sender: Arc<dyn EmailSender> = recorder.clone();

        let mut bad_email = form();
        bad_email.email = "not-an-email".to_string();
        let (status, _) = submit(
            Extension(settings()),
            Extension(sender.clone()),
            Json(bad_email),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let mut long = form();
        long.message = "x".repeat(5001);
        let (status, _) = submit(Extension(settings()), Extension(sender), Json(long)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn submit_reports_delivery_failures() {
        let recorder = Arc::new(RecordingSender::failing());
        let sender: Arc<dyn EmailSender> = recorder.clone();

        let (status, _) = submit(Extension(settings()), Extension(sender), Json(form())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
