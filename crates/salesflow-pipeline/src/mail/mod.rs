//! Outgoing mail: message model, lettre message building and transports

use std::path::Path;
use std::sync::Arc;

use lettre::message::{header::ContentType, Attachment as MailAttachment, Mailbox, MultiPart, SinglePart};
use lettre::Message;
use salesflow_common::{PipelineError, Result};
use salesflow_config::{MailTransportKind, NotificationConfig};

mod file;
mod smtp;

pub use file::FileMailClient;
pub use smtp::SmtpMailClient;

/// A file attached to an outgoing message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub content_type: String,
    pub body: Vec<u8>,
}

impl Attachment {
    /// Read `path` into an attachment named after the file
    pub async fn from_path(path: &Path, content_type: &str, kind: &str) -> Result<Self> {
        let body = match tokio::fs::read(path).await {
            Ok(body) => body,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(PipelineError::missing_artifact(kind, path));
            }
            Err(e) => return Err(e.into()),
        };
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| PipelineError::mail(format!("Attachment path has no file name: {}", path.display())))?
            .to_string();

        Ok(Self {
            filename,
            content_type: content_type.to_string(),
            body,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html_body: String,
    pub attachments: Vec<Attachment>,
}

impl EmailMessage {
    /// Build the MIME message: an HTML part followed by the attachments in order
    pub fn to_lettre(&self, from: &str) -> Result<Message> {
        let from: Mailbox = from
            .parse()
            .map_err(|e| PipelineError::mail_with_source(format!("Invalid from address: {from}"), e))?;
        let to: Mailbox = self
            .to
            .parse()
            .map_err(|e| PipelineError::mail_with_source(format!("Invalid to address: {}", self.to), e))?;

        let mut body = MultiPart::mixed().singlepart(SinglePart::html(self.html_body.clone()));
        for attachment in &self.attachments {
            let content_type = ContentType::parse(&attachment.content_type).map_err(|e| {
                PipelineError::mail_with_source(format!("Invalid content type: {}", attachment.content_type), e)
            })?;
            body = body.singlepart(
                MailAttachment::new(attachment.filename.clone()).body(attachment.body.clone(), content_type),
            );
        }

        Message::builder()
            .from(from)
            .to(to)
            .subject(self.subject.clone())
            .multipart(body)
            .map_err(|e| PipelineError::mail_with_source("Failed to build email", e))
    }
}

#[async_trait::async_trait]
pub trait MailClient: Send + Sync {
    async fn send(&self, message: EmailMessage) -> Result<()>;
}

pub type DynMailClient = Arc<dyn MailClient>;

/// Build the mail client selected by the notification settings
pub fn create_mail_client(config: &NotificationConfig) -> Result<DynMailClient> {
    match config.transport {
        MailTransportKind::Smtp => Ok(Arc::new(SmtpMailClient::new(&config.smtp, &config.from)?)),
        MailTransportKind::File => Ok(Arc::new(FileMailClient::new(&config.file_dir, &config.from))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message() -> EmailMessage {
        EmailMessage {
            to: "finance@example.com".to_string(),
            subject: "📊 Daily Sales Revenue Report".to_string(),
            html_body: "<h3>Attached are today's sales revenue results.</h3>".to_string(),
            attachments: vec![
                Attachment {
                    filename: "daily_revenue.csv".to_string(),
                    content_type: "text/csv".to_string(),
                    body: b"order_date,daily_revenue\n".to_vec(),
                },
                Attachment {
                    filename: "revenue_report.txt".to_string(),
                    content_type: "text/plain".to_string(),
                    body: b"report".to_vec(),
                },
            ],
        }
    }

    #[test]
    fn test_message_contains_parts_in_order() {
        let built = message().to_lettre("Salesflow <salesflow@example.com>").unwrap();
        let raw = String::from_utf8(built.formatted()).unwrap();

        let csv_at = raw.find("daily_revenue.csv").unwrap();
        let report_at = raw.find("revenue_report.txt").unwrap();
        assert!(raw.contains("multipart/mixed"));
        assert!(raw.contains("text/html"));
        assert!(csv_at < report_at);
    }

    #[test]
    fn test_invalid_recipient_is_mail_error() {
        let mut message = message();
        message.to = "not an address".to_string();

        let err = message.to_lettre("salesflow@example.com").unwrap_err();
        assert!(matches!(err, PipelineError::Mail { .. }));
    }

    #[test]
    fn test_invalid_content_type_is_mail_error() {
        let mut message = message();
        message.attachments[0].content_type = "csv".to_string();

        assert!(message.to_lettre("salesflow@example.com").is_err());
    }

    #[tokio::test]
    async fn test_attachment_from_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = Attachment::from_path(&dir.path().join("absent.png"), "image/png", "chart")
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::MissingArtifact { .. }));
    }

    #[tokio::test]
    async fn test_attachment_uses_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("revenue_report.txt");
        tokio::fs::write(&path, "hello").await.unwrap();

        let attachment = Attachment::from_path(&path, "text/plain", "report").await.unwrap();
        assert_eq!(attachment.filename, "revenue_report.txt");
        assert_eq!(attachment.body, b"hello");
    }
}
