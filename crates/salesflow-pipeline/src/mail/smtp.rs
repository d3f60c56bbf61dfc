use lettre::{transport::smtp::authentication::Credentials, AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use salesflow_common::{PipelineError, Result};
use salesflow_config::SmtpConfig;
use tracing::info;

use super::{EmailMessage, MailClient};

pub struct SmtpMailClient {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpMailClient {
    pub fn new(smtp: &SmtpConfig, from: &str) -> Result<Self> {
        let builder = if smtp.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)
                .map_err(|e| PipelineError::mail_with_source("Failed to create SMTP transport", e))?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&smtp.host)
        };

        let mut builder = builder.port(smtp.port);
        if let (Some(username), Some(password)) = (&smtp.username, &smtp.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            from: from.to_string(),
        })
    }
}

#[async_trait::async_trait]
impl MailClient for SmtpMailClient {
    async fn send(&self, message: EmailMessage) -> Result<()> {
        let email = message.to_lettre(&self.from)?;

        let response = self
            .transport
            .send(email)
            .await
            .map_err(|e| PipelineError::mail_with_source("Failed to send email via SMTP", e))?;

        info!("Email to {} accepted by relay (code {})", message.to, response.code());
        Ok(())
    }
}
