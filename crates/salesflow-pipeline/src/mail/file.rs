use std::path::{Path, PathBuf};

use lettre::{AsyncFileTransport, AsyncTransport, Tokio1Executor};
use salesflow_common::{PipelineError, Result};
use tracing::info;

use super::{EmailMessage, MailClient};

/// Writes each message as an `.eml` file instead of delivering it
pub struct FileMailClient {
    dir: PathBuf,
    transport: AsyncFileTransport<Tokio1Executor>,
    from: String,
}

impl FileMailClient {
    pub fn new(dir: &Path, from: &str) -> Self {
        Self {
            dir: dir.to_path_buf(),
            transport: AsyncFileTransport::new(dir),
            from: from.to_string(),
        }
    }
}

#[async_trait::async_trait]
impl MailClient for FileMailClient {
    async fn send(&self, message: EmailMessage) -> Result<()> {
        let email = message.to_lettre(&self.from)?;

        tokio::fs::create_dir_all(&self.dir).await?;
        let id = self
            .transport
            .send(email)
            .await
            .map_err(|e| PipelineError::mail_with_source("Failed to write email file", e))?;

        info!("Email to {} written to {}", message.to, self.dir.join(format!("{id}.eml")).display());
        Ok(())
    }
}
