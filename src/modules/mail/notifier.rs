use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::core::config::MailConfig;
use crate::core::error::{AppError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Fire-and-forget e-mail delivery. Errors are `ExternalServiceError`.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, mail: &OutgoingMail) -> Result<()>;
}

/// Select the mailer for the current configuration
pub fn mailer_from_config(config: &MailConfig) -> Arc<dyn Notifier> {
    match &config.api_url {
        Some(url) => {
            tracing::info!("E-mail notifications via HTTP API at {}", url);
            Arc::new(HttpMailer::new(
                url.clone(),
                config.api_key.clone(),
                config.from.clone(),
            ))
        }
        None => {
            tracing::info!("MAIL_API_URL not set, e-mail notifications will be logged only");
            Arc::new(LogMailer)
        }
    }
}

pub struct LogMailer;

#[async_trait]
impl Notifier for LogMailer {
    async fn send(&self, mail: &OutgoingMail) -> Result<()> {
        tracing::info!(to = %mail.to, subject = %mail.subject, "E-mail (log only): {}", mail.body);
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct SendMailRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

pub struct HttpMailer {
    api_url: String,
    api_key: Option<String>,
    from: String,
    http_client: reqwest::Client,
}

impl HttpMailer {
    pub fn new(api_url: String, api_key: Option<String>, from: String) -> Self {
        Self {
            api_url,
            api_key,
            from,
            http_client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Notifier for HttpMailer {
    async fn send(&self, mail: &OutgoingMail) -> Result<()> {
        let body = SendMailRequest {
            from: &self.from,
            to: &mail.to,
            subject: &mail.subject,
            text: &mail.body,
        };

        let mut request = self.http_client.post(&self.api_url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            AppError::ExternalServiceError(format!("Failed to reach mail API: {}", e))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalServiceError(format!(
                "Mail API error: HTTP {} - {}",
                status, text
            )));
        }

        tracing::debug!(to = %mail.to, "E-mail accepted by mail API");
        Ok(())
    }
}
