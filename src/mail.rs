use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::MailConfig;

/// Outbound email capability.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()>;
}

/// Writes mail to the log instead of delivering it. Used when no provider is configured.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()> {
        info!(%to, %subject, %body, "mail delivery disabled; logging message");
        Ok(())
    }
}

/// Posts mail as JSON to an HTTP email API (Resend-style `{from, to, subject, text}`).
pub struct HttpMailer {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
    from: String,
}

#[derive(Serialize)]
struct OutgoingMail<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    text: &'a str,
}

impl HttpMailer {
    pub fn new(api_url: String, api_key: Option<String>, from: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url,
            api_key,
            from,
        }
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()> {
        let mut req = self.client.post(&self.api_url).json(&OutgoingMail {
            from: &self.from,
            to: [to],
            subject,
            text: body,
        });
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        req.send()
            .await
            .context("send mail request")?
            .error_for_status()
            .context("mail provider rejected message")?;
        debug!(%to, "mail accepted by provider");
        Ok(())
    }
}

pub fn from_config(cfg: &MailConfig) -> Arc<dyn Mailer> {
    match &cfg.api_url {
        Some(url) => Arc::new(HttpMailer::new(
            url.clone(),
            cfg.api_key.clone(),
            cfg.from.clone(),
        )) as Arc<dyn Mailer>,
        None => Arc::new(LogMailer) as Arc<dyn Mailer>,
    }
}
