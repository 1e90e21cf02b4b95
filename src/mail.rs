use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use serde_json::json;
use tracing::warn;

use crate::config::MailConfig;

/// Outbound mail delivery. Behind a trait so tests and local runs can swap in
/// a no-op client.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, text: &str) -> anyhow::Result<()>;
}

/// Mailer backed by a SendGrid-compatible HTTP API.
pub struct HttpMailer {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    from: String,
}

impl HttpMailer {
    pub fn new(config: &MailConfig, api_key: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: config.api_url.clone(),
            api_key: api_key.to_string(),
            from: config.from.clone(),
        }
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, to: &str, subject: &str, text: &str) -> anyhow::Result<()> {
        let payload = mail_payload(&self.from, to, subject, text);
        let resp = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .context("mail api request")?;
        resp.error_for_status().context("mail api status")?;
        Ok(())
    }
}

fn mail_payload(from: &str, to: &str, subject: &str, text: &str) -> serde_json::Value {
    json!({
        "personalizations": [{ "to": [{ "email": to }] }],
        "from": { "email": from },
        "subject": subject,
        "content": [{ "type": "text/plain", "value": text }],
    })
}

/// Mailer that drops everything. Used when no API key is configured and by
/// `AppState::fake()`.
pub struct NoopMailer;

#[async_trait]
impl Mailer for NoopMailer {
    async fn send(&self, _to: &str, _subject: &str, _text: &str) -> anyhow::Result<()> {
        Ok(())
    }
}

pub fn welcome_body(name: &str) -> String {
    format!("Welcome to the app, {name}. Let us know how you get along with it.")
}

pub fn cancellation_body(name: &str) -> String {
    format!("Sorry to see you go, {name}. Is there anything we could have done better?")
}

/// Dispatch the welcome mail without awaiting delivery. Failures are logged
/// and swallowed.
pub fn queue_welcome(mailer: Arc<dyn Mailer>, to: String, name: String) {
    tokio::spawn(async move {
        if let Err(e) = mailer
            .send(&to, "Thanks for joining in", &welcome_body(&name))
            .await
        {
            warn!(error = %e, %to, "welcome email delivery failed");
        }
    });
}

/// Dispatch the cancellation mail without awaiting delivery.
pub fn queue_cancellation(mailer: Arc<dyn Mailer>, to: String, name: String) {
    tokio::spawn(async move {
        if let Err(e) = mailer
            .send(&to, "Sorry to see you leave", &cancellation_body(&name))
            .await
        {
            warn!(error = %e, %to, "cancellation email delivery failed");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_has_provider_shape() {
        let p = mail_payload("noreply@userhub.dev", "ana@example.com", "Hi", "hello");
        assert_eq!(
            p["personalizations"][0]["to"][0]["email"],
            "ana@example.com"
        );
        assert_eq!(p["from"]["email"], "noreply@userhub.dev");
        assert_eq!(p["subject"], "Hi");
        assert_eq!(p["content"][0]["type"], "text/plain");
        assert_eq!(p["content"][0]["value"], "hello");
    }

    #[test]
    fn bodies_mention_the_user() {
        assert!(welcome_body("Ana").contains("Ana"));
        assert!(cancellation_body("Ana").contains("Ana"));
    }

    #[tokio::test]
    async fn noop_mailer_always_succeeds() {
        NoopMailer
            .send("a@b.c", "s", "t")
            .await
            .expect("noop send ok");
    }
}
