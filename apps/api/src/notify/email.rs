//! Transactional email through the Resend HTTP API.
//!
//! `ALLOW_EMAIL` decides delivery: `on` sends as addressed, `dev_only`
//! redirects every recipient other than `DEV_EMAIL` to `DEV_EMAIL`, and `off`
//! renders the message but only logs it.

use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::{Config, EmailMode};
use crate::llm_client::http_client;
use crate::policy::templates::{RenderError, Templates};

const RESEND_API_URL: &str = "https://api.resend.com/emails";

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Email API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("No recipient for the email")]
    NoRecipient,
}

#[derive(Debug, Clone)]
pub struct Attachment {
    pub filename: String,
    pub content: Vec<u8>,
}

#[derive(Debug, Serialize)]
struct ResendAttachment<'a> {
    filename: &'a str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResendEmail<'a> {
    from: &'a str,
    to: &'a [String],
    subject: &'a str,
    html: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attachments: Vec<ResendAttachment<'a>>,
}

#[derive(Debug, Deserialize)]
struct ResendResponse {
    id: String,
}

/// What happened to a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Sent { id: String, recipients: Vec<String> },
    Suppressed { recipients: Vec<String> },
}

/// Applies the delivery mode to a comma-separated recipient list.
pub fn resolve_recipients(mode: EmailMode, dev_email: Option<&str>, to: &str) -> Vec<String> {
    let target = match (mode, dev_email) {
        (EmailMode::DevOnly, Some(dev)) if to.trim() != dev => dev,
        _ => to,
    };
    target
        .split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Clone)]
pub struct EmailClient {
    client: Client,
    api_key: String,
    from: String,
    mode: EmailMode,
    dev_email: Option<String>,
    defaults: Map<String, Value>,
    templates: Arc<Templates>,
}

impl EmailClient {
    pub fn from_config(config: &Config, templates: Arc<Templates>) -> Self {
        let mut defaults = Map::new();
        defaults.insert("app_name".into(), Value::from(config.api_name.clone()));
        defaults.insert("app_url".into(), Value::from(config.base_url.clone()));
        defaults.insert("app_logo_url".into(), Value::from(config.app_logo.clone()));
        Self {
            client: http_client(Duration::from_secs(30)),
            api_key: config.resend_api_key.clone(),
            from: config.resend_from_email.clone(),
            mode: config.allow_email,
            dev_email: config.dev_email.clone(),
            defaults,
            templates,
        }
    }

    /// Context values win over the `app_*` defaults.
    fn merged_context(&self, context: Value) -> Value {
        let mut merged = self.defaults.clone();
        if let Value::Object(values) = context {
            merged.extend(values);
        }
        Value::Object(merged)
    }

    /// Renders `template` with `context` and sends it to `to`.
    pub async fn send(
        &self,
        template: &str,
        to: &str,
        subject: &str,
        context: Value,
        attachments: &[Attachment],
    ) -> Result<Delivery, EmailError> {
        let html = self.templates.render(template, self.merged_context(context))?;
        let recipients = resolve_recipients(self.mode, self.dev_email.as_deref(), to);
        if recipients.is_empty() {
            return Err(EmailError::NoRecipient);
        }

        if self.mode == EmailMode::Off {
            info!("Email '{subject}' not sent to {recipients:?} because ALLOW_EMAIL is off");
            return Ok(Delivery::Suppressed { recipients });
        }

        let body = ResendEmail {
            from: &self.from,
            to: &recipients,
            subject,
            html: &html,
            attachments: attachments
                .iter()
                .map(|a| ResendAttachment {
                    filename: &a.filename,
                    content: STANDARD.encode(&a.content),
                })
                .collect(),
        };

        let response = self
            .client
            .post(RESEND_API_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!("Resend returned {status}: {message}");
            return Err(EmailError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let sent: ResendResponse = response.json().await?;
        info!("Email '{subject}' sent to {recipients:?} (id {})", sent.id);
        Ok(Delivery::Sent {
            id: sent.id,
            recipients,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::{base_vars, config_from};
    use crate::policy::templates::EMAIL_POLICY;
    use serde_json::json;

    #[test]
    fn test_on_mode_splits_recipients() {
        assert_eq!(
            resolve_recipients(EmailMode::On, Some("dev@example.com"), "a@x.io, b@y.io,"),
            vec!["a@x.io", "b@y.io"]
        );
    }

    #[test]
    fn test_dev_only_redirects_other_addresses() {
        assert_eq!(
            resolve_recipients(EmailMode::DevOnly, Some("dev@example.com"), "ceo@alec.ae"),
            vec!["dev@example.com"]
        );
        assert_eq!(
            resolve_recipients(EmailMode::DevOnly, Some("dev@example.com"), "dev@example.com"),
            vec!["dev@example.com"]
        );
    }

    #[test]
    fn test_dev_email_may_hold_several_addresses() {
        assert_eq!(
            resolve_recipients(EmailMode::DevOnly, Some("a@dev.io,b@dev.io"), "ceo@alec.ae"),
            vec!["a@dev.io", "b@dev.io"]
        );
    }

    #[test]
    fn test_merged_context_keeps_explicit_values() {
        let config = config_from(&base_vars()).unwrap();
        let client = EmailClient::from_config(&config, Arc::new(Templates::new().unwrap()));
        let merged = client.merged_context(json!({"app_name": "Custom", "company": {"name": "ALEC"}}));
        assert_eq!(merged["app_name"], "Custom");
        assert_eq!(merged["app_url"], Value::from(config.base_url.clone()));
        assert_eq!(merged["company"]["name"], "ALEC");
    }

    #[tokio::test]
    async fn test_off_mode_suppresses_delivery() {
        let mut vars = base_vars();
        vars.insert("ALLOW_EMAIL", "off");
        let config = config_from(&vars).unwrap();
        let client = EmailClient::from_config(&config, Arc::new(Templates::new().unwrap()));
        let delivery = client
            .send(
                EMAIL_POLICY,
                "ceo@alec.ae",
                "Your policy",
                json!({"company": {"name": "ALEC"}, "document": {"filename": "doc-abc.pdf"}}),
                &[],
            )
            .await
            .unwrap();
        assert_eq!(
            delivery,
            Delivery::Suppressed {
                recipients: vec!["ceo@alec.ae".to_string()]
            }
        );
    }
}
