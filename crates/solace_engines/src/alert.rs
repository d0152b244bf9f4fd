#![forbid(unsafe_code)]

use std::env;

use solace_contracts::profile::EmailAddress;
use solace_contracts::{ContractViolation, Validate};

use crate::oracle::build_http_agent;

pub const ALERT_ENGINE_ID: &str = "CARE.ALERT";

/// Fixed subject line for caretaker notifications.
pub const ALERT_SUBJECT: &str =
    "High Urgency Alert: Immediate Attention Recommended for Your Loved One";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertMessage {
    pub to: EmailAddress,
    pub subject: String,
    pub html: String,
}

impl AlertMessage {
    pub fn v1(
        to: EmailAddress,
        subject: impl Into<String>,
        html: impl Into<String>,
    ) -> Result<Self, ContractViolation> {
        let m = Self {
            to,
            subject: subject.into(),
            html: html.into(),
        };
        m.validate()?;
        Ok(m)
    }
}

impl Validate for AlertMessage {
    fn validate(&self) -> Result<(), ContractViolation> {
        self.to.validate()?;
        if self.subject.trim().is_empty() {
            return Err(ContractViolation::InvalidValue {
                field: "alert_message.subject",
                reason: "must not be empty",
            });
        }
        if self.html.trim().is_empty() {
            return Err(ContractViolation::InvalidValue {
                field: "alert_message.html",
                reason: "must not be empty",
            });
        }
        Ok(())
    }
}

/// Delivery failure. `detail` carries the transport's own message text
/// verbatim; the re-classification step discloses it word for word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertSendError {
    pub detail: String,
}

pub trait AlertChannel {
    fn send(&self, message: &AlertMessage) -> Result<(), AlertSendError>;
}

#[derive(Debug, Clone)]
pub struct AlertDispatchRuntime;

impl AlertDispatchRuntime {
    pub fn new() -> Self {
        Self
    }

    /// Body quotes the triggering message verbatim and names the assessed
    /// urgency. Layout follows the caretaker-notification template.
    pub fn compose(&self, to: EmailAddress, triggering_message: &str) -> Result<AlertMessage, ContractViolation> {
        let html = format!(
            "<p>This is an automated alert from Solace, the mental wellness companion.</p>\
             <p>An interaction with the user has been flagged as requiring your attention. \
             The urgency has been assessed as: <strong>HIGH</strong>.</p>\
             <p>The message that triggered this alert was:</p>\
             <blockquote style=\"border-left: 4px solid #ccc; padding-left: 1rem; font-style: italic;\">\
             \"{triggering_message}\"\
             </blockquote>\
             <p>We recommend checking in with them when you have a moment.</p>\
             <p>Sincerely,<br/>The Solace Team</p>"
        );
        AlertMessage::v1(to, ALERT_SUBJECT, html)
    }

    /// Exactly one send attempt; no retry on failure.
    pub fn dispatch(
        &self,
        channel: &dyn AlertChannel,
        to: EmailAddress,
        triggering_message: &str,
    ) -> Result<(), AlertSendError> {
        let message = self.compose(to, triggering_message).map_err(|_| AlertSendError {
            detail: "alert message failed contract validation".to_string(),
        })?;
        channel.send(&message)
    }
}

impl Default for AlertDispatchRuntime {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookChannelConfig {
    pub webhook_url: Option<String>,
    pub user_agent: String,
    pub timeout_ms: u32,
}

impl WebhookChannelConfig {
    pub fn from_env() -> Self {
        Self {
            webhook_url: env::var("SOLACE_ALERT_WEBHOOK_URL")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            user_agent: env::var("SOLACE_ALERT_HTTP_USER_AGENT")
                .unwrap_or_else(|_| "solace-alert/1.0".to_string()),
            timeout_ms: env::var("SOLACE_ALERT_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .filter(|v| (500..=60_000).contains(v))
                .unwrap_or(10_000),
        }
    }
}

/// Webhook-backed delivery: one JSON POST per alert. A non-2xx status from
/// the hook still counts as delivered (the receiving automation owns its own
/// retries); only transport failures are dispatch failures.
#[derive(Debug, Clone)]
pub struct WebhookChannel {
    config: WebhookChannelConfig,
}

impl WebhookChannel {
    pub fn new(config: WebhookChannelConfig) -> Self {
        Self { config }
    }

    pub fn from_env() -> Self {
        Self::new(WebhookChannelConfig::from_env())
    }

    pub fn is_configured(&self) -> bool {
        self.config.webhook_url.is_some()
    }
}

impl AlertChannel for WebhookChannel {
    fn send(&self, message: &AlertMessage) -> Result<(), AlertSendError> {
        let Some(url) = self.config.webhook_url.as_deref() else {
            return Err(AlertSendError {
                detail: "alert webhook url is not configured".to_string(),
            });
        };
        let agent =
            build_http_agent(self.config.timeout_ms, &self.config.user_agent).map_err(|e| {
                AlertSendError { detail: e }
            })?;
        let payload = serde_json::json!({
            "to": message.to.as_str(),
            "subject": message.subject,
            "html": message.html,
        });
        match agent
            .post(url)
            .set("Content-Type", "application/json")
            .send_json(payload)
        {
            Ok(_) => Ok(()),
            Err(ureq::Error::Status(_, _)) => Ok(()),
            Err(ureq::Error::Transport(transport)) => Err(AlertSendError {
                detail: transport.to_string(),
            }),
        }
    }
}
