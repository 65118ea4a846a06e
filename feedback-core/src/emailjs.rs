//! EmailJS Sender
//!
//! Relays feedback through the EmailJS REST endpoint using the configured
//! service, template and public key.

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, error};

use crate::config::EmailJsConfig;
use crate::error::DeliveryError;
use crate::sender::{FeedbackMessage, FeedbackSender};

#[derive(Debug, Serialize)]
struct TemplateParams<'a> {
    category: &'a str,
    feedback: &'a str,
}

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    service_id: &'a str,
    template_id: &'a str,
    user_id: &'a str,
    template_params: TemplateParams<'a>,
}

#[derive(Clone)]
pub struct EmailJsSender {
    config: EmailJsConfig,
    client: reqwest::Client,
}

impl EmailJsSender {
    pub fn new(config: EmailJsConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Build from environment variables; missing credentials are an error.
    pub fn from_env() -> Result<Self, crate::error::ConfigError> {
        Ok(Self::new(EmailJsConfig::from_env()?))
    }

    fn request_body<'a>(&'a self, message: &'a FeedbackMessage) -> SendRequest<'a> {
        SendRequest {
            service_id: &self.config.service_id,
            template_id: &self.config.template_id,
            user_id: &self.config.public_key,
            template_params: TemplateParams {
                category: message.category.as_str(),
                feedback: &message.feedback,
            },
        }
    }
}

#[async_trait]
impl FeedbackSender for EmailJsSender {
    async fn send(&self, message: &FeedbackMessage) -> Result<(), DeliveryError> {
        debug!(
            service_id = %self.config.service_id,
            template_id = %self.config.template_id,
            category = %message.category,
            "Sending feedback via EmailJS"
        );

        let response = self
            .client
            .post(&self.config.api_url)
            .json(&self.request_body(message))
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "EmailJS request failed");
                DeliveryError::Transport(e.to_string())
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            error!(status, body = %body, "EmailJS rejected feedback");
            return Err(DeliveryError::Rejected { status, body });
        }

        Ok(())
    }

    fn provider_name(&self) -> &str {
        "EmailJS"
    }
}
