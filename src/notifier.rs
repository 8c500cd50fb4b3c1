// src/notifier.rs
use crate::config::WebhookConfig;
use anyhow::Result;
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use sha2::Sha256;
use std::collections::BTreeSet;
use tracing::debug;

type HmacSha256 = Hmac<Sha256>;

/// Delivers new-subdomain alerts somewhere.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, domain: &str, new_subdomains: &BTreeSet<String>) -> Result<()>;
}

/// Discord-style webhook notifier: JSON body with a single `content` field,
/// success is HTTP 204 No Content.
#[derive(Clone)]
pub struct Notifier {
    client: Client,
    cfg: WebhookConfig,
}

#[derive(Serialize)]
struct NotificationPayload<'a> {
    content: &'a str,
}

impl Notifier {
    pub fn new(cfg: WebhookConfig) -> Self {
        let client = Client::new();
        Self { client, cfg }
    }
}

#[async_trait]
impl NotificationSink for Notifier {
    async fn notify(&self, domain: &str, new_subdomains: &BTreeSet<String>) -> Result<()> {
        if new_subdomains.is_empty() {
            // Never send an empty notification
            return Ok(());
        }

        let mut content = format!("**New subdomains found for {}:**", domain);
        for subdomain in new_subdomains {
            content.push('\n');
            content.push_str(subdomain);
        }

        let payload = NotificationPayload { content: &content };
        let body = serde_json::to_vec(&payload)?;

        let timeout_secs = self.cfg.timeout_secs.unwrap_or(5);
        let mut req = self
            .client
            .post(&self.cfg.url)
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .body(body.clone())
            .header("Content-Type", "application/json");

        // Optional HMAC signature header
        if let Some(secret) = &self.cfg.secret {
            let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
                .map_err(|e| anyhow::anyhow!("HMAC init error: {:?}", e))?;
            mac.update(&body);
            let sig = mac.finalize().into_bytes();
            let sig_hex = hex::encode(sig);
            req = req.header("X-Subwatch-Signature", sig_hex);
        }

        let resp = req.send().await?;

        // Discord signals success with 204; anything else is a delivery failure
        if resp.status() != StatusCode::NO_CONTENT {
            anyhow::bail!("Webhook delivery failed: status {}", resp.status());
        }

        debug!("Notification sent for {}", domain);

        Ok(())
    }
}
