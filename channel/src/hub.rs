//! One-shot registration of this channel with a hub.

use anyhow::{bail, Context};
use serde::Serialize;
use tracing::{error, info};

use crate::auth::AUTH_SCHEME;

/// Body of `POST {hub}/channels`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Registration {
    pub name: String,
    pub endpoint: String,
    /// The key clients must present when posting to this channel.
    pub authkey: String,
    pub type_of_service: String,
}

#[derive(Debug, Clone)]
pub struct HubClient {
    client: reqwest::Client,
    hub_url: String,
    hub_authkey: String,
}

impl HubClient {
    pub fn new(hub_url: impl Into<String>, hub_authkey: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            hub_url: hub_url.into().trim_end_matches('/').to_string(),
            hub_authkey: hub_authkey.into(),
        }
    }

    pub async fn register(&self, registration: &Registration) -> anyhow::Result<()> {
        let url = format!("{}/channels", self.hub_url);
        let resp = self
            .client
            .post(&url)
            .header(
                reqwest::header::AUTHORIZATION,
                format!("{AUTH_SCHEME} {}", self.hub_authkey),
            )
            .json(registration)
            .send()
            .await
            .with_context(|| format!("POST {url}"))?;

        let status = resp.status();
        if status != reqwest::StatusCode::OK {
            let body = resp.text().await.unwrap_or_default();
            bail!("hub rejected registration ({status}): {body}");
        }
        Ok(())
    }

    /// Register and log the outcome. Failure never stops the channel.
    pub async fn register_best_effort(&self, registration: &Registration) {
        match self.register(registration).await {
            Ok(()) => info!(hub = %self.hub_url, name = %registration.name, "channel registered"),
            Err(e) => error!(hub = %self.hub_url, "channel registration failed: {:#}", e),
        }
    }
}
