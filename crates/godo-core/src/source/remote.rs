//! HTTP client for the events API.

use std::time::Duration;

use reqwest::Client;
use serde_json::json;
use url::Url;

use super::{parse_items, ItemSource};
use crate::dispatch::Decision;
use crate::error::SourceError;
use crate::item::Item;

/// Remote events API.
///
/// `GET {base_url}/events` returns the item list; `POST {base_url}/swipes`
/// records a decision.
#[derive(Debug, Clone)]
pub struct RemoteSource {
    http_client: Client,
    base_url: Url,
}

impl RemoteSource {
    /// Create a client. `timeout` bounds every request.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, SourceError> {
        let mut base_url = Url::parse(base_url)?;
        // Keep the last path segment when joining relative endpoints.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, SourceError> {
        Ok(self.base_url.join(path)?)
    }
}

/// Request body for the swipes endpoint.
pub(crate) fn swipe_body(decision: &Decision) -> serde_json::Value {
    let direction = decision.direction;
    json!({
        "event_id": &decision.item_id,
        "direction": direction.swipe(),
        "action": direction.action(),
        "visibility": direction.visibility().unwrap_or("private"),
        "calendar_type": match direction.visibility() {
            Some("friends") => "shared",
            _ => "private",
        },
        "created_at": decision.decided_at.to_rfc3339(),
    })
}

impl ItemSource for RemoteSource {
    fn name(&self) -> &str {
        "remote"
    }

    async fn fetch(&self) -> Result<Vec<Item>, SourceError> {
        let url = self.endpoint("events")?;
        let resp = self
            .http_client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
            });
        }

        let body = resp.text().await?;
        parse_items(&body, "remote")
    }

    async fn mirror_decision(&self, decision: &Decision) -> Result<(), SourceError> {
        let url = self.endpoint("swipes")?;
        let resp = self
            .http_client
            .post(url)
            .json(&swipe_body(decision))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}
