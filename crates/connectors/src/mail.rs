//! Mail provider client: transactional sends plus list management, the same
//! upstream API for both.

use async_trait::async_trait;
use reqwest::Url;
use serde::Serialize;
use serde_json::json;
use std::time::Duration;

use engine::{Email, EngineError, MailingList, Notifier, SubscriberAttributes};

use crate::REQUEST_TIMEOUT_SECS;

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    to: &'a str,
    subject: &'a str,
    html: &'a str,
    tags: &'a [&'a str],
}

#[derive(Debug, Clone)]
pub struct MailApiClient {
    base_url: Url,
    api_key: String,
    http: reqwest::Client,
}

impl MailApiClient {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, EngineError> {
        let base_url = Url::parse(base_url)
            .map_err(|err| EngineError::Configuration(format!("invalid mail base_url: {err}")))?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|err| EngineError::Configuration(format!("mail client: {err}")))?;

        Ok(Self {
            base_url,
            api_key: api_key.to_string(),
            http,
        })
    }

    async fn post(&self, path: &str, body: serde_json::Value) -> Result<(), EngineError> {
        let endpoint = self
            .base_url
            .join(path)
            .map_err(|err| EngineError::Integration(format!("invalid mail url: {err}")))?;

        let res = self
            .http
            .post(endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| EngineError::Integration(err.to_string()))?;

        if !res.status().is_success() {
            return Err(EngineError::Integration(format!(
                "mail provider returned {}",
                res.status()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for MailApiClient {
    async fn send(&self, to: &str, email: &Email, tags: &[&str]) -> Result<(), EngineError> {
        let request = SendRequest {
            to,
            subject: &email.subject,
            html: &email.html,
            tags,
        };
        self.post("api/v1/send", json!(request)).await
    }
}

#[async_trait]
impl MailingList for MailApiClient {
    async fn add_subscriber(
        &self,
        email: &str,
        list_id: &str,
        attributes: &SubscriberAttributes,
    ) -> Result<(), EngineError> {
        self.post(
            &format!("api/v1/lists/{list_id}/subscribers"),
            json!({
                "email": email,
                "name": attributes.name,
                "phone": attributes.phone,
                "purchase_kind": attributes.purchase_kind,
                "purchase_item": attributes.purchase_item,
                "purchased_at": attributes.purchased_at,
                "amount": attributes.amount,
            }),
        )
        .await
    }
}
