//! Invoice API client for the payment gateway.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::Deserialize;
use std::time::Duration;

use engine::{EngineError, Invoice, InvoiceStatus, PaymentGateway};

use crate::REQUEST_TIMEOUT_SECS;

#[derive(Debug, Deserialize)]
struct InvoiceDto {
    id: String,
    status: String,
    amount: Option<i64>,
    paid_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    message: String,
}

#[derive(Debug, Clone)]
pub struct InvoiceApiClient {
    base_url: Url,
    api_key: String,
    http: reqwest::Client,
}

impl InvoiceApiClient {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, EngineError> {
        let base_url = Url::parse(base_url)
            .map_err(|err| EngineError::Configuration(format!("invalid gateway base_url: {err}")))?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|err| EngineError::Configuration(format!("gateway client: {err}")))?;

        Ok(Self {
            base_url,
            api_key: api_key.to_string(),
            http,
        })
    }
}

#[async_trait]
impl PaymentGateway for InvoiceApiClient {
    async fn get_invoice(&self, reference: &str) -> Result<Invoice, EngineError> {
        let endpoint = self
            .base_url
            .join(&format!("v2/invoices/{reference}"))
            .map_err(|err| EngineError::Gateway(format!("invalid invoice url: {err}")))?;

        let res = self
            .http
            .get(endpoint)
            .basic_auth(&self.api_key, Option::<&str>::None)
            .send()
            .await
            .map_err(|err| EngineError::Gateway(err.to_string()))?;

        if !res.status().is_success() {
            let status = res.status();
            let message = res
                .json::<ErrorResponse>()
                .await
                .map(|body| body.message)
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(EngineError::Gateway(format!(
                "invoice query returned {status}: {message}"
            )));
        }

        let dto = res
            .json::<InvoiceDto>()
            .await
            .map_err(|err| EngineError::Gateway(err.to_string()))?;

        Ok(Invoice {
            id: dto.id,
            status: InvoiceStatus::parse(&dto.status),
            amount: dto.amount,
            paid_at: dto.paid_at,
        })
    }
}
