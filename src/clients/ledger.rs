// File: src/clients/ledger.rs

//! HTTP client for the blockchain service REST API

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::error::LedgerError;
use crate::traits::{LedgerClient, LedgerTime, ReadResult, Transaction, ValueTimeLock};

/// Error code the service returns for an unknown read cursor
const INVALID_CURSOR_CODE: &str = "invalid_transaction_number_or_time_hash";

/// Ledger client configuration
#[derive(Debug, Clone)]
pub struct LedgerClientConfig {
    /// Blockchain service base URL
    pub base_url: String,

    /// Request timeout (seconds)
    pub timeout_secs: u64,
}

impl Default for LedgerClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3009".to_string(),
            timeout_secs: 30,
        }
    }
}

impl LedgerClientConfig {
    /// Create config from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var("SIDETREE_LEDGER_URL").unwrap_or(defaults.base_url),
            timeout_secs: std::env::var("SIDETREE_LEDGER_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.timeout_secs),
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    code: Option<String>,
}

/// Blockchain service client over HTTP
pub struct HttpLedgerClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpLedgerClient {
    pub fn new(config: LedgerClientConfig) -> Result<Self, LedgerError> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LedgerError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    fn map_send_error(&self, e: reqwest::Error) -> LedgerError {
        if e.is_timeout() {
            LedgerError::Timeout(self.timeout.as_secs())
        } else {
            LedgerError::Network(e.to_string())
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, LedgerError> {
        request.send().await.map_err(|e| self.map_send_error(e))
    }

    async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, LedgerError> {
        response
            .json::<T>()
            .await
            .map_err(|e| LedgerError::InvalidResponse(e.to_string()))
    }

    fn service_error(status: StatusCode) -> LedgerError {
        LedgerError::ServiceError(format!("blockchain service returned status {}", status))
    }
}

#[async_trait]
impl LedgerClient for HttpLedgerClient {
    async fn read(
        &self,
        since_transaction_number: Option<u64>,
        transaction_time_hash: Option<&str>,
    ) -> Result<ReadResult, LedgerError> {
        let url = format!("{}/transactions", self.base_url);
        let mut request = self.client.get(&url);
        if let (Some(since), Some(hash)) = (since_transaction_number, transaction_time_hash) {
            request = request.query(&[
                ("since", since.to_string()),
                ("transaction-time-hash", hash.to_string()),
            ]);
        }

        tracing::debug!(since = ?since_transaction_number, "Reading ledger transactions");
        let response = self.send(request).await?;
        let status = response.status();

        if status == StatusCode::BAD_REQUEST {
            let body: Option<ErrorBody> = response.json().await.ok();
            if body.and_then(|b| b.code).as_deref() == Some(INVALID_CURSOR_CODE) {
                return Err(LedgerError::InvalidCursor {
                    since: since_transaction_number,
                    time_hash: transaction_time_hash.map(String::from),
                });
            }
            return Err(Self::service_error(status));
        }

        if !status.is_success() {
            return Err(Self::service_error(status));
        }

        Self::parse(response).await
    }

    async fn latest_time(&self) -> Result<LedgerTime, LedgerError> {
        let url = format!("{}/time", self.base_url);
        let response = self.send(self.client.get(&url)).await?;

        if !response.status().is_success() {
            return Err(Self::service_error(response.status()));
        }

        Self::parse(response).await
    }

    async fn first_valid_transaction(
        &self,
        candidates: &[Transaction],
    ) -> Result<Option<Transaction>, LedgerError> {
        let url = format!("{}/transactions/firstValid", self.base_url);
        let body = serde_json::json!({ "transactions": candidates });
        let response = self.send(self.client.post(&url).json(&body)).await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::service_error(response.status()));
        }

        Self::parse(response).await.map(Some)
    }

    async fn value_time_lock(&self, identifier: &str) -> Result<Option<ValueTimeLock>, LedgerError> {
        let url = format!("{}/locks/{}", self.base_url, identifier);
        let response = self.send(self.client.get(&url)).await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::service_error(response.status()));
        }

        Self::parse(response).await.map(Some)
    }
}
