use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use roam_core::payment::{
    GatewayError, InitializeTransaction, InitializedTransaction, PaymentGateway, VerifiedTransaction,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{error, info};

#[derive(Debug, Deserialize, Clone)]
pub struct ChapaConfig {
    pub base_url: String,
    pub secret_key: String,
    pub currency: String,
    pub callback_url: String,
    /// Upper bound on every provider round-trip
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_timeout_seconds() -> u64 { 10 }

#[derive(Debug, Serialize)]
struct InitializePayload<'a> {
    amount: String,
    currency: &'a str,
    email: &'a str,
    first_name: &'a str,
    last_name: &'a str,
    tx_ref: &'a str,
    callback_url: &'a str,
    return_url: &'a str,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct CheckoutData {
    checkout_url: String,
}

#[derive(Debug, Deserialize)]
struct VerifyData {
    status: String,
    #[serde(default)]
    id: Option<Value>,
}

/// HTTP client for the Chapa transaction API
#[derive(Clone)]
pub struct ChapaClient {
    client: Client,
    base_url: String,
    secret_key: String,
}

impl ChapaClient {
    pub fn new(config: &ChapaConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            secret_key: config.secret_key.clone(),
        })
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.secret_key)
    }

    /// Returns the response on 200, otherwise the provider's raw payload as an error
    async fn expect_ok(response: reqwest::Response) -> Result<reqwest::Response, GatewayError> {
        match response.status() {
            StatusCode::OK => Ok(response),
            status => {
                let body = response.text().await.unwrap_or_default();
                let payload = serde_json::from_str::<Value>(&body).unwrap_or(Value::String(body));
                error!("Chapa returned {}: {}", status, payload);
                Err(GatewayError::Rejected {
                    status: status.as_u16(),
                    payload,
                })
            }
        }
    }
}

fn transaction_id(id: Option<Value>) -> Option<String> {
    match id? {
        Value::String(s) => Some(s),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

#[async_trait]
impl PaymentGateway for ChapaClient {
    async fn initialize(
        &self,
        request: &InitializeTransaction,
    ) -> Result<InitializedTransaction, GatewayError> {
        let payload = InitializePayload {
            amount: request.amount.to_string(),
            currency: &request.currency,
            email: &request.email,
            first_name: &request.first_name,
            last_name: &request.last_name,
            tx_ref: &request.tx_ref,
            callback_url: &request.callback_url,
            return_url: &request.callback_url,
        };

        let response = self
            .client
            .post(format!("{}/transaction/initialize", self.base_url))
            .header(reqwest::header::AUTHORIZATION, self.bearer())
            .json(&payload)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let envelope: Envelope<CheckoutData> = Self::expect_ok(response)
            .await?
            .json()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))?;

        let data = envelope
            .data
            .ok_or_else(|| GatewayError::Decode("missing data.checkout_url".to_string()))?;

        info!("Chapa checkout opened for {}", request.tx_ref);
        Ok(InitializedTransaction {
            checkout_url: data.checkout_url,
        })
    }

    async fn verify(&self, tx_ref: &str) -> Result<VerifiedTransaction, GatewayError> {
        let response = self
            .client
            .get(format!("{}/transaction/verify/{}", self.base_url, tx_ref))
            .header(reqwest::header::AUTHORIZATION, self.bearer())
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let envelope: Envelope<VerifyData> = Self::expect_ok(response)
            .await?
            .json()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))?;

        let data = envelope
            .data
            .ok_or_else(|| GatewayError::Decode("missing data.status".to_string()))?;

        info!("Chapa reports {} for {}", data.status, tx_ref);
        Ok(VerifiedTransaction {
            status: data.status,
            transaction_id: transaction_id(data.id),
        })
    }
}
