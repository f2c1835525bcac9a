//! Verification server transport
//!
//! Two calls, no retries: start a session, pull the encrypted person data.
//! HTTP statuses are mapped to domain outcomes here; retry policy belongs to
//! the session's polling loop.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::TransportConfig;
use crate::crypto::EncodedPublicKey;
use crate::envelope::EncryptedEnvelope;
use crate::error::{VerifierError, VerifierResult};
use crate::models::{PublicKeyBody, PullDataRequest, StartSessionRequest, StartSessionResponse};

/// Result of a data-pull request
#[derive(Debug)]
pub enum PullOutcome {
    /// The person confirmed the verification in the app
    Ready(EncryptedEnvelope),
    /// HTTP 204 - nothing to fetch yet
    NotReady,
}

/// Network calls needed by a verification session
#[async_trait]
pub trait SessionTransport: Send + Sync {
    /// Register the session and its public key
    async fn start_session(
        &self,
        session_id: &Uuid,
        public_key: &EncodedPublicKey,
    ) -> VerifierResult<StartSessionResponse>;

    /// Ask for the encrypted person data
    async fn pull_data(
        &self,
        session_id: &Uuid,
        secret: &SecretString,
        public_key: &EncodedPublicKey,
    ) -> VerifierResult<PullOutcome>;
}

/// `SessionTransport` over HTTPS
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    config: TransportConfig,
}

impl HttpTransport {
    pub fn new(config: TransportConfig) -> VerifierResult<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(config.timeout())
            .default_headers(header_map(&config)?)
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }
}

#[async_trait]
impl SessionTransport for HttpTransport {
    async fn start_session(
        &self,
        session_id: &Uuid,
        public_key: &EncodedPublicKey,
    ) -> VerifierResult<StartSessionResponse> {
        let body = StartSessionRequest {
            session_uuid: session_id.to_string(),
            public_key: PublicKeyBody::from(public_key),
        };

        let response = self
            .client
            .post(&self.config.start_url)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        debug!(%session_id, %status, "Start-session response");

        if status != StatusCode::OK {
            warn!(%session_id, %status, "Unexpected start-session status");
            return Err(VerifierError::UnexpectedStatus {
                status: status.as_u16(),
            });
        }

        parse_json(response).await
    }

    async fn pull_data(
        &self,
        session_id: &Uuid,
        secret: &SecretString,
        public_key: &EncodedPublicKey,
    ) -> VerifierResult<PullOutcome> {
        let body = PullDataRequest {
            secret: secret.expose_secret(),
            public_key: PublicKeyBody::from(public_key),
        };

        let response = self
            .client
            .post(self.config.data_pull_url_for(session_id))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        debug!(%session_id, %status, "Data-pull response");

        match status {
            StatusCode::NO_CONTENT => Ok(PullOutcome::NotReady),
            StatusCode::OK => parse_json(response).await.map(PullOutcome::Ready),
            other => {
                warn!(%session_id, status = %other, "Unexpected data-pull status");
                Err(VerifierError::UnexpectedStatus {
                    status: other.as_u16(),
                })
            }
        }
    }
}

async fn parse_json<T: DeserializeOwned>(response: reqwest::Response) -> VerifierResult<T> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| VerifierError::InvalidResponse(e.to_string()))
}

fn header_map(config: &TransportConfig) -> VerifierResult<HeaderMap> {
    let mut headers = HeaderMap::new();

    for (name, value) in &config.headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| VerifierError::Config(format!("invalid header name {}: {}", name, e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| VerifierError::Config(format!("invalid value for {}: {}", name, e)))?;
        headers.insert(name, value);
    }

    Ok(headers)
}
