use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::AUTHORIZATION;
use reqwest::multipart::Form;
use reqwest::{Client, Response};

use crate::error::Result;

/// Ceiling for the whole exchange, connection through response body.
pub const UPLOAD_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Response bytes kept for interpretation; anything beyond is dropped.
pub const MAX_RESPONSE_BYTES: usize = 1 << 20;

const UPLOAD_PATH: &str = "/upload";

/// Build the upload endpoint from a configured server URL.
pub fn upload_endpoint(server: &str) -> String {
    format!("{}{}", server.trim_end_matches('/'), UPLOAD_PATH)
}

/// Status and truncated body of a completed exchange.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub struct UploadClient {
    http_client: Client,
    endpoint: String,
    token: String,
}

impl UploadClient {
    pub fn new(server: &str, token: &str) -> Result<Self> {
        let http_client = Client::builder()
            .user_agent(concat!("faynosync-cli/", env!("CARGO_PKG_VERSION")))
            .timeout(UPLOAD_TIMEOUT)
            .build()?;

        Ok(Self {
            http_client,
            endpoint: upload_endpoint(server),
            token: token.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// POST the streamed form. Non-2xx statuses are returned, not raised.
    pub async fn submit(&self, form: Form) -> Result<RawResponse> {
        tracing::debug!("POST {}", self.endpoint);

        let response = self
            .http_client
            .post(&self.endpoint)
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .multipart(form)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = read_capped(response, MAX_RESPONSE_BYTES).await?;
        tracing::debug!("Upload response: HTTP {} ({} bytes)", status, body.len());

        Ok(RawResponse { status, body })
    }
}

async fn read_capped(response: Response, limit: usize) -> Result<Vec<u8>> {
    let mut body = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        let room = limit - body.len();
        if chunk.len() >= room {
            body.extend_from_slice(&chunk[..room]);
            break;
        }
        body.extend_from_slice(&chunk);
    }

    Ok(body)
}
