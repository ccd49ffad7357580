//! HTTP speech synthesis client.
//!
//! Talks to an OpenAI-compatible `/v1/audio/speech` endpoint: the request is
//! a small JSON document and the response body is the encoded audio.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;

use super::{SpeechSynthesizer, VoiceSettings};

/// Speech request body
#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    response_format: &'a str,
}

/// Speech engine reached over HTTP
pub struct HttpSpeechClient {
    /// Base URL, e.g. "https://api.openai.com"
    endpoint: String,

    /// Bearer token, if the endpoint requires one
    api_key: Option<String>,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpSpeechClient {
    /// Create a client with a request timeout
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        request_timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .context("Failed to build HTTP client for speech")?;

        Ok(Self {
            endpoint: endpoint.into(),
            api_key,
            client,
        })
    }

    /// Build API URL
    fn api_url(&self) -> String {
        format!("{}/v1/audio/speech", self.endpoint.trim_end_matches('/'))
    }
}

#[async_trait]
impl SpeechSynthesizer for HttpSpeechClient {
    fn name(&self) -> &str {
        "http-speech"
    }

    async fn synthesize(&self, text: &str, voice: &VoiceSettings) -> Result<Vec<u8>> {
        let body = SpeechRequest {
            model: &voice.model,
            input: text,
            voice: &voice.voice,
            response_format: &voice.format,
        };

        let mut request = self.client.post(self.api_url()).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .context("Failed to call speech endpoint")?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            anyhow::bail!("Speech endpoint returned {}: {}", status, detail.trim());
        }

        let audio = response
            .bytes()
            .await
            .context("Failed to read audio stream")?;

        Ok(audio.to_vec())
    }
}
