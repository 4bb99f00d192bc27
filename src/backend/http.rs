use std::time::Duration;

use crate::{
    backend::GenerationBackend,
    config::RelayConfig,
    error::{RelayError, Result},
    models::{Img2ImgPayload, Img2ImgResponse},
};
use async_trait::async_trait;
use reqwest::Client;

/// Stable Diffusion web API over plain HTTP.
#[derive(Clone)]
pub struct HttpBackend {
    client: Client,
    url: String,
}

impl HttpBackend {
    pub fn new(url: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| RelayError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn from_config(config: &RelayConfig) -> Result<Self> {
        Self::new(config.backend_url.clone(), config.request_timeout)
    }
}

#[async_trait]
impl GenerationBackend for HttpBackend {
    async fn img2img(&self, payload: &Img2ImgPayload) -> Result<Img2ImgResponse> {
        log::debug!("POST {} (steps={})", self.url, payload.steps);

        let response = self
            .client
            .post(&self.url)
            .json(payload)
            .send()
            .await?
            .error_for_status()?;

        let body = response.json::<Img2ImgResponse>().await?;
        Ok(body)
    }

    fn endpoint(&self) -> &str {
        &self.url
    }
}
