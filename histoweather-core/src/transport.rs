use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use url::Url;

use crate::{
    config::Endpoints, error::TransportError, request::WeatherRequest, response::RawResponse,
};

/// Anything able to answer a [`WeatherRequest`].
///
/// The orchestrator only sees this trait, so tests can substitute scripted
/// responses for the network.
#[async_trait]
pub trait WeatherTransport: Send + Sync + Debug {
    async fn fetch(&self, request: &WeatherRequest) -> Result<RawResponse, TransportError>;
}

/// Transport backed by the public Open-Meteo services.
#[derive(Debug, Clone)]
pub struct OpenMeteoTransport {
    http: Client,
    endpoints: Endpoints,
}

impl OpenMeteoTransport {
    pub fn new() -> Self {
        Self::with_endpoints(Endpoints::default())
    }

    pub fn with_endpoints(endpoints: Endpoints) -> Self {
        Self {
            http: Client::new(),
            endpoints,
        }
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }
}

impl Default for OpenMeteoTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WeatherTransport for OpenMeteoTransport {
    async fn fetch(&self, request: &WeatherRequest) -> Result<RawResponse, TransportError> {
        let url = request.url(&self.endpoints)?;
        get_json(&self.http, url).await
    }
}

/// GET `url` and decode a JSON body, reporting non-2xx statuses with a
/// shortened copy of the body.
pub(crate) async fn get_json<T: DeserializeOwned>(
    http: &Client,
    url: Url,
) -> Result<T, TransportError> {
    tracing::debug!(%url, "sending upstream request");

    let res = http.get(url.clone()).send().await?;
    let status = res.status();
    let body = res.text().await?;

    if !status.is_success() {
        tracing::warn!(%url, %status, "upstream request failed");
        return Err(TransportError::Status {
            status: status.as_u16(),
            body: truncate_body(&body),
        });
    }

    tracing::debug!(%url, %status, bytes = body.len(), "upstream response received");
    Ok(serde_json::from_str(&body)?)
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}
