//! Network delivery of the tracing engine

use std::sync::Arc;

use async_trait::async_trait;

use super::{EngineSource, SourceError, TraceEngine};

/// Turns a delivered engine payload into a usable engine binding.
///
/// The payload format is deployment-specific (a wasm module, a licensed
/// engine blob), so the binder owns that knowledge and the source stays a
/// pure transport. Returning `Err` marks the payload as unusable and the
/// loader moves on to the next source.
pub type EngineBinder = Arc<dyn Fn(&[u8]) -> Result<Arc<dyn TraceEngine>, String> + Send + Sync>;

/// Delivery source that fetches an engine payload over HTTP.
///
/// Hosts typically construct one of these per mirror URL and hand the
/// ordered list to the loader.
pub struct HttpEngineSource {
    url: String,
    client: reqwest::Client,
    binder: EngineBinder,
}

impl HttpEngineSource {
    pub fn new(url: impl Into<String>, binder: EngineBinder) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::new(),
            binder,
        }
    }
}

#[async_trait]
impl EngineSource for HttpEngineSource {
    fn name(&self) -> &str {
        &self.url
    }

    async fn acquire(&self) -> Result<Arc<dyn TraceEngine>, SourceError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SourceError::Network(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        let payload = response
            .bytes()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;

        (self.binder)(&payload).map_err(SourceError::Binding)
    }
}
