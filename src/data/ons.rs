//! ONS time-series API integration.
//!
//! One request shape only:
//!
//! `GET {root}/timeseries/{seriesId}/dataset/{datasetId}/data`
//!
//! The body is decoded to JSON and checked for the top-level shape of a series
//! response; interpreting the records is left to [`crate::data::normalize`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::Value;
use tracing::{debug, info};

use crate::config::DashboardConfig;
use crate::domain::{Frequency, SeriesIdentity};
use crate::error::{AppError, PipelineError};

pub const DEFAULT_API_ROOT: &str = "https://api.ons.gov.uk";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const USER_AGENT: &str = concat!("lms-dash/", env!("CARGO_PKG_VERSION"));

/// Decoded, shape-checked response for one series.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPayload {
    pub identity: SeriesIdentity,
    pub frequency: Frequency,
    pub body: Value,
}

/// Anything that can produce a raw payload for a series.
///
/// The pipeline only talks to this trait, so tests can swap the network out.
pub trait SeriesSource: Send + Sync {
    fn fetch(&self, identity: &SeriesIdentity, frequency: Frequency) -> Result<RawPayload, PipelineError>;
}

pub struct OnsClient {
    client: Client,
    api_root: String,
}

impl OnsClient {
    pub fn new(api_root: &str, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AppError::new(2, format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_root: api_root.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &DashboardConfig) -> Result<Self, AppError> {
        Self::new(&config.api_root, Duration::from_secs(config.timeout_secs))
    }

    pub fn api_root(&self) -> &str {
        &self.api_root
    }

    /// Request URL for a series. Segment order is fixed.
    pub fn series_url(&self, identity: &SeriesIdentity) -> String {
        series_url(&self.api_root, identity)
    }
}

pub fn series_url(api_root: &str, identity: &SeriesIdentity) -> String {
    format!(
        "{}/timeseries/{}/dataset/{}/data",
        api_root.trim_end_matches('/'),
        identity.series_id,
        identity.dataset_id
    )
}

impl SeriesSource for OnsClient {
    fn fetch(&self, identity: &SeriesIdentity, frequency: Frequency) -> Result<RawPayload, PipelineError> {
        let url = self.series_url(identity);
        debug!(%identity, %url, "fetching series");

        let network = |message: String| PipelineError::Network {
            identity: identity.clone(),
            message,
        };

        let resp = self
            .client
            .get(&url)
            .send()
            .map_err(|e| network(format!("request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(network(format!("request failed with status {}", resp.status())));
        }

        let bytes = resp
            .bytes()
            .map_err(|e| network(format!("failed to read body: {e}")))?;

        let payload = decode_payload(identity, frequency, &bytes)?;
        info!(%identity, bytes = bytes.len(), "fetched series");
        Ok(payload)
    }
}

/// Decode a response body and check its top-level shape.
pub fn decode_payload(
    identity: &SeriesIdentity,
    frequency: Frequency,
    bytes: &[u8],
) -> Result<RawPayload, PipelineError> {
    let malformed = |reason: String| PipelineError::MalformedResponse {
        identity: identity.clone(),
        reason,
    };

    let body: Value =
        serde_json::from_slice(bytes).map_err(|e| malformed(format!("body is not valid JSON: {e}")))?;

    if !body.is_object() {
        return Err(malformed("top-level value is not an object".to_string()));
    }
    if body.pointer("/description/title").and_then(Value::as_str).is_none() {
        return Err(malformed("missing description.title".to_string()));
    }
    let key = frequency.payload_key();
    if !body.get(key).is_some_and(Value::is_array) {
        return Err(malformed(format!("missing '{key}' observation array")));
    }

    Ok(RawPayload {
        identity: identity.clone(),
        frequency,
        body,
    })
}

type CacheKey = (SeriesIdentity, Frequency);

/// Memoizing wrapper: one upstream call per `(identity, frequency)` for the
/// life of the value. Failures are not cached.
pub struct CachedSource<S> {
    inner: S,
    cache: Mutex<HashMap<CacheKey, Arc<RawPayload>>>,
}

impl<S: SeriesSource> CachedSource<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn len(&self) -> usize {
        self.cache.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every memoized payload so the next fetch goes upstream.
    pub fn clear(&self) {
        self.cache.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    fn lookup(&self, key: &CacheKey) -> Option<Arc<RawPayload>> {
        self.cache
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }
}

impl<S: SeriesSource> SeriesSource for CachedSource<S> {
    fn fetch(&self, identity: &SeriesIdentity, frequency: Frequency) -> Result<RawPayload, PipelineError> {
        let key = (identity.clone(), frequency);
        if let Some(hit) = self.lookup(&key) {
            debug!(%identity, "series cache hit");
            return Ok(hit.as_ref().clone());
        }

        debug!(%identity, "series cache miss");
        let payload = self.inner.fetch(identity, frequency)?;
        self.cache
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(key)
            .or_insert_with(|| Arc::new(payload.clone()));
        Ok(payload)
    }
}
