//! Nominatim HTTP client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use super::models::{osm_type_code, Place, PlaceDetails, SearchResult};
use super::Geocoder;
use crate::errors::GeocodeError;

/// Public Nominatim instance.
pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";

/// Configuration for [`NominatimClient`].
#[derive(Debug, Clone)]
pub struct GeocoderConfig {
    pub base_url: String,
    /// Nominatim's usage policy requires an identifying user agent.
    pub user_agent: String,
    /// Preferred language of returned names.
    pub language: String,
    pub request_timeout_ms: u64,
    /// Retries for transient failures (connect, timeout, 5xx, 429).
    pub max_retries: u32,
    pub retry_delay_ms: u64,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_NOMINATIM_URL.to_string(),
            user_agent: concat!("museum-enricher/", env!("CARGO_PKG_VERSION")).to_string(),
            language: "en".to_string(),
            request_timeout_ms: 10_000,
            max_retries: 3,
            retry_delay_ms: 1_000,
        }
    }
}

/// [`Geocoder`] backed by the Nominatim `/search` and `/details` endpoints.
pub struct NominatimClient {
    http: Client,
    base_url: String,
    language: String,
    max_retries: u32,
    retry_delay: Duration,
}

impl NominatimClient {
    pub fn new(config: &GeocoderConfig) -> Result<Self, GeocodeError> {
        let http = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            language: config.language.clone(),
            max_retries: config.max_retries,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        })
    }

    async fn send<R: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<R, GeocodeError> {
        let response = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .query(params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::Status(status));
        }

        Ok(response.json::<R>().await?)
    }

    /// GET `path`, retrying transient failures with a fixed delay. Every
    /// request and every wait gives way to `ctx`.
    async fn get_json<R: DeserializeOwned>(
        &self,
        ctx: &CancellationToken,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<R, GeocodeError> {
        let mut attempt = 0;

        loop {
            let result = tokio::select! {
                biased;
                _ = ctx.cancelled() => return Err(GeocodeError::Cancelled),
                result = self.send::<R>(path, params) => result,
            };

            let err = match result {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.max_retries => e,
                Err(e) => return Err(e),
            };
            attempt += 1;

            warn!(
                path = %path,
                attempt = attempt,
                max_retries = self.max_retries,
                error = %err,
                "Nominatim request failed, retrying"
            );

            tokio::select! {
                biased;
                _ = ctx.cancelled() => return Err(GeocodeError::Cancelled),
                _ = tokio::time::sleep(self.retry_delay) => {}
            }
        }
    }
}

#[async_trait]
impl Geocoder for NominatimClient {
    #[instrument(skip(self, ctx))]
    async fn geocode(&self, ctx: &CancellationToken, query: &str) -> Result<Place, GeocodeError> {
        let params = [
            ("q", query),
            ("format", "json"),
            ("addressdetails", "1"),
            ("limit", "1"),
            ("accept-language", self.language.as_str()),
        ];

        let results: Vec<SearchResult> = self.get_json(ctx, "/search", &params).await?;
        let best = results
            .into_iter()
            .next()
            .ok_or_else(|| GeocodeError::NoResults(query.to_string()))?;

        let place = Place::try_from(best)?;
        debug!(osm_type = %place.osm_type, osm_id = place.osm_id, "Geocoded");
        Ok(place)
    }

    #[instrument(skip(self, ctx))]
    async fn place_details(
        &self,
        ctx: &CancellationToken,
        osm_type: &str,
        osm_id: i64,
    ) -> Result<PlaceDetails, GeocodeError> {
        let code = osm_type_code(osm_type).ok_or_else(|| {
            GeocodeError::invalid_request(format!("unknown OSM type {:?}", osm_type))
        })?;
        let osm_id = osm_id.to_string();

        let params = [
            ("osmtype", code),
            ("osmid", osm_id.as_str()),
            ("addressdetails", "1"),
            ("hierarchy", "0"),
            ("group_hierarchy", "1"),
            ("format", "json"),
        ];

        self.get_json(ctx, "/details", &params).await
    }
}
