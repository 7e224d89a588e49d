//! TripAdvisor Content API location source
//!
//! API Flow:
//! 1. Search: /location/search → location ids for a free-text query
//! 2. Photos: /location/{id}/photos → up to 5 photos in several sizes
//! 3. Details: /location/{id}/details → coordinates and description
//!
//! Keys are domain-restricted, so requests carry the configured `Referer`.
//! When a Redis cache is configured, all three lookups are read-through cached.

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::{
    cache::{Cache, CacheKey},
    cached,
    models::{
        LocationCandidate, LocationCategory, LocationDetails, Photo, PhotoSet, TripAdvisorDetails,
        TripAdvisorList, TripAdvisorLocation,
    },
    services::providers::{LocationError, LocationResult, LocationSource},
};

const SEARCH_CACHE_TTL: u64 = 86400; // 1 day
const PHOTOS_CACHE_TTL: u64 = 604800; // 1 week
const DETAILS_CACHE_TTL: u64 = 604800; // 1 week

/// Settings for the TripAdvisor source
#[derive(Debug, Clone)]
pub struct TripAdvisorConfig {
    pub api_key: String,
    pub api_url: String,
    pub referer: Option<String>,
    /// Currency requested for price levels in details
    pub currency: String,
    pub timeout: Duration,
}

#[derive(Clone)]
pub struct TripAdvisorProvider {
    http_client: HttpClient,
    config: TripAdvisorConfig,
    cache: Option<Cache>,
}

impl TripAdvisorProvider {
    pub fn new(config: TripAdvisorConfig, cache: Option<Cache>) -> reqwest::Result<Self> {
        let http_client = HttpClient::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http_client,
            config,
            cache,
        })
    }

    /// Issues a GET against the API and decodes the JSON body
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> LocationResult<T> {
        let url = format!("{}{}", self.config.api_url, path);

        let mut request = self
            .http_client
            .get(&url)
            .header("accept", "application/json")
            .query(&[("key", self.config.api_key.as_str()), ("language", "en")])
            .query(query);

        if let Some(referer) = &self.config.referer {
            request = request.header("Referer", referer);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(path = %path, status = %status, "TripAdvisor request failed");
            return Err(LocationError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(
                path = %path,
                error = %e,
                response = %text,
                "Failed to deserialize TripAdvisor response"
            );
            LocationError::Malformed(e.to_string())
        })
    }
}

#[async_trait]
impl LocationSource for TripAdvisorProvider {
    async fn search(
        &self,
        query: &str,
        category: LocationCategory,
    ) -> LocationResult<Vec<LocationCandidate>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        cached!(
            self.cache,
            CacheKey::LocationSearch {
                query: query.to_string(),
                category,
            },
            SEARCH_CACHE_TTL,
            async move {
                let category = category.to_string();
                let list: TripAdvisorList<TripAdvisorLocation> = self
                    .get_json(
                        "/location/search",
                        &[("searchQuery", query), ("category", category.as_str())],
                    )
                    .await?;

                let candidates: Vec<LocationCandidate> =
                    list.data.into_iter().map(LocationCandidate::from).collect();

                tracing::info!(
                    query = %query,
                    results = candidates.len(),
                    provider = "tripadvisor",
                    "Location search completed"
                );

                Ok::<_, LocationError>(candidates)
            }
        )
    }

    async fn photos(&self, location_id: &str) -> LocationResult<PhotoSet> {
        cached!(
            self.cache,
            CacheKey::LocationPhotos(location_id.to_string()),
            PHOTOS_CACHE_TTL,
            async move {
                let path = format!("/location/{}/photos", location_id);
                let list: TripAdvisorList<Photo> = self.get_json(&path, &[]).await?;

                tracing::debug!(
                    location_id = %location_id,
                    photos = list.data.len(),
                    "Location photos fetched"
                );

                Ok::<_, LocationError>(PhotoSet { photos: list.data })
            }
        )
    }

    async fn details(&self, location_id: &str) -> LocationResult<LocationDetails> {
        cached!(
            self.cache,
            CacheKey::LocationDetails(location_id.to_string()),
            DETAILS_CACHE_TTL,
            async move {
                let path = format!("/location/{}/details", location_id);
                let raw: TripAdvisorDetails = self
                    .get_json(&path, &[("currency", self.config.currency.as_str())])
                    .await?;

                LocationDetails::try_from(raw).map_err(LocationError::Malformed)
            }
        )
    }

    fn name(&self) -> &'static str {
        "tripadvisor"
    }
}
