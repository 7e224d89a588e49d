//! External data sources consumed by the recommendation flow
//!
//! A recommendation source (a generative model in practice) proposes
//! destinations and writes overviews; a location source (a travel content API
//! in practice) resolves names to locations, photos and coordinates. Both are
//! traits so the flow can be driven by fakes in tests.

use async_trait::async_trait;

use crate::models::{
    Destination, LocationCandidate, LocationCategory, LocationDetails, PhotoSet, Preferences,
    UserInfo,
};

pub mod openai;
pub mod tripadvisor;

/// Failures reported by a recommendation source
#[derive(Debug, thiserror::Error)]
pub enum RecommendationError {
    /// The request never produced a response (connect, timeout, TLS, ...)
    #[error("transport error: {0}")]
    Transport(String),

    /// The upstream answered with a non-success status
    #[error("upstream returned status {status}: {body}")]
    Upstream { status: u16, body: String },

    /// The upstream answered, but not with a valid batch
    #[error("malformed upstream response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for RecommendationError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            RecommendationError::Malformed(e.to_string())
        } else {
            RecommendationError::Transport(e.to_string())
        }
    }
}

pub type RecommendationResult<T> = Result<T, RecommendationError>;

/// Failures reported by a location source
#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("upstream returned status {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("malformed upstream response: {0}")]
    Malformed(String),
}

pub type LocationResult<T> = Result<T, LocationError>;

/// Input to a recommendation request
///
/// `exclude` lists destination names the source is asked, not guaranteed,
/// to leave out.
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationRequest {
    pub preferences: Preferences,
    pub user_info: UserInfo,
    pub exclude: Option<Vec<String>>,
}

impl RecommendationRequest {
    /// Names to exclude, empty when none were given
    pub fn excluded(&self) -> &[String] {
        self.exclude.as_deref().unwrap_or(&[])
    }
}

/// Proposes destinations and writes narrative overviews
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecommendationSource: Send + Sync {
    /// Returns an ordered batch of fully validated destinations
    ///
    /// A batch containing any invalid record is rejected as a whole.
    async fn recommend(
        &self,
        request: &RecommendationRequest,
    ) -> RecommendationResult<Vec<Destination>>;

    /// Returns display-ready text describing a destination
    async fn overview(
        &self,
        destination_name: &str,
        preferences: &Preferences,
        user_info: &UserInfo,
    ) -> RecommendationResult<String>;

    /// Source name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Looks up locations, photos and coordinates by name or identifier
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LocationSource: Send + Sync {
    /// Locations matching `query`, best match first
    async fn search(
        &self,
        query: &str,
        category: LocationCategory,
    ) -> LocationResult<Vec<LocationCandidate>>;

    /// Photos of a location, possibly none
    async fn photos(&self, location_id: &str) -> LocationResult<PhotoSet>;

    /// Detail record including coordinates
    async fn details(&self, location_id: &str) -> LocationResult<LocationDetails>;

    /// Source name for logging and debugging
    fn name(&self) -> &'static str;
}
