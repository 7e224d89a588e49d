use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Category filter for location searches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationCategory {
    #[default]
    Geos,
    Hotels,
    Attractions,
    Restaurants,
}

impl Display for LocationCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let value = match self {
            LocationCategory::Geos => "geos",
            LocationCategory::Hotels => "hotels",
            LocationCategory::Attractions => "attractions",
            LocationCategory::Restaurants => "restaurants",
        };
        write!(f, "{}", value)
    }
}

/// A location matched by a search query
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocationCandidate {
    pub location_id: String,
    pub name: String,
    pub address: Option<String>,
}

/// One image rendition of a photo
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PhotoImage {
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

/// Renditions of a photo at the sizes the provider offers
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PhotoImages {
    #[serde(default)]
    pub thumbnail: Option<PhotoImage>,
    #[serde(default)]
    pub small: Option<PhotoImage>,
    #[serde(default)]
    pub medium: Option<PhotoImage>,
    #[serde(default)]
    pub large: Option<PhotoImage>,
    #[serde(default)]
    pub original: Option<PhotoImage>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Photo {
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub images: PhotoImages,
}

/// Photos for a location, in provider order
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PhotoSet {
    pub photos: Vec<Photo>,
}

impl PhotoSet {
    /// Original-resolution URL of the first photo, if there is one
    pub fn first_original_url(&self) -> Option<&str> {
        self.photos
            .first()
            .and_then(|photo| photo.images.original.as_ref())
            .map(|image| image.url.as_str())
    }
}

/// Detail record for a location
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocationDetails {
    pub location_id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub description: Option<String>,
    pub web_url: Option<String>,
    pub address: Option<String>,
}

// ============================================================================
// TripAdvisor Content API Types
// ============================================================================

/// Envelope used by every TripAdvisor list response
#[derive(Debug, Deserialize)]
pub struct TripAdvisorList<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TripAdvisorAddress {
    #[serde(default)]
    pub address_string: Option<String>,
}

/// Location search hit
#[derive(Debug, Clone, Deserialize)]
pub struct TripAdvisorLocation {
    pub location_id: String,
    pub name: String,
    #[serde(default)]
    pub address_obj: Option<TripAdvisorAddress>,
}

impl From<TripAdvisorLocation> for LocationCandidate {
    fn from(location: TripAdvisorLocation) -> Self {
        LocationCandidate {
            location_id: location.location_id,
            name: location.name,
            address: location.address_obj.and_then(|a| a.address_string),
        }
    }
}

/// Location details response; coordinates arrive as decimal strings
#[derive(Debug, Clone, Deserialize)]
pub struct TripAdvisorDetails {
    pub location_id: String,
    pub name: String,
    #[serde(default)]
    pub latitude: Option<String>,
    #[serde(default)]
    pub longitude: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub web_url: Option<String>,
    #[serde(default)]
    pub address_obj: Option<TripAdvisorAddress>,
}

impl TryFrom<TripAdvisorDetails> for LocationDetails {
    type Error = String;

    fn try_from(details: TripAdvisorDetails) -> Result<Self, Self::Error> {
        let parse = |value: Option<String>, field: &str| -> Result<f64, String> {
            value
                .ok_or_else(|| format!("missing {}", field))?
                .trim()
                .parse::<f64>()
                .map_err(|e| format!("invalid {}: {}", field, e))
        };

        Ok(LocationDetails {
            latitude: parse(details.latitude, "latitude")?,
            longitude: parse(details.longitude, "longitude")?,
            location_id: details.location_id,
            name: details.name,
            description: details.description,
            web_url: details.web_url,
            address: details.address_obj.and_then(|a| a.address_string),
        })
    }
}
