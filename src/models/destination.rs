use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::LocationDetails;

/// A travel destination suggested by the recommendation source
///
/// `name` is the identity key within a batch and the value recorded in the
/// matcher's exclusion list. `image_url` is absent until enrichment fills it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Destination {
    pub name: String,
    pub description: String,
    pub climate: String,
    pub activities: Vec<String>,
    pub budget: String,
    pub travel_tips: String,
    pub best_time_to_visit: Vec<String>,
    pub currency: String,
    pub language: String,
    pub trending: bool,
    pub transportation: Vec<String>,
    #[serde(default, skip_deserializing)]
    image_url: Option<String>,
}

impl Destination {
    /// Image attached by enrichment, if any
    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    /// Attaches an image URL unless one is already set
    ///
    /// Returns `false` when the destination already carries an image.
    pub fn attach_image(&mut self, url: String) -> bool {
        if self.image_url.is_some() {
            return false;
        }
        self.image_url = Some(url);
        true
    }
}

/// Everything presented once a destination has been liked
///
/// `location` and `overview` are fetched independently; either may be absent.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DestinationDetails {
    pub destination: Destination,
    pub location: Option<LocationDetails>,
    pub overview: Option<String>,
}

/// Reasons a raw batch of destinations is rejected
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum BatchError {
    #[error("destination at position {0} has an empty name")]
    EmptyName(usize),

    #[error("destination '{0}' appears more than once in the batch")]
    DuplicateName(String),

    #[error("destination record is invalid: {0}")]
    InvalidRecord(String),
}

/// Validates raw upstream records into a typed batch
///
/// The whole batch is rejected if any record fails to deserialize, has a
/// blank name, or repeats a name already seen in the batch.
pub fn parse_batch(records: Vec<serde_json::Value>) -> Result<Vec<Destination>, BatchError> {
    let mut seen = HashSet::new();
    let mut batch = Vec::with_capacity(records.len());

    for (position, record) in records.into_iter().enumerate() {
        let destination: Destination = serde_json::from_value(record)
            .map_err(|e| BatchError::InvalidRecord(format!("position {}: {}", position, e)))?;

        if destination.name.trim().is_empty() {
            return Err(BatchError::EmptyName(position));
        }
        if !seen.insert(destination.name.clone()) {
            return Err(BatchError::DuplicateName(destination.name));
        }

        batch.push(destination);
    }

    Ok(batch)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::Destination;

    /// Builds a fully populated destination for tests
    pub fn destination(name: &str) -> Destination {
        Destination {
            name: name.to_string(),
            description: format!("{} is lovely", name),
            climate: "Mild".to_string(),
            activities: vec!["Hiking".to_string(), "Museums".to_string()],
            budget: "Medium".to_string(),
            travel_tips: "Book early".to_string(),
            best_time_to_visit: vec!["May".to_string(), "June".to_string()],
            currency: "EUR".to_string(),
            language: "Spanish".to_string(),
            trending: false,
            transportation: vec!["Train".to_string()],
            image_url: None,
        }
    }
}
