use std::sync::Arc;
use std::time::Duration;

use crate::{
    models::{Destination, LocationCategory},
    services::{best_effort::best_effort, providers::LocationSource},
};

/// Attaches a photo to each destination of a freshly received batch
///
/// Lookups run concurrently, one task per destination, and the batch is
/// returned once all of them have finished. A destination whose lookup fails,
/// finds nothing or times out keeps no image; its siblings are unaffected.
#[derive(Clone)]
pub struct ImageEnricher {
    locations: Arc<dyn LocationSource>,
    timeout: Duration,
}

impl ImageEnricher {
    pub fn new(locations: Arc<dyn LocationSource>, timeout: Duration) -> Self {
        Self { locations, timeout }
    }

    pub async fn enrich(&self, mut batch: Vec<Destination>) -> Vec<Destination> {
        let mut tasks = Vec::with_capacity(batch.len());

        for destination in &batch {
            let locations = Arc::clone(&self.locations);
            let name = destination.name.clone();
            let timeout = self.timeout;
            let task =
                tokio::spawn(async move { lookup_image(locations.as_ref(), &name, timeout).await });
            tasks.push(task);
        }

        let mut attached = 0;
        for (destination, task) in batch.iter_mut().zip(tasks) {
            match task.await {
                Ok(Some(url)) => {
                    if destination.attach_image(url) {
                        attached += 1;
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::error!(
                        destination = %destination.name,
                        error = %e,
                        "Image lookup task failed"
                    );
                }
            }
        }

        if attached < batch.len() {
            tracing::warn!(
                attached,
                missing = batch.len() - attached,
                "Some destinations have no image"
            );
        } else {
            tracing::info!(attached, "Destination images attached");
        }

        batch
    }
}

/// Search → first location → photos → first original-resolution URL
async fn lookup_image(
    locations: &dyn LocationSource,
    name: &str,
    timeout: Duration,
) -> Option<String> {
    let candidates = best_effort(
        timeout,
        "location_search",
        name,
        locations.search(name, LocationCategory::Geos),
    )
    .await?;

    let Some(location) = candidates.into_iter().next() else {
        tracing::debug!(destination = %name, "No location found for destination");
        return None;
    };

    let photos = best_effort(
        timeout,
        "location_photos",
        name,
        locations.photos(&location.location_id),
    )
    .await?;

    photos.first_original_url().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        fixtures::destination, LocationCandidate, LocationDetails, Photo, PhotoImage, PhotoImages,
        PhotoSet,
    };
    use crate::services::providers::{LocationError, LocationResult, MockLocationSource};
    use async_trait::async_trait;
    use tokio::time::Instant;

    fn candidate(id: &str) -> LocationCandidate {
        LocationCandidate {
            location_id: id.to_string(),
            name: id.to_string(),
            address: None,
        }
    }

    fn photo_set(url: &str) -> PhotoSet {
        PhotoSet {
            photos: vec![Photo {
                caption: None,
                images: PhotoImages {
                    original: Some(PhotoImage {
                        url: url.to_string(),
                        width: None,
                        height: None,
                    }),
                    ..Default::default()
                },
            }],
        }
    }

    fn batch(names: &[&str]) -> Vec<Destination> {
        names.iter().map(|n| destination(n)).collect()
    }

    #[tokio::test]
    async fn test_missing_photos_for_one_destination() {
        let mut mock = MockLocationSource::new();
        mock.expect_search()
            .returning(|query, _| Ok(vec![candidate(&format!("id-{}", query))]));
        mock.expect_photos().returning(|id| {
            if id == "id-Porto" {
                Ok(PhotoSet::default())
            } else {
                Ok(photo_set(&format!("https://img/{}.jpg", id)))
            }
        });

        let enricher = ImageEnricher::new(Arc::new(mock), Duration::from_secs(1));
        let enriched = enricher.enrich(batch(&["Lisbon", "Porto", "Faro"])).await;

        assert_eq!(enriched[0].image_url(), Some("https://img/id-Lisbon.jpg"));
        assert_eq!(enriched[1].image_url(), None);
        assert_eq!(enriched[2].image_url(), Some("https://img/id-Faro.jpg"));
    }

    #[tokio::test]
    async fn test_failed_search_is_isolated() {
        let mut mock = MockLocationSource::new();
        mock.expect_search().returning(|query, _| {
            if query == "Atlantis" {
                Err(LocationError::Malformed("no such place".to_string()))
            } else {
                Ok(vec![candidate(query)])
            }
        });
        mock.expect_photos()
            .times(2)
            .returning(|id| Ok(photo_set(&format!("https://img/{}.jpg", id))));

        let enricher = ImageEnricher::new(Arc::new(mock), Duration::from_secs(1));
        let enriched = enricher.enrich(batch(&["Rome", "Atlantis", "Oslo"])).await;

        let images: Vec<Option<&str>> = enriched.iter().map(|d| d.image_url()).collect();
        assert_eq!(
            images,
            vec![Some("https://img/Rome.jpg"), None, Some("https://img/Oslo.jpg")]
        );
    }

    #[tokio::test]
    async fn test_no_search_results_skips_photos() {
        let mut mock = MockLocationSource::new();
        mock.expect_search().returning(|_, _| Ok(Vec::new()));
        mock.expect_photos().never();

        let enricher = ImageEnricher::new(Arc::new(mock), Duration::from_secs(1));
        let enriched = enricher.enrich(batch(&["Nowhere"])).await;

        assert_eq!(enriched.len(), 1);
        assert_eq!(enriched[0].image_url(), None);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let mock = MockLocationSource::new();
        let enricher = ImageEnricher::new(Arc::new(mock), Duration::from_secs(1));
        assert!(enricher.enrich(Vec::new()).await.is_empty());
    }

    /// Location source whose lookups take a fixed time; "Slowtown" never answers
    struct SlowLocations {
        delay: Duration,
    }

    #[async_trait]
    impl LocationSource for SlowLocations {
        async fn search(
            &self,
            query: &str,
            _category: LocationCategory,
        ) -> LocationResult<Vec<LocationCandidate>> {
            if query == "Slowtown" {
                tokio::time::sleep(Duration::from_secs(30)).await;
            }
            tokio::time::sleep(self.delay).await;
            Ok(vec![candidate(query)])
        }

        async fn photos(&self, location_id: &str) -> LocationResult<PhotoSet> {
            Ok(photo_set(&format!("https://img/{}.jpg", location_id)))
        }

        async fn details(&self, _location_id: &str) -> LocationResult<LocationDetails> {
            Err(LocationError::Malformed("unused".to_string()))
        }

        fn name(&self) -> &'static str {
            "slow"
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_lookups_run_concurrently() {
        let delay = Duration::from_millis(100);
        let source = SlowLocations { delay };
        let enricher = ImageEnricher::new(Arc::new(source), Duration::from_secs(5));

        let started = Instant::now();
        let enriched = enricher
            .enrich(batch(&["A", "B", "C", "D", "E", "F"]))
            .await;
        let elapsed = started.elapsed();

        // Six sequential lookups would need six delays
        assert!(elapsed >= delay);
        assert!(elapsed < delay * 2);
        assert!(enriched.iter().all(|d| d.image_url().is_some()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timed_out_lookup_leaves_no_image() {
        let source = SlowLocations {
            delay: Duration::from_millis(1),
        };
        let enricher = ImageEnricher::new(Arc::new(source), Duration::from_millis(100));

        let enriched = enricher.enrich(batch(&["Bern", "Slowtown"])).await;

        assert_eq!(enriched[0].image_url(), Some("https://img/Bern.jpg"));
        assert_eq!(enriched[1].image_url(), None);
    }
}
