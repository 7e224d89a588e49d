/// Read-through caching for an optional Redis cache.
///
/// With a cache present, a hit returns the cached value. On a miss the block
/// runs, its value is queued for a background write, and then returned.
/// A cache that cannot be read is treated as absent: the failure is logged
/// and the block runs. Without a cache the block simply runs.
///
/// # Arguments
/// * `$cache`: An `Option<Cache>`.
/// * `$key`: The `CacheKey` for the value.
/// * `$ttl`: Time-to-live in seconds.
/// * `$block`: Future computing the value on a miss.
///
/// # Example
/// ```rust,ignore
/// let photos = cached!(self.cache, CacheKey::LocationPhotos(id), PHOTOS_TTL, async move {
///     fetch_photos(id).await
/// });
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        match &$cache {
            Some(cache) => {
                let key = $key;
                match cache.get_from_cache(&key).await {
                    Ok(Some(cached)) => Ok(cached),
                    Ok(None) => {
                        let value = $block.await?;
                        cache.set_in_background(&key, &value, $ttl);
                        Ok(value)
                    }
                    Err(e) => {
                        tracing::warn!(
                            key = %key,
                            error = %e,
                            "Cache read failed, fetching from source"
                        );
                        $block.await
                    }
                }
            }
            None => $block.await,
        }
    }};
}
