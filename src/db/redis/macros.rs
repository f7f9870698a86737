/// Read-through caching over a `Cache`.
///
/// Returns the cached value when present. Otherwise awaits `$block`, queues
/// the result for a background write with `$ttl` seconds, and returns it.
/// A failed cache read is logged and treated as a miss, so Redis being down
/// only costs the extra lookup.
///
/// # Example
/// ```rust,ignore
/// cached!(self.cache, CacheKey::MovieDetails(id.to_string()), 3600, async move {
///     self.inner.fetch_details(id).await
/// })
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let key = $key;
        match $cache.get_from_cache(&key).await {
            Ok(Some(cached)) => {
                tracing::debug!(key = %key, "Cache hit");
                Ok(cached)
            }
            outcome => {
                if let Err(e) = outcome {
                    tracing::warn!(error = %e, key = %key, "Cache read failed, falling through");
                }
                let value = $block.await?;
                $cache.set_in_background(&key, &value, $ttl);
                Ok(value)
            }
        }
    }};
}
