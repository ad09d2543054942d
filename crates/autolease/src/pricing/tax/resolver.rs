use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use super::lookup::TaxRateLookup;
use super::{normalize_zip, TaxLookupError, TaxResolution, TaxSource};

/// How long a looked-up rate is reused when no TTL is configured.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(15 * 60);

#[derive(Debug, Clone, Copy)]
struct CachedRate {
    rate_percent: f64,
    fetched_at: Instant,
}

/// Remote lookup fronted by a per-ZIP cache of successful answers. Entries
/// older than the TTL are treated as misses.
pub struct TaxRateResolver<L> {
    lookup: L,
    ttl: Duration,
    cache: Mutex<HashMap<String, CachedRate>>,
}

impl<L> TaxRateResolver<L>
where
    L: TaxRateLookup,
{
    pub fn new(lookup: L) -> Self {
        Self::with_ttl(lookup, DEFAULT_CACHE_TTL)
    }

    pub fn with_ttl(lookup: L, ttl: Duration) -> Self {
        Self {
            lookup,
            ttl,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn resolve(&self, raw_zip: &str) -> Result<TaxResolution, TaxLookupError> {
        let zip =
            normalize_zip(raw_zip).ok_or_else(|| TaxLookupError::InvalidZip(raw_zip.to_string()))?;

        if let Some(rate_percent) = self.cached(&zip) {
            return Ok(TaxResolution {
                zip,
                rate_percent,
                source: TaxSource::Cache,
            });
        }

        let fetched = self.lookup.fetch(&zip).await;
        match fetched {
            Ok(rate_percent) => {
                self.cache.lock().unwrap_or_else(PoisonError::into_inner).insert(
                    zip.clone(),
                    CachedRate {
                        rate_percent,
                        fetched_at: Instant::now(),
                    },
                );
                tracing::debug!(%zip, rate_percent, "resolved sales tax rate");
                Ok(TaxResolution {
                    zip,
                    rate_percent,
                    source: TaxSource::Lookup,
                })
            }
            Err(TaxLookupError::Disabled) => Err(TaxLookupError::Disabled),
            Err(err) => {
                tracing::warn!(%zip, error = %err, "sales tax lookup failed");
                Err(err)
            }
        }
    }

    /// Fresh cached rate for a normalized ZIP. Expired entries are dropped.
    pub fn cached(&self, zip: &str) -> Option<f64> {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = *cache.get(zip)?;
        if entry.fetched_at.elapsed() < self.ttl {
            return Some(entry.rate_percent);
        }

        cache.remove(zip);
        tracing::debug!(%zip, "cached sales tax rate expired");
        None
    }
}
