//! Access-token caching for the identity provider.
//!
//! The provider issues short-lived bearer tokens; every minting or
//! exchange call needs one. We cache the token for its declared
//! lifetime minus a safety margin so a cached value is never served
//! past the moment upstream would reject it.
//!
//! Concurrent cache misses may both fetch and both write. That is a
//! harmless redundant refresh — the token is idempotent per time
//! window — so no locking is taken around the refresh.

use std::sync::Arc;
use std::time::Duration;

use crate::cache::TtlCache;
use crate::errors::AppError;
use crate::upstream::IdentityClient;

/// Subtracted from the upstream-declared lifetime before caching.
const EXPIRY_SAFETY_MARGIN_SECS: u64 = 60;

pub struct CredentialProvider {
    cache: TtlCache,
    client: Arc<IdentityClient>,
    cache_key: String,
}

impl CredentialProvider {
    pub fn new(cache: TtlCache, client: Arc<IdentityClient>, app_id: &str) -> Self {
        Self {
            cache,
            client,
            cache_key: format!("token:{app_id}"),
        }
    }

    /// Returns a live access token, fetching a fresh one on cache miss.
    /// A failed fetch propagates immediately; retry policy belongs to
    /// the caller.
    pub async fn get_access_token(&self) -> Result<String, AppError> {
        if let Some(token) = self.cache.get::<String>(&self.cache_key) {
            return Ok(token);
        }

        let grant = self.client.issue_access_token().await?;
        let ttl_secs = grant.expires_in.saturating_sub(EXPIRY_SAFETY_MARGIN_SECS);
        self.cache
            .set(
                &self.cache_key,
                &grant.access_token,
                Duration::from_secs(ttl_secs),
            )
            .map_err(AppError::Internal)?;
        tracing::debug!(ttl_secs, "refreshed upstream access token");
        Ok(grant.access_token)
    }
}
