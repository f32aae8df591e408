//! Optional certificate cache.
//!
//! The platform rotates its signing certificate rarely, so the same bundle is
//! fetched for almost every request. When enabled, fetched certificates are
//! reused for as long as the leaf is inside its validity window.

use crate::auth::certificate::{Certificate, CertificateFetchError, CertificateStore};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Url;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

/// Upper bound on cached URLs. Only trusted-location URLs reach the store, so
/// this is rarely hit.
const MAX_CACHED_CERTIFICATES: usize = 32;

/// Caches certificates from an inner store, keyed by normalized URL.
pub struct CachingCertificateStore {
    inner: Arc<dyn CertificateStore>,
    entries: RwLock<HashMap<String, Arc<Certificate>>>,
}

impl CachingCertificateStore {
    pub fn new(inner: Arc<dyn CertificateStore>) -> Self {
        Self {
            inner,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Number of cached certificates.
    pub async fn cached_count(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait]
impl CertificateStore for CachingCertificateStore {
    async fn fetch(
        &self,
        url: &Url,
        cancel: &CancellationToken,
    ) -> Result<Arc<Certificate>, CertificateFetchError> {
        let key = url.as_str().to_string();
        let now = Utc::now().timestamp();

        {
            let entries = self.entries.read().await;
            if let Some(cert) = entries.get(&key) {
                if cert.is_valid_at(now) {
                    tracing::debug!(target: "gate.auth.cert", "Certificate cache hit");
                    return Ok(Arc::clone(cert));
                }
            }
        }

        let cert = self.inner.fetch(url, cancel).await?;

        if cert.is_valid_at(now) {
            let mut entries = self.entries.write().await;
            entries.retain(|_, cached| cached.is_valid_at(now));
            if entries.len() >= MAX_CACHED_CERTIFICATES {
                entries.clear();
            }
            entries.insert(key, Arc::clone(&cert));
        }

        Ok(cert)
    }
}
