//! Whitelist / Blocklist Lookup
//!
//! Storage is behind [`DomainLists`]; the server implements it over PostgreSQL.
//! [`CachedDomainLists`] keeps lookups in memory for a few minutes and is
//! invalidated by admin mutations.

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use super::external_intel::community::{
    scam_seed_severity, COMMUNITY_REASON, VN_SCAM_DOMAINS, VN_TRUSTED_DOMAINS,
};
use super::external_intel::Severity;
use crate::error::Result;

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Blocklist row as seen by the scanner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedDomain {
    pub reason: Option<String>,
    pub severity: Severity,
}

/// Domain list storage
#[async_trait]
pub trait DomainLists: Send + Sync {
    async fn is_whitelisted(&self, domain: &str) -> Result<bool>;

    /// Blocklist row for an exact domain
    async fn blocklist_entry(&self, domain: &str) -> Result<Option<BlockedDomain>>;
}

// ============================================================================
// IN-MEMORY LISTS
// ============================================================================

/// HashSet / HashMap backed lists
#[derive(Debug, Default)]
pub struct MemoryDomainLists {
    whitelist: RwLock<HashSet<String>>,
    blocklist: RwLock<HashMap<String, BlockedDomain>>,
}

impl MemoryDomainLists {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lists pre-filled with the community scam / trusted domains
    pub fn from_community_seed() -> Self {
        let lists = Self::new();
        for t in VN_TRUSTED_DOMAINS {
            lists.allow(t.domain);
        }
        for domain in VN_SCAM_DOMAINS {
            lists.block(domain, Some(COMMUNITY_REASON), scam_seed_severity(domain));
        }
        lists
    }

    pub fn allow(&self, domain: &str) {
        self.whitelist.write().insert(domain.to_lowercase());
    }

    pub fn block(&self, domain: &str, reason: Option<&str>, severity: Severity) {
        self.blocklist.write().insert(
            domain.to_lowercase(),
            BlockedDomain {
                reason: reason.map(str::to_string),
                severity,
            },
        );
    }

    pub fn remove(&self, domain: &str) {
        let domain = domain.to_lowercase();
        self.whitelist.write().remove(&domain);
        self.blocklist.write().remove(&domain);
    }

    /// (whitelist, blocklist)
    pub fn counts(&self) -> (usize, usize) {
        (self.whitelist.read().len(), self.blocklist.read().len())
    }
}

#[async_trait]
impl DomainLists for MemoryDomainLists {
    async fn is_whitelisted(&self, domain: &str) -> Result<bool> {
        Ok(self.whitelist.read().contains(domain))
    }

    async fn blocklist_entry(&self, domain: &str) -> Result<Option<BlockedDomain>> {
        Ok(self.blocklist.read().get(domain).cloned())
    }
}

// ============================================================================
// CACHE
// ============================================================================

struct Cached<T> {
    value: T,
    cached_at: Instant,
}

/// TTL cache in front of another [`DomainLists`]
pub struct CachedDomainLists<L> {
    inner: L,
    ttl: Duration,
    whitelist: RwLock<HashMap<String, Cached<bool>>>,
    blocklist: RwLock<HashMap<String, Cached<Option<BlockedDomain>>>>,
}

impl<L: DomainLists> CachedDomainLists<L> {
    pub fn new(inner: L) -> Self {
        Self::with_ttl(inner, DEFAULT_CACHE_TTL)
    }

    pub fn with_ttl(inner: L, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            whitelist: RwLock::new(HashMap::new()),
            blocklist: RwLock::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &L {
        &self.inner
    }

    /// Drop cached answers for one domain (after admin upsert / delete)
    pub fn invalidate(&self, domain: &str) {
        self.whitelist.write().remove(domain);
        self.blocklist.write().remove(domain);
    }

    pub fn clear(&self) {
        self.whitelist.write().clear();
        self.blocklist.write().clear();
    }

    /// Remove entries older than the TTL
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let ttl = self.ttl;
        let mut removed = 0;

        {
            let mut w = self.whitelist.write();
            let before = w.len();
            w.retain(|_, c| now.duration_since(c.cached_at) < ttl);
            removed += before - w.len();
        }
        {
            let mut b = self.blocklist.write();
            let before = b.len();
            b.retain(|_, c| now.duration_since(c.cached_at) < ttl);
            removed += before - b.len();
        }

        removed
    }

    fn fresh<T: Clone>(&self, entry: Option<&Cached<T>>) -> Option<T> {
        entry
            .filter(|c| c.cached_at.elapsed() < self.ttl)
            .map(|c| c.value.clone())
    }
}

#[async_trait]
impl<L: DomainLists> DomainLists for CachedDomainLists<L> {
    async fn is_whitelisted(&self, domain: &str) -> Result<bool> {
        let cached = self.fresh(self.whitelist.read().get(domain));
        if let Some(hit) = cached {
            return Ok(hit);
        }

        let value = self.inner.is_whitelisted(domain).await?;
        self.whitelist.write().insert(
            domain.to_string(),
            Cached { value, cached_at: Instant::now() },
        );
        Ok(value)
    }

    async fn blocklist_entry(&self, domain: &str) -> Result<Option<BlockedDomain>> {
        let cached = self.fresh(self.blocklist.read().get(domain));
        if let Some(hit) = cached {
            return Ok(hit);
        }

        let value = self.inner.blocklist_entry(domain).await?;
        self.blocklist.write().insert(
            domain.to_string(),
            Cached { value: value.clone(), cached_at: Instant::now() },
        );
        Ok(value)
    }
}
