// src/store/mod.rs
use anyhow::Result;
use async_trait::async_trait;
use std::collections::BTreeSet;

pub mod postgres;

pub use postgres::PostgresStore;

/// Storage backend for tracked targets and discovered subdomains.
///
/// Uniqueness is the store's job: `targets.domain` is unique, and
/// `(domain, subdomain)` pairs are unique. Duplicate inserts are no-ops,
/// which is what makes `save_subdomains` double as novelty detection.
#[async_trait]
pub trait Store: Send + Sync {
    /// Add a domain to the monitoring list. Returns false if already tracked.
    async fn add_target(&self, domain: &str) -> Result<bool>;

    /// Remove a domain from the monitoring list. Returns false if it was not tracked.
    async fn remove_target(&self, domain: &str) -> Result<bool>;

    /// All tracked domains, in no particular order.
    async fn list_targets(&self) -> Result<Vec<String>>;

    /// Insert-or-ignore every candidate for `domain`, returning exactly the
    /// subset that did not previously exist. This is the only novelty check;
    /// there is no separate read-then-diff step.
    async fn save_subdomains(
        &self,
        domain: &str,
        subdomains: &BTreeSet<String>,
    ) -> Result<BTreeSet<String>>;

    /// All stored subdomains for a domain.
    async fn get_subdomains(&self, domain: &str) -> Result<Vec<String>>;

    /// Distinct subdomains containing `keyword`, across all domains.
    async fn search_subdomains(&self, keyword: &str) -> Result<Vec<String>>;

    /// Manually add one record. Returns false if the pair already exists.
    async fn add_subdomain(&self, domain: &str, subdomain: &str) -> Result<bool>;

    /// Remove one record. Returns false if no such pair exists.
    async fn remove_subdomain(&self, domain: &str, subdomain: &str) -> Result<bool>;

    /// Delete every record whose subdomain contains `keyword`; returns the count.
    async fn remove_by_keyword(&self, keyword: &str) -> Result<u64>;

    /// Health check
    async fn ping(&self) -> Result<()>;
}
