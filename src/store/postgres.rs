// src/store/postgres.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::Row;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::collections::BTreeSet;
use tracing::{debug, info};

use super::Store;

/// PostgreSQL storage backend
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect a pool to the given database URL
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        info!("Connecting to PostgreSQL database");

        // Clean connection string by removing unsupported parameters
        // sqlx 0.8.x doesn't recognize 'channel_binding' parameter from Neon
        let cleaned_url = Self::clean_connection_string(database_url);

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(&cleaned_url)
            .await
            .context("Failed to connect to PostgreSQL database")?;

        info!("Connected to PostgreSQL successfully");

        Ok(Self { pool })
    }

    /// Remove connection string parameters sqlx rejects
    fn clean_connection_string(url_str: &str) -> String {
        use url::Url;

        if let Ok(mut url) = Url::parse(url_str) {
            let unsupported_params = ["channel_binding"];

            let cleaned_pairs: Vec<(String, String)> = url
                .query_pairs()
                .filter(|(key, _)| !unsupported_params.contains(&key.as_ref()))
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();

            url.query_pairs_mut().clear();
            for (key, value) in cleaned_pairs {
                url.query_pairs_mut().append_pair(&key, &value);
            }

            url.to_string()
        } else {
            url_str.to_string()
        }
    }

    /// Create tables if they don't exist
    pub async fn migrate(&self) -> Result<()> {
        info!("Running database migrations");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS targets (
                id SERIAL PRIMARY KEY,
                domain TEXT UNIQUE NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create targets table")?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS subdomains (
                id SERIAL PRIMARY KEY,
                domain TEXT NOT NULL,
                subdomain TEXT NOT NULL,
                CONSTRAINT unique_domain_subdomain UNIQUE (domain, subdomain)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create subdomains table")?;

        // Keyword search scans the subdomain column
        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_subdomains_subdomain
            ON subdomains(subdomain)
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create index on subdomain")?;

        info!("Database migrations completed successfully");

        Ok(())
    }

    /// Close the database connection pool
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl Store for PostgresStore {
    async fn add_target(&self, domain: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO targets (domain) VALUES ($1)
            ON CONFLICT (domain) DO NOTHING
            "#,
        )
        .bind(domain)
        .execute(&self.pool)
        .await
        .context("Failed to insert target")?;

        Ok(result.rows_affected() > 0)
    }

    async fn remove_target(&self, domain: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM targets WHERE domain = $1")
            .bind(domain)
            .execute(&self.pool)
            .await
            .context("Failed to delete target")?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_targets(&self) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT domain FROM targets")
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch targets")?;

        Ok(rows.into_iter().map(|r| r.get("domain")).collect())
    }

    async fn save_subdomains(
        &self,
        domain: &str,
        subdomains: &BTreeSet<String>,
    ) -> Result<BTreeSet<String>> {
        let mut new_subdomains = BTreeSet::new();

        // Candidates are processed one at a time; rows_affected > 0 means the
        // row did not previously exist, which is the novelty signal.
        for subdomain in subdomains {
            let result = sqlx::query(
                r#"
                INSERT INTO subdomains (domain, subdomain)
                VALUES ($1, $2)
                ON CONFLICT (domain, subdomain) DO NOTHING
                "#,
            )
            .bind(domain)
            .bind(subdomain)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to insert subdomain {}", subdomain))?;

            if result.rows_affected() > 0 {
                new_subdomains.insert(subdomain.clone());
            }
        }

        debug!(
            "Saved {} subdomains for {} ({} new)",
            subdomains.len(),
            domain,
            new_subdomains.len()
        );

        Ok(new_subdomains)
    }

    async fn get_subdomains(&self, domain: &str) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT subdomain FROM subdomains WHERE domain = $1")
            .bind(domain)
            .fetch_all(&self.pool)
            .await
            .context("Failed to fetch subdomains")?;

        Ok(rows.into_iter().map(|r| r.get("subdomain")).collect())
    }

    async fn search_subdomains(&self, keyword: &str) -> Result<Vec<String>> {
        let pattern = format!("%{}%", keyword);

        let rows = sqlx::query("SELECT DISTINCT subdomain FROM subdomains WHERE subdomain LIKE $1")
            .bind(&pattern)
            .fetch_all(&self.pool)
            .await
            .context("Failed to search subdomains")?;

        Ok(rows.into_iter().map(|r| r.get("subdomain")).collect())
    }

    async fn add_subdomain(&self, domain: &str, subdomain: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO subdomains (domain, subdomain)
            VALUES ($1, $2)
            ON CONFLICT (domain, subdomain) DO NOTHING
            "#,
        )
        .bind(domain)
        .bind(subdomain)
        .execute(&self.pool)
        .await
        .context("Failed to insert subdomain")?;

        Ok(result.rows_affected() > 0)
    }

    async fn remove_subdomain(&self, domain: &str, subdomain: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM subdomains WHERE domain = $1 AND subdomain = $2")
            .bind(domain)
            .bind(subdomain)
            .execute(&self.pool)
            .await
            .context("Failed to delete subdomain")?;

        Ok(result.rows_affected() > 0)
    }

    async fn remove_by_keyword(&self, keyword: &str) -> Result<u64> {
        let pattern = format!("%{}%", keyword);

        let result = sqlx::query("DELETE FROM subdomains WHERE subdomain LIKE $1")
            .bind(&pattern)
            .execute(&self.pool)
            .await
            .context("Failed to delete subdomains by keyword")?;

        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("Database ping failed")?;

        Ok(())
    }
}
