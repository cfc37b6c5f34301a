//! Persistent (category, city) → contact store.

use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::{debug, info};

use super::models::{EmergencyService, ServiceCategory};
use super::seed::DirectorySeed;
use crate::common::fold_key;

/// The service directory.
///
/// Reads see committed writes only. City matching is on a folded key, so
/// lookups ignore case, surrounding whitespace and diacritics. Seeded rows
/// are never removed except by [`ServiceDirectory::reset`].
#[derive(Clone)]
pub struct ServiceDirectory {
    pool: SqlitePool,
}

impl ServiceDirectory {
    /// Open (creating if needed) the database at `database_url` and migrate it.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("Invalid DATABASE_URL: {}", database_url))?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .context("Failed to connect to database")?;

        Self::from_pool(pool).await
    }

    /// Private in-memory directory.
    ///
    /// Pinned to a single connection that is never recycled, since each
    /// SQLite in-memory connection is its own database.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .context("Failed to open in-memory database")?;

        Self::from_pool(pool).await
    }

    pub async fn from_pool(pool: SqlitePool) -> Result<Self> {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("Failed to run migrations")?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Seed the default entries if the directory is empty.
    ///
    /// Idempotent: returns 0 when entries already exist.
    pub async fn seed(&self, seed: &DirectorySeed) -> Result<usize> {
        let inserted = EmergencyService::insert_all_if_empty(&seed.services(), &self.pool).await?;
        if inserted > 0 {
            info!(entries = inserted, "Seeded service directory");
        } else {
            debug!("Service directory already populated, skipping seed");
        }
        Ok(inserted)
    }

    /// Drop every entry and re-seed.
    pub async fn reset(&self, seed: &DirectorySeed) -> Result<usize> {
        let inserted = EmergencyService::replace_all(&seed.services(), &self.pool).await?;
        info!(entries = inserted, "Service directory reset");
        Ok(inserted)
    }

    /// Contact for `category`.
    ///
    /// With a city: the first entry registered for that city. Without one:
    /// the first entry of that category anywhere.
    pub async fn lookup(&self, category: ServiceCategory, city: Option<&str>) -> Result<Option<String>> {
        match city {
            Some(city) => EmergencyService::find_contact(category, &fold_key(city), &self.pool).await,
            None => EmergencyService::find_first_contact(category, &self.pool).await,
        }
    }

    /// First contact for `category` in any city, in insertion order.
    pub async fn lookup_any(&self, category: ServiceCategory) -> Result<Option<String>> {
        self.lookup(category, None).await
    }

    pub async fn insert(&self, service: &EmergencyService) -> Result<()> {
        service.create(&self.pool).await?;
        Ok(())
    }

    pub async fn list_all(&self) -> Result<Vec<EmergencyService>> {
        EmergencyService::find_all(&self.pool).await
    }

    pub async fn list_by_city(&self, city: &str) -> Result<Vec<EmergencyService>> {
        EmergencyService::find_by_city(city, &self.pool).await
    }

    pub async fn count(&self) -> Result<i64> {
        EmergencyService::count(&self.pool).await
    }
}
