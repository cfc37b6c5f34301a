use anyhow::Result;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use super::ServiceCategory;
use crate::common::fold_key;

/// A directory entry: the contact for one category of service in one city.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EmergencyService {
    pub category: ServiceCategory,
    pub city: String,
    pub contact: String,
}

/// Database row (database-specific representation)
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EmergencyServiceRow {
    pub id: i64,
    pub service_type: String,
    pub city: String,
    pub city_key: String,
    pub email: String,
}

impl EmergencyServiceRow {
    pub fn into_service(self) -> Result<EmergencyService> {
        Ok(EmergencyService {
            category: self.service_type.parse()?,
            city: self.city,
            contact: self.email,
        })
    }
}

impl EmergencyService {
    pub fn new(category: ServiceCategory, city: impl Into<String>, contact: impl Into<String>) -> Self {
        Self {
            category,
            city: city.into(),
            contact: contact.into(),
        }
    }

    /// First contact for `category` in the city whose folded key is `city_key`.
    pub async fn find_contact(
        category: ServiceCategory,
        city_key: &str,
        pool: &SqlitePool,
    ) -> Result<Option<String>> {
        let row = sqlx::query_as::<_, (String,)>(
            r#"
            SELECT email
            FROM emergency_services
            WHERE service_type = ? AND city_key = ?
            ORDER BY id ASC
            LIMIT 1
            "#,
        )
        .bind(category.as_str())
        .bind(city_key)
        .fetch_optional(pool)
        .await?;

        Ok(row.map(|(email,)| email))
    }

    /// First contact for `category` in any city, in insertion order.
    pub async fn find_first_contact(
        category: ServiceCategory,
        pool: &SqlitePool,
    ) -> Result<Option<String>> {
        let row = sqlx::query_as::<_, (String,)>(
            r#"
            SELECT email
            FROM emergency_services
            WHERE service_type = ?
            ORDER BY id ASC
            LIMIT 1
            "#,
        )
        .bind(category.as_str())
        .fetch_optional(pool)
        .await?;

        Ok(row.map(|(email,)| email))
    }

    pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, EmergencyServiceRow>(
            "SELECT * FROM emergency_services ORDER BY id ASC",
        )
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(EmergencyServiceRow::into_service)
        .collect()
    }

    pub async fn find_by_city(city: &str, pool: &SqlitePool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, EmergencyServiceRow>(
            "SELECT * FROM emergency_services WHERE city_key = ? ORDER BY id ASC",
        )
        .bind(fold_key(city))
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(EmergencyServiceRow::into_service)
        .collect()
    }

    pub async fn count(pool: &SqlitePool) -> Result<i64> {
        let (count,) = sqlx::query_as::<_, (i64,)>("SELECT COUNT(*) FROM emergency_services")
            .fetch_one(pool)
            .await?;
        Ok(count)
    }

    /// Insert a single entry.
    pub async fn create(&self, pool: &SqlitePool) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO emergency_services (service_type, city, city_key, email) VALUES (?, ?, ?, ?)",
        )
        .bind(self.category.as_str())
        .bind(self.city.trim())
        .bind(fold_key(&self.city))
        .bind(self.contact.trim())
        .execute(pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Insert `services` only if the table is empty. Returns the number inserted.
    ///
    /// The emptiness check and the inserts share one transaction, so two
    /// concurrent callers can't both seed.
    pub async fn insert_all_if_empty(services: &[Self], pool: &SqlitePool) -> Result<usize> {
        let mut tx = pool.begin().await?;

        let (existing,) = sqlx::query_as::<_, (i64,)>("SELECT COUNT(*) FROM emergency_services")
            .fetch_one(&mut *tx)
            .await?;
        if existing > 0 {
            tx.rollback().await?;
            return Ok(0);
        }

        let inserted = Self::insert_rows(services, &mut tx).await?;
        tx.commit().await?;
        Ok(inserted)
    }

    /// Atomically replace the directory: DELETE all + batch INSERT in a transaction.
    pub async fn replace_all(services: &[Self], pool: &SqlitePool) -> Result<usize> {
        let mut tx = pool.begin().await?;

        sqlx::query("DELETE FROM emergency_services")
            .execute(&mut *tx)
            .await?;

        let inserted = Self::insert_rows(services, &mut tx).await?;
        tx.commit().await?;
        Ok(inserted)
    }

    async fn insert_rows(
        services: &[Self],
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    ) -> Result<usize> {
        for service in services {
            sqlx::query(
                "INSERT INTO emergency_services (service_type, city, city_key, email) VALUES (?, ?, ?, ?)",
            )
            .bind(service.category.as_str())
            .bind(service.city.trim())
            .bind(fold_key(&service.city))
            .bind(service.contact.trim())
            .execute(&mut **tx)
            .await?;
        }
        Ok(services.len())
    }
}
