//! SQLite-backed service registry.

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::collections::BTreeSet;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

use super::{Registry, RegistryError, Result};
use crate::model::{Action, AuditLogEntry, ServiceRecord, ServiceStatus, UnknownValueError};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS services (
        service_id TEXT NOT NULL PRIMARY KEY,
        name       TEXT NOT NULL,
        status     TEXT NOT NULL DEFAULT 'unknown',
        owner_id   INTEGER
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS service_owners (
        service_id TEXT NOT NULL,
        owner_id   INTEGER NOT NULL,
        PRIMARY KEY (service_id, owner_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS audit_log (
        id         INTEGER PRIMARY KEY AUTOINCREMENT,
        service_id TEXT NOT NULL,
        action     TEXT NOT NULL,
        actor_id   INTEGER NOT NULL,
        succeeded  INTEGER NOT NULL,
        detail     TEXT,
        timestamp  TEXT NOT NULL
    )
    "#,
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_services_service_id ON services (service_id)",
    "CREATE INDEX IF NOT EXISTS idx_services_owner_id ON services (owner_id)",
    "CREATE INDEX IF NOT EXISTS idx_service_owners_owner_id ON service_owners (owner_id)",
    "CREATE INDEX IF NOT EXISTS idx_audit_log_service_id ON audit_log (service_id)",
];

// Records that only carry the legacy single-owner column get an ownership row.
const MIGRATE_LEGACY_OWNERS: &str = r#"
    INSERT OR IGNORE INTO service_owners (service_id, owner_id)
    SELECT s.service_id, s.owner_id FROM services s
    WHERE s.owner_id IS NOT NULL
      AND NOT EXISTS (SELECT 1 FROM service_owners o WHERE o.service_id = s.service_id)
"#;

const SELECT_RECORDS: &str = r#"
    SELECT s.service_id, s.name, s.status, s.owner_id AS legacy_owner, o.owner_id AS owner
    FROM services s
    LEFT JOIN service_owners o ON o.service_id = s.service_id
"#;

/// Registry persisted in SQLite. Safe for concurrent use through the pool.
pub struct SqliteRegistry {
    pool: SqlitePool,
}

impl SqliteRegistry {
    /// Connects, creates the schema and runs the legacy-owner migration.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

        // Every connection to an in-memory database sees its own database.
        let in_memory = url.contains(":memory:") || url.contains("mode=memory");
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
        } else {
            SqlitePoolOptions::new().max_connections(max_connections.max(1))
        };
        let pool = pool_options.connect_with(options).await?;

        let registry = Self { pool };
        registry.create_schema().await?;
        let migrated = registry.migrate().await?;
        info!(
            component = "registry",
            event = "connected",
            in_memory = in_memory,
            migrated_owners = migrated,
            "registry ready"
        );

        Ok(registry)
    }

    async fn create_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Derives `owners` from the legacy owner column where missing.
    /// Returns the number of records migrated; running it again is a no-op.
    pub async fn migrate(&self) -> Result<u64> {
        let result = sqlx::query(MIGRATE_LEGACY_OWNERS)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    #[cfg(test)]
    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Folds joined (record, owner) rows into records, keeping row order.
fn fold_records(rows: Vec<SqliteRow>) -> Result<Vec<ServiceRecord>> {
    let mut records: Vec<ServiceRecord> = Vec::new();
    for row in rows {
        let service_id: String = row.try_get("service_id")?;
        let owner: Option<i64> = row.try_get("owner")?;

        let same = records
            .last()
            .map(|last| last.service_id == service_id)
            .unwrap_or(false);
        if !same {
            let status: String = row.try_get("status")?;
            let status = ServiceStatus::from_str(&status).map_err(|source| {
                RegistryError::Corrupt {
                    service_id: service_id.clone(),
                    source,
                }
            })?;
            let legacy_owner: Option<i64> = row.try_get("legacy_owner")?;
            records.push(ServiceRecord {
                name: row.try_get("name")?,
                owners: legacy_owner.into_iter().collect::<BTreeSet<_>>(),
                service_id,
                status,
            });
        }

        if let (Some(owner), Some(record)) = (owner, records.last_mut()) {
            record.owners.insert(owner);
        }
    }
    Ok(records)
}

fn audit_from_row(row: &SqliteRow) -> Result<AuditLogEntry> {
    let service_id: String = row.try_get("service_id")?;
    let corrupt = |value: String| RegistryError::Corrupt {
        service_id: service_id.clone(),
        source: UnknownValueError(value),
    };

    let action: String = row.try_get("action")?;
    let action = Action::from_str(&action).map_err(|e| corrupt(e.0))?;
    let timestamp: String = row.try_get("timestamp")?;
    let timestamp = DateTime::parse_from_rfc3339(&timestamp)
        .map_err(|_| corrupt(timestamp.clone()))?
        .with_timezone(&Utc);

    Ok(AuditLogEntry {
        action,
        actor_id: row.try_get("actor_id")?,
        succeeded: row.try_get("succeeded")?,
        detail: row.try_get("detail")?,
        timestamp,
        service_id: service_id.clone(),
    })
}

#[async_trait::async_trait]
impl Registry for SqliteRegistry {
    async fn upsert(&self, service_id: &str, name: &str, owner_id: i64) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO services (service_id, name, status) VALUES (?, ?, ?)
            ON CONFLICT (service_id) DO UPDATE SET name = excluded.name
            "#,
        )
        .bind(service_id)
        .bind(name)
        .bind(ServiceStatus::Unknown.as_str())
        .execute(&mut *tx)
        .await?;

        sqlx::query("INSERT OR IGNORE INTO service_owners (service_id, owner_id) VALUES (?, ?)")
            .bind(service_id)
            .bind(owner_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn list_for(&self, owner_id: Option<i64>) -> Result<Vec<ServiceRecord>> {
        let rows = match owner_id {
            Some(owner_id) => {
                let sql = format!(
                    r#"{SELECT_RECORDS}
                    WHERE s.owner_id = ?
                       OR EXISTS (SELECT 1 FROM service_owners f
                                  WHERE f.service_id = s.service_id AND f.owner_id = ?)
                    ORDER BY s.rowid, o.owner_id"#
                );
                sqlx::query(&sql)
                    .bind(owner_id)
                    .bind(owner_id)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql = format!("{SELECT_RECORDS} ORDER BY s.rowid, o.owner_id");
                sqlx::query(&sql).fetch_all(&self.pool).await?
            }
        };
        fold_records(rows)
    }

    async fn get(&self, service_id: &str) -> Result<Option<ServiceRecord>> {
        let sql = format!("{SELECT_RECORDS} WHERE s.service_id = ? ORDER BY o.owner_id");
        let rows = sqlx::query(&sql)
            .bind(service_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(fold_records(rows)?.into_iter().next())
    }

    async fn set_status(&self, service_id: &str, status: ServiceStatus) -> Result<()> {
        sqlx::query("UPDATE services SET status = ? WHERE service_id = ?")
            .bind(status.as_str())
            .bind(service_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn append_log(&self, entry: &AuditLogEntry) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO audit_log (service_id, action, actor_id, succeeded, detail, timestamp)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&entry.service_id)
        .bind(entry.action.as_str())
        .bind(entry.actor_id)
        .bind(entry.succeeded)
        .bind(&entry.detail)
        .bind(entry.timestamp.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove(&self, service_id: &str) -> Result<bool> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM service_owners WHERE service_id = ?")
            .bind(service_id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM services WHERE service_id = ?")
            .bind(service_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    async fn logs_for(&self, service_id: &str, limit: usize) -> Result<Vec<AuditLogEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT service_id, action, actor_id, succeeded, detail, timestamp
            FROM audit_log WHERE service_id = ? ORDER BY id DESC LIMIT ?
            "#,
        )
        .bind(service_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(audit_from_row).collect()
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
