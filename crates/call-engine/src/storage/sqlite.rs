//! # SQLite Call Store
//!
//! Durable backend built on sqlx. Each store owns one table holding the serialized
//! record next to an autoincrement sequence that preserves insertion order:
//!
//! ```text
//! seq INTEGER PRIMARY KEY AUTOINCREMENT | call_id TEXT | record TEXT (JSON)
//! ```
//!
//! Queries compile to `json_extract(record, '$.path') = ?` conditions, and every
//! removal or update is a single `... RETURNING record` statement so a record is
//! never half-removed.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use tracing::{debug, info};

use super::{CallQuery, CallQueueStrategy, LiveCallStore};
use crate::call::{AgentRole, CallRecord};
use crate::error::{CallCenterError, Result};

/// SQLite-backed store; clones share the connection pool and table
#[derive(Debug, Clone)]
pub struct SqliteCallStore {
    pool: SqlitePool,
    table: String,
}

enum Bind {
    Text(String),
    Int(i64),
    Real(f64),
}

impl SqliteCallStore {
    /// Connects to `database_url` and makes sure `table` exists
    ///
    /// In-memory databases are pinned to a single, never-recycled connection
    /// because every SQLite connection to `:memory:` sees its own database.
    pub async fn connect(database_url: &str, table: &str) -> Result<Self> {
        let pool = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect(database_url)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(5)
                .connect(database_url)
                .await?
        };

        info!("🗄️ Connected call store '{}' at {}", table, database_url);
        Self::with_pool(pool, table).await
    }

    /// Uses an existing pool, so several tables can share one database
    pub async fn with_pool(pool: SqlitePool, table: &str) -> Result<Self> {
        validate_identifier(table)?;
        let store = Self {
            pool,
            table: table.to_string(),
        };
        store.migrate().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    async fn migrate(&self) -> Result<()> {
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                call_id TEXT NOT NULL,
                record TEXT NOT NULL
            )",
            self.table
        );
        sqlx::query(&sql).execute(&self.pool).await?;
        Ok(())
    }

    async fn insert_record(&self, record: &CallRecord) -> Result<()> {
        let json = serde_json::to_string(record)?;
        let sql = format!("INSERT INTO {} (call_id, record) VALUES (?, ?)", self.table);
        sqlx::query(&sql)
            .bind(&record.call_id)
            .bind(json)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Runs a statement returning at most one `record` column, with `leading` binds
    /// placed before the predicate binds
    async fn fetch_record(&self, sql: &str, leading: Vec<Bind>, binds: Vec<Bind>) -> Result<Option<CallRecord>> {
        let mut query = sqlx::query(sql);
        for bind in leading.into_iter().chain(binds) {
            query = match bind {
                Bind::Text(value) => query.bind(value),
                Bind::Int(value) => query.bind(value),
                Bind::Real(value) => query.bind(value),
            };
        }

        let row: Option<SqliteRow> = query.fetch_optional(&self.pool).await?;
        match row {
            Some(row) => {
                let json: String = row.try_get("record")?;
                Ok(Some(serde_json::from_str(&json)?))
            }
            None => Ok(None),
        }
    }

    async fn remove_first(&self, query: &CallQuery) -> Result<Option<CallRecord>> {
        let (conditions, binds) = compile(query)?;
        let sql = format!(
            "DELETE FROM {table} WHERE seq = (SELECT seq FROM {table}{conditions} ORDER BY seq ASC LIMIT 1) RETURNING record",
            table = self.table,
        );
        let removed = self.fetch_record(&sql, Vec::new(), binds).await?;
        if removed.is_none() {
            debug!("No row in {} matched {:?}", self.table, query.fields());
        }
        Ok(removed)
    }

    async fn find_first(&self, query: &CallQuery) -> Result<Option<CallRecord>> {
        let (conditions, binds) = compile(query)?;
        let sql = format!(
            "SELECT record FROM {}{} ORDER BY seq ASC LIMIT 1",
            self.table, conditions
        );
        self.fetch_record(&sql, Vec::new(), binds).await
    }

    async fn count_rows(&self) -> Result<usize> {
        let sql = format!("SELECT COUNT(*) AS total FROM {}", self.table);
        let row = sqlx::query(&sql).fetch_one(&self.pool).await?;
        let total: i64 = row.try_get("total")?;
        Ok(total.max(0) as usize)
    }
}

#[async_trait]
impl CallQueueStrategy for SqliteCallStore {
    async fn enqueue(&self, record: CallRecord) -> Result<()> {
        self.insert_record(&record).await
    }

    async fn dequeue(&self) -> Result<Option<CallRecord>> {
        let sql = format!(
            "DELETE FROM {table} WHERE seq = (SELECT MIN(seq) FROM {table}) RETURNING record",
            table = self.table,
        );
        self.fetch_record(&sql, Vec::new(), Vec::new()).await
    }

    async fn remove_matching(&self, query: &CallQuery) -> Result<Option<CallRecord>> {
        self.remove_first(query).await
    }

    async fn find_matching(&self, query: &CallQuery) -> Result<Option<CallRecord>> {
        self.find_first(query).await
    }

    async fn length(&self) -> Result<usize> {
        self.count_rows().await
    }
}

#[async_trait]
impl LiveCallStore for SqliteCallStore {
    async fn insert(&self, record: CallRecord) -> Result<()> {
        self.insert_record(&record).await
    }

    async fn find(&self, query: &CallQuery) -> Result<Option<CallRecord>> {
        self.find_first(query).await
    }

    async fn remove(&self, query: &CallQuery) -> Result<Option<CallRecord>> {
        self.remove_first(query).await
    }

    async fn update_agent_role(&self, query: &CallQuery, role: AgentRole) -> Result<Option<CallRecord>> {
        let (conditions, binds) = compile(query)?;
        let sql = format!(
            "UPDATE {table} SET record = json_set(record, '$.agent.role', ?) \
             WHERE seq = (SELECT seq FROM {table}{conditions} ORDER BY seq ASC LIMIT 1) RETURNING record",
            table = self.table,
        );
        self.fetch_record(&sql, vec![Bind::Text(role.as_str().to_string())], binds)
            .await
    }

    async fn count(&self) -> Result<usize> {
        self.count_rows().await
    }
}

/// Compiles a query into a ` WHERE ...` clause (empty for an empty query) and its binds
fn compile(query: &CallQuery) -> Result<(String, Vec<Bind>)> {
    let mut clauses = Vec::with_capacity(query.fields().len());
    let mut binds = Vec::new();

    for (path, expected) in query.fields() {
        let json_path = json_path(path)?;
        let extract = format!("json_extract(record, '{}')", json_path);
        match expected {
            Value::Null => clauses.push(format!(
                "(json_type(record, '{}') = 'null')",
                json_path
            )),
            Value::Bool(flag) => {
                clauses.push(format!(
                    "(json_type(record, '{}') IN ('true', 'false') AND {} = ?)",
                    json_path, extract
                ));
                binds.push(Bind::Int(i64::from(*flag)));
            }
            Value::Number(number) => {
                clauses.push(format!(
                    "(json_type(record, '{}') IN ('integer', 'real') AND {} = ?)",
                    json_path, extract
                ));
                match number.as_i64() {
                    Some(int) => binds.push(Bind::Int(int)),
                    None => binds.push(Bind::Real(number.as_f64().unwrap_or_default())),
                }
            }
            Value::String(text) => {
                clauses.push(format!("(json_type(record, '{}') = 'text' AND {} = ?)", json_path, extract));
                binds.push(Bind::Text(text.clone()));
            }
            Value::Array(_) | Value::Object(_) => {
                clauses.push(format!("{} = json(?)", extract));
                binds.push(Bind::Text(expected.to_string()));
            }
        }
    }

    if clauses.is_empty() {
        Ok((String::new(), binds))
    } else {
        Ok((format!(" WHERE {}", clauses.join(" AND ")), binds))
    }
}

fn json_path(path: &str) -> Result<String> {
    for segment in path.split('.') {
        validate_identifier(segment)
            .map_err(|_| CallCenterError::validation(format!("Invalid query path: {}", path)))?;
    }
    Ok(format!("$.{}", path))
}

fn validate_identifier(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !name.starts_with(|c: char| c.is_ascii_digit());
    if valid {
        Ok(())
    } else {
        Err(CallCenterError::configuration(format!("Invalid identifier: {}", name)))
    }
}
