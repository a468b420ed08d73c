//! libSQL backend — async `TodoRepository` implementation.
//!
//! Supports local file and in-memory databases. Every call is bounded by
//! the configured query timeout; dropping a call's future abandons the
//! statement.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use libsql::params::Params;
use libsql::{Connection, Database as LibSqlDatabase, Value, params};
use tracing::{debug, info, warn};

use crate::config::DatabaseConfig;
use crate::error::DatabaseError;
use crate::store::filter::{ListQuery, Predicate};
use crate::store::migrations;
use crate::store::traits::{TodoField, TodoRecord, TodoRepository};
use crate::todos::model::TodoFilter;

/// Used when no timeout is configured explicitly.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

const DATE_FORMAT: &str = "%Y-%m-%d";

/// libSQL database backend.
///
/// Stores a single connection that is reused for all operations.
/// `libsql::Connection` is `Send + Sync` and safe for concurrent async use.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
    query_timeout: Duration,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let backend = Self::from_database(db)?;
        backend.init_schema().await?;
        info!(path = %path.display(), "Database opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Pool(format!("Failed to create in-memory database: {e}"))
            })?;

        let backend = Self::from_database(db)?;
        backend.init_schema().await?;
        Ok(backend)
    }

    /// Open the database described by `config`.
    pub async fn from_config(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let backend = if config.path == ":memory:" {
            Self::new_memory().await?
        } else {
            Self::new_local(Path::new(&config.path)).await?
        };
        Ok(backend.with_query_timeout(config.query_timeout))
    }

    /// Builder: bound every repository call by `timeout`.
    pub fn with_query_timeout(mut self, timeout: Duration) -> Self {
        self.query_timeout = timeout;
        self
    }

    fn from_database(db: LibSqlDatabase) -> Result<Self, DatabaseError> {
        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;
        Ok(Self {
            db: Arc::new(db),
            conn,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
        })
    }

    /// Get the connection.
    fn conn(&self) -> &Connection {
        &self.conn
    }

    async fn init_schema(&self) -> Result<(), DatabaseError> {
        migrations::run_migrations(self.conn()).await
    }

    /// Run `fut` under the query timeout.
    async fn bounded<T, F>(&self, operation: &'static str, fut: F) -> Result<T, DatabaseError>
    where
        F: Future<Output = Result<T, DatabaseError>>,
    {
        match tokio::time::timeout(self.query_timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                warn!(operation, timeout = ?self.query_timeout, "Store operation timed out");
                Err(DatabaseError::Timeout {
                    operation: operation.to_string(),
                    after: self.query_timeout,
                })
            }
        }
    }

    // ── Statements ──────────────────────────────────────────────────

    async fn insert_todo(&self, todo: &TodoRecord) -> Result<TodoRecord, DatabaseError> {
        let rows = self
            .conn()
            .query(
                &format!(
                    "INSERT INTO todos (title, description, date, status, created_at) \
                     VALUES (?1, ?2, ?3, ?4, ?5) RETURNING {TODO_COLUMNS}"
                ),
                params![
                    todo.title.as_str(),
                    todo.description.as_str(),
                    todo.date.format(DATE_FORMAT).to_string(),
                    todo.status.as_str(),
                    Utc::now().to_rfc3339(),
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("create_todo: {e}")))?;

        let created = single_todo(rows, "create_todo")
            .await?
            .ok_or_else(|| DatabaseError::Query("create_todo: no row returned".to_string()))?;
        debug!(id = created.id, "Todo created");
        Ok(created)
    }

    async fn select_todo(&self, id: i64) -> Result<TodoRecord, DatabaseError> {
        let rows = self
            .conn()
            .query(
                &format!("SELECT {TODO_COLUMNS} FROM todos WHERE id = ?1"),
                params![id],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_todo: {e}")))?;

        single_todo(rows, "get_todo")
            .await?
            .ok_or_else(|| DatabaseError::todo_not_found(id))
    }

    async fn patch_todo(&self, id: i64, fields: &[TodoField]) -> Result<TodoRecord, DatabaseError> {
        let mut values = vec![Value::Text(Utc::now().to_rfc3339())];
        let mut sql = String::from("UPDATE todos SET updated_at = ?1");
        for field in fields {
            values.push(field_value(field));
            sql.push_str(&format!(", {} = ?{}", field.column(), values.len()));
        }
        values.push(Value::Integer(id));
        sql.push_str(&format!(
            " WHERE id = ?{} RETURNING {TODO_COLUMNS}",
            values.len()
        ));

        let rows = self
            .conn()
            .query(&sql, Params::Positional(values))
            .await
            .map_err(|e| DatabaseError::Query(format!("update_todo: {e}")))?;

        let updated = single_todo(rows, "update_todo")
            .await?
            .ok_or_else(|| DatabaseError::todo_not_found(id))?;
        debug!(id, fields = fields.len(), "Todo updated");
        Ok(updated)
    }

    async fn remove_todo(&self, id: i64) -> Result<(), DatabaseError> {
        let count = self
            .conn()
            .execute("DELETE FROM todos WHERE id = ?1", params![id])
            .await
            .map_err(|e| DatabaseError::Query(format!("delete_todo: {e}")))?;
        if count == 0 {
            return Err(DatabaseError::todo_not_found(id));
        }
        debug!(id, "Todo deleted");
        Ok(())
    }

    /// One page plus the matching total, read by a single statement.
    ///
    /// Past the last page the total comes from a second `COUNT(*)`, which
    /// can observe writes committed between the two statements.
    async fn select_page(&self, filter: &TodoFilter) -> Result<(Vec<TodoRecord>, i64), DatabaseError> {
        let query = ListQuery::from_filter(filter);
        let (where_sql, mut values) = render_predicates(&query.predicates);

        values.push(Value::Integer(sql_int(query.limit)));
        let limit_idx = values.len();
        values.push(Value::Integer(sql_int(query.offset)));
        let offset_idx = values.len();

        let sql = format!(
            "SELECT {TODO_COLUMNS}, COUNT(*) OVER() AS total_items FROM todos{where_sql} \
             ORDER BY id ASC LIMIT ?{limit_idx} OFFSET ?{offset_idx}"
        );

        let mut rows = self
            .conn()
            .query(&sql, Params::Positional(values))
            .await
            .map_err(|e| DatabaseError::Query(format!("list_todos: {e}")))?;

        let mut todos = Vec::new();
        let mut total_items = 0;
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("list_todos row: {e}")))?
        {
            total_items = row
                .get::<i64>(TOTAL_ITEMS_IDX)
                .map_err(|e| DatabaseError::Query(format!("todo.total_items: {e}")))?;
            todos.push(row_to_todo(&row)?);
        }

        // Past the last page the window count has no row to ride on.
        if todos.is_empty() && query.offset > 0 {
            total_items = self.count_matching(&query.predicates).await?;
        }

        Ok((todos, total_items))
    }

    async fn count_matching(&self, predicates: &[Predicate]) -> Result<i64, DatabaseError> {
        let (where_sql, values) = render_predicates(predicates);
        let mut rows = self
            .conn()
            .query(
                &format!("SELECT COUNT(*) FROM todos{where_sql}"),
                Params::Positional(values),
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("count_todos: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => row
                .get::<i64>(0)
                .map_err(|e| DatabaseError::Query(format!("count_todos value: {e}"))),
            Ok(None) => Ok(0),
            Err(e) => Err(DatabaseError::Query(format!("count_todos row: {e}"))),
        }
    }
}

// ── Helper functions ────────────────────────────────────────────────

const TODO_COLUMNS: &str = "id, title, description, date, status, created_at, updated_at";

/// Position of the window count appended after `TODO_COLUMNS`.
const TOTAL_ITEMS_IDX: i32 = 7;

/// Parse an RFC 3339 or SQLite datetime string into DateTime<Utc>.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>, DatabaseError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    // SQLite datetime() output, with or without fractional seconds
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Ok(ndt.and_utc());
    }
    Err(DatabaseError::Serialization(format!(
        "invalid timestamp '{s}'"
    )))
}

/// Read a nullable TEXT column.
fn opt_text(row: &libsql::Row, idx: i32, name: &str) -> Result<Option<String>, DatabaseError> {
    match row.get_value(idx) {
        Ok(Value::Null) => Ok(None),
        Ok(Value::Text(s)) => Ok(Some(s)),
        Ok(other) => Err(DatabaseError::Serialization(format!(
            "{name}: expected text, got {other:?}"
        ))),
        Err(e) => Err(DatabaseError::Query(format!("{name}: {e}"))),
    }
}

fn row_to_todo(row: &libsql::Row) -> Result<TodoRecord, DatabaseError> {
    let id: i64 = row.get(0).map_err(|e| DatabaseError::Query(format!("todo.id: {e}")))?;
    let title: String = row.get(1).map_err(|e| DatabaseError::Query(format!("todo.title: {e}")))?;
    let description = opt_text(row, 2, "todo.description")?.unwrap_or_default();

    let date_str: String = row.get(3).map_err(|e| DatabaseError::Query(format!("todo.date: {e}")))?;
    let date = NaiveDate::parse_from_str(&date_str, DATE_FORMAT)
        .map_err(|e| DatabaseError::Serialization(format!("todo.date '{date_str}': {e}")))?;

    let status: String = row.get(4).map_err(|e| DatabaseError::Query(format!("todo.status: {e}")))?;

    let created_str: String = row
        .get(5)
        .map_err(|e| DatabaseError::Query(format!("todo.created_at: {e}")))?;
    let created_at = parse_datetime(&created_str)?;

    let updated_at = opt_text(row, 6, "todo.updated_at")?
        .map(|s| parse_datetime(&s))
        .transpose()?;

    Ok(TodoRecord {
        id,
        title,
        description,
        date,
        status,
        created_at,
        updated_at,
    })
}

/// Read at most one todo and step the statement to completion.
async fn single_todo(
    mut rows: libsql::Rows,
    operation: &str,
) -> Result<Option<TodoRecord>, DatabaseError> {
    let todo = match rows.next().await {
        Ok(Some(row)) => Some(row_to_todo(&row)?),
        Ok(None) => return Ok(None),
        Err(e) => return Err(DatabaseError::Query(format!("{operation} row: {e}"))),
    };
    rows.next()
        .await
        .map_err(|e| DatabaseError::Query(format!("{operation} finish: {e}")))?;
    Ok(todo)
}

fn field_value(field: &TodoField) -> Value {
    match field {
        TodoField::Title(s) | TodoField::Description(s) | TodoField::Status(s) => {
            Value::Text(s.clone())
        }
        TodoField::Date(d) => Value::Text(d.format(DATE_FORMAT).to_string()),
    }
}

/// Render `WHERE` with positional parameters starting at `?1`.
fn render_predicates(predicates: &[Predicate]) -> (String, Vec<Value>) {
    let mut values = Vec::with_capacity(predicates.len() + 2);
    let mut clauses = Vec::with_capacity(predicates.len());
    for predicate in predicates {
        values.push(match predicate {
            Predicate::DateEq(d) => Value::Text(d.format(DATE_FORMAT).to_string()),
            Predicate::StatusEq(s) => Value::Text(s.clone()),
        });
        clauses.push(format!("{} = ?{}", predicate.column(), values.len()));
    }
    if clauses.is_empty() {
        (String::new(), values)
    } else {
        (format!(" WHERE {}", clauses.join(" AND ")), values)
    }
}

/// SQLite integers are signed; a negative OFFSET would mean zero.
fn sql_int(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

// ── Trait implementation ────────────────────────────────────────────

#[async_trait]
impl TodoRepository for LibSqlBackend {
    async fn create_todo(&self, todo: &TodoRecord) -> Result<TodoRecord, DatabaseError> {
        self.bounded("create_todo", self.insert_todo(todo)).await
    }

    async fn get_todo(&self, id: i64) -> Result<TodoRecord, DatabaseError> {
        self.bounded("get_todo", self.select_todo(id)).await
    }

    async fn update_todo(
        &self,
        id: i64,
        fields: &[TodoField],
    ) -> Result<TodoRecord, DatabaseError> {
        self.bounded("update_todo", self.patch_todo(id, fields)).await
    }

    async fn delete_todo(&self, id: i64) -> Result<(), DatabaseError> {
        self.bounded("delete_todo", self.remove_todo(id)).await
    }

    async fn list_todos(
        &self,
        filter: &TodoFilter,
    ) -> Result<(Vec<TodoRecord>, i64), DatabaseError> {
        self.bounded("list_todos", self.select_page(filter)).await
    }
}
