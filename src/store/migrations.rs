//! Schema versioning for the libSQL backend.
//!
//! `_migrations` records the highest applied step. Each step runs in its
//! own transaction together with its version row.

use libsql::Connection;
use tracing::info;

use crate::error::DatabaseError;

/// `(version, name, sql)`, ascending by version.
const STEPS: &[(i64, &str, &str)] = &[(
    1,
    "todos_table",
    "CREATE TABLE IF NOT EXISTS todos (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        date TEXT NOT NULL,
        status TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT
    );
    CREATE INDEX IF NOT EXISTS idx_todos_date ON todos(date);
    CREATE INDEX IF NOT EXISTS idx_todos_status ON todos(status);",
)];

/// Bring the schema up to the latest step.
pub async fn run_migrations(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        (),
    )
    .await
    .map_err(|e| DatabaseError::Migration(format!("_migrations table: {e}")))?;

    let applied = get_current_version(conn).await?;
    for &(version, name, sql) in STEPS.iter().filter(|(v, _, _)| *v > applied) {
        info!(version, name, "Applying migration");
        let batch = format!(
            "BEGIN;\n{sql}\nINSERT INTO _migrations (version, name) VALUES ({version}, '{name}');\nCOMMIT;"
        );
        conn.execute_batch(&batch)
            .await
            .map_err(|e| DatabaseError::Migration(format!("V{version} ({name}): {e}")))?;
    }
    Ok(())
}

/// Highest applied version, 0 on a fresh database.
async fn get_current_version(conn: &Connection) -> Result<i64, DatabaseError> {
    let mut rows = conn
        .query("SELECT COALESCE(MAX(version), 0) FROM _migrations", ())
        .await
        .map_err(|e| DatabaseError::Migration(format!("read version: {e}")))?;
    let row = rows
        .next()
        .await
        .map_err(|e| DatabaseError::Migration(format!("read version: {e}")))?
        .ok_or_else(|| DatabaseError::Migration("read version: no row".to_string()))?;
    row.get::<i64>(0)
        .map_err(|e| DatabaseError::Migration(format!("read version: {e}")))
}
