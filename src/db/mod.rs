pub mod migrations;
pub mod schema;

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;
use std::time::Duration;

/// Open (or create) the CityNotes database at the given path with the schema
/// initialized and migrations applied.
pub fn open_database(path: impl AsRef<Path>) -> Result<Connection> {
    let path = path.as_ref();

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }

    let conn = Connection::open(path)
        .with_context(|| format!("failed to open database at {}", path.display()))?;

    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.busy_timeout(Duration::from_millis(5000))?;

    schema::init_schema(&conn).context("failed to initialize schema")?;
    migrations::run_migrations(&conn).context("failed to run migrations")?;

    tracing::info!(path = %path.display(), "database initialized");
    Ok(conn)
}

/// Open a fully migrated in-memory database.
pub fn open_memory_database() -> Result<Connection> {
    let conn = Connection::open_in_memory().context("failed to open in-memory database")?;
    schema::init_schema(&conn).context("failed to initialize schema")?;
    migrations::run_migrations(&conn).context("failed to run migrations")?;
    Ok(conn)
}

/// Result of [`check_database_health`].
#[derive(Debug, Clone)]
pub struct HealthReport {
    pub integrity_ok: bool,
    /// Raw `PRAGMA integrity_check` output when it is not `ok`.
    pub integrity_details: String,
    pub schema_version: u32,
    pub entry_count: i64,
    pub write_count: i64,
    /// RFC 3339 timestamp of the most recent durable write.
    pub last_write_at: Option<String>,
}

/// Run integrity and bookkeeping queries against an open database.
pub fn check_database_health(conn: &Connection) -> Result<HealthReport> {
    let integrity: String = conn
        .query_row("PRAGMA integrity_check", [], |row| row.get(0))
        .context("integrity check failed to run")?;
    let schema_version = migrations::get_schema_version(conn)?;
    let entry_count: i64 =
        conn.query_row("SELECT COUNT(*) FROM kv_entries", [], |row| row.get(0))?;
    let write_count: i64 =
        conn.query_row("SELECT COUNT(*) FROM write_log", [], |row| row.get(0))?;
    let last_write_at: Option<String> = conn
        .query_row(
            "SELECT created_at FROM write_log ORDER BY id DESC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()?;

    let integrity_ok = integrity == "ok";
    Ok(HealthReport {
        integrity_ok,
        integrity_details: if integrity_ok { String::new() } else { integrity },
        schema_version,
        entry_count,
        write_count,
        last_write_at,
    })
}
