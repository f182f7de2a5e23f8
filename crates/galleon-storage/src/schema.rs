//! SQL schema constants and migration setup for the index store.
//!
//! Uses `rusqlite_migration` to manage schema migrations via SQLite's
//! `user_version` pragma. Migrations are embedded at compile time via
//! `include_str!` and each runs inside its own transaction, so a migration
//! failing partway rolls back to the pre-migration state.

use rusqlite::Connection;
use rusqlite_migration::{Migrations, M};

use crate::error::StoreError;

/// All schema migrations, applied in order via `user_version` tracking.
pub(crate) fn migrations() -> Migrations<'static> {
    Migrations::new(vec![
        M::up(include_str!("migrations/001_initial_schema.sql")),
        M::up(include_str!("migrations/002_multi_sampler.sql")),
        // Future migrations added here as new M::up(...) entries.
    ])
}

/// Opens (or creates) a SQLite database at `path` with WAL mode, foreign
/// keys, and all pending migrations applied.
pub fn open_database(path: &str) -> Result<Connection, StoreError> {
    let mut conn = Connection::open(path)?;
    configure_and_migrate(&mut conn)?;
    Ok(conn)
}

/// Opens an in-memory SQLite database with the same pragmas and migrations
/// (WAL is a no-op for in-memory databases).
pub fn open_in_memory() -> Result<Connection, StoreError> {
    let mut conn = Connection::open_in_memory()?;
    configure_and_migrate(&mut conn)?;
    Ok(conn)
}

/// Configures pragmas and applies pending migrations.
fn configure_and_migrate(conn: &mut Connection) -> Result<(), StoreError> {
    // WAL keeps readers unblocked while a sync pass commits.
    conn.pragma_update(None, "journal_mode", "WAL")?;
    // NORMAL synchronous is safe with WAL mode and much faster.
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    // Foreign key enforcement (off by default in SQLite) backs the
    // cascade semantics between files and samplers.
    conn.pragma_update(None, "foreign_keys", "ON")?;

    migrations()
        .to_latest(conn)
        .map_err(|e| StoreError::Migration(e.to_string()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::params;

    #[test]
    fn migrations_validate() {
        assert!(migrations().validate().is_ok());
    }

    #[test]
    fn fresh_database_lands_on_latest_schema() {
        let conn = open_in_memory().unwrap();
        let version: i64 = conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, 2);

        // The multi-sampler uniqueness constraint is in place.
        conn.execute(
            "INSERT INTO files (id, path, mtime, name) VALUES ('f1', '/a/x.png', 1.0, 'x.png')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO samplers (file_id, sampler_index) VALUES ('f1', 0)",
            [],
        )
        .unwrap();
        let dup = conn.execute(
            "INSERT INTO samplers (file_id, sampler_index) VALUES ('f1', 0)",
            [],
        );
        assert!(dup.is_err());
    }

    #[test]
    fn v1_data_survives_the_multi_sampler_migration() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.pragma_update(None, "foreign_keys", "ON").unwrap();

        // Stop at the single-sampler schema and populate it.
        migrations().to_version(&mut conn, 1).unwrap();
        conn.execute(
            "INSERT INTO files (id, path, mtime, name) VALUES ('f1', '/a/x.png', 1.0, 'x.png')",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO samplers (file_id, model_name, cfg, steps)
             VALUES ('f1', 'sdxl_base', 7.5, 20)",
            [],
        )
        .unwrap();

        migrations().to_latest(&mut conn).unwrap();

        let (index, model, cfg): (i64, String, f64) = conn
            .query_row(
                "SELECT sampler_index, model_name, cfg FROM samplers WHERE file_id = 'f1'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .unwrap();
        assert_eq!(index, 0);
        assert_eq!(model, "sdxl_base");
        assert_eq!(cfg, 7.5);

        // The backup table is gone after a successful migration.
        let backup_exists: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
                params!["samplers_backup"],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(backup_exists, 0);
    }
}
