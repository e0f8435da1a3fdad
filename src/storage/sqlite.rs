use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use super::{traits::Store, StoreError};
use crate::types::Record;

const DB_SCHEMA_VERSION: i64 = 1;

/// SQLite-backed store. Owns a single connection; every read and write serializes on it.
pub struct SqliteStore {
    path: String,
    conn: Mutex<Connection>,
}

fn map_record_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Record> {
    // Tables created by older tooling allow NULLs in every column but the key.
    Ok(Record {
        id: row.get(0)?,
        user_id: row.get::<_, Option<i64>>(1)?.unwrap_or_default(),
        title: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        body: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
    })
}

fn db_insert_or_ignore(conn: &Connection, record: &Record) -> rusqlite::Result<bool> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO posts (id, user_id, title, body) VALUES (?1, ?2, ?3, ?4)",
        params![record.id, record.user_id, record.title, record.body],
    )?;
    Ok(changed == 1)
}

fn db_load_record(conn: &Connection, id: i64) -> rusqlite::Result<Option<Record>> {
    conn.query_row(
        "SELECT id, user_id, title, body FROM posts WHERE id = ?1",
        params![id],
        map_record_row,
    )
    .optional()
}

fn db_list_records(conn: &Connection) -> rusqlite::Result<Vec<Record>> {
    let mut stmt = conn.prepare("SELECT id, user_id, title, body FROM posts ORDER BY id")?;
    let mapped = stmt
        .query_map([], map_record_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(mapped)
}

impl SqliteStore {
    /// Open (creating if needed) the database at `path` and ensure the schema.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_string_lossy().into_owned();
        let open_err = |e: rusqlite::Error| StoreError::Open {
            path: path.clone(),
            reason: e.to_string(),
        };

        let conn = Connection::open(&path).map_err(open_err)?;
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(open_err)?;
        conn.pragma_update(None, "synchronous", "NORMAL")
            .map_err(open_err)?;
        conn.busy_timeout(std::time::Duration::from_millis(500))
            .map_err(open_err)?;

        Self::migrate(&conn)?;

        Ok(Self {
            path,
            conn: Mutex::new(conn),
        })
    }

    /// Remove the database file (and its WAL side files) to force a clean start.
    pub fn reset_all<P: AsRef<Path>>(path: P) -> std::io::Result<()> {
        let path = path.as_ref();
        for suffix in ["", "-wal", "-shm"] {
            let mut candidate = path.as_os_str().to_owned();
            candidate.push(suffix);
            match std::fs::remove_file(&candidate) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    fn read<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T>,
    {
        let conn = self.lock()?;
        f(&conn).map_err(|e| StoreError::Read(e.to_string()))
    }

    fn write<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T>,
    {
        let conn = self.lock()?;
        f(&conn).map_err(|e| StoreError::Write(e.to_string()))
    }

    fn migrate(conn: &Connection) -> Result<(), StoreError> {
        let version: i64 = conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .map_err(|e| StoreError::Read(e.to_string()))?;

        if version == DB_SCHEMA_VERSION {
            return Ok(());
        }

        if version != 0 {
            return Err(StoreError::Schema {
                found: version,
                expected: DB_SCHEMA_VERSION,
            });
        }

        log::info!(
            "SQLite schema migration: {} -> {}",
            version,
            DB_SCHEMA_VERSION
        );

        // IF NOT EXISTS keeps a pre-existing, unversioned posts table and its rows.
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS posts (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                title TEXT NOT NULL,
                body TEXT NOT NULL
            );
            "#,
        )
        .map_err(|e| StoreError::Write(e.to_string()))?;
        conn.pragma_update(None, "user_version", DB_SCHEMA_VERSION)
            .map_err(|e| StoreError::Write(e.to_string()))?;
        Ok(())
    }
}

impl Store for SqliteStore {
    fn upsert_one(&self, record: &Record) -> Result<bool, StoreError> {
        self.write(|conn| db_insert_or_ignore(conn, record))
    }

    fn get(&self, id: i64) -> Result<Option<Record>, StoreError> {
        self.read(|conn| db_load_record(conn, id))
    }

    fn list(&self) -> Result<Vec<Record>, StoreError> {
        self.read(db_list_records)
    }

    fn count(&self) -> Result<u64, StoreError> {
        let n: i64 = self.read(|conn| conn.query_row("SELECT COUNT(*) FROM posts", [], |row| row.get(0)))?;
        Ok(n as u64)
    }

    fn insert_new(&self, user_id: i64, title: &str, body: &str) -> Result<i64, StoreError> {
        self.write(|conn| {
            conn.execute(
                "INSERT INTO posts (user_id, title, body) VALUES (?1, ?2, ?3)",
                params![user_id, title, body],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    fn delete(&self, id: i64) -> Result<bool, StoreError> {
        self.write(|conn| {
            let changed = conn.execute("DELETE FROM posts WHERE id = ?1", params![id])?;
            Ok(changed > 0)
        })
    }
}
