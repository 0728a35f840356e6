//! SQLite backend for the movie record table: schema, pragmas, and queries.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, info};

use super::{MovieColumns, MovieRow};
use crate::error::{DbError, DbResult};

/// Name of the movie table.
pub const MOVIES_TABLE: &str = "movies";

/// Columns added after the first schema; older databases get them on open.
const LATE_COLUMNS: &[&str] = &["actors", "director", "description"];

const SELECT_COLUMNS: &str = "id, title, year, director, actors, description";

/// A connection to the movie record table.
///
/// Each instance owns one `rusqlite::Connection`. Callers open a store for
/// the duration of a single operation and drop it afterwards; connections
/// are never pooled or shared.
pub struct SqliteRecordStore {
    path: PathBuf,
    conn: Connection,
}

impl std::fmt::Debug for SqliteRecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteRecordStore")
            .field("path", &self.path)
            .finish()
    }
}

impl SqliteRecordStore {
    /// Open the record store at `path`, creating the file and table if needed.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path).map_err(|e| DbError::record_open(path, e.to_string()))?;

        apply_pragmas(&conn)?;
        init_schema(&conn)?;

        Ok(Self {
            path: path.to_path_buf(),
            conn,
        })
    }

    /// Path of the underlying database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// List every movie in primary key order.
    pub fn list_all(&self) -> DbResult<Vec<MovieRow>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM {MOVIES_TABLE} ORDER BY id"
        ))?;
        let rows = stmt.query_map([], map_movie_row)?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Fetch one movie by id.
    pub fn get(&self, id: i64) -> DbResult<Option<MovieRow>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {SELECT_COLUMNS} FROM {MOVIES_TABLE} WHERE id = ?1"),
                params![id],
                map_movie_row,
            )
            .optional()?;
        Ok(row)
    }

    /// Insert a new movie and return the id assigned by the store.
    pub fn insert(&self, columns: &MovieColumns) -> DbResult<i64> {
        self.conn.execute(
            &format!(
                "INSERT INTO {MOVIES_TABLE} (title, year, actors, director, description)
                 VALUES (?1, ?2, ?3, ?4, ?5)"
            ),
            params![
                columns.title,
                columns.year,
                columns.actors,
                columns.director,
                columns.description
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!("Inserted movie {} into {}", id, self.path.display());
        Ok(id)
    }

    /// Replace every column of an existing movie.
    ///
    /// Returns `false` when no row has this id.
    pub fn replace(&self, id: i64, columns: &MovieColumns) -> DbResult<bool> {
        let changed = self.conn.execute(
            &format!(
                "UPDATE {MOVIES_TABLE}
                 SET title = ?1, year = ?2, actors = ?3, director = ?4, description = ?5
                 WHERE id = ?6"
            ),
            params![
                columns.title,
                columns.year,
                columns.actors,
                columns.director,
                columns.description,
                id
            ],
        )?;
        Ok(changed > 0)
    }

    /// Delete one movie. Returns `false` when no row has this id.
    pub fn delete(&self, id: i64) -> DbResult<bool> {
        let changed = self
            .conn
            .execute(&format!("DELETE FROM {MOVIES_TABLE} WHERE id = ?1"), params![id])?;
        Ok(changed > 0)
    }

    /// Delete every movie and return how many rows were removed.
    pub fn delete_all(&self) -> DbResult<usize> {
        let changed = self
            .conn
            .execute(&format!("DELETE FROM {MOVIES_TABLE}"), [])?;
        info!("Deleted {} movies from {}", changed, self.path.display());
        Ok(changed)
    }

    /// Substring search over title, director, actors and description.
    ///
    /// The query is wrapped in `%` and matched with `LIKE`, so SQLite's
    /// default case folding (ASCII only) applies and `%`/`_` in the query act
    /// as wildcards. Rows come back in store order.
    pub fn search_text(&self, query: &str, limit: usize) -> DbResult<Vec<MovieRow>> {
        let pattern = format!("%{}%", query);
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {SELECT_COLUMNS} FROM {MOVIES_TABLE}
             WHERE title LIKE ?1 OR director LIKE ?1 OR actors LIKE ?1 OR description LIKE ?1
             LIMIT ?2"
        ))?;
        let rows = stmt.query_map(params![pattern, limit as i64], map_movie_row)?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Number of movies in the table.
    pub fn count(&self) -> DbResult<usize> {
        let count: i64 =
            self.conn
                .query_row(&format!("SELECT COUNT(*) FROM {MOVIES_TABLE}"), [], |row| {
                    row.get(0)
                })?;
        Ok(count as usize)
    }
}

// ============================================================================
// Schema
// ============================================================================

fn apply_pragmas(conn: &Connection) -> DbResult<()> {
    conn.busy_timeout(Duration::from_secs(5))?;
    conn.execute_batch(
        r"
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA temp_store = MEMORY;
        ",
    )?;
    Ok(())
}

fn init_schema(conn: &Connection) -> DbResult<()> {
    // AUTOINCREMENT keeps ids of deleted rows from being handed out again, so
    // a stale vector entry can never join onto an unrelated new movie.
    conn.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS {MOVIES_TABLE} (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL,
            year TEXT NOT NULL,
            actors TEXT NOT NULL DEFAULT '',
            director TEXT NOT NULL DEFAULT '',
            description TEXT NOT NULL DEFAULT ''
        );"
    ))?;

    let existing = table_columns(conn)?;
    for column in LATE_COLUMNS {
        if !existing.iter().any(|c| c == column) {
            info!("Adding missing column '{}' to {}", column, MOVIES_TABLE);
            conn.execute(
                &format!("ALTER TABLE {MOVIES_TABLE} ADD COLUMN {column} TEXT NOT NULL DEFAULT ''"),
                [],
            )?;
        }
    }

    Ok(())
}

fn table_columns(conn: &Connection) -> DbResult<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({MOVIES_TABLE})"))?;
    let names = stmt.query_map([], |row| row.get::<_, String>(1))?;

    let mut out = Vec::new();
    for name in names {
        out.push(name?);
    }
    Ok(out)
}

// ============================================================================
// Row mapping
// ============================================================================

fn map_movie_row(row: &Row<'_>) -> rusqlite::Result<MovieRow> {
    Ok(MovieRow {
        id: row.get(0)?,
        columns: MovieColumns {
            title: column_text(row, 1)?,
            year: column_text(row, 2)?,
            director: column_text(row, 3)?,
            actors: column_text(row, 4)?,
            description: column_text(row, 5)?,
        },
    })
}

/// Read a column as text whatever its storage class; NULL becomes "".
fn column_text(row: &Row<'_>, idx: usize) -> rusqlite::Result<String> {
    Ok(match row.get_ref(idx)? {
        ValueRef::Null => String::new(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(t) | ValueRef::Blob(t) => String::from_utf8_lossy(t).into_owned(),
    })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_temp() -> (TempDir, SqliteRecordStore) {
        let temp = TempDir::new().unwrap();
        let store = SqliteRecordStore::open(temp.path().join("movies.db")).unwrap();
        (temp, store)
    }

    fn inception() -> MovieColumns {
        MovieColumns::new("Inception", "2010")
            .with_director("Christopher Nolan")
            .with_actors("Leonardo DiCaprio")
            .with_description("A thief who steals secrets via dreams")
    }

    #[test]
    fn test_insert_and_get() {
        let (_temp, store) = open_temp();
        let id = store.insert(&inception()).unwrap();

        let row = store.get(id).unwrap().unwrap();
        assert_eq!(row.id, id);
        assert_eq!(row.columns, inception());
    }

    #[test]
    fn test_optional_columns_default_empty() {
        let (_temp, store) = open_temp();
        let id = store.insert(&MovieColumns::new("Alien", "1979")).unwrap();

        let row = store.get(id).unwrap().unwrap();
        assert_eq!(row.columns.director, "");
        assert_eq!(row.columns.actors, "");
        assert_eq!(row.columns.description, "");
    }

    #[test]
    fn test_get_missing_is_none() {
        let (_temp, store) = open_temp();
        assert!(store.get(42).unwrap().is_none());
    }

    #[test]
    fn test_replace_overwrites_all_columns() {
        let (_temp, store) = open_temp();
        let id = store.insert(&inception()).unwrap();

        let replaced = store
            .replace(id, &MovieColumns::new("Inception (2010)", "2010"))
            .unwrap();
        assert!(replaced);

        let row = store.get(id).unwrap().unwrap();
        assert_eq!(row.columns.title, "Inception (2010)");
        assert_eq!(row.columns.director, "");
        assert_eq!(row.columns.description, "");
    }

    #[test]
    fn test_replace_and_delete_missing() {
        let (_temp, store) = open_temp();
        assert!(!store.replace(7, &inception()).unwrap());
        assert!(!store.delete(7).unwrap());
    }

    #[test]
    fn test_delete_all_counts_rows() {
        let (_temp, store) = open_temp();
        store.insert(&inception()).unwrap();
        store.insert(&MovieColumns::new("Heat", "1995")).unwrap();

        assert_eq!(store.delete_all().unwrap(), 2);
        assert_eq!(store.count().unwrap(), 0);
        assert!(store.list_all().unwrap().is_empty());
    }

    #[test]
    fn test_ids_not_reused_after_delete() {
        let (_temp, store) = open_temp();
        let first = store.insert(&inception()).unwrap();
        store.delete(first).unwrap();

        let second = store.insert(&inception()).unwrap();
        assert!(second > first);
    }

    #[test]
    fn test_search_text_matches_any_field() {
        let (_temp, store) = open_temp();
        let id = store.insert(&inception()).unwrap();
        store
            .insert(&MovieColumns::new("Heat", "1995").with_director("Michael Mann"))
            .unwrap();

        let by_director = store.search_text("Nolan", 50).unwrap();
        assert_eq!(by_director.len(), 1);
        assert_eq!(by_director[0].id, id);

        let by_description = store.search_text("dreams", 50).unwrap();
        assert_eq!(by_description[0].id, id);

        // ASCII LIKE is case-insensitive in SQLite.
        assert_eq!(store.search_text("nolan", 50).unwrap().len(), 1);

        assert!(store.search_text("Kubrick", 50).unwrap().is_empty());
    }

    #[test]
    fn test_search_text_respects_limit() {
        let (_temp, store) = open_temp();
        for i in 0..5 {
            store
                .insert(&MovieColumns::new(format!("Movie {i}"), "2000"))
                .unwrap();
        }

        assert_eq!(store.search_text("Movie", 3).unwrap().len(), 3);
    }

    #[test]
    fn test_legacy_table_gets_missing_columns() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("legacy.db");
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute_batch(
                "CREATE TABLE movies (id INTEGER PRIMARY KEY, title TEXT, year INTEGER);
                 INSERT INTO movies (title, year) VALUES ('Metropolis', 1927);
                 INSERT INTO movies (title, year) VALUES (NULL, NULL);",
            )
            .unwrap();
        }

        let store = SqliteRecordStore::open(&path).unwrap();
        let rows = store.list_all().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].columns.year, "1927");
        assert_eq!(rows[0].columns.director, "");
        assert_eq!(rows[1].columns.title, "");
    }
}
