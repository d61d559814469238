//! SQLite-backed identifier-mapping database.
//!
//! The layout follows BridgeDb's derby databases: `datanode` holds every
//! entity, `link` holds directed links between entities and `info` holds
//! build metadata. All inserts are idempotent so callers can emit the same
//! entity or link any number of times.

use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::{Connection, OptionalExtension, params};

use crate::domain::{DataSource, Xref};
use crate::error::IdmapError;

pub const SCHEMA_VERSION: &str = "3";

const SCHEMA_CREATE: &str = r#"
CREATE TABLE IF NOT EXISTS info (
    key TEXT PRIMARY KEY NOT NULL,
    value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS datanode (
    id TEXT NOT NULL,
    code TEXT NOT NULL,
    PRIMARY KEY (id, code)
);

CREATE TABLE IF NOT EXISTS link (
    idLeft TEXT NOT NULL,
    codeLeft TEXT NOT NULL,
    idRight TEXT NOT NULL,
    codeRight TEXT NOT NULL,
    PRIMARY KEY (idLeft, codeLeft, idRight, codeRight)
);
"#;

const SCHEMA_CREATE_INDEXES: &str = r#"
CREATE INDEX IF NOT EXISTS idx_link_right ON link(idRight, codeRight);
CREATE INDEX IF NOT EXISTS idx_datanode_code ON datanode(code);
"#;

/// Write side of a mapping database, as seen by the loader.
pub trait MappingSink {
    fn add_entity(&mut self, xref: &Xref) -> Result<(), IdmapError>;
    fn add_link(&mut self, left: &Xref, right: &Xref) -> Result<(), IdmapError>;
}

pub struct MappingDb {
    conn: Connection,
    in_transaction: bool,
}

impl MappingDb {
    /// Open a fresh database at `path`, deleting whatever was there.
    pub fn create(path: &Path) -> Result<Self, IdmapError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| IdmapError::Filesystem(err.to_string()))?;
        }
        for stale in stale_files(path) {
            if stale.exists() {
                fs::remove_file(&stale).map_err(|err| {
                    IdmapError::Filesystem(format!("remove {}: {err}", stale.display()))
                })?;
            }
        }

        let conn = Connection::open(path)?;
        Self::configure_connection(&conn)?;
        Ok(Self {
            conn,
            in_transaction: false,
        })
    }

    /// Open an existing database for reading.
    pub fn open(path: &Path) -> Result<Self, IdmapError> {
        if !path.exists() {
            return Err(IdmapError::Filesystem(format!(
                "database not found: {}",
                path.display()
            )));
        }
        let conn = Connection::open(path)?;
        Ok(Self {
            conn,
            in_transaction: false,
        })
    }

    pub fn in_memory() -> Result<Self, IdmapError> {
        let conn = Connection::open_in_memory()?;
        Self::configure_connection(&conn)?;
        Ok(Self {
            conn,
            in_transaction: false,
        })
    }

    fn configure_connection(conn: &Connection) -> rusqlite::Result<()> {
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "temp_store", "MEMORY")?;
        conn.pragma_update(None, "cache_size", -32000)?;
        Ok(())
    }

    /// Open the write transaction that `commit` closes and create the
    /// tables inside it, so an aborted build leaves no schema behind.
    pub fn create_schema(&mut self) -> Result<(), IdmapError> {
        self.begin()?;
        self.conn.execute_batch(SCHEMA_CREATE)?;
        Ok(())
    }

    fn begin(&mut self) -> Result<(), IdmapError> {
        if !self.in_transaction {
            self.conn.execute_batch("BEGIN")?;
            self.in_transaction = true;
        }
        Ok(())
    }

    pub fn set_info(&mut self, key: &str, value: &str) -> Result<(), IdmapError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO info (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn info(&self, key: &str) -> Result<Option<String>, IdmapError> {
        let value = self
            .conn
            .query_row("SELECT value FROM info WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    pub fn commit(&mut self) -> Result<(), IdmapError> {
        if self.in_transaction {
            self.conn.execute_batch("COMMIT")?;
            self.in_transaction = false;
        }
        Ok(())
    }

    /// Build lookup indexes, compact the file and close the connection.
    /// Anything still uncommitted is committed first.
    pub fn finalize(mut self) -> Result<(), IdmapError> {
        self.commit()?;
        self.conn.execute_batch(SCHEMA_CREATE_INDEXES)?;
        self.set_info("SCHEMAVERSION", SCHEMA_VERSION)?;
        tracing::debug!("compacting database");
        self.conn.execute_batch("VACUUM")?;
        self.conn.close().map_err(|(_, err)| IdmapError::from(err))
    }

    pub fn entity_count(&self) -> Result<usize, IdmapError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM datanode", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn link_count(&self) -> Result<usize, IdmapError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM link", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn entities(&self, source: DataSource) -> Result<Vec<Xref>, IdmapError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM datanode WHERE code = ?1 ORDER BY id")?;
        let ids = stmt
            .query_map([source.system_code()], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids.into_iter().map(|id| Xref::new(id, source)).collect())
    }

    /// Targets linked from `left`, ordered by code then id.
    pub fn links_from(&self, left: &Xref) -> Result<Vec<Xref>, IdmapError> {
        let mut stmt = self.conn.prepare(
            "SELECT idRight, codeRight FROM link WHERE idLeft = ?1 AND codeLeft = ?2 ORDER BY codeRight, idRight",
        )?;
        let rows = stmt
            .query_map(params![left.id(), left.source().system_code()], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut links = Vec::with_capacity(rows.len());
        for (id, code) in rows {
            match DataSource::from_system_code(&code) {
                Some(source) => links.push(Xref::new(id, source)),
                None => tracing::warn!("skipping link with unknown system code {code}"),
            }
        }
        Ok(links)
    }
}

/// The database file plus the journal files SQLite may leave next to it.
fn stale_files(path: &Path) -> Vec<PathBuf> {
    let mut files = vec![path.to_path_buf()];
    for suffix in ["-journal", "-wal", "-shm"] {
        let mut name = path.as_os_str().to_os_string();
        name.push(suffix);
        files.push(PathBuf::from(name));
    }
    files
}

impl MappingSink for MappingDb {
    fn add_entity(&mut self, xref: &Xref) -> Result<(), IdmapError> {
        let mut stmt = self
            .conn
            .prepare_cached("INSERT OR IGNORE INTO datanode (id, code) VALUES (?1, ?2)")?;
        stmt.execute(params![xref.id(), xref.source().system_code()])?;
        Ok(())
    }

    fn add_link(&mut self, left: &Xref, right: &Xref) -> Result<(), IdmapError> {
        let mut stmt = self.conn.prepare_cached(
            "INSERT OR IGNORE INTO link (idLeft, codeLeft, idRight, codeRight) VALUES (?1, ?2, ?3, ?4)",
        )?;
        stmt.execute(params![
            left.id(),
            left.source().system_code(),
            right.id(),
            right.source().system_code(),
        ])?;
        Ok(())
    }
}
