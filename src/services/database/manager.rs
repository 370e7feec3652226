//! Registry of open test databases.
//!
//! The manager owns every open `TestDatabase` handle, keyed by canonical
//! path, so the tree and the executor always talk to the same pool for a
//! given file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_lock::RwLock;

use super::connection::TestDatabase;
use super::error::DatabaseError;

/// Extensions treated as database files when scanning the catalog
/// directory.
const DATABASE_EXTENSIONS: [&str; 3] = ["db", "sqlite", "sqlite3"];

/// Owns zero or more open connections to user-created SQLite files.
#[derive(Debug, Default)]
pub struct TestDatabaseManager {
    open: RwLock<HashMap<PathBuf, Arc<TestDatabase>>>,
}

impl TestDatabaseManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create (or open, if it already exists as a database) the file at
    /// `path` and register the handle.
    pub async fn create(&self, path: impl Into<PathBuf>) -> Result<Arc<TestDatabase>, DatabaseError> {
        let db = Arc::new(TestDatabase::create(path).await?);
        self.register(db.clone()).await;
        Ok(db)
    }

    /// Open the database at `path`, returning the existing handle if it
    /// is already open.
    pub async fn open(&self, path: impl Into<PathBuf>) -> Result<Arc<TestDatabase>, DatabaseError> {
        let path = path.into();

        if let Some(existing) = self.get(&path).await {
            if existing.is_open().await {
                return Ok(existing);
            }
            // Stale closed handle; drop it and reopen.
            self.open.write().await.remove(&registry_key(&path));
        }

        let db = Arc::new(TestDatabase::open(path).await?);
        self.register(db.clone()).await;
        Ok(db)
    }

    async fn register(&self, db: Arc<TestDatabase>) {
        let key = registry_key(db.path());
        self.open.write().await.insert(key, db);
    }

    /// Look up an open handle by path.
    pub async fn get(&self, path: &Path) -> Option<Arc<TestDatabase>> {
        self.open.read().await.get(&registry_key(path)).cloned()
    }

    /// Close and deregister the database at `path`.
    pub async fn close(&self, path: &Path) -> Result<(), DatabaseError> {
        let removed = self.open.write().await.remove(&registry_key(path));
        match removed {
            Some(db) => db.close().await,
            None => Err(DatabaseError::ClosedHandle),
        }
    }

    /// Close every open handle. Used on shutdown.
    pub async fn close_all(&self) {
        let handles: Vec<_> = self.open.write().await.drain().collect();
        for (path, db) in handles {
            if let Err(e) = db.close().await {
                tracing::warn!(path = %path.display(), "failed to close database: {e}");
            }
        }
    }

    /// Number of currently open handles.
    pub async fn open_count(&self) -> usize {
        self.open.read().await.len()
    }

    /// Database files in `dir`, sorted by name.
    pub fn scan_directory(dir: &Path) -> Result<Vec<PathBuf>, DatabaseError> {
        let mut found = Vec::new();

        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() && is_database_file(&path) {
                found.push(path);
            }
        }

        found.sort();
        Ok(found)
    }
}

/// Extension-based filter for catalog scanning.
pub fn is_database_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_lowercase();
            DATABASE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Canonicalize when possible so `./a.db` and `a.db` share a handle.
fn registry_key(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_open_close_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("life.db");

        smol::block_on(async {
            let manager = TestDatabaseManager::new();

            let db = manager.create(&path).await.unwrap();
            assert_eq!(manager.open_count().await, 1);
            assert!(db.is_open().await);

            // Opening the same path returns the registered handle.
            let again = manager.open(&path).await.unwrap();
            assert!(Arc::ptr_eq(&db, &again));
            assert_eq!(manager.open_count().await, 1);

            manager.close(&path).await.unwrap();
            assert_eq!(manager.open_count().await, 0);
            assert!(!db.is_open().await);

            // Closing an unknown path is a closed-handle error.
            let err = manager.close(&path).await.unwrap_err();
            assert!(err.is_closed_handle());

            // The file survives the close and can be reopened.
            let reopened = manager.open(&path).await.unwrap();
            assert!(reopened.is_open().await);
        });
    }

    #[test]
    fn test_close_all() {
        let dir = tempfile::tempdir().unwrap();
        smol::block_on(async {
            let manager = TestDatabaseManager::new();
            let a = manager.create(dir.path().join("a.db")).await.unwrap();
            let b = manager.create(dir.path().join("b.db")).await.unwrap();

            manager.close_all().await;
            assert_eq!(manager.open_count().await, 0);
            assert!(!a.is_open().await);
            assert!(!b.is_open().await);
        });
    }

    #[test]
    fn test_is_database_file() {
        assert!(is_database_file(Path::new("demo.db")));
        assert!(is_database_file(Path::new("demo.sqlite")));
        assert!(is_database_file(Path::new("DEMO.SQLITE3")));
        assert!(!is_database_file(Path::new("demo.sql")));
        assert!(!is_database_file(Path::new("demo.txt")));
        assert!(!is_database_file(Path::new("no_extension")));
    }

    #[test]
    fn test_scan_directory_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.db"), b"").unwrap();
        std::fs::write(dir.path().join("a.sqlite"), b"").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"not a db").unwrap();
        std::fs::create_dir(dir.path().join("sub.db")).unwrap();

        let found = TestDatabaseManager::scan_directory(dir.path()).unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.sqlite", "b.db"]);
    }
}
