//! Persisted user preferences.
//!
//! A small SQLite-backed key-value store, entirely separate from the test
//! databases the app manipulates. Nothing in the database-testing path
//! writes here; only explicit preference changes do.

use anyhow::Result;
use async_lock::OnceCell;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Preference keys.
const KEY_DB_DIR: &str = "db_dir";
const KEY_LAST_DB: &str = "last_db";
const KEY_WINDOW_WIDTH: &str = "window_width";
const KEY_WINDOW_HEIGHT: &str = "window_height";

/// Application settings store backed by SQLite.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    pool: SqlitePool,
    path: PathBuf,
}

/// Global singleton instance
static STORE: OnceCell<SettingsStore> = OnceCell::new();

impl SettingsStore {
    /// Get or initialize the global settings store. Schema setup runs
    /// once.
    pub async fn singleton() -> Result<&'static Self> {
        STORE.get_or_try_init(Self::init).await
    }

    async fn init() -> Result<Self> {
        Self::from_path(default_settings_path()?).await
    }

    /// Open (creating if needed) a settings store at an explicit path.
    pub async fn from_path(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", path.display()))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(2)
            .connect_with(options)
            .await?;

        let store = Self { pool, path };
        store.initialize_schema().await?;
        Ok(store)
    }

    async fn initialize_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS app_settings (
                key TEXT PRIMARY KEY,
                value TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Path of the settings database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read one preference.
    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT value FROM app_settings WHERE key = ?1")
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(value,)| value))
    }

    /// Write one preference.
    pub async fn set(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO app_settings(key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    // ========== Typed helpers ==========

    /// Directory scanned for test databases. Created on demand; defaults
    /// to `test_dbs` next to the settings file.
    pub async fn database_dir(&self) -> Result<PathBuf> {
        let dir = match self.get(KEY_DB_DIR).await? {
            Some(stored) => PathBuf::from(stored),
            None => {
                let default = self
                    .path
                    .parent()
                    .map(|p| p.join("test_dbs"))
                    .unwrap_or_else(|| PathBuf::from("test_dbs"));
                self.set(KEY_DB_DIR, &default.display().to_string()).await?;
                default
            }
        };

        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    pub async fn set_database_dir(&self, dir: &Path) -> Result<()> {
        self.set(KEY_DB_DIR, &dir.display().to_string()).await
    }

    /// Last database the user had active, if remembered.
    pub async fn last_database(&self) -> Result<Option<PathBuf>> {
        Ok(self.get(KEY_LAST_DB).await?.map(PathBuf::from))
    }

    pub async fn set_last_database(&self, path: &Path) -> Result<()> {
        self.set(KEY_LAST_DB, &path.display().to_string()).await
    }

    /// Remembered window size, if any.
    pub async fn window_size(&self) -> Result<Option<(f32, f32)>> {
        let width = self.get(KEY_WINDOW_WIDTH).await?;
        let height = self.get(KEY_WINDOW_HEIGHT).await?;
        match (width, height) {
            (Some(w), Some(h)) => match (w.parse(), h.parse()) {
                (Ok(w), Ok(h)) => Ok(Some((w, h))),
                _ => Ok(None),
            },
            _ => Ok(None),
        }
    }

    pub async fn set_window_size(&self, width: f32, height: f32) -> Result<()> {
        self.set(KEY_WINDOW_WIDTH, &width.to_string()).await?;
        self.set(KEY_WINDOW_HEIGHT, &height.to_string()).await
    }

    /// Whether `path` is the settings database itself (or a sibling
    /// SQLite artifact of it). Protected files never appear in the tree
    /// and cannot be opened as test databases.
    pub fn is_protected(&self, path: &Path) -> bool {
        let canonical = |p: &Path| std::fs::canonicalize(p).unwrap_or_else(|_| p.to_path_buf());
        canonical(path) == canonical(&self.path)
    }
}

/// `settings.db` under the app's home directory.
pub fn default_settings_path() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Could not find home directory"))?;
    Ok(home.join(".litebench").join("settings.db"))
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn scratch_store(dir: &tempfile::TempDir) -> SettingsStore {
        SettingsStore::from_path(dir.path().join("settings.db"))
            .await
            .unwrap()
    }

    #[test]
    fn test_get_set_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        smol::block_on(async {
            let store = scratch_store(&dir).await;

            assert_eq!(store.get("missing").await.unwrap(), None);

            store.set("theme", "dark").await.unwrap();
            assert_eq!(store.get("theme").await.unwrap().as_deref(), Some("dark"));

            store.set("theme", "light").await.unwrap();
            assert_eq!(store.get("theme").await.unwrap().as_deref(), Some("light"));
        });
    }

    #[test]
    fn test_database_dir_default_created_and_persisted() {
        let dir = tempfile::tempdir().unwrap();
        smol::block_on(async {
            let store = scratch_store(&dir).await;

            let db_dir = store.database_dir().await.unwrap();
            assert!(db_dir.is_dir());
            assert_eq!(db_dir, dir.path().join("test_dbs"));

            // Stored, so a second call resolves the same directory.
            assert_eq!(store.database_dir().await.unwrap(), db_dir);

            let custom = dir.path().join("elsewhere");
            store.set_database_dir(&custom).await.unwrap();
            assert_eq!(store.database_dir().await.unwrap(), custom);
        });
    }

    #[test]
    fn test_last_database() {
        let dir = tempfile::tempdir().unwrap();
        smol::block_on(async {
            let store = scratch_store(&dir).await;
            assert_eq!(store.last_database().await.unwrap(), None);

            let db = dir.path().join("demo.db");
            store.set_last_database(&db).await.unwrap();
            assert_eq!(store.last_database().await.unwrap(), Some(db));
        });
    }

    #[test]
    fn test_window_size() {
        let dir = tempfile::tempdir().unwrap();
        smol::block_on(async {
            let store = scratch_store(&dir).await;
            assert_eq!(store.window_size().await.unwrap(), None);

            store.set_window_size(1200.0, 700.0).await.unwrap();
            assert_eq!(store.window_size().await.unwrap(), Some((1200.0, 700.0)));
        });
    }

    #[test]
    fn test_settings_file_is_protected() {
        let dir = tempfile::tempdir().unwrap();
        smol::block_on(async {
            let store = scratch_store(&dir).await;
            assert!(store.is_protected(store.path()));
            assert!(!store.is_protected(&dir.path().join("user.db")));
        });
    }
}
