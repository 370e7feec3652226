//! Session state for the workbench.
//!
//! One global struct holds everything the panels share: the loaded
//! template catalog, the open-database registry, the active database, and
//! the footer status line. Panels read via `cx.global` and mutate through
//! the helpers here.

use std::path::PathBuf;
use std::sync::Arc;

use gpui::*;

use crate::services::database::{TestDatabase, TestDatabaseManager};
use crate::services::settings::SettingsStore;
use crate::services::templates::TemplateCatalog;

/// Global state shared by every panel.
pub struct SessionState {
    /// Loaded template catalog. Immutable; imports swap in a new Arc.
    pub catalog: Arc<TemplateCatalog>,
    /// Registry of open test databases.
    pub manager: Arc<TestDatabaseManager>,
    /// Database targeted by the editor and template application.
    pub active_database: Option<Arc<TestDatabase>>,
    /// Directory scanned for test databases (from settings).
    pub database_dir: Option<PathBuf>,
    /// Settings store handle, once initialized.
    pub settings: Option<SettingsStore>,
    /// Footer status line.
    pub status: String,
}

impl Global for SessionState {}

impl SessionState {
    /// Install the global and kick off settings restoration.
    pub fn init(cx: &mut App) {
        let catalog = match TemplateCatalog::builtin() {
            Ok(catalog) => catalog,
            Err(e) => {
                tracing::error!("builtin template catalog failed to load: {e}");
                TemplateCatalog::default()
            }
        };

        cx.set_global(SessionState {
            catalog: Arc::new(catalog),
            manager: Arc::new(TestDatabaseManager::new()),
            active_database: None,
            database_dir: None,
            settings: None,
            status: "Ready.".to_string(),
        });

        // Restore preferences and the last active database off the main
        // path; panels re-render through the global observer when state
        // lands.
        cx.spawn(async move |cx| {
            let store = match SettingsStore::singleton().await {
                Ok(store) => store.clone(),
                Err(e) => {
                    tracing::error!("settings store unavailable: {e}");
                    return;
                }
            };

            let database_dir = store.database_dir().await.ok();
            let last_database = store.last_database().await.unwrap_or(None);

            let manager = cx
                .update_global::<SessionState, _>(|state, _cx| {
                    state.settings = Some(store.clone());
                    state.database_dir = database_dir;
                    state.manager.clone()
                })
                .ok();

            let Some(manager) = manager else { return };

            if let Some(path) = last_database {
                if path.exists() && !store.is_protected(&path) {
                    match manager.open(&path).await {
                        Ok(db) => {
                            let _ = cx.update_global::<SessionState, _>(|state, _cx| {
                                state.status = format!("Active DB: {}", db.path().display());
                                state.active_database = Some(db);
                            });
                        }
                        Err(e) => {
                            tracing::warn!(path = %path.display(), "could not restore last database: {e}");
                        }
                    }
                }
            }
        })
        .detach();
    }

    /// Make `db` the active database and remember it in settings.
    pub fn set_active_database(cx: &mut App, db: Arc<TestDatabase>) {
        let path = db.path().to_path_buf();
        let settings = {
            let state = cx.global_mut::<SessionState>();
            state.status = format!("Active DB: {}", path.display());
            state.active_database = Some(db);
            state.settings.clone()
        };

        if let Some(settings) = settings {
            cx.spawn(async move |_cx| {
                if let Err(e) = settings.set_last_database(&path).await {
                    tracing::warn!("could not persist last database: {e}");
                }
            })
            .detach();
        }
    }

    /// Update the footer status line.
    pub fn set_status(cx: &mut App, message: impl Into<String>) {
        cx.global_mut::<SessionState>().status = message.into();
    }

    /// Swap in a merged catalog after an import.
    pub fn set_catalog(cx: &mut App, catalog: TemplateCatalog) {
        cx.global_mut::<SessionState>().catalog = Arc::new(catalog);
    }

    /// Whether `path` may be listed/opened as a test database.
    pub fn is_protected_path(&self, path: &std::path::Path) -> bool {
        self.settings
            .as_ref()
            .is_some_and(|settings| settings.is_protected(path))
    }
}
