//! litebench - a SQLite workbench for test databases and SQL templates.

mod assets;
#[cfg(feature = "keyboard-nav")]
mod keybindings;
mod services;
mod state;
mod workspace;

use gpui::*;
use gpui_component::Root;

use crate::assets::Assets;
use crate::services::SettingsStore;
use crate::state::SessionState;
use crate::workspace::Workspace;

fn main() {
    init_logging();
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        build_mode = if cfg!(debug_assertions) {
            "debug"
        } else {
            "release"
        },
        "starting litebench"
    );

    // Window geometry from the previous run, when the settings store is
    // reachable. Everything else restores asynchronously after startup.
    let restored_size = smol::block_on(async {
        match SettingsStore::singleton().await {
            Ok(store) => store.window_size().await.unwrap_or(None),
            Err(e) => {
                tracing::warn!("settings store unavailable: {e}");
                None
            }
        }
    });

    let app = Application::new().with_assets(Assets);

    app.run(move |cx| {
        gpui_component::init(cx);

        #[cfg(feature = "keyboard-nav")]
        keybindings::init(cx);

        SessionState::init(cx);

        let (width, height) = restored_size.unwrap_or((1200.0, 700.0));
        let window_options = WindowOptions {
            window_bounds: Some(WindowBounds::centered(size(px(width), px(height)), cx)),
            window_min_size: Some(size(px(900.0), px(520.0))),
            ..Default::default()
        };

        let opened = cx.open_window(window_options, |window, cx| {
            window.activate_window();
            window.set_window_title("litebench");

            let workspace = cx.new(|cx| Workspace::new(window, cx));
            cx.new(|cx| Root::new(workspace, window, cx))
        });

        match opened {
            Ok(handle) => {
                // Remember the window size for the next launch.
                cx.on_app_quit(move |cx| {
                    let bounds = handle
                        .update(cx, |_, window, _| window.bounds())
                        .ok();
                    async move {
                        let Some(bounds) = bounds else { return };
                        if let Ok(store) = SettingsStore::singleton().await {
                            let width = f32::from(bounds.size.width);
                            let height = f32::from(bounds.size.height);
                            if let Err(e) = store.set_window_size(width, height).await {
                                tracing::warn!("could not persist window size: {e}");
                            }
                        }
                    }
                })
                .detach();
            }
            Err(e) => {
                tracing::error!("failed to open main window: {e}");
            }
        }
    });
}

fn init_logging() {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("litebench=info")),
        )
        .init();
}
