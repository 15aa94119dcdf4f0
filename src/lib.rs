pub mod clock;
pub mod completion;
pub mod db;
pub mod error;
pub mod models;
pub mod prefill;
pub mod providers;
pub mod session;
pub mod settings;
pub mod timer;
mod utils;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

pub use db::Database;
pub use error::{SessionError, ValidationError};
pub use providers::Collaborators;
pub use session::SessionController;
pub use settings::{EngineSettings, SettingsStore};

/// Initialize logging (reads RUST_LOG, defaults to info). Safe to call more
/// than once.
pub fn init_logging() {
    let _ = env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .try_init();
}

/// Opens the database and settings file under `data_dir` and builds a
/// controller backed by them.
pub fn open(data_dir: &Path) -> Result<SessionController> {
    std::fs::create_dir_all(data_dir)?;

    let database = Database::new(data_dir.join("liftlog.sqlite3"))?;
    let settings_store = SettingsStore::new(data_dir.join("settings.json"))?;

    log::info!("liftlog store opened at {}", database.path().display());

    Ok(SessionController::new(
        Collaborators::with_store(Arc::new(database)),
        settings_store.settings(),
    ))
}
