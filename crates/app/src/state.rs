//! Application state management

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use directories::ProjectDirs;
use stallmap_core::config::CONFIG_FILE;
use stallmap_core::{Database, Error, MapConfig, Result};
use tracing::info;

use crate::service::LocalMapService;

/// Database file inside the data directory
pub const DATABASE_FILE: &str = "stallmap.db";

/// Main application state
pub struct AppState {
    pub db: Arc<Mutex<Database>>,
    pub config: MapConfig,
    data_dir: PathBuf,
}

impl AppState {
    /// Open the database and config in the platform data directory
    pub fn new() -> Result<Self> {
        Self::open(Self::data_path()?)
    }

    /// Open the database and config in an explicit directory
    pub fn open(data_dir: impl Into<PathBuf>) -> Result<Self> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir)?;

        let config = MapConfig::load(&data_dir.join(CONFIG_FILE))?;
        let db = Database::open(data_dir.join(DATABASE_FILE))?;
        info!(data_dir = %data_dir.display(), "Opened stall map data");

        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            config,
            data_dir,
        })
    }

    fn data_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "onyx", "stallmap").ok_or_else(|| {
            Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "Could not determine data directory",
            ))
        })?;

        Ok(dirs.data_dir().to_path_buf())
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Map service backed by this state's database
    pub fn service(&self) -> LocalMapService {
        LocalMapService::new(self.db.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_creates_files() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("nested");
        let state = AppState::open(&root).unwrap();
        assert!(root.join(DATABASE_FILE).exists());
        assert_eq!(state.config, MapConfig::default());
        assert_eq!(state.data_dir(), root.as_path());
    }

    #[test]
    fn test_reads_config_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "max_reservations = 1\n").unwrap();
        let state = AppState::open(dir.path()).unwrap();
        assert_eq!(state.config.max_reservations, 1);
    }
}
