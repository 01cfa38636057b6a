//! Map collaborator services
//!
//! `MapService` is the transport-agnostic boundary to whatever owns the
//! persisted layout and the authoritative stall records. `LocalMapService`
//! serves both from the local SQLite database.

use std::future::Future;
use std::sync::{Arc, Mutex};

use stallmap_core::{
    Database, Error, LayoutRepository, MapLayout, RecordRepository, Result, SaveReport,
    StallRecord,
};
use tracing::{debug, info};

/// Layout and record collaborator
pub trait MapService: Send + Sync + 'static {
    /// Latest persisted layout, `None` when nothing was saved yet
    fn fetch_map_layout(&self) -> impl Future<Output = Result<Option<MapLayout>>> + Send;

    /// Persist a layout and sync stall records from it
    fn save_map_layout(&self, layout: &MapLayout) -> impl Future<Output = Result<SaveReport>> + Send;

    /// Full authoritative record list
    fn fetch_stall_records(&self) -> impl Future<Output = Result<Vec<StallRecord>>> + Send;
}

/// Summary of what the local database holds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapStatus {
    pub schema_version: u32,
    pub layout_versions: u64,
    pub records: usize,
    pub reserved: usize,
}

/// `MapService` over the local database
#[derive(Clone)]
pub struct LocalMapService {
    db: Arc<Mutex<Database>>,
}

impl LocalMapService {
    pub fn new(db: Arc<Mutex<Database>>) -> Self {
        Self { db }
    }

    /// Run a query on the blocking pool with the database locked
    async fn with_db<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> Result<T> + Send + 'static,
    {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || {
            let db = db
                .lock()
                .map_err(|_| Error::InvalidOperation("Database lock poisoned".into()))?;
            f(&db)
        })
        .await
        .map_err(|e| Error::InvalidOperation(format!("Storage task failed: {}", e)))?
    }

    /// Mark a record reserved; returns false when the name is unknown
    pub async fn reserve(&self, name: &str) -> Result<bool> {
        let name = name.to_string();
        self.with_db(move |db| db.set_reserved(&name, true)).await
    }

    /// Replace a record's genre tags; returns false when the name is unknown
    pub async fn set_genres(&self, name: &str, genres: Vec<String>) -> Result<bool> {
        let name = name.to_string();
        self.with_db(move |db| {
            let genres: Vec<&str> = genres.iter().map(String::as_str).collect();
            db.set_genres(&name, &genres)
        })
        .await
    }

    /// Release every reservation; returns how many were released
    pub async fn release_all(&self) -> Result<u64> {
        let released = self.with_db(|db| db.clear_reservations()).await?;
        info!(released, "Released all reservations");
        Ok(released)
    }

    /// Forget every saved layout version. Records stay untouched.
    pub async fn reset_map(&self) -> Result<u64> {
        let removed = self.with_db(|db| db.delete_layouts()).await?;
        info!(removed, "Map layouts removed");
        Ok(removed)
    }

    pub async fn status(&self) -> Result<MapStatus> {
        self.with_db(|db| {
            let records = db.list_records()?;
            Ok(MapStatus {
                schema_version: db.schema_version(),
                layout_versions: db.layout_versions()?,
                reserved: records.iter().filter(|r| r.reserved).count(),
                records: records.len(),
            })
        })
        .await
    }
}

impl MapService for LocalMapService {
    async fn fetch_map_layout(&self) -> Result<Option<MapLayout>> {
        let layout = self
            .with_db(|db| Ok(db.latest_layout()?.map(|v| v.layout)))
            .await
            .map_err(|e| Error::LayoutFetch(e.to_string()))?;
        debug!(found = layout.is_some(), "Fetched map layout");
        Ok(layout)
    }

    async fn save_map_layout(&self, layout: &MapLayout) -> Result<SaveReport> {
        let layout = layout.clone();
        let (version, report) = self
            .with_db(move |db| db.save_map(&layout))
            .await
            .map_err(|e| match e {
                Error::Database(e) => Error::SaveConflict(e.to_string()),
                other => other,
            })?;
        info!(version, "Map layout saved");
        Ok(report)
    }

    async fn fetch_stall_records(&self) -> Result<Vec<StallRecord>> {
        let records = self
            .with_db(|db| db.list_records())
            .await
            .map_err(|e| Error::RecordFetch(e.to_string()))?;
        debug!(count = records.len(), "Fetched stall records");
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stallmap_core::{GridSpec, HallId, LayoutModel, StallSize};

    fn service() -> LocalMapService {
        LocalMapService::new(Arc::new(Mutex::new(Database::open_in_memory().unwrap())))
    }

    fn grid_layout() -> MapLayout {
        let (model, hall) = LayoutModel::new().add_hall("Hall A").unwrap();
        let (model, _) = model
            .add_stall_grid(&hall, &GridSpec::new("A", 1, 3, StallSize::Medium))
            .unwrap();
        model.to_layout()
    }

    #[tokio::test]
    async fn test_fetch_before_save() {
        let service = service();
        assert!(service.fetch_map_layout().await.unwrap().is_none());
        assert!(service.fetch_stall_records().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_then_fetch() {
        let service = service();
        let layout = grid_layout();

        let report = service.save_map_layout(&layout).await.unwrap();
        assert_eq!(report, SaveReport { created: 3, updated: 0, skipped: 0 });

        let report = service.save_map_layout(&layout).await.unwrap();
        assert_eq!(report.updated, 3);

        assert_eq!(service.fetch_map_layout().await.unwrap(), Some(layout));
        let names: Vec<String> = service
            .fetch_stall_records()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["A01", "A02", "A03"]);
    }

    #[tokio::test]
    async fn test_reserve_survives_resave() {
        let service = service();
        let layout = grid_layout();
        service.save_map_layout(&layout).await.unwrap();
        assert!(service.reserve("A02").await.unwrap());
        assert!(!service.reserve("Z01").await.unwrap());

        service.save_map_layout(&layout).await.unwrap();
        let records = service.fetch_stall_records().await.unwrap();
        assert!(records.iter().any(|r| r.name == "A02" && r.reserved));
    }

    #[tokio::test]
    async fn test_genres_and_release_all() {
        let service = service();
        service.save_map_layout(&grid_layout()).await.unwrap();
        assert!(service
            .set_genres("A01", vec!["Comics".into(), " Poetry ".into()])
            .await
            .unwrap());
        assert!(!service.set_genres("Z01", vec!["Comics".into()]).await.unwrap());
        service.reserve("A01").await.unwrap();
        service.reserve("A03").await.unwrap();

        assert_eq!(service.release_all().await.unwrap(), 2);
        let records = service.fetch_stall_records().await.unwrap();
        assert!(records.iter().all(|r| !r.reserved));
        let a01 = records.iter().find(|r| r.name == "A01").unwrap();
        assert_eq!(a01.genre_list(), vec!["Comics", "Poetry"]);
    }

    #[tokio::test]
    async fn test_status_and_reset() {
        let service = service();
        let layout = grid_layout();
        service.save_map_layout(&layout).await.unwrap();
        service.save_map_layout(&layout).await.unwrap();
        service.reserve("A02").await.unwrap();

        let status = service.status().await.unwrap();
        assert_eq!(
            status,
            MapStatus { schema_version: 2, layout_versions: 2, records: 3, reserved: 1 }
        );

        assert_eq!(service.reset_map().await.unwrap(), 2);
        assert!(service.fetch_map_layout().await.unwrap().is_none());
        assert_eq!(service.fetch_stall_records().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_invalid_layout_rejected() {
        let service = service();
        let mut layout = grid_layout();
        layout.halls[0].stalls[0].hall_id = HallId::from("ghost");
        let err = service.save_map_layout(&layout).await.unwrap_err();
        assert!(matches!(err, Error::InvalidLayout(_)));
    }
}
