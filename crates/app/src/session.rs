//! View session - loads the layout and records for the visitor map
//!
//! Both fetches run concurrently and report back through a channel. Every
//! refresh bumps the generation; results from an older generation are
//! dropped, so the newest fetch always wins.

use std::sync::Arc;

use stallmap_core::{
    validate_layout, MapLayout, MatchedLayout, StallMatcher, StallRecord, ViewScene,
};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::service::MapService;
use crate::viewmodel::ViewerState;

/// Fetch results delivered to the session
#[derive(Debug, Clone)]
pub enum SessionEvent {
    LayoutLoaded {
        generation: u64,
        result: Result<Option<MapLayout>, String>,
    },
    RecordsLoaded {
        generation: u64,
        result: Result<Vec<StallRecord>, String>,
    },
}

impl SessionEvent {
    pub fn generation(&self) -> u64 {
        match self {
            SessionEvent::LayoutLoaded { generation, .. }
            | SessionEvent::RecordsLoaded { generation, .. } => *generation,
        }
    }
}

/// What the view map should show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Layout not resolved yet
    Loading,
    /// No layout, an empty layout, or the layout fetch failed
    NotConfigured,
    Ready,
}

#[derive(Debug, Clone, PartialEq)]
enum Slot<T> {
    Pending,
    Loaded(T),
    Failed,
}

pub struct ViewSession<S: MapService> {
    service: Arc<S>,
    matcher: StallMatcher,
    generation: u64,
    layout: Slot<Option<MapLayout>>,
    records: Slot<Vec<StallRecord>>,
    matched: Option<MatchedLayout>,
    event_tx: mpsc::Sender<SessionEvent>,
    event_rx: mpsc::Receiver<SessionEvent>,
}

impl<S: MapService> ViewSession<S> {
    pub fn new(service: Arc<S>, matcher: StallMatcher) -> Self {
        let (event_tx, event_rx) = mpsc::channel(16);
        Self {
            service,
            matcher,
            generation: 0,
            layout: Slot::Pending,
            records: Slot::Pending,
            matched: None,
            event_tx,
            event_rx,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Start both fetches; returns the new generation.
    ///
    /// Data from the previous generation stays visible until the new
    /// results arrive.
    pub fn refresh(&mut self) -> u64 {
        self.generation += 1;
        let generation = self.generation;

        let service = self.service.clone();
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            let result = service
                .fetch_map_layout()
                .await
                .map_err(|e| e.to_string());
            let _ = tx
                .send(SessionEvent::LayoutLoaded { generation, result })
                .await;
        });

        let service = self.service.clone();
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            let result = service
                .fetch_stall_records()
                .await
                .map_err(|e| e.to_string());
            let _ = tx
                .send(SessionEvent::RecordsLoaded { generation, result })
                .await;
        });

        debug!(generation, "Started map fetches");
        generation
    }

    /// Wait for the next session event
    pub async fn recv_event(&mut self) -> Option<SessionEvent> {
        self.event_rx.recv().await
    }

    /// Refresh and wait until both fetches of the new generation landed
    pub async fn load(&mut self) -> SessionState {
        let generation = self.refresh();
        let (mut layout_done, mut records_done) = (false, false);

        while !(layout_done && records_done) {
            let Some(event) = self.recv_event().await else {
                break;
            };
            let current = event.generation() == generation;
            let is_layout = matches!(event, SessionEvent::LayoutLoaded { .. });
            if self.apply(event) && current {
                if is_layout {
                    layout_done = true;
                } else {
                    records_done = true;
                }
            }
        }

        self.state()
    }

    /// Fold a fetch result into the session. Returns false for stale results.
    pub fn apply(&mut self, event: SessionEvent) -> bool {
        let generation = event.generation();
        if generation < self.generation {
            debug!(generation, current = self.generation, "Dropping stale fetch result");
            return false;
        }

        match event {
            SessionEvent::LayoutLoaded { result, .. } => {
                // Orphaned or duplicated entries must not reach the matcher
                let checked = result.and_then(|layout| {
                    if let Some(l) = &layout {
                        validate_layout(l).map_err(|e| e.to_string())?;
                    }
                    Ok(layout)
                });
                self.layout = match checked {
                    Ok(layout) => Slot::Loaded(layout),
                    Err(e) => {
                        warn!(error = %e, "Map layout unusable");
                        Slot::Failed
                    }
                };
            }
            SessionEvent::RecordsLoaded { result, .. } => {
                self.records = match result {
                    Ok(records) => Slot::Loaded(records),
                    Err(e) => {
                        warn!(error = %e, "Stall record fetch failed, showing stalls as unavailable");
                        Slot::Failed
                    }
                };
            }
        }

        self.rematch();
        true
    }

    fn rematch(&mut self) {
        self.matched = match &self.layout {
            Slot::Loaded(Some(layout)) if layout.has_stalls() => {
                let records: &[StallRecord] = match &self.records {
                    Slot::Loaded(records) => records.as_slice(),
                    Slot::Pending | Slot::Failed => &[],
                };
                Some(self.matcher.match_layout(layout, records))
            }
            _ => None,
        };
    }

    pub fn state(&self) -> SessionState {
        match (&self.layout, &self.matched) {
            (Slot::Pending, _) => SessionState::Loading,
            (_, Some(_)) => SessionState::Ready,
            _ => SessionState::NotConfigured,
        }
    }

    pub fn matched(&self) -> Option<&MatchedLayout> {
        self.matched.as_ref()
    }

    pub fn layout(&self) -> Option<&MapLayout> {
        match &self.layout {
            Slot::Loaded(layout) => layout.as_ref(),
            Slot::Pending | Slot::Failed => None,
        }
    }

    pub fn records(&self) -> &[StallRecord] {
        match &self.records {
            Slot::Loaded(records) => records,
            Slot::Pending | Slot::Failed => &[],
        }
    }

    /// Render the current data with the visitor's cart, hover and filter
    pub fn scene(&self, viewer: &ViewerState) -> ViewScene {
        viewer.scene(self.matched.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::LocalMapService;
    use stallmap_core::{Database, GridSpec, HallId, LayoutModel, StallSize};
    use std::sync::Mutex;

    fn layout() -> MapLayout {
        let (model, hall) = LayoutModel::new().add_hall("Hall A").unwrap();
        let (model, _) = model
            .add_stall_grid(&hall, &GridSpec::new("A", 1, 2, StallSize::Small))
            .unwrap();
        model.to_layout()
    }

    fn session() -> ViewSession<LocalMapService> {
        let db = Database::open_in_memory().unwrap();
        let service = LocalMapService::new(Arc::new(Mutex::new(db)));
        ViewSession::new(Arc::new(service), StallMatcher::new(false))
    }

    fn records() -> Vec<StallRecord> {
        vec![StallRecord::new("1", "A01", StallSize::Small)]
    }

    #[test]
    fn test_layout_first_renders_virtual() {
        let mut session = session();
        assert_eq!(session.state(), SessionState::Loading);

        session.apply(SessionEvent::LayoutLoaded {
            generation: 0,
            result: Ok(Some(layout())),
        });
        assert_eq!(session.state(), SessionState::Ready);
        assert!(session.matched().unwrap().stalls().all(|s| s.is_virtual()));

        session.apply(SessionEvent::RecordsLoaded {
            generation: 0,
            result: Ok(records()),
        });
        assert_eq!(session.matched().unwrap().matched, 1);
    }

    #[test]
    fn test_records_first_render_nothing() {
        let mut session = session();
        session.apply(SessionEvent::RecordsLoaded {
            generation: 0,
            result: Ok(records()),
        });
        assert_eq!(session.state(), SessionState::Loading);
        let scene = session.scene(&ViewerState::default());
        assert_eq!(scene, ViewScene::NotConfigured);

        session.apply(SessionEvent::LayoutLoaded {
            generation: 0,
            result: Ok(Some(layout())),
        });
        assert_eq!(session.matched().unwrap().matched, 1);
    }

    #[test]
    fn test_failures_fall_back() {
        let mut session = session();
        session.apply(SessionEvent::RecordsLoaded {
            generation: 0,
            result: Err("boom".into()),
        });
        session.apply(SessionEvent::LayoutLoaded {
            generation: 0,
            result: Ok(Some(layout())),
        });
        assert_eq!(session.state(), SessionState::Ready);
        assert_eq!(session.matched().unwrap().virtual_count, 2);

        session.apply(SessionEvent::LayoutLoaded {
            generation: 0,
            result: Err("offline".into()),
        });
        assert_eq!(session.state(), SessionState::NotConfigured);
    }

    #[test]
    fn test_empty_layout_is_not_configured() {
        let mut session = session();
        session.apply(SessionEvent::LayoutLoaded {
            generation: 0,
            result: Ok(Some(MapLayout::default())),
        });
        assert_eq!(session.state(), SessionState::NotConfigured);

        session.apply(SessionEvent::LayoutLoaded {
            generation: 0,
            result: Ok(None),
        });
        assert_eq!(session.state(), SessionState::NotConfigured);
    }

    #[test]
    fn test_orphaned_layout_is_not_configured() {
        let mut session = session();
        let mut orphaned = layout();
        orphaned.halls[0].stalls[1].hall_id = HallId::from("missing");

        session.apply(SessionEvent::LayoutLoaded {
            generation: 0,
            result: Ok(Some(orphaned)),
        });
        session.apply(SessionEvent::RecordsLoaded {
            generation: 0,
            result: Ok(records()),
        });
        assert_eq!(session.state(), SessionState::NotConfigured);
        assert!(session.matched().is_none());
        assert!(session.layout().is_none());
        assert_eq!(
            session.scene(&ViewerState::default()),
            ViewScene::NotConfigured
        );
    }

    #[tokio::test]
    async fn test_stale_results_are_dropped() {
        let mut session = session();
        let first = session.refresh();
        let second = session.refresh();
        assert!(second > first);

        assert!(!session.apply(SessionEvent::LayoutLoaded {
            generation: first,
            result: Ok(Some(layout())),
        }));
        assert_eq!(session.state(), SessionState::Loading);

        assert!(session.apply(SessionEvent::LayoutLoaded {
            generation: second,
            result: Ok(Some(layout())),
        }));
        assert_eq!(session.state(), SessionState::Ready);
    }

    #[tokio::test]
    async fn test_load_from_service() {
        let db = Database::open_in_memory().unwrap();
        db.save_map(&layout()).unwrap();
        let service = LocalMapService::new(Arc::new(Mutex::new(db)));
        let mut session = ViewSession::new(Arc::new(service), StallMatcher::default());

        assert_eq!(session.load().await, SessionState::Ready);
        let matched = session.matched().unwrap();
        assert_eq!(matched.matched, 2);
        assert_eq!(session.records().len(), 2);
        assert!(session.layout().is_some());
    }

    #[tokio::test]
    async fn test_load_without_layout() {
        let mut session = session();
        assert_eq!(session.load().await, SessionState::NotConfigured);
    }
}
