//! Stallmap application layer
//!
//! Collaborator services, the view session and the designer/viewer view
//! models on top of `stallmap-core`.

pub mod cli;
pub mod service;
pub mod session;
pub mod state;
pub mod viewmodel;

pub use service::{LocalMapService, MapService, MapStatus};
pub use session::{SessionEvent, SessionState, ViewSession};
pub use state::AppState;
