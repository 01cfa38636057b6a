//! Canvas view models for the designer and the visitor map

pub mod designer;
pub mod viewer;

pub use designer::{
    DesignController, DesignEvent, DesignState, Effect, Key, Press, PressTarget, ToolMode,
    Transition,
};
pub use viewer::{CartChange, ReservationCart, ViewerEvent, ViewerNotice, ViewerState};
