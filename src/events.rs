//! Commands sent to viewers and notifications raised by them.

use bevy::prelude::*;

use crate::config::ViewerOption;
use crate::engine::AnimateOptions;
use crate::engine::ClickData;
use crate::engine::Position;

// ============================================================================
// Commands
// ============================================================================

/// Fire-and-forget calls routed to a viewer's engine.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCommand {
    Animate(AnimateOptions),
    StopAnimation,
    Destroy,
    Rotate(Position),
    SetOption(ViewerOption),
    Zoom(f32),
    ZoomIn(f32),
    ZoomOut(f32),
    SetCursor(Option<String>),
    NeedsContinuousUpdate(bool),
    ObserveObjects(String),
    UnobserveObjects(String),
    StartAutorotate,
    StopAutorotate,
    ToggleAutorotate,
}

/// Sends a command to the engine of the target viewer.
///
/// Dropped when the viewer has no engine, its engine has not reported ready
/// yet, or it was destroyed. Commands are never queued.
#[derive(EntityEvent, Debug, Clone)]
pub struct IssueCommand {
    pub entity:  Entity,
    pub command: EngineCommand,
}

impl IssueCommand {
    pub const fn new(entity: Entity, command: EngineCommand) -> Self { Self { entity, command } }
}

// ============================================================================
// Engine notifications
// ============================================================================

/// Fired once per engine when it reports ready.
#[derive(EntityEvent, Reflect)]
#[reflect(Event, FromReflect)]
pub struct ViewerReady {
    pub entity: Entity,
}

#[derive(EntityEvent, Reflect)]
#[reflect(Event, FromReflect)]
pub struct ViewerClicked {
    pub entity: Entity,
    pub data:   ClickData,
}

#[derive(EntityEvent, Reflect)]
#[reflect(Event, FromReflect)]
pub struct ViewerDoubleClicked {
    pub entity: Entity,
    pub data:   ClickData,
}

#[derive(EntityEvent, Reflect)]
#[reflect(Event, FromReflect)]
pub struct ViewerZoomUpdated {
    pub entity:     Entity,
    pub zoom_level: f32,
}

#[derive(EntityEvent, Reflect)]
#[reflect(Event, FromReflect)]
pub struct ViewerPositionUpdated {
    pub entity:   Entity,
    pub position: Position,
}

// ============================================================================
// Lifecycle
// ============================================================================

/// Fired when an engine is constructed for a viewer.
#[derive(EntityEvent, Reflect)]
#[reflect(Event, FromReflect)]
pub struct ViewerMounted {
    pub entity: Entity,
    pub target: Entity,
}

/// Fired when the little planet transition finishes its ascent.
#[derive(EntityEvent, Reflect)]
#[reflect(Event, FromReflect)]
pub struct LittlePlanetSettled {
    pub entity: Entity,
}
