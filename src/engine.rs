//! Contract of the external panorama engine driven by the viewer.
//!
//! The engine renders the sphere, owns input handling and hosts extension
//! modules. This crate never looks inside it: it builds a `ViewerConfig`,
//! hands it to the `EngineFactory`, issues calls through `PanoramaEngine`, and
//! drains the engine's notifications once per frame.

use std::any::Any;
use std::sync::Arc;

use bevy::prelude::*;

use crate::config::CssSize;
use crate::config::PanoramaSource;
use crate::config::ViewerConfig;
use crate::config::ViewerOption;
use crate::error::ViewerError;

/// Camera orientation in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default, Reflect)]
pub struct Position {
    pub yaw:   f32,
    pub pitch: f32,
}

impl Position {
    pub const fn new(yaw: f32, pitch: f32) -> Self { Self { yaw, pitch } }
}

/// Rendered size of the viewer in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Reflect)]
pub struct ViewerSize {
    pub width:  f32,
    pub height: f32,
}

/// Speed of an engine animation.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub enum AnimationSpeed {
    /// Angular speed in revolutions per minute.
    Rpm(f32),
    /// Fixed duration in milliseconds.
    DurationMs(f32),
}

/// Target of an engine camera animation. Omitted fields keep their current value.
#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct AnimateOptions {
    pub yaw:   Option<f32>,
    pub pitch: Option<f32>,
    /// Zoom level, 0 (widest) to 100 (tightest).
    pub zoom:  Option<f32>,
    pub speed: AnimationSpeed,
}

impl AnimateOptions {
    pub const fn to(yaw: f32, pitch: f32, zoom: f32, speed: AnimationSpeed) -> Self {
        Self {
            yaw: Some(yaw),
            pitch: Some(pitch),
            zoom: Some(zoom),
            speed,
        }
    }
}

/// Identifies one `animate` call so its completion can be matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub struct AnimationTicket(pub u64);

/// Options for swapping the displayed panorama in place.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PanoramaOptions {
    pub position:    Option<Position>,
    pub zoom:        Option<f32>,
    /// Cross-fade duration in milliseconds; `None` lets the engine decide.
    pub transition:  Option<f32>,
    pub show_loader: Option<bool>,
    pub caption:     Option<String>,
    pub description: Option<String>,
}

/// Tooltip request forwarded to the engine.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TooltipConfig {
    pub content:    String,
    pub top:        f32,
    pub left:       f32,
    pub position:   Option<String>,
    pub class_name: Option<String>,
}

/// Handle to a tooltip created by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TooltipId(pub u64);

/// Payload of click and double-click notifications.
#[derive(Debug, Clone, Copy, PartialEq, Default, Reflect)]
pub struct ClickData {
    /// Horizontal position in the viewer, in pixels.
    pub client_x:    f32,
    /// Vertical position in the viewer, in pixels.
    pub client_y:    f32,
    pub yaw:         f32,
    pub pitch:       f32,
    pub right_click: bool,
}

/// Events emitted by the engine, in emission order.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineNotification {
    Ready,
    Click(ClickData),
    DoubleClick(ClickData),
    ZoomUpdated { zoom_level: f32 },
    PositionUpdated(Position),
    AnimationFinished(AnimationTicket),
    /// A custom navbar button was pressed.
    NavbarButtonClicked { id: String },
}

/// Extension module registered with the engine at construction.
pub trait EnginePlugin: Send + Sync + 'static {
    fn id(&self) -> &str;

    fn as_any(&self) -> &dyn Any;

    /// Returns the autorotate controls if this module provides them.
    fn as_autorotate(&mut self) -> Option<&mut dyn Autorotate> { None }
}

/// Controls exposed by the autorotate extension module.
pub trait Autorotate {
    fn start(&mut self);
    fn stop(&mut self);
    fn toggle(&mut self);
}

/// A live engine instance bound to one mount target.
pub trait PanoramaEngine: Send + Sync + 'static {
    /// Current configuration, including options applied after construction.
    fn config(&self) -> &ViewerConfig;

    /// Returns and clears the notifications emitted since the last call.
    fn take_notifications(&mut self) -> Vec<EngineNotification>;

    /// Starts an animation and returns its ticket.
    ///
    /// Every ticket is reported exactly once through
    /// `EngineNotification::AnimationFinished`, whether the animation completes,
    /// is replaced by a later `animate`, or is cut short by `stop_animation`.
    /// The little planet intro waits on that report to leave its descent.
    fn animate(&mut self, options: &AnimateOptions) -> AnimationTicket;
    /// Stops the running animation. Its ticket still reports as finished.
    fn stop_animation(&mut self);
    fn rotate(&mut self, position: Position);
    fn zoom(&mut self, level: f32);
    fn zoom_in(&mut self, step: f32);
    fn zoom_out(&mut self, step: f32);

    fn set_option(&mut self, option: ViewerOption);

    fn set_options(&mut self, options: Vec<ViewerOption>) {
        for option in options {
            self.set_option(option);
        }
    }

    fn set_panorama(&mut self, source: &PanoramaSource, options: &PanoramaOptions);
    fn set_overlay(&mut self, source: &PanoramaSource, opacity: Option<f32>);

    fn resize(&mut self, size: &CssSize);
    fn auto_size(&mut self);
    fn size(&self) -> ViewerSize;
    fn position(&self) -> Position;
    fn zoom_level(&self) -> f32;
    fn needs_update(&mut self);
    fn needs_continuous_update(&mut self, enabled: bool);

    fn enter_fullscreen(&mut self);
    fn exit_fullscreen(&mut self);
    fn toggle_fullscreen(&mut self);
    fn is_fullscreen_enabled(&self) -> bool;

    fn start_keyboard_control(&mut self);
    fn stop_keyboard_control(&mut self);

    fn set_cursor(&mut self, cursor: Option<&str>);
    fn create_tooltip(&mut self, config: &TooltipConfig) -> TooltipId;
    fn observe_objects(&mut self, key: &str);
    fn unobserve_objects(&mut self, key: &str);

    fn show_error(&mut self, message: &str);
    fn hide_error(&mut self);

    fn plugin(&self, id: &str) -> Option<&dyn EnginePlugin>;
    fn plugin_mut(&mut self, id: &str) -> Option<&mut dyn EnginePlugin>;

    fn destroy(&mut self);
}

/// Runs `f` against the autorotate module, if one is registered.
pub fn with_autorotate(engine: &mut dyn PanoramaEngine, f: impl FnOnce(&mut dyn Autorotate)) {
    if let Some(autorotate) = engine
        .plugin_mut(crate::config::AUTOROTATE_PLUGIN_ID)
        .and_then(|plugin| plugin.as_autorotate())
    {
        f(autorotate);
    }
}

type EngineConstructor =
    dyn Fn(&ViewerConfig) -> Result<Box<dyn PanoramaEngine>, ViewerError> + Send + Sync;

/// Builds engine instances from a configuration.
#[derive(Resource, Clone)]
pub struct EngineFactory(Arc<EngineConstructor>);

impl EngineFactory {
    pub fn new(
        constructor: impl Fn(&ViewerConfig) -> Result<Box<dyn PanoramaEngine>, ViewerError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        Self(Arc::new(constructor))
    }

    pub fn create(&self, config: &ViewerConfig) -> Result<Box<dyn PanoramaEngine>, ViewerError> {
        (self.0)(config)
    }
}
