//! Components attached to viewer entities.

use std::fmt;
use std::sync::Arc;

use bevy::prelude::*;

use crate::config::CssSize;
use crate::config::PanoramaSource;
use crate::config::ViewerConfig;
use crate::config::ViewerOption;
use crate::config::ViewerProps;
use crate::engine::AnimateOptions;
use crate::engine::AnimationTicket;
use crate::engine::ClickData;
use crate::engine::EngineNotification;
use crate::engine::EnginePlugin;
use crate::engine::PanoramaEngine;
use crate::engine::PanoramaOptions;
use crate::engine::Position;
use crate::engine::TooltipConfig;
use crate::engine::TooltipId;
use crate::engine::ViewerSize;
use crate::navbar::Navbar;
use crate::navbar::collapsed;

/// Class name used by hosts that style the container when none is given.
pub const DEFAULT_CONTAINER_CLASS: &str = "view-container";

pub type ReadyCallback = Arc<dyn Fn(&mut dyn PanoramaEngine) + Send + Sync>;
pub type ClickCallback = Arc<dyn Fn(&ClickData, &mut dyn PanoramaEngine) + Send + Sync>;
pub type ZoomCallback = Arc<dyn Fn(f32, &mut dyn PanoramaEngine) + Send + Sync>;
/// Receives `(pitch, yaw, engine)`.
pub type PositionCallback = Arc<dyn Fn(f32, f32, &mut dyn PanoramaEngine) + Send + Sync>;

/// Hooks invoked with engine notifications. Each receives the live engine so it
/// can issue further calls from inside the callback.
#[derive(Clone, Default)]
pub struct ViewerCallbacks {
    pub on_ready:           Option<ReadyCallback>,
    pub on_click:           Option<ClickCallback>,
    pub on_dblclick:        Option<ClickCallback>,
    pub on_zoom_change:     Option<ZoomCallback>,
    pub on_position_change: Option<PositionCallback>,
}

impl fmt::Debug for ViewerCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewerCallbacks")
            .field("on_ready", &self.on_ready.is_some())
            .field("on_click", &self.on_click.is_some())
            .field("on_dblclick", &self.on_dblclick.is_some())
            .field("on_zoom_change", &self.on_zoom_change.is_some())
            .field("on_position_change", &self.on_position_change.is_some())
            .finish()
    }
}

/// Declarative properties of a panorama viewer.
///
/// Insert on an entity together with a `MountTarget` to get an engine. Changing
/// this component updates the live engine in place where possible.
#[derive(Component, Clone, Debug, Default)]
pub struct SphereViewer {
    pub src:                PanoramaSource,
    pub height:             String,
    pub width:              Option<String>,
    pub container_class:    Option<String>,
    /// Start in the little planet view and unfold it on the first click.
    pub little_planet:      bool,
    /// Add a navbar button that collapses the navbar.
    pub hide_navbar_button: bool,
    pub options:            ViewerProps,
    pub callbacks:          ViewerCallbacks,
}

impl SphereViewer {
    pub fn new(src: impl Into<PanoramaSource>) -> Self {
        Self {
            src: src.into(),
            ..default()
        }
    }

    pub fn with_height(mut self, height: impl Into<String>) -> Self {
        self.height = height.into();
        self
    }

    pub fn with_width(mut self, width: impl Into<String>) -> Self {
        self.width = Some(width.into());
        self
    }

    pub fn with_container_class(mut self, class: impl Into<String>) -> Self {
        self.container_class = Some(class.into());
        self
    }

    pub fn with_little_planet(mut self, enabled: bool) -> Self {
        self.little_planet = enabled;
        self
    }

    pub fn with_hide_navbar_button(mut self, enabled: bool) -> Self {
        self.hide_navbar_button = enabled;
        self
    }

    pub fn with_options(mut self, options: ViewerProps) -> Self {
        self.options = options;
        self
    }

    pub fn on_ready(mut self, f: impl Fn(&mut dyn PanoramaEngine) + Send + Sync + 'static) -> Self {
        self.callbacks.on_ready = Some(Arc::new(f));
        self
    }

    pub fn on_click(
        mut self,
        f: impl Fn(&ClickData, &mut dyn PanoramaEngine) + Send + Sync + 'static,
    ) -> Self {
        self.callbacks.on_click = Some(Arc::new(f));
        self
    }

    pub fn on_dblclick(
        mut self,
        f: impl Fn(&ClickData, &mut dyn PanoramaEngine) + Send + Sync + 'static,
    ) -> Self {
        self.callbacks.on_dblclick = Some(Arc::new(f));
        self
    }

    pub fn on_zoom_change(
        mut self,
        f: impl Fn(f32, &mut dyn PanoramaEngine) + Send + Sync + 'static,
    ) -> Self {
        self.callbacks.on_zoom_change = Some(Arc::new(f));
        self
    }

    pub fn on_position_change(
        mut self,
        f: impl Fn(f32, f32, &mut dyn PanoramaEngine) + Send + Sync + 'static,
    ) -> Self {
        self.callbacks.on_position_change = Some(Arc::new(f));
        self
    }

    pub fn container_class(&self) -> &str {
        self.container_class
            .as_deref()
            .unwrap_or(DEFAULT_CONTAINER_CLASS)
    }
}

/// The entity a viewer renders into. Insert it once the container exists.
/// Pointing it at a different entity rebuilds the engine.
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq, Eq)]
#[reflect(Component)]
pub struct MountTarget(pub Entity);

/// Marks a viewer whose engine construction failed. Removed, and the mount
/// retried, when `SphereViewer` or `MountTarget` changes.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct MountFailed;

/// Wraps the engine so that `destroy` runs at most once, whether it comes from
/// the viewer lifecycle or from a consumer holding the engine in a callback.
struct GuardedEngine {
    inner:     Box<dyn PanoramaEngine>,
    mount:     Entity,
    destroyed: bool,
}

impl PanoramaEngine for GuardedEngine {
    fn config(&self) -> &ViewerConfig { self.inner.config() }

    fn take_notifications(&mut self) -> Vec<EngineNotification> {
        if self.destroyed {
            return Vec::new();
        }
        self.inner.take_notifications()
    }

    fn animate(&mut self, options: &AnimateOptions) -> AnimationTicket {
        self.inner.animate(options)
    }

    fn stop_animation(&mut self) { self.inner.stop_animation(); }

    fn rotate(&mut self, position: Position) { self.inner.rotate(position); }

    fn zoom(&mut self, level: f32) { self.inner.zoom(level); }

    fn zoom_in(&mut self, step: f32) { self.inner.zoom_in(step); }

    fn zoom_out(&mut self, step: f32) { self.inner.zoom_out(step); }

    fn set_option(&mut self, option: ViewerOption) { self.inner.set_option(option); }

    fn set_options(&mut self, options: Vec<ViewerOption>) { self.inner.set_options(options); }

    fn set_panorama(&mut self, source: &PanoramaSource, options: &PanoramaOptions) {
        self.inner.set_panorama(source, options);
    }

    fn set_overlay(&mut self, source: &PanoramaSource, opacity: Option<f32>) {
        self.inner.set_overlay(source, opacity);
    }

    fn resize(&mut self, size: &CssSize) { self.inner.resize(size); }

    fn auto_size(&mut self) { self.inner.auto_size(); }

    fn size(&self) -> ViewerSize { self.inner.size() }

    fn position(&self) -> Position { self.inner.position() }

    fn zoom_level(&self) -> f32 { self.inner.zoom_level() }

    fn needs_update(&mut self) { self.inner.needs_update(); }

    fn needs_continuous_update(&mut self, enabled: bool) {
        self.inner.needs_continuous_update(enabled);
    }

    fn enter_fullscreen(&mut self) { self.inner.enter_fullscreen(); }

    fn exit_fullscreen(&mut self) { self.inner.exit_fullscreen(); }

    fn toggle_fullscreen(&mut self) { self.inner.toggle_fullscreen(); }

    fn is_fullscreen_enabled(&self) -> bool { self.inner.is_fullscreen_enabled() }

    fn start_keyboard_control(&mut self) { self.inner.start_keyboard_control(); }

    fn stop_keyboard_control(&mut self) { self.inner.stop_keyboard_control(); }

    fn set_cursor(&mut self, cursor: Option<&str>) { self.inner.set_cursor(cursor); }

    fn create_tooltip(&mut self, config: &TooltipConfig) -> TooltipId {
        self.inner.create_tooltip(config)
    }

    fn observe_objects(&mut self, key: &str) { self.inner.observe_objects(key); }

    fn unobserve_objects(&mut self, key: &str) { self.inner.unobserve_objects(key); }

    fn show_error(&mut self, message: &str) { self.inner.show_error(message); }

    fn hide_error(&mut self) { self.inner.hide_error(); }

    fn plugin(&self, id: &str) -> Option<&dyn EnginePlugin> { self.inner.plugin(id) }

    fn plugin_mut(&mut self, id: &str) -> Option<&mut dyn EnginePlugin> {
        self.inner.plugin_mut(id)
    }

    fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.inner.destroy();
        self.destroyed = true;
        info!("Destroyed panorama engine mounted in {:?}", self.mount);
    }
}

/// The live engine owned by a viewer entity.
///
/// Removing this component destroys the engine. Once destroyed, the engine is
/// never called again and delivers no further notifications.
#[derive(Component)]
pub struct ViewerEngine {
    engine:        GuardedEngine,
    applied:       ViewerConfig,
    little_planet: bool,
    ready:         bool,
}

impl ViewerEngine {
    pub fn new(
        engine: Box<dyn PanoramaEngine>,
        applied: ViewerConfig,
        little_planet: bool,
    ) -> Self {
        Self {
            engine: GuardedEngine {
                inner:     engine,
                mount:     applied.container,
                destroyed: false,
            },
            applied,
            little_planet,
            ready: false,
        }
    }

    /// Entity the engine was mounted into.
    pub const fn mount(&self) -> Entity { self.applied.container }

    /// Configuration last derived from the viewer's properties.
    pub const fn applied(&self) -> &ViewerConfig { &self.applied }

    pub fn set_applied(&mut self, config: ViewerConfig) { self.applied = config; }

    /// Whether the engine was built in little planet mode.
    pub const fn little_planet(&self) -> bool { self.little_planet }

    /// Also true when a callback destroyed the engine directly.
    pub const fn is_destroyed(&self) -> bool { self.engine.destroyed }

    /// Whether the engine has reported ready. Commands are dropped until it has.
    pub const fn is_ready(&self) -> bool { self.ready }

    pub fn active(&self) -> Option<&dyn PanoramaEngine> {
        if self.engine.destroyed {
            None
        } else {
            Some(&self.engine)
        }
    }

    /// The engine handed to callbacks and actions. Its `destroy` marks this
    /// component destroyed.
    pub fn active_mut(&mut self) -> Option<&mut dyn PanoramaEngine> {
        if self.engine.destroyed {
            None
        } else {
            Some(&mut self.engine)
        }
    }

    /// Drains pending engine notifications. A destroyed engine yields nothing.
    pub fn take_notifications(&mut self) -> Vec<EngineNotification> {
        self.engine.take_notifications()
    }

    /// Returns `true` the first time it is called for this engine.
    pub fn mark_ready(&mut self) -> bool {
        let first = !self.ready;
        self.ready = true;
        first
    }

    pub fn destroy(&mut self) { self.engine.destroy(); }
}

/// The navbar currently shown by a viewer's engine.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct ViewerNavbar {
    full:      Navbar,
    current:   Navbar,
    collapsed: bool,
}

impl ViewerNavbar {
    pub fn new(navbar: Navbar) -> Self {
        Self {
            current:   navbar.clone(),
            full:      navbar,
            collapsed: false,
        }
    }

    pub const fn current(&self) -> &Navbar { &self.current }

    pub const fn is_collapsed(&self) -> bool { self.collapsed }

    /// Replaces the layout and expands it.
    pub fn replace(&mut self, navbar: Navbar) {
        self.current = navbar.clone();
        self.full = navbar;
        self.collapsed = false;
    }

    /// Flips between the full layout and the collapsed one, returning the new layout.
    pub fn toggle_collapsed(&mut self) -> &Navbar {
        self.collapsed = !self.collapsed;
        self.current = if self.collapsed {
            collapsed(&self.full)
        } else {
            self.full.clone()
        };
        &self.current
    }
}
