//! Imperative access to a viewer's engine.
//!
//! `ViewerHandle` issues fire-and-forget commands through `IssueCommand`.
//! `Viewers` is a system param that reads from and calls the engine directly;
//! every accessor returns `None` while the viewer has no live engine.

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;

use crate::components::ViewerEngine;
use crate::components::ViewerNavbar;
use crate::config::CssSize;
use crate::config::PanoramaSource;
use crate::config::ViewerConfig;
use crate::config::ViewerOption;
use crate::engine::AnimateOptions;
use crate::engine::EnginePlugin;
use crate::engine::PanoramaEngine;
use crate::engine::PanoramaOptions;
use crate::engine::Position;
use crate::engine::TooltipConfig;
use crate::engine::TooltipId;
use crate::engine::ViewerSize;
use crate::events::EngineCommand;
use crate::events::IssueCommand;
use crate::navbar::Navbar;

/// Names a viewer entity for imperative calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub struct ViewerHandle(Entity);

impl ViewerHandle {
    pub const fn new(entity: Entity) -> Self { Self(entity) }

    pub const fn entity(self) -> Entity { self.0 }

    fn issue(self, commands: &mut Commands, command: EngineCommand) {
        commands.trigger(IssueCommand::new(self.0, command));
    }

    pub fn animate(self, commands: &mut Commands, options: AnimateOptions) {
        self.issue(commands, EngineCommand::Animate(options));
    }

    pub fn stop_animation(self, commands: &mut Commands) {
        self.issue(commands, EngineCommand::StopAnimation);
    }

    pub fn destroy(self, commands: &mut Commands) { self.issue(commands, EngineCommand::Destroy); }

    pub fn rotate(self, commands: &mut Commands, position: Position) {
        self.issue(commands, EngineCommand::Rotate(position));
    }

    pub fn set_option(self, commands: &mut Commands, option: ViewerOption) {
        self.issue(commands, EngineCommand::SetOption(option));
    }

    pub fn zoom(self, commands: &mut Commands, level: f32) {
        self.issue(commands, EngineCommand::Zoom(level));
    }

    pub fn zoom_in(self, commands: &mut Commands, step: f32) {
        self.issue(commands, EngineCommand::ZoomIn(step));
    }

    pub fn zoom_out(self, commands: &mut Commands, step: f32) {
        self.issue(commands, EngineCommand::ZoomOut(step));
    }

    pub fn set_cursor(self, commands: &mut Commands, cursor: Option<&str>) {
        self.issue(commands, EngineCommand::SetCursor(cursor.map(str::to_owned)));
    }

    pub fn needs_continuous_update(self, commands: &mut Commands, enabled: bool) {
        self.issue(commands, EngineCommand::NeedsContinuousUpdate(enabled));
    }

    pub fn observe_objects(self, commands: &mut Commands, key: impl Into<String>) {
        self.issue(commands, EngineCommand::ObserveObjects(key.into()));
    }

    pub fn unobserve_objects(self, commands: &mut Commands, key: impl Into<String>) {
        self.issue(commands, EngineCommand::UnobserveObjects(key.into()));
    }

    pub fn start_autorotate(self, commands: &mut Commands) {
        self.issue(commands, EngineCommand::StartAutorotate);
    }

    pub fn stop_autorotate(self, commands: &mut Commands) {
        self.issue(commands, EngineCommand::StopAutorotate);
    }

    pub fn toggle_autorotate(self, commands: &mut Commands) {
        self.issue(commands, EngineCommand::ToggleAutorotate);
    }
}

impl From<Entity> for ViewerHandle {
    fn from(entity: Entity) -> Self { Self(entity) }
}

/// Direct engine access for systems.
#[derive(SystemParam)]
pub struct Viewers<'w, 's> {
    engines: Query<'w, 's, &'static mut ViewerEngine>,
    navbars: Query<'w, 's, &'static ViewerNavbar>,
}

impl Viewers<'_, '_> {
    fn engine(&self, handle: ViewerHandle) -> Option<&dyn PanoramaEngine> {
        self.engines.get(handle.entity()).ok()?.active()
    }

    fn with_engine<R>(
        &mut self,
        handle: ViewerHandle,
        f: impl FnOnce(&mut dyn PanoramaEngine) -> R,
    ) -> Option<R> {
        let mut viewer = self.engines.get_mut(handle.entity()).ok()?;
        viewer.active_mut().map(f)
    }

    pub fn is_mounted(&self, handle: ViewerHandle) -> bool { self.engine(handle).is_some() }

    /// Configuration of the live engine, including options set after mount.
    pub fn config(&self, handle: ViewerHandle) -> Option<&ViewerConfig> {
        self.engine(handle).map(|engine| engine.config())
    }

    /// Navbar layout currently shown, with reserved buttons applied.
    pub fn current_navbar(&self, handle: ViewerHandle) -> Option<&Navbar> {
        self.engine(handle)?;
        self.navbars
            .get(handle.entity())
            .ok()
            .map(ViewerNavbar::current)
    }

    pub fn plugin(&self, handle: ViewerHandle, id: &str) -> Option<&dyn EnginePlugin> {
        self.engine(handle)?.plugin(id)
    }

    pub fn position(&self, handle: ViewerHandle) -> Option<Position> {
        self.engine(handle).map(|engine| engine.position())
    }

    pub fn zoom_level(&self, handle: ViewerHandle) -> Option<f32> {
        self.engine(handle).map(|engine| engine.zoom_level())
    }

    pub fn size(&self, handle: ViewerHandle) -> Option<ViewerSize> {
        self.engine(handle).map(|engine| engine.size())
    }

    pub fn is_fullscreen_enabled(&self, handle: ViewerHandle) -> Option<bool> {
        self.engine(handle)
            .map(|engine| engine.is_fullscreen_enabled())
    }

    pub fn set_options(&mut self, handle: ViewerHandle, options: Vec<ViewerOption>) -> Option<()> {
        self.with_engine(handle, |engine| engine.set_options(options))
    }

    pub fn set_panorama(
        &mut self,
        handle: ViewerHandle,
        source: &PanoramaSource,
        options: &PanoramaOptions,
    ) -> Option<()> {
        self.with_engine(handle, |engine| engine.set_panorama(source, options))
    }

    pub fn set_overlay(
        &mut self,
        handle: ViewerHandle,
        source: &PanoramaSource,
        opacity: Option<f32>,
    ) -> Option<()> {
        self.with_engine(handle, |engine| engine.set_overlay(source, opacity))
    }

    pub fn resize(&mut self, handle: ViewerHandle, size: &CssSize) -> Option<()> {
        self.with_engine(handle, |engine| engine.resize(size))
    }

    pub fn auto_size(&mut self, handle: ViewerHandle) -> Option<()> {
        self.with_engine(handle, |engine| engine.auto_size())
    }

    pub fn needs_update(&mut self, handle: ViewerHandle) -> Option<()> {
        self.with_engine(handle, |engine| engine.needs_update())
    }

    pub fn enter_fullscreen(&mut self, handle: ViewerHandle) -> Option<()> {
        self.with_engine(handle, |engine| engine.enter_fullscreen())
    }

    pub fn exit_fullscreen(&mut self, handle: ViewerHandle) -> Option<()> {
        self.with_engine(handle, |engine| engine.exit_fullscreen())
    }

    pub fn toggle_fullscreen(&mut self, handle: ViewerHandle) -> Option<()> {
        self.with_engine(handle, |engine| engine.toggle_fullscreen())
    }

    pub fn start_keyboard_control(&mut self, handle: ViewerHandle) -> Option<()> {
        self.with_engine(handle, |engine| engine.start_keyboard_control())
    }

    pub fn stop_keyboard_control(&mut self, handle: ViewerHandle) -> Option<()> {
        self.with_engine(handle, |engine| engine.stop_keyboard_control())
    }

    pub fn create_tooltip(
        &mut self,
        handle: ViewerHandle,
        config: &TooltipConfig,
    ) -> Option<TooltipId> {
        self.with_engine(handle, |engine| engine.create_tooltip(config))
    }

    pub fn show_error(&mut self, handle: ViewerHandle, message: &str) -> Option<()> {
        self.with_engine(handle, |engine| engine.show_error(message))
    }

    pub fn hide_error(&mut self, handle: ViewerHandle) -> Option<()> {
        self.with_engine(handle, |engine| engine.hide_error())
    }
}
