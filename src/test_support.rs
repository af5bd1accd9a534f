//! Recording engine and app helpers shared by the unit tests.

use std::any::Any;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;

use bevy::prelude::*;

use crate::SphereViewerPlugin;
use crate::components::MountTarget;
use crate::components::SphereViewer;
use crate::config::AUTOROTATE_PLUGIN_ID;
use crate::config::CssSize;
use crate::config::PanoramaSource;
use crate::config::ViewerConfig;
use crate::config::ViewerOption;
use crate::config::adapt_config;
use crate::engine::AnimateOptions;
use crate::engine::AnimationTicket;
use crate::engine::Autorotate;
use crate::engine::EngineFactory;
use crate::engine::EngineNotification;
use crate::engine::EnginePlugin;
use crate::engine::PanoramaEngine;
use crate::engine::PanoramaOptions;
use crate::engine::Position;
use crate::engine::TooltipConfig;
use crate::engine::TooltipId;
use crate::engine::ViewerSize;
use crate::error::ViewerError;
use crate::little_planet::LittlePlanetConfig;

/// Every call the viewer made on a `RecordingEngine`.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Animate(AnimateOptions),
    StopAnimation,
    Rotate(Position),
    Zoom(f32),
    ZoomIn(f32),
    ZoomOut(f32),
    SetOption(ViewerOption),
    SetPanorama(PanoramaSource),
    SetOverlay(PanoramaSource),
    Resize(CssSize),
    AutoSize,
    NeedsUpdate,
    NeedsContinuousUpdate(bool),
    EnterFullscreen,
    ExitFullscreen,
    ToggleFullscreen,
    StartKeyboardControl,
    StopKeyboardControl,
    SetCursor(Option<String>),
    CreateTooltip(String),
    ObserveObjects(String),
    UnobserveObjects(String),
    ShowError(String),
    HideError,
    AutorotateStart,
    AutorotateStop,
    AutorotateToggle,
    Destroy,
}

/// State shared between a `RecordingEngine` and the test driving it.
#[derive(Debug)]
pub struct EngineState {
    /// Mirror of the engine's configuration.
    pub config:      ViewerConfig,
    pub calls:       Vec<EngineCall>,
    /// Notifications returned by the next `take_notifications`.
    pub pending:     Vec<EngineNotification>,
    pub position:    Position,
    pub zoom_level:  f32,
    pub fullscreen:  bool,
    running:         VecDeque<AnimationTicket>,
    next_ticket:     u64,
}

impl EngineState {
    fn new(config: ViewerConfig) -> Self {
        Self {
            zoom_level: config.default_zoom_level,
            position: Position::new(config.default_yaw, config.default_pitch),
            config,
            calls: Vec::new(),
            pending: Vec::new(),
            fullscreen: false,
            running: VecDeque::new(),
            next_ticket: 0,
        }
    }

    pub fn emit(&mut self, notification: EngineNotification) { self.pending.push(notification); }

    pub fn animations(&self) -> Vec<AnimateOptions> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                EngineCall::Animate(options) => Some(*options),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, call: &EngineCall) -> usize {
        self.calls.iter().filter(|c| *c == call).count()
    }

    pub fn is_destroyed(&self) -> bool { self.calls.contains(&EngineCall::Destroy) }

    /// Completes the oldest running animation without notifying.
    pub fn finish_next_animation(&mut self) -> Option<AnimationTicket> { self.running.pop_front() }

    /// Completes the oldest running animation and queues its notification.
    pub fn finish_next_animation_later(&mut self) -> Option<AnimationTicket> {
        let ticket = self.running.pop_front()?;
        self.pending
            .push(EngineNotification::AnimationFinished(ticket));
        Some(ticket)
    }

    /// Cuts short every running animation. Each still reports as finished.
    fn interrupt_animations(&mut self) {
        let interrupted = self.running.drain(..).map(EngineNotification::AnimationFinished);
        self.pending.extend(interrupted);
    }

    fn start_animation(&mut self, options: &AnimateOptions) -> AnimationTicket {
        self.interrupt_animations();
        self.calls.push(EngineCall::Animate(*options));
        self.next_ticket += 1;
        let ticket = AnimationTicket(self.next_ticket);
        self.running.push_back(ticket);
        ticket
    }
}

pub type SharedState = Arc<Mutex<EngineState>>;

struct RecordingPlugin {
    id:    String,
    state: SharedState,
}

impl RecordingPlugin {
    fn record(&self, call: EngineCall) { self.state.lock().unwrap().calls.push(call); }
}

impl EnginePlugin for RecordingPlugin {
    fn id(&self) -> &str { &self.id }

    fn as_any(&self) -> &dyn Any { self }

    fn as_autorotate(&mut self) -> Option<&mut dyn Autorotate> {
        if self.id == AUTOROTATE_PLUGIN_ID {
            Some(self)
        } else {
            None
        }
    }
}

impl Autorotate for RecordingPlugin {
    fn start(&mut self) { self.record(EngineCall::AutorotateStart); }

    fn stop(&mut self) { self.record(EngineCall::AutorotateStop); }

    fn toggle(&mut self) { self.record(EngineCall::AutorotateToggle); }
}

/// Engine double that records calls into a shared `EngineState`.
pub struct RecordingEngine {
    config:  ViewerConfig,
    state:   SharedState,
    plugins: Vec<RecordingPlugin>,
}

impl RecordingEngine {
    pub fn new(config: &ViewerConfig) -> (Self, SharedState) {
        let state = Arc::new(Mutex::new(EngineState::new(config.clone())));
        let plugins = config
            .plugins
            .iter()
            .map(|registration| RecordingPlugin {
                id:    registration.id.clone(),
                state: Arc::clone(&state),
            })
            .collect();
        let engine = Self {
            config: config.clone(),
            state: Arc::clone(&state),
            plugins,
        };
        (engine, state)
    }

    /// Engine for a little planet viewer not attached to any app.
    pub fn standalone() -> (Self, SharedState) {
        let viewer = SphereViewer::new("pano.jpg").with_little_planet(true);
        let config = adapt_config(
            &viewer,
            Entity::PLACEHOLDER,
            &LittlePlanetConfig::default(),
            130.0,
        );
        Self::new(&config)
    }

    pub fn state(&self) -> SharedState { Arc::clone(&self.state) }

    fn record(&self, call: EngineCall) { self.state.lock().unwrap().calls.push(call); }
}

impl PanoramaEngine for RecordingEngine {
    fn config(&self) -> &ViewerConfig { &self.config }

    fn take_notifications(&mut self) -> Vec<EngineNotification> {
        std::mem::take(&mut self.state.lock().unwrap().pending)
    }

    fn animate(&mut self, options: &AnimateOptions) -> AnimationTicket {
        self.state.lock().unwrap().start_animation(options)
    }

    fn stop_animation(&mut self) {
        let mut state = self.state.lock().unwrap();
        state.interrupt_animations();
        state.calls.push(EngineCall::StopAnimation);
    }

    fn rotate(&mut self, position: Position) {
        let mut state = self.state.lock().unwrap();
        state.position = position;
        state.calls.push(EngineCall::Rotate(position));
    }

    fn zoom(&mut self, level: f32) {
        let mut state = self.state.lock().unwrap();
        state.zoom_level = level;
        state.calls.push(EngineCall::Zoom(level));
    }

    fn zoom_in(&mut self, step: f32) {
        let mut state = self.state.lock().unwrap();
        state.zoom_level = (state.zoom_level + step).min(100.0);
        state.calls.push(EngineCall::ZoomIn(step));
    }

    fn zoom_out(&mut self, step: f32) {
        let mut state = self.state.lock().unwrap();
        state.zoom_level = (state.zoom_level - step).max(0.0);
        state.calls.push(EngineCall::ZoomOut(step));
    }

    fn set_option(&mut self, option: ViewerOption) {
        self.config.set(option.clone());
        let mut state = self.state.lock().unwrap();
        state.config.set(option.clone());
        state.calls.push(EngineCall::SetOption(option));
    }

    fn set_panorama(&mut self, source: &PanoramaSource, _options: &PanoramaOptions) {
        self.config.panorama = source.clone();
        self.record(EngineCall::SetPanorama(source.clone()));
    }

    fn set_overlay(&mut self, source: &PanoramaSource, _opacity: Option<f32>) {
        self.record(EngineCall::SetOverlay(source.clone()));
    }

    fn resize(&mut self, size: &CssSize) {
        self.config.size = size.clone();
        self.record(EngineCall::Resize(size.clone()));
    }

    fn auto_size(&mut self) { self.record(EngineCall::AutoSize); }

    fn size(&self) -> ViewerSize {
        ViewerSize {
            width:  800.0,
            height: 400.0,
        }
    }

    fn position(&self) -> Position { self.state.lock().unwrap().position }

    fn zoom_level(&self) -> f32 { self.state.lock().unwrap().zoom_level }

    fn needs_update(&mut self) { self.record(EngineCall::NeedsUpdate); }

    fn needs_continuous_update(&mut self, enabled: bool) {
        self.record(EngineCall::NeedsContinuousUpdate(enabled));
    }

    fn enter_fullscreen(&mut self) {
        let mut state = self.state.lock().unwrap();
        state.fullscreen = true;
        state.calls.push(EngineCall::EnterFullscreen);
    }

    fn exit_fullscreen(&mut self) {
        let mut state = self.state.lock().unwrap();
        state.fullscreen = false;
        state.calls.push(EngineCall::ExitFullscreen);
    }

    fn toggle_fullscreen(&mut self) {
        let mut state = self.state.lock().unwrap();
        state.fullscreen = !state.fullscreen;
        state.calls.push(EngineCall::ToggleFullscreen);
    }

    fn is_fullscreen_enabled(&self) -> bool { self.state.lock().unwrap().fullscreen }

    fn start_keyboard_control(&mut self) { self.record(EngineCall::StartKeyboardControl); }

    fn stop_keyboard_control(&mut self) { self.record(EngineCall::StopKeyboardControl); }

    fn set_cursor(&mut self, cursor: Option<&str>) {
        self.record(EngineCall::SetCursor(cursor.map(str::to_owned)));
    }

    fn create_tooltip(&mut self, config: &TooltipConfig) -> TooltipId {
        let mut state = self.state.lock().unwrap();
        state.calls.push(EngineCall::CreateTooltip(config.content.clone()));
        TooltipId(state.calls.len() as u64)
    }

    fn observe_objects(&mut self, key: &str) {
        self.record(EngineCall::ObserveObjects(key.to_owned()));
    }

    fn unobserve_objects(&mut self, key: &str) {
        self.record(EngineCall::UnobserveObjects(key.to_owned()));
    }

    fn show_error(&mut self, message: &str) {
        self.record(EngineCall::ShowError(message.to_owned()));
    }

    fn hide_error(&mut self) { self.record(EngineCall::HideError); }

    fn plugin(&self, id: &str) -> Option<&dyn EnginePlugin> {
        self.plugins
            .iter()
            .find(|plugin| plugin.id == id)
            .map(|plugin| plugin as &dyn EnginePlugin)
    }

    fn plugin_mut(&mut self, id: &str) -> Option<&mut dyn EnginePlugin> {
        self.plugins
            .iter_mut()
            .find(|plugin| plugin.id == id)
            .map(|plugin| plugin as &mut dyn EnginePlugin)
    }

    fn destroy(&mut self) { self.record(EngineCall::Destroy); }
}

/// States of every engine a recording factory built, in construction order.
#[derive(Clone, Default)]
pub struct Engines(Arc<Mutex<Vec<SharedState>>>);

impl Engines {
    pub fn count(&self) -> usize { self.0.lock().unwrap().len() }

    pub fn get(&self, index: usize) -> SharedState { Arc::clone(&self.0.lock().unwrap()[index]) }

    pub fn last(&self) -> SharedState {
        let engines = self.0.lock().unwrap();
        Arc::clone(engines.last().expect("no engine was constructed"))
    }
}

pub fn recording_factory() -> (EngineFactory, Engines) {
    let engines = Engines::default();
    let registry = engines.clone();
    let factory = EngineFactory::new(move |config| {
        let (engine, state) = RecordingEngine::new(config);
        registry.0.lock().unwrap().push(state);
        Ok(Box::new(engine) as Box<dyn PanoramaEngine>)
    });
    (factory, engines)
}

pub fn failing_factory() -> EngineFactory {
    EngineFactory::new(|config| {
        Err(ViewerError::Construction {
            target: config.container,
            reason: "unsupported renderer".into(),
        })
    })
}

/// Headless app with the viewer plugin and nothing else.
pub fn test_app(factory: EngineFactory) -> App {
    let mut app = App::new();
    app.add_plugins(SphereViewerPlugin::new(factory));
    app
}

/// Spawns a viewer mounted into its own entity and runs one frame.
pub fn spawn_mounted(app: &mut App, viewer: SphereViewer) -> Entity {
    let entity = app.world_mut().spawn(viewer).id();
    app.world_mut()
        .entity_mut(entity)
        .insert(MountTarget(entity));
    app.update();
    entity
}

/// Spawns a mounted viewer whose engine has reported ready.
pub fn spawn_ready(app: &mut App, engines: &Engines, viewer: SphereViewer) -> Entity {
    let entity = spawn_mounted(app, viewer);
    engines.last().lock().unwrap().emit(EngineNotification::Ready);
    app.update();
    entity
}
