//! Engine configuration and the mapping from viewer properties onto it.

use std::collections::BTreeMap;

use bevy::prelude::*;

use crate::components::SphereViewer;
use crate::little_planet::LittlePlanetConfig;
use crate::navbar::Navbar;
use crate::navbar::NavbarInput;
use crate::navbar::filter_navbar;
use crate::navbar::with_reserved_buttons;

pub const DEFAULT_MIN_FOV: f32 = 30.0;
pub const DEFAULT_MAX_FOV: f32 = 90.0;
pub const DEFAULT_ZOOM_LEVEL: f32 = 50.0;
pub const DEFAULT_YAW: f32 = 0.0;
pub const DEFAULT_PITCH: f32 = 0.0;
pub const DEFAULT_MOVE_SPEED: f32 = 1.0;
pub const DEFAULT_ZOOM_SPEED: f32 = 1.0;
pub const DEFAULT_WIDTH: &str = "100px";
pub const DEFAULT_CANVAS_BACKGROUND: &str = "#000";

/// Id of the autorotate extension module registered with every engine.
pub const AUTOROTATE_PLUGIN_ID: &str = "autorotate";

/// Image shown by the engine. Passed through untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanoramaSource {
    /// URL or path of an equirectangular image.
    Path(String),
    /// Six cube faces.
    Cubemap(CubemapFaces),
}

impl Default for PanoramaSource {
    fn default() -> Self { Self::Path(String::new()) }
}

impl From<&str> for PanoramaSource {
    fn from(path: &str) -> Self { Self::Path(path.to_owned()) }
}

impl From<String> for PanoramaSource {
    fn from(path: String) -> Self { Self::Path(path) }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CubemapFaces {
    pub left:   String,
    pub front:  String,
    pub right:  String,
    pub back:   String,
    pub top:    String,
    pub bottom: String,
}

/// CSS dimensions of the viewer container.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CssSize {
    pub width:  String,
    pub height: String,
}

impl CssSize {
    pub fn new(width: impl Into<String>, height: impl Into<String>) -> Self {
        Self {
            width:  width.into(),
            height: height.into(),
        }
    }
}

/// Rotation applied to the sphere, in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default, Reflect)]
pub struct SphereCorrection {
    pub pan:  f32,
    pub tilt: f32,
    pub roll: f32,
}

/// An extension module to register at construction, with its settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginRegistration {
    pub id:       String,
    pub settings: BTreeMap<String, String>,
}

impl PluginRegistration {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id:       id.into(),
            settings: BTreeMap::new(),
        }
    }

    pub fn with_setting(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.settings.insert(key.into(), value.into());
        self
    }

    fn autorotate() -> Self {
        Self::new(AUTOROTATE_PLUGIN_ID)
            .with_setting("autorotatePitch", "5deg")
            .with_setting("autostartOnIdle", "false")
    }
}

/// Engine options the consumer may set. `None` takes the documented default.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ViewerProps {
    /// Fisheye distortion; 0 disables it.
    pub fisheye:               Option<f32>,
    pub min_fov:               Option<f32>,
    pub max_fov:               Option<f32>,
    pub default_zoom_level:    Option<f32>,
    pub default_yaw:           Option<f32>,
    pub default_pitch:         Option<f32>,
    pub sphere_correction:     Option<SphereCorrection>,
    pub move_speed:            Option<f32>,
    pub zoom_speed:            Option<f32>,
    pub move_inertia:          Option<bool>,
    pub mousewheel:            Option<bool>,
    pub mousemove:             Option<bool>,
    pub mousewheel_ctrl_key:   Option<bool>,
    pub touchmove_two_fingers: Option<bool>,
    pub use_xmp_data:          Option<bool>,
    pub request_headers:       Option<BTreeMap<String, String>>,
    pub canvas_background:     Option<String>,
    pub with_credentials:      Option<bool>,
    pub navbar:                Option<NavbarInput>,
    pub lang:                  Option<BTreeMap<String, String>>,
    pub keyboard:              Option<BTreeMap<String, String>>,
    pub caption:               Option<String>,
    pub description:           Option<String>,
    pub plugins:               Vec<PluginRegistration>,
}

/// Full configuration handed to the engine at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerConfig {
    /// Entity the engine renders into.
    pub container:             Entity,
    pub panorama:              PanoramaSource,
    pub size:                  CssSize,
    pub fisheye:               f32,
    pub min_fov:               f32,
    pub max_fov:               f32,
    pub default_zoom_level:    f32,
    pub default_yaw:           f32,
    pub default_pitch:         f32,
    pub sphere_correction:     SphereCorrection,
    pub move_speed:            f32,
    pub zoom_speed:            f32,
    pub move_inertia:          bool,
    pub mousewheel:            bool,
    pub mousemove:             bool,
    pub mousewheel_ctrl_key:   bool,
    pub touchmove_two_fingers: bool,
    pub use_xmp_data:          bool,
    pub request_headers:       BTreeMap<String, String>,
    pub canvas_background:     String,
    pub with_credentials:      bool,
    pub navbar:                Navbar,
    pub lang:                  BTreeMap<String, String>,
    pub keyboard:              BTreeMap<String, String>,
    pub caption:               Option<String>,
    pub description:           Option<String>,
    pub plugins:               Vec<PluginRegistration>,
}

/// A single option that can change after construction.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewerOption {
    Fisheye(f32),
    MinFov(f32),
    MaxFov(f32),
    DefaultZoomLevel(f32),
    DefaultYaw(f32),
    DefaultPitch(f32),
    SphereCorrection(SphereCorrection),
    MoveSpeed(f32),
    ZoomSpeed(f32),
    MoveInertia(bool),
    Mousewheel(bool),
    Mousemove(bool),
    MousewheelCtrlKey(bool),
    TouchmoveTwoFingers(bool),
    CanvasBackground(String),
    Navbar(Navbar),
    Lang(BTreeMap<String, String>),
    Keyboard(BTreeMap<String, String>),
    Caption(Option<String>),
    Description(Option<String>),
}

impl ViewerConfig {
    /// Applies one option to this configuration.
    pub fn set(&mut self, option: ViewerOption) {
        match option {
            ViewerOption::Fisheye(v) => self.fisheye = v,
            ViewerOption::MinFov(v) => self.min_fov = v,
            ViewerOption::MaxFov(v) => self.max_fov = v,
            ViewerOption::DefaultZoomLevel(v) => self.default_zoom_level = v,
            ViewerOption::DefaultYaw(v) => self.default_yaw = v,
            ViewerOption::DefaultPitch(v) => self.default_pitch = v,
            ViewerOption::SphereCorrection(v) => self.sphere_correction = v,
            ViewerOption::MoveSpeed(v) => self.move_speed = v,
            ViewerOption::ZoomSpeed(v) => self.zoom_speed = v,
            ViewerOption::MoveInertia(v) => self.move_inertia = v,
            ViewerOption::Mousewheel(v) => self.mousewheel = v,
            ViewerOption::Mousemove(v) => self.mousemove = v,
            ViewerOption::MousewheelCtrlKey(v) => self.mousewheel_ctrl_key = v,
            ViewerOption::TouchmoveTwoFingers(v) => self.touchmove_two_fingers = v,
            ViewerOption::CanvasBackground(v) => self.canvas_background = v,
            ViewerOption::Navbar(v) => self.navbar = v,
            ViewerOption::Lang(v) => self.lang = v,
            ViewerOption::Keyboard(v) => self.keyboard = v,
            ViewerOption::Caption(v) => self.caption = v,
            ViewerOption::Description(v) => self.description = v,
        }
    }

    /// Options whose value in `next` differs from this configuration.
    pub fn changed_options(&self, next: &Self) -> Vec<ViewerOption> {
        let mut changed = Vec::new();
        let mut check = |differs: bool, option: ViewerOption| {
            if differs {
                changed.push(option);
            }
        };

        check(self.fisheye != next.fisheye, ViewerOption::Fisheye(next.fisheye));
        check(self.min_fov != next.min_fov, ViewerOption::MinFov(next.min_fov));
        check(self.max_fov != next.max_fov, ViewerOption::MaxFov(next.max_fov));
        check(
            self.default_zoom_level != next.default_zoom_level,
            ViewerOption::DefaultZoomLevel(next.default_zoom_level),
        );
        check(self.default_yaw != next.default_yaw, ViewerOption::DefaultYaw(next.default_yaw));
        check(
            self.default_pitch != next.default_pitch,
            ViewerOption::DefaultPitch(next.default_pitch),
        );
        check(
            self.sphere_correction != next.sphere_correction,
            ViewerOption::SphereCorrection(next.sphere_correction),
        );
        check(self.move_speed != next.move_speed, ViewerOption::MoveSpeed(next.move_speed));
        check(self.zoom_speed != next.zoom_speed, ViewerOption::ZoomSpeed(next.zoom_speed));
        check(
            self.move_inertia != next.move_inertia,
            ViewerOption::MoveInertia(next.move_inertia),
        );
        check(self.mousewheel != next.mousewheel, ViewerOption::Mousewheel(next.mousewheel));
        check(self.mousemove != next.mousemove, ViewerOption::Mousemove(next.mousemove));
        check(
            self.mousewheel_ctrl_key != next.mousewheel_ctrl_key,
            ViewerOption::MousewheelCtrlKey(next.mousewheel_ctrl_key),
        );
        check(
            self.touchmove_two_fingers != next.touchmove_two_fingers,
            ViewerOption::TouchmoveTwoFingers(next.touchmove_two_fingers),
        );
        check(
            self.canvas_background != next.canvas_background,
            ViewerOption::CanvasBackground(next.canvas_background.clone()),
        );
        check(self.navbar != next.navbar, ViewerOption::Navbar(next.navbar.clone()));
        check(self.lang != next.lang, ViewerOption::Lang(next.lang.clone()));
        check(self.keyboard != next.keyboard, ViewerOption::Keyboard(next.keyboard.clone()));
        check(self.caption != next.caption, ViewerOption::Caption(next.caption.clone()));
        check(
            self.description != next.description,
            ViewerOption::Description(next.description.clone()),
        );

        changed
    }
}

/// Builds the engine configuration from a viewer's properties.
///
/// Consumes the presentation-only fields (source, sizing, little planet and
/// navbar toggles, callbacks) and fills every omitted option with its default.
/// `max_fov_ceiling` is the little planet field-of-view ceiling for the current
/// viewport and only applies when the little planet is requested.
pub fn adapt_config(
    viewer: &SphereViewer,
    container: Entity,
    little_planet: &LittlePlanetConfig,
    max_fov_ceiling: f32,
) -> ViewerConfig {
    let props = &viewer.options;
    let planet = viewer.little_planet;

    let navbar = with_reserved_buttons(
        filter_navbar(props.navbar.clone().unwrap_or_default()),
        planet,
        viewer.hide_navbar_button,
    );

    let autorotate = props
        .plugins
        .iter()
        .find(|p| p.id == AUTOROTATE_PLUGIN_ID)
        .cloned()
        .unwrap_or_else(PluginRegistration::autorotate);
    let mut plugins = vec![autorotate];
    for plugin in &props.plugins {
        if !plugins.iter().any(|p| p.id == plugin.id) {
            plugins.push(plugin.clone());
        }
    }

    ViewerConfig {
        container,
        panorama: viewer.src.clone(),
        size: CssSize::new(
            viewer.width.clone().unwrap_or_else(|| DEFAULT_WIDTH.to_owned()),
            viewer.height.clone(),
        ),
        fisheye: if planet {
            little_planet.fisheye
        } else {
            props.fisheye.unwrap_or(0.0)
        },
        min_fov: props.min_fov.unwrap_or(DEFAULT_MIN_FOV),
        max_fov: if planet {
            max_fov_ceiling
        } else {
            props.max_fov.unwrap_or(DEFAULT_MAX_FOV)
        },
        default_zoom_level: if planet {
            little_planet.default_zoom_level
        } else {
            props.default_zoom_level.unwrap_or(DEFAULT_ZOOM_LEVEL)
        },
        default_yaw: props.default_yaw.unwrap_or(DEFAULT_YAW),
        default_pitch: if planet {
            little_planet.nadir_pitch
        } else {
            props.default_pitch.unwrap_or(DEFAULT_PITCH)
        },
        sphere_correction: props.sphere_correction.unwrap_or_default(),
        move_speed: props.move_speed.unwrap_or(DEFAULT_MOVE_SPEED),
        zoom_speed: props.zoom_speed.unwrap_or(DEFAULT_ZOOM_SPEED),
        move_inertia: props.move_inertia.unwrap_or(true),
        mousewheel: !planet && props.mousewheel.unwrap_or(true),
        mousemove: props.mousemove.unwrap_or(true),
        mousewheel_ctrl_key: props.mousewheel_ctrl_key.unwrap_or(false),
        touchmove_two_fingers: props.touchmove_two_fingers.unwrap_or(false),
        use_xmp_data: props.use_xmp_data.unwrap_or(true),
        request_headers: props.request_headers.clone().unwrap_or_default(),
        canvas_background: props
            .canvas_background
            .clone()
            .unwrap_or_else(|| DEFAULT_CANVAS_BACKGROUND.to_owned()),
        with_credentials: props.with_credentials.unwrap_or(false),
        navbar,
        lang: props.lang.clone().unwrap_or_default(),
        keyboard: props.keyboard.clone().unwrap_or_default(),
        caption: props.caption.clone(),
        description: props.description.clone(),
        plugins,
    }
}
