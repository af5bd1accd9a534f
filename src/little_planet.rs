//! Little planet transition.
//!
//! A viewer built in little planet mode starts looking straight down with a
//! strong fisheye and mouse-wheel zoom disabled. The first click flies the
//! camera into the sphere (descent), then up to a level view (ascent), and
//! finally restores the consumer's field-of-view ceiling and mouse-wheel zoom.
//! The reset navbar button re-arms the whole sequence.

use std::f32::consts::FRAC_PI_2;

use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use crate::components::ViewerEngine;
use crate::config::ViewerOption;
use crate::engine::AnimateOptions;
use crate::engine::AnimationSpeed;
use crate::engine::AnimationTicket;
use crate::engine::PanoramaEngine;
use crate::engine::with_autorotate;

/// Presentation constants of the little planet transition.
#[derive(Resource, Reflect, Debug, Clone)]
#[reflect(Resource)]
pub struct LittlePlanetConfig {
    /// Fisheye distortion while armed.
    pub fisheye:            f32,
    /// Pitch of the armed view, in radians.
    pub nadir_pitch:        f32,
    /// Zoom level of the armed view.
    pub default_zoom_level: f32,
    pub descent_speed:      AnimationSpeed,
    /// Zoom level reached at the end of the descent.
    pub descent_zoom:       f32,
    pub ascent_speed:       AnimationSpeed,
    /// Zoom level reached at the end of the ascent.
    pub ascent_zoom:        f32,
    /// Speed of the animation back to the armed view on reset.
    pub reset_speed:        AnimationSpeed,
    /// Narrow calibration point: `(aspect ratio, max fov ceiling)`.
    pub narrow_calibration: (f32, f32),
    /// Wide calibration point: `(aspect ratio, max fov ceiling)`.
    pub wide_calibration:   (f32, f32),
}

impl Default for LittlePlanetConfig {
    fn default() -> Self {
        Self {
            fisheye:            2.0,
            nadir_pitch:        -FRAC_PI_2,
            default_zoom_level: 0.0,
            descent_speed:      AnimationSpeed::Rpm(3.0),
            descent_zoom:       75.0,
            ascent_speed:       AnimationSpeed::Rpm(10.0),
            ascent_zoom:        90.0,
            reset_speed:        AnimationSpeed::Rpm(10.0),
            narrow_calibration: (0.5, 140.0),
            wide_calibration:   (1.8, 115.0),
        }
    }
}

impl LittlePlanetConfig {
    /// Max field of view for a viewport aspect ratio, linearly interpolated
    /// between the calibration points and floored. Extrapolates outside them.
    pub fn max_fov_ceiling(&self, aspect_ratio: f32) -> f32 {
        let (in_min, out_min) = self.narrow_calibration;
        let (in_max, out_max) = self.wide_calibration;
        let (in_min, in_max) = (f64::from(in_min), f64::from(in_max));
        let (out_min, out_max) = (f64::from(out_min), f64::from(out_max));

        let t = (f64::from(aspect_ratio) - in_min) / (in_max - in_min);
        t.mul_add(out_max - out_min, out_min).floor() as f32
    }
}

/// Little planet max field of view for the current primary window.
#[derive(Resource, Reflect, Debug, Clone, Copy, PartialEq)]
#[reflect(Resource)]
pub struct LittlePlanetCeiling(pub f32);

impl Default for LittlePlanetCeiling {
    fn default() -> Self { Self(130.0) }
}

/// Where the transition currently is.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LittlePlanetPhase {
    /// Waiting for the first click.
    #[default]
    Armed,
    /// Flying into the sphere; waits for this animation to finish.
    Descending(AnimationTicket),
    /// Rising to a level view; waits for this animation to finish.
    Ascending(AnimationTicket),
    /// Transition done; clicks are ordinary clicks.
    Settled,
}

/// Values restored once the transition settles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SettleTarget {
    pub max_fov:    f32,
    pub mousewheel: bool,
}

/// Little planet state of one engine. Dropped with the engine, so a remount
/// always starts armed.
#[derive(Component, Reflect, Debug, Default)]
#[reflect(Component)]
pub struct LittlePlanet {
    phase: LittlePlanetPhase,
}

impl LittlePlanet {
    pub const fn phase(&self) -> LittlePlanetPhase { self.phase }

    /// Starts the descent if armed. Returns whether the click was consumed by
    /// the transition; the click notification is delivered either way.
    pub fn on_click(
        &mut self,
        engine: &mut dyn PanoramaEngine,
        config: &LittlePlanetConfig,
    ) -> bool {
        if self.phase != LittlePlanetPhase::Armed {
            return false;
        }

        let ticket = engine.animate(&AnimateOptions::to(
            0.0,
            config.nadir_pitch,
            config.descent_zoom,
            config.descent_speed,
        ));
        self.phase = LittlePlanetPhase::Descending(ticket);
        debug!("Little planet descending ({ticket:?})");
        true
    }

    /// Advances the transition when the animation it waits on finishes.
    /// Tickets of other animations are ignored.
    pub fn on_animation_finished(
        &mut self,
        ticket: AnimationTicket,
        engine: &mut dyn PanoramaEngine,
        config: &LittlePlanetConfig,
        settle: SettleTarget,
    ) {
        match self.phase {
            LittlePlanetPhase::Descending(pending) if pending == ticket => {
                let ascent = engine.animate(&AnimateOptions::to(
                    0.0,
                    0.0,
                    config.ascent_zoom,
                    config.ascent_speed,
                ));
                self.phase = LittlePlanetPhase::Ascending(ascent);
                debug!("Little planet ascending ({ascent:?})");
            },
            LittlePlanetPhase::Ascending(pending) if pending == ticket => {
                with_autorotate(engine, |autorotate| autorotate.start());
                engine.set_option(ViewerOption::MaxFov(settle.max_fov));
                engine.set_option(ViewerOption::Mousewheel(settle.mousewheel));
                self.phase = LittlePlanetPhase::Settled;
                info!("Little planet settled");
            },
            _ => {},
        }
    }

    /// Returns to the armed view from any phase.
    pub fn reset(
        &mut self,
        engine: &mut dyn PanoramaEngine,
        config: &LittlePlanetConfig,
        ceiling: f32,
    ) {
        with_autorotate(engine, |autorotate| autorotate.stop());
        engine.set_option(ViewerOption::MaxFov(ceiling));
        engine.set_option(ViewerOption::Mousewheel(false));
        engine.animate(&AnimateOptions::to(
            0.0,
            config.nadir_pitch,
            config.default_zoom_level,
            config.reset_speed,
        ));
        self.phase = LittlePlanetPhase::Armed;
        info!("Little planet re-armed");
    }
}

/// Recomputes the little planet ceiling whenever the primary window changes.
pub fn track_viewport_aspect(
    config: Res<LittlePlanetConfig>,
    mut ceiling: ResMut<LittlePlanetCeiling>,
    windows: Query<&Window, (With<PrimaryWindow>, Changed<Window>)>,
) {
    let Ok(window) = windows.single() else {
        return;
    };
    let (width, height) = (window.width(), window.height());
    if height <= 0.0 {
        return;
    }

    let next = config.max_fov_ceiling(width / height);
    if ceiling.0 != next {
        debug!("Little planet ceiling {:.0} -> {next:.0} ({width}x{height})", ceiling.0);
        ceiling.0 = next;
    }
}

/// Pushes a changed ceiling to engines still waiting for their first click.
pub fn apply_ceiling_to_armed(
    ceiling: Res<LittlePlanetCeiling>,
    mut viewers: Query<(&LittlePlanet, &mut ViewerEngine)>,
) {
    if !ceiling.is_changed() {
        return;
    }
    for (planet, mut viewer) in &mut viewers {
        if planet.phase() != LittlePlanetPhase::Armed {
            continue;
        }
        if let Some(engine) = viewer.active_mut() {
            engine.set_option(ViewerOption::MaxFov(ceiling.0));
        }
    }
}
