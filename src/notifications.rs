//! Delivers engine notifications to callbacks, observers and the little planet
//! transition.

use bevy::prelude::*;

use crate::components::SphereViewer;
use crate::components::ViewerCallbacks;
use crate::components::ViewerEngine;
use crate::components::ViewerNavbar;
use crate::config::DEFAULT_MAX_FOV;
use crate::config::ViewerOption;
use crate::engine::EngineNotification;
use crate::engine::PanoramaEngine;
use crate::events::LittlePlanetSettled;
use crate::events::ViewerClicked;
use crate::events::ViewerDoubleClicked;
use crate::events::ViewerPositionUpdated;
use crate::events::ViewerReady;
use crate::events::ViewerZoomUpdated;
use crate::little_planet::LittlePlanet;
use crate::little_planet::LittlePlanetCeiling;
use crate::little_planet::LittlePlanetConfig;
use crate::little_planet::LittlePlanetPhase;
use crate::little_planet::SettleTarget;
use crate::navbar::HIDE_NAVBAR_BUTTON_ID;
use crate::navbar::RESET_LITTLE_PLANET_BUTTON_ID;

/// Drains each engine's notifications and delivers them in emission order.
///
/// The callback runs first and receives the live engine, then the matching
/// event is triggered on the viewer entity. A destroyed engine delivers
/// nothing, including the rest of a batch after a callback destroyed it.
/// `Ready` is delivered at most once per engine.
pub fn forward_engine_notifications(
    mut commands: Commands,
    planet_config: Res<LittlePlanetConfig>,
    ceiling: Res<LittlePlanetCeiling>,
    mut viewers: Query<(
        Entity,
        &SphereViewer,
        &mut ViewerEngine,
        Option<&mut LittlePlanet>,
        Option<&mut ViewerNavbar>,
    )>,
) {
    for (entity, viewer, mut viewer_engine, mut planet, mut navbar) in &mut viewers {
        let notifications = viewer_engine.take_notifications();
        for notification in notifications {
            if notification == EngineNotification::Ready && !viewer_engine.mark_ready() {
                continue;
            }
            let Some(engine) = viewer_engine.active_mut() else {
                break;
            };
            run_callback(&viewer.callbacks, &notification, engine);

            let Some(engine) = viewer_engine.active_mut() else {
                debug!("Engine of {entity:?} destroyed from a callback");
                break;
            };
            match notification {
                EngineNotification::Ready => {
                    debug!("Viewer {entity:?} ready");
                    commands.trigger(ViewerReady { entity });
                },
                EngineNotification::Click(data) => {
                    commands.trigger(ViewerClicked { entity, data });
                    if let Some(planet) = planet.as_deref_mut() {
                        planet.on_click(engine, &planet_config);
                    }
                },
                EngineNotification::DoubleClick(data) => {
                    commands.trigger(ViewerDoubleClicked { entity, data });
                },
                EngineNotification::ZoomUpdated { zoom_level } => {
                    commands.trigger(ViewerZoomUpdated { entity, zoom_level });
                },
                EngineNotification::PositionUpdated(position) => {
                    commands.trigger(ViewerPositionUpdated { entity, position });
                },
                EngineNotification::AnimationFinished(ticket) => {
                    let Some(planet) = planet.as_deref_mut() else {
                        continue;
                    };
                    let settle = SettleTarget {
                        max_fov:    viewer.options.max_fov.unwrap_or(DEFAULT_MAX_FOV),
                        mousewheel: viewer.options.mousewheel.unwrap_or(true),
                    };
                    let was_settled = planet.phase() == LittlePlanetPhase::Settled;
                    planet.on_animation_finished(ticket, engine, &planet_config, settle);
                    if !was_settled && planet.phase() == LittlePlanetPhase::Settled {
                        commands.trigger(LittlePlanetSettled { entity });
                    }
                },
                EngineNotification::NavbarButtonClicked { id } => {
                    press_navbar_button(
                        entity,
                        &id,
                        engine,
                        planet.as_deref_mut(),
                        navbar.as_deref_mut(),
                        &planet_config,
                        ceiling.0,
                    );
                },
            }
        }
    }
}

fn run_callback(
    callbacks: &ViewerCallbacks,
    notification: &EngineNotification,
    engine: &mut dyn PanoramaEngine,
) {
    match notification {
        EngineNotification::Ready => {
            if let Some(on_ready) = &callbacks.on_ready {
                on_ready(engine);
            }
        },
        EngineNotification::Click(data) => {
            if let Some(on_click) = &callbacks.on_click {
                on_click(data, engine);
            }
        },
        EngineNotification::DoubleClick(data) => {
            if let Some(on_dblclick) = &callbacks.on_dblclick {
                on_dblclick(data, engine);
            }
        },
        EngineNotification::ZoomUpdated { zoom_level } => {
            if let Some(on_zoom_change) = &callbacks.on_zoom_change {
                on_zoom_change(*zoom_level, engine);
            }
        },
        EngineNotification::PositionUpdated(position) => {
            if let Some(on_position_change) = &callbacks.on_position_change {
                on_position_change(position.pitch, position.yaw, engine);
            }
        },
        EngineNotification::AnimationFinished(_)
        | EngineNotification::NavbarButtonClicked { .. } => {},
    }
}

fn press_navbar_button(
    entity: Entity,
    id: &str,
    engine: &mut dyn PanoramaEngine,
    planet: Option<&mut LittlePlanet>,
    navbar: Option<&mut ViewerNavbar>,
    planet_config: &LittlePlanetConfig,
    ceiling: f32,
) {
    match id {
        RESET_LITTLE_PLANET_BUTTON_ID => {
            if let Some(planet) = planet {
                planet.reset(engine, planet_config, ceiling);
            }
        },
        HIDE_NAVBAR_BUTTON_ID => {
            if let Some(navbar) = navbar {
                let layout = navbar.toggle_collapsed().clone();
                debug!("Navbar of {entity:?} collapsed: {}", navbar.is_collapsed());
                engine.set_option(ViewerOption::Navbar(layout));
            }
        },
        _ => {
            let action = navbar
                .as_deref()
                .and_then(|navbar| navbar.current().custom_button(id))
                .and_then(|button| button.action.clone());
            match action {
                Some(action) => action.run(engine),
                None => warn!("Navbar button {id:?} of {entity:?} has no action"),
            }
        },
    }
}
