//! Observers that route commands to engines and tear engines down.

use bevy::prelude::*;

use crate::components::MountFailed;
use crate::components::MountTarget;
use crate::components::SphereViewer;
use crate::components::ViewerEngine;
use crate::components::ViewerNavbar;
use crate::config::ViewerOption;
use crate::engine::PanoramaEngine;
use crate::engine::with_autorotate;
use crate::events::EngineCommand;
use crate::events::IssueCommand;
use crate::little_planet::LittlePlanet;
use crate::navbar::filter_navbar;
use crate::navbar::with_reserved_buttons;

/// Observer for `IssueCommand` - forwards the command to the viewer's engine,
/// or drops it when there is no ready engine.
pub fn on_issue_command(
    issue: On<IssueCommand>,
    mut viewers: Query<(&SphereViewer, &mut ViewerEngine, Option<&mut ViewerNavbar>)>,
) {
    let entity = issue.entity;

    let Ok((viewer, mut viewer_engine, mut navbar)) = viewers.get_mut(entity) else {
        debug!("Dropping {:?} for {entity:?}: no engine mounted", issue.command);
        return;
    };

    if !viewer_engine.is_ready() {
        debug!("Dropping {:?} for {entity:?}: engine not ready", issue.command);
        return;
    }

    match issue.command.clone() {
        EngineCommand::Destroy => viewer_engine.destroy(),
        command => {
            let Some(engine) = viewer_engine.active_mut() else {
                debug!("Dropping {command:?} for {entity:?}: engine destroyed");
                return;
            };
            apply_command(engine, command, viewer, navbar.as_deref_mut());
        },
    }
}

fn apply_command(
    engine: &mut dyn PanoramaEngine,
    command: EngineCommand,
    viewer: &SphereViewer,
    navbar: Option<&mut ViewerNavbar>,
) {
    match command {
        EngineCommand::Animate(options) => {
            engine.animate(&options);
        },
        EngineCommand::StopAnimation => engine.stop_animation(),
        EngineCommand::Rotate(position) => engine.rotate(position),
        EngineCommand::SetOption(ViewerOption::Navbar(layout)) => {
            let layout = with_reserved_buttons(
                filter_navbar(layout.into()),
                viewer.little_planet,
                viewer.hide_navbar_button,
            );
            if let Some(navbar) = navbar {
                navbar.replace(layout.clone());
            }
            engine.set_option(ViewerOption::Navbar(layout));
        },
        EngineCommand::SetOption(option) => engine.set_option(option),
        EngineCommand::Zoom(level) => engine.zoom(level),
        EngineCommand::ZoomIn(step) => engine.zoom_in(step),
        EngineCommand::ZoomOut(step) => engine.zoom_out(step),
        EngineCommand::SetCursor(cursor) => engine.set_cursor(cursor.as_deref()),
        EngineCommand::NeedsContinuousUpdate(enabled) => engine.needs_continuous_update(enabled),
        EngineCommand::ObserveObjects(key) => engine.observe_objects(&key),
        EngineCommand::UnobserveObjects(key) => engine.unobserve_objects(&key),
        EngineCommand::StartAutorotate => with_autorotate(engine, |autorotate| autorotate.start()),
        EngineCommand::StopAutorotate => with_autorotate(engine, |autorotate| autorotate.stop()),
        EngineCommand::ToggleAutorotate => {
            with_autorotate(engine, |autorotate| autorotate.toggle());
        },
        EngineCommand::Destroy => {},
    }
}

/// Observer that unmounts a viewer whose properties were removed.
pub fn unmount_on_viewer_removed(remove: On<Remove, SphereViewer>, mut commands: Commands) {
    commands
        .entity(remove.entity)
        .try_remove::<(ViewerEngine, LittlePlanet, ViewerNavbar, MountFailed)>();
}

/// Observer that unmounts a viewer whose mount target was removed.
pub fn unmount_on_target_removed(remove: On<Remove, MountTarget>, mut commands: Commands) {
    commands
        .entity(remove.entity)
        .try_remove::<(ViewerEngine, LittlePlanet, ViewerNavbar, MountFailed)>();
}

/// Observer that destroys the engine whenever `ViewerEngine` leaves an entity,
/// including on despawn.
pub fn destroy_engine_on_remove(
    remove: On<Remove, ViewerEngine>,
    mut engines: Query<&mut ViewerEngine>,
) {
    if let Ok(mut engine) = engines.get_mut(remove.entity) {
        engine.destroy();
    }
}
