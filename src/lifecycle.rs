//! Mounting, remounting and in-place updates of viewer engines.

use bevy::prelude::*;

use crate::components::MountFailed;
use crate::components::MountTarget;
use crate::components::SphereViewer;
use crate::components::ViewerEngine;
use crate::components::ViewerNavbar;
use crate::config::ViewerConfig;
use crate::config::ViewerOption;
use crate::config::adapt_config;
use crate::engine::EngineFactory;
use crate::engine::PanoramaOptions;
use crate::error::ViewerError;
use crate::events::ViewerMounted;
use crate::little_planet::LittlePlanet;
use crate::little_planet::LittlePlanetCeiling;
use crate::little_planet::LittlePlanetConfig;

/// How a live engine has to follow a property change.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PropsDiff {
    /// The engine must be rebuilt; nothing else applies.
    pub remount:  bool,
    pub panorama: bool,
    pub resize:   bool,
    /// Updatable options whose value changed.
    pub options:  Vec<ViewerOption>,
}

impl PropsDiff {
    /// Compares the configuration an engine was given with the one derived from
    /// the current properties.
    ///
    /// A new engine is needed when any of these differ:
    /// - container, plugin list or little planet flag
    /// - the loader settings `use_xmp_data`, `request_headers` and
    ///   `with_credentials`, which the engine only reads at construction
    ///
    /// Everything else is applied in place.
    pub fn between(
        previous: &ViewerConfig,
        next: &ViewerConfig,
        was_little_planet: bool,
        is_little_planet: bool,
    ) -> Self {
        if previous.container != next.container
            || previous.plugins != next.plugins
            || was_little_planet != is_little_planet
            || previous.use_xmp_data != next.use_xmp_data
            || previous.request_headers != next.request_headers
            || previous.with_credentials != next.with_credentials
        {
            return Self {
                remount: true,
                ..default()
            };
        }

        Self {
            remount:  false,
            panorama: previous.panorama != next.panorama,
            resize:   previous.size != next.size,
            options:  previous.changed_options(next),
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.remount && !self.panorama && !self.resize && self.options.is_empty()
    }
}

fn unmount(commands: &mut Commands, entity: Entity) {
    commands
        .entity(entity)
        .try_remove::<(ViewerEngine, LittlePlanet, ViewerNavbar)>();
}

/// Tears down engines whose mount target now points elsewhere.
pub fn remount_on_target_change(
    mut commands: Commands,
    viewers: Query<(Entity, &MountTarget, &ViewerEngine), Changed<MountTarget>>,
) {
    for (entity, target, engine) in &viewers {
        if target.0 != engine.mount() {
            info!(
                "Mount target of {entity:?} moved from {:?} to {:?}, remounting",
                engine.mount(),
                target.0
            );
            unmount(&mut commands, entity);
        }
    }
}

/// Applies property changes to live engines, in place where possible.
pub fn sync_viewer_props(
    mut commands: Commands,
    planet_config: Res<LittlePlanetConfig>,
    mut viewers: Query<
        (Entity, &SphereViewer, &mut ViewerEngine, Option<&mut ViewerNavbar>),
        Changed<SphereViewer>,
    >,
) {
    for (entity, viewer, mut viewer_engine, navbar) in &mut viewers {
        if viewer_engine.is_destroyed() {
            continue;
        }

        let applied = viewer_engine.applied();
        // The ceiling tracks the viewport, not the properties.
        let next = adapt_config(viewer, applied.container, &planet_config, applied.max_fov);
        let diff = PropsDiff::between(
            applied,
            &next,
            viewer_engine.little_planet(),
            viewer.little_planet,
        );

        if diff.remount {
            info!("Properties of {entity:?} need a new engine, remounting");
            unmount(&mut commands, entity);
            continue;
        }
        if diff.is_empty() {
            continue;
        }

        let Some(engine) = viewer_engine.active_mut() else {
            continue;
        };
        if diff.panorama {
            debug!("Swapping panorama of {entity:?}");
            engine.set_panorama(&next.panorama, &PanoramaOptions::default());
        }
        if diff.resize {
            engine.resize(&next.size);
        }
        let navbar_changed = diff
            .options
            .iter()
            .any(|option| matches!(option, ViewerOption::Navbar(_)));
        if !diff.options.is_empty() {
            debug!("Updating {} option(s) of {entity:?}", diff.options.len());
            engine.set_options(diff.options);
        }

        if navbar_changed {
            if let Some(mut navbar) = navbar {
                navbar.replace(next.navbar.clone());
            }
        }
        viewer_engine.set_applied(next);
    }
}

/// Lets a viewer whose construction failed try again once its properties or
/// its mount target change.
pub fn retry_failed_mounts(
    mut commands: Commands,
    failed: Query<
        Entity,
        (
            With<MountFailed>,
            Or<(Changed<SphereViewer>, Changed<MountTarget>)>,
        ),
    >,
) {
    for entity in &failed {
        debug!("Retrying mount of {entity:?}");
        commands.entity(entity).try_remove::<MountFailed>();
    }
}

/// Builds an engine for every viewer whose mount target exists.
///
/// A failed construction does not stop the other viewers from mounting. The
/// failed viewer keeps no engine and is marked `MountFailed`, and the first
/// error of the frame propagates to the app's error handler.
pub fn mount_viewers(
    mut commands: Commands,
    factory: Res<EngineFactory>,
    planet_config: Res<LittlePlanetConfig>,
    ceiling: Res<LittlePlanetCeiling>,
    entities: Query<()>,
    viewers: Query<
        (Entity, &SphereViewer, &MountTarget),
        (Without<ViewerEngine>, Without<MountFailed>),
    >,
) -> Result {
    let mut first_failure: Option<ViewerError> = None;

    for (entity, viewer, target) in &viewers {
        if !entities.contains(target.0) {
            continue;
        }

        let config = adapt_config(viewer, target.0, &planet_config, ceiling.0);
        let engine = match factory.create(&config) {
            Ok(engine) => engine,
            Err(error) => {
                warn!("Mounting {entity:?} failed: {error}");
                commands.entity(entity).insert(MountFailed);
                first_failure.get_or_insert(error);
                continue;
            },
        };
        info!(
            "Mounted panorama engine for {entity:?} in {:?} (little planet: {})",
            target.0, viewer.little_planet
        );

        let navbar = ViewerNavbar::new(config.navbar.clone());
        let mut viewer_commands = commands.entity(entity);
        viewer_commands.insert((ViewerEngine::new(engine, config, viewer.little_planet), navbar));
        if viewer.little_planet {
            viewer_commands.insert(LittlePlanet::default());
        }
        commands.trigger(ViewerMounted {
            entity,
            target: target.0,
        });
    }

    match first_failure {
        Some(error) => Err(error.into()),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::config::CssSize;
    use crate::config::PanoramaSource;
    use crate::config::PluginRegistration;
    use crate::config::ViewerProps;
    use crate::test_support::EngineCall;
    use crate::test_support::failing_factory;
    use crate::test_support::recording_factory;
    use crate::test_support::spawn_mounted;
    use crate::test_support::test_app;

    fn config_for(viewer: &SphereViewer) -> ViewerConfig {
        adapt_config(viewer, Entity::PLACEHOLDER, &LittlePlanetConfig::default(), 130.0)
    }

    #[test]
    fn diff_of_identical_props_is_empty() {
        let config = config_for(&SphereViewer::new("a.jpg"));
        assert!(PropsDiff::between(&config, &config, false, false).is_empty());
    }

    #[test]
    fn diff_separates_source_size_and_options() {
        let viewer = SphereViewer::new("a.jpg").with_height("400px");
        let previous = config_for(&viewer);
        let next = config_for(
            &SphereViewer::new("b.jpg")
                .with_height("500px")
                .with_options(ViewerProps {
                    max_fov: Some(70.0),
                    ..default()
                }),
        );

        let diff = PropsDiff::between(&previous, &next, false, false);

        assert!(!diff.remount);
        assert!(diff.panorama);
        assert!(diff.resize);
        assert_eq!(diff.options, vec![ViewerOption::MaxFov(70.0)]);
    }

    #[test]
    fn diff_remounts_on_plugin_or_mode_change() {
        let previous = config_for(&SphereViewer::new("a.jpg"));
        let with_plugin = config_for(&SphereViewer::new("a.jpg").with_options(ViewerProps {
            plugins: vec![PluginRegistration::new("markers")],
            ..default()
        }));

        assert!(PropsDiff::between(&previous, &with_plugin, false, false).remount);
        assert!(PropsDiff::between(&previous, &previous, false, true).remount);
    }

    #[test]
    fn diff_remounts_on_loader_settings() {
        let viewer = SphereViewer::new("a.jpg");
        let previous = config_for(&viewer);

        let mut next = previous.clone();
        next.use_xmp_data = !previous.use_xmp_data;
        assert!(PropsDiff::between(&previous, &next, false, false).remount);

        let mut next = previous.clone();
        next.request_headers
            .insert("Authorization".into(), "Bearer token".into());
        assert!(PropsDiff::between(&previous, &next, false, false).remount);

        let mut next = previous.clone();
        next.with_credentials = !previous.with_credentials;
        assert!(PropsDiff::between(&previous, &next, false, false).remount);
    }

    #[test]
    fn mounts_once_target_exists() {
        let (factory, engines) = recording_factory();
        let mut app = test_app(factory);
        let entity = app.world_mut().spawn(SphereViewer::new("a.jpg")).id();

        app.update();
        assert_eq!(engines.count(), 0);

        app.world_mut()
            .entity_mut(entity)
            .insert(MountTarget(entity));
        app.update();
        app.update();

        assert_eq!(engines.count(), 1);
        assert!(app.world().get::<ViewerEngine>(entity).is_some());
        assert!(app.world().get::<LittlePlanet>(entity).is_none());
    }

    #[test]
    fn missing_target_defers_mount() {
        let (factory, engines) = recording_factory();
        let mut app = test_app(factory);
        let container = app.world_mut().spawn_empty().id();
        app.world_mut().despawn(container);
        app.world_mut()
            .spawn((SphereViewer::new("a.jpg"), MountTarget(container)));

        app.update();

        assert_eq!(engines.count(), 0);
    }

    #[test]
    fn little_planet_viewer_starts_armed() {
        let (factory, engines) = recording_factory();
        let mut app = test_app(factory);
        let entity = spawn_mounted(&mut app, SphereViewer::new("a.jpg").with_little_planet(true));

        assert!(app.world().get::<LittlePlanet>(entity).is_some());
        let state = engines.last();
        let state = state.lock().unwrap();
        assert_eq!(state.config.max_fov, 130.0);
        assert!(!state.config.mousewheel);
    }

    #[test]
    fn source_change_swaps_panorama_in_place() {
        let (factory, engines) = recording_factory();
        let mut app = test_app(factory);
        let entity = spawn_mounted(&mut app, SphereViewer::new("a.jpg"));

        app.world_mut()
            .get_mut::<SphereViewer>(entity)
            .unwrap()
            .src = "b.jpg".into();
        app.update();

        assert_eq!(engines.count(), 1);
        let state = engines.last();
        let state = state.lock().unwrap();
        assert_eq!(state.calls, vec![EngineCall::SetPanorama("b.jpg".into())]);
    }

    #[test]
    fn option_and_size_changes_apply_in_place() {
        let (factory, engines) = recording_factory();
        let mut app = test_app(factory);
        let entity = spawn_mounted(&mut app, SphereViewer::new("a.jpg").with_height("400px"));

        {
            let mut viewer = app.world_mut().get_mut::<SphereViewer>(entity).unwrap();
            viewer.height = "600px".into();
            viewer.options.mousewheel = Some(false);
        }
        app.update();

        assert_eq!(engines.count(), 1);
        let state = engines.last();
        let state = state.lock().unwrap();
        assert_eq!(
            state.calls,
            vec![
                EngineCall::Resize(CssSize::new("100px", "600px")),
                EngineCall::SetOption(ViewerOption::Mousewheel(false)),
            ]
        );
    }

    #[test]
    fn unchanged_reinsert_makes_no_calls() {
        let (factory, engines) = recording_factory();
        let mut app = test_app(factory);
        let viewer = SphereViewer::new("a.jpg").with_little_planet(true);
        let entity = spawn_mounted(&mut app, viewer.clone());

        app.world_mut().entity_mut(entity).insert(viewer);
        app.update();

        assert!(engines.last().lock().unwrap().calls.is_empty());
    }

    #[test]
    fn mount_target_change_rebuilds_engine() {
        let (factory, engines) = recording_factory();
        let mut app = test_app(factory);
        let entity = spawn_mounted(&mut app, SphereViewer::new("a.jpg"));
        let other = app.world_mut().spawn_empty().id();

        app.world_mut()
            .entity_mut(entity)
            .insert(MountTarget(other));
        app.update();

        assert_eq!(engines.count(), 2);
        assert!(engines.get(0).lock().unwrap().is_destroyed());
        assert_eq!(engines.get(1).lock().unwrap().config.container, other);
        assert_eq!(app.world().get::<ViewerEngine>(entity).unwrap().mount(), other);
    }

    #[test]
    fn little_planet_toggle_rebuilds_engine() {
        let (factory, engines) = recording_factory();
        let mut app = test_app(factory);
        let entity = spawn_mounted(&mut app, SphereViewer::new("a.jpg"));

        app.world_mut()
            .get_mut::<SphereViewer>(entity)
            .unwrap()
            .little_planet = true;
        app.update();

        assert_eq!(engines.count(), 2);
        assert!(engines.get(0).lock().unwrap().is_destroyed());
        assert!(app.world().get::<LittlePlanet>(entity).is_some());
    }

    #[test]
    #[should_panic]
    fn construction_failure_reaches_error_handler() {
        let mut app = test_app(failing_factory());
        let entity = app.world_mut().spawn(SphereViewer::new("a.jpg")).id();
        app.world_mut()
            .entity_mut(entity)
            .insert(MountTarget(entity));

        app.update();
    }

    #[test]
    fn credentials_change_rebuilds_engine() {
        let (factory, engines) = recording_factory();
        let mut app = test_app(factory);
        let entity = spawn_mounted(&mut app, SphereViewer::new("a.jpg"));

        app.world_mut()
            .get_mut::<SphereViewer>(entity)
            .unwrap()
            .options
            .with_credentials = Some(true);
        app.update();

        assert_eq!(engines.count(), 2);
        assert!(engines.get(0).lock().unwrap().is_destroyed());
        assert!(engines.last().lock().unwrap().config.with_credentials);
    }

    #[test]
    fn failed_construction_does_not_block_other_viewers() {
        let (recording, engines) = recording_factory();
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();
        let factory = EngineFactory::new(move |config| {
            if config.panorama == PanoramaSource::from("bad.jpg") {
                counter.fetch_add(1, Ordering::SeqCst);
                return Err(ViewerError::Construction {
                    target: config.container,
                    reason: "unreadable panorama".into(),
                });
            }
            recording.create(config)
        });
        let mut app = test_app(factory);
        app.set_error_handler(bevy::ecs::error::warn);

        let bad = app.world_mut().spawn(SphereViewer::new("bad.jpg")).id();
        let good = app.world_mut().spawn(SphereViewer::new("good.jpg")).id();
        app.world_mut().entity_mut(bad).insert(MountTarget(bad));
        app.world_mut().entity_mut(good).insert(MountTarget(good));

        app.update();
        app.update();
        app.update();

        assert!(app.world().get::<ViewerEngine>(good).is_some());
        assert!(app.world().get::<ViewerEngine>(bad).is_none());
        assert!(app.world().get::<MountFailed>(bad).is_some());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert_eq!(engines.count(), 1);

        app.world_mut().get_mut::<SphereViewer>(bad).unwrap().src = "fixed.jpg".into();
        app.update();
        app.update();

        assert!(app.world().get::<ViewerEngine>(bad).is_some());
        assert!(app.world().get::<MountFailed>(bad).is_none());
        assert_eq!(engines.count(), 2);
    }
}
