// bevy_sphere_viewer
// Declarative 360-degree panorama viewer for Bevy apps, providing:
// - Engine lifecycle bound to viewer entities (mount, in-place updates, remount)
// - Commands and notifications bridged through entity events
// - Little planet intro transition and navbar button injection

use bevy::prelude::*;

mod components;
mod config;
mod engine;
mod error;
mod events;
mod handle;
mod lifecycle;
mod little_planet;
mod navbar;
mod notifications;
mod observers;
pub mod prelude;
#[cfg(test)]
mod test_support;

// Public API - Components
pub use components::MountFailed;
pub use components::MountTarget;
pub use components::SphereViewer;
pub use components::ViewerCallbacks;
pub use components::ViewerEngine;
pub use components::ViewerNavbar;
pub use little_planet::LittlePlanet;
pub use little_planet::LittlePlanetPhase;

// Public API - Configuration
pub use config::CssSize;
pub use config::CubemapFaces;
pub use config::PanoramaSource;
pub use config::PluginRegistration;
pub use config::SphereCorrection;
pub use config::ViewerConfig;
pub use config::ViewerOption;
pub use config::ViewerProps;
pub use config::adapt_config;

// Public API - Navbar
pub use navbar::ButtonAction;
pub use navbar::HIDE_NAVBAR_BUTTON_ID;
pub use navbar::Navbar;
pub use navbar::NavbarButton;
pub use navbar::NavbarInput;
pub use navbar::NavbarItem;
pub use navbar::RESET_LITTLE_PLANET_BUTTON_ID;
pub use navbar::filter_navbar;

// Public API - Engine boundary
pub use engine::AnimateOptions;
pub use engine::AnimationSpeed;
pub use engine::AnimationTicket;
pub use engine::Autorotate;
pub use engine::ClickData;
pub use engine::EngineFactory;
pub use engine::EngineNotification;
pub use engine::EnginePlugin;
pub use engine::PanoramaEngine;
pub use engine::PanoramaOptions;
pub use engine::Position;
pub use engine::TooltipConfig;
pub use engine::TooltipId;
pub use engine::ViewerSize;
pub use error::ViewerError;

// Public API - Events
pub use events::EngineCommand;
pub use events::IssueCommand;
pub use events::LittlePlanetSettled;
pub use events::ViewerClicked;
pub use events::ViewerDoubleClicked;
pub use events::ViewerMounted;
pub use events::ViewerPositionUpdated;
pub use events::ViewerReady;
pub use events::ViewerZoomUpdated;

// Public API - Imperative access
pub use handle::ViewerHandle;
pub use handle::Viewers;

// Public API - Configuration resources
pub use little_planet::LittlePlanetCeiling;
pub use little_planet::LittlePlanetConfig;

// Internal - used by plugin, not for external use
use lifecycle::{mount_viewers, remount_on_target_change, retry_failed_mounts, sync_viewer_props};
use little_planet::{apply_ceiling_to_armed, track_viewport_aspect};
use notifications::forward_engine_notifications;
use observers::{
    destroy_engine_on_remove, on_issue_command, unmount_on_target_removed,
    unmount_on_viewer_removed,
};

/// Plugin that drives panorama engines for `SphereViewer` entities.
pub struct SphereViewerPlugin {
    factory: EngineFactory,
}

impl SphereViewerPlugin {
    pub const fn new(factory: EngineFactory) -> Self { Self { factory } }
}

impl Plugin for SphereViewerPlugin {
    fn build(&self, app: &mut App) {
        app
            // Register observers for component lifecycle events
            .add_observer(unmount_on_viewer_removed)
            .add_observer(unmount_on_target_removed)
            .add_observer(destroy_engine_on_remove)
            // Register observers for custom events
            .add_observer(on_issue_command)
            // Add systems
            .add_systems(
                Update,
                (
                    track_viewport_aspect,
                    apply_ceiling_to_armed,
                    remount_on_target_change,
                    sync_viewer_props,
                    retry_failed_mounts,
                    mount_viewers,
                    forward_engine_notifications,
                )
                    .chain(),
            )
            // Initialize resources
            .insert_resource(self.factory.clone())
            .init_resource::<LittlePlanetConfig>()
            .init_resource::<LittlePlanetCeiling>()
            .register_type::<MountTarget>()
            .register_type::<MountFailed>()
            .register_type::<LittlePlanet>()
            .register_type::<LittlePlanetConfig>()
            .register_type::<LittlePlanetCeiling>();
    }
}
