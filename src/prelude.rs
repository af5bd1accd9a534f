//! Convenient re-exports for common types and traits

pub use crate::SphereViewerPlugin;
pub use crate::components::MountTarget;
pub use crate::components::SphereViewer;
pub use crate::config::CssSize;
pub use crate::config::PanoramaSource;
pub use crate::config::PluginRegistration;
pub use crate::config::ViewerOption;
pub use crate::config::ViewerProps;
pub use crate::engine::AnimateOptions;
pub use crate::engine::AnimationSpeed;
pub use crate::engine::EngineFactory;
pub use crate::engine::PanoramaEngine;
pub use crate::engine::Position;
pub use crate::error::ViewerError;
pub use crate::events::EngineCommand;
pub use crate::events::IssueCommand;
pub use crate::events::LittlePlanetSettled;
pub use crate::events::ViewerClicked;
pub use crate::events::ViewerDoubleClicked;
pub use crate::events::ViewerPositionUpdated;
pub use crate::events::ViewerReady;
pub use crate::events::ViewerZoomUpdated;
pub use crate::handle::ViewerHandle;
pub use crate::handle::Viewers;
pub use crate::navbar::NavbarButton;
pub use crate::navbar::NavbarInput;
