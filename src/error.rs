//! Errors surfaced by the viewer lifecycle.

use bevy::prelude::*;
use thiserror::Error;

/// Failures raised while mounting a panorama engine.
/// Returned from fallible systems through Bevy's `Result`.
#[derive(Debug, Error)]
pub enum ViewerError {
    /// The engine factory rejected the configuration.
    #[error("failed to construct panorama engine in {target:?}: {reason}")]
    Construction { target: Entity, reason: String },
}
