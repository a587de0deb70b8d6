//! Error types for light and shadow preparation
//!
//! Nothing in the steady-state path fails: budget overflow and degenerate
//! caster bounds are handled by sentinel values. These errors only come from
//! collaborators (culler, graphics backend) or from malformed configuration.

use thiserror::Error;

/// Lighting preparation error
#[derive(Debug, Error)]
pub enum LightingError {
    #[error("Shadow culling failed for visible light {visible_light_index}, cascade {cascade_index}")]
    CullingFailed {
        visible_light_index: usize,
        cascade_index: u32,
    },

    #[error("Shadow atlas allocation failed: {0}")]
    TextureAllocation(String),

    #[error("Invalid lighting configuration: {0}")]
    Config(#[from] serde_json::Error),
}

/// Result type alias
pub type Result<T> = core::result::Result<T, LightingError>;
