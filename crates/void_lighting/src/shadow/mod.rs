//! Directional Shadow System
//!
//! Backend-agnostic cascaded shadow preparation for directional lights.
//!
//! # Architecture
//!
//! The shadow system is split into:
//!
//! - **Config**: Shadow distance, atlas size, filtering and cascade settings
//! - **Budget**: Per-frame shadow reservations and per-light shadow data
//! - **Cascade**: Culling spheres and cascade data for shading
//! - **Atlas**: Tile partitioning and world-to-atlas matrices
//! - **Data**: GPU-ready uniform block
//! - **Renderer**: Drives the culler and graphics context for one frame
//!
//! # Usage
//!
//! ```ignore
//! use void_lighting::shadow::*;
//!
//! let mut shadows = ShadowAtlasRenderer::new(PlatformCapabilities::default());
//!
//! // Per frame
//! shadows.setup(&settings);
//! for (i, light) in culler.visible_lights().iter().enumerate() {
//!     let data = shadows.planner_mut().reserve_directional(&culler, light, i);
//!     // ... store data in the light slot
//! }
//! shadows.render(&culler, &mut context)?;
//!
//! // After the camera has finished rendering
//! shadows.cleanup(&mut context);
//! ```
//!
//! # Hot-Reload Support
//!
//! Shadow settings support serde serialization. The atlas texture is
//! allocated per frame, so nothing needs recreating after a reload.

pub mod config;
pub mod budget;
pub mod cascade;
pub mod atlas;
pub mod data;
pub mod renderer;

// Re-exports
pub use config::{
    ShadowSettings,
    DirectionalShadowSettings,
    AtlasSize,
    FilterMode,
    CascadeBlendMode,
    ShadowmaskMode,
    PlatformCapabilities,
    MAX_CASCADES,
};

pub use budget::{
    ShadowBudgetPlanner,
    ShadowedDirectionalLight,
    MAX_SHADOWED_DIRECTIONAL_LIGHTS,
    NO_SHADOW,
};

pub use cascade::ShadowCascades;

pub use atlas::{
    AtlasLayout,
    to_atlas_matrix,
};

pub use data::{
    GpuShadowUniforms,
    MAX_SHADOW_MATRICES,
};

pub use renderer::{
    ShadowAtlasRenderer,
    ShadowStats,
    DIRECTIONAL_SHADOW_ATLAS_HANDLE,
};
