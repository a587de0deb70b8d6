//! # void_lighting - Per-Frame Light and Shadow Preparation
//!
//! Backend-agnostic preparation of everything shading needs to light a
//! camera's view:
//! - Fixed-capacity light slots (4 directional, 64 point/spot)
//! - Shadow budget with per-light shadow data
//! - Cascaded directional shadows packed into a shared atlas
//! - Shader keyword groups for filtering, cascade blending and shadow masks
//!
//! ## Architecture
//!
//! The crate never talks to a graphics API directly. Two traits sit at the
//! seams:
//!
//! 1. **ShadowCuller**: visible lights, caster bounds and cascade matrices
//! 2. **GraphicsContext**: atlas allocation, draws, uniforms and keywords
//!
//! [`CommandRecorder`] implements `GraphicsContext` by recording commands, for
//! backends that replay them later and for tests.
//!
//! ## Example
//!
//! ```ignore
//! use void_lighting::prelude::*;
//!
//! let mut lighting = Lighting::new(LightingConfig::default());
//! let mut recorder = CommandRecorder::new();
//!
//! // Per camera
//! lighting.setup(&mut recorder, &mut culler, &settings, false)?;
//! backend.replay(recorder.drain());
//! // ... draw geometry
//! lighting.cleanup(&mut recorder);
//! ```

pub mod error;
pub mod math;
pub mod light;
pub mod context;
pub mod keywords;
pub mod light_buffer;
pub mod shadow;
pub mod lighting;

pub use error::{LightingError, Result};

pub use light::{
    VisibleLight, LightKind, LightShadows, LightBaking, LightmapBakeType, MixedLightingMode,
};

pub use context::{
    ShadowCuller, GraphicsContext, CommandRecorder, RenderCommand,
    TextureHandle, AtlasDesc, Viewport, Bounds, CascadeRequest, ShadowSplit, ShadowDrawRequest,
};

pub use keywords::{
    KeywordGroup, DirectionalFilterKeyword, CascadeBlendKeyword, ShadowMaskKeyword,
    mode_flags, apply_keyword_group, LIGHTS_PER_OBJECT_KEYWORD,
};

pub use light_buffer::{
    LightClassifier, LightBufferStats, GpuDirectionalLights, GpuOtherLights,
    MAX_DIRECTIONAL_LIGHTS, MAX_OTHER_LIGHTS,
};

pub use shadow::{
    // Config
    ShadowSettings, DirectionalShadowSettings, AtlasSize, FilterMode, CascadeBlendMode,
    ShadowmaskMode, PlatformCapabilities, MAX_CASCADES,
    // Budget
    ShadowBudgetPlanner, ShadowedDirectionalLight, MAX_SHADOWED_DIRECTIONAL_LIGHTS, NO_SHADOW,
    // Cascades and atlas
    ShadowCascades, AtlasLayout,
    // GPU Data
    GpuShadowUniforms, MAX_SHADOW_MATRICES,
    // Rendering
    ShadowAtlasRenderer, ShadowStats, DIRECTIONAL_SHADOW_ATLAS_HANDLE,
};

pub use lighting::{Lighting, LightingConfig, LightingStats};

/// Prelude - commonly used types
pub mod prelude {
    pub use crate::context::{ShadowCuller, GraphicsContext, CommandRecorder};
    pub use crate::light::{VisibleLight, LightKind, LightShadows, LightBaking};
    pub use crate::lighting::{Lighting, LightingConfig};
    pub use crate::shadow::config::{
        ShadowSettings, DirectionalShadowSettings, PlatformCapabilities,
    };
    pub use crate::error::{LightingError, Result};
}
