//! Visible light description
//!
//! The read-only per-light input produced by the visibility culler. Only the
//! fields the lighting and shadow preparation needs are carried.

use serde::{Serialize, Deserialize};

use crate::math::{Mat4, IDENTITY_MATRIX};

/// Light type
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LightKind {
    /// Infinitely distant light (sun)
    Directional,
    /// Omnidirectional light with a range
    Point,
    /// Cone light with a range
    Spot,
}

/// Realtime shadow type of a light
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LightShadows {
    /// Light casts no shadows
    #[default]
    None,
    /// Hard shadows
    Hard,
    /// Soft shadows
    Soft,
}

/// How the light was baked
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LightmapBakeType {
    /// Fully realtime
    #[default]
    Realtime,
    /// Realtime direct, baked indirect
    Mixed,
    /// Fully baked
    Baked,
}

/// Mixed lighting mode of the scene bake
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MixedLightingMode {
    /// Only indirect light is baked
    #[default]
    IndirectOnly,
    /// Static occlusion is baked into a shadow mask
    Shadowmask,
    /// Static shadows are subtracted from lightmaps
    Subtractive,
}

/// Baking output of a light
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightBaking {
    /// Bake type
    pub bake_type: LightmapBakeType,
    /// Mixed lighting mode (only meaningful for `Mixed`)
    pub mixed_mode: MixedLightingMode,
    /// Shadow mask channel holding this light's baked occlusion
    pub occlusion_mask_channel: i32,
}

impl Default for LightBaking {
    fn default() -> Self {
        Self {
            bake_type: LightmapBakeType::Realtime,
            mixed_mode: MixedLightingMode::IndirectOnly,
            occlusion_mask_channel: -1,
        }
    }
}

impl LightBaking {
    /// Mixed light baked into a shadow mask channel
    pub fn shadowmask(channel: i32) -> Self {
        Self {
            bake_type: LightmapBakeType::Mixed,
            mixed_mode: MixedLightingMode::Shadowmask,
            occlusion_mask_channel: channel,
        }
    }

    /// Check if the light contributes to the baked shadow mask
    pub fn uses_shadow_mask(&self) -> bool {
        self.bake_type == LightmapBakeType::Mixed
            && self.mixed_mode == MixedLightingMode::Shadowmask
    }
}

/// A light that survived visibility culling for the current camera
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VisibleLight {
    /// Light type
    pub kind: LightKind,
    /// Local-to-world transform (column-major, +Z is the light's forward)
    pub local_to_world: Mat4,
    /// Final color (linear RGB premultiplied by intensity, alpha unused)
    pub final_color: [f32; 4],
    /// Range for point and spot lights
    pub range: f32,
    /// Outer spot cone angle in degrees
    pub spot_angle: f32,
    /// Inner spot cone angle in degrees
    pub inner_spot_angle: f32,
    /// Realtime shadow type
    pub shadows: LightShadows,
    /// Shadow strength (0 = no shadow, 1 = full shadow)
    pub shadow_strength: f32,
    /// Slope-scaled depth bias used while rendering casters
    pub shadow_bias: f32,
    /// Normal offset applied when sampling
    pub shadow_normal_bias: f32,
    /// Pulls the shadow near plane forward to clip large casters
    pub shadow_near_plane: f32,
    /// Baking output
    pub baking: LightBaking,
}

impl Default for VisibleLight {
    fn default() -> Self {
        Self {
            kind: LightKind::Point,
            local_to_world: IDENTITY_MATRIX,
            final_color: [1.0, 1.0, 1.0, 1.0],
            range: 10.0,
            spot_angle: 30.0,
            inner_spot_angle: 21.8,
            shadows: LightShadows::None,
            shadow_strength: 1.0,
            shadow_bias: 0.05,
            shadow_normal_bias: 0.4,
            shadow_near_plane: 0.2,
            baking: LightBaking::default(),
        }
    }
}

impl VisibleLight {
    /// Create a directional light
    pub fn directional(local_to_world: Mat4, color: [f32; 3]) -> Self {
        Self {
            kind: LightKind::Directional,
            local_to_world,
            final_color: [color[0], color[1], color[2], 1.0],
            ..Default::default()
        }
    }

    /// Create a point light
    pub fn point(local_to_world: Mat4, color: [f32; 3], range: f32) -> Self {
        Self {
            kind: LightKind::Point,
            local_to_world,
            final_color: [color[0], color[1], color[2], 1.0],
            range,
            ..Default::default()
        }
    }

    /// Create a spot light (angles in degrees, full cone)
    pub fn spot(
        local_to_world: Mat4,
        color: [f32; 3],
        range: f32,
        inner_spot_angle: f32,
        spot_angle: f32,
    ) -> Self {
        Self {
            kind: LightKind::Spot,
            local_to_world,
            final_color: [color[0], color[1], color[2], 1.0],
            range,
            spot_angle,
            inner_spot_angle,
            ..Default::default()
        }
    }

    /// Enable shadows with the given strength
    pub fn with_shadows(mut self, shadows: LightShadows, strength: f32) -> Self {
        self.shadows = shadows;
        self.shadow_strength = strength.clamp(0.0, 1.0);
        self
    }

    /// Set baking output
    pub fn with_baking(mut self, baking: LightBaking) -> Self {
        self.baking = baking;
        self
    }

    /// Check if the light wants realtime shadows at all
    pub fn casts_shadows(&self) -> bool {
        self.shadows != LightShadows::None && self.shadow_strength > 0.0
    }

    /// Direction the light travels toward, as the negated local +Z axis
    pub fn direction(&self) -> [f32; 4] {
        let z = self.local_to_world[2];
        [-z[0], -z[1], -z[2], -z[3]]
    }

    /// World-space position (translation column)
    pub fn position(&self) -> [f32; 4] {
        self.local_to_world[3]
    }
}
