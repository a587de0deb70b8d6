//! Cascaded Shadow Map Data
//!
//! Cascade geometry (view, projection, culling sphere) comes from the culler.
//! This module derives what shading needs from it:
//!
//! - the culling sphere shrunk by the filter reach and stored squared, so a
//!   fragment picks the first cascade whose sphere contains it with one
//!   distance-squared compare
//! - per-cascade data `(1 / r'^2, filter_size * sqrt(2))` for normal bias
//! - the global distance fade vector for fading at max distance and between
//!   the last cascades
//!
//! All lights share cascade spheres, so only the first reserved light writes
//! them.

use serde::{Serialize, Deserialize};

use super::config::{FilterMode, ShadowSettings, MAX_CASCADES};

/// Per-frame cascade data shared by all directional lights
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShadowCascades {
    /// Number of active cascades (1-4)
    pub count: u32,

    /// Fade-adjusted culling spheres `(center.xyz, r'^2)`
    pub culling_spheres: [[f32; 4]; MAX_CASCADES],

    /// Cascade data `(1 / r'^2, filter_size * sqrt(2), 0, 0)`
    pub data: [[f32; 4]; MAX_CASCADES],
}

impl Default for ShadowCascades {
    fn default() -> Self {
        Self {
            count: MAX_CASCADES as u32,
            culling_spheres: [[0.0; 4]; MAX_CASCADES],
            data: [[0.0; 4]; MAX_CASCADES],
        }
    }
}

impl ShadowCascades {
    /// Create new cascades with the given count
    pub fn new(count: u32) -> Self {
        Self {
            count: count.clamp(1, MAX_CASCADES as u32),
            ..Default::default()
        }
    }

    /// Clear all cascade data for a new frame
    pub fn reset(&mut self, count: u32) {
        *self = Self::new(count);
    }

    /// Store the fade-adjusted sphere and data for one cascade
    pub fn set_cascade(
        &mut self,
        index: usize,
        culling_sphere: [f32; 4],
        tile_size: f32,
        filter: FilterMode,
    ) {
        let (sphere, data) = Self::calculate_cascade(culling_sphere, tile_size, filter);
        self.culling_spheres[index] = sphere;
        self.data[index] = data;
    }

    /// Shrink a culling sphere by the filter reach.
    ///
    /// Returns the stored sphere `(center, r'^2)` and the cascade data vector.
    pub fn calculate_cascade(
        culling_sphere: [f32; 4],
        tile_size: f32,
        filter: FilterMode,
    ) -> ([f32; 4], [f32; 4]) {
        let texel_size = 2.0 * culling_sphere[3] / tile_size;
        let filter_size = texel_size * (filter.ordinal() as f32 + 1.0);

        let radius = culling_sphere[3] - filter_size;
        let radius_sq = radius * radius;

        let sphere = [culling_sphere[0], culling_sphere[1], culling_sphere[2], radius_sq];
        let data = [1.0 / radius_sq, filter_size * core::f32::consts::SQRT_2, 0.0, 0.0];
        (sphere, data)
    }

    /// Distance fade vector `(1 / max_distance, 1 / distance_fade, 1 / (1 - f^2), 0)`
    /// with `f = 1 - cascade_fade`
    pub fn distance_fade(settings: &ShadowSettings) -> [f32; 4] {
        let f = 1.0 - settings.directional.cascade_fade;
        [
            1.0 / settings.max_distance,
            1.0 / settings.distance_fade,
            1.0 / (1.0 - f * f),
            0.0,
        ]
    }

    /// Fraction of a cascade sphere used to cull casters already covered by
    /// the previous cascade
    pub fn blend_culling_factor(cascade_fade: f32) -> f32 {
        (0.8 - cascade_fade).max(0.0)
    }

    /// Active culling spheres
    pub fn active_spheres(&self) -> &[[f32; 4]] {
        &self.culling_spheres[..self.count as usize]
    }
}
