//! GPU Shadow Data Structures
//!
//! CPU copy of the directional shadow uniforms. bytemuck Pod/Zeroable for
//! direct GPU upload.

use super::budget::MAX_SHADOWED_DIRECTIONAL_LIGHTS;
use super::config::MAX_CASCADES;
use crate::math::{Mat4, IDENTITY_MATRIX};

/// Atlas matrices: one per (light, cascade)
pub const MAX_SHADOW_MATRICES: usize = MAX_SHADOWED_DIRECTIONAL_LIGHTS * MAX_CASCADES;

/// Directional shadow uniforms
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuShadowUniforms {
    /// World to atlas UV + depth, indexed by tile
    pub matrices: [Mat4; MAX_SHADOW_MATRICES],

    /// Fade-adjusted culling spheres `(center.xyz, r'^2)`
    pub culling_spheres: [[f32; 4]; MAX_CASCADES],

    /// Cascade data `(1 / r'^2, filter_size * sqrt(2), 0, 0)`
    pub cascade_data: [[f32; 4]; MAX_CASCADES],

    /// `(1 / max_distance, 1 / distance_fade, 1 / (1 - f^2), 0)`
    pub distance_fade: [f32; 4],

    /// `(size, 1 / size, 0, 0)`
    pub atlas_size: [f32; 4],

    /// Active cascade count
    pub cascade_count: i32,

    /// Padding to align to 16 bytes
    pub _pad: [i32; 3],
}

impl Default for GpuShadowUniforms {
    fn default() -> Self {
        Self {
            matrices: [IDENTITY_MATRIX; MAX_SHADOW_MATRICES],
            culling_spheres: [[0.0; 4]; MAX_CASCADES],
            cascade_data: [[0.0; 4]; MAX_CASCADES],
            distance_fade: [0.0; 4],
            atlas_size: [1.0, 1.0, 0.0, 0.0],
            cascade_count: 0,
            _pad: [0; 3],
        }
    }
}

impl GpuShadowUniforms {
    /// Size in bytes (must be 16-byte aligned)
    pub const SIZE: usize = core::mem::size_of::<Self>();

    /// Atlas size vector
    pub fn atlas_size_vector(size: u32) -> [f32; 4] {
        [size as f32, 1.0 / size as f32, 0.0, 0.0]
    }

    /// Bytes for GPU upload
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gpu_shadow_uniforms_size() {
        assert_eq!(GpuShadowUniforms::SIZE % 16, 0);
        assert_eq!(GpuShadowUniforms::default().as_bytes().len(), GpuShadowUniforms::SIZE);
    }

    #[test]
    fn test_atlas_size_vector() {
        let v = GpuShadowUniforms::atlas_size_vector(2048);
        assert_eq!(v[0], 2048.0);
        assert!((v[1] - 1.0 / 2048.0).abs() < 1e-9);
    }
}
