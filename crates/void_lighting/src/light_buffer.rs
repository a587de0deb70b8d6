//! Light Slot Buffers
//!
//! Classifies visible lights into fixed-capacity parallel arrays read by
//! shading:
//! - Directional lights: 4 slots (color, direction, shadow data)
//! - Other lights (point and spot): 64 slots (color, position + 1/range^2,
//!   direction, spot angle falloff, shadow data)
//!
//! Lights beyond capacity are dropped in visibility order; nothing is
//! reordered by importance. Arrays are fully rewritten each frame.

use serde::{Serialize, Deserialize};

use crate::context::{GraphicsContext, ShadowCuller};
use crate::light::{LightKind, VisibleLight};
use crate::shadow::budget::{ShadowBudgetPlanner, NO_SHADOW};

/// Maximum directional lights
pub const MAX_DIRECTIONAL_LIGHTS: usize = 4;
/// Maximum point and spot lights
pub const MAX_OTHER_LIGHTS: usize = 64;

pub const DIRECTIONAL_LIGHT_COUNT: &str = "_DirectionalLightCount";
pub const DIRECTIONAL_LIGHT_COLORS: &str = "_DirectionalLightColors";
pub const DIRECTIONAL_LIGHT_DIRECTIONS: &str = "_DirectionalLightDirections";
pub const DIRECTIONAL_LIGHT_SHADOW_DATA: &str = "_DirectionalLightShadowData";
pub const OTHER_LIGHT_COUNT: &str = "_OtherLightCount";
pub const OTHER_LIGHT_COLORS: &str = "_OtherLightColors";
pub const OTHER_LIGHT_POSITIONS: &str = "_OtherLightPositions";
pub const OTHER_LIGHT_DIRECTIONS: &str = "_OtherLightDirections";
pub const OTHER_LIGHT_SPOT_ANGLES: &str = "_OtherLightSpotAngles";
pub const OTHER_LIGHT_SHADOW_DATA: &str = "_OtherLightShadowData";

/// Spot angle data of a point light: always fully lit
const POINT_SPOT_ANGLE: [f32; 4] = [0.0, 1.0, 0.0, 0.0];

/// GPU-ready directional light arrays
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuDirectionalLights {
    /// Final colors (linear RGB)
    pub colors: [[f32; 4]; MAX_DIRECTIONAL_LIGHTS],
    /// Directions toward which the light travels
    pub directions: [[f32; 4]; MAX_DIRECTIONAL_LIGHTS],
    /// `(strength, atlas_base_tile, normal_bias, mask_channel)`
    pub shadow_data: [[f32; 4]; MAX_DIRECTIONAL_LIGHTS],
    /// Active slots
    pub count: i32,
    /// Padding for alignment
    pub _pad: [i32; 3],
}

/// GPU-ready point and spot light arrays
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuOtherLights {
    /// Final colors (linear RGB)
    pub colors: [[f32; 4]; MAX_OTHER_LIGHTS],
    /// World position, w = 1 / max(range^2, 1e-5)
    pub positions: [[f32; 4]; MAX_OTHER_LIGHTS],
    /// Spot directions
    pub directions: [[f32; 4]; MAX_OTHER_LIGHTS],
    /// `(1 / (inner_cos - outer_cos), -outer_cos / (inner_cos - outer_cos))`
    pub spot_angles: [[f32; 4]; MAX_OTHER_LIGHTS],
    /// `(strength, 0, 0, mask_channel)`
    pub shadow_data: [[f32; 4]; MAX_OTHER_LIGHTS],
    /// Active slots
    pub count: i32,
    /// Padding for alignment
    pub _pad: [i32; 3],
}

impl GpuDirectionalLights {
    /// Size in bytes (must be 16-byte aligned)
    pub const SIZE: usize = core::mem::size_of::<Self>();
}

impl GpuOtherLights {
    /// Size in bytes (must be 16-byte aligned)
    pub const SIZE: usize = core::mem::size_of::<Self>();
}

/// Per-frame classification statistics
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LightBufferStats {
    /// Directional lights written
    pub directional_count: u32,
    /// Point lights written
    pub point_count: u32,
    /// Spot lights written
    pub spot_count: u32,
    /// Lights over limit (dropped)
    pub overflow_count: u32,
}

/// Classifies visible lights into slot arrays
#[derive(Clone, Debug)]
pub struct LightClassifier {
    directional: GpuDirectionalLights,
    other: GpuOtherLights,
    /// Visible light index -> compact other-light index, or -1
    index_map: Vec<i32>,
    stats: LightBufferStats,
}

impl Default for LightClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl LightClassifier {
    /// Create an empty classifier
    pub fn new() -> Self {
        Self {
            directional: bytemuck::Zeroable::zeroed(),
            other: bytemuck::Zeroable::zeroed(),
            index_map: Vec::new(),
            stats: LightBufferStats::default(),
        }
    }

    /// Classify the visible lights, reserving shadows along the way.
    ///
    /// With `build_index_map` the visible-to-compact index map is written and
    /// handed to the culler.
    pub fn classify<C: ShadowCuller + ?Sized>(
        &mut self,
        culler: &mut C,
        planner: &mut ShadowBudgetPlanner,
        build_index_map: bool,
    ) {
        let mut dir_count = 0usize;
        let mut other_count = 0usize;
        self.directional = bytemuck::Zeroable::zeroed();
        self.other = bytemuck::Zeroable::zeroed();
        self.stats = LightBufferStats::default();
        self.index_map.clear();

        for (i, light) in culler.visible_lights().iter().enumerate() {
            let mut new_index = -1;

            match light.kind {
                LightKind::Directional => {
                    if dir_count < MAX_DIRECTIONAL_LIGHTS {
                        let shadow = planner.reserve_directional(&*culler, light, i);
                        self.setup_directional(dir_count, light, shadow);
                        dir_count += 1;
                        self.stats.directional_count += 1;
                    } else {
                        self.stats.overflow_count += 1;
                    }
                }
                LightKind::Point => {
                    if other_count < MAX_OTHER_LIGHTS {
                        new_index = other_count as i32;
                        let shadow = planner.reserve_other(light, i);
                        self.setup_point(other_count, light, shadow);
                        other_count += 1;
                        self.stats.point_count += 1;
                    } else {
                        self.stats.overflow_count += 1;
                    }
                }
                LightKind::Spot => {
                    if other_count < MAX_OTHER_LIGHTS {
                        new_index = other_count as i32;
                        let shadow = planner.reserve_other(light, i);
                        self.setup_spot(other_count, light, shadow);
                        other_count += 1;
                        self.stats.spot_count += 1;
                    } else {
                        self.stats.overflow_count += 1;
                    }
                }
            }

            if build_index_map {
                self.index_map.push(new_index);
            }
        }

        self.directional.count = dir_count as i32;
        self.other.count = other_count as i32;

        if self.stats.overflow_count > 0 {
            log::debug!("{} visible lights over slot capacity dropped", self.stats.overflow_count);
        }

        if build_index_map {
            culler.set_light_index_map(&self.index_map);
        }
    }

    fn setup_directional(&mut self, index: usize, light: &VisibleLight, shadow: [f32; 4]) {
        self.directional.colors[index] = light.final_color;
        self.directional.directions[index] = light.direction();
        self.directional.shadow_data[index] = shadow;
    }

    fn setup_point(&mut self, index: usize, light: &VisibleLight, shadow: [f32; 4]) {
        self.other.colors[index] = light.final_color;
        self.other.positions[index] = position_with_range(light);
        self.other.directions[index] = [0.0; 4];
        self.other.spot_angles[index] = POINT_SPOT_ANGLE;
        self.other.shadow_data[index] = shadow;
    }

    fn setup_spot(&mut self, index: usize, light: &VisibleLight, shadow: [f32; 4]) {
        self.other.colors[index] = light.final_color;
        self.other.positions[index] = position_with_range(light);
        self.other.directions[index] = light.direction();
        self.other.spot_angles[index] = spot_angle_data(light.inner_spot_angle, light.spot_angle);
        self.other.shadow_data[index] = shadow;
    }

    /// Upload light counts and the active arrays
    pub fn upload<G: GraphicsContext + ?Sized>(&self, context: &mut G) {
        let dir_count = self.directional.count;
        context.set_global_int(DIRECTIONAL_LIGHT_COUNT, dir_count);
        if dir_count > 0 {
            context.set_global_vector_array(DIRECTIONAL_LIGHT_COLORS, &self.directional.colors);
            context.set_global_vector_array(DIRECTIONAL_LIGHT_DIRECTIONS, &self.directional.directions);
            context.set_global_vector_array(DIRECTIONAL_LIGHT_SHADOW_DATA, &self.directional.shadow_data);
        }

        let other_count = self.other.count;
        context.set_global_int(OTHER_LIGHT_COUNT, other_count);
        if other_count > 0 {
            context.set_global_vector_array(OTHER_LIGHT_COLORS, &self.other.colors);
            context.set_global_vector_array(OTHER_LIGHT_POSITIONS, &self.other.positions);
            context.set_global_vector_array(OTHER_LIGHT_DIRECTIONS, &self.other.directions);
            context.set_global_vector_array(OTHER_LIGHT_SPOT_ANGLES, &self.other.spot_angles);
            context.set_global_vector_array(OTHER_LIGHT_SHADOW_DATA, &self.other.shadow_data);
        }
    }

    /// Directional light arrays
    pub fn directional(&self) -> &GpuDirectionalLights {
        &self.directional
    }

    /// Point and spot light arrays
    pub fn other(&self) -> &GpuOtherLights {
        &self.other
    }

    /// Active directional slots
    pub fn directional_count(&self) -> usize {
        self.directional.count as usize
    }

    /// Active other-light slots
    pub fn other_count(&self) -> usize {
        self.other.count as usize
    }

    /// Index map written by the last classification (empty when disabled)
    pub fn index_map(&self) -> &[i32] {
        &self.index_map
    }

    /// Statistics of the last classification
    pub fn stats(&self) -> &LightBufferStats {
        &self.stats
    }

    /// Directional arrays as bytes for GPU upload
    pub fn directional_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(&self.directional)
    }

    /// Other light arrays as bytes for GPU upload
    pub fn other_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(&self.other)
    }

    /// Shadow data of a directional slot, `NO_SHADOW` for inactive slots
    pub fn directional_shadow_data(&self, slot: usize) -> [f32; 4] {
        if slot < self.directional_count() {
            self.directional.shadow_data[slot]
        } else {
            NO_SHADOW
        }
    }
}

/// Position with the inverse squared range packed into w
fn position_with_range(light: &VisibleLight) -> [f32; 4] {
    let mut position = light.position();
    position[3] = 1.0 / (light.range * light.range).max(0.00001);
    position
}

/// Spot falloff coefficients `(a, b)` so that `saturate(dot * a + b)` fades
/// from the outer to the inner cone. Angles are full cone angles in degrees.
pub fn spot_angle_data(inner_angle: f32, outer_angle: f32) -> [f32; 4] {
    let inner_cos = (0.5 * inner_angle).to_radians().cos();
    let outer_cos = (0.5 * outer_angle).to_radians().cos();
    let angle_range_inv = 1.0 / (inner_cos - outer_cos).max(0.001);
    [angle_range_inv, -outer_cos * angle_range_inv, 0.0, 0.0]
}
