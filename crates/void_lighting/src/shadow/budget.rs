//! Shadow Budget
//!
//! Decides, per frame, which lights get one of the fixed shadow reservations
//! and encodes the per-light shadow data vector read by shading:
//!
//! `(strength, atlas_base_tile, normal_bias, mask_channel)`
//!
//! - `(0, 0, 0, -1)`: no shadows at all
//! - negative strength: realtime shadow unavailable (budget exhausted or no
//!   casters) but the baked shadow mask channel still applies
//! - positive strength: reserved; cascades start at `atlas_base_tile`

use serde::{Serialize, Deserialize};

use crate::context::ShadowCuller;
use crate::light::VisibleLight;

/// Maximum directional lights with realtime shadows
pub const MAX_SHADOWED_DIRECTIONAL_LIGHTS: usize = 4;

/// Shadow data of a light without shadows
pub const NO_SHADOW: [f32; 4] = [0.0, 0.0, 0.0, -1.0];

/// A directional light holding a shadow reservation
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ShadowedDirectionalLight {
    /// Index into the visible light list
    pub visible_light_index: usize,
    /// Slope-scaled depth bias used while rendering casters
    pub slope_scale_bias: f32,
    /// Near plane offset passed to the culler
    pub near_plane_offset: f32,
}

/// Per-frame shadow reservation table
#[derive(Clone, Debug, Default)]
pub struct ShadowBudgetPlanner {
    /// Reservations, valid up to `shadowed_directional_count`
    shadowed_directional: [ShadowedDirectionalLight; MAX_SHADOWED_DIRECTIONAL_LIGHTS],
    shadowed_directional_count: usize,
    /// Cascades per directional light this frame
    cascade_count: u32,
    /// Some reserved or skipped light uses the baked shadow mask
    use_shadow_mask: bool,
    /// Eligible directional lights that could not be reserved
    rejected_directional: u32,
}

impl ShadowBudgetPlanner {
    /// Create an empty planner
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset all reservations for a new frame
    pub fn begin_frame(&mut self, cascade_count: u32) {
        self.shadowed_directional_count = 0;
        self.cascade_count = cascade_count;
        self.use_shadow_mask = false;
        self.rejected_directional = 0;
    }

    /// Try to reserve a directional shadow for a visible light
    pub fn reserve_directional<C: ShadowCuller + ?Sized>(
        &mut self,
        culler: &C,
        light: &VisibleLight,
        visible_light_index: usize,
    ) -> [f32; 4] {
        if !light.casts_shadows() {
            return NO_SHADOW;
        }

        let mask_channel = self.mask_channel(light);

        if self.shadowed_directional_count >= MAX_SHADOWED_DIRECTIONAL_LIGHTS {
            log::debug!(
                "Directional shadow budget exhausted, light {} falls back to shadow mask",
                visible_light_index
            );
            self.rejected_directional += 1;
            return [-light.shadow_strength, 0.0, 0.0, mask_channel];
        }

        if culler.shadow_caster_bounds(visible_light_index).is_none() {
            log::trace!("Light {} has no shadow casters in view", visible_light_index);
            self.rejected_directional += 1;
            return [-light.shadow_strength, 0.0, 0.0, mask_channel];
        }

        let index = self.shadowed_directional_count;
        self.shadowed_directional[index] = ShadowedDirectionalLight {
            visible_light_index,
            slope_scale_bias: light.shadow_bias,
            near_plane_offset: light.shadow_near_plane,
        };
        self.shadowed_directional_count += 1;

        [
            light.shadow_strength,
            (self.cascade_count as usize * index) as f32,
            light.shadow_normal_bias,
            mask_channel,
        ]
    }

    /// Shadow data for a point or spot light.
    ///
    /// These never receive atlas space; only the baked shadow mask applies.
    pub fn reserve_other(&mut self, light: &VisibleLight, _visible_light_index: usize) -> [f32; 4] {
        if light.casts_shadows() && light.baking.uses_shadow_mask() {
            self.use_shadow_mask = true;
            return [
                light.shadow_strength,
                0.0,
                0.0,
                light.baking.occlusion_mask_channel as f32,
            ];
        }
        NO_SHADOW
    }

    /// Reservations in reservation order
    pub fn shadowed_directional(&self) -> &[ShadowedDirectionalLight] {
        &self.shadowed_directional[..self.shadowed_directional_count]
    }

    /// Number of directional reservations
    pub fn shadowed_directional_count(&self) -> usize {
        self.shadowed_directional_count
    }

    /// Cascades per directional light this frame
    pub fn cascade_count(&self) -> u32 {
        self.cascade_count
    }

    /// Atlas tiles needed for all reservations
    pub fn tile_count(&self) -> u32 {
        self.shadowed_directional_count as u32 * self.cascade_count
    }

    /// Whether the shadow mask keyword is needed this frame
    pub fn use_shadow_mask(&self) -> bool {
        self.use_shadow_mask
    }

    /// Eligible directional lights that did not get a reservation
    pub fn rejected_directional(&self) -> u32 {
        self.rejected_directional
    }

    fn mask_channel(&mut self, light: &VisibleLight) -> f32 {
        if light.baking.uses_shadow_mask() {
            self.use_shadow_mask = true;
            light.baking.occlusion_mask_channel as f32
        } else {
            -1.0
        }
    }
}
