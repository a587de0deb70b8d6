//! Directional Shadow Atlas Rendering
//!
//! Owns the shadow budget for the frame and, once lights are classified,
//! renders every reserved directional light's cascades into the shared atlas
//! and uploads the shadow uniforms.

use serde::{Serialize, Deserialize};

use super::atlas::{to_atlas_matrix, AtlasLayout};
use super::budget::{ShadowBudgetPlanner, ShadowedDirectionalLight};
use super::cascade::ShadowCascades;
use super::config::{PlatformCapabilities, ShadowSettings};
use super::data::GpuShadowUniforms;
use crate::context::{
    AtlasDesc, CascadeRequest, GraphicsContext, ShadowCuller, ShadowDrawRequest, TextureHandle,
};
use crate::error::Result;
use crate::keywords::{
    apply_keyword_group, CascadeBlendKeyword, DirectionalFilterKeyword, ShadowMaskKeyword,
};
use crate::math::multiply_mat4;

/// Profiling sample name
pub const SHADOWS_SAMPLE: &str = "Shadows";

pub const DIRECTIONAL_SHADOW_ATLAS: &str = "_DirectionalShadowAtlas";
pub const DIRECTIONAL_SHADOW_MATRICES: &str = "_DirectionalShadowMatrices";
pub const CASCADE_COUNT: &str = "_CascadeCount";
pub const CASCADE_CULLING_SPHERES: &str = "_CascadeCullingSpheres";
pub const CASCADE_DATA: &str = "_CascadeData";
pub const SHADOW_ATLAS_SIZE: &str = "_ShadowAtlasSize";
pub const SHADOW_DISTANCE_FADE: &str = "_ShadowDistanceFade";

/// Handle of the shared directional atlas; stable across frames
pub const DIRECTIONAL_SHADOW_ATLAS_HANDLE: TextureHandle =
    TextureHandle::from_name(DIRECTIONAL_SHADOW_ATLAS);

/// Shadow rendering statistics for the last frame
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ShadowStats {
    /// Directional lights rendered into the atlas
    pub shadowed_directional: u32,
    /// Atlas tiles in use
    pub tiles: u32,
    /// Shadow caster draws issued
    pub draw_calls: u32,
    /// Cascades skipped because the culler failed
    pub skipped_cascades: u32,
    /// Only the 1x1 placeholder atlas was allocated
    pub placeholder_atlas: bool,
}

/// Renders cascaded directional shadows into the shared atlas
#[derive(Clone, Debug)]
pub struct ShadowAtlasRenderer {
    settings: ShadowSettings,
    platform: PlatformCapabilities,
    planner: ShadowBudgetPlanner,
    cascades: ShadowCascades,
    uniforms: GpuShadowUniforms,
    layout: Option<AtlasLayout>,
    atlas_allocated: bool,
    stats: ShadowStats,
}

impl ShadowAtlasRenderer {
    /// Create a renderer for the given platform
    pub fn new(platform: PlatformCapabilities) -> Self {
        Self {
            settings: ShadowSettings::default(),
            platform,
            planner: ShadowBudgetPlanner::new(),
            cascades: ShadowCascades::default(),
            uniforms: GpuShadowUniforms::default(),
            layout: None,
            atlas_allocated: false,
            stats: ShadowStats::default(),
        }
    }

    /// Reset per-frame state
    pub fn setup(&mut self, settings: &ShadowSettings) {
        self.settings = settings.clone();
        self.settings.validate();

        let cascade_count = self.settings.directional.cascade_count;
        self.planner.begin_frame(cascade_count);
        self.cascades.reset(cascade_count);
        self.uniforms = GpuShadowUniforms::default();
        self.layout = None;
        self.stats = ShadowStats::default();
    }

    /// Change platform capabilities; applies from the next render
    pub fn set_platform(&mut self, platform: PlatformCapabilities) {
        self.platform = platform;
    }

    /// Platform capabilities in effect
    pub fn platform(&self) -> &PlatformCapabilities {
        &self.platform
    }

    /// Shadow budget, for reservations during light classification
    pub fn planner_mut(&mut self) -> &mut ShadowBudgetPlanner {
        &mut self.planner
    }

    /// Shadow budget
    pub fn planner(&self) -> &ShadowBudgetPlanner {
        &self.planner
    }

    /// Render all reservations and upload shadow uniforms
    pub fn render<C, G>(&mut self, culler: &C, context: &mut G) -> Result<()>
    where
        C: ShadowCuller + ?Sized,
        G: GraphicsContext + ?Sized,
    {
        if self.planner.shadowed_directional_count() > 0 {
            self.render_directional_shadows(culler, context)?;
        } else {
            // Keeps the sampler bound even without casters
            context.allocate_shadow_atlas(DIRECTIONAL_SHADOW_ATLAS_HANDLE, &AtlasDesc::shadow_map(1))?;
            self.atlas_allocated = true;
            self.stats.placeholder_atlas = true;
        }

        context.begin_sample(SHADOWS_SAMPLE);
        apply_keyword_group(
            context,
            ShadowMaskKeyword::select(self.planner.use_shadow_mask(), self.platform.shadowmask_mode),
        );
        context.end_sample(SHADOWS_SAMPLE);
        Ok(())
    }

    /// Release the atlas texture
    pub fn cleanup<G: GraphicsContext + ?Sized>(&mut self, context: &mut G) {
        if self.atlas_allocated {
            context.release_texture(DIRECTIONAL_SHADOW_ATLAS_HANDLE);
            self.atlas_allocated = false;
        }
    }

    fn render_directional_shadows<C, G>(&mut self, culler: &C, context: &mut G) -> Result<()>
    where
        C: ShadowCuller + ?Sized,
        G: GraphicsContext + ?Sized,
    {
        let atlas_size = self.settings.directional.atlas_size.texels();
        context.allocate_shadow_atlas(DIRECTIONAL_SHADOW_ATLAS_HANDLE, &AtlasDesc::shadow_map(atlas_size))?;
        self.atlas_allocated = true;

        context.set_render_target(DIRECTIONAL_SHADOW_ATLAS_HANDLE);
        context.clear_depth();
        context.begin_sample(SHADOWS_SAMPLE);

        let layout = AtlasLayout::new(atlas_size, self.planner.tile_count());
        log::trace!(
            "Shadow atlas {}px: {} tiles, split {}, tile {}px",
            atlas_size,
            layout.tile_count,
            layout.split,
            layout.tile_size
        );
        self.layout = Some(layout);

        let reserved = self.planner.shadowed_directional_count();
        for index in 0..reserved {
            let light = self.planner.shadowed_directional()[index];
            self.render_directional_light(index, &light, &layout, culler, context);
        }

        let cascade_count = self.settings.directional.cascade_count;
        self.uniforms.cascade_count = cascade_count as i32;
        self.uniforms.culling_spheres = self.cascades.culling_spheres;
        self.uniforms.cascade_data = self.cascades.data;
        self.uniforms.distance_fade = ShadowCascades::distance_fade(&self.settings);
        self.uniforms.atlas_size = GpuShadowUniforms::atlas_size_vector(atlas_size);

        context.set_global_int(CASCADE_COUNT, self.uniforms.cascade_count);
        context.set_global_vector_array(CASCADE_CULLING_SPHERES, &self.uniforms.culling_spheres);
        context.set_global_matrix_array(DIRECTIONAL_SHADOW_MATRICES, &self.uniforms.matrices);
        context.set_global_vector_array(CASCADE_DATA, &self.uniforms.cascade_data);
        context.set_global_vector(SHADOW_DISTANCE_FADE, self.uniforms.distance_fade);

        apply_keyword_group(context, DirectionalFilterKeyword::select(self.settings.directional.filter));
        apply_keyword_group(context, CascadeBlendKeyword::select(self.settings.directional.cascade_blend));

        context.set_global_vector(SHADOW_ATLAS_SIZE, self.uniforms.atlas_size);
        context.end_sample(SHADOWS_SAMPLE);

        self.stats.shadowed_directional = reserved as u32;
        self.stats.tiles = layout.tile_count;
        Ok(())
    }

    fn render_directional_light<C, G>(
        &mut self,
        index: usize,
        light: &ShadowedDirectionalLight,
        layout: &AtlasLayout,
        culler: &C,
        context: &mut G,
    ) where
        C: ShadowCuller + ?Sized,
        G: GraphicsContext + ?Sized,
    {
        let directional = &self.settings.directional;
        let cascade_count = directional.cascade_count;
        let tile_offset = index as u32 * cascade_count;
        let culling_factor = ShadowCascades::blend_culling_factor(directional.cascade_fade);

        for cascade in 0..cascade_count {
            let request = CascadeRequest {
                visible_light_index: light.visible_light_index,
                cascade_index: cascade,
                cascade_count,
                ratios: directional.cascade_ratios(),
                tile_size: layout.tile_size,
                near_plane_offset: light.near_plane_offset,
            };

            let mut split = match culler.compute_directional_shadow_matrices(&request) {
                Ok(split) => split,
                Err(e) => {
                    log::warn!("Skipping shadow cascade: {}", e);
                    self.stats.skipped_cascades += 1;
                    continue;
                }
            };
            split.cascade_blend_culling_factor = culling_factor;

            // Spheres are shared by all lights; the first reservation defines them
            if index == 0 {
                self.cascades.set_cascade(
                    cascade as usize,
                    split.culling_sphere,
                    layout.tile_size as f32,
                    directional.filter,
                );
            }

            let tile_index = tile_offset + cascade;
            context.set_viewport(layout.viewport(tile_index));
            self.uniforms.matrices[tile_index as usize] = to_atlas_matrix(
                &multiply_mat4(&split.projection, &split.view),
                layout.offset(tile_index),
                layout.split,
                self.platform.reversed_z,
            );

            context.set_view_projection(&split.view, &split.projection);
            context.set_depth_bias(0.0, light.slope_scale_bias);
            context.draw_shadows(&ShadowDrawRequest {
                visible_light_index: light.visible_light_index,
                cascade_index: cascade,
                split,
            });
            context.set_depth_bias(0.0, 0.0);
            self.stats.draw_calls += 1;
        }
    }

    /// Shadow uniforms of the last render
    pub fn uniforms(&self) -> &GpuShadowUniforms {
        &self.uniforms
    }

    /// Cascade data of the last render
    pub fn cascades(&self) -> &ShadowCascades {
        &self.cascades
    }

    /// Atlas layout of the last render, `None` when no light was reserved
    pub fn layout(&self) -> Option<&AtlasLayout> {
        self.layout.as_ref()
    }

    /// Settings in effect for this frame
    pub fn settings(&self) -> &ShadowSettings {
        &self.settings
    }

    /// Statistics of the last render
    pub fn stats(&self) -> &ShadowStats {
        &self.stats
    }

    /// Whether the atlas texture is currently allocated
    pub fn atlas_allocated(&self) -> bool {
        self.atlas_allocated
    }
}

impl Default for ShadowAtlasRenderer {
    fn default() -> Self {
        Self::new(PlatformCapabilities::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{Bounds, CommandRecorder, RenderCommand, ShadowSplit};
    use crate::error::LightingError;
    use crate::light::{LightShadows, VisibleLight};
    use crate::math::{orthographic, IDENTITY_MATRIX};

    struct SphereCuller {
        lights: Vec<VisibleLight>,
        fail_cascade: Option<u32>,
    }

    impl ShadowCuller for SphereCuller {
        fn visible_lights(&self) -> &[VisibleLight] {
            &self.lights
        }

        fn shadow_caster_bounds(&self, _index: usize) -> Option<Bounds> {
            Some(Bounds { center: [0.0; 3], extents: [5.0; 3] })
        }

        fn compute_directional_shadow_matrices(&self, request: &CascadeRequest) -> Result<ShadowSplit> {
            if self.fail_cascade == Some(request.cascade_index) {
                return Err(LightingError::CullingFailed {
                    visible_light_index: request.visible_light_index,
                    cascade_index: request.cascade_index,
                });
            }
            let radius = 10.0 * (request.cascade_index + 1) as f32 + request.visible_light_index as f32;
            Ok(ShadowSplit {
                view: IDENTITY_MATRIX,
                projection: orthographic(-radius, radius, -radius, radius, 0.0, 2.0 * radius),
                culling_sphere: [0.0, 0.0, request.cascade_index as f32, radius],
                cascade_blend_culling_factor: 0.0,
            })
        }

        fn set_light_index_map(&mut self, _map: &[i32]) {}
    }

    fn culler(count: usize) -> SphereCuller {
        let sun = VisibleLight::directional(IDENTITY_MATRIX, [1.0; 3]).with_shadows(LightShadows::Hard, 1.0);
        SphereCuller { lights: vec![sun; count], fail_cascade: None }
    }

    fn reserve_all(renderer: &mut ShadowAtlasRenderer, culler: &SphereCuller) {
        for (i, light) in culler.lights.iter().enumerate() {
            renderer.planner_mut().reserve_directional(culler, light, i);
        }
    }

    #[test]
    fn test_placeholder_atlas() {
        let mut renderer = ShadowAtlasRenderer::default();
        renderer.setup(&ShadowSettings::default());
        let mut recorder = CommandRecorder::new();

        renderer.render(&culler(0), &mut recorder).unwrap();

        assert_eq!(
            recorder.commands()[0],
            RenderCommand::AllocateShadowAtlas {
                handle: DIRECTIONAL_SHADOW_ATLAS_HANDLE,
                desc: AtlasDesc::shadow_map(1),
            }
        );
        assert_eq!(recorder.draw_count(), 0);
        assert!(renderer.stats().placeholder_atlas);
        assert!(renderer.layout().is_none());
        assert_eq!(recorder.global_int(CASCADE_COUNT), None);

        renderer.cleanup(&mut recorder);
        assert_eq!(
            recorder.commands().last(),
            Some(&RenderCommand::ReleaseTexture(DIRECTIONAL_SHADOW_ATLAS_HANDLE))
        );
    }

    #[test]
    fn test_render_single_light() {
        let culler = culler(1);
        let mut renderer = ShadowAtlasRenderer::default();
        renderer.setup(&ShadowSettings::default());
        reserve_all(&mut renderer, &culler);

        let mut recorder = CommandRecorder::new();
        renderer.render(&culler, &mut recorder).unwrap();

        let layout = renderer.layout().copied().unwrap();
        assert_eq!((layout.tile_count, layout.split, layout.tile_size), (4, 2, 512));
        assert_eq!(recorder.draw_count(), 4);

        let origins: Vec<_> = recorder.viewports().iter().map(|v| (v.x, v.y)).collect();
        assert_eq!(origins, vec![(0.0, 0.0), (512.0, 0.0), (0.0, 512.0), (512.0, 512.0)]);

        assert_eq!(recorder.global_int(CASCADE_COUNT), Some(4));
        assert_eq!(recorder.global_vector(SHADOW_ATLAS_SIZE).map(|v| v[0]), Some(1024.0));
        assert_eq!(recorder.keyword("_CASCADE_BLEND_SOFT"), Some(false));
        assert_eq!(recorder.keyword("_SHADOW_MASK_ALWAYS"), Some(false));
    }

    #[test]
    fn test_depth_bias_wraps_draw() {
        let culler = culler(1);
        let mut renderer = ShadowAtlasRenderer::default();
        let mut settings = ShadowSettings::default();
        settings.directional.cascade_count = 1;
        renderer.setup(&settings);
        reserve_all(&mut renderer, &culler);

        let mut recorder = CommandRecorder::new();
        renderer.render(&culler, &mut recorder).unwrap();

        let commands = recorder.commands();
        let draw = commands
            .iter()
            .position(|c| matches!(c, RenderCommand::DrawShadows(_)))
            .unwrap();
        let bias = culler.lights[0].shadow_bias;
        assert_eq!(commands[draw - 1], RenderCommand::SetDepthBias { constant: 0.0, slope: bias });
        assert_eq!(commands[draw + 1], RenderCommand::SetDepthBias { constant: 0.0, slope: 0.0 });

        if let RenderCommand::DrawShadows(request) = &commands[draw] {
            assert!((request.split.cascade_blend_culling_factor - 0.7).abs() < 1e-6);
        }
    }

    #[test]
    fn test_first_light_defines_spheres() {
        let culler = culler(2);
        let mut renderer = ShadowAtlasRenderer::default();
        renderer.setup(&ShadowSettings::default());
        reserve_all(&mut renderer, &culler);

        let mut recorder = CommandRecorder::new();
        renderer.render(&culler, &mut recorder).unwrap();

        // Light 1 reports radius + 1; spheres must still come from light 0
        let (expected, _) = ShadowCascades::calculate_cascade(
            [0.0, 0.0, 2.0, 30.0],
            256.0,
            renderer.settings().directional.filter,
        );
        assert_eq!(renderer.cascades().culling_spheres[2], expected);
        assert_eq!(recorder.draw_count(), 8);
        assert_eq!(renderer.stats().tiles, 8);
    }

    #[test]
    fn test_failed_cascade_is_skipped() {
        let mut culler = culler(1);
        culler.fail_cascade = Some(1);
        let mut renderer = ShadowAtlasRenderer::default();
        renderer.setup(&ShadowSettings::default());
        reserve_all(&mut renderer, &culler);

        let mut recorder = CommandRecorder::new();
        renderer.render(&culler, &mut recorder).unwrap();

        assert_eq!(recorder.draw_count(), 3);
        assert_eq!(renderer.stats().skipped_cascades, 1);
        assert_eq!(renderer.uniforms().matrices[1], IDENTITY_MATRIX);
        assert_eq!(renderer.cascades().culling_spheres[1], [0.0; 4]);
    }
}
