//! Per-Camera Lighting Setup
//!
//! Runs once per camera per frame, before geometry is drawn:
//!
//! 1. Reset the shadow budget with the frame's shadow settings
//! 2. Classify visible lights into slots, reserving shadows
//! 3. Upload light uniforms and the lights-per-object keyword
//! 4. Render the directional shadow atlas and upload shadow uniforms
//!
//! [`Lighting::cleanup`] releases the atlas once the camera has finished.

use serde::{Serialize, Deserialize};

use crate::context::{GraphicsContext, ShadowCuller};
use crate::error::Result;
use crate::keywords::LIGHTS_PER_OBJECT_KEYWORD;
use crate::light_buffer::LightClassifier;
use crate::shadow::config::{PlatformCapabilities, ShadowSettings};
use crate::shadow::renderer::ShadowAtlasRenderer;

/// Profiling sample name
pub const LIGHTING_SAMPLE: &str = "Lighting";

/// Lighting configuration
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingConfig {
    /// Build per-object light index lists
    pub use_lights_per_object: bool,
    /// Shadow settings
    pub shadows: ShadowSettings,
    /// Platform capabilities
    pub platform: PlatformCapabilities,
}

impl LightingConfig {
    /// Load from JSON, clamping out-of-range values
    pub fn from_json(json: &str) -> Result<Self> {
        let mut config: Self = serde_json::from_str(json)?;
        config.shadows.validate();
        Ok(config)
    }

    /// Save as pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Combined statistics of the last frame
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LightingStats {
    pub directional_lights: u32,
    pub point_lights: u32,
    pub spot_lights: u32,
    /// Visible lights dropped for lack of slots
    pub dropped_lights: u32,
    /// Directional lights holding a shadow reservation
    pub shadowed_directional: u32,
    /// Shadowed directional lights without a reservation
    pub rejected_directional: u32,
    pub atlas_tiles: u32,
    pub shadow_draw_calls: u32,
    pub skipped_cascades: u32,
    pub use_shadow_mask: bool,
}

/// Per-camera light and shadow preparation
#[derive(Clone, Debug, Default)]
pub struct Lighting {
    config: LightingConfig,
    classifier: LightClassifier,
    shadows: ShadowAtlasRenderer,
    stats: LightingStats,
}

impl Lighting {
    /// Create with a configuration
    pub fn new(config: LightingConfig) -> Self {
        let shadows = ShadowAtlasRenderer::new(config.platform);
        Self {
            config,
            classifier: LightClassifier::new(),
            shadows,
            stats: LightingStats::default(),
        }
    }

    /// Prepare lights and shadows using the stored configuration
    pub fn prepare<C, G>(&mut self, context: &mut G, culler: &mut C) -> Result<()>
    where
        C: ShadowCuller + ?Sized,
        G: GraphicsContext + ?Sized,
    {
        let settings = self.config.shadows.clone();
        let use_lights_per_object = self.config.use_lights_per_object;
        self.setup(context, culler, &settings, use_lights_per_object)
    }

    /// Prepare lights and shadows for one camera
    pub fn setup<C, G>(
        &mut self,
        context: &mut G,
        culler: &mut C,
        settings: &ShadowSettings,
        use_lights_per_object: bool,
    ) -> Result<()>
    where
        C: ShadowCuller + ?Sized,
        G: GraphicsContext + ?Sized,
    {
        context.begin_sample(LIGHTING_SAMPLE);

        self.shadows.setup(settings);
        self.classifier.classify(culler, self.shadows.planner_mut(), use_lights_per_object);
        context.set_keyword(LIGHTS_PER_OBJECT_KEYWORD, use_lights_per_object);
        self.classifier.upload(context);
        let result = self.shadows.render(&*culler, context);

        context.end_sample(LIGHTING_SAMPLE);

        self.update_stats();
        log::trace!(
            "Lighting: {} directional, {} other, {} shadowed",
            self.classifier.directional_count(),
            self.classifier.other_count(),
            self.stats.shadowed_directional
        );
        result
    }

    /// Release per-frame resources
    pub fn cleanup<G: GraphicsContext + ?Sized>(&mut self, context: &mut G) {
        self.shadows.cleanup(context);
    }

    fn update_stats(&mut self) {
        let lights = self.classifier.stats();
        let shadows = self.shadows.stats();
        let planner = self.shadows.planner();

        self.stats = LightingStats {
            directional_lights: lights.directional_count,
            point_lights: lights.point_count,
            spot_lights: lights.spot_count,
            dropped_lights: lights.overflow_count,
            shadowed_directional: planner.shadowed_directional_count() as u32,
            rejected_directional: planner.rejected_directional(),
            atlas_tiles: shadows.tiles,
            shadow_draw_calls: shadows.draw_calls,
            skipped_cascades: shadows.skipped_cascades,
            use_shadow_mask: planner.use_shadow_mask(),
        };
    }

    /// Light slots of the last frame
    pub fn lights(&self) -> &LightClassifier {
        &self.classifier
    }

    /// Shadow renderer of the last frame
    pub fn shadows(&self) -> &ShadowAtlasRenderer {
        &self.shadows
    }

    /// Statistics of the last frame
    pub fn stats(&self) -> &LightingStats {
        &self.stats
    }

    /// Current configuration
    pub fn config(&self) -> &LightingConfig {
        &self.config
    }

    /// Replace the configuration; takes effect on the next frame
    pub fn set_config(&mut self, config: LightingConfig) {
        self.shadows.set_platform(config.platform);
        self.config = config;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{
        AtlasDesc, Bounds, CascadeRequest, CommandRecorder, RenderCommand, ShadowDrawRequest,
        ShadowSplit, TextureHandle, Viewport,
    };
    use crate::error::LightingError;
    use crate::light::{LightShadows, VisibleLight};
    use crate::light_buffer::{DIRECTIONAL_LIGHT_COLORS, DIRECTIONAL_LIGHT_COUNT, OTHER_LIGHT_COUNT};
    use crate::math::{Mat4, IDENTITY_MATRIX};
    use crate::shadow::renderer::DIRECTIONAL_SHADOW_ATLAS_HANDLE;

    struct FailingCuller {
        lights: Vec<VisibleLight>,
    }

    impl ShadowCuller for FailingCuller {
        fn visible_lights(&self) -> &[VisibleLight] {
            &self.lights
        }

        fn shadow_caster_bounds(&self, _index: usize) -> Option<Bounds> {
            Some(Bounds { center: [0.0; 3], extents: [1.0; 3] })
        }

        fn compute_directional_shadow_matrices(&self, request: &CascadeRequest) -> Result<ShadowSplit> {
            Err(LightingError::CullingFailed {
                visible_light_index: request.visible_light_index,
                cascade_index: request.cascade_index,
            })
        }

        fn set_light_index_map(&mut self, _map: &[i32]) {}
    }

    /// Context whose texture allocation always fails
    struct OutOfMemory(CommandRecorder);

    impl GraphicsContext for OutOfMemory {
        fn allocate_shadow_atlas(&mut self, _handle: TextureHandle, desc: &AtlasDesc) -> Result<()> {
            Err(LightingError::TextureAllocation(format!("{}px atlas", desc.size)))
        }

        fn release_texture(&mut self, handle: TextureHandle) {
            self.0.release_texture(handle)
        }

        fn set_render_target(&mut self, handle: TextureHandle) {
            self.0.set_render_target(handle)
        }

        fn clear_depth(&mut self) {
            self.0.clear_depth()
        }

        fn set_viewport(&mut self, viewport: Viewport) {
            self.0.set_viewport(viewport)
        }

        fn set_view_projection(&mut self, view: &Mat4, projection: &Mat4) {
            self.0.set_view_projection(view, projection)
        }

        fn set_depth_bias(&mut self, constant: f32, slope: f32) {
            self.0.set_depth_bias(constant, slope)
        }

        fn draw_shadows(&mut self, request: &ShadowDrawRequest) {
            self.0.draw_shadows(request)
        }

        fn set_global_int(&mut self, name: &'static str, value: i32) {
            self.0.set_global_int(name, value)
        }

        fn set_global_vector(&mut self, name: &'static str, value: [f32; 4]) {
            self.0.set_global_vector(name, value)
        }

        fn set_global_vector_array(&mut self, name: &'static str, values: &[[f32; 4]]) {
            self.0.set_global_vector_array(name, values)
        }

        fn set_global_matrix_array(&mut self, name: &'static str, values: &[Mat4]) {
            self.0.set_global_matrix_array(name, values)
        }

        fn set_keyword(&mut self, name: &'static str, enabled: bool) {
            self.0.set_keyword(name, enabled)
        }
    }

    #[test]
    fn test_light_uniforms_uploaded() {
        let mut lighting = Lighting::default();
        let mut culler = FailingCuller {
            lights: vec![VisibleLight::directional(IDENTITY_MATRIX, [1.0, 0.5, 0.25])],
        };
        let mut recorder = CommandRecorder::new();

        lighting
            .setup(&mut recorder, &mut culler, &ShadowSettings::default(), false)
            .unwrap();

        assert_eq!(recorder.global_int(DIRECTIONAL_LIGHT_COUNT), Some(1));
        assert_eq!(recorder.global_int(OTHER_LIGHT_COUNT), Some(0));
        assert_eq!(
            recorder.global_vector_array(DIRECTIONAL_LIGHT_COLORS).map(|c| c[0]),
            Some([1.0, 0.5, 0.25, 1.0])
        );
        assert_eq!(recorder.keyword(LIGHTS_PER_OBJECT_KEYWORD), Some(false));
    }

    #[test]
    fn test_failed_cascades_are_counted() {
        let mut lighting = Lighting::default();
        let sun = VisibleLight::directional(IDENTITY_MATRIX, [1.0; 3]).with_shadows(LightShadows::Soft, 1.0);
        let mut culler = FailingCuller { lights: vec![sun] };
        let mut recorder = CommandRecorder::new();

        lighting
            .setup(&mut recorder, &mut culler, &ShadowSettings::default(), false)
            .unwrap();

        let stats = lighting.stats();
        assert_eq!(stats.shadowed_directional, 1);
        assert_eq!(stats.skipped_cascades, 4);
        assert_eq!(stats.shadow_draw_calls, 0);
        assert_eq!(recorder.draw_count(), 0);
    }

    #[test]
    fn test_allocation_failure_propagates() {
        let mut lighting = Lighting::default();
        let mut culler = FailingCuller { lights: Vec::new() };
        let mut context = OutOfMemory(CommandRecorder::new());

        let result = lighting.setup(&mut context, &mut culler, &ShadowSettings::default(), false);
        assert!(matches!(result, Err(LightingError::TextureAllocation(_))));
    }

    #[test]
    fn test_config_json() {
        let config = LightingConfig {
            use_lights_per_object: true,
            shadows: ShadowSettings::low_quality(),
            platform: PlatformCapabilities { reversed_z: true, ..Default::default() },
        };

        let json = config.to_json().unwrap();
        let loaded = LightingConfig::from_json(&json).unwrap();
        assert_eq!(loaded, config);

        let partial = LightingConfig::from_json(r#"{ "use_lights_per_object": true }"#).unwrap();
        assert!(partial.use_lights_per_object);
        assert_eq!(partial.shadows, ShadowSettings::default());

        assert!(LightingConfig::from_json("{ not json").is_err());
    }

    #[test]
    fn test_set_config_keeps_atlas_for_cleanup() {
        let mut lighting = Lighting::default();
        let sun = VisibleLight::directional(IDENTITY_MATRIX, [1.0; 3]).with_shadows(LightShadows::Hard, 1.0);
        let mut culler = FailingCuller { lights: vec![sun] };
        let mut recorder = CommandRecorder::new();

        lighting.prepare(&mut recorder, &mut culler).unwrap();
        lighting.set_config(LightingConfig {
            platform: PlatformCapabilities { reversed_z: true, ..Default::default() },
            ..Default::default()
        });
        assert!(lighting.shadows().platform().reversed_z);

        lighting.cleanup(&mut recorder);
        assert_eq!(
            recorder.commands().last(),
            Some(&RenderCommand::ReleaseTexture(DIRECTIONAL_SHADOW_ATLAS_HANDLE))
        );
        assert!(!lighting.shadows().atlas_allocated());
    }

    #[test]
    fn test_prepare_uses_config() {
        let mut lighting = Lighting::new(LightingConfig {
            use_lights_per_object: true,
            ..Default::default()
        });
        let mut culler = FailingCuller { lights: Vec::new() };
        let mut recorder = CommandRecorder::new();

        lighting.prepare(&mut recorder, &mut culler).unwrap();
        assert_eq!(recorder.keyword(LIGHTS_PER_OBJECT_KEYWORD), Some(true));

        lighting.cleanup(&mut recorder);
        assert!(!lighting.shadows().atlas_allocated());
    }
}
