//! Shadow Configuration
//!
//! Global shadow settings with serde support for hot-reload.

use serde::{Serialize, Deserialize};

use crate::error::Result;

/// Maximum supported cascade count
pub const MAX_CASCADES: usize = 4;

/// Global shadow configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowSettings {
    /// Maximum distance from the camera at which shadows are rendered
    pub max_distance: f32,

    /// Fraction of `max_distance` over which shadows fade out
    pub distance_fade: f32,

    /// Directional light shadow settings
    pub directional: DirectionalShadowSettings,
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            max_distance: 100.0,
            distance_fade: 0.1,
            directional: DirectionalShadowSettings::default(),
        }
    }
}

impl ShadowSettings {
    /// Create a high-quality shadow configuration
    pub fn high_quality() -> Self {
        Self {
            max_distance: 150.0,
            directional: DirectionalShadowSettings {
                atlas_size: AtlasSize::Size4096,
                filter: FilterMode::Pcf5x5,
                cascade_blend: CascadeBlendMode::Soft,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Create a low-quality shadow configuration for performance
    pub fn low_quality() -> Self {
        Self {
            max_distance: 50.0,
            directional: DirectionalShadowSettings {
                atlas_size: AtlasSize::Size1024,
                filter: FilterMode::Pcf2x2,
                cascade_count: 2,
                cascade_blend: CascadeBlendMode::Hard,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Validate configuration and clamp values to valid ranges
    pub fn validate(&mut self) {
        self.max_distance = self.max_distance.max(0.001);
        self.distance_fade = self.distance_fade.clamp(0.001, 1.0);
        self.directional.validate();
    }

    /// Shadow distance handed to the culler: never beyond the camera's far plane
    pub fn culling_shadow_distance(&self, camera_far: f32) -> f32 {
        self.max_distance.min(camera_far)
    }

    /// Load settings from JSON, then validate
    pub fn from_json(json: &str) -> Result<Self> {
        let mut settings: Self = serde_json::from_str(json)?;
        settings.validate();
        Ok(settings)
    }

    /// Serialize settings to JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Directional light shadow settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectionalShadowSettings {
    /// Shared atlas resolution
    pub atlas_size: AtlasSize,

    /// PCF filter kernel
    pub filter: FilterMode,

    /// Cascade count (1-4)
    pub cascade_count: u32,

    /// Split ratios of the first three cascades, relative to max distance
    pub cascade_ratio_1: f32,
    pub cascade_ratio_2: f32,
    pub cascade_ratio_3: f32,

    /// Fraction of the last cascade used to fade shadows out
    pub cascade_fade: f32,

    /// How adjacent cascades are blended
    pub cascade_blend: CascadeBlendMode,
}

impl Default for DirectionalShadowSettings {
    fn default() -> Self {
        Self {
            atlas_size: AtlasSize::Size1024,
            filter: FilterMode::Pcf2x2,
            cascade_count: 4,
            cascade_ratio_1: 0.1,
            cascade_ratio_2: 0.25,
            cascade_ratio_3: 0.5,
            cascade_fade: 0.1,
            cascade_blend: CascadeBlendMode::Hard,
        }
    }
}

impl DirectionalShadowSettings {
    /// Cascade split ratios as passed to the culler
    pub fn cascade_ratios(&self) -> [f32; 3] {
        [self.cascade_ratio_1, self.cascade_ratio_2, self.cascade_ratio_3]
    }

    /// Validate and clamp
    pub fn validate(&mut self) {
        self.cascade_count = self.cascade_count.clamp(1, MAX_CASCADES as u32);
        self.cascade_ratio_1 = self.cascade_ratio_1.clamp(0.0, 1.0);
        self.cascade_ratio_2 = self.cascade_ratio_2.clamp(0.0, 1.0);
        self.cascade_ratio_3 = self.cascade_ratio_3.clamp(0.0, 1.0);
        self.cascade_fade = self.cascade_fade.clamp(0.001, 1.0);
    }
}

/// Shadow atlas resolution
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AtlasSize {
    Size256,
    Size512,
    Size1024,
    Size2048,
    Size4096,
    Size8192,
}

impl AtlasSize {
    /// Size in texels
    pub fn texels(self) -> u32 {
        match self {
            Self::Size256 => 256,
            Self::Size512 => 512,
            Self::Size1024 => 1024,
            Self::Size2048 => 2048,
            Self::Size4096 => 4096,
            Self::Size8192 => 8192,
        }
    }
}

/// PCF filter kernel used when sampling the atlas
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterMode {
    Pcf2x2,
    Pcf3x3,
    Pcf5x5,
    Pcf7x7,
}

impl FilterMode {
    /// Ordinal (PCF2x2 = 0)
    pub fn ordinal(self) -> u32 {
        match self {
            Self::Pcf2x2 => 0,
            Self::Pcf3x3 => 1,
            Self::Pcf5x5 => 2,
            Self::Pcf7x7 => 3,
        }
    }
}

/// Cascade transition mode
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CascadeBlendMode {
    /// Hard switch between cascades
    Hard,
    /// Cross-fade between cascades
    Soft,
    /// Dithered transition
    Dither,
}

/// Quality mode of the baked shadow mask
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShadowmaskMode {
    /// Baked shadows are used everywhere, realtime shadows are mixed in
    #[default]
    Shadowmask,
    /// Baked shadows only beyond the realtime shadow distance
    DistanceShadowmask,
}

/// Capabilities of the active platform that affect shadow data
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformCapabilities {
    /// Depth buffer uses reversed Z (1 = near, 0 = far)
    pub reversed_z: bool,
    /// Configured shadow mask quality mode
    pub shadowmask_mode: ShadowmaskMode,
}
