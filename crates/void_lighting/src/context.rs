//! Collaborator Contracts
//!
//! The preparation pipeline never talks to a graphics API or a spatial
//! culler directly. It consumes a [`ShadowCuller`] and drives a
//! [`GraphicsContext`]. [`CommandRecorder`] is a context that records every
//! call, for backends that replay command lists and for tests.

use serde::{Serialize, Deserialize};

use crate::error::Result;
use crate::light::VisibleLight;
use crate::math::Mat4;

/// Handle of a texture known to the graphics backend
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TextureHandle(pub u64);

impl TextureHandle {
    /// Derive a stable handle from a shader property name (FNV-1a)
    pub const fn from_name(name: &str) -> Self {
        let bytes = name.as_bytes();
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        let mut i = 0;
        while i < bytes.len() {
            hash ^= bytes[i] as u64;
            hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
            i += 1;
        }
        Self(hash)
    }
}

/// Description of a shadow atlas render target
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtlasDesc {
    /// Width and height in texels
    pub size: u32,
    /// Depth buffer bits
    pub depth_bits: u32,
}

impl AtlasDesc {
    /// Square 32-bit shadow map
    pub fn shadow_map(size: u32) -> Self {
        Self { size, depth_bits: 32 }
    }
}

/// Pixel viewport
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Axis-aligned world bounds
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub center: [f32; 3],
    pub extents: [f32; 3],
}

/// Request for one directional shadow cascade
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CascadeRequest {
    /// Index into the visible light list
    pub visible_light_index: usize,
    /// Cascade to compute
    pub cascade_index: u32,
    /// Total cascades for the light
    pub cascade_count: u32,
    /// Split ratios of the first three cascades
    pub ratios: [f32; 3],
    /// Tile resolution in texels
    pub tile_size: u32,
    /// Near plane offset of the light
    pub near_plane_offset: f32,
}

/// Culling result for one cascade
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShadowSplit {
    /// Light view matrix
    pub view: Mat4,
    /// Light projection matrix
    pub projection: Mat4,
    /// Bounding sphere of the cascade `(center.xyz, radius)`
    pub culling_sphere: [f32; 4],
    /// Fraction of the sphere used to cull casters already covered by the previous cascade
    pub cascade_blend_culling_factor: f32,
}

/// Draw request for the casters of one light cascade
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShadowDrawRequest {
    /// Index into the visible light list
    pub visible_light_index: usize,
    /// Cascade being rendered
    pub cascade_index: u32,
    /// Split data used for caster culling
    pub split: ShadowSplit,
}

/// Scene visibility culler
pub trait ShadowCuller {
    /// Visible lights, in culling order
    fn visible_lights(&self) -> &[VisibleLight];

    /// Bounds of the shadow casters of a light, `None` when there are none
    fn shadow_caster_bounds(&self, visible_light_index: usize) -> Option<Bounds>;

    /// View, projection and culling sphere for one directional cascade
    fn compute_directional_shadow_matrices(&self, request: &CascadeRequest) -> Result<ShadowSplit>;

    /// Receive the visible-to-compact light index map for per-object light lists
    fn set_light_index_map(&mut self, map: &[i32]);
}

/// Graphics submission context
pub trait GraphicsContext {
    /// Allocate (or reallocate) the shadow atlas bound to `handle`
    fn allocate_shadow_atlas(&mut self, handle: TextureHandle, desc: &AtlasDesc) -> Result<()>;

    /// Release a texture allocated for this frame
    fn release_texture(&mut self, handle: TextureHandle);

    /// Bind a render target
    fn set_render_target(&mut self, handle: TextureHandle);

    /// Clear depth of the bound target
    fn clear_depth(&mut self);

    /// Set the rendering viewport
    fn set_viewport(&mut self, viewport: Viewport);

    /// Set view and projection for subsequent draws
    fn set_view_projection(&mut self, view: &Mat4, projection: &Mat4);

    /// Set global depth bias
    fn set_depth_bias(&mut self, constant: f32, slope: f32);

    /// Draw shadow casters of one light cascade
    fn draw_shadows(&mut self, request: &ShadowDrawRequest);

    fn set_global_int(&mut self, name: &'static str, value: i32);

    fn set_global_vector(&mut self, name: &'static str, value: [f32; 4]);

    fn set_global_vector_array(&mut self, name: &'static str, values: &[[f32; 4]]);

    fn set_global_matrix_array(&mut self, name: &'static str, values: &[Mat4]);

    /// Enable or disable a shader keyword
    fn set_keyword(&mut self, name: &'static str, enabled: bool);

    /// Open a profiling sample
    fn begin_sample(&mut self, _name: &'static str) {}

    /// Close a profiling sample
    fn end_sample(&mut self, _name: &'static str) {}
}

/// A recorded graphics context call
#[derive(Clone, Debug, PartialEq)]
pub enum RenderCommand {
    AllocateShadowAtlas { handle: TextureHandle, desc: AtlasDesc },
    ReleaseTexture(TextureHandle),
    SetRenderTarget(TextureHandle),
    ClearDepth,
    SetViewport(Viewport),
    SetViewProjection { view: Mat4, projection: Mat4 },
    SetDepthBias { constant: f32, slope: f32 },
    DrawShadows(ShadowDrawRequest),
    SetGlobalInt { name: &'static str, value: i32 },
    SetGlobalVector { name: &'static str, value: [f32; 4] },
    SetGlobalVectorArray { name: &'static str, values: Vec<[f32; 4]> },
    SetGlobalMatrixArray { name: &'static str, values: Vec<Mat4> },
    SetKeyword { name: &'static str, enabled: bool },
    BeginSample(&'static str),
    EndSample(&'static str),
}

/// Graphics context that records commands for later replay
#[derive(Clone, Debug, Default)]
pub struct CommandRecorder {
    commands: Vec<RenderCommand>,
}

impl CommandRecorder {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded commands
    pub fn commands(&self) -> &[RenderCommand] {
        &self.commands
    }

    /// Take recorded commands, leaving the recorder empty
    pub fn drain(&mut self) -> Vec<RenderCommand> {
        core::mem::take(&mut self.commands)
    }

    /// Clear recorded commands
    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Number of shadow draw calls recorded
    pub fn draw_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, RenderCommand::DrawShadows(_)))
            .count()
    }

    /// Last recorded state of a keyword
    pub fn keyword(&self, name: &str) -> Option<bool> {
        self.commands.iter().rev().find_map(|c| match c {
            RenderCommand::SetKeyword { name: n, enabled } if *n == name => Some(*enabled),
            _ => None,
        })
    }

    /// Last value uploaded for a global int
    pub fn global_int(&self, name: &str) -> Option<i32> {
        self.commands.iter().rev().find_map(|c| match c {
            RenderCommand::SetGlobalInt { name: n, value } if *n == name => Some(*value),
            _ => None,
        })
    }

    /// Last value uploaded for a global vector
    pub fn global_vector(&self, name: &str) -> Option<[f32; 4]> {
        self.commands.iter().rev().find_map(|c| match c {
            RenderCommand::SetGlobalVector { name: n, value } if *n == name => Some(*value),
            _ => None,
        })
    }

    /// Last values uploaded for a global vector array
    pub fn global_vector_array(&self, name: &str) -> Option<&[[f32; 4]]> {
        self.commands.iter().rev().find_map(|c| match c {
            RenderCommand::SetGlobalVectorArray { name: n, values } if *n == name => {
                Some(values.as_slice())
            }
            _ => None,
        })
    }

    /// Last values uploaded for a global matrix array
    pub fn global_matrix_array(&self, name: &str) -> Option<&[Mat4]> {
        self.commands.iter().rev().find_map(|c| match c {
            RenderCommand::SetGlobalMatrixArray { name: n, values } if *n == name => {
                Some(values.as_slice())
            }
            _ => None,
        })
    }

    /// Viewports set, in order
    pub fn viewports(&self) -> Vec<Viewport> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                RenderCommand::SetViewport(v) => Some(*v),
                _ => None,
            })
            .collect()
    }
}

impl GraphicsContext for CommandRecorder {
    fn allocate_shadow_atlas(&mut self, handle: TextureHandle, desc: &AtlasDesc) -> Result<()> {
        self.commands.push(RenderCommand::AllocateShadowAtlas { handle, desc: *desc });
        Ok(())
    }

    fn release_texture(&mut self, handle: TextureHandle) {
        self.commands.push(RenderCommand::ReleaseTexture(handle));
    }

    fn set_render_target(&mut self, handle: TextureHandle) {
        self.commands.push(RenderCommand::SetRenderTarget(handle));
    }

    fn clear_depth(&mut self) {
        self.commands.push(RenderCommand::ClearDepth);
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.commands.push(RenderCommand::SetViewport(viewport));
    }

    fn set_view_projection(&mut self, view: &Mat4, projection: &Mat4) {
        self.commands.push(RenderCommand::SetViewProjection {
            view: *view,
            projection: *projection,
        });
    }

    fn set_depth_bias(&mut self, constant: f32, slope: f32) {
        self.commands.push(RenderCommand::SetDepthBias { constant, slope });
    }

    fn draw_shadows(&mut self, request: &ShadowDrawRequest) {
        self.commands.push(RenderCommand::DrawShadows(*request));
    }

    fn set_global_int(&mut self, name: &'static str, value: i32) {
        self.commands.push(RenderCommand::SetGlobalInt { name, value });
    }

    fn set_global_vector(&mut self, name: &'static str, value: [f32; 4]) {
        self.commands.push(RenderCommand::SetGlobalVector { name, value });
    }

    fn set_global_vector_array(&mut self, name: &'static str, values: &[[f32; 4]]) {
        self.commands.push(RenderCommand::SetGlobalVectorArray {
            name,
            values: values.to_vec(),
        });
    }

    fn set_global_matrix_array(&mut self, name: &'static str, values: &[Mat4]) {
        self.commands.push(RenderCommand::SetGlobalMatrixArray {
            name,
            values: values.to_vec(),
        });
    }

    fn set_keyword(&mut self, name: &'static str, enabled: bool) {
        self.commands.push(RenderCommand::SetKeyword { name, enabled });
    }

    fn begin_sample(&mut self, name: &'static str) {
        self.commands.push(RenderCommand::BeginSample(name));
    }

    fn end_sample(&mut self, name: &'static str) {
        self.commands.push(RenderCommand::EndSample(name));
    }
}
