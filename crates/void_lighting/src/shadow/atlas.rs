//! Shadow Atlas Tiling
//!
//! Every reserved directional light renders its cascades into square tiles of
//! one shared atlas texture. Tiles are laid out row-major in a `split x split`
//! grid, where the split is the smallest of 1, 2 or 4 that fits all tiles.
//!
//! Shading samples the atlas through a matrix that takes world space straight
//! to atlas UV + depth, built by [`to_atlas_matrix`].

use serde::{Serialize, Deserialize};

use crate::context::Viewport;
use crate::math::{row, set_row, Mat4};

/// Layout of the shadow atlas for one frame
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtlasLayout {
    /// Atlas width and height in texels
    pub atlas_size: u32,
    /// Number of tiles in use
    pub tile_count: u32,
    /// Tiles per row and per column
    pub split: u32,
    /// Tile width and height in texels
    pub tile_size: u32,
}

impl AtlasLayout {
    /// Layout for `tile_count` tiles in an atlas of `atlas_size` texels
    pub fn new(atlas_size: u32, tile_count: u32) -> Self {
        let split = split_for_tiles(tile_count);
        Self {
            atlas_size,
            tile_count,
            split,
            tile_size: atlas_size / split,
        }
    }

    /// Viewport of a tile
    pub fn viewport(&self, tile_index: u32) -> Viewport {
        tile_viewport(tile_index, self.split, self.tile_size as f32)
    }

    /// Grid cell of a tile
    pub fn offset(&self, tile_index: u32) -> [f32; 2] {
        tile_offset(tile_index, self.split)
    }
}

/// Split factor for a tile count: 1, 2 or 4
pub fn split_for_tiles(tile_count: u32) -> u32 {
    if tile_count <= 1 {
        1
    } else if tile_count <= 4 {
        2
    } else {
        4
    }
}

/// Grid cell `(column, row)` of a linear tile index
pub fn tile_offset(tile_index: u32, split: u32) -> [f32; 2] {
    [(tile_index % split) as f32, (tile_index / split) as f32]
}

/// Pixel viewport of a tile
pub fn tile_viewport(tile_index: u32, split: u32, tile_size: f32) -> Viewport {
    let offset = tile_offset(tile_index, split);
    Viewport {
        x: offset[0] * tile_size,
        y: offset[1] * tile_size,
        width: tile_size,
        height: tile_size,
    }
}

/// Remap a view-projection so clip space lands in the tile's block of atlas UV space.
///
/// X and Y go from [-1, 1] to `[offset, offset + 1] / split`, Z from [-1, 1]
/// to [0, 1]. With a reversed depth buffer the Z row is negated first.
pub fn to_atlas_matrix(view_proj: &Mat4, offset: [f32; 2], split: u32, reversed_z: bool) -> Mat4 {
    let mut m = *view_proj;

    if reversed_z {
        let z = row(&m, 2);
        set_row(&mut m, 2, [-z[0], -z[1], -z[2], -z[3]]);
    }

    let scale = 1.0 / split as f32;
    let w = row(&m, 3);
    let x = row(&m, 0);
    let y = row(&m, 1);
    let z = row(&m, 2);

    let mut remapped_x = [0.0f32; 4];
    let mut remapped_y = [0.0f32; 4];
    let mut remapped_z = [0.0f32; 4];
    for c in 0..4 {
        remapped_x[c] = (0.5 * (x[c] + w[c]) + offset[0] * w[c]) * scale;
        remapped_y[c] = (0.5 * (y[c] + w[c]) + offset[1] * w[c]) * scale;
        remapped_z[c] = 0.5 * (z[c] + w[c]);
    }

    set_row(&mut m, 0, remapped_x);
    set_row(&mut m, 1, remapped_y);
    set_row(&mut m, 2, remapped_z);
    m
}
