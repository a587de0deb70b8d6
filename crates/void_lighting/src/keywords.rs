//! Shader Keyword Groups
//!
//! Some shading variants are mutually exclusive: at most one keyword of a
//! group may be active. A selection is an `Option<K>`; `None` disables the
//! whole group.

use crate::context::GraphicsContext;
use crate::shadow::config::{CascadeBlendMode, FilterMode, ShadowmaskMode};

/// Keyword that switches shading to the per-object light index path
pub const LIGHTS_PER_OBJECT_KEYWORD: &str = "_LIGHT_PER_OBJECT";

/// Largest keyword group
pub const MAX_GROUP_KEYWORDS: usize = 4;

/// A group of mutually exclusive shader keywords
pub trait KeywordGroup: Copy {
    /// All keywords of the group, in index order
    const KEYWORDS: &'static [&'static str];

    /// Index of this variant in `KEYWORDS`
    fn index(self) -> usize;

    /// Keyword name for this variant
    fn keyword(self) -> &'static str {
        Self::KEYWORDS[self.index()]
    }
}

/// Flag states for a group of `N` keywords with `enabled` active.
///
/// A negative or out-of-range index deactivates every flag.
pub fn mode_flags<const N: usize>(enabled: i32) -> [bool; N] {
    let mut flags = [false; N];
    if enabled >= 0 && (enabled as usize) < N {
        flags[enabled as usize] = true;
    }
    flags
}

/// Integer index of a selection, -1 when disabled
pub fn selection_index<K: KeywordGroup>(selection: Option<K>) -> i32 {
    selection.map_or(-1, |k| k.index() as i32)
}

/// Iterate `(keyword, enabled)` pairs for a selection, covering the full group
pub fn keyword_states<K: KeywordGroup>(
    selection: Option<K>,
) -> impl Iterator<Item = (&'static str, bool)> {
    let flags = mode_flags::<MAX_GROUP_KEYWORDS>(selection_index(selection));
    K::KEYWORDS.iter().copied().zip(flags)
}

/// Write every keyword of a group to the context, enabling at most one
pub fn apply_keyword_group<K: KeywordGroup, G: GraphicsContext + ?Sized>(
    context: &mut G,
    selection: Option<K>,
) {
    for (name, enabled) in keyword_states(selection) {
        context.set_keyword(name, enabled);
    }
}

/// Directional PCF filter keywords
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DirectionalFilterKeyword {
    Pcf3,
    Pcf5,
    Pcf7,
}

impl KeywordGroup for DirectionalFilterKeyword {
    const KEYWORDS: &'static [&'static str] = &[
        "_DIRECTIONAL_PCF3",
        "_DIRECTIONAL_PCF5",
        "_DIRECTIONAL_PCF7",
    ];

    fn index(self) -> usize {
        self as usize
    }
}

impl DirectionalFilterKeyword {
    /// Keyword for a filter mode; the 2x2 kernel is the keyword-less default
    pub fn select(filter: FilterMode) -> Option<Self> {
        match filter {
            FilterMode::Pcf2x2 => None,
            FilterMode::Pcf3x3 => Some(Self::Pcf3),
            FilterMode::Pcf5x5 => Some(Self::Pcf5),
            FilterMode::Pcf7x7 => Some(Self::Pcf7),
        }
    }
}

/// Cascade blend keywords
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CascadeBlendKeyword {
    Soft,
    Dither,
}

impl KeywordGroup for CascadeBlendKeyword {
    const KEYWORDS: &'static [&'static str] = &[
        "_CASCADE_BLEND_SOFT",
        "_CASCADE_BLEND_DITHER",
    ];

    fn index(self) -> usize {
        self as usize
    }
}

impl CascadeBlendKeyword {
    /// Keyword for a blend mode; hard transitions need none
    pub fn select(mode: CascadeBlendMode) -> Option<Self> {
        match mode {
            CascadeBlendMode::Hard => None,
            CascadeBlendMode::Soft => Some(Self::Soft),
            CascadeBlendMode::Dither => Some(Self::Dither),
        }
    }
}

/// Shadow mask keywords
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShadowMaskKeyword {
    Always,
    Distance,
}

impl KeywordGroup for ShadowMaskKeyword {
    const KEYWORDS: &'static [&'static str] = &[
        "_SHADOW_MASK_ALWAYS",
        "_SHADOW_MASK_DISTANCE",
    ];

    fn index(self) -> usize {
        self as usize
    }
}

impl ShadowMaskKeyword {
    /// Keyword for the frame: none unless some light uses the shadow mask
    pub fn select(use_shadow_mask: bool, mode: ShadowmaskMode) -> Option<Self> {
        if !use_shadow_mask {
            return None;
        }
        match mode {
            ShadowmaskMode::Shadowmask => Some(Self::Always),
            ShadowmaskMode::DistanceShadowmask => Some(Self::Distance),
        }
    }
}
