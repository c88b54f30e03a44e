use serde::{Deserialize, Serialize};

/// Opaque id of a texture owned outside of Solis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextureId(u32);

impl TextureId {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// Sampler target of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextureTarget {
    D2,
    D2Array,
    D3,
    Cubemap,
}

/// Non-owning reference to an externally owned texture.
///
/// Solis never creates, mutates or frees the texture behind a `TextureRef`. Whoever
/// owns it must keep it alive for as long as any environment refers to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextureRef {
    pub id: TextureId,
    pub target: TextureTarget,
    /// Width (and height) of mip level 0. For cubemaps, the size of one face.
    pub size: u32,
    /// Number of mip levels in the chain, at least 1.
    pub levels: u8,
}

impl TextureRef {
    pub fn cubemap(id: TextureId, size: u32, levels: u8) -> Self {
        Self {
            id,
            target: TextureTarget::Cubemap,
            size,
            levels: levels.max(1),
        }
    }

    pub fn is_cubemap(&self) -> bool {
        self.target == TextureTarget::Cubemap
    }

    /// Index of the last mip level.
    pub fn max_level(&self) -> u8 {
        self.levels.saturating_sub(1)
    }

    /// Face size of a given mip level.
    pub fn level_size(&self, level: u8) -> u32 {
        (self.size >> level.min(31)).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cubemap_mip_chain() {
        let tex = TextureRef::cubemap(TextureId::new(7), 256, 9);
        assert!(tex.is_cubemap());
        assert_eq!(tex.max_level(), 8);
        assert_eq!(tex.level_size(0), 256);
        assert_eq!(tex.level_size(3), 32);
        assert_eq!(tex.level_size(12), 1);
    }

    #[test]
    fn level_count_never_drops_below_one() {
        let tex = TextureRef::cubemap(TextureId::new(1), 64, 0);
        assert_eq!(tex.levels, 1);
        assert_eq!(tex.max_level(), 0);
    }
}
