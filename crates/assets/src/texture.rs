use crate::AssetError;
use glam::Vec2;
use image::{RgbaImage, imageops::FilterType};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;

/// Content-addressed texture source id, derived from the source path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TextureId(pub u64);

impl TextureId {
    pub fn from_path(path: &str) -> Self {
        let digest = Sha256::digest(path.replace('\\', "/").as_bytes());
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest[..8]);
        Self(u64::from_le_bytes(bytes))
    }
}

/// How texel values are interpreted when sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorSpace {
    /// Colour data; decoded to linear by the sampler.
    Srgb,
    /// Non-colour data (normals, roughness, masks).
    #[default]
    Linear,
}

/// Texture addressing outside [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WrapMode {
    #[default]
    ClampToEdge,
    Repeat,
}

/// A sampled view of a texture source: tiling, wrap and colour space.
///
/// Several textures may share one source with different settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Texture {
    pub source: TextureId,
    pub repeat: Vec2,
    pub rotation: f32,
    pub wrap_s: WrapMode,
    pub wrap_t: WrapMode,
    pub color_space: ColorSpace,
}

impl Texture {
    pub fn new(source: TextureId) -> Self {
        Self {
            source,
            repeat: Vec2::ONE,
            rotation: 0.0,
            wrap_s: WrapMode::ClampToEdge,
            wrap_t: WrapMode::ClampToEdge,
            color_space: ColorSpace::Linear,
        }
    }

    pub fn srgb(mut self) -> Self {
        self.color_space = ColorSpace::Srgb;
        self
    }

    /// Tile `x` by `y` times, wrapping on both axes.
    pub fn tiled(mut self, x: f32, y: f32) -> Self {
        self.repeat = Vec2::new(x, y);
        self.wrap_s = WrapMode::Repeat;
        self.wrap_t = WrapMode::Repeat;
        self
    }

    pub fn rotated(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }

    /// Rows of the 2x3 uv transform: `uv' = [row0 . (u, v, 1), row1 . (u, v, 1)]`.
    ///
    /// Rotation is about the uv origin and applied before the repeat scale.
    pub fn uv_transform(&self) -> [[f32; 3]; 2] {
        let (s, c) = self.rotation.sin_cos();
        let (sx, sy) = (self.repeat.x, self.repeat.y);
        [[sx * c, sx * s, 0.0], [-sy * s, sy * c, 0.0]]
    }
}

/// Decoded RGBA8 pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl TextureData {
    pub fn solid(rgba: [u8; 4]) -> Self {
        Self {
            width: 1,
            height: 1,
            rgba: rgba.to_vec(),
        }
    }

    pub fn from_image(image: RgbaImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
            rgba: image.into_raw(),
        }
    }

    /// Number of mip levels down to 1x1.
    pub fn mip_level_count(&self) -> u32 {
        32 - self.width.max(self.height).max(1).leading_zeros()
    }

    /// Box-filtered mip chain starting with the full-size level.
    pub fn mip_chain(&self) -> Vec<TextureData> {
        let mut levels = vec![self.clone()];
        let Some(mut current) = RgbaImage::from_raw(self.width, self.height, self.rgba.clone())
        else {
            return levels;
        };
        while current.width() > 1 || current.height() > 1 {
            let w = (current.width() / 2).max(1);
            let h = (current.height() / 2).max(1);
            current = image::imageops::resize(&current, w, h, FilterType::Triangle);
            levels.push(Self::from_image(current.clone()));
        }
        levels
    }
}

/// Decode an image file into RGBA8.
pub fn load_texture(path: impl AsRef<Path>) -> Result<TextureData, AssetError> {
    let path = path.as_ref();
    let image = image::open(path)?.to_rgba8();
    tracing::debug!(
        "decoded texture {} ({}x{})",
        path.display(),
        image.width(),
        image.height()
    );
    Ok(TextureData::from_image(image))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn texture_id_is_stable_and_path_sensitive() {
        let a = TextureId::from_path("floor/alpha.webp");
        assert_eq!(a, TextureId::from_path("floor/alpha.webp"));
        assert_eq!(a, TextureId::from_path("floor\\alpha.webp"));
        assert_ne!(a, TextureId::from_path("floor/alpha.jpg"));
    }

    #[test]
    fn tiled_sets_repeat_wrap() {
        let t = Texture::new(TextureId(1)).tiled(8.0, 8.0);
        assert_eq!(t.repeat, Vec2::splat(8.0));
        assert_eq!(t.wrap_s, WrapMode::Repeat);
        assert_eq!(t.wrap_t, WrapMode::Repeat);
    }

    #[test]
    fn uv_transform_identity_and_rotation() {
        let t = Texture::new(TextureId(1));
        assert_eq!(t.uv_transform(), [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);

        let r = Texture::new(TextureId(1))
            .tiled(1.0, 3.0)
            .rotated(std::f32::consts::FRAC_PI_2);
        let m = r.uv_transform();
        // (1, 0) rotates to (0, -1) and is stretched 3x on v.
        let u = m[0][0];
        let v = m[1][0];
        assert!(u.abs() < 1e-6);
        assert!((v + 3.0).abs() < 1e-5);
    }

    #[test]
    fn mip_chain_reaches_one_pixel() {
        let data = TextureData {
            width: 8,
            height: 2,
            rgba: vec![255; 8 * 2 * 4],
        };
        assert_eq!(data.mip_level_count(), 4);
        let chain = data.mip_chain();
        assert_eq!(chain.len(), 4);
        let last = chain.last().unwrap();
        assert_eq!((last.width, last.height), (1, 1));
    }

    #[test]
    fn load_texture_from_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grave.png");
        RgbaImage::from_pixel(4, 2, image::Rgba([10, 20, 30, 255]))
            .save(&path)
            .unwrap();

        let data = load_texture(&path).unwrap();
        assert_eq!((data.width, data.height), (4, 2));
        assert_eq!(&data.rgba[..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn load_texture_missing_file() {
        assert!(load_texture("/definitely/not/here.webp").is_err());
    }
}
