//! Skin textures: `skin{N}.BMP` decoded to RGBA8 before upload.

use std::path::{Path, PathBuf};

use corelib::{LoadError, LoadResult, SkinColor};
use image::ImageFormat;

pub const DEFAULT_SKINS_DIR: &str = "assets/skins";

/// Sampling filter used for both minification and magnification.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TextureFilter {
    #[default]
    Linear,
    Nearest,
}

/// Path of the skin bitmap for a color, e.g. `assets/skins/skin3.BMP`.
pub fn skin_path(dir: impl AsRef<Path>, color: SkinColor) -> PathBuf {
    dir.as_ref().join(format!("skin{}.BMP", color.index()))
}

/// Decoded skin in RGBA8, rows top-to-bottom.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkinImage {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl SkinImage {
    pub const BYTES_PER_PIXEL: u32 = 4;

    pub fn from_rgba8(width: u32, height: u32, data: Vec<u8>) -> LoadResult<Self> {
        let expected = width as usize * height as usize * Self::BYTES_PER_PIXEL as usize;
        if data.len() != expected {
            return Err(LoadError::decode(
                "<memory>",
                format!(
                    "RGBA8 buffer is {} bytes, expected {} for {}x{}",
                    data.len(),
                    expected,
                    width,
                    height
                ),
            ));
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Load the skin bitmap for `color` from `dir`.
    pub fn load_for(dir: impl AsRef<Path>, color: SkinColor) -> LoadResult<Self> {
        Self::load(skin_path(dir, color))
    }

    /// Load and decode a BMP file.
    pub fn load(path: impl AsRef<Path>) -> LoadResult<Self> {
        let path = path.as_ref();
        log::info!("Loading skin from {:?}", path);

        let bytes = std::fs::read(path).map_err(|e| LoadError::io(path, e))?;
        let img = image::load_from_memory_with_format(&bytes, ImageFormat::Bmp)
            .map_err(|e| LoadError::decode(path, e))?;

        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        let data = rgba.into_raw();

        log::info!("Loaded skin {}x{} with {} bytes", width, height, data.len());

        Self::from_rgba8(width, height, data)
    }

    pub fn row_bytes(&self) -> usize {
        self.width as usize * Self::BYTES_PER_PIXEL as usize
    }

    /// Copy with rows in bottom-to-top order.
    pub fn flipped_vertically(&self) -> Self {
        let row = self.row_bytes();
        let data = if row == 0 {
            Vec::new()
        } else {
            self.data.chunks_exact(row).rev().flatten().copied().collect()
        };
        Self {
            data,
            width: self.width,
            height: self.height,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0 && self.data.len() == self.row_bytes() * self.height as usize
    }
}
