use fs_err as fs;
use image::imageops::FilterType;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const BYTES_PER_PIXEL: usize = 4;

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Unreadable image '{}': {source}", path.display())]
    UnreadableImage {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("Image has zero width or height")]
    EmptyImage,
    #[error("Pixel buffer holds {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },
}

/// RGBA8 pixels, row-major, 4 bytes per pixel. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl DecodedImage {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, ImageError> {
        if width == 0 || height == 0 {
            return Err(ImageError::EmptyImage);
        }
        let expected = width as usize * height as usize * BYTES_PER_PIXEL;
        if pixels.len() != expected {
            return Err(ImageError::BufferSize {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Decodes `path` and shrinks it to fit a `max_side` square, keeping the
    /// aspect ratio. Images already inside the square are never enlarged.
    pub fn load_thumbnail(path: &Path, max_side: u32) -> Result<Self, ImageError> {
        let unreadable = |source: Box<dyn std::error::Error + Send + Sync>| {
            ImageError::UnreadableImage {
                path: path.to_path_buf(),
                source,
            }
        };

        let bytes = fs::read(path).map_err(|e| unreadable(Box::new(e)))?;
        let decoded = image::load_from_memory(&bytes).map_err(|e| unreadable(Box::new(e)))?;
        if decoded.width() == 0 || decoded.height() == 0 {
            return Err(ImageError::EmptyImage);
        }

        let (width, height) = fit_within(decoded.width(), decoded.height(), max_side);
        let resized = if (width, height) == (decoded.width(), decoded.height()) {
            decoded
        } else {
            decoded.resize_exact(width, height, FilterType::Triangle)
        };

        let rgba = resized.into_rgba8();
        Self::new(rgba.width(), rgba.height(), rgba.into_raw())
    }

    /// Grey checkerboard shown before any photograph is chosen. Being fully
    /// desaturated, its histogram is empty.
    pub fn placeholder(side: u32) -> Self {
        let side = side.max(1);
        let tile = (side / 8).max(1);
        let pixels = (0..side)
            .flat_map(|y| (0..side).map(move |x| (x, y)))
            .flat_map(|(x, y)| {
                let level = if (x / tile + y / tile) % 2 == 0 { 96 } else { 160 };
                [level, level, level, 255]
            })
            .collect();

        Self {
            width: side,
            height: side,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

/// Thumbnail dimensions: the largest size with the same aspect ratio that fits
/// in a `max_side` square, or the original size if it already fits.
pub fn fit_within(width: u32, height: u32, max_side: u32) -> (u32, u32) {
    let max_side = max_side.max(1);
    if width <= max_side && height <= max_side {
        return (width, height);
    }

    let scale = max_side as f64 / width.max(height) as f64;
    let fit = |side: u32| ((side as f64 * scale).round() as u32).clamp(1, max_side);
    (fit(width), fit(height))
}
