use anyhow::{Context, Result};
use image::{imageops::FilterType, DynamicImage, ImageFormat};
use std::path::Path;

use crate::config::default::{THUMBNAIL_HEIGHT, THUMBNAIL_RATIO};

/// Turns a captured frame into a preview image
pub trait Thumbnailer: Send + Sync {
    fn make_thumbnail(&self, source: &Path, target: &Path) -> Result<()>;
}

/// Resizes frames to a fixed 16:9 WebP preview using the `image` crate.
#[derive(Debug, Clone)]
pub struct ImageThumbnailer {
    pub height: u32,
    pub ratio: f64,
}

impl Default for ImageThumbnailer {
    fn default() -> Self {
        Self {
            height: THUMBNAIL_HEIGHT,
            ratio: THUMBNAIL_RATIO,
        }
    }
}

impl ImageThumbnailer {
    /// Width of the preview, truncated to whole pixels.
    pub fn width(&self) -> u32 {
        (self.height as f64 * self.ratio) as u32
    }
}

impl Thumbnailer for ImageThumbnailer {
    fn make_thumbnail(&self, source: &Path, target: &Path) -> Result<()> {
        if !source.exists() {
            anyhow::bail!("image path does not exist: {}", source.display());
        }
        let img = image::open(source).with_context(|| format!("decode {}", source.display()))?;
        let resized = img.resize_exact(self.width(), self.height, FilterType::Triangle);
        // The WebP encoder only takes 8-bit buffers
        let rgba = DynamicImage::ImageRgba8(resized.to_rgba8());
        rgba.save_with_format(target, ImageFormat::WebP)
            .with_context(|| format!("encode {}", target.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgb, RgbImage};

    #[test]
    fn default_size_is_320x180() {
        let t = ImageThumbnailer::default();
        assert_eq!(t.width(), 320);
        assert_eq!(t.height, 180);
    }

    #[test]
    fn resizes_png_frame_to_webp() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("frame.png");
        let dst = dir.path().join("frame.webp");
        RgbImage::from_pixel(64, 48, Rgb([10, 200, 30])).save(&src).unwrap();

        ImageThumbnailer::default().make_thumbnail(&src, &dst).unwrap();

        let thumb = image::open(&dst).unwrap();
        assert_eq!(thumb.dimensions(), (320, 180));
    }

    #[test]
    fn missing_source_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = ImageThumbnailer::default()
            .make_thumbnail(&dir.path().join("nope.png"), &dir.path().join("nope.webp"))
            .unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn garbage_frame_fails() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("frame.png");
        std::fs::write(&src, b"not an image").unwrap();
        assert!(ImageThumbnailer::default()
            .make_thumbnail(&src, &dir.path().join("frame.webp"))
            .is_err());
    }
}
