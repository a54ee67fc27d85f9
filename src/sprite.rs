//! ARGB sprite buffers decoded from PNG assets.
//!
//! Sprites are plain pixel vectors the visualizer blits with alpha; the bug
//! sprite is rescaled to each bug's diameter with nearest-neighbour
//! sampling, matching the chunky look of the rest of the renderer.

use anyhow::{ensure, Context, Result};
use std::path::Path;

/// An image in packed 0xAARRGGBB pixels, straight alpha.
#[derive(Clone, Debug)]
pub struct Sprite {
    pub width:  usize,
    pub height: usize,
    pub pixels: Vec<u32>,
}

impl Sprite {
    /// Decode a PNG asset.  Missing or undecodable files are fatal at
    /// startup.
    pub fn load(path: &Path) -> Result<Sprite> {
        let img = image::open(path)
            .with_context(|| format!("failed to load image asset {:?}", path))?
            .to_rgba8();
        let (w, h) = img.dimensions();
        let pixels = img
            .pixels()
            .map(|p| {
                let [r, g, b, a] = p.0;
                (a as u32) << 24 | (r as u32) << 16 | (g as u32) << 8 | b as u32
            })
            .collect();
        Ok(Sprite {
            width:  w as usize,
            height: h as usize,
            pixels,
        })
    }

    pub fn from_argb(width: usize, height: usize, pixels: Vec<u32>) -> Result<Sprite> {
        ensure!(
            pixels.len() == width * height,
            "sprite buffer is {} pixels, expected {}x{}",
            pixels.len(),
            width,
            height
        );
        Ok(Sprite { width, height, pixels })
    }

    pub fn pixel(&self, x: usize, y: usize) -> u32 {
        self.pixels[y * self.width + x]
    }

    /// Nearest-neighbour rescale.
    pub fn scaled(&self, width: usize, height: usize) -> Sprite {
        let width = width.max(1);
        let height = height.max(1);
        let mut pixels = Vec::with_capacity(width * height);
        for y in 0..height {
            let sy = y * self.height / height;
            for x in 0..width {
                let sx = x * self.width / width;
                pixels.push(self.pixel(sx, sy));
            }
        }
        Sprite { width, height, pixels }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn checker() -> Sprite {
        // 2x2: red, green / blue, white
        Sprite::from_argb(
            2,
            2,
            vec![0xFFFF0000, 0xFF00FF00, 0xFF0000FF, 0xFFFFFFFF],
        )
        .unwrap()
    }

    #[test]
    fn from_argb_rejects_bad_lengths() {
        assert!(Sprite::from_argb(2, 2, vec![0; 3]).is_err());
    }

    #[test]
    fn scaled_up_repeats_source_pixels() {
        let s = checker().scaled(4, 4);
        assert_eq!(s.pixel(0, 0), 0xFFFF0000);
        assert_eq!(s.pixel(1, 1), 0xFFFF0000);
        assert_eq!(s.pixel(3, 0), 0xFF00FF00);
        assert_eq!(s.pixel(0, 3), 0xFF0000FF);
        assert_eq!(s.pixel(3, 3), 0xFFFFFFFF);
    }

    #[test]
    fn scaled_down_samples_nearest() {
        let s = checker().scaled(1, 1);
        assert_eq!(s.width, 1);
        assert_eq!(s.pixel(0, 0), 0xFFFF0000);
    }

    #[test]
    fn load_missing_file_is_fatal() {
        assert!(Sprite::load(Path::new("definitely/not/here.png")).is_err());
    }
}
