//! RGB float framebuffer with 8-bit export.

use crate::util::Vec3;

#[derive(Debug, Clone)]
pub struct Framebuffer {
    width: u32,
    height: u32,
    pixels: Vec<Vec3>,
}

impl Framebuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height, pixels: vec![Vec3::ZERO; (width * height) as usize] }
    }

    pub fn from_pixels(width: u32, height: u32, pixels: Vec<Vec3>) -> Self {
        debug_assert_eq!(pixels.len(), (width * height) as usize);
        Self { width, height, pixels }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn get(&self, x: u32, y: u32) -> Vec3 {
        self.pixels[(y * self.width + x) as usize]
    }

    pub fn set(&mut self, x: u32, y: u32, c: Vec3) {
        self.pixels[(y * self.width + x) as usize] = c;
    }

    pub fn pixels(&self) -> &[Vec3] {
        &self.pixels
    }

    /// Row-major RGBA8, `exposure` applied, clamped to [0, 1].
    pub fn to_rgba8(&self, exposure: f32) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixels.len() * 4);
        for c in &self.pixels {
            let c = (*c * exposure).clamp(Vec3::ZERO, Vec3::ONE);
            out.extend_from_slice(&[to_u8(c.x), to_u8(c.y), to_u8(c.z), 255]);
        }
        out
    }

    #[cfg(feature = "image")]
    pub fn save_png(&self, path: &std::path::Path, exposure: f32) -> crate::util::Result<()> {
        save_rgba8_png(path, self.width, self.height, self.to_rgba8(exposure))
    }
}

#[inline]
fn to_u8(v: f32) -> u8 {
    (v * 255.0 + 0.5) as u8
}

/// Write tightly packed RGBA8 rows as PNG.
#[cfg(feature = "image")]
pub fn save_rgba8_png(path: &std::path::Path, width: u32, height: u32, rgba: Vec<u8>) -> crate::util::Result<()> {
    let img = image::RgbaImage::from_raw(width, height, rgba)
        .ok_or_else(|| crate::util::Error::other("pixel buffer does not match image size"))?;
    img.save(path)?;
    log::info!("Wrote {}x{} image to {}", width, height, path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgba8_clamps() {
        let mut fb = Framebuffer::new(2, 1);
        fb.set(0, 0, Vec3::new(0.5, 2.0, -1.0));
        fb.set(1, 0, Vec3::ONE);
        assert_eq!(fb.to_rgba8(1.0), vec![128, 255, 0, 255, 255, 255, 255, 255]);
        assert_eq!(&fb.to_rgba8(0.5)[4..7], &[128, 128, 128]);
    }

    #[cfg(feature = "image")]
    #[test]
    fn test_save_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        let fb = Framebuffer::new(4, 3);
        fb.save_png(&path, 1.0).unwrap();
        let img = image::open(&path).unwrap();
        assert_eq!((img.width(), img.height()), (4, 3));
    }
}
