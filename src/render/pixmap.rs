use std::io::{self, Write};

use crate::color::Color;

/// A rectangle of device pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IntRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl IntRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && y >= self.y && x < self.right() && y < self.bottom()
    }

    /// Empty rectangles are ignored
    pub fn union(&self, other: &IntRect) -> IntRect {
        if self.is_empty() {
            return *other;
        }

        if other.is_empty() {
            return *self;
        }

        let x = self.x.min(other.x);
        let y = self.y.min(other.y);

        IntRect::new(
            x,
            y,
            self.right().max(other.right()) - x,
            self.bottom().max(other.bottom()) - y,
        )
    }

    pub fn intersect(&self, other: &IntRect) -> IntRect {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if right <= x || bottom <= y {
            return IntRect::default();
        }

        IntRect::new(x, y, right - x, bottom - y)
    }
}

/// An RGBA8 raster with separated alpha, rows top to bottom
#[derive(Clone, PartialEq, Eq)]
pub struct Pixmap {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl std::fmt::Debug for Pixmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pixmap")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

impl Pixmap {
    /// Fully transparent
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * 4],
        }
    }

    pub fn filled(width: u32, height: u32, color: Color) -> Self {
        let mut pixmap = Self::new(width, height);
        pixmap.fill(color);
        pixmap
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn bounds(&self) -> IntRect {
        IntRect::new(0, 0, self.width, self.height)
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    pub fn fill(&mut self, color: Color) {
        let rgba = color.to_rgba8();

        for pixel in self.data.chunks_exact_mut(4) {
            pixel.copy_from_slice(&rgba);
        }
    }

    fn index(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }

        Some((y as usize * self.width as usize + x as usize) * 4)
    }

    /// Transparent outside the pixmap
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        match self.index(x, y) {
            Some(i) => [self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]],
            None => [0; 4],
        }
    }

    /// Composites `src` over the pixel, its alpha scaled by `coverage`
    pub fn blend_pixel(&mut self, x: u32, y: u32, src: [u8; 4], coverage: f32) {
        let Some(i) = self.index(x, y) else {
            return;
        };

        let src_a = f32::from(src[3]) / 255.0 * coverage.clamp(0.0, 1.0);
        if src_a <= 0.0 {
            return;
        }

        let dst_a = f32::from(self.data[i + 3]) / 255.0;
        let out_a = src_a + dst_a * (1.0 - src_a);

        for c in 0..3 {
            let s = f32::from(src[c]) / 255.0;
            let d = f32::from(self.data[i + c]) / 255.0;

            let out = (s * src_a + d * dst_a * (1.0 - src_a)) / out_a;
            self.data[i + c] = (out * 255.0).round().clamp(0.0, 255.0) as u8;
        }

        self.data[i + 3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
    }

    pub fn write_png(&self, writer: impl Write) -> io::Result<()> {
        let mut encoder = png::Encoder::new(writer, self.width, self.height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);

        let mut writer = encoder.write_header()?;
        writer.write_image_data(&self.data)?;
        writer.finish()?;

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn opaque_source_replaces() {
        let mut pixmap = Pixmap::filled(2, 2, Color::WHITE);

        pixmap.blend_pixel(1, 1, [255, 0, 0, 255], 1.0);

        assert_eq!(pixmap.pixel(1, 1), [255, 0, 0, 255]);
        assert_eq!(pixmap.pixel(0, 0), [255, 255, 255, 255]);
    }

    #[test]
    fn partial_coverage_mixes() {
        let mut pixmap = Pixmap::filled(1, 1, Color::WHITE);

        pixmap.blend_pixel(0, 0, [0, 0, 0, 255], 0.5);

        assert_eq!(pixmap.pixel(0, 0), [128, 128, 128, 255]);
    }

    #[test]
    fn onto_transparent_keeps_source_color() {
        let mut pixmap = Pixmap::new(1, 1);

        pixmap.blend_pixel(0, 0, [0, 0, 255, 255], 0.25);

        assert_eq!(pixmap.pixel(0, 0), [0, 0, 255, 64]);
    }

    #[test]
    fn out_of_bounds_is_ignored() {
        let mut pixmap = Pixmap::new(1, 1);

        pixmap.blend_pixel(5, 0, [0, 0, 0, 255], 1.0);

        assert_eq!(pixmap.pixel(5, 0), [0; 4]);
    }

    #[test]
    fn rect_union_and_intersection() {
        let a = IntRect::new(0, 0, 10, 10);
        let b = IntRect::new(5, 8, 10, 10);

        assert_eq!(a.union(&b), IntRect::new(0, 0, 15, 18));
        assert_eq!(a.intersect(&b), IntRect::new(5, 8, 5, 2));
        assert!(a.intersect(&IntRect::new(20, 20, 1, 1)).is_empty());
        assert_eq!(IntRect::default().union(&b), b);
    }

    #[test]
    fn png_signature() {
        let mut out = Vec::new();
        Pixmap::filled(3, 2, Color::BLACK).write_png(&mut out).unwrap();

        assert_eq!(&out[..8], b"\x89PNG\r\n\x1a\n");
    }
}
