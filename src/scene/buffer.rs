use image::{Rgb, RgbImage};

use nalgebra as na;
use na::{Vector2, Vector4};

use super::util::color_to_rgb8;

/// Color and depth targets of a draw.
/// (0, 0) is the bottom left pixel, rows are flipped only when exporting an image.
pub struct FrameBuffer {
    pub width: u32,
    pub height: u32,
    z_buffer: Vec<f32>,         // Cleared to +inf, smaller is closer.
    color: Vec<Vector4<f32>>,   // Final pixel colors, unclamped.
    depth_data: Vec<u8>,        // Normalized values of the z-buffer for visualization.
}

impl FrameBuffer {
    /// Generates a frame buffer with specified width and height, cleared to opaque black.
    pub fn new(width: u32, height: u32) -> Self {
        let n_pixels = (width as usize) * (height as usize);
        return Self {
            width,
            height,
            z_buffer: vec![f32::INFINITY; n_pixels],
            color: vec![Vector4::new(0.0, 0.0, 0.0, 1.0); n_pixels],
            depth_data: vec![0; 3 * n_pixels],
        };
    }

    /// Sets every pixel to the background and resets the z-buffer.
    pub fn clear(&mut self, background: Vector4<f32>) {
        self.z_buffer.fill(f32::INFINITY);
        self.color.fill(background);
    }

    fn index(&self, coord: Vector2<u32>) -> Option<usize> {
        if coord.x >= self.width || coord.y >= self.height {
            return None;
        }
        return Some(coord.x as usize + coord.y as usize * self.width as usize);
    }

    /// Depth-tested write of a shaded fragment.
    /// Returns false when the fragment is discarded: out of bounds, depth outside [0, 1]
    /// (NaN and infinities included), or not in front of what is already stored.
    pub fn write_fragment(&mut self, coord: Vector2<u32>, depth: f32, color: Vector4<f32>) -> bool {
        let index = match self.index(coord) {
            Some(index) => index,
            None => return false,
        };
        // Stands in for near/far clipping, which the rasterizer doesn't do.
        if !(0.0..=1.0).contains(&depth) {
            return false;
        }
        if !(depth < self.z_buffer[index]) {
            return false;
        }
        self.z_buffer[index] = depth;
        self.color[index] = color;
        return true;
    }

    pub fn pixel(&self, coord: Vector2<u32>) -> Option<Vector4<f32>> {
        return self.index(coord).map(|index| self.color[index]);
    }

    pub fn depth(&self, coord: Vector2<u32>) -> Option<f32> {
        return self.index(coord).map(|index| self.z_buffer[index]);
    }

    /// Export of the color target as rgb8, top row first.
    /// This is where out of range colors get clamped.
    pub fn to_image(&self) -> RgbImage {
        return RgbImage::from_fn(self.width, self.height, |x, y| {
            let row = self.height - 1 - y;
            Rgb(color_to_rgb8(self.color[x as usize + row as usize * self.width as usize]))
        });
    }

    /// Get image data, representing z-buffer values, as rgb8 with the top row first.
    /// Lazy in a sense, that the data is calculated only if this call is made.
    /// Untouched pixels are black, the nearest written depth is white.
    pub fn as_depth_data(&mut self) -> &[u8] {
        let written = || self.z_buffer.iter().copied().filter(|z| z.is_finite());
        let z_max = written().fold(f32::MIN, f32::max);
        let z_min = written().fold(f32::MAX, f32::min);
        let scale = (z_max - z_min).max(f32::EPSILON);
        let width = self.width as usize;
        let height = self.height as usize;
        for i in 0..self.z_buffer.len() {
            let z = self.z_buffer[i];
            let value = if z.is_finite() {
                ((1.0 - (z - z_min) / scale) * 254.0 + 1.0).round() as u8
            } else {
                0
            };
            let (x, y) = (i % width, i / width);
            let target = 3 * (x + (height - 1 - y) * width);
            self.depth_data[target..target + 3].fill(value);
        }
        return &self.depth_data[..];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use na::vector;
    use pretty_assertions::assert_eq;

    #[test]
    fn closer_fragment_wins_regardless_of_order() {
        let red = vector![1.0, 0.0, 0.0, 1.0];
        let blue = vector![0.0, 0.0, 1.0, 1.0];
        let coord = vector![1, 1];

        let mut a = FrameBuffer::new(4, 4);
        assert!(a.write_fragment(coord, 0.3, red));
        assert!(!a.write_fragment(coord, 0.6, blue));

        let mut b = FrameBuffer::new(4, 4);
        assert!(b.write_fragment(coord, 0.6, blue));
        assert!(b.write_fragment(coord, 0.3, red));

        assert_eq!(a.pixel(coord), Some(red));
        assert_eq!(b.pixel(coord), Some(red));
        assert_eq!(a.depth(coord), Some(0.3));
    }

    #[test]
    fn equal_depth_keeps_first_write() {
        let mut buffer = FrameBuffer::new(2, 2);
        let coord = vector![0, 0];
        assert!(buffer.write_fragment(coord, 0.5, vector![1.0, 0.0, 0.0, 1.0]));
        assert!(!buffer.write_fragment(coord, 0.5, vector![0.0, 1.0, 0.0, 1.0]));
        assert_eq!(buffer.pixel(coord), Some(vector![1.0, 0.0, 0.0, 1.0]));
    }

    #[test]
    fn out_of_bounds_and_nan_depth_are_discarded() {
        let mut buffer = FrameBuffer::new(2, 2);
        assert!(!buffer.write_fragment(vector![2, 0], 0.1, vector![1.0, 1.0, 1.0, 1.0]));
        assert!(!buffer.write_fragment(vector![0, 0], f32::NAN, vector![1.0, 1.0, 1.0, 1.0]));
        assert_eq!(buffer.pixel(vector![2, 0]), None);
    }

    #[test]
    fn depth_outside_unit_range_is_discarded() {
        let mut buffer = FrameBuffer::new(1, 1);
        let coord = vector![0, 0];
        let red = vector![1.0, 0.0, 0.0, 1.0];
        for depth in [f32::NEG_INFINITY, f32::INFINITY, -0.01, 1.01] {
            assert!(!buffer.write_fragment(coord, depth, red), "depth {}", depth);
        }
        assert_eq!(buffer.depth(coord), Some(f32::INFINITY));
        assert_eq!(buffer.pixel(coord), Some(vector![0.0, 0.0, 0.0, 1.0]));

        // A later fragment at a valid depth is not masked by any of them.
        assert!(buffer.write_fragment(coord, 1.0, red));
        assert!(buffer.write_fragment(coord, 0.0, red));
        assert_eq!(buffer.depth(coord), Some(0.0));
    }

    #[test]
    fn export_flips_rows_and_clamps() {
        let mut buffer = FrameBuffer::new(2, 2);
        buffer.clear(vector![0.0, 0.0, 0.0, 1.0]);
        buffer.write_fragment(vector![0, 0], 0.5, vector![2.0, -1.0, 0.5, 1.0]);
        let image = buffer.to_image();
        // Bottom left in the buffer is the last row of the image.
        assert_eq!(image.get_pixel(0, 1), &Rgb([255, 0, 128]));
        assert_eq!(image.get_pixel(0, 0), &Rgb([0, 0, 0]));
    }

    #[test]
    fn clear_resets_depth_and_color() {
        let mut buffer = FrameBuffer::new(2, 1);
        buffer.write_fragment(vector![1, 0], 0.2, vector![1.0, 1.0, 1.0, 1.0]);
        buffer.clear(vector![0.25, 0.25, 0.25, 1.0]);
        assert_eq!(buffer.depth(vector![1, 0]), Some(f32::INFINITY));
        assert_eq!(buffer.pixel(vector![1, 0]), Some(vector![0.25, 0.25, 0.25, 1.0]));
    }

    #[test]
    fn depth_data_marks_nearest_white() {
        let mut buffer = FrameBuffer::new(3, 1);
        buffer.write_fragment(vector![0, 0], 0.1, vector![1.0, 1.0, 1.0, 1.0]);
        buffer.write_fragment(vector![1, 0], 0.9, vector![1.0, 1.0, 1.0, 1.0]);
        let data = buffer.as_depth_data();
        assert_eq!(&data[0..3], &[255, 255, 255]);
        assert_eq!(&data[3..6], &[1, 1, 1]);
        assert_eq!(&data[6..9], &[0, 0, 0]);
    }
}
