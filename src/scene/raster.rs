//! Fixed-function part of the pipeline sitting between the two stages.
//!
//! The rasterizer and the interpolator are traits so that a host can swap in its own
//! coverage rules or interpolation scheme, and so the stages can be driven with synthetic
//! fragments in tests.

use super::shader::VertexOutput;
use super::util::from_hom_point;

use na::{vector, Vector2, Vector3};
use nalgebra as na;

/// A covered pixel, produced by the rasterizer and handed to the shading stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fragment {
    pub coord: Vector2<u32>,   // Pixel in the target, (0, 0) is the bottom left.
    pub depth: f32,            // Window-space depth in [0, 1] for visible geometry.
    pub weights: Vector3<f32>, // Barycentric weights of the three vertices.
    pub color: Vector3<f32>,   // Interpolated vertex color.
}

/// Combines per-vertex colors of a primitive into the color at one pixel.
pub trait Interpolator {
    fn interpolate(&self, colors: &[Vector3<f32>; 3], weights: Vector3<f32>) -> Vector3<f32>;
}

/// Plain barycentric blend: `w0 * c0 + w1 * c1 + w2 * c2`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LinearInterpolator;

impl Interpolator for LinearInterpolator {
    fn interpolate(&self, colors: &[Vector3<f32>; 3], weights: Vector3<f32>) -> Vector3<f32> {
        return vector![
            weights.x * colors[0].x + weights.y * colors[1].x + weights.z * colors[2].x,
            weights.x * colors[0].y + weights.y * colors[1].y + weights.z * colors[2].y,
            weights.x * colors[0].z + weights.y * colors[1].z + weights.z * colors[2].z
        ];
    }
}

/// Turns one transformed triangle into the fragments it covers.
pub trait Rasterizer {
    fn rasterize<I, F>(&self, triangle: &[VertexOutput; 3], interpolator: &I, emit: F)
    where
        I: Interpolator,
        F: FnMut(Fragment);
}

/// Bounding box scan with edge functions, sampling at pixel centers.
///
/// Triangles of either winding are filled. Nothing is clipped: a triangle with a vertex at or
/// behind the eye (`w <= 0`) is dropped whole, as is a zero-area one.
#[derive(Debug, Clone, Copy)]
pub struct EdgeFunctionRasterizer {
    pub width: u32,
    pub height: u32,
}

impl EdgeFunctionRasterizer {
    pub fn new(width: u32, height: u32) -> Self {
        return Self { width, height };
    }

    /// Perspective divide and viewport transform. x, y end up in pixels, z in [0, 1].
    fn to_window(&self, vertex: &VertexOutput) -> Option<Vector3<f32>> {
        // Also catches NaN.
        if !(vertex.clip_position.w > 0.0) {
            return None;
        }
        let ndc = from_hom_point(vertex.clip_position);
        return Some(vector![
            (ndc.x + 1.0) * 0.5 * self.width as f32,
            (ndc.y + 1.0) * 0.5 * self.height as f32,
            (ndc.z + 1.0) * 0.5
        ]);
    }
}

/// Twice the signed area of (a, b, p), positive when p is to the left of a -> b.
fn edge_function(a: Vector2<f32>, b: Vector2<f32>, p: Vector2<f32>) -> f32 {
    return (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x);
}

impl Rasterizer for EdgeFunctionRasterizer {
    fn rasterize<I, F>(&self, triangle: &[VertexOutput; 3], interpolator: &I, mut emit: F)
    where
        I: Interpolator,
        F: FnMut(Fragment),
    {
        if self.width == 0 || self.height == 0 {
            return;
        }
        let mut window = [Vector3::<f32>::zeros(); 3];
        for i in 0..3 {
            match self.to_window(&triangle[i]) {
                Some(position) => window[i] = position,
                None => return,
            }
        }
        let (a, b, c) = (window[0].xy(), window[1].xy(), window[2].xy());
        let area = edge_function(a, b, c);
        if area == 0.0 || !area.is_finite() {
            return;
        }

        let min_x = a.x.min(b.x).min(c.x).floor().max(0.0) as u32;
        let min_y = a.y.min(b.y).min(c.y).floor().max(0.0) as u32;
        let max_x = a.x.max(b.x).max(c.x).ceil().min((self.width - 1) as f32) as u32;
        let max_y = a.y.max(b.y).max(c.y).ceil().min((self.height - 1) as f32) as u32;
        if min_x > max_x || min_y > max_y {
            return;
        }

        let colors = [triangle[0].color, triangle[1].color, triangle[2].color];
        let depths = vector![window[0].z, window[1].z, window[2].z];
        // @OPTI edge functions are affine in x and y, they could be stepped instead of recomputed.
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let p = vector![x as f32 + 0.5, y as f32 + 0.5];
                let w0 = edge_function(b, c, p) / area;
                let w1 = edge_function(c, a, p) / area;
                // Third weight follows from the other two.
                let w2 = 1.0 - w0 - w1;
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }
                let weights = vector![w0, w1, w2];
                emit(Fragment {
                    coord: vector![x, y],
                    depth: weights.dot(&depths),
                    weights,
                    color: interpolator.interpolate(&colors, weights),
                });
            }
        }
    }
}
