//! The two programmable stages of the pipeline.
//!
//! Matrices follow nalgebra's column-vector convention: a vertex is a column on the right and
//! transforms are applied right to left, so the clip-space position is `P * V * M * p`.
//! Both stages are plain functions of their arguments. Nothing is validated or clamped here,
//! non-finite values go straight through.

use super::util::to_hom_point;

use na::{vector, Matrix4, Vector3, Vector4};
use nalgebra as na;

/// Per-vertex attributes, as found in the host's vertex buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexInput {
    pub position: Vector3<f32>, // Slot 0, object space.
    pub color: Vector3<f32>,    // Slot 1, normalized intensities, range unconstrained.
}

impl VertexInput {
    pub fn new(position: Vector3<f32>, color: Vector3<f32>) -> Self {
        return Self { position, color };
    }
}

/// Transform matrices bound for the duration of a draw call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Uniforms {
    pub model: Matrix4<f32>,
    pub view: Matrix4<f32>,
    pub projection: Matrix4<f32>,
}

impl Uniforms {
    pub fn new(model: Matrix4<f32>, view: Matrix4<f32>, projection: Matrix4<f32>) -> Self {
        return Self {
            model,
            view,
            projection,
        };
    }

    /// All three matrices set to identity, object space is clip space.
    pub fn identity() -> Self {
        return Self::new(Matrix4::identity(), Matrix4::identity(), Matrix4::identity());
    }
}

impl Default for Uniforms {
    fn default() -> Self {
        return Self::identity();
    }
}

/// Result of the transform stage, consumed by the rasterizer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexOutput {
    pub clip_position: Vector4<f32>, // Homogeneous, before the perspective divide.
    pub color: Vector3<f32>,         // Forwarded untouched for interpolation.
}

/// Transform stage (vertex shader).
///
/// Applies model, view and projection in that order to the position and passes the color
/// through unchanged. The product is evaluated as `P * (V * (M * p))` for every vertex, so
/// the result does not depend on any precomputed matrix product.
pub fn transform_stage(vertex: &VertexInput, uniforms: &Uniforms) -> VertexOutput {
    let world_position = uniforms.model * to_hom_point(vertex.position);
    let view_position = uniforms.view * world_position;
    let clip_position = uniforms.projection * view_position;
    return VertexOutput {
        clip_position,
        color: vertex.color,
    };
}

/// Shading stage (fragment shader).
///
/// Takes the color interpolated by the rasterizer and makes it fully opaque.
pub fn shading_stage(interpolated_color: Vector3<f32>) -> Vector4<f32> {
    return vector![interpolated_color.x, interpolated_color.y, interpolated_color.z, 1.0];
}
