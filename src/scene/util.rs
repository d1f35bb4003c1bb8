use nalgebra as na;
use na::{vector, Vector3, Vector4};

/// Transformation of a point to homogenous coordinates.
pub fn to_hom_point(v: Vector3<f32>) -> Vector4<f32> {
    return vector![v.x, v.y, v.z, 1.0];
}

/// Perspective divide of a clip-space position.
pub fn from_hom_point(v: Vector4<f32>) -> Vector3<f32> {
    return vector![v.x / v.w, v.y / v.w, v.z / v.w];
}

/// Fixed-function conversion of a float color channel to rgb8.
/// Values outside of [0, 1] are clamped here and nowhere earlier in the pipeline.
pub fn channel_to_u8(value: f32) -> u8 {
    // NaN saturates to 0 through the float to int cast.
    return (value.clamp(0.0, 1.0) * 255.0).round() as u8;
}

/// Utility for converting the rgb part of a final pixel color to rgb8.
pub fn color_to_rgb8(color: Vector4<f32>) -> [u8; 3] {
    return [
        channel_to_u8(color.x),
        channel_to_u8(color.y),
        channel_to_u8(color.z),
    ];
}
