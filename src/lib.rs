//! A two stage vertex/fragment color pipeline running on the CPU.
//!
//! [`transform_stage`] maps an object-space vertex to clip space with `P * V * M * p` and
//! forwards its color; [`shading_stage`] turns an interpolated color into an opaque pixel.
//! Everything between and around them, rasterization, interpolation, depth testing and
//! parallel dispatch, lives in [`scene`] as replaceable host-side machinery.

pub mod app;
pub mod logging;
pub mod scene;

pub use scene::raster::{EdgeFunctionRasterizer, Fragment, Interpolator, LinearInterpolator, Rasterizer};
pub use scene::shader::{shading_stage, transform_stage, Uniforms, VertexInput, VertexOutput};
pub use scene::{DrawCall, DrawStats, Scene};
