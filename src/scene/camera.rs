use nalgebra as na;
use na::{Matrix4, Point3, Vector3};

/// Perspective projection with the fixed-function conventions: right-handed eye space looking
/// down -z, depth mapped to [-1, 1] in NDC. Field of view is vertical and in degrees.
pub fn perspective(fovy_degrees: f32, aspect: f32, near: f32, far: f32) -> Matrix4<f32> {
    return Matrix4::new_perspective(aspect, fovy_degrees.to_radians(), near, far);
}

/// Orthographic projection of the box `[left, right] x [bottom, top]` between the `near` and
/// `far` planes, distances measured along -z. Same matrix as `glOrtho`.
pub fn orthographic(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Matrix4<f32> {
    return Matrix4::new_orthographic(left, right, bottom, top, near, far);
}

/// Pitch limit of the angle based cameras, keeps the view away from the up axis.
pub const MAX_PITCH_DEGREES: f32 = 89.0;
/// Closest an orbiting camera gets to its target.
pub const MIN_ORBIT_DISTANCE: f32 = 1.0;

/// Unit direction for yaw around +y (0 is +x, -90 is -z) and pitch above the xz plane.
fn direction(yaw_degrees: f32, pitch_degrees: f32) -> Vector3<f32> {
    let (yaw, pitch) = (yaw_degrees.to_radians(), pitch_degrees.to_radians());
    return Vector3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos()).normalize();
}

/// View of a camera sitting on a sphere around `target`, looking at it.
/// Pitch is clamped to +-89 degrees, distance is at least 1.
pub fn orbit_view(target: Point3<f32>, yaw_degrees: f32, pitch_degrees: f32, distance: f32) -> Matrix4<f32> {
    let pitch = pitch_degrees.clamp(-MAX_PITCH_DEGREES, MAX_PITCH_DEGREES);
    let distance = distance.max(MIN_ORBIT_DISTANCE);
    let eye = target + direction(yaw_degrees, pitch) * distance;
    return look_at(eye, target, Vector3::y());
}

/// View of a free camera at `position` facing along yaw/pitch. Yaw -90 looks down -z.
pub fn first_person_view(position: Point3<f32>, yaw_degrees: f32, pitch_degrees: f32) -> Matrix4<f32> {
    let pitch = pitch_degrees.clamp(-MAX_PITCH_DEGREES, MAX_PITCH_DEGREES);
    let front = direction(yaw_degrees, pitch);
    return look_at(position, position + front, Vector3::y());
}

/// Plain translation, applied on the right of whatever is already bound.
pub fn translation(offset: Vector3<f32>) -> Matrix4<f32> {
    return Matrix4::new_translation(&offset);
}

/// View matrix of a camera at `eye` looking at `target`.
pub fn look_at(eye: Point3<f32>, target: Point3<f32>, up: Vector3<f32>) -> Matrix4<f32> {
    return Matrix4::look_at_rh(&eye, &target, &up);
}

/// Model matrix scaling and centering a bounding box into the [-1, 1] cube.
/// Empty or flat boxes fall back to a unit scale.
pub fn fit_unit_cube(min: Point3<f32>, max: Point3<f32>) -> Matrix4<f32> {
    let extent = (max - min).max();
    let scale = if extent > 0.0 && extent.is_finite() { 2.0 / extent } else { 1.0 };
    let center = na::center(&min, &max);
    return Matrix4::new_scaling(scale) * Matrix4::new_translation(&-center.coords);
}

#[cfg(test)]
mod tests {
    use super::*;
    use na::{point, vector};
    use crate::scene::util::{from_hom_point, to_hom_point};

    #[test]
    fn translation_moves_points_only() {
        let m = translation(vector![0.0, 0.0, -5.0]);
        assert_eq!(m * to_hom_point(vector![1.0, 2.0, 3.0]), vector![1.0, 2.0, -2.0, 1.0]);
        assert_eq!(m * vector![1.0, 2.0, 3.0, 0.0], vector![1.0, 2.0, 3.0, 0.0]);
    }

    #[test]
    fn perspective_maps_near_and_far_planes() {
        let p = perspective(45.0, 800.0 / 600.0, 0.1, 50.0);
        let near = from_hom_point(p * vector![0.0, 0.0, -0.1, 1.0]);
        let far = from_hom_point(p * vector![0.0, 0.0, -50.0, 1.0]);
        assert!((near.z + 1.0).abs() < 1e-4);
        assert!((far.z - 1.0).abs() < 1e-4);
    }

    #[test]
    fn perspective_fov_hits_the_top_edge() {
        let p = perspective(90.0, 1.0, 1.0, 10.0);
        // At distance 2 with a 90 degree fov the top edge is at y = 2.
        let edge = from_hom_point(p * vector![0.0, 2.0, -2.0, 1.0]);
        assert!((edge.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn look_at_puts_target_on_negative_z() {
        let view = look_at(point![0.0, 0.0, 5.0], point![0.0, 0.0, 0.0], Vector3::y());
        let target = view * vector![0.0, 0.0, 0.0, 1.0];
        assert!((target - vector![0.0, 0.0, -5.0, 1.0]).norm() < 1e-6);
    }

    fn assert_close(got: na::Vector4<f32>, expected: na::Vector4<f32>) {
        assert!((got - expected).norm() < 1e-5, "{:?} vs {:?}", got, expected);
    }

    #[test]
    fn orthographic_maps_box_corners() {
        // Same box as an 800x600 window with near -1 and far 1.
        let p = orthographic(0.0, 800.0, 0.0, 600.0, -1.0, 1.0);
        assert_close(p * vector![400.0, 300.0, 0.0, 1.0], vector![0.0, 0.0, 0.0, 1.0]);
        assert_close(p * vector![0.0, 0.0, 1.0, 1.0], vector![-1.0, -1.0, -1.0, 1.0]);
        assert_close(p * vector![800.0, 600.0, -1.0, 1.0], vector![1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn orbit_view_circles_the_target() {
        // Yaw 90 puts the eye on +z, yaw 0 on +x.
        let view = orbit_view(point![1.0, 2.0, 3.0], 90.0, 0.0, 5.0);
        assert_close(view * vector![1.0, 2.0, 3.0, 1.0], vector![0.0, 0.0, -5.0, 1.0]);
        assert_close(view * vector![1.0, 2.0, 8.0, 1.0], vector![0.0, 0.0, 0.0, 1.0]);

        let side = orbit_view(point![0.0, 0.0, 0.0], 0.0, 0.0, 2.0);
        assert_close(side * vector![2.0, 0.0, 0.0, 1.0], vector![0.0, 0.0, 0.0, 1.0]);
        // Looking down -x, +z is to the left.
        assert_close(side * vector![0.0, 0.0, 1.0, 1.0], vector![-1.0, 0.0, -2.0, 1.0]);
    }

    #[test]
    fn orbit_view_clamps_pitch_and_distance() {
        let target = point![0.0, 0.0, 0.0];
        assert_eq!(orbit_view(target, 30.0, 120.0, 4.0), orbit_view(target, 30.0, 89.0, 4.0));
        assert_eq!(orbit_view(target, 30.0, -95.0, 4.0), orbit_view(target, 30.0, -89.0, 4.0));

        let close = orbit_view(target, 90.0, 0.0, 0.25);
        assert_close(close * vector![0.0, 0.0, 0.0, 1.0], vector![0.0, 0.0, -1.0, 1.0]);
        assert_eq!(close, orbit_view(target, 90.0, 0.0, -3.0));
    }

    #[test]
    fn first_person_view_faces_yaw_and_pitch() {
        let eye = point![0.0, 0.0, 5.0];
        // Default camera: yaw -90 looks at the origin from z = 5.
        let forward = first_person_view(eye, -90.0, 0.0);
        assert_close(forward * vector![0.0, 0.0, 0.0, 1.0], vector![0.0, 0.0, -5.0, 1.0]);
        assert!((forward - look_at(eye, point![0.0, 0.0, 0.0], Vector3::y())).norm() < 1e-5);

        let east = first_person_view(eye, 0.0, 0.0);
        assert_close(east * vector![3.0, 0.0, 5.0, 1.0], vector![0.0, 0.0, -3.0, 1.0]);

        // Pitch 30 towards +x: a point one unit ahead and tan(30) up sits on the view axis.
        let up = first_person_view(point![0.0, 0.0, 0.0], 0.0, 30.0);
        let ahead = up * vector![1.0, 30.0f32.to_radians().tan(), 0.0, 1.0];
        assert!(ahead.x.abs() < 1e-5 && ahead.y.abs() < 1e-5 && ahead.z < 0.0, "{:?}", ahead);
    }

    #[test]
    fn fit_unit_cube_centers_and_scales() {
        let m = fit_unit_cube(point![2.0, 0.0, 0.0], point![6.0, 2.0, 1.0]);
        assert_eq!(from_hom_point(m * vector![2.0, 0.0, 0.0, 1.0]), vector![-1.0, -0.5, -0.25]);
        assert_eq!(from_hom_point(m * vector![6.0, 2.0, 1.0, 1.0]), vector![1.0, 0.5, 0.25]);
        let flat = fit_unit_cube(point![1.0, 1.0, 1.0], point![1.0, 1.0, 1.0]);
        assert_eq!(from_hom_point(flat * vector![1.0, 1.0, 1.0, 1.0]), vector![0.0, 0.0, 0.0]);
    }
}
