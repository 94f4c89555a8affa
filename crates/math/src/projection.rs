//! Left-handed projection/view helpers and the small set of geometric
//! primitives the rasterizer and scene graph build on: edge functions for
//! triangle coverage tests and ray/plane mirroring for the mirror pass.

use super::matrix::{Matrix4, Vector2, Vector3};
use super::num::{Float, FloatOps};
use super::unit::Unit;

/// Builds a left-handed perspective projection matrix from a vertical field
/// of view (radians), aspect ratio (width/height) and near/far clip planes.
///
/// Maps camera-space depth `z` in `[zn, zf]` to clip-space `w = z` and to
/// NDC depth `z' = (zf / (zf - zn)) * (z - zn) / z`, i.e. `[0, 1]`.
pub fn perspective_fov_lh(fov: f32, aspect_ratio: f32, zn: f32, zf: f32) -> Matrix4<f32> {
	let height = 1.0 / (fov * 0.5).tan();
	let width = height / aspect_ratio;
	let range = zf / (zf - zn);

	Matrix4::from_array([
		width, 0.0, 0.0, 0.0,
		0.0, height, 0.0, 0.0,
		0.0, 0.0, range, -range * zn,
		0.0, 0.0, 1.0, 0.0,
	])
}

/// Builds a left-handed view matrix looking from `eye` along `dir`, with
/// `up` disambiguating roll. `dir` and `up` need not be normalized or
/// orthogonal to each other.
pub fn look_to_lh(eye: Vector3<f32>, dir: Vector3<f32>, up: Vector3<f32>) -> Matrix4<f32> {
	let r2 = *dir.normalize();
	let r0 = *up.cross(r2).normalize();
	let r1 = r2.cross(r0);
	let neg_eye = -eye;

	Matrix4::from_array([
		r0.x, r0.y, r0.z, r0.dot(neg_eye),
		r1.x, r1.y, r1.z, r1.dot(neg_eye),
		r2.x, r2.y, r2.z, r2.dot(neg_eye),
		0.0, 0.0, 0.0, 1.0,
	])
}

/// Builds a left-handed rotation matrix around `axis` (must be normalized)
/// by `angle` radians, via Rodrigues' rotation formula. The translation row
/// is always zero.
pub fn rotation_axis_lh(axis: Unit<Vector3<f32>>, angle: f32) -> Matrix4<f32> {
	let (x, y, z) = (axis.x, axis.y, axis.z);

	let sin = angle.sin();
	let cos = angle.cos();
	let one_minus_cos = 1.0 - cos;

	let a0 = one_minus_cos * x * x;
	let a1 = one_minus_cos * y * y;
	let a2 = one_minus_cos * z * z;
	let a3 = one_minus_cos * x * y;
	let a4 = one_minus_cos * y * z;
	let a5 = one_minus_cos * z * x;

	let a6 = sin * x;
	let a7 = sin * y;
	let a8 = sin * z;

	Matrix4::from_array([
		a0 + cos, a3 - a8, a5 + a7, 0.0,
		a3 + a8, a1 + cos, a4 - a6, 0.0,
		a5 - a7, a4 + a6, a2 + cos, 0.0,
		0.0, 0.0, 0.0, 1.0,
	])
}

/// Builds a translation matrix for the column-vector convention (the
/// translation lives in the last column, multiplied on the right of a point).
pub fn translation_lh(t: Vector3<f32>) -> Matrix4<f32> {
	Matrix4::from_array([
		1.0, 0.0, 0.0, t.x,
		0.0, 1.0, 0.0, t.y,
		0.0, 0.0, 1.0, t.z,
		0.0, 0.0, 0.0, 1.0,
	])
}

/// Transforms a point `v` by `m` as a homogeneous coordinate with implicit
/// `w = 1`, dividing the result by the computed `w` — i.e. both a plain
/// affine transform and a perspective projection (where `w` varies with
/// depth) go through this one routine. Falls back to a large reciprocal
/// instead of dividing by (near) zero, matching the source's guard.
pub fn transform_point(m: Matrix4<f32>, v: Vector3<f32>) -> Vector3<f32> {
	let clip = m * v.extend(1.0);
	let w_recip = if clip.w.abs() < 1e-6 { 1e6 } else { 1.0 / clip.w };
	Vector3::new(clip.x * w_recip, clip.y * w_recip, clip.z * w_recip)
}

/// Signed area of the triangle `(a, b, c)` in screen space, doubled.
/// Positive for a clockwise-wound triangle in screen coordinates.
pub fn edge_function<T: Float + FloatOps<T>>(a: Vector2<T>, b: Vector2<T>, c: Vector2<T>) -> T {
	(c.x - a.x) * (b.y - a.y) - (c.y - a.y) * (b.x - a.x)
}

/// Reflects a ray `(pos_ray, dir_ray)` across the plane `(pos_plane,
/// norm_plane)`, returning the mirrored position and direction. Used to
/// build a secondary camera for a single-bounce mirror/portal view.
///
/// `norm_plane` and `dir_ray` must already be normalized.
pub fn mirror_ray_plane(
	pos_plane: Vector3<f32>,
	norm_plane: Vector3<f32>,
	pos_ray: Vector3<f32>,
	dir_ray: Vector3<f32>,
) -> (Vector3<f32>, Vector3<f32>) {
	let dist = (pos_ray - pos_plane).dot(norm_plane);
	let pos_project = pos_ray - norm_plane * dist;
	let pos_mirr = pos_ray + (pos_project - pos_ray) * 2.0;

	let vn = dir_ray.dot(norm_plane);

	let dir_mirr = if vn.abs() > 1e-6 {
		let t = (pos_plane - pos_ray).dot(norm_plane) / vn;
		let pos_intersect = pos_ray + dir_ray * t;
		let mirrored = (pos_intersect - pos_mirr).normalize();
		if t < 0.0 { -*mirrored } else { *mirrored }
	} else {
		dir_ray
	};

	(pos_mirr, dir_mirr)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn perspective_maps_near_and_far_to_ndc_bounds() {
		let m = perspective_fov_lh(std::f32::consts::FRAC_PI_2, 1.0, 1.0, 100.0);
		let clip_near = m * Vector3::new(0.0, 0.0, 1.0).extend(1.0);
		assert!((clip_near.z / clip_near.w).abs() < 1e-4);

		let clip_far = m * Vector3::new(0.0, 0.0, 100.0).extend(1.0);
		assert!((clip_far.z / clip_far.w - 1.0).abs() < 1e-4);
	}

	#[test]
	fn edge_function_sign_matches_winding() {
		let a = Vector2::new(0.0_f32, 0.0);
		let b = Vector2::new(1.0, 0.0);
		let c = Vector2::new(0.0, 1.0);
		assert!(edge_function(a, b, c) < 0.0);
		assert!(edge_function(a, c, b) > 0.0);
	}

	#[test]
	fn mirror_ray_plane_reflects_across_ground() {
		let pos_plane = Vector3::new(0.0_f32, 0.0, 0.0);
		let norm_plane = Vector3::new(0.0_f32, 1.0, 0.0);
		let pos_ray = Vector3::new(0.0_f32, 2.0, 0.0);
		let dir_ray = Vector3::new(0.0_f32, -1.0, 0.0);

		let (pos_mirr, _) = mirror_ray_plane(pos_plane, norm_plane, pos_ray, dir_ray);
		assert!((pos_mirr.y + 2.0).abs() < 1e-4);
	}
}
