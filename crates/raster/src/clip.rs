//! Homogeneous-space Sutherland–Hodgman clipping against the canonical clip
//! planes, with caller-owned scratch storage so clipping is reentrant (no
//! hidden global/static state) and safe to call from concurrent tests.
//!
//! Not wired into the hot rasterizer path — that path relies on a cheap
//! near-plane reject plus screen-space scissoring instead (see
//! [`crate::rasterize`]). This module exists as a reusable primitive for
//! callers that need exact polygon clipping.

pub const MAX_ATTR_FLOATS: usize = 24;
pub const MAX_TRIANGLES_3D: usize = 64;
pub const MAX_TRIANGLES_2D: usize = 16;

/// One clipped vertex: a homogeneous clip-space position plus up to
/// [`MAX_ATTR_FLOATS`] interpolated varying floats.
#[derive(Clone, Copy)]
pub struct ClipVertex {
	pub pos: [f32; 4],
	pub attrs: [f32; MAX_ATTR_FLOATS],
}

impl ClipVertex {
	pub const ZERO: Self = Self { pos: [0.0; 4], attrs: [0.0; MAX_ATTR_FLOATS] };

	pub fn new(pos: [f32; 4], attrs: &[f32]) -> Self {
		let mut v = Self::ZERO;
		v.pos = pos;
		v.attrs[..attrs.len()].copy_from_slice(attrs);
		v
	}
}

pub type Triangle = [ClipVertex; 3];

/// Ping-pong scratch buffers sized to a clip run's maximum triangle count.
/// Owned by the caller so multiple clip calls never contend on shared state.
pub struct ClipScratch<const N: usize> {
	buf_a: [Triangle; N],
	buf_b: [Triangle; N],
}

pub type ClipScratch3D = ClipScratch<MAX_TRIANGLES_3D>;
pub type ClipScratch2D = ClipScratch<MAX_TRIANGLES_2D>;

impl<const N: usize> ClipScratch<N> {
	pub fn new() -> Self {
		Self { buf_a: [[ClipVertex::ZERO; 3]; N], buf_b: [[ClipVertex::ZERO; 3]; N] }
	}

	pub fn triangles(&self, count: usize) -> &[Triangle] {
		&self.buf_a[..count]
	}
}

impl<const N: usize> Default for ClipScratch<N> {
	fn default() -> Self {
		Self::new()
	}
}

const PLANES_3D: [(usize, f32); 6] = [(0, 1.0), (0, -1.0), (1, 1.0), (1, -1.0), (2, 1.0), (2, -1.0)];
const PLANES_2D: [(usize, f32); 4] = [(0, 1.0), (0, -1.0), (1, 1.0), (1, -1.0)];

/// Clips a single triangle against all six canonical 3D clip planes in the
/// fixed order x=+w, x=-w, y=+w, y=-w, z=+w, z=-w. Returns the resulting
/// triangle count; the triangles themselves are available via
/// `scratch.triangles(count)`.
pub fn clip_triangle_3d(tri: Triangle, attr_count: usize, scratch: &mut ClipScratch3D) -> usize {
	clip_against_planes(tri, attr_count, &PLANES_3D, scratch)
}

/// Clips a single triangle against the four canonical 2D clip planes
/// (x=+w, x=-w, y=+w, y=-w).
pub fn clip_triangle_2d(tri: Triangle, attr_count: usize, scratch: &mut ClipScratch2D) -> usize {
	clip_against_planes(tri, attr_count, &PLANES_2D, scratch)
}

fn clip_against_planes<const N: usize>(
	tri: Triangle,
	attr_count: usize,
	planes: &[(usize, f32)],
	scratch: &mut ClipScratch<N>,
) -> usize {
	scratch.buf_a[0] = tri;
	let mut count = 1usize;
	let mut result_in_a = true;

	for &(axis, side) in planes {
		count = if result_in_a {
			clip_plane(&scratch.buf_a[..count], axis, side, 1.0, attr_count, &mut scratch.buf_b)
		} else {
			clip_plane(&scratch.buf_b[..count], axis, side, 1.0, attr_count, &mut scratch.buf_a)
		};
		result_in_a = !result_in_a;
		if count == 0 {
			break;
		}
	}

	if !result_in_a {
		scratch.buf_a[..count].copy_from_slice(&scratch.buf_b[..count]);
	}
	count
}

/// Clips every triangle in `input` against one plane, appending results into
/// `output`. Returns the number of triangles written.
fn clip_plane(input: &[Triangle], axis: usize, side: f32, w: f32, attr_count: usize, output: &mut [Triangle]) -> usize {
	let mut out_count = 0;
	for tri in input {
		out_count += clip_one_plane(tri, axis, side, w, attr_count, &mut output[out_count..]);
	}
	out_count
}

fn signed_dist(p: [f32; 4], axis: usize, side: f32, w: f32) -> f32 {
	side * (p[axis] - w)
}

fn lerp_vertex(a: &ClipVertex, b: &ClipVertex, t: f32, attr_count: usize) -> ClipVertex {
	let mut out = ClipVertex::ZERO;
	for i in 0..4 {
		out.pos[i] = a.pos[i] + (b.pos[i] - a.pos[i]) * t;
	}
	for i in 0..attr_count {
		out.attrs[i] = a.attrs[i] + (b.attrs[i] - a.attrs[i]) * t;
	}
	out
}

/// Clips one triangle against one plane, producing 0, 1, or 2 triangles in
/// `out[0..]`. The one-positive and two-positive cases each duplicate a
/// single original vertex and introduce two clip-plane intersection points,
/// preserving winding order.
fn clip_one_plane(tri: &Triangle, axis: usize, side: f32, w: f32, attr_count: usize, out: &mut [Triangle]) -> usize {
	let sdf = [
		signed_dist(tri[0].pos, axis, side, w),
		signed_dist(tri[1].pos, axis, side, w),
		signed_dist(tri[2].pos, axis, side, w),
	];
	let positive = [sdf[0] >= 0.0, sdf[1] >= 0.0, sdf[2] >= 0.0];
	let pos_count = positive.iter().filter(|&&p| p).count();

	match pos_count {
		0 => 0,
		3 => {
			out[0] = *tri;
			1
		}
		1 => {
			let m = positive.iter().position(|&p| p).unwrap();
			let l = (m + 2) % 3;
			let r = (m + 1) % 3;
			let t_lm = sdf[l] / (sdf[l] - sdf[m]);
			let t_mr = sdf[m] / (sdf[m] - sdf[r]);
			let v_lm = lerp_vertex(&tri[l], &tri[m], t_lm, attr_count);
			let v_mr = lerp_vertex(&tri[m], &tri[r], t_mr, attr_count);
			out[0] = [v_lm, tri[m], v_mr];
			1
		}
		2 => {
			let m = positive.iter().position(|&p| !p).unwrap();
			let l = (m + 2) % 3;
			let r = (m + 1) % 3;
			let t_lm = sdf[l] / (sdf[l] - sdf[m]);
			let t_mr = sdf[m] / (sdf[m] - sdf[r]);
			let v_lm = lerp_vertex(&tri[l], &tri[m], t_lm, attr_count);
			let v_mr = lerp_vertex(&tri[m], &tri[r], t_mr, attr_count);
			out[0] = [tri[r], tri[l], v_lm];
			out[1] = [tri[r], v_lm, v_mr];
			2
		}
		_ => unreachable!(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn vertex(x: f32, y: f32, z: f32) -> ClipVertex {
		ClipVertex::new([x, y, z, 1.0], &[x, y, z])
	}

	#[test]
	fn triangle_fully_inside_cube_survives_unchanged() {
		let tri = [vertex(-0.1, -0.1, 0.1), vertex(0.1, -0.1, 0.1), vertex(0.0, 0.1, 0.1)];
		let mut scratch = ClipScratch3D::new();
		let count = clip_triangle_3d(tri, 3, &mut scratch);
		assert_eq!(count, 1);
	}

	#[test]
	fn triangle_fully_outside_cube_is_dropped() {
		let tri = [vertex(2.0, 2.0, 2.0), vertex(3.0, 2.0, 2.0), vertex(2.0, 3.0, 2.0)];
		let mut scratch = ClipScratch3D::new();
		let count = clip_triangle_3d(tri, 3, &mut scratch);
		assert_eq!(count, 0);
	}

	#[test]
	fn triangle_straddling_one_plane_produces_a_quad() {
		// Straddles x = +1: one vertex outside, two inside.
		let tri = [vertex(0.0, 0.0, 0.5), vertex(2.0, 0.0, 0.5), vertex(0.0, 0.8, 0.5)];
		let mut scratch = ClipScratch3D::new();
		let count = clip_triangle_3d(tri, 3, &mut scratch);
		assert!(count >= 1);
		for tri in scratch.triangles(count) {
			for v in tri {
				assert!(v.pos[0] <= 1.0 + 1e-4);
			}
		}
	}

	#[test]
	fn two_dimensional_clip_ignores_the_z_axis() {
		let tri = [vertex(0.0, 0.0, 50.0), vertex(0.1, 0.0, -50.0), vertex(0.0, 0.1, 100.0)];
		let mut scratch = ClipScratch2D::new();
		let count = clip_triangle_2d(tri, 3, &mut scratch);
		assert_eq!(count, 1);
	}
}
