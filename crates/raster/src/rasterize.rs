//! The hot path: vertex shading, a crude near-plane reject, back-face
//! culling, viewport transform, edge-function coverage testing,
//! perspective-correct barycentric interpolation, depth/stencil
//! arbitration, pixel shading, and blend/write — for one non-indexed
//! triangle list.
//!
//! This is deliberately not built on top of [`crate::clip`]: a full
//! homogeneous clip per triangle is more machinery than a single crude
//! `pCam.z <= 0` reject plus scissoring to the target rect buys here. The
//! clipper stays a standalone, independently testable primitive.

use math::projection::edge_function;
use math::Vector2;

use crate::device::Device;
use crate::handle::{RenderContextHandle, VertexBufferHandle};
use crate::state::DepthWriteMask;
use crate::vertex::{VertexFieldType, VertexFormat};

const EPS: f32 = 1e-4;
const MAX_VERTEX_BYTES: usize = 64;

fn read_f32(bytes: &[u8], offset: usize) -> f32 {
	f32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap())
}

fn write_f32(bytes: &mut [u8], offset: usize, v: f32) {
	bytes[offset..offset + 4].copy_from_slice(&v.to_le_bytes());
}

fn read_vec3(bytes: &[u8], offset: usize) -> [f32; 3] {
	[read_f32(bytes, offset), read_f32(bytes, offset + 4), read_f32(bytes, offset + 8)]
}

fn write_vec3(bytes: &mut [u8], offset: usize, v: [f32; 3]) {
	write_f32(bytes, offset, v[0]);
	write_f32(bytes, offset + 4, v[1]);
	write_f32(bytes, offset + 8, v[2]);
}

fn read_vec2(bytes: &[u8], offset: usize) -> [f32; 2] {
	[read_f32(bytes, offset), read_f32(bytes, offset + 4)]
}

fn write_vec2(bytes: &mut [u8], offset: usize, v: [f32; 2]) {
	write_f32(bytes, offset, v[0]);
	write_f32(bytes, offset + 4, v[1]);
}

fn lerp3(a: [f32; 3], b: [f32; 3], c: [f32; 3], w: [f32; 3]) -> [f32; 3] {
	[
		a[0] * w[0] + b[0] * w[1] + c[0] * w[2],
		a[1] * w[0] + b[1] * w[1] + c[1] * w[2],
		a[2] * w[0] + b[2] * w[1] + c[2] * w[2],
	]
}

fn lerp2(a: [f32; 2], b: [f32; 2], c: [f32; 2], w: [f32; 3]) -> [f32; 2] {
	[a[0] * w[0] + b[0] * w[1] + c[0] * w[2], a[1] * w[0] + b[1] * w[1] + c[1] * w[2]]
}

/// Issues a non-indexed draw of `vertex_count` vertices (a multiple of 3)
/// starting at `vertex_offset` in `vertex_buffer`, through the state bound
/// to `ctx`.
pub fn draw(device: &mut Device, ctx: RenderContextHandle, vertex_buffer: VertexBufferHandle, vertex_offset: u32, vertex_count: u32) {
	let context = device.context(ctx);
	let (Some(swap_chain), Some(vertex_shader), Some(pixel_shader)) =
		(context.swap_chain, context.vertex_shader, context.pixel_shader)
	else {
		log::warn!("draw issued with an incompletely bound render context");
		return;
	};
	let depth_stencil = context.depth_stencil;
	let flip_horizontal = context.flip_horizontal;
	let depth_stencil_state = context.depth_stencil_state;
	let blend_state = context.blend_state;
	let vs_constants = context.vs_constants.clone();
	let ps_constants = context.ps_constants.clone();

	let (vs_func, _vs_in_format, vs_out_format) = device.vertex_shader(vertex_shader);
	let (ps_func, ps_in_format, ps_out_format) = device.pixel_shader(pixel_shader);
	let vs_out_format = device.vertex_format(vs_out_format).clone();
	let ps_in_format = device.vertex_format(ps_in_format).clone();
	let ps_out_format = device.vertex_format(ps_out_format).clone();

	let vb_format = device.vertex_buffer_format(vertex_buffer);
	let vb_stride = device.vertex_format(vb_format).size() as usize;
	let vb_data = device.vertex_buffer_data(vertex_buffer, vertex_offset, vertex_count).to_vec();

	log::debug!("draw: {vertex_count} vertices, {} triangles", vertex_count / 3);

	let back_index = device.back_buffer_index(swap_chain);
	let (depth_index, stencil_index) = match depth_stencil {
		Some(h) => {
			let (d, s) = device.depth_stencil_indices(h);
			(Some(d), Some(s))
		}
		None => (None, None),
	};

	let buffers_ptr = device.buffers.as_mut_ptr();
	// SAFETY: back_index, depth_index and stencil_index name disjoint pool
	// slots (each device resource owns exactly one buffer slot), so these
	// three mutable references never alias.
	let back = unsafe { &mut *buffers_ptr.add(back_index) };
	let depth = depth_index.map(|i| unsafe { &mut *buffers_ptr.add(i) });
	let stencil = stencil_index.map(|i| unsafe { &mut *buffers_ptr.add(i) });

	let width = back.width();
	let height = back.height();

	let cam_offset = vs_out_format.field(0).offset as usize;
	let ndc_offset = vs_out_format.field(1).offset as usize;
	let ps_out_size = ps_out_format.size() as usize;

	for tri in (0..vertex_count as usize).step_by(3) {
		if tri + 3 > vertex_count as usize {
			break;
		}

		let mut vs_out = [[0u8; MAX_VERTEX_BYTES]; 3];
		for i in 0..3 {
			let input = &vb_data[(tri + i) * vb_stride..(tri + i + 1) * vb_stride];
			vs_func(&mut vs_out[i][..vs_out_format.size() as usize], input, &vs_constants);
		}

		let cam = [read_vec3(&vs_out[0], cam_offset), read_vec3(&vs_out[1], cam_offset), read_vec3(&vs_out[2], cam_offset)];
		if cam[0][2] <= 0.0 || cam[1][2] <= 0.0 || cam[2][2] <= 0.0 {
			continue;
		}

		let ndc = [read_vec3(&vs_out[0], ndc_offset), read_vec3(&vs_out[1], ndc_offset), read_vec3(&vs_out[2], ndc_offset)];
		let ndc_xy: [Vector2<f32>; 3] = [
			Vector2::new(ndc[0][0], ndc[0][1]),
			Vector2::new(ndc[1][0], ndc[1][1]),
			Vector2::new(ndc[2][0], ndc[2][1]),
		];
		if edge_function(ndc_xy[0], ndc_xy[1], ndc_xy[2]) <= 0.0 {
			continue;
		}

		let screen: [Vector2<f32>; 3] = std::array::from_fn(|i| {
			Vector2::new((ndc[i][0] + 1.0) * 0.5 * width as f32, (1.0 - ndc[i][1]) * 0.5 * height as f32)
		});
		let inv_cam_z = [1.0 / cam[0][2], 1.0 / cam[1][2], 1.0 / cam[2][2]];
		let inv_ndc_z = [1.0 / ndc[0][2], 1.0 / ndc[1][2], 1.0 / ndc[2][2]];

		let min_x = screen[0].x.min(screen[1].x).min(screen[2].x).floor().max(0.0) as i32;
		let max_x = screen[0].x.max(screen[1].x).max(screen[2].x).ceil().min(width as f32) as i32;
		let min_y = screen[0].y.min(screen[1].y).min(screen[2].y).floor().max(0.0) as i32;
		let max_y = screen[0].y.max(screen[1].y).max(screen[2].y).ceil().min(height as f32) as i32;
		if min_x >= max_x || min_y >= max_y {
			continue;
		}

		let area = edge_function(screen[0], screen[1], screen[2]);
		let ainv = if area.abs() < EPS { 1000.0 * if area < 0.0 { -1.0 } else { 1.0 } } else { 1.0 / area };

		for y in min_y..max_y {
			for x in min_x..max_x {
				let p = Vector2::new(x as f32 + 0.5, y as f32 + 0.5);
				let e0 = edge_function(screen[1], screen[2], p);
				let e1 = edge_function(screen[2], screen[0], p);
				let e2 = edge_function(screen[0], screen[1], p);
				if e0 > 0.0 || e1 > 0.0 || e2 > 0.0 || (e0 == 0.0 && e1 == 0.0 && e2 == 0.0) {
					continue;
				}

				let bary = [e0 * ainv, e1 * ainv, e2 * ainv];
				if bary.iter().any(|&b| !(0.0..=1.0 + EPS).contains(&b)) {
					continue;
				}

				let z_ndc = 1.0 / (inv_ndc_z[0] * bary[0] + inv_ndc_z[1] * bary[1] + inv_ndc_z[2] * bary[2]);
				if !(0.0..=1.0 + EPS).contains(&z_ndc) {
					continue;
				}

				let write_x = if flip_horizontal { width as i32 - 1 - x } else { x };
				let (write_x, y) = (write_x as u32, y as u32);

				if depth_stencil_state.depth_enable {
					if let Some(depth) = &depth {
						let stored = read_f32(depth.at(y, write_x), 0);
						if stored <= z_ndc {
							continue;
						}
					}
				}
				if depth_stencil_state.stencil_enable {
					if let Some(stencil) = &stencil {
						if stencil.at(y, write_x)[0] == 0 {
							continue;
						}
					}
				}

				if depth_stencil_state.depth_write_mask == DepthWriteMask::All {
					if let Some(depth) = &mut depth {
						write_f32(depth.at_mut(y, write_x), 0, z_ndc);
					}
				}
				if depth_stencil_state.stencil_write_mask != 0 {
					if let Some(stencil) = &mut stencil {
						stencil.at_mut(y, write_x)[0] |= depth_stencil_state.stencil_write_mask;
					}
				}

				let z_cam = 1.0 / (inv_cam_z[0] * bary[0] + inv_cam_z[1] * bary[1] + inv_cam_z[2] * bary[2]);
				let w = [z_cam * inv_cam_z[0] * bary[0], z_cam * inv_cam_z[1] * bary[1], z_cam * inv_cam_z[2] * bary[2]];

				let mut ps_in = [0u8; MAX_VERTEX_BYTES];
				interpolate_attributes(&ps_in_format, &vs_out, &mut ps_in, w, p.x, p.y, z_ndc);

				let mut ps_out = [0u8; MAX_VERTEX_BYTES];
				ps_func(&mut ps_out[..ps_out_size], &ps_in[..ps_in_format.size() as usize], &ps_constants);
				let color = read_vec3(&ps_out, 0);
				debug_assert!(color.iter().all(|&c| (0.0..=1.0 + EPS).contains(&c)), "pixel shader color out of range");

				let pixel = if blend_state.enabled {
					let old = back.at(y, write_x);
					[
						(old[0] as f32 / 2.0 + color[2] * 255.0 * 0.5) as u8,
						(old[1] as f32 / 2.0 + color[1] * 255.0 * 0.5) as u8,
						(old[2] as f32 / 2.0 + color[0] * 255.0 * 0.5) as u8,
					]
				} else {
					[(color[2] * 255.0) as u8, (color[1] * 255.0) as u8, (color[0] * 255.0) as u8]
				};
				back.at_mut(y, write_x).copy_from_slice(&pixel);
			}
		}
	}
}

fn interpolate_attributes(
	ps_in_format: &VertexFormat,
	vs_out: &[[u8; MAX_VERTEX_BYTES]; 3],
	ps_in: &mut [u8],
	w: [f32; 3],
	pixel_x: f32,
	pixel_y: f32,
	z_ndc: f32,
) {
	for field in ps_in_format.fields() {
		let offset = field.offset as usize;
		match field.ty {
			VertexFieldType::SvPosition => {
				write_vec3(ps_in, offset, [pixel_x, pixel_y, z_ndc]);
			}
			VertexFieldType::TexCoord => {
				let a = read_vec2(&vs_out[0], offset);
				let b = read_vec2(&vs_out[1], offset);
				let c = read_vec2(&vs_out[2], offset);
				write_vec2(ps_in, offset, lerp2(a, b, c, w));
			}
			VertexFieldType::Position | VertexFieldType::Color | VertexFieldType::Normal | VertexFieldType::Material => {
				let a = read_vec3(&vs_out[0], offset);
				let b = read_vec3(&vs_out[1], offset);
				let c = read_vec3(&vs_out[2], offset);
				write_vec3(ps_in, offset, lerp3(a, b, c, w));
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::device::Device;
	use crate::state::DepthStencilState;

	fn vs_flat(out: &mut [u8], input: &[u8], _constants: &[u8]) {
		let pos = read_vec3(input, 0);
		let color = read_vec3(input, 12);
		write_vec3(out, 0, [pos[0], pos[1], pos[2] + 2.0]); // camera-space position
		write_vec3(out, 12, pos); // NDC position (already in NDC for this test)
		write_vec3(out, 24, color);
	}

	fn ps_flat(out: &mut [u8], input: &[u8], _constants: &[u8]) {
		let color = read_vec3(input, 24);
		write_vec3(out, 0, color);
	}

	#[test]
	fn flat_triangle_writes_color_and_depth_at_its_centroid() {
		let mut device = Device::new();

		let vs_in = device.create_vertex_format(&[VertexFieldType::Position, VertexFieldType::Color]);
		let vs_out = device.create_vertex_format(&[VertexFieldType::Position, VertexFieldType::SvPosition, VertexFieldType::Color]);
		let ps_out = device.create_vertex_format(&[VertexFieldType::Color]);

		let vertex_shader = device.create_vertex_shader(vs_flat, vs_in, vs_out).unwrap();
		let pixel_shader = device.create_pixel_shader(ps_flat, vs_out, ps_out).unwrap();

		let render_target = device.create_render_target(64, 64);
		let swap_chain = device.create_swap_chain(render_target);
		let depth_stencil = device.create_depth_stencil_buffer(64, 64);

		let vertex_buffer = device.create_vertex_buffer(vs_in, 3);
		device.vertex_buffer_alloc(vertex_buffer, 3);
		let data = device.vertex_buffer_data_mut(vertex_buffer, 0, 3);
		let verts: [(f32, f32, f32); 3] = [(-0.5, -0.4, 0.5), (0.0, 0.8, 0.5), (0.5, -0.4, 0.5)];
		for (i, (x, y, z)) in verts.iter().enumerate() {
			write_vec3(&mut data[i * 24..], 0, [*x, *y, *z]);
			write_vec3(&mut data[i * 24..], 12, [1.0, 0.0, 0.0]);
		}

		let ctx = device.create_render_context();
		device.set_swap_chain(ctx, swap_chain);
		device.set_depth_stencil_buffer(ctx, depth_stencil);
		device.set_render_target(ctx, render_target);
		device.set_vertex_shader(ctx, vertex_shader);
		device.set_pixel_shader(ctx, pixel_shader);
		device.om_set_depth_stencil_state(ctx, DepthStencilState::default());

		draw(&mut device, ctx, vertex_buffer, 0, 3);

		let back = device.back_buffer_mut(swap_chain);
		let pixel = back.at(32, 32);
		assert_eq!(pixel, [0, 0, 255]); // BGR: full red

		let depth = device.depth_buffer_mut(depth_stencil);
		let z = read_f32(depth.at(32, 32), 0);
		assert!((z - 0.5).abs() < 1e-4);
	}

	#[test]
	fn depth_test_rejects_a_farther_triangle_drawn_after_a_closer_one() {
		let mut device = Device::new();
		let vs_in = device.create_vertex_format(&[VertexFieldType::Position, VertexFieldType::Color]);
		let vs_out = device.create_vertex_format(&[VertexFieldType::Position, VertexFieldType::SvPosition, VertexFieldType::Color]);
		let ps_out = device.create_vertex_format(&[VertexFieldType::Color]);
		let vertex_shader = device.create_vertex_shader(vs_flat, vs_in, vs_out).unwrap();
		let pixel_shader = device.create_pixel_shader(ps_flat, vs_out, ps_out).unwrap();
		let render_target = device.create_render_target(64, 64);
		let swap_chain = device.create_swap_chain(render_target);
		let depth_stencil = device.create_depth_stencil_buffer(64, 64);
		let vertex_buffer = device.create_vertex_buffer(vs_in, 6);
		device.vertex_buffer_alloc(vertex_buffer, 6);

		let near: [(f32, f32, f32); 3] = [(-0.5, -0.4, 0.2), (0.0, 0.8, 0.2), (0.5, -0.4, 0.2)];
		let far: [(f32, f32, f32); 3] = [(-0.5, -0.4, 0.9), (0.0, 0.8, 0.9), (0.5, -0.4, 0.9)];
		{
			let data = device.vertex_buffer_data_mut(vertex_buffer, 0, 6);
			for (i, (x, y, z)) in near.iter().chain(far.iter()).enumerate() {
				write_vec3(&mut data[i * 24..], 0, [*x, *y, *z]);
				write_vec3(&mut data[i * 24..], 12, [1.0, 0.0, 0.0]);
			}
		}

		let ctx = device.create_render_context();
		device.set_swap_chain(ctx, swap_chain);
		device.set_depth_stencil_buffer(ctx, depth_stencil);
		device.set_render_target(ctx, render_target);
		device.set_vertex_shader(ctx, vertex_shader);
		device.set_pixel_shader(ctx, pixel_shader);
		device.om_set_depth_stencil_state(ctx, DepthStencilState::default());

		draw(&mut device, ctx, vertex_buffer, 0, 3); // near triangle first
		draw(&mut device, ctx, vertex_buffer, 3, 3); // far triangle: must not overwrite

		let depth = device.depth_buffer_mut(depth_stencil);
		let z = read_f32(depth.at(32, 32), 0);
		assert!((z - 0.2).abs() < 1e-4, "farther triangle must not have won the depth test");
	}
}
