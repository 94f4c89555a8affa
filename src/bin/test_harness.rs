//! CLI test harness: a static table of named suites, each covering one or
//! more of the scenarios exercised elsewhere only as library unit tests.
//! `argv[1]` looks up a suite; `argv[2]`, if given, narrows it to a single
//! case. Unknown names fall back to listing what's known. Each case prints
//! a one-line PASS/FAIL, and the process exits 0 iff every invoked case
//! passed.

use std::env;

use graphics::bytes::{read_vec3, write_vec3};
use graphics::SceneRenderer;
use math::projection::{perspective_fov_lh, transform_point};
use math::Vector3;
use raster::{DepthStencilState, DepthWriteMask, Device, VertexFieldType};
use renderer::demo_scene::TriangleScene;

type Case = (&'static str, fn() -> bool);

const RASTER_CASES: &[Case] = &[
	("triangle_centroid_color", raster_triangle_centroid_color),
	("depth_ordering", raster_depth_ordering),
	("stencil_mask", raster_stencil_mask),
	("clip_round_trip", raster_clip_round_trip),
];

const SCENE_CASES: &[Case] = &[("mirror_reflection", scene_mirror_reflection)];

const ASSET_CASES: &[Case] = &[("bmp_sample", asset_bmp_sample)];

const SUITES: &[(&str, &[Case])] = &[("raster", RASTER_CASES), ("scene", SCENE_CASES), ("asset", ASSET_CASES)];

fn list_suites() {
	eprintln!("usage: test_harness <suite> [case]");
	eprintln!("known suites:");
	for (name, cases) in SUITES {
		eprintln!("  {name}");
		for (case, _) in *cases {
			eprintln!("    {case}");
		}
	}
}

fn main() {
	renderer::install_logger();
	let args: Vec<String> = env::args().collect();

	let Some(suite_name) = args.get(1) else {
		list_suites();
		std::process::exit(1);
	};

	let Some(&(_, cases)) = SUITES.iter().find(|(name, _)| name == suite_name) else {
		eprintln!("no test suite matches name '{suite_name}'.");
		list_suites();
		std::process::exit(1);
	};

	let case_filter = args.get(2).map(String::as_str);
	let mut all_passed = true;
	let mut ran_any = false;

	for &(case_name, entry) in cases {
		if case_filter.is_some_and(|f| f != case_name) {
			continue;
		}
		ran_any = true;
		let passed = entry();
		println!("[{suite_name}] {} {case_name}", if passed { "PASS" } else { "FAIL" });
		all_passed &= passed;
	}

	if !ran_any {
		eprintln!("no case named '{}' in suite '{suite_name}'.", case_filter.unwrap_or("*"));
		std::process::exit(1);
	}

	std::process::exit(if all_passed { 0 } else { 1 });
}

fn vs_flat(out: &mut [u8], input: &[u8], _constants: &[u8]) {
	let pos = read_vec3(input, 0);
	let color = read_vec3(input, 12);
	write_vec3(out, 0, Vector3::new(pos.x, pos.y, pos.z + 2.0)); // camera space
	write_vec3(out, 12, pos); // already-NDC for these fixtures
	write_vec3(out, 24, color);
}

fn ps_flat(out: &mut [u8], input: &[u8], _constants: &[u8]) {
	write_vec3(out, 0, read_vec3(input, 24));
}

type FlatTriangleRig = (Device, raster::RenderContextHandle, raster::SwapChainHandle, raster::DepthStencilHandle, raster::VertexFormatHandle);

fn flat_triangle_device(width: u32, height: u32) -> FlatTriangleRig {
	let mut device = Device::new();
	let vs_in = device.create_vertex_format(&[VertexFieldType::Position, VertexFieldType::Color]);
	let vs_out = device.create_vertex_format(&[VertexFieldType::Position, VertexFieldType::SvPosition, VertexFieldType::Color]);
	let ps_out = device.create_vertex_format(&[VertexFieldType::Color]);
	let vertex_shader = device.create_vertex_shader(vs_flat, vs_in, vs_out).expect("vertex shader format mismatch");
	let pixel_shader = device.create_pixel_shader(ps_flat, vs_out, ps_out).expect("pixel shader format mismatch");

	let render_target = device.create_render_target(width, height);
	let swap_chain = device.create_swap_chain(render_target);
	let depth_stencil = device.create_depth_stencil_buffer(width, height);

	let ctx = device.create_render_context();
	device.set_swap_chain(ctx, swap_chain);
	device.set_depth_stencil_buffer(ctx, depth_stencil);
	device.set_render_target(ctx, render_target);
	device.set_vertex_shader(ctx, vertex_shader);
	device.set_pixel_shader(ctx, pixel_shader);

	(device, ctx, swap_chain, depth_stencil, vs_in)
}

/// Scenario: the sample RGB-interpolated triangle, drawn through the full
/// scene/effect path at 800x600, lands equal-weight-blended red/green/blue
/// at its screen centroid.
fn raster_triangle_centroid_color() -> bool {
	let mut scene_renderer = SceneRenderer::new(800, 600);
	scene_renderer.switch_scene(Box::new(TriangleScene::new(800.0 / 600.0)));

	scene_renderer.clear();
	scene_renderer.update(1000.0 / 200.0);
	scene_renderer.draw();
	scene_renderer.present();

	let swap_chain = scene_renderer.swap_chain();
	let front = scene_renderer.device().front_buffer(swap_chain);
	let bgr = front.at(300, 400);

	bgr.iter().all(|&channel| (channel as i32 - 85).abs() <= 5)
}

/// Scenario: depth testing rejects a farther triangle drawn after a closer
/// one that covers the same pixels.
fn raster_depth_ordering() -> bool {
	let (mut device, ctx, swap_chain, depth_stencil, vs_in) = flat_triangle_device(64, 64);
	device.om_set_depth_stencil_state(ctx, DepthStencilState::default());

	let vertex_buffer = device.create_vertex_buffer(vs_in, 6);
	device.vertex_buffer_alloc(vertex_buffer, 6);
	// z=3 (far) drawn red first, z=2 (near) drawn green second, mirroring
	// the spec's depth-ordering scenario; the near/far NDC fixture values
	// below stand in for the real projection (this fixture's vertex shader
	// treats its input z as already-NDC).
	let far = [(-0.5_f32, -0.4_f32, 0.9_f32), (0.0, 0.8, 0.9), (0.5, -0.4, 0.9)];
	let near = [(-0.5_f32, -0.4_f32, 0.2_f32), (0.0, 0.8, 0.2), (0.5, -0.4, 0.2)];
	{
		let data = device.vertex_buffer_data_mut(vertex_buffer, 0, 6);
		for (i, (x, y, z)) in far.iter().chain(near.iter()).enumerate() {
			write_vec3(&mut data[i * 24..], 0, Vector3::new(*x, *y, *z));
			let color = if i < 3 { Vector3::new(1.0, 0.0, 0.0) } else { Vector3::new(0.0, 1.0, 0.0) };
			write_vec3(&mut data[i * 24..], 12, color);
		}
	}

	device.draw(ctx, vertex_buffer, 0, 3); // far, red
	device.draw(ctx, vertex_buffer, 3, 3); // near, green

	let pixel: [u8; 3] = device.back_buffer_mut(swap_chain).at(32, 32).try_into().unwrap();
	let depth = device.depth_buffer_mut(depth_stencil);
	pixel == [0, 255, 0] && (graphics::bytes::read_f32(depth.at(32, 32), 0) - 0.2).abs() < 1e-4
}

/// Scenario: a stencil stamp written with one draw masks out a later draw
/// everywhere the stamp didn't cover.
fn raster_stencil_mask() -> bool {
	let (mut device, ctx, swap_chain, depth_stencil, vs_in) = flat_triangle_device(64, 64);
	device.reset_stencil_buffer(depth_stencil, 0);

	// Stamp pass: write stencil bit 1 over the left half of the target, no
	// depth test or write involved.
	device.om_set_depth_stencil_state(
		ctx,
		DepthStencilState { depth_enable: false, stencil_enable: false, depth_write_mask: DepthWriteMask::Zero, stencil_write_mask: 1 },
	);
	let stamp_buffer = device.create_vertex_buffer(vs_in, 3);
	device.vertex_buffer_alloc(stamp_buffer, 3);
	{
		let data = device.vertex_buffer_data_mut(stamp_buffer, 0, 3);
		let verts = [(-1.0_f32, -1.0_f32, 0.5_f32), (-1.0, 1.0, 0.5), (0.0, -1.0, 0.5)];
		for (i, (x, y, z)) in verts.iter().enumerate() {
			write_vec3(&mut data[i * 24..], 0, Vector3::new(*x, *y, *z));
			write_vec3(&mut data[i * 24..], 12, Vector3::new(0.0, 1.0, 0.0));
		}
	}
	device.draw(ctx, stamp_buffer, 0, 3);

	// Masked pass: a full-screen quad that only draws where the stencil bit
	// survives.
	device.om_set_depth_stencil_state(
		ctx,
		DepthStencilState { depth_enable: false, stencil_enable: true, depth_write_mask: DepthWriteMask::Zero, stencil_write_mask: 0 },
	);
	let quad_buffer = device.create_vertex_buffer(vs_in, 6);
	device.vertex_buffer_alloc(quad_buffer, 6);
	{
		let data = device.vertex_buffer_data_mut(quad_buffer, 0, 6);
		let verts = [
			(-1.0_f32, -1.0_f32, 0.5_f32),
			(-1.0, 1.0, 0.5),
			(1.0, -1.0, 0.5),
			(1.0, -1.0, 0.5),
			(-1.0, 1.0, 0.5),
			(1.0, 1.0, 0.5),
		];
		for (i, (x, y, z)) in verts.iter().enumerate() {
			write_vec3(&mut data[i * 24..], 0, Vector3::new(*x, *y, *z));
			write_vec3(&mut data[i * 24..], 12, Vector3::new(1.0, 0.0, 0.0));
		}
	}
	device.draw(ctx, quad_buffer, 0, 6);

	let back = device.back_buffer_mut(swap_chain);
	let masked_in = back.at(32, 16); // left half: stamped, should show red
	let masked_out = back.at(32, 48); // right half: never stamped, stays cleared
	masked_in == [0, 0, 255] && masked_out == [0, 0, 0]
}

/// Scenario: clipping a triangle that straddles the homogeneous cube keeps
/// every resulting vertex inside it.
fn raster_clip_round_trip() -> bool {
	let tri = [
		raster::clip::ClipVertex::new([0.0, 0.0, 0.5, 1.0], &[0.0, 0.0, 0.5]),
		raster::clip::ClipVertex::new([2.0, 0.0, 0.5, 1.0], &[2.0, 0.0, 0.5]),
		raster::clip::ClipVertex::new([0.0, 0.8, 0.5, 1.0], &[0.0, 0.8, 0.5]),
	];
	let mut scratch = raster::clip::ClipScratch3D::new();
	let count = raster::clip::clip_triangle_3d(tri, 3, &mut scratch);
	count >= 1 && scratch.triangles(count).iter().all(|t| t.iter().all(|v| v.pos[0] <= 1.0 + 1e-4))
}

/// Scenario: mirroring a camera's transform across a plane behind it yields
/// a view matrix that maps the mirrored eye position back to its own origin.
fn scene_mirror_reflection() -> bool {
	let transform = graphics::Transform { translation: Vector3::new(0.0, 0.0, -5.0), rotation: Vector3::ZERO };
	let plane_pos = Vector3::new(0.0, 0.0, 0.0);
	let plane_norm = Vector3::new(0.0, 0.0, 1.0);

	let view = transform.inverted_mirrored_matrix(plane_pos, plane_norm);
	let mirrored_eye = Vector3::new(0.0, 0.0, 5.0); // reflection of (0,0,-5) across z=0

	let camera_space = transform_point(view, mirrored_eye);
	let _ = perspective_fov_lh(90.0_f32.to_radians(), 1.0, 0.1, 100.0); // exercised elsewhere; keeps import honest

	camera_space.x.abs() < 1e-3 && camera_space.y.abs() < 1e-3 && camera_space.z.abs() < 1e-3
}

/// Scenario: a synthetic 2x2 24bpp BMP round-trips through loading and
/// sampling with its four corner colors intact.
fn asset_bmp_sample() -> bool {
	let path = std::env::temp_dir().join("renderer_test_harness_sample.bmp");

	// Bottom-up 24bpp BMP, 2x2 pixels, BGR per pixel, rows padded to 4 bytes.
	// Bottom row (file row 0): blue, white. Top row (file row 1): red, green.
	let pixel_data: [u8; 16] = [
		255, 0, 0, 255, 255, 255, 0, 0, // bottom row + 2 padding bytes
		0, 0, 255, 0, 255, 0, 0, 0, // top row + 2 padding bytes
	];
	let data_offset: u32 = 54;
	let file_size = data_offset + pixel_data.len() as u32;

	let mut bytes = Vec::with_capacity(file_size as usize);
	bytes.extend_from_slice(b"BM");
	bytes.extend_from_slice(&file_size.to_le_bytes());
	bytes.extend_from_slice(&0u16.to_le_bytes()); // reserved1
	bytes.extend_from_slice(&0u16.to_le_bytes()); // reserved2
	bytes.extend_from_slice(&data_offset.to_le_bytes());
	bytes.extend_from_slice(&40u32.to_le_bytes()); // info header size
	bytes.extend_from_slice(&2i32.to_le_bytes()); // width
	bytes.extend_from_slice(&2i32.to_le_bytes()); // height (positive: bottom-up)
	bytes.extend_from_slice(&1u16.to_le_bytes()); // planes
	bytes.extend_from_slice(&24u16.to_le_bytes()); // bit count
	bytes.extend_from_slice(&0u32.to_le_bytes()); // compression: BI_RGB
	bytes.extend_from_slice(&[0u8; 20]); // unused rest of BITMAPINFOHEADER
	bytes.extend_from_slice(&pixel_data);

	if std::fs::write(&path, &bytes).is_err() {
		return false;
	}

	let image = match assets::load_bmp(path.to_str().unwrap()) {
		Ok(image) => image,
		Err(_) => return false,
	};
	let _ = std::fs::remove_file(&path);

	let close = |a: [f32; 3], b: [f32; 3]| a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() < 1e-3);
	close(image.sample(0.25, 0.25), [1.0, 0.0, 0.0]) // top-left: red
		&& close(image.sample(0.75, 0.25), [0.0, 1.0, 0.0]) // top-right: green
		&& close(image.sample(0.25, 0.75), [0.0, 0.0, 1.0]) // bottom-left: blue
		&& close(image.sample(0.75, 0.75), [1.0, 1.0, 1.0]) // bottom-right: white
}
