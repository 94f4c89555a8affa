//! A minimal flat-RGB triangle scene, shared by the windowed demo binary and
//! the headless PPM writer so both exercise the exact same draw path.

use graphics::{Effect, RgbEffect, Scene};
use math::projection::perspective_fov_lh;
use math::{Matrix4, Vector3};
use raster::{Device, RenderContextHandle, VertexBufferHandle, VertexFieldType};

pub struct TriangleScene {
	effect: RgbEffect,
	vertex_buffer: Option<VertexBufferHandle>,
	aspect_ratio: f32,
}

impl TriangleScene {
	pub fn new(aspect_ratio: f32) -> Self {
		Self { effect: RgbEffect::new(), vertex_buffer: None, aspect_ratio }
	}
}

impl Scene for TriangleScene {
	fn on_load(&mut self, device: &mut Device, _ctx: RenderContextHandle) {
		self.effect.initialize(device).expect("rgb effect failed to initialize");

		let format = device.create_vertex_format(&[VertexFieldType::Position, VertexFieldType::Color]);
		let vertex_buffer = device.create_vertex_buffer(format, 3);
		let offset = device.vertex_buffer_alloc(vertex_buffer, 3);

		let vertices = [
			(Vector3::new(-1.0, -1.0, 3.0), Vector3::new(1.0, 0.0, 0.0)),
			(Vector3::new(0.0, 1.0, 3.0), Vector3::new(0.0, 1.0, 0.0)),
			(Vector3::new(1.0, -1.0, 3.0), Vector3::new(0.0, 0.0, 1.0)),
		];

		let data = device.vertex_buffer_data_mut(vertex_buffer, offset, 3);
		for (i, (pos, color)) in vertices.iter().enumerate() {
			let base = i * 24;
			graphics::bytes::write_vec3(data, base, *pos);
			graphics::bytes::write_vec3(data, base + 12, *color);
		}

		self.effect.set_model_transform(Matrix4::IDENTITY);
		self.effect.set_view_transform(Matrix4::IDENTITY);
		self.effect.set_proj_transform(perspective_fov_lh(90.0_f32.to_radians(), self.aspect_ratio, 0.1, 1000.0));

		self.vertex_buffer = Some(vertex_buffer);
	}

	fn on_unload(&mut self) {}

	fn on_update(&mut self, _ms: f64) {}

	fn on_draw(&mut self, device: &mut Device, ctx: RenderContextHandle) {
		let vertex_buffer = self.vertex_buffer.expect("scene not loaded");
		self.effect.apply(device, ctx);
		device.draw(ctx, vertex_buffer, 0, 3);
	}
}
