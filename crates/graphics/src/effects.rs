//! Prebuilt shader/format/constant-block bundles. Each effect owns a vertex
//! and pixel shader pair plus the vertex formats they were bound with, and
//! knows how to push its constant block to a render context.

use error::Error;
use math::projection::transform_point;
use math::{Matrix4, Vector3, Vector4};
use raster::{Device, PixelShaderFn, RenderContextHandle, Texture2D, Texture2DHandle, VertexFieldType, VertexShaderFn};

use crate::bytes::{as_u8_slice, read_vec2, read_vec3, write_vec2, write_vec3};

/// A bound shader pair plus the transforms every effect accepts.
pub trait Effect {
	fn initialize(&mut self, device: &mut Device) -> Result<(), Error>;
	fn apply(&self, device: &mut Device, ctx: RenderContextHandle);

	fn set_model_transform(&mut self, model: Matrix4<f32>);
	fn set_view_transform(&mut self, view: Matrix4<f32>);
	fn set_proj_transform(&mut self, proj: Matrix4<f32>);
}

// -- Flat RGB -----------------------------------------------------------------

#[derive(Clone, Copy)]
#[repr(C)]
struct RgbConstants {
	model: Matrix4<f32>,
	view: Matrix4<f32>,
	proj: Matrix4<f32>,
}

pub struct RgbEffect {
	vertex_shader: Option<raster::VertexShaderHandle>,
	pixel_shader: Option<raster::PixelShaderHandle>,
	constants: RgbConstants,
}

impl RgbEffect {
	pub fn new() -> Self {
		Self {
			vertex_shader: None,
			pixel_shader: None,
			constants: RgbConstants { model: Matrix4::IDENTITY, view: Matrix4::IDENTITY, proj: Matrix4::IDENTITY },
		}
	}

	fn vs_impl(out: &mut [u8], input: &[u8], constants: &[u8]) {
		let pos_wld = read_vec3(input, 0);
		let color = read_vec3(input, 12);
		let ctx = unsafe { &*(constants.as_ptr() as *const RgbConstants) };

		let pos_cam = transform_point(ctx.view * ctx.model, pos_wld);
		let pos_ndc = transform_point(ctx.proj, pos_cam);

		write_vec3(out, 0, pos_cam);
		write_vec3(out, 12, pos_ndc);
		write_vec3(out, 24, color);
	}

	fn ps_impl(out: &mut [u8], input: &[u8], _constants: &[u8]) {
		let color = read_vec3(input, 24);
		write_vec3(out, 0, color);
	}
}

impl Default for RgbEffect {
	fn default() -> Self {
		Self::new()
	}
}

impl Effect for RgbEffect {
	fn initialize(&mut self, device: &mut Device) -> Result<(), Error> {
		let vs_in = device.create_vertex_format(&[VertexFieldType::Position, VertexFieldType::Color]);
		let vs_out = device.create_vertex_format(&[
			VertexFieldType::Position,
			VertexFieldType::SvPosition,
			VertexFieldType::Color,
		]);
		let ps_out = device.create_vertex_format(&[VertexFieldType::Color]);

		self.vertex_shader = Some(device.create_vertex_shader(Self::vs_impl as VertexShaderFn, vs_in, vs_out)?);
		self.pixel_shader = Some(device.create_pixel_shader(Self::ps_impl as PixelShaderFn, vs_out, ps_out)?);
		log::debug!("flat rgb effect initialized");
		Ok(())
	}

	fn apply(&self, device: &mut Device, ctx: RenderContextHandle) {
		device.set_vertex_shader(ctx, self.vertex_shader.expect("effect not initialized"));
		device.set_pixel_shader(ctx, self.pixel_shader.expect("effect not initialized"));
		device.vs_set_constants(ctx, as_u8_slice(&self.constants));
		device.ps_set_constants(ctx, as_u8_slice(&self.constants));
	}

	fn set_model_transform(&mut self, model: Matrix4<f32>) {
		self.constants.model = model;
	}

	fn set_view_transform(&mut self, view: Matrix4<f32>) {
		self.constants.view = view;
	}

	fn set_proj_transform(&mut self, proj: Matrix4<f32>) {
		self.constants.proj = proj;
	}
}

// -- Textured -------------------------------------------------------------------

#[derive(Clone, Copy)]
#[repr(C)]
struct TextureConstants {
	model: Matrix4<f32>,
	view: Matrix4<f32>,
	proj: Matrix4<f32>,
	// Resolved fresh in every `apply`, not stored across frames: shaders are
	// plain `fn` pointers with no device access, so the sampled texture has
	// to travel through the constant block itself. Re-resolving each call
	// (rather than caching the pointer from `initialize`) avoids the pointer
	// dangling if the device's texture pool grows and reallocates later.
	texture: *const Texture2D,
}

pub struct TextureEffect {
	vertex_shader: Option<raster::VertexShaderHandle>,
	pixel_shader: Option<raster::PixelShaderHandle>,
	texture: Texture2DHandle,
	model: Matrix4<f32>,
	view: Matrix4<f32>,
	proj: Matrix4<f32>,
}

impl TextureEffect {
	pub fn new(texture: Texture2DHandle) -> Self {
		Self {
			vertex_shader: None,
			pixel_shader: None,
			texture,
			model: Matrix4::IDENTITY,
			view: Matrix4::IDENTITY,
			proj: Matrix4::IDENTITY,
		}
	}

	fn vs_impl(out: &mut [u8], input: &[u8], constants: &[u8]) {
		let pos_wld = read_vec3(input, 0);
		let uv = read_vec2(input, 12);
		let ctx = unsafe { &*(constants.as_ptr() as *const TextureConstants) };

		let pos_cam = transform_point(ctx.view * ctx.model, pos_wld);
		let pos_ndc = transform_point(ctx.proj, pos_cam);

		write_vec3(out, 0, pos_cam);
		write_vec3(out, 12, pos_ndc);
		write_vec2(out, 24, uv);
	}

	fn ps_impl(out: &mut [u8], input: &[u8], constants: &[u8]) {
		let ctx = unsafe { &*(constants.as_ptr() as *const TextureConstants) };
		let uv = read_vec2(input, 24);
		// SAFETY: see the comment on `TextureConstants::texture`.
		let texture = unsafe { &*ctx.texture };
		let [r, g, b] = texture.sample(uv.x, uv.y);
		write_vec3(out, 0, Vector3::new(r, g, b));
	}
}

impl Effect for TextureEffect {
	fn initialize(&mut self, device: &mut Device) -> Result<(), Error> {
		let vs_in = device.create_vertex_format(&[VertexFieldType::Position, VertexFieldType::TexCoord]);
		let vs_out = device.create_vertex_format(&[
			VertexFieldType::Position,
			VertexFieldType::SvPosition,
			VertexFieldType::TexCoord,
		]);
		let ps_out = device.create_vertex_format(&[VertexFieldType::Color]);

		self.vertex_shader = Some(device.create_vertex_shader(Self::vs_impl as VertexShaderFn, vs_in, vs_out)?);
		self.pixel_shader = Some(device.create_pixel_shader(Self::ps_impl as PixelShaderFn, vs_out, ps_out)?);
		log::debug!("textured effect initialized");
		Ok(())
	}

	fn apply(&self, device: &mut Device, ctx: RenderContextHandle) {
		let texture = device.texture(self.texture) as *const Texture2D;
		let constants = TextureConstants { model: self.model, view: self.view, proj: self.proj, texture };
		device.set_vertex_shader(ctx, self.vertex_shader.expect("effect not initialized"));
		device.set_pixel_shader(ctx, self.pixel_shader.expect("effect not initialized"));
		device.vs_set_constants(ctx, as_u8_slice(&constants));
		device.ps_set_constants(ctx, as_u8_slice(&constants));
	}

	fn set_model_transform(&mut self, model: Matrix4<f32>) {
		self.model = model;
	}

	fn set_view_transform(&mut self, view: Matrix4<f32>) {
		self.view = view;
	}

	fn set_proj_transform(&mut self, proj: Matrix4<f32>) {
		self.proj = proj;
	}
}

// -- Blinn-Phong ------------------------------------------------------------------

#[derive(Clone, Copy)]
#[repr(C)]
pub struct MaterialParams {
	pub ambient: Vector4<f32>,
	pub diffuse: Vector4<f32>,
	pub specular: Vector4<f32>,
}

#[derive(Clone, Copy)]
#[repr(C)]
pub struct LightParams {
	pub pos_wld: Vector3<f32>,
	pub attenuation: Vector3<f32>,
	pub ambient: Vector4<f32>,
	pub diffuse: Vector4<f32>,
	pub specular: Vector4<f32>,
}

#[derive(Clone, Copy)]
#[repr(C)]
struct BlinnPhongConstants {
	model: Matrix4<f32>,
	view: Matrix4<f32>,
	proj: Matrix4<f32>,
	camera_pos_wld: Vector3<f32>,
	material: MaterialParams,
	light: LightParams,
}

pub struct BlinnPhongEffect {
	vertex_shader: Option<raster::VertexShaderHandle>,
	pixel_shader: Option<raster::PixelShaderHandle>,
	constants: BlinnPhongConstants,
}

impl BlinnPhongEffect {
	pub fn new(material: MaterialParams, light: LightParams) -> Self {
		Self {
			vertex_shader: None,
			pixel_shader: None,
			constants: BlinnPhongConstants {
				model: Matrix4::IDENTITY,
				view: Matrix4::IDENTITY,
				proj: Matrix4::IDENTITY,
				camera_pos_wld: Vector3::new(0.0, 0.0, 0.0),
				material,
				light,
			},
		}
	}

	pub fn set_camera_position(&mut self, camera_pos_wld: Vector3<f32>) {
		self.constants.camera_pos_wld = camera_pos_wld;
	}

	fn vs_impl(out: &mut [u8], input: &[u8], constants: &[u8]) {
		let pos_wld = read_vec3(input, 0);
		let norm_wld = read_vec3(input, 12);
		let ctx = unsafe { &*(constants.as_ptr() as *const BlinnPhongConstants) };

		let pos_cam = transform_point(ctx.view * ctx.model, pos_wld);
		let pos_ndc = transform_point(ctx.proj, pos_cam);

		write_vec3(out, 0, pos_cam);
		write_vec3(out, 12, pos_ndc);
		// Matches the source: posWld/normWld pass straight through, the
		// model transform only feeds the camera-space/NDC computation above.
		write_vec3(out, 24, pos_wld);
		write_vec3(out, 36, norm_wld);
	}

	fn ps_impl(out: &mut [u8], input: &[u8], constants: &[u8]) {
		let pos_wld = read_vec3(input, 24);
		let norm_wld = read_vec3(input, 36);
		let ctx = unsafe { &*(constants.as_ptr() as *const BlinnPhongConstants) };

		let color = compute_blinn_phong(pos_wld, ctx.camera_pos_wld, norm_wld, &ctx.material, &ctx.light);
		write_vec3(out, 0, color);
	}
}

/// Ambient + N·L diffuse + reflected-highlight specular (shininess fixed at
/// 8), each term weighted by the material's per-channel `w` and, for
/// diffuse/specular, the light's inverse-quadratic attenuation.
fn compute_blinn_phong(
	pos_wld: Vector3<f32>,
	eye_wld: Vector3<f32>,
	norm_wld: Vector3<f32>,
	material: &MaterialParams,
	light: &LightParams,
) -> Vector3<f32> {
	let light_vec = pos_wld - light.pos_wld;
	let light_distance = light_vec.length();
	let light_dir = *light_vec.normalize();

	let ambient = material.ambient.truncate().cmul(light.ambient.truncate());

	let decay = (-light_dir).dot(norm_wld).max(0.0);
	let diffuse = light.diffuse.truncate().cmul(material.diffuse.truncate()) * decay;

	let reflect_dir = *(light_dir - norm_wld * (2.0 * norm_wld.dot(light_dir))).normalize();
	let to_eye_dir = *(eye_wld - pos_wld).normalize();
	let mut spec_decay = reflect_dir.dot(to_eye_dir).max(0.0);
	spec_decay = spec_decay * spec_decay;
	spec_decay = spec_decay * spec_decay;
	spec_decay = spec_decay * spec_decay;
	let specular = light.specular.truncate().cmul(material.specular.truncate()) * spec_decay;

	let atte_factor = 1.0 / light.attenuation.dot(Vector3::new(1.0, light_distance, light_distance * light_distance));

	let color = ambient * material.ambient.w
		+ diffuse * (material.diffuse.w * atte_factor)
		+ specular * (material.specular.w * atte_factor);

	Vector3::new(color.x.clamp(0.0, 1.0), color.y.clamp(0.0, 1.0), color.z.clamp(0.0, 1.0))
}

impl Effect for BlinnPhongEffect {
	fn initialize(&mut self, device: &mut Device) -> Result<(), Error> {
		let vs_in = device.create_vertex_format(&[VertexFieldType::Position, VertexFieldType::Normal]);
		let vs_out = device.create_vertex_format(&[
			VertexFieldType::Position,
			VertexFieldType::SvPosition,
			VertexFieldType::Position,
			VertexFieldType::Normal,
		]);
		let ps_out = device.create_vertex_format(&[VertexFieldType::Color]);

		self.vertex_shader = Some(device.create_vertex_shader(Self::vs_impl as VertexShaderFn, vs_in, vs_out)?);
		self.pixel_shader = Some(device.create_pixel_shader(Self::ps_impl as PixelShaderFn, vs_out, ps_out)?);
		log::debug!("blinn-phong effect initialized");
		Ok(())
	}

	fn apply(&self, device: &mut Device, ctx: RenderContextHandle) {
		device.set_vertex_shader(ctx, self.vertex_shader.expect("effect not initialized"));
		device.set_pixel_shader(ctx, self.pixel_shader.expect("effect not initialized"));
		device.vs_set_constants(ctx, as_u8_slice(&self.constants));
		device.ps_set_constants(ctx, as_u8_slice(&self.constants));
	}

	fn set_model_transform(&mut self, model: Matrix4<f32>) {
		self.constants.model = model;
	}

	fn set_view_transform(&mut self, view: Matrix4<f32>) {
		self.constants.view = view;
	}

	fn set_proj_transform(&mut self, proj: Matrix4<f32>) {
		self.constants.proj = proj;
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn blinn_phong_output_is_bounded_to_unit_range() {
		let material = MaterialParams {
			ambient: Vector4::new(0.2, 0.2, 0.2, 1.0),
			diffuse: Vector4::new(0.8, 0.8, 0.8, 1.0),
			specular: Vector4::new(1.0, 1.0, 1.0, 1.0),
		};
		let light = LightParams {
			pos_wld: Vector3::new(0.0, 5.0, 0.0),
			attenuation: Vector3::new(1.0, 0.0, 0.0),
			ambient: Vector4::new(1.0, 1.0, 1.0, 1.0),
			diffuse: Vector4::new(1.0, 1.0, 1.0, 1.0),
			specular: Vector4::new(1.0, 1.0, 1.0, 1.0),
		};
		let color = compute_blinn_phong(
			Vector3::new(0.0, 0.0, 0.0),
			Vector3::new(0.0, 2.0, 5.0),
			Vector3::new(0.0, 1.0, 0.0),
			&material,
			&light,
		);
		assert!(color.x >= 0.0 && color.x <= 1.0);
		assert!(color.y >= 0.0 && color.y <= 1.0);
		assert!(color.z >= 0.0 && color.z <= 1.0);
	}
}
