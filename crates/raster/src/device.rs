//! The device: owns every resource pool and the render contexts that bind
//! them. Resources are appended, never removed — a handle's index is stable
//! for the device's whole lifetime, and indexing with a handle minted by a
//! different device panics rather than silently aliasing storage.

use std::sync::atomic::{AtomicU32, Ordering};

use error::Error;

use crate::buffer::Buffer2D;
use crate::handle::{
	DepthStencilHandle, Handle, PixelShaderHandle, RenderContextHandle, RenderTargetHandle, SwapChainHandle,
	Texture2DHandle, VertexBufferHandle, VertexFormatHandle, VertexShaderHandle,
};
use crate::rect::Rect;
use crate::shader::{PixelShaderFn, VertexShaderFn};
use crate::state::{BlendState, DepthStencilState};
use crate::texture::Texture2D;
use crate::vertex::{VertexFieldType, VertexFormat};

static NEXT_DEVICE_TAG: AtomicU32 = AtomicU32::new(1);

struct RenderTargetDesc {
	full_rect: Rect,
	rect: Rect,
}

struct SwapChainDesc {
	front: u8,
	render_target: RenderTargetHandle,
	buffers: [usize; 2],
}

struct DepthStencilDesc {
	depth_buffer: usize,
	stencil_buffer: usize,
}

struct VertexBufferDesc {
	buffer: usize,
	format: VertexFormatHandle,
	capacity: u32,
	allocated: u32,
}

struct ShaderDesc<F> {
	func: F,
	in_format: VertexFormatHandle,
	out_format: VertexFormatHandle,
}

/// The mutable draw-state bundle a draw call is routed through. Owns none of
/// the resources it references.
pub struct RenderContextImpl {
	pub(crate) swap_chain: Option<SwapChainHandle>,
	pub(crate) depth_stencil: Option<DepthStencilHandle>,
	pub(crate) render_target: Option<RenderTargetHandle>,
	pub(crate) vertex_shader: Option<VertexShaderHandle>,
	pub(crate) pixel_shader: Option<PixelShaderHandle>,
	pub(crate) vs_constants: Vec<u8>,
	pub(crate) ps_constants: Vec<u8>,
	pub(crate) flip_horizontal: bool,
	pub(crate) depth_stencil_state: DepthStencilState,
	pub(crate) blend_state: BlendState,
}

impl Default for RenderContextImpl {
	fn default() -> Self {
		Self {
			swap_chain: None,
			depth_stencil: None,
			render_target: None,
			vertex_shader: None,
			pixel_shader: None,
			vs_constants: Vec::new(),
			ps_constants: Vec::new(),
			flip_horizontal: false,
			depth_stencil_state: DepthStencilState::default(),
			blend_state: BlendState::default(),
		}
	}
}

pub struct Device {
	tag: u32,
	pub(crate) buffers: Vec<Buffer2D>,
	vertex_formats: Vec<VertexFormat>,
	vertex_buffers: Vec<VertexBufferDesc>,
	textures: Vec<Texture2D>,
	vertex_shaders: Vec<ShaderDesc<VertexShaderFn>>,
	pixel_shaders: Vec<ShaderDesc<PixelShaderFn>>,
	render_targets: Vec<RenderTargetDesc>,
	swap_chains: Vec<SwapChainDesc>,
	depth_stencils: Vec<DepthStencilDesc>,
	pub(crate) render_contexts: Vec<RenderContextImpl>,
}

impl Device {
	pub fn new() -> Self {
		let tag = NEXT_DEVICE_TAG.fetch_add(1, Ordering::Relaxed);
		log::debug!("device created, tag={tag}");
		Self {
			tag,
			buffers: Vec::new(),
			vertex_formats: Vec::new(),
			vertex_buffers: Vec::new(),
			textures: Vec::new(),
			vertex_shaders: Vec::new(),
			pixel_shaders: Vec::new(),
			render_targets: Vec::new(),
			swap_chains: Vec::new(),
			depth_stencils: Vec::new(),
			render_contexts: Vec::new(),
		}
	}

	fn handle<Kind>(&self, index: usize) -> Handle<Kind> {
		Handle::new(index as u32, self.tag)
	}

	fn idx<Kind>(&self, h: Handle<Kind>) -> usize {
		h.index(self.tag)
	}

	// -- Vertex formats ---------------------------------------------------

	pub fn create_vertex_format(&mut self, fields: &[VertexFieldType]) -> VertexFormatHandle {
		let format = VertexFormat::new(fields);
		log::debug!("vertex format created: {} fields, size {}", format.field_count(), format.size());
		self.vertex_formats.push(format);
		self.handle(self.vertex_formats.len() - 1)
	}

	pub fn vertex_format(&self, h: VertexFormatHandle) -> &VertexFormat {
		&self.vertex_formats[self.idx(h)]
	}

	// -- Render targets -----------------------------------------------------

	pub fn create_render_target(&mut self, width: u32, height: u32) -> RenderTargetHandle {
		let rect = Rect::from_size(width as i32, height as i32);
		self.render_targets.push(RenderTargetDesc { full_rect: rect, rect });
		log::debug!("render target created: {width}x{height}");
		self.handle(self.render_targets.len() - 1)
	}

	/// Builds a sub-rectangle render target sharing the parent's backing
	/// surface. Fails if `rect` is not fully contained in the parent.
	pub fn create_sub_render_target(&mut self, parent: RenderTargetHandle, rect: Rect) -> Result<RenderTargetHandle, Error> {
		let parent_desc = &self.render_targets[self.idx(parent)];
		if !parent_desc.rect.contains(&rect) {
			return Err(Error::new("sub render target rect is not contained in its parent"));
		}
		let full_rect = parent_desc.full_rect;
		self.render_targets.push(RenderTargetDesc { full_rect, rect });
		Ok(self.handle(self.render_targets.len() - 1))
	}

	pub fn render_target_rect(&self, h: RenderTargetHandle) -> Rect {
		self.render_targets[self.idx(h)].rect
	}

	// -- Swap chains ---------------------------------------------------------

	pub fn create_swap_chain(&mut self, render_target: RenderTargetHandle) -> SwapChainHandle {
		let rect = self.render_target_rect(render_target);
		let width = rect.width() as u32;
		let height = rect.height() as u32;
		let row_padding_target = 4u32;
		let raw_row = width * 3;
		let row_padding = (row_padding_target - (raw_row % row_padding_target)) % row_padding_target;

		let front = self.push_buffer(Buffer2D::new(width, height, 3, 4, row_padding));
		let back = self.push_buffer(Buffer2D::new(width, height, 3, 4, row_padding));

		self.swap_chains.push(SwapChainDesc { front: 0, render_target, buffers: [front, back] });
		log::debug!("swap chain created: {width}x{height}");
		self.handle(self.swap_chains.len() - 1)
	}

	fn push_buffer(&mut self, buffer: Buffer2D) -> usize {
		self.buffers.push(buffer);
		self.buffers.len() - 1
	}

	pub fn swap(&mut self, h: SwapChainHandle) {
		let desc = &mut self.swap_chains[self.idx(h)];
		desc.front ^= 1;
	}

	pub fn back_buffer_mut(&mut self, h: SwapChainHandle) -> &mut Buffer2D {
		let idx = self.back_buffer_index(h);
		&mut self.buffers[idx]
	}

	pub(crate) fn back_buffer_index(&self, h: SwapChainHandle) -> usize {
		let desc = &self.swap_chains[self.idx(h)];
		desc.buffers[1 - desc.front as usize]
	}

	pub fn front_buffer(&self, h: SwapChainHandle) -> &Buffer2D {
		let desc = &self.swap_chains[self.idx(h)];
		let front = desc.buffers[desc.front as usize];
		&self.buffers[front]
	}

	pub fn reset_back_buffer(&mut self, h: SwapChainHandle, value: [u8; 3]) {
		let idx = {
			let desc = &self.swap_chains[self.idx(h)];
			desc.buffers[1 - desc.front as usize]
		};
		self.buffers[idx].fill_all_as(value);
	}

	// -- Depth/stencil --------------------------------------------------------

	pub fn create_depth_stencil_buffer(&mut self, width: u32, height: u32) -> DepthStencilHandle {
		let depth = self.push_buffer(Buffer2D::new(width, height, 4, 4, 0));
		let stencil = self.push_buffer(Buffer2D::new(width, height, 1, 1, 0));
		self.buffers[depth].fill_all_as(1.0f32);
		self.buffers[stencil].fill_all(0xff);
		log::debug!("depth/stencil buffer created: {width}x{height}");
		self.depth_stencils.push(DepthStencilDesc { depth_buffer: depth, stencil_buffer: stencil });
		self.handle(self.depth_stencils.len() - 1)
	}

	pub fn reset_depth_buffer(&mut self, h: DepthStencilHandle, value: f32) {
		let idx = self.depth_stencils[self.idx(h)].depth_buffer;
		self.buffers[idx].fill_all_as(value);
	}

	pub fn reset_stencil_buffer(&mut self, h: DepthStencilHandle, value: u8) {
		let idx = self.depth_stencils[self.idx(h)].stencil_buffer;
		self.buffers[idx].fill_all(value);
	}

	pub(crate) fn depth_buffer_mut(&mut self, h: DepthStencilHandle) -> &mut Buffer2D {
		let idx = self.depth_stencils[self.idx(h)].depth_buffer;
		&mut self.buffers[idx]
	}

	pub(crate) fn stencil_buffer_mut(&mut self, h: DepthStencilHandle) -> &mut Buffer2D {
		let idx = self.depth_stencils[self.idx(h)].stencil_buffer;
		&mut self.buffers[idx]
	}

	pub(crate) fn depth_stencil_indices(&self, h: DepthStencilHandle) -> (usize, usize) {
		let desc = &self.depth_stencils[self.idx(h)];
		(desc.depth_buffer, desc.stencil_buffer)
	}

	// -- Vertex buffers -------------------------------------------------------

	pub fn create_vertex_buffer(&mut self, format: VertexFormatHandle, capacity: u32) -> VertexBufferHandle {
		let element_size = self.vertex_format(format).size();
		let buffer = self.push_buffer(Buffer2D::new(capacity, 1, element_size, 4, 0));
		log::debug!("vertex buffer created: capacity {capacity}, element size {element_size}");
		self.vertex_buffers.push(VertexBufferDesc { buffer, format, capacity, allocated: 0 });
		self.handle(self.vertex_buffers.len() - 1)
	}

	/// Bump-allocates `count` contiguous vertex slots, returning the starting
	/// offset. Freeing is a no-op; buffer lifetime equals device lifetime.
	pub fn vertex_buffer_alloc(&mut self, h: VertexBufferHandle, count: u32) -> u32 {
		let desc = &mut self.vertex_buffers[self.idx(h)];
		assert!(desc.allocated + count <= desc.capacity, "vertex buffer capacity exceeded");
		let offset = desc.allocated;
		desc.allocated += count;
		offset
	}

	pub fn vertex_buffer_format(&self, h: VertexBufferHandle) -> VertexFormatHandle {
		self.vertex_buffers[self.idx(h)].format
	}

	pub fn vertex_buffer_count(&self, h: VertexBufferHandle) -> u32 {
		self.vertex_buffers[self.idx(h)].allocated
	}

	pub fn vertex_buffer_data(&self, h: VertexBufferHandle, vertex_offset: u32, vertex_count: u32) -> &[u8] {
		let desc = &self.vertex_buffers[self.idx(h)];
		let buffer = &self.buffers[desc.buffer];
		let stride = buffer.element_size() as usize;
		let start = vertex_offset as usize * stride;
		&buffer.data()[start..start + vertex_count as usize * stride]
	}

	pub fn vertex_buffer_data_mut(&mut self, h: VertexBufferHandle, vertex_offset: u32, vertex_count: u32) -> &mut [u8] {
		let desc = &self.vertex_buffers[self.idx(h)];
		let buffer = &mut self.buffers[desc.buffer];
		let stride = buffer.element_size() as usize;
		let start = vertex_offset as usize * stride;
		&mut buffer.data_mut()[start..start + vertex_count as usize * stride]
	}

	// -- Textures -------------------------------------------------------------

	pub fn create_texture_2d_bgr(&mut self, width: u32, height: u32, bgr: &[u8]) -> Texture2DHandle {
		self.textures.push(Texture2D::from_bgr(width, height, bgr));
		log::debug!("texture created: {width}x{height}");
		self.handle(self.textures.len() - 1)
	}

	pub fn texture(&self, h: Texture2DHandle) -> &Texture2D {
		&self.textures[self.idx(h)]
	}

	// -- Shaders ---------------------------------------------------------------

	/// Validates that `out_format`'s first two fields are both 3-float
	/// fields (camera-space position, then NDC position) before binding.
	pub fn create_vertex_shader(
		&mut self,
		func: VertexShaderFn,
		in_format: VertexFormatHandle,
		out_format: VertexFormatHandle,
	) -> Result<VertexShaderHandle, Error> {
		let out = self.vertex_format(out_format);
		if out.field_count() < 2 || out.field(0).ty == VertexFieldType::TexCoord || out.field(1).ty == VertexFieldType::TexCoord
		{
			return Err(Error::new("vertex shader out format must start with two 3-float position fields"));
		}
		self.vertex_shaders.push(ShaderDesc { func, in_format, out_format });
		Ok(self.handle(self.vertex_shaders.len() - 1))
	}

	/// Validates that `out_format` is exactly one COLOR field before
	/// binding.
	pub fn create_pixel_shader(
		&mut self,
		func: PixelShaderFn,
		in_format: VertexFormatHandle,
		out_format: VertexFormatHandle,
	) -> Result<PixelShaderHandle, Error> {
		let out = self.vertex_format(out_format);
		if out.field_count() != 1 || out.field(0).ty != VertexFieldType::Color {
			return Err(Error::new("pixel shader out format must be exactly one COLOR field"));
		}
		self.pixel_shaders.push(ShaderDesc { func, in_format, out_format });
		Ok(self.handle(self.pixel_shaders.len() - 1))
	}

	pub(crate) fn vertex_shader(&self, h: VertexShaderHandle) -> (VertexShaderFn, VertexFormatHandle, VertexFormatHandle) {
		let d = &self.vertex_shaders[self.idx(h)];
		(d.func, d.in_format, d.out_format)
	}

	pub(crate) fn pixel_shader(&self, h: PixelShaderHandle) -> (PixelShaderFn, VertexFormatHandle, VertexFormatHandle) {
		let d = &self.pixel_shaders[self.idx(h)];
		(d.func, d.in_format, d.out_format)
	}

	// -- Render contexts --------------------------------------------------------

	pub fn create_render_context(&mut self) -> RenderContextHandle {
		self.render_contexts.push(RenderContextImpl::default());
		self.handle(self.render_contexts.len() - 1)
	}

	pub fn context_mut(&mut self, h: RenderContextHandle) -> &mut RenderContextImpl {
		&mut self.render_contexts[self.idx(h)]
	}

	pub fn context(&self, h: RenderContextHandle) -> &RenderContextImpl {
		&self.render_contexts[self.idx(h)]
	}

	pub fn set_swap_chain(&mut self, ctx: RenderContextHandle, swap_chain: SwapChainHandle) {
		self.context_mut(ctx).swap_chain = Some(swap_chain);
	}

	pub fn set_depth_stencil_buffer(&mut self, ctx: RenderContextHandle, depth_stencil: DepthStencilHandle) {
		self.context_mut(ctx).depth_stencil = Some(depth_stencil);
	}

	pub fn set_render_target(&mut self, ctx: RenderContextHandle, render_target: RenderTargetHandle) {
		self.context_mut(ctx).render_target = Some(render_target);
	}

	pub fn set_vertex_shader(&mut self, ctx: RenderContextHandle, vs: VertexShaderHandle) {
		self.context_mut(ctx).vertex_shader = Some(vs);
	}

	pub fn set_pixel_shader(&mut self, ctx: RenderContextHandle, ps: PixelShaderHandle) {
		self.context_mut(ctx).pixel_shader = Some(ps);
	}

	pub fn vs_set_constants(&mut self, ctx: RenderContextHandle, bytes: &[u8]) {
		self.context_mut(ctx).vs_constants = bytes.to_vec();
	}

	pub fn ps_set_constants(&mut self, ctx: RenderContextHandle, bytes: &[u8]) {
		self.context_mut(ctx).ps_constants = bytes.to_vec();
	}

	pub fn rs_set_flip_horizontal(&mut self, ctx: RenderContextHandle, flip: bool) {
		self.context_mut(ctx).flip_horizontal = flip;
	}

	pub fn om_set_depth_stencil_state(&mut self, ctx: RenderContextHandle, state: DepthStencilState) {
		self.context_mut(ctx).depth_stencil_state = state;
	}

	pub fn om_set_blend_state(&mut self, ctx: RenderContextHandle, state: BlendState) {
		self.context_mut(ctx).blend_state = state;
	}

	pub fn get_depth_stencil_buffer(&self, ctx: RenderContextHandle) -> Option<DepthStencilHandle> {
		self.context(ctx).depth_stencil
	}

	pub fn get_render_target(&self, ctx: RenderContextHandle) -> Option<RenderTargetHandle> {
		self.context(ctx).render_target
	}
}

impl Default for Device {
	fn default() -> Self {
		Self::new()
	}
}
