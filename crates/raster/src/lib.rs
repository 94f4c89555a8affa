//! A software rasterizer with a GPU-analog resource model: a [`Device`]
//! owns handle-indexed pools of buffers, textures, vertex formats/buffers,
//! shaders, render targets and swap chains; a render context binds them for
//! [`rasterize::draw`], the hot loop that turns a vertex stream into pixels.

pub mod buffer;
pub mod clip;
pub mod device;
pub mod handle;
pub mod rasterize;
pub mod rect;
pub mod shader;
pub mod state;
pub mod texture;
pub mod vertex;

pub use buffer::Buffer2D;
pub use device::Device;
pub use handle::{
	DepthStencilHandle, PixelShaderHandle, RenderContextHandle, RenderTargetHandle, SwapChainHandle, Texture2DHandle,
	VertexBufferHandle, VertexFormatHandle, VertexShaderHandle,
};
pub use rect::Rect;
pub use shader::{PixelShaderFn, VertexShaderFn};
pub use state::{BlendFactor, BlendOp, BlendState, DepthStencilState, DepthWriteMask};
pub use texture::Texture2D;
pub use vertex::{VertexField, VertexFieldType, VertexFormat};

impl Device {
	/// Submits a non-indexed draw of `vertex_count` vertices starting at
	/// `vertex_offset`, through the state bound to `ctx`.
	pub fn draw(&mut self, ctx: RenderContextHandle, vertex_buffer: VertexBufferHandle, vertex_offset: u32, vertex_count: u32) {
		rasterize::draw(self, ctx, vertex_buffer, vertex_offset, vertex_count);
	}
}
