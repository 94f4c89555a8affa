//! Fixed-function state bound to a render context: depth/stencil arbitration
//! and blending. Only the subset of each actually exercised by the
//! rasterizer is implemented; the rest of the enumerations are kept so
//! callers can express intent even where the blend/depth backend is a fixed
//! two-mode affair.

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DepthWriteMask {
	All,
	Zero,
}

#[derive(Clone, Copy, Debug)]
pub struct DepthStencilState {
	pub depth_enable: bool,
	pub stencil_enable: bool,
	pub depth_write_mask: DepthWriteMask,
	pub stencil_write_mask: u8,
}

impl Default for DepthStencilState {
	fn default() -> Self {
		Self {
			depth_enable: true,
			stencil_enable: true,
			depth_write_mask: DepthWriteMask::All,
			stencil_write_mask: 0,
		}
	}
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BlendFactor {
	Zero,
	One,
	SrcColor,
	DestColor,
	SrcAlpha,
	DestAlpha,
	InvSrcColor,
	InvDestColor,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BlendOp {
	Add,
	Subtract,
	RevSubtract,
	Min,
	Max,
}

/// Only `enabled = false` (pass-through) and `enabled = true` with the
/// implicit 50/50 average are actually exercised by the rasterizer; the
/// factor/op fields are recorded but not consulted.
#[derive(Clone, Copy, Debug)]
pub struct BlendState {
	pub enabled: bool,
	pub src_factor: BlendFactor,
	pub dst_factor: BlendFactor,
	pub op: BlendOp,
	pub src_factor_alpha: BlendFactor,
	pub dst_factor_alpha: BlendFactor,
	pub op_alpha: BlendOp,
}

impl Default for BlendState {
	fn default() -> Self {
		Self {
			enabled: false,
			src_factor: BlendFactor::One,
			dst_factor: BlendFactor::Zero,
			op: BlendOp::Add,
			src_factor_alpha: BlendFactor::One,
			dst_factor_alpha: BlendFactor::Zero,
			op_alpha: BlendOp::Add,
		}
	}
}
