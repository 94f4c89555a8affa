//! Opaque handles into a [`Device`](crate::device::Device)'s resource tables.
//!
//! A handle is an index plus the tag of the device that minted it, never a
//! pointer into the device's storage — so the backing `Vec`s are free to grow
//! and relocate without invalidating anything callers are holding.

use std::fmt;
use std::marker::PhantomData;

pub struct Handle<Kind> {
	index: u32,
	device_tag: u32,
	_kind: PhantomData<fn() -> Kind>,
}

impl<Kind> Handle<Kind> {
	pub(crate) fn new(index: u32, device_tag: u32) -> Self {
		Self { index, device_tag, _kind: PhantomData }
	}

	/// Resolves this handle to an index within `device_tag`'s tables.
	///
	/// Panics if the handle was minted by a different device — indexing with
	/// a foreign handle is a logic error, not a recoverable one.
	pub(crate) fn index(&self, device_tag: u32) -> usize {
		assert_eq!(self.device_tag, device_tag, "handle used with a foreign device");
		self.index as usize
	}
}

impl<Kind> Clone for Handle<Kind> {
	fn clone(&self) -> Self {
		*self
	}
}

impl<Kind> Copy for Handle<Kind> {}

impl<Kind> fmt::Debug for Handle<Kind> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Handle").field("index", &self.index).field("device", &self.device_tag).finish()
	}
}

impl<Kind> PartialEq for Handle<Kind> {
	fn eq(&self, other: &Self) -> bool {
		self.index == other.index && self.device_tag == other.device_tag
	}
}

impl<Kind> Eq for Handle<Kind> {}

pub struct SwapChainKind;
pub struct DepthStencilKind;
pub struct VertexFormatKind;
pub struct VertexBufferKind;
pub struct Texture2DKind;
pub struct VertexShaderKind;
pub struct PixelShaderKind;
pub struct RenderTargetKind;
pub struct RenderContextKind;

pub type SwapChainHandle = Handle<SwapChainKind>;
pub type DepthStencilHandle = Handle<DepthStencilKind>;
pub type VertexFormatHandle = Handle<VertexFormatKind>;
pub type VertexBufferHandle = Handle<VertexBufferKind>;
pub type Texture2DHandle = Handle<Texture2DKind>;
pub type VertexShaderHandle = Handle<VertexShaderKind>;
pub type PixelShaderHandle = Handle<PixelShaderKind>;
pub type RenderTargetHandle = Handle<RenderTargetKind>;
pub type RenderContextHandle = Handle<RenderContextKind>;
