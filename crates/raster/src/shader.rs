//! Typed function slots for the two programmable stages.
//!
//! Neither stage is a closure: both are plain function pointers operating on
//! raw byte slices, matching the vertex-format-driven, introspection-free
//! contract the rasterizer enforces at bind time rather than at call time.

/// `(out, input, constants)`. `input` is one vertex in the bound VS-in
/// format; `out` is one vertex in the bound VS-out format, whose first field
/// must be the camera-space position and second the NDC position.
pub type VertexShaderFn = fn(out: &mut [u8], input: &[u8], constants: &[u8]);

/// `(out, input, constants)`. `input` matches the VS-out format; `out` holds
/// exactly one COLOR field (3 packed f32s).
pub type PixelShaderFn = fn(out: &mut [u8], input: &[u8], constants: &[u8]);
