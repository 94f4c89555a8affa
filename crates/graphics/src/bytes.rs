//! Raw byte (de)serialization helpers for shader constant blocks and vertex
//! data, mirroring the source's `reinterpret_cast`-through-`void*` shader
//! ABI: vertex streams and constant buffers are opaque byte slices, and a
//! shader function agrees on their layout only by convention.

use math::{Vector2, Vector3};

/// Converts a `Sized`, `Copy` value to its raw byte representation.
pub fn as_u8_slice<T: Copy>(value: &T) -> &[u8] {
	unsafe { std::slice::from_raw_parts((value as *const T) as *const u8, std::mem::size_of::<T>()) }
}

pub fn read_f32(buf: &[u8], offset: usize) -> f32 {
	f32::from_ne_bytes(buf[offset..offset + 4].try_into().unwrap())
}

pub fn write_f32(buf: &mut [u8], offset: usize, value: f32) {
	buf[offset..offset + 4].copy_from_slice(&value.to_ne_bytes());
}

pub fn read_vec3(buf: &[u8], offset: usize) -> Vector3<f32> {
	Vector3::new(read_f32(buf, offset), read_f32(buf, offset + 4), read_f32(buf, offset + 8))
}

pub fn write_vec3(buf: &mut [u8], offset: usize, v: Vector3<f32>) {
	write_f32(buf, offset, v.x);
	write_f32(buf, offset + 4, v.y);
	write_f32(buf, offset + 8, v.z);
}

pub fn read_vec2(buf: &[u8], offset: usize) -> Vector2<f32> {
	Vector2::new(read_f32(buf, offset), read_f32(buf, offset + 4))
}

pub fn write_vec2(buf: &mut [u8], offset: usize, v: Vector2<f32>) {
	write_f32(buf, offset, v.x);
	write_f32(buf, offset + 4, v.y);
}
