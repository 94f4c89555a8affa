//! BMP image loading. The only asset format this system reads: a flat,
//! uncompressed 24-bit bitmap, good enough for texture sampling without
//! pulling in a general image-decoding stack.

use std::fmt;
use std::fs::File;
use std::io::{Cursor, Read};

use byteorder::{LittleEndian, ReadBytesExt};

#[derive(Debug)]
pub enum BmpError {
	Io(std::io::Error),
	BadSignature,
	Unsupported { bit_count: u16, compression: u32 },
}

impl fmt::Display for BmpError {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			BmpError::Io(e) => write!(f, "bmp io error: {e}"),
			BmpError::BadSignature => write!(f, "not a BMP file"),
			BmpError::Unsupported { bit_count, compression } => {
				write!(f, "unsupported bmp: {bit_count}bpp, compression {compression}")
			}
		}
	}
}

impl std::error::Error for BmpError {}

impl From<std::io::Error> for BmpError {
	fn from(e: std::io::Error) -> Self {
		BmpError::Io(e)
	}
}

impl From<BmpError> for error::Error {
	fn from(e: BmpError) -> Self {
		error::Error::new(e.to_string())
	}
}

/// A decoded image: top-down, 3 bytes per pixel, BGR channel order, rows
/// tightly packed (`width * 3` bytes each, no padding).
pub struct Image {
	pub width: u32,
	pub height: u32,
	pub bgr: Vec<u8>,
}

impl Image {
	pub fn sample(&self, u: f32, v: f32) -> [f32; 3] {
		let x = ((u.rem_euclid(1.0)) * self.width as f32) as u32;
		let y = ((v.rem_euclid(1.0)) * self.height as f32) as u32;
		let x = x.min(self.width - 1);
		let y = y.min(self.height - 1);

		let i = ((y * self.width + x) * 3) as usize;
		[
			self.bgr[i + 2] as f32 / 255.0,
			self.bgr[i + 1] as f32 / 255.0,
			self.bgr[i] as f32 / 255.0,
		]
	}
}

const BI_RGB: u32 = 0;

fn parse(data: &[u8]) -> Result<Image, BmpError> {
	let mut cursor = Cursor::new(data);

	let mut signature = [0u8; 2];
	cursor.read_exact(&mut signature)?;
	if &signature != b"BM" {
		return Err(BmpError::BadSignature);
	}

	cursor.read_u32::<LittleEndian>()?; // file size
	cursor.read_u16::<LittleEndian>()?; // reserved1
	cursor.read_u16::<LittleEndian>()?; // reserved2
	let data_offset = cursor.read_u32::<LittleEndian>()?;

	cursor.read_u32::<LittleEndian>()?; // header size
	let width = cursor.read_i32::<LittleEndian>()?;
	let height = cursor.read_i32::<LittleEndian>()?;
	cursor.read_u16::<LittleEndian>()?; // planes
	let bit_count = cursor.read_u16::<LittleEndian>()?;
	let compression = cursor.read_u32::<LittleEndian>()?;

	if bit_count != 24 || compression != BI_RGB {
		return Err(BmpError::Unsupported { bit_count, compression });
	}

	let top_down = height < 0;
	let width = width as u32;
	let height = height.unsigned_abs();

	let row_size = ((width * 3 + 3) / 4) * 4;
	let mut bgr = vec![0u8; (width * height * 3) as usize];

	let pixels = &data[data_offset as usize..];

	for row in 0..height {
		let src_row = if top_down { row } else { height - 1 - row };
		let src = &pixels[(src_row * row_size) as usize..][..(width * 3) as usize];
		let dst = &mut bgr[(row * width * 3) as usize..][..(width * 3) as usize];
		dst.copy_from_slice(src);
	}

	Ok(Image { width, height, bgr })
}

pub fn load_bmp(path: &str) -> Result<Image, error::Error> {
	let mut file = File::open(path)?;
	let mut data = Vec::new();
	file.read_to_end(&mut data)?;
	let image = parse(&data)?;
	log::debug!("loaded bmp {path}: {}x{}", image.width, image.height);
	Ok(image)
}
