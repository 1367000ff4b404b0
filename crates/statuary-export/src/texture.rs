//! TGA texture encoding and the texture naming authority
//!
//! Encodes images as uncompressed true-color TGA (image type 2): an 18-byte
//! little-endian header followed by raw pixels in BGR(A) byte order, rows
//! written bottom-up (bottom-left origin, descriptor origin bits zero).
//! Grayscale and run-length encoding are outside the supported subset.

use std::collections::HashMap;
use std::sync::Arc;

use byteorder::{LittleEndian, WriteBytesExt};
use statuary_core::{Image, PixelFormat};
use thiserror::Error;

/// Texture encoding errors
#[derive(Error, Debug)]
pub enum TextureError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unsupported pixel format: {0}")]
    UnsupportedFormat(PixelFormat),

    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("pixel buffer is {actual} bytes, expected {expected}")]
    BufferSizeMismatch { expected: usize, actual: usize },
}

pub type TextureResult<T> = Result<T, TextureError>;

/// Assigns stable file names to distinct texture instances
///
/// Naming is a pure function of image identity (the `Arc` allocation, not
/// pixel content): the same image always resolves to the same name for the
/// namer's lifetime, and two images with equal content but separate
/// allocations get distinct names. Names are handed out first-come as
/// `tex_001.tga`, `tex_002.tga`, and so on.
///
/// The mesh and material encoders must resolve texture file names through a
/// single shared namer so the references in the documents agree with the
/// files actually written.
#[derive(Debug, Default)]
pub struct TextureNamer {
    by_identity: HashMap<usize, usize>,
    assigned: Vec<(Arc<Image>, String)>,
}

impl TextureNamer {
    pub fn new() -> Self {
        Self::default()
    }

    /// File name for `image`, assigning the next sequential name on first use
    pub fn name_for(&mut self, image: &Arc<Image>) -> String {
        let identity = Arc::as_ptr(image) as usize;

        if let Some(&slot) = self.by_identity.get(&identity) {
            return self.assigned[slot].1.clone();
        }

        let name = format!("tex_{:03}.tga", self.assigned.len() + 1);
        self.by_identity.insert(identity, self.assigned.len());
        self.assigned.push((Arc::clone(image), name.clone()));
        name
    }

    /// Images seen so far with their assigned names, in assignment order
    pub fn assigned(&self) -> impl Iterator<Item = (&Arc<Image>, &str)> {
        self.assigned.iter().map(|(image, name)| (image, name.as_str()))
    }

    /// Number of distinct textures named so far
    pub fn len(&self) -> usize {
        self.assigned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assigned.is_empty()
    }
}

/// Encode an image as an uncompressed true-color TGA buffer
///
/// Supports `Rgb8` (24 bpp) and `Rgba8` (32 bpp, 8 attribute bits);
/// `Gray8` fails with [`TextureError::UnsupportedFormat`]. Dimensions must
/// be non-zero and fit the format's 16-bit header fields.
pub fn encode_tga(image: &Image) -> TextureResult<Vec<u8>> {
    let (bits_per_pixel, descriptor) = match image.format() {
        PixelFormat::Rgb8 => (24u8, 0x00u8),
        PixelFormat::Rgba8 => (32, 0x08),
        other => return Err(TextureError::UnsupportedFormat(other)),
    };

    let width = image.width();
    let height = image.height();
    if width == 0 || height == 0 || width > u16::MAX as u32 || height > u16::MAX as u32 {
        return Err(TextureError::InvalidDimensions { width, height });
    }

    let expected = image.expected_len();
    if image.data().len() != expected {
        return Err(TextureError::BufferSizeMismatch {
            expected,
            actual: image.data().len(),
        });
    }

    let channels = image.format().bytes_per_pixel();
    let mut buf = Vec::with_capacity(18 + expected);

    buf.write_u8(0)?; // image ID length
    buf.write_u8(0)?; // no color map
    buf.write_u8(2)?; // uncompressed true-color
    buf.write_u16::<LittleEndian>(0)?; // color map origin
    buf.write_u16::<LittleEndian>(0)?; // color map length
    buf.write_u8(0)?; // color map entry size
    buf.write_u16::<LittleEndian>(0)?; // x origin
    buf.write_u16::<LittleEndian>(0)?; // y origin
    buf.write_u16::<LittleEndian>(width as u16)?;
    buf.write_u16::<LittleEndian>(height as u16)?;
    buf.write_u8(bits_per_pixel)?;
    buf.write_u8(descriptor)?;

    // Image rows are stored top-down; TGA wants the bottom row first
    let stride = width as usize * channels;
    for row in (0..height as usize).rev() {
        let row_data = &image.data()[row * stride..row * stride + stride];
        for pixel in row_data.chunks_exact(channels) {
            buf.push(pixel[2]);
            buf.push(pixel[1]);
            buf.push(pixel[0]);
            if channels == 4 {
                buf.push(pixel[3]);
            }
        }
    }

    Ok(buf)
}
