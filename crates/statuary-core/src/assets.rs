//! Asset data model shared by the bake and export stages
//!
//! Images are immutable and shared by reference (`Arc`); two materials
//! pointing at the same `Arc<Image>` reuse the same texture on disk.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Color in RGBA format (0-255 per channel)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Self = Self { r: 255, g: 255, b: 255, a: 255 };
    pub const BLACK: Self = Self { r: 0, g: 0, b: 0, a: 255 };

    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Convert to normalized float values (0.0-1.0)
    pub fn to_float(&self) -> [f32; 4] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            self.a as f32 / 255.0,
        ]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Pixel channel layout of an [`Image`] buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelFormat {
    /// 8 bits per channel RGB
    Rgb8,
    /// 8 bits per channel RGBA
    Rgba8,
    /// Single 8-bit luminance channel
    Gray8,
}

impl PixelFormat {
    /// Bytes per pixel for this layout
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelFormat::Rgb8 => 3,
            PixelFormat::Rgba8 => 4,
            PixelFormat::Gray8 => 1,
        }
    }
}

impl std::fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PixelFormat::Rgb8 => "RGB8",
            PixelFormat::Rgba8 => "RGBA8",
            PixelFormat::Gray8 => "GRAY8",
        };
        write!(f, "{}", name)
    }
}

/// An immutable in-memory image
///
/// Pixel rows are stored top-down, channels in the order the format names
/// them. Fields are private so a shared image can never be mutated after
/// materials start referencing it.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    width: u32,
    height: u32,
    format: PixelFormat,
    data: Vec<u8>,
}

impl Image {
    pub fn new(width: u32, height: u32, format: PixelFormat, data: Vec<u8>) -> Self {
        Self { width, height, format, data }
    }

    /// Single-color image, mostly useful for placeholders and tests
    pub fn solid(width: u32, height: u32, format: PixelFormat, color: Color) -> Self {
        let pixel: &[u8] = match format {
            PixelFormat::Rgb8 => &[color.r, color.g, color.b],
            PixelFormat::Rgba8 => &[color.r, color.g, color.b, color.a],
            PixelFormat::Gray8 => &[color.r],
        };
        let data = pixel.repeat((width * height) as usize);
        Self { width, height, format, data }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Buffer length implied by dimensions and pixel format
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_pixel()
    }
}

/// A named material, optionally textured
///
/// Materials are shared between submeshes and baked meshes via `Arc`; the
/// baked snapshot copies the reference, not the material.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    pub diffuse: Color,
    pub main_texture: Option<Arc<Image>>,
}

impl Material {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            diffuse: Color::WHITE,
            main_texture: None,
        }
    }

    pub fn with_texture(name: impl Into<String>, texture: Arc<Image>) -> Self {
        Self {
            name: name.into(),
            diffuse: Color::WHITE,
            main_texture: Some(texture),
        }
    }
}
