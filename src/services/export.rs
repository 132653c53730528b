//! Export service: render the current design to an image file.
//!
//! DESIGN
//! ======
//! Export always uses the chrome-less scene (no selection box or guides) at
//! a fixed pixel ratio, so a 1080x1920 design becomes a 2160x3840 image.
//! PNG keeps alpha. JPEG flattens onto the opaque backdrop the scene
//! already paints first.

#[cfg(test)]
#[path = "export_test.rs"]
mod export_test;

use std::io::Cursor;
use std::path::Path;

use ab_glyph::FontArc;
use canvas::scene::Scene;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ImageEncoder, RgbaImage};
use tracing::info;

use super::raster::{self, RasterError};

/// Device pixels per canvas pixel in exported images.
pub const EXPORT_PIXEL_RATIO: f64 = 2.0;

/// JPEG quality, 0..=100.
pub const JPEG_QUALITY: u8 = 92;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("text export needs a font; pass --font or set STUDIO_FONT_PATH")]
    MissingFont,
    #[error("font file is not a usable TrueType/OpenType font")]
    InvalidFont,
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<RasterError> for ExportError {
    fn from(err: RasterError) -> Self {
        match err {
            RasterError::MissingFont => Self::MissingFont,
            RasterError::Decode(e) => Self::Image(e),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
    Png,
    Jpeg,
}

impl ExportFormat {
    #[must_use]
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }

    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }
}

/// An encoded image ready to be saved or downloaded.
#[derive(Debug, Clone)]
pub struct Export {
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

/// `design-<project id>.<ext>`
#[must_use]
pub fn export_file_name(project_id: &str, format: ExportFormat) -> String {
    format!("design-{project_id}.{}", format.extension())
}

/// Load a TrueType/OpenType font file.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be read, or
/// [`ExportError::InvalidFont`] if it does not parse.
pub async fn load_font(path: &Path) -> Result<FontArc, ExportError> {
    let bytes = tokio::fs::read(path).await?;
    FontArc::try_from_vec(bytes).map_err(|_| ExportError::InvalidFont)
}

/// Rasterize `scene` and encode it.
///
/// # Errors
///
/// Fails when text needs a font and none was given, when the background
/// bytes do not decode, or when encoding fails.
pub fn export_scene(
    project_id: &str,
    scene: &Scene,
    background: Option<&[u8]>,
    font: Option<&FontArc>,
    format: ExportFormat,
) -> Result<Export, ExportError> {
    let img = raster::render_scene(scene, background, font, EXPORT_PIXEL_RATIO)?;
    let bytes = encode(&img, format)?;
    info!(project_id, format = format.extension(), width = img.width(), height = img.height(), size = bytes.len(), "design exported");
    Ok(Export { file_name: export_file_name(project_id, format), mime_type: format.mime_type(), bytes })
}

/// Encode an RGBA buffer.
///
/// # Errors
///
/// Returns the encoder's error.
pub fn encode(img: &RgbaImage, format: ExportFormat) -> Result<Vec<u8>, ExportError> {
    let mut bytes = Vec::new();
    match format {
        ExportFormat::Png => {
            PngEncoder::new(&mut bytes).write_image(img.as_raw(), img.width(), img.height(), image::ExtendedColorType::Rgba8)?;
        }
        ExportFormat::Jpeg => {
            let rgb = DynamicImage::ImageRgba8(img.clone()).to_rgb8();
            JpegEncoder::new_with_quality(Cursor::new(&mut bytes), JPEG_QUALITY).write_image(
                rgb.as_raw(),
                rgb.width(),
                rgb.height(),
                image::ExtendedColorType::Rgb8,
            )?;
        }
    }
    Ok(bytes)
}
