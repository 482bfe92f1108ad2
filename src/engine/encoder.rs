// src/engine/encoder.rs
//
// Encoder operations for exports: JPEG, PNG, lossless WebP.

use crate::error::WorkspaceError;
use crate::ops::OutputFormat;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder};

type EncoderResult<T> = std::result::Result<T, WorkspaceError>;

pub fn encode(img: &DynamicImage, format: &OutputFormat) -> EncoderResult<Vec<u8>> {
    match format {
        OutputFormat::Jpeg { quality } => encode_jpeg(img, *quality),
        OutputFormat::Png => encode_png(img),
        OutputFormat::WebP => encode_webp(img),
    }
}

/// JPEG has no alpha; RGBA input is flattened to RGB first.
pub fn encode_jpeg(img: &DynamicImage, quality: u8) -> EncoderResult<Vec<u8>> {
    if !(1..=100).contains(&quality) {
        return Err(WorkspaceError::invalid_argument(
            "quality",
            quality.to_string(),
            "JPEG quality must be between 1 and 100",
        ));
    }
    let rgb = img.to_rgb8();
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality)
        .write_image(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
        .map_err(|e| WorkspaceError::encode_failed("jpeg", e.to_string()))?;
    Ok(buf)
}

pub fn encode_png(img: &DynamicImage) -> EncoderResult<Vec<u8>> {
    let rgba = img.to_rgba8();
    let mut buf = Vec::new();
    PngEncoder::new(&mut buf)
        .write_image(rgba.as_raw(), rgba.width(), rgba.height(), ExtendedColorType::Rgba8)
        .map_err(|e| WorkspaceError::encode_failed("png", e.to_string()))?;
    Ok(buf)
}

pub fn encode_webp(img: &DynamicImage) -> EncoderResult<Vec<u8>> {
    let rgba = img.to_rgba8();
    let mut buf = Vec::new();
    WebPEncoder::new_lossless(&mut buf)
        .write_image(rgba.as_raw(), rgba.width(), rgba.height(), ExtendedColorType::Rgba8)
        .map_err(|e| WorkspaceError::encode_failed("webp", e.to_string()))?;
    Ok(buf)
}
