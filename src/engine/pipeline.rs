// src/engine/pipeline.rs
//
// Pixel operations: built-in filters, fit-to-bounds math, fast resize.

use crate::error::WorkspaceError;
use crate::ops::{FilterEffect, FilterSpec};
use fast_image_resize::{self as fir, ImageBufferError, MulDiv, PixelType, ResizeOptions};
use image::{imageops::FilterType, DynamicImage, GrayImage, Luma, RgbImage, RgbaImage};
use rayon::prelude::*;

type PipelineResult<T> = std::result::Result<T, WorkspaceError>;

const MIN_ADJUSTMENT: i32 = -100;
const MAX_ADJUSTMENT: i32 = 100;
const MAX_BLUR_RADIUS: u32 = 50;

fn check_adjustment(spec: &FilterSpec, value: i32) -> PipelineResult<()> {
    if !(MIN_ADJUSTMENT..=MAX_ADJUSTMENT).contains(&value) {
        return Err(WorkspaceError::filter_failed(
            spec.clone(),
            format!("value {value} outside {MIN_ADJUSTMENT}..={MAX_ADJUSTMENT}"),
        ));
    }
    Ok(())
}

/// Apply one built-in filter, producing new pixels.
///
/// The input is never touched; every branch allocates its output.
pub fn apply_filter(img: &DynamicImage, spec: &FilterSpec) -> PipelineResult<DynamicImage> {
    let out = match spec {
        FilterSpec::Grayscale => DynamicImage::ImageLuma8(img.to_luma8()),
        FilterSpec::Sepia => DynamicImage::ImageRgba8(sepia(img.to_rgba8())),
        FilterSpec::Invert => {
            let mut out = img.clone();
            out.invert();
            out
        }
        FilterSpec::Brightness { value } => {
            check_adjustment(spec, *value)?;
            img.brighten(*value)
        }
        FilterSpec::Contrast { value } => {
            check_adjustment(spec, *value)?;
            // image crate expects f32, our -100..100 scale maps directly
            img.adjust_contrast(*value as f32)
        }
        FilterSpec::Blur { radius } => {
            if *radius == 0 || *radius > MAX_BLUR_RADIUS {
                return Err(WorkspaceError::filter_failed(
                    spec.clone(),
                    format!("radius {radius} outside 1..={MAX_BLUR_RADIUS}"),
                ));
            }
            img.blur(*radius as f32)
        }
        FilterSpec::HueRotate { degrees } => img.huerotate(degrees.rem_euclid(360)),
        FilterSpec::Threshold { level } => {
            DynamicImage::ImageLuma8(threshold(img.to_luma8(), *level))
        }
        FilterSpec::FlipH => img.fliph(),
        FilterSpec::FlipV => img.flipv(),
        FilterSpec::Rotate { degrees } => match degrees {
            90 | -270 => img.rotate90(),
            180 | -180 => img.rotate180(),
            270 | -90 => img.rotate270(),
            0 => img.clone(),
            _ => {
                return Err(WorkspaceError::filter_failed(
                    spec.clone(),
                    format!("unsupported rotation angle {degrees}; use a multiple of 90"),
                ));
            }
        },
    };
    Ok(out)
}

/// Check that an engine's output honours the filter's declared contract.
pub fn verify_contract(
    spec: &FilterSpec,
    input: &DynamicImage,
    output: &DynamicImage,
) -> PipelineResult<()> {
    let contract = spec.contract();
    if output.width() == 0 || output.height() == 0 {
        return Err(WorkspaceError::filter_failed(
            spec.clone(),
            "filter produced an empty image",
        ));
    }
    if !contract.effects.contains(FilterEffect::RESHAPES)
        && (input.width(), input.height()) != (output.width(), output.height())
    {
        return Err(WorkspaceError::filter_failed(
            spec.clone(),
            format!(
                "{} must preserve dimensions ({}x{} -> {}x{})",
                contract.name,
                input.width(),
                input.height(),
                output.width(),
                output.height()
            ),
        ));
    }
    if !contract.effects.contains(FilterEffect::DROPS_ALPHA)
        && input.color().has_alpha()
        && !output.color().has_alpha()
    {
        return Err(WorkspaceError::filter_failed(
            spec.clone(),
            format!("{} must keep the alpha channel", contract.name),
        ));
    }
    Ok(())
}

fn sepia(mut rgba: RgbaImage) -> RgbaImage {
    rgba.par_chunks_exact_mut(4).for_each(|px| {
        let (r, g, b) = (px[0] as f32, px[1] as f32, px[2] as f32);
        px[0] = (0.393 * r + 0.769 * g + 0.189 * b).min(255.0) as u8;
        px[1] = (0.349 * r + 0.686 * g + 0.168 * b).min(255.0) as u8;
        px[2] = (0.272 * r + 0.534 * g + 0.131 * b).min(255.0) as u8;
    });
    rgba
}

fn threshold(mut luma: GrayImage, level: u8) -> GrayImage {
    for Luma([v]) in luma.pixels_mut() {
        *v = if *v > level { 255 } else { 0 };
    }
    luma
}

/// Calculate dimensions that fit inside `target` while keeping aspect ratio.
pub fn calc_fit_dimensions(orig_w: u32, orig_h: u32, target_w: u32, target_h: u32) -> (u32, u32) {
    if orig_w == 0 || orig_h == 0 {
        return (0, 0);
    }
    let orig_ratio = orig_w as f64 / orig_h as f64;
    let target_ratio = target_w as f64 / target_h.max(1) as f64;

    let (w, h) = if orig_ratio > target_ratio {
        // Original image is wider → fit to width
        let ratio = target_w as f64 / orig_w as f64;
        (target_w, (orig_h as f64 * ratio).round() as u32)
    } else {
        // Original image is taller → fit to height
        let ratio = target_h as f64 / orig_h as f64;
        ((orig_w as f64 * ratio).round() as u32, target_h)
    };
    // Extreme aspect ratios can round a side to zero; keep at least one pixel.
    (w.clamp(1, target_w.max(1)), h.clamp(1, target_h.max(1)))
}

#[derive(Debug)]
pub struct ResizeError {
    pub source_dims: (u32, u32),
    pub target_dims: (u32, u32),
    pub reason: String,
}

impl ResizeError {
    pub fn new(source_dims: (u32, u32), target_dims: (u32, u32), reason: impl Into<String>) -> Self {
        Self {
            source_dims,
            target_dims,
            reason: reason.into(),
        }
    }

    pub fn into_workspace_error(self) -> WorkspaceError {
        WorkspaceError::render_failed(format!(
            "resize {}x{} -> {}x{}: {}",
            self.source_dims.0,
            self.source_dims.1,
            self.target_dims.0,
            self.target_dims.1,
            self.reason
        ))
    }
}

fn default_resize_options() -> ResizeOptions {
    ResizeOptions::new().resize_alg(fir::ResizeAlg::Convolution(fir::FilterType::Lanczos3))
}

/// Fast resize with owned DynamicImage (zero-copy for RGB/RGBA)
pub fn fast_resize_owned(
    img: DynamicImage,
    dst_width: u32,
    dst_height: u32,
) -> std::result::Result<DynamicImage, ResizeError> {
    let src_width = img.width();
    let src_height = img.height();

    if src_width == 0 || src_height == 0 || dst_width == 0 || dst_height == 0 {
        return Err(ResizeError::new(
            (src_width, src_height),
            (dst_width, dst_height),
            "invalid dimensions for resize",
        ));
    }

    // Take ownership of the pixel buffer; only non-8-bit layouts convert.
    let (pixel_type, src_pixels): (PixelType, Vec<u8>) = match img {
        DynamicImage::ImageRgb8(rgb) => (PixelType::U8x3, rgb.into_raw()),
        DynamicImage::ImageRgba8(rgba) => (PixelType::U8x4, rgba.into_raw()),
        other => (PixelType::U8x4, other.to_rgba8().into_raw()),
    };

    fast_resize_internal(
        src_width,
        src_height,
        src_pixels,
        pixel_type,
        dst_width,
        dst_height,
        default_resize_options(),
    )
    .map_err(|reason| ResizeError::new((src_width, src_height), (dst_width, dst_height), reason))
}

fn fast_resize_internal(
    src_width: u32,
    src_height: u32,
    mut src_pixels: Vec<u8>,
    pixel_type: PixelType,
    dst_width: u32,
    dst_height: u32,
    options: ResizeOptions,
) -> std::result::Result<DynamicImage, String> {
    let pixel_count = (src_width as usize)
        .checked_mul(src_height as usize)
        .ok_or_else(|| "image dimensions overflow during resize".to_string())?;
    let required_bytes = pixel_count
        .checked_mul(pixel_type.size())
        .ok_or_else(|| "image buffer size overflow during resize".to_string())?;

    if src_pixels.len() < required_bytes {
        return Err(format!(
            "fir source image invalid buffer size. expected {required_bytes} bytes, got {} bytes",
            src_pixels.len()
        ));
    }

    let primary_result = match fir::images::Image::from_slice_u8(
        src_width,
        src_height,
        src_pixels.as_mut_slice(),
        pixel_type,
    ) {
        Ok(src_image) => resize_with_source_image(src_image, pixel_type, dst_width, dst_height, &options),
        Err(ImageBufferError::InvalidBufferAlignment) => {
            let mut aligned = fir::images::Image::new(src_width, src_height, pixel_type);
            aligned
                .buffer_mut()
                .copy_from_slice(&src_pixels[..required_bytes]);
            resize_with_source_image(aligned, pixel_type, dst_width, dst_height, &options)
        }
        Err(other) => Err(format!("fir source image error: {other:?}")),
    };

    match primary_result {
        Ok(img) => Ok(img),
        Err(err) => resize_with_image_crate_fallback(
            &src_pixels,
            src_width,
            src_height,
            pixel_type,
            dst_width,
            dst_height,
        )
        .map_err(|fallback_err| format!("{err}; image crate fallback failed: {fallback_err}")),
    }
}

fn resize_with_image_crate_fallback(
    src_pixels: &[u8],
    src_width: u32,
    src_height: u32,
    pixel_type: PixelType,
    dst_width: u32,
    dst_height: u32,
) -> std::result::Result<DynamicImage, String> {
    let filter = FilterType::Lanczos3;
    match pixel_type {
        PixelType::U8x3 => {
            let rgb = RgbImage::from_raw(src_width, src_height, src_pixels.to_vec())
                .ok_or_else(|| "failed to build rgb image for fallback resize".to_string())?;
            Ok(DynamicImage::ImageRgb8(image::imageops::resize(
                &rgb, dst_width, dst_height, filter,
            )))
        }
        PixelType::U8x4 => {
            let rgba = RgbaImage::from_raw(src_width, src_height, src_pixels.to_vec())
                .ok_or_else(|| "failed to build rgba image for fallback resize".to_string())?;
            Ok(DynamicImage::ImageRgba8(image::imageops::resize(
                &rgba, dst_width, dst_height, filter,
            )))
        }
        _ => Err("fallback resize supports only U8x3/U8x4 pixel types".to_string()),
    }
}

fn resize_with_source_image(
    mut src_image: fir::images::Image<'_>,
    pixel_type: PixelType,
    dst_width: u32,
    dst_height: u32,
    options: &ResizeOptions,
) -> std::result::Result<DynamicImage, String> {
    let mut dst_image = fir::images::Image::new(dst_width, dst_height, pixel_type);

    let needs_premultiply = matches!(pixel_type, PixelType::U8x4);
    let mul_div = MulDiv::default();
    if needs_premultiply {
        mul_div
            .multiply_alpha_inplace(&mut src_image)
            .map_err(|e| format!("failed to premultiply alpha: {e}"))?;
    }

    let mut resizer = fir::Resizer::new();
    resizer
        .resize(&src_image, &mut dst_image, options)
        .map_err(|e| format!("fir resize error: {e:?}"))?;

    if needs_premultiply {
        mul_div
            .divide_alpha_inplace(&mut dst_image)
            .map_err(|e| format!("failed to unpremultiply alpha: {e}"))?;
    }

    let dst_pixels = dst_image.into_vec();
    match pixel_type {
        PixelType::U8x3 => RgbImage::from_raw(dst_width, dst_height, dst_pixels)
            .map(DynamicImage::ImageRgb8)
            .ok_or_else(|| "failed to create rgb image from resized data".to_string()),
        PixelType::U8x4 => RgbaImage::from_raw(dst_width, dst_height, dst_pixels)
            .map(DynamicImage::ImageRgba8)
            .ok_or_else(|| "failed to create rgba image from resized data".to_string()),
        _ => Err("unsupported pixel type after resize".to_string()),
    }
}
