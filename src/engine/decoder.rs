// src/engine/decoder.rs
//
// Decoder operations: header inspection, pixel decode, EXIF auto-orient.

use crate::engine::common::run_with_panic_policy;
use crate::engine::limits::ImageLimits;
use crate::error::WorkspaceError;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::io::Cursor;

type DecoderResult<T> = std::result::Result<T, WorkspaceError>;

/// Sniff the container format from magic bytes.
pub fn detect_format(data: &[u8]) -> Option<ImageFormat> {
    image::guess_format(data).ok()
}

/// Read width/height from the header without decoding pixels.
pub fn read_dimensions(data: &[u8]) -> DecoderResult<(u32, u32)> {
    ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| WorkspaceError::decode_failed(format!("failed to read image header: {e}")))?
        .into_dimensions()
        .map_err(|e| WorkspaceError::decode_failed(format!("failed to read dimensions: {e}")))
}

/// Decode an encoded buffer under `limits`.
///
/// Dimensions are checked from the header first so oversized images are
/// rejected before any pixel buffer is allocated.
pub fn decode_image(data: &[u8], limits: &ImageLimits) -> DecoderResult<DynamicImage> {
    if detect_format(data).is_none() {
        return Err(WorkspaceError::decode_failed("unrecognized image format"));
    }
    let (width, height) = read_dimensions(data)?;
    limits.check_dimensions(width, height)?;

    let img = run_with_panic_policy("decode:image", || {
        image::load_from_memory(data)
            .map_err(|e| WorkspaceError::decode_failed(format!("decode failed: {e}")))
    })?;

    Ok(match read_orientation(data) {
        Some(orientation) => apply_orientation(img, orientation),
        None => img,
    })
}

/// EXIF Orientation tag (1..=8), if the container carries one.
pub fn read_orientation(data: &[u8]) -> Option<u32> {
    let exif = exif::Reader::new()
        .read_from_container(&mut Cursor::new(data))
        .ok()?;
    let field = exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)?;
    field.value.get_uint(0)
}

/// Rotate/flip so the image displays upright for the given EXIF orientation.
pub fn apply_orientation(img: DynamicImage, orientation: u32) -> DynamicImage {
    match orientation {
        1 => img,
        2 => img.fliph(),
        3 => img.rotate180(),
        4 => img.flipv(),
        5 => img.rotate90().fliph(), // transpose
        6 => img.rotate90(),
        7 => img.rotate270().fliph(), // transverse
        8 => img.rotate270(),
        _ => img, // Ignore invalid values silently
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgb, RgbImage};

    fn create_png(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        }));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn detects_png() {
        assert_eq!(detect_format(&create_png(2, 2)), Some(ImageFormat::Png));
        assert_eq!(detect_format(b"not an image at all"), None);
    }

    #[test]
    fn decodes_png() {
        let img = decode_image(&create_png(10, 6), &ImageLimits::default()).unwrap();
        assert_eq!(img.dimensions(), (10, 6));
    }

    #[test]
    fn rejects_garbage() {
        let err = decode_image(&[0u8; 64], &ImageLimits::default()).unwrap_err();
        assert!(matches!(err, WorkspaceError::DecodeFailed { .. }));
    }

    #[test]
    fn rejects_truncated_png() {
        let mut png = create_png(16, 16);
        png.truncate(png.len() / 2);
        assert!(decode_image(&png, &ImageLimits::default()).is_err());
    }

    #[test]
    fn enforces_limits_from_header() {
        let limits = ImageLimits {
            max_dimension: 8,
            max_pixels: 1_000,
            max_bytes: None,
        };
        let err = decode_image(&create_png(9, 2), &limits).unwrap_err();
        assert!(matches!(
            err,
            WorkspaceError::DimensionExceedsLimit { dimension: 9, max: 8 }
        ));
    }

    #[test]
    fn png_without_exif_has_no_orientation() {
        assert_eq!(read_orientation(&create_png(2, 2)), None);
    }

    #[test]
    fn orientation_six_rotates_clockwise() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(4, 2));
        assert_eq!(apply_orientation(img.clone(), 6).dimensions(), (2, 4));
        assert_eq!(apply_orientation(img.clone(), 1).dimensions(), (4, 2));
        assert_eq!(apply_orientation(img, 42).dimensions(), (4, 2));
    }
}
