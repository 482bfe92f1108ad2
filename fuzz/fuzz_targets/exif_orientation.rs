#![no_main]

//! Fuzz target for the EXIF orientation path applied to uploads.

use image::{DynamicImage, RgbImage};
use image_workspace::engine::{apply_orientation, read_orientation};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Some(orientation) = read_orientation(data) {
        let img = DynamicImage::ImageRgb8(RgbImage::new(3, 2));
        let _ = apply_orientation(img, orientation);
    }
});
