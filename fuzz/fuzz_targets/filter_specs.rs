#![no_main]

use arbitrary::{Arbitrary, Unstructured};
use image::{self, DynamicImage, RgbaImage};
use image_workspace::engine::apply_filter;
use image_workspace::FilterSpec;
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct FilterSeed {
    kind: u8,
    value: i32,
}

fn build_image(data: &[u8]) -> DynamicImage {
    let width = data.first().copied().unwrap_or(0) as u32 % 64 + 1;
    let height = data.get(1).copied().unwrap_or(0) as u32 % 64 + 1;
    let mut buffer = vec![0u8; (width * height * 4) as usize];
    for (i, byte) in buffer.iter_mut().enumerate() {
        *byte = data.get(i % data.len()).copied().unwrap_or(0);
    }

    let rgba = RgbaImage::from_raw(width, height, buffer)
        .unwrap_or_else(|| RgbaImage::from_raw(1, 1, vec![0, 0, 0, 255]).unwrap());
    DynamicImage::ImageRgba8(rgba)
}

fn seed_to_spec(seed: &FilterSeed) -> FilterSpec {
    match seed.kind % 11 {
        0 => FilterSpec::Grayscale,
        1 => FilterSpec::Sepia,
        2 => FilterSpec::Invert,
        3 => FilterSpec::Brightness { value: seed.value },
        4 => FilterSpec::Contrast { value: seed.value },
        // Unclamped radii above the limit must be rejected, not computed.
        5 => FilterSpec::Blur {
            radius: seed.value.unsigned_abs() % 64,
        },
        6 => FilterSpec::HueRotate { degrees: seed.value },
        7 => FilterSpec::Threshold {
            level: seed.value as u8,
        },
        8 => FilterSpec::FlipH,
        9 => FilterSpec::FlipV,
        _ => FilterSpec::Rotate { degrees: seed.value },
    }
}

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    let mut unstructured = Unstructured::new(data);
    let seeds: Vec<FilterSeed> = match Vec::arbitrary(&mut unstructured) {
        Ok(v) => v,
        Err(_) => return,
    };

    let img = build_image(data);
    // Errors are expected for out-of-range parameters; only panics matter.
    for seed in seeds.iter().take(8) {
        let _ = apply_filter(&img, &seed_to_spec(seed));
    }
});
