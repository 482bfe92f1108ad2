#![no_main]

use image_workspace::{Image, ImageLimits};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    // Strict limits keep hostile headers from allocating gigabytes.
    let _ = Image::decode(data, "fuzz", &ImageLimits::strict());
});
