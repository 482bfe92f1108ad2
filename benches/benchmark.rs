use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use image::{DynamicImage, Rgb, RgbImage};
use image_workspace::engine::apply_filter;
use image_workspace::{
    CanvasSurface, FilterSpec, Image, NoNavigation, StandardEngine, Workspace, WorkspaceConfig,
};
use std::hint::black_box;

fn create_test_image(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    }))
}

fn bench_filters(c: &mut Criterion) {
    let img = create_test_image(512, 512);
    let mut group = c.benchmark_group("filter_apply_512");
    for spec in [
        FilterSpec::Grayscale,
        FilterSpec::Sepia,
        FilterSpec::Invert,
        FilterSpec::Brightness { value: 20 },
        FilterSpec::Blur { radius: 3 },
        FilterSpec::HueRotate { degrees: 90 },
    ] {
        group.bench_with_input(BenchmarkId::from_parameter(&spec), &spec, |b, spec| {
            b.iter(|| apply_filter(black_box(&img), spec))
        });
    }
    group.finish();
}

fn bench_canvas_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("canvas_render");
    for (w, h) in [(640u32, 480u32), (1920, 1080), (4000, 3000)] {
        let img = Image::from_pixels(create_test_image(w, h));
        let mut canvas = CanvasSurface::new();
        // A typical preview pane; every size above gets downscaled into it.
        if canvas.attach(800, 600).is_err() {
            return;
        }
        group.bench_with_input(BenchmarkId::from_parameter(format!("{w}x{h}")), &img, |b, img| {
            b.iter(|| canvas.render(black_box(img)))
        });
    }
    group.finish();
}

fn bench_apply_and_commit(c: &mut Criterion) {
    let mut ws = match Workspace::mount(WorkspaceConfig::inline(), StandardEngine, &NoNavigation) {
        Ok(ws) => ws,
        Err(_) => return,
    };
    if ws.attach_surface(800, 600).is_err()
        || ws.upload(Image::from_pixels(create_test_image(1024, 768))).is_err()
    {
        return;
    }
    c.bench_function("workspace_apply_grayscale_1024x768", |b| {
        b.iter(|| ws.apply_filter(black_box(FilterSpec::Grayscale)))
    });
}

criterion_group!(benches, bench_filters, bench_canvas_render, bench_apply_and_commit);
criterion_main!(benches);
