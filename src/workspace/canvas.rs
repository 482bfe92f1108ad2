// src/workspace/canvas.rs
//
// The drawing target. Holds the displayed raster (the last rendered image
// fitted into the surface bounds) and the image that produced it, nothing
// else: no filter parameters, no history.

use crate::engine::{
    calc_fit_dimensions, fast_resize_owned, Image, Source, MAX_DIMENSION, MAX_PIXELS,
};
use crate::error::WorkspaceError;
use image::{imageops, DynamicImage, RgbaImage};

struct Surface {
    frame: RgbaImage,
    rendered: Option<Image>,
}

#[derive(Default)]
pub struct CanvasSurface {
    surface: Option<Surface>,
}

impl CanvasSurface {
    /// A canvas with no drawing target yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a blank transparent raster of `width` x `height`.
    ///
    /// Re-attaching replaces the previous target; its content is lost.
    /// Bounds are held to the same caps as decoded images.
    pub fn attach(&mut self, width: u32, height: u32) -> Result<(), WorkspaceError> {
        if width == 0 || height == 0 {
            return Err(WorkspaceError::invalid_argument(
                "surface",
                format!("{width}x{height}"),
                "surface bounds must be non-zero",
            ));
        }
        if width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(WorkspaceError::dimension_exceeds_limit(
                width.max(height),
                MAX_DIMENSION,
            ));
        }
        let pixels = u64::from(width) * u64::from(height);
        if pixels > MAX_PIXELS {
            return Err(WorkspaceError::pixel_count_exceeds_limit(pixels, MAX_PIXELS));
        }
        tracing::debug!(target: "image_workspace::canvas", width, height, "attached");
        self.surface = Some(Surface {
            frame: RgbaImage::new(width, height),
            rendered: None,
        });
        Ok(())
    }

    pub fn detach(&mut self) {
        if self.surface.take().is_some() {
            tracing::debug!(target: "image_workspace::canvas", "detached");
        }
    }

    pub fn is_attached(&self) -> bool {
        self.surface.is_some()
    }

    /// Surface bounds, when attached.
    pub fn bounds(&self) -> Option<(u32, u32)> {
        self.surface.as_ref().map(|s| s.frame.dimensions())
    }

    /// Draw `image` fitted into the bounds (aspect kept, centered, transparent
    /// letterbox). On failure the previous content stays on screen.
    pub fn render(&mut self, image: &Image) -> Result<(), WorkspaceError> {
        let surface = self.surface.as_mut().ok_or(WorkspaceError::NoSurface)?;
        let (bound_w, bound_h) = surface.frame.dimensions();
        let frame = compose_frame(image.pixels(), bound_w, bound_h)?;

        tracing::debug!(
            target: "image_workspace::canvas",
            image = image.id().get(),
            width = image.width(),
            height = image.height(),
            "rendered"
        );
        surface.frame = frame;
        surface.rendered = Some(image.clone());
        Ok(())
    }

    /// Blank the surface. No-op when detached.
    pub fn clear(&mut self) {
        if let Some(surface) = self.surface.as_mut() {
            let (w, h) = surface.frame.dimensions();
            surface.frame = RgbaImage::new(w, h);
            surface.rendered = None;
            tracing::debug!(target: "image_workspace::canvas", "cleared");
        }
    }

    /// Snapshot of what is drawn: a new image whose pixels equal the last
    /// render input.
    pub fn export_current(&self) -> Result<Image, WorkspaceError> {
        let rendered = self
            .surface
            .as_ref()
            .and_then(|s| s.rendered.as_ref())
            .ok_or(WorkspaceError::NothingToSave)?;
        Ok(Image::from_shared(
            rendered.shared_pixels(),
            Source::CanvasExport { of: rendered.id() },
        ))
    }

    /// The image behind the displayed frame.
    pub fn rendered(&self) -> Option<&Image> {
        self.surface.as_ref().and_then(|s| s.rendered.as_ref())
    }

    /// The displayed raster.
    pub fn frame(&self) -> Option<&RgbaImage> {
        self.surface.as_ref().map(|s| &s.frame)
    }
}

fn compose_frame(
    pixels: &DynamicImage,
    bound_w: u32,
    bound_h: u32,
) -> Result<RgbaImage, WorkspaceError> {
    let (fit_w, fit_h) = calc_fit_dimensions(pixels.width(), pixels.height(), bound_w, bound_h);
    let fitted = if (fit_w, fit_h) == (pixels.width(), pixels.height()) {
        pixels.to_rgba8()
    } else {
        fast_resize_owned(pixels.clone(), fit_w, fit_h)
            .map_err(|e| e.into_workspace_error())?
            .to_rgba8()
    };

    let mut frame = RgbaImage::new(bound_w, bound_h);
    let x = i64::from((bound_w - fit_w) / 2);
    let y = i64::from((bound_h - fit_h) / 2);
    imageops::overlay(&mut frame, &fitted, x, y);
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba};

    fn solid_image(width: u32, height: u32, color: [u8; 3]) -> Image {
        Image::from_pixels(DynamicImage::ImageRgb8(RgbImage::from_pixel(
            width,
            height,
            Rgb(color),
        )))
    }

    #[test]
    fn render_requires_surface() {
        let mut canvas = CanvasSurface::new();
        let err = canvas.render(&solid_image(2, 2, [0, 0, 0])).unwrap_err();
        assert!(matches!(err, WorkspaceError::NoSurface));
    }

    #[test]
    fn attach_rejects_zero_bounds() {
        let mut canvas = CanvasSurface::new();
        assert!(canvas.attach(0, 10).is_err());
        assert!(!canvas.is_attached());
    }

    #[test]
    fn attach_rejects_oversized_bounds() {
        let mut canvas = CanvasSurface::new();
        assert!(matches!(
            canvas.attach(u32::MAX, u32::MAX),
            Err(WorkspaceError::DimensionExceedsLimit { .. })
        ));
        assert!(matches!(
            canvas.attach(MAX_DIMENSION + 1, 1),
            Err(WorkspaceError::DimensionExceedsLimit { .. })
        ));
        assert!(matches!(
            canvas.attach(MAX_DIMENSION, MAX_DIMENSION),
            Err(WorkspaceError::PixelCountExceedsLimit { .. })
        ));
        assert!(!canvas.is_attached());
    }

    #[test]
    fn same_size_render_is_exact() {
        let mut canvas = CanvasSurface::new();
        canvas.attach(4, 4).unwrap();
        canvas.render(&solid_image(4, 4, [10, 20, 30])).unwrap();
        let frame = canvas.frame().unwrap();
        assert!(frame.pixels().all(|p| *p == Rgba([10, 20, 30, 255])));
    }

    #[test]
    fn wide_image_is_letterboxed() {
        let mut canvas = CanvasSurface::new();
        canvas.attach(10, 10).unwrap();
        canvas.render(&solid_image(20, 10, [255, 0, 0])).unwrap();
        let frame = canvas.frame().unwrap();
        // fitted to 10x5, centered vertically
        assert_eq!(frame.get_pixel(5, 0)[3], 0);
        assert_eq!(frame.get_pixel(5, 9)[3], 0);
        assert_eq!(frame.get_pixel(5, 5)[3], 255);
    }

    #[test]
    fn render_replaces_prior_content() {
        let mut canvas = CanvasSurface::new();
        canvas.attach(4, 4).unwrap();
        canvas.render(&solid_image(4, 4, [255, 255, 255])).unwrap();
        canvas.render(&solid_image(4, 2, [0, 0, 0])).unwrap();
        let frame = canvas.frame().unwrap();
        // the white square must be gone from the letterbox rows
        assert_eq!(*frame.get_pixel(0, 0), Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn export_matches_render_input() {
        let mut canvas = CanvasSurface::new();
        canvas.attach(3, 3).unwrap();
        let img = solid_image(30, 12, [1, 2, 3]);
        canvas.render(&img).unwrap();
        let snapshot = canvas.export_current().unwrap();
        assert_ne!(snapshot, img);
        assert!(snapshot.same_pixels(&img));
        assert_eq!(snapshot.source(), &Source::CanvasExport { of: img.id() });
    }

    #[test]
    fn export_on_blank_surface_fails() {
        let mut canvas = CanvasSurface::new();
        assert!(matches!(
            canvas.export_current(),
            Err(WorkspaceError::NothingToSave)
        ));
        canvas.attach(2, 2).unwrap();
        canvas.render(&solid_image(2, 2, [9, 9, 9])).unwrap();
        canvas.clear();
        assert!(matches!(
            canvas.export_current(),
            Err(WorkspaceError::NothingToSave)
        ));
        assert!(canvas.frame().unwrap().pixels().all(|p| p[3] == 0));
    }

    #[test]
    fn clear_when_detached_is_noop() {
        let mut canvas = CanvasSurface::new();
        canvas.clear();
        canvas.clear();
        assert!(canvas.frame().is_none());
    }

    #[test]
    fn detach_drops_content() {
        let mut canvas = CanvasSurface::new();
        canvas.attach(2, 2).unwrap();
        canvas.render(&solid_image(2, 2, [1, 1, 1])).unwrap();
        canvas.detach();
        assert!(canvas.rendered().is_none());
        canvas.attach(2, 2).unwrap();
        assert!(canvas.rendered().is_none());
    }
}
