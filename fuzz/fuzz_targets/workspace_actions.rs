#![no_main]

use arbitrary::Arbitrary;
use image::{DynamicImage, RgbImage};
use image_workspace::{
    FilterSpec, Image, MemoryStore, NoNavigation, PendingPolicy, StandardEngine, Workspace,
    WorkspaceConfig,
};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
enum Action {
    Upload { width: u8, height: u8 },
    Apply { kind: u8, value: i8 },
    Request { kind: u8 },
    Poll,
    RemoveFilter,
    Discard,
    Save,
    Detach,
    Attach { width: u8, height: u8 },
}

#[derive(Arbitrary, Debug)]
struct Session {
    queue: bool,
    actions: Vec<Action>,
}

fn spec(kind: u8, value: i8) -> FilterSpec {
    match kind % 5 {
        0 => FilterSpec::Grayscale,
        1 => FilterSpec::Invert,
        2 => FilterSpec::Brightness {
            value: i32::from(value),
        },
        3 => FilterSpec::Rotate {
            degrees: i32::from(value) * 90,
        },
        _ => FilterSpec::FlipV,
    }
}

fuzz_target!(|session: Session| {
    let policy = if session.queue {
        PendingPolicy::Queue
    } else {
        PendingPolicy::LastRequestWins
    };
    let config = WorkspaceConfig::inline().with_policy(policy);
    let Ok(mut ws) = Workspace::mount(config, StandardEngine, &NoNavigation) else {
        return;
    };
    let mut store = MemoryStore::new();

    for action in session.actions.into_iter().take(32) {
        match action {
            Action::Upload { width, height } => {
                let img = RgbImage::new(u32::from(width) % 32 + 1, u32::from(height) % 32 + 1);
                let _ = ws.upload(Image::from_pixels(DynamicImage::ImageRgb8(img)));
            }
            Action::Apply { kind, value } => {
                let _ = ws.apply_filter(spec(kind, value));
            }
            Action::Request { kind } => {
                let _ = ws.request_filter(spec(kind, 0));
            }
            Action::Poll => {
                ws.poll();
            }
            Action::RemoveFilter => {
                let _ = ws.remove_filter();
            }
            Action::Discard => ws.discard_image(),
            Action::Save => {
                let _ = ws.save(&mut store);
            }
            Action::Detach => ws.detach_surface(),
            Action::Attach { width, height } => {
                let _ = ws.attach_surface(u32::from(width) % 32, u32::from(height) % 32);
            }
        }

        // The filtered image never outlives its original.
        if ws.state().original().is_none() {
            assert!(ws.state().filtered().is_none());
        }
    }

    ws.wait_idle();
    assert!(!ws.is_busy());
    ws.unmount();
});
