use image::{DynamicImage, RgbImage};
use image_workspace::{
    FilterSpec, Image, NavigationBridge, NavigationPayload, NavigationSlot, NoNavigation,
    StandardEngine, Workspace, WorkspaceConfig, WorkspaceStatus,
};
use proptest::prelude::*;

fn create_test_image(width: u32, height: u32) -> Image {
    Image::from_pixels(DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    })))
}

fn mounted(surface_w: u32, surface_h: u32) -> Workspace {
    let mut ws =
        Workspace::mount(WorkspaceConfig::inline(), StandardEngine, &NoNavigation).unwrap();
    ws.attach_surface(surface_w, surface_h).unwrap();
    ws
}

fn valid_filter_strategy() -> impl Strategy<Value = FilterSpec> {
    prop_oneof![
        Just(FilterSpec::Grayscale),
        Just(FilterSpec::Sepia),
        Just(FilterSpec::Invert),
        prop_oneof![Just(FilterSpec::FlipH), Just(FilterSpec::FlipV)],
        (-100i32..=100).prop_map(|value| FilterSpec::Brightness { value }),
        (-100i32..=100).prop_map(|value| FilterSpec::Contrast { value }),
        (1u32..=3).prop_map(|radius| FilterSpec::Blur { radius }),
        (-720i32..=720).prop_map(|degrees| FilterSpec::HueRotate { degrees }),
        any::<u8>().prop_map(|level| FilterSpec::Threshold { level }),
        prop_oneof![Just(0), Just(90), Just(180), Just(270), Just(-90)]
            .prop_map(|degrees| FilterSpec::Rotate { degrees }),
    ]
}

fn invalid_filter_strategy() -> impl Strategy<Value = FilterSpec> {
    prop_oneof![
        (101i32..=1000).prop_map(|value| FilterSpec::Brightness { value }),
        (-1000i32..=-101).prop_map(|value| FilterSpec::Contrast { value }),
        Just(FilterSpec::Blur { radius: 0 }),
        (51u32..=500).prop_map(|radius| FilterSpec::Blur { radius }),
        (1i32..=89).prop_map(|degrees| FilterSpec::Rotate { degrees }),
    ]
}

/// Pre-state for upload/discard properties: nothing, an original, or a filter.
fn prior_state_strategy() -> impl Strategy<Value = Vec<FilterSpec>> {
    prop::collection::vec(valid_filter_strategy(), 0..3)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 32,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_remove_filter_restores_original(
        img_w in 1u32..=24,
        img_h in 1u32..=24,
        specs in prop::collection::vec(valid_filter_strategy(), 0..4),
    ) {
        let mut ws = mounted(16, 16);
        let original = create_test_image(img_w, img_h);
        ws.upload(original.clone()).unwrap();
        for spec in specs {
            ws.apply_filter(spec).unwrap();
        }
        ws.remove_filter().unwrap();

        prop_assert_eq!(ws.current(), Some(&original));
        prop_assert_eq!(ws.status(), WorkspaceStatus::HasOriginal);
        prop_assert_eq!(ws.canvas().rendered(), Some(&original));
    }

    #[test]
    fn prop_upload_replaces_whatever_was_there(
        seed in any::<bool>(),
        specs in prior_state_strategy(),
        img_w in 1u32..=24,
        img_h in 1u32..=24,
    ) {
        let mut ws = mounted(12, 12);
        if seed {
            ws.upload(create_test_image(7, 5)).unwrap();
            for spec in specs {
                ws.apply_filter(spec).unwrap();
            }
        }
        let b = create_test_image(img_w, img_h);
        ws.upload(b.clone()).unwrap();

        prop_assert_eq!(ws.current(), Some(&b));
        prop_assert_eq!(ws.status(), WorkspaceStatus::HasOriginal);
        prop_assert!(ws.state().filtered().is_none());
    }

    #[test]
    fn prop_discard_is_idempotent(
        specs in prior_state_strategy(),
        repeats in 1usize..=4,
    ) {
        let mut ws = mounted(8, 8);
        ws.upload(create_test_image(6, 6)).unwrap();
        for spec in specs {
            ws.apply_filter(spec).unwrap();
        }
        for _ in 0..repeats {
            ws.discard_image();
            prop_assert_eq!(ws.status(), WorkspaceStatus::Empty);
            prop_assert!(ws.canvas().rendered().is_none());
        }
    }

    #[test]
    fn prop_failed_filter_is_all_or_nothing(
        specs in prior_state_strategy(),
        bad in invalid_filter_strategy(),
    ) {
        let mut ws = mounted(10, 10);
        ws.upload(create_test_image(9, 4)).unwrap();
        for spec in specs {
            ws.apply_filter(spec).unwrap();
        }
        let before = (
            ws.state().original().cloned(),
            ws.state().filtered().cloned(),
            ws.canvas().rendered().cloned(),
        );

        let err = ws.apply_filter(bad.clone()).unwrap_err();
        prop_assert_eq!(err.filter_spec(), Some(&bad));

        let after = (
            ws.state().original().cloned(),
            ws.state().filtered().cloned(),
            ws.canvas().rendered().cloned(),
        );
        prop_assert_eq!(before, after);
    }

    #[test]
    fn prop_navigation_payload_taken_once(
        takes in 2usize..=5,
    ) {
        let slot = NavigationSlot::new();
        let img = create_test_image(2, 2);
        slot.deliver(NavigationPayload::with_image(img.clone()));

        prop_assert_eq!(slot.take_selected_image(), Some(img));
        for _ in 1..takes {
            prop_assert_eq!(slot.take_selected_image(), None);
        }
    }

    #[test]
    fn prop_canvas_export_matches_render_input(
        img_w in 1u32..=40,
        img_h in 1u32..=40,
        surface_w in 1u32..=20,
        surface_h in 1u32..=20,
        spec in valid_filter_strategy(),
    ) {
        let mut ws = mounted(surface_w, surface_h);
        ws.upload(create_test_image(img_w, img_h)).unwrap();
        let filtered = ws.apply_filter(spec).unwrap();
        let snapshot = ws.canvas().export_current().unwrap();
        prop_assert!(snapshot.same_pixels(&filtered));
        prop_assert_eq!(ws.canvas().frame().unwrap().dimensions(), (surface_w, surface_h));
    }
}
