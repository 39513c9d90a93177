use glam::{Vec2, Vec3};
use ndarray::Array3;
use proptest::prelude::*;
use puncture_view::{
    CanvasSize, Orientation, Volume,
    config::{DashPattern, ZoomLimits},
    overlay::{OverlayTrack, dash_segment},
    view_state::ViewState,
};

#[derive(Clone, Debug)]
enum ViewOp {
    ZoomIn,
    ZoomOut,
    SetZoom(f32),
    Pan(f32, f32),
    Reset,
}

fn view_op() -> impl Strategy<Value = ViewOp> {
    prop_oneof![
        Just(ViewOp::ZoomIn),
        Just(ViewOp::ZoomOut),
        any::<f32>().prop_map(ViewOp::SetZoom),
        (-500.0f32..500.0, -500.0f32..500.0).prop_map(|(dx, dy)| ViewOp::Pan(dx, dy)),
        Just(ViewOp::Reset),
    ]
}

fn orientation() -> impl Strategy<Value = Orientation> {
    prop_oneof![
        Just(Orientation::Axial),
        Just(Orientation::Sagittal),
        Just(Orientation::Coronal),
    ]
}

proptest! {
    #[test]
    fn zoom_stays_within_limits(ops in prop::collection::vec(view_op(), 0..64)) {
        let limits = ZoomLimits::default();
        let mut view = ViewState::new(limits);
        for op in ops {
            match op {
                ViewOp::ZoomIn => view.zoom_in(),
                ViewOp::ZoomOut => view.zoom_out(),
                ViewOp::SetZoom(z) => view.set_zoom(z),
                ViewOp::Pan(dx, dy) => view.pan(dx, dy),
                ViewOp::Reset => view.reset(),
            }
            prop_assert!(view.zoom() >= limits.min && view.zoom() <= limits.max);
        }
    }

    #[test]
    fn screen_transform_round_trips(
        zoom in 0.1f32..5.0,
        pan in (-1000.0f32..1000.0, -1000.0f32..1000.0),
        canvas in (1.0f32..2000.0, 1.0f32..2000.0),
        point in (-600.0f32..600.0, -600.0f32..600.0),
    ) {
        let mut view = ViewState::default();
        view.set_zoom(zoom);
        view.pan(pan.0, pan.1);
        let t = view.transform(CanvasSize::new(canvas.0, canvas.1), 512.0);

        let image = Vec2::new(point.0, point.1);
        let back = t.screen_to_image(t.image_to_screen(image));
        prop_assert!(back.distance(image) < 5e-2);
    }

    #[test]
    fn dashes_never_exceed_pattern(
        start in (0.0f32..2000.0, 0.0f32..2000.0),
        end in (0.0f32..2000.0, 0.0f32..2000.0),
    ) {
        let pattern = DashPattern::default();
        let start = Vec2::new(start.0, start.1);
        let end = Vec2::new(end.0, end.1);
        let dashes = dash_segment(start, end, pattern, CanvasSize::new(2000.0, 2000.0));
        let length = start.distance(end);

        for dash in &dashes {
            prop_assert!(dash.length() <= pattern.dash + 1e-2);
        }
        let period = pattern.dash + pattern.gap;
        prop_assert!(dashes.len() <= (length / period) as usize + 1);
        if let Some(last) = dashes.last() {
            prop_assert!(last.end.distance(end) <= pattern.gap + 5e-2);
        }
    }

    #[test]
    fn far_segments_are_clipped_to_the_canvas(
        start in (-1.0e12f32..1.0e12, -1.0e12f32..1.0e12),
        end in (-1.0e12f32..1.0e12, -1.0e12f32..1.0e12),
        canvas in (1.0f32..2000.0, 1.0f32..2000.0),
    ) {
        let pattern = DashPattern::default();
        let canvas = CanvasSize::new(canvas.0, canvas.1);
        let dashes = dash_segment(
            Vec2::new(start.0, start.1),
            Vec2::new(end.0, end.1),
            pattern,
            canvas,
        );

        let diagonal = canvas.width.hypot(canvas.height);
        let period = pattern.dash + pattern.gap;
        prop_assert!(dashes.len() <= (diagonal / period) as usize + 2);
        for dash in &dashes {
            for p in [dash.start, dash.end] {
                prop_assert!(p.x >= -0.5 && p.x <= canvas.width + 0.5);
                prop_assert!(p.y >= -0.5 && p.y <= canvas.height + 0.5);
            }
        }
    }

    #[test]
    fn plan_dashes_keep_their_size_under_zoom(
        zoom in 0.1f32..5.0,
        orientation in orientation(),
        a in (0.0f32..64.0, 0.0f32..64.0, 0.0f32..64.0),
        b in (0.0f32..64.0, 0.0f32..64.0, 0.0f32..64.0),
    ) {
        let mut track = OverlayTrack::new();
        track.load_plan(puncture_view::overlay::NeedlePlan {
            start: Vec3::new(a.0, a.1, a.2),
            end: Vec3::new(b.0, b.1, b.2),
        });
        let mut view = ViewState::default();
        view.set_zoom(zoom);
        let canvas = CanvasSize::new(640.0, 480.0);
        let t = view.transform(canvas, 512.0);

        let pattern = DashPattern::default();
        for dash in track.plan_dashes(orientation, &t, pattern, canvas) {
            prop_assert!(dash.length() <= pattern.dash + 1e-2);
        }
    }

    #[test]
    fn out_of_range_slices_are_blank(
        dim in (1usize..6, 1usize..6, 1usize..6),
        orientation in orientation(),
        past in 0usize..10,
    ) {
        let data = Array3::from_shape_fn(dim, |(x, y, z)| (x * 100 + y * 10 + z + 1) as i16);
        let volume = Volume::new(data, (1.0, 1.0, 1.0)).unwrap();
        let depth = volume.extent(orientation.normal());

        let plane = volume.extract_slice(orientation, depth + past);
        prop_assert_eq!(plane.dim(), volume.display_shape(orientation));
        prop_assert!(plane.iter().all(|&v| v == 0.0));

        let inside = volume.extract_slice(orientation, depth - 1);
        prop_assert!(inside.iter().all(|&v| v > 0.0));
    }
}
