//! Turns planes and overlay geometry into what the presentation shell draws.

use glam::Vec2;
use image::{GrayImage, ImageBuffer, Rgb, RgbImage};
use rayon::prelude::*;

use crate::enums::{Axis, Orientation, SlotId};
use crate::overlay::Segment;
use crate::projector::Cursor;
use crate::view_state::{CanvasSize, ScreenTransform};
use crate::volume::Plane;

/// Brightness, contrast and the intensity range shared by every slot.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DisplayAdjustment {
    brightness: f32,
    contrast: f32,
    range: Option<(f32, f32)>,
}

impl Default for DisplayAdjustment {
    fn default() -> Self {
        Self {
            brightness: 0.0,
            contrast: 1.0,
            range: None,
        }
    }
}

impl DisplayAdjustment {
    pub fn brightness(&self) -> f32 {
        self.brightness
    }

    pub fn contrast(&self) -> f32 {
        self.contrast
    }

    pub fn range(&self) -> Option<(f32, f32)> {
        self.range
    }

    /// Additive offset in grey levels, clamped to ±255.
    pub fn set_brightness(&mut self, brightness: f32) {
        if brightness.is_finite() {
            self.brightness = brightness.clamp(-255.0, 255.0);
        }
    }

    /// Gain around mid-grey; negative values are treated as zero.
    pub fn set_contrast(&mut self, contrast: f32) {
        if contrast.is_finite() {
            self.contrast = contrast.max(0.0);
        }
    }

    pub fn set_range(&mut self, range: Option<(f32, f32)>) {
        self.range = range;
    }

    #[inline]
    fn map(&self, value: f32, (lo, hi): (f32, f32)) -> u8 {
        let normalized = if hi > lo {
            (value.clamp(lo, hi) - lo) / (hi - lo) * 255.0
        } else {
            0.0
        };
        let adjusted = self.contrast * (normalized - 128.0) + 128.0 + self.brightness;
        adjusted.clamp(0.0, 255.0) as u8
    }
}

/// Normalize a plane into an 8-bit image `cols` wide and `rows` high.
///
/// Without a shared range the plane's own min and max are used.
pub fn plane_to_image(plane: &Plane, adjust: &DisplayAdjustment) -> Option<GrayImage> {
    let (rows, cols) = plane.dim();
    let range = adjust.range.unwrap_or_else(|| {
        plane.iter().fold((f32::MAX, f32::MIN), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
    });
    let pixel_data: Vec<u8> = match plane.as_slice() {
        Some(values) => values.par_iter().map(|&v| adjust.map(v, range)).collect(),
        None => plane.iter().map(|&v| adjust.map(v, range)).collect(),
    };
    ImageBuffer::from_raw(cols as u32, rows as u32, pixel_data)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineDirection {
    Horizontal,
    Vertical,
}

/// A full-width or full-height line marking the cursor along `axis`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Crosshair {
    pub axis: Axis,
    pub direction: LineDirection,
    pub start: Vec2,
    pub end: Vec2,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum OverlayPrimitive {
    Crosshair(Crosshair),
    PlanDash(Segment),
    RealtimeDash(Segment),
}

/// Where the unscaled image goes: top-left corner and scale factor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ImagePlacement {
    pub origin: Vec2,
    pub scale: f32,
}

impl From<&ScreenTransform> for ImagePlacement {
    fn from(transform: &ScreenTransform) -> Self {
        Self {
            origin: transform.offset,
            scale: transform.zoom,
        }
    }
}

/// Everything one slot needs for a refresh, already in screen coordinates.
#[derive(Clone, Debug)]
pub struct SlotFrame {
    pub slot: SlotId,
    pub orientation: Orientation,
    pub canvas: CanvasSize,
    pub image: Option<GrayImage>,
    pub placement: ImagePlacement,
    pub overlays: Vec<OverlayPrimitive>,
}

/// A drawable pane implemented by the presentation shell.
pub trait RenderTarget {
    fn size(&self) -> CanvasSize;
    fn set_image(&mut self, image: Option<&GrayImage>, placement: ImagePlacement);
    fn set_overlays(&mut self, overlays: &[OverlayPrimitive]);
}

pub fn present(frame: &SlotFrame, target: &mut dyn RenderTarget) {
    target.set_image(frame.image.as_ref(), frame.placement);
    target.set_overlays(&frame.overlays);
}

/// Crosshair lines through the cursor. Components outside the slab are
/// not drawn.
pub fn crosshairs(
    orientation: Orientation,
    cursor: &Cursor,
    transform: &ScreenTransform,
    canvas: CanvasSize,
) -> Vec<OverlayPrimitive> {
    let (col_axis, row_axis) = orientation.display_axes();
    let mut lines = Vec::with_capacity(2);
    if let Some(row) = cursor.get(row_axis).index() {
        let y = transform.image_y_to_screen(row as f32);
        lines.push(OverlayPrimitive::Crosshair(Crosshair {
            axis: row_axis,
            direction: LineDirection::Horizontal,
            start: Vec2::new(0.0, y),
            end: Vec2::new(canvas.width, y),
        }));
    }
    if let Some(col) = cursor.get(col_axis).index() {
        let x = transform.image_x_to_screen(col as f32);
        lines.push(OverlayPrimitive::Crosshair(Crosshair {
            axis: col_axis,
            direction: LineDirection::Vertical,
            start: Vec2::new(x, 0.0),
            end: Vec2::new(x, canvas.height),
        }));
    }
    lines
}

const PLAN_COLOUR: Rgb<u8> = Rgb([0, 200, 0]);
const REALTIME_COLOUR: Rgb<u8> = Rgb([230, 0, 0]);

fn axis_colour(axis: Axis) -> Rgb<u8> {
    match axis {
        Axis::X => Rgb([255, 0, 255]),
        Axis::Y => Rgb([255, 255, 0]),
        Axis::Z => Rgb([0, 0, 255]),
    }
}

/// Rasterize a frame onto a black canvas: nearest-neighbour scaled image,
/// then crosshairs, plan and realtime dashes.
pub fn compose(frame: &SlotFrame) -> RgbImage {
    let width = frame.canvas.width.max(0.0) as u32;
    let height = frame.canvas.height.max(0.0) as u32;
    let mut canvas = RgbImage::new(width, height);

    if let Some(image) = &frame.image {
        let ImagePlacement { origin, scale } = frame.placement;
        let row_len = width as usize * 3;
        if scale > 0.0 && row_len > 0 {
            let buffer: &mut [u8] = &mut canvas;
            buffer
                .par_chunks_mut(row_len)
                .enumerate()
                .for_each(|(sy, row)| {
                    let iy = ((sy as f32 + 0.5 - origin.y) / scale).floor();
                    if iy < 0.0 || iy >= image.height() as f32 {
                        return;
                    }
                    for (sx, pixel) in row.chunks_exact_mut(3).enumerate() {
                        let ix = ((sx as f32 + 0.5 - origin.x) / scale).floor();
                        if ix < 0.0 || ix >= image.width() as f32 {
                            continue;
                        }
                        let grey = image.get_pixel(ix as u32, iy as u32)[0];
                        pixel.copy_from_slice(&[grey, grey, grey]);
                    }
                });
        }
    }

    for primitive in &frame.overlays {
        let (start, end, colour) = match primitive {
            OverlayPrimitive::Crosshair(line) => (line.start, line.end, axis_colour(line.axis)),
            OverlayPrimitive::PlanDash(dash) => (dash.start, dash.end, PLAN_COLOUR),
            OverlayPrimitive::RealtimeDash(dash) => (dash.start, dash.end, REALTIME_COLOUR),
        };
        draw_line(&mut canvas, start, end, colour);
    }
    canvas
}

fn draw_line(canvas: &mut RgbImage, start: Vec2, end: Vec2, colour: Rgb<u8>) {
    let steps = (start.distance(end) * 2.0).ceil().min(1e5) as usize;
    for i in 0..=steps {
        let t = if steps == 0 { 0.0 } else { i as f32 / steps as f32 };
        let p = start.lerp(end, t);
        if p.x < 0.0 || p.y < 0.0 {
            continue;
        }
        let (x, y) = (p.x as u32, p.y as u32);
        if x < canvas.width() && y < canvas.height() {
            canvas.put_pixel(x, y, colour);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projector::SliceIndex;
    use ndarray::array;

    #[test]
    fn test_global_range_mapping() {
        let mut adjust = DisplayAdjustment::default();
        adjust.set_range(Some((-1000.0, 1000.0)));
        let plane = array![[-2000.0, -1000.0], [0.0, 1000.0]];
        let image = plane_to_image(&plane, &adjust).unwrap();
        assert_eq!(image.dimensions(), (2, 2));
        assert_eq!(image.get_pixel(0, 0)[0], 0);
        assert_eq!(image.get_pixel(1, 0)[0], 0);
        assert_eq!(image.get_pixel(0, 1)[0], 127);
        assert_eq!(image.get_pixel(1, 1)[0], 255);
    }

    #[test]
    fn test_same_value_maps_identically_across_planes() {
        let mut adjust = DisplayAdjustment::default();
        adjust.set_range(Some((0.0, 100.0)));
        let narrow = plane_to_image(&array![[50.0, 60.0]], &adjust).unwrap();
        let wide = plane_to_image(&array![[0.0, 50.0, 100.0]], &adjust).unwrap();
        assert_eq!(narrow.get_pixel(0, 0), wide.get_pixel(1, 0));
    }

    #[test]
    fn test_brightness_and_contrast() {
        let mut adjust = DisplayAdjustment::default();
        adjust.set_range(Some((0.0, 255.0)));
        adjust.set_contrast(2.0);
        adjust.set_brightness(10.0);
        let image = plane_to_image(&array![[128.0, 100.0, 250.0]], &adjust).unwrap();
        assert_eq!(image.get_pixel(0, 0)[0], 138);
        assert_eq!(image.get_pixel(1, 0)[0], 82);
        assert_eq!(image.get_pixel(2, 0)[0], 255);

        adjust.set_brightness(1e9);
        assert_eq!(adjust.brightness(), 255.0);
        adjust.set_contrast(-3.0);
        assert_eq!(adjust.contrast(), 0.0);
    }

    #[test]
    fn test_degenerate_range_is_black() {
        let image = plane_to_image(&Plane::zeros((3, 4)), &DisplayAdjustment::default()).unwrap();
        assert_eq!(image.dimensions(), (4, 3));
        assert!(image.pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn test_crosshairs_follow_transform() {
        let transform = ScreenTransform {
            offset: Vec2::new(-10.0, 20.0),
            zoom: 2.0,
        };
        let canvas = CanvasSize::new(300.0, 200.0);
        let cursor = Cursor {
            x: SliceIndex::At(5),
            y: SliceIndex::At(7),
            z: SliceIndex::OutOfSlab,
        };

        let lines = crosshairs(Orientation::Axial, &cursor, &transform, canvas);
        assert_eq!(
            lines,
            vec![
                OverlayPrimitive::Crosshair(Crosshair {
                    axis: Axis::X,
                    direction: LineDirection::Horizontal,
                    start: Vec2::new(0.0, 30.0),
                    end: Vec2::new(300.0, 30.0),
                }),
                OverlayPrimitive::Crosshair(Crosshair {
                    axis: Axis::Y,
                    direction: LineDirection::Vertical,
                    start: Vec2::new(4.0, 0.0),
                    end: Vec2::new(4.0, 200.0),
                }),
            ]
        );

        // Sagittal rows are z, which is outside the slab
        let lines = crosshairs(Orientation::Sagittal, &cursor, &transform, canvas);
        assert_eq!(lines.len(), 1);
    }

    #[test]
    fn test_compose_places_scaled_image_and_overlays() {
        let image = GrayImage::from_raw(2, 1, vec![100, 200]).unwrap();
        let frame = SlotFrame {
            slot: SlotId::First,
            orientation: Orientation::Axial,
            canvas: CanvasSize::new(10.0, 10.0),
            image: Some(image),
            placement: ImagePlacement {
                origin: Vec2::new(2.0, 2.0),
                scale: 2.0,
            },
            overlays: vec![OverlayPrimitive::PlanDash(Segment {
                start: Vec2::new(0.0, 9.0),
                end: Vec2::new(4.0, 9.0),
            })],
        };
        let out = compose(&frame);
        assert_eq!(out.dimensions(), (10, 10));
        assert_eq!(out.get_pixel(1, 1), &Rgb([0, 0, 0]));
        assert_eq!(out.get_pixel(2, 2), &Rgb([100, 100, 100]));
        assert_eq!(out.get_pixel(3, 3), &Rgb([100, 100, 100]));
        assert_eq!(out.get_pixel(4, 3), &Rgb([200, 200, 200]));
        assert_eq!(out.get_pixel(6, 3), &Rgb([0, 0, 0]));
        assert_eq!(out.get_pixel(2, 9), &PLAN_COLOUR);
    }

    #[derive(Default)]
    struct Recorder {
        image: Option<(u32, u32)>,
        overlays: usize,
    }

    impl RenderTarget for Recorder {
        fn size(&self) -> CanvasSize {
            CanvasSize::new(64.0, 64.0)
        }

        fn set_image(&mut self, image: Option<&GrayImage>, _placement: ImagePlacement) {
            self.image = image.map(|i| i.dimensions());
        }

        fn set_overlays(&mut self, overlays: &[OverlayPrimitive]) {
            self.overlays = overlays.len();
        }
    }

    #[test]
    fn test_present_forwards_frame() {
        let frame = SlotFrame {
            slot: SlotId::Second,
            orientation: Orientation::Sagittal,
            canvas: CanvasSize::new(64.0, 64.0),
            image: Some(GrayImage::new(3, 2)),
            placement: ImagePlacement {
                origin: Vec2::ZERO,
                scale: 1.0,
            },
            overlays: vec![],
        };
        let mut target = Recorder::default();
        present(&frame, &mut target);
        assert_eq!(target.image, Some((3, 2)));
        assert_eq!(target.overlays, 0);
    }
}
