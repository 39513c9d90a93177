//! Per-slot zoom, pan and lock state, and the transform between the image
//! frame and screen pixels.
//!
//! The same [`ScreenTransform`] places the slice image, the crosshairs, the
//! plan endpoints and every realtime segment, so all of them stay registered
//! under any zoom or pan.

use glam::Vec2;

use crate::config::ZoomLimits;
use crate::enums::{Orientation, SlotId};

/// Canvas size in screen pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CanvasSize {
    pub width: f32,
    pub height: f32,
}

impl CanvasSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ViewState {
    zoom: f32,
    pan: Vec2,
    locked: bool,
    limits: ZoomLimits,
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new(ZoomLimits::default())
    }
}

impl ViewState {
    /// Limits that fail [`ZoomLimits::bounds_valid`] or have a non-positive
    /// step are replaced by the defaults.
    pub fn new(limits: ZoomLimits) -> Self {
        let limits = if limits.bounds_valid() && limits.step.is_finite() && limits.step > 0.0 {
            limits
        } else {
            log::warn!("unusable zoom limits {limits:?}, using defaults");
            ZoomLimits::default()
        };
        Self {
            zoom: 1.0_f32.clamp(limits.min, limits.max),
            pan: Vec2::ZERO,
            locked: false,
            limits,
        }
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn pan_offset(&self) -> Vec2 {
        self.pan
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn limits(&self) -> ZoomLimits {
        self.limits
    }

    pub fn zoom_in(&mut self) {
        self.set_zoom(self.snap(self.zoom + self.limits.step));
    }

    pub fn zoom_out(&mut self) {
        self.set_zoom(self.snap(self.zoom - self.limits.step));
    }

    // Keeps repeated steps on the step grid instead of accumulating error
    fn snap(&self, zoom: f32) -> f32 {
        let step = self.limits.step;
        if step > 0.0 {
            (zoom / step).round() * step
        } else {
            zoom
        }
    }

    /// Clamp and assign. Non-finite values are ignored.
    pub fn set_zoom(&mut self, zoom: f32) {
        if zoom.is_finite() {
            self.zoom = zoom.clamp(self.limits.min, self.limits.max);
        }
    }

    /// Accumulate a raw screen-pixel delta. Not scaled by zoom, not clamped.
    pub fn pan(&mut self, dx: f32, dy: f32) {
        self.pan += Vec2::new(dx, dy);
    }

    pub fn reset(&mut self) {
        self.zoom = 1.0_f32.clamp(self.limits.min, self.limits.max);
        self.pan = Vec2::ZERO;
    }

    pub fn lock(&mut self) {
        self.locked = true;
    }

    pub fn unlock(&mut self) {
        self.locked = false;
    }

    /// Transform for a canvas, centring a `reference`-sized image frame.
    pub fn transform(&self, canvas: CanvasSize, reference: f32) -> ScreenTransform {
        let zoomed = reference * self.zoom;
        let offset = Vec2::new(
            (canvas.width - zoomed) / 2.0 + self.pan.x,
            (canvas.height - zoomed) / 2.0 + self.pan.y,
        );
        ScreenTransform {
            offset,
            zoom: self.zoom,
        }
    }
}

/// One view pane: its plane assignment and its view state.
#[derive(Clone, Debug)]
pub struct ViewSlot {
    id: SlotId,
    orientation: Orientation,
    pub view: ViewState,
}

impl ViewSlot {
    pub fn new(id: SlotId, limits: ZoomLimits) -> Self {
        Self {
            id,
            orientation: id.default_orientation(),
            view: ViewState::new(limits),
        }
    }

    pub fn id(&self) -> SlotId {
        self.id
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn is_locked(&self) -> bool {
        self.view.is_locked()
    }

    /// Reassign the orientation. Refused (returns `false`) while locked.
    pub fn set_orientation(&mut self, orientation: Orientation) -> bool {
        if self.view.is_locked() {
            return false;
        }
        self.orientation = orientation;
        true
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScreenTransform {
    pub offset: Vec2,
    pub zoom: f32,
}

impl ScreenTransform {
    #[inline]
    pub fn image_to_screen(&self, image: Vec2) -> Vec2 {
        self.offset + image * self.zoom
    }

    #[inline]
    pub fn screen_to_image(&self, screen: Vec2) -> Vec2 {
        (screen - self.offset) / self.zoom
    }

    pub fn image_x_to_screen(&self, x: f32) -> f32 {
        self.offset.x + x * self.zoom
    }

    pub fn image_y_to_screen(&self, y: f32) -> f32 {
        self.offset.y + y * self.zoom
    }
}
