//! The viewer aggregate: dataset, three view slots, cursor, display
//! adjustment, overlays and realtime ingest, behind the control surface the
//! presentation shell calls.
//!
//! `Viewer` lives on the UI thread. The only thing another thread can touch
//! is the [`PointSink`] handed out by [`Viewer::sink`].

use std::path::Path;
use std::sync::Arc;

use glam::Vec3;
use web_time::Instant;

use crate::config::ViewerConfig;
use crate::enums::{Axis, Orientation, ProjectionMode, SlotId};
use crate::error::{ConfigError, PlanError};
use crate::ingest::{self, Debouncer, IngestReceiver, PointSink, PointSource, RealtimeIngest};
use crate::overlay::{NeedlePlan, OverlayTrack};
use crate::points;
use crate::projector::{Cursor, SliceIndex, SliceProjector};
use crate::render::{
    self, DisplayAdjustment, ImagePlacement, OverlayPrimitive, RenderTarget, SlotFrame,
};
use crate::view_state::{CanvasSize, ViewSlot};
use crate::volume::Volume;

pub struct Viewer {
    config: ViewerConfig,
    volume: Option<Arc<Volume>>,
    slots: [ViewSlot; 3],
    cursor: Cursor,
    mode: ProjectionMode,
    adjust: DisplayAdjustment,
    projector: SliceProjector,
    overlays: OverlayTrack,
    ingest: RealtimeIngest,
    receiver: IngestReceiver,
    debouncer: Debouncer,
}

impl Default for Viewer {
    fn default() -> Self {
        Self::with_config(ViewerConfig::default())
    }
}

impl Viewer {
    /// Build a viewer with no volume loaded.
    ///
    /// # Errors
    ///
    /// Returns the first field rejected by [`ViewerConfig::validate`]
    pub fn new(config: ViewerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::with_config(config))
    }

    fn with_config(config: ViewerConfig) -> Self {
        let (sink, receiver) = ingest::channel();
        let zoom = config.zoom;
        Self {
            slots: SlotId::ALL.map(|id| ViewSlot::new(id, zoom)),
            cursor: Cursor::default(),
            mode: ProjectionMode::default(),
            adjust: DisplayAdjustment::default(),
            projector: SliceProjector::new(),
            overlays: OverlayTrack::new(),
            ingest: RealtimeIngest::new(sink, config.poll_interval()),
            receiver,
            debouncer: Debouncer::new(config.debounce()),
            volume: None,
            config,
        }
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn volume(&self) -> Option<&Arc<Volume>> {
        self.volume.as_ref()
    }

    pub fn slot(&self, id: SlotId) -> &ViewSlot {
        &self.slots[id.index()]
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn projection_mode(&self) -> ProjectionMode {
        self.mode
    }

    pub fn display(&self) -> &DisplayAdjustment {
        &self.adjust
    }

    pub fn overlays(&self) -> &OverlayTrack {
        &self.overlays
    }

    pub fn is_realtime_running(&self) -> bool {
        self.ingest.is_running()
    }

    /// Endpoint for sources that push points instead of being polled.
    pub fn sink(&self) -> PointSink {
        self.ingest.sink()
    }

    /// Replace the dataset. The cursor moves to the volume centre and the
    /// shared intensity range is taken from the new volume.
    pub fn load_volume(&mut self, volume: Volume) {
        let (lo, hi) = volume.scalar_range();
        self.adjust.set_range(Some((f32::from(lo), f32::from(hi))));
        self.cursor = Cursor::centre(volume.dim());
        self.projector.invalidate_all();
        log::info!("loaded volume {:?}", volume.dim());
        self.volume = Some(Arc::new(volume));
    }

    /// Tear down the dataset: stop ingest, clear overlays, clear the view
    /// buffers and pan offsets, then drop the volume.
    pub fn delete_volume(&mut self) {
        self.ingest.stop();
        self.debouncer.cancel();
        self.receiver.discard_pending();
        self.overlays.clear_all();
        self.projector.invalidate_all();
        for slot in &mut self.slots {
            slot.view.reset();
        }
        self.cursor = Cursor::default();
        self.adjust.set_range(None);
        if self.volume.take().is_some() {
            log::info!("volume deleted");
        }
    }

    /// Returns whether the slot took the new orientation.
    pub fn set_orientation(&mut self, slot: SlotId, orientation: Orientation) -> bool {
        let accepted = self.slots[slot.index()].set_orientation(orientation);
        if accepted {
            self.projector.invalidate(slot);
        } else {
            log::debug!("{slot:?} is locked, keeping its orientation");
        }
        accepted
    }

    pub fn set_lock(&mut self, slot: SlotId, locked: bool) {
        let view = &mut self.slots[slot.index()].view;
        if locked {
            view.lock();
        } else {
            view.unlock();
        }
    }

    /// Switching mode recomputes every slot, locked ones included.
    pub fn set_projection_mode(&mut self, mode: ProjectionMode) {
        if mode != self.mode {
            self.mode = mode;
            self.projector.invalidate_all();
        }
    }

    /// Move the cursor along `axis`, clamped to the volume. Ignored without a
    /// volume and in projection modes.
    pub fn set_cursor(&mut self, axis: Axis, value: i64) {
        let Some(volume) = &self.volume else {
            return;
        };
        if self.mode.is_projection() {
            return;
        }
        let index = SliceIndex::clamped(value, volume.extent(axis));
        self.cursor.set(axis, index);
    }

    /// Move the depth cursor from a raw slider value through the configured
    /// slab window. Without a window this is [`Viewer::set_cursor`] on z.
    pub fn set_slab_position(&mut self, value: i64) {
        let Some(window) = self.config.slab_window else {
            self.set_cursor(Axis::Z, value);
            return;
        };
        let Some(volume) = &self.volume else {
            return;
        };
        if self.mode.is_projection() {
            return;
        }
        let depth = volume.extent(Axis::Z);
        self.cursor.z = window.resolve(value, depth);
    }

    pub fn zoom_in(&mut self, slot: SlotId) {
        self.slots[slot.index()].view.zoom_in();
    }

    pub fn zoom_out(&mut self, slot: SlotId) {
        self.slots[slot.index()].view.zoom_out();
    }

    pub fn set_zoom(&mut self, slot: SlotId, zoom: f32) {
        self.slots[slot.index()].view.set_zoom(zoom);
    }

    /// Drag delta in screen pixels.
    pub fn pan(&mut self, slot: SlotId, dx: f32, dy: f32) {
        self.slots[slot.index()].view.pan(dx, dy);
    }

    pub fn reset_view(&mut self, slot: SlotId) {
        self.slots[slot.index()].view.reset();
    }

    pub fn reset_all_views(&mut self) {
        for slot in &mut self.slots {
            slot.view.reset();
        }
    }

    pub fn set_brightness(&mut self, brightness: f32) {
        self.adjust.set_brightness(brightness);
    }

    pub fn set_contrast(&mut self, contrast: f32) {
        self.adjust.set_contrast(contrast);
    }

    pub fn load_plan(&mut self, plan: NeedlePlan) {
        log::info!("plan loaded: {} -> {}", plan.start, plan.end);
        self.overlays.load_plan(plan);
    }

    /// Load a plan from its points: first is the start, second the end.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::InsufficientPlanData`] for fewer than two points;
    /// the current plan is left untouched
    pub fn load_plan_points(&mut self, points: &[Vec3]) -> Result<(), PlanError> {
        match points {
            [start, end, ..] => {
                self.load_plan(NeedlePlan {
                    start: *start,
                    end: *end,
                });
                Ok(())
            }
            _ => Err(PlanError::InsufficientPlanData {
                found: points.len(),
            }),
        }
    }

    pub fn load_plan_file(&mut self, path: impl AsRef<Path>) -> Result<(), PlanError> {
        let plan = points::load_plan_file(path.as_ref()).inspect_err(|err| {
            log::warn!("{}: {err}", path.as_ref().display());
        })?;
        self.load_plan(plan);
        Ok(())
    }

    pub fn clear_plan(&mut self) {
        self.overlays.clear_plan();
    }

    /// Start consuming `source`. Also re-arms a cleared realtime path.
    pub fn start_realtime(&mut self, source: impl PointSource) -> bool {
        self.overlays.rearm_path();
        self.ingest.start(source)
    }

    /// Stop consuming. Points that already arrived are kept.
    pub fn stop_realtime(&mut self) {
        self.ingest.stop();
        self.debouncer.cancel();
        self.apply_pending();
    }

    pub fn clear_realtime(&mut self) {
        self.debouncer.cancel();
        self.receiver.discard_pending();
        self.overlays.clear_path();
    }

    /// Advance the redraw timer. Returns `true` when streamed points were
    /// applied and every slot should be redrawn.
    pub fn tick(&mut self, now: Instant) -> bool {
        if self.receiver.take_signals() > 0 {
            self.debouncer.signal(now);
        }
        if self.debouncer.fire(now) {
            self.apply_pending();
            return true;
        }
        false
    }

    fn apply_pending(&mut self) {
        let points = self.receiver.drain_points();
        if points.is_empty() {
            return;
        }
        let received = points.len();
        let kept = self.overlays.extend_path(points);
        log::trace!("applied {kept} of {received} streamed points");
    }

    /// Build one slot's frame for a canvas of the given size.
    pub fn render(&mut self, slot: SlotId, canvas: CanvasSize) -> SlotFrame {
        let view_slot = &self.slots[slot.index()];
        let orientation = view_slot.orientation();
        let transform = view_slot
            .view
            .transform(canvas, self.config.reference_size);

        let mut frame = SlotFrame {
            slot,
            orientation,
            canvas,
            image: None,
            placement: ImagePlacement::from(&transform),
            overlays: Vec::new(),
        };
        let Some(volume) = &self.volume else {
            return frame;
        };

        let plane = self
            .projector
            .render(volume, view_slot, &self.cursor, self.mode);
        frame.image = render::plane_to_image(&plane, &self.adjust);

        if !self.mode.is_projection() {
            frame.overlays.extend(render::crosshairs(
                orientation,
                &self.cursor,
                &transform,
                canvas,
            ));
        }
        let dash = self.config.dash;
        frame.overlays.extend(
            self.overlays
                .plan_dashes(orientation, &transform, dash, canvas)
                .into_iter()
                .map(OverlayPrimitive::PlanDash),
        );
        frame.overlays.extend(
            self.overlays
                .path_dashes(orientation, &transform, dash, canvas)
                .into_iter()
                .map(OverlayPrimitive::RealtimeDash),
        );
        frame
    }

    /// All three slots from the same state.
    pub fn render_all(&mut self, canvases: [CanvasSize; 3]) -> [SlotFrame; 3] {
        let [a, b, c] = canvases;
        [
            self.render(SlotId::First, a),
            self.render(SlotId::Second, b),
            self.render(SlotId::Third, c),
        ]
    }

    /// Render and hand each frame to its target.
    pub fn present(&mut self, targets: [&mut dyn RenderTarget; 3]) {
        let canvases = [targets[0].size(), targets[1].size(), targets[2].size()];
        let frames = self.render_all(canvases);
        for (frame, target) in frames.iter().zip(targets) {
            render::present(frame, target);
        }
    }
}
