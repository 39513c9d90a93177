//! Needle overlays: the planned trajectory and the realtime path.
//!
//! Both live in volume space and are projected onto a view only when a frame
//! is built, so a zoom or pan can never leave stale screen geometry behind.
//! Dashes are cut after projection and have a fixed on-screen size.

use glam::{DVec2, Vec2, Vec3};

use crate::config::DashPattern;
use crate::enums::Orientation;
use crate::view_state::{CanvasSize, ScreenTransform};
use crate::volume::to_display;

/// Lifecycle of one trajectory.
///
/// `Cleared` differs from `Absent`: the trajectory existed and was deleted,
/// and stays hidden until it is explicitly reloaded or restarted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TrackState {
    #[default]
    Absent,
    Active,
    Cleared,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NeedlePlan {
    pub start: Vec3,
    pub end: Vec3,
}

/// A straight screen-space segment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    pub start: Vec2,
    pub end: Vec2,
}

impl Segment {
    pub fn length(&self) -> f32 {
        self.start.distance(self.end)
    }
}

/// Shortest dash period in pixels. Bounds the dash count for tiny patterns.
const MIN_PERIOD: f64 = 1.0;
/// Clipping slivers shorter than this are dropped.
const MIN_DASH: f64 = 1e-6;

/// Cut `start..end` into dashes of `pattern.dash` pixels separated by
/// `pattern.gap` pixels, keeping only what falls on `canvas`.
///
/// Dashes are phased from `start` even when it lies off the canvas, so a
/// pan never makes them crawl. The last dash is truncated at `end`.
pub fn dash_segment(
    start: Vec2,
    end: Vec2,
    pattern: DashPattern,
    canvas: CanvasSize,
) -> Vec<Segment> {
    if !(pattern.dash > 0.0 && pattern.dash.is_finite()) {
        return Vec::new();
    }
    let (start, end) = (start.as_dvec2(), end.as_dvec2());
    let length = start.distance(end);
    if !(length > 0.0 && length.is_finite()) {
        return Vec::new();
    }
    let Some((t0, t1)) = clip_to_canvas(start, end, canvas) else {
        return Vec::new();
    };

    let diagonal = f64::from(canvas.width).hypot(f64::from(canvas.height));
    let entry = start + (end - start) * t0;
    let exit = start + (end - start) * t1;
    let visible = entry.distance(exit).min(diagonal);
    if !(visible > 0.0) {
        return Vec::new();
    }
    let direction = (exit - entry) / entry.distance(exit);

    let dash = f64::from(pattern.dash);
    let period = (dash + f64::from(pattern.gap.max(0.0))).max(MIN_PERIOD);
    let phase = (t0 * length).rem_euclid(period);

    let mut dashes = Vec::new();
    for i in 0u64.. {
        let a = i as f64 * period - phase;
        if a >= visible {
            break;
        }
        let lo = a.max(0.0);
        let hi = (a + dash).min(visible);
        if hi - lo > MIN_DASH {
            dashes.push(Segment {
                start: (entry + direction * lo).as_vec2(),
                end: (entry + direction * hi).as_vec2(),
            });
        }
    }
    dashes
}

/// Parameter range of `start..end` inside `[0, width] x [0, height]`
/// (Liang-Barsky).
fn clip_to_canvas(start: DVec2, end: DVec2, canvas: CanvasSize) -> Option<(f64, f64)> {
    let (w, h) = (f64::from(canvas.width), f64::from(canvas.height));
    if !(w > 0.0 && h > 0.0 && w.is_finite() && h.is_finite()) {
        return None;
    }
    let d = end - start;
    let (mut t0, mut t1) = (0.0_f64, 1.0_f64);
    for (p, q) in [
        (-d.x, start.x),
        (d.x, w - start.x),
        (-d.y, start.y),
        (d.y, h - start.y),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
        } else if p < 0.0 {
            t0 = t0.max(q / p);
        } else {
            t1 = t1.min(q / p);
        }
    }
    (t0 < t1).then_some((t0, t1))
}

#[derive(Clone, Debug, Default)]
pub struct OverlayTrack {
    plan: Option<NeedlePlan>,
    plan_state: TrackState,
    path: Vec<Vec3>,
    path_state: TrackState,
}

impl OverlayTrack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the plan. There is never more than one.
    pub fn load_plan(&mut self, plan: NeedlePlan) {
        self.plan = Some(plan);
        self.plan_state = TrackState::Active;
    }

    pub fn clear_plan(&mut self) {
        self.plan = None;
        if self.plan_state == TrackState::Active {
            self.plan_state = TrackState::Cleared;
        }
    }

    /// The plan, if one is loaded and not deleted.
    pub fn plan(&self) -> Option<&NeedlePlan> {
        match self.plan_state {
            TrackState::Active => self.plan.as_ref(),
            _ => None,
        }
    }

    pub fn plan_state(&self) -> TrackState {
        self.plan_state
    }

    /// Append points in arrival order. Points arriving while the path is
    /// cleared are dropped; returns how many were kept.
    pub fn extend_path(&mut self, points: impl IntoIterator<Item = Vec3>) -> usize {
        if self.path_state == TrackState::Cleared {
            return 0;
        }
        let before = self.path.len();
        self.path.extend(points);
        let added = self.path.len() - before;
        if added > 0 {
            self.path_state = TrackState::Active;
        }
        added
    }

    pub fn clear_path(&mut self) {
        self.path.clear();
        self.path_state = TrackState::Cleared;
    }

    /// Allow a cleared path to become active again with the next point.
    pub fn rearm_path(&mut self) {
        if self.path_state == TrackState::Cleared {
            self.path_state = TrackState::Absent;
        }
    }

    pub fn path(&self) -> &[Vec3] {
        &self.path
    }

    pub fn path_state(&self) -> TrackState {
        self.path_state
    }

    /// Delete both trajectories.
    pub fn clear_all(&mut self) {
        self.clear_plan();
        self.clear_path();
    }

    pub fn plan_dashes(
        &self,
        orientation: Orientation,
        transform: &ScreenTransform,
        pattern: DashPattern,
        canvas: CanvasSize,
    ) -> Vec<Segment> {
        self.plan()
            .map(|plan| {
                let start = project(plan.start, orientation, transform);
                let end = project(plan.end, orientation, transform);
                dash_segment(start, end, pattern, canvas)
            })
            .unwrap_or_default()
    }

    /// Dashes for every consecutive pair of path points, in arrival order.
    pub fn path_dashes(
        &self,
        orientation: Orientation,
        transform: &ScreenTransform,
        pattern: DashPattern,
        canvas: CanvasSize,
    ) -> Vec<Segment> {
        if self.path_state != TrackState::Active {
            return Vec::new();
        }
        let screen: Vec<Vec2> = self
            .path
            .iter()
            .map(|&p| project(p, orientation, transform))
            .collect();
        screen
            .windows(2)
            .flat_map(|pair| dash_segment(pair[0], pair[1], pattern, canvas))
            .collect()
    }
}

fn project(point: Vec3, orientation: Orientation, transform: &ScreenTransform) -> Vec2 {
    transform.image_to_screen(to_display(point, orientation))
}
