use std::sync::Arc;

use crate::enums::{Axis, Orientation, ProjectionMode, SlotId};
use crate::view_state::ViewSlot;
use crate::volume::{Plane, Volume};

/// A cursor component: a voxel index, or a position outside the valid slab.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SliceIndex {
    At(usize),
    OutOfSlab,
}

impl SliceIndex {
    pub fn index(self) -> Option<usize> {
        match self {
            SliceIndex::At(i) => Some(i),
            SliceIndex::OutOfSlab => None,
        }
    }

    /// Clamp a raw value into `[0, extent - 1]`.
    pub fn clamped(value: i64, extent: usize) -> Self {
        if extent == 0 {
            return SliceIndex::OutOfSlab;
        }
        let max = extent as i64 - 1;
        SliceIndex::At(value.clamp(0, max) as usize)
    }
}

/// Voxel position used to pick the slice shown by each orientation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cursor {
    pub x: SliceIndex,
    pub y: SliceIndex,
    pub z: SliceIndex,
}

impl Default for Cursor {
    fn default() -> Self {
        Self {
            x: SliceIndex::At(0),
            y: SliceIndex::At(0),
            z: SliceIndex::At(0),
        }
    }
}

impl Cursor {
    /// Cursor at the centre of a volume.
    pub fn centre(dim: (usize, usize, usize)) -> Self {
        Self {
            x: SliceIndex::At(dim.0 / 2),
            y: SliceIndex::At(dim.1 / 2),
            z: SliceIndex::At(dim.2 / 2),
        }
    }

    pub fn get(&self, axis: Axis) -> SliceIndex {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    pub fn set(&mut self, axis: Axis, index: SliceIndex) {
        match axis {
            Axis::X => self.x = index,
            Axis::Y => self.y = index,
            Axis::Z => self.z = index,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct PlaneKey {
    orientation: Orientation,
    mode: ProjectionMode,
    index: Option<usize>,
}

#[derive(Clone, Debug)]
struct Retained {
    key: PlaneKey,
    plane: Arc<Plane>,
}

/// Produces the scalar plane each slot displays.
///
/// The last plane of every slot is retained. A locked slot keeps showing its
/// retained plane whatever the cursor does; an unlocked slot reuses it only
/// while orientation, mode and index are unchanged.
#[derive(Debug, Default)]
pub struct SliceProjector {
    retained: [Option<Retained>; 3],
}

impl SliceProjector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(
        &mut self,
        volume: &Volume,
        slot: &ViewSlot,
        cursor: &Cursor,
        mode: ProjectionMode,
    ) -> Arc<Plane> {
        let orientation = slot.orientation();
        let key = PlaneKey {
            orientation,
            mode,
            index: match mode {
                ProjectionMode::Slice => cursor.get(orientation.normal()).index(),
                _ => None,
            },
        };

        let entry = &mut self.retained[slot.id().index()];
        if let Some(retained) = entry {
            if slot.is_locked() || retained.key == key {
                return Arc::clone(&retained.plane);
            }
        }

        let plane = Arc::new(Self::compute(volume, key));
        *entry = Some(Retained {
            key,
            plane: Arc::clone(&plane),
        });
        plane
    }

    fn compute(volume: &Volume, key: PlaneKey) -> Plane {
        match (key.mode.reduction(), key.index) {
            (Some(reduction), _) => volume.extract_projection(key.orientation, reduction),
            (None, Some(index)) => volume.extract_slice(key.orientation, index),
            (None, None) => Plane::zeros(volume.display_shape(key.orientation)),
        }
    }

    pub fn retained(&self, slot: SlotId) -> Option<Arc<Plane>> {
        self.retained[slot.index()]
            .as_ref()
            .map(|r| Arc::clone(&r.plane))
    }

    /// Drop every retained plane, locked slots included.
    pub fn invalidate_all(&mut self) {
        self.retained = Default::default();
    }

    pub fn invalidate(&mut self, slot: SlotId) {
        self.retained[slot.index()] = None;
    }
}
