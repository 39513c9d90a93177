use serde::{Deserialize, Serialize};

/// Volume grid axis. The grid is indexed `[x, y, z]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    Axial,
    Sagittal,
    Coronal,
}

impl Orientation {
    pub const ALL: [Orientation; 3] = [
        Orientation::Axial,
        Orientation::Sagittal,
        Orientation::Coronal,
    ];

    /// The axis a slice of this orientation is taken along.
    pub fn normal(self) -> Axis {
        match self {
            // Looking down Z: x rows, y columns
            Orientation::Axial => Axis::Z,
            // Fixed x: z rows, y columns after the display transform
            Orientation::Sagittal => Axis::X,
            // Fixed y: z rows, x columns after the display transform
            Orientation::Coronal => Axis::Y,
        }
    }

    /// Volume axes shown as (columns, rows) in the display frame.
    pub fn display_axes(self) -> (Axis, Axis) {
        match self {
            Orientation::Axial => (Axis::Y, Axis::X),
            Orientation::Sagittal => (Axis::Y, Axis::Z),
            Orientation::Coronal => (Axis::X, Axis::Z),
        }
    }
}

/// What a slot displays: a single slice or a reduction along the normal axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectionMode {
    #[default]
    Slice,
    Mip,
    MinIp,
    Average,
}

impl ProjectionMode {
    pub fn reduction(self) -> Option<Reduction> {
        match self {
            ProjectionMode::Slice => None,
            ProjectionMode::Mip => Some(Reduction::Max),
            ProjectionMode::MinIp => Some(Reduction::Min),
            ProjectionMode::Average => Some(Reduction::Mean),
        }
    }

    pub fn is_projection(self) -> bool {
        self.reduction().is_some()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Reduction {
    Max,
    Min,
    Mean,
}

/// One of the three view panes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SlotId {
    First,
    Second,
    Third,
}

impl SlotId {
    pub const ALL: [SlotId; 3] = [SlotId::First, SlotId::Second, SlotId::Third];

    pub fn index(self) -> usize {
        match self {
            SlotId::First => 0,
            SlotId::Second => 1,
            SlotId::Third => 2,
        }
    }

    pub fn default_orientation(self) -> Orientation {
        match self {
            SlotId::First => Orientation::Axial,
            SlotId::Second => Orientation::Sagittal,
            SlotId::Third => Orientation::Coronal,
        }
    }
}

/// Slice ordering used when stacking DICOM images.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortBy {
    #[default]
    ImagePositionPatient,
    TablePosition,
    InstanceNumber,
    None,
}
