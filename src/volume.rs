use crate::enums::{Axis, Orientation, Reduction};
use crate::error::VolumeError;

use glam::{Vec2, Vec3};
use ndarray::parallel::prelude::*;
use ndarray::{Array2, Array3, ArrayView1, ArrayView2, Zip, s};

/// A 2D scalar image in the display frame, indexed `[row, col]`.
pub type Plane = Array2<f32>;

/// Voxel size in millimetres along x, y and z.
pub type Spacing = (f32, f32, f32);

/// Immutable intensity grid indexed `[x, y, z]`.
#[derive(Clone, Debug)]
pub struct Volume {
    data: Array3<i16>,
    spacing: Spacing,
    range: (i16, i16),
}

impl Volume {
    /// Wrap a grid, scanning it once for its scalar range
    ///
    /// # Errors
    ///
    /// Returns error if any dimension is zero
    pub fn new(data: Array3<i16>, spacing: Spacing) -> Result<Self, VolumeError> {
        if data.is_empty() {
            return Err(VolumeError::EmptyVolume(data.dim()));
        }
        let range = Self::scan_range(&data);
        log::debug!("volume {:?} loaded, scalar range {:?}", data.dim(), range);
        Ok(Self {
            data,
            spacing,
            range,
        })
    }

    fn scan_range(data: &Array3<i16>) -> (i16, i16) {
        data.par_iter()
            .fold(
                || (i16::MAX, i16::MIN),
                |(lo, hi), &v| (lo.min(v), hi.max(v)),
            )
            .reduce(
                || (i16::MAX, i16::MIN),
                |a, b| (a.0.min(b.0), a.1.max(b.1)),
            )
    }

    /// Get the dimensions of the volume (x, y, z)
    pub fn dim(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    pub fn extent(&self, axis: Axis) -> usize {
        self.data.shape()[axis.index()]
    }

    /// Get a reference to the underlying data
    pub fn data(&self) -> &Array3<i16> {
        &self.data
    }

    pub fn spacing(&self) -> Spacing {
        self.spacing
    }

    /// Minimum and maximum intensity over the whole grid.
    pub fn scalar_range(&self) -> (i16, i16) {
        self.range
    }

    /// Shape `(rows, cols)` of a slice or projection for `orientation`.
    pub fn display_shape(&self, orientation: Orientation) -> (usize, usize) {
        let (col, row) = orientation.display_axes();
        (self.extent(row), self.extent(col))
    }

    /// Extract the slice at `index` along the orientation's normal axis.
    ///
    /// Indices past the end yield an all-zero plane of the display shape.
    pub fn extract_slice(&self, orientation: Orientation, index: usize) -> Plane {
        if index >= self.extent(orientation.normal()) {
            return Plane::zeros(self.display_shape(orientation));
        }
        let raw = match orientation {
            Orientation::Axial => self.data.slice(s![.., .., index]),
            Orientation::Sagittal => self.data.slice(s![index, .., ..]),
            Orientation::Coronal => self.data.slice(s![.., index, ..]),
        };
        to_plane(display_frame(raw, orientation))
    }

    /// Reduce the full extent of the orientation's normal axis.
    pub fn extract_projection(&self, orientation: Orientation, reduction: Reduction) -> Plane {
        let lanes = self.data.lanes(ndarray::Axis(orientation.normal().index()));
        match reduction {
            Reduction::Max | Reduction::Min => {
                let reduced: Array2<i16> =
                    Zip::from(lanes).par_map_collect(|lane| extreme_of_lane(lane, reduction));
                to_plane(display_frame(reduced.view(), orientation))
            }
            Reduction::Mean => {
                let mean: Plane = Zip::from(lanes).par_map_collect(mean_of_lane);
                display_frame(mean.view(), orientation)
                    .as_standard_layout()
                    .into_owned()
            }
        }
    }
}

/// Volume-space point to `(col, row)` in the display frame of `orientation`.
pub fn to_display(point: Vec3, orientation: Orientation) -> Vec2 {
    let (col, row) = orientation.display_axes();
    Vec2::new(point[col.index()], point[row.index()])
}

// Sagittal and coronal raw slices are turned a quarter counter-clockwise and
// flipped vertically; composed, that is exactly a transpose.
fn display_frame<'a, A>(raw: ArrayView2<'a, A>, orientation: Orientation) -> ArrayView2<'a, A> {
    match orientation {
        Orientation::Axial => raw,
        Orientation::Sagittal | Orientation::Coronal => raw.reversed_axes(),
    }
}

fn to_plane(view: ArrayView2<'_, i16>) -> Plane {
    let mut plane = Plane::zeros(view.dim());
    Zip::from(&mut plane)
        .and(view)
        .par_for_each(|out, &v| *out = f32::from(v));
    plane
}

fn extreme_of_lane(lane: ArrayView1<'_, i16>, reduction: Reduction) -> i16 {
    let values = lane.iter().copied();
    let extreme = match reduction {
        Reduction::Min => values.min(),
        _ => values.max(),
    };
    extreme.unwrap_or(0)
}

fn mean_of_lane(lane: ArrayView1<'_, i16>) -> f32 {
    if lane.is_empty() {
        return 0.0;
    }
    let sum: f64 = lane.iter().map(|&v| f64::from(v)).sum();
    (sum / lane.len() as f64) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    fn fixture() -> Volume {
        // v = 16x + 4y + z, distinct per voxel
        let data = Array3::from_shape_fn((4, 4, 4), |(x, y, z)| (16 * x + 4 * y + z) as i16);
        Volume::new(data, (1.0, 1.0, 1.0)).unwrap()
    }

    fn rot90_then_flipud(a: &Array2<f32>) -> Array2<f32> {
        let (m, n) = a.dim();
        let rotated = Array2::from_shape_fn((n, m), |(i, j)| a[[j, n - 1 - i]]);
        Array2::from_shape_fn((n, m), |(i, j)| rotated[[n - 1 - i, j]])
    }

    #[test]
    fn test_rejects_empty_volume() {
        let result = Volume::new(Array3::zeros((0, 4, 4)), (1.0, 1.0, 1.0));
        assert!(matches!(result, Err(VolumeError::EmptyVolume((0, 4, 4)))));
    }

    #[test]
    fn test_scalar_range() {
        let mut data = Array3::<i16>::zeros((3, 2, 5));
        data[[2, 1, 4]] = 1200;
        data[[0, 1, 0]] = -1024;
        let volume = Volume::new(data, (1.0, 1.0, 1.0)).unwrap();
        assert_eq!(volume.scalar_range(), (-1024, 1200));
    }

    #[test]
    fn test_out_of_range_slices_are_blank() {
        let data = Array3::from_elem((3, 5, 7), 9i16);
        let volume = Volume::new(data, (1.0, 1.0, 1.0)).unwrap();
        for (orientation, index, shape) in [
            (Orientation::Axial, 7, (3, 5)),
            (Orientation::Sagittal, 3, (7, 5)),
            (Orientation::Coronal, 5, (7, 3)),
            (Orientation::Axial, usize::MAX, (3, 5)),
        ] {
            let plane = volume.extract_slice(orientation, index);
            assert_eq!(plane.dim(), shape, "{orientation:?}");
            assert!(plane.iter().all(|&v| v == 0.0), "{orientation:?}");
        }
    }

    #[test]
    fn test_axial_slice_is_untransformed() {
        let volume = fixture();
        let plane = volume.extract_slice(Orientation::Axial, 2);
        for ((x, y), &v) in plane.indexed_iter() {
            assert_eq!(v, (16 * x + 4 * y + 2) as f32);
        }
    }

    #[test]
    fn test_sagittal_and_coronal_are_rotated_and_flipped() {
        let data = Array3::from_shape_fn((3, 4, 5), |(x, y, z)| (100 * x + 10 * y + z) as i16);
        let volume = Volume::new(data.clone(), (1.0, 1.0, 1.0)).unwrap();

        let raw = data.slice(s![1, .., ..]).mapv(f32::from);
        assert_eq!(
            volume.extract_slice(Orientation::Sagittal, 1),
            rot90_then_flipud(&raw)
        );

        let raw = data.slice(s![.., 2, ..]).mapv(f32::from);
        assert_eq!(
            volume.extract_slice(Orientation::Coronal, 2),
            rot90_then_flipud(&raw)
        );
    }

    #[test]
    fn test_projection_reductions() {
        let volume = fixture();

        let mip = volume.extract_projection(Orientation::Axial, Reduction::Max);
        let minip = volume.extract_projection(Orientation::Axial, Reduction::Min);
        let mean = volume.extract_projection(Orientation::Axial, Reduction::Mean);
        for x in 0..4 {
            for y in 0..4 {
                let base = (16 * x + 4 * y) as f32;
                assert_eq!(mip[[x, y]], base + 3.0);
                assert_eq!(minip[[x, y]], base);
                assert_eq!(mean[[x, y]], base + 1.5);
            }
        }

        // Sagittal reduces x; rows are z, columns are y
        let mip = volume.extract_projection(Orientation::Sagittal, Reduction::Max);
        let mean = volume.extract_projection(Orientation::Sagittal, Reduction::Mean);
        for z in 0..4 {
            for y in 0..4 {
                assert_eq!(mip[[z, y]], (48 + 4 * y + z) as f32);
                assert_eq!(mean[[z, y]], (24 + 4 * y + z) as f32);
            }
        }

        // Coronal reduces y; rows are z, columns are x
        let minip = volume.extract_projection(Orientation::Coronal, Reduction::Min);
        for z in 0..4 {
            for x in 0..4 {
                assert_eq!(minip[[z, x]], (16 * x + z) as f32);
            }
        }
    }

    #[test]
    fn test_to_display_matches_slice_layout() {
        let volume = fixture();
        let point = Vec3::new(1.0, 2.0, 3.0);
        for orientation in Orientation::ALL {
            let index = point[orientation.normal().index()] as usize;
            let plane = volume.extract_slice(orientation, index);
            let p = to_display(point, orientation);
            assert_eq!(plane[[p.y as usize, p.x as usize]], (16 + 8 + 3) as f32);
        }
    }
}
