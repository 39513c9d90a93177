//! # Puncture-view library
//!
//! This crate is the headless core of a CT-guided puncture planning viewer.
//! It holds one CT volume and drives three synchronized 2D views of it, each
//! showing an axial, sagittal or coronal cut through a shared cursor, or a
//! whole-volume intensity projection.
//!
//! On top of the image the views carry two needle overlays:
//!  - the planned trajectory, a start and an end point loaded from CSV
//!  - the realtime path, streamed point by point from a tracking source
//!
//! Each view zooms and pans on its own and can be locked to freeze its
//! image. Overlays are kept in volume coordinates and projected per frame,
//! so they stay registered with the voxels under any zoom or pan.
//!
//! Volumes are loaded from a folder of single-frame ".dcm" files, which are
//! opened in parallel using rayon. DICOM files are assumed to have the
//! following attributes:
//!   - Axial data set
//!   - No multiframe (always the first frame is used)
//!   - Images from the same series (Series Instance UID) and acquisition
//!     (Acquisition Number)
//!
//! The crate never draws to a window itself. A presentation shell implements
//! [`RenderTarget`] and calls [`Viewer::present`], or rasterizes frames with
//! [`render::compose`].
//!
//! # Examples
//!
//! ## Viewing a scan with a needle plan
//!
//! Load all DICOM files from the dicom/ directory, ordered by their image
//! position, add a plan and write the first view to disk.
//!
//! ```no_run
//! # use puncture_view::{CanvasSize, SlotId, SortBy, Viewer, ViewerConfig, VolumeLoader, render};
//! let volume = VolumeLoader::load_from_directory("dicom", SortBy::ImagePositionPatient)
//!     .expect("should have loaded files from directory");
//! let mut viewer = Viewer::new(ViewerConfig::default()).expect("default config is valid");
//! viewer.load_volume(volume);
//! viewer
//!     .load_plan_file("plan.csv")
//!     .expect("should have read the plan");
//! viewer.zoom_in(SlotId::First);
//!
//! let frame = viewer.render(SlotId::First, CanvasSize::new(512.0, 512.0));
//! render::compose(&frame).save("axial.png").expect("should have saved the view");
//! ```

pub mod config;
pub mod enums;
pub mod error;
pub mod ingest;
pub mod overlay;
pub mod points;
pub mod projector;
pub mod render;
pub mod view_state;
pub mod viewer;
pub mod volume;
pub mod volume_loader;

pub use config::ViewerConfig;
pub use enums::{Axis, Orientation, ProjectionMode, SlotId, SortBy};
pub use render::{RenderTarget, SlotFrame};
pub use view_state::CanvasSize;
pub use viewer::Viewer;
pub use volume::Volume;
pub use volume_loader::VolumeLoader;
