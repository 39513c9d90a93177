use std::{
    error::Error,
    path::PathBuf,
    thread,
    time::Duration,
};

use clap::{Parser, ValueEnum};
use ndarray::Array3;
use puncture_view::{
    CanvasSize, ProjectionMode, SlotId, SortBy, Viewer, ViewerConfig, Volume, VolumeLoader,
    ingest::CsvPointSource, render,
};
use web_time::Instant;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Mode {
    Slice,
    Mip,
    Minip,
    Average,
}

impl From<Mode> for ProjectionMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Slice => ProjectionMode::Slice,
            Mode::Mip => ProjectionMode::Mip,
            Mode::Minip => ProjectionMode::MinIp,
            Mode::Average => ProjectionMode::Average,
        }
    }
}

/// Slice stacking order for DICOM directories.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum Sort {
    Position,
    Table,
    Instance,
    None,
}

impl From<Sort> for SortBy {
    fn from(sort: Sort) -> Self {
        match sort {
            Sort::Position => SortBy::ImagePositionPatient,
            Sort::Table => SortBy::TablePosition,
            Sort::Instance => SortBy::InstanceNumber,
            Sort::None => SortBy::None,
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Render the three puncture planning views to PNG")]
struct Args {
    /// Directory of single-frame .dcm files
    #[arg(short, long, required_unless_present = "synthetic")]
    dicom: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Sort::Position)]
    sort: Sort,

    /// Use a generated phantom instead of a scan
    #[arg(long, conflicts_with = "dicom")]
    synthetic: bool,

    /// CSV with the needle start and end points
    #[arg(short, long)]
    plan: Option<PathBuf>,

    /// CSV file followed for realtime needle points
    #[arg(short, long)]
    stream: Option<PathBuf>,

    /// How long to follow the stream
    #[arg(long, default_value_t = 2)]
    stream_secs: u64,

    /// Viewer settings as JSON
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(short, long, value_enum, default_value_t = Mode::Slice)]
    mode: Mode,

    #[arg(long, default_value_t = 1.0)]
    zoom: f32,

    /// Output directory
    #[arg(short, long, default_value = ".")]
    out: PathBuf,

    /// Canvas edge length in pixels
    #[arg(long, default_value_t = 512)]
    size: u32,
}

/// Soft-tissue background with a dense sphere in the middle.
fn phantom(n: usize) -> Result<Volume, Box<dyn Error>> {
    let c = n as f32 / 2.0;
    let r = n as f32 / 4.0;
    let data = Array3::from_shape_fn((n, n, n), |(x, y, z)| {
        let d = ((x as f32 - c).powi(2) + (y as f32 - c).powi(2) + (z as f32 - c).powi(2)).sqrt();
        if d < r { 800 } else { 40 }
    });
    Ok(Volume::new(data, (1.0, 1.0, 1.0))?)
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => ViewerConfig::from_json_file(path)?,
        None => ViewerConfig::default(),
    };
    let volume = match &args.dicom {
        Some(dir) => VolumeLoader::load_from_directory(dir, args.sort.into())?,
        None => phantom(128)?,
    };

    let mut viewer = Viewer::new(config)?;
    viewer.load_volume(volume);
    viewer.set_projection_mode(args.mode.into());
    for slot in SlotId::ALL {
        viewer.set_zoom(slot, args.zoom);
    }
    if let Some(plan) = &args.plan {
        viewer.load_plan_file(plan)?;
    }

    if let Some(stream) = &args.stream {
        viewer.start_realtime(CsvPointSource::new(stream));
        let until = Instant::now() + Duration::from_secs(args.stream_secs);
        while Instant::now() < until {
            viewer.tick(Instant::now());
            thread::sleep(viewer.config().debounce());
        }
        viewer.stop_realtime();
        log::info!("followed {} realtime points", viewer.overlays().path().len());
    }

    let edge = args.size as f32;
    let frames = viewer.render_all([CanvasSize::new(edge, edge); 3]);
    for frame in &frames {
        let name = format!(
            "view{}-{}.png",
            frame.slot.index() + 1,
            format!("{:?}", frame.orientation).to_lowercase()
        );
        let path = args.out.join(name);
        render::compose(frame).save(&path)?;
        log::info!("wrote {}", path.display());
    }
    Ok(())
}
