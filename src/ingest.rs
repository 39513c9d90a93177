//! Realtime needle-position ingest.
//!
//! A worker thread polls a [`PointSource`] and hands new points to a
//! [`PointSink`]. The sink appends to the shared [`PathBuffer`] and posts a
//! [`RedrawRequest`]; neither step ever blocks on the viewer. The UI thread
//! owns the [`IngestReceiver`] and a [`Debouncer`], and drains the buffer
//! when the debounce deadline passes.

use std::{
    fs::File,
    io::{self, BufRead, BufReader, Seek, SeekFrom},
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread::{self, JoinHandle},
    time::Duration,
};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};
use glam::Vec3;
use parking_lot::Mutex;
use web_time::Instant;

use crate::points::parse_record;

/// Append-only hand-off buffer between the ingest worker and the UI thread.
#[derive(Debug, Default)]
pub struct PathBuffer {
    pending: Mutex<Vec<Vec3>>,
}

impl PathBuffer {
    pub fn append(&self, points: &[Vec3]) {
        self.pending.lock().extend_from_slice(points);
    }

    /// Take everything appended since the last drain, in arrival order.
    pub fn drain(&self) -> Vec<Vec3> {
        std::mem::take(&mut *self.pending.lock())
    }

    pub fn pending_len(&self) -> usize {
        self.pending.lock().len()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RedrawRequest;

/// Producer-side endpoint, cheap to clone into any thread.
#[derive(Clone, Debug)]
pub struct PointSink {
    buffer: Arc<PathBuffer>,
    redraw: Sender<RedrawRequest>,
}

impl PointSink {
    /// Append `points` and post a redraw. Fire-and-forget.
    pub fn on_points_appended(&self, points: &[Vec3]) {
        if points.is_empty() {
            return;
        }
        self.buffer.append(points);
        // A closed channel only means the viewer is gone
        let _ = self.redraw.send(RedrawRequest);
    }
}

/// UI-side endpoint.
#[derive(Debug)]
pub struct IngestReceiver {
    buffer: Arc<PathBuffer>,
    redraw: Receiver<RedrawRequest>,
}

impl IngestReceiver {
    /// Number of redraw requests posted since the last call.
    pub fn take_signals(&self) -> usize {
        self.redraw.try_iter().count()
    }

    pub fn drain_points(&self) -> Vec<Vec3> {
        self.buffer.drain()
    }

    /// Drop queued points and requests without applying them.
    pub fn discard_pending(&self) {
        self.buffer.drain();
        self.take_signals();
    }

    pub fn pending_len(&self) -> usize {
        self.buffer.pending_len()
    }
}

pub fn channel() -> (PointSink, IngestReceiver) {
    let buffer = Arc::new(PathBuffer::default());
    let (tx, rx) = unbounded();
    (
        PointSink {
            buffer: Arc::clone(&buffer),
            redraw: tx,
        },
        IngestReceiver { buffer, redraw: rx },
    )
}

/// Something that yields newly available points each time it is polled.
pub trait PointSource: Send + 'static {
    /// Return the points that appeared since the previous poll.
    fn poll(&mut self) -> io::Result<Vec<Vec3>>;
}

struct Worker {
    cancel: Arc<AtomicBool>,
    wake: Sender<()>,
    handle: JoinHandle<()>,
}

/// Owns the ingest worker thread.
pub struct RealtimeIngest {
    sink: PointSink,
    poll_interval: Duration,
    worker: Option<Worker>,
}

impl RealtimeIngest {
    pub fn new(sink: PointSink, poll_interval: Duration) -> Self {
        Self {
            sink,
            poll_interval,
            worker: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    pub fn sink(&self) -> PointSink {
        self.sink.clone()
    }

    /// Start polling `source` on a worker thread. Returns `false` if a worker
    /// is already running or the thread could not be spawned.
    pub fn start(&mut self, mut source: impl PointSource) -> bool {
        if self.worker.is_some() {
            log::warn!("realtime ingest already running");
            return false;
        }
        let cancel = Arc::new(AtomicBool::new(false));
        let (wake, sleep) = unbounded::<()>();
        let sink = self.sink.clone();
        let interval = self.poll_interval;
        let flag = Arc::clone(&cancel);

        let spawned = thread::Builder::new()
            .name("point-ingest".into())
            .spawn(move || {
                loop {
                    if flag.load(Ordering::Acquire) {
                        break;
                    }
                    match source.poll() {
                        Ok(points) => sink.on_points_appended(&points),
                        Err(err) => log::warn!("point source poll failed: {err}"),
                    }
                    match sleep.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => continue,
                        _ => break,
                    }
                }
                log::debug!("point ingest worker exiting");
            });

        match spawned {
            Ok(handle) => {
                log::info!("started realtime ingest");
                self.worker = Some(Worker {
                    cancel,
                    wake,
                    handle,
                });
                true
            }
            Err(err) => {
                log::error!("failed to spawn ingest worker: {err}");
                false
            }
        }
    }

    /// Stop the worker and wait for it to exit. Safe to call at any time.
    pub fn stop(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        worker.cancel.store(true, Ordering::Release);
        let _ = worker.wake.send(());
        if worker.handle.join().is_err() {
            log::error!("ingest worker panicked");
        }
        log::info!("stopped realtime ingest");
    }
}

impl Drop for RealtimeIngest {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Single-shot redraw timer.
///
/// The first signal arms a deadline `window` ahead; further signals while it
/// is armed change nothing, so a burst collapses into one redraw.
#[derive(Clone, Debug)]
pub struct Debouncer {
    window: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
        }
    }

    pub fn signal(&mut self, now: Instant) {
        if self.deadline.is_none() {
            self.deadline = Some(now + self.window);
        }
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// `true` exactly once per armed deadline, when `now` has reached it.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }
}

/// Follows a CSV file that another process keeps appending `x,y,z` rows to.
///
/// Only newline-terminated rows are consumed; a partially written last row is
/// picked up on a later poll. Malformed rows are logged and skipped. If the
/// file shrinks it is read again from the start.
#[derive(Debug)]
pub struct CsvPointSource {
    path: PathBuf,
    offset: u64,
    line: usize,
}

impl CsvPointSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            offset: 0,
            line: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rows consumed so far, good or bad.
    pub fn rows_consumed(&self) -> usize {
        self.line
    }
}

impl PointSource for CsvPointSource {
    fn poll(&mut self) -> io::Result<Vec<Vec3>> {
        let mut file = File::open(&self.path)?;
        if file.metadata()?.len() < self.offset {
            log::info!("{} was truncated, re-reading", self.path.display());
            self.offset = 0;
            self.line = 0;
        }
        file.seek(SeekFrom::Start(self.offset))?;
        let mut reader = BufReader::new(file);

        let mut points = Vec::new();
        let mut row = Vec::new();
        loop {
            row.clear();
            let read = reader.read_until(b'\n', &mut row)?;
            if read == 0 || row.last() != Some(&b'\n') {
                break;
            }
            self.offset += read as u64;
            self.line += 1;
            match parse_record(&String::from_utf8_lossy(&row), self.line) {
                Ok(Some(point)) => points.push(point),
                Ok(None) => {}
                Err(err) => log::warn!("{}: skipping record, {err}", self.path.display()),
            }
        }
        Ok(points)
    }
}
