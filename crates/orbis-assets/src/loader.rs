//! Asynchronous raster loading with a worker pool.
//!
//! Decoding happens off the render thread; completed loads are delivered
//! through a bounded channel and drained once per render cycle. Each distinct
//! source key decodes at most once: results are cached, failures are
//! remembered so a bad source does not retry every cycle.

use std::path::PathBuf;
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, bounded};
use dashmap::DashMap;
use orbis_raster::{Raster, RasterError};

/// Errors produced by a load request.
#[derive(Debug, Clone, thiserror::Error)]
pub enum LoadError {
    /// The source could not be read or decoded.
    #[error("failed to load raster \"{key}\": {message}")]
    Failed { key: String, message: String },
}

/// The state of a requested source key.
#[derive(Debug, Clone)]
pub enum LoadState {
    /// Decoded and cached; usable immediately.
    Ready(Arc<Raster>),
    /// Queued or decoding on a worker; a later drain will deliver it.
    Pending,
    /// A previous attempt failed; the source will not be retried.
    Failed,
}

/// A completed load, delivered by [`RasterLoader::drain`].
#[derive(Debug)]
pub struct LoadResult {
    /// The source key the request was submitted under.
    pub key: String,
    /// The decoded raster, or the decode failure.
    pub result: Result<Arc<Raster>, LoadError>,
}

struct LoadTask {
    key: String,
    path: PathBuf,
}

/// Loads and caches decoded rasters, keyed by source string.
///
/// In-memory rasters register through [`RasterLoader::insert_memory`] and
/// resolve synchronously; path sources decode on worker threads.
pub struct RasterLoader {
    cache: Arc<DashMap<String, Arc<Raster>>>,
    failed: Arc<DashMap<String, ()>>,
    in_flight: Arc<DashMap<String, ()>>,
    task_sender: Sender<LoadTask>,
    result_receiver: Receiver<LoadResult>,
}

impl RasterLoader {
    /// Create a loader with the given worker thread count and completion
    /// channel capacity.
    ///
    /// A loader with zero workers never completes a path load on its own;
    /// requests stay pending until the raster is registered through
    /// [`RasterLoader::insert_memory`]. Tests use this to step load
    /// completion deterministically.
    pub fn new(thread_count: usize, result_capacity: usize) -> Self {
        let (task_sender, task_receiver) = bounded::<LoadTask>(result_capacity * 2);
        let (result_sender, result_receiver) = bounded::<LoadResult>(result_capacity);
        let cache: Arc<DashMap<String, Arc<Raster>>> = Arc::new(DashMap::new());

        for _ in 0..thread_count {
            let receiver = task_receiver.clone();
            let sender = result_sender.clone();
            let cache = Arc::clone(&cache);

            std::thread::Builder::new()
                .name("raster-load-worker".into())
                .spawn(move || {
                    while let Ok(task) = receiver.recv() {
                        let result = decode_task(&task).map(|raster| {
                            let raster = Arc::new(raster);
                            cache.insert(task.key.clone(), Arc::clone(&raster));
                            raster
                        });
                        let _ = sender.send(LoadResult {
                            key: task.key,
                            result,
                        });
                    }
                })
                .expect("failed to spawn raster load worker thread");
        }

        Self {
            cache,
            failed: Arc::new(DashMap::new()),
            in_flight: Arc::new(DashMap::new()),
            task_sender,
            result_receiver,
        }
    }

    /// Create a loader with a thread count derived from the CPU count,
    /// leaving headroom for the render thread.
    pub fn with_defaults() -> Self {
        let cpus = num_cpus::get().max(2);
        Self::new((cpus - 1).min(4), 64)
    }

    /// Register a pre-decoded raster under a key. Subsequent requests for
    /// the key resolve synchronously.
    pub fn insert_memory(&self, key: impl Into<String>, raster: Arc<Raster>) {
        let key = key.into();
        self.failed.remove(&key);
        self.cache.insert(key, raster);
    }

    /// Look up a key in the cache without triggering a load.
    pub fn get(&self, key: &str) -> Option<Arc<Raster>> {
        self.cache.get(key).map(|entry| Arc::clone(&entry))
    }

    /// Request a source key, submitting a background decode if it is neither
    /// cached, failed, nor already in flight.
    pub fn request(&self, key: &str) -> LoadState {
        if let Some(raster) = self.get(key) {
            return LoadState::Ready(raster);
        }
        if self.failed.contains_key(key) {
            return LoadState::Failed;
        }
        if self.in_flight.contains_key(key) {
            return LoadState::Pending;
        }

        self.in_flight.insert(key.to_string(), ());
        let task = LoadTask {
            key: key.to_string(),
            path: PathBuf::from(key),
        };
        if self.task_sender.try_send(task).is_err() {
            // Queue full: drop the reservation and let a later cycle retry.
            self.in_flight.remove(key);
        }
        LoadState::Pending
    }

    /// Drain all completed loads. Call once per render cycle on the render
    /// thread; returned results have already been folded into the cache.
    pub fn drain(&self) -> Vec<LoadResult> {
        let mut results = Vec::new();
        while let Ok(result) = self.result_receiver.try_recv() {
            self.in_flight.remove(&result.key);
            if let Err(err) = &result.result {
                tracing::warn!("{err}; keeping placeholder");
                self.failed.insert(result.key.clone(), ());
            }
            results.push(result);
        }
        results
    }

    /// Number of loads currently queued or decoding.
    pub fn in_flight_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Number of completed loads waiting to be drained.
    pub fn completed_count(&self) -> usize {
        self.result_receiver.len()
    }
}

fn decode_task(task: &LoadTask) -> Result<Raster, LoadError> {
    Raster::open(&task.path).map_err(|err: RasterError| LoadError::Failed {
        key: task.key.clone(),
        message: err.to_string(),
    })
}
