use crate::StreamError;
use haunt_assets::{AssetError, ModelData, TextureData, TextureId, load_model, load_texture};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// Decodes asset files. Runs on the loader thread.
pub trait AssetLoader: Send + 'static {
    fn load_texture(&self, path: &Path) -> Result<TextureData, AssetError>;
    fn load_model(&self, path: &Path) -> Result<ModelData, AssetError>;
}

/// Loads from the filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileLoader;

impl AssetLoader for FileLoader {
    fn load_texture(&self, path: &Path) -> Result<TextureData, AssetError> {
        load_texture(path)
    }

    fn load_model(&self, path: &Path) -> Result<ModelData, AssetError> {
        load_model(path)
    }
}

/// Work sent to the loader thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadRequest {
    Texture { id: TextureId, path: PathBuf },
    Model { key: String, path: PathBuf },
}

/// A finished load, successful or not.
#[derive(Debug)]
pub enum LoadEvent {
    Texture {
        id: TextureId,
        path: PathBuf,
        result: Result<TextureData, AssetError>,
    },
    Model {
        key: String,
        path: PathBuf,
        result: Result<ModelData, AssetError>,
    },
}

impl LoadEvent {
    pub fn path(&self) -> &Path {
        match self {
            LoadEvent::Texture { path, .. } | LoadEvent::Model { path, .. } => path,
        }
    }

    pub fn is_ok(&self) -> bool {
        match self {
            LoadEvent::Texture { result, .. } => result.is_ok(),
            LoadEvent::Model { result, .. } => result.is_ok(),
        }
    }
}

/// Owns the loader thread and both ends of its channels.
///
/// Requests are processed in order on one worker. Dropping the streamer
/// closes the request channel; the worker finishes its current item and
/// exits without touching the rest of the queue.
pub struct AssetStreamer {
    requests: Option<Sender<LoadRequest>>,
    events: Receiver<LoadEvent>,
    shutdown: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
    in_flight: usize,
}

impl AssetStreamer {
    pub fn spawn() -> Result<Self, StreamError> {
        Self::with_loader(FileLoader)
    }

    pub fn with_loader(loader: impl AssetLoader) -> Result<Self, StreamError> {
        let (request_tx, request_rx) = mpsc::channel::<LoadRequest>();
        let (event_tx, event_rx) = mpsc::channel::<LoadEvent>();
        let shutdown = Arc::new(AtomicBool::new(false));

        let stop = Arc::clone(&shutdown);
        let worker = std::thread::Builder::new()
            .name("asset-loader".into())
            .spawn(move || worker_loop(loader, request_rx, event_tx, &stop))
            .map_err(StreamError::Spawn)?;

        Ok(Self {
            requests: Some(request_tx),
            events: event_rx,
            shutdown,
            worker: Some(worker),
            in_flight: 0,
        })
    }

    pub fn request(&mut self, request: LoadRequest) -> Result<(), StreamError> {
        let sender = self.requests.as_ref().ok_or(StreamError::Disconnected)?;
        sender
            .send(request)
            .map_err(|_| StreamError::Disconnected)?;
        self.in_flight += 1;
        Ok(())
    }

    /// Completed loads, without blocking.
    pub fn poll(&mut self) -> Vec<LoadEvent> {
        let events: Vec<LoadEvent> = self.events.try_iter().collect();
        self.in_flight = self.in_flight.saturating_sub(events.len());
        events
    }

    /// Block until every outstanding request has finished or `timeout` passes.
    pub fn wait_all(&mut self, timeout: Duration) -> Vec<LoadEvent> {
        let deadline = Instant::now() + timeout;
        let mut events = Vec::new();
        while self.in_flight > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.events.recv_timeout(remaining) {
                Ok(event) => {
                    self.in_flight -= 1;
                    events.push(event);
                }
                Err(RecvTimeoutError::Timeout) => {
                    tracing::warn!("{} loads still pending after {:?}", self.in_flight, timeout);
                    break;
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        events
    }

    /// Requests sent but not yet returned by `poll`.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }
}

impl Drop for AssetStreamer {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        self.requests.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::error!("asset loader thread panicked");
            }
        }
    }
}

fn worker_loop(
    loader: impl AssetLoader,
    requests: Receiver<LoadRequest>,
    events: Sender<LoadEvent>,
    shutdown: &AtomicBool,
) {
    tracing::debug!("asset loader started");
    for request in requests {
        if shutdown.load(Ordering::Acquire) {
            break;
        }
        let event = match request {
            LoadRequest::Texture { id, path } => {
                let result = loader.load_texture(&path);
                LoadEvent::Texture { id, path, result }
            }
            LoadRequest::Model { key, path } => {
                let result = loader.load_model(&path);
                LoadEvent::Model { key, path, result }
            }
        };
        if let Err(err) = event_error(&event) {
            tracing::warn!("failed to load {}: {err}", event.path().display());
        } else {
            tracing::debug!("loaded {}", event.path().display());
        }
        if events.send(event).is_err() {
            break;
        }
    }
    tracing::debug!("asset loader stopped");
}

fn event_error(event: &LoadEvent) -> Result<(), &AssetError> {
    match event {
        LoadEvent::Texture { result, .. } => result.as_ref().map(|_| ()),
        LoadEvent::Model { result, .. } => result.as_ref().map(|_| ()),
    }
}
