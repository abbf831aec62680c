//! Static resource loading.
//!
//! Each load is a two-stage task: [`issue_load`] starts the read and parse on
//! the rayon pool and returns a [`LoadHandle`]; the event loop polls
//! [`LoadHandle::try_complete`] once per frame. Loads are independent, so a
//! failure in one never affects another.

mod cities;
mod outline;
mod states;

pub use cities::{parse_cities, to_point_collection, to_point_feature, CityRecord, PointCollection, PointFeature, Scalar};
pub use outline::{load_outline, simple_us_outline};
pub use states::{parse_states, StateFeature};

use crate::error::{CoercionError, LoadError};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};

/// Parsed state file: accepted features plus the ones that were dropped.
pub type StateLoad = (Vec<StateFeature>, Vec<CoercionError>);

/// Pending result of one resource load.
pub struct LoadHandle<T> {
    path: PathBuf,
    rx: Receiver<Result<T, LoadError>>,
}

impl<T> LoadHandle<T> {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Non-blocking poll. `None` while the load is still running.
    pub fn try_complete(&self) -> Option<Result<T, LoadError>> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(LoadError::Disconnected(self.path.clone()))),
        }
    }

    /// Block until the load finishes.
    pub fn wait(self) -> Result<T, LoadError> {
        self.rx
            .recv()
            .unwrap_or_else(|_| Err(LoadError::Disconnected(self.path)))
    }
}

/// Read `path` and hand the bytes to `parse` on a worker thread.
pub fn issue_load<T, F>(path: impl Into<PathBuf>, parse: F) -> LoadHandle<T>
where
    T: Send + 'static,
    F: FnOnce(Vec<u8>) -> Result<T, LoadError> + Send + 'static,
{
    let path = path.into();
    let (tx, rx) = mpsc::channel();
    let worker_path = path.clone();

    rayon::spawn(move || {
        tracing::debug!(path = ?worker_path, "loading");
        let result = fs::read(&worker_path)
            .map_err(|source| LoadError::Io {
                path: worker_path.clone(),
                source,
            })
            .and_then(parse);
        // Receiver may already be gone if the app quit mid-load.
        let _ = tx.send(result);
    });

    LoadHandle { path, rx }
}

/// Start loading the city array.
pub fn load_cities(path: impl Into<PathBuf>) -> LoadHandle<Vec<CityRecord>> {
    issue_load(path, |mut bytes| parse_cities(&mut bytes))
}

/// Start loading the state polygons.
pub fn load_states(path: impl Into<PathBuf>) -> LoadHandle<StateLoad> {
    issue_load(path, |bytes| {
        let text = String::from_utf8(bytes)?;
        parse_states(&text)
    })
}
