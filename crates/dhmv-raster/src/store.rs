//! Local tile store with on-demand archive fetching.
//!
//! The DHMV download service serves each raster as a zip archive containing
//! a single GeoTIFF. [`TileStore`] guarantees that the extracted GeoTIFF for
//! a [`TileRef`] is present locally, fetching and unpacking the archive when
//! permitted.
//!
//! ## Thread safety
//!
//! `ensure_local` may be called concurrently for different tiles; two
//! requests for the *same* destination path coordinate through a per-path
//! fetch slot so only one performs the fetch while the others wait for its
//! outcome. The slot is removed once the fetch finishes, so a later request
//! never observes a stale outcome and a failed fetch can simply be retried.
//! Extracted files are written to a temporary sibling and renamed into
//! place, so a failed or interrupted fetch never leaves a partial file at
//! the final path.

use crate::{RasterError, RasterGrid, Result, TileRef};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;
use tracing::{debug, info};

/// Capability to stream the bytes behind a URL into a local file.
///
/// The store never probes for a concrete download tool; callers decide which
/// transport to use once, at construction time.
pub trait Transport: Send + Sync {
    /// Fetch `url` and write its body to `dest`, replacing any existing
    /// file. Every failure, including local write errors, is reported as
    /// [`RasterError::FetchFailed`].
    fn fetch_to(&self, url: &str, dest: &Path) -> Result<()>;
}

/// HTTP transport backed by a blocking reqwest client.
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    /// Create a transport with a 60 second request timeout.
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn fetch_to(&self, url: &str, dest: &Path) -> Result<()> {
        let fetch_failed = |reason: String| RasterError::FetchFailed {
            url: url.to_string(),
            reason,
        };

        let mut response = self
            .client
            .get(url)
            .send()
            .map_err(|e| fetch_failed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(fetch_failed(format!("HTTP {}", response.status())));
        }

        let mut file =
            fs::File::create(dest).map_err(|e| fetch_failed(format!("writing archive: {e}")))?;
        response
            .copy_to(&mut file)
            .map_err(|e| fetch_failed(e.to_string()))?;
        Ok(())
    }
}

/// Outcome slot for one in-flight fetch. The owning request fills it in and
/// wakes the waiters; the store drops its reference when the fetch ends.
struct FetchSlot {
    outcome: Mutex<Option<std::result::Result<(), String>>>,
    done: Condvar,
}

impl FetchSlot {
    fn new() -> Self {
        Self {
            outcome: Mutex::new(None),
            done: Condvar::new(),
        }
    }
}

/// Store that makes raster tiles locally available.
pub struct TileStore {
    transport: Box<dyn Transport>,
    /// Fetches currently in flight, keyed by destination path.
    in_flight: Mutex<HashMap<PathBuf, Arc<FetchSlot>>>,
}

impl std::fmt::Debug for TileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileStore").finish_non_exhaustive()
    }
}

impl TileStore {
    /// Create a store using the given transport.
    pub fn new(transport: Box<dyn Transport>) -> Self {
        Self {
            transport,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Create a store with the default HTTP transport.
    pub fn with_http_transport() -> Result<Self> {
        Ok(Self::new(Box::new(HttpTransport::new()?)))
    }

    /// Make the GeoTIFF for `tile` available locally and return its path.
    ///
    /// If the file already exists this returns immediately, so calling twice
    /// performs network I/O at most once. With `allow_fetch` disabled a
    /// missing file fails with [`RasterError::NotDownloaded`], carrying the
    /// URL the caller could fetch instead. A failed fetch is not remembered:
    /// the next call invokes the transport again.
    pub fn ensure_local(&self, tile: &TileRef, allow_fetch: bool) -> Result<PathBuf> {
        let path = tile.local_path();

        // Fast path: already extracted.
        if path.exists() {
            return Ok(path);
        }

        if !allow_fetch {
            return Err(RasterError::NotDownloaded {
                path,
                url: tile.download_url(),
            });
        }

        // Join an in-flight fetch for this destination or own a new one.
        let slot = {
            let mut tracker = self
                .in_flight
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if let Some(slot) = tracker.get(&path) {
                let slot = Arc::clone(slot);
                drop(tracker);
                return self.wait_for_fetch(tile, path, &slot);
            }
            // May have been fetched while we took the lock.
            if path.exists() {
                return Ok(path);
            }
            let slot = Arc::new(FetchSlot::new());
            tracker.insert(path.clone(), Arc::clone(&slot));
            slot
        };

        // This request owns the fetch; others can fetch different tiles.
        let result = self.fetch_and_extract(tile, &path);

        {
            let mut tracker = self
                .in_flight
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            tracker.remove(&path);
        }
        let summary = result.as_ref().map(|_| ()).map_err(|e| e.to_string());
        *slot
            .outcome
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(summary);
        slot.done.notify_all();

        result
    }

    /// Block until the owning request finishes, then mirror its outcome.
    fn wait_for_fetch(&self, tile: &TileRef, path: PathBuf, slot: &FetchSlot) -> Result<PathBuf> {
        let mut outcome = slot
            .outcome
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        loop {
            match &*outcome {
                Some(Ok(())) => return Ok(path),
                Some(Err(reason)) => {
                    return Err(RasterError::FetchFailed {
                        url: tile.download_url(),
                        reason: reason.clone(),
                    })
                }
                None => {
                    outcome = slot
                        .done
                        .wait(outcome)
                        .unwrap_or_else(|poisoned| poisoned.into_inner());
                }
            }
        }
    }

    /// Open the raster for `tile`, fetching it first if needed.
    pub fn open(&self, tile: &TileRef, allow_fetch: bool) -> Result<RasterGrid> {
        let path = self.ensure_local(tile, allow_fetch)?;
        RasterGrid::from_file(path)
    }

    /// Download the zip archive for `tile` and extract the expected GeoTIFF
    /// entry to `dest`. Every failure on this path, including local I/O,
    /// reports as [`RasterError::FetchFailed`] with the archive URL.
    fn fetch_and_extract(&self, tile: &TileRef, dest: &Path) -> Result<PathBuf> {
        let url = tile.download_url();
        let entry_name = tile.file_name(".tif");

        let fetch_failed = |reason: String| RasterError::FetchFailed {
            url: url.clone(),
            reason,
        };

        let parent = match dest.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)
            .map_err(|e| fetch_failed(format!("creating {}: {e}", parent.display())))?;

        debug!(%url, "fetching raster archive");
        let archive = tempfile::Builder::new()
            .prefix(&tile.file_name("-"))
            .suffix(".zip")
            .tempfile_in(parent)
            .map_err(|e| fetch_failed(format!("creating archive tempfile: {e}")))?;
        self.transport.fetch_to(&url, archive.path())?;

        let reopened = archive
            .reopen()
            .map_err(|e| fetch_failed(format!("reading archive: {e}")))?;
        let mut zip = zip::ZipArchive::new(reopened)
            .map_err(|e| fetch_failed(format!("invalid archive: {e}")))?;
        let mut entry = zip
            .by_name(&entry_name)
            .map_err(|_| fetch_failed(format!("archive does not contain {entry_name}")))?;

        // Extract next to the destination, then rename into place so a
        // partial write never shows up at the final path.
        let mut extracted = tempfile::NamedTempFile::new_in(parent)
            .map_err(|e| fetch_failed(format!("creating raster tempfile: {e}")))?;
        io::copy(&mut entry, extracted.as_file_mut())
            .map_err(|e| fetch_failed(format!("extracting {entry_name}: {e}")))?;
        extracted
            .persist(dest)
            .map_err(|e| fetch_failed(format!("moving raster into place: {}", e.error)))?;

        info!(path = %dest.display(), "raster tile ready");
        Ok(dest.to_path_buf())
    }
}
