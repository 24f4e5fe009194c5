//! Tile store behavior with a fake transport.
//!
//! The transport serves zip archives built on the fly, so these tests cover
//! the full fetch → extract → rename path without touching the network.

use dhmv_raster::{LayerKind, RasterError, TileRef, TileStore, Transport};
use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use zip::write::SimpleFileOptions;

/// Writes a zip archive containing a single named entry.
fn write_archive(dest: &Path, entry: &str, contents: &[u8]) -> dhmv_raster::Result<()> {
    let file = fs::File::create(dest)?;
    let mut writer = zip::ZipWriter::new(file);
    writer
        .start_file(entry, SimpleFileOptions::default())
        .expect("start zip entry");
    writer.write_all(contents)?;
    writer.finish().expect("finish zip");
    Ok(())
}

/// Fake transport that builds a valid archive for whatever tile is asked
/// for, counting how many times it is invoked.
struct ZipTransport {
    calls: Arc<AtomicUsize>,
    delay: Option<Duration>,
}

impl Transport for ZipTransport {
    fn fetch_to(&self, url: &str, dest: &Path) -> dhmv_raster::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            thread::sleep(delay);
        }
        let archive_name = url.rsplit('/').next().expect("url has a file name");
        let entry = archive_name.replace(".zip", ".tif");
        write_archive(dest, &entry, b"raster payload")
    }
}

/// Transport whose archives never contain the expected entry.
struct WrongEntryTransport;

impl Transport for WrongEntryTransport {
    fn fetch_to(&self, _url: &str, dest: &Path) -> dhmv_raster::Result<()> {
        write_archive(dest, "UNRELATED.txt", b"nothing useful")
    }
}

/// Transport that always fails, as a timed-out or refused connection would.
struct FailingTransport;

impl Transport for FailingTransport {
    fn fetch_to(&self, url: &str, _dest: &Path) -> dhmv_raster::Result<()> {
        Err(RasterError::FetchFailed {
            url: url.to_string(),
            reason: "connection timed out".to_string(),
        })
    }
}

/// Transport that takes a while and then fails, counting invocations.
struct SlowFailingTransport {
    calls: Arc<AtomicUsize>,
    delay: Duration,
}

impl Transport for SlowFailingTransport {
    fn fetch_to(&self, url: &str, _dest: &Path) -> dhmv_raster::Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        thread::sleep(self.delay);
        Err(RasterError::FetchFailed {
            url: url.to_string(),
            reason: "service unreachable".to_string(),
        })
    }
}

/// Transport that fails its first call and serves valid archives afterwards.
struct FlakyTransport {
    calls: Arc<AtomicUsize>,
}

impl Transport for FlakyTransport {
    fn fetch_to(&self, url: &str, dest: &Path) -> dhmv_raster::Result<()> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            return Err(RasterError::FetchFailed {
                url: url.to_string(),
                reason: "connection reset".to_string(),
            });
        }
        let archive_name = url.rsplit('/').next().expect("url has a file name");
        let entry = archive_name.replace(".zip", ".tif");
        write_archive(dest, &entry, b"raster payload")
    }
}

fn counting_store(delay: Option<Duration>) -> (TileStore, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let store = TileStore::new(Box::new(ZipTransport {
        calls: Arc::clone(&calls),
        delay,
    }));
    (store, calls)
}

#[test]
fn ensure_local_fetches_at_most_once() {
    let dir = tempfile::tempdir().expect("tempdir");
    let tile = TileRef::new(15, LayerKind::Terrain, "1m", "II", dir.path());
    let (store, calls) = counting_store(None);

    let first = store.ensure_local(&tile, true).expect("first fetch");
    assert_eq!(first, tile.local_path());
    assert!(tile.is_downloaded());
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // Second call is a no-op returning the same path.
    let second = store.ensure_local(&tile, true).expect("cached path");
    assert_eq!(second, first);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn missing_tile_without_fetch_reports_the_remote_url() {
    let dir = tempfile::tempdir().expect("tempdir");
    let tile = TileRef::new(23, LayerKind::Surface, "1m", "II", dir.path());
    let (store, calls) = counting_store(None);

    match store.ensure_local(&tile, false) {
        Err(RasterError::NotDownloaded { path, url }) => {
            assert_eq!(path, tile.local_path());
            assert_eq!(url, tile.download_url());
        }
        other => panic!("expected NotDownloaded, got {other:?}"),
    }
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn archive_without_the_expected_entry_fails_cleanly() {
    let dir = tempfile::tempdir().expect("tempdir");
    let tile = TileRef::new(15, LayerKind::Terrain, "1m", "II", dir.path());
    let store = TileStore::new(Box::new(WrongEntryTransport));

    match store.ensure_local(&tile, true) {
        Err(RasterError::FetchFailed { reason, .. }) => {
            assert!(reason.contains("DHMVIIDTMRAS1m_k15.tif"), "reason: {reason}");
        }
        other => panic!("expected FetchFailed, got {other:?}"),
    }

    // No partial or misnamed raster file may be left behind.
    assert!(!tile.local_path().exists());
    let leftovers: Vec<_> = fs::read_dir(dir.path())
        .expect("read dir")
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "tif"))
        .collect();
    assert!(leftovers.is_empty(), "stray rasters: {leftovers:?}");
}

#[test]
fn transport_failure_leaves_no_file_at_the_final_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    let tile = TileRef::new(15, LayerKind::Surface, "1m", "II", dir.path());
    let store = TileStore::new(Box::new(FailingTransport));

    match store.ensure_local(&tile, true) {
        Err(RasterError::FetchFailed { reason, .. }) => {
            assert!(reason.contains("timed out"));
        }
        other => panic!("expected FetchFailed, got {other:?}"),
    }
    assert!(!tile.local_path().exists());
}

#[test]
fn a_failed_fetch_is_retried_on_the_next_request() {
    let dir = tempfile::tempdir().expect("tempdir");
    let tile = TileRef::new(15, LayerKind::Terrain, "1m", "II", dir.path());
    let calls = Arc::new(AtomicUsize::new(0));
    let store = TileStore::new(Box::new(FlakyTransport {
        calls: Arc::clone(&calls),
    }));

    // First attempt fails and must not be remembered.
    assert!(matches!(
        store.ensure_local(&tile, true),
        Err(RasterError::FetchFailed { .. })
    ));
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // Second attempt invokes the transport again and succeeds.
    let path = store.ensure_local(&tile, true).expect("retried fetch");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(path.exists());
}

#[test]
fn an_externally_deleted_tile_is_fetched_again() {
    let dir = tempfile::tempdir().expect("tempdir");
    let tile = TileRef::new(15, LayerKind::Surface, "1m", "II", dir.path());
    let (store, calls) = counting_store(None);

    store.ensure_local(&tile, true).expect("first fetch");
    fs::remove_file(tile.local_path()).expect("delete tile");

    store.ensure_local(&tile, true).expect("refetch");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(tile.is_downloaded());
}

#[test]
fn an_unwritable_base_directory_fails_the_fetch() {
    let dir = tempfile::tempdir().expect("tempdir");
    // The base directory path is occupied by a plain file, so it can never
    // be created as a directory.
    let blocked = dir.path().join("blocked");
    fs::write(&blocked, b"in the way").expect("create blocker");

    let tile = TileRef::new(15, LayerKind::Terrain, "1m", "II", &blocked);
    let (store, _calls) = counting_store(None);

    match store.ensure_local(&tile, true) {
        Err(RasterError::FetchFailed { url, .. }) => {
            assert_eq!(url, tile.download_url());
        }
        other => panic!("expected FetchFailed, got {other:?}"),
    }
}

#[test]
fn concurrent_requests_for_the_same_tile_share_one_fetch() {
    let dir = tempfile::tempdir().expect("tempdir");
    let tile = TileRef::new(7, LayerKind::Terrain, "1m", "II", dir.path());
    let (store, calls) = counting_store(Some(Duration::from_millis(50)));

    thread::scope(|s| {
        let a = s.spawn(|| store.ensure_local(&tile, true));
        let b = s.spawn(|| store.ensure_local(&tile, true));
        let a = a.join().expect("thread a").expect("fetch a");
        let b = b.join().expect("thread b").expect("fetch b");
        assert_eq!(a, b);
    });

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(tile.is_downloaded());
}

#[test]
fn waiters_observe_the_owning_fetch_failure() {
    let dir = tempfile::tempdir().expect("tempdir");
    let tile = TileRef::new(7, LayerKind::Surface, "1m", "II", dir.path());
    let calls = Arc::new(AtomicUsize::new(0));
    let calls_in_transport = Arc::clone(&calls);
    let store = TileStore::new(Box::new(SlowFailingTransport {
        calls: calls_in_transport,
        delay: Duration::from_millis(50),
    }));

    thread::scope(|s| {
        let a = s.spawn(|| store.ensure_local(&tile, true));
        let b = s.spawn(|| store.ensure_local(&tile, true));
        for handle in [a, b] {
            match handle.join().expect("thread") {
                Err(RasterError::FetchFailed { reason, .. }) => {
                    assert!(reason.contains("unreachable"), "reason: {reason}");
                }
                other => panic!("expected FetchFailed, got {other:?}"),
            }
        }
    });

    // One request owned the fetch; the other mirrored its outcome.
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn complementary_tiles_fetch_independently() {
    let dir = tempfile::tempdir().expect("tempdir");
    let terrain = TileRef::new(15, LayerKind::Terrain, "1m", "II", dir.path());
    let surface = terrain.complement();
    let (store, calls) = counting_store(None);

    store.ensure_local(&terrain, true).expect("terrain");
    store.ensure_local(&surface, true).expect("surface");

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert!(terrain.is_downloaded());
    assert!(surface.is_downloaded());
}

#[test]
fn open_rejects_a_corrupt_raster() {
    let dir = tempfile::tempdir().expect("tempdir");
    let tile = TileRef::new(15, LayerKind::Terrain, "1m", "II", dir.path());
    let (store, _calls) = counting_store(None);

    // The fake archive entry is not a TIFF, so extraction succeeds but
    // decoding must fail.
    match store.open(&tile, true) {
        Err(RasterError::TiffDecode(_)) | Err(RasterError::InvalidRaster(_)) => {}
        other => panic!("expected a decode failure, got {other:?}"),
    }
}
