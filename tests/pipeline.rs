//! End-to-end runs of the generation pipeline against real JPEGs.
//!
//! These use the production backend, so they exercise decoding, resizing,
//! JPEG encoding and the on-disk cache together. Video is left to the
//! ignored ffmpeg tests in the library.

use purtypics::config::GalleryConfig;
use purtypics::generate::{GenerateError, Generator, generate};
use purtypics::imaging::NativeBackend;
use purtypics::progress::{JobStatus, ProgressEvent, ProgressTracker};
use purtypics::render::{MANIFEST_FILENAME, ManifestRenderer};
use std::fs::{self, File};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

fn write_jpeg(path: &Path, width: u32, height: u32) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 90])
    });
    img.save_with_format(path, image::ImageFormat::Jpeg).unwrap();
}

fn set_mtime(path: &Path, when: SystemTime) {
    File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(when)
        .unwrap();
}

/// `tmp/src/Trip_One/{a,b,c}.jpg` at 900x600, backdated a minute.
fn trip_one() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let album = tmp.path().join("src/Trip_One");
    let past = SystemTime::now() - Duration::from_secs(60);
    for name in ["a.jpg", "b.jpg", "c.jpg"] {
        write_jpeg(&album.join(name), 900, 600);
        set_mtime(&album.join(name), past);
    }
    fs::create_dir_all(tmp.path().join("src/empty_dir")).unwrap();
    fs::write(tmp.path().join("src/empty_dir/notes.txt"), "nothing here").unwrap();
    tmp
}

fn thumb(tmp: &TempDir, file: &str) -> std::path::PathBuf {
    tmp.path().join("out/static/thumbs/Trip_One").join(file)
}

#[test]
fn writes_variants_and_manifest() {
    let tmp = trip_one();
    let result = generate(
        &tmp.path().join("src"),
        &tmp.path().join("out"),
        &GalleryConfig::default(),
        None,
    )
    .unwrap();

    assert_eq!(result.gallery.albums.len(), 1);
    let album = &result.gallery.albums[0];
    assert_eq!(album.title, "Trip One");
    assert_eq!(album.photos.len(), 3);
    assert_eq!(album.photos[0].width, 900);
    assert_eq!(album.photos[0].height, 600);

    // 900px source: small and medium only
    let small = image::open(thumb(&tmp, "a_small.jpg")).unwrap();
    assert_eq!((small.width(), small.height()), (400, 267));
    let medium = image::open(thumb(&tmp, "a_medium.jpg")).unwrap();
    assert_eq!((medium.width(), medium.height()), (800, 533));
    assert!(!thumb(&tmp, "a_large.jpg").exists());

    let manifest: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(tmp.path().join("out").join(MANIFEST_FILENAME)).unwrap(),
    )
    .unwrap();
    assert_eq!(manifest["albums"][0]["title"], "Trip One");
    assert_eq!(
        manifest["albums"][0]["photos"][0]["variants"]["small"],
        "static/thumbs/Trip_One/a_small.jpg"
    );
}

#[test]
fn second_run_is_byte_identical_and_cached() {
    let tmp = trip_one();
    let run = || {
        generate(
            &tmp.path().join("src"),
            &tmp.path().join("out"),
            &GalleryConfig::default(),
            None,
        )
        .unwrap()
    };

    let first = run();
    assert_eq!(first.cache_stats.misses, 3);
    let before = fs::read(thumb(&tmp, "b_medium.jpg")).unwrap();
    let before_mtime = fs::metadata(thumb(&tmp, "b_medium.jpg"))
        .unwrap()
        .modified()
        .unwrap();

    let second = run();
    assert_eq!(second.cache_stats.misses, 0);
    assert_eq!(second.cache_stats.hits, 3);
    assert_eq!(fs::read(thumb(&tmp, "b_medium.jpg")).unwrap(), before);
    assert_eq!(
        fs::metadata(thumb(&tmp, "b_medium.jpg"))
            .unwrap()
            .modified()
            .unwrap(),
        before_mtime
    );
}

#[test]
fn touching_one_source_regenerates_only_it() {
    let tmp = trip_one();
    let run = || {
        generate(
            &tmp.path().join("src"),
            &tmp.path().join("out"),
            &GalleryConfig::default(),
            None,
        )
        .unwrap()
    };
    run();
    let a_mtime = fs::metadata(thumb(&tmp, "a_small.jpg"))
        .unwrap()
        .modified()
        .unwrap();

    set_mtime(
        &tmp.path().join("src/Trip_One/b.jpg"),
        SystemTime::now() + Duration::from_secs(3600),
    );
    let second = run();

    assert_eq!(second.cache_stats.misses, 1);
    assert_eq!(second.cache_stats.hits, 2);
    assert_eq!(
        fs::metadata(thumb(&tmp, "a_small.jpg"))
            .unwrap()
            .modified()
            .unwrap(),
        a_mtime
    );
}

#[test]
fn hidden_photo_and_empty_dir_are_excluded() {
    let tmp = trip_one();
    fs::write(
        tmp.path().join("src/gallery.yaml"),
        "photos:\n  Trip_One/b.jpg:\n    hidden: true\n",
    )
    .unwrap();

    let result = generate(
        &tmp.path().join("src"),
        &tmp.path().join("out"),
        &GalleryConfig::default(),
        None,
    )
    .unwrap();

    assert_eq!(result.gallery.albums.len(), 1);
    let names: Vec<&str> = result.gallery.albums[0]
        .photos
        .iter()
        .map(|p| p.filename.as_str())
        .collect();
    assert_eq!(names, vec!["a.jpg", "c.jpg"]);
    assert!(!thumb(&tmp, "b_small.jpg").exists());
    assert!(!tmp.path().join("out/static/thumbs/empty_dir").exists());
}

#[test]
fn undecodable_file_fails_alone() {
    let tmp = trip_one();
    fs::write(tmp.path().join("src/Trip_One/broken.jpg"), b"not a jpeg").unwrap();

    let result = generate(
        &tmp.path().join("src"),
        &tmp.path().join("out"),
        &GalleryConfig::default(),
        None,
    )
    .unwrap();

    assert_eq!(result.gallery.albums[0].photos.len(), 3);
    let report = &result.reports[0];
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].filename, "broken.jpg");
}

#[test]
fn tracker_and_events_follow_the_run() {
    let tmp = trip_one();
    let backend = NativeBackend::new();
    let tracker = Arc::new(ProgressTracker::new());
    let (tx, rx) = std::sync::mpsc::channel();

    let generator = Generator::new(
        tmp.path().join("src"),
        tmp.path().join("out"),
        GalleryConfig::default(),
        &backend,
    )
    .events(tx)
    .tracker(Arc::clone(&tracker));
    generator.run(&ManifestRenderer).unwrap();
    drop(generator);

    let events: Vec<ProgressEvent> = rx.iter().collect();
    assert_eq!(events.first(), Some(&ProgressEvent::ScanStarted));
    assert_eq!(events.last(), Some(&ProgressEvent::Completed));
    let photos = events
        .iter()
        .filter(|e| matches!(e, ProgressEvent::PhotoProcessed { .. }))
        .count();
    assert_eq!(photos, 3);

    let snapshot = tracker.get();
    assert_eq!(snapshot.percent, 100);
    assert_eq!(snapshot.status, JobStatus::Completed);
}

#[test]
fn source_without_albums_fails_the_run() {
    let tmp = TempDir::new().unwrap();
    fs::create_dir_all(tmp.path().join("src/empty_dir")).unwrap();

    let err = generate(
        &tmp.path().join("src"),
        &tmp.path().join("out"),
        &GalleryConfig::default(),
        None,
    )
    .unwrap_err();
    assert!(matches!(err, GenerateError::NoAlbums(_)));
}
