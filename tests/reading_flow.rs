use quire::provider::StaticProvider;
use quire::session::{ReaderSession, SessionOptions};
use quire::store::JsonStore;
use quire::{Geometry, PersistenceGateway, Position};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

fn fixture() -> (TempDir, PathBuf, StaticProvider) {
    let dir = tempfile::tempdir().unwrap();
    let book_path = dir.path().join("journey.epub");
    fs::write(&book_path, b"stable content for identity hashing").unwrap();

    let body: String = (0..300)
        .map(|i| {
            if i % 40 == 39 {
                format!("word{i}.\n\n")
            } else {
                format!("word{i} ")
            }
        })
        .collect();
    let provider = StaticProvider::new(&[
        ("Prologue", "A short opening chapter."),
        ("The Long Middle", body.as_str()),
        ("Epilogue", "It ends."),
    ]);
    (dir, book_path, provider)
}

#[test]
fn reading_state_survives_process_restart() {
    let (dir, book_path, provider) = fixture();
    let store_path = dir.path().join("records.json");
    let geometry = Geometry::new(40, 10, 1.0, 12).unwrap();

    // First "process": read into the middle chapter, drop a bookmark, quit.
    let store = Arc::new(JsonStore::load_from_file(&store_path).unwrap());
    let mut session = ReaderSession::open(
        &provider,
        store,
        &book_path,
        geometry.clone(),
        SessionOptions::default(),
    )
    .unwrap();
    session.next_chapter();
    session.next_page();
    session.next_page();
    let position = session.position();
    session.toggle_bookmark(Some("resume here".to_string()));
    session.close().unwrap();
    assert!(store_path.exists());

    // Second "process": a fresh store instance reads the same file.
    let store = Arc::new(JsonStore::load_from_file(&store_path).unwrap());
    let session = ReaderSession::open(
        &provider,
        store,
        &book_path,
        geometry,
        SessionOptions::default(),
    )
    .unwrap();
    assert_eq!(session.position(), position);
    assert_eq!(session.bookmarks().len(), 1);
    assert_eq!(session.bookmarks()[0].position, position);
    assert_eq!(session.bookmarks()[0].note.as_deref(), Some("resume here"));
}

#[test]
fn identity_follows_content_not_path() {
    let (dir, book_path, provider) = fixture();
    let store_path = dir.path().join("records.json");
    let geometry = Geometry::new(40, 10, 1.0, 12).unwrap();

    let store = Arc::new(JsonStore::load_from_file(&store_path).unwrap());
    let mut session = ReaderSession::open(
        &provider,
        store,
        &book_path,
        geometry.clone(),
        SessionOptions::default(),
    )
    .unwrap();
    session.next_chapter();
    let position = session.position();
    session.close().unwrap();

    // Same bytes under a different name resolve to the same record.
    let moved = dir.path().join("renamed.epub");
    fs::copy(&book_path, &moved).unwrap();
    let store = Arc::new(JsonStore::load_from_file(&store_path).unwrap());
    let session = ReaderSession::open(
        &provider,
        store,
        &moved,
        geometry,
        SessionOptions::default(),
    )
    .unwrap();
    assert_eq!(session.position(), position);
}

#[test]
fn geometry_round_trip_returns_close_to_start() {
    let (_dir, book_path, provider) = fixture();
    let wide = Geometry::new(80, 24, 1.0, 12).unwrap();
    let narrow = Geometry::new(40, 12, 1.5, 12).unwrap();

    let mut session = ReaderSession::open(
        &provider,
        Arc::new(JsonStore::ephemeral()),
        &book_path,
        wide.clone(),
        SessionOptions::default(),
    )
    .unwrap();
    session.next_chapter();
    let middle = session.pages()[1].len() / 2;
    session.goto(Position::new(1, middle));
    let start = session.position();

    session.apply_geometry(narrow);
    assert_eq!(session.position().chapter, 1);
    session.apply_geometry(wide);

    let back = session.position();
    assert_eq!(back.chapter, start.chapter);
    assert!(
        back.page.abs_diff(start.page) <= 1,
        "{start:?} -> {back:?} drifted more than one page"
    );
}

#[test]
fn stale_saved_position_is_clamped_on_open() {
    let (dir, book_path, provider) = fixture();
    let store_path = dir.path().join("records.json");
    let geometry = Geometry::new(40, 10, 1.0, 12).unwrap();

    // Persist a position far past the end of the middle chapter.
    let store = Arc::new(JsonStore::load_from_file(&store_path).unwrap());
    let mut session = ReaderSession::open(
        &provider,
        store.clone(),
        &book_path,
        geometry.clone(),
        SessionOptions::default(),
    )
    .unwrap();
    session.next_chapter();
    let mut record = session.snapshot_record();
    record.last_position = Position::new(1, 9999);
    store.save_record(&record).unwrap();
    drop(session);

    let store = Arc::new(JsonStore::load_from_file(&store_path).unwrap());
    let session = ReaderSession::open(
        &provider,
        store,
        &book_path,
        geometry,
        SessionOptions::default(),
    )
    .unwrap();
    let pos = session.position();
    assert_eq!(pos.chapter, 1);
    assert_eq!(pos.page, session.pages()[1].len() - 1);
}
