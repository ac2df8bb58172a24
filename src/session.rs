use crate::identity::BookIdentity;
use crate::paginator::{self, Geometry, Page};
use crate::position::Position;
use crate::provider::{BookProvider, Chapter};
use crate::reconcile;
use crate::search::{self, SearchHit};
use crate::store::{Bookmark, PersistenceGateway, ReadingRecord, StorageError};
use crate::toc::{self, TocEntry};
use anyhow::Result;
use chrono::Utc;
use log::{debug, info, warn};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Monotonic clock seam. Production uses [`SystemClock`]; tests drive a
/// fake to exercise idle-time exclusion deterministically.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// What the open session currently shows. Only `Reading` mutates the
/// position through navigation; the other views are read-only overlays that
/// either commit a jump or cancel back to `Reading` unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Reading,
    TableOfContents,
    Search,
    Bookmarks,
    Settings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookmarkToggle {
    Added,
    Removed,
}

#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Gaps between navigation events longer than this are treated as the
    /// reader having walked away and are excluded from the reading-time
    /// accumulator.
    pub inactivity_threshold: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            inactivity_threshold: Duration::from_secs(300),
        }
    }
}

/// An open book. Owns the in-memory position, the page sequence, and the
/// bookmark set for the lifetime of the session; the persistence gateway
/// owns the durable copies. Saving is a point-in-time snapshot — the store
/// is only ever read from `self`, never the other way around while open.
pub struct ReaderSession {
    identity: BookIdentity,
    chapters: Vec<Chapter>,
    geometry: Geometry,
    pages: Vec<Vec<Page>>,
    position: Position,
    view: View,
    bookmarks: Vec<Bookmark>,
    pending_deletes: Vec<u64>,
    store: Arc<dyn PersistenceGateway>,
    clock: Arc<dyn Clock>,
    inactivity_threshold: Duration,
    /// Reading seconds carried over from previous sessions.
    base_reading: Duration,
    accumulated: Duration,
    last_activity: Instant,
    /// Set when a storage write failed; cleared once a save goes through.
    dirty: bool,
}

impl ReaderSession {
    pub fn open(
        provider: &dyn BookProvider,
        store: Arc<dyn PersistenceGateway>,
        path: &Path,
        geometry: Geometry,
        options: SessionOptions,
    ) -> Result<Self> {
        Self::open_with_clock(provider, store, path, geometry, options, Arc::new(SystemClock))
    }

    pub fn open_with_clock(
        provider: &dyn BookProvider,
        store: Arc<dyn PersistenceGateway>,
        path: &Path,
        geometry: Geometry,
        options: SessionOptions,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let chapters = provider.load(path)?;
        let identity = BookIdentity::from_file(path)?;
        let pages = paginator::paginate(&chapters, &geometry);

        let record = store.load_record(identity.key()).unwrap_or_else(|e| {
            warn!("Failed to load reading record: {e}");
            None
        });
        let (position, base_reading) = match record {
            Some(record) => (
                record.last_position.clamp(&pages),
                Duration::from_secs(record.total_reading_seconds),
            ),
            None => (Position::new(0, 0), Duration::ZERO),
        };
        let bookmarks = store.load_bookmarks(identity.key()).unwrap_or_else(|e| {
            warn!("Failed to load bookmarks: {e}");
            Vec::new()
        });

        info!(
            "Opened {:?}: {} chapters, resuming at {}:{}",
            path,
            chapters.len(),
            position.chapter,
            position.page
        );
        let last_activity = clock.now();
        let mut session = Self {
            identity,
            chapters,
            geometry,
            pages,
            position,
            view: View::Reading,
            bookmarks,
            pending_deletes: Vec::new(),
            store,
            clock,
            inactivity_threshold: options.inactivity_threshold,
            base_reading,
            accumulated: Duration::ZERO,
            last_activity,
            dirty: false,
        };
        // Record the open itself so last_opened_at is fresh.
        session.save_snapshot();
        Ok(session)
    }

    // --- accessors ---

    pub fn identity(&self) -> &BookIdentity {
        &self.identity
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    pub fn pages(&self) -> &[Vec<Page>] {
        &self.pages
    }

    pub fn current_page(&self) -> &Page {
        &self.pages[self.position.chapter][self.position.page]
    }

    pub fn progress(&self) -> f64 {
        self.position.progress_fraction(&self.pages)
    }

    pub fn bookmarks(&self) -> &[Bookmark] {
        &self.bookmarks
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn total_reading_time(&self) -> Duration {
        self.base_reading + self.accumulated
    }

    /// Durable snapshot of the current state. Also what a background
    /// auto-save timer should write: it reads the position, never mutates
    /// it.
    pub fn snapshot_record(&self) -> ReadingRecord {
        ReadingRecord {
            book: self.identity.key().to_string(),
            last_position: self.position,
            total_reading_seconds: self.total_reading_time().as_secs(),
            last_opened_at: Utc::now(),
        }
    }

    // --- navigation (Reading view only) ---

    pub fn next_page(&mut self) {
        self.navigate(1);
    }

    pub fn prev_page(&mut self) {
        self.navigate(-1);
    }

    fn navigate(&mut self, delta: i64) {
        if self.view != View::Reading {
            return;
        }
        let next = self.position.advance(&self.pages, delta);
        self.move_to(next);
    }

    pub fn next_chapter(&mut self) {
        if self.view != View::Reading || self.position.chapter + 1 >= self.chapters.len() {
            return;
        }
        self.move_to(Position::new(self.position.chapter + 1, 0));
    }

    pub fn prev_chapter(&mut self) {
        if self.view != View::Reading || self.position.chapter == 0 {
            return;
        }
        self.move_to(Position::new(self.position.chapter - 1, 0));
    }

    /// Jump to an arbitrary position, clamped to the valid range. Like the
    /// relative moves this only acts in the `Reading` view; overlays leave
    /// the position through [`commit_jump`](Self::commit_jump).
    pub fn goto(&mut self, position: Position) {
        if self.view != View::Reading {
            return;
        }
        self.move_to(position.clamp(&self.pages));
    }

    fn move_to(&mut self, next: Position) {
        self.note_activity();
        if next == self.position {
            return;
        }
        self.position = next;
        // Position changes are persisted immediately; a failure only marks
        // the session dirty and never blocks navigation.
        self.save_snapshot();
    }

    // --- overlay views ---

    pub fn enter(&mut self, view: View) {
        if self.view == View::Reading {
            self.view = view;
        }
    }

    /// Leave the current overlay without moving.
    pub fn cancel_overlay(&mut self) {
        self.view = View::Reading;
    }

    /// Commit an overlay selection: jump to the (clamped) target and return
    /// to reading.
    pub fn commit_jump(&mut self, position: Position) {
        self.view = View::Reading;
        self.goto(position);
    }

    pub fn toc(&self) -> Vec<TocEntry> {
        toc::build_toc(&self.chapters)
    }

    pub fn search(&self, query: &str) -> Vec<SearchHit> {
        search::search(&self.pages, &self.chapters, query)
    }

    // --- bookmarks ---

    /// Remove the bookmark at the exact current position, or create one if
    /// none exists. Two identical toggles restore the original set. Returns
    /// `None` when an overlay is active; overlays never mutate state.
    pub fn toggle_bookmark(&mut self, note: Option<String>) -> Option<BookmarkToggle> {
        if self.view != View::Reading {
            return None;
        }
        self.note_activity();
        if let Some(index) = self
            .bookmarks
            .iter()
            .position(|b| b.position == self.position)
        {
            let removed = self.bookmarks.remove(index);
            if removed.id != 0 {
                if let Err(e) = self.store.delete_bookmark(removed.id) {
                    warn!("Failed to delete bookmark {}: {e}", removed.id);
                    self.pending_deletes.push(removed.id);
                    self.dirty = true;
                }
            }
            Some(BookmarkToggle::Removed)
        } else {
            let mut bookmark = Bookmark {
                id: 0,
                book: self.identity.key().to_string(),
                position: self.position,
                note,
                created_at: Utc::now(),
            };
            match self.store.save_bookmark(&bookmark) {
                Ok(id) => bookmark.id = id,
                Err(e) => {
                    warn!("Failed to save bookmark: {e}");
                    self.dirty = true;
                }
            }
            self.bookmarks.push(bookmark);
            Some(BookmarkToggle::Added)
        }
    }

    // --- geometry changes ---

    /// Repaginate under a new geometry and remap the position and every
    /// bookmark through fractional chapter progress. The geometry is
    /// already validated by construction, so nothing here can fail and
    /// leave a half-built pagination behind.
    pub fn apply_geometry(&mut self, geometry: Geometry) {
        if geometry == self.geometry {
            return;
        }
        self.note_activity();
        let new_pages = paginator::paginate(&self.chapters, &geometry);
        self.position = reconcile::reconcile_position(&self.pages, &new_pages, self.position);
        self.bookmarks = reconcile::reconcile_bookmarks(
            &self.pages,
            &new_pages,
            std::mem::take(&mut self.bookmarks),
        );
        self.pages = new_pages;
        self.geometry = geometry;
        self.dirty = true; // remapped bookmarks must reach the store
        self.save_snapshot();
    }

    // --- persistence ---

    /// Persist the reading record, plus any bookmark state that failed to
    /// sync earlier. On failure the session stays dirty and the in-memory
    /// state is untouched; the next save or `close` retries.
    pub fn save(&mut self) -> Result<(), StorageError> {
        self.note_activity();
        let record = self.snapshot_record();
        self.store.save_record(&record)?;
        if self.dirty {
            self.sync_bookmarks()?;
        }
        self.dirty = false;
        Ok(())
    }

    /// `save` for call sites that must not propagate: failure is logged and
    /// remembered via the dirty flag.
    fn save_snapshot(&mut self) {
        if let Err(e) = self.save() {
            warn!("Failed to persist reading state: {e}");
            self.dirty = true;
        }
    }

    fn sync_bookmarks(&mut self) -> Result<(), StorageError> {
        while let Some(&id) = self.pending_deletes.last() {
            self.store.delete_bookmark(id)?;
            self.pending_deletes.pop();
        }
        for bookmark in &mut self.bookmarks {
            let id = self.store.save_bookmark(bookmark)?;
            bookmark.id = id;
        }
        Ok(())
    }

    /// Close the session with one final synchronous save. A lost final
    /// position is a correctness bug, so the error is surfaced rather than
    /// swallowed.
    pub fn close(mut self) -> Result<(), StorageError> {
        self.save()
    }

    // --- reading time ---

    /// Fold wall-clock time since the last event into the accumulator,
    /// unless the gap exceeds the inactivity threshold.
    fn note_activity(&mut self) {
        let now = self.clock.now();
        let elapsed = now.saturating_duration_since(self.last_activity);
        if elapsed <= self.inactivity_threshold {
            self.accumulated += elapsed;
        } else {
            debug!("Excluding idle gap of {}s from reading time", elapsed.as_secs());
        }
        self.last_activity = now;
    }
}
