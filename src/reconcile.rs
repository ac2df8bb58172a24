//! Remaps positions across a geometry change. Absolute page indices are
//! meaningless between two paginations; the fraction of the chapter read is
//! the part of the address that degrades gracefully, so that is what gets
//! carried over. Chapter indices are geometry-invariant and never remapped.
//!
//! Rounding policy: `floor(old_page / old_len * new_len)`, clamped to the
//! chapter's last page. Round-tripping A -> B -> A lands within one page of
//! the starting point.

use crate::paginator::Page;
use crate::position::Position;
use crate::store::Bookmark;
use log::debug;

/// Map a position from the old pagination onto the new one.
pub fn reconcile_position(
    old_pages: &[Vec<Page>],
    new_pages: &[Vec<Page>],
    position: Position,
) -> Position {
    let position = position.clamp(old_pages);
    let remapped = remap_page(old_pages, new_pages, position);
    debug!(
        "reconciled position {}:{} -> {}:{}",
        position.chapter, position.page, remapped.chapter, remapped.page
    );
    remapped
}

/// Remap every bookmark independently, each against its own chapter's old
/// and new page counts — not the reader's current chapter.
pub fn reconcile_bookmarks(
    old_pages: &[Vec<Page>],
    new_pages: &[Vec<Page>],
    bookmarks: Vec<Bookmark>,
) -> Vec<Bookmark> {
    bookmarks
        .into_iter()
        .map(|mut bookmark| {
            bookmark.position = remap_page(old_pages, new_pages, bookmark.position);
            bookmark
        })
        .collect()
}

fn remap_page(old_pages: &[Vec<Page>], new_pages: &[Vec<Page>], position: Position) -> Position {
    let position = position.clamp(old_pages);
    let old_len = old_pages
        .get(position.chapter)
        .map(Vec::len)
        .unwrap_or(1)
        .max(1);
    let new_len = new_pages
        .get(position.chapter)
        .map(Vec::len)
        .unwrap_or(1)
        .max(1);

    let fraction = position.page as f64 / old_len as f64;
    let page = ((fraction * new_len as f64).floor() as usize).min(new_len - 1);
    Position::new(position.chapter, page).clamp(new_pages)
}
