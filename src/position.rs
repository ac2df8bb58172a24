use crate::paginator::Page;
use serde::{Deserialize, Serialize};

/// The addressable (chapter, page) coordinate of a reader's place.
///
/// Ordering is chapter-first, then page. Equality is by value — change
/// detection in the session and the store compares positions, never
/// references. A position computed under one geometry is only meaningful
/// under another after reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub chapter: usize,
    pub page: usize,
}

impl Position {
    pub fn new(chapter: usize, page: usize) -> Self {
        Self { chapter, page }
    }

    /// Pull an out-of-range position to the nearest valid chapter/page.
    /// Valid positions are returned unchanged.
    pub fn clamp(self, pages: &[Vec<Page>]) -> Self {
        if pages.is_empty() {
            return Self::new(0, 0);
        }
        let chapter = self.chapter.min(pages.len() - 1);
        let page = self.page.min(pages[chapter].len().saturating_sub(1));
        Self { chapter, page }
    }

    /// Move forward or backward by `delta` pages, crossing chapter
    /// boundaries. Saturates at the first page of the first chapter and the
    /// last page of the last chapter; never wraps.
    pub fn advance(self, pages: &[Vec<Page>], delta: i64) -> Self {
        if pages.is_empty() {
            return Self::new(0, 0);
        }
        let mut pos = self.clamp(pages);
        let mut remaining = delta;

        while remaining > 0 {
            if pos.page + 1 < pages[pos.chapter].len() {
                pos.page += 1;
            } else if pos.chapter + 1 < pages.len() {
                pos.chapter += 1;
                pos.page = 0;
            } else {
                break;
            }
            remaining -= 1;
        }
        while remaining < 0 {
            if pos.page > 0 {
                pos.page -= 1;
            } else if pos.chapter > 0 {
                pos.chapter -= 1;
                pos.page = pages[pos.chapter].len() - 1;
            } else {
                break;
            }
            remaining += 1;
        }
        pos
    }

    /// Fraction of the book read through this position: pages up to and
    /// including the current one over the total page count. Monotonic under
    /// `advance`, 1.0 on the final page.
    pub fn progress_fraction(self, pages: &[Vec<Page>]) -> f64 {
        let total: usize = pages.iter().map(Vec::len).sum();
        if total == 0 {
            return 0.0;
        }
        let pos = self.clamp(pages);
        let read: usize = pages[..pos.chapter].iter().map(Vec::len).sum::<usize>() + pos.page + 1;
        read as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Page layout with the given per-chapter page counts; content is
    /// irrelevant for position arithmetic.
    fn layout(counts: &[usize]) -> Vec<Vec<Page>> {
        counts
            .iter()
            .enumerate()
            .map(|(chapter_index, &n)| {
                (0..n)
                    .map(|page_index| Page {
                        chapter_index,
                        page_index,
                        lines: vec![String::new()],
                    })
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_ordering_is_chapter_first() {
        assert!(Position::new(0, 9) < Position::new(1, 0));
        assert!(Position::new(2, 1) < Position::new(2, 2));
        assert_eq!(Position::new(1, 1), Position::new(1, 1));
    }

    #[test]
    fn test_clamp_is_identity_on_valid_positions() {
        let pages = layout(&[3, 5, 2]);
        for chapter in 0..3 {
            for page in 0..pages[chapter].len() {
                let p = Position::new(chapter, page);
                assert_eq!(p.clamp(&pages), p);
            }
        }
    }

    #[test]
    fn test_clamp_repairs_out_of_range() {
        let pages = layout(&[3, 5]);
        assert_eq!(Position::new(9, 0).clamp(&pages), Position::new(1, 4));
        assert_eq!(Position::new(0, 99).clamp(&pages), Position::new(0, 2));
    }

    #[test]
    fn test_advance_crosses_chapter_boundaries() {
        let pages = layout(&[2, 3]);
        let p = Position::new(0, 1).advance(&pages, 1);
        assert_eq!(p, Position::new(1, 0));
        let back = p.advance(&pages, -1);
        assert_eq!(back, Position::new(0, 1));
    }

    #[test]
    fn test_advance_saturates_at_document_bounds() {
        let pages = layout(&[2, 3]);
        let start = Position::new(0, 0);
        assert_eq!(start.advance(&pages, -1), start);
        let end = Position::new(1, 2);
        assert_eq!(end.advance(&pages, 1), end);
        assert_eq!(start.advance(&pages, 100), end);
        assert_eq!(end.advance(&pages, -100), start);
    }

    #[test]
    fn test_empty_layout_never_panics() {
        let pages: Vec<Vec<Page>> = Vec::new();
        assert_eq!(Position::new(0, 0).advance(&pages, 1), Position::new(0, 0));
        assert_eq!(Position::new(3, 7).advance(&pages, -5), Position::new(0, 0));
        assert_eq!(Position::new(3, 7).clamp(&pages), Position::new(0, 0));
        assert_eq!(Position::new(0, 0).progress_fraction(&pages), 0.0);
    }

    #[test]
    fn test_progress_fraction_is_monotonic_and_bounded() {
        let pages = layout(&[2, 3, 1]);
        let mut pos = Position::new(0, 0);
        let mut last = 0.0;
        loop {
            let f = pos.progress_fraction(&pages);
            assert!(f > last && f <= 1.0);
            last = f;
            let next = pos.advance(&pages, 1);
            if next == pos {
                break;
            }
            pos = next;
        }
        assert!((last - 1.0).abs() < f64::EPSILON);
    }
}
