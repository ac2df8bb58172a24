use crate::paginator::Page;
use crate::position::Position;
use crate::provider::Chapter;

const CONTEXT_LINES: usize = 2;

/// A match inside the paginated text. The position doubles as the jump
/// target, so committing a hit is a plain `goto`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub position: Position,
    pub chapter_title: String,
    /// Line within the page that matched.
    pub line_index: usize,
    pub line: String,
    pub context_before: Vec<String>,
    pub context_after: Vec<String>,
}

/// Case-insensitive substring search over every line of every page.
/// Results come back in reading order.
pub fn search(pages: &[Vec<Page>], chapters: &[Chapter], query: &str) -> Vec<SearchHit> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    let mut hits = Vec::new();
    for chapter_pages in pages {
        for page in chapter_pages {
            for (line_index, line) in page.lines.iter().enumerate() {
                if !line.to_lowercase().contains(&needle) {
                    continue;
                }
                let start = line_index.saturating_sub(CONTEXT_LINES);
                let end = (line_index + CONTEXT_LINES + 1).min(page.lines.len());
                hits.push(SearchHit {
                    position: Position::new(page.chapter_index, page.page_index),
                    chapter_title: chapters
                        .get(page.chapter_index)
                        .map(|c| c.title.clone())
                        .unwrap_or_default(),
                    line_index,
                    line: line.clone(),
                    context_before: page.lines[start..line_index].to_vec(),
                    context_after: page.lines[line_index + 1..end].to_vec(),
                });
            }
        }
    }
    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paginator::{paginate, Geometry};

    fn fixtures() -> (Vec<Chapter>, Vec<Vec<Page>>) {
        let chapters = vec![
            Chapter {
                index: 0,
                title: "First".to_string(),
                text: "Nothing of note here.".to_string(),
            },
            Chapter {
                index: 1,
                title: "Second".to_string(),
                text: "The white whale surfaced.\n\nThe whale was gone.".to_string(),
            },
        ];
        let geometry = Geometry::new(40, 10, 1.0, 12).unwrap();
        let pages = paginate(&chapters, &geometry);
        (chapters, pages)
    }

    #[test]
    fn test_hits_carry_jump_targets_in_reading_order() {
        let (chapters, pages) = fixtures();
        let hits = search(&pages, &chapters, "whale");
        assert_eq!(hits.len(), 2);
        assert!(hits[0].position <= hits[1].position);
        assert_eq!(hits[0].position.chapter, 1);
        assert_eq!(hits[0].chapter_title, "Second");
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let (chapters, pages) = fixtures();
        assert_eq!(search(&pages, &chapters, "WHALE").len(), 2);
    }

    #[test]
    fn test_empty_query_returns_nothing() {
        let (chapters, pages) = fixtures();
        assert!(search(&pages, &chapters, "   ").is_empty());
    }
}
