use crate::position::Position;
use crate::provider::Chapter;

/// One selectable table-of-contents row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    pub chapter_index: usize,
    pub title: String,
}

impl TocEntry {
    /// Jump target for this entry: first page of the chapter.
    pub fn target(&self) -> Position {
        Position::new(self.chapter_index, 0)
    }
}

/// Flat TOC built from chapter titles, one entry per chapter.
pub fn build_toc(chapters: &[Chapter]) -> Vec<TocEntry> {
    chapters
        .iter()
        .map(|chapter| TocEntry {
            chapter_index: chapter.index,
            title: chapter.title.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toc_mirrors_chapter_order() {
        let chapters = vec![
            Chapter {
                index: 0,
                title: "Foreword".to_string(),
                text: "a".to_string(),
            },
            Chapter {
                index: 1,
                title: "The Journey".to_string(),
                text: "b".to_string(),
            },
        ];
        let toc = build_toc(&chapters);
        assert_eq!(toc.len(), 2);
        assert_eq!(toc[1].title, "The Journey");
        assert_eq!(toc[1].target(), Position::new(1, 0));
    }
}
