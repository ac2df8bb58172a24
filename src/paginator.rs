use crate::provider::Chapter;
use crate::textflow::{self, Paragraph};
use log::debug;
use textwrap::{Options, WordSplitter};

pub const MIN_WIDTH: u16 = 40;
pub const MAX_WIDTH: u16 = 120;
pub const MIN_HEIGHT: u16 = 10;
pub const MAX_HEIGHT: u16 = 50;
pub const MIN_LINE_SPACING: f32 = 0.5;
pub const MAX_LINE_SPACING: f32 = 3.0;
pub const MIN_FONT_SIZE: u16 = 8;
pub const MAX_FONT_SIZE: u16 = 72;

/// Baseline font size; `font_scale` is relative to this.
pub const BASE_FONT_SIZE: u16 = 12;

/// Multiplier that turns the fractional part of `line_spacing` into whole
/// blank lines between wrapped lines.
const SPACING_FACTOR: f32 = 1.0;

#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum InvalidGeometryError {
    #[error("page width {0} outside supported range {MIN_WIDTH}..={MAX_WIDTH}")]
    Width(u16),
    #[error("page height {0} outside supported range {MIN_HEIGHT}..={MAX_HEIGHT}")]
    Height(u16),
    #[error("line spacing {0} outside supported range {MIN_LINE_SPACING}..{MAX_LINE_SPACING}")]
    LineSpacing(f32),
    #[error("font size {0} outside supported range {MIN_FONT_SIZE}..={MAX_FONT_SIZE}")]
    FontSize(u16),
}

/// Display parameters that deterministically govern pagination. Values can
/// only be built through [`Geometry::new`], so a `Geometry` held anywhere in
/// the engine is always in range.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    pub width: u16,
    pub height: u16,
    pub line_spacing: f32,
    pub font_scale: f32,
}

impl Geometry {
    pub fn new(
        width: u16,
        height: u16,
        line_spacing: f32,
        font_size: u16,
    ) -> Result<Self, InvalidGeometryError> {
        if !(MIN_WIDTH..=MAX_WIDTH).contains(&width) {
            return Err(InvalidGeometryError::Width(width));
        }
        if !(MIN_HEIGHT..=MAX_HEIGHT).contains(&height) {
            return Err(InvalidGeometryError::Height(height));
        }
        if !(MIN_LINE_SPACING..=MAX_LINE_SPACING).contains(&line_spacing) {
            return Err(InvalidGeometryError::LineSpacing(line_spacing));
        }
        if !(MIN_FONT_SIZE..=MAX_FONT_SIZE).contains(&font_size) {
            return Err(InvalidGeometryError::FontSize(font_size));
        }
        Ok(Self {
            width,
            height,
            line_spacing,
            font_scale: font_size as f32 / BASE_FONT_SIZE as f32,
        })
    }

    /// Blank lines inserted between wrapped lines of a paragraph. Spacing is
    /// visual only and never changes the wrap width.
    pub fn spacing_lines(&self) -> usize {
        ((self.line_spacing - 1.0) * SPACING_FACTOR).round().max(0.0) as usize
    }
}

/// One screenful of text belonging to exactly one chapter. Pages are
/// regenerated wholesale on every geometry change, never mutated in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub chapter_index: usize,
    pub page_index: usize,
    pub lines: Vec<String>,
}

/// Wrap and group every chapter into pages. Deterministic: identical
/// chapters and geometry always produce an identical page sequence.
pub fn paginate(chapters: &[Chapter], geometry: &Geometry) -> Vec<Vec<Page>> {
    chapters
        .iter()
        .map(|chapter| paginate_chapter(chapter, geometry))
        .collect()
}

fn paginate_chapter(chapter: &Chapter, geometry: &Geometry) -> Vec<Page> {
    let paragraphs = textflow::normalize(&chapter.text);
    let lines = flow_lines(&paragraphs, geometry);

    let mut pages: Vec<Page> = lines
        .chunks(geometry.height as usize)
        .enumerate()
        .map(|(page_index, chunk)| Page {
            chapter_index: chapter.index,
            page_index,
            lines: chunk.to_vec(),
        })
        .collect();

    // A chapter must always yield at least one addressable page.
    if pages.is_empty() {
        pages.push(Page {
            chapter_index: chapter.index,
            page_index: 0,
            lines: vec![String::new()],
        });
    }

    debug!(
        "paginated chapter {} into {} pages ({}x{})",
        chapter.index,
        pages.len(),
        geometry.width,
        geometry.height
    );
    pages
}

/// Greedy word wrap of every paragraph at the geometry width, with spacing
/// blank lines between wrapped lines and one blank line between paragraphs.
/// Words longer than the width are hard-split at the width boundary.
fn flow_lines(paragraphs: &[Paragraph], geometry: &Geometry) -> Vec<String> {
    let options = Options::new(geometry.width as usize)
        .word_splitter(WordSplitter::NoHyphenation)
        .break_words(true);
    let spacing = geometry.spacing_lines();

    let mut lines: Vec<String> = Vec::new();
    for paragraph in paragraphs {
        if paragraph.is_empty() {
            continue;
        }
        if !lines.is_empty() {
            lines.push(String::new());
        }
        let text = paragraph.words.join(" ");
        for (i, wrapped) in textwrap::wrap(&text, &options).iter().enumerate() {
            if i > 0 {
                for _ in 0..spacing {
                    lines.push(String::new());
                }
            }
            lines.push(wrapped.to_string());
        }
    }
    lines
}
