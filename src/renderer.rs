use crate::paginator::{Geometry, Page};
use std::io::{self, Write};

/// Presentation hints for the external renderer. Font scale and spacing are
/// styling concerns; the page text already reflects the geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleDescriptor {
    pub font_scale: f32,
    pub line_spacing: f32,
}

impl From<&Geometry> for StyleDescriptor {
    fn from(geometry: &Geometry) -> Self {
        Self {
            font_scale: geometry.font_scale,
            line_spacing: geometry.line_spacing,
        }
    }
}

/// Output boundary. The engine hands over a finished page plus style and
/// progress; it never touches the terminal itself.
pub trait Renderer {
    fn render_page(
        &mut self,
        page: &Page,
        style: &StyleDescriptor,
        progress: f64,
    ) -> io::Result<()>;
}

/// Plain-text renderer for the CLI: the page's lines followed by a progress
/// footer.
pub struct PlainRenderer<W: Write> {
    out: W,
}

impl<W: Write> PlainRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> Renderer for PlainRenderer<W> {
    fn render_page(
        &mut self,
        page: &Page,
        _style: &StyleDescriptor,
        progress: f64,
    ) -> io::Result<()> {
        for line in &page.lines {
            writeln!(self.out, "{line}")?;
        }
        writeln!(
            self.out,
            "-- ch {} pg {} · {:.0}% --",
            page.chapter_index + 1,
            page.page_index + 1,
            progress * 100.0
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_renderer_writes_lines_and_footer() {
        let page = Page {
            chapter_index: 0,
            page_index: 1,
            lines: vec!["hello".to_string(), "world".to_string()],
        };
        let style = StyleDescriptor {
            font_scale: 1.0,
            line_spacing: 1.0,
        };
        let mut buf = Vec::new();
        PlainRenderer::new(&mut buf)
            .render_page(&page, &style, 0.5)
            .unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("hello\nworld\n"));
        assert!(text.contains("50%"));
    }
}
