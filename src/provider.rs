use epub::doc::EpubDoc;
use log::{info, warn};
use regex::Regex;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum InvalidBookError {
    #[error("failed to open EPUB {path:?}: {reason}")]
    Unreadable { path: PathBuf, reason: String },
    #[error("no readable chapters in {path:?}")]
    NoChapters { path: PathBuf },
}

/// A chapter as delivered by the structure provider: ordered index, title,
/// and markup-free text. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    pub index: usize,
    pub title: String,
    pub text: String,
}

/// Boundary to the EPUB-structure provider. The engine only needs an
/// ordered chapter sequence; everything container-level stays behind this
/// trait.
pub trait BookProvider {
    fn load(&self, path: &Path) -> Result<Vec<Chapter>, InvalidBookError>;
}

/// EPUB provider backed by the `epub` crate. Spine documents are reduced to
/// plain text with a small regex pipeline: paragraph and heading tags become
/// paragraph breaks, every other tag is dropped, entities are unescaped and
/// whitespace is collapsed.
pub struct EpubProvider {
    script_style_re: Regex,
    break_re: Regex,
    paragraph_re: Regex,
    tag_re: Regex,
    heading_re: Regex,
    title_re: Regex,
    multi_space_re: Regex,
    multi_newline_re: Regex,
}

impl Default for EpubProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl EpubProvider {
    pub fn new() -> Self {
        Self {
            script_style_re: Regex::new(r"(?s)<(script|style)[^>]*>.*?</(script|style)>")
                .expect("Failed to compile script/style regex"),
            break_re: Regex::new(r"<br[^>]*/?>").expect("Failed to compile br regex"),
            paragraph_re: Regex::new(r"</?(p|div|h[1-6]|li|blockquote|tr)[^>]*>")
                .expect("Failed to compile paragraph tag regex"),
            tag_re: Regex::new(r"<[^>]*>").expect("Failed to compile tag regex"),
            heading_re: Regex::new(r"(?s)<h[1-6][^>]*>(.*?)</h[1-6]>")
                .expect("Failed to compile heading regex"),
            title_re: Regex::new(r"(?s)<title[^>]*>(.*?)</title>")
                .expect("Failed to compile title regex"),
            multi_space_re: Regex::new(r"[ \t]+").expect("Failed to compile space regex"),
            multi_newline_re: Regex::new(r"\n{3,}").expect("Failed to compile newline regex"),
        }
    }

    fn strip_html(&self, html: &str) -> String {
        let text = self.script_style_re.replace_all(html, "");
        let text = self.break_re.replace_all(&text, "\n");
        let text = self.paragraph_re.replace_all(&text, "\n\n");
        let text = self.tag_re.replace_all(&text, "");
        let text = unescape_entities(&text);
        let text = self.multi_space_re.replace_all(&text, " ");
        let trimmed: Vec<&str> = text.lines().map(str::trim).collect();
        let text = trimmed.join("\n");
        self.multi_newline_re
            .replace_all(&text, "\n\n")
            .trim()
            .to_string()
    }

    /// First heading in the document, falling back to `<title>`. Mirrors
    /// what readers see at the top of a chapter.
    fn extract_title(&self, html: &str) -> Option<String> {
        for re in [&self.heading_re, &self.title_re] {
            if let Some(captures) = re.captures(html) {
                let inner = self.tag_re.replace_all(&captures[1], "");
                let title = unescape_entities(&inner);
                let title = title.split_whitespace().collect::<Vec<_>>().join(" ");
                if !title.is_empty() {
                    return Some(title);
                }
            }
        }
        None
    }
}

impl BookProvider for EpubProvider {
    fn load(&self, path: &Path) -> Result<Vec<Chapter>, InvalidBookError> {
        let mut doc = EpubDoc::new(path).map_err(|e| InvalidBookError::Unreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let spine_len = doc.get_num_chapters();
        let mut chapters = Vec::new();
        for spine_index in 0..spine_len {
            if !doc.set_current_chapter(spine_index) {
                warn!("Skipping unreachable spine document {spine_index}");
                continue;
            }
            let Some((content, _mime)) = doc.get_current_str() else {
                continue;
            };
            let text = self.strip_html(&content);
            if text.is_empty() {
                continue;
            }
            let index = chapters.len();
            let title = self
                .extract_title(&content)
                .unwrap_or_else(|| format!("Chapter {}", index + 1));
            chapters.push(Chapter { index, title, text });
        }

        if chapters.is_empty() {
            return Err(InvalidBookError::NoChapters {
                path: path.to_path_buf(),
            });
        }
        info!(
            "Loaded {} chapters from {} spine documents in {path:?}",
            chapters.len(),
            spine_len
        );
        Ok(chapters)
    }
}

fn unescape_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&mdash;", "\u{2014}")
        .replace("&amp;", "&")
}

/// Provider over in-memory chapters. Lets tests and plain-text callers run
/// the whole engine without an EPUB container on disk.
pub struct StaticProvider {
    chapters: Vec<Chapter>,
}

impl StaticProvider {
    pub fn new(texts: &[(&str, &str)]) -> Self {
        Self {
            chapters: texts
                .iter()
                .enumerate()
                .map(|(index, (title, text))| Chapter {
                    index,
                    title: title.to_string(),
                    text: text.to_string(),
                })
                .collect(),
        }
    }
}

impl BookProvider for StaticProvider {
    fn load(&self, path: &Path) -> Result<Vec<Chapter>, InvalidBookError> {
        if self.chapters.is_empty() {
            return Err(InvalidBookError::NoChapters {
                path: path.to_path_buf(),
            });
        }
        Ok(self.chapters.clone())
    }
}
