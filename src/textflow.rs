/// A paragraph is an ordered sequence of whitespace-delimited words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paragraph {
    pub words: Vec<String>,
}

impl Paragraph {
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Split raw chapter text (markup already stripped by the provider) into
/// paragraphs of words. Blank lines are hard paragraph breaks; all other
/// whitespace collapses. Pure function, no side effects.
pub fn normalize(text: &str) -> Vec<Paragraph> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<String> = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                paragraphs.push(Paragraph {
                    words: std::mem::take(&mut current),
                });
            }
        } else {
            current.extend(line.split_whitespace().map(str::to_string));
        }
    }

    if !current.is_empty() {
        paragraphs.push(Paragraph { words: current });
    }

    paragraphs
}

/// Flattened word sequence of a chapter. Used by the no-content-loss checks.
pub fn word_sequence(paragraphs: &[Paragraph]) -> Vec<&str> {
    paragraphs
        .iter()
        .flat_map(|p| p.words.iter().map(String::as_str))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_lines_split_paragraphs() {
        let paras = normalize("First paragraph\ncontinues here.\n\nSecond one.");
        assert_eq!(paras.len(), 2);
        assert_eq!(
            paras[0].words,
            vec!["First", "paragraph", "continues", "here."]
        );
        assert_eq!(paras[1].words, vec!["Second", "one."]);
    }

    #[test]
    fn test_whitespace_runs_collapse() {
        let paras = normalize("a\t b   c");
        assert_eq!(paras.len(), 1);
        assert_eq!(paras[0].words, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_empty_and_whitespace_only_input() {
        assert!(normalize("").is_empty());
        assert!(normalize("  \n\n \t \n").is_empty());
    }

    #[test]
    fn test_multiple_blank_lines_are_one_break() {
        let paras = normalize("one\n\n\n\ntwo");
        assert_eq!(paras.len(), 2);
    }
}
