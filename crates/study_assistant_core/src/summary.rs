//! crates/study_assistant_core/src/summary.rs
//!
//! Summary lengths, the extractive fallback summarizer and paragraph formatting.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// Below this many characters a text is not worth summarizing.
pub const MIN_SUMMARY_INPUT_CHARS: usize = 50;
pub const TOO_SHORT_MESSAGE: &str = "Text too short to summarize effectively.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SummaryLength {
    Brief,
    #[default]
    Detailed,
    Comprehensive,
}

impl SummaryLength {
    pub fn as_str(&self) -> &'static str {
        match self {
            SummaryLength::Brief => "brief",
            SummaryLength::Detailed => "detailed",
            SummaryLength::Comprehensive => "comprehensive",
        }
    }

    /// Approximate target size in words, used in prompts.
    pub fn target_words(&self) -> (usize, usize) {
        match self {
            SummaryLength::Brief => (100, 300),
            SummaryLength::Detailed => (250, 600),
            SummaryLength::Comprehensive => (500, 1200),
        }
    }

    fn extractive_sentences(&self) -> usize {
        match self {
            SummaryLength::Brief => 3,
            SummaryLength::Detailed => 6,
            SummaryLength::Comprehensive => 10,
        }
    }
}

impl fmt::Display for SummaryLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SummaryLength {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "brief" => Ok(SummaryLength::Brief),
            "detailed" => Ok(SummaryLength::Detailed),
            "comprehensive" => Ok(SummaryLength::Comprehensive),
            other => Err(format!("unknown summary type '{}'", other)),
        }
    }
}

const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
    "is", "are", "was", "were", "be", "been", "being", "have", "has", "had", "do", "does", "did",
    "will", "would", "could", "should", "may", "might", "must", "can", "this", "that", "these",
    "those", "it", "its", "they", "them", "their", "we", "our", "you", "your", "he", "she",
    "his", "her", "as", "from", "into", "than", "then", "so", "such", "not", "no", "also",
];

/// Collapses whitespace runs into single spaces.
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Splits text into sentences, keeping the terminating punctuation.
pub fn sentences_of(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    for c in text.chars() {
        current.push(c);
        if matches!(c, '.' | '!' | '?') {
            let s = current.trim();
            if !s.is_empty() {
                out.push(s.to_string());
            }
            current.clear();
        }
    }
    let rest = current.trim();
    if !rest.is_empty() {
        out.push(rest.to_string());
    }
    out
}

fn words_of(sentence: &str) -> impl Iterator<Item = String> + '_ {
    sentence
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
}

/// Picks the highest-scoring sentences (word frequency, earlier sentences slightly
/// favoured) and returns them in their original order.
pub fn extractive_summary(text: &str, length: SummaryLength) -> String {
    let cleaned = clean_text(text);
    if cleaned.chars().count() < MIN_SUMMARY_INPUT_CHARS {
        return TOO_SHORT_MESSAGE.to_string();
    }
    let sentences = sentences_of(&cleaned);
    let wanted = length.extractive_sentences();
    if sentences.len() <= wanted {
        return format_paragraphs(&sentences, length);
    }

    let stop: HashSet<&str> = STOP_WORDS.iter().copied().collect();
    let mut freq: HashMap<String, usize> = HashMap::new();
    for word in words_of(&cleaned).filter(|w| !stop.contains(w.as_str()) && w.len() > 2) {
        *freq.entry(word).or_insert(0) += 1;
    }

    let total = sentences.len() as f64;
    let mut scored: Vec<(usize, f64)> = sentences
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let words: Vec<String> = words_of(s).collect();
            if words.is_empty() {
                return (i, 0.0);
            }
            let hits: usize = words.iter().map(|w| freq.get(w).copied().unwrap_or(0)).sum();
            let position_bonus = 1.0 + 0.1 * (1.0 - i as f64 / total);
            (i, hits as f64 / words.len() as f64 * position_bonus)
        })
        .collect();

    scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    let mut chosen: Vec<usize> = scored.into_iter().take(wanted).map(|(i, _)| i).collect();
    chosen.sort_unstable();

    let picked: Vec<String> = chosen.into_iter().map(|i| sentences[i].clone()).collect();
    format_paragraphs(&picked, length)
}

/// Brief summaries stay one paragraph; longer ones are split into two or three.
pub fn format_paragraphs(sentences: &[String], length: SummaryLength) -> String {
    let paragraphs = match length {
        SummaryLength::Brief => 1,
        SummaryLength::Detailed if sentences.len() > 4 => 2,
        SummaryLength::Comprehensive if sentences.len() > 6 => 3,
        _ => 1,
    };
    if paragraphs == 1 {
        return sentences.join(" ");
    }
    let per = sentences.len().div_ceil(paragraphs);
    sentences
        .chunks(per)
        .map(|chunk| chunk.join(" "))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: &str = "Rust is a systems programming language. \
        Rust guarantees memory safety without a garbage collector. \
        The borrow checker enforces ownership rules at compile time. \
        Ownership rules prevent data races in concurrent Rust programs. \
        Cargo is the Rust package manager. \
        Many developers enjoy the tooling. \
        The weather was pleasant yesterday. \
        Rust programs compile to efficient machine code.";

    #[test]
    fn test_summary_length_parse() {
        assert_eq!("Brief".parse::<SummaryLength>(), Ok(SummaryLength::Brief));
        assert!("tiny".parse::<SummaryLength>().is_err());
        assert_eq!(SummaryLength::default(), SummaryLength::Detailed);
    }

    #[test]
    fn test_short_text_is_not_summarized() {
        assert_eq!(extractive_summary("Too short.", SummaryLength::Brief), TOO_SHORT_MESSAGE);
    }

    #[test]
    fn test_brief_summary_keeps_three_sentences_in_order() {
        let summary = extractive_summary(TEXT, SummaryLength::Brief);
        let picked = sentences_of(&summary);
        assert_eq!(picked.len(), 3);
        assert!(!summary.contains("weather"));
        let positions: Vec<usize> = picked
            .iter()
            .map(|s| TEXT.find(s.as_str()).expect("sentence comes from the text"))
            .collect();
        let mut sorted = positions.clone();
        sorted.sort_unstable();
        assert_eq!(positions, sorted);
    }

    #[test]
    fn test_detailed_summary_is_split_into_paragraphs() {
        let summary = extractive_summary(TEXT, SummaryLength::Detailed);
        assert_eq!(summary.split("\n\n").count(), 2);
    }

    #[test]
    fn test_sentences_keep_punctuation() {
        assert_eq!(
            sentences_of("One. Two! Three? Four"),
            vec!["One.", "Two!", "Three?", "Four"]
        );
    }
}
