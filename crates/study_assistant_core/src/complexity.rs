//! crates/study_assistant_core/src/complexity.rs
//!
//! Heuristic detection of passages that are likely hard to read.

use crate::summary::sentences_of;
use std::collections::HashSet;

pub const DEFAULT_THRESHOLD: f64 = 5.0;
pub const DEFAULT_MAX_PASSAGES: usize = 8;

/// Used in place of an explanation when the model is unavailable or fails.
pub const FALLBACK_EXPLANATION: &str = "- Core idea: (explanation unavailable)\n\
- Simple explanation (2-3 lines): This sentence seems dense; break it into smaller ideas and define the jargon.\n\
- Example: compare each layer of the argument to a step in a recipe.\n\
- Analogy (optional): like translating technical terms into everyday language.";

const ACADEMIC_TERMS: &[&str] = &[
    "paradigm", "epistemology", "ontology", "methodology", "heuristic", "algorithm", "quantum",
    "theorem", "hypothesis", "empirical", "theoretical", "framework", "construct", "variable",
    "correlation", "causation", "quantitative", "qualitative", "metaphysics", "phenomenology",
    "hermeneutics", "dialectic",
];

const STOP_WORDS: &[&str] = &[
    "i", "me", "my", "we", "our", "you", "your", "he", "him", "his", "she", "her", "it", "its",
    "they", "them", "their", "what", "which", "who", "whom", "this", "that", "these", "those",
    "am", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had", "having",
    "do", "does", "did", "doing", "a", "an", "the", "and", "but", "if", "or", "because", "as",
    "until", "while", "of", "at", "by", "for", "with", "about", "against", "between", "into",
    "through", "during", "before", "after", "above", "below", "to", "from", "up", "down", "in",
    "out", "on", "off", "over", "under", "again", "further", "then", "once", "here", "there",
    "when", "where", "why", "how", "all", "any", "both", "each", "few", "more", "most", "other",
    "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than", "too", "very",
    "can", "will", "just", "should", "now",
];

/// A sentence flagged as difficult.
#[derive(Debug, Clone, PartialEq)]
pub struct DifficultPassage {
    pub sentence: String,
    pub score: f64,
    pub reasons: Vec<String>,
}

pub struct ComplexityAnalyzer {
    stop_words: HashSet<&'static str>,
    academic_terms: HashSet<&'static str>,
    threshold: f64,
}

impl Default for ComplexityAnalyzer {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

impl ComplexityAnalyzer {
    pub fn new(threshold: f64) -> Self {
        Self {
            stop_words: STOP_WORDS.iter().copied().collect(),
            academic_terms: ACADEMIC_TERMS.iter().copied().collect(),
            threshold,
        }
    }

    fn content_words(&self, sentence: &str) -> Vec<String> {
        sentence
            .split(|c: char| !c.is_alphabetic())
            .filter(|w| !w.is_empty())
            .map(str::to_lowercase)
            .filter(|w| !self.stop_words.contains(w.as_str()))
            .collect()
    }

    /// `0.3 * content words + 2.0 * academic terms + 0.5 * mean content word length`.
    pub fn sentence_score(&self, sentence: &str) -> f64 {
        let words = self.content_words(sentence);
        if words.is_empty() {
            return 0.0;
        }
        let academic = words
            .iter()
            .filter(|w| self.academic_terms.contains(w.as_str()))
            .count();
        let avg_len = words.iter().map(|w| w.chars().count()).sum::<usize>() as f64 / words.len() as f64;
        words.len() as f64 * 0.3 + academic as f64 * 2.0 + avg_len * 0.5
    }

    /// Every sentence at or above the threshold, in document order.
    pub fn find_difficult_parts(&self, text: &str) -> Vec<DifficultPassage> {
        sentences_of(text)
            .into_iter()
            .filter(|s| s.split_whitespace().count() >= 5)
            .filter_map(|sentence| {
                let score = self.sentence_score(&sentence);
                if score < self.threshold {
                    return None;
                }
                let lower = sentence.to_lowercase();
                let mut reasons = Vec::new();
                if sentence.split_whitespace().count() > 15 {
                    reasons.push("High word count".to_string());
                }
                if self.academic_terms.iter().any(|t| lower.contains(t)) {
                    reasons.push("Contains academic terms".to_string());
                }
                if score > 8.0 {
                    reasons.push("Uses long words".to_string());
                }
                Some(DifficultPassage {
                    sentence: sentence.trim().to_string(),
                    score: (score * 100.0).round() / 100.0,
                    reasons,
                })
            })
            .collect()
    }

    /// The `max` highest-scoring passages, returned in document order.
    pub fn top_passages(&self, text: &str, max: usize) -> Vec<DifficultPassage> {
        let mut indexed: Vec<(usize, DifficultPassage)> =
            self.find_difficult_parts(text).into_iter().enumerate().collect();
        indexed.sort_by(|a, b| b.1.score.total_cmp(&a.1.score).then(a.0.cmp(&b.0)));
        indexed.truncate(max);
        indexed.sort_by_key(|(i, _)| *i);
        indexed.into_iter().map(|(_, p)| p).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_sentences_are_skipped() {
        let analyzer = ComplexityAnalyzer::default();
        assert!(analyzer.find_difficult_parts("Epistemology is hard.").is_empty());
    }

    #[test]
    fn test_academic_sentence_is_flagged_with_reasons() {
        let analyzer = ComplexityAnalyzer::default();
        let text = "The cat sat on the mat today. \
            The epistemology of quantum phenomenology challenges every empirical methodology \
            that contemporary philosophers routinely apply when constructing theoretical \
            frameworks for understanding causation.";
        let parts = analyzer.find_difficult_parts(text);
        assert_eq!(parts.len(), 1);
        let part = &parts[0];
        assert!(part.sentence.starts_with("The epistemology"));
        assert!(part.reasons.contains(&"High word count".to_string()));
        assert!(part.reasons.contains(&"Contains academic terms".to_string()));
        assert!(part.reasons.contains(&"Uses long words".to_string()));
    }

    #[test]
    fn test_score_formula() {
        let analyzer = ComplexityAnalyzer::default();
        // content words: "quantum", "theorem" -> 2 words, 2 academic, mean length 7
        let score = analyzer.sentence_score("the quantum theorem");
        assert!((score - (0.6 + 4.0 + 3.5)).abs() < 1e-9);
    }

    #[test]
    fn test_top_passages_keep_document_order() {
        let analyzer = ComplexityAnalyzer::new(0.0);
        let text = "Simple words make simple lines here. \
            Quantum hypothesis testing requires rigorous empirical methodology always. \
            Another plain sentence about the garden today.";
        assert_eq!(analyzer.find_difficult_parts(text).len(), 3);
        let top = analyzer.top_passages(text, 2);
        assert_eq!(top.len(), 2);
        assert!(top[0].sentence.starts_with("Quantum"));
        assert!(top[1].sentence.starts_with("Another"));
    }
}
