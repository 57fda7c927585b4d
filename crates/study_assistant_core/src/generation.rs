//! crates/study_assistant_core/src/generation.rs
//!
//! Turning raw LLM output into validated quiz questions and flashcards, and the
//! content-based generators used when no usable LLM output is available.

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::OnceLock;

/// Quiz generation input is cut to this many characters before prompting.
pub const QUIZ_CONTENT_LIMIT: usize = 5000;
pub const QUIZ_QUESTION_TARGET: usize = 3;
pub const QUIZ_FLASHCARD_TARGET: usize = 3;
pub const FLASHCARD_DECK_SIZE: usize = 5;
/// Content shorter than this cannot produce meaningful flashcards.
pub const MIN_CONTENT_CHARS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionDraft {
    pub question: String,
    pub options: Vec<String>,
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlashcardDraft {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudyMaterial {
    pub questions: Vec<QuestionDraft>,
    pub flashcards: Vec<FlashcardDraft>,
}

impl StudyMaterial {
    /// Enough valid items to skip the fallback.
    pub fn is_sufficient(&self) -> bool {
        self.questions.len() >= QUIZ_QUESTION_TARGET && self.flashcards.len() >= QUIZ_FLASHCARD_TARGET
    }
}

/// Where generated content came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationSource {
    Llm,
    Fallback,
}

impl GenerationSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationSource::Llm => "llm",
            GenerationSource::Fallback => "fallback",
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GenerationError {
    #[error("No JSON found in model output")]
    NoJson,
    #[error("Model output is not valid JSON: {0}")]
    InvalidJson(String),
    #[error("Content too short to generate meaningful flashcards")]
    ContentTooShort,
}

//=========================================================================================
// Parsing raw model output
//=========================================================================================

#[derive(Deserialize)]
struct RawQuestion {
    #[serde(default)]
    question: Option<String>,
    #[serde(default)]
    options: Option<Vec<Value>>,
    #[serde(default)]
    answer: Option<Value>,
}

#[derive(Deserialize)]
struct RawFlashcard {
    #[serde(default)]
    question: Option<String>,
    #[serde(default)]
    answer: Option<String>,
}

fn trailing_comma_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r",\s*([\]}])").expect("static regex is valid"))
}

/// Cleans common LLM formatting noise and cuts the text down to the outermost
/// JSON value that starts with `open` and ends with `close`.
fn isolate_json(raw: &str, open: char, close: char) -> Option<String> {
    let normalized = raw
        .replace(['\u{201C}', '\u{201D}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'")
        .replace("```json", "")
        .replace("```", "");
    let start = normalized.find(open)?;
    let end = normalized.rfind(close)?;
    if end <= start {
        return None;
    }
    let body = &normalized[start..=end];
    Some(trailing_comma_regex().replace_all(body, "$1").trim().to_string())
}

/// Lists sometimes arrive double-encoded as a JSON string.
fn as_array(value: Option<&Value>) -> Vec<Value> {
    match value {
        Some(Value::Array(items)) => items.clone(),
        Some(Value::String(s)) => match serde_json::from_str::<Value>(s) {
            Ok(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

fn value_to_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

/// Validates one question. The answer must name one of the options; a loose
/// match (case and surrounding whitespace) is normalized to the option text.
fn validate_question(raw: RawQuestion) -> Option<QuestionDraft> {
    let question = raw.question?.trim().to_string();
    if question.is_empty() {
        return None;
    }
    let options: Vec<String> = raw
        .options?
        .iter()
        .filter_map(value_to_text)
        .collect();
    if options.len() < 3 {
        return None;
    }
    let answer = raw.answer.as_ref().and_then(value_to_text)?;
    let answer = options
        .iter()
        .find(|o| **o == answer)
        .or_else(|| options.iter().find(|o| o.eq_ignore_ascii_case(&answer)))?
        .clone();
    Some(QuestionDraft {
        question,
        options,
        answer,
    })
}

fn validate_flashcard(raw: RawFlashcard) -> Option<FlashcardDraft> {
    let question = raw.question?.trim().to_string();
    let answer = raw.answer?.trim().to_string();
    if question.is_empty() || answer.is_empty() {
        return None;
    }
    Some(FlashcardDraft { question, answer })
}

fn flashcards_from_values(values: Vec<Value>) -> Vec<FlashcardDraft> {
    values
        .into_iter()
        .filter_map(|v| serde_json::from_value::<RawFlashcard>(v).ok())
        .filter_map(validate_flashcard)
        .collect()
}

/// Parses `{ "quiz": [...], "flashcards": [...] }` out of raw model output,
/// keeping only well-formed items.
pub fn parse_study_material(raw: &str) -> Result<StudyMaterial, GenerationError> {
    let json = isolate_json(raw, '{', '}').ok_or(GenerationError::NoJson)?;
    let parsed: Value =
        serde_json::from_str(&json).map_err(|e| GenerationError::InvalidJson(e.to_string()))?;

    let questions = as_array(parsed.get("quiz"))
        .into_iter()
        .filter_map(|v| serde_json::from_value::<RawQuestion>(v).ok())
        .filter_map(validate_question)
        .collect();
    let flashcards = flashcards_from_values(as_array(parsed.get("flashcards")));

    Ok(StudyMaterial {
        questions,
        flashcards,
    })
}

/// Parses a flashcard deck given either as a bare array or as `{ "flashcards": [...] }`.
pub fn parse_flashcards(raw: &str) -> Result<Vec<FlashcardDraft>, GenerationError> {
    let array_start = raw.find('[');
    let object_start = raw.find('{');
    let prefer_array = match (array_start, object_start) {
        (Some(a), Some(o)) => a < o,
        (Some(_), None) => true,
        _ => false,
    };

    let values = if prefer_array {
        let json = isolate_json(raw, '[', ']').ok_or(GenerationError::NoJson)?;
        match serde_json::from_str::<Value>(&json) {
            Ok(Value::Array(items)) => items,
            Ok(_) => Vec::new(),
            Err(e) => return Err(GenerationError::InvalidJson(e.to_string())),
        }
    } else {
        let json = isolate_json(raw, '{', '}').ok_or(GenerationError::NoJson)?;
        let parsed: Value =
            serde_json::from_str(&json).map_err(|e| GenerationError::InvalidJson(e.to_string()))?;
        as_array(parsed.get("flashcards"))
    };

    Ok(flashcards_from_values(values))
}

/// Cuts quiz input to `QUIZ_CONTENT_LIMIT` characters on a char boundary.
pub fn truncate_for_quiz(content: &str) -> &str {
    match content.char_indices().nth(QUIZ_CONTENT_LIMIT) {
        Some((idx, _)) => &content[..idx],
        None => content,
    }
}

//=========================================================================================
// Content-based fallbacks
//=========================================================================================

/// Splits on sentence punctuation and drops fragments of `min_len` chars or fewer.
pub fn split_sentences(text: &str, min_len: usize) -> Vec<String> {
    text.split(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| s.chars().count() > min_len)
        .map(str::to_string)
        .collect()
}

fn preview(sentence: &str, max_chars: usize) -> String {
    let cut: String = sentence.chars().take(max_chars).collect();
    if cut.len() < sentence.len() {
        format!("{}...", cut)
    } else {
        cut
    }
}

/// Builds exactly three questions and three flashcards from the text itself.
pub fn fallback_study_material(content: &str) -> StudyMaterial {
    let sentences = split_sentences(content, 10);
    let mut questions = Vec::new();
    let mut flashcards = Vec::new();

    for sentence in sentences.iter().take(QUIZ_QUESTION_TARGET) {
        let words: Vec<&str> = sentence.split_whitespace().collect();
        if sentence.chars().count() <= 20 || words.len() <= 5 {
            continue;
        }
        let subject = words[0].to_lowercase();
        let correct = preview(sentence, 50);
        questions.push(QuestionDraft {
            question: format!("According to the content, what is mentioned about {}?", subject),
            options: vec![
                correct.clone(),
                "This is not mentioned in the content".to_string(),
                "The content discusses something else".to_string(),
                "This topic is not covered".to_string(),
            ],
            answer: correct,
        });
        flashcards.push(FlashcardDraft {
            question: format!("What does the content say about {}?", subject),
            answer: format!("{}.", sentence),
        });
    }

    while questions.len() < QUIZ_QUESTION_TARGET {
        let answer = "The content covers important topics".to_string();
        questions.push(QuestionDraft {
            question: "What is a key point from the provided content?".to_string(),
            options: vec![
                answer.clone(),
                "This is not mentioned".to_string(),
                "The content is irrelevant".to_string(),
                "No information is provided".to_string(),
            ],
            answer,
        });
    }
    while flashcards.len() < QUIZ_FLASHCARD_TARGET {
        flashcards.push(FlashcardDraft {
            question: "What should you remember from this content?".to_string(),
            answer: "Key concepts and important information from the provided material.".to_string(),
        });
    }

    StudyMaterial {
        questions,
        flashcards,
    }
}

const DEFINITION_KEYWORDS: &[&str] = &[
    "refers to",
    "defined as",
    "known as",
    "means",
    "called",
    "is",
    "are",
];

const COMMON_TERMS: &[&str] = &[
    "machine learning",
    "artificial intelligence",
    "algorithm",
    "programming",
    "data",
    "system",
    "process",
    "method",
    "technique",
    "approach",
    "concept",
    "principle",
    "theory",
    "model",
    "framework",
    "structure",
];

fn capitalized_terms_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b[A-Z][a-z]+(?:\s+[A-Z][a-z]+)*\b").expect("static regex is valid")
    })
}

fn title_case(term: &str) -> String {
    term.split_whitespace()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Capitalized phrases and well-known technical terms, first-seen order, deduplicated.
pub fn extract_key_terms(content: &str, limit: usize) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let lower = content.to_lowercase();
    capitalized_terms_regex()
        .find_iter(content)
        .map(|m| m.as_str().to_string())
        .chain(
            COMMON_TERMS
                .iter()
                .filter(|t| lower.contains(*t))
                .map(|t| title_case(t)),
        )
        .filter(|t| t.chars().count() > 2)
        .filter(|t| seen.insert(t.to_lowercase()))
        .take(limit)
        .collect()
}

fn definition_card(sentence: &str) -> Option<FlashcardDraft> {
    let lower = sentence.to_lowercase();
    DEFINITION_KEYWORDS.iter().find_map(|keyword| {
        let needle = format!(" {} ", keyword);
        let at = lower.find(&needle)?;
        // the lowercase copy has the same byte layout for ASCII keywords
        let subject = sentence.get(..at)?.trim();
        let definition = sentence.get(at + needle.len()..)?.trim();
        if subject.chars().count() > 2 && definition.chars().count() > 5 {
            Some(FlashcardDraft {
                question: format!("What {} {}?", keyword, subject),
                answer: format!("{} {} {}.", subject, keyword, definition),
            })
        } else {
            None
        }
    })
}

fn generic_cards(content: &str, sentences: &[String]) -> Vec<FlashcardDraft> {
    let topic = sentences
        .first()
        .filter(|s| s.chars().count() > 10)
        .map(|s| format!("The main topic is: {}.", s))
        .unwrap_or_else(|| {
            "The content covers important concepts and their practical applications.".to_string()
        });
    let key_points = match sentences {
        [] => "Key points include fundamental concepts and their applications.".to_string(),
        [only] => format!("Key point: {}.", only),
        [first, second, ..] => format!("Key points include: {}, and {}.", first, second),
    };
    let lower = content.to_lowercase();
    let examples = sentences
        .iter()
        .find(|s| {
            let s = s.to_lowercase();
            ["example", "such as", "including", "for instance", "used in"]
                .iter()
                .any(|i| s.contains(i))
        })
        .map(|s| format!("{}.", s))
        .unwrap_or_else(|| {
            if lower.contains("example") {
                "The content walks through worked examples of the ideas it introduces.".to_string()
            } else {
                "The content includes various practical examples and real-world applications of the concepts discussed.".to_string()
            }
        });
    let learning = sentences
        .first()
        .map(|s| format!("Students should understand: {}.", s))
        .unwrap_or_else(|| {
            "Students should focus on understanding the main concepts and their practical applications.".to_string()
        });
    let summary = match sentences {
        [] => "The content provides comprehensive coverage of important topics and concepts.".to_string(),
        [only] => format!("{}.", only),
        [first, second, ..] => {
            let lead: Vec<&str> = second.split_whitespace().take(5).collect();
            format!("In summary: {}, with additional details about {}...", first, lead.join(" "))
        }
    };

    vec![
        FlashcardDraft {
            question: "What is the main topic discussed in this content?".to_string(),
            answer: topic,
        },
        FlashcardDraft {
            question: "What are the key points mentioned in the content?".to_string(),
            answer: key_points,
        },
        FlashcardDraft {
            question: "What examples or applications are discussed?".to_string(),
            answer: examples,
        },
        FlashcardDraft {
            question: "What should someone learn from this content?".to_string(),
            answer: learning,
        },
        FlashcardDraft {
            question: "How would you summarize this information?".to_string(),
            answer: summary,
        },
    ]
}

/// Builds exactly `FLASHCARD_DECK_SIZE` flashcards from the text itself.
pub fn fallback_flashcards(content: &str) -> Result<Vec<FlashcardDraft>, GenerationError> {
    let trimmed = content.trim();
    if trimmed.chars().count() < MIN_CONTENT_CHARS {
        return Err(GenerationError::ContentTooShort);
    }

    let mut sentences = split_sentences(trimmed, 5);
    if sentences.is_empty() {
        sentences.push(trimmed.to_string());
    }

    let mut cards: Vec<FlashcardDraft> = sentences
        .iter()
        .take(4)
        .filter_map(|s| definition_card(s))
        .collect();

    for term in extract_key_terms(trimmed, 8).iter().take(3) {
        if cards.len() >= FLASHCARD_DECK_SIZE {
            break;
        }
        let term_lower = term.to_lowercase();
        if let Some(sentence) = sentences
            .iter()
            .find(|s| s.chars().count() > 20 && s.to_lowercase().contains(&term_lower))
        {
            cards.push(FlashcardDraft {
                question: format!("What can you tell me about {}?", term),
                answer: format!("{}.", sentence),
            });
        }
    }

    for sentence in sentences.iter().take(3) {
        if cards.len() >= FLASHCARD_DECK_SIZE {
            break;
        }
        let words: Vec<&str> = sentence.split_whitespace().collect();
        if sentence.chars().count() > 30 && words.len() > 5 {
            cards.push(FlashcardDraft {
                question: format!("What is mentioned about {}?", words[..4].join(" ")),
                answer: format!("{}.", sentence),
            });
        }
    }

    for card in generic_cards(trimmed, &sentences) {
        if cards.len() >= FLASHCARD_DECK_SIZE {
            break;
        }
        cards.push(card);
    }

    cards.truncate(FLASHCARD_DECK_SIZE);
    Ok(cards)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MESSY_OUTPUT: &str = r#"Sure! Here is your quiz:
```json
{
  "quiz": [
    {"question": "What is photosynthesis?", "options": ["Light to energy", "Respiration", "Digestion", "Fermentation"], "answer": "Light to energy"},
    {"question": "Where does it happen?", "options": ["Chloroplast", "Nucleus", "Ribosome"], "answer": "chloroplast "},
    {"question": "Too few options", "options": ["A", "B"], "answer": "A"},
    {"question": "Answer not an option", "options": ["A", "B", "C"], "answer": "Z"},
  ],
  "flashcards": [
    {"question": "Define chlorophyll", "answer": "A green pigment."},
    {"question": "", "answer": "orphan"},
  ]
}
```
Hope this helps!"#;

    #[test]
    fn test_parse_keeps_only_valid_items() {
        let material = parse_study_material(MESSY_OUTPUT).unwrap();
        assert_eq!(material.questions.len(), 2);
        assert_eq!(material.questions[1].answer, "Chloroplast");
        assert_eq!(material.flashcards.len(), 1);
        assert!(!material.is_sufficient());
    }

    #[test]
    fn test_parse_handles_smart_quotes() {
        let raw = "{\u{201C}quiz\u{201D}: [], \u{201C}flashcards\u{201D}: []}";
        assert_eq!(parse_study_material(raw).unwrap(), StudyMaterial::default());
    }

    #[test]
    fn test_parse_without_json_fails() {
        assert_eq!(
            parse_study_material("I cannot help with that."),
            Err(GenerationError::NoJson)
        );
    }

    #[test]
    fn test_parse_flashcards_accepts_array_and_object() {
        let array = r#"[{"question": "Q1", "answer": "A1"}, {"question": "Q2", "answer": "A2"}]"#;
        assert_eq!(parse_flashcards(array).unwrap().len(), 2);

        let object = r#"{"flashcards": [{"question": "Q1", "answer": "A1"}]}"#;
        assert_eq!(parse_flashcards(object).unwrap().len(), 1);
    }

    #[test]
    fn test_double_encoded_lists_are_accepted() {
        let raw = r#"{"quiz": "[{\"question\": \"Q\", \"options\": [\"a\", \"b\", \"c\"], \"answer\": \"b\"}]", "flashcards": []}"#;
        assert_eq!(parse_study_material(raw).unwrap().questions.len(), 1);
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let long = "é".repeat(QUIZ_CONTENT_LIMIT + 10);
        assert_eq!(truncate_for_quiz(&long).chars().count(), QUIZ_CONTENT_LIMIT);
        assert_eq!(truncate_for_quiz("short"), "short");
    }

    #[test]
    fn test_fallback_material_is_always_three_and_three() {
        let text = "Photosynthesis converts light energy into chemical energy in plants. \
                    Chlorophyll absorbs mostly blue and red wavelengths of light. \
                    Oxygen is released as a by-product of splitting water molecules.";
        let material = fallback_study_material(text);
        assert_eq!(material.questions.len(), 3);
        assert_eq!(material.flashcards.len(), 3);
        for q in &material.questions {
            assert!(q.options.contains(&q.answer));
        }

        let empty = fallback_study_material("");
        assert_eq!(empty.questions.len(), 3);
        assert_eq!(empty.flashcards.len(), 3);
    }

    #[test]
    fn test_fallback_flashcards_deck_size() {
        let text = "A mitochondrion is the powerhouse of the cell. \
                    Cells use ATP as their main energy currency for many processes.";
        let cards = fallback_flashcards(text).unwrap();
        assert_eq!(cards.len(), FLASHCARD_DECK_SIZE);
        assert_eq!(cards[0].question, "What is A mitochondrion?");
        assert!(cards.iter().all(|c| !c.question.is_empty() && !c.answer.is_empty()));
    }

    #[test]
    fn test_fallback_flashcards_rejects_tiny_content() {
        assert_eq!(fallback_flashcards("  hi  "), Err(GenerationError::ContentTooShort));
    }

    #[test]
    fn test_key_terms_are_deduplicated() {
        let terms = extract_key_terms("Rust is a systems language. Rust has a type system.", 8);
        assert_eq!(terms.iter().filter(|t| t.as_str() == "Rust").count(), 1);
        assert!(terms.contains(&"System".to_string()));
    }
}
