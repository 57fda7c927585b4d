//! crates/study_assistant_core/src/quiz_flow.rs
//!
//! The quiz-taking state machine: one question at a time, select, submit,
//! see the result, move on. Time is passed in by the caller so the flow
//! stays deterministic.

use crate::domain::QuizQuestion;
use chrono::{DateTime, Utc};

/// An enum representing where the user is within the current question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizPhase {
    Answering,
    AnswerSelected,
    ResultShown,
    Completed,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum QuizFlowError {
    #[error("A quiz needs at least one question")]
    NoQuestions,
    #[error("Option {0} does not exist for this question")]
    UnknownOption(usize),
    #[error("Select an answer before submitting")]
    NothingSelected,
    #[error("This question has already been answered")]
    AlreadySubmitted,
    #[error("Submit an answer before moving on")]
    ResultNotShown,
}

/// How an option should be rendered given the current phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionMark {
    Neutral,
    Selected,
    Correct,
    Incorrect,
}

/// The result of submitting one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOutcome {
    pub question_index: usize,
    pub selected_answer: String,
    pub correct_answer: String,
    pub is_correct: bool,
    pub time_taken_ms: i64,
}

/// What `advance` moved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    NextQuestion(usize),
    Completed(QuizSummary),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizSummary {
    pub correct_answers: usize,
    pub total_questions: usize,
    pub final_score: u32,
}

impl QuizSummary {
    pub fn new(correct_answers: usize, total_questions: usize) -> Self {
        Self {
            correct_answers,
            total_questions,
            final_score: score_percent(correct_answers, total_questions),
        }
    }
}

/// `round(100 * correct / total)`, 0 for an empty quiz.
pub fn score_percent(correct: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (correct as f64 * 100.0 / total as f64).round() as u32
}

pub struct QuizFlow {
    questions: Vec<QuizQuestion>,
    current: usize,
    phase: QuizPhase,
    selected: Option<usize>,
    shown_at: DateTime<Utc>,
    outcomes: Vec<AnswerOutcome>,
}

impl QuizFlow {
    /// Starts the flow and displays the first question at `now`.
    pub fn start(questions: Vec<QuizQuestion>, now: DateTime<Utc>) -> Result<Self, QuizFlowError> {
        if questions.is_empty() {
            return Err(QuizFlowError::NoQuestions);
        }
        Ok(Self {
            questions,
            current: 0,
            phase: QuizPhase::Answering,
            selected: None,
            shown_at: now,
            outcomes: Vec::new(),
        })
    }

    pub fn phase(&self) -> QuizPhase {
        self.phase
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_question(&self) -> &QuizQuestion {
        &self.questions[self.current]
    }

    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    pub fn selected_option(&self) -> Option<&str> {
        self.selected
            .map(|i| self.current_question().options[i].as_str())
    }

    /// Whether the submit action is enabled.
    pub fn can_submit(&self) -> bool {
        self.phase == QuizPhase::AnswerSelected
    }

    pub fn outcomes(&self) -> &[AnswerOutcome] {
        &self.outcomes
    }

    /// Picks an option. Returns `Ok(false)` when the result is already shown,
    /// in which case nothing changes.
    pub fn select(&mut self, option_index: usize) -> Result<bool, QuizFlowError> {
        match self.phase {
            QuizPhase::ResultShown | QuizPhase::Completed => Ok(false),
            QuizPhase::Answering | QuizPhase::AnswerSelected => {
                if option_index >= self.current_question().options.len() {
                    return Err(QuizFlowError::UnknownOption(option_index));
                }
                self.selected = Some(option_index);
                self.phase = QuizPhase::AnswerSelected;
                Ok(true)
            }
        }
    }

    /// Submits the selected option for the current question.
    pub fn submit(&mut self, now: DateTime<Utc>) -> Result<AnswerOutcome, QuizFlowError> {
        match self.phase {
            QuizPhase::Answering => Err(QuizFlowError::NothingSelected),
            QuizPhase::ResultShown | QuizPhase::Completed => Err(QuizFlowError::AlreadySubmitted),
            QuizPhase::AnswerSelected => {
                let selected_index = self.selected.ok_or(QuizFlowError::NothingSelected)?;
                let question = self.current_question();
                let selected_answer = question.options[selected_index].clone();
                let outcome = AnswerOutcome {
                    question_index: self.current,
                    is_correct: question.is_correct(&selected_answer),
                    correct_answer: question.answer.clone(),
                    selected_answer,
                    time_taken_ms: (now - self.shown_at).num_milliseconds().max(0),
                };
                self.outcomes.push(outcome.clone());
                self.phase = QuizPhase::ResultShown;
                Ok(outcome)
            }
        }
    }

    /// Leaves the result screen: either the next question (shown at `now`) or completion.
    pub fn advance(&mut self, now: DateTime<Utc>) -> Result<Advance, QuizFlowError> {
        if self.phase != QuizPhase::ResultShown {
            return Err(QuizFlowError::ResultNotShown);
        }
        if self.current + 1 >= self.questions.len() {
            self.phase = QuizPhase::Completed;
            return Ok(Advance::Completed(self.summary()));
        }
        self.current += 1;
        self.selected = None;
        self.shown_at = now;
        self.phase = QuizPhase::Answering;
        Ok(Advance::NextQuestion(self.current))
    }

    /// Marks for every option of the current question.
    pub fn option_marks(&self) -> Vec<OptionMark> {
        let question = self.current_question();
        let result_visible = matches!(self.phase, QuizPhase::ResultShown | QuizPhase::Completed);
        question
            .options
            .iter()
            .enumerate()
            .map(|(i, option)| {
                let chosen = self.selected == Some(i);
                if result_visible {
                    if *option == question.answer {
                        OptionMark::Correct
                    } else if chosen {
                        OptionMark::Incorrect
                    } else {
                        OptionMark::Neutral
                    }
                } else if chosen {
                    OptionMark::Selected
                } else {
                    OptionMark::Neutral
                }
            })
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.phase == QuizPhase::Completed
    }

    pub fn summary(&self) -> QuizSummary {
        let correct = self.outcomes.iter().filter(|o| o.is_correct).count();
        QuizSummary::new(correct, self.questions.len())
    }
}
