//! crates/study_client/src/quiz_runner.rs
//!
//! Drives a `QuizFlow` for one fetched quiz and reports each answer to the
//! server. Reporting is fire-and-forget: the POST is spawned, failures are
//! only logged, and the flow never waits for it. Nothing is retried.

use chrono::{DateTime, Utc};
use study_assistant_core::quiz_flow::{Advance, AnswerOutcome, OptionMark, QuizFlow, QuizFlowError, QuizPhase};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::api::StudyClient;
use crate::normalize::QuizDetail;

pub struct QuizRunner {
    quiz_id: String,
    client: StudyClient,
    flow: QuizFlow,
    in_flight: Vec<JoinHandle<()>>,
}

impl QuizRunner {
    pub fn start(client: StudyClient, quiz: QuizDetail, now: DateTime<Utc>) -> Result<Self, QuizFlowError> {
        Ok(Self {
            quiz_id: quiz.id,
            client,
            flow: QuizFlow::start(quiz.questions, now)?,
            in_flight: Vec::new(),
        })
    }

    pub fn flow(&self) -> &QuizFlow {
        &self.flow
    }

    pub fn phase(&self) -> QuizPhase {
        self.flow.phase()
    }

    pub fn option_marks(&self) -> Vec<OptionMark> {
        self.flow.option_marks()
    }

    pub fn select(&mut self, option_index: usize) -> Result<bool, QuizFlowError> {
        self.flow.select(option_index)
    }

    /// Grades the selection locally and reports it in the background.
    pub fn submit(&mut self, now: DateTime<Utc>) -> Result<AnswerOutcome, QuizFlowError> {
        let outcome = self.flow.submit(now)?;

        let client = self.client.clone();
        let quiz_id = self.quiz_id.clone();
        let report = outcome.clone();
        self.in_flight.retain(|h| !h.is_finished());
        self.in_flight.push(tokio::spawn(async move {
            match client
                .submit_answer(&quiz_id, report.question_index, &report.selected_answer, report.time_taken_ms)
                .await
            {
                Ok(_) => debug!("Recorded answer {} of quiz {}", report.question_index, quiz_id),
                Err(e) => warn!(
                    "Could not record answer {} of quiz {}: {}",
                    report.question_index, quiz_id, e
                ),
            }
        }));

        Ok(outcome)
    }

    pub fn advance(&mut self, now: DateTime<Utc>) -> Result<Advance, QuizFlowError> {
        self.flow.advance(now)
    }

    /// Waits for reports that are still in flight, e.g. before the process exits.
    pub async fn settle(&mut self) {
        for handle in self.in_flight.drain(..) {
            if let Err(e) = handle.await {
                warn!("Answer report task failed: {}", e);
            }
        }
    }
}
