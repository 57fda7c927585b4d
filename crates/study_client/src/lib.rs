//! A typed client for the study assistant REST API.

pub mod api;
pub mod error;
pub mod normalize;
pub mod quiz_runner;
pub mod session;
pub mod toast;
pub mod uploader;

pub use api::{FeedbackSubmission, FlashcardRequest, ListFilter, QuizRequest, StudyClient};
pub use error::ClientError;
pub use normalize::{
    ExplanationReport, FeedbackNote, FlashcardItem, ItemFeedback, PassageExplanation, QuizCard,
    QuizDetail, QuizListing, StatsOverview, UploadSummary,
};
pub use quiz_runner::QuizRunner;
pub use session::{guard, GuardDecision, Route, Session, SessionStore, SessionUser};
pub use toast::{ToastCenter, ToastKind, ToastTimeouts};
pub use uploader::{BatchReport, PendingFile, Uploader};
