pub mod complexity;
pub mod domain;
pub mod generation;
pub mod listing;
pub mod ports;
pub mod progress;
pub mod quiz_flow;
pub mod summary;
pub mod upload_rules;

pub use domain::{
    AnswerRecord, AuthSession, Difficulty, ExplainedPassage, Explanation, Feedback, FileCategory,
    Flashcard, FlashcardActivity, NewFile, NewQuiz, Quiz, QuizAnswer, QuizOverview, QuizQuestion,
    StoredFile, User, UserCredentials,
};
pub use listing::{ListQuery, Page, Pagination, RawListParams};
pub use ports::{
    DatabaseService, ExplanationService, FlashcardGenerationService, PortError, PortResult,
    QuizGenerationService, SpeechToTextService, SummaryService,
};
pub use quiz_flow::{QuizFlow, QuizPhase, QuizSummary};
pub use summary::SummaryLength;
pub use upload_rules::{UploadPolicy, UploadRejection};
