pub mod chat;
pub mod db;
pub mod explain_llm;
pub mod extract;
pub mod offline;
pub mod sst;
pub mod study_llm;
pub mod summary_llm;

pub use chat::ChatModel;
pub use db::DbAdapter;
pub use explain_llm::OpenAiExplainAdapter;
pub use offline::OfflineAdapter;
pub use sst::OpenAiSstAdapter;
pub use study_llm::{OpenAiFlashcardAdapter, OpenAiQuizAdapter};
pub use summary_llm::OpenAiSummaryAdapter;
