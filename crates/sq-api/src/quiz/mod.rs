pub mod model;
pub mod scoring;
pub mod submission;

pub use model::{QuestionInput, QuestionKind, StudentQuestion};
pub use scoring::{QuestionResult, QuizOutcome, SubmittedAnswer, score_quiz};
pub use submission::{SubmittedQuiz, submit_quiz};
