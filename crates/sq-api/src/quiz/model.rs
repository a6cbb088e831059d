use std::{collections::HashSet, str::FromStr};

use serde::{Deserialize, Serialize};
use sq_db::models::{QuizQuestion, QuizQuestionInsert};
use uuid::Uuid;

use crate::{error::ApiError, normalization::normalize_for_comparison, validation::required_text};

pub const MAX_QUESTIONS: usize = 50;
pub const MAX_PROMPT_CHARS: usize = 500;
pub const MAX_OPTION_CHARS: usize = 200;
pub const MIN_OPTIONS: usize = 2;
pub const MAX_OPTIONS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    MultipleChoice,
    ShortAnswer,
}

impl QuestionKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MultipleChoice => "multiple_choice",
            Self::ShortAnswer => "short_answer",
        }
    }
}

impl FromStr for QuestionKind {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "multiple_choice" => Ok(Self::MultipleChoice),
            "short_answer" => Ok(Self::ShortAnswer),
            other => Err(ApiError::Internal(format!(
                "Unknown question kind stored: '{other}'"
            ))),
        }
    }
}

/// One question as written in the back-office.
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionInput {
    pub prompt: String,
    pub kind: QuestionKind,
    #[serde(default)]
    pub options: Vec<String>,
    pub correct_option: Option<i32>,
    pub correct_answer: Option<String>,
}

impl QuestionInput {
    /// Validate and convert to a row at `position` (zero-based).
    pub fn validate(&self, position: usize) -> Result<QuizQuestionInsert, ApiError> {
        let label = format!("Question {}", position + 1);
        let prompt = required_text(&format!("{label} prompt"), &self.prompt, MAX_PROMPT_CHARS)?;

        let (options, correct_option, correct_answer) = match self.kind {
            QuestionKind::MultipleChoice => {
                let options = self
                    .options
                    .iter()
                    .map(|o| required_text(&format!("{label} option"), o, MAX_OPTION_CHARS))
                    .collect::<Result<Vec<_>, _>>()?;

                if !(MIN_OPTIONS..=MAX_OPTIONS).contains(&options.len()) {
                    return Err(ApiError::Validation(format!(
                        "{label} needs between {MIN_OPTIONS} and {MAX_OPTIONS} options"
                    )));
                }

                let mut seen = HashSet::new();
                if !options.iter().all(|o| seen.insert(normalize_for_comparison(o))) {
                    return Err(ApiError::Validation(format!(
                        "{label} has duplicate options"
                    )));
                }

                let correct = self
                    .correct_option
                    .filter(|i| usize::try_from(*i).is_ok_and(|i| i < options.len()))
                    .ok_or_else(|| {
                        ApiError::Validation(format!("{label} needs a valid correct option"))
                    })?;

                (options, Some(correct), None)
            }
            QuestionKind::ShortAnswer => {
                let answer = required_text(
                    &format!("{label} answer"),
                    self.correct_answer.as_deref().unwrap_or_default(),
                    MAX_OPTION_CHARS,
                )?;
                if normalize_for_comparison(&answer).is_empty() {
                    return Err(ApiError::Validation(format!(
                        "{label} answer must contain letters or digits"
                    )));
                }
                (Vec::new(), None, Some(answer))
            }
        };

        Ok(QuizQuestionInsert {
            position: position as i32,
            prompt,
            kind: self.kind.as_str().to_string(),
            options,
            correct_option,
            correct_answer,
        })
    }
}

/// Validate a whole question set, positions following input order.
pub fn validate_questions(inputs: &[QuestionInput]) -> Result<Vec<QuizQuestionInsert>, ApiError> {
    if inputs.len() > MAX_QUESTIONS {
        return Err(ApiError::Validation(format!(
            "A quiz can have at most {MAX_QUESTIONS} questions"
        )));
    }
    inputs
        .iter()
        .enumerate()
        .map(|(position, input)| input.validate(position))
        .collect()
}

/// A question as shown to students: no answers.
#[derive(Debug, Clone, Serialize)]
pub struct StudentQuestion {
    pub id: Uuid,
    pub position: i32,
    pub prompt: String,
    pub kind: String,
    pub options: Vec<String>,
}

impl From<QuizQuestion> for StudentQuestion {
    fn from(q: QuizQuestion) -> Self {
        Self {
            id: q.id,
            position: q.position,
            prompt: q.prompt,
            kind: q.kind,
            options: q.options,
        }
    }
}
