//! Grading a student's answers against a story's quiz.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sq_db::models::{QuizQuestion, SubmissionAnswerInsert};
use uuid::Uuid;

use super::QuestionKind;
use crate::{error::ApiError, normalization::answers_match};

pub const MAX_ANSWER_CHARS: usize = 500;

/// One answer as sent by the student. Multiple-choice questions use
/// `choice` (option index); short-answer questions use `text`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmittedAnswer {
    pub question_id: Uuid,
    pub choice: Option<i32>,
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionResult {
    pub question_id: Uuid,
    pub correct: bool,
}

#[derive(Debug, Clone)]
pub struct QuizOutcome {
    pub score: i32,
    pub total: i32,
    /// One row per question, in question order
    pub answers: Vec<SubmissionAnswerInsert>,
}

impl QuizOutcome {
    pub fn results(&self) -> Vec<QuestionResult> {
        self.answers
            .iter()
            .map(|a| QuestionResult {
                question_id: a.question_id,
                correct: a.correct,
            })
            .collect()
    }
}

/// Score `answers` against `questions`.
///
/// Unanswered questions count as wrong. Answering an unknown question, or
/// the same question twice, is a validation error.
pub fn score_quiz(
    questions: &[QuizQuestion],
    answers: &[SubmittedAnswer],
) -> Result<QuizOutcome, ApiError> {
    let mut by_question: HashMap<Uuid, &SubmittedAnswer> = HashMap::with_capacity(answers.len());

    for answer in answers {
        if !questions.iter().any(|q| q.id == answer.question_id) {
            return Err(ApiError::Validation(format!(
                "Answer refers to an unknown question: {}",
                answer.question_id
            )));
        }
        if answer
            .text
            .as_deref()
            .is_some_and(|t| t.chars().count() > MAX_ANSWER_CHARS)
        {
            return Err(ApiError::Validation(format!(
                "Answers must be at most {MAX_ANSWER_CHARS} characters long"
            )));
        }
        if by_question.insert(answer.question_id, answer).is_some() {
            return Err(ApiError::Validation(format!(
                "Question {} was answered more than once",
                answer.question_id
            )));
        }
    }

    let graded = questions
        .iter()
        .map(|question| grade(question, by_question.get(&question.id).copied()))
        .collect::<Result<Vec<_>, _>>()?;

    let score = graded.iter().filter(|a| a.correct).count() as i32;

    Ok(QuizOutcome {
        score,
        total: questions.len() as i32,
        answers: graded,
    })
}

fn grade(
    question: &QuizQuestion,
    answer: Option<&SubmittedAnswer>,
) -> Result<SubmissionAnswerInsert, ApiError> {
    let kind: QuestionKind = question.kind.parse()?;

    let (given, correct) = match (kind, answer) {
        (_, None) => (None, false),
        (QuestionKind::MultipleChoice, Some(answer)) => {
            let chosen = answer
                .choice
                .and_then(|i| usize::try_from(i).ok())
                .and_then(|i| question.options.get(i));
            let correct = chosen.is_some() && answer.choice == question.correct_option;
            (chosen.cloned(), correct)
        }
        (QuestionKind::ShortAnswer, Some(answer)) => {
            let text = answer
                .text
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty());
            let correct = text.is_some_and(|t| {
                answers_match(t, question.correct_answer.as_deref().unwrap_or_default())
            });
            (text.map(String::from), correct)
        }
    };

    Ok(SubmissionAnswerInsert {
        question_id: question.id,
        answer: given,
        correct,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mc(correct: i32) -> QuizQuestion {
        QuizQuestion {
            id: Uuid::new_v4(),
            story_id: Uuid::nil(),
            position: 0,
            prompt: "Pick one".to_string(),
            kind: "multiple_choice".to_string(),
            options: vec!["Red".into(), "Green".into(), "Blue".into()],
            correct_option: Some(correct),
            correct_answer: None,
        }
    }

    fn sa(expected: &str) -> QuizQuestion {
        QuizQuestion {
            id: Uuid::new_v4(),
            story_id: Uuid::nil(),
            position: 1,
            prompt: "Type it".to_string(),
            kind: "short_answer".to_string(),
            options: Vec::new(),
            correct_option: None,
            correct_answer: Some(expected.to_string()),
        }
    }

    fn choice(q: &QuizQuestion, i: i32) -> SubmittedAnswer {
        SubmittedAnswer {
            question_id: q.id,
            choice: Some(i),
            text: None,
        }
    }

    fn text(q: &QuizQuestion, t: &str) -> SubmittedAnswer {
        SubmittedAnswer {
            question_id: q.id,
            choice: None,
            text: Some(t.to_string()),
        }
    }

    #[test]
    fn test_all_correct() {
        let questions = vec![mc(2), sa("Éléphant")];
        let answers = vec![choice(&questions[0], 2), text(&questions[1], " elephant ")];

        let outcome = score_quiz(&questions, &answers).unwrap();
        assert_eq!((outcome.score, outcome.total), (2, 2));
        assert_eq!(outcome.answers[0].answer.as_deref(), Some("Blue"));
        assert_eq!(outcome.answers[1].answer.as_deref(), Some("elephant"));
    }

    #[test]
    fn test_unanswered_counts_as_wrong() {
        let questions = vec![mc(0), sa("owl"), mc(1)];
        let answers = vec![choice(&questions[0], 0)];

        let outcome = score_quiz(&questions, &answers).unwrap();
        assert_eq!((outcome.score, outcome.total), (1, 3));
        assert_eq!(outcome.answers.len(), 3);
        assert!(outcome.answers[1].answer.is_none());
        assert!(!outcome.answers[2].correct);
    }

    #[test]
    fn test_wrong_and_out_of_range_choices() {
        let questions = vec![mc(1), mc(1), mc(1)];
        let answers = vec![
            choice(&questions[0], 0),
            choice(&questions[1], 7),
            text(&questions[2], "Green"),
        ];

        let outcome = score_quiz(&questions, &answers).unwrap();
        assert_eq!(outcome.score, 0);
        assert_eq!(outcome.answers[0].answer.as_deref(), Some("Red"));
        assert_eq!(outcome.answers[1].answer, None);
        assert_eq!(outcome.answers[2].answer, None);
    }

    #[test]
    fn test_blank_short_answer_is_wrong() {
        let questions = vec![sa("owl")];
        let outcome = score_quiz(&questions, &[text(&questions[0], "   ")]).unwrap();
        assert_eq!(outcome.score, 0);
        assert_eq!(outcome.answers[0].answer, None);
    }

    #[test]
    fn test_unknown_question_rejected() {
        let questions = vec![mc(0)];
        let stray = SubmittedAnswer {
            question_id: Uuid::new_v4(),
            choice: Some(0),
            text: None,
        };
        assert!(matches!(
            score_quiz(&questions, &[stray]),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn test_duplicate_answer_rejected() {
        let questions = vec![mc(0)];
        let answers = vec![choice(&questions[0], 0), choice(&questions[0], 1)];
        assert!(matches!(
            score_quiz(&questions, &answers),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn test_overlong_answer_rejected() {
        let questions = vec![sa("owl")];
        let answers = vec![text(&questions[0], &"a".repeat(MAX_ANSWER_CHARS + 1))];
        assert!(score_quiz(&questions, &answers).is_err());
    }

    #[test]
    fn test_results_follow_question_order() {
        let questions = vec![sa("one"), sa("two")];
        let answers = vec![text(&questions[1], "two"), text(&questions[0], "uno")];

        let results = score_quiz(&questions, &answers).unwrap().results();
        assert_eq!(
            results,
            vec![
                QuestionResult {
                    question_id: questions[0].id,
                    correct: false
                },
                QuestionResult {
                    question_id: questions[1].id,
                    correct: true
                },
            ]
        );
    }

    #[test]
    fn test_empty_quiz() {
        let outcome = score_quiz(&[], &[]).unwrap();
        assert_eq!((outcome.score, outcome.total), (0, 0));
    }
}
