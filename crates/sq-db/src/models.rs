use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Back-office user (teacher or admin)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    /// `admin` or `teacher`
    pub role: String,
    pub avatar_url: Option<String>,
    /// `false` while an invitation is still pending
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields needed to check a password login
#[derive(Debug, Clone, FromRow)]
pub struct UserCredentials {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub role: String,
    /// `None` until the user accepts their invitation
    pub password_hash: Option<String>,
}

/// Pending invitation joined with the invited user
#[derive(Debug, Clone, FromRow)]
pub struct PendingInvitation {
    pub invitation_id: Uuid,
    pub user_id: Uuid,
    pub email: String,
    pub display_name: String,
    pub role: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Full story, as edited in the back-office and read by students
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Story {
    pub id: Uuid,
    pub title: String,
    pub summary: Option<String>,
    pub body: String,
    pub category_id: Option<Uuid>,
    pub cover_image_url: Option<String>,
    pub video_url: Option<String>,
    pub author_id: Option<Uuid>,
    pub published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Story row for list views (no body)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StoryListItem {
    pub id: Uuid,
    pub title: String,
    pub summary: Option<String>,
    pub category_id: Option<Uuid>,
    pub category_name: Option<String>,
    pub cover_image_url: Option<String>,
    pub author_id: Option<Uuid>,
    pub author_name: Option<String>,
    pub published: bool,
    pub question_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Writable story fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryInput {
    pub title: String,
    pub summary: Option<String>,
    pub body: String,
    pub category_id: Option<Uuid>,
    pub cover_image_url: Option<String>,
    pub video_url: Option<String>,
    pub published: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QuizQuestion {
    pub id: Uuid,
    pub story_id: Uuid,
    pub position: i32,
    pub prompt: String,
    /// `multiple_choice` or `short_answer`
    pub kind: String,
    pub options: Vec<String>,
    pub correct_option: Option<i32>,
    pub correct_answer: Option<String>,
}

/// Insert struct for quiz questions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizQuestionInsert {
    pub position: i32,
    pub prompt: String,
    pub kind: String,
    pub options: Vec<String>,
    pub correct_option: Option<i32>,
    pub correct_answer: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WordSearchGame {
    pub id: Uuid,
    pub title: String,
    pub category_id: Option<Uuid>,
    pub words: Vec<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MysteryBoxGame {
    pub id: Uuid,
    pub title: String,
    pub category_id: Option<Uuid>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MysteryBoxItem {
    pub id: Uuid,
    pub game_id: Uuid,
    pub position: i32,
    pub word: String,
    pub hint: Option<String>,
    pub image_url: Option<String>,
}

/// Insert struct for mystery-box items
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MysteryBoxItemInsert {
    pub position: i32,
    pub word: String,
    pub hint: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AccessCode {
    pub id: Uuid,
    pub code: String,
    /// `story`, `word_search` or `mystery_box`
    pub content_kind: String,
    pub content_id: Uuid,
    pub label: Option<String>,
    pub created_by: Option<Uuid>,
    pub expires_at: Option<DateTime<Utc>>,
    pub used_at: Option<DateTime<Utc>>,
    pub used_by_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Filters for listing access codes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccessCodeFilter {
    pub created_by: Option<Uuid>,
    pub content_kind: Option<String>,
    pub content_id: Option<Uuid>,
    /// `unused`, `used` or `expired`
    pub status: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Submission {
    pub id: Uuid,
    pub code_id: Uuid,
    pub story_id: Uuid,
    pub student_name: String,
    pub score: i32,
    pub total: i32,
    pub submitted_at: DateTime<Utc>,
}

/// Insert struct for one graded answer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionAnswerInsert {
    pub question_id: Uuid,
    pub answer: Option<String>,
    pub correct: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: String,
    pub message: String,
    pub link: Option<String>,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
