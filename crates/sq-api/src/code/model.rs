use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sq_db::{
    models::AccessCode,
    repositories::{mystery_box, story, word_search},
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::ApiError;

/// What an access code opens. Stored as text in `access_codes.content_kind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Story,
    WordSearch,
    MysteryBox,
}

impl ContentKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Story => "story",
            Self::WordSearch => "word_search",
            Self::MysteryBox => "mystery_box",
        }
    }

    /// Story codes are spent by the quiz; game codes when redeemed.
    pub const fn consumed_at_redemption(self) -> bool {
        !matches!(self, Self::Story)
    }
}

impl FromStr for ContentKind {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "story" => Ok(Self::Story),
            "word_search" => Ok(Self::WordSearch),
            "mystery_box" => Ok(Self::MysteryBox),
            other => Err(ApiError::Validation(format!(
                "Unknown content kind: '{other}'"
            ))),
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Title and owner of the content behind a code.
#[derive(Debug, Clone)]
pub struct ContentRef {
    pub title: String,
    pub owner: Option<Uuid>,
    /// Drafts cannot be played. Games have no draft state.
    pub published: bool,
}

pub async fn find_content(
    pool: &PgPool,
    kind: ContentKind,
    id: Uuid,
) -> Result<Option<ContentRef>, ApiError> {
    let content = match kind {
        ContentKind::Story => story::find_by_id(pool, id).await?.map(|s| ContentRef {
            title: s.title,
            owner: s.author_id,
            published: s.published,
        }),
        ContentKind::WordSearch => word_search::find_by_id(pool, id).await?.map(|g| ContentRef {
            title: g.title,
            owner: g.created_by,
            published: true,
        }),
        ContentKind::MysteryBox => mystery_box::find_by_id(pool, id).await?.map(|g| ContentRef {
            title: g.title,
            owner: g.created_by,
            published: true,
        }),
    };
    Ok(content)
}

/// Unknown, spent, revoked and expired codes all look the same to students.
pub fn invalid_code() -> ApiError {
    ApiError::NotFound("Invalid or expired code".to_string())
}

/// Unused and unexpired. Revoked codes never load in the first place.
pub fn is_redeemable(code: &AccessCode, now: DateTime<Utc>) -> bool {
    code.used_at.is_none() && code.expires_at.is_none_or(|at| at > now)
}
