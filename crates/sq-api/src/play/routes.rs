use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use axum_extra::extract::PrivateCookieJar;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sq_db::{
    models::{MysteryBoxGame, MysteryBoxItem},
    repositories::{access_code, mystery_box, notification, quiz, story, word_search},
};
use sq_wordsearch::{Position, Puzzle};
use uuid::Uuid;

use super::{MysteryBoxProgress, PlaySession};
use crate::{
    ApiState,
    auth::cookies::{
        MYSTERY_BOX_PROGRESS_COOKIE, MYSTERY_BOX_PROGRESS_DAYS, PLAY_SESSION_COOKIE,
        build_cookie, removal_cookie,
    },
    code::{ContentKind, find_content, generator::normalize_code, invalid_code, is_redeemable},
    error::ApiError,
    middleware::rate_limit,
    quiz::{StudentQuestion, SubmittedAnswer, SubmittedQuiz, submit_quiz},
    validation::required_text,
    word_search::{PuzzleView, seed_for_code},
};

const MAX_STUDENT_NAME_CHARS: usize = 60;

pub fn routes() -> Router<ApiState> {
    use crate::make_rate_limit_layer;

    // Code guessing is the attack here, so redemption gets the strictest limit
    let redeem_routes = Router::new()
        .route("/play/redeem", post(redeem))
        .layer(make_rate_limit_layer!(
            rate_limit::REDEEM_REPLENISH_MS,
            rate_limit::REDEEM_BURST_SIZE
        ));

    let session_routes = Router::new()
        .route("/play/session", get(current_session))
        .route("/play/story", get(play_story))
        .route("/play/quiz", post(submit))
        .route("/play/word-search", get(play_word_search))
        .route("/play/word-search/check", post(check_selection))
        .route("/play/mystery-box", get(play_mystery_box))
        .route("/play/mystery-box/reset", post(reset_mystery_box))
        .route("/play/mystery-box/{item_id}/open", post(open_box))
        .route("/play/leave", post(leave))
        .layer(make_rate_limit_layer!(
            rate_limit::GENERAL_REPLENISH_MS,
            rate_limit::GENERAL_BURST_SIZE
        ));

    Router::new().merge(redeem_routes).merge(session_routes)
}

#[derive(Debug, Deserialize)]
struct RedeemRequest {
    code: String,
    student_name: String,
}

#[derive(Debug, Serialize)]
struct SessionInfo {
    content_kind: ContentKind,
    content_id: Uuid,
    title: String,
    student_name: String,
}

/// Exchange an access code for a play session
async fn redeem(
    State(state): State<ApiState>,
    jar: PrivateCookieJar,
    Json(body): Json<RedeemRequest>,
) -> Result<(PrivateCookieJar, Json<SessionInfo>), ApiError> {
    let student_name = required_text("Name", &body.student_name, MAX_STUDENT_NAME_CHARS)?;

    let rejected = |kind: &str| {
        crate::metrics::record_code_redemption(kind, false);
        invalid_code()
    };

    let Some(code) = normalize_code(&body.code) else {
        return Err(rejected("unknown"));
    };
    let Some(access) = access_code::find_redeemable(&state.pool, &code).await? else {
        tracing::debug!("redemption rejected: no redeemable code");
        return Err(rejected("unknown"));
    };

    let kind: ContentKind = access.content_kind.parse()?;
    let content = find_content(&state.pool, kind, access.content_id)
        .await?
        .filter(|c| c.published)
        .ok_or_else(|| rejected(kind.as_str()))?;

    if kind.consumed_at_redemption() {
        let mut tx = state.pool.begin().await?;
        if !access_code::mark_used(&mut *tx, access.id, &student_name).await? {
            return Err(rejected(kind.as_str()));
        }
        if let Some(creator) = access.created_by {
            let link = format!("/codes?content_id={}", access.content_id);
            notification::insert(
                &mut *tx,
                creator,
                "code_redeemed",
                &format!(
                    "{student_name} started \"{}\" with code {}",
                    content.title, access.code
                ),
                Some(&link),
            )
            .await?;
        }
        tx.commit().await?;
    }

    let session = PlaySession::new(
        access.id,
        kind,
        access.content_id,
        student_name.clone(),
        state.cookies.play_session_hours,
    );
    let jar = jar.add(session.to_cookie(&state.cookies)?);

    crate::metrics::record_code_redemption(kind.as_str(), true);
    tracing::info!(code_id = %access.id, content_kind = %kind, "access code redeemed");

    Ok((
        jar,
        Json(SessionInfo {
            content_kind: kind,
            content_id: access.content_id,
            title: content.title,
            student_name,
        }),
    ))
}

/// Re-check the code behind a session.
///
/// Story codes must still be unused (the quiz spends them); game codes were
/// spent at redemption and only need to not be revoked.
async fn ensure_code_active(state: &ApiState, session: &PlaySession) -> Result<(), ApiError> {
    let code = access_code::find_by_id(&state.pool, session.code_id)
        .await?
        .ok_or_else(invalid_code)?;

    if session.content_kind == ContentKind::Story && !is_redeemable(&code, Utc::now()) {
        return Err(invalid_code());
    }
    Ok(())
}

async fn current_session(
    session: PlaySession,
    State(state): State<ApiState>,
) -> Result<Json<SessionInfo>, ApiError> {
    ensure_code_active(&state, &session).await?;
    let content = find_content(&state.pool, session.content_kind, session.content_id)
        .await?
        .ok_or_else(invalid_code)?;

    Ok(Json(SessionInfo {
        content_kind: session.content_kind,
        content_id: session.content_id,
        title: content.title,
        student_name: session.student_name,
    }))
}

#[derive(Debug, Serialize)]
struct StudentStory {
    id: Uuid,
    title: String,
    summary: Option<String>,
    body: String,
    cover_image_url: Option<String>,
    video_url: Option<String>,
    questions: Vec<StudentQuestion>,
}

/// The story and its quiz, without answers
async fn play_story(
    session: PlaySession,
    State(state): State<ApiState>,
) -> Result<Json<StudentStory>, ApiError> {
    session.expect_kind(ContentKind::Story)?;
    ensure_code_active(&state, &session).await?;

    let story = story::find_by_id(&state.pool, session.content_id)
        .await?
        .filter(|s| s.published)
        .ok_or_else(invalid_code)?;
    let questions = quiz::list_questions(&state.pool, story.id).await?;

    Ok(Json(StudentStory {
        id: story.id,
        title: story.title,
        summary: story.summary,
        body: story.body,
        cover_image_url: story.cover_image_url,
        video_url: story.video_url,
        questions: questions.into_iter().map(StudentQuestion::from).collect(),
    }))
}

#[derive(Debug, Deserialize)]
struct QuizRequest {
    #[serde(default)]
    answers: Vec<SubmittedAnswer>,
}

/// Grade the quiz and end the session
async fn submit(
    session: PlaySession,
    State(state): State<ApiState>,
    jar: PrivateCookieJar,
    Json(body): Json<QuizRequest>,
) -> Result<(PrivateCookieJar, Json<SubmittedQuiz>), ApiError> {
    session.expect_kind(ContentKind::Story)?;

    let result = submit_quiz(
        &state.pool,
        session.code_id,
        &session.student_name,
        &body.answers,
    )
    .await?;

    let jar = jar.remove(removal_cookie(PLAY_SESSION_COOKIE, &state.cookies));
    Ok((jar, Json(result)))
}

async fn session_puzzle(
    state: &ApiState,
    session: &PlaySession,
) -> Result<(String, Puzzle), ApiError> {
    session.expect_kind(ContentKind::WordSearch)?;
    ensure_code_active(state, session).await?;

    let game = word_search::find_by_id(&state.pool, session.content_id)
        .await?
        .ok_or_else(invalid_code)?;
    let puzzle = sq_wordsearch::generate(&game.words, seed_for_code(session.code_id), &state.puzzle);
    Ok((game.title, puzzle))
}

#[derive(Debug, Serialize)]
struct WordSearchPlay {
    title: String,
    #[serde(flatten)]
    puzzle: PuzzleView,
}

/// The puzzle for this code; the same code always gets the same grid
async fn play_word_search(
    session: PlaySession,
    State(state): State<ApiState>,
) -> Result<Json<WordSearchPlay>, ApiError> {
    let (title, puzzle) = session_puzzle(&state, &session).await?;
    crate::metrics::record_puzzle_generated(puzzle.placements().len(), puzzle.skipped().len());

    Ok(Json(WordSearchPlay {
        title,
        puzzle: PuzzleView::from(&puzzle),
    }))
}

#[derive(Debug, Deserialize)]
struct SelectionRequest {
    start: Position,
    end: Position,
}

#[derive(Debug, Serialize)]
struct SelectionResult {
    found: bool,
    word: Option<String>,
}

/// Whether a dragged line covers a hidden word, in either direction
async fn check_selection(
    session: PlaySession,
    State(state): State<ApiState>,
    Json(body): Json<SelectionRequest>,
) -> Result<Json<SelectionResult>, ApiError> {
    let (_, puzzle) = session_puzzle(&state, &session).await?;
    let word = puzzle
        .match_selection(body.start, body.end)
        .map(|placement| placement.word.clone());

    Ok(Json(SelectionResult {
        found: word.is_some(),
        word,
    }))
}

#[derive(Debug, Serialize)]
struct BoxView {
    id: Uuid,
    position: i32,
    opened: bool,
    hint: Option<String>,
    word: Option<String>,
    image_url: Option<String>,
}

impl BoxView {
    fn new(item: MysteryBoxItem, opened: bool) -> Self {
        Self {
            id: item.id,
            position: item.position,
            opened,
            hint: item.hint,
            word: opened.then_some(item.word),
            image_url: item.image_url.filter(|_| opened),
        }
    }
}

#[derive(Debug, Serialize)]
struct MysteryBoxPlay {
    game_id: Uuid,
    title: String,
    opened_count: usize,
    total: usize,
    boxes: Vec<BoxView>,
}

impl MysteryBoxPlay {
    fn new(game: MysteryBoxGame, items: Vec<MysteryBoxItem>, progress: &MysteryBoxProgress) -> Self {
        let boxes: Vec<BoxView> = items
            .into_iter()
            .map(|item| {
                let opened = progress.is_opened(game.id, item.position);
                BoxView::new(item, opened)
            })
            .collect();

        Self {
            game_id: game.id,
            title: game.title,
            opened_count: boxes.iter().filter(|b| b.opened).count(),
            total: boxes.len(),
            boxes,
        }
    }
}

async fn session_game(
    state: &ApiState,
    session: &PlaySession,
) -> Result<(MysteryBoxGame, Vec<MysteryBoxItem>), ApiError> {
    session.expect_kind(ContentKind::MysteryBox)?;
    ensure_code_active(state, session).await?;

    let game = mystery_box::find_by_id(&state.pool, session.content_id)
        .await?
        .ok_or_else(invalid_code)?;
    let items = mystery_box::list_items(&state.pool, game.id).await?;
    Ok((game, items))
}

fn read_progress(jar: &PrivateCookieJar) -> MysteryBoxProgress {
    jar.get(MYSTERY_BOX_PROGRESS_COOKIE)
        .map(|cookie| MysteryBoxProgress::from_cookie_value(cookie.value()))
        .unwrap_or_default()
}

fn write_progress(
    state: &ApiState,
    jar: PrivateCookieJar,
    progress: &MysteryBoxProgress,
) -> Result<PrivateCookieJar, ApiError> {
    let value = progress
        .to_cookie_value()
        .map_err(|e| ApiError::Cookie(format!("Failed to serialize progress: {e}")))?;
    Ok(jar.add(build_cookie(
        MYSTERY_BOX_PROGRESS_COOKIE,
        value,
        time::Duration::days(MYSTERY_BOX_PROGRESS_DAYS),
        &state.cookies,
    )))
}

/// The boxes, with words shown only for opened ones
async fn play_mystery_box(
    session: PlaySession,
    State(state): State<ApiState>,
    jar: PrivateCookieJar,
) -> Result<Json<MysteryBoxPlay>, ApiError> {
    let (game, items) = session_game(&state, &session).await?;
    let progress = read_progress(&jar);
    Ok(Json(MysteryBoxPlay::new(game, items, &progress)))
}

/// Open one box and reveal its word
async fn open_box(
    session: PlaySession,
    State(state): State<ApiState>,
    jar: PrivateCookieJar,
    Path(item_id): Path<Uuid>,
) -> Result<(PrivateCookieJar, Json<BoxView>), ApiError> {
    let (game, items) = session_game(&state, &session).await?;
    let item = items
        .into_iter()
        .find(|item| item.id == item_id)
        .ok_or_else(|| ApiError::NotFound("Box not found".to_string()))?;

    let mut progress = read_progress(&jar);
    progress.open(game.id, item.position);
    let jar = write_progress(&state, jar, &progress)?;

    Ok((jar, Json(BoxView::new(item, true))))
}

/// Close every box of the current game
async fn reset_mystery_box(
    session: PlaySession,
    State(state): State<ApiState>,
    jar: PrivateCookieJar,
) -> Result<(PrivateCookieJar, Json<MysteryBoxPlay>), ApiError> {
    let (game, items) = session_game(&state, &session).await?;

    let mut progress = read_progress(&jar);
    progress.reset(game.id);
    let jar = write_progress(&state, jar, &progress)?;

    Ok((jar, Json(MysteryBoxPlay::new(game, items, &progress))))
}

/// End the play session
async fn leave(
    State(state): State<ApiState>,
    jar: PrivateCookieJar,
) -> (PrivateCookieJar, StatusCode) {
    let jar = jar.remove(removal_cookie(PLAY_SESSION_COOKIE, &state.cookies));
    (jar, StatusCode::NO_CONTENT)
}
