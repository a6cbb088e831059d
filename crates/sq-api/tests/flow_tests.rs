//! End-to-end flows against a real database.
//!
//! Run with `TEST_DATABASE_URL=... cargo test -- --ignored`.

use crate::common::{self, TestClient, TestStateBuilder, TestResponse};
use axum::http::StatusCode;
use chrono::{Duration, Utc};
use serde_json::{Value, json};
use sq_api::{ApiState, auth::Role, word_search::seed_for_code};
use sq_db::repositories::invitation;
use uuid::Uuid;

const PASSWORD: &str = "storytime42";

struct Staff {
    id: Uuid,
    cookie: String,
}

async fn login_teacher(state: &ApiState, client: &TestClient) -> Staff {
    let email = common::test_data::unique_email("teacher");
    let id = common::db::create_user(&state.pool, &email, "teacher", PASSWORD)
        .await
        .expect("Failed to create teacher");

    let response = client
        .send(
            "POST",
            "/auth/login",
            Some(&json!({ "email": email, "password": PASSWORD })),
            None,
            &common::test_data::unique_ip(),
        )
        .await;
    response.assert_status(StatusCode::OK);

    let cookie = response
        .cookie_pair("auth_token")
        .expect("login should set the auth cookie");
    Staff { id, cookie }
}

async fn generate_code(client: &TestClient, staff: &Staff, kind: &str, content_id: &str) -> Value {
    let response = client
        .post_json_with_cookie(
            "/codes",
            &json!({ "content_kind": kind, "content_id": content_id, "label": "Class 4B" }),
            &staff.cookie,
        )
        .await;
    response.assert_status(StatusCode::CREATED);
    let mut codes: Vec<Value> = response.json();
    codes.remove(0)
}

async fn redeem(client: &TestClient, code: &str, name: &str) -> TestResponse {
    client
        .send(
            "POST",
            "/play/redeem",
            Some(&json!({ "code": code, "student_name": name })),
            None,
            &common::test_data::unique_ip(),
        )
        .await
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_story_quiz_flow() {
    let state = TestStateBuilder::new()
        .build()
        .await
        .expect("Failed to create test state");
    let client = TestClient::for_state(&state);
    let teacher = login_teacher(&state, &client).await;

    // Story with a two-question quiz
    let response = client
        .post_json_with_cookie(
            "/stories",
            &json!({
                "title": "The Clever Fox",
                "body": "A fox outwits a crow to win a piece of cheese.",
                "published": true
            }),
            &teacher.cookie,
        )
        .await;
    response.assert_status(StatusCode::CREATED);
    let story: Value = response.json();
    let story_id = story["id"].as_str().expect("story id").to_string();

    let response = client
        .send(
            "PUT",
            &format!("/stories/{story_id}/questions"),
            Some(&json!({ "questions": [
                {
                    "prompt": "What did the crow drop?",
                    "kind": "multiple_choice",
                    "options": ["A worm", "Cheese", "A feather"],
                    "correct_option": 1
                },
                {
                    "prompt": "Which animal tricked the crow?",
                    "kind": "short_answer",
                    "correct_answer": "The Fox"
                }
            ]})),
            Some(&teacher.cookie),
            "127.0.0.1",
        )
        .await;
    response.assert_status(StatusCode::OK);

    let code = generate_code(&client, &teacher, "story", &story_id).await;
    let code_text = code["code"].as_str().expect("code").to_string();

    // Lowercase with a dash still redeems
    let typed = format!("{}-{}", &code_text[..4], &code_text[4..]).to_lowercase();
    let response = redeem(&client, &typed, "Ada").await;
    response.assert_status(StatusCode::OK);
    let session_cookie = response
        .cookie_pair("play_session")
        .expect("redeem should set the session cookie");

    let response = client.get_with_cookie("/play/story", &session_cookie).await;
    response.assert_status(StatusCode::OK);
    let student_story: Value = response.json();
    let questions = student_story["questions"].as_array().expect("questions");
    assert_eq!(questions.len(), 2);
    assert!(questions[0].get("correct_option").is_none());
    assert!(questions[1].get("correct_answer").is_none());

    let response = client
        .post_json_with_cookie(
            "/play/quiz",
            &json!({ "answers": [
                { "question_id": questions[0]["id"], "choice": 1 },
                { "question_id": questions[1]["id"], "text": "  the fox " }
            ]}),
            &session_cookie,
        )
        .await;
    response.assert_status(StatusCode::OK);
    let result: Value = response.json();
    assert_eq!(result["score"], 2);
    assert_eq!(result["total"], 2);

    // The code was consumed by the submission
    redeem(&client, &code_text, "Grace")
        .await
        .assert_status(StatusCode::NOT_FOUND);
    client
        .get_with_cookie("/play/story", &session_cookie)
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let response = client
        .get_with_cookie(&format!("/stories/{story_id}/submissions"), &teacher.cookie)
        .await;
    response.assert_status(StatusCode::OK);
    let submissions: Vec<Value> = response.json();
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0]["student_name"], "Ada");

    let response = client
        .get_with_cookie("/notifications/unread-count", &teacher.cookie)
        .await;
    response.assert_status(StatusCode::OK);
    let unread: Value = response.json();
    assert!(unread["unread"].as_i64().unwrap_or(0) >= 1);

    common::db::delete_user(&state.pool, teacher.id)
        .await
        .expect("Failed to clean up");
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_unpublished_story_gets_no_codes() {
    let state = TestStateBuilder::new()
        .build()
        .await
        .expect("Failed to create test state");
    let client = TestClient::for_state(&state);
    let teacher = login_teacher(&state, &client).await;

    let response = client
        .post_json_with_cookie(
            "/stories",
            &json!({ "title": "Draft", "body": "Not ready yet." }),
            &teacher.cookie,
        )
        .await;
    response.assert_status(StatusCode::CREATED);
    let story: Value = response.json();

    client
        .post_json_with_cookie(
            "/codes",
            &json!({ "content_kind": "story", "content_id": story["id"] }),
            &teacher.cookie,
        )
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    common::db::delete_user(&state.pool, teacher.id)
        .await
        .expect("Failed to clean up");
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_teachers_cannot_touch_each_others_stories() {
    let state = TestStateBuilder::new()
        .build()
        .await
        .expect("Failed to create test state");
    let client = TestClient::for_state(&state);
    let owner = login_teacher(&state, &client).await;
    let other = login_teacher(&state, &client).await;

    let response = client
        .post_json_with_cookie(
            "/stories",
            &json!({ "title": "Mine", "body": "Only mine.", "published": true }),
            &owner.cookie,
        )
        .await;
    let story: Value = response.json();
    let story_id = story["id"].as_str().expect("story id");

    client
        .send(
            "DELETE",
            &format!("/stories/{story_id}"),
            None,
            Some(&other.cookie),
            "127.0.0.1",
        )
        .await
        .assert_status(StatusCode::FORBIDDEN);

    client
        .post_json_with_cookie(
            "/codes",
            &json!({ "content_kind": "story", "content_id": story_id }),
            &other.cookie,
        )
        .await
        .assert_status(StatusCode::FORBIDDEN);

    for staff in [owner, other] {
        common::db::delete_user(&state.pool, staff.id)
            .await
            .expect("Failed to clean up");
    }
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_word_search_flow() {
    let state = TestStateBuilder::new()
        .build()
        .await
        .expect("Failed to create test state");
    let client = TestClient::for_state(&state);
    let teacher = login_teacher(&state, &client).await;

    let words = ["forest", "river", "castle", "dragon"];
    let response = client
        .post_json_with_cookie(
            "/word-search-games",
            &json!({ "title": "Fairy tale words", "words": words }),
            &teacher.cookie,
        )
        .await;
    response.assert_status(StatusCode::CREATED);
    let game: Value = response.json();
    let game_id = game["id"].as_str().expect("game id").to_string();

    let code = generate_code(&client, &teacher, "word_search", &game_id).await;
    let code_id: Uuid = code["id"]
        .as_str()
        .and_then(|id| id.parse().ok())
        .expect("code id");

    let response = redeem(&client, code["code"].as_str().expect("code"), "Ada").await;
    response.assert_status(StatusCode::OK);
    let session_cookie = response.cookie_pair("play_session").expect("session");

    // Game codes are consumed at redemption
    redeem(&client, code["code"].as_str().expect("code"), "Grace")
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let first = client.get_with_cookie("/play/word-search", &session_cookie).await;
    first.assert_status(StatusCode::OK);
    let second = client.get_with_cookie("/play/word-search", &session_cookie).await;
    let first_grid: Value = first.json();
    let second_grid: Value = second.json();
    assert_eq!(first_grid["rows"], second_grid["rows"]);

    let puzzle = sq_wordsearch::generate(
        &words,
        seed_for_code(code_id),
        &sq_wordsearch::PuzzleConfig::default(),
    );
    let placement = &puzzle.placements()[0];
    let (start, end) = (placement.start, placement.end());

    // Dragging backwards finds the word too
    let response = client
        .post_json_with_cookie(
            "/play/word-search/check",
            &json!({
                "start": { "row": end.row, "col": end.col },
                "end": { "row": start.row, "col": start.col }
            }),
            &session_cookie,
        )
        .await;
    response.assert_status(StatusCode::OK);
    let check: Value = response.json();
    assert_eq!(check["found"], true);
    assert_eq!(check["word"], placement.word.as_str());

    common::db::delete_user(&state.pool, teacher.id)
        .await
        .expect("Failed to clean up");
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_mystery_box_flow() {
    let state = TestStateBuilder::new()
        .build()
        .await
        .expect("Failed to create test state");
    let client = TestClient::for_state(&state);
    let teacher = login_teacher(&state, &client).await;

    let response = client
        .post_json_with_cookie(
            "/mystery-box-games",
            &json!({
                "title": "Animals",
                "items": [
                    { "word": "owl", "hint": "Hoots at night" },
                    { "word": "bear", "hint": "Loves honey" }
                ]
            }),
            &teacher.cookie,
        )
        .await;
    response.assert_status(StatusCode::CREATED);
    let game: Value = response.json();
    let game_id = game["id"].as_str().expect("game id").to_string();

    let code = generate_code(&client, &teacher, "mystery_box", &game_id).await;
    let response = redeem(&client, code["code"].as_str().expect("code"), "Ada").await;
    let session_cookie = response.cookie_pair("play_session").expect("session");

    let response = client.get_with_cookie("/play/mystery-box", &session_cookie).await;
    response.assert_status(StatusCode::OK);
    let play: Value = response.json();
    assert_eq!(play["total"], 2);
    assert_eq!(play["opened_count"], 0);
    assert!(play["boxes"][0]["word"].is_null());
    assert_eq!(play["boxes"][0]["hint"], "Hoots at night");
    let box_id = play["boxes"][0]["id"].as_str().expect("box id").to_string();

    let response = client
        .send(
            "POST",
            &format!("/play/mystery-box/{box_id}/open"),
            None,
            Some(&session_cookie),
            "127.0.0.1",
        )
        .await;
    response.assert_status(StatusCode::OK);
    let opened: Value = response.json();
    assert_eq!(opened["word"], "owl");
    let progress_cookie = response
        .cookie_pair("mystery_box_progress")
        .expect("opening a box should store progress");

    let both = format!("{session_cookie}; {progress_cookie}");
    let response = client.get_with_cookie("/play/mystery-box", &both).await;
    let play: Value = response.json();
    assert_eq!(play["opened_count"], 1);
    assert_eq!(play["boxes"][0]["word"], "owl");
    assert!(play["boxes"][1]["word"].is_null());

    common::db::delete_user(&state.pool, teacher.id)
        .await
        .expect("Failed to clean up");
}

/// Published story with a single multiple-choice question.
async fn published_story(client: &TestClient, teacher: &Staff) -> String {
    let response = client
        .post_json_with_cookie(
            "/stories",
            &json!({
                "title": "The Lost Mitten",
                "body": "A mitten dropped in the snow becomes a home for many animals.",
                "published": true
            }),
            &teacher.cookie,
        )
        .await;
    response.assert_status(StatusCode::CREATED);
    let story: Value = response.json();
    let story_id = story["id"].as_str().expect("story id").to_string();

    client
        .send(
            "PUT",
            &format!("/stories/{story_id}/questions"),
            Some(&json!({ "questions": [{
                "prompt": "Where was the mitten dropped?",
                "kind": "multiple_choice",
                "options": ["In the snow", "In a river"],
                "correct_option": 0
            }]})),
            Some(&teacher.cookie),
            "127.0.0.1",
        )
        .await
        .assert_status(StatusCode::OK);

    story_id
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_revoked_code_cannot_be_redeemed() {
    let state = TestStateBuilder::new()
        .build()
        .await
        .expect("Failed to create test state");
    let client = TestClient::for_state(&state);
    let teacher = login_teacher(&state, &client).await;
    let story_id = published_story(&client, &teacher).await;

    let code = generate_code(&client, &teacher, "story", &story_id).await;
    let code_id = code["id"].as_str().expect("code id");
    let code_text = code["code"].as_str().expect("code");

    client
        .send(
            "DELETE",
            &format!("/codes/{code_id}"),
            None,
            Some(&teacher.cookie),
            "127.0.0.1",
        )
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let response = redeem(&client, code_text, "Ada").await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["error"], "Invalid or expired code");

    common::db::delete_user(&state.pool, teacher.id)
        .await
        .expect("Failed to clean up");
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_expired_code_cannot_be_redeemed() {
    let state = TestStateBuilder::new()
        .build()
        .await
        .expect("Failed to create test state");
    let client = TestClient::for_state(&state);
    let teacher = login_teacher(&state, &client).await;
    let story_id = published_story(&client, &teacher).await;

    let code = generate_code(&client, &teacher, "story", &story_id).await;
    let code_id: Uuid = code["id"]
        .as_str()
        .and_then(|id| id.parse().ok())
        .expect("code id");
    let code_text = code["code"].as_str().expect("code");

    // The API only accepts future expiry dates
    sqlx::query("UPDATE access_codes SET expires_at = NOW() - interval '1 hour' WHERE id = $1")
        .bind(code_id)
        .execute(&state.pool)
        .await
        .expect("Failed to expire code");

    let response = redeem(&client, code_text, "Ada").await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["error"], "Invalid or expired code");

    common::db::delete_user(&state.pool, teacher.id)
        .await
        .expect("Failed to clean up");
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_purge_keeps_quiz_results() {
    let state = TestStateBuilder::new()
        .build()
        .await
        .expect("Failed to create test state");
    let client = TestClient::for_state(&state);
    let teacher = login_teacher(&state, &client).await;
    let story_id = published_story(&client, &teacher).await;
    let story_uuid: Uuid = story_id.parse().expect("story uuid");

    let code = generate_code(&client, &teacher, "story", &story_id).await;
    let code_id: Uuid = code["id"]
        .as_str()
        .and_then(|id| id.parse().ok())
        .expect("code id");

    let response = redeem(&client, code["code"].as_str().expect("code"), "Ada").await;
    response.assert_status(StatusCode::OK);
    let session_cookie = response
        .cookie_pair("play_session")
        .expect("redeem should set the session cookie");

    let response = client.get_with_cookie("/play/story", &session_cookie).await;
    response.assert_status(StatusCode::OK);
    let student_story: Value = response.json();
    let question_id = student_story["questions"][0]["id"].clone();

    client
        .post_json_with_cookie(
            "/play/quiz",
            &json!({ "answers": [{ "question_id": question_id, "choice": 0 }] }),
            &session_cookie,
        )
        .await
        .assert_status(StatusCode::OK);

    // Revoke the used code, then age both soft deletes past retention
    client
        .send(
            "DELETE",
            &format!("/codes/{code_id}"),
            None,
            Some(&teacher.cookie),
            "127.0.0.1",
        )
        .await
        .assert_status(StatusCode::NO_CONTENT);
    sqlx::query("UPDATE access_codes SET deleted_at = NOW() - interval '400 days' WHERE id = $1")
        .bind(code_id)
        .execute(&state.pool)
        .await
        .expect("Failed to age code");
    sqlx::query("UPDATE stories SET deleted_at = NOW() - interval '400 days' WHERE id = $1")
        .bind(story_uuid)
        .execute(&state.pool)
        .await
        .expect("Failed to age story");

    sq_api::jobs::purge_soft_deleted(&state.pool, 30)
        .await
        .expect("Purge failed");

    let (submissions,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM submissions WHERE code_id = $1 AND story_id = $2")
            .bind(code_id)
            .bind(story_uuid)
            .fetch_one(&state.pool)
            .await
            .expect("Failed to count submissions");
    assert_eq!(submissions, 1);

    let (answers,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM submission_answers a \
         JOIN submissions s ON s.id = a.submission_id WHERE s.code_id = $1",
    )
    .bind(code_id)
    .fetch_one(&state.pool)
    .await
    .expect("Failed to count answers");
    assert_eq!(answers, 1);

    sqlx::query("DELETE FROM submissions WHERE code_id = $1")
        .bind(code_id)
        .execute(&state.pool)
        .await
        .expect("Failed to clean up submissions");
    common::db::delete_user(&state.pool, teacher.id)
        .await
        .expect("Failed to clean up");
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn test_expired_invitations_are_cleared() {
    let state = TestStateBuilder::new()
        .build()
        .await
        .expect("Failed to create test state");
    let (admin_id, _) = common::staff_session(&state, Role::Admin)
        .await
        .expect("Failed to create admin");
    let (invitee_id, _) = common::staff_session(&state, Role::Teacher)
        .await
        .expect("Failed to create invitee");

    let stale = invitation::insert_invitation(
        &state.pool,
        invitee_id,
        admin_id,
        &format!("stale-{invitee_id}"),
        Utc::now() - Duration::hours(1),
    )
    .await
    .expect("Failed to insert stale invitation");
    let open = invitation::insert_invitation(
        &state.pool,
        invitee_id,
        admin_id,
        &format!("open-{invitee_id}"),
        Utc::now() + Duration::days(2),
    )
    .await
    .expect("Failed to insert open invitation");

    let removed = invitation::delete_expired(&state.pool)
        .await
        .expect("Cleanup failed");
    assert!(removed >= 1);

    let remaining: Vec<Uuid> =
        sqlx::query_scalar("SELECT id FROM invitations WHERE user_id = $1")
            .bind(invitee_id)
            .fetch_all(&state.pool)
            .await
            .expect("Failed to list invitations");
    assert_eq!(remaining, vec![open]);
    assert!(!remaining.contains(&stale));

    for user_id in [admin_id, invitee_id] {
        common::db::delete_user(&state.pool, user_id)
            .await
            .expect("Failed to clean up");
    }
}
