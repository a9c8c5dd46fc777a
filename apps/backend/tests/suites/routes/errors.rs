use actix_web::http::StatusCode;
use actix_web::test;
use backend_test_support::problem_details::assert_problem_details_from_service_response;
use backend_test_support::unique_helpers::unique_session;
use serde_json::json;

use crate::common::as_player;
use crate::post_as;
use crate::support::{build_test_state, test_app};

#[actix_web::test]
async fn test_malformed_room_code_is_bad_request() -> Result<(), Box<dyn std::error::Error>> {
    let app = test_app!(build_test_state().await);

    let req = as_player(test::TestRequest::get().uri("/api/rooms/no!"), "someone").to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem_details_from_service_response(
        resp,
        "INVALID_ROOM_CODE",
        StatusCode::BAD_REQUEST,
        None,
    )
    .await;
    Ok(())
}

#[actix_web::test]
async fn test_unknown_room_is_not_found() -> Result<(), Box<dyn std::error::Error>> {
    let app = test_app!(build_test_state().await);

    let req = as_player(
        test::TestRequest::post().uri("/api/rooms/ZZZZ99/join"),
        "someone",
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem_details_from_service_response(
        resp,
        "ROOM_NOT_FOUND",
        StatusCode::NOT_FOUND,
        Some("ZZZZ99"),
    )
    .await;
    Ok(())
}

#[actix_web::test]
async fn test_malformed_json_body_is_bad_request() -> Result<(), Box<dyn std::error::Error>> {
    let app = test_app!(build_test_state().await);

    let req = as_player(test::TestRequest::post().uri("/api/rooms"), "someone")
        .insert_header(("content-type", "application/json"))
        .set_payload("{\"kind\": ")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem_details_from_service_response(resp, "BAD_REQUEST", StatusCode::BAD_REQUEST, None)
        .await;
    Ok(())
}

#[actix_web::test]
async fn test_unknown_game_kind_is_bad_request() -> Result<(), Box<dyn std::error::Error>> {
    let app = test_app!(build_test_state().await);

    let (status, body) = post_as!(app, "/api/rooms", "someone", json!({"kind": "chess"}));
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
    Ok(())
}

#[actix_web::test]
async fn test_non_member_actions_are_forbidden() -> Result<(), Box<dyn std::error::Error>> {
    let app = test_app!(build_test_state().await);
    let host = unique_session("host");
    let (_, room) = post_as!(app, "/api/rooms", host, json!({"kind": "caro"}));
    let code = room["code"].as_str().unwrap_or_default().to_string();

    let req = as_player(
        test::TestRequest::post().uri(&format!("/api/rooms/{code}/leave")),
        &unique_session("stranger"),
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem_details_from_service_response(
        resp,
        "PLAYER_NOT_IN_ROOM",
        StatusCode::FORBIDDEN,
        None,
    )
    .await;
    Ok(())
}

#[actix_web::test]
async fn test_moves_before_start_conflict() -> Result<(), Box<dyn std::error::Error>> {
    let app = test_app!(build_test_state().await);
    let host = unique_session("host");
    let (_, room) = post_as!(app, "/api/rooms", host, json!({"kind": "caro", "vs_bot": true}));
    let code = room["code"].as_str().unwrap_or_default().to_string();

    let (status, body) = post_as!(
        app,
        format!("/api/rooms/{code}/move"),
        host,
        json!({"type": "place", "row": 7, "col": 7})
    );
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "GAME_NOT_STARTED");
    Ok(())
}

#[actix_web::test]
async fn test_missing_session_is_unauthorized() -> Result<(), Box<dyn std::error::Error>> {
    let app = test_app!(build_test_state().await);

    let req = test::TestRequest::post()
        .uri("/api/rooms")
        .set_json(json!({"kind": "caro"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_problem_details_from_service_response(
        resp,
        "SESSION_REQUIRED",
        StatusCode::UNAUTHORIZED,
        None,
    )
    .await;
    Ok(())
}
