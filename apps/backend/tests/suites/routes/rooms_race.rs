use actix_web::http::StatusCode;
use actix_web::test;
use backend_test_support::unique_helpers::unique_session;
use serde_json::json;

use super::json_body;
use crate::common::as_player;
use crate::post_as;
use crate::support::fixtures::{wrong_solution, GIVEN, SOLUTION};
use crate::support::{build_test_state, test_app};

/// Create a two-player race, ready the guest and start it. Returns the code.
macro_rules! started_race {
    ($app:expr, $host:expr, $guest:expr) => {{
        let (_, room) = post_as!(
            $app,
            "/api/rooms",
            $host,
            json!({"kind": "sudoku", "difficulty": "easy", "max_players": 2})
        );
        let code = room["code"].as_str().unwrap_or_default().to_string();
        post_as!($app, format!("/api/rooms/{code}/join"), $guest);
        post_as!($app, format!("/api/rooms/{code}/ready"), $guest);
        let (status, _) = post_as!($app, format!("/api/rooms/{code}/start"), $host);
        assert_eq!(status, StatusCode::OK);
        code
    }};
}

#[actix_web::test]
async fn test_start_hands_each_racer_the_given_grid() -> Result<(), Box<dyn std::error::Error>> {
    let app = test_app!(build_test_state().await);
    let (host, guest) = (unique_session("host"), unique_session("guest"));
    let code = started_race!(app, host, guest);

    let req = as_player(
        test::TestRequest::get().uri(&format!("/api/rooms/{code}")),
        &guest,
    )
    .to_request();
    let room = json_body(test::call_service(&app, req).await).await;
    assert_eq!(room["status"], "playing");
    assert_eq!(room["game"]["kind"], "sudoku");
    assert_eq!(room["game"]["given"], json!(GIVEN));
    assert_eq!(room["me"]["grid"], json!(GIVEN));
    assert!(room["game"].get("solution").is_none());
    assert!(room["started_at"].is_string());
    Ok(())
}

#[actix_web::test]
async fn test_set_value_reports_conflicts_and_counts_errors(
) -> Result<(), Box<dyn std::error::Error>> {
    let app = test_app!(build_test_state().await);
    let (host, guest) = (unique_session("host"), unique_session("guest"));
    let code = started_race!(app, host, guest);
    let uri = format!("/api/rooms/{code}/move");

    // (0,2) solves to 4; a 5 clashes with the given 5 at (0,0)
    let (status, body) = post_as!(
        app,
        uri,
        guest,
        json!({"type": "set_value", "row": 0, "col": 2, "value": 5})
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["conflicts"], json!([{"row": 0, "col": 0}]));
    let me = &body["room"]["players"][1]["race"];
    assert_eq!(me["errors"], 1);

    let (status, body) = post_as!(
        app,
        uri,
        guest,
        json!({"type": "set_value", "row": 0, "col": 2, "value": 4})
    );
    assert_eq!(status, StatusCode::OK);
    assert!(body.get("conflicts").is_none());
    assert_eq!(body["room"]["me"]["grid"][0][2], 4);
    assert!(body["room"]["players"][1]["race"]["progress"].as_u64() > Some(0));

    // Other racers never see the grid
    assert!(body["room"]["players"][1].get("grid").is_none());
    Ok(())
}

#[actix_web::test]
async fn test_given_cells_and_bad_values_are_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let app = test_app!(build_test_state().await);
    let (host, guest) = (unique_session("host"), unique_session("guest"));
    let code = started_race!(app, host, guest);
    let uri = format!("/api/rooms/{code}/move");

    let (status, body) = post_as!(
        app,
        uri,
        host,
        json!({"type": "set_value", "row": 0, "col": 0, "value": 1})
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_MOVE");

    let (status, body) = post_as!(
        app,
        uri,
        host,
        json!({"type": "set_value", "row": 9, "col": 0, "value": 1})
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_MOVE");

    let (status, body) = post_as!(app, uri, host, json!({"type": "place", "row": 1, "col": 1}));
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "WRONG_GAME_KIND");
    Ok(())
}

#[actix_web::test]
async fn test_wrong_solution_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let app = test_app!(build_test_state().await);
    let (host, guest) = (unique_session("host"), unique_session("guest"));
    let code = started_race!(app, host, guest);

    let (status, body) = post_as!(
        app,
        format!("/api/rooms/{code}/complete"),
        host,
        json!({"grid": wrong_solution()})
    );
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INCORRECT_SOLUTION");
    Ok(())
}

#[actix_web::test]
async fn test_race_ends_when_everyone_is_done() -> Result<(), Box<dyn std::error::Error>> {
    let app = test_app!(build_test_state().await);
    let (host, guest) = (unique_session("host"), unique_session("guest"));
    let code = started_race!(app, host, guest);

    let (status, body) = post_as!(
        app,
        format!("/api/rooms/{code}/complete"),
        guest,
        json!({"grid": SOLUTION})
    );
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["room"]["status"], "playing");
    assert_eq!(body["room"]["players"][1]["race"]["finished"], true);

    // Finishing twice is refused
    let (status, body) = post_as!(
        app,
        format!("/api/rooms/{code}/complete"),
        guest,
        json!({"grid": SOLUTION})
    );
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "ALREADY_FINISHED");

    let (status, body) = post_as!(app, format!("/api/rooms/{code}/give-up"), host);
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["room"]["status"], "finished");
    assert_eq!(body["room"]["result"]["winner_id"], guest.as_str());
    assert_eq!(body["room"]["result"]["reason"], "completed");

    let req = as_player(test::TestRequest::get().uri("/api/sessions/me"), &guest).to_request();
    let me = json_body(test::call_service(&app, req).await).await;
    assert_eq!(me["stats"]["wins"], 1);

    let req = as_player(test::TestRequest::get().uri("/api/sessions/me"), &host).to_request();
    let me = json_body(test::call_service(&app, req).await).await;
    assert_eq!(me["stats"]["losses"], 1);
    Ok(())
}

#[actix_web::test]
async fn test_everyone_giving_up_ends_without_winner() -> Result<(), Box<dyn std::error::Error>> {
    let app = test_app!(build_test_state().await);
    let (host, guest) = (unique_session("host"), unique_session("guest"));
    let code = started_race!(app, host, guest);

    post_as!(app, format!("/api/rooms/{code}/give-up"), host);
    let (status, body) = post_as!(app, format!("/api/rooms/{code}/give-up"), guest);
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["room"]["status"], "finished");
    assert!(body["room"]["result"]["winner_id"].is_null());
    assert_eq!(body["room"]["result"]["reason"], "all_gave_up");
    Ok(())
}
