// Rejected actions are reported to the sender only

use std::time::Duration;

use serde_json::json;

use super::race_room;
use crate::support::build_test_state;
use crate::support::websocket::{start_test_server, ws_url};
use crate::support::websocket_client::WebSocketClient;

#[tokio::test]
async fn test_actions_before_join_are_not_in_room() -> Result<(), Box<dyn std::error::Error>> {
    let state = build_test_state().await;
    let (server_handle, addr, server_join) = start_test_server(state).await?;

    let mut client =
        WebSocketClient::connect_retry(&ws_url(addr, "err-lone", "Lone"), Duration::from_secs(1))
            .await?;
    client.hello().await?;
    client.send_json(json!({"type": "start"})).await?;

    let err = client.recv_json().await?.ok_or("socket closed")?;
    assert_eq!(err["type"], "error");
    assert_eq!(err["code"], "not_in_room");

    server_handle.stop(true).await;
    let _ = server_join.await;
    Ok(())
}

#[tokio::test]
async fn test_unknown_room_is_reported() -> Result<(), Box<dyn std::error::Error>> {
    let state = build_test_state().await;
    let (server_handle, addr, server_join) = start_test_server(state).await?;

    let mut client =
        WebSocketClient::connect_retry(&ws_url(addr, "err-lost", "Lost"), Duration::from_secs(1))
            .await?;
    client.hello().await?;
    client
        .send_json(json!({"type": "join_room", "code": "QQQQ22"}))
        .await?;

    let err = client.recv_json().await?.ok_or("socket closed")?;
    assert_eq!(err["code"], "ROOM_NOT_FOUND");

    server_handle.stop(true).await;
    let _ = server_join.await;
    Ok(())
}

#[tokio::test]
async fn test_malformed_frames_keep_the_socket_open() -> Result<(), Box<dyn std::error::Error>> {
    let state = build_test_state().await;
    let (server_handle, addr, server_join) = start_test_server(state).await?;

    let mut client =
        WebSocketClient::connect_retry(&ws_url(addr, "err-junk", "Junk"), Duration::from_secs(1))
            .await?;
    client.hello().await?;
    client.send_json(json!({"type": "teleport"})).await?;
    let err = client.recv_json().await?.ok_or("socket closed")?;
    assert_eq!(err["code"], "bad_request");

    let ack = client.hello().await?;
    assert_eq!(ack["type"], "hello_ack");

    server_handle.stop(true).await;
    let _ = server_join.await;
    Ok(())
}

#[tokio::test]
async fn test_rejected_start_goes_to_sender_only() -> Result<(), Box<dyn std::error::Error>> {
    let state = build_test_state().await;
    let code = race_room(&state, "rej-host").await?;
    let (server_handle, addr, server_join) = start_test_server(state).await?;

    let mut host =
        WebSocketClient::connect_retry(&ws_url(addr, "rej-host", "Host"), Duration::from_secs(1))
            .await?;
    host.hello().await?;
    host.join_room(&code).await?;
    let mut guest =
        WebSocketClient::connect_retry(&ws_url(addr, "rej-guest", "Guest"), Duration::from_secs(1))
            .await?;
    guest.hello().await?;
    guest.join_room(&code).await?;
    host.recv_event("sudoku:player_joined").await?;

    guest.send_json(json!({"type": "start"})).await?;
    let err = guest.recv_json().await?.ok_or("socket closed")?;
    assert_eq!(err["type"], "error");
    assert_eq!(err["code"], "NOT_HOST");

    // Host sees the following broadcast, with no error in between
    guest.send_json(json!({"type": "ready"})).await?;
    let next = host.recv_json().await?.ok_or("socket closed")?;
    assert_eq!(next["event"], "sudoku:player_ready");

    server_handle.stop(true).await;
    let _ = server_join.await;
    Ok(())
}
