// Connection drops and returns are announced to the room

use std::time::Duration;

use crate::support::build_test_state;
use crate::support::websocket::{start_test_server, wait_for_connections, ws_url};
use crate::support::websocket_client::WebSocketClient;

use super::race_room;

#[tokio::test]
async fn test_drop_and_return_are_announced() -> Result<(), Box<dyn std::error::Error>> {
    let state = build_test_state().await;
    let registry = state.websocket_registry();
    let code = race_room(&state, "pr-host").await?;
    let (server_handle, addr, server_join) = start_test_server(state).await?;

    let mut host =
        WebSocketClient::connect_retry(&ws_url(addr, "pr-host", "Host"), Duration::from_secs(1))
            .await?;
    host.hello().await?;
    host.join_room(&code).await?;

    let guest_url = ws_url(addr, "pr-guest", "Guest");
    let mut guest = WebSocketClient::connect_retry(&guest_url, Duration::from_secs(1)).await?;
    guest.hello().await?;
    guest.join_room(&code).await?;
    host.recv_event("sudoku:player_joined").await?;

    guest.close().await?;
    wait_for_connections(&registry, 1, Duration::from_secs(2)).await?;
    let gone = host.recv_event("sudoku:player_disconnected").await?;
    assert_eq!(gone["payload"]["player_id"], "pr-guest");

    let mut guest = WebSocketClient::connect_retry(&guest_url, Duration::from_secs(1)).await?;
    guest.hello().await?;
    let (_, room_state) = guest.join_room(&code).await?;
    assert_eq!(room_state["snapshot"]["players"][1]["id"], "pr-guest");

    let back = host.recv_event("sudoku:player_reconnected").await?;
    assert_eq!(back["payload"]["player_id"], "pr-guest");

    server_handle.stop(true).await;
    let _ = server_join.await;
    Ok(())
}
