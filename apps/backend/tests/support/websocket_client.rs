// WebSocket client utilities for testing

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

const RECV_TIMEOUT: Duration = Duration::from_secs(2);

pub struct WebSocketClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WebSocketClient {
    /// Connect, retrying until the server accepts or `timeout` passes.
    pub async fn connect_retry(
        url: &str,
        timeout: Duration,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let start = tokio::time::Instant::now();
        loop {
            match connect_async(url).await {
                Ok((stream, _)) => return Ok(Self { stream }),
                Err(err) => {
                    if start.elapsed() >= timeout {
                        return Err(Box::new(err));
                    }
                    tokio::time::sleep(Duration::from_millis(5)).await;
                }
            }
        }
    }

    pub async fn send_json(&mut self, value: Value) -> Result<(), Box<dyn std::error::Error>> {
        self.stream
            .send(Message::Text(value.to_string().into()))
            .await?;
        Ok(())
    }

    /// Next JSON text frame; pings and pongs are skipped. `None` on close.
    pub async fn recv_json(&mut self) -> Result<Option<Value>, Box<dyn std::error::Error>> {
        loop {
            let next = tokio::time::timeout(RECV_TIMEOUT, self.stream.next())
                .await
                .map_err(|_| "Timeout waiting for message")?;
            match next {
                Some(Ok(Message::Text(text))) => return Ok(Some(serde_json::from_str(&text)?)),
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                Some(Ok(_)) => continue,
                Some(Err(
                    WsError::ConnectionClosed | WsError::AlreadyClosed | WsError::Protocol(_),
                )) => return Ok(None),
                Some(Err(e)) => return Err(Box::new(e)),
            }
        }
    }

    /// Skip frames until one satisfies `pred`.
    pub async fn recv_until(
        &mut self,
        pred: impl Fn(&Value) -> bool,
    ) -> Result<Value, Box<dyn std::error::Error>> {
        loop {
            match self.recv_json().await? {
                Some(v) if pred(&v) => return Ok(v),
                Some(_) => continue,
                None => return Err("connection closed".into()),
            }
        }
    }

    /// Next event frame named `event` (e.g. `sudoku:player_joined`).
    pub async fn recv_event(&mut self, event: &str) -> Result<Value, Box<dyn std::error::Error>> {
        self.recv_until(|v| v["type"] == "event" && v["event"] == event)
            .await
    }

    pub async fn hello(&mut self) -> Result<Value, Box<dyn std::error::Error>> {
        self.send_json(json!({"type": "hello", "protocol": 1})).await?;
        self.recv_json()
            .await?
            .ok_or_else(|| "closed before hello_ack".into())
    }

    /// `join_room`, returning the `ack` and `room_state` frames.
    pub async fn join_room(
        &mut self,
        code: &str,
    ) -> Result<(Value, Value), Box<dyn std::error::Error>> {
        self.send_json(json!({"type": "join_room", "code": code}))
            .await?;
        let ack = self.recv_until(|v| v["type"] == "ack" || v["type"] == "error").await?;
        if ack["type"] == "error" {
            return Err(format!("join_room failed: {ack}").into());
        }
        let state = self.recv_until(|v| v["type"] == "room_state").await?;
        Ok((ack, state))
    }

    pub async fn close(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.stream.close(None).await?;
        Ok(())
    }
}
