#![allow(dead_code)]

pub mod websocket;
pub mod websocket_client;

pub(crate) use app_builder::test_app;
pub use test_state::{build_test_state, paused_state, TestStateBuilder};
