//! Infrastructure layer - database, retention, state assembly and error mapping.

pub mod db;
pub mod db_errors;
pub mod retention;
pub mod state;
