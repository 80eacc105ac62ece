//! HTTP subsystem: the server surface of a hop plus header and body
//! handling shared with the relay.

pub mod headers;
pub mod request;
pub mod server;

pub use server::{AppState, HttpServer};
