//! HTTP surface
//!
//! Serves the browse API, raw file downloads, the HTML shell pages and the
//! live-update channel, all behind an optional password gate:
//! - `GET /api/files`, `GET /api/random-media`
//! - `GET /files/*path`
//! - `GET /`, `GET /browse/*path`, `GET|POST /login`, `GET|POST /logout`
//! - `GET /ws`

mod auth;
mod error;
mod live;
mod pages;
mod routes;
mod server;


pub use auth::{auth_middleware, clear_session_cookie, session_cookie, session_token};
pub use error::ApiError;
pub use server::{FileServer, ServerState, SESSION_PURGE_INTERVAL};
