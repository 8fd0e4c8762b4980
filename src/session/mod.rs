//! Password sessions
//!
//! Tokens are opaque bearer credentials issued after a successful password
//! check and carried in the [`SESSION_COOKIE_NAME`] cookie.

mod password;
mod store;


pub use password::{KeyedPasswordHash, PasswordVerifier};
pub use store::{generate_token, SessionStore, SESSION_COOKIE_NAME};
