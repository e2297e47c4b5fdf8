//! Client library for the campus food places and hostels directory
//!
//! [`CampusClient`] talks to the API gateway on behalf of a [`SessionStore`].
//! When an access token expires mid-session the client renews it through a
//! single shared refresh exchange and replays the failed request once, so
//! callers only ever see a result or an [`ApiError`].

pub mod client;
pub mod config;
pub mod error;
pub mod guard;
pub mod refresh;
pub mod request;
pub mod session;
pub mod types;

pub use client::admin::ModerationQueue;
pub use client::{CampusClient, CampusClientBuilder};
pub use config::ClientConfig;
pub use error::{ApiError, ApiErrorKind};
pub use guard::{Guard, Redirect};
pub use request::{ApiRequest, Attempt, FilePart};
pub use session::{MemorySessionStore, Role, Session, SessionStore};
