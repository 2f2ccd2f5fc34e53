//! Tubely API Library
//!
//! HTTP surface for video and thumbnail ingestion: handlers, bearer
//! authentication, error responses and application setup.

mod api_doc;
pub mod constants;
mod handlers;
pub mod setup;
mod telemetry;
mod utils;

pub mod auth;
pub mod error;
pub mod state;

pub use api_doc::ApiDoc;
pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;
