//! Vitrine API Library
//!
//! HTTP surface of the media gateway: handlers, error mapping, OpenAPI
//! document and application setup.

mod api_doc;
pub mod constants;
mod handlers;
pub mod setup;
mod validation;

pub mod error;
pub mod state;

pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;
