//! Clipcast API
//!
//! The HTTP surface of the sharing platform. Handlers are thin plumbing
//! around the services in `clipcast-services`; all authorization and
//! lifecycle decisions happen there.

pub mod api_doc;
pub mod auth;
pub mod error;
pub mod handlers;
pub mod setup;
pub mod state;

pub use setup::initialize_app;
pub use state::AppState;
