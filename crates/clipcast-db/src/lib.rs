//! Clipcast Database Library
//!
//! sqlx/Postgres repositories implementing the repository contracts from
//! `clipcast-core`.

pub mod db;

pub use db::{
    AccessGrantRepository, ContentRepository, InvitationRepository, UserRepository,
};
