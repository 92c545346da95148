//! Database repositories for the data access layer
//!
//! Each repository is responsible for a specific domain entity and provides
//! CRUD operations and the specialized atomic queries the concurrency model
//! depends on (grant upsert, invitation consume, download counting).
//
// Identity
pub mod users;
//
// Content (podcasts + clips)
pub mod content;
//
// Access grants
pub mod access_grants;
//
// Invitations
pub mod invitations;

pub use access_grants::AccessGrantRepository;
pub use content::ContentRepository;
pub use invitations::InvitationRepository;
pub use users::UserRepository;
