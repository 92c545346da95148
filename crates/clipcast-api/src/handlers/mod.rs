//! HTTP handlers. Thin plumbing: decode the credential, call a service,
//! serialize the result.

pub mod auth;
pub mod clips;
pub mod invites;
pub mod podcasts;
pub mod uploads;
