//! Authorization primitives: credential codec and the role/capability matrix.

pub mod permissions;
pub mod token;

pub use permissions::{Capability, PermissionMatrix};
pub use token::{Claims, Identity, TokenCodec};
