pub mod identity;
pub mod payment;
pub mod repository;

pub use identity::{PublicProfile, Role, User};
pub use repository::{RepoError, RepoResult};
