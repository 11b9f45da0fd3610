pub mod auth;
pub mod rate_limit;

pub use auth::{authorize, verify_token, Principal, ADMIN_ONLY, VENDOR_OR_ADMIN};
pub use rate_limit::rate_limit;
