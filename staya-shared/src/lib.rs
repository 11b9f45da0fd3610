pub mod models;
pub mod pagination;
pub mod pii;
pub mod validation;

pub use models::{ContactDetails, Currency};
pub use pagination::{PageInfo, PageRequest};
pub use validation::{FieldViolation, ValidationReport};
