pub mod contact;
pub mod currency;

pub use contact::ContactDetails;
pub use currency::Currency;
