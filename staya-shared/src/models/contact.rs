use serde::{Deserialize, Serialize};
use validator::Validate;

/// Name and reachability details for a hotel guest or bus passenger.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ContactDetails {
    #[validate(length(min = 1, max = 50, message = "Guest first name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 50, message = "Guest last name is required"))]
    pub last_name: String,
    #[validate(custom(function = "crate::validation::email_address"))]
    pub email: String,
    #[validate(custom(function = "crate::validation::nigerian_phone"))]
    pub phone: String,
}

impl ContactDetails {
    /// Trim names and lowercase the email, as stored.
    pub fn normalized(mut self) -> Self {
        self.first_name = self.first_name.trim().to_string();
        self.last_name = self.last_name.trim().to_string();
        self.email = self.email.trim().to_lowercase();
        self.phone = self.phone.trim().to_string();
        self
    }
}
