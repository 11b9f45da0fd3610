use serde::{Serialize, Deserialize, Serializer};
use std::fmt;

/// A wrapper for sensitive data that masks its value in Debug and Display output.
///
/// Request DTOs carry passwords and reset codes in this wrapper so that
/// `tracing::debug!("{:?}", req)` never leaks them.
#[derive(Clone, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct Masked<T>(pub T);

impl<T> fmt::Debug for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

impl<T> fmt::Display for Masked<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "********")
    }
}

impl<T: Serialize> Serialize for Masked<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // Serialization keeps the real value; masking only guards log formatting.
        self.0.serialize(serializer)
    }
}

impl<T> Masked<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }

    pub fn expose(&self) -> &T {
        &self.0
    }

    pub fn into_inner(self) -> T {
        self.0
    }
}

impl From<&str> for Masked<String> {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Mask an email for log lines: `jane.doe@mail.com` -> `j***@mail.com`.
pub fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => {
            let first = local.chars().next().unwrap_or('*');
            format!("{}***@{}", first, domain)
        }
        None => "***".to_string(),
    }
}

/// Mask a phone number, keeping the first four and last three digits.
pub fn mask_phone(phone: &str) -> String {
    let chars: Vec<char> = phone.chars().collect();
    if chars.len() <= 7 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 3..].iter().collect();
    format!("{}{}{}", head, "*".repeat(chars.len() - 7), tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_masked_debug_hides_value() {
        let secret = Masked::new("hunter22".to_string());
        assert_eq!(format!("{:?}", secret), "********");
        assert_eq!(secret.expose(), "hunter22");
    }

    #[test]
    fn test_masked_deserializes_transparently() {
        let secret: Masked<String> = serde_json::from_str("\"abc123\"").unwrap();
        assert_eq!(secret.into_inner(), "abc123");
    }

    #[test]
    fn test_mask_contact_fields() {
        assert_eq!(mask_email("jane@staya.ng"), "j***@staya.ng");
        assert_eq!(mask_phone("08012345678"), "0801****678");
        assert_eq!(mask_phone("12345"), "*****");
    }
}
