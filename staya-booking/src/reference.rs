use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

const SUFFIX_LEN: usize = 9;
const ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BookingKind {
    Hotel,
    Travel,
}

impl BookingKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            BookingKind::Hotel => "HTL",
            BookingKind::Travel => "TRV",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingKind::Hotel => "hotel",
            BookingKind::Travel => "travel",
        }
    }
}

/// Customer-facing booking reference, `HTL-1718000000000-7K2M9QX4B`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BookingReference(String);

impl BookingReference {
    pub fn generate(kind: BookingKind, now: DateTime<Utc>) -> Self {
        let mut rng = rand::thread_rng();
        let suffix: String = (0..SUFFIX_LEN)
            .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
            .collect();
        Self(format!("{}-{}-{}", kind.prefix(), now.timestamp_millis(), suffix))
    }

    pub fn kind(&self) -> BookingKind {
        if self.0.starts_with("HTL-") {
            BookingKind::Hotel
        } else {
            BookingKind::Travel
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid booking reference: {0}")]
pub struct InvalidReference(pub String);

impl FromStr for BookingReference {
    type Err = InvalidReference;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidReference(s.to_string());

        let mut parts = s.splitn(3, '-');
        let (prefix, millis, suffix) = match (parts.next(), parts.next(), parts.next()) {
            (Some(p), Some(m), Some(x)) => (p, m, x),
            _ => return Err(invalid()),
        };

        if prefix != "HTL" && prefix != "TRV" {
            return Err(invalid());
        }
        if millis.is_empty() || !millis.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        if suffix.len() != SUFFIX_LEN || !suffix.bytes().all(|b| ALPHABET.contains(&b)) {
            return Err(invalid());
        }

        Ok(Self(s.to_string()))
    }
}

impl TryFrom<String> for BookingReference {
    type Error = InvalidReference;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BookingReference> for String {
    fn from(value: BookingReference) -> Self {
        value.0
    }
}

impl fmt::Display for BookingReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generated_reference_shape() {
        let now = Utc::now();
        let hotel = BookingReference::generate(BookingKind::Hotel, now);
        let travel = BookingReference::generate(BookingKind::Travel, now);

        assert!(hotel.as_str().starts_with(&format!("HTL-{}-", now.timestamp_millis())));
        assert_eq!(travel.kind(), BookingKind::Travel);
        assert_eq!(hotel.as_str().parse::<BookingReference>().unwrap(), hotel);
        assert_eq!(hotel.as_str().rsplit('-').next().unwrap().len(), 9);
    }

    #[test]
    fn test_references_do_not_repeat() {
        let now = Utc::now();
        let refs: HashSet<_> = (0..1000)
            .map(|_| BookingReference::generate(BookingKind::Hotel, now))
            .collect();
        assert_eq!(refs.len(), 1000);
    }

    #[test]
    fn test_rejects_malformed_references() {
        for bad in ["", "HTL", "BUS-1-ABCDEFGHI", "HTL-12a-ABCDEFGHI", "TRV-1-abcdefghi", "TRV-1-ABCDEFGH"] {
            assert!(bad.parse::<BookingReference>().is_err(), "{bad}");
        }
        assert!("TRV-1718000000000-0A1B2C3D4".parse::<BookingReference>().is_ok());
    }
}
