use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Currencies accepted for prices and booking totals.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Currency {
    #[default]
    #[serde(rename = "NGN")]
    Ngn,
    #[serde(rename = "USD")]
    Usd,
}

impl Currency {
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Ngn => "NGN",
            Currency::Usd => "USD",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NGN" => Ok(Currency::Ngn),
            "USD" => Ok(Currency::Usd),
            other => Err(format!("Unsupported currency: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_wire_format() {
        assert_eq!(serde_json::to_string(&Currency::Usd).unwrap(), "\"USD\"");
        assert_eq!(Currency::default(), Currency::Ngn);
        assert!(serde_json::from_str::<Currency>("\"EUR\"").is_err());
        assert_eq!("NGN".parse::<Currency>().unwrap(), Currency::Ngn);
    }
}
