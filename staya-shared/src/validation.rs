use std::borrow::Cow;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use validator::{Validate, ValidationError, ValidationErrors, ValidationErrorsKind};

use crate::pii::Masked;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\w+([.-]?\w+)*@\w+([.-]?\w+)*(\.\w{2,3})+$").expect("email pattern")
});

static NG_PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\+234|0)[789][01]\d{8}$").expect("phone pattern"));

static CLOCK_TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-1]?[0-9]|2[0-3]):[0-5][0-9]$").expect("time pattern"));

static DURATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+h\s?\d*m?$").expect("duration pattern"));

pub const MIN_PASSWORD_LENGTH: usize = 6;

fn rejected(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(message));
    err
}

pub fn is_email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

pub fn is_nigerian_phone(value: &str) -> bool {
    NG_PHONE_RE.is_match(value)
}

pub fn email_address(value: &str) -> Result<(), ValidationError> {
    if is_email(value) {
        Ok(())
    } else {
        Err(rejected("email", "Please add a valid email"))
    }
}

pub fn nigerian_phone(value: &str) -> Result<(), ValidationError> {
    if is_nigerian_phone(value) {
        Ok(())
    } else {
        Err(rejected("phone", "Please add a valid Nigerian phone number"))
    }
}

pub fn clock_time(value: &str) -> Result<(), ValidationError> {
    if CLOCK_TIME_RE.is_match(value) {
        Ok(())
    } else {
        Err(rejected("time", "Please add a valid time format (HH:MM)"))
    }
}

pub fn journey_duration(value: &str) -> Result<(), ValidationError> {
    if DURATION_RE.is_match(value) {
        Ok(())
    } else {
        Err(rejected("duration", "Please add duration in format \"2h 30m\""))
    }
}

pub fn password_policy(value: &Masked<String>) -> Result<(), ValidationError> {
    if value.expose().chars().count() >= MIN_PASSWORD_LENGTH {
        Ok(())
    } else {
        Err(rejected("password", "Password must be at least 6 characters"))
    }
}

/// One rejected field, addressed by its JSON path (`guestDetails.phone`, `rooms[0].capacity`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

/// Every violation found while validating one payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    violations: Vec<FieldViolation>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut report = Self::new();
        report.push(field, message);
        report
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.violations.push(FieldViolation {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn merge(&mut self, other: ValidationReport) {
        self.violations.extend(other.violations);
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn violations(&self) -> &[FieldViolation] {
        &self.violations
    }

    /// Collapse into `Ok(())` when nothing was recorded.
    pub fn into_result(self) -> Result<(), ValidationReport> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    pub fn from_errors(errors: &ValidationErrors) -> Self {
        let mut report = Self::new();
        flatten(errors, "", &mut report);
        report.violations.sort_by(|a, b| a.field.cmp(&b.field));
        report
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .violations
            .iter()
            .map(|v| v.message.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "{}", joined)
    }
}

impl std::error::Error for ValidationReport {}

impl From<ValidationErrors> for ValidationReport {
    fn from(errors: ValidationErrors) -> Self {
        Self::from_errors(&errors)
    }
}

/// Run the derived validator and convert failures into a report.
pub fn check<T: Validate>(value: &T) -> Result<(), ValidationReport> {
    value.validate().map_err(ValidationReport::from)
}

fn flatten(errors: &ValidationErrors, prefix: &str, report: &mut ValidationReport) {
    for (field, kind) in errors.errors() {
        let path = join_path(prefix, &camel_case(field.as_ref()));
        match kind {
            ValidationErrorsKind::Field(list) => {
                for err in list {
                    let message = err
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid value for {}", path));
                    report.push(path.clone(), message);
                }
            }
            ValidationErrorsKind::Struct(inner) => flatten(inner, &path, report),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    flatten(inner, &format!("{}[{}]", path, index), report);
                }
            }
        }
    }
}

fn join_path(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{}.{}", prefix, field)
    }
}

fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nigerian_phone_formats() {
        assert!(is_nigerian_phone("08012345678"));
        assert!(is_nigerian_phone("+2347012345678"));
        assert!(!is_nigerian_phone("0601234567"));
        assert!(!is_nigerian_phone("12345678901"));
    }

    #[test]
    fn test_email_shape() {
        assert!(is_email("a@b.com"));
        assert!(is_email("first.last@staya-booking.ng"));
        assert!(!is_email("no-at-sign.com"));
        assert!(!is_email("a@b"));
    }

    #[test]
    fn test_clock_time_and_duration() {
        assert!(clock_time("07:30").is_ok());
        assert!(clock_time("23:59").is_ok());
        assert!(clock_time("24:00").is_err());
        assert!(journey_duration("2h 30m").is_ok());
        assert!(journey_duration("5h").is_ok());
        assert!(journey_duration("90 minutes").is_err());
    }

    #[test]
    fn test_report_joins_messages() {
        let mut report = ValidationReport::new();
        report.push("name", "Please add a hotel name");
        report.push("rating", "Rating cannot exceed 5");
        assert_eq!(report.to_string(), "Please add a hotel name, Rating cannot exceed 5");
        assert!(report.into_result().is_err());
        assert!(ValidationReport::new().into_result().is_ok());
    }

    #[test]
    fn test_camel_case_paths() {
        assert_eq!(camel_case("price_per_night"), "pricePerNight");
        assert_eq!(camel_case("rating"), "rating");
        assert_eq!(join_path("guestDetails", "phone"), "guestDetails.phone");
    }
}
