//! Field validation for users
//!
//! Validation never fails as a whole: it returns every field-level
//! violation it finds, and an empty list means the input is acceptable.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use super::{User, UserPatch};

/// Ids that collide with static routes under `/users`
pub const RESERVED_IDS: [&str; 1] = ["search"];

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$")
        .expect("invalid email regex")
});

/// Optional leading plus, then 6 to 18 digits
static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9]{6,18}$").expect("invalid phone regex"));

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9._\-]+$").expect("invalid username regex"));

/// Kind of constraint a field violated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Required,
    Max,
    Email,
    Phone,
    Username,
    Reserved,
}

/// A single field-level violation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub code: ErrorCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub param: Option<usize>,
}

impl FieldError {
    fn new(field: &'static str, code: ErrorCode) -> Self {
        Self {
            field,
            code,
            param: None,
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            ErrorCode::Required => write!(f, "{} is required", self.field),
            ErrorCode::Max => write!(
                f,
                "{} exceeds maximum length of {} characters",
                self.field,
                self.param.unwrap_or_default()
            ),
            ErrorCode::Email => write!(f, "{} is not a valid email address", self.field),
            ErrorCode::Phone => write!(f, "{} is not a valid phone number", self.field),
            ErrorCode::Username => write!(
                f,
                "{} may only contain letters, digits, '.', '_' and '-'",
                self.field
            ),
            ErrorCode::Reserved => write!(f, "{} is reserved", self.field),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Format {
    Email,
    Phone,
    Username,
}

impl Format {
    fn matches(self, value: &str) -> bool {
        match self {
            Self::Email => EMAIL_RE.is_match(value),
            Self::Phone => PHONE_RE.is_match(value),
            Self::Username => USERNAME_RE.is_match(value),
        }
    }

    fn code(self) -> ErrorCode {
        match self {
            Self::Email => ErrorCode::Email,
            Self::Phone => ErrorCode::Phone,
            Self::Username => ErrorCode::Username,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Rule {
    field: &'static str,
    required: bool,
    max: usize,
    format: Option<Format>,
}

const ID: Rule = Rule {
    field: "id",
    required: true,
    max: 40,
    format: None,
};

const USERNAME: Rule = Rule {
    field: "username",
    required: true,
    max: 100,
    format: Some(Format::Username),
};

/// Not required, but an empty value still fails the format check.
const EMAIL: Rule = Rule {
    field: "email",
    required: false,
    max: 100,
    format: Some(Format::Email),
};

const PHONE: Rule = Rule {
    field: "phone",
    required: true,
    max: 18,
    format: Some(Format::Phone),
};

impl Rule {
    fn check(self, value: &str, errors: &mut Vec<FieldError>) {
        if value.trim().is_empty() {
            if self.required {
                errors.push(FieldError::new(self.field, ErrorCode::Required));
            } else if let Some(format) = self.format {
                errors.push(FieldError::new(self.field, format.code()));
            }
            return;
        }

        if value.chars().count() > self.max {
            errors.push(FieldError {
                field: self.field,
                code: ErrorCode::Max,
                param: Some(self.max),
            });
            return;
        }

        if let Some(format) = self.format {
            if !format.matches(value) {
                errors.push(FieldError::new(self.field, format.code()));
            }
        }
    }
}

/// Validation rules for the user resource
#[derive(Debug, Clone, Copy, Default)]
pub struct UserValidator;

impl UserValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validate a full entity (create/update).
    pub fn validate(&self, user: &User) -> Vec<FieldError> {
        let mut errors = Vec::new();
        ID.check(&user.id, &mut errors);
        if RESERVED_IDS.contains(&user.id.as_str()) {
            errors.push(FieldError::new(ID.field, ErrorCode::Reserved));
        }
        USERNAME.check(&user.username, &mut errors);
        EMAIL.check(&user.email, &mut errors);
        PHONE.check(&user.phone, &mut errors);
        errors
    }

    /// Validate only the fields a patch supplies.
    ///
    /// The identifier is not checked here; it has already been reconciled
    /// with the path.
    pub fn validate_patch(&self, patch: &UserPatch) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if let Some(username) = &patch.username {
            USERNAME.check(username, &mut errors);
        }
        if let Some(email) = &patch.email {
            EMAIL.check(email, &mut errors);
        }
        if let Some(phone) = &patch.phone {
            PHONE.check(phone, &mut errors);
        }
        errors
    }
}
