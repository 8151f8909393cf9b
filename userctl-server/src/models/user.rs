//! User entity and its typed partial update

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;

/// External (JSON) field name to column name.
const FIELD_COLUMNS: [(&str, &str); 5] = [
    ("id", "id"),
    ("username", "username"),
    ("email", "email"),
    ("phone", "phone"),
    ("dateOfBirth", "date_of_birth"),
];

/// Resolve a JSON field name to its column.
pub fn column_for_field(field: &str) -> Option<&'static str> {
    FIELD_COLUMNS
        .iter()
        .find(|(json, _)| *json == field)
        .map(|(_, column)| *column)
}

/// User record as stored and transferred.
///
/// String fields default to empty when missing from a request body so
/// that absence is reported by validation rather than as a decode error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
}

impl User {
    /// Apply the supplied fields of a patch, leaving the rest untouched.
    pub fn apply_patch(&mut self, patch: &UserPatch) {
        if let Some(username) = &patch.username {
            self.username = username.clone();
        }
        if let Some(email) = &patch.email {
            self.email = email.clone();
        }
        if let Some(phone) = &patch.phone {
            self.phone = phone.clone();
        }
        if let Some(date_of_birth) = patch.date_of_birth {
            self.date_of_birth = date_of_birth;
        }
    }
}

/// Partial update: one optional per updatable column.
///
/// `date_of_birth` is doubly optional: `None` leaves the column alone,
/// `Some(None)` (JSON `null`) clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub date_of_birth: Option<Option<NaiveDate>>,
}

impl UserPatch {
    /// True when no updatable column is supplied.
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.date_of_birth.is_none()
    }

    /// Columns this patch touches, in table order.
    pub fn columns(&self) -> Vec<&'static str> {
        let mut columns = Vec::with_capacity(4);
        if self.username.is_some() {
            columns.push("username");
        }
        if self.email.is_some() {
            columns.push("email");
        }
        if self.phone.is_some() {
            columns.push("phone");
        }
        if self.date_of_birth.is_some() {
            columns.push("date_of_birth");
        }
        columns
    }
}

/// A field that is present in the payload, even as `null`, becomes `Some`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
