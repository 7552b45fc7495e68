use std::collections::BTreeMap;

use serde::Serialize;

use crate::errors::FestivalError;

/// Field-level validation messages, keyed by the wire name of the field.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct ValidationErrors(BTreeMap<String, String>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a problem with `field`. The first message recorded for a
    /// field wins.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_owned())
            .or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Turns the collected messages into an error, or returns `value` if
    /// there are none.
    pub fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, FestivalError> {
        if self.is_empty() {
            Ok(value())
        } else {
            Err(FestivalError::ValidationFailed(self))
        }
    }
}

/// Returns the value if it's present and contains something other than
/// whitespace.
pub fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// Returns the length of a string as users count it.
pub fn char_length(value: &str) -> usize {
    value.chars().count()
}

/// Checks the general shape of an email address: a single `@` with a
/// non-empty local part and a domain made of non-empty labels.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return false;
    }

    let mut parts = email.split('@');

    let (local, domain) = match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => (local, domain),
        _ => return false,
    };

    if local.is_empty() || local.starts_with('.') || local.ends_with('.') || local.contains("..")
    {
        return false;
    }

    !domain.is_empty()
        && domain.split('.').all(|label| {
            !label.is_empty()
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_alphanumeric() || c == '-')
        })
}
