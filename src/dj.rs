use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::FestivalError;
use crate::validation::{is_valid_email, non_blank, ValidationErrors};

/// A DJ in the catalog.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize, sqlx::FromRow)]
pub struct Dj {
    /// The ID of the DJ, generated on creation.
    pub(crate) id: String,

    /// The DJ's stage name.
    pub(crate) name: String,

    /// The genre the DJ plays.
    pub(crate) genre: String,

    /// The contact address. Unique across all DJs.
    pub(crate) email: String,
}

impl Dj {
    /// Creates a DJ with a fresh ID from validated input.
    pub fn create(draft: DjDraft) -> Self {
        let DjDraft { name, genre, email } = draft;

        Dj {
            id: Uuid::new_v4().to_string(),
            name,
            genre,
            email,
        }
    }

    /// Returns a copy with the editable fields replaced. The ID never
    /// changes.
    pub fn updated(&self, draft: DjDraft) -> Self {
        let DjDraft { name, genre, email } = draft;

        Dj {
            id: self.id.clone(),
            name,
            genre,
            email,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn genre(&self) -> &str {
        &self.genre
    }

    pub fn email(&self) -> &str {
        &self.email
    }
}

/// A DJ as submitted by a client. Every field is optional here so that
/// missing fields are reported alongside invalid ones.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DjPayload {
    /// Ignored on input; IDs are assigned by the service.
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub genre: Option<String>,

    #[serde(default)]
    pub email: Option<String>,
}

/// The validated, editable fields of a DJ.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DjDraft {
    pub(crate) name: String,
    pub(crate) genre: String,
    pub(crate) email: String,
}

impl DjPayload {
    pub fn validate(self) -> Result<DjDraft, FestivalError> {
        let mut errors = ValidationErrors::new();

        if non_blank(&self.name).is_none() {
            errors.add("name", "DJ name must not be blank");
        }

        if non_blank(&self.genre).is_none() {
            errors.add("genre", "Genre must not be blank");
        }

        match non_blank(&self.email) {
            None => errors.add("email", "Email must not be blank"),
            Some(email) if !is_valid_email(email) => errors.add("email", "Email must be valid"),
            _ => {}
        }

        errors.into_result(|| DjDraft {
            name: self.name.unwrap_or_default(),
            genre: self.genre.unwrap_or_default(),
            email: self.email.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(name: &str, genre: &str, email: &str) -> DjPayload {
        DjPayload {
            id: None,
            name: Some(name.to_owned()),
            genre: Some(genre.to_owned()),
            email: Some(email.to_owned()),
        }
    }

    #[test]
    fn valid_payload_maps_field_by_field() {
        let draft = payload("DJ Shadow", "Hip Hop", "djshadow@festival.com")
            .validate()
            .expect("validate payload");

        let dj = Dj::create(draft);

        assert!(!dj.id().is_empty());
        assert_eq!(dj.name(), "DJ Shadow");
        assert_eq!(dj.genre(), "Hip Hop");
        assert_eq!(dj.email(), "djshadow@festival.com");
    }

    #[test]
    fn every_problem_is_reported() {
        let error = DjPayload::default().validate().unwrap_err();
        let errors = error.validation_errors().expect("get validation errors");

        assert_eq!(errors.get("name"), Some("DJ name must not be blank"));
        assert_eq!(errors.get("genre"), Some("Genre must not be blank"));
        assert_eq!(errors.get("email"), Some("Email must not be blank"));
    }

    #[test]
    fn malformed_email_is_rejected() {
        let error = payload("DJ Shadow", "Hip Hop", "not-an-email")
            .validate()
            .unwrap_err();

        assert_eq!(
            error.validation_errors().and_then(|e| e.get("email")),
            Some("Email must be valid")
        );
    }

    #[test]
    fn updates_keep_the_id() {
        let original = Dj::create(
            payload("DJ Shadow", "Hip Hop", "djshadow@festival.com")
                .validate()
                .unwrap(),
        );
        let draft = payload("DJ Shadow", "Trip Hop", "shadow@festival.com")
            .validate()
            .unwrap();

        let updated = original.updated(draft);

        assert_eq!(updated.id(), original.id());
        assert_eq!(updated.genre(), "Trip Hop");
        assert_eq!(updated.email(), "shadow@festival.com");
    }
}
