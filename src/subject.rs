use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::FestivalError;

/// The kinds of catalog entries that can be reviewed.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum SubjectType {
    #[serde(rename = "DJ")]
    Dj,
    #[serde(rename = "PERFORMANCE")]
    Performance,
}

impl SubjectType {
    pub fn as_str(self) -> &'static str {
        match self {
            SubjectType::Dj => "DJ",
            SubjectType::Performance => "PERFORMANCE",
        }
    }

    /// The collection in the Catalog Service's API that holds subjects of
    /// this type.
    pub fn collection(self) -> &'static str {
        match self {
            SubjectType::Dj => "djs",
            SubjectType::Performance => "performances",
        }
    }

    /// Parses a subject type from a URL path, ignoring case.
    pub fn from_path(raw: &str) -> Result<Self, FestivalError> {
        raw.to_uppercase()
            .parse()
            .map_err(|_| FestivalError::InvalidSubjectType(raw.to_owned()))
    }
}

impl fmt::Display for SubjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a string names no known subject type.
#[derive(Debug, Eq, PartialEq)]
pub struct UnknownSubjectType(pub String);

impl FromStr for SubjectType {
    type Err = UnknownSubjectType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DJ" => Ok(SubjectType::Dj),
            "PERFORMANCE" => Ok(SubjectType::Performance),
            _ => Err(UnknownSubjectType(s.to_owned())),
        }
    }
}

/// A reviewable entry: a DJ or a performance, by ID.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Subject {
    pub id: String,
    pub subject_type: SubjectType,
}

impl Subject {
    pub fn new(id: impl Into<String>, subject_type: SubjectType) -> Self {
        Subject {
            id: id.into(),
            subject_type,
        }
    }
}
