use thiserror::Error;
use warp::reject;

use crate::subject::SubjectType;
use crate::validation::ValidationErrors;

/// Enumerates high-level errors returned by this library.
#[derive(Debug, Error)]
pub enum FestivalError {
    /// Represents an SQL error.
    #[error("SQLx error")]
    Sqlx { source: sqlx::Error },

    /// Represents field-level problems with a submitted payload.
    #[error("Validation failed")]
    ValidationFailed(ValidationErrors),

    /// Represents a request body that couldn't be parsed at all.
    #[error("Malformed request body: {0}")]
    MalformedBody(String),

    #[error("DJ with id {0} not found.")]
    DjNotFound(String),

    #[error("DJ with id {0} not found. Cannot delete non-existing DJ.")]
    DjNotFoundForDeletion(String),

    #[error("No DJs found for genre: {0}")]
    NoDjsForGenre(String),

    #[error("No DJs found with name: {0}")]
    NoDjsWithName(String),

    #[error("DJ with email {0} already exists. Email addresses must be unique.")]
    EmailAlreadyExists(String),

    #[error("Cannot update non-existing DJ with id {0}. Update operations require an existing record.")]
    UpdateOfMissingDj(String),

    #[error("Performance with id {0} not found.")]
    PerformanceNotFound(String),

    #[error("Performance with id {0} not found. Cannot delete non-existing performance.")]
    PerformanceNotFoundForDeletion(String),

    #[error("No performances found for DJ with id: {0}")]
    NoPerformancesForDj(String),

    #[error("Cannot update non-existing Performance with id {0}. Update operations require an existing record.")]
    UpdateOfMissingPerformance(String),

    #[error("DJ with ID {0} not found. Cannot create performance for non-existing DJ.")]
    PerformanceDjMissing(String),

    #[error("DJ with ID {0} not found. Cannot update performance with non-existing DJ.")]
    UpdatedPerformanceDjMissing(String),

    #[error("Performance start time cannot be after end time. Start: {start}, End: {end}")]
    StartAfterEnd { start: String, end: String },

    #[error("Performance start time cannot be equal to end time. Performance must have a duration.")]
    ZeroDuration,

    #[error("Review not found with ID: {0}")]
    ReviewNotFound(String),

    /// The Catalog Service didn't confirm the subject of a review.
    #[error("Subject with ID {subject_id} and type {subject_type} does not exist")]
    NonExistentSubject {
        subject_id: String,
        subject_type: SubjectType,
    },

    #[error("Invalid rating: {0}. Rating must be a whole number")]
    InvalidRating(String),

    #[error("Invalid subject type: {0}. Subject type must be either DJ or PERFORMANCE")]
    InvalidSubjectType(String),
}

/// The broad classes of [`FestivalError`], which decide how an error is
/// presented to API clients.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    NotFound,
    BadRequest,
    ValidationFailed,
    Internal,
}

impl FestivalError {
    pub fn kind(&self) -> ErrorKind {
        use FestivalError::*;

        match self {
            Sqlx { .. } => ErrorKind::Internal,
            ValidationFailed(..) | MalformedBody(..) => ErrorKind::ValidationFailed,
            DjNotFound(..)
            | DjNotFoundForDeletion(..)
            | NoDjsForGenre(..)
            | NoDjsWithName(..)
            | PerformanceNotFound(..)
            | PerformanceNotFoundForDeletion(..)
            | NoPerformancesForDj(..)
            | ReviewNotFound(..) => ErrorKind::NotFound,
            EmailAlreadyExists(..)
            | UpdateOfMissingDj(..)
            | UpdateOfMissingPerformance(..)
            | PerformanceDjMissing(..)
            | UpdatedPerformanceDjMissing(..)
            | StartAfterEnd { .. }
            | ZeroDuration
            | NonExistentSubject { .. }
            | InvalidRating(..)
            | InvalidSubjectType(..) => ErrorKind::BadRequest,
        }
    }

    /// Returns the field-level messages, if this is a validation error.
    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            FestivalError::ValidationFailed(errors) => Some(errors),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for FestivalError {
    fn from(source: sqlx::Error) -> Self {
        FestivalError::Sqlx { source }
    }
}

/// Enumerates the ways an outbound call to a sibling service can fail.
/// These never reach API clients: callers collapse them into a safe
/// default.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Represents an error building the request URL.
    #[error("Cannot build request URL from base {base}")]
    InvalidBaseUrl { base: String },

    /// Represents a connection or protocol failure.
    #[error("Transport error")]
    Transport { source: reqwest::Error },

    /// Represents a call that didn't finish before its deadline.
    #[error("No response within {millis} ms")]
    Timeout { millis: u128 },

    /// Represents a response with a status other than the expected ones.
    #[error("Unexpected status {status}")]
    UnexpectedStatus { status: reqwest::StatusCode },

    /// Represents a response body that doesn't have the expected shape.
    #[error("Malformed response body")]
    MalformedBody { source: reqwest::Error },
}

impl reject::Reject for FestivalError {}
