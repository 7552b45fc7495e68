use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::errors::FestivalError;
use crate::subject::{Subject, SubjectType};
use crate::validation::{char_length, non_blank, ValidationErrors};

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

const MIN_REVIEWER_NAME_LENGTH: usize = 2;
const MAX_REVIEWER_NAME_LENGTH: usize = 100;
const MAX_COMMENT_LENGTH: usize = 1000;

/// A review of a DJ or a performance.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub(crate) id: String,
    pub(crate) subject_id: String,
    pub(crate) subject_type: SubjectType,
    pub(crate) reviewer_name: String,
    pub(crate) rating: u8,
    pub(crate) comment: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub(crate) created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub(crate) updated_at: OffsetDateTime,
}

impl Review {
    /// Creates a review with a fresh ID; both timestamps are set to now.
    /// The caller is responsible for checking that the subject exists.
    pub fn create(draft: ReviewDraft) -> Self {
        let now = OffsetDateTime::now_utc();
        let ReviewDraft {
            subject,
            reviewer_name,
            rating,
            comment,
        } = draft;

        Review {
            id: Uuid::new_v4().to_string(),
            subject_id: subject.id,
            subject_type: subject.subject_type,
            reviewer_name,
            rating,
            comment,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns a copy with the editable fields replaced. `updatedAt` is
    /// refreshed; the ID and `createdAt` are kept.
    pub fn updated(&self, draft: ReviewDraft) -> Self {
        let ReviewDraft {
            subject,
            reviewer_name,
            rating,
            comment,
        } = draft;

        Review {
            id: self.id.clone(),
            subject_id: subject.id,
            subject_type: subject.subject_type,
            reviewer_name,
            rating,
            comment,
            created_at: self.created_at,
            updated_at: OffsetDateTime::now_utc(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn subject(&self) -> Subject {
        Subject::new(self.subject_id.clone(), self.subject_type)
    }

    pub fn is_about(&self, subject: &Subject) -> bool {
        self.subject_type == subject.subject_type && self.subject_id == subject.id
    }

    pub fn reviewer_name(&self) -> &str {
        &self.reviewer_name
    }

    pub fn rating(&self) -> u8 {
        self.rating
    }

    pub fn created_at(&self) -> OffsetDateTime {
        self.created_at
    }

    pub fn updated_at(&self) -> OffsetDateTime {
        self.updated_at
    }
}

/// A review as submitted by a client.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewPayload {
    /// Ignored on input; IDs are assigned by the service.
    #[serde(default)]
    pub id: Option<String>,

    #[serde(default)]
    pub subject_id: Option<String>,

    /// Kept as text so an unknown type is reported as a field error.
    #[serde(default)]
    pub subject_type: Option<String>,

    #[serde(default)]
    pub reviewer_name: Option<String>,

    #[serde(default)]
    pub rating: Option<i64>,

    #[serde(default)]
    pub comment: Option<String>,
}

/// The validated, editable fields of a review.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReviewDraft {
    pub(crate) subject: Subject,
    pub(crate) reviewer_name: String,
    pub(crate) rating: u8,
    pub(crate) comment: Option<String>,
}

impl ReviewDraft {
    pub fn subject(&self) -> &Subject {
        &self.subject
    }
}

impl ReviewPayload {
    pub fn validate(self) -> Result<ReviewDraft, FestivalError> {
        let mut errors = ValidationErrors::new();

        if non_blank(&self.subject_id).is_none() {
            errors.add("subjectId", "Subject ID is required");
        }

        let subject_type = match non_blank(&self.subject_type) {
            None => {
                errors.add("subjectType", "Subject type is required");
                None
            }
            Some(raw) => match raw.parse::<SubjectType>() {
                Ok(subject_type) => Some(subject_type),
                Err(_) => {
                    errors.add("subjectType", "Subject type must be either DJ or PERFORMANCE");
                    None
                }
            },
        };

        match non_blank(&self.reviewer_name).map(char_length) {
            None => errors.add("reviewerName", "Reviewer name is required"),
            Some(length)
                if length < MIN_REVIEWER_NAME_LENGTH || length > MAX_REVIEWER_NAME_LENGTH =>
            {
                errors.add(
                    "reviewerName",
                    "Reviewer name must be between 2 and 100 characters",
                )
            }
            _ => {}
        }

        let rating = match self.rating {
            None => {
                errors.add("rating", "Rating is required");
                None
            }
            Some(r) if r < i64::from(MIN_RATING) => {
                errors.add("rating", "Rating must be at least 1");
                None
            }
            Some(r) if r > i64::from(MAX_RATING) => {
                errors.add("rating", "Rating must be at most 5");
                None
            }
            Some(r) => Some(r as u8),
        };

        if let Some(comment) = &self.comment {
            if char_length(comment) > MAX_COMMENT_LENGTH {
                errors.add("comment", "Comment cannot exceed 1000 characters");
            }
        }

        match (subject_type, rating) {
            (Some(subject_type), Some(rating)) if errors.is_empty() => Ok(ReviewDraft {
                subject: Subject::new(self.subject_id.unwrap_or_default(), subject_type),
                reviewer_name: self.reviewer_name.unwrap_or_default(),
                rating,
                comment: self.comment,
            }),
            _ => Err(FestivalError::ValidationFailed(errors)),
        }
    }
}

/// Aggregate figures for the reviews of one subject.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectStats {
    pub subject_id: String,
    pub subject_type: SubjectType,
    pub average_rating: f64,
    pub review_count: u64,
}

/// Returns the arithmetic mean of the ratings, or `0.0` if there are none.
pub fn average_rating<'a>(reviews: impl IntoIterator<Item = &'a Review>) -> f64 {
    let (sum, count) = reviews
        .into_iter()
        .fold((0u64, 0u64), |(sum, count), review| {
            (sum + u64::from(review.rating), count + 1)
        });

    if count == 0 {
        0.0
    } else {
        sum as f64 / count as f64
    }
}

/// Rounds to two decimal places, half away from zero.
pub fn round_rating(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn payload(rating: i64) -> ReviewPayload {
        ReviewPayload {
            id: None,
            subject_id: Some("dj-1".to_owned()),
            subject_type: Some("DJ".to_owned()),
            reviewer_name: Some("Alice".to_owned()),
            rating: Some(rating),
            comment: Some("Great set".to_owned()),
        }
    }

    fn review(rating: u8) -> Review {
        Review::create(payload(i64::from(rating)).validate().expect("validate payload"))
    }

    #[test]
    fn average_of_nothing_is_zero() {
        assert_eq!(average_rating(&Vec::<Review>::new()), 0.0);
    }

    #[test]
    fn average_of_four_and_five() {
        assert_eq!(average_rating(&[review(4), review(5)]), 4.5);
    }

    #[test]
    fn rounds_to_two_places() {
        assert_eq!(round_rating(4.0 + 2.0 / 3.0), 4.67);
        assert_eq!(round_rating(3.0), 3.0);
    }

    #[test]
    fn new_reviews_have_matching_timestamps() {
        let review = review(3);

        assert_eq!(review.created_at(), review.updated_at());
        assert!(!review.id().is_empty());
    }

    #[test]
    fn updates_keep_id_and_creation_time() {
        let original = review(3);
        let updated = original.updated(payload(4).validate().unwrap());

        assert_eq!(updated.id(), original.id());
        assert_eq!(updated.created_at(), original.created_at());
        assert!(updated.updated_at() >= original.updated_at());
        assert_eq!(updated.rating(), 4);
    }

    #[test]
    fn unknown_subject_type_is_a_field_error() {
        let mut payload = payload(3);
        payload.subject_type = Some("VENUE".to_owned());

        let error = payload.validate().unwrap_err();

        assert_eq!(
            error.validation_errors().and_then(|e| e.get("subjectType")),
            Some("Subject type must be either DJ or PERFORMANCE")
        );
    }

    #[test]
    fn missing_fields_are_reported() {
        let error = ReviewPayload::default().validate().unwrap_err();
        let errors = error.validation_errors().expect("get validation errors");

        assert_eq!(errors.get("subjectId"), Some("Subject ID is required"));
        assert_eq!(errors.get("subjectType"), Some("Subject type is required"));
        assert_eq!(errors.get("reviewerName"), Some("Reviewer name is required"));
        assert_eq!(errors.get("rating"), Some("Rating is required"));
    }

    #[test]
    fn reviewer_name_length_is_bounded() {
        for name in &["A".to_owned(), "x".repeat(101)] {
            let mut payload = payload(3);
            payload.reviewer_name = Some(name.clone());

            let error = payload.validate().unwrap_err();
            assert_eq!(
                error.validation_errors().and_then(|e| e.get("reviewerName")),
                Some("Reviewer name must be between 2 and 100 characters")
            );
        }
    }

    #[test]
    fn long_comments_are_rejected() {
        let mut payload = payload(3);
        payload.comment = Some("x".repeat(1001));

        let error = payload.validate().unwrap_err();
        assert_eq!(
            error.validation_errors().and_then(|e| e.get("comment")),
            Some("Comment cannot exceed 1000 characters")
        );
    }

    #[test]
    fn serializes_in_camel_case() {
        let json = serde_json::to_value(review(5)).expect("serialize review");

        assert_eq!(json["subjectId"], "dj-1");
        assert_eq!(json["subjectType"], "DJ");
        assert_eq!(json["reviewerName"], "Alice");
        assert_eq!(json["rating"], 5);
        assert!(json["createdAt"].is_string());
        assert!(json["updatedAt"].is_string());
    }

    proptest! {
        #[test]
        fn ratings_in_range_are_accepted(rating in 1i64..=5) {
            prop_assert_eq!(payload(rating).validate().map(|d| d.rating).ok(), Some(rating as u8));
        }

        #[test]
        fn ratings_below_range_are_rejected(rating in i64::MIN..1) {
            let error = payload(rating).validate().unwrap_err();
            prop_assert_eq!(
                error.validation_errors().and_then(|e| e.get("rating")),
                Some("Rating must be at least 1")
            );
        }

        #[test]
        fn ratings_above_range_are_rejected(rating in 6i64..) {
            let error = payload(rating).validate().unwrap_err();
            prop_assert_eq!(
                error.validation_errors().and_then(|e| e.get("rating")),
                Some("Rating must be at most 5")
            );
        }

        #[test]
        fn average_lies_within_rating_range(ratings in proptest::collection::vec(1u8..=5, 1..20)) {
            let reviews: Vec<Review> = ratings.iter().map(|r| review(*r)).collect();
            let average = average_rating(&reviews);

            prop_assert!(average >= 1.0 && average <= 5.0);
        }
    }
}
