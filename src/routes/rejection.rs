use serde::Serialize;
use time::OffsetDateTime;
use warp::http::StatusCode;
use warp::reject;

use crate::errors::FestivalError;
use crate::validation::ValidationErrors;

#[derive(Debug)]
pub struct Rejection {
    pub(crate) context: Context,
    pub(crate) error: FestivalError,
}

impl Rejection {
    pub fn new(context: Context, error: FestivalError) -> Self {
        Rejection { context, error }
    }

    pub fn flatten(&self, status: StatusCode) -> FlattenedRejection {
        FlattenedRejection {
            context: self.context.clone(),
            status: status.as_u16(),
            message: format!("{}", self.error),
            timestamp: OffsetDateTime::now_utc(),
            validation_errors: self.error.validation_errors().cloned(),
        }
    }
}

impl reject::Reject for Rejection {}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlattenedRejection {
    #[serde(flatten)]
    pub(crate) context: Context,
    pub(crate) status: u16,
    pub(crate) message: String,
    #[serde(with = "time::serde::rfc3339")]
    pub(crate) timestamp: OffsetDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) validation_errors: Option<ValidationErrors>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(untagged)]
pub enum Context {
    CreateDj,
    Djs,
    Dj {
        id: String,
    },
    UpdateDj {
        id: String,
    },
    DeleteDj {
        id: String,
    },
    DjsByGenre {
        genre: String,
    },
    DjsByName {
        name: String,
    },
    LongNames,
    CreatePerformance,
    Performances,
    Performance {
        id: String,
    },
    UpdatePerformance {
        id: String,
    },
    DeletePerformance {
        id: String,
    },
    PerformancesByDj {
        #[serde(rename = "djId")]
        dj_id: String,
    },
    Subject {
        #[serde(rename = "subjectId")]
        subject_id: String,
        #[serde(rename = "subjectType")]
        subject_type: String,
    },
    CreateReview,
    Reviews,
    Review {
        id: String,
    },
    UpdateReview {
        id: String,
    },
    DeleteReview {
        id: String,
    },
    ReviewsByType {
        #[serde(rename = "subjectType")]
        subject_type: String,
    },
    ReviewsByReviewer {
        #[serde(rename = "reviewerName")]
        reviewer_name: String,
    },
    ReviewsByRating {
        rating: String,
    },
    ReviewsByMinimumRating {
        #[serde(rename = "minRating")]
        min_rating: String,
    },
}

impl Context {
    pub fn create_dj() -> Context {
        Context::CreateDj
    }

    pub fn djs() -> Context {
        Context::Djs
    }

    pub fn dj(id: String) -> Context {
        Context::Dj { id }
    }

    pub fn update_dj(id: String) -> Context {
        Context::UpdateDj { id }
    }

    pub fn delete_dj(id: String) -> Context {
        Context::DeleteDj { id }
    }

    pub fn djs_by_genre(genre: String) -> Context {
        Context::DjsByGenre { genre }
    }

    pub fn djs_by_name(name: String) -> Context {
        Context::DjsByName { name }
    }

    pub fn long_names() -> Context {
        Context::LongNames
    }

    pub fn create_performance() -> Context {
        Context::CreatePerformance
    }

    pub fn performances() -> Context {
        Context::Performances
    }

    pub fn performance(id: String) -> Context {
        Context::Performance { id }
    }

    pub fn update_performance(id: String) -> Context {
        Context::UpdatePerformance { id }
    }

    pub fn delete_performance(id: String) -> Context {
        Context::DeletePerformance { id }
    }

    pub fn performances_by_dj(dj_id: String) -> Context {
        Context::PerformancesByDj { dj_id }
    }

    pub fn subject(subject_id: String, subject_type: String) -> Context {
        Context::Subject {
            subject_id,
            subject_type,
        }
    }

    pub fn create_review() -> Context {
        Context::CreateReview
    }

    pub fn reviews() -> Context {
        Context::Reviews
    }

    pub fn review(id: String) -> Context {
        Context::Review { id }
    }

    pub fn update_review(id: String) -> Context {
        Context::UpdateReview { id }
    }

    pub fn delete_review(id: String) -> Context {
        Context::DeleteReview { id }
    }

    pub fn reviews_by_type(subject_type: String) -> Context {
        Context::ReviewsByType { subject_type }
    }

    pub fn reviews_by_reviewer(reviewer_name: String) -> Context {
        Context::ReviewsByReviewer { reviewer_name }
    }

    pub fn reviews_by_rating(rating: String) -> Context {
        Context::ReviewsByRating { rating }
    }

    pub fn reviews_by_minimum_rating(min_rating: String) -> Context {
        Context::ReviewsByMinimumRating { min_rating }
    }
}
