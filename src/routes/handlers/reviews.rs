use log::debug;
use warp::http::StatusCode;
use warp::hyper::body::Bytes;
use warp::reply::{json, with_header, with_status, Reply};

use super::{decode, format_server_timing, parse_body, RouteResult, SERVER_TIMING_HEADER};
use crate::environment::ReviewEnvironment;
use crate::errors::FestivalError;
use crate::review::ReviewPayload;
use crate::routes::rejection::{Context, Rejection};
use crate::routes::response::SuccessResponse;
use crate::subject::{Subject, SubjectType};

pub async fn health(environment: ReviewEnvironment) -> RouteResult {
    timed! {
        json(&SuccessResponse::Health {
            status: "UP",
            service: environment.config.service_name(),
        })
    }
}

pub async fn create_review(environment: ReviewEnvironment, body: Bytes) -> RouteResult {
    timed! {
        let error_handler = |e: FestivalError| Rejection::new(Context::create_review(), e);

        let payload: ReviewPayload = parse_body(&body).map_err(error_handler)?;
        let review = environment
            .service
            .create(payload)
            .await
            .map_err(error_handler)?;

        with_header(
            with_status(json(&review), StatusCode::CREATED),
            "location",
            environment.urls.review(review.id()).as_str(),
        )
    }
}

pub async fn all_reviews(environment: ReviewEnvironment) -> RouteResult {
    timed! {
        let reviews = environment
            .service
            .reviews()
            .await
            .map_err(|e| Rejection::new(Context::reviews(), e))?;

        json(&reviews)
    }
}

pub async fn review(environment: ReviewEnvironment, id: String) -> RouteResult {
    timed! {
        let id = decode(&id);
        let review = environment
            .service
            .review(&id)
            .await
            .map_err(|e| Rejection::new(Context::review(id.clone()), e))?;

        json(&review)
    }
}

pub async fn update_review(environment: ReviewEnvironment, id: String, body: Bytes) -> RouteResult {
    timed! {
        let id = decode(&id);
        let error_handler = |e: FestivalError| Rejection::new(Context::update_review(id.clone()), e);

        let payload: ReviewPayload = parse_body(&body).map_err(error_handler)?;
        let review = environment
            .service
            .update(&id, payload)
            .await
            .map_err(error_handler)?;

        json(&review)
    }
}

pub async fn delete_review(environment: ReviewEnvironment, id: String) -> RouteResult {
    timed! {
        let id = decode(&id);
        debug!(environment.logger, "Deleting review..."; "id" => &id);

        environment
            .service
            .delete(&id)
            .await
            .map_err(|e| Rejection::new(Context::delete_review(id.clone()), e))?;

        StatusCode::NO_CONTENT
    }
}

/// Reads a subject from the path. The type is matched without regard to
/// case.
fn subject_from_path(subject_type: &str, subject_id: &str) -> Result<Subject, Rejection> {
    let subject_type = decode(subject_type);
    let subject_id = decode(subject_id);

    SubjectType::from_path(&subject_type)
        .map(|t| Subject::new(subject_id.clone(), t))
        .map_err(|e| Rejection::new(Context::subject(subject_id, subject_type), e))
}

pub async fn reviews_about(
    environment: ReviewEnvironment,
    subject_type: String,
    subject_id: String,
) -> RouteResult {
    timed! {
        let subject = subject_from_path(&subject_type, &subject_id)?;
        let reviews = environment
            .service
            .reviews_about(&subject)
            .await
            .map_err(|e| {
                Rejection::new(
                    Context::subject(subject.id.clone(), subject.subject_type.as_str().to_owned()),
                    e,
                )
            })?;

        json(&reviews)
    }
}

pub async fn review_stats(
    environment: ReviewEnvironment,
    subject_type: String,
    subject_id: String,
) -> RouteResult {
    timed! {
        let subject = subject_from_path(&subject_type, &subject_id)?;
        let stats = environment
            .service
            .stats(&subject)
            .await
            .map_err(|e| {
                Rejection::new(
                    Context::subject(subject.id.clone(), subject.subject_type.as_str().to_owned()),
                    e,
                )
            })?;

        json(&stats)
    }
}

pub async fn reviews_of_type(environment: ReviewEnvironment, subject_type: String) -> RouteResult {
    timed! {
        let subject_type = decode(&subject_type);
        let error_handler =
            |e: FestivalError| Rejection::new(Context::reviews_by_type(subject_type.clone()), e);

        let parsed = SubjectType::from_path(&subject_type).map_err(error_handler)?;
        let reviews = environment
            .service
            .reviews_of_type(parsed)
            .await
            .map_err(error_handler)?;

        json(&reviews)
    }
}

pub async fn reviews_by_reviewer(
    environment: ReviewEnvironment,
    reviewer_name: String,
) -> RouteResult {
    timed! {
        let reviewer_name = decode(&reviewer_name);
        let reviews = environment
            .service
            .reviews_by(&reviewer_name)
            .await
            .map_err(|e| Rejection::new(Context::reviews_by_reviewer(reviewer_name.clone()), e))?;

        json(&reviews)
    }
}

/// Reads a rating from the path.
fn rating_from_path(rating: &str, context: Context) -> Result<i64, Rejection> {
    let rating = decode(rating);

    rating
        .parse::<i64>()
        .map_err(|_| Rejection::new(context, FestivalError::InvalidRating(rating)))
}

pub async fn reviews_with_rating(environment: ReviewEnvironment, rating: String) -> RouteResult {
    timed! {
        let context = || Context::reviews_by_rating(rating.clone());
        let value = rating_from_path(&rating, context())?;

        let reviews = environment
            .service
            .reviews_with_rating(value)
            .await
            .map_err(|e| Rejection::new(context(), e))?;

        json(&reviews)
    }
}

pub async fn reviews_rated_at_least(environment: ReviewEnvironment, min_rating: String) -> RouteResult {
    timed! {
        let context = || Context::reviews_by_minimum_rating(min_rating.clone());
        let value = rating_from_path(&min_rating, context())?;

        let reviews = environment
            .service
            .reviews_rated_at_least(value)
            .await
            .map_err(|e| Rejection::new(context(), e))?;

        json(&reviews)
    }
}
