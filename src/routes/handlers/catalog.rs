use log::debug;
use warp::http::StatusCode;
use warp::hyper::body::Bytes;
use warp::reply::{json, with_header, with_status, Reply};

use super::{decode, format_server_timing, parse_body, RouteResult, SERVER_TIMING_HEADER};
use crate::dj::DjPayload;
use crate::environment::CatalogEnvironment;
use crate::errors::FestivalError;
use crate::performance::PerformancePayload;
use crate::routes::rejection::{Context, Rejection};
use crate::subject::{Subject, SubjectType};

pub async fn create_dj(environment: CatalogEnvironment, body: Bytes) -> RouteResult {
    timed! {
        let error_handler = |e: FestivalError| Rejection::new(Context::create_dj(), e);

        let payload: DjPayload = parse_body(&body).map_err(error_handler)?;
        let dj = environment
            .service
            .create_dj(payload)
            .await
            .map_err(error_handler)?;

        with_header(
            with_status(json(&dj), StatusCode::CREATED),
            "location",
            environment.urls.dj(dj.id()).as_str(),
        )
    }
}

pub async fn djs(environment: CatalogEnvironment) -> RouteResult {
    timed! {
        let djs = environment
            .service
            .djs()
            .await
            .map_err(|e| Rejection::new(Context::djs(), e))?;

        json(&djs)
    }
}

pub async fn dj(environment: CatalogEnvironment, id: String) -> RouteResult {
    timed! {
        let id = decode(&id);
        let dj = environment
            .service
            .dj(&id)
            .await
            .map_err(|e| Rejection::new(Context::dj(id.clone()), e))?;

        json(&dj)
    }
}

pub async fn update_dj(environment: CatalogEnvironment, id: String, body: Bytes) -> RouteResult {
    timed! {
        let id = decode(&id);
        let error_handler = |e: FestivalError| Rejection::new(Context::update_dj(id.clone()), e);

        let payload: DjPayload = parse_body(&body).map_err(error_handler)?;
        let dj = environment
            .service
            .update_dj(&id, payload)
            .await
            .map_err(error_handler)?;

        json(&dj)
    }
}

pub async fn delete_dj(environment: CatalogEnvironment, id: String) -> RouteResult {
    timed! {
        let id = decode(&id);
        debug!(environment.logger, "Deleting DJ..."; "id" => &id);

        environment
            .service
            .delete_dj(&id)
            .await
            .map_err(|e| Rejection::new(Context::delete_dj(id.clone()), e))?;

        StatusCode::NO_CONTENT
    }
}

pub async fn djs_by_genre(environment: CatalogEnvironment, genre: String) -> RouteResult {
    timed! {
        let genre = decode(&genre);
        let djs = environment
            .service
            .djs_by_genre(&genre)
            .await
            .map_err(|e| Rejection::new(Context::djs_by_genre(genre.clone()), e))?;

        json(&djs)
    }
}

pub async fn djs_by_name(environment: CatalogEnvironment, name: String) -> RouteResult {
    timed! {
        let name = decode(&name);
        let djs = environment
            .service
            .djs_by_name(&name)
            .await
            .map_err(|e| Rejection::new(Context::djs_by_name(name.clone()), e))?;

        json(&djs)
    }
}

pub async fn djs_with_long_names(environment: CatalogEnvironment) -> RouteResult {
    timed! {
        let djs = environment
            .service
            .djs_with_long_names()
            .await
            .map_err(|e| Rejection::new(Context::long_names(), e))?;

        json(&djs)
    }
}

pub async fn create_performance(environment: CatalogEnvironment, body: Bytes) -> RouteResult {
    timed! {
        let error_handler = |e: FestivalError| Rejection::new(Context::create_performance(), e);

        let payload: PerformancePayload = parse_body(&body).map_err(error_handler)?;
        let performance = environment
            .service
            .create_performance(payload)
            .await
            .map_err(error_handler)?;

        with_header(
            with_status(json(&performance), StatusCode::CREATED),
            "location",
            environment.urls.performance(performance.id()).as_str(),
        )
    }
}

pub async fn performances(environment: CatalogEnvironment) -> RouteResult {
    timed! {
        let performances = environment
            .service
            .performances()
            .await
            .map_err(|e| Rejection::new(Context::performances(), e))?;

        json(&performances)
    }
}

pub async fn performance(environment: CatalogEnvironment, id: String) -> RouteResult {
    timed! {
        let id = decode(&id);
        let performance = environment
            .service
            .performance(&id)
            .await
            .map_err(|e| Rejection::new(Context::performance(id.clone()), e))?;

        json(&performance)
    }
}

pub async fn update_performance(
    environment: CatalogEnvironment,
    id: String,
    body: Bytes,
) -> RouteResult {
    timed! {
        let id = decode(&id);
        let error_handler =
            |e: FestivalError| Rejection::new(Context::update_performance(id.clone()), e);

        let payload: PerformancePayload = parse_body(&body).map_err(error_handler)?;
        let performance = environment
            .service
            .update_performance(&id, payload)
            .await
            .map_err(error_handler)?;

        json(&performance)
    }
}

pub async fn delete_performance(environment: CatalogEnvironment, id: String) -> RouteResult {
    timed! {
        let id = decode(&id);
        debug!(environment.logger, "Deleting performance..."; "id" => &id);

        environment
            .service
            .delete_performance(&id)
            .await
            .map_err(|e| Rejection::new(Context::delete_performance(id.clone()), e))?;

        StatusCode::NO_CONTENT
    }
}

pub async fn performances_by_dj(environment: CatalogEnvironment, dj_id: String) -> RouteResult {
    timed! {
        let dj_id = decode(&dj_id);
        let performances = environment
            .service
            .performances_by_dj(&dj_id)
            .await
            .map_err(|e| Rejection::new(Context::performances_by_dj(dj_id.clone()), e))?;

        json(&performances)
    }
}

fn subject(id: &str, subject_type: SubjectType) -> (Subject, impl Fn(FestivalError) -> Rejection) {
    let subject = Subject::new(decode(id), subject_type);
    let context = Context::subject(subject.id.clone(), subject_type.as_str().to_owned());

    (subject, move |e| Rejection::new(context.clone(), e))
}

pub async fn dj_reviews(environment: CatalogEnvironment, id: String) -> RouteResult {
    timed! {
        let (subject, error_handler) = subject(&id, SubjectType::Dj);
        let reviews = environment
            .service
            .subject_reviews(&subject)
            .await
            .map_err(error_handler)?;

        json(&reviews)
    }
}

pub async fn dj_rating(environment: CatalogEnvironment, id: String) -> RouteResult {
    timed! {
        let (subject, error_handler) = subject(&id, SubjectType::Dj);
        let rating = environment
            .service
            .subject_rating(&subject)
            .await
            .map_err(error_handler)?;

        json(&rating)
    }
}

pub async fn dj_review_count(environment: CatalogEnvironment, id: String) -> RouteResult {
    timed! {
        let (subject, error_handler) = subject(&id, SubjectType::Dj);
        let count = environment
            .service
            .subject_review_count(&subject)
            .await
            .map_err(error_handler)?;

        json(&count)
    }
}

pub async fn performance_reviews(environment: CatalogEnvironment, id: String) -> RouteResult {
    timed! {
        let (subject, error_handler) = subject(&id, SubjectType::Performance);
        let reviews = environment
            .service
            .subject_reviews(&subject)
            .await
            .map_err(error_handler)?;

        json(&reviews)
    }
}

pub async fn performance_rating(environment: CatalogEnvironment, id: String) -> RouteResult {
    timed! {
        let (subject, error_handler) = subject(&id, SubjectType::Performance);
        let rating = environment
            .service
            .subject_rating(&subject)
            .await
            .map_err(error_handler)?;

        json(&rating)
    }
}

pub async fn performance_review_count(environment: CatalogEnvironment, id: String) -> RouteResult {
    timed! {
        let (subject, error_handler) = subject(&id, SubjectType::Performance);
        let count = environment
            .service
            .subject_review_count(&subject)
            .await
            .map_err(error_handler)?;

        json(&count)
    }
}
