use std::sync::Arc;

use log::{debug, error, Logger};
use warp::http::StatusCode;
use warp::reject;
use warp::reply::{json, with_status, Json, Reply, WithStatus};
use warp::Filter;

use crate::environment::{CatalogEnvironment, ReviewEnvironment};
use crate::errors::{ErrorKind, FestivalError};

pub mod admin;
mod handlers;
mod rejection;
mod response;

pub use internal::*;

pub async fn format_rejection(
    logger: Arc<Logger>,
    rej: reject::Rejection,
) -> Result<WithStatus<Json>, reject::Rejection> {
    if let Some(r) = rej.find::<rejection::Rejection>() {
        let e = &r.error;
        let status = status_code_for(e);

        if e.kind() == ErrorKind::Internal {
            error!(logger, "Service error"; "context" => ?r.context, "error" => ?r.error, "status" => %status, "message" => %r.error);
        } else {
            debug!(logger, "Request failed"; "context" => ?r.context, "status" => %status, "message" => %r.error);
        }

        return Ok(with_status(json(&r.flatten(status)), status));
    }

    Err(rej)
}

fn status_code_for(e: &FestivalError) -> StatusCode {
    match e.kind() {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::BadRequest | ErrorKind::ValidationFailed => StatusCode::BAD_REQUEST,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// All of the Catalog Service's routes, with errors rendered as JSON.
pub fn catalog_api(
    environment: CatalogEnvironment,
) -> impl Filter<Extract = (impl Reply,), Error = reject::Rejection> + Clone {
    let logger = environment.logger.clone();

    make_catalog_routes(environment).recover(move |r| format_rejection(logger.clone(), r))
}

/// All of the Review Service's routes, with errors rendered as JSON.
pub fn reviews_api(
    environment: ReviewEnvironment,
) -> impl Filter<Extract = (impl Reply,), Error = reject::Rejection> + Clone {
    let logger = environment.logger.clone();

    make_review_routes(environment).recover(move |r| format_rejection(logger.clone(), r))
}

mod internal {
    use warp::filters::BoxedFilter;
    use warp::hyper::body::Bytes;
    use warp::path::end;
    use warp::Filter;
    use warp::Reply;
    use warp::{delete, get as g, path as p, path::param as par, post, put};

    use super::handlers;
    use crate::environment::{CatalogEnvironment, ReviewEnvironment};

    type Route = BoxedFilter<(Box<dyn Reply>,)>;

    macro_rules! route_filter {
        ($route_variable:ident; $first:expr) => (let $route_variable = $route_variable.and($first););
        ($route_variable:ident; $first:expr, $($rest:expr),+) => (
            let $route_variable = $route_variable.and($first);
            route_filter!($route_variable; $($rest),+);
        )
    }

    macro_rules! route {
        ($name:ident, $environment:ty => $handler:ident, $route_variable:ident; $($filters:expr),+) => (
            pub fn $name(environment: $environment) -> Route {
                let $route_variable = warp::any()
                    .map(move || environment.clone())
                    .and(p("api"));

                route_filter!($route_variable; $($filters),+);

                $route_variable.and_then(handlers::$handler)
                    .boxed()
            }
        );
    }

    // no length limit: chunked requests carry no `Content-Length`
    fn body() -> impl Filter<Extract = (Bytes,), Error = warp::Rejection> + Clone {
        warp::body::bytes()
    }

    fn combine(first: Route, rest: Vec<Route>) -> Route {
        rest.into_iter()
            .fold(first, |routes, route| routes.or(route).unify().boxed())
    }

    type C = CatalogEnvironment;
    type R = ReviewEnvironment;

    // literal segments are registered before the `{id}` routes they would
    // otherwise be captured by
    route!(make_long_names_route, C => djs_with_long_names, rt; p("djs"), p("long-names"), end(), g());
    route!(make_djs_by_genre_route, C => djs_by_genre, rt; p("djs"), p("genre"), par::<String>(), end(), g());
    route!(make_djs_by_name_route, C => djs_by_name, rt; p("djs"), p("name"), par::<String>(), end(), g());
    route!(make_dj_reviews_route, C => dj_reviews, rt; p("djs"), par::<String>(), p("reviews"), end(), g());
    route!(make_dj_rating_route, C => dj_rating, rt; p("djs"), par::<String>(), p("rating"), end(), g());
    route!(make_dj_review_count_route, C => dj_review_count, rt; p("djs"), par::<String>(), p("review-count"), end(), g());
    route!(make_create_dj_route, C => create_dj, rt; p("djs"), end(), post(), body());
    route!(make_djs_route, C => djs, rt; p("djs"), end(), g());
    route!(make_dj_route, C => dj, rt; p("djs"), par::<String>(), end(), g());
    route!(make_update_dj_route, C => update_dj, rt; p("djs"), par::<String>(), end(), put(), body());
    route!(make_delete_dj_route, C => delete_dj, rt; p("djs"), par::<String>(), end(), delete());

    route!(make_performances_by_dj_route, C => performances_by_dj, rt; p("performances"), p("dj"), par::<String>(), end(), g());
    route!(make_performance_reviews_route, C => performance_reviews, rt; p("performances"), par::<String>(), p("reviews"), end(), g());
    route!(make_performance_rating_route, C => performance_rating, rt; p("performances"), par::<String>(), p("rating"), end(), g());
    route!(make_performance_review_count_route, C => performance_review_count, rt; p("performances"), par::<String>(), p("review-count"), end(), g());
    route!(make_create_performance_route, C => create_performance, rt; p("performances"), end(), post(), body());
    route!(make_performances_route, C => performances, rt; p("performances"), end(), g());
    route!(make_performance_route, C => performance, rt; p("performances"), par::<String>(), end(), g());
    route!(make_update_performance_route, C => update_performance, rt; p("performances"), par::<String>(), end(), put(), body());
    route!(make_delete_performance_route, C => delete_performance, rt; p("performances"), par::<String>(), end(), delete());

    route!(make_health_route, R => health, rt; p("reviews"), p("health"), end(), g());
    route!(make_reviews_about_route, R => reviews_about, rt; p("reviews"), p("subject"), par::<String>(), par::<String>(), end(), g());
    route!(make_review_stats_route, R => review_stats, rt; p("reviews"), p("stats"), par::<String>(), par::<String>(), end(), g());
    route!(make_reviews_of_type_route, R => reviews_of_type, rt; p("reviews"), p("type"), par::<String>(), end(), g());
    route!(make_reviews_by_reviewer_route, R => reviews_by_reviewer, rt; p("reviews"), p("reviewer"), par::<String>(), end(), g());
    route!(make_reviews_rated_at_least_route, R => reviews_rated_at_least, rt; p("reviews"), p("rating"), p("min"), par::<String>(), end(), g());
    route!(make_reviews_with_rating_route, R => reviews_with_rating, rt; p("reviews"), p("rating"), par::<String>(), end(), g());
    route!(make_create_review_route, R => create_review, rt; p("reviews"), end(), post(), body());
    route!(make_reviews_route, R => all_reviews, rt; p("reviews"), end(), g());
    route!(make_review_route, R => review, rt; p("reviews"), par::<String>(), end(), g());
    route!(make_update_review_route, R => update_review, rt; p("reviews"), par::<String>(), end(), put(), body());
    route!(make_delete_review_route, R => delete_review, rt; p("reviews"), par::<String>(), end(), delete());

    pub fn make_catalog_routes(environment: CatalogEnvironment) -> Route {
        let e = environment;

        combine(
            make_long_names_route(e.clone()),
            vec![
                make_djs_by_genre_route(e.clone()),
                make_djs_by_name_route(e.clone()),
                make_dj_reviews_route(e.clone()),
                make_dj_rating_route(e.clone()),
                make_dj_review_count_route(e.clone()),
                make_create_dj_route(e.clone()),
                make_djs_route(e.clone()),
                make_dj_route(e.clone()),
                make_update_dj_route(e.clone()),
                make_delete_dj_route(e.clone()),
                make_performances_by_dj_route(e.clone()),
                make_performance_reviews_route(e.clone()),
                make_performance_rating_route(e.clone()),
                make_performance_review_count_route(e.clone()),
                make_create_performance_route(e.clone()),
                make_performances_route(e.clone()),
                make_performance_route(e.clone()),
                make_update_performance_route(e.clone()),
                make_delete_performance_route(e),
            ],
        )
    }

    pub fn make_review_routes(environment: ReviewEnvironment) -> Route {
        let e = environment;

        combine(
            make_health_route(e.clone()),
            vec![
                make_reviews_about_route(e.clone()),
                make_review_stats_route(e.clone()),
                make_reviews_of_type_route(e.clone()),
                make_reviews_by_reviewer_route(e.clone()),
                make_reviews_rated_at_least_route(e.clone()),
                make_reviews_with_rating_route(e.clone()),
                make_create_review_route(e.clone()),
                make_reviews_route(e.clone()),
                make_review_route(e.clone()),
                make_update_review_route(e.clone()),
                make_delete_review_route(e),
            ],
        )
    }
}
