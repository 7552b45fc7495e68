use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use warp::http::StatusCode;
use warp::reject;
use warp::reply::{json, Reply};
use warp::Filter;

use super::response::SuccessResponse;
use crate::environment::Environment;

pub fn make_healthz_route<'a, S: Clone + Send + Sync + 'a>(
    environment: Environment<S>,
) -> impl warp::Filter<Extract = (impl Reply,), Error = reject::Rejection> + Clone + 'a {
    let service = environment.config.service_name();

    warp::path("healthz")
        .and(warp::path::end())
        .and(warp::get())
        .map(move || {
            json(&SuccessResponse::Healthz {
                service,
                revision: info::REVISION,
                timestamp: info::BUILD_TIMESTAMP,
                version: info::VERSION,
            })
        })
}

type TerminationFuture<'a> = BoxFuture<'a, ()>;

pub type TerminationFunctionWrapper<'a> =
    Arc<dyn Fn() -> TerminationFuture<'a> + Send + Sync + 'a>;

pub fn make_termination_route<'a, S: Clone + Send + Sync + 'a>(
    _environment: Environment<S>,
    terminate: TerminationFunctionWrapper<'a>,
) -> impl warp::Filter<Extract = (impl Reply,), Error = reject::Rejection> + Clone + 'a {
    let handler = move || -> BoxFuture<Result<StatusCode, std::convert::Infallible>> {
        let terminate = terminate.clone();

        async move {
            terminate().await;
            Ok(StatusCode::NO_CONTENT)
        }
        .boxed()
    };

    warp::path("terminate")
        .and(warp::path::end())
        .and(warp::post())
        .and_then(handler)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};

    use futures::future::ready;

    use super::*;
    use crate::catalog::Catalog;
    use crate::clients::ReviewsClient;
    use crate::db::MemoryCatalogDb;
    use crate::environment::{CatalogEnvironment, Config};
    use crate::urls::Urls;

    fn catalog_environment(config: Config) -> CatalogEnvironment {
        let logger = Arc::new(log::silent_logger());
        let catalog = Catalog::new(
            logger.clone(),
            Arc::new(MemoryCatalogDb::new()),
            Arc::new(ReviewsClient::new(logger.clone(), "http://127.0.0.1:9")),
        );

        Environment::new(
            logger,
            catalog,
            Arc::new(Urls::new("http://localhost:8080")),
            config,
        )
    }

    #[tokio::test]
    async fn healthz_reports_the_build() {
        let route = make_healthz_route(catalog_environment(Config::new("Catalog Service")));

        let response = warp::test::request()
            .path("/healthz")
            .method("GET")
            .reply(&route)
            .await;

        assert_eq!(response.status(), StatusCode::OK);

        let body: serde_json::Value = serde_json::from_slice(response.body()).expect("parse body");
        assert_eq!(body["service"], "Catalog Service");
        assert_eq!(body["version"], info::VERSION);
    }

    #[tokio::test]
    async fn terminate_invokes_the_callback() {
        let called = Arc::new(AtomicBool::new(false));
        let flag = called.clone();
        let terminate: TerminationFunctionWrapper<'static> = Arc::new(move || {
            flag.store(true, Ordering::SeqCst);
            ready(()).boxed()
        });

        let route = make_termination_route(
            catalog_environment(Config::new("Catalog Service")),
            terminate,
        );

        let response = warp::test::request()
            .path("/terminate")
            .method("POST")
            .reply(&route)
            .await;

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(called.load(Ordering::SeqCst));
    }
}
