use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use log::{debug, warn, Logger};
use reqwest::Client;
use serde::Deserialize;

use super::{get_json, resource_url, SubjectDirectory};
use crate::errors::ClientError;
use crate::subject::SubjectType;

/// Asks the Catalog Service whether DJs and performances exist.
#[derive(Clone)]
pub struct CatalogClient {
    logger: Arc<Logger>,
    http: Client,
    base: String,
    deadline: Duration,
}

/// The only part of a catalog entry the check looks at.
#[derive(Deserialize)]
struct SubjectBody {
    id: String,
}

impl CatalogClient {
    pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(5);

    /// `base` is the root URL of the Catalog Service. It's only parsed
    /// when a check is made, so a bad value makes every check fail
    /// rather than preventing start-up.
    pub fn new(logger: Arc<Logger>, base: impl Into<String>, deadline: Duration) -> Self {
        CatalogClient {
            logger,
            http: Client::new(),
            base: base.into(),
            deadline,
        }
    }

    /// Looks the subject up once. `Ok(false)` means the catalog answered
    /// and doesn't know the subject.
    pub async fn check(
        &self,
        subject_id: &str,
        subject_type: SubjectType,
    ) -> Result<bool, ClientError> {
        let url = resource_url(&self.base, &["api", subject_type.collection(), subject_id])?;

        let body: Option<SubjectBody> = get_json(&self.http, url, self.deadline).await?;

        Ok(body.map_or(false, |body| body.id == subject_id))
    }
}

impl SubjectDirectory for CatalogClient {
    fn subject_exists(&self, subject_id: &str, subject_type: SubjectType) -> BoxFuture<bool> {
        let subject_id = subject_id.to_owned();

        async move {
            match self.check(&subject_id, subject_type).await {
                Ok(exists) => {
                    debug!(self.logger, "Checked subject"; "subject_id" => &subject_id, "subject_type" => %subject_type, "exists" => exists);
                    exists
                }
                Err(e) => {
                    warn!(self.logger, "Could not check subject"; "subject_id" => &subject_id, "subject_type" => %subject_type, "error" => ?e, "message" => %e);
                    false
                }
            }
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;

    use warp::http::StatusCode;
    use warp::path::FullPath;
    use warp::reply::{json, with_status, Reply};
    use warp::Filter;

    use super::*;

    fn client(base: impl Into<String>, deadline: Duration) -> CatalogClient {
        CatalogClient::new(Arc::new(log::silent_logger()), base, deadline)
    }

    macro_rules! serve_stub {
        ($filter:expr $(,)?) => {{
            let (address, server) = warp::serve($filter).bind_ephemeral(([127, 0, 0, 1], 0));
            tokio::spawn(server);

            format!("http://{}", address)
        }};
    }

    fn echo_id() -> impl Filter<Extract = (impl Reply,), Error = warp::Rejection> + Clone {
        warp::path!("api" / String / String).map(|collection: String, id: String| {
            json(&serde_json::json!({ "id": id, "collection": collection }))
        })
    }

    #[tokio::test]
    async fn existing_subjects_are_found() {
        let base = serve_stub!(echo_id());
        let client = client(base, CatalogClient::DEFAULT_DEADLINE);

        assert!(client.subject_exists("dj-1", SubjectType::Dj).await);
        assert!(client.subject_exists("p-1", SubjectType::Performance).await);
    }

    #[tokio::test]
    async fn collection_follows_subject_type() {
        let base = serve_stub!(
            warp::path!("api" / "performances" / String)
                .map(|id: String| json(&serde_json::json!({ "id": id }))),
        );
        let client = client(base, CatalogClient::DEFAULT_DEADLINE);

        assert!(client.subject_exists("p-1", SubjectType::Performance).await);
        assert!(!client.subject_exists("p-1", SubjectType::Dj).await);
    }

    #[tokio::test]
    async fn missing_subjects_are_not_found() {
        let base = serve_stub!(
            warp::any().map(|| with_status(json(&serde_json::json!({})), StatusCode::NOT_FOUND)),
        );
        let client = client(base, CatalogClient::DEFAULT_DEADLINE);

        assert!(!client.subject_exists("dj-1", SubjectType::Dj).await);
        assert!(matches!(client.check("dj-1", SubjectType::Dj).await, Ok(false)));
    }

    #[tokio::test]
    async fn server_errors_mean_not_found() {
        let base = serve_stub!(warp::any().map(|| StatusCode::INTERNAL_SERVER_ERROR));
        let client = client(base, CatalogClient::DEFAULT_DEADLINE);

        assert!(!client.subject_exists("dj-1", SubjectType::Dj).await);
        assert!(matches!(
            client.check("dj-1", SubjectType::Dj).await,
            Err(ClientError::UnexpectedStatus { .. })
        ));
    }

    #[tokio::test]
    async fn slow_catalogs_time_out() {
        let base = serve_stub!(warp::any().and_then(|| async {
            tokio::time::sleep(Duration::from_millis(500)).await;
            Ok::<_, warp::Rejection>(json(&serde_json::json!({ "id": "dj-1" })))
        }));
        let client = client(base, Duration::from_millis(50));

        assert!(!client.subject_exists("dj-1", SubjectType::Dj).await);
        assert!(matches!(
            client.check("dj-1", SubjectType::Dj).await,
            Err(ClientError::Timeout { millis: 50 })
        ));
    }

    #[tokio::test]
    async fn unreachable_catalogs_mean_not_found() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").expect("bind local port");
            listener.local_addr().expect("get local address").port()
        };
        let client = client(format!("http://127.0.0.1:{}", port), CatalogClient::DEFAULT_DEADLINE);

        assert!(!client.subject_exists("dj-1", SubjectType::Dj).await);
        assert!(matches!(
            client.check("dj-1", SubjectType::Dj).await,
            Err(ClientError::Transport { .. })
        ));
    }

    #[tokio::test]
    async fn unexpected_bodies_mean_not_found() {
        let base = serve_stub!(warp::any().map(|| "<html>welcome</html>"));
        let client = client(base, CatalogClient::DEFAULT_DEADLINE);

        assert!(!client.subject_exists("dj-1", SubjectType::Dj).await);
        assert!(matches!(
            client.check("dj-1", SubjectType::Dj).await,
            Err(ClientError::MalformedBody { .. })
        ));
    }

    #[tokio::test]
    async fn other_ids_mean_not_found() {
        let base = serve_stub!(warp::any().map(|| json(&serde_json::json!({ "id": "someone-else" }))));
        let client = client(base, CatalogClient::DEFAULT_DEADLINE);

        assert!(!client.subject_exists("dj-1", SubjectType::Dj).await);
    }

    #[tokio::test]
    async fn ids_are_sent_as_one_segment() {
        let base = serve_stub!(warp::path::full().map(|path: FullPath| {
            if path.as_str() == "/api/djs/a%20b%2Fc%3F" {
                with_status(json(&serde_json::json!({ "id": "a b/c?" })), StatusCode::OK)
            } else {
                with_status(json(&serde_json::json!({})), StatusCode::NOT_FOUND)
            }
        }));
        let client = client(base, CatalogClient::DEFAULT_DEADLINE);

        assert!(client.subject_exists("a b/c?", SubjectType::Dj).await);
    }

    #[tokio::test]
    async fn invalid_bases_mean_not_found() {
        let client = client("not a url", CatalogClient::DEFAULT_DEADLINE);

        assert!(!client.subject_exists("dj-1", SubjectType::Dj).await);
        assert!(matches!(
            client.check("dj-1", SubjectType::Dj).await,
            Err(ClientError::InvalidBaseUrl { .. })
        ));
    }
}
