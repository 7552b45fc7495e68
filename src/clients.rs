//! Outbound calls between the two services.

use std::time::Duration;

use futures::future::BoxFuture;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use crate::errors::ClientError;
use crate::review::Review;
use crate::subject::{Subject, SubjectType};

pub use self::catalog::CatalogClient;
pub use self::reviews::ReviewsClient;

mod catalog;
mod reviews;

/// Answers whether a subject exists in the Catalog Service.
pub trait SubjectDirectory {
    /// Never fails: any problem reaching the catalog counts as "does not
    /// exist".
    fn subject_exists(&self, subject_id: &str, subject_type: SubjectType) -> BoxFuture<bool>;
}

/// Read access to the Review Service. Every call falls back to an empty
/// result when the service can't be reached.
pub trait ReviewFeed {
    fn reviews_for(&self, subject: &Subject) -> BoxFuture<Vec<Review>>;

    fn average_rating(&self, subject: &Subject) -> BoxFuture<f64>;

    fn review_count(&self, subject: &Subject) -> BoxFuture<u64>;
}

/// Appends `segments` to the path of `base`, percent-encoding each one.
pub(crate) fn resource_url(base: &str, segments: &[&str]) -> Result<Url, ClientError> {
    let invalid = || ClientError::InvalidBaseUrl {
        base: base.to_owned(),
    };

    let mut url = Url::parse(base).map_err(|_| invalid())?;

    url.path_segments_mut()
        .map_err(|_| invalid())?
        .pop_if_empty()
        .extend(segments);

    Ok(url)
}

/// Performs one GET with a deadline and parses the JSON body. A 404 is
/// `Ok(None)`; any other non-success status is an error.
pub(crate) async fn get_json<T: DeserializeOwned>(
    http: &Client,
    url: Url,
    deadline: Duration,
) -> Result<Option<T>, ClientError> {
    let call = async {
        let response = http
            .get(url)
            .send()
            .await
            .map_err(|source| ClientError::Transport { source })?;

        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !status.is_success() {
            return Err(ClientError::UnexpectedStatus { status });
        }

        let body = response
            .json::<T>()
            .await
            .map_err(|source| ClientError::MalformedBody { source })?;

        Ok::<_, ClientError>(Some(body))
    };

    tokio::time::timeout(deadline, call)
        .await
        .map_err(|_| ClientError::Timeout {
            millis: deadline.as_millis(),
        })?
}
