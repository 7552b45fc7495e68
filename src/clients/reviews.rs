use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use log::{warn, Logger};
use reqwest::Client;

use super::{get_json, resource_url, ReviewFeed};
use crate::errors::ClientError;
use crate::review::{Review, SubjectStats};
use crate::subject::Subject;

const LIST_DEADLINE: Duration = Duration::from_secs(10);
const STATS_DEADLINE: Duration = Duration::from_secs(5);

/// Reads reviews from the Review Service on behalf of the catalog.
#[derive(Clone)]
pub struct ReviewsClient {
    logger: Arc<Logger>,
    http: Client,
    base: String,
}

impl ReviewsClient {
    pub fn new(logger: Arc<Logger>, base: impl Into<String>) -> Self {
        ReviewsClient {
            logger,
            http: Client::new(),
            base: base.into(),
        }
    }

    pub async fn fetch_reviews(&self, subject: &Subject) -> Result<Vec<Review>, ClientError> {
        let url = resource_url(
            &self.base,
            &[
                "api",
                "reviews",
                "subject",
                subject.subject_type.as_str(),
                subject.id.as_str(),
            ],
        )?;

        let reviews: Option<Vec<Review>> = get_json(&self.http, url, LIST_DEADLINE).await?;

        Ok(reviews.unwrap_or_default())
    }

    pub async fn fetch_stats(&self, subject: &Subject) -> Result<Option<SubjectStats>, ClientError> {
        let url = resource_url(
            &self.base,
            &[
                "api",
                "reviews",
                "stats",
                subject.subject_type.as_str(),
                subject.id.as_str(),
            ],
        )?;

        get_json(&self.http, url, STATS_DEADLINE).await
    }

    fn log_failure(&self, what: &str, subject: &Subject, e: &ClientError) {
        warn!(self.logger, "Could not read from review service"; "request" => what, "subject_id" => &subject.id, "subject_type" => %subject.subject_type, "error" => ?e, "message" => %e);
    }
}

impl ReviewFeed for ReviewsClient {
    fn reviews_for(&self, subject: &Subject) -> BoxFuture<Vec<Review>> {
        let subject = subject.clone();

        async move {
            self.fetch_reviews(&subject).await.unwrap_or_else(|e| {
                self.log_failure("reviews", &subject, &e);
                vec![]
            })
        }
        .boxed()
    }

    fn average_rating(&self, subject: &Subject) -> BoxFuture<f64> {
        let subject = subject.clone();

        async move {
            match self.fetch_stats(&subject).await {
                Ok(stats) => stats.map_or(0.0, |s| s.average_rating),
                Err(e) => {
                    self.log_failure("average rating", &subject, &e);
                    0.0
                }
            }
        }
        .boxed()
    }

    fn review_count(&self, subject: &Subject) -> BoxFuture<u64> {
        let subject = subject.clone();

        async move {
            match self.fetch_stats(&subject).await {
                Ok(stats) => stats.map_or(0, |s| s.review_count),
                Err(e) => {
                    self.log_failure("review count", &subject, &e);
                    0
                }
            }
        }
        .boxed()
    }
}
