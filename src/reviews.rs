use std::sync::Arc;

use log::{info, warn, Logger};

use crate::clients::SubjectDirectory;
use crate::db::ReviewDb;
use crate::errors::FestivalError;
use crate::review::{average_rating, round_rating, Review, ReviewPayload, SubjectStats};
use crate::subject::{Subject, SubjectType};

/// The Review Service's operations. Every write that names a new subject
/// first asks the catalog whether that subject exists.
#[derive(Clone)]
pub struct Reviews {
    logger: Arc<Logger>,
    db: Arc<dyn ReviewDb + Send + Sync>,
    directory: Arc<dyn SubjectDirectory + Send + Sync>,
}

impl Reviews {
    pub fn new(
        logger: Arc<Logger>,
        db: Arc<dyn ReviewDb + Send + Sync>,
        directory: Arc<dyn SubjectDirectory + Send + Sync>,
    ) -> Self {
        Reviews {
            logger,
            db,
            directory,
        }
    }

    async fn ensure_subject_exists(&self, subject: &Subject) -> Result<(), FestivalError> {
        if self
            .directory
            .subject_exists(&subject.id, subject.subject_type)
            .await
        {
            return Ok(());
        }

        warn!(self.logger, "Rejecting review of unknown subject"; "subject_id" => &subject.id, "subject_type" => %subject.subject_type);

        Err(FestivalError::NonExistentSubject {
            subject_id: subject.id.clone(),
            subject_type: subject.subject_type,
        })
    }

    pub async fn create(&self, payload: ReviewPayload) -> Result<Review, FestivalError> {
        let draft = payload.validate()?;

        self.ensure_subject_exists(draft.subject()).await?;

        let review = self.db.insert(Review::create(draft)).await?;
        info!(self.logger, "Created review"; "id" => review.id(), "subject_id" => &review.subject_id, "subject_type" => %review.subject_type);

        Ok(review)
    }

    /// Replaces a review's fields. The subject is only checked again when
    /// it changes.
    pub async fn update(&self, id: &str, payload: ReviewPayload) -> Result<Review, FestivalError> {
        let draft = payload.validate()?;

        let existing = self
            .db
            .retrieve(id)
            .await?
            .ok_or_else(|| FestivalError::ReviewNotFound(id.to_owned()))?;

        if !existing.is_about(draft.subject()) {
            self.ensure_subject_exists(draft.subject()).await?;
        }

        let review = existing.updated(draft);

        if !self.db.update(review.clone()).await? {
            return Err(FestivalError::ReviewNotFound(id.to_owned()));
        }

        info!(self.logger, "Updated review"; "id" => id);

        Ok(review)
    }

    pub async fn delete(&self, id: &str) -> Result<(), FestivalError> {
        if !self.db.delete(id).await? {
            return Err(FestivalError::ReviewNotFound(id.to_owned()));
        }

        info!(self.logger, "Deleted review"; "id" => id);

        Ok(())
    }

    pub async fn review(&self, id: &str) -> Result<Review, FestivalError> {
        self.db
            .retrieve(id)
            .await?
            .ok_or_else(|| FestivalError::ReviewNotFound(id.to_owned()))
    }

    pub async fn reviews(&self) -> Result<Vec<Review>, FestivalError> {
        self.db.retrieve_all().await
    }

    pub async fn reviews_about(&self, subject: &Subject) -> Result<Vec<Review>, FestivalError> {
        self.db.retrieve_by_subject(subject).await
    }

    pub async fn reviews_of_type(&self, subject_type: SubjectType) -> Result<Vec<Review>, FestivalError> {
        self.db.retrieve_by_subject_type(subject_type).await
    }

    pub async fn reviews_by(&self, reviewer_name: &str) -> Result<Vec<Review>, FestivalError> {
        self.db.retrieve_by_reviewer(reviewer_name).await
    }

    pub async fn reviews_with_rating(&self, rating: i64) -> Result<Vec<Review>, FestivalError> {
        self.db.retrieve_by_rating(rating).await
    }

    pub async fn reviews_rated_at_least(&self, rating: i64) -> Result<Vec<Review>, FestivalError> {
        self.db.retrieve_by_minimum_rating(rating).await
    }

    /// The mean rating of the subject's reviews, or `0.0` if it has none.
    pub async fn average_rating(&self, subject: &Subject) -> Result<f64, FestivalError> {
        let reviews = self.db.retrieve_by_subject(subject).await?;

        Ok(average_rating(&reviews))
    }

    pub async fn count(&self, subject: &Subject) -> Result<u64, FestivalError> {
        let reviews = self.db.retrieve_by_subject(subject).await?;

        Ok(reviews.len() as u64)
    }

    pub async fn count_all(&self) -> Result<u64, FestivalError> {
        self.db.count().await
    }

    /// Both aggregates at once, from a single read. The average is rounded
    /// to two decimal places.
    pub async fn stats(&self, subject: &Subject) -> Result<SubjectStats, FestivalError> {
        let reviews = self.db.retrieve_by_subject(subject).await?;

        Ok(SubjectStats {
            subject_id: subject.id.clone(),
            subject_type: subject.subject_type,
            average_rating: round_rating(average_rating(&reviews)),
            review_count: reviews.len() as u64,
        })
    }
}
