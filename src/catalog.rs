use std::sync::Arc;

use log::{debug, info, Logger};

use crate::clients::ReviewFeed;
use crate::db::CatalogDb;
use crate::dj::{Dj, DjPayload};
use crate::errors::FestivalError;
use crate::performance::{Performance, PerformancePayload};
use crate::review::Review;
use crate::subject::{Subject, SubjectType};
use crate::validation::char_length;

/// DJs whose names are longer than this count as having long names.
const LONG_NAME_THRESHOLD: usize = 6;

/// The Catalog Service's operations on DJs and performances.
#[derive(Clone)]
pub struct Catalog {
    logger: Arc<Logger>,
    db: Arc<dyn CatalogDb + Send + Sync>,
    reviews: Arc<dyn ReviewFeed + Send + Sync>,
}

impl Catalog {
    pub fn new(
        logger: Arc<Logger>,
        db: Arc<dyn CatalogDb + Send + Sync>,
        reviews: Arc<dyn ReviewFeed + Send + Sync>,
    ) -> Self {
        Catalog {
            logger,
            db,
            reviews,
        }
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    pub async fn create_dj(&self, payload: DjPayload) -> Result<Dj, FestivalError> {
        let draft = payload.validate()?;

        if self.db.retrieve_dj_by_email(&draft.email).await?.is_some() {
            return Err(FestivalError::EmailAlreadyExists(draft.email));
        }

        let dj = self.db.insert_dj(Dj::create(draft)).await?;
        info!(self.logger, "Created DJ"; "id" => dj.id());

        Ok(dj)
    }

    /// Replaces a DJ's fields. The email address is only checked for
    /// uniqueness when it changes.
    pub async fn update_dj(&self, id: &str, payload: DjPayload) -> Result<Dj, FestivalError> {
        let draft = payload.validate()?;

        let existing = self
            .db
            .retrieve_dj(id)
            .await?
            .ok_or_else(|| FestivalError::UpdateOfMissingDj(id.to_owned()))?;

        if existing.email != draft.email
            && self.db.retrieve_dj_by_email(&draft.email).await?.is_some()
        {
            return Err(FestivalError::EmailAlreadyExists(draft.email));
        }

        let dj = existing.updated(draft);

        if !self.db.update_dj(dj.clone()).await? {
            return Err(FestivalError::UpdateOfMissingDj(id.to_owned()));
        }

        info!(self.logger, "Updated DJ"; "id" => id);

        Ok(dj)
    }

    /// Deletes a DJ and all of their performances.
    pub async fn delete_dj(&self, id: &str) -> Result<(), FestivalError> {
        if !self.db.delete_dj(id).await? {
            return Err(FestivalError::DjNotFoundForDeletion(id.to_owned()));
        }

        info!(self.logger, "Deleted DJ"; "id" => id);

        Ok(())
    }

    pub async fn dj(&self, id: &str) -> Result<Dj, FestivalError> {
        self.db
            .retrieve_dj(id)
            .await?
            .ok_or_else(|| FestivalError::DjNotFound(id.to_owned()))
    }

    pub async fn djs(&self) -> Result<Vec<Dj>, FestivalError> {
        self.db.retrieve_djs().await
    }

    pub async fn djs_by_genre(&self, genre: &str) -> Result<Vec<Dj>, FestivalError> {
        let djs = self.db.retrieve_djs_by_genre(genre).await?;

        if djs.is_empty() {
            return Err(FestivalError::NoDjsForGenre(genre.to_owned()));
        }

        Ok(djs)
    }

    pub async fn djs_by_name(&self, name: &str) -> Result<Vec<Dj>, FestivalError> {
        let djs = self.db.retrieve_djs_by_name(name).await?;

        if djs.is_empty() {
            return Err(FestivalError::NoDjsWithName(name.to_owned()));
        }

        Ok(djs)
    }

    /// Returns the DJs whose names are longer than six characters. Unlike
    /// the other searches, an empty result isn't an error.
    pub async fn djs_with_long_names(&self) -> Result<Vec<Dj>, FestivalError> {
        let djs = self.db.retrieve_djs().await?;

        Ok(djs
            .into_iter()
            .filter(|dj| char_length(&dj.name) > LONG_NAME_THRESHOLD)
            .collect())
    }

    pub async fn create_performance(
        &self,
        payload: PerformancePayload,
    ) -> Result<Performance, FestivalError> {
        let draft = payload.validate()?;

        if self.db.retrieve_dj(draft.dj_id()).await?.is_none() {
            return Err(FestivalError::PerformanceDjMissing(draft.dj_id));
        }

        let performance = self.db.insert_performance(Performance::create(draft)?).await?;
        info!(self.logger, "Created performance"; "id" => performance.id(), "title" => performance.title(), "dj_id" => performance.dj_id());

        Ok(performance)
    }

    /// Replaces a performance's fields. The DJ is only checked when it
    /// changes; the timing is always checked.
    pub async fn update_performance(
        &self,
        id: &str,
        payload: PerformancePayload,
    ) -> Result<Performance, FestivalError> {
        let draft = payload.validate()?;

        let existing = self
            .db
            .retrieve_performance(id)
            .await?
            .ok_or_else(|| FestivalError::UpdateOfMissingPerformance(id.to_owned()))?;

        if existing.dj_id != draft.dj_id && self.db.retrieve_dj(draft.dj_id()).await?.is_none() {
            return Err(FestivalError::UpdatedPerformanceDjMissing(draft.dj_id));
        }

        let performance = existing.updated(draft)?;

        if !self.db.update_performance(performance.clone()).await? {
            return Err(FestivalError::UpdateOfMissingPerformance(id.to_owned()));
        }

        info!(self.logger, "Updated performance"; "id" => id);

        Ok(performance)
    }

    pub async fn delete_performance(&self, id: &str) -> Result<(), FestivalError> {
        if !self.db.delete_performance(id).await? {
            return Err(FestivalError::PerformanceNotFoundForDeletion(id.to_owned()));
        }

        info!(self.logger, "Deleted performance"; "id" => id);

        Ok(())
    }

    pub async fn performance(&self, id: &str) -> Result<Performance, FestivalError> {
        self.db
            .retrieve_performance(id)
            .await?
            .ok_or_else(|| FestivalError::PerformanceNotFound(id.to_owned()))
    }

    pub async fn performances(&self) -> Result<Vec<Performance>, FestivalError> {
        self.db.retrieve_performances().await
    }

    pub async fn performances_by_dj(&self, dj_id: &str) -> Result<Vec<Performance>, FestivalError> {
        let performances = self.db.retrieve_performances_by_dj(dj_id).await?;

        if performances.is_empty() {
            return Err(FestivalError::NoPerformancesForDj(dj_id.to_owned()));
        }

        Ok(performances)
    }

    pub async fn count_djs(&self) -> Result<u64, FestivalError> {
        self.db.count_djs().await
    }

    pub async fn count_performances(&self) -> Result<u64, FestivalError> {
        self.db.count_performances().await
    }

    /// Fails with the matching not-found error unless the subject is in
    /// the catalog.
    async fn ensure_exists(&self, subject: &Subject) -> Result<(), FestivalError> {
        match subject.subject_type {
            SubjectType::Dj => self.dj(&subject.id).await.map(|_| ()),
            SubjectType::Performance => self.performance(&subject.id).await.map(|_| ()),
        }
    }

    pub async fn subject_reviews(&self, subject: &Subject) -> Result<Vec<Review>, FestivalError> {
        self.ensure_exists(subject).await?;
        debug!(self.logger, "Fetching reviews"; "subject_id" => &subject.id, "subject_type" => %subject.subject_type);

        Ok(self.reviews.reviews_for(subject).await)
    }

    pub async fn subject_rating(&self, subject: &Subject) -> Result<f64, FestivalError> {
        self.ensure_exists(subject).await?;

        Ok(self.reviews.average_rating(subject).await)
    }

    pub async fn subject_review_count(&self, subject: &Subject) -> Result<u64, FestivalError> {
        self.ensure_exists(subject).await?;

        Ok(self.reviews.review_count(subject).await)
    }
}

#[cfg(test)]
mod tests {
    use futures::future::{ready, BoxFuture, FutureExt};

    use super::*;
    use crate::db::MemoryCatalogDb;

    struct NoReviews;

    impl ReviewFeed for NoReviews {
        fn reviews_for(&self, _subject: &Subject) -> BoxFuture<Vec<Review>> {
            ready(vec![]).boxed()
        }

        fn average_rating(&self, _subject: &Subject) -> BoxFuture<f64> {
            ready(3.5).boxed()
        }

        fn review_count(&self, _subject: &Subject) -> BoxFuture<u64> {
            ready(2).boxed()
        }
    }

    fn catalog() -> Catalog {
        Catalog::new(
            Arc::new(log::silent_logger()),
            Arc::new(MemoryCatalogDb::new()),
            Arc::new(NoReviews),
        )
    }

    fn dj_payload(name: &str, genre: &str, email: &str) -> DjPayload {
        DjPayload {
            id: None,
            name: Some(name.to_owned()),
            genre: Some(genre.to_owned()),
            email: Some(email.to_owned()),
        }
    }

    fn performance_payload(dj_id: &str, start: &str, end: &str) -> PerformancePayload {
        serde_json::from_value(serde_json::json!({
            "title": "Summer Vibes Hip Hop Set",
            "startTime": start,
            "endTime": end,
            "djId": dj_id,
        }))
        .expect("parse performance payload")
    }

    #[tokio::test]
    async fn duplicate_emails_are_rejected_on_create() {
        let catalog = catalog();
        catalog
            .create_dj(dj_payload("DJ Shadow", "Hip Hop", "djshadow@festival.com"))
            .await
            .unwrap();

        let result = catalog
            .create_dj(dj_payload("Shadow Two", "Hip Hop", "djshadow@festival.com"))
            .await;

        assert!(matches!(result, Err(FestivalError::EmailAlreadyExists(_))));
        assert_eq!(catalog.count_djs().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn updates_check_email_only_when_it_changes() {
        let catalog = catalog();
        let shadow = catalog
            .create_dj(dj_payload("DJ Shadow", "Hip Hop", "djshadow@festival.com"))
            .await
            .unwrap();
        catalog
            .create_dj(dj_payload("Carl Cox", "Techno", "carlcox@festival.com"))
            .await
            .unwrap();

        let unchanged = catalog
            .update_dj(
                shadow.id(),
                dj_payload("DJ Shadow", "Trip Hop", "djshadow@festival.com"),
            )
            .await
            .expect("update with own email");
        assert_eq!(unchanged.genre(), "Trip Hop");

        let taken = catalog
            .update_dj(
                shadow.id(),
                dj_payload("DJ Shadow", "Trip Hop", "carlcox@festival.com"),
            )
            .await;
        assert!(matches!(taken, Err(FestivalError::EmailAlreadyExists(_))));
    }

    #[tokio::test]
    async fn updating_a_missing_dj_is_a_bad_request() {
        let result = catalog()
            .update_dj("missing", dj_payload("DJ Shadow", "Hip Hop", "djshadow@festival.com"))
            .await;

        assert!(matches!(result, Err(FestivalError::UpdateOfMissingDj(_))));
    }

    #[tokio::test]
    async fn deleting_missing_entries_changes_nothing() {
        let catalog = catalog();
        let dj = catalog
            .create_dj(dj_payload("DJ Shadow", "Hip Hop", "djshadow@festival.com"))
            .await
            .unwrap();
        catalog
            .create_performance(performance_payload(dj.id(), "2025-07-14T20:00:00", "2025-07-14T22:00:00"))
            .await
            .unwrap();

        assert!(matches!(
            catalog.delete_dj("missing").await,
            Err(FestivalError::DjNotFoundForDeletion(_))
        ));
        assert!(matches!(
            catalog.delete_performance("missing").await,
            Err(FestivalError::PerformanceNotFoundForDeletion(_))
        ));
        assert_eq!(catalog.count_djs().await.unwrap(), 1);
        assert_eq!(catalog.count_performances().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn performance_timing_is_enforced() {
        let catalog = catalog();
        let dj = catalog
            .create_dj(dj_payload("Carl Cox", "Techno", "carlcox@festival.com"))
            .await
            .unwrap();

        let equal = catalog
            .create_performance(performance_payload(dj.id(), "2025-07-14T20:00:00", "2025-07-14T20:00:00"))
            .await;
        assert!(matches!(equal, Err(FestivalError::ZeroDuration)));

        let reversed = catalog
            .create_performance(performance_payload(dj.id(), "2025-07-14T22:00:00", "2025-07-14T20:00:00"))
            .await;
        assert!(matches!(reversed, Err(FestivalError::StartAfterEnd { .. })));

        let ordered = catalog
            .create_performance(performance_payload(dj.id(), "2025-07-14T20:00:00", "2025-07-14T22:00:00"))
            .await
            .expect("create performance");
        assert_eq!(ordered.duration_in_hours(), 2);
    }

    #[tokio::test]
    async fn performances_need_an_existing_dj() {
        let result = catalog()
            .create_performance(performance_payload("missing", "2025-07-14T20:00:00", "2025-07-14T22:00:00"))
            .await;

        assert!(matches!(result, Err(FestivalError::PerformanceDjMissing(_))));
    }

    #[tokio::test]
    async fn changing_the_dj_rechecks_it() {
        let catalog = catalog();
        let dj = catalog
            .create_dj(dj_payload("Carl Cox", "Techno", "carlcox@festival.com"))
            .await
            .unwrap();
        let performance = catalog
            .create_performance(performance_payload(dj.id(), "2025-07-14T20:00:00", "2025-07-14T22:00:00"))
            .await
            .unwrap();

        let result = catalog
            .update_performance(
                performance.id(),
                performance_payload("missing", "2025-07-14T20:00:00", "2025-07-14T22:00:00"),
            )
            .await;

        assert!(matches!(result, Err(FestivalError::UpdatedPerformanceDjMissing(_))));
    }

    #[tokio::test]
    async fn searches_report_empty_results() {
        let catalog = catalog();
        catalog
            .create_dj(dj_payload("Armin van Buuren", "Trance", "armin@festival.com"))
            .await
            .unwrap();
        catalog
            .create_dj(dj_payload("Tiësto", "Trance", "tiesto@festival.com"))
            .await
            .unwrap();

        assert_eq!(catalog.djs_by_genre("Trance").await.unwrap().len(), 2);
        assert!(matches!(
            catalog.djs_by_genre("Polka").await,
            Err(FestivalError::NoDjsForGenre(_))
        ));
        assert!(matches!(
            catalog.djs_by_name("Nobody").await,
            Err(FestivalError::NoDjsWithName(_))
        ));
        assert!(matches!(
            catalog.performances_by_dj("missing").await,
            Err(FestivalError::NoPerformancesForDj(_))
        ));

        let long_names = catalog.djs_with_long_names().await.unwrap();
        assert_eq!(long_names.len(), 1);
        assert_eq!(long_names[0].name(), "Armin van Buuren");
    }

    #[tokio::test]
    async fn review_views_need_a_local_subject() {
        let catalog = catalog();
        let dj = catalog
            .create_dj(dj_payload("Carl Cox", "Techno", "carlcox@festival.com"))
            .await
            .unwrap();

        let subject = Subject::new(dj.id(), SubjectType::Dj);
        assert_eq!(catalog.subject_rating(&subject).await.unwrap(), 3.5);
        assert_eq!(catalog.subject_review_count(&subject).await.unwrap(), 2);

        let missing = Subject::new(dj.id(), SubjectType::Performance);
        assert!(matches!(
            catalog.subject_reviews(&missing).await,
            Err(FestivalError::PerformanceNotFound(_))
        ));
    }
}
